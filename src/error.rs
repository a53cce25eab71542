//! Error types for the solver core and the benchmark harness.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type SolverResult<T> = Result<T, SolverError>;

/// Errors reported by the solver core.
///
/// All of these are detected synchronously at the offending call; the
/// algorithms are deterministic and pure, so nothing is retried and no
/// partial result is returned on failure.
#[derive(Debug, Error)]
pub enum SolverError {
    /// The point set cannot form a TSP instance (e.g. fewer than 2 points).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A starting city index outside `[0, dimension)`.
    #[error("invalid start city {start} for instance of dimension {dimension}")]
    InvalidStart { start: usize, dimension: usize },

    /// A tour that is not a permutation of all city indices.
    #[error("invalid tour: {0}")]
    InvalidTour(String),

    /// The distance matrix does not describe a connected graph.
    #[error("distance matrix does not describe a connected graph")]
    DisconnectedGraph,

    /// No perfect matching exists on the odd-degree vertex set.
    #[error("no perfect matching on the odd-degree vertex set")]
    NoPerfectMatching,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed instance or tour file contents.
    #[error("parse error: {0}")]
    Parse(String),
}
