//! TSP Heuristic Benchmark Library
//!
//! Benchmarks heuristic solvers for the symmetric Euclidean Traveling
//! Salesman Problem against known-optimal tours.
//!
//! # Features
//!
//! - Full symmetric distance matrix construction
//! - Nearest-Neighbour construction (fixed start or best of all starts)
//! - 2-opt local search with an optional iteration budget
//! - Christofides 1.5-approximation (MST + matching + Eulerian shortcut)
//! - TSPLIB instance and optimal-tour loading, coordinate caching
//! - Benchmark runner with timing, gap-to-optimal and CSV export
//!
//! # Example
//!
//! ```
//! use tsp_bench::instance::Node;
//! use tsp_bench::{build_distance_matrix, nearest_neighbour, two_opt, Start};
//!
//! let nodes = vec![
//!     Node::new(0, 0.0, 0.0),
//!     Node::new(1, 1.0, 0.0),
//!     Node::new(2, 1.0, 1.0),
//!     Node::new(3, 0.0, 1.0),
//! ];
//!
//! let matrix = build_distance_matrix(&nodes).unwrap();
//! let mut tour = nearest_neighbour(&matrix, Start::Fixed(0)).unwrap();
//! two_opt(&matrix, &mut tour, None).unwrap();
//!
//! assert!((tour.cost - 4.0).abs() < 1e-9);
//! ```

pub mod benchmark;
pub mod error;
pub mod heuristics;
pub mod instance;
pub mod matrix;
pub mod solution;

pub use error::{SolverError, SolverResult};
pub use heuristics::{
    Christofides, NearestNeighbour, Start, TourConstruction, TourImprovement, TwoOpt,
};
pub use instance::TspInstance;
pub use matrix::DistanceMatrix;
pub use solution::{evaluate, Tour};

use instance::Node;

/// Build the all-pairs Euclidean distance matrix for an ordered point set.
pub fn build_distance_matrix(nodes: &[Node]) -> SolverResult<DistanceMatrix> {
    DistanceMatrix::from_nodes(nodes)
}

/// Construct a tour with the Nearest-Neighbour heuristic.
pub fn nearest_neighbour(matrix: &DistanceMatrix, start: Start) -> SolverResult<Tour> {
    NearestNeighbour { start }.construct(matrix)
}

/// Improve a tour in place with 2-opt; `None` iterates to convergence.
/// Returns whether any improvement was made.
pub fn two_opt(
    matrix: &DistanceMatrix,
    tour: &mut Tour,
    max_iterations: Option<usize>,
) -> SolverResult<bool> {
    TwoOpt { max_iterations }.improve(matrix, tour)
}

/// Construct a tour with the Christofides approximation.
pub fn christofides(matrix: &DistanceMatrix) -> SolverResult<Tour> {
    Christofides::new().construct(matrix)
}
