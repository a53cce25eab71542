//! Tour representation and evaluation.
//!
//! A tour is a permutation of all city indices interpreted cyclically: the
//! last city connects back to the first. Construction heuristics produce
//! fresh `Tour` values; improvement heuristics mutate the tour they are
//! handed, so callers keep a clone when the construction result matters.

use crate::error::{SolverError, SolverResult};
use crate::matrix::DistanceMatrix;
use serde::{Deserialize, Serialize};

/// A cyclic tour through all cities, with bookkeeping about how it was made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tour {
    /// Visiting order as city indices; each index appears exactly once.
    pub order: Vec<usize>,
    /// Total cyclic tour length.
    pub cost: f64,
    /// Algorithm that generated this tour.
    pub algorithm: String,
    /// Computation time in seconds.
    pub computation_time: f64,
    /// Number of improvement iterations (if applicable).
    pub iterations: Option<usize>,
}

impl Tour {
    /// Create a tour from a visiting order, computing its cost.
    pub fn from_order(matrix: &DistanceMatrix, order: Vec<usize>, algorithm: &str) -> Self {
        let cost = matrix.tour_length(&order);
        Tour {
            order,
            cost,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            iterations: None,
        }
    }

    /// Recompute the cost from the matrix, shedding any accumulated drift.
    pub fn revalidate(&mut self, matrix: &DistanceMatrix) {
        self.cost = matrix.tour_length(&self.order);
    }

    /// Cost delta of reversing the segment between positions `i+1` and `j`.
    ///
    /// Replaces edges (i, i+1) and (j, j+1) with (i, j) and (i+1, j+1);
    /// interior edges only change direction, so four lookups suffice.
    pub fn two_opt_delta(&self, matrix: &DistanceMatrix, i: usize, j: usize) -> f64 {
        let n = self.order.len();
        let a = self.order[i];
        let b = self.order[i + 1];
        let c = self.order[j];
        let d = self.order[(j + 1) % n];

        matrix.distance(a, c) + matrix.distance(b, d)
            - matrix.distance(a, b)
            - matrix.distance(c, d)
    }

    /// Apply a 2-opt move (reverse segment between i+1 and j).
    pub fn apply_two_opt(&mut self, i: usize, j: usize) {
        self.order[i + 1..=j].reverse();
    }
}

impl std::fmt::Display for Tour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Tour ({})", self.algorithm)?;
        writeln!(f, "  Cost: {:.2}", self.cost)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(iter) = self.iterations {
            writeln!(f, "  Iterations: {}", iter)?;
        }
        writeln!(f, "  Order: {:?}", self.order)
    }
}

/// Check that `order` is a permutation of exactly the indices `[0, dimension)`.
pub fn validate_permutation(dimension: usize, order: &[usize]) -> SolverResult<()> {
    if order.len() != dimension {
        return Err(SolverError::InvalidTour(format!(
            "tour has {} cities, instance has {}",
            order.len(),
            dimension
        )));
    }

    let mut seen = vec![false; dimension];
    for &city in order {
        if city >= dimension {
            return Err(SolverError::InvalidTour(format!(
                "city index {} out of range [0, {})",
                city, dimension
            )));
        }
        if seen[city] {
            return Err(SolverError::InvalidTour(format!(
                "city {} visited more than once",
                city
            )));
        }
        seen[city] = true;
    }

    Ok(())
}

/// Validated tour cost: permutation check, then the cyclic length sum.
pub fn evaluate(matrix: &DistanceMatrix, order: &[usize]) -> SolverResult<f64> {
    validate_permutation(matrix.dimension(), order)?;
    Ok(matrix.tour_length(order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Node;

    fn square_matrix() -> DistanceMatrix {
        let nodes = vec![
            Node::new(0, 0.0, 0.0),
            Node::new(1, 1.0, 0.0),
            Node::new(2, 1.0, 1.0),
            Node::new(3, 0.0, 1.0),
        ];
        DistanceMatrix::from_nodes(&nodes).unwrap()
    }

    #[test]
    fn test_evaluate_square() {
        let matrix = square_matrix();
        let cost = evaluate(&matrix, &[0, 1, 2, 3]).unwrap();
        assert!((cost - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_evaluate_rotation_invariant() {
        let matrix = square_matrix();
        let base = evaluate(&matrix, &[0, 1, 2, 3]).unwrap();
        assert_eq!(base, evaluate(&matrix, &[1, 2, 3, 0]).unwrap());
        assert_eq!(base, evaluate(&matrix, &[2, 3, 0, 1]).unwrap());
    }

    #[test]
    fn test_evaluate_reversal_invariant() {
        let matrix = square_matrix();
        let forward = evaluate(&matrix, &[0, 1, 2, 3]).unwrap();
        let backward = evaluate(&matrix, &[3, 2, 1, 0]).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_evaluate_rejects_malformed() {
        let matrix = square_matrix();
        assert!(matches!(
            evaluate(&matrix, &[0, 1, 2]),
            Err(SolverError::InvalidTour(_))
        ));
        assert!(matches!(
            evaluate(&matrix, &[0, 1, 2, 2]),
            Err(SolverError::InvalidTour(_))
        ));
        assert!(matches!(
            evaluate(&matrix, &[0, 1, 2, 4]),
            Err(SolverError::InvalidTour(_))
        ));
    }

    #[test]
    fn test_two_opt_delta_matches_full_recompute() {
        let matrix = square_matrix();
        // Crossed tour: 0 -> 2 -> 1 -> 3.
        let tour = Tour::from_order(&matrix, vec![0, 2, 1, 3], "test");
        let delta = tour.two_opt_delta(&matrix, 0, 1);

        let mut uncrossed = tour.clone();
        uncrossed.apply_two_opt(0, 1);
        let recomputed = matrix.tour_length(&uncrossed.order);

        assert!((tour.cost + delta - recomputed).abs() < 1e-10);
    }
}
