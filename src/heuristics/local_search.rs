//! 2-opt local search improvement.

use crate::error::SolverResult;
use crate::heuristics::TourImprovement;
use crate::matrix::DistanceMatrix;
use crate::solution::{validate_permutation, Tour};

/// Moves below this threshold are not worth applying; equal-cost moves in
/// particular are skipped so the search cannot cycle.
const IMPROVEMENT_EPS: f64 = 1e-9;

/// 2-opt local search.
///
/// Scans edge pairs in increasing `(i, j)` order and applies the first
/// improving segment reversal, then restarts the pass. Stops at a local
/// optimum or when the iteration budget runs out.
pub struct TwoOpt {
    /// Maximum number of applied improving moves; `None` runs to convergence.
    pub max_iterations: Option<usize>,
}

impl TwoOpt {
    pub fn new() -> Self {
        TwoOpt { max_iterations: None }
    }

    pub fn with_max_iterations(max_iterations: usize) -> Self {
        TwoOpt {
            max_iterations: Some(max_iterations),
        }
    }

    /// One first-improvement pass. Returns the applied move, if any.
    fn improving_move(&self, matrix: &DistanceMatrix, tour: &Tour) -> Option<(usize, usize)> {
        let n = tour.order.len();
        for i in 0..n - 2 {
            for j in i + 2..n {
                if i == 0 && j == n - 1 {
                    continue; // Adjacent through the wrap-around edge.
                }
                if tour.two_opt_delta(matrix, i, j) < -IMPROVEMENT_EPS {
                    return Some((i, j));
                }
            }
        }
        None
    }
}

impl Default for TwoOpt {
    fn default() -> Self {
        Self::new()
    }
}

impl TourImprovement for TwoOpt {
    fn improve(&self, matrix: &DistanceMatrix, tour: &mut Tour) -> SolverResult<bool> {
        validate_permutation(matrix.dimension(), &tour.order)?;

        let n = tour.order.len();
        if n < 4 {
            tour.iterations = Some(0);
            return Ok(false);
        }

        let mut applied = 0usize;
        loop {
            // Budget check between moves so callers can cap work.
            if let Some(max) = self.max_iterations {
                if applied >= max {
                    log::debug!("2-opt stopped at iteration budget {}", max);
                    break;
                }
            }

            match self.improving_move(matrix, tour) {
                Some((i, j)) => {
                    let delta = tour.two_opt_delta(matrix, i, j);
                    tour.apply_two_opt(i, j);
                    tour.cost += delta;
                    applied += 1;
                }
                None => break, // Local optimum.
            }
        }

        log::debug!("2-opt applied {} moves, cost {:.2}", applied, tour.cost);

        // Incremental deltas accumulate floating-point drift.
        tour.revalidate(matrix);
        tour.iterations = Some(applied);
        Ok(applied > 0)
    }

    fn name(&self) -> &str {
        "2-Opt"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SolverError;
    use crate::heuristics::construction::NearestNeighbour;
    use crate::heuristics::TourConstruction;
    use crate::instance::{Node, TspInstance};
    use crate::solution::validate_permutation;

    fn unit_square() -> DistanceMatrix {
        let nodes = vec![
            Node::new(0, 0.0, 0.0),
            Node::new(1, 1.0, 0.0),
            Node::new(2, 1.0, 1.0),
            Node::new(3, 0.0, 1.0),
        ];
        DistanceMatrix::from_nodes(&nodes).unwrap()
    }

    #[test]
    fn test_uncrosses_square() {
        let matrix = unit_square();
        // 0 -> 2 -> 1 -> 3 crosses the diagonals; optimum is the perimeter.
        let mut tour = Tour::from_order(&matrix, vec![0, 2, 1, 3], "test");

        let improved = TwoOpt::new().improve(&matrix, &mut tour).unwrap();

        assert!(improved);
        assert!((tour.cost - 4.0).abs() < 1e-9);
        validate_permutation(4, &tour.order).unwrap();
    }

    #[test]
    fn test_never_increases_cost() {
        let instance = TspInstance::random("2opt-mono", 50, 100.0, 99);
        let matrix = DistanceMatrix::from_nodes(&instance.nodes).unwrap();

        let initial = NearestNeighbour::from_start(0).construct(&matrix).unwrap();
        let mut tour = initial.clone();
        TwoOpt::new().improve(&matrix, &mut tour).unwrap();

        assert!(tour.cost <= initial.cost + 1e-9);
        validate_permutation(matrix.dimension(), &tour.order).unwrap();
    }

    #[test]
    fn test_zero_budget_leaves_tour_unchanged() {
        let matrix = unit_square();
        let mut tour = Tour::from_order(&matrix, vec![0, 2, 1, 3], "test");
        let before = tour.order.clone();

        let improved = TwoOpt::with_max_iterations(0).improve(&matrix, &mut tour).unwrap();

        assert!(!improved);
        assert_eq!(tour.order, before);
        assert_eq!(tour.iterations, Some(0));
    }

    #[test]
    fn test_budget_caps_moves() {
        let instance = TspInstance::random("2opt-budget", 40, 100.0, 5);
        let matrix = DistanceMatrix::from_nodes(&instance.nodes).unwrap();

        let mut tour = NearestNeighbour::from_start(0).construct(&matrix).unwrap();
        TwoOpt::with_max_iterations(3).improve(&matrix, &mut tour).unwrap();

        assert!(tour.iterations.unwrap() <= 3);
    }

    #[test]
    fn test_does_not_worsen_local_optimum() {
        // Square plus center, already 2-opt optimal after NN construction.
        let nodes = vec![
            Node::new(0, 0.0, 0.0),
            Node::new(1, 0.0, 1.0),
            Node::new(2, 1.0, 1.0),
            Node::new(3, 1.0, 0.0),
            Node::new(4, 0.5, 0.5),
        ];
        let matrix = DistanceMatrix::from_nodes(&nodes).unwrap();
        let mut tour = NearestNeighbour::from_start(0).construct(&matrix).unwrap();
        let before = tour.cost;

        TwoOpt::new().improve(&matrix, &mut tour).unwrap();
        assert!(tour.cost <= before + 1e-9);
    }

    #[test]
    fn test_rejects_invalid_tour() {
        let matrix = unit_square();
        let mut tour = Tour {
            order: vec![0, 1, 1, 3],
            cost: 0.0,
            algorithm: "bad".to_string(),
            computation_time: 0.0,
            iterations: None,
        };
        assert!(matches!(
            TwoOpt::new().improve(&matrix, &mut tour),
            Err(SolverError::InvalidTour(_))
        ));
    }

    #[test]
    fn test_collinear_converges_to_out_and_back() {
        let nodes = vec![
            Node::new(0, 0.0, 0.0),
            Node::new(1, 1.0, 0.0),
            Node::new(2, 2.0, 0.0),
            Node::new(3, 3.0, 0.0),
        ];
        let matrix = DistanceMatrix::from_nodes(&nodes).unwrap();

        // Worst ordering for collinear points.
        let mut tour = Tour::from_order(&matrix, vec![0, 2, 1, 3], "test");
        TwoOpt::new().improve(&matrix, &mut tour).unwrap();

        assert!((tour.cost - 6.0).abs() < 1e-9);
    }
}
