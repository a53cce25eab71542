//! Full symmetric Euclidean distance matrix.
//!
//! Built once per instance and read-only afterwards; every algorithm in the
//! crate works against `&DistanceMatrix`, so independent runs can share one
//! matrix across threads without locking.

use crate::error::{SolverError, SolverResult};
use crate::instance::Node;

/// Square symmetric matrix of pairwise Euclidean distances.
///
/// Entries are stored row-major in a flat vector; the diagonal is zero.
/// There are no public mutators, so a constructed matrix never changes.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    /// Build the all-pairs distance matrix for an ordered point set.
    ///
    /// O(N²) time and space. Fails if fewer than 2 points are supplied.
    pub fn from_nodes(nodes: &[Node]) -> SolverResult<Self> {
        if nodes.len() < 2 {
            return Err(SolverError::InvalidInput(format!(
                "need at least 2 points to build a distance matrix, got {}",
                nodes.len()
            )));
        }

        let n = nodes.len();
        let mut data = vec![0.0; n * n];

        for i in 0..n {
            for j in 0..n {
                if i != j {
                    let dx = nodes[i].x - nodes[j].x;
                    let dy = nodes[i].y - nodes[j].y;
                    data[i * n + j] = (dx * dx + dy * dy).sqrt();
                }
            }
        }

        Ok(DistanceMatrix { n, data })
    }

    /// Number of cities.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.n
    }

    /// Distance between cities `i` and `j`.
    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    /// Cyclic tour length including the closing edge.
    ///
    /// Does not validate the permutation; use [`crate::evaluate`] for the
    /// checked variant.
    pub fn tour_length(&self, tour: &[usize]) -> f64 {
        if tour.len() < 2 {
            return 0.0;
        }

        let mut length = 0.0;
        for i in 0..tour.len() - 1 {
            length += self.distance(tour[i], tour[i + 1]);
        }
        length += self.distance(tour[tour.len() - 1], tour[0]);

        length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_calculation() {
        let nodes = vec![Node::new(0, 0.0, 0.0), Node::new(1, 3.0, 4.0)];
        let matrix = DistanceMatrix::from_nodes(&nodes).unwrap();

        assert!((matrix.distance(0, 1) - 5.0).abs() < 1e-10);
        assert!((matrix.distance(1, 0) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_symmetry_and_zero_diagonal() {
        let nodes = vec![
            Node::new(0, 0.0, 0.0),
            Node::new(1, 1.0, 2.0),
            Node::new(2, 4.0, 1.0),
            Node::new(3, 2.5, 3.5),
        ];
        let matrix = DistanceMatrix::from_nodes(&nodes).unwrap();

        for i in 0..4 {
            assert_eq!(matrix.distance(i, i), 0.0);
            for j in 0..4 {
                assert_eq!(matrix.distance(i, j), matrix.distance(j, i));
                assert!(matrix.distance(i, j) >= 0.0);
            }
        }
    }

    #[test]
    fn test_rebuild_is_bit_identical() {
        let nodes = vec![
            Node::new(0, 0.13, 7.9),
            Node::new(1, 3.77, 0.2),
            Node::new(2, 5.01, 2.4),
        ];
        let a = DistanceMatrix::from_nodes(&nodes).unwrap();
        let b = DistanceMatrix::from_nodes(&nodes).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_too_few_points() {
        let nodes = vec![Node::new(0, 0.0, 0.0)];
        assert!(matches!(
            DistanceMatrix::from_nodes(&nodes),
            Err(SolverError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_tour_length_square() {
        let nodes = vec![
            Node::new(0, 0.0, 0.0),
            Node::new(1, 1.0, 0.0),
            Node::new(2, 1.0, 1.0),
            Node::new(3, 0.0, 1.0),
        ];
        let matrix = DistanceMatrix::from_nodes(&nodes).unwrap();
        assert!((matrix.tour_length(&[0, 1, 2, 3]) - 4.0).abs() < 1e-10);
    }
}
