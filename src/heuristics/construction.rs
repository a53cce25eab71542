//! Nearest-Neighbour tour construction.

use ordered_float::OrderedFloat;
use rayon::prelude::*;

use crate::error::{SolverError, SolverResult};
use crate::heuristics::TourConstruction;
use crate::matrix::DistanceMatrix;
use crate::solution::Tour;

/// Starting-city policy for Nearest-Neighbour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Start {
    /// Start the greedy walk from one fixed city.
    Fixed(usize),
    /// Run every city as a start and keep the cheapest tour.
    ///
    /// Costs O(N) restarts of an O(N²) walk; explicit opt-in for that reason.
    Best,
}

/// Nearest-Neighbour constructive heuristic.
///
/// Builds a tour by repeatedly visiting the nearest unvisited city.
/// Equidistant candidates resolve to the lowest index, so repeated runs
/// are identical.
pub struct NearestNeighbour {
    pub start: Start,
}

impl NearestNeighbour {
    pub fn new() -> Self {
        NearestNeighbour {
            start: Start::Fixed(0),
        }
    }

    pub fn from_start(start: usize) -> Self {
        NearestNeighbour {
            start: Start::Fixed(start),
        }
    }

    pub fn best_of_all_starts() -> Self {
        NearestNeighbour { start: Start::Best }
    }

    /// Greedy walk from one start city. The ascending scan with a strict
    /// `<` keeps the lowest index among equidistant candidates.
    fn walk(matrix: &DistanceMatrix, start: usize) -> (Vec<usize>, f64) {
        let n = matrix.dimension();
        let mut order = Vec::with_capacity(n);
        let mut visited = vec![false; n];

        let mut current = start;
        let mut cost = 0.0;
        order.push(current);
        visited[current] = true;

        for _ in 1..n {
            let mut nearest = None;
            let mut min_dist = f64::INFINITY;

            for city in 0..n {
                if !visited[city] && matrix.distance(current, city) < min_dist {
                    min_dist = matrix.distance(current, city);
                    nearest = Some(city);
                }
            }

            // Complete matrix: a nearest city always exists.
            let next = nearest.expect("unvisited city with finite distance");
            order.push(next);
            visited[next] = true;
            cost += min_dist;
            current = next;
        }

        cost += matrix.distance(current, start);
        (order, cost)
    }
}

impl Default for NearestNeighbour {
    fn default() -> Self {
        Self::new()
    }
}

impl TourConstruction for NearestNeighbour {
    fn construct(&self, matrix: &DistanceMatrix) -> SolverResult<Tour> {
        let begin = std::time::Instant::now();
        let n = matrix.dimension();

        let (order, cost) = match self.start {
            Start::Fixed(start) => {
                if start >= n {
                    return Err(SolverError::InvalidStart {
                        start,
                        dimension: n,
                    });
                }
                Self::walk(matrix, start)
            }
            Start::Best => {
                // Independent restarts over a shared read-only matrix; the
                // comparator is a total order, so the winner is the same
                // regardless of scheduling. Cost ties go to the lower start.
                let (_, order, cost) = (0..n)
                    .into_par_iter()
                    .map(|start| {
                        let (order, cost) = Self::walk(matrix, start);
                        (start, order, cost)
                    })
                    .min_by_key(|&(start, _, cost)| (OrderedFloat(cost), start))
                    .expect("at least two cities");
                (order, cost)
            }
        };

        log::debug!("nearest neighbour ({}) cost {:.2}", self.name(), cost);

        let mut tour = Tour::from_order(matrix, order, self.name());
        debug_assert!((tour.cost - cost).abs() < 1e-6);
        tour.computation_time = begin.elapsed().as_secs_f64();
        Ok(tour)
    }

    fn name(&self) -> &str {
        match self.start {
            Start::Fixed(_) => "NearestNeighbour",
            Start::Best => "NearestNeighbour-AllStarts",
        }
    }
}
