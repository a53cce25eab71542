//! Christofides approximation.
//!
//! Minimum spanning tree, minimum-weight perfect matching on the odd-degree
//! vertices, Eulerian circuit over the union multigraph, then first-visit
//! shortcutting. On metric instances with an exact matching the result is
//! within 1.5x of the optimal tour.

use crate::error::{SolverError, SolverResult};
use crate::heuristics::TourConstruction;
use crate::matrix::DistanceMatrix;
use crate::solution::Tour;

/// Largest odd-vertex set matched exactly by the subset DP; beyond this the
/// greedy pairing takes over and the 1.5 bound is heuristic only.
const EXACT_MATCHING_LIMIT: usize = 18;

/// Christofides 1.5-approximation heuristic.
pub struct Christofides;

impl Christofides {
    pub fn new() -> Self {
        Christofides
    }
}

impl Default for Christofides {
    fn default() -> Self {
        Self::new()
    }
}

impl TourConstruction for Christofides {
    fn construct(&self, matrix: &DistanceMatrix) -> SolverResult<Tour> {
        let begin = std::time::Instant::now();
        let n = matrix.dimension();

        let mst = prim_mst(matrix)?;
        let odd = odd_degree_vertices(n, &mst);
        log::debug!("MST has {} edges, {} odd-degree vertices", mst.len(), odd.len());

        let matching = minimum_weight_matching(matrix, &odd)?;

        // MST plus matching gives every vertex even degree, so an Eulerian
        // circuit exists.
        let mut multigraph = vec![Vec::new(); n];
        for &(u, v) in mst.iter().chain(matching.iter()) {
            multigraph[u].push(v);
            multigraph[v].push(u);
        }

        let circuit = eulerian_circuit(&multigraph);
        let order = shortcut(n, &circuit);

        if order.len() != n {
            // Cannot happen once the MST spans all vertices; kept as a
            // fail-fast guard against returning a corrupted tour.
            return Err(SolverError::DisconnectedGraph);
        }

        let mut tour = Tour::from_order(matrix, order, self.name());
        tour.computation_time = begin.elapsed().as_secs_f64();
        Ok(tour)
    }

    fn name(&self) -> &str {
        "Christofides"
    }
}

/// Prim's algorithm over the full matrix. Ascending vertex scans with a
/// strict `<` make both the grown vertex and its parent deterministic.
fn prim_mst(matrix: &DistanceMatrix) -> SolverResult<Vec<(usize, usize)>> {
    let n = matrix.dimension();
    let mut in_mst = vec![false; n];
    let mut min_edge = vec![f64::INFINITY; n];
    let mut parent = vec![None; n];
    min_edge[0] = 0.0;

    for _ in 0..n {
        let mut u = None;
        let mut best = f64::INFINITY;
        for v in 0..n {
            if !in_mst[v] && min_edge[v] < best {
                best = min_edge[v];
                u = Some(v);
            }
        }

        // Every vertex must be reachable through finite edges.
        let u = u.ok_or(SolverError::DisconnectedGraph)?;
        in_mst[u] = true;

        for v in 0..n {
            if !in_mst[v] && matrix.distance(u, v) < min_edge[v] {
                min_edge[v] = matrix.distance(u, v);
                parent[v] = Some(u);
            }
        }
    }

    let mut edges = Vec::with_capacity(n - 1);
    for v in 1..n {
        match parent[v] {
            Some(u) => edges.push((u, v)),
            None => return Err(SolverError::DisconnectedGraph),
        }
    }
    Ok(edges)
}

/// Vertices with odd degree in the edge list. The handshake lemma makes
/// the result even-sized.
fn odd_degree_vertices(n: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut degree = vec![0usize; n];
    for &(u, v) in edges {
        degree[u] += 1;
        degree[v] += 1;
    }
    degree
        .iter()
        .enumerate()
        .filter_map(|(v, &d)| if d % 2 == 1 { Some(v) } else { None })
        .collect()
}

/// Minimum-weight perfect matching on the odd-degree vertex set.
///
/// Exact subset DP up to [`EXACT_MATCHING_LIMIT`] vertices, greedy
/// globally-best-pair beyond that.
fn minimum_weight_matching(
    matrix: &DistanceMatrix,
    odd: &[usize],
) -> SolverResult<Vec<(usize, usize)>> {
    if odd.len() % 2 != 0 {
        return Err(SolverError::NoPerfectMatching);
    }
    if odd.is_empty() {
        return Ok(Vec::new());
    }

    if odd.len() <= EXACT_MATCHING_LIMIT {
        exact_matching(matrix, odd)
    } else {
        log::debug!(
            "odd set of {} exceeds exact matching limit {}, using greedy pairing",
            odd.len(),
            EXACT_MATCHING_LIMIT
        );
        greedy_matching(matrix, odd)
    }
}

/// Exact minimum-weight perfect matching by DP over vertex subsets.
///
/// State: the set of already-matched vertices. The lowest unmatched vertex
/// is always paired next, so each subset is reached once.
fn exact_matching(matrix: &DistanceMatrix, odd: &[usize]) -> SolverResult<Vec<(usize, usize)>> {
    let k = odd.len();
    let full: usize = (1 << k) - 1;

    let mut cost = vec![f64::INFINITY; 1 << k];
    let mut choice = vec![(0u8, 0u8); 1 << k];
    cost[0] = 0.0;

    for mask in 0..full {
        if !cost[mask].is_finite() {
            continue;
        }
        let i = (0..k).find(|b| mask & (1 << b) == 0).expect("mask != full");
        for j in i + 1..k {
            if mask & (1 << j) != 0 {
                continue;
            }
            let next = mask | (1 << i) | (1 << j);
            let w = cost[mask] + matrix.distance(odd[i], odd[j]);
            if w < cost[next] {
                cost[next] = w;
                choice[next] = (i as u8, j as u8);
            }
        }
    }

    if !cost[full].is_finite() {
        return Err(SolverError::NoPerfectMatching);
    }

    let mut pairs = Vec::with_capacity(k / 2);
    let mut mask = full;
    while mask != 0 {
        let (i, j) = choice[mask];
        pairs.push((odd[i as usize], odd[j as usize]));
        mask &= !(1 << i);
        mask &= !(1 << j);
    }
    Ok(pairs)
}

/// Greedy pairing: repeatedly match the globally closest unmatched pair.
/// Ties resolve to the first pair in scan order.
fn greedy_matching(matrix: &DistanceMatrix, odd: &[usize]) -> SolverResult<Vec<(usize, usize)>> {
    let mut unmatched: Vec<usize> = odd.to_vec();
    let mut pairs = Vec::with_capacity(odd.len() / 2);

    while unmatched.len() > 1 {
        let mut best = (0, 1);
        let mut best_cost = matrix.distance(unmatched[0], unmatched[1]);

        for i in 0..unmatched.len() {
            for j in i + 1..unmatched.len() {
                let d = matrix.distance(unmatched[i], unmatched[j]);
                if d < best_cost {
                    best_cost = d;
                    best = (i, j);
                }
            }
        }

        pairs.push((unmatched[best.0], unmatched[best.1]));
        unmatched.remove(best.1);
        unmatched.remove(best.0);
    }

    if !unmatched.is_empty() {
        return Err(SolverError::NoPerfectMatching);
    }
    Ok(pairs)
}

/// Hierholzer's algorithm: closed walk using every multigraph edge once.
fn eulerian_circuit(graph: &[Vec<usize>]) -> Vec<usize> {
    let mut adj = graph.to_vec();
    let mut stack = vec![0usize];
    let mut circuit = Vec::new();

    while let Some(&u) = stack.last() {
        match adj[u].pop() {
            Some(v) => {
                // Drop the reverse copy of the edge.
                if let Some(pos) = adj[v].iter().position(|&x| x == u) {
                    adj[v].remove(pos);
                }
                stack.push(v);
            }
            None => {
                circuit.push(u);
                stack.pop();
            }
        }
    }

    circuit.reverse();
    circuit
}

/// Shortcut an Eulerian circuit into a Hamiltonian tour: keep each vertex
/// at its first appearance. Valid on metric instances by the triangle
/// inequality.
fn shortcut(n: usize, circuit: &[usize]) -> Vec<usize> {
    let mut seen = vec![false; n];
    let mut order = Vec::with_capacity(n);
    for &v in circuit {
        if !seen[v] {
            seen[v] = true;
            order.push(v);
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{Node, TspInstance};
    use crate::solution::validate_permutation;

    /// Brute-force optimal tour cost, fixing city 0 first.
    fn brute_force_optimal(matrix: &DistanceMatrix) -> f64 {
        fn search(matrix: &DistanceMatrix, order: &mut Vec<usize>, used: &mut Vec<bool>, best: &mut f64) {
            let n = matrix.dimension();
            if order.len() == n {
                let cost = matrix.tour_length(order);
                if cost < *best {
                    *best = cost;
                }
                return;
            }
            for city in 1..n {
                if !used[city] {
                    used[city] = true;
                    order.push(city);
                    search(matrix, order, used, best);
                    order.pop();
                    used[city] = false;
                }
            }
        }

        let n = matrix.dimension();
        let mut used = vec![false; n];
        used[0] = true;
        let mut best = f64::INFINITY;
        search(matrix, &mut vec![0], &mut used, &mut best);
        best
    }

    #[test]
    fn test_collinear_points() {
        let nodes = vec![
            Node::new(0, 0.0, 0.0),
            Node::new(1, 1.0, 0.0),
            Node::new(2, 2.0, 0.0),
            Node::new(3, 3.0, 0.0),
        ];
        let matrix = DistanceMatrix::from_nodes(&nodes).unwrap();
        let tour = Christofides::new().construct(&matrix).unwrap();

        validate_permutation(4, &tour.order).unwrap();
        assert!((tour.cost - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_two_cities() {
        let nodes = vec![Node::new(0, 0.0, 0.0), Node::new(1, 3.0, 4.0)];
        let matrix = DistanceMatrix::from_nodes(&nodes).unwrap();
        let tour = Christofides::new().construct(&matrix).unwrap();

        assert_eq!(tour.order.len(), 2);
        assert!((tour.cost - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_within_approximation_bound() {
        for seed in [1u64, 2, 3] {
            let instance = TspInstance::random("chr-bound", 8, 100.0, seed);
            let matrix = DistanceMatrix::from_nodes(&instance.nodes).unwrap();

            let optimal = brute_force_optimal(&matrix);
            let tour = Christofides::new().construct(&matrix).unwrap();

            validate_permutation(8, &tour.order).unwrap();
            assert!(
                tour.cost <= 1.5 * optimal + 1e-9,
                "seed {}: {:.4} > 1.5 * {:.4}",
                seed,
                tour.cost,
                optimal
            );
        }
    }

    #[test]
    fn test_deterministic() {
        let instance = TspInstance::random("chr-det", 60, 100.0, 17);
        let matrix = DistanceMatrix::from_nodes(&instance.nodes).unwrap();

        let a = Christofides::new().construct(&matrix).unwrap();
        let b = Christofides::new().construct(&matrix).unwrap();

        assert_eq!(a.order, b.order);
        assert_eq!(a.cost, b.cost);
        validate_permutation(60, &a.order).unwrap();
    }

    #[test]
    fn test_mst_spans_all_vertices() {
        let instance = TspInstance::random("mst", 25, 100.0, 4);
        let matrix = DistanceMatrix::from_nodes(&instance.nodes).unwrap();

        let mst = prim_mst(&matrix).unwrap();
        assert_eq!(mst.len(), 24);

        let odd = odd_degree_vertices(25, &mst);
        assert_eq!(odd.len() % 2, 0);
    }

    #[test]
    fn test_exact_matching_beats_greedy() {
        // Greedy grabs the cheap middle pair (1, 2) and is left with the
        // expensive (0, 3); the DP pairs neighbours instead.
        let nodes = vec![
            Node::new(0, 0.0, 0.0),
            Node::new(1, 1.0, 0.0),
            Node::new(2, 1.1, 0.0),
            Node::new(3, 2.0, 0.0),
        ];
        let matrix = DistanceMatrix::from_nodes(&nodes).unwrap();
        let odd = vec![0, 1, 2, 3];

        let weight = |pairs: &[(usize, usize)]| -> f64 {
            pairs.iter().map(|&(u, v)| matrix.distance(u, v)).sum()
        };

        let exact = exact_matching(&matrix, &odd).unwrap();
        let greedy = greedy_matching(&matrix, &odd).unwrap();

        assert!((weight(&exact) - 1.9).abs() < 1e-9);
        assert!(weight(&exact) < weight(&greedy));
    }

    #[test]
    fn test_eulerian_circuit_uses_every_edge() {
        // Path 0-1-2 with every edge doubled; all degrees even.
        let graph = vec![vec![1, 1], vec![0, 0, 2, 2], vec![1, 1]];
        let circuit = eulerian_circuit(&graph);

        let edge_count: usize = graph.iter().map(|a| a.len()).sum::<usize>() / 2;
        assert_eq!(circuit.len(), edge_count + 1);
        assert_eq!(circuit.first(), circuit.last());
    }
}
