//! Parsing and representing TSP instances.
//!
//! Handles TSPLIB-format problem files with 2D node coordinates, the
//! matching `.opt.tour` files carrying known-optimal tours, and a
//! tab-delimited coordinate cache that avoids re-parsing TSPLIB files
//! across repeated benchmark runs.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SolverError, SolverResult};

/// A city in a TSP instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Node identifier (1-indexed in files, 0-indexed internally)
    pub id: usize,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Node {
    pub fn new(id: usize, x: f64, y: f64) -> Self {
        Node { id, x, y }
    }
}

/// A complete symmetric Euclidean TSP instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TspInstance {
    /// Name of the instance
    pub name: String,
    /// Comment/description
    pub comment: String,
    /// Number of cities
    pub dimension: usize,
    /// List of all cities
    pub nodes: Vec<Node>,
}

impl TspInstance {
    /// Parse a TSP instance from a TSPLIB format file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> SolverResult<Self> {
        let file = File::open(&path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parse a TSP instance from any buffered reader in TSPLIB format.
    ///
    /// Recognizes NAME, COMMENT, DIMENSION and NODE_COORD_SECTION; sections
    /// the benchmark does not use (edge weight type declarations, display
    /// data) are skipped. TSPLIB writes keywords both with and without
    /// spaces around the colon.
    pub fn from_reader<R: BufRead>(reader: R) -> SolverResult<Self> {
        let mut name = String::new();
        let mut comment = String::new();
        let mut dimension = 0usize;
        let mut coords: Vec<(usize, f64, f64)> = Vec::new();

        let mut in_coords = false;

        for line in reader.lines() {
            let line = line?;
            let line = line.trim();

            if line.is_empty() || line == "EOF" {
                continue;
            }

            if let Some((key, value)) = line.split_once(':') {
                let key = key.trim();
                let value = value.trim();
                match key {
                    "NAME" => {
                        name = value.to_string();
                        continue;
                    }
                    "COMMENT" => {
                        comment = value.to_string();
                        continue;
                    }
                    "DIMENSION" => {
                        dimension = value
                            .parse()
                            .map_err(|_| SolverError::Parse(format!("invalid dimension '{}'", value)))?;
                        continue;
                    }
                    "TYPE" | "EDGE_WEIGHT_TYPE" | "EDGE_WEIGHT_FORMAT" | "DISPLAY_DATA_TYPE" => {
                        continue;
                    }
                    _ => {}
                }
            }

            if line.starts_with("NODE_COORD_SECTION") {
                in_coords = true;
                continue;
            }
            if line.starts_with("DISPLAY_DATA_SECTION") || line.starts_with("TOUR_SECTION") {
                in_coords = false;
                continue;
            }

            if in_coords {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() >= 3 {
                    let id: usize = parts[0]
                        .parse()
                        .map_err(|_| SolverError::Parse(format!("invalid node id '{}'", parts[0])))?;
                    if id == 0 {
                        return Err(SolverError::Parse(
                            "node ids in TSPLIB files are 1-based".to_string(),
                        ));
                    }
                    let x: f64 = parts[1]
                        .parse()
                        .map_err(|_| SolverError::Parse(format!("invalid x coordinate '{}'", parts[1])))?;
                    let y: f64 = parts[2]
                        .parse()
                        .map_err(|_| SolverError::Parse(format!("invalid y coordinate '{}'", parts[2])))?;
                    coords.push((id, x, y));
                }
            }
        }

        if coords.is_empty() {
            return Err(SolverError::Parse(
                "file contains no node coordinates".to_string(),
            ));
        }
        if dimension == 0 {
            dimension = coords.len();
        }
        if coords.len() != dimension {
            return Err(SolverError::Parse(format!(
                "DIMENSION says {} nodes but coordinate section has {}",
                dimension,
                coords.len()
            )));
        }

        // File ids are 1-based; renumber to the stable 0-based indices the
        // solvers work with.
        let nodes = coords
            .iter()
            .map(|&(id, x, y)| Node::new(id - 1, x, y))
            .collect();

        Ok(TspInstance {
            name,
            comment,
            dimension,
            nodes,
        })
    }

    /// Rebuild an instance from a coordinate cache written by
    /// [`TspInstance::write_coordinate_cache`].
    pub fn from_coordinate_cache<P: AsRef<Path>>(name: &str, path: P) -> SolverResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .from_path(path.as_ref())?;

        let mut nodes = Vec::new();
        for (i, record) in reader.deserialize().enumerate() {
            let row: CachedPoint = record?;
            nodes.push(Node::new(i, row.x, row.y));
        }

        if nodes.is_empty() {
            return Err(SolverError::Parse(format!(
                "coordinate cache {:?} is empty",
                path.as_ref()
            )));
        }

        Ok(TspInstance {
            name: name.to_string(),
            comment: String::new(),
            dimension: nodes.len(),
            nodes,
        })
    }

    /// Write the coordinate table as a tab-delimited file with an `x`/`y`
    /// header row, one row per city.
    ///
    /// An existing cache is left untouched. Returns whether a file was
    /// written.
    pub fn write_coordinate_cache<P: AsRef<Path>>(&self, path: P) -> SolverResult<bool> {
        if path.as_ref().exists() {
            log::info!("coordinate cache {:?} already exists, skipping", path.as_ref());
            return Ok(false);
        }

        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(path.as_ref())?;

        for node in &self.nodes {
            writer.serialize(CachedPoint { x: node.x, y: node.y })?;
        }
        writer.flush()?;

        log::info!("coordinate cache saved to {:?}", path.as_ref());
        Ok(true)
    }

    /// Generate a uniform random instance on a `side` x `side` square.
    /// Deterministic via seed.
    pub fn random(name: &str, n: usize, side: f64, seed: u64) -> Self {
        use rand::prelude::*;
        use rand_chacha::ChaCha8Rng;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let nodes = (0..n)
            .map(|id| Node::new(id, rng.gen_range(0.0..side), rng.gen_range(0.0..side)))
            .collect();

        TspInstance {
            name: name.to_string(),
            comment: format!("uniform random instance, seed {}", seed),
            dimension: n,
            nodes,
        }
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let mut distances: Vec<f64> = Vec::new();
        for i in 0..self.dimension {
            for j in i + 1..self.dimension {
                let dx = self.nodes[i].x - self.nodes[j].x;
                let dy = self.nodes[i].y - self.nodes[j].y;
                distances.push((dx * dx + dy * dy).sqrt());
            }
        }

        let avg_distance = distances.iter().sum::<f64>() / distances.len().max(1) as f64;
        let max_distance = distances.iter().cloned().fold(0.0, f64::max);
        let min_distance = distances.iter().cloned().fold(f64::INFINITY, f64::min);

        InstanceStatistics {
            name: self.name.clone(),
            dimension: self.dimension,
            avg_distance,
            min_distance,
            max_distance,
        }
    }
}

/// Row shape of the coordinate cache file.
#[derive(Debug, Serialize, Deserialize)]
struct CachedPoint {
    x: f64,
    y: f64,
}

/// Load a known-optimal tour from a TSPLIB `.opt.tour` file.
///
/// Returns the tour as 0-based city indices. Used only to report the
/// optimal cost for comparison; the heuristics never see it.
pub fn load_optimal_tour<P: AsRef<Path>>(path: P) -> SolverResult<Vec<usize>> {
    let file = File::open(&path)?;
    optimal_tour_from_reader(BufReader::new(file))
}

/// Parse a TSPLIB tour section from any buffered reader.
pub fn optimal_tour_from_reader<R: BufRead>(reader: R) -> SolverResult<Vec<usize>> {
    let mut tour = Vec::new();
    let mut in_tour = false;

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() || line == "EOF" {
            continue;
        }
        if line.starts_with("TOUR_SECTION") {
            in_tour = true;
            continue;
        }
        if !in_tour {
            continue;
        }

        // Ids may come one per line or space-separated; -1 terminates.
        for token in line.split_whitespace() {
            let id: i64 = token
                .parse()
                .map_err(|_| SolverError::Parse(format!("invalid tour entry '{}'", token)))?;
            if id == -1 {
                in_tour = false;
                break;
            }
            if id < 1 {
                return Err(SolverError::Parse(format!("invalid tour entry '{}'", token)));
            }
            tour.push((id - 1) as usize);
        }
    }

    if tour.is_empty() {
        return Err(SolverError::Parse("tour file contains no cities".to_string()));
    }

    Ok(tour)
}

/// Statistics about a TSP instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub dimension: usize,
    pub avg_distance: f64,
    pub min_distance: f64,
    pub max_distance: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Cities: {}", self.dimension)?;
        writeln!(f, "  Avg distance: {:.2}", self.avg_distance)?;
        writeln!(f, "  Min distance: {:.2}", self.min_distance)?;
        writeln!(f, "  Max distance: {:.2}", self.max_distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = "NAME : square4\n\
        COMMENT : unit square\n\
        TYPE : TSP\n\
        DIMENSION : 4\n\
        EDGE_WEIGHT_TYPE : EUC_2D\n\
        NODE_COORD_SECTION\n\
        1 0.0 0.0\n\
        2 1.0 0.0\n\
        3 1.0 1.0\n\
        4 0.0 1.0\n\
        EOF\n";

    #[test]
    fn test_parse_tsplib() {
        let instance = TspInstance::from_reader(Cursor::new(SAMPLE)).unwrap();
        assert_eq!(instance.name, "square4");
        assert_eq!(instance.dimension, 4);
        assert_eq!(instance.nodes.len(), 4);
        assert_eq!(instance.nodes[0].id, 0);
        assert_eq!(instance.nodes[3].y, 1.0);
    }

    #[test]
    fn test_parse_dimension_mismatch() {
        let bad = "DIMENSION : 5\nNODE_COORD_SECTION\n1 0 0\n2 1 1\nEOF\n";
        assert!(matches!(
            TspInstance::from_reader(Cursor::new(bad)),
            Err(SolverError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_optimal_tour() {
        let text = "NAME : square4.opt.tour\nTYPE : TOUR\nDIMENSION : 4\n\
            TOUR_SECTION\n1\n2\n3\n4\n-1\nEOF\n";
        let tour = optimal_tour_from_reader(Cursor::new(text)).unwrap();
        assert_eq!(tour, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_coordinate_cache_round_trip() {
        let instance = TspInstance::random("cache-test", 12, 100.0, 7);
        let path = std::env::temp_dir().join("tsp_bench_cache_test.csv");
        let _ = std::fs::remove_file(&path);

        assert!(instance.write_coordinate_cache(&path).unwrap());
        // Second write is a no-op.
        assert!(!instance.write_coordinate_cache(&path).unwrap());

        let restored = TspInstance::from_coordinate_cache("cache-test", &path).unwrap();
        assert_eq!(restored.dimension, instance.dimension);
        for (a, b) in instance.nodes.iter().zip(restored.nodes.iter()) {
            assert_eq!(a.x, b.x);
            assert_eq!(a.y, b.y);
        }

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_random_is_deterministic() {
        let a = TspInstance::random("r", 20, 50.0, 42);
        let b = TspInstance::random("r", 20, 50.0, 42);
        for (x, y) in a.nodes.iter().zip(b.nodes.iter()) {
            assert_eq!(x.x, y.x);
            assert_eq!(x.y, y.y);
        }
    }
}
