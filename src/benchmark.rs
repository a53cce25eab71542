//! Benchmarking and experimentation module.
//!
//! Runs the heuristic pipelines repeatedly against an instance, collects
//! per-run timings and costs, compares against known-optimal tours, and
//! exports results as CSV.

use crate::error::SolverResult;
use crate::heuristics::{
    Christofides, NearestNeighbour, TourConstruction, TourImprovement, TwoOpt,
};
use crate::instance::TspInstance;
use crate::matrix::DistanceMatrix;
use crate::solution::{evaluate, Tour};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Result of running a single algorithm on an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmResult {
    /// Algorithm name
    pub algorithm: String,
    /// Instance name
    pub instance: String,
    /// Instance dimension
    pub dimension: usize,
    /// Tour cost
    pub cost: f64,
    /// Computation time in seconds
    pub time: f64,
    /// Number of improvement iterations (if applicable)
    pub iterations: Option<usize>,
    /// Gap to the known-optimal cost in percent (if available)
    pub gap_to_optimal: Option<f64>,
}

/// Aggregated statistics for an algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    /// Algorithm name
    pub algorithm: String,
    /// Number of recorded runs
    pub num_runs: usize,
    /// Average cost
    pub avg_cost: f64,
    /// Best cost
    pub best_cost: f64,
    /// Worst cost
    pub worst_cost: f64,
    /// Standard deviation of cost
    pub std_cost: f64,
    /// Average time
    pub avg_time: f64,
    /// Total time
    pub total_time: f64,
    /// Average gap to optimal
    pub avg_gap: Option<f64>,
}

/// Benchmark configuration.
///
/// Everything the runner needs travels in here; nothing reads global state.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of timed repetitions per algorithm
    pub num_runs: usize,
    /// 2-opt improvement budget; `None` runs to convergence
    pub two_opt_iterations: Option<usize>,
    /// Use best-of-all-starts Nearest-Neighbour (O(N³) opt-in)
    pub try_all_starts: bool,
    /// Run repetitions in parallel
    pub parallel: bool,
    /// Output directory for exports
    pub output_dir: String,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 1,
            two_opt_iterations: None,
            try_all_starts: false,
            parallel: false,
            output_dir: "results".to_string(),
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<AlgorithmResult>,
    optimal_costs: HashMap<String, f64>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
            optimal_costs: HashMap::new(),
        }
    }

    /// Register the known-optimal cost for an instance.
    pub fn set_optimal_cost(&mut self, instance_name: &str, cost: f64) {
        self.optimal_costs.insert(instance_name.to_string(), cost);
    }

    /// Evaluate a known-optimal tour and register its cost for gap reporting.
    pub fn register_optimal_tour(
        &mut self,
        instance: &TspInstance,
        matrix: &DistanceMatrix,
        order: &[usize],
    ) -> SolverResult<f64> {
        let cost = evaluate(matrix, order)?;
        self.set_optimal_cost(&instance.name, cost);
        Ok(cost)
    }

    fn nearest_neighbour_pipeline(
        config: &BenchmarkConfig,
        matrix: &DistanceMatrix,
    ) -> SolverResult<Tour> {
        let constructor = if config.try_all_starts {
            NearestNeighbour::best_of_all_starts()
        } else {
            NearestNeighbour::from_start(0)
        };
        let two_opt = match config.two_opt_iterations {
            Some(max) => TwoOpt::with_max_iterations(max),
            None => TwoOpt::new(),
        };

        let begin = std::time::Instant::now();
        let mut tour = constructor.construct(matrix)?;
        two_opt.improve(matrix, &mut tour)?;
        tour.algorithm = format!("{}+{}", constructor.name(), two_opt.name());
        tour.computation_time = begin.elapsed().as_secs_f64();
        Ok(tour)
    }

    fn christofides_pipeline(matrix: &DistanceMatrix) -> SolverResult<Tour> {
        Christofides::new().construct(matrix)
    }

    /// Run one pipeline `num_runs` times and record every run.
    ///
    /// The pipelines are deterministic, so the repetitions exist purely for
    /// timing; with `config.parallel` they fan out over rayon (pure runs
    /// over a shared read-only matrix).
    fn run_repeated<F>(&mut self, instance: &TspInstance, run: F) -> SolverResult<Tour>
    where
        F: Fn() -> SolverResult<Tour> + Sync,
    {
        // At least one run, so a best tour always exists.
        let runs = self.config.num_runs.max(1);
        let tours: Vec<SolverResult<Tour>> = if self.config.parallel {
            (0..runs).into_par_iter().map(|_| run()).collect()
        } else {
            (0..runs).map(|_| run()).collect()
        };

        let mut best: Option<Tour> = None;
        for tour in tours {
            let tour = tour?;
            self.record_result(instance, &tour);
            match &best {
                Some(b) if b.cost <= tour.cost => {}
                _ => best = Some(tour),
            }
        }
        Ok(best.expect("at least one run"))
    }

    /// Run the full benchmark (NN + 2-opt, Christofides) on one instance.
    pub fn run_full_benchmark(
        &mut self,
        instance: &TspInstance,
        matrix: &DistanceMatrix,
    ) -> SolverResult<()> {
        log::info!("benchmarking instance {} (n={})", instance.name, instance.dimension);

        let config = self.config.clone();
        self.run_repeated(instance, || Self::nearest_neighbour_pipeline(&config, matrix))?;
        self.run_repeated(instance, || Self::christofides_pipeline(matrix))?;
        Ok(())
    }

    /// Record a result
    fn record_result(&mut self, instance: &TspInstance, tour: &Tour) {
        let gap_to_optimal = self
            .optimal_costs
            .get(&instance.name)
            .map(|&opt| (tour.cost - opt) / opt * 100.0);

        self.results.push(AlgorithmResult {
            algorithm: tour.algorithm.clone(),
            instance: instance.name.clone(),
            dimension: instance.dimension,
            cost: tour.cost,
            time: tour.computation_time,
            iterations: tour.iterations,
            gap_to_optimal,
        });
    }

    /// Compute statistics for each algorithm
    pub fn compute_statistics(&self) -> Vec<AlgorithmStatistics> {
        let mut stats_map: HashMap<String, Vec<&AlgorithmResult>> = HashMap::new();

        for result in &self.results {
            stats_map
                .entry(result.algorithm.clone())
                .or_default()
                .push(result);
        }

        let mut statistics = Vec::new();

        for (algo, results) in stats_map {
            let costs: Vec<f64> = results.iter().map(|r| r.cost).collect();
            let times: Vec<f64> = results.iter().map(|r| r.time).collect();
            let gaps: Vec<f64> = results.iter().filter_map(|r| r.gap_to_optimal).collect();

            let avg_cost = costs.iter().sum::<f64>() / costs.len() as f64;
            let best_cost = costs.iter().cloned().fold(f64::INFINITY, f64::min);
            let worst_cost = costs.iter().cloned().fold(0.0, f64::max);

            let variance =
                costs.iter().map(|c| (c - avg_cost).powi(2)).sum::<f64>() / costs.len() as f64;
            let std_cost = variance.sqrt();

            let avg_time = times.iter().sum::<f64>() / times.len() as f64;
            let total_time = times.iter().sum::<f64>();

            let avg_gap = if !gaps.is_empty() {
                Some(gaps.iter().sum::<f64>() / gaps.len() as f64)
            } else {
                None
            };

            statistics.push(AlgorithmStatistics {
                algorithm: algo,
                num_runs: results.len(),
                avg_cost,
                best_cost,
                worst_cost,
                std_cost,
                avg_time,
                total_time,
                avg_gap,
            });
        }

        statistics.sort_by(|a, b| a.avg_cost.partial_cmp(&b.avg_cost).unwrap());

        statistics
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> SolverResult<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> SolverResult<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("       TSP Heuristic Benchmark Report\n");
        report.push_str("========================================\n\n");

        let stats = self.compute_statistics();

        report.push_str("Algorithm Performance Summary:\n");
        report.push_str("-".repeat(90).as_str());
        report.push('\n');
        report.push_str(&format!(
            "{:<32} {:>6} {:>12} {:>12} {:>10} {:>10}\n",
            "Algorithm", "Runs", "Avg Cost", "Best Cost", "Avg Gap%", "Avg Time"
        ));
        report.push_str("-".repeat(90).as_str());
        report.push('\n');

        for stat in &stats {
            let gap_str = stat
                .avg_gap
                .map(|g| format!("{:.2}%", g))
                .unwrap_or_else(|| "-".to_string());

            report.push_str(&format!(
                "{:<32} {:>6} {:>12.2} {:>12.2} {:>10} {:>10.4}\n",
                stat.algorithm, stat.num_runs, stat.avg_cost, stat.best_cost, gap_str, stat.avg_time
            ));
        }

        report.push_str("-".repeat(90).as_str());
        report.push('\n');

        report.push_str("\nBest Tours per Instance:\n");

        let mut instance_best: HashMap<String, &AlgorithmResult> = HashMap::new();
        for result in &self.results {
            let entry = instance_best.entry(result.instance.clone()).or_insert(result);
            if result.cost < entry.cost {
                *entry = result;
            }
        }

        let mut instances: Vec<_> = instance_best.iter().collect();
        instances.sort_by(|a, b| a.0.cmp(b.0));
        for (instance, best_result) in instances {
            let optimal = self
                .optimal_costs
                .get(instance)
                .map(|o| format!(", optimal {:.2}", o))
                .unwrap_or_default();
            report.push_str(&format!(
                "  {}: {:.2} ({}{})\n",
                instance, best_result.cost, best_result.algorithm, optimal
            ));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[AlgorithmResult] {
        &self.results
    }

    /// Get the registered optimal costs
    pub fn optimal_costs(&self) -> &HashMap<String, f64> {
        &self.optimal_costs
    }
}

/// Helper function to load instances from a directory
pub fn load_instances_from_dir<P: AsRef<Path>>(dir: P) -> Vec<TspInstance> {
    let mut instances = Vec::new();

    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e == "tsp").unwrap_or(false) {
                match TspInstance::from_file(&path) {
                    Ok(instance) => instances.push(instance),
                    Err(e) => log::warn!("skipping {:?}: {}", path, e),
                }
            }
        }
    }

    // Sort by dimension
    instances.sort_by_key(|i| i.dimension);

    instances
}
