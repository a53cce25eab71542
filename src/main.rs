//! tsp-bench - Command Line Interface
//!
//! Benchmarks heuristic TSP solvers against known-optimal tours.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tsp_bench::benchmark::{load_instances_from_dir, Benchmark, BenchmarkConfig};
use tsp_bench::heuristics::{
    Christofides, NearestNeighbour, TourConstruction, TourImprovement, TwoOpt,
};
use tsp_bench::instance::{load_optimal_tour, TspInstance};
use tsp_bench::matrix::DistanceMatrix;
use tsp_bench::solution::{evaluate, Tour};

#[derive(Parser)]
#[command(name = "tsp-bench")]
#[command(version = "1.0")]
#[command(about = "Benchmarks heuristic TSP solvers against known-optimal tours")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a single instance with timed repetitions
    Solve {
        /// Path to the TSPLIB instance file
        #[arg(short, long)]
        instance: PathBuf,

        /// Algorithm to run
        #[arg(short, long, value_enum, default_value = "all")]
        algorithm: Algorithm,

        /// Starting city for Nearest Neighbour
        #[arg(long, default_value = "0")]
        start: usize,

        /// Try every starting city and keep the best (O(N^3) restarts)
        #[arg(long)]
        all_starts: bool,

        /// Maximum 2-opt improving moves; -1 means run to convergence
        #[arg(long, default_value = "-1", allow_hyphen_values = true)]
        two_opt_iterations: i64,

        /// Number of timed repetitions
        #[arg(short, long, default_value = "1")]
        runs: usize,

        /// Directory for the coordinate cache
        #[arg(long, default_value = "output_coordinates")]
        cache_dir: PathBuf,

        /// Write the best tour as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run benchmarks on a directory of instances
    Benchmark {
        /// Directory containing TSPLIB instance files
        #[arg(short, long)]
        dir: PathBuf,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Number of timed repetitions per algorithm
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Maximum 2-opt improving moves; -1 means run to convergence
        #[arg(long, default_value = "-1", allow_hyphen_values = true)]
        two_opt_iterations: i64,

        /// Try every Nearest Neighbour starting city
        #[arg(long)]
        all_starts: bool,

        /// Run repetitions in parallel
        #[arg(long)]
        parallel: bool,

        /// Maximum instance size
        #[arg(long)]
        max_size: Option<usize>,
    },

    /// Analyze an instance
    Analyze {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,
    },

    /// Generate a random instance as a coordinate cache file
    Generate {
        /// Output path for the coordinate file
        #[arg(short, long)]
        output: PathBuf,

        /// Number of cities
        #[arg(short, long, default_value = "100")]
        nodes: usize,

        /// Square side length for coordinates
        #[arg(long, default_value = "1000.0")]
        side: f64,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Algorithm {
    /// Nearest Neighbour construction only
    Nn,
    /// Nearest Neighbour followed by 2-opt
    NnTwoOpt,
    /// Christofides approximation
    Christofides,
    /// Both pipelines
    All,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            instance,
            algorithm,
            start,
            all_starts,
            two_opt_iterations,
            runs,
            cache_dir,
            output,
            verbose,
        } => {
            solve_instance(
                &instance,
                algorithm,
                start,
                all_starts,
                budget(two_opt_iterations),
                runs,
                &cache_dir,
                output,
                verbose,
            );
        }

        Commands::Benchmark {
            dir,
            output,
            runs,
            two_opt_iterations,
            all_starts,
            parallel,
            max_size,
        } => {
            run_benchmark(
                &dir,
                &output,
                runs,
                budget(two_opt_iterations),
                all_starts,
                parallel,
                max_size,
            );
        }

        Commands::Analyze { instance } => {
            analyze_instance(&instance);
        }

        Commands::Generate {
            output,
            nodes,
            side,
            seed,
        } => {
            generate_instance(&output, nodes, side, seed);
        }
    }
}

/// Map the CLI's `-1 = no limit` convention onto the library's option.
fn budget(two_opt_iterations: i64) -> Option<usize> {
    if two_opt_iterations < 0 {
        None
    } else {
        Some(two_opt_iterations as usize)
    }
}

/// Load an instance, routing the coordinates through the cache file so
/// repeated invocations skip TSPLIB parsing.
fn load_through_cache(path: &Path, cache_dir: &Path) -> Result<TspInstance, String> {
    let instance = TspInstance::from_file(path).map_err(|e| e.to_string())?;

    std::fs::create_dir_all(cache_dir).map_err(|e| e.to_string())?;
    let cache_path = cache_dir.join(format!("{}_coordinates.csv", instance.name));

    instance
        .write_coordinate_cache(&cache_path)
        .map_err(|e| e.to_string())?;

    TspInstance::from_coordinate_cache(&instance.name, &cache_path).map_err(|e| e.to_string())
}

/// Report the optimal tour cost when a sibling `.opt.tour` file exists.
fn optimal_cost_for(path: &Path, instance: &TspInstance, matrix: &DistanceMatrix) -> Option<f64> {
    let tour_path = path.with_extension("opt.tour");
    if !tour_path.exists() {
        println!("File not found: {}", tour_path.display());
        return None;
    }

    match load_optimal_tour(&tour_path).and_then(|order| evaluate(matrix, &order)) {
        Ok(cost) => {
            println!("\nOptimal tour distance of {}: {:.2}\n", instance.name, cost);
            Some(cost)
        }
        Err(e) => {
            eprintln!("Cannot use optimal tour {}: {}", tour_path.display(), e);
            None
        }
    }
}

/// Run one pipeline `runs` times, print per-run timings and the distance.
fn timed_runs<F>(label: &str, runs: usize, optimal: Option<f64>, run: F) -> Tour
where
    F: Fn() -> Tour,
{
    println!("Runtime for {}:", label);

    // At least one run, so a best tour always exists.
    let runs = runs.max(1);
    let mut best: Option<Tour> = None;
    let mut timings = Vec::with_capacity(runs);

    for _ in 0..runs {
        let begin = Instant::now();
        let tour = run();
        timings.push(format!("{:.6}", begin.elapsed().as_secs_f64()));

        match &best {
            Some(b) if b.cost <= tour.cost => {}
            _ => best = Some(tour),
        }
    }

    println!("{}", timings.join(";"));

    let best = best.expect("at least one run");
    println!("Total distance for {}:\n{:.2}", label, best.cost);
    if let Some(opt) = optimal {
        println!("Gap to optimal: {:.2}%", (best.cost - opt) / opt * 100.0);
    }

    best
}

#[allow(clippy::too_many_arguments)]
fn solve_instance(
    path: &Path,
    algorithm: Algorithm,
    start: usize,
    all_starts: bool,
    two_opt_iterations: Option<usize>,
    runs: usize,
    cache_dir: &Path,
    output: Option<PathBuf>,
    verbose: bool,
) {
    println!("Loading instance from {:?}...", path);

    let instance = match load_through_cache(path, cache_dir) {
        Ok(inst) => inst,
        Err(e) => {
            eprintln!("Error loading instance: {}", e);
            std::process::exit(1);
        }
    };

    let matrix = match DistanceMatrix::from_nodes(&instance.nodes) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error building distance matrix: {}", e);
            std::process::exit(1);
        }
    };

    if verbose {
        println!("{}", instance.statistics());
    }

    let optimal = optimal_cost_for(path, &instance, &matrix);

    let constructor = if all_starts {
        NearestNeighbour::best_of_all_starts()
    } else {
        NearestNeighbour::from_start(start)
    };

    let run_nn = || match constructor.construct(&matrix) {
        Ok(tour) => tour,
        Err(e) => {
            eprintln!("Nearest Neighbour failed: {}", e);
            std::process::exit(1);
        }
    };

    let run_nn_two_opt = || {
        let mut tour = run_nn();
        let two_opt = TwoOpt {
            max_iterations: two_opt_iterations,
        };
        if let Err(e) = two_opt.improve(&matrix, &mut tour) {
            eprintln!("2-opt failed: {}", e);
            std::process::exit(1);
        }
        tour
    };

    let run_christofides = || match Christofides::new().construct(&matrix) {
        Ok(tour) => tour,
        Err(e) => {
            eprintln!("Christofides failed: {}", e);
            std::process::exit(1);
        }
    };

    let best = match algorithm {
        Algorithm::Nn => timed_runs(constructor.name(), runs, optimal, &run_nn),
        Algorithm::NnTwoOpt => timed_runs(
            &format!("{} with 2-opt", constructor.name()),
            runs,
            optimal,
            &run_nn_two_opt,
        ),
        Algorithm::Christofides => timed_runs("Christofides", runs, optimal, &run_christofides),
        Algorithm::All => {
            let nn = timed_runs(
                &format!("{} with 2-opt", constructor.name()),
                runs,
                optimal,
                &run_nn_two_opt,
            );
            let chr = timed_runs("Christofides", runs, optimal, &run_christofides);
            if chr.cost < nn.cost {
                chr
            } else {
                nn
            }
        }
    };

    if verbose {
        println!("\n{}", best);
    }

    if let Some(out_path) = output {
        match serde_json::to_string_pretty(&best) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&out_path, json) {
                    eprintln!("Failed to write output: {}", e);
                    std::process::exit(1);
                }
                println!("\nTour saved to {:?}", out_path);
            }
            Err(e) => {
                eprintln!("Failed to serialize tour: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn run_benchmark(
    dir: &Path,
    output: &Path,
    runs: usize,
    two_opt_iterations: Option<usize>,
    all_starts: bool,
    parallel: bool,
    max_size: Option<usize>,
) {
    println!("Loading instances from {:?}...", dir);

    let mut instances = load_instances_from_dir(dir);

    if let Some(max) = max_size {
        instances.retain(|i| i.dimension <= max);
    }

    println!("Found {} instances", instances.len());

    if instances.is_empty() {
        eprintln!("No instances found!");
        return;
    }

    if let Err(e) = std::fs::create_dir_all(output) {
        eprintln!("Failed to create output directory: {}", e);
        std::process::exit(1);
    }

    let config = BenchmarkConfig {
        num_runs: runs,
        two_opt_iterations,
        try_all_starts: all_starts,
        parallel,
        output_dir: output.to_string_lossy().to_string(),
    };

    let mut benchmark = Benchmark::new(config);

    for (i, instance) in instances.iter().enumerate() {
        println!(
            "\n[{}/{}] Processing {} (n={})...",
            i + 1,
            instances.len(),
            instance.name,
            instance.dimension
        );

        let matrix = match DistanceMatrix::from_nodes(&instance.nodes) {
            Ok(m) => m,
            Err(e) => {
                eprintln!("Skipping {}: {}", instance.name, e);
                continue;
            }
        };

        // Register the optimal cost when the directory carries a tour file.
        let tour_path = dir.join(format!("{}.opt.tour", instance.name));
        if tour_path.exists() {
            match load_optimal_tour(&tour_path) {
                Ok(order) => match benchmark.register_optimal_tour(instance, &matrix, &order) {
                    Ok(cost) => println!("Optimal tour distance: {:.2}", cost),
                    Err(e) => eprintln!("Ignoring optimal tour for {}: {}", instance.name, e),
                },
                Err(e) => eprintln!("Ignoring {}: {}", tour_path.display(), e),
            }
        }

        if let Err(e) = benchmark.run_full_benchmark(instance, &matrix) {
            eprintln!("Benchmark failed on {}: {}", instance.name, e);
        }
    }

    let results_path = output.join("results.csv");
    if let Err(e) = benchmark.export_to_csv(&results_path) {
        eprintln!("Failed to export results: {}", e);
        std::process::exit(1);
    }
    println!("\nResults exported to {:?}", results_path);

    let stats_path = output.join("statistics.csv");
    if let Err(e) = benchmark.export_statistics_csv(&stats_path) {
        eprintln!("Failed to export statistics: {}", e);
        std::process::exit(1);
    }
    println!("Statistics exported to {:?}", stats_path);

    let report = benchmark.generate_report();
    println!("\n{}", report);

    let report_path = output.join("report.txt");
    if let Err(e) = std::fs::write(&report_path, &report) {
        eprintln!("Failed to save report: {}", e);
        std::process::exit(1);
    }
    println!("Report saved to {:?}", report_path);
}

fn analyze_instance(path: &Path) {
    let instance = match TspInstance::from_file(path) {
        Ok(inst) => inst,
        Err(e) => {
            eprintln!("Error loading instance: {}", e);
            std::process::exit(1);
        }
    };

    println!("========== Instance Analysis ==========\n");
    println!("{}", instance.statistics());

    let matrix = match DistanceMatrix::from_nodes(&instance.nodes) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error building distance matrix: {}", e);
            std::process::exit(1);
        }
    };

    println!("\nQuick Tour Estimates:");

    match NearestNeighbour::from_start(0).construct(&matrix) {
        Ok(mut tour) => {
            let nn_cost = tour.cost;
            if TwoOpt::new().improve(&matrix, &mut tour).is_ok() {
                println!("  Nearest Neighbour: {:.2}", nn_cost);
                println!("  Nearest Neighbour + 2-opt: {:.2}", tour.cost);
            }
        }
        Err(e) => eprintln!("  Nearest Neighbour failed: {}", e),
    }

    match Christofides::new().construct(&matrix) {
        Ok(tour) => println!("  Christofides: {:.2}", tour.cost),
        Err(e) => eprintln!("  Christofides failed: {}", e),
    }
}

fn generate_instance(output: &Path, nodes: usize, side: f64, seed: u64) {
    let name = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "random".to_string());

    let instance = TspInstance::random(&name, nodes, side, seed);

    match instance.write_coordinate_cache(output) {
        Ok(true) => println!("Instance with {} cities saved to {:?}", nodes, output),
        Ok(false) => println!("File {:?} already exists, not overwritten", output),
        Err(e) => {
            eprintln!("Failed to write instance: {}", e);
            std::process::exit(1);
        }
    }
}
