//! Dilemma Sim CLI - Run an evolving population from JSON configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use dilemma_sim::{Simulation, SimulationConfig, StopReason};

const DEFAULT_GENERATIONS: usize = 100;

fn main() {
    env_logger::init();

    let mut args: Vec<String> = std::env::args().collect();
    let program = args.remove(0);

    if args.first().map(String::as_str) == Some("--example") {
        print_example_config();
        return;
    }
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage(&program);
        return;
    }

    // Pull out `--history <path>` before reading positionals
    let mut history_path: Option<PathBuf> = None;
    if let Some(pos) = args.iter().position(|a| a == "--history") {
        if pos + 1 >= args.len() {
            eprintln!("Error: --history requires a file path");
            std::process::exit(1);
        }
        history_path = Some(PathBuf::from(args.remove(pos + 1)));
        args.remove(pos);
    }

    let config = match args.first() {
        Some(path) => load_config(Path::new(path)),
        None => SimulationConfig::default(),
    };

    let generations: usize = match args.get(1) {
        Some(s) => s.parse().unwrap_or_else(|e| {
            eprintln!("Error parsing generation count '{}': {}", s, e);
            std::process::exit(1);
        }),
        None => DEFAULT_GENERATIONS,
    };

    if let Err(e) = config.validate() {
        eprintln!("Invalid config: {}", e);
        std::process::exit(1);
    }

    println!("--- Starting Grooming Dilemma Simulation ---");
    println!(
        "Population: {} | Start energy: {} | Metabolism: {} | Mutation: {:.3}",
        config.start_population,
        config.start_energy,
        config.metabolism_cost,
        config.mutation_chance
    );
    if let Some(seed) = config.random_seed {
        println!("Seed: {}", seed);
    }

    let mut sim = Simulation::new(config);
    let start = Instant::now();

    let result = sim.run_with_callback(generations, |snapshot| {
        println!("{}", snapshot.summary());
    });

    if result.stop_reason == StopReason::Extinct {
        println!("--- Population has died out. ---");
    }
    println!(
        "--- Simulation Finished ({} generations, {:.2}s) ---",
        result.generations,
        start.elapsed().as_secs_f32()
    );

    if let Some(last) = result.history.last() {
        println!();
        println!("Final strategy counts:");
        for (strategy, series) in result.history.strategy_series() {
            println!(
                "  {:<14} {:>5}  (peak {})",
                strategy.to_string(),
                last.count(strategy),
                series.iter().max().copied().unwrap_or(0)
            );
        }
    }

    if let Some(path) = history_path {
        if let Err(e) = result.history.save_json(&path) {
            eprintln!("Error writing history to {}: {}", path.display(), e);
            std::process::exit(1);
        }
        println!("History written to {}", path.display());
    }
}

fn load_config(path: &Path) -> SimulationConfig {
    let config_str = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    })
}

fn print_usage(program: &str) {
    eprintln!(
        "Usage: {} [config.json] [generations] [--history out.json]",
        program
    );
    eprintln!();
    eprintln!("Run an evolving grooming-dilemma population.");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  config.json  Path to simulation configuration file (default: built-in)");
    eprintln!(
        "  generations  Number of generations (default: {})",
        DEFAULT_GENERATIONS
    );
    eprintln!("  --history    Write per-generation strategy counts as JSON");
    eprintln!();
    eprintln!("Example configuration is printed with --example.");
}

fn print_example_config() {
    let config = SimulationConfig {
        random_seed: Some(42),
        ..Default::default()
    };

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}
