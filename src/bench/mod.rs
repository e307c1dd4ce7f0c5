//! Load generator comparing the three product server flavors.

pub mod client;
pub mod executor;
pub mod metrics;
pub mod report;

use crate::model::BenchmarkResult;
use crate::service::Flavor;
use clap::{ArgAction, Parser, ValueEnum};
use client::BenchmarkClient;
use executor::BenchmarkExecutor;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    All,
    Aggregation,
    Db,
}

impl Scenario {
    pub fn includes_aggregation(&self) -> bool {
        matches!(self, Scenario::All | Scenario::Aggregation)
    }

    pub fn includes_db(&self) -> bool {
        matches!(self, Scenario::All | Scenario::Db)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::All => "all",
            Scenario::Aggregation => "aggregation",
            Scenario::Db => "db",
        }
    }
}

/// Run the I/O benchmark across the pooled, reactive and threaded servers
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Total requests per module and scenario
    #[arg(short, long, default_value_t = 1000)]
    pub requests: usize,

    /// Concurrent requests
    #[arg(short, long, default_value_t = 100)]
    pub concurrency: usize,

    /// Scenario to run
    #[arg(short, long, value_enum, default_value_t = Scenario::All)]
    pub scenario: Scenario,

    /// Host running the product servers
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// Pooled server port
    #[arg(long, default_value_t = 8081)]
    pub pooled_port: u16,

    /// Reactive server port
    #[arg(long, default_value_t = 8082)]
    pub reactive_port: u16,

    /// Threaded server port
    #[arg(long, default_value_t = 8083)]
    pub threaded_port: u16,

    /// Modules to benchmark (comma separated)
    #[arg(short, long, value_enum, value_delimiter = ',', default_values_t = Flavor::ALL)]
    pub modules: Vec<Flavor>,

    /// Seed initial products before running
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    pub seed: bool,

    /// Number of products to seed
    #[arg(long, default_value_t = 100)]
    pub seed_count: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,

    /// Write all results as JSON to this file
    #[arg(short, long)]
    pub output: Option<String>,
}

impl Args {
    pub fn port(&self, flavor: Flavor) -> u16 {
        match flavor {
            Flavor::Pooled => self.pooled_port,
            Flavor::Reactive => self.reactive_port,
            Flavor::Threaded => self.threaded_port,
        }
    }

    pub fn base_url(&self, flavor: Flavor) -> String {
        format!("http://{}:{}", self.host, self.port(flavor))
    }
}

/// Runs every selected scenario against one server; an unreachable server
/// yields no results.
pub fn run_module(args: &Args, flavor: Flavor, base_url: &str) -> Vec<BenchmarkResult> {
    let client = BenchmarkClient::new(base_url, Duration::from_secs(args.timeout_secs));
    let executor = BenchmarkExecutor::new(client, flavor.name());
    run_with_executor(args, &executor)
}

pub fn run_with_executor(args: &Args, executor: &BenchmarkExecutor) -> Vec<BenchmarkResult> {
    let mut results = Vec::new();
    let base_url = executor.client().base_url();

    if !executor.client().health_check() {
        tracing::warn!("{} is not healthy, skipping", base_url);
        println!("Warning: {} is not reachable, skipping", base_url);
        return results;
    }

    if args.seed {
        println!("Seeding data...");
        if let Err(e) = executor.seed_data(args.seed_count) {
            tracing::warn!("Could not seed data into {}: {}", base_url, e);
            eprintln!("Warning: Could not seed data - {}", e);
        }
    }

    if args.scenario.includes_aggregation() {
        println!("\n▶ Running aggregation benchmark...");
        let result = executor.run_aggregation(args.requests, args.concurrency);
        result.print_summary();
        results.push(result);
    }

    if args.scenario.includes_db() {
        println!("\n▶ Running DB benchmark...");
        let result = executor.run_db(args.requests, args.concurrency);
        result.print_summary();
        results.push(result);
    }

    results
}

pub fn write_results(path: impl AsRef<Path>, results: &[BenchmarkResult]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    fs::write(path, json)?;
    Ok(())
}

/// Entry point of the `benchmark` binary; returns the process exit code.
pub fn run(args: Args) -> i32 {
    let modules: Vec<String> = args.modules.iter().map(|m| m.to_string()).collect();
    report::print_banner(args.requests, args.concurrency, args.scenario.name(), &modules);

    let mut all_results = Vec::new();
    for flavor in &args.modules {
        let url = args.base_url(*flavor);
        report::print_module_header(flavor.name(), &url);
        all_results.extend(run_module(&args, *flavor, &url));
    }

    report::print_comparison(&all_results);

    if let Some(path) = &args.output {
        if let Err(e) = write_results(path, &all_results) {
            tracing::error!("Failed to write results to {}: {}", path, e);
            return 1;
        }
        println!("\nResults written to {}", path);
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = Args::parse_from(["benchmark"]);
        assert_eq!(args.requests, 1000);
        assert_eq!(args.concurrency, 100);
        assert_eq!(args.scenario, Scenario::All);
        assert_eq!(args.modules, Flavor::ALL.to_vec());
        assert!(args.seed);
        assert_eq!(args.seed_count, 100);
        assert_eq!(args.base_url(Flavor::Reactive), "http://localhost:8082");
    }

    #[test]
    fn test_module_subset_and_flags() {
        let args = Args::parse_from([
            "benchmark",
            "-m",
            "threaded,pooled",
            "-s",
            "db",
            "--seed",
            "false",
            "--host",
            "10.0.0.5",
            "--threaded-port",
            "9003",
        ]);
        assert_eq!(args.modules, vec![Flavor::Threaded, Flavor::Pooled]);
        assert!(!args.scenario.includes_aggregation());
        assert!(args.scenario.includes_db());
        assert!(!args.seed);
        assert_eq!(args.base_url(Flavor::Threaded), "http://10.0.0.5:9003");
    }

    #[test]
    fn test_unhealthy_module_is_skipped() {
        let args = Args::parse_from(["benchmark", "-r", "10", "--timeout-secs", "1"]);
        let results = run_module(&args, Flavor::Pooled, "http://127.0.0.1:9");
        assert!(results.is_empty());
    }

    #[test]
    fn test_write_results() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        write_results(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");

        assert!(write_results(dir.path().join("missing/results.json"), &[]).is_err());
    }
}
