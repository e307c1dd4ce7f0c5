//! Console output of the benchmark runner

use crate::model::BenchmarkResult;

// inner width of the comparison rows
const TABLE_WIDTH: usize = 77;

pub fn print_banner(requests: usize, concurrency: usize, scenario: &str, modules: &[String]) {
    let line = "═".repeat(63);
    println!("╔{}╗", line);
    println!("║{:^63}║", "I/O Benchmark: Pooled vs Reactive vs Threaded");
    println!("╚{}╝", line);
    println!();
    println!("Configuration: {} requests, {} concurrent", requests, concurrency);
    println!("Scenarios: {}", scenario);
    println!("Modules: {}", modules.join(", "));
    println!();
}

pub fn print_module_header(name: &str, url: &str) {
    let line = "═".repeat(60);
    println!();
    println!("{}", line);
    println!("Testing module: {} ({})", name, url);
    println!("{}", line);
}

/// Shortens `s` to `max_len` characters, marking the cut with `...`.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
}

pub fn render_comparison(results: &[BenchmarkResult]) -> String {
    let heavy = "═".repeat(TABLE_WIDTH);
    let mut lines = vec![
        String::new(),
        format!("╔{}╗", heavy),
        format!("║{:^width$}║", "COMPARISON SUMMARY", width = TABLE_WIDTH),
        format!("╠{}╣", heavy),
        format!(
            "║ {:<12} │ {:<20} │ {:>10} │ {:>10} │ {:>11} ║",
            "Module", "Scenario", "Throughput", "P95 (ms)", "Mem Δ (MB)"
        ),
        format!("╠{}╣", heavy),
    ];

    for r in results {
        lines.push(format!(
            "║ {:<12} │ {:<20} │ {:>10.1} │ {:>10} │ {:>11} ║",
            r.module_name,
            truncate(&r.scenario_name, 20),
            r.operations_per_second,
            r.p95_latency.as_millis(),
            r.memory_delta_mb()
        ));
    }
    lines.push(format!("╚{}╝", heavy));
    lines.push(String::new());
    lines.join("\n")
}

/// The result with the highest throughput among scenarios containing `pattern`.
pub fn winner<'a>(results: &'a [BenchmarkResult], pattern: &str) -> Option<&'a BenchmarkResult> {
    results
        .iter()
        .filter(|r| r.scenario_name.contains(pattern))
        .max_by(|a, b| a.operations_per_second.total_cmp(&b.operations_per_second))
}

pub fn render_winners(results: &[BenchmarkResult]) -> String {
    let mut lines = vec!["Winners by throughput:".to_string()];
    if let Some(r) = winner(results, "aggregation") {
        lines.push(format!(
            "   Aggregation: {} ({:.1} ops/sec)",
            r.module_name, r.operations_per_second
        ));
    }
    if let Some(r) = winner(results, "db") {
        lines.push(format!(
            "   DB ops:      {} ({:.1} ops/sec)",
            r.module_name, r.operations_per_second
        ));
    }
    lines.join("\n")
}

pub fn print_comparison(results: &[BenchmarkResult]) {
    println!("{}", render_comparison(results));
    println!("{}", render_winners(results));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn result(module: &str, scenario: &str, ops: f64) -> BenchmarkResult {
        BenchmarkResult {
            module_name: module.to_string(),
            scenario_name: scenario.to_string(),
            total_duration: Duration::from_secs(1),
            average_latency: Duration::from_millis(10),
            p50_latency: Duration::from_millis(9),
            p95_latency: Duration::from_millis(42),
            p99_latency: Duration::from_millis(50),
            total_operations: 100,
            failed_operations: 0,
            operations_per_second: ops,
            memory_used_before: 0,
            memory_used_after: 3 * 1024 * 1024,
            memory_delta: 3 * 1024 * 1024,
            peak_thread_count: 12,
            additional_metrics: BTreeMap::new(),
        }
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 20), "short");
        assert_eq!(truncate("aggregation-100-concurrent", 20), "aggregation-100-c...");
        assert_eq!(truncate("aggregation-100-concurrent", 20).len(), 20);
        assert_eq!(truncate("exactly-twenty-chars", 20), "exactly-twenty-chars");
    }

    #[test]
    fn test_winner_per_scenario() {
        let results = vec![
            result("pooled", "aggregation-100-concurrent", 300.0),
            result("reactive", "aggregation-100-concurrent", 900.0),
            result("threaded", "db-ops-100-concurrent", 450.0),
            result("pooled", "db-ops-100-concurrent", 500.0),
        ];
        assert_eq!(winner(&results, "aggregation").unwrap().module_name, "reactive");
        assert_eq!(winner(&results, "db").unwrap().module_name, "pooled");
        assert!(winner(&results[..0], "db").is_none());

        let text = render_winners(&results);
        assert!(text.contains("Aggregation: reactive (900.0 ops/sec)"));
        assert!(text.contains("DB ops:      pooled (500.0 ops/sec)"));
    }

    #[test]
    fn test_comparison_rows() {
        let table = render_comparison(&[result("threaded", "aggregation-100-concurrent", 812.34)]);
        let row = table
            .lines()
            .find(|l| l.contains("threaded"))
            .unwrap();
        assert!(row.contains("aggregation-100-c..."));
        assert!(row.contains("812.3"));
        assert!(row.contains(" 42 "));
        assert!(row.contains(" 3 "));
    }

    #[test]
    fn test_comparison_borders_line_up() {
        let table = render_comparison(&[
            result("pooled", "aggregation-100-concurrent", 1234.5),
            result("reactive", "db-ops-5-concurrent", 9.0),
        ]);
        let widths: Vec<usize> = table
            .lines()
            .filter(|l| !l.is_empty())
            .map(|l| l.chars().count())
            .collect();
        assert_eq!(widths.len(), 8);
        assert!(widths.iter().all(|w| *w == TABLE_WIDTH + 2), "{:?}", widths);
    }
}
