//! Benchmark result model and its console summary

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::time::Duration;

const MB: u64 = 1024 * 1024;

/// Outcome of one scenario run against one service flavor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkResult {
    pub module_name: String,
    pub scenario_name: String,

    #[serde(serialize_with = "as_millis")]
    pub total_duration: Duration,
    #[serde(serialize_with = "as_millis")]
    pub average_latency: Duration,
    #[serde(serialize_with = "as_millis")]
    pub p50_latency: Duration,
    #[serde(serialize_with = "as_millis")]
    pub p95_latency: Duration,
    #[serde(serialize_with = "as_millis")]
    pub p99_latency: Duration,

    pub total_operations: u64,
    pub failed_operations: u64,
    pub operations_per_second: f64,

    // resident memory of the benchmark process, in bytes
    pub memory_used_before: u64,
    pub memory_used_after: u64,
    pub memory_delta: i64,
    pub peak_thread_count: u64,

    pub additional_metrics: BTreeMap<String, serde_json::Value>,
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
}

/// Latency figures derived from a set of per-request samples
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatencyStats {
    pub average: Duration,
    pub p50: Duration,
    pub p95: Duration,
    pub p99: Duration,
}

impl LatencyStats {
    /// Builds the stats from raw nanosecond samples (any order).
    pub fn from_nanos(mut samples: Vec<u64>) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        samples.sort_unstable();

        let sum: u128 = samples.iter().map(|s| *s as u128).sum();
        let average = (sum / samples.len() as u128) as u64;

        Self {
            average: Duration::from_nanos(average),
            p50: Duration::from_nanos(percentile(&samples, 50.0)),
            p95: Duration::from_nanos(percentile(&samples, 95.0)),
            p99: Duration::from_nanos(percentile(&samples, 99.0)),
        }
    }
}

/// Nearest-rank percentile over an ascending slice; 0 for an empty slice.
pub fn percentile(sorted: &[u64], p: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let rank = (p / 100.0 * sorted.len() as f64).ceil() as i64 - 1;
    let index = rank.clamp(0, sorted.len() as i64 - 1) as usize;
    sorted[index]
}

/// Operations per second for `operations` completed within `elapsed`.
pub fn throughput(operations: u64, elapsed: Duration) -> f64 {
    let nanos = elapsed.as_nanos();
    if nanos == 0 {
        return 0.0;
    }
    operations as f64 * 1_000_000_000.0 / nanos as f64
}

/// Formats an integer with `,` between groups of three digits.
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

impl BenchmarkResult {
    pub fn memory_delta_mb(&self) -> i64 {
        self.memory_delta / MB as i64
    }

    pub fn render_summary(&self) -> String {
        let heavy = "═".repeat(60);
        let light = "─".repeat(60);
        let ms = |d: Duration| group_thousands(d.as_millis() as i64);

        let mut lines = vec![
            heavy.clone(),
            format!("Module: {} | Scenario: {}", self.module_name, self.scenario_name),
            light.clone(),
            format!("Total duration:     {} ms", ms(self.total_duration)),
            format!("Operations:         {}", group_thousands(self.total_operations as i64)),
            format!("Failed:             {}", group_thousands(self.failed_operations as i64)),
            format!("Throughput:         {:.2} ops/sec", self.operations_per_second),
            light.clone(),
            format!("Avg latency:        {} ms", ms(self.average_latency)),
            format!("P50 latency:        {} ms", ms(self.p50_latency)),
            format!("P95 latency:        {} ms", ms(self.p95_latency)),
            format!("P99 latency:        {} ms", ms(self.p99_latency)),
            light,
            format!("Memory before:      {} MB", group_thousands((self.memory_used_before / MB) as i64)),
            format!("Memory after:       {} MB", group_thousands((self.memory_used_after / MB) as i64)),
            format!("Memory delta:       {} MB", group_thousands(self.memory_delta_mb())),
            format!("Peak threads:       {}", group_thousands(self.peak_thread_count as i64)),
            heavy,
        ];
        lines.push(String::new());
        lines.join("\n")
    }

    pub fn print_summary(&self) {
        print!("{}", self.render_summary());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_nearest_rank() {
        let samples: Vec<u64> = (1..=100).collect();
        assert_eq!(percentile(&samples, 50.0), 50);
        assert_eq!(percentile(&samples, 95.0), 95);
        assert_eq!(percentile(&samples, 99.0), 99);
        assert_eq!(percentile(&samples, 100.0), 100);
        assert_eq!(percentile(&samples, 0.0), 1);
    }

    #[test]
    fn test_percentile_small_and_empty() {
        assert_eq!(percentile(&[], 95.0), 0);
        assert_eq!(percentile(&[7], 50.0), 7);
        assert_eq!(percentile(&[1, 2, 3], 50.0), 2);
        assert_eq!(percentile(&[1, 2, 3], 99.0), 3);
    }

    #[test]
    fn test_latency_stats_sorts_input() {
        let stats = LatencyStats::from_nanos(vec![4_000_000, 1_000_000, 3_000_000, 2_000_000]);
        assert_eq!(stats.average, Duration::from_micros(2500));
        assert_eq!(stats.p50, Duration::from_millis(2));
        assert_eq!(stats.p95, Duration::from_millis(4));
        assert_eq!(LatencyStats::from_nanos(vec![]), LatencyStats::default());
    }

    #[test]
    fn test_throughput() {
        assert_eq!(throughput(500, Duration::from_secs(2)), 250.0);
        assert_eq!(throughput(10, Duration::ZERO), 0.0);
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
        assert_eq!(group_thousands(-45678), "-45,678");
    }

    #[test]
    fn test_render_summary() {
        let result = BenchmarkResult {
            module_name: "reactive".to_string(),
            scenario_name: "aggregation-100-concurrent".to_string(),
            total_duration: Duration::from_millis(12_345),
            average_latency: Duration::from_millis(120),
            p50_latency: Duration::from_millis(110),
            p95_latency: Duration::from_millis(160),
            p99_latency: Duration::from_millis(190),
            total_operations: 1000,
            failed_operations: 2,
            operations_per_second: 81.0,
            memory_used_before: 10 * MB,
            memory_used_after: 14 * MB,
            memory_delta: 4 * MB as i64,
            peak_thread_count: 104,
            additional_metrics: BTreeMap::new(),
        };

        let summary = result.render_summary();
        assert!(summary.contains("Module: reactive | Scenario: aggregation-100-concurrent"));
        assert!(summary.contains("Total duration:     12,345 ms"));
        assert!(summary.contains("Operations:         1,000"));
        assert!(summary.contains("Throughput:         81.00 ops/sec"));
        assert!(summary.contains("P95 latency:        160 ms"));
        assert!(summary.contains("Memory delta:       4 MB"));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["p95Latency"], 160.0);
        assert_eq!(json["failedOperations"], 2);
    }
}
