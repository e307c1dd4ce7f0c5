//! Drives one scenario against one product server with a fixed number of
//! worker threads.

use super::client::{BenchmarkClient, ClientError};
use super::metrics::{PeakTracker, ProcessSampler};
use crate::model::benchmark::{LatencyStats, throughput};
use crate::model::{BenchmarkResult, Product};
use rand::Rng;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Ids the scenarios pick from; seeding creates exactly these.
pub const PRODUCT_ID_RANGE: std::ops::RangeInclusive<i64> = 1..=100;

const MONITOR_INTERVAL: Duration = Duration::from_millis(100);

pub struct BenchmarkExecutor {
    client: BenchmarkClient,
    module_name: String,
    settle: Duration,
}

/// What the workers and the monitor collected during one run
struct RunOutcome {
    latencies: Vec<u64>,
    failures: u64,
    elapsed: Duration,
    peak: PeakTracker,
}

impl BenchmarkExecutor {
    pub fn new(client: BenchmarkClient, module_name: impl Into<String>) -> Self {
        Self {
            client,
            module_name: module_name.into(),
            settle: Duration::from_millis(500),
        }
    }

    /// Pause between warm-up and the measured run.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn client(&self) -> &BenchmarkClient {
        &self.client
    }

    pub fn seed_data(&self, count: usize) -> Result<usize, ClientError> {
        self.client.seed_products(count)
    }

    pub fn run_aggregation(&self, total: usize, concurrency: usize) -> BenchmarkResult {
        tracing::info!(
            "Running aggregation benchmark on {}: {} requests, {} concurrent",
            self.module_name,
            total,
            concurrency
        );

        let warmups = aggregation_warmups(total);
        tracing::info!("Warming up with {} requests", warmups);
        for _ in 0..warmups {
            let _ = self.client.get_aggregation(random_product_id());
        }

        self.measure(
            format!("aggregation-{}-concurrent", concurrency),
            total,
            concurrency,
            |_| {
                let id = random_product_id();
                self.client.get_aggregation(id).map(|_| ()).inspect_err(|e| {
                    tracing::error!("aggregation request for product {} failed: {}", id, e)
                })
            },
        )
    }

    pub fn run_db(&self, total: usize, concurrency: usize) -> BenchmarkResult {
        tracing::info!(
            "Running DB benchmark on {}: {} operations, {} concurrent",
            self.module_name,
            total,
            concurrency
        );

        for i in 0..db_warmups(total) {
            let _ = self.client.get_product((i % 100 + 1) as i64);
        }

        self.measure(
            format!("db-ops-{}-concurrent", concurrency),
            total,
            concurrency,
            |idx| {
                let outcome = if is_write(idx) {
                    let price = rand::rng().random::<f64>() * 100.0;
                    let product = Product::new(
                        format!("BenchProduct-{}", idx),
                        "Benchmark test product",
                        price,
                    );
                    self.client.create_product(&product).map(|_| ())
                } else {
                    self.client.get_product(random_product_id()).map(|_| ())
                };
                outcome.inspect_err(|e| tracing::debug!("DB operation {} failed: {}", idx, e))
            },
        )
    }

    fn measure<F>(
        &self,
        scenario_name: String,
        total: usize,
        concurrency: usize,
        operation: F,
    ) -> BenchmarkResult
    where
        F: Fn(usize) -> Result<(), ClientError> + Sync,
    {
        thread::sleep(self.settle);

        let mut sampler = ProcessSampler::new();
        let before = sampler.sample();

        let outcome = run_workers(total, concurrency, before.threads, &operation);
        let after = sampler.sample();

        let succeeded = outcome.latencies.len() as u64;
        let stats = LatencyStats::from_nanos(outcome.latencies);

        let mut additional_metrics = BTreeMap::new();
        additional_metrics.insert("concurrency".to_string(), concurrency.into());
        additional_metrics.insert("requested".to_string(), total.into());
        additional_metrics.insert("peakMemory".to_string(), outcome.peak.memory.into());

        let result = BenchmarkResult {
            module_name: self.module_name.clone(),
            scenario_name,
            total_duration: outcome.elapsed,
            average_latency: stats.average,
            p50_latency: stats.p50,
            p95_latency: stats.p95,
            p99_latency: stats.p99,
            total_operations: succeeded,
            failed_operations: outcome.failures,
            operations_per_second: throughput(succeeded, outcome.elapsed),
            memory_used_before: before.memory,
            memory_used_after: after.memory,
            memory_delta: after.memory as i64 - before.memory as i64,
            peak_thread_count: outcome.peak.threads.max(after.threads),
            additional_metrics,
        };

        if result.failed_operations > 0 {
            tracing::warn!(
                "{} {}: {} of {} operations failed",
                result.module_name,
                result.scenario_name,
                result.failed_operations,
                total
            );
        }
        result
    }
}

/// Runs `operation(0..total)` on `concurrency` threads while a monitor
/// samples the process every 100 ms.
fn run_workers<F>(total: usize, concurrency: usize, initial_threads: u64, operation: &F) -> RunOutcome
where
    F: Fn(usize) -> Result<(), ClientError> + Sync,
{
    let next = AtomicUsize::new(0);
    let failures = AtomicU64::new(0);
    let done = AtomicBool::new(false);
    let latencies = Mutex::new(Vec::with_capacity(total));
    let workers = concurrency.clamp(1, total.max(1));

    let (next, failures, done, latencies) = (&next, &failures, &done, &latencies);

    let start = Instant::now();
    let peak = thread::scope(|scope| {
        let monitor = scope.spawn(move || {
            let mut sampler = ProcessSampler::new();
            let mut peak = PeakTracker {
                memory: 0,
                threads: initial_threads,
            };
            while !done.load(Ordering::Acquire) {
                peak.record(sampler.sample());
                thread::sleep(MONITOR_INTERVAL);
            }
            peak.record(sampler.sample());
            peak
        });

        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(move || {
                    let mut local = Vec::new();
                    loop {
                        let idx = next.fetch_add(1, Ordering::Relaxed);
                        if idx >= total {
                            break;
                        }
                        let started = Instant::now();
                        match operation(idx) {
                            Ok(()) => local.push(started.elapsed().as_nanos() as u64),
                            Err(_) => {
                                failures.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                    }
                    latencies
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .extend(local);
                })
            })
            .collect();

        for handle in handles {
            if handle.join().is_err() {
                tracing::error!("benchmark worker panicked");
            }
        }
        done.store(true, Ordering::Release);
        monitor.join().unwrap_or_default()
    });
    let elapsed = start.elapsed();

    let latencies = std::mem::take(&mut *latencies.lock().unwrap_or_else(|e| e.into_inner()));
    RunOutcome {
        latencies,
        failures: failures.load(Ordering::Relaxed),
        elapsed,
        peak,
    }
}

pub fn aggregation_warmups(total: usize) -> usize {
    50.min(total / 10)
}

pub fn db_warmups(total: usize) -> usize {
    20.min(total / 10)
}

/// Every fifth DB operation is a create, the rest are reads.
pub fn is_write(idx: usize) -> bool {
    idx % 5 == 0
}

fn random_product_id() -> i64 {
    rand::rng().random_range(PRODUCT_ID_RANGE)
}
