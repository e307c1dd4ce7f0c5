//! Process memory and thread sampling for the benchmark process

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessSample {
    /// resident set size in bytes
    pub memory: u64,
    pub threads: u64,
}

pub struct ProcessSampler {
    system: System,
    pid: Option<Pid>,
}

impl ProcessSampler {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!("process metrics unavailable: {}", e);
                None
            }
        };
        Self {
            system: System::new(),
            pid,
        }
    }

    /// Refreshes and reads the current process; zeros when the platform
    /// does not expose the figures.
    pub fn sample(&mut self) -> ProcessSample {
        let Some(pid) = self.pid else {
            return ProcessSample::default();
        };
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::everything(),
        );
        match self.system.process(pid) {
            Some(process) => ProcessSample {
                memory: process.memory(),
                threads: process
                    .tasks()
                    .map(|tasks| tasks.len() as u64)
                    .filter(|n| *n > 0)
                    .unwrap_or(1),
            },
            None => ProcessSample::default(),
        }
    }
}

impl Default for ProcessSampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Running maximum of the samples taken while a scenario is in flight
#[derive(Debug, Clone, Copy, Default)]
pub struct PeakTracker {
    pub memory: u64,
    pub threads: u64,
}

impl PeakTracker {
    pub fn record(&mut self, sample: ProcessSample) {
        self.memory = self.memory.max(sample.memory);
        self.threads = self.threads.max(sample.threads);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_tracker() {
        let mut peak = PeakTracker::default();
        peak.record(ProcessSample { memory: 10, threads: 4 });
        peak.record(ProcessSample { memory: 7, threads: 9 });
        peak.record(ProcessSample { memory: 12, threads: 2 });
        assert_eq!(peak.memory, 12);
        assert_eq!(peak.threads, 9);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_sample_sees_spawned_threads() {
        let mut sampler = ProcessSampler::new();
        let before = sampler.sample();
        assert!(before.memory > 0);

        let (tx, rx) = std::sync::mpsc::channel::<()>();
        let handle = std::thread::spawn(move || {
            let _ = rx.recv();
        });
        let during = sampler.sample();
        assert!(during.threads >= 2);

        drop(tx);
        handle.join().unwrap();
    }
}
