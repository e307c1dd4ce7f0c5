//! Fixed-size worker pool
//!
//! Named threads pull boxed jobs off one shared queue. Submitting returns a
//! [`Pending`] handle that yields the job's value; a panicking job is reported
//! as [`PoolError::Panicked`] and leaves its worker alive.

use crate::service::ServiceError;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use thiserror::Error;

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("worker pool is shut down")]
    Closed,

    #[error("pooled job panicked")]
    Panicked,

    #[error("failed to start worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl From<PoolError> for ServiceError {
    fn from(e: PoolError) -> Self {
        ServiceError::Execution(e.to_string())
    }
}

pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(name: &str, size: usize) -> Result<Self, PoolError> {
        let size = size.max(1);
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));

        let mut workers = Vec::with_capacity(size);
        for i in 0..size {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("{}-{}", name, i))
                .spawn(move || worker_loop(receiver))?;
            workers.push(handle);
        }
        tracing::debug!("started worker pool {} with {} threads", name, size);

        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub fn submit<T, F>(&self, job: F) -> Result<Pending<T>, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(1);
        let job: Job = Box::new(move || complete(tx, job));

        self.sender
            .as_ref()
            .ok_or(PoolError::Closed)?
            .send(job)
            .map_err(|_| PoolError::Closed)?;

        Ok(Pending { receiver: rx })
    }
}

fn complete<T, F: FnOnce() -> T>(tx: SyncSender<thread::Result<T>>, job: F) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(job));
    // the submitter may have given up waiting
    let _ = tx.send(outcome);
}

fn worker_loop(receiver: Arc<Mutex<Receiver<Job>>>) {
    loop {
        let job = {
            let guard = receiver.lock().unwrap_or_else(|e| e.into_inner());
            guard.recv()
        };
        match job {
            Ok(job) => job(),
            Err(_) => break,
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // closing the queue lets every worker drain and exit
        drop(self.sender.take());
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

/// The eventual result of a submitted job
pub struct Pending<T> {
    receiver: Receiver<thread::Result<T>>,
}

impl<T> Pending<T> {
    /// Blocks until the job has run.
    pub fn join(self) -> Result<T, PoolError> {
        match self.receiver.recv() {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(PoolError::Panicked),
            Err(_) => Err(PoolError::Closed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_submit_and_join() {
        let pool = WorkerPool::new("test", 2).unwrap();
        let pending: Vec<_> = (0..10).map(|i| pool.submit(move || i * 2).unwrap()).collect();
        let results: Vec<i32> = pending.into_iter().map(|p| p.join().unwrap()).collect();
        assert_eq!(results, (0..10).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_jobs_run_in_parallel() {
        let pool = WorkerPool::new("parallel", 3).unwrap();
        let started = std::time::Instant::now();
        let pending: Vec<_> = (0..3)
            .map(|_| pool.submit(|| thread::sleep(Duration::from_millis(200))).unwrap())
            .collect();
        for p in pending {
            p.join().unwrap();
        }
        assert!(started.elapsed() < Duration::from_millis(550));
    }

    #[test]
    fn test_worker_names() {
        let pool = WorkerPool::new("fanout", 1).unwrap();
        let name = pool
            .submit(|| thread::current().name().map(str::to_string))
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(name.as_deref(), Some("fanout-0"));
    }

    #[test]
    fn test_panic_is_reported_and_worker_survives() {
        let pool = WorkerPool::new("panicky", 1).unwrap();
        let failed = pool.submit(|| -> u8 { panic!("boom") }).unwrap();
        assert!(matches!(failed.join(), Err(PoolError::Panicked)));

        let ok = pool.submit(|| 5u8).unwrap();
        assert_eq!(ok.join().unwrap(), 5);
    }

    #[test]
    fn test_drop_drains_queue() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let pool = WorkerPool::new("drain", 2).unwrap();
            assert_eq!(pool.size(), 2);
            for _ in 0..20 {
                let counter = counter.clone();
                pool.submit(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
            }
        }
        assert_eq!(counter.load(Ordering::SeqCst), 20);
    }

    #[test]
    fn test_zero_size_is_clamped() {
        let pool = WorkerPool::new("tiny", 0).unwrap();
        assert_eq!(pool.size(), 1);
    }
}
