//! Growable worker pool for async execution.
//!
//! Jobs go through an unbounded channel. A worker is spawned whenever a job
//! arrives and nobody is idle; idle workers exit after `keep_alive`.
//! Workers are detached, so dropping the pool never blocks.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::error::ExecutorError;

pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(60);

struct PoolState {
    receiver: Receiver<Job>,
    idle: AtomicUsize,
    workers: AtomicUsize,
    next_id: AtomicUsize,
    keep_alive: Duration,
}

pub(crate) struct WorkerPool {
    sender: Mutex<Option<Sender<Job>>>,
    state: Arc<PoolState>,
}

impl WorkerPool {
    pub(crate) fn new(keep_alive: Duration) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            sender: Mutex::new(Some(sender)),
            state: Arc::new(PoolState {
                receiver,
                idle: AtomicUsize::new(0),
                workers: AtomicUsize::new(0),
                next_id: AtomicUsize::new(0),
                keep_alive,
            }),
        }
    }

    /// Queue a job. Never blocks on the job itself.
    pub(crate) fn submit(&self, job: Job) -> Result<(), ExecutorError> {
        {
            let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
            let sender = sender.as_ref().ok_or(ExecutorError::Shutdown)?;
            sender.send(job).map_err(|_| ExecutorError::Shutdown)?;
        }
        if self.state.idle.load(Ordering::SeqCst) == 0 {
            self.spawn_worker();
        }
        Ok(())
    }

    fn spawn_worker(&self) {
        let id = self.state.next_id.fetch_add(1, Ordering::Relaxed);
        let state = Arc::clone(&self.state);
        self.state.workers.fetch_add(1, Ordering::SeqCst);

        let spawned = thread::Builder::new()
            .name(format!("formkit-worker-{id}"))
            .spawn(move || worker_loop(state));
        if let Err(e) = spawned {
            self.state.workers.fetch_sub(1, Ordering::SeqCst);
            tracing::error!("Failed to spawn action worker: {}", e);
        }
    }

    /// Stop accepting jobs. Queued jobs still drain, then workers exit.
    pub(crate) fn shutdown(&self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Live worker threads.
    pub(crate) fn workers(&self) -> usize {
        self.state.workers.load(Ordering::SeqCst)
    }
}

fn worker_loop(state: Arc<PoolState>) {
    loop {
        state.idle.fetch_add(1, Ordering::SeqCst);
        let next = state.receiver.recv_timeout(state.keep_alive);
        state.idle.fetch_sub(1, Ordering::SeqCst);

        match next {
            Ok(job) => {
                if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                    tracing::error!("Action worker job panicked");
                }
            }
            // A job may have been queued while this worker was going idle.
            Err(RecvTimeoutError::Timeout) if !state.receiver.is_empty() => continue,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    state.workers.fetch_sub(1, Ordering::SeqCst);
    tracing::debug!("Action worker exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_pool_runs_jobs() {
        let pool = WorkerPool::new(Duration::from_secs(5));
        let (tx, rx) = mpsc::channel();
        for i in 0..8 {
            let tx = tx.clone();
            pool.submit(Box::new(move || tx.send(i).unwrap())).unwrap();
        }
        let mut seen: Vec<i32> = (0..8)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        seen.sort();
        assert_eq!(seen, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_idle_workers_exit() {
        let pool = WorkerPool::new(Duration::from_millis(20));
        let (tx, rx) = mpsc::channel();
        pool.submit(Box::new(move || tx.send(()).unwrap())).unwrap();
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while pool.workers() > 0 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(pool.workers(), 0);
    }

    #[test]
    fn test_submit_after_shutdown_fails() {
        let pool = WorkerPool::new(Duration::from_secs(1));
        pool.shutdown();
        assert!(pool.is_shutdown());
        assert_eq!(pool.submit(Box::new(|| {})), Err(ExecutorError::Shutdown));
    }

    #[test]
    fn test_panicking_job_does_not_kill_pool() {
        let pool = WorkerPool::new(Duration::from_secs(5));
        pool.submit(Box::new(|| panic!("boom"))).unwrap();
        let (tx, rx) = mpsc::channel();
        pool.submit(Box::new(move || tx.send(()).unwrap())).unwrap();
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
    }
}
