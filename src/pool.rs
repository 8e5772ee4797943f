//! A small fixed-size worker pool used as the execution substrate for traced
//! callbacks.
//!
//! The pool exists so spans have somewhere concurrent to propagate across; it
//! makes no ordering promises between submissions. A job submitted later may
//! run earlier depending on worker availability. Jobs that need to schedule
//! follow-up work capture a [`Submitter`] and hand nested jobs back to the
//! queue, which is what gives a nested chain its causal ordering: the inner
//! job is only created after the outer job's preceding work has run.

use crate::spanpool_warn;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A fixed pool of worker threads executing submitted jobs.
///
/// Dropping the pool closes the queue, lets the workers drain outstanding
/// jobs, and joins them. A job that panics takes its worker down with it;
/// the remaining workers keep serving the queue.
///
/// # Example
///
/// ```
/// use std::sync::mpsc;
/// use spanpool::pool::WorkerPool;
///
/// let pool = WorkerPool::new(2);
/// let (tx, rx) = mpsc::channel();
/// pool.submit(move || {
///     tx.send(1 + 1).ok();
/// });
/// assert_eq!(rx.recv().unwrap(), 2);
/// ```
#[derive(Debug)]
pub struct WorkerPool {
    // `None` only during drop, when the queue is closed before joining.
    sender: Option<Sender<Job>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl WorkerPool {
    /// Creates a pool with the given number of worker threads (at least one).
    pub fn new(workers: usize) -> Self {
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..workers.max(1))
            .map(|index| {
                let receiver = Arc::clone(&receiver);
                thread::Builder::new()
                    .name(format!("spanpool-worker-{index}"))
                    .spawn(move || run_worker(&receiver))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        WorkerPool {
            sender: Some(sender),
            workers,
        }
    }

    /// Submits a job for asynchronous execution on some worker thread.
    ///
    /// Submission order does not imply execution order.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Some(sender) = &self.sender {
            send_job(sender, Box::new(job));
        }
    }

    /// Returns a clonable handle for submitting jobs, e.g. from inside a
    /// running job.
    pub fn submitter(&self) -> Submitter {
        Submitter {
            sender: self
                .sender
                .clone()
                .expect("sender is only taken during drop"),
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Closing the channel ends each worker's recv loop once the queue is
        // drained. Outstanding Submitter clones keep the queue open; their
        // jobs still run, and the join waits for them.
        drop(self.sender.take());
        for worker in self.workers.drain(..) {
            // A worker that died to a panicking job reports the panic here,
            // there is nothing left to do with it.
            let _ = worker.join();
        }
    }
}

/// A clonable handle for submitting jobs to a [`WorkerPool`].
///
/// Jobs capture a `Submitter` when they need to schedule nested work from
/// inside the pool.
#[derive(Clone, Debug)]
pub struct Submitter {
    sender: Sender<Job>,
}

impl Submitter {
    /// Submits a job for asynchronous execution on some worker thread.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        send_job(&self.sender, Box::new(job));
    }
}

fn send_job(sender: &Sender<Job>, job: Job) {
    if sender.send(job).is_err() {
        spanpool_warn!(
            name: "WorkerPool.SubmitAfterShutdown",
            message = "Job submitted after the pool shut down, dropping it"
        );
    }
}

fn run_worker(receiver: &Mutex<Receiver<Job>>) {
    loop {
        // Hold the queue lock only while waiting for a job, never while
        // running one.
        let job = match receiver.lock() {
            Ok(receiver) => receiver.recv(),
            // Poisoned queue lock: another worker panicked mid-recv.
            Err(_) => break,
        };
        match job {
            Ok(job) => job(),
            // Queue closed and drained.
            Err(_) => break,
        }
    }
}
