//! Where async packaging work runs.

use std::io;
use std::thread::JoinHandle;

use crossbeam_channel::{Sender, unbounded};

/// One unit of background work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Accepts tasks and eventually runs each exactly once.
pub trait TaskScheduler {
    fn schedule(&self, task: Task);
}

/// Runs tasks immediately on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineScheduler;

impl TaskScheduler for InlineScheduler {
    fn schedule(&self, task: Task) {
        task();
    }
}

/// Fixed set of threads draining a shared task queue.
///
/// The queue is unbounded: scheduling never fails and never drops work.
/// Dropping the pool finishes queued tasks before the threads exit.
pub struct WorkerPool {
    sender: Option<Sender<Task>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(threads: usize) -> io::Result<Self> {
        let (sender, receiver) = unbounded::<Task>();
        let mut workers = Vec::with_capacity(threads.max(1));
        for i in 0..threads.max(1) {
            let receiver = receiver.clone();
            let handle = std::thread::Builder::new()
                .name(format!("chunk-export-{i}"))
                .spawn(move || {
                    while let Ok(task) = receiver.recv() {
                        task();
                    }
                })?;
            workers.push(handle);
        }
        tracing::debug!(threads = workers.len(), "started export workers");
        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    pub fn threads(&self) -> usize {
        self.workers.len()
    }
}

impl TaskScheduler for WorkerPool {
    fn schedule(&self, task: Task) {
        if let Some(sender) = &self.sender {
            // Receivers live as long as the workers, which outlive `self.sender`.
            if let Err(e) = sender.send(task) {
                tracing::error!("export worker queue closed; running task inline");
                (e.into_inner())();
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.sender.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                tracing::warn!("export worker panicked");
            }
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.workers.len())
            .finish()
    }
}
