//! Bounded thread pool (C3), grounded on the source's `ThreadPool` (one queue
//! mutex, one "task available" condvar, one "queue drained" condvar). Rust has
//! no `std::future` analogue outside `async`, so `submit` hands back a
//! [`JoinHandle`] backed by a one-shot channel instead of a packaged task.

use crate::error::{panic_message, ThreadPoolError};
use crossbeam::channel;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

type Task = Box<dyn FnOnce() + Send + 'static>;

struct Shared {
    queue: Mutex<std::collections::VecDeque<Task>>,
    task_available: Condvar,
    queue_drained: Condvar,
    in_flight: Mutex<usize>,
    stop: Mutex<bool>,
}

/// A bounded set of worker threads consuming an unbounded FIFO task queue.
/// No priorities, no cancellation of queued tasks, no work-stealing.
pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Vec<thread::JoinHandle<()>>,
}

/// A handle to a still-running or completed task submitted via [`ThreadPool::submit`].
pub struct JoinHandle<T> {
    receiver: channel::Receiver<Result<T, ThreadPoolError>>,
}

impl<T> JoinHandle<T> {
    /// Block until the task completes, returning its result or the panic it raised.
    pub fn join(self) -> Result<T, ThreadPoolError> {
        self.receiver
            .recv()
            .unwrap_or_else(|_| Err(ThreadPoolError::Shutdown))
    }
}

impl ThreadPool {
    /// Spawn `num_threads` workers (normalized to at least 1).
    pub fn new(num_threads: usize) -> Self {
        let num_threads = num_threads.max(1);
        let shared = Arc::new(Shared {
            queue: Mutex::new(std::collections::VecDeque::new()),
            task_available: Condvar::new(),
            queue_drained: Condvar::new(),
            in_flight: Mutex::new(0),
            stop: Mutex::new(false),
        });

        let workers = (0..num_threads)
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || worker_loop(shared))
            })
            .collect();

        Self { shared, workers }
    }

    /// Queue `task` for execution by the next free worker, returning a handle
    /// to its eventual result. Tasks may themselves call `submit` (used by
    /// radix partitioning's per-bucket fan-out).
    pub fn submit<F, T>(&self, task: F) -> JoinHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = channel::bounded(1);
        let boxed: Task = Box::new(move || {
            let result = catch_unwind(AssertUnwindSafe(task))
                .map_err(|payload| ThreadPoolError::TaskPanicked(panic_message(payload)));
            let _ = tx.send(result);
        });

        {
            let mut queue = self.shared.queue.lock().unwrap();
            let stop = self.shared.stop.lock().unwrap();
            if *stop {
                drop(queue);
                drop(stop);
                let (failed_tx, failed_rx) = channel::bounded::<Result<T, ThreadPoolError>>(1);
                let _ = failed_tx.send(Err(ThreadPoolError::Shutdown));
                return JoinHandle { receiver: failed_rx };
            }
            drop(stop);
            *self.shared.in_flight.lock().unwrap() += 1;
            queue.push_back(boxed);
        }
        self.shared.task_available.notify_one();

        JoinHandle { receiver: rx }
    }

    /// Block until the task queue is empty and every dequeued task has finished.
    pub fn wait_until_idle(&self) {
        let queue = self.shared.queue.lock().unwrap();
        let _queue = self
            .shared
            .queue_drained
            .wait_while(queue, |q| !q.is_empty() || *self.shared.in_flight.lock().unwrap() > 0)
            .unwrap();
    }
}

fn worker_loop(shared: Arc<Shared>) {
    loop {
        let task = {
            let mut queue = shared.queue.lock().unwrap();
            loop {
                if let Some(task) = queue.pop_front() {
                    break Some(task);
                }
                if *shared.stop.lock().unwrap() {
                    break None;
                }
                queue = shared.task_available.wait(queue).unwrap();
            }
        };

        match task {
            Some(task) => {
                task();
                let mut in_flight = shared.in_flight.lock().unwrap();
                *in_flight -= 1;
                let queue = shared.queue.lock().unwrap();
                if queue.is_empty() && *in_flight == 0 {
                    shared.queue_drained.notify_all();
                }
            }
            None => return,
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        log::trace!("thread pool shutting down ({} workers)", self.workers.len());
        {
            let _queue = self.shared.queue.lock().unwrap();
            *self.shared.stop.lock().unwrap() = true;
        }
        self.shared.task_available.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn runs_submitted_tasks() {
        let pool = ThreadPool::new(4);
        let handles: Vec<_> = (0..100).map(|i| pool.submit(move || i * 2)).collect();
        let sum: i32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(sum, (0..100).map(|i| i * 2).sum::<i32>());
    }

    #[test]
    fn wait_until_idle_drains_queue() {
        let pool = ThreadPool::new(2);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..50 {
            let counter = Arc::clone(&counter);
            pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        pool.wait_until_idle();
        assert_eq!(counter.load(Ordering::SeqCst), 50);
    }

    #[test]
    fn panicking_task_surfaces_as_error() {
        let pool = ThreadPool::new(1);
        let handle = pool.submit(|| -> i32 { panic!("boom") });
        assert!(matches!(handle.join(), Err(ThreadPoolError::TaskPanicked(_))));
    }
}
