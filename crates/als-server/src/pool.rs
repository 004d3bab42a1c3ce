//! Priority thread pool with cooperative cancellation.
//!
//! Tasks are ordered by priority, FIFO within a priority. Cancellation is a
//! shared flag checked before a task runs and, for long handlers, at their
//! own safe points. There is no preemption.

use std::collections::BinaryHeap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use als_core::AlsError;

pub type CancellationToken = Arc<AtomicBool>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TaskPriority {
    /// Background work (notifications, cleanup).
    Low = 0,
    /// Regular requests.
    Normal = 1,
    /// User-interactive requests.
    High = 2,
    /// Shutdown and cancellation handling.
    Urgent = 3,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub submitted: u64,
    pub completed: u64,
    pub cancelled: u64,
    pub failed: u64,
    pub total_execution_time: Duration,
    pub average_execution_time: Duration,
}

/// Handle to a submitted task's result. The sender side is dropped without
/// sending when the task is cancelled or panics, so `wait` returns `None`
/// in both cases.
#[derive(Debug)]
pub struct TaskHandle<R> {
    rx: mpsc::Receiver<R>,
}

impl<R> TaskHandle<R> {
    pub fn wait(self) -> Option<R> {
        self.rx.recv().ok()
    }

    pub fn wait_timeout(&self, timeout: Duration) -> Option<R> {
        self.rx.recv_timeout(timeout).ok()
    }
}

struct Task {
    job: Box<dyn FnOnce() + Send>,
    priority: TaskPriority,
    seq: u64,
    token: Option<CancellationToken>,
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for Task {}

impl PartialOrd for Task {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Task {
    // Max-heap: higher priority first, then earlier submission.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct PoolState {
    queue: BinaryHeap<Task>,
    stop: bool,
    next_seq: u64,
}

struct Shared {
    state: Mutex<PoolState>,
    condvar: Condvar,
    active: AtomicUsize,
    stats: Mutex<TaskStats>,
}

fn lock_ignoring_poison<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Vec<thread::JoinHandle<()>>,
    max_queue_size: usize,
}

impl ThreadPool {
    /// Spawn `num_threads` workers. Zero means hardware parallelism,
    /// clamped to `[1, 16]`.
    pub fn new(num_threads: usize, max_queue_size: usize) -> Self {
        let num_threads = if num_threads == 0 {
            thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
                .clamp(1, 16)
        } else {
            num_threads
        };

        log::info!("creating thread pool workers={num_threads} max_queue={max_queue_size}");

        let shared = Arc::new(Shared {
            state: Mutex::new(PoolState {
                queue: BinaryHeap::new(),
                stop: false,
                next_seq: 0,
            }),
            condvar: Condvar::new(),
            active: AtomicUsize::new(0),
            stats: Mutex::new(TaskStats::default()),
        });

        let workers = (0..num_threads)
            .map(|_| Self::spawn_worker(Arc::clone(&shared)))
            .collect();

        ThreadPool {
            shared,
            workers,
            max_queue_size,
        }
    }

    fn spawn_worker(shared: Arc<Shared>) -> thread::JoinHandle<()> {
        thread::spawn(move || worker_loop(shared))
    }

    pub fn create_cancellation_token() -> CancellationToken {
        Arc::new(AtomicBool::new(false))
    }

    pub fn submit<R, F>(&self, priority: TaskPriority, f: F) -> Result<TaskHandle<R>, AlsError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.submit_cancellable(priority, None, f)
    }

    pub fn submit_cancellable<R, F>(
        &self,
        priority: TaskPriority,
        token: Option<CancellationToken>,
        f: F,
    ) -> Result<TaskHandle<R>, AlsError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let shared = Arc::clone(&self.shared);
        let job: Box<dyn FnOnce() + Send> = Box::new(move || {
            let started = Instant::now();
            match catch_unwind(AssertUnwindSafe(f)) {
                Ok(value) => {
                    let elapsed = started.elapsed();
                    let mut stats = lock_ignoring_poison(&shared.stats);
                    stats.completed += 1;
                    stats.total_execution_time += elapsed;
                    stats.average_execution_time =
                        stats.total_execution_time / stats.completed as u32;
                    drop(stats);
                    let _ = tx.send(value);
                }
                Err(_) => {
                    log::error!("task panicked");
                    lock_ignoring_poison(&shared.stats).failed += 1;
                }
            }
        });

        // Counted before enqueueing so `submitted` never lags a completion.
        lock_ignoring_poison(&self.shared.stats).submitted += 1;

        {
            let mut state = lock_ignoring_poison(&self.shared.state);
            if state.stop {
                lock_ignoring_poison(&self.shared.stats).submitted -= 1;
                return Err(AlsError::Stopped);
            }
            if state.queue.len() >= self.max_queue_size {
                lock_ignoring_poison(&self.shared.stats).submitted -= 1;
                return Err(AlsError::QueueFull {
                    capacity: self.max_queue_size,
                });
            }
            let seq = state.next_seq;
            state.next_seq += 1;
            state.queue.push(Task {
                job,
                priority,
                seq,
                token,
            });
        }
        self.shared.condvar.notify_one();
        Ok(TaskHandle { rx })
    }

    /// Drop every queued task, counting each as cancelled. Running tasks
    /// are not interrupted.
    pub fn cancel_all(&self) {
        let dropped = {
            let mut state = lock_ignoring_poison(&self.shared.state);
            let n = state.queue.len() as u64;
            state.queue.clear();
            n
        };
        lock_ignoring_poison(&self.shared.stats).cancelled += dropped;
        log::info!("cancelled {dropped} queued tasks");
    }

    /// True once the queue is empty and no worker is mid-task.
    pub fn wait_for_completion(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            {
                let state = lock_ignoring_poison(&self.shared.state);
                if state.queue.is_empty() && self.shared.active.load(Ordering::SeqCst) == 0 {
                    return true;
                }
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }

    /// Grow by spawning; shrink by stopping and rebuilding (queued work is
    /// drained by the outgoing workers first).
    pub fn resize(&mut self, num_threads: usize) {
        if num_threads == 0 || num_threads == self.workers.len() {
            return;
        }
        log::info!(
            "resizing thread pool from {} to {num_threads} workers",
            self.workers.len()
        );

        if num_threads < self.workers.len() {
            self.stop_and_join();
            lock_ignoring_poison(&self.shared.state).stop = false;
            for _ in 0..num_threads {
                self.workers.push(Self::spawn_worker(Arc::clone(&self.shared)));
            }
        } else {
            for _ in self.workers.len()..num_threads {
                self.workers.push(Self::spawn_worker(Arc::clone(&self.shared)));
            }
        }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub fn active_tasks(&self) -> usize {
        self.shared.active.load(Ordering::SeqCst)
    }

    pub fn queued_tasks(&self) -> usize {
        lock_ignoring_poison(&self.shared.state).queue.len()
    }

    pub fn stats(&self) -> TaskStats {
        *lock_ignoring_poison(&self.shared.stats)
    }

    pub fn reset_stats(&self) {
        *lock_ignoring_poison(&self.shared.stats) = TaskStats::default();
    }

    /// Stop accepting work, drain the queue, and join every worker.
    pub fn shutdown(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        log::info!("shutting down thread pool");
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        lock_ignoring_poison(&self.shared.state).stop = true;
        self.shared.condvar.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(shared: Arc<Shared>) {
    loop {
        let task = {
            let mut state = lock_ignoring_poison(&shared.state);
            loop {
                if let Some(task) = state.queue.pop() {
                    break task;
                }
                if state.stop {
                    return;
                }
                state = shared
                    .condvar
                    .wait(state)
                    .unwrap_or_else(|e| e.into_inner());
            }
        };

        shared.active.fetch_add(1, Ordering::SeqCst);
        let cancelled = task
            .token
            .as_ref()
            .map_or(false, |t| t.load(Ordering::SeqCst));
        if cancelled {
            lock_ignoring_poison(&shared.stats).cancelled += 1;
        } else {
            (task.job)();
        }
        shared.active.fetch_sub(1, Ordering::SeqCst);
    }
}
