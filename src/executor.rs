// src/executor.rs
// =============================================================================
// A bounded-parallelism task runner.
//
// How it works:
// 1. `schedule()` wraps the task in a job and pushes it on a FIFO queue
// 2. Jobs are admitted (spawned on tokio) while fewer than `limit` are active
// 3. When a job finishes, its slot is released and the next queued job is
//    admitted in the same critical section
// 4. Each caller gets a `TaskHandle` that resolves to that task's own
//    outcome; a panicking task fails only its own handle
//
// Jobs start in submission order as slots free up. Completion order is not
// guaranteed.
// =============================================================================

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use thiserror::Error;
use tokio::sync::oneshot;

/// Why a scheduled task produced no value
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("task panicked: {0}")]
    Panicked(String),
    #[error("task was dropped before it finished")]
    Cancelled,
}

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

#[derive(Default)]
struct State {
    queue: VecDeque<Job>,
    active: usize,
}

struct Shared {
    limit: usize,
    state: Mutex<State>,
}

impl Shared {
    // A poisoned lock only means some thread panicked while holding it;
    // the queue and counter are still consistent
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // Starts queued jobs until the limit is reached. `finished` releases one
    // slot first, under the same lock as the next admission.
    fn admit(self: &Arc<Self>, finished: bool) {
        let mut ready = Vec::new();
        {
            let mut state = self.lock();
            if finished {
                state.active -= 1;
            }
            while state.active < self.limit {
                let Some(job) = state.queue.pop_front() else {
                    break;
                };
                state.active += 1;
                ready.push(job);
            }
        }

        for job in ready {
            let shared = Arc::clone(self);
            tokio::spawn(async move {
                job.await;
                shared.admit(true);
            });
        }
    }
}

/// Runs futures with at most `limit` of them in flight at once
#[derive(Clone)]
pub struct Executor {
    shared: Arc<Shared>,
}

impl Executor {
    /// A limit of 0 is treated as 1
    pub fn new(limit: usize) -> Self {
        Executor {
            shared: Arc::new(Shared {
                limit: limit.max(1),
                state: Mutex::new(State::default()),
            }),
        }
    }

    pub fn limit(&self) -> usize {
        self.shared.limit
    }

    /// Number of tasks currently running
    pub fn active(&self) -> usize {
        self.shared.lock().active
    }

    /// Number of tasks waiting for a slot
    pub fn queued(&self) -> usize {
        self.shared.lock().queue.len()
    }

    /// Queues a task and returns a handle to its eventual outcome.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn schedule<F, T>(&self, task: F) -> TaskHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();

        let job: Job = Box::pin(async move {
            // Spawning the task separately turns a panic into a JoinError
            // instead of unwinding through the executor
            let outcome = tokio::spawn(task).await.map_err(|e| {
                if e.is_panic() {
                    ExecutorError::Panicked(e.to_string())
                } else {
                    ExecutorError::Cancelled
                }
            });
            // The caller may have dropped its handle; that is fine
            let _ = tx.send(outcome);
        });

        self.shared.lock().queue.push_back(job);
        self.shared.admit(false);

        TaskHandle { rx }
    }
}

/// Resolves to the outcome of one scheduled task
pub struct TaskHandle<T> {
    rx: oneshot::Receiver<Result<T, ExecutorError>>,
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, ExecutorError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(ExecutorError::Cancelled)))
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why not just use buffer_unordered?
//    - A stream only makes progress while someone polls it
//    - Here each caller awaits its own handle, in any order it likes, and
//      the executor keeps admitting work in the background
//
// 2. Why a std Mutex in async code?
//    - The lock is never held across an .await
//    - Short critical sections with a std Mutex are cheaper than tokio's
//
// 3. What is a oneshot channel?
//    - A channel that carries exactly one value
//    - The job sends the task's outcome, the TaskHandle receives it
//    - If the job vanishes, the receiver sees an error -> Cancelled
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_never_exceeds_limit_and_runs_everything_once() {
        let executor = Executor::new(3);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let runs = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                let runs = Arc::clone(&runs);
                executor.schedule(async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    runs.fetch_add(1, Ordering::SeqCst);
                    i
                })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert_eq!(results, (0..20).collect::<Vec<_>>());
        assert_eq!(runs.load(Ordering::SeqCst), 20);
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(executor.active(), 0);
        assert_eq!(executor.queued(), 0);
    }

    #[tokio::test]
    async fn test_jobs_start_in_submission_order() {
        let executor = Executor::new(1);
        let order = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = (0..5)
            .map(|i| {
                let order = Arc::clone(&order);
                executor.schedule(async move {
                    order.lock().unwrap().push(i);
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_panic_only_fails_its_own_task() {
        let executor = Executor::new(2);

        let bad = executor.schedule(async {
            panic!("boom");
        });
        let good: Vec<_> = (0..4).map(|i| executor.schedule(async move { i * 2 })).collect();

        assert!(matches!(bad.await, Err(ExecutorError::Panicked(_))));
        for (i, handle) in good.into_iter().enumerate() {
            assert_eq!(handle.await, Ok(i * 2));
        }
        assert_eq!(executor.active(), 0);
    }

    #[tokio::test]
    async fn test_slow_task_does_not_block_siblings() {
        let executor = Executor::new(2);

        let slow = executor.schedule(async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            "slow"
        });
        let fast: Vec<_> = (0..5).map(|_| executor.schedule(async { "fast" })).collect();

        let started = tokio::time::Instant::now();
        for handle in fast {
            assert_eq!(handle.await.unwrap(), "fast");
        }
        // The fast tasks share the one free slot and finish long before the slow one
        assert!(started.elapsed() < Duration::from_millis(400));
        assert_eq!(slow.await.unwrap(), "slow");
    }

    #[tokio::test]
    async fn test_zero_limit_is_clamped() {
        let executor = Executor::new(0);
        assert_eq!(executor.limit(), 1);
        assert_eq!(executor.schedule(async { 7 }).await, Ok(7));
    }
}
