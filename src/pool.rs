//! Fire-and-forget delivery pool.
//!
//! A fixed set of worker threads drains a `crossbeam-channel` queue of
//! delivery tasks. Submission never waits for a task to run. Each task runs
//! under `catch_unwind`, so a panicking observer costs one delivery and
//! nothing else.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};

use crate::config::DispatchConfig;
use crate::error::{CourierResult, ExecutionError};
use crate::event::EventKind;
use crate::observer::ObserverId;
use crate::stats::Counters;

/// A unit of delivery work.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

pub(crate) struct Task {
    pub(crate) observer: ObserverId,
    pub(crate) kind: EventKind,
    pub(crate) job: Job,
}

// Count of submitted-but-unfinished tasks, with a condvar for draining.
#[derive(Debug, Default)]
struct InFlight {
    count: Mutex<usize>,
    idle: Condvar,
}

impl InFlight {
    fn start(&self) {
        *self.count.lock().unwrap_or_else(PoisonError::into_inner) += 1;
    }

    fn finish(&self) {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    fn current(&self) -> usize {
        *self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_idle(&self, timeout: Duration) -> bool {
        let guard = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = self
            .idle
            .wait_timeout_while(guard, timeout, |count| *count > 0)
            .unwrap_or_else(PoisonError::into_inner);
        *guard == 0
    }
}

/// Worker pool executing delivery tasks.
pub struct DeliveryPool {
    tx: Option<Sender<Task>>,
    workers: Vec<JoinHandle<()>>,
    capacity: Option<usize>,
    in_flight: Arc<InFlight>,
    counters: Arc<Counters>,
}

impl DeliveryPool {
    pub(crate) fn start(cfg: &DispatchConfig, counters: Arc<Counters>) -> CourierResult<Self> {
        cfg.validate()?;

        let (tx, rx) = match cfg.queue_capacity {
            Some(cap) => bounded::<Task>(cap),
            None => unbounded::<Task>(),
        };
        let in_flight = Arc::new(InFlight::default());

        let mut workers = Vec::with_capacity(cfg.workers);
        for idx in 0..cfg.workers {
            let rx: Receiver<Task> = rx.clone();
            let in_flight = Arc::clone(&in_flight);
            let counters = Arc::clone(&counters);
            let name = format!("{}-{idx}", cfg.thread_name);
            let handle = thread::Builder::new()
                .name(name.clone())
                .spawn(move || worker_loop(&rx, &in_flight, &counters))
                .map_err(|e| ExecutionError::WorkerSpawn {
                    name,
                    message: e.to_string(),
                })?;
            workers.push(handle);
        }

        tracing::debug!(
            target: "courier::pool",
            workers = cfg.workers,
            capacity = ?cfg.queue_capacity,
            "delivery pool started"
        );

        Ok(Self {
            tx: Some(tx),
            workers,
            capacity: cfg.queue_capacity,
            in_flight,
            counters,
        })
    }

    /// Queues a task without blocking. A task that cannot be queued is
    /// counted as dropped and reported back to the caller.
    pub(crate) fn submit(&self, task: Task) -> Result<(), ExecutionError> {
        let Some(tx) = &self.tx else {
            Counters::bump(&self.counters.dropped);
            return Err(ExecutionError::Disconnected {
                path: "delivery".to_string(),
            });
        };

        let observer = task.observer;
        let kind = task.kind;
        self.in_flight.start();
        match tx.try_send(task) {
            Ok(()) => {
                Counters::bump(&self.counters.deliveries);
                Ok(())
            }
            Err(err) => {
                self.in_flight.finish();
                Counters::bump(&self.counters.dropped);
                let err = match err {
                    TrySendError::Full(_) => ExecutionError::QueueFull {
                        capacity: self.capacity.unwrap_or(0),
                    },
                    TrySendError::Disconnected(_) => ExecutionError::Disconnected {
                        path: "delivery".to_string(),
                    },
                };
                tracing::warn!(
                    target: "courier::pool",
                    observer = %observer,
                    kind = %kind,
                    error = %err,
                    "delivery dropped"
                );
                Err(err)
            }
        }
    }

    /// Deliveries submitted but not yet finished.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.current()
    }

    /// Blocks until every submitted delivery finished, or `timeout` elapses.
    pub fn wait_idle(&self, timeout: Duration) -> CourierResult<()> {
        let started = Instant::now();
        if self.in_flight.wait_idle(timeout) {
            return Ok(());
        }
        let waited = started.elapsed();
        tracing::warn!(
            target: "courier::pool",
            pending = self.in_flight(),
            waited_ms = u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
            "deliveries still in flight after drain timeout"
        );
        Err(ExecutionError::Timeout {
            duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
        .into())
    }

    /// Number of worker threads.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for DeliveryPool {
    fn drop(&mut self) {
        // Close the queue: workers finish what is queued, then exit.
        drop(self.tx.take());
        let current = thread::current().id();
        for handle in self.workers.drain(..) {
            // Dropped from inside a delivery: that worker exits by itself
            // once the closed queue is empty.
            if handle.thread().id() == current {
                continue;
            }
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for DeliveryPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryPool")
            .field("workers", &self.workers.len())
            .field("capacity", &self.capacity)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

fn worker_loop(rx: &Receiver<Task>, in_flight: &InFlight, counters: &Counters) {
    while let Ok(Task {
        observer,
        kind,
        job,
    }) = rx.recv()
    {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
            Counters::bump(&counters.panicked);
            tracing::error!(
                target: "courier::pool",
                observer = %observer,
                kind = %kind,
                panic = %panic_message(payload.as_ref()),
                "observer panicked during delivery"
            );
        }
        in_flight.finish();
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
