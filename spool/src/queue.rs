//! FIFO task queue drained by a single background thread.
//!
//! The worker thread owns the state `S` by value; tasks receive `&mut S`.
//! Only the worker ever touches `S`, so the state needs no locking of its own.
//!
//! ```text
//! post() ──► Mutex<VecDeque<Task>> ──► worker thread ──► task(&mut S)
//! ```

use crate::{Result, SpoolError};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Deferred unit of work run against the worker state.
pub type Task<S> = Box<dyn FnOnce(&mut S) + Send + 'static>;

struct Pending<S> {
    tasks: VecDeque<Task<S>>,
    stopping: bool,
}

struct Shared<S> {
    pending: Mutex<Pending<S>>,
    ready: Condvar,
}

/// Single-worker task queue.
///
/// Tasks run one at a time, in the order they were posted. Shutdown drains
/// everything posted before it; posting afterwards fails with
/// [`SpoolError::Closed`].
pub struct TaskQueue<S> {
    shared: Arc<Shared<S>>,
    worker: Option<JoinHandle<S>>,
}

impl<S: Send + 'static> TaskQueue<S> {
    /// Start the worker thread with ownership of `state`.
    pub fn spawn(name: impl Into<String>, state: S) -> io::Result<Self> {
        let shared = Arc::new(Shared {
            pending: Mutex::new(Pending {
                tasks: VecDeque::new(),
                stopping: false,
            }),
            ready: Condvar::new(),
        });

        let worker = {
            let shared = shared.clone();
            thread::Builder::new()
                .name(name.into())
                .spawn(move || run(&shared, state))?
        };

        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    /// Enqueue `task` and wake the worker. Never blocks on the task itself.
    pub fn post<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        {
            let mut pending = self.shared.pending.lock();
            if pending.stopping {
                return Err(SpoolError::Closed);
            }
            pending.tasks.push_back(Box::new(task));
        }
        self.shared.ready.notify_one();
        Ok(())
    }

    /// Number of tasks posted but not yet started.
    pub fn pending(&self) -> usize {
        self.shared.pending.lock().tasks.len()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.pending.lock().stopping
    }

    /// Stop accepting tasks, run everything already queued, join the worker and
    /// hand back its state.
    ///
    /// Returns `None` if already shut down or if a task panicked.
    pub fn shutdown(&mut self) -> Option<S> {
        let worker = self.worker.take()?;
        self.shared.pending.lock().stopping = true;
        self.shared.ready.notify_one();
        worker.join().ok()
    }
}

impl<S> Drop for TaskQueue<S> {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.shared.pending.lock().stopping = true;
            self.shared.ready.notify_one();
            let _ = worker.join();
        }
    }
}

/// Closes the queue when the worker exits, including by panic.
///
/// Tasks still queued after a panic are dropped so anything they captured
/// (result senders in particular) is released.
struct CloseOnExit<'a, S>(&'a Shared<S>);

impl<S> Drop for CloseOnExit<'_, S> {
    fn drop(&mut self) {
        let stranded = {
            let mut pending = self.0.pending.lock();
            pending.stopping = true;
            std::mem::take(&mut pending.tasks)
        };
        // Outside the lock; captures may post or lock on drop
        drop(stranded);
    }
}

fn run<S>(shared: &Shared<S>, mut state: S) -> S {
    let _close = CloseOnExit(shared);
    loop {
        let task = {
            let mut pending = shared.pending.lock();
            loop {
                if let Some(task) = pending.tasks.pop_front() {
                    break task;
                }
                if pending.stopping {
                    return state;
                }
                shared.ready.wait(&mut pending);
            }
        };
        task(&mut state);
    }
}
