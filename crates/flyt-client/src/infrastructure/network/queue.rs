//! Cross-thread command queue with wake-on-enqueue.
//!
//! Any thread may push.  Only the connection task reads the front and
//! removes it, and only after that command's round trip has finished, so a
//! snapshot of the queue always includes the command currently on the wire.
//!
//! The task sleeps on a [`Notify`] while the queue is empty.  `notify_one`
//! stores a permit when nobody is waiting, so a push that lands between the
//! task's last look at the queue and its next `wait` is never lost.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use flyt_core::Command;
use tokio::sync::{oneshot, Notify};

use crate::application::session::{CommandOutcome, Request};

/// A queued request and the sender that resolves its caller's receiver.
struct QueuedCommand {
    request: Request,
    completion: oneshot::Sender<CommandOutcome>,
}

/// FIFO of pending requests shared between callers and the connection task.
#[derive(Default)]
pub struct CommandQueue {
    items: Mutex<VecDeque<QueuedCommand>>,
    wake: Notify,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<QueuedCommand>> {
        // The lock is never held across user code, so a poisoned queue is
        // still structurally sound.
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a request and wakes the task.
    ///
    /// The receiver resolves once the round trip completes.  It reports
    /// `RecvError` if the request is dropped unprocessed (queue cleared or
    /// runtime shut down).
    pub fn push(&self, request: Request) -> oneshot::Receiver<CommandOutcome> {
        let (completion, rx) = oneshot::channel();
        self.lock().push_back(QueuedCommand {
            request,
            completion,
        });
        self.wake.notify_one();
        rx
    }

    /// A copy of the oldest request, left in place.
    pub fn front(&self) -> Option<Request> {
        self.lock().front().map(|item| item.request.clone())
    }

    /// Removes the oldest request and resolves its receiver with `outcome`.
    pub fn complete_front(&self, outcome: CommandOutcome) {
        let finished = self.lock().pop_front();
        if let Some(item) = finished {
            // The caller may have stopped listening.
            let _ = item.completion.send(outcome);
        }
    }

    /// Commands still waiting, in wire order.
    pub fn snapshot(&self) -> Vec<Command> {
        self.lock().iter().map(|item| item.request.command.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops every pending request.
    pub fn clear(&self) {
        let dropped = std::mem::take(&mut *self.lock());
        drop(dropped);
    }

    /// Suspends until something is pushed (or a stored wake-up is pending).
    pub async fn wait(&self) {
        self.wake.notified().await;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
