//! # Hand-off Queue
//!
//! Rendezvous point between submitters and workers.
//!
//! A submission becomes an offer in a FIFO guarded by a single mutex. A worker
//! accepts an offer by removing it from the queue. `close` rejects every offer
//! still queued by draining the queue while it sets the closed flag. Both
//! decisions are made under the same lock, so every offer is either accepted
//! by exactly one worker or rejected, never both.
//!
//! The submitter learns the outcome through a one-slot `flume` channel. The
//! accepting worker sends on it; a rejected offer is dropped, which
//! disconnects it.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use flume::{Receiver, Sender};
use workpool_api::{BoxedTask, PoolError};

struct Offer {
    ticket: u64,
    task: BoxedTask,
    accepted: Sender<()>,
}

#[derive(Default)]
struct Queue {
    closed: bool,
    next_ticket: u64,
    offers: VecDeque<Offer>,
}

pub(crate) struct HandOff {
    queue: Mutex<Queue>,

    /// Signalled when an offer is queued or the queue closes.
    available: Condvar,
}

impl HandOff {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(Queue::default()),
            available: Condvar::new(),
        }
    }

    /// Queue a task for the next idle worker.
    ///
    /// Fails with [`PoolError::PoolClosed`] once the queue is closed.
    pub fn offer(&self, task: BoxedTask) -> Result<Pending<'_>, PoolError> {
        let (accepted, decision) = flume::bounded(1);

        let mut queue = self.lock();
        if queue.closed {
            return Err(PoolError::PoolClosed);
        }
        let ticket = queue.next_ticket;
        queue.next_ticket += 1;
        queue.offers.push_back(Offer {
            ticket,
            task,
            accepted,
        });
        drop(queue);

        self.available.notify_one();
        Ok(Pending {
            handoff: self,
            ticket,
            decision,
            settled: false,
        })
    }

    /// Block until an offer can be accepted. Returns `None` once the queue is
    /// closed and empty.
    pub fn take(&self) -> Option<BoxedTask> {
        let mut queue = self.lock();
        loop {
            if let Some(offer) = queue.offers.pop_front() {
                drop(queue);
                // The submitter may have stopped waiting; the task is ours either way.
                let _ = offer.accepted.send(());
                return Some(offer.task);
            }
            if queue.closed {
                return None;
            }
            queue = self.available.wait(queue).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Close the queue, reject every queued offer and wake all waiting
    /// workers. Returns `true` for the call that closed it.
    pub fn close(&self) -> bool {
        let mut queue = self.lock();
        let first = !queue.closed;
        queue.closed = true;
        let rejected = std::mem::take(&mut queue.offers);
        drop(queue);

        self.available.notify_all();
        // Dropped outside the lock: task destructors are user code.
        drop(rejected);
        first
    }

    fn withdraw(&self, ticket: u64) {
        let mut queue = self.lock();
        let offer = queue
            .offers
            .iter()
            .position(|offer| offer.ticket == ticket)
            .and_then(|index| queue.offers.remove(index));
        drop(queue);
        drop(offer);
    }

    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A queued submission waiting for a worker.
///
/// Dropping it before the outcome is known withdraws the offer if no worker
/// has accepted it yet.
pub(crate) struct Pending<'a> {
    handoff: &'a HandOff,
    ticket: u64,
    decision: Receiver<()>,
    settled: bool,
}

impl Pending<'_> {
    pub fn wait(mut self) -> Result<(), PoolError> {
        let outcome = self.decision.recv().map_err(|_| PoolError::PoolClosed);
        self.settled = true;
        outcome
    }

    pub async fn wait_async(mut self) -> Result<(), PoolError> {
        let outcome = self.decision.recv_async().await.map_err(|_| PoolError::PoolClosed);
        self.settled = true;
        outcome
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.handoff.withdraw(self.ticket);
        }
    }
}
