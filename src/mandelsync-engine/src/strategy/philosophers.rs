use parking_lot::Mutex;

use super::{Transport, UnboundedQueue};
use crate::{Message, SynchronizationFailure, WorkerId};

/// The order in which one worker picks up its two forks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AcquisitionOrder {
    /// The fork locked first.
    pub first: usize,
    /// The fork locked second.
    ///
    /// Equal to `first` only when a single worker shares the table
    /// with itself.
    pub second: usize,
}

/// Builds the fork acquisition order for `philosophers` workers sitting
/// around a ring of as many forks.
///
/// Worker `i` sits between fork `i` (left) and fork `(i + 1) % n`
/// (right). Everyone picks up the left fork first except for the last
/// worker, who picks up the right one first. This breaks the circular
/// wait, so the ring can never deadlock.
pub fn acquisition_table(philosophers: usize) -> Vec<AcquisitionOrder> {
    (0..philosophers)
        .map(|i| {
            let left = i;
            let right = (i + 1) % philosophers;

            if i == philosophers - 1 {
                AcquisitionOrder {
                    first: right,
                    second: left,
                }
            } else {
                AcquisitionOrder {
                    first: left,
                    second: right,
                }
            }
        })
        .collect()
}

/// Paired-lock hand-off modelled after the dining philosophers.
///
/// A worker must hold both of its forks while it hands a row over to
/// the merger's queue. The forks guard no real data; they only create
/// contention between neighbors. Completion and abort markers bypass
/// the forks.
#[derive(Debug)]
pub struct DiningPhilosophers {
    forks: Vec<Mutex<()>>,
    order: Vec<AcquisitionOrder>,
    queue: UnboundedQueue,
}

impl DiningPhilosophers {
    /// Seats `philosophers` workers around the table.
    pub fn new(philosophers: usize) -> Self {
        Self {
            forks: (0..philosophers).map(|_| Mutex::new(())).collect(),
            order: acquisition_table(philosophers),
            queue: UnboundedQueue::new(),
        }
    }

    /// The acquisition order in use.
    #[inline]
    pub fn order(&self) -> &[AcquisitionOrder] {
        &self.order
    }
}

impl Transport for DiningPhilosophers {
    fn send(&self, worker: WorkerId, message: Message) -> Result<(), SynchronizationFailure> {
        if !message.is_row() {
            return self.queue.send(worker, message);
        }

        let order = self
            .order
            .get(worker)
            .ok_or(SynchronizationFailure::UnknownWorker(worker))?;

        let _first = self.forks[order.first].lock();
        let _second = (order.second != order.first).then(|| self.forks[order.second].lock());
        log::trace!(
            "Worker {worker} holds forks {} and {}",
            order.first,
            order.second
        );

        self.queue.send(worker, message)
    }

    fn recv(&self) -> Result<Message, SynchronizationFailure> {
        self.queue.recv()
    }

    fn close(&self) {
        self.queue.close();
    }
}
