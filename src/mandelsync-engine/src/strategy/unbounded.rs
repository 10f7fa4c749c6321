use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender};
use parking_lot::Mutex;

use super::Transport;
use crate::{Message, SynchronizationFailure, WorkerId};

/// Producer/consumer hand-off over an unbounded channel.
///
/// Producers never block; the merger blocks while the channel is
/// empty.
#[derive(Debug)]
pub struct UnboundedQueue {
    tx: Sender<Message>,
    rx: Receiver<Message>,
    closed: AtomicBool,
    // Dropping the sender disconnects `shutdown_rx`, which wakes a
    // merger blocked in `recv`.
    shutdown_tx: Mutex<Option<Sender<()>>>,
    shutdown_rx: Receiver<()>,
}

impl UnboundedQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        let (shutdown_tx, shutdown_rx) = bounded(0);

        Self {
            tx,
            rx,
            closed: AtomicBool::new(false),
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            shutdown_rx,
        }
    }

    /// The number of messages waiting for the merger.
    #[inline]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Default for UnboundedQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UnboundedQueue {
    fn send(&self, _worker: WorkerId, message: Message) -> Result<(), SynchronizationFailure> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SynchronizationFailure::Disconnected);
        }

        self.tx
            .send(message)
            .map_err(|_| SynchronizationFailure::Disconnected)
    }

    fn recv(&self) -> Result<Message, SynchronizationFailure> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SynchronizationFailure::Disconnected);
        }

        select! {
            recv(self.rx) -> message => message.map_err(|_| SynchronizationFailure::Disconnected),
            recv(self.shutdown_rx) -> _ => Err(SynchronizationFailure::Disconnected),
        }
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.shutdown_tx.lock().take();
    }
}
