//! Transports between workers and the merger.

use std::{fmt, sync::Arc};

use crate::{ConfigurationError, Message, SynchronizationFailure, WorkerId};

mod barber;
pub use barber::WaitingRoom;

mod philosophers;
pub use philosophers::{acquisition_table, AcquisitionOrder, DiningPhilosophers};

mod unbounded;
pub use unbounded::UnboundedQueue;

/// The waiting room capacity used when none is configured.
pub const DEFAULT_WAITING_ROOM_CAPACITY: usize = 16;

/// The hand-off between many producing workers and the single
/// consuming merger.
///
/// Implementations must deliver every message sent by one worker in
/// the order it was sent. No ordering is required across workers.
pub trait Transport: Send + Sync {
    /// Hands `message` from `worker` over to the merger.
    ///
    /// Depending on the strategy, this may block.
    fn send(&self, worker: WorkerId, message: Message) -> Result<(), SynchronizationFailure>;

    /// Blocks until the next message is available.
    fn recv(&self) -> Result<Message, SynchronizationFailure>;

    /// Closes the transport.
    ///
    /// Every party blocked in [`Transport::send`] or
    /// [`Transport::recv`] wakes up, and subsequent sends fail with
    /// [`SynchronizationFailure::Disconnected`].
    fn close(&self);
}

/// Selects the synchronization discipline of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Producer/consumer over an unbounded channel.
    UnboundedQueue,
    /// Paired fork acquisition before every hand-off.
    DiningPhilosophers,
    /// Bounded waiting room with blocking producers and consumer.
    SleepingBarber {
        /// The number of messages the waiting room holds.
        capacity: usize,
    },
}

impl Default for Strategy {
    fn default() -> Self {
        Self::UnboundedQueue
    }
}

impl Strategy {
    /// A sleeping barber strategy with the default capacity.
    #[inline]
    pub const fn sleeping_barber() -> Self {
        Self::SleepingBarber {
            capacity: DEFAULT_WAITING_ROOM_CAPACITY,
        }
    }

    /// The canonical name of the strategy.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::UnboundedQueue => "unbounded-queue",
            Self::DiningPhilosophers => "dining-philosophers",
            Self::SleepingBarber { .. } => "sleeping-barber",
        }
    }

    /// Validates strategy-specific parameters.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self {
            Self::SleepingBarber { capacity: 0 } => Err(ConfigurationError::Capacity),
            _ => Ok(()),
        }
    }

    /// Builds a transport for `workers` producers.
    pub fn build(&self, workers: usize) -> Result<Arc<dyn Transport>, ConfigurationError> {
        self.validate()?;

        let transport: Arc<dyn Transport> = match *self {
            Self::UnboundedQueue => Arc::new(UnboundedQueue::new()),
            Self::DiningPhilosophers => Arc::new(DiningPhilosophers::new(workers)),
            Self::SleepingBarber { capacity } => Arc::new(WaitingRoom::new(capacity)?),
        };

        Ok(transport)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SleepingBarber { capacity } => write!(f, "{} ({capacity})", self.name()),
            _ => f.write_str(self.name()),
        }
    }
}
