use thiserror::Error;

use crate::{process::ProcessError, WorkerId};

/// Errors in the run configuration, detected before any worker starts.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigurationError {
    /// The image has no pixels along one of its axes.
    #[error("image dimensions must be at least 1x1 (got {width}x{height})")]
    Dimensions {
        /// The configured width.
        width: u32,
        /// The configured height.
        height: u32,
    },

    /// The iteration cap is zero.
    #[error("max iterations must be positive")]
    MaxIterations,

    /// A viewport parameter is NaN or infinite.
    #[error("viewport {0} must be a finite number")]
    NonFinite(&'static str),

    /// The viewport scale is zero or negative.
    #[error("viewport scale must be positive (got {0})")]
    Scale(f64),

    /// The worker count is zero or exceeds the number of rows.
    #[error("worker count must be between 1 and the image height {height} (got {workers})")]
    Workers {
        /// The configured worker count.
        workers: usize,
        /// The configured image height.
        height: u32,
    },

    /// The sleeping barber waiting room cannot hold anything.
    #[error("waiting room capacity must be at least 1")]
    Capacity,
}

/// Numeric faults while evaluating points.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ComputationError {
    /// The pixel mapped to a NaN or infinite coordinate.
    #[error("pixel ({px}, {py}) maps to a non-finite coordinate")]
    NonFinite {
        /// The pixel column.
        px: u32,
        /// The pixel row.
        py: u32,
    },
}

/// Failures of the transport between workers and the merger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SynchronizationFailure {
    /// The transport was closed while a party still used it.
    #[error("transport was closed while still in use")]
    Disconnected,

    /// A hand-off named a worker the transport was not built for.
    #[error("transport has no slot for worker {0}")]
    UnknownWorker(WorkerId),
}

/// Protocol violations observed by the merger.
#[derive(Debug, Error)]
pub enum MergeError {
    /// A row index outside the image was received.
    #[error("row {row} is out of bounds for image height {height}")]
    RowOutOfBounds {
        /// The received row index.
        row: u32,
        /// The image height.
        height: u32,
    },

    /// A row had the wrong number of pixels.
    #[error("row {row} has {actual} pixels, expected {expected}")]
    RowWidth {
        /// The received row index.
        row: u32,
        /// The image width.
        expected: usize,
        /// The received pixel count.
        actual: usize,
    },

    /// A worker sent a row that belongs to another worker.
    #[error("worker {worker} sent row {row} outside of its assignment")]
    Misrouted {
        /// The received row index.
        row: u32,
        /// The sending worker.
        worker: WorkerId,
    },

    /// A row was received twice.
    #[error("row {0} was merged twice")]
    DuplicateRow(u32),

    /// A worker signaled completion twice.
    #[error("worker {0} signaled completion twice")]
    DuplicateCompletion(WorkerId),

    /// A marker named a worker that is not part of the run.
    #[error("received a marker from unknown worker {0}")]
    UnknownWorker(WorkerId),

    /// A worker gave up and sent an abort marker.
    #[error("worker {0} aborted")]
    Aborted(WorkerId),

    /// Every worker completed, but some rows never arrived.
    #[error("{missing} rows were never produced")]
    Incomplete {
        /// The number of rows without data.
        missing: u32,
    },

    /// The transport failed while waiting for rows.
    #[error(transparent)]
    Synchronization(#[from] SynchronizationFailure),
}

/// Faults that terminate a single worker.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Evaluating a point failed.
    #[error(transparent)]
    Computation(#[from] ComputationError),

    /// Handing a row to the merger failed.
    #[error(transparent)]
    Synchronization(#[from] SynchronizationFailure),

    /// The worker panicked.
    #[error("worker panicked: {0}")]
    Panicked(String),

    /// The worker process misbehaved.
    #[error(transparent)]
    Process(#[from] ProcessError),
}

impl WorkerError {
    /// Whether this fault is a consequence of another party closing
    /// the transport rather than a cause of its own.
    #[inline]
    pub fn is_collateral(&self) -> bool {
        matches!(
            self,
            Self::Synchronization(SynchronizationFailure::Disconnected)
        )
    }
}

/// Errors that fail a whole run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The run was misconfigured.
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A worker failed.
    #[error("worker {worker} failed: {source}")]
    Worker {
        /// The failed worker.
        worker: WorkerId,
        /// The underlying fault.
        #[source]
        source: WorkerError,
    },

    /// The merger failed.
    #[error("merging rows failed: {0}")]
    Merge(#[from] MergeError),
}
