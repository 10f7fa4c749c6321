use crate::Color;

/// Identifies a worker within a run; equal to its index in the
/// partition.
pub type WorkerId = usize;

/// One finished image row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowResult {
    /// The row index in the image.
    pub row: u32,
    /// The pixel colors, left to right.
    pub pixels: Vec<Color>,
}

/// An item travelling from a worker to the merger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    /// A finished row.
    Row {
        /// The worker that computed the row.
        worker: WorkerId,
        /// The row itself.
        result: RowResult,
    },
    /// The worker emitted all of its rows.
    Done {
        /// The completed worker.
        worker: WorkerId,
    },
    /// The worker failed and will not send anything else.
    Abort {
        /// The failed worker.
        worker: WorkerId,
    },
}

impl Message {
    /// Whether this is a row rather than a marker.
    #[inline]
    pub const fn is_row(&self) -> bool {
        matches!(self, Self::Row { .. })
    }
}
