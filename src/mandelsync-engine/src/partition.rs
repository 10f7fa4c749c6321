use std::ops::Range;

use serde::Serialize;

use crate::{ConfigurationError, WorkerId};

/// A contiguous range of rows assigned to one worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct RowTask {
    /// The worker owning the rows.
    pub worker: WorkerId,
    /// The first row, inclusive.
    pub start: u32,
    /// The last row, exclusive.
    pub end: u32,
}

impl RowTask {
    /// The rows of this task in ascending order.
    #[inline]
    pub const fn rows(&self) -> Range<u32> {
        self.start..self.end
    }

    /// The number of rows in this task.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Splits `height` rows among `workers` workers.
///
/// Every task receives `height / workers` rows and the last task
/// additionally absorbs the remainder. Tasks are returned in worker
/// order and cover `0..height` exactly once.
pub fn partition(height: u32, workers: usize) -> Result<Vec<RowTask>, ConfigurationError> {
    let count = match u32::try_from(workers) {
        Ok(n) if n >= 1 && n <= height => n,
        _ => return Err(ConfigurationError::Workers { workers, height }),
    };

    let per_worker = height / count;
    let tasks = (0..count)
        .map(|i| RowTask {
            worker: i as WorkerId,
            start: i * per_worker,
            end: if i == count - 1 {
                height
            } else {
                (i + 1) * per_worker
            },
        })
        .collect();

    Ok(tasks)
}
