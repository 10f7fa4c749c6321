use std::{slice, time::Duration};

use serde::{Serialize, Serializer};

use crate::{WorkerId, WorkerReport};

fn as_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Timing of one worker within a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SummaryEntry {
    /// The worker.
    pub worker: WorkerId,
    /// The first row of the worker, inclusive.
    pub start_row: u32,
    /// The last row of the worker, exclusive.
    pub end_row: u32,
    /// The wall-clock time the worker spent, in seconds when
    /// serialized.
    #[serde(rename = "elapsed_secs", serialize_with = "as_secs")]
    pub elapsed: Duration,
}

impl From<WorkerReport> for SummaryEntry {
    fn from(report: WorkerReport) -> Self {
        Self {
            worker: report.task.worker,
            start_row: report.task.start,
            end_row: report.task.end,
            elapsed: report.elapsed,
        }
    }
}

/// Per-worker timings of a run, one entry per worker.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RunSummary {
    entries: Vec<SummaryEntry>,
}

impl RunSummary {
    /// Builds a summary from worker reports, ordered by worker.
    pub fn from_reports(reports: impl IntoIterator<Item = WorkerReport>) -> Self {
        let mut entries: Vec<SummaryEntry> = reports.into_iter().map(Into::into).collect();
        entries.sort_by_key(|e| e.worker);

        Self { entries }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, SummaryEntry> {
        self.entries.iter()
    }

    /// The entry of the worker that took the longest.
    pub fn slowest(&self) -> Option<&SummaryEntry> {
        self.entries.iter().max_by_key(|e| e.elapsed)
    }
}

impl<'a> IntoIterator for &'a RunSummary {
    type Item = &'a SummaryEntry;
    type IntoIter = slice::Iter<'a, SummaryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
