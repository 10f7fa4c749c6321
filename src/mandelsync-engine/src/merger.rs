use std::ops::Range;

use crate::{ImageBuffer, MergeError, Message, RowResult, RowTask, Transport, WorkerId};

/// The single consumer of a run.
///
/// It owns the [`ImageBuffer`] exclusively while rows are arriving,
/// so no other party can ever write a pixel.
#[derive(Debug)]
pub struct Merger {
    image: ImageBuffer,
    assigned: Vec<Range<u32>>,
    finished: Vec<bool>,
    remaining: usize,
}

impl Merger {
    /// Creates a merger for an image of the given dimensions that
    /// expects rows and one completion marker from the owner of each
    /// task.
    pub fn new(width: u32, height: u32, tasks: &[RowTask]) -> Self {
        Self {
            image: ImageBuffer::new(width, height),
            assigned: tasks.iter().map(RowTask::rows).collect(),
            finished: vec![false; tasks.len()],
            remaining: tasks.len(),
        }
    }

    /// Drains `transport` until every worker has signaled completion
    /// and returns the finished image.
    pub fn drain(mut self, transport: &dyn Transport) -> Result<ImageBuffer, MergeError> {
        while self.remaining > 0 {
            match transport.recv()? {
                Message::Row { worker, result } => self.merge(worker, result)?,
                Message::Done { worker } => self.complete(worker)?,
                Message::Abort { worker } => {
                    log::warn!("Worker {worker} aborted; stopping the merge");
                    return Err(MergeError::Aborted(worker));
                }
            }
        }

        match self.image.missing_rows() {
            0 => Ok(self.image),
            missing => Err(MergeError::Incomplete { missing }),
        }
    }

    fn merge(&mut self, worker: WorkerId, result: RowResult) -> Result<(), MergeError> {
        let rows = self
            .assigned
            .get(worker)
            .ok_or(MergeError::UnknownWorker(worker))?;

        if result.row < self.image.height() && !rows.contains(&result.row) {
            return Err(MergeError::Misrouted {
                row: result.row,
                worker,
            });
        }

        self.image.write_row(result)
    }

    fn complete(&mut self, worker: WorkerId) -> Result<(), MergeError> {
        let finished = self
            .finished
            .get_mut(worker)
            .ok_or(MergeError::UnknownWorker(worker))?;

        if *finished {
            return Err(MergeError::DuplicateCompletion(worker));
        }

        *finished = true;
        self.remaining -= 1;
        log::debug!(
            "Worker {worker} completed; waiting on {} more",
            self.remaining
        );

        Ok(())
    }
}
