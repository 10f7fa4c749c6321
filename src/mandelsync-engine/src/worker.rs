use std::time::{Duration, Instant};

use crate::{
    ComputationError, Message, RowResult, RowTask, Transport, Viewport, WorkerError,
};

/// The lifecycle of a [`Worker`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerState {
    /// The worker has not started yet.
    Idle,
    /// The worker is computing the given row.
    Running(u32),
    /// Every row and the completion marker were handed off.
    Completed,
    /// The worker stopped on a fault.
    Failed,
}

/// The outcome of a successful worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerReport {
    /// The rows the worker computed.
    pub task: RowTask,
    /// The wall-clock time the worker spent.
    pub elapsed: Duration,
}

/// Computes the colors of a single image row.
pub fn compute_row(viewport: &Viewport, row: u32) -> Result<RowResult, ComputationError> {
    let pixels = (0..viewport.width)
        .map(|px| viewport.color(px, row))
        .collect::<Result<_, _>>()?;

    Ok(RowResult { row, pixels })
}

/// Computes the rows of one [`RowTask`] and hands them to a
/// [`Transport`].
#[derive(Debug)]
pub struct Worker<'a> {
    task: RowTask,
    viewport: &'a Viewport,
    state: WorkerState,
}

impl<'a> Worker<'a> {
    pub fn new(task: RowTask, viewport: &'a Viewport) -> Self {
        Self {
            task,
            viewport,
            state: WorkerState::Idle,
        }
    }

    #[inline]
    pub fn task(&self) -> RowTask {
        self.task
    }

    #[inline]
    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Computes every row of the task in ascending order, handing each
    /// one off as soon as it is finished, and then signals completion.
    ///
    /// The worker does not retry anything; the first fault ends it.
    pub fn run(&mut self, transport: &dyn Transport) -> Result<WorkerReport, WorkerError> {
        let result = self.run_inner(transport);
        self.state = match result {
            Ok(..) => WorkerState::Completed,
            Err(..) => WorkerState::Failed,
        };

        result
    }

    fn run_inner(&mut self, transport: &dyn Transport) -> Result<WorkerReport, WorkerError> {
        let worker = self.task.worker;
        let start = Instant::now();
        log::debug!(
            "Worker {worker} started on rows {}..{}",
            self.task.start,
            self.task.end
        );

        for row in self.task.rows() {
            self.state = WorkerState::Running(row);

            let result = compute_row(self.viewport, row)?;
            transport.send(worker, Message::Row { worker, result })?;
            log::trace!("Worker {worker} handed off row {row}");
        }

        transport.send(worker, Message::Done { worker })?;

        let elapsed = start.elapsed();
        log::debug!("Worker {worker} finished in {elapsed:?}");

        Ok(WorkerReport {
            task: self.task,
            elapsed,
        })
    }
}
