use mandelsync_engine::{
    strategy::UnboundedQueue, ComputationError, Message, RowTask, SynchronizationFailure,
    Transport, Viewport, Worker, WorkerError, WorkerState,
};

const TASK: RowTask = RowTask {
    worker: 0,
    start: 2,
    end: 5,
};

fn viewport() -> Viewport {
    Viewport {
        width: 6,
        height: 8,
        max_iter: 20,
        ..Viewport::default()
    }
}

#[test]
fn completes_after_handing_off_every_row() -> Result<(), WorkerError> {
    let viewport = viewport();
    let queue = UnboundedQueue::new();

    let mut worker = Worker::new(TASK, &viewport);
    assert_eq!(worker.state(), WorkerState::Idle);

    let report = worker.run(&queue)?;
    assert_eq!(worker.state(), WorkerState::Completed);
    assert_eq!(report.task, TASK);

    let mut rows = Vec::new();
    while let Message::Row { worker, result } = queue.recv()? {
        assert_eq!(worker, 0);
        rows.push(result.row);
    }
    assert_eq!(rows, [2, 3, 4]);
    assert!(queue.is_empty());

    Ok(())
}

#[test]
fn fails_on_computation_fault() {
    let viewport = Viewport {
        scale: f64::MAX,
        ..viewport()
    };
    let queue = UnboundedQueue::new();

    let mut worker = Worker::new(TASK, &viewport);
    let result = worker.run(&queue);

    assert!(matches!(
        result,
        Err(WorkerError::Computation(ComputationError::NonFinite { .. }))
    ));
    assert_eq!(worker.state(), WorkerState::Failed);
    // Nothing is handed off for the faulty row, not even a marker.
    assert!(queue.is_empty());
}

#[test]
fn fails_on_closed_transport() {
    let viewport = viewport();
    let queue = UnboundedQueue::new();
    queue.close();

    let mut worker = Worker::new(TASK, &viewport);
    let result = worker.run(&queue);

    assert!(matches!(
        result,
        Err(WorkerError::Synchronization(
            SynchronizationFailure::Disconnected
        ))
    ));
    assert_eq!(worker.state(), WorkerState::Failed);
    assert_eq!(worker.task(), TASK);
}
