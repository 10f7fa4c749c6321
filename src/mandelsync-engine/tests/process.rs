use std::{io::Cursor, time::Duration};

use mandelsync_engine::{
    compute_row,
    process::{forward, serve, Frame, ProcessError, WorkerRequest},
    strategy::UnboundedQueue,
    Color, Message, RowResult, RowTask, Transport, Viewport, WorkerError, WorkerReport,
};

fn request(task: RowTask) -> Vec<u8> {
    let viewport = Viewport {
        width: 16,
        height: 12,
        max_iter: 32,
        ..Viewport::default()
    };

    let mut data = Vec::new();
    WorkerRequest { viewport, task }.write(&mut data).unwrap();
    data
}

fn frames(data: Vec<u8>, max_pixels: u32) -> Result<Vec<Frame>, ProcessError> {
    let mut reader = Cursor::new(data);
    let mut frames = Vec::new();
    while let Some(frame) = Frame::read(&mut reader, max_pixels)? {
        frames.push(frame);
    }
    Ok(frames)
}

#[test]
fn request_round_trip() -> Result<(), ProcessError> {
    let task = RowTask {
        worker: 3,
        start: 4,
        end: 9,
    };
    let data = request(task);
    assert_eq!(&data[..4], b"MSRQ");

    let parsed = WorkerRequest::read(&mut Cursor::new(data))?;
    assert_eq!(parsed.task, task);
    assert_eq!(parsed.viewport.width, 16);
    assert_eq!(parsed.viewport.scale, 4.0);

    Ok(())
}

#[test]
fn rejects_foreign_requests() {
    let mut data = request(RowTask {
        worker: 0,
        start: 0,
        end: 12,
    });

    data[0] = b'X';
    assert!(matches!(
        WorkerRequest::read(&mut Cursor::new(&data)),
        Err(ProcessError::Protocol(..))
    ));

    let beyond = request(RowTask {
        worker: 0,
        start: 0,
        end: 13,
    });
    assert!(matches!(
        WorkerRequest::read(&mut Cursor::new(beyond)),
        Err(ProcessError::Protocol(..))
    ));
}

#[test]
fn serve_streams_rows_then_completion() -> Result<(), ProcessError> {
    let task = RowTask {
        worker: 1,
        start: 5,
        end: 8,
    };
    let mut input = Cursor::new(request(task));
    let mut output = Vec::new();
    serve(&mut input, &mut output)?;

    let frames = frames(output, 16)?;
    assert_eq!(frames.len(), 4);

    let viewport = WorkerRequest::read(&mut Cursor::new(request(task)))?.viewport;
    for (frame, row) in frames.iter().zip(task.rows()) {
        assert_eq!(frame, &Frame::Row(compute_row(&viewport, row)?));
    }
    assert!(matches!(frames[3], Frame::Done { worker: 1, .. }));

    Ok(())
}

#[test]
fn frames_survive_the_wire() -> Result<(), ProcessError> {
    let sent = [
        Frame::Row(RowResult {
            row: 2,
            pixels: vec![Color::rgb(1, 2, 3), Color::TRANSPARENT],
        }),
        Frame::Done {
            worker: 7,
            elapsed: Duration::from_micros(1500),
        },
        Frame::Failed("pixel out of range".into()),
    ];

    let mut data = Vec::new();
    for frame in &sent {
        frame.write(&mut data)?;
    }

    assert_eq!(frames(data, 2)?, sent);

    Ok(())
}

#[test]
fn rejects_malformed_frames() {
    let mut wide = Vec::new();
    Frame::Row(RowResult {
        row: 0,
        pixels: vec![Color::rgb(1, 1, 1); 4],
    })
    .write(&mut wide)
    .unwrap();
    assert!(matches!(frames(wide, 3), Err(ProcessError::Protocol(..))));

    assert!(matches!(frames(vec![9], 3), Err(ProcessError::Protocol(..))));

    // A frame cut off in the middle is an I/O error, not a clean end.
    assert!(matches!(
        frames(vec![1, 0, 0], 3),
        Err(ProcessError::Io(..))
    ));
}

const FORWARDED: RowTask = RowTask {
    worker: 2,
    start: 3,
    end: 5,
};

fn row_frame(row: u32) -> Frame {
    Frame::Row(RowResult {
        row,
        pixels: vec![Color::rgb(9, 9, 9); 16],
    })
}

fn done_frame(worker: usize) -> Frame {
    Frame::Done {
        worker,
        elapsed: Duration::from_millis(3),
    }
}

/// Feeds `stream` through the parent-side proxy and returns its outcome
/// together with everything it handed to the transport.
fn forward_stream(stream: &[Frame]) -> (Result<WorkerReport, WorkerError>, Vec<Message>) {
    let viewport = Viewport {
        width: 16,
        height: 12,
        ..Viewport::default()
    };

    let mut data = Vec::new();
    for frame in stream {
        frame.write(&mut data).unwrap();
    }

    let queue = UnboundedQueue::new();
    let outcome = forward(&mut Cursor::new(data), &viewport, FORWARDED, &queue);

    let mut forwarded = Vec::new();
    while !queue.is_empty() {
        forwarded.push(queue.recv().unwrap());
    }
    (outcome, forwarded)
}

#[test]
fn forwards_rows_and_child_timing() -> Result<(), WorkerError> {
    let (outcome, forwarded) = forward_stream(&[row_frame(3), row_frame(4), done_frame(2)]);

    let report = outcome?;
    assert_eq!(report.task, FORWARDED);
    assert_eq!(report.elapsed, Duration::from_millis(3));

    assert_eq!(forwarded.len(), 3);
    assert!(matches!(
        &forwarded[0],
        Message::Row { worker: 2, result } if result.row == 3
    ));
    assert!(matches!(forwarded[2], Message::Done { worker: 2 }));

    Ok(())
}

#[test]
fn reported_failure_ends_forwarding() {
    let (outcome, forwarded) = forward_stream(&[
        row_frame(3),
        Frame::Failed("pixel (0, 4) maps to a non-finite coordinate".into()),
        row_frame(4),
    ]);

    match outcome {
        Err(WorkerError::Process(ProcessError::Reported(reason))) => {
            assert!(reason.contains("non-finite"))
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(forwarded.len(), 1);
}

#[test]
fn truncated_stream_lacks_completion() {
    let (outcome, _) = forward_stream(&[]);
    assert!(matches!(
        outcome,
        Err(WorkerError::Process(ProcessError::MissingCompletion))
    ));

    let (outcome, forwarded) = forward_stream(&[row_frame(3), row_frame(4)]);
    assert!(matches!(
        outcome,
        Err(WorkerError::Process(ProcessError::MissingCompletion))
    ));
    // Rows are never followed by a completion marker of our own.
    assert!(forwarded.iter().all(Message::is_row));
}

#[test]
fn rejects_rows_outside_the_assignment() {
    for stream in [
        // Before the range.
        vec![row_frame(2)],
        // Past the range.
        vec![row_frame(3), row_frame(4), row_frame(5)],
        // Out of order.
        vec![row_frame(4), row_frame(3)],
        // Repeated.
        vec![row_frame(3), row_frame(3)],
    ] {
        let (outcome, forwarded) = forward_stream(&stream);
        assert!(
            matches!(outcome, Err(WorkerError::Process(ProcessError::Protocol(..)))),
            "{stream:?}"
        );
        assert!(forwarded.len() < stream.len());
    }
}

#[test]
fn rejects_premature_or_foreign_completion() {
    for stream in [
        vec![row_frame(3), done_frame(2)],
        vec![row_frame(3), row_frame(4), done_frame(1)],
    ] {
        let (outcome, forwarded) = forward_stream(&stream);
        assert!(matches!(
            outcome,
            Err(WorkerError::Process(ProcessError::Protocol(..)))
        ));
        assert!(!forwarded
            .iter()
            .any(|m| matches!(m, Message::Done { .. })));
    }
}

#[test]
fn rejects_garbage_between_frames() {
    let viewport = Viewport {
        width: 16,
        height: 12,
        ..Viewport::default()
    };
    let queue = UnboundedQueue::new();

    let outcome = forward(&mut Cursor::new(vec![0x7F, 1, 2, 3]), &viewport, FORWARDED, &queue);
    assert!(matches!(
        outcome,
        Err(WorkerError::Process(ProcessError::Protocol(..)))
    ));
    assert!(queue.is_empty());
}
