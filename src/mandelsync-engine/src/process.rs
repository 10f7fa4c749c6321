//! Running workers as child processes.
//!
//! The parent launches the worker program with the [`WORKER_COMMAND`]
//! argument, writes a [`WorkerRequest`] to its stdin and then reads
//! [`Frame`]s from its stdout until the child reports completion.
//!
//! Rows received from the child are forwarded into the run's
//! [`Transport`] by a proxy on the parent side, so every strategy
//! behaves exactly like it does for thread workers. All integers on
//! the wire are little-endian.

use std::{
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
    process::{Child, Command, ExitStatus, Stdio},
    time::{Duration, Instant},
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;

use crate::{
    compute_row, Color, ComputationError, Message, RowResult, RowTask, Transport, Viewport,
    WorkerError, WorkerId, WorkerReport,
};

/// The argument the worker program expects to enter worker mode.
pub const WORKER_COMMAND: &str = "worker";

const REQUEST_MAGIC: [u8; 4] = *b"MSRQ";

const FRAME_ROW: u8 = 0;
const FRAME_DONE: u8 = 1;
const FRAME_FAILED: u8 = 2;

const MAX_FAILURE_LEN: u32 = 64 * 1024;

/// Errors of the worker process protocol.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The worker program could not be started.
    #[error("failed to launch worker process: {0}")]
    Spawn(#[source] io::Error),

    /// Reading from or writing to the other side failed.
    #[error("worker process I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The other side sent data that violates the protocol.
    #[error("malformed worker stream: {0}")]
    Protocol(&'static str),

    /// The child reported a failure of its own.
    #[error("worker process reported: {0}")]
    Reported(String),

    /// The child failed to compute a row.
    #[error(transparent)]
    Computation(#[from] ComputationError),

    /// The child closed its output before signaling completion.
    #[error("worker process ended without signaling completion")]
    MissingCompletion,

    /// The child exited unsuccessfully.
    #[error("worker process exited with {0}")]
    Exit(ExitStatus),
}

/// The work assignment sent to a child process.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorkerRequest {
    /// The viewport of the run.
    pub viewport: Viewport,
    /// The rows assigned to the child.
    pub task: RowTask,
}

impl WorkerRequest {
    /// Writes the request to the given [`Write`]r.
    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&REQUEST_MAGIC)?;

        w.write_f64::<LittleEndian>(self.viewport.center_x)?;
        w.write_f64::<LittleEndian>(self.viewport.center_y)?;
        w.write_f64::<LittleEndian>(self.viewport.scale)?;
        w.write_u32::<LittleEndian>(self.viewport.width)?;
        w.write_u32::<LittleEndian>(self.viewport.height)?;
        w.write_u32::<LittleEndian>(self.viewport.max_iter)?;

        w.write_u32::<LittleEndian>(wire_worker(self.task.worker)?)?;
        w.write_u32::<LittleEndian>(self.task.start)?;
        w.write_u32::<LittleEndian>(self.task.end)?;

        Ok(())
    }

    /// Parses a request from the given [`Read`]er.
    pub fn read<R: Read>(r: &mut R) -> Result<Self, ProcessError> {
        let mut magic = [0; 4];
        r.read_exact(&mut magic)?;
        if magic != REQUEST_MAGIC {
            return Err(ProcessError::Protocol("bad request signature"));
        }

        let viewport = Viewport {
            center_x: r.read_f64::<LittleEndian>()?,
            center_y: r.read_f64::<LittleEndian>()?,
            scale: r.read_f64::<LittleEndian>()?,
            width: r.read_u32::<LittleEndian>()?,
            height: r.read_u32::<LittleEndian>()?,
            max_iter: r.read_u32::<LittleEndian>()?,
        };

        let task = RowTask {
            worker: r.read_u32::<LittleEndian>()? as WorkerId,
            start: r.read_u32::<LittleEndian>()?,
            end: r.read_u32::<LittleEndian>()?,
        };

        if task.start > task.end || task.end > viewport.height {
            return Err(ProcessError::Protocol("row range outside of the image"));
        }

        Ok(Self { viewport, task })
    }
}

fn wire_worker(worker: WorkerId) -> io::Result<u32> {
    u32::try_from(worker)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "worker id exceeds 32 bits"))
}

/// A message streamed from a child process to its parent.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    /// A finished row.
    Row(RowResult),
    /// The child computed all of its rows.
    Done {
        /// The completed worker.
        worker: WorkerId,
        /// The wall-clock time the child spent computing.
        elapsed: Duration,
    },
    /// The child gave up.
    Failed(String),
}

impl Frame {
    /// Writes the frame to the given [`Write`]r.
    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        match self {
            Self::Row(row) => {
                w.write_u8(FRAME_ROW)?;
                w.write_u32::<LittleEndian>(row.row)?;
                w.write_u32::<LittleEndian>(row.pixels.len() as u32)?;
                for color in &row.pixels {
                    w.write_u32::<LittleEndian>(color.packed())?;
                }
            }

            Self::Done { worker, elapsed } => {
                w.write_u8(FRAME_DONE)?;
                w.write_u32::<LittleEndian>(wire_worker(*worker)?)?;
                w.write_u64::<LittleEndian>(elapsed.as_nanos().min(u128::from(u64::MAX)) as u64)?;
            }

            Self::Failed(reason) => {
                let reason = truncate(reason, MAX_FAILURE_LEN as usize);

                w.write_u8(FRAME_FAILED)?;
                w.write_u32::<LittleEndian>(reason.len() as u32)?;
                w.write_all(reason.as_bytes())?;
            }
        }

        Ok(())
    }

    /// Reads the next frame from the given [`Read`]er.
    ///
    /// Rows longer than `max_pixels` are rejected. Returns [`None`]
    /// when the stream ends cleanly between two frames.
    pub fn read<R: Read>(r: &mut R, max_pixels: u32) -> Result<Option<Self>, ProcessError> {
        let tag = match r.read_u8() {
            Ok(tag) => tag,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let frame = match tag {
            FRAME_ROW => {
                let row = r.read_u32::<LittleEndian>()?;
                let len = r.read_u32::<LittleEndian>()?;
                if len > max_pixels {
                    return Err(ProcessError::Protocol("row is wider than the image"));
                }

                let mut pixels = Vec::with_capacity(len as usize);
                for _ in 0..len {
                    pixels.push(Color::from_packed(r.read_u32::<LittleEndian>()?));
                }

                Self::Row(RowResult { row, pixels })
            }

            FRAME_DONE => Self::Done {
                worker: r.read_u32::<LittleEndian>()? as WorkerId,
                elapsed: Duration::from_nanos(r.read_u64::<LittleEndian>()?),
            },

            FRAME_FAILED => {
                let len = r.read_u32::<LittleEndian>()?;
                if len > MAX_FAILURE_LEN {
                    return Err(ProcessError::Protocol("failure message is too long"));
                }

                let mut reason = vec![0; len as usize];
                r.read_exact(&mut reason)?;

                Self::Failed(String::from_utf8_lossy(&reason).into_owned())
            }

            _ => return Err(ProcessError::Protocol("unknown frame tag")),
        };

        Ok(Some(frame))
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }

    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Runs the child side of the protocol.
///
/// Reads one [`WorkerRequest`] from `input`, computes the assigned
/// rows in ascending order and streams each one to `output` as soon
/// as it is finished. A computation fault is reported with a
/// [`Frame::Failed`] before it is returned.
pub fn serve<R: Read, W: Write>(input: &mut R, output: &mut W) -> Result<(), ProcessError> {
    let WorkerRequest { viewport, task } = WorkerRequest::read(input)?;
    log::debug!(
        "Worker process {} serving rows {}..{}",
        task.worker,
        task.start,
        task.end
    );

    let mut out = BufWriter::new(output);
    let start = Instant::now();

    for row in task.rows() {
        match compute_row(&viewport, row) {
            Ok(result) => Frame::Row(result).write(&mut out)?,
            Err(e) => {
                Frame::Failed(e.to_string()).write(&mut out)?;
                out.flush()?;
                return Err(e.into());
            }
        }

        out.flush()?;
    }

    Frame::Done {
        worker: task.worker,
        elapsed: start.elapsed(),
    }
    .write(&mut out)?;
    out.flush()?;

    Ok(())
}

/// Runs one worker as a child process of `program` and forwards its
/// rows into `transport`.
///
/// The child is killed when forwarding fails, and always reaped before
/// this returns. A child that exits unsuccessfully is reported by its
/// exit status unless its output already explains the failure.
pub fn run_worker_process(
    program: &Path,
    viewport: &Viewport,
    task: RowTask,
    transport: &dyn Transport,
) -> Result<WorkerReport, WorkerError> {
    let mut child = Command::new(program)
        .arg(WORKER_COMMAND)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(ProcessError::Spawn)?;
    log::debug!(
        "Spawned worker process {} (pid {}) for rows {}..{}",
        task.worker,
        child.id(),
        task.start,
        task.end
    );

    let outcome = proxy(&mut child, viewport, task, transport);
    if outcome.is_err() {
        let _ = child.kill();
    }

    let status = child.wait().map_err(ProcessError::Io)?;
    match outcome {
        Ok(..) | Err(WorkerError::Process(ProcessError::MissingCompletion))
            if !status.success() =>
        {
            Err(ProcessError::Exit(status).into())
        }
        outcome => outcome,
    }
}

fn proxy(
    child: &mut Child,
    viewport: &Viewport,
    task: RowTask,
    transport: &dyn Transport,
) -> Result<WorkerReport, WorkerError> {
    {
        // Dropping stdin signals the end of the request to the child.
        let mut stdin = child
            .stdin
            .take()
            .ok_or(ProcessError::Protocol("worker stdin is not piped"))?;

        let request = WorkerRequest {
            viewport: *viewport,
            task,
        };
        match request.write(&mut stdin).and_then(|()| stdin.flush()) {
            // A child that exits without reading is judged by its output.
            Err(e) if e.kind() != io::ErrorKind::BrokenPipe => {
                return Err(ProcessError::Io(e).into())
            }
            _ => (),
        }
    }

    let stdout = child
        .stdout
        .take()
        .ok_or(ProcessError::Protocol("worker stdout is not piped"))?;

    forward(&mut BufReader::new(stdout), viewport, task, transport)
}

/// Reads the frames of the child working on `task` and forwards its
/// rows into `transport`.
///
/// Rows must arrive in ascending order and cover exactly the assigned
/// range before the completion frame. The child's own timing is
/// returned in the report.
pub fn forward<R: Read>(
    reader: &mut R,
    viewport: &Viewport,
    task: RowTask,
    transport: &dyn Transport,
) -> Result<WorkerReport, WorkerError> {
    let worker = task.worker;
    let mut expected = task.rows();
    loop {
        match Frame::read(reader, viewport.width)? {
            Some(Frame::Row(result)) => {
                if expected.next() != Some(result.row) {
                    return Err(ProcessError::Protocol("row outside of the assigned range").into());
                }

                transport.send(worker, Message::Row { worker, result })?;
            }

            Some(Frame::Done {
                worker: done,
                elapsed,
            }) => {
                if done != worker || expected.next().is_some() {
                    return Err(ProcessError::Protocol("premature completion frame").into());
                }

                transport.send(worker, Message::Done { worker })?;
                return Ok(WorkerReport { task, elapsed });
            }

            Some(Frame::Failed(reason)) => return Err(ProcessError::Reported(reason).into()),

            None => return Err(ProcessError::MissingCompletion.into()),
        }
    }
}
