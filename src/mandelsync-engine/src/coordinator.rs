use std::{
    any::Any,
    env, io,
    panic::{self, AssertUnwindSafe},
    path::PathBuf,
    sync::{mpsc, Arc},
    time::{Duration, Instant},
};

use threadpool::{Builder, ThreadPool};

use crate::{
    partition, process,
    sink::{ImageSink, SinkError},
    ConfigurationError, ImageBuffer, Merger, Message, RowTask, RunError, RunSummary, Strategy,
    Transport, Viewport, Worker, WorkerError, WorkerId, WorkerReport,
};

const WORKER_NAME: &str = "mandelsync-worker";
const WORKER_STACK: usize = 1_048_576;

fn make_worker_pool(nthreads: usize) -> ThreadPool {
    Builder::new()
        .num_threads(nthreads)
        .thread_name(WORKER_NAME.into())
        .thread_stack_size(WORKER_STACK)
        .build()
}

/// How workers are executed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Every worker is a thread of a pool.
    #[default]
    Threads,
    /// Every worker is a child process.
    Processes,
}

/// The parameters of a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunConfig {
    /// The region to render.
    pub viewport: Viewport,
    /// The number of workers.
    pub workers: usize,
    /// The transport between workers and the merger.
    pub strategy: Strategy,
    /// How workers are executed.
    pub mode: ExecutionMode,
}

impl RunConfig {
    /// Validates every parameter of the run.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.viewport.validate()?;
        self.strategy.validate()?;

        if self.workers == 0 || self.workers > self.viewport.height as usize {
            return Err(ConfigurationError::Workers {
                workers: self.workers,
                height: self.viewport.height,
            });
        }

        Ok(())
    }
}

/// State scoped to a single run.
#[derive(Clone, Debug)]
pub struct RunContext {
    started: Instant,
    worker_program: Option<PathBuf>,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            worker_program: None,
        }
    }

    /// Overrides the program launched for process workers.
    ///
    /// Defaults to the current executable.
    pub fn with_worker_program<P: Into<PathBuf>>(mut self, program: P) -> Self {
        self.worker_program = Some(program.into());
        self
    }

    /// The program launched for process workers.
    pub fn worker_program(&self) -> io::Result<PathBuf> {
        match &self.worker_program {
            Some(program) => Ok(program.clone()),
            None => env::current_exe(),
        }
    }

    /// The time since the context was created.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// The result of a successful run.
#[derive(Clone, Debug)]
pub struct RunOutput {
    /// The finished image.
    pub image: ImageBuffer,
    /// Per-worker timings, ordered by worker.
    pub summary: RunSummary,
}

impl RunOutput {
    /// Hands the finished image to `sink`.
    ///
    /// On failure the output stays intact and this may be retried.
    pub fn persist(&self, sink: &mut dyn ImageSink) -> Result<(), SinkError> {
        sink.persist(&self.image)
    }
}

struct Notification {
    worker: WorkerId,
    outcome: Result<WorkerReport, WorkerError>,
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(s) => *s,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(s) => (*s).to_owned(),
            Err(_) => "unknown panic payload".to_owned(),
        },
    }
}

/// Wires workers, the transport and the merger together for one run.
#[derive(Debug)]
pub struct RunCoordinator {
    config: RunConfig,
    tasks: Vec<RowTask>,
}

impl RunCoordinator {
    /// Validates `config` and partitions the image.
    ///
    /// Nothing is started until [`RunCoordinator::run`] is called.
    pub fn new(config: RunConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let tasks = partition(config.viewport.height, config.workers)?;

        Ok(Self { config, tasks })
    }

    #[inline]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// The row assignment of every worker.
    #[inline]
    pub fn tasks(&self) -> &[RowTask] {
        &self.tasks
    }

    /// Executes the run and returns the finished image.
    ///
    /// The merger runs on the calling thread while workers run on a
    /// pool. When any worker or the merger fails, the transport is
    /// closed, every worker is joined, and the first root fault is
    /// returned; no image is produced in that case.
    pub fn run(&self, ctx: &RunContext) -> Result<RunOutput, RunError> {
        let RunConfig {
            viewport,
            workers,
            strategy,
            mode,
        } = self.config;

        log::info!(
            "Rendering {}x{} with {workers} workers ({strategy}, {mode:?})",
            viewport.width,
            viewport.height
        );

        let transport = strategy.build(workers)?;
        let pool = make_worker_pool(workers);
        let (tx, rx) = mpsc::channel();

        match mode {
            ExecutionMode::Threads => {
                for &task in &self.tasks {
                    execute(&pool, &tx, &transport, task, move |transport| {
                        Worker::new(task, &viewport).run(transport)
                    });
                }
            }

            ExecutionMode::Processes => {
                let program = ctx.worker_program().map_err(|e| RunError::Worker {
                    worker: 0,
                    source: process::ProcessError::Spawn(e).into(),
                })?;

                for &task in &self.tasks {
                    let program = program.clone();
                    execute(&pool, &tx, &transport, task, move |transport| {
                        process::run_worker_process(&program, &viewport, task, transport)
                    });
                }
            }
        }
        drop(tx);

        let merged = Merger::new(viewport.width, viewport.height, &self.tasks).drain(&*transport);

        // Wake up anyone still blocked on the transport before joining.
        transport.close();
        pool.join();

        let mut reports = Vec::with_capacity(workers);
        let mut root_fault = None;
        let mut collateral_fault = None;
        for Notification { worker, outcome } in rx.try_iter() {
            match outcome {
                Ok(report) => reports.push(report),
                Err(e) if e.is_collateral() => {
                    collateral_fault.get_or_insert((worker, e));
                }
                Err(e) => {
                    log::warn!("Worker {worker} failed: {e}");
                    root_fault.get_or_insert((worker, e));
                }
            }
        }

        if let Some((worker, source)) = root_fault {
            return Err(RunError::Worker { worker, source });
        }
        let image = merged?;
        if let Some((worker, source)) = collateral_fault {
            return Err(RunError::Worker { worker, source });
        }

        let summary = RunSummary::from_reports(reports);
        log::info!(
            "Merged {} pixels from {} workers in {:?}",
            image.pixel_writes(),
            summary.len(),
            ctx.elapsed()
        );

        Ok(RunOutput { image, summary })
    }
}

fn execute<F>(
    pool: &ThreadPool,
    tx: &mpsc::Sender<Notification>,
    transport: &Arc<dyn Transport>,
    task: RowTask,
    job: F,
) where
    F: FnOnce(&dyn Transport) -> Result<WorkerReport, WorkerError> + Send + 'static,
{
    let tx = tx.clone();
    let transport = Arc::clone(transport);
    let worker = task.worker;

    pool.execute(move || {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| job(&*transport)))
            .unwrap_or_else(|payload| Err(WorkerError::Panicked(panic_message(payload))));

        if outcome.is_err() {
            // Tell the merger not to wait for this worker's marker.
            let _ = transport.send(worker, Message::Abort { worker });
        }

        let _ = tx.send(Notification { worker, outcome });
    });
}
