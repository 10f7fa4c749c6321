use std::{num::NonZeroUsize, path::PathBuf, thread};

use clap::{Args, ValueEnum};
use eyre::Context;
use mandelsync_engine::{
    sink::BmpFileSink, strategy::DEFAULT_WAITING_ROOM_CAPACITY, ExecutionMode, RunConfig,
    RunContext, RunCoordinator, RunSummary, Strategy, Viewport,
};

use super::Command;
use crate::{cli::HYPHEN, utils};

/// Subcommand for rendering the Mandelbrot set to a bitmap.
#[derive(Debug, Args)]
pub struct Render {
    /// The maximum number of iterations per point.
    #[clap(short = 'm', long, default_value_t = 1000)]
    max_iter: u32,

    /// The real part of the view center.
    #[clap(short = 'x', long, default_value_t = 0.0, allow_negative_numbers = true)]
    center_x: f64,

    /// The imaginary part of the view center.
    #[clap(short = 'y', long, default_value_t = 0.0, allow_negative_numbers = true)]
    center_y: f64,

    /// Half the side length of the view window.
    #[clap(short, long, default_value_t = 4.0)]
    scale: f64,

    /// The image width in pixels.
    #[clap(short = 'W', long, default_value_t = 800)]
    width: u32,

    /// The image height in pixels.
    #[clap(short = 'H', long, default_value_t = 600)]
    height: u32,

    /// The number of workers to split the rows among.
    ///
    /// Defaults to the available parallelism, but never more than
    /// the image has rows.
    #[clap(short = 'n', long, env = "MANDELSYNC_WORKERS")]
    workers: Option<usize>,

    /// How finished rows are handed to the merger.
    #[clap(long, value_enum, default_value_t = StrategyArg::UnboundedQueue)]
    strategy: StrategyArg,

    /// The waiting room capacity of the sleeping barber strategy.
    #[clap(long, default_value_t = DEFAULT_WAITING_ROOM_CAPACITY)]
    capacity: usize,

    /// Whether workers run as threads or as child processes.
    #[clap(long, value_enum, default_value_t = ModeArg::Threads)]
    mode: ModeArg,

    /// The path of the bitmap to write.
    #[clap(short, long, default_value = "mandel.bmp")]
    output: PathBuf,

    /// Optionally writes the per-worker timings as JSON.
    ///
    /// When the value is "-", the JSON is printed to stdout instead
    /// of the summary table.
    #[clap(long)]
    summary: Option<PathBuf>,
}

/// The synchronization strategy of a run.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    /// Producers push into an unbounded queue.
    UnboundedQueue,
    /// Producers hold two ring-arranged forks per hand-off.
    DiningPhilosophers,
    /// Producers wait for a seat in a bounded waiting room.
    SleepingBarber,
}

/// How workers are executed.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Threads,
    Processes,
}

fn default_workers(height: u32) -> usize {
    let available = thread::available_parallelism().map_or(1, NonZeroUsize::get);
    available.clamp(1, (height as usize).max(1))
}

fn print_summary(summary: &RunSummary) {
    println!("{:>6}  {:>13}  {:>12}", "worker", "rows", "time (ms)");
    for entry in summary {
        let rows = format!("{}..{}", entry.start_row, entry.end_row);
        println!(
            "{:>6}  {:>13}  {:>12.3}",
            entry.worker,
            rows,
            entry.elapsed.as_secs_f64() * 1000.0
        );
    }

    if let Some(slowest) = summary.slowest() {
        log::debug!("Worker {} was the slowest", slowest.worker);
    }
}

impl Render {
    fn config(&self) -> RunConfig {
        let viewport = Viewport {
            center_x: self.center_x,
            center_y: self.center_y,
            scale: self.scale,
            width: self.width,
            height: self.height,
            max_iter: self.max_iter,
        };

        let strategy = match self.strategy {
            StrategyArg::UnboundedQueue => Strategy::UnboundedQueue,
            StrategyArg::DiningPhilosophers => Strategy::DiningPhilosophers,
            StrategyArg::SleepingBarber => Strategy::SleepingBarber {
                capacity: self.capacity,
            },
        };

        let mode = match self.mode {
            ModeArg::Threads => ExecutionMode::Threads,
            ModeArg::Processes => ExecutionMode::Processes,
        };

        RunConfig {
            viewport,
            workers: self.workers.unwrap_or_else(|| default_workers(self.height)),
            strategy,
            mode,
        }
    }
}

impl Command for Render {
    fn handle(self) -> eyre::Result<()> {
        let ctx = RunContext::new();

        let coordinator = RunCoordinator::new(self.config())?;
        let output = coordinator.run(&ctx)?;

        let mut sink = BmpFileSink::new(&self.output);
        output
            .persist(&mut sink)
            .with_context(|| format!("failed to save '{}'", self.output.display()))?;

        match &self.summary {
            Some(path) => {
                if path.as_os_str() != HYPHEN {
                    print_summary(&output.summary);
                }
                utils::write_json(path, &output.summary)?;
            }
            None => print_summary(&output.summary),
        }

        log::info!("Finished in {:?}", ctx.elapsed());
        Ok(())
    }
}
