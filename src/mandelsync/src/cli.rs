use clap::{Parser, Subcommand};

use crate::cmd::*;

mod args;

pub const HYPHEN: &str = "-";

/// The CLI interface for the Mandelsync application.
#[derive(Debug, Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
pub struct Cli {
    /// The selected command.
    #[clap(subcommand)]
    pub command: MandelsyncCommand,

    #[clap(flatten)]
    pub verbosity: args::Verbosity,
}

/// The top-level commands supported by Mandelsync.
#[derive(Debug, Subcommand)]
pub enum MandelsyncCommand {
    Render(render::Render),
    Inspect(inspect::Inspect),
    #[clap(hide = true)]
    Worker(worker::Worker),
}

impl Command for MandelsyncCommand {
    fn handle(self) -> eyre::Result<()> {
        match self {
            Self::Render(render) => render.handle(),
            Self::Inspect(inspect) => inspect.handle(),
            Self::Worker(worker) => worker.handle(),
        }
    }
}
