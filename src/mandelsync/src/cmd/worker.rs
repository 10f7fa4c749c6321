use std::io;

use clap::Args;
use mandelsync_engine::process;

use super::Command;

/// Runs as a worker process of a `render --mode processes` run.
///
/// Reads one request from stdin and streams the computed rows to
/// stdout.
#[derive(Debug, Args)]
pub struct Worker {}

impl Command for Worker {
    fn handle(self) -> eyre::Result<()> {
        let mut stdin = io::stdin().lock();
        let mut stdout = io::stdout().lock();

        process::serve(&mut stdin, &mut stdout)?;
        Ok(())
    }
}
