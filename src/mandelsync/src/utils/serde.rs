use std::{
    fs,
    io::{self, BufWriter, IsTerminal, Write},
    path::Path,
};

use eyre::Context;
use serde::Serialize;

use crate::cli::HYPHEN;

/// Serializes `value` as JSON to the file at `out`, or to stdout when
/// `out` is "-".
///
/// Files and pipes receive minified JSON; a terminal gets it
/// pretty-printed.
pub fn write_json<T: Serialize>(out: &Path, value: &T) -> eyre::Result<()> {
    if out.as_os_str() == HYPHEN {
        let mut stdout = io::stdout().lock();

        if stdout.is_terminal() {
            serde_json::to_writer_pretty(&mut stdout, value)?;
            writeln!(stdout)?;
        } else {
            serde_json::to_writer(&mut stdout, value)?;
        }
        stdout.flush()?;
    } else {
        let file = fs::File::create(out)
            .with_context(|| format!("failed to create '{}'", out.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, value)?;
        writer.flush()?;
    }

    Ok(())
}
