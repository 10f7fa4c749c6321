use std::{
    fs,
    io::{BufReader, Seek},
    path::PathBuf,
};

use clap::Args;
use eyre::Context;
use mandelsync_bmp::{Bitmap, Color, Header};
use serde::Serialize;

use super::Command;
use crate::{cli::HYPHEN, utils};

/// Subcommand for inspecting bitmap files.
#[derive(Debug, Args)]
pub struct Inspect {
    /// The bitmap file to inspect.
    input: PathBuf,

    /// Where to write the JSON report.
    ///
    /// Defaults to "-" for printing to stdout.
    #[clap(short, default_value = HYPHEN)]
    output: PathBuf,
}

#[derive(Serialize)]
struct Report {
    header: Header,
    pixels: u64,
    transparent: u64,
}

impl Command for Inspect {
    fn handle(self) -> eyre::Result<()> {
        let file = fs::File::open(&self.input)
            .with_context(|| format!("failed to open '{}'", self.input.display()))?;
        let mut reader = BufReader::new(file);

        let header = Header::parse(&mut reader)?;
        reader.rewind()?;
        let bitmap = Bitmap::decode(&mut reader)?;

        let data = bitmap.data();
        let report = Report {
            header,
            pixels: data.len() as u64,
            transparent: data.iter().filter(|c| **c == Color::TRANSPARENT).count() as u64,
        };

        utils::write_json(&self.output, &report)
    }
}
