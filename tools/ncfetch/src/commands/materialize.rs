use std::{
    fs,
    io::{BufWriter, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use ncstream::{LengthPolicy, RemoteDataset};

#[derive(Args)]
pub struct MaterializeArgs {
    /// Dataset URI (`ncremote:`, `http:` or `https:`)
    uri: String,

    /// Destination file
    dest: PathBuf,

    /// Fail when a data response has no declared length
    #[arg(long)]
    require_length: bool,
}

impl MaterializeArgs {
    pub fn run(self) -> Result<()> {
        let policy = if self.require_length {
            LengthPolicy::Require
        } else {
            LengthPolicy::SkipWhenAbsent
        };
        let dataset = RemoteDataset::builder(&self.uri)
            .with_length_policy(policy)
            .open()
            .with_context(|| format!("opening {}", self.uri))?;

        let pb = ProgressBar::new(dataset.schema().variables().len() as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )?
            .progress_chars("=>-"),
        );

        let mut sink = BufWriter::new(
            fs::File::create(&self.dest)
                .with_context(|| format!("creating {}", self.dest.display()))?,
        );
        let result = dataset.materialize_with_progress(&mut sink, |progress| {
            pb.set_message(format!("{} ({} bytes)", progress.variable, progress.bytes_written));
            pb.inc(1);
        });
        let written = match result.map_err(anyhow::Error::from).and_then(|written| {
            sink.flush()?;
            Ok(written)
        }) {
            Ok(written) => written,
            Err(e) => {
                pb.abandon_with_message("failed");
                drop(sink);
                if let Err(remove) = fs::remove_file(&self.dest) {
                    log::warn!("could not remove partial {}: {remove}", self.dest.display());
                }
                return Err(e.context(format!("materializing {}", self.uri)));
            }
        };

        pb.finish_with_message("done");
        dataset.close();
        println!("{written} bytes written to {}", self.dest.display());
        Ok(())
    }
}
