use std::{fs, path::PathBuf};

use anyhow::Result;
use clap::Args;

use super::open_source;

#[derive(Args)]
pub struct SchemaArgs {
    /// Dataset URI or path to a materialized copy
    source: String,

    /// Output file path (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl SchemaArgs {
    pub fn run(self) -> Result<()> {
        let dataset = open_source(&self.source)?;
        let text = dataset.schema().to_string();

        match self.output {
            Some(path) => fs::write(path, text)?,
            None => print!("{text}"),
        }
        Ok(())
    }
}
