pub mod dump;
pub mod materialize;
pub mod schema;

use std::path::Path;

use anyhow::{Context, Result};
use ncstream::{DatasetSource, LocalDataset, RemoteDataset};

/// Open `source` as a local copy when it names an existing file, otherwise as
/// a remote dataset URI.
pub fn open_source(source: &str) -> Result<Box<dyn DatasetSource>> {
    if Path::new(source).is_file() {
        let local =
            LocalDataset::open(source).with_context(|| format!("reading local copy {source}"))?;
        return Ok(Box::new(local));
    }
    let remote = RemoteDataset::builder(source)
        .open()
        .with_context(|| format!("opening {source}"))?;
    Ok(Box::new(remote))
}
