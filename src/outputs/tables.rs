//! CSV tables written at the end of each stage.
//!
//! Tables are encoded in memory, then written with a single call.

use crate::error::Error;
use crate::models::{DricRecord, Publication};
use serde::Serialize;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

const PUBLICATION_HEADERS: [&str; 4] = ["authors", "title", "year", "scholar_link"];
const RECORD_HEADERS: [&str; 4] = ["authors", "title", "year", "dric"];

/// Header row is always written, even for an empty table.
fn encode<T: Serialize>(headers: &[&str], rows: &[T]) -> Result<Vec<u8>, Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))
}

async fn write_table<T: Serialize>(path: &Path, headers: &[&str], rows: &[T]) -> Result<(), Error> {
    let bytes = encode(headers, rows)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, bytes).await?;
    info!(path = %path.display(), rows = rows.len(), "Saved table");
    Ok(())
}

/// `authors,title,year,scholar_link`
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_publications(path: &Path, publications: &[Publication]) -> Result<(), Error> {
    write_table(path, &PUBLICATION_HEADERS, publications).await
}

/// `authors,title,year,dric`
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_records(path: &Path, records: &[DricRecord]) -> Result<(), Error> {
    write_table(path, &RECORD_HEADERS, records).await
}
