//! CSV inputs: the awardee roster and the discovered-publications file.

use crate::error::InputError;
use crate::models::Publication;
use std::path::Path;
use tracing::{info, instrument};

const AWARDEE_COLUMN: &str = "awardee";
/// Used when no column is named `awardee` (rosters are usually `#, name, ...`).
const FALLBACK_COLUMN: usize = 1;

fn open(path: &Path) -> Result<csv::Reader<std::fs::File>, InputError> {
    if !path.exists() {
        return Err(InputError::NotFound(path.to_path_buf()));
    }
    csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|source| InputError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

/// Awardee names from the roster, in file order.
///
/// Takes the `awardee` column if present, otherwise the second column. Names
/// are trimmed; blank cells are skipped.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn read_awardees(path: &Path) -> Result<Vec<String>, InputError> {
    let mut reader = open(path)?;
    let csv_err = |source| InputError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let headers = reader.headers().map_err(csv_err)?.clone();
    let column = headers
        .iter()
        .position(|h| h.trim() == AWARDEE_COLUMN)
        .or_else(|| (headers.len() > FALLBACK_COLUMN).then_some(FALLBACK_COLUMN))
        .ok_or_else(|| InputError::NoAwardeeColumn {
            path: path.to_path_buf(),
        })?;

    let mut awardees = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        if let Some(name) = record.get(column).map(str::trim).filter(|n| !n.is_empty()) {
            awardees.push(name.to_string());
        }
    }

    info!(count = awardees.len(), column = %headers.get(column).unwrap_or_default(), "Loaded awardees");
    Ok(awardees)
}

/// Publications written by the discovery stage.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn read_publications(path: &Path) -> Result<Vec<Publication>, InputError> {
    let mut reader = open(path)?;
    let publications = reader
        .deserialize()
        .collect::<Result<Vec<Publication>, _>>()
        .map_err(|source| InputError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
    info!(count = publications.len(), "Loaded publication records");
    Ok(publications)
}
