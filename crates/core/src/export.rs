// ABOUTME: Flat-file CSV export of records in fixed column order.
// ABOUTME: Encodes the whole file in memory and writes it in one pass, header always present.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::ExportError;
use crate::models::{Record, COLUMNS};

/// Encodes records as UTF-8 CSV with a header row.
pub fn encode_csv(records: &[Record]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(COLUMNS)?;
    for rec in records {
        writer.write_record(rec.row())?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())))
}

/// Overwrites `path` with the CSV encoding of `records`. Returns the number of data rows.
pub fn write_csv(path: &Path, records: &[Record]) -> Result<usize, ExportError> {
    let bytes = encode_csv(records)?;
    fs::write(path, bytes).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Saved {} records to {}", records.len(), path.display());
    Ok(records.len())
}
