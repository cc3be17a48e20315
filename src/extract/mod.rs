//! Archive extraction: export ZIP bytes to flat response rows.
//!
//! The export archive contains a single CSV whose schema is fixed once
//! per archive: the header is read and validated before any row is
//! visited, and archives without a `ResponseId` column are rejected
//! outright. Rows come back in file order; filtering out the non-response
//! header rows Qualtrics embeds in the data is the caller's job.

use std::io::{Cursor, Read};

use tracing::warn;

use crate::error::{Error, Result};

/// Column that carries the platform-assigned response id.
const ID_COLUMN: &str = "ResponseId";

/// One flat record pulled out of an export archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRow {
    /// Value of the `ResponseId` cell, unvalidated.
    pub id: String,
    /// JSON object mapping column names to cell values, keys sorted.
    pub payload: String,
}

/// Seam between the poll cycle and archive parsing.
pub trait ResponseExtractor {
    /// Turn a downloaded archive into an ordered sequence of rows.
    ///
    /// # Errors
    ///
    /// Returns `Error::Data` if the archive has no parseable tabular
    /// content.
    fn extract(&self, archive: &[u8]) -> Result<Vec<ExtractedRow>>;
}

/// Production extractor: ZIP archive containing one CSV member.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipCsvExtractor;

impl ResponseExtractor for ZipCsvExtractor {
    fn extract(&self, archive: &[u8]) -> Result<Vec<ExtractedRow>> {
        let text = read_csv_member(archive)?;
        parse_rows(&text)
    }
}

/// Locate and read the first CSV member of the ZIP archive.
fn read_csv_member(archive: &[u8]) -> Result<String> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive))
        .map_err(|e| Error::Data(format!("export is not a valid ZIP archive: {e}")))?;

    let csv_name = zip
        .file_names()
        .find(|name| name.ends_with(".csv"))
        .map(ToString::to_string)
        .ok_or_else(|| Error::Data("no CSV member in export archive".into()))?;

    let mut member = zip
        .by_name(&csv_name)
        .map_err(|e| Error::Data(format!("failed to open '{csv_name}': {e}")))?;

    let mut text = String::new();
    member
        .read_to_string(&mut text)
        .map_err(|e| Error::Data(format!("'{csv_name}' is not valid UTF-8: {e}")))?;

    Ok(text)
}

/// Parse CSV text into rows, validating the schema before the row loop.
fn parse_rows(text: &str) -> Result<Vec<ExtractedRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| Error::Data(format!("failed to read CSV header: {e}")))?
        .clone();

    let id_index = headers
        .iter()
        .position(|column| column == ID_COLUMN)
        .ok_or_else(|| Error::Data(format!("CSV schema is missing the {ID_COLUMN} column")))?;

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| Error::Data(format!("failed to read CSV record: {e}")))?;

        if record.len() < headers.len() {
            warn!(line, expected = headers.len(), got = record.len(), "Skipping ragged CSV record");
            continue;
        }

        // serde_json::Map sorts keys, so equal rows always serialize
        // identically and payload comparison in the store is exact.
        let mut payload = serde_json::Map::new();
        for (column, value) in headers.iter().zip(record.iter()) {
            payload.insert(column.to_string(), serde_json::Value::String(value.to_string()));
        }

        rows.push(ExtractedRow {
            id: record
                .get(id_index)
                .unwrap_or_default()
                .to_string(),
            payload: serde_json::Value::Object(payload).to_string(),
        });
    }

    Ok(rows)
}
