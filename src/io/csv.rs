//! Streaming CSV row reader.
//!
//! The first record is a header; columns are matched to row fields by name.
//! Empty fields decode to `None` for optional columns.

use crate::error::{DataShapeError, ExportError, Result};
use crate::io::compression::auto_detect_reader;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Iterator over the rows of a CSV file.
pub struct CsvRows<T> {
    origin: String,
    records: csv::DeserializeRecordsIntoIter<Box<dyn Read>, T>,
}

/// Open `path` for row-by-row reading.
///
/// # Errors
/// `Connectivity` if the file cannot be opened or its codec set up.
pub fn open_csv_rows<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<CsvRows<T>> {
    let path = path.as_ref();
    let origin = path.display().to_string();
    let file = File::open(path)
        .map_err(|e| ExportError::connectivity_caused_by(format!("open {origin}"), e))?;
    let reader = auto_detect_reader(file, path).map_err(|e| {
        ExportError::connectivity(format!("setup decompression for {origin}: {e:#}"))
    })?;
    let records = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader)
        .into_deserialize();
    Ok(CsvRows { origin, records })
}

impl<T: DeserializeOwned> Iterator for CsvRows<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(record.map_err(|e| self.classify(e)))
    }
}

impl<T> CsvRows<T> {
    fn classify(&self, err: csv::Error) -> ExportError {
        if err.is_io_error() {
            return ExportError::connectivity_caused_by(format!("read {}", self.origin), err);
        }
        let row = err.position().map_or(0, csv::Position::line);
        DataShapeError::Malformed {
            origin: self.origin.clone(),
            row,
            message: err.to_string(),
        }
        .into()
    }
}
