//! Streaming JSON Lines row reader.
//!
//! One JSON object per line, decoded into a typed row with Serde. Empty and
//! whitespace-only lines are skipped. Input may be compressed; see
//! [`auto_detect_reader`].

use crate::error::{DataShapeError, ExportError, Result};
use crate::io::compression::auto_detect_reader;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines, Read};
use std::marker::PhantomData;
use std::path::Path;

/// Iterator over the rows of a JSONL file.
pub struct JsonlRows<T> {
    origin: String,
    lines: Lines<BufReader<Box<dyn Read>>>,
    line_no: u64,
    _row: PhantomData<fn() -> T>,
}

/// Open `path` for row-by-row reading.
///
/// # Errors
/// `Connectivity` if the file cannot be opened or its codec set up.
pub fn open_jsonl_rows<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<JsonlRows<T>> {
    let path = path.as_ref();
    let origin = path.display().to_string();
    let file = File::open(path)
        .map_err(|e| ExportError::connectivity_caused_by(format!("open {origin}"), e))?;
    let reader = auto_detect_reader(file, path).map_err(|e| {
        ExportError::connectivity(format!("setup decompression for {origin}: {e:#}"))
    })?;
    Ok(JsonlRows {
        origin,
        lines: BufReader::new(reader).lines(),
        line_no: 0,
        _row: PhantomData,
    })
}

impl<T: DeserializeOwned> Iterator for JsonlRows<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    return Some(Err(ExportError::connectivity_caused_by(
                        format!("read line {} in {}", self.line_no, self.origin),
                        e,
                    )));
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            return Some(serde_json::from_str(&line).map_err(|e| {
                DataShapeError::Malformed {
                    origin: self.origin.clone(),
                    row: self.line_no,
                    message: e.to_string(),
                }
                .into()
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::MembershipRow;
    use std::io::Write;

    #[test]
    fn skips_blank_lines_and_numbers_rows_by_line() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("memberships.jsonl");
        let mut f = File::create(&path)?;
        writeln!(f, r#"{{"member_gid":"m1","group_gid":"g1"}}"#)?;
        writeln!(f)?;
        writeln!(f, r#"{{"member_gid":"m2"}}"#)?;

        let rows: Vec<Result<MembershipRow>> = open_jsonl_rows(&path)?.collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].as_ref().ok(), Some(&MembershipRow::new("m1", "g1")));
        match &rows[1] {
            Err(ExportError::DataShape(DataShapeError::Malformed { row, .. })) => assert_eq!(*row, 3),
            other => panic!("expected a malformed row, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn missing_file_is_a_connectivity_error() {
        let err = open_jsonl_rows::<MembershipRow>("/nonexistent/memberships.jsonl").err();
        assert_eq!(err.map(|e| e.class()), Some("connectivity"));
    }
}
