//! In-memory sinks and targets, and helpers that write row dumps to disk.

use crate::error::Result;
use crate::io::compression::{auto_detect_writer, FinishWrite};
use crate::progress::ProgressReporter;
use crate::sink::{Counter, StatementKind, StatementSink, UnitTarget};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// A statement boundary seen by a [`RecordingSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub kind: StatementKind,
    /// Byte offset into the recorded text right after the terminator.
    pub offset: usize,
}

/// [`StatementSink`] that keeps everything in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    text: String,
    boundaries: Vec<Boundary>,
}

impl RecordingSink {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn boundaries(&self) -> &[Boundary] {
        &self.boundaries
    }
}

impl StatementSink for RecordingSink {
    fn write(&mut self, fragment: &str) -> Result<()> {
        self.text.push_str(fragment);
        Ok(())
    }

    fn statement_closed(&mut self, kind: StatementKind) -> Result<()> {
        self.boundaries.push(Boundary {
            kind,
            offset: self.text.len(),
        });
        Ok(())
    }
}

/// One unit captured by a [`MemoryTarget`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryUnit {
    pub name: String,
    pub bytes: Vec<u8>,
    /// Whether the writer was finished rather than dropped.
    pub finished: bool,
}

impl MemoryUnit {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

type Shared<T> = Arc<Mutex<T>>;

fn lock<T>(shared: &Shared<T>) -> MutexGuard<'_, T> {
    shared.lock().unwrap_or_else(|e| e.into_inner())
}

/// [`UnitTarget`] that keeps units in memory. Clones share the same units.
#[derive(Debug, Clone, Default)]
pub struct MemoryTarget {
    units: Shared<Vec<MemoryUnit>>,
    fail_from: Option<usize>,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// A target that refuses to create the unit with index `n` and any
    /// later one.
    pub fn failing_from(n: usize) -> Self {
        Self {
            units: Shared::default(),
            fail_from: Some(n),
        }
    }

    /// Snapshot of the units created so far.
    pub fn units(&self) -> Vec<MemoryUnit> {
        lock(&self.units).clone()
    }
}

impl UnitTarget for MemoryTarget {
    fn create(&mut self, name: &str) -> std::io::Result<Box<dyn FinishWrite>> {
        let mut units = lock(&self.units);
        if self.fail_from.is_some_and(|n| units.len() >= n) {
            return Err(std::io::Error::other(format!("refusing to create {name}")));
        }
        units.push(MemoryUnit {
            name: name.to_string(),
            bytes: Vec::new(),
            finished: false,
        });
        Ok(Box::new(MemoryWriter {
            units: Arc::clone(&self.units),
            index: units.len() - 1,
        }))
    }
}

struct MemoryWriter {
    units: Shared<Vec<MemoryUnit>>,
    index: usize,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        lock(&self.units)[self.index].bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl FinishWrite for MemoryWriter {
    fn finish(self: Box<Self>) -> std::io::Result<()> {
        lock(&self.units)[self.index].finished = true;
        Ok(())
    }
}

/// A progress report captured by [`RecordingProgress`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressReport {
    pub unit: String,
    pub counter: Counter,
    pub count: u64,
}

/// [`ProgressReporter`] that records every report. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingProgress {
    reports: Shared<Vec<ProgressReport>>,
}

impl RecordingProgress {
    pub fn reports(&self) -> Vec<ProgressReport> {
        lock(&self.reports).clone()
    }
}

impl ProgressReporter for RecordingProgress {
    fn on_progress(&mut self, unit: &str, counter: Counter, count: u64) {
        lock(&self.reports).push(ProgressReport {
            unit: unit.to_string(),
            counter,
            count,
        });
    }
}

/// Write `rows` as a CSV dump with a header row. The file is compressed
/// when its extension names a codec.
///
/// # Errors
///
/// Returns an error if the file cannot be created or a row cannot be
/// serialized.
#[cfg(feature = "io-csv")]
pub fn write_csv_dump<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> anyhow::Result<PathBuf> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)?;
    let mut csv = csv::Writer::from_writer(auto_detect_writer(file, path)?);
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    let inner = csv.into_inner().map_err(|e| anyhow::anyhow!("{}", e.error()))?;
    inner.finish()?;
    Ok(path.to_path_buf())
}

/// Write `rows` as a JSON Lines dump. The file is compressed when its
/// extension names a codec.
///
/// # Errors
///
/// Returns an error if the file cannot be created or a row cannot be
/// serialized.
#[cfg(feature = "io-jsonl")]
pub fn write_jsonl_dump<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> anyhow::Result<PathBuf> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)?;
    let mut w = auto_detect_writer(file, path)?;
    for row in rows {
        serde_json::to_writer(&mut w, row)?;
        w.write_all(b"\n")?;
    }
    w.finish()?;
    Ok(path.to_path_buf())
}

/// Write the three datasets of `source` as dumps into a fresh temporary
/// directory, named the way [`FileSource`](crate::source::FileSource)
/// looks for them. `suffix` is appended to every file name, e.g. `".gz"`.
///
/// # Errors
///
/// Returns an error if the directory or a dump cannot be written.
pub fn write_dumps(
    source: &crate::source::VecSource,
    format: crate::source::InputFormat,
    suffix: &str,
) -> anyhow::Result<tempfile::TempDir> {
    use crate::source::InputFormat;

    let dir = tempfile::tempdir()?;
    let path = |dataset: &str| dir.path().join(format!("{dataset}.{}{suffix}", format.extension()));
    match format {
        #[cfg(feature = "io-csv")]
        InputFormat::Csv => {
            write_csv_dump(path("artists"), &source.artists)?;
            write_csv_dump(path("memberships"), &source.memberships)?;
            write_csv_dump(path("discographies"), &source.discographies)?;
        }
        #[cfg(feature = "io-jsonl")]
        InputFormat::Jsonl => {
            write_jsonl_dump(path("artists"), &source.artists)?;
            write_jsonl_dump(path("memberships"), &source.memberships)?;
            write_jsonl_dump(path("discographies"), &source.discographies)?;
        }
        #[allow(unreachable_patterns)]
        other => anyhow::bail!("input format {} is not enabled", other.extension()),
    }
    Ok(dir)
}
