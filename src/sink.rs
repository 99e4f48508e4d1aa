//! Output units and the chunked sink manager.
//!
//! An [`OutputUnit`] is one self-contained TriG document: prologue, body,
//! epilogue. The epilogue is only written by [`OutputUnit::finish`]; a unit
//! that is dropped on an error path stays without its closing brace, which
//! marks the file as truncated for whoever reads it.
//!
//! [`ChunkedSink`] owns the unit currently being written and the statement
//! counters. The emitters call [`StatementSink::statement_closed`] after
//! each terminator; that is the only place where the sink reports progress
//! and rotates to a new unit, so a statement never spans two units.

use crate::error::{ExportError, Result};
use crate::io::compression::{auto_detect_writer, FinishWrite};
use crate::progress::{LogProgress, ProgressReporter};
use crate::vocab::UnitFrame;
use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Independent statement counters kept by a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    /// Entity and type assertions.
    Assertions,
    /// `foaf:made` statements linking artists to their work.
    Authorship,
}

impl Counter {
    pub const ALL: [Counter; 2] = [Counter::Assertions, Counter::Authorship];

    fn index(self) -> usize {
        match self {
            Counter::Assertions => 0,
            Counter::Authorship => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Counter::Assertions => "assertions",
            Counter::Authorship => "authorship",
        }
    }
}

/// The kind of a completed statement, used to pick its counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Artist,
    Membership,
    Recording,
    Track,
    Authorship,
    SoloArtist,
}

impl StatementKind {
    pub fn counter(self) -> Counter {
        match self {
            StatementKind::Authorship => Counter::Authorship,
            _ => Counter::Assertions,
        }
    }
}

/// Reporting and rotation thresholds for one counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterPolicy {
    /// Report progress every this many statements (0 disables reporting).
    pub progress_every: u64,
    /// Start a new unit every this many statements.
    pub rotate_every: Option<u64>,
}

impl CounterPolicy {
    pub const fn unbounded(progress_every: u64) -> Self {
        Self {
            progress_every,
            rotate_every: None,
        }
    }

    pub const fn rotating(progress_every: u64, rotate_every: u64) -> Self {
        Self {
            progress_every,
            rotate_every: Some(rotate_every),
        }
    }
}

/// Thresholds for both counters of a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkPolicy {
    pub assertions: CounterPolicy,
    pub authorship: CounterPolicy,
}

impl SinkPolicy {
    /// A single unit that never rotates.
    pub const fn unbounded(progress_every: u64) -> Self {
        Self {
            assertions: CounterPolicy::unbounded(progress_every),
            authorship: CounterPolicy::unbounded(progress_every),
        }
    }

    pub fn get(&self, counter: Counter) -> CounterPolicy {
        match counter {
            Counter::Assertions => self.assertions,
            Counter::Authorship => self.authorship,
        }
    }

    fn rotates(&self) -> bool {
        Counter::ALL.iter().any(|c| self.get(*c).rotate_every.is_some())
    }
}

/// How units of one dataset are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitNaming {
    /// Exactly one unit with this name.
    Single(String),
    /// Rotated units named `00-{base}`, `01-{base}`, ...
    Numbered(String),
}

impl UnitNaming {
    pub fn name(&self, index: u32) -> String {
        match self {
            UnitNaming::Single(name) => name.clone(),
            UnitNaming::Numbered(base) => format!("{index:02}-{base}"),
        }
    }
}

/// Receiver of emitter output.
///
/// `write` appends text to the open statement; `statement_closed` is called
/// right after a statement terminator and marks a point where it is safe to
/// start a new unit.
pub trait StatementSink {
    fn write(&mut self, fragment: &str) -> Result<()>;

    fn statement_closed(&mut self, kind: StatementKind) -> Result<()>;
}

/// Creates the byte sinks units are written to.
pub trait UnitTarget {
    fn create(&mut self, name: &str) -> std::io::Result<Box<dyn FinishWrite>>;
}

/// Writes units as files in a directory, compressed according to the file
/// extension.
#[derive(Debug, Clone)]
pub struct FileTarget {
    dir: PathBuf,
}

impl FileTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl UnitTarget for FileTarget {
    fn create(&mut self, name: &str) -> std::io::Result<Box<dyn FinishWrite>> {
        create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        let file = File::create(&path)?;
        auto_detect_writer(file, &path).map_err(|e| std::io::Error::other(format!("{e:#}")))
    }
}

impl<T: UnitTarget + ?Sized> UnitTarget for &mut T {
    fn create(&mut self, name: &str) -> std::io::Result<Box<dyn FinishWrite>> {
        (**self).create(name)
    }
}

/// Statistics of a finished unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitReport {
    pub name: String,
    pub statements: u64,
}

/// One open TriG document.
pub struct OutputUnit {
    name: String,
    writer: Option<Box<dyn FinishWrite>>,
    epilogue: &'static str,
    statements: u64,
}

impl OutputUnit {
    /// Create the unit and write its prologue.
    pub fn open<T: UnitTarget + ?Sized>(target: &mut T, name: &str, frame: &UnitFrame) -> Result<Self> {
        let writer = target.create(name).map_err(|e| ExportError::sink(name, e))?;
        let mut unit = Self {
            name: name.to_string(),
            writer: Some(writer),
            epilogue: frame.epilogue(),
            statements: 0,
        };
        unit.write(frame.prologue())?;
        info!(unit = %unit.name, "[BEGIN] writing statements");
        Ok(unit)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn statements(&self) -> u64 {
        self.statements
    }

    pub fn write(&mut self, fragment: &str) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| ExportError::sink(&self.name, std::io::Error::other("unit already closed")))?;
        writer
            .write_all(fragment.as_bytes())
            .map_err(|e| ExportError::sink(&self.name, e))
    }

    /// Write the epilogue and finish the byte sink.
    pub fn finish(mut self) -> Result<UnitReport> {
        self.write(self.epilogue)?;
        if let Some(writer) = self.writer.take() {
            writer.finish().map_err(|e| ExportError::sink(&self.name, e))?;
        }
        info!(unit = %self.name, statements = self.statements, "[FINAL] closed unit");
        Ok(UnitReport {
            name: std::mem::take(&mut self.name),
            statements: self.statements,
        })
    }
}

impl Drop for OutputUnit {
    fn drop(&mut self) {
        if self.writer.is_some() {
            warn!(unit = %self.name, statements = self.statements, "unit abandoned without epilogue");
        }
    }
}

/// Totals of a closed sink.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkSummary {
    pub units: Vec<UnitReport>,
    pub assertions: u64,
    pub authorship: u64,
}

impl SinkSummary {
    pub fn statements(&self) -> u64 {
        self.assertions + self.authorship
    }

    pub fn unit_names(&self) -> Vec<&str> {
        self.units.iter().map(|u| u.name.as_str()).collect()
    }
}

/// Writes statements into a sequence of output units, rotating on
/// statement-count thresholds.
pub struct ChunkedSink<T: UnitTarget, P: ProgressReporter = LogProgress> {
    target: T,
    frame: UnitFrame,
    naming: UnitNaming,
    policy: SinkPolicy,
    progress: P,
    current: Option<OutputUnit>,
    next_index: u32,
    counts: [u64; 2],
    finished: Vec<UnitReport>,
}

impl<T: UnitTarget, P: ProgressReporter> ChunkedSink<T, P> {
    /// Open the first unit.
    ///
    /// # Errors
    /// `Config` when the policy rotates but the naming has room for a single
    /// unit only; `Sink` when the first unit cannot be created.
    pub fn open(
        target: T,
        frame: UnitFrame,
        naming: UnitNaming,
        policy: SinkPolicy,
        progress: P,
    ) -> Result<Self> {
        if policy.rotates() && matches!(naming, UnitNaming::Single(_)) {
            return Err(ExportError::Config(format!(
                "unit {} rotates but is not numbered",
                naming.name(0)
            )));
        }
        if Counter::ALL
            .iter()
            .any(|c| policy.get(*c).rotate_every == Some(0))
        {
            return Err(ExportError::Config("rotation threshold must be positive".into()));
        }
        let mut sink = Self {
            target,
            frame,
            naming,
            policy,
            progress,
            current: None,
            next_index: 0,
            counts: [0; 2],
            finished: Vec::new(),
        };
        sink.current = Some(sink.open_next()?);
        Ok(sink)
    }

    fn open_next(&mut self) -> Result<OutputUnit> {
        let name = self.naming.name(self.next_index);
        self.next_index += 1;
        OutputUnit::open(&mut self.target, &name, &self.frame)
    }

    fn unit(&mut self) -> Result<&mut OutputUnit> {
        self.current.as_mut().ok_or_else(|| {
            let name = self.naming.name(self.next_index.saturating_sub(1));
            ExportError::sink(name, std::io::Error::other("no open unit"))
        })
    }

    /// Name of the unit currently open.
    pub fn current_unit(&self) -> Option<&str> {
        self.current.as_ref().map(OutputUnit::name)
    }

    /// Statements completed so far for `counter`, across all units.
    pub fn statements(&self, counter: Counter) -> u64 {
        self.counts[counter.index()]
    }

    /// Close the current unit and open the next one if `statements_so_far`
    /// is a multiple of the counter's rotation threshold.
    ///
    /// Must only be called between statements. Returns whether it rotated.
    pub fn maybe_rotate(&mut self, counter: Counter, statements_so_far: u64) -> Result<bool> {
        let Some(every) = self.policy.get(counter).rotate_every else {
            return Ok(false);
        };
        if statements_so_far == 0 || statements_so_far % every != 0 {
            return Ok(false);
        }
        if let Some(unit) = self.current.take() {
            self.finished.push(unit.finish()?);
        }
        let next = self.open_next()?;
        debug!(unit = next.name(), counter = counter.as_str(), statements_so_far, "rotated");
        self.current = Some(next);
        Ok(true)
    }

    /// Close the current unit and return the totals.
    pub fn close(mut self) -> Result<SinkSummary> {
        if let Some(unit) = self.current.take() {
            self.finished.push(unit.finish()?);
        }
        Ok(SinkSummary {
            units: std::mem::take(&mut self.finished),
            assertions: self.counts[Counter::Assertions.index()],
            authorship: self.counts[Counter::Authorship.index()],
        })
    }
}

impl<T: UnitTarget, P: ProgressReporter> StatementSink for ChunkedSink<T, P> {
    fn write(&mut self, fragment: &str) -> Result<()> {
        self.unit()?.write(fragment)
    }

    fn statement_closed(&mut self, kind: StatementKind) -> Result<()> {
        let counter = kind.counter();
        let count = {
            let slot = &mut self.counts[counter.index()];
            *slot += 1;
            *slot
        };
        self.unit()?.statements += 1;

        let every = self.policy.get(counter).progress_every;
        if every > 0 && count % every == 0
            && let Some(unit) = self.current.as_ref()
        {
            self.progress.on_progress(&unit.name, counter, count);
        }
        self.maybe_rotate(counter, count)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryTarget, RecordingProgress};
    use crate::vocab::{DEFAULT_GRAPH_IRI, MBA};

    fn frame() -> UnitFrame {
        UnitFrame::new(&[MBA], DEFAULT_GRAPH_IRI)
    }

    fn statement<S: StatementSink>(sink: &mut S, kind: StatementKind) -> Result<()> {
        sink.write("mba:x a mba:y .\n")?;
        sink.statement_closed(kind)
    }

    #[test]
    fn unbounded_sink_writes_one_framed_unit() -> Result<()> {
        let target = MemoryTarget::new();
        let mut sink = ChunkedSink::open(
            target.clone(),
            frame(),
            UnitNaming::Single("artists.trig".into()),
            SinkPolicy::unbounded(10),
            RecordingProgress::default(),
        )?;
        for _ in 0..25 {
            statement(&mut sink, StatementKind::Artist)?;
        }
        let summary = sink.close()?;

        assert_eq!(summary.unit_names(), vec!["artists.trig"]);
        assert_eq!(summary.assertions, 25);
        let units = target.units();
        assert_eq!(units.len(), 1);
        assert!(units[0].finished);
        assert!(units[0].text().starts_with(frame().prologue()));
        assert!(units[0].text().ends_with(".\n}\n"));
        Ok(())
    }

    #[test]
    fn progress_fires_on_interval() -> Result<()> {
        let progress = RecordingProgress::default();
        let mut sink = ChunkedSink::open(
            MemoryTarget::new(),
            frame(),
            UnitNaming::Single("m.trig".into()),
            SinkPolicy::unbounded(10),
            progress.clone(),
        )?;
        for _ in 0..25 {
            statement(&mut sink, StatementKind::Membership)?;
        }
        sink.close()?;
        let counts: Vec<u64> = progress.reports().iter().map(|r| r.count).collect();
        assert_eq!(counts, vec![10, 20]);
        Ok(())
    }

    #[test]
    fn rotation_follows_each_counter_independently() -> Result<()> {
        let target = MemoryTarget::new();
        let policy = SinkPolicy {
            assertions: CounterPolicy::rotating(0, 3),
            authorship: CounterPolicy::rotating(0, 2),
        };
        let mut sink = ChunkedSink::open(
            target.clone(),
            frame(),
            UnitNaming::Numbered("d.trig".into()),
            policy,
            RecordingProgress::default(),
        )?;
        // assertions: 1, 2, 3 -> rotate
        statement(&mut sink, StatementKind::Recording)?;
        statement(&mut sink, StatementKind::Track)?;
        assert_eq!(sink.current_unit(), Some("00-d.trig"));
        statement(&mut sink, StatementKind::SoloArtist)?;
        assert_eq!(sink.current_unit(), Some("01-d.trig"));
        // authorship: 1, 2 -> rotate
        statement(&mut sink, StatementKind::Authorship)?;
        statement(&mut sink, StatementKind::Authorship)?;
        assert_eq!(sink.current_unit(), Some("02-d.trig"));
        let summary = sink.close()?;

        assert_eq!(summary.unit_names(), vec!["00-d.trig", "01-d.trig", "02-d.trig"]);
        assert_eq!(summary.units[0].statements, 3);
        assert_eq!(summary.units[1].statements, 2);
        assert_eq!(summary.units[2].statements, 0);
        assert!(target.units().iter().all(|u| u.finished && u.text().ends_with("}\n")));
        Ok(())
    }

    #[test]
    fn single_naming_cannot_rotate() {
        let err = ChunkedSink::open(
            MemoryTarget::new(),
            frame(),
            UnitNaming::Single("a.trig".into()),
            SinkPolicy {
                assertions: CounterPolicy::rotating(0, 5),
                authorship: CounterPolicy::unbounded(0),
            },
            RecordingProgress::default(),
        )
        .err();
        assert!(matches!(err, Some(ExportError::Config(_))));
    }

    #[test]
    fn dropped_sink_leaves_unit_without_epilogue() -> Result<()> {
        let target = MemoryTarget::new();
        {
            let mut sink = ChunkedSink::open(
                target.clone(),
                frame(),
                UnitNaming::Single("a.trig".into()),
                SinkPolicy::unbounded(0),
                RecordingProgress::default(),
            )?;
            statement(&mut sink, StatementKind::Artist)?;
        }
        let units = target.units();
        assert!(!units[0].finished);
        assert!(!units[0].text().contains('}'));
        Ok(())
    }

    #[test]
    fn numbered_names_are_zero_padded() {
        let naming = UnitNaming::Numbered("discographies.trig.gz".into());
        assert_eq!(naming.name(0), "00-discographies.trig.gz");
        assert_eq!(naming.name(7), "07-discographies.trig.gz");
        assert_eq!(naming.name(123), "123-discographies.trig.gz");
    }
}
