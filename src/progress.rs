//! Periodic progress reporting.
//!
//! The sink calls [`ProgressReporter::on_progress`] whenever a statement
//! counter reaches a multiple of its reporting interval. Reporters return
//! nothing: reporting can never fail or stop an export.

use crate::sink::Counter;
use tracing::info;

/// Observer for statement counts.
pub trait ProgressReporter {
    /// `count` statements have been completed for `counter`; `unit` is the
    /// output unit currently open.
    fn on_progress(&mut self, unit: &str, counter: Counter, count: u64);
}

/// Logs progress through `tracing` at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn on_progress(&mut self, unit: &str, counter: Counter, count: u64) {
        info!(unit, counter = counter.as_str(), count, "[PROGRESS] wrote {count} statements");
    }
}

/// Discards every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn on_progress(&mut self, _unit: &str, _counter: Counter, _count: u64) {}
}

impl<P: ProgressReporter + ?Sized> ProgressReporter for &mut P {
    fn on_progress(&mut self, unit: &str, counter: Counter, count: u64) {
        (**self).on_progress(unit, counter, count);
    }
}

impl<P: ProgressReporter + ?Sized> ProgressReporter for Box<P> {
    fn on_progress(&mut self, unit: &str, counter: Counter, count: u64) {
        (**self).on_progress(unit, counter, count);
    }
}
