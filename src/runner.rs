//! Sequential execution of the selected pipelines.

use crate::config::{Dataset, ExportConfig};
use crate::error::{ExportError, Result};
use crate::export::{export_dataset, DatasetSummary};
#[cfg(feature = "metrics")]
use crate::metrics::{GaugeMetric, MetricsCollector};
use crate::progress::{LogProgress, ProgressReporter};
use crate::sink::{FileTarget, UnitTarget};
use crate::source::{FileSource, RowSource};
use tracing::{error, info, warn};

/// A pipeline that did not complete.
#[derive(Debug)]
pub struct DatasetFailure {
    pub dataset: Dataset,
    pub error: ExportError,
}

/// Outcome of a run.
#[derive(Default)]
pub struct RunReport {
    pub completed: Vec<DatasetSummary>,
    pub failed: Vec<DatasetFailure>,
    /// Datasets not attempted because an earlier one failed.
    pub skipped: Vec<Dataset>,
    #[cfg(feature = "metrics")]
    pub metrics: MetricsCollector,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// The summaries, or the first failure.
    ///
    /// # Errors
    /// The error of the first failed pipeline.
    pub fn into_result(mut self) -> Result<Vec<DatasetSummary>> {
        if self.failed.is_empty() {
            Ok(self.completed)
        } else {
            Err(self.failed.swap_remove(0).error)
        }
    }
}

/// Runs the configured datasets one after the other.
#[derive(Debug, Clone)]
pub struct Runner {
    config: ExportConfig,
}

impl Runner {
    /// # Errors
    /// `Config` if the configuration does not validate.
    pub fn new(config: ExportConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// The row source named by the configuration.
    ///
    /// # Errors
    /// `Connectivity` if the database cannot be reached.
    pub fn open_source(&self) -> Result<Box<dyn RowSource>> {
        if let Some(dir) = &self.config.input_dir {
            return Ok(Box::new(FileSource::new(dir, self.config.input_format)));
        }
        #[cfg(feature = "source-postgres")]
        if let Some(conn) = &self.config.connection_string {
            return Ok(Box::new(crate::source::postgres::PostgresSource::connect(conn)?));
        }
        Err(ExportError::Config("no row source configured".into()))
    }

    /// Export into the output directory, logging progress.
    ///
    /// # Errors
    /// Errors raised before the first pipeline starts. Pipeline failures are
    /// collected in the report instead.
    pub fn run(&self) -> Result<RunReport> {
        let mut source = self.open_source()?;
        let target = FileTarget::new(&self.config.output_dir);
        Ok(self.run_with(&mut source, target, LogProgress))
    }

    /// Export from `source` into `target`.
    pub fn run_with<S, T, P>(&self, source: &mut S, mut target: T, mut progress: P) -> RunReport
    where
        S: RowSource + ?Sized,
        T: UnitTarget,
        P: ProgressReporter,
    {
        let mut report = RunReport::default();
        #[cfg(feature = "metrics")]
        report.metrics.record_start();

        let mut remaining = self.config.datasets.iter().copied();
        for dataset in remaining.by_ref() {
            match export_dataset(dataset, source, &mut target, &self.config, &mut progress) {
                Ok(summary) => {
                    #[cfg(feature = "metrics")]
                    record_summary(&mut report.metrics, &summary);
                    report.completed.push(summary);
                }
                Err(e) => {
                    error!(dataset = %dataset, class = e.class(), "export failed: {e}");
                    #[cfg(feature = "metrics")]
                    report.metrics.increment_counter("failures", 1);
                    report.failed.push(DatasetFailure { dataset, error: e });
                    if !self.config.continue_on_error {
                        break;
                    }
                }
            }
        }
        report.skipped = remaining.collect();
        if !report.skipped.is_empty() {
            warn!(skipped = ?report.skipped, "stopped after the first failure");
        }

        #[cfg(feature = "metrics")]
        report.metrics.record_end();
        if report.is_success() {
            info!(datasets = report.completed.len(), "[FINAL] export complete");
        }
        report
    }
}

#[cfg(feature = "metrics")]
fn record_summary(metrics: &mut MetricsCollector, summary: &DatasetSummary) {
    let d = summary.dataset.name();
    metrics.increment_counter(&format!("{d}.rows"), summary.rows);
    metrics.increment_counter(&format!("{d}.statements"), summary.sink.statements());
    metrics.increment_counter(&format!("{d}.units"), summary.sink.units.len() as u64);
    if summary.sink.authorship > 0 {
        metrics.increment_counter(&format!("{d}.authorship_statements"), summary.sink.authorship);
    }
    metrics.register(Box::new(
        GaugeMetric::new(format!("{d}.seconds"), summary.elapsed.as_secs_f64())
            .with_description("Wall time of the pipeline"),
    ));
}
