//! trig-export: write MusicBrainz artists, memberships and discographies as
//! TriG files.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use trig_export::{Compression, Dataset, ExportConfig, InputFormat, Runner};

#[derive(Parser)]
#[command(name = "trig-export", version, about = "Export MusicBrainz data as TriG")]
struct Cli {
    /// JSON configuration file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// PostgreSQL connection string of the MusicBrainz database
    #[arg(long, env = "TRIG_EXPORT_DATABASE_URL", hide_env_values = true)]
    connection_string: Option<String>,

    /// Directory with artists, memberships and discographies dumps; takes
    /// precedence over any connection string
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Format of the dumps in --input-dir (csv or jsonl)
    #[arg(long)]
    input_format: Option<InputFormat>,

    /// Directory the units are written to
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Discography assertions per unit
    #[arg(long)]
    rotation_threshold: Option<u64>,

    /// Discography authorship statements per unit
    #[arg(long)]
    authorship_rotation_threshold: Option<u64>,

    /// Output compression (none, gzip, zstd, bzip2, xz)
    #[arg(long)]
    compression: Option<Compression>,

    /// Dataset to export; repeat to select several (default: all)
    #[arg(long = "dataset")]
    datasets: Vec<Dataset>,

    /// Named graph the statements are written into
    #[arg(long)]
    graph_iri: Option<String>,

    /// Accept grouping keys in any order as long as each key's rows are
    /// contiguous
    #[arg(long)]
    no_check_key_order: bool,

    /// Keep exporting the remaining datasets after a failure
    #[arg(long)]
    continue_on_error: bool,

    /// Save run metrics to this JSON file
    #[arg(long)]
    metrics_file: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

impl Cli {
    fn into_config(self) -> Result<ExportConfig> {
        let mut config = match &self.config {
            Some(path) => ExportConfig::from_file(path)?,
            None => ExportConfig::default(),
        };
        if self.input_dir.is_some() {
            config.input_dir = self.input_dir;
            config.connection_string = None;
        } else if self.connection_string.is_some() {
            config.connection_string = self.connection_string;
            config.input_dir = None;
        }
        if let Some(format) = self.input_format {
            config.input_format = format;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(n) = self.rotation_threshold {
            config.rotation_threshold = n;
        }
        if let Some(n) = self.authorship_rotation_threshold {
            config.authorship_rotation_threshold = n;
        }
        if let Some(c) = self.compression {
            config.compression = c;
        }
        if !self.datasets.is_empty() {
            config.datasets = self.datasets;
        }
        if let Some(iri) = self.graph_iri {
            config.graph_iri = iri;
        }
        if self.no_check_key_order {
            config.check_key_order = false;
        }
        config.continue_on_error |= self.continue_on_error;
        if self.metrics_file.is_some() {
            config.metrics_file = self.metrics_file;
        }
        Ok(config)
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.into_config().context("load configuration")?;
    let runner = Runner::new(config).context("invalid configuration")?;
    let report = runner.run().context("start export")?;

    #[cfg(feature = "metrics")]
    {
        report.metrics.print();
        if let Some(path) = &runner.config().metrics_file {
            report.metrics.save_to_file(path)?;
        }
    }

    if !report.is_success() {
        for failure in &report.failed {
            eprintln!("Error: {} export failed: {}", failure.dataset, failure.error);
        }
        bail!("{} of {} datasets failed", report.failed.len(), runner.config().datasets.len());
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
