//! Export configuration.
//!
//! [`ExportConfig`] is read from an optional JSON file (camelCase keys, every
//! key optional) and then overridden field by field by the command line.
//!
//! ```
//! use trig_export::config::{Compression, ExportConfig};
//!
//! let config: ExportConfig = serde_json::from_str(r#"{
//!     "inputDir": "dumps",
//!     "outputDir": "out",
//!     "rotationThreshold": 5000000
//! }"#).unwrap();
//! assert_eq!(config.rotation_threshold, 5_000_000);
//! assert_eq!(config.authorship_rotation_threshold, 1_000_000);
//! assert_eq!(config.compression, Compression::Gzip);
//! config.validate().unwrap();
//! ```

use crate::error::{ExportError, Result};
use crate::io::compression::codec_by_name;
use crate::source::InputFormat;
use crate::vocab::DEFAULT_GRAPH_IRI;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The three exported datasets, in their default run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    Artists,
    Memberships,
    Discographies,
}

impl Dataset {
    pub const ALL: [Dataset; 3] = [Dataset::Artists, Dataset::Memberships, Dataset::Discographies];

    pub fn name(self) -> &'static str {
        match self {
            Dataset::Artists => "artists",
            Dataset::Memberships => "memberships",
            Dataset::Discographies => "discographies",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dataset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Dataset::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown dataset {s:?} (expected artists, memberships or discographies)"))
    }
}

/// Compression applied to output units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    None,
    #[default]
    Gzip,
    Zstd,
    Bzip2,
    Xz,
}

impl Compression {
    /// Suffix appended to `.trig`; it also selects the codec.
    pub fn extension(self) -> &'static str {
        match self {
            Compression::None => "",
            Compression::Gzip => ".gz",
            Compression::Zstd => ".zst",
            Compression::Bzip2 => ".bz2",
            Compression::Xz => ".xz",
        }
    }

    /// Name of the codec in the compression registry.
    pub fn codec(self) -> Option<&'static str> {
        match self {
            Compression::None => None,
            Compression::Gzip => Some("gzip"),
            Compression::Zstd => Some("zstd"),
            Compression::Bzip2 => Some("bzip2"),
            Compression::Xz => Some("xz"),
        }
    }

    /// File name of a unit called `stem`.
    pub fn unit_name(self, stem: &str) -> String {
        format!("{stem}.trig{}", self.extension())
    }
}

impl FromStr for Compression {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Compression::None),
            "gzip" | "gz" => Ok(Compression::Gzip),
            "zstd" | "zst" => Ok(Compression::Zstd),
            "bzip2" | "bz2" => Ok(Compression::Bzip2),
            "xz" => Ok(Compression::Xz),
            other => Err(format!("unknown compression {other:?}")),
        }
    }
}

/// Statement counts between two progress reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressIntervals {
    pub artists: u64,
    pub memberships: u64,
    /// Recording, track and solo-artist statements.
    pub assertions: u64,
    /// `foaf:made` statements.
    pub authorship: u64,
}

impl Default for ProgressIntervals {
    fn default() -> Self {
        Self {
            artists: 10_000,
            memberships: 100_000,
            assertions: 100_000,
            authorship: 1_000_000,
        }
    }
}

/// Everything a run needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportConfig {
    /// Database to read rows from. Exclusive with `input_dir`.
    pub connection_string: Option<String>,
    /// Directory of row dumps. Exclusive with `connection_string`.
    pub input_dir: Option<PathBuf>,
    pub input_format: InputFormat,
    pub output_dir: PathBuf,
    /// Discography units rotate after this many assertion statements.
    pub rotation_threshold: u64,
    /// Discography units rotate after this many authorship statements.
    pub authorship_rotation_threshold: u64,
    pub compression: Compression,
    pub graph_iri: String,
    /// Datasets to export, in order.
    pub datasets: Vec<Dataset>,
    /// Fail on grouping keys that arrive out of order.
    pub check_key_order: bool,
    /// Keep running the remaining datasets after one fails.
    pub continue_on_error: bool,
    /// Where to save run metrics as JSON.
    pub metrics_file: Option<PathBuf>,
    pub progress: ProgressIntervals,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            connection_string: None,
            input_dir: None,
            input_format: InputFormat::default(),
            output_dir: PathBuf::from("."),
            rotation_threshold: 10_000_000,
            authorship_rotation_threshold: 1_000_000,
            compression: Compression::default(),
            graph_iri: DEFAULT_GRAPH_IRI.to_string(),
            datasets: Dataset::ALL.to_vec(),
            check_key_order: true,
            continue_on_error: false,
            metrics_file: None,
            progress: ProgressIntervals::default(),
        }
    }
}

impl ExportConfig {
    /// Load a JSON configuration file. Missing keys take their defaults.
    ///
    /// # Errors
    /// `Config` if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ExportError::Config(format!("read {}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| ExportError::Config(format!("parse {}: {e}", path.display())))
    }

    /// Check the configuration before any output is produced.
    ///
    /// # Errors
    /// `Config` naming the first problem found.
    pub fn validate(&self) -> Result<()> {
        match (&self.connection_string, &self.input_dir) {
            (Some(_), Some(_)) => {
                return Err(ExportError::Config(
                    "connectionString and inputDir are mutually exclusive".into(),
                ));
            }
            (None, None) => {
                return Err(ExportError::Config(
                    "one of connectionString or inputDir is required".into(),
                ));
            }
            _ => {}
        }
        if self.rotation_threshold == 0 || self.authorship_rotation_threshold == 0 {
            return Err(ExportError::Config("rotation thresholds must be positive".into()));
        }
        let p = &self.progress;
        if [p.artists, p.memberships, p.assertions, p.authorship].contains(&0) {
            return Err(ExportError::Config("progress intervals must be positive".into()));
        }
        if self.datasets.is_empty() {
            return Err(ExportError::Config("no dataset selected".into()));
        }
        if let Some(d) = self
            .datasets
            .iter()
            .enumerate()
            .find_map(|(i, d)| self.datasets[..i].contains(d).then_some(d))
        {
            return Err(ExportError::Config(format!("dataset {d} selected twice")));
        }
        if self.graph_iri.is_empty() || self.graph_iri.contains(['<', '>', ' ', '"', '{', '}']) {
            return Err(ExportError::Config(format!("unusable graph IRI {:?}", self.graph_iri)));
        }
        if let Some(codec) = self.compression.codec()
            && codec_by_name(codec).is_none()
        {
            return Err(ExportError::Config(format!(
                "compression {codec} is not enabled in this build"
            )));
        }
        #[cfg(not(feature = "source-postgres"))]
        if self.connection_string.is_some() {
            return Err(ExportError::Config(
                "connectionString requires the source-postgres feature".into(),
            ));
        }
        Ok(())
    }
}
