//! Error taxonomy for the export pipelines.
//!
//! Every variant is fatal for the pipeline that raised it. There are no
//! retries anywhere: a failed export is re-run from scratch.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while exporting a dataset.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The row source could not be reached or queried.
    #[error("row source unavailable: {message}")]
    Connectivity {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An output unit could not be created, written or closed.
    #[error("output unit {unit}: {source}")]
    Sink {
        unit: String,
        #[source]
        source: std::io::Error,
    },

    /// A row did not have the shape the serializer relies on.
    #[error(transparent)]
    DataShape(#[from] DataShapeError),

    /// The configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Row-level violations of the serializer's preconditions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataShapeError {
    /// A grouping key arrived after a larger one, so rows for one entity
    /// are not contiguous.
    #[error("{dataset}: key {key} arrived after {previous}; rows must be ordered by key")]
    OutOfOrderKey {
        dataset: &'static str,
        previous: String,
        key: String,
    },

    /// An identifier cannot be used as the local part of a prefixed name.
    #[error("{dataset}: field `{field}` holds an unusable identifier {value:?}")]
    InvalidIdentifier {
        dataset: &'static str,
        field: &'static str,
        value: String,
    },

    /// A row could not be decoded from the source.
    #[error("{origin}: malformed row {row}: {message}")]
    Malformed {
        origin: String,
        row: u64,
        message: String,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ExportError>;

impl ExportError {
    pub(crate) fn connectivity(message: impl Into<String>) -> Self {
        ExportError::Connectivity {
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn connectivity_caused_by(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ExportError::Connectivity {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub(crate) fn sink(unit: impl Into<String>, source: std::io::Error) -> Self {
        ExportError::Sink {
            unit: unit.into(),
            source,
        }
    }

    pub(crate) fn missing_input(path: PathBuf) -> Self {
        ExportError::connectivity(format!("no input found at {}", path.display()))
    }

    /// Short name of the error class, used in logs and metrics.
    #[must_use]
    pub fn class(&self) -> &'static str {
        match self {
            ExportError::Connectivity { .. } => "connectivity",
            ExportError::Sink { .. } => "sink",
            ExportError::DataShape(_) => "data_shape",
            ExportError::Config(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_shape_converts_and_keeps_message() {
        let err: ExportError = DataShapeError::OutOfOrderKey {
            dataset: "artists",
            previous: "b".into(),
            key: "a".into(),
        }
        .into();
        assert_eq!(err.class(), "data_shape");
        assert!(err.to_string().contains("key a arrived after b"));
    }

    #[test]
    fn sink_error_names_the_unit() {
        let err = ExportError::sink(
            "00-discographies.trig.gz",
            std::io::Error::other("disk full"),
        );
        assert_eq!(err.to_string(), "output unit 00-discographies.trig.gz: disk full");
    }
}
