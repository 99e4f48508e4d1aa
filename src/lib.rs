//! # trig-export
//!
//! A **streaming serializer** that turns MusicBrainz relational rows into
//! gzip-compressed TriG documents for loading into a triple store.
//!
//! ## Key Features
//!
//! - **Three datasets** - artists, band memberships and discographies
//! - **Row coalescing** - consecutive rows of one entity become a single
//!   statement with comma-joined values
//! - **Chunked output** - discography units rotate on two independent
//!   statement counters, never in the middle of a statement
//! - **Constant memory** - rows are pulled one at a time from CSV/JSONL dumps
//!   or a PostgreSQL database
//! - **Self-describing failures** - a unit only gets its closing brace when
//!   it was written completely
//!
//! ## Quick Start
//!
//! ```
//! use trig_export::*;
//! use trig_export::testing::{sample_artist_rows, MemoryTarget};
//!
//! # fn main() -> Result<()> {
//! let config = ExportConfig {
//!     input_dir: Some("unused".into()),
//!     datasets: vec![Dataset::Artists],
//!     ..ExportConfig::default()
//! };
//! let mut source = VecSource::new().with_artists(sample_artist_rows());
//! let target = MemoryTarget::new();
//!
//! let report = Runner::new(config)?.run_with(&mut source, target.clone(), NoProgress);
//! assert!(report.is_success());
//! assert!(target.units()[0].text().contains("foaf:based_near \"France\" , \"Belgium\" .\n"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`escape`] - string literal escaping
//! - [`emitter`] - the grouped and per-row statement emitters
//! - [`schema`] - statement shapes of the three datasets
//! - [`sink`] - output units, rotation and statement counters
//! - [`progress`] - progress reporting
//! - [`source`] - row sources (dumps, memory, PostgreSQL)
//! - [`export`] and [`runner`] - the pipelines and their execution
//! - [`io`] - compression codecs and dump readers
//! - [`testing`] - fixtures, in-memory sinks and assertions

pub mod config;
pub mod emitter;
pub mod error;
pub mod escape;
pub mod export;
pub mod io;
pub mod progress;
pub mod row;
pub mod runner;
pub mod schema;
pub mod sink;
pub mod source;
pub mod testing;
pub mod vocab;

#[cfg_attr(docsrs, doc(cfg(feature = "metrics")))]
#[cfg(feature = "metrics")]
pub mod metrics;

pub use config::{Compression, Dataset, ExportConfig, ProgressIntervals};
pub use emitter::{emit_grouped, emit_rows, EmitStats, GroupedEmitter, RowEmitter};
pub use error::{DataShapeError, ExportError, Result};
pub use export::{export_dataset, DatasetSummary};
pub use progress::{LogProgress, NoProgress, ProgressReporter};
pub use row::{ArtistKind, ArtistRow, DiscographyRow, MembershipRow};
pub use runner::{RunReport, Runner};
pub use sink::{ChunkedSink, Counter, FileTarget, SinkSummary, StatementSink, UnitTarget};
pub use source::{FileSource, InputFormat, RowSource, VecSource};
pub use vocab::{UnitFrame, DEFAULT_GRAPH_IRI};
