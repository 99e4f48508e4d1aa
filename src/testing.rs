//! Testing utilities for export pipelines.
//!
//! - **Fixtures**: sample rows for the three datasets
//! - **Mock I/O**: in-memory unit targets, a recording [`StatementSink`],
//!   a recording progress reporter and row dump writers backed by temporary
//!   directories
//! - **Assertions**: checks for the framing of output units
//!
//! ```
//! use trig_export::emitter::emit_grouped;
//! use trig_export::schema::ArtistSchema;
//! use trig_export::testing::*;
//!
//! let mut sink = RecordingSink::default();
//! let rows = sample_artist_rows().into_iter().map(Ok);
//! emit_grouped(ArtistSchema, rows, &mut sink, true).unwrap();
//! assert_eq!(count_statements(sink.text()), 2);
//! ```
//!
//! [`StatementSink`]: crate::sink::StatementSink

pub mod assertions;
pub mod fixtures;
pub mod mock_io;

pub use assertions::*;
pub use fixtures::*;
pub use mock_io::*;
