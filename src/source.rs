//! Row sources: where the three datasets come from.
//!
//! A [`RowSource`] hands out one ordered row stream per dataset. Streams
//! are pulled lazily; nothing is materialized beyond the current row.
//!
//! - [`VecSource`]: rows held in memory
//! - [`FileSource`]: CSV or JSON Lines dumps in a directory, optionally
//!   compressed
//! - [`postgres::PostgresSource`]: a live MusicBrainz database (feature
//!   `source-postgres`)

use crate::error::{ExportError, Result};
use crate::io::compression::known_extensions;
use crate::row::{ArtistRow, DiscographyRow, MembershipRow};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

#[cfg_attr(docsrs, doc(cfg(feature = "source-postgres")))]
#[cfg(feature = "source-postgres")]
pub mod postgres;

/// A lazily pulled stream of rows.
pub type Rows<'a, T> = Box<dyn Iterator<Item = Result<T>> + 'a>;

/// Provider of the three ordered row streams.
///
/// Artists must be ordered by gid, memberships by member gid and
/// discographies by recording gid. The order check of the grouped
/// emitters (`checkKeyOrder`, on by default) rejects any other order; a
/// source whose rows are only contiguous per key, such as a dump ordered by
/// the database's numeric artist id, needs `checkKeyOrder: false`.
pub trait RowSource {
    fn artists(&mut self) -> Result<Rows<'_, ArtistRow>>;

    fn memberships(&mut self) -> Result<Rows<'_, MembershipRow>>;

    fn discographies(&mut self) -> Result<Rows<'_, DiscographyRow>>;
}

impl<S: RowSource + ?Sized> RowSource for Box<S> {
    fn artists(&mut self) -> Result<Rows<'_, ArtistRow>> {
        (**self).artists()
    }

    fn memberships(&mut self) -> Result<Rows<'_, MembershipRow>> {
        (**self).memberships()
    }

    fn discographies(&mut self) -> Result<Rows<'_, DiscographyRow>> {
        (**self).discographies()
    }
}

/// Rows held in memory. Each stream can be pulled any number of times.
#[derive(Debug, Clone, Default)]
pub struct VecSource {
    pub artists: Vec<ArtistRow>,
    pub memberships: Vec<MembershipRow>,
    pub discographies: Vec<DiscographyRow>,
}

impl VecSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_artists(mut self, rows: Vec<ArtistRow>) -> Self {
        self.artists = rows;
        self
    }

    #[must_use]
    pub fn with_memberships(mut self, rows: Vec<MembershipRow>) -> Self {
        self.memberships = rows;
        self
    }

    #[must_use]
    pub fn with_discographies(mut self, rows: Vec<DiscographyRow>) -> Self {
        self.discographies = rows;
        self
    }
}

impl RowSource for VecSource {
    fn artists(&mut self) -> Result<Rows<'_, ArtistRow>> {
        Ok(Box::new(self.artists.iter().cloned().map(Ok)))
    }

    fn memberships(&mut self) -> Result<Rows<'_, MembershipRow>> {
        Ok(Box::new(self.memberships.iter().cloned().map(Ok)))
    }

    fn discographies(&mut self) -> Result<Rows<'_, DiscographyRow>> {
        Ok(Box::new(self.discographies.iter().cloned().map(Ok)))
    }
}

/// Encoding of row dumps read by [`FileSource`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// Comma-separated with a header row.
    #[default]
    Csv,
    /// One JSON object per line.
    Jsonl,
}

impl InputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            InputFormat::Csv => "csv",
            InputFormat::Jsonl => "jsonl",
        }
    }
}

impl FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(InputFormat::Csv),
            "jsonl" | "ndjson" => Ok(InputFormat::Jsonl),
            other => Err(format!("unknown input format {other:?} (expected csv or jsonl)")),
        }
    }
}

/// Reads `artists`, `memberships` and `discographies` dumps from a
/// directory.
///
/// For dataset `artists` in CSV format the source looks for `artists.csv`,
/// then for `artists.csv` followed by any registered compression extension
/// (`artists.csv.gz`, `artists.csv.zst`, ...).
#[derive(Debug, Clone)]
pub struct FileSource {
    dir: PathBuf,
    format: InputFormat,
}

impl FileSource {
    pub fn new(dir: impl Into<PathBuf>, format: InputFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the dump for `dataset`.
    ///
    /// # Errors
    /// `Connectivity` when no candidate file exists.
    pub fn locate(&self, dataset: &str) -> Result<PathBuf> {
        let plain = self.dir.join(format!("{dataset}.{}", self.format.extension()));
        if plain.is_file() {
            return Ok(plain);
        }
        let compressed = known_extensions()
            .iter()
            .map(|ext| {
                let mut name = plain.clone().into_os_string();
                name.push(ext);
                PathBuf::from(name)
            })
            .find(|p| p.is_file());
        compressed.ok_or_else(|| ExportError::missing_input(plain))
    }

    fn open<T>(&self, dataset: &str) -> Result<Rows<'_, T>>
    where
        T: serde::de::DeserializeOwned + 'static,
    {
        let path = self.locate(dataset)?;
        debug!(path = %path.display(), format = self.format.extension(), "opening row dump");
        match self.format {
            #[cfg(feature = "io-csv")]
            InputFormat::Csv => Ok(Box::new(crate::io::csv::open_csv_rows::<T>(&path)?)),
            #[cfg(feature = "io-jsonl")]
            InputFormat::Jsonl => Ok(Box::new(crate::io::jsonl::open_jsonl_rows::<T>(&path)?)),
            #[allow(unreachable_patterns)]
            other => Err(ExportError::Config(format!(
                "input format {} is not enabled in this build",
                other.extension()
            ))),
        }
    }
}

impl RowSource for FileSource {
    fn artists(&mut self) -> Result<Rows<'_, ArtistRow>> {
        self.open("artists")
    }

    fn memberships(&mut self) -> Result<Rows<'_, MembershipRow>> {
        self.open("memberships")
    }

    fn discographies(&mut self) -> Result<Rows<'_, DiscographyRow>> {
        self.open("discographies")
    }
}
