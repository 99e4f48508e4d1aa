//! Typed rows produced by a [`RowSource`](crate::source::RowSource).
//!
//! Nullable columns are `Option`s. Whether an empty string or a zero counts
//! as absent is decided by the named policies at the bottom of this module,
//! never by default values.

use crate::error::DataShapeError;
use serde::{Deserialize, Serialize};

/// One row of the artist query.
///
/// Rows for the same `gid` must be contiguous; additional rows only
/// contribute further `area` values (broader regions of the artist's area).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRow {
    pub gid: String,
    /// NULL becomes `""` via [`text_or_empty`].
    pub name: Option<String>,
    /// Exactly `"Group"` marks the artist as a music group.
    pub artist_type: Option<String>,
    /// Empty counts as absent ([`present_text`]).
    pub gender: Option<String>,
    /// Empty counts as absent ([`present_text`]).
    pub area: Option<String>,
}

/// One row of the membership query: `member_gid` is a member of `group_gid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRow {
    pub member_gid: String,
    pub group_gid: String,
}

/// Whether the credited artist is a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtistKind {
    Person,
    Other,
}

/// One row of the discography query: an artist credited on a recording,
/// together with one track that carries that recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscographyRow {
    pub artist_gid: String,
    pub artist_kind: ArtistKind,
    pub track_gid: String,
    /// NULL becomes `""` via [`text_or_empty`].
    pub track_name: Option<String>,
    /// Only written when [`positive`].
    pub track_number: Option<i64>,
    /// Only written when [`positive`].
    pub track_duration_ms: Option<i64>,
    pub recording_gid: String,
    /// NULL becomes `""` via [`text_or_empty`].
    pub recording_name: Option<String>,
}

impl ArtistRow {
    pub fn new(gid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            gid: gid.into(),
            name: Some(name.into()),
            artist_type: None,
            gender: None,
            area: None,
        }
    }

    #[must_use]
    pub fn with_type(mut self, artist_type: impl Into<String>) -> Self {
        self.artist_type = Some(artist_type.into());
        self
    }

    #[must_use]
    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    #[must_use]
    pub fn with_area(mut self, area: impl Into<String>) -> Self {
        self.area = Some(area.into());
        self
    }

    pub fn is_group(&self) -> bool {
        self.artist_type.as_deref() == Some("Group")
    }
}

impl MembershipRow {
    pub fn new(member_gid: impl Into<String>, group_gid: impl Into<String>) -> Self {
        Self {
            member_gid: member_gid.into(),
            group_gid: group_gid.into(),
        }
    }
}

/// Absence policy for optional text: NULL and the empty string are both absent.
pub fn present_text(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Absence policy for optional counts and durations: NULL, zero and
/// negative values are all absent.
pub fn positive(value: Option<i64>) -> Option<i64> {
    value.filter(|v| *v > 0)
}

/// Substitution policy for display strings the serializer requires:
/// NULL is written as an empty literal.
pub fn text_or_empty(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

/// Check that `value` can be the local part of a prefixed name
/// (`mba:{value}`).
pub(crate) fn identifier<'a>(
    dataset: &'static str,
    field: &'static str,
    value: &'a str,
) -> Result<&'a str, DataShapeError> {
    let usable = !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if usable {
        Ok(value)
    } else {
        Err(DataShapeError::InvalidIdentifier {
            dataset,
            field,
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_absent() {
        assert_eq!(present_text(&None), None);
        assert_eq!(present_text(&Some(String::new())), None);
        assert_eq!(present_text(&Some("female".into())), Some("female"));
    }

    #[test]
    fn zero_and_negative_are_absent() {
        assert_eq!(positive(None), None);
        assert_eq!(positive(Some(0)), None);
        assert_eq!(positive(Some(-3)), None);
        assert_eq!(positive(Some(7)), Some(7));
    }

    #[test]
    fn null_display_text_becomes_empty() {
        assert_eq!(text_or_empty(&None), "");
        assert_eq!(text_or_empty(&Some("Homework".into())), "Homework");
    }

    #[test]
    fn identifiers() {
        let gid = "056e4f3e-d505-4dad-8ec1-d04f521cbb56";
        assert_eq!(identifier("artists", "gid", gid), Ok(gid));
        assert!(identifier("artists", "gid", "").is_err());
        assert!(identifier("artists", "gid", "a b").is_err());
        assert!(identifier("artists", "gid", "x>y").is_err());
    }

    #[test]
    fn group_type_is_exact() {
        assert!(ArtistRow::new("a", "n").with_type("Group").is_group());
        assert!(!ArtistRow::new("a", "n").with_type("group").is_group());
        assert!(!ArtistRow::new("a", "n").is_group());
    }
}
