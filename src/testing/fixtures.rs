//! Sample rows.

use crate::row::{ArtistKind, ArtistRow, DiscographyRow, MembershipRow};

/// Two artists: a group with two areas and a person with a gender.
///
/// ```
/// use trig_export::testing::sample_artist_rows;
///
/// let rows = sample_artist_rows();
/// assert_eq!(rows.len(), 3);
/// assert_eq!(rows[0].gid, rows[1].gid);
/// ```
#[must_use]
pub fn sample_artist_rows() -> Vec<ArtistRow> {
    vec![
        ArtistRow::new("A1", "Daft Punk")
            .with_type("Group")
            .with_gender("")
            .with_area("France"),
        ArtistRow::new("A1", "Daft Punk")
            .with_type("Group")
            .with_gender("")
            .with_area("Belgium"),
        ArtistRow::new("A2", "Beyoncé")
            .with_type("Person")
            .with_gender("female")
            .with_area("USA"),
    ]
}

/// Three members, the first of them in two groups.
#[must_use]
pub fn sample_membership_rows() -> Vec<MembershipRow> {
    vec![
        MembershipRow::new("m1", "g1"),
        MembershipRow::new("m1", "g2"),
        MembershipRow::new("m2", "g1"),
        MembershipRow::new("m3", "g3"),
    ]
}

/// A person credited on one track.
#[must_use]
pub fn sample_discography_row() -> DiscographyRow {
    DiscographyRow {
        artist_gid: "a1".to_string(),
        artist_kind: ArtistKind::Person,
        track_gid: "t1".to_string(),
        track_name: Some("Crazy in Love".to_string()),
        track_number: Some(1),
        track_duration_ms: Some(236_000),
        recording_gid: "r1".to_string(),
        recording_name: Some("Crazy in Love".to_string()),
    }
}

/// `n` discography rows ordered by recording, alternating persons and
/// groups.
///
/// Each person row yields four statements (three assertions, one
/// authorship), every other row three (two assertions, one authorship).
#[must_use]
pub fn discography_rows(n: usize) -> Vec<DiscographyRow> {
    (0..n)
        .map(|i| DiscographyRow {
            artist_gid: format!("artist-{}", i % 7),
            artist_kind: if i % 2 == 0 { ArtistKind::Person } else { ArtistKind::Other },
            track_gid: format!("track-{i:06}"),
            track_name: Some(format!("Track \"{i}\"")),
            track_number: Some((i % 12) as i64),
            track_duration_ms: if i % 3 == 0 { None } else { Some(180_000 + i as i64) },
            recording_gid: format!("recording-{i:06}"),
            recording_name: Some(format!("Recording {i}")),
        })
        .collect()
}
