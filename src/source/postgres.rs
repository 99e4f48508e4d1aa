//! Rows straight from a MusicBrainz PostgreSQL database.
//!
//! Each stream is a single query whose rows are fetched incrementally over
//! the connection. Identifiers are cast to text and integer columns to
//! `bigint` in SQL so that decoding never depends on the server's column
//! types.

use super::{RowSource, Rows};
use crate::error::{DataShapeError, ExportError, Result};
use crate::row::{ArtistKind, ArtistRow, DiscographyRow, MembershipRow};
use postgres::fallible_iterator::FallibleIterator;
use postgres::{Client, NoTls, Row};
use tracing::info;

/// Artists with their area and every area that contains it, one row per
/// area.
const ARTISTS_SQL: &str = r#"
WITH RECURSIVE artist_with_all_areas (gid, name, artist_type, gender, area, area_id) AS (
    SELECT artist.gid, artist.name, artist_type.name, LOWER(gender.name), area.name, area.id
    FROM artist
        LEFT JOIN artist_type ON artist.type = artist_type.id
        LEFT JOIN area ON artist.area = area.id
        LEFT JOIN gender ON artist.gender = gender.id
    UNION
    SELECT a.gid, a.name, a.artist_type, a.gender, area.name, area.id
    FROM artist_with_all_areas a
        JOIN l_area_area ON a.area_id = l_area_area.entity1
        JOIN area ON l_area_area.entity0 = area.id
)
SELECT gid::text AS gid, name, artist_type, gender, area
FROM artist_with_all_areas
ORDER BY gid"#;

/// "member of band" relationships (link type 103).
const MEMBERSHIPS_SQL: &str = r#"
SELECT member.gid::text AS member_gid, band.gid::text AS group_gid
FROM artist member
    JOIN l_artist_artist ON member.id = l_artist_artist.entity0
    JOIN link ON l_artist_artist.link = link.id
    JOIN artist band ON l_artist_artist.entity1 = band.id
WHERE link.link_type = 103
ORDER BY member_gid"#;

/// One row per (artist credited on a recording, track of that recording).
const DISCOGRAPHIES_SQL: &str = r#"
SELECT
    a.gid::text AS artist_gid,
    CASE WHEN a.type = 1 THEN 'Person' ELSE 'Other' END AS artist_kind,
    t.gid::text AS track_gid,
    t.name AS track_name,
    t.position::bigint AS track_number,
    t.length::bigint AS track_duration_ms,
    r.gid::text AS recording_gid,
    r.name AS recording_name
FROM track t
    JOIN recording r ON r.id = t.recording
    JOIN l_artist_recording lar ON r.id = lar.entity1
    JOIN artist a ON a.id = lar.entity0
ORDER BY recording_gid"#;

/// [`RowSource`] backed by a database connection.
pub struct PostgresSource {
    client: Client,
}

impl PostgresSource {
    /// Connect with a libpq-style connection string.
    ///
    /// # Errors
    /// `Connectivity` if the server cannot be reached or refuses the login.
    pub fn connect(connection_string: &str) -> Result<Self> {
        let client = Client::connect(connection_string, NoTls)
            .map_err(|e| ExportError::connectivity_caused_by("connect to database", e))?;
        info!("connected to database");
        Ok(Self { client })
    }

    fn query<T, F>(&mut self, dataset: &'static str, sql: &'static str, decode: F) -> Result<Rows<'_, T>>
    where
        T: 'static,
        F: Fn(&Row) -> std::result::Result<T, postgres::Error> + 'static,
    {
        let rows = self
            .client
            .query_raw(sql, Vec::<String>::new())
            .map_err(|e| ExportError::connectivity_caused_by(format!("query {dataset}"), e))?;
        let mut n = 0u64;
        Ok(Box::new(rows.iterator().map(move |row| -> Result<T> {
            n += 1;
            let row = row.map_err(|e| {
                ExportError::connectivity_caused_by(format!("fetch {dataset} row {n}"), e)
            })?;
            decode(&row).map_err(|e| {
                DataShapeError::Malformed {
                    origin: dataset.to_string(),
                    row: n,
                    message: e.to_string(),
                }
                .into()
            })
        })))
    }
}

impl RowSource for PostgresSource {
    fn artists(&mut self) -> Result<Rows<'_, ArtistRow>> {
        self.query("artists", ARTISTS_SQL, |row| {
            Ok(ArtistRow {
                gid: row.try_get("gid")?,
                name: row.try_get("name")?,
                artist_type: row.try_get("artist_type")?,
                gender: row.try_get("gender")?,
                area: row.try_get("area")?,
            })
        })
    }

    fn memberships(&mut self) -> Result<Rows<'_, MembershipRow>> {
        self.query("memberships", MEMBERSHIPS_SQL, |row| {
            Ok(MembershipRow {
                member_gid: row.try_get("member_gid")?,
                group_gid: row.try_get("group_gid")?,
            })
        })
    }

    fn discographies(&mut self) -> Result<Rows<'_, DiscographyRow>> {
        self.query("discographies", DISCOGRAPHIES_SQL, |row| {
            let kind: &str = row.try_get("artist_kind")?;
            Ok(DiscographyRow {
                artist_gid: row.try_get("artist_gid")?,
                artist_kind: if kind == "Person" {
                    ArtistKind::Person
                } else {
                    ArtistKind::Other
                },
                track_gid: row.try_get("track_gid")?,
                track_name: row.try_get("track_name")?,
                track_number: row.try_get("track_number")?,
                track_duration_ms: row.try_get("track_duration_ms")?,
                recording_gid: row.try_get("recording_gid")?,
                recording_name: row.try_get("recording_name")?,
            })
        })
    }
}
