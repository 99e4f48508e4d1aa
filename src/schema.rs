//! Statement shapes of the three datasets.

use crate::emitter::{GroupedSchema, RowSchema, StatementBatch};
use crate::error::DataShapeError;
use crate::escape::push_literal;
use crate::row::{
    identifier, positive, present_text, text_or_empty, ArtistKind, ArtistRow, DiscographyRow,
    MembershipRow,
};
use crate::sink::StatementKind;
use std::fmt::Write;

type ShapeResult = Result<(), DataShapeError>;

/// `mba:{gid} rdf:type mo:MusicArtist [, mo:MusicGroup] ; foaf:name ...`
///
/// Further rows of the same artist add `foaf:based_near` values. An area
/// name is written at most once per artist.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArtistSchema;

#[derive(Debug, Default)]
pub struct ArtistGroup {
    areas: Vec<String>,
}

impl ArtistGroup {
    fn push_area(&mut self, area: &str, out: &mut String) {
        if self.areas.iter().any(|a| a == area) {
            return;
        }
        if self.areas.is_empty() {
            out.push_str(" ; foaf:based_near ");
        } else {
            out.push_str(" , ");
        }
        push_literal(out, area);
        self.areas.push(area.to_string());
    }
}

impl GroupedSchema for ArtistSchema {
    type Row = ArtistRow;
    type Key = String;
    type Group = ArtistGroup;

    const DATASET: &'static str = "artists";
    const KIND: StatementKind = StatementKind::Artist;

    fn key(&self, row: &ArtistRow) -> String {
        row.gid.clone()
    }

    fn open(&self, row: &ArtistRow, group: &mut ArtistGroup, out: &mut String) -> ShapeResult {
        let gid = identifier(Self::DATASET, "gid", &row.gid)?;
        let _ = write!(out, "mba:{gid} rdf:type mo:MusicArtist");
        if row.is_group() {
            out.push_str(" , mo:MusicGroup");
        }
        out.push_str(" ; foaf:name ");
        push_literal(out, text_or_empty(&row.name));
        if let Some(gender) = present_text(&row.gender) {
            out.push_str(" ; foaf:gender ");
            push_literal(out, gender);
        }
        if let Some(area) = present_text(&row.area) {
            group.push_area(area, out);
        }
        Ok(())
    }

    fn extend(&self, row: &ArtistRow, group: &mut ArtistGroup, out: &mut String) -> ShapeResult {
        if let Some(area) = present_text(&row.area) {
            group.push_area(area, out);
        }
        Ok(())
    }
}

/// `mba:{member} mo:member_of mba:{group} [, mba:{group}]*`
#[derive(Debug, Default, Clone, Copy)]
pub struct MembershipSchema;

impl GroupedSchema for MembershipSchema {
    type Row = MembershipRow;
    type Key = String;
    /// Groups already listed for the open member.
    type Group = Vec<String>;

    const DATASET: &'static str = "memberships";
    const KIND: StatementKind = StatementKind::Membership;

    fn key(&self, row: &MembershipRow) -> String {
        row.member_gid.clone()
    }

    fn open(&self, row: &MembershipRow, groups: &mut Vec<String>, out: &mut String) -> ShapeResult {
        let member = identifier(Self::DATASET, "member_gid", &row.member_gid)?;
        let group = identifier(Self::DATASET, "group_gid", &row.group_gid)?;
        let _ = write!(out, "mba:{member} mo:member_of mba:{group}");
        groups.push(group.to_string());
        Ok(())
    }

    fn extend(&self, row: &MembershipRow, groups: &mut Vec<String>, out: &mut String) -> ShapeResult {
        let group = identifier(Self::DATASET, "group_gid", &row.group_gid)?;
        if !groups.iter().any(|g| g == group) {
            let _ = write!(out, " , mba:{group}");
            groups.push(group.to_string());
        }
        Ok(())
    }
}

/// Recording, track, authorship and (for persons) solo-artist statements
/// for every discography row.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscographySchema;

impl RowSchema for DiscographySchema {
    type Row = DiscographyRow;

    const DATASET: &'static str = "discographies";

    fn statements(&self, row: &DiscographyRow, batch: &mut StatementBatch) -> ShapeResult {
        let artist = identifier(Self::DATASET, "artist_gid", &row.artist_gid)?;
        let track = identifier(Self::DATASET, "track_gid", &row.track_gid)?;
        let recording = identifier(Self::DATASET, "recording_gid", &row.recording_gid)?;

        batch.push(StatementKind::Recording, |out| {
            let _ = write!(out, "mbr:{recording} rdf:type mo:Record , mo:MusicalManifestation ; rdfs:label ");
            push_literal(out, text_or_empty(&row.recording_name));
            let _ = write!(out, " ; mo:track mbt:{track}");
        });

        batch.push(StatementKind::Track, |out| {
            let _ = write!(out, "mbt:{track} rdf:type mo:Track , mo:MusicalManifestation ; rdfs:label ");
            push_literal(out, text_or_empty(&row.track_name));
            if let Some(number) = positive(row.track_number) {
                let _ = write!(out, " ; mo:track_number {number}");
            }
            if let Some(duration) = positive(row.track_duration_ms) {
                let _ = write!(out, " ; mo:duration {duration}");
            }
        });

        batch.push(StatementKind::Authorship, |out| {
            let _ = write!(out, "mba:{artist} foaf:made mbr:{recording} , mbt:{track}");
        });

        if row.artist_kind == ArtistKind::Person {
            batch.push(StatementKind::SoloArtist, |out| {
                let _ = write!(out, "mba:{artist} rdf:type mo:SoloMusicArtist");
            });
        }
        Ok(())
    }
}
