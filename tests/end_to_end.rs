mod common;

use anyhow::Result;
use common::*;
use trig_export::config::{Compression, Dataset, ExportConfig};
use trig_export::source::{InputFormat, VecSource};
use trig_export::testing::{
    discography_rows, sample_artist_rows, sample_membership_rows, write_dumps,
};
use trig_export::{export_dataset, FileTarget, NoProgress, Runner};

fn full_source() -> VecSource {
    VecSource::new()
        .with_artists(sample_artist_rows())
        .with_memberships(sample_membership_rows())
        .with_discographies(discography_rows(20))
}

#[test]
fn artists_parse_into_the_expected_quads() -> Result<()> {
    let out = tempfile::tempdir()?;
    let config = ExportConfig {
        input_dir: Some("unused".into()),
        output_dir: out.path().to_path_buf(),
        ..ExportConfig::default()
    };
    let mut source = VecSource::new().with_artists(sample_artist_rows());
    export_dataset(
        Dataset::Artists,
        &mut source,
        FileTarget::new(out.path()),
        &config,
        NoProgress,
    )?;

    let quads = parse_trig(&read_unit(out.path().join("artists.trig.gz"))?)?;
    assert!(quads.iter().all(|q| q.graph.as_deref() == Some(GRAPH)));

    let a1 = format!("{MBA}A1");
    let a2 = format!("{MBA}A2");
    let based_near = format!("{FOAF}based_near");
    assert_eq!(objects(&quads, &a1, &based_near), vec![&text("France"), &text("Belgium")]);
    assert_eq!(
        objects(&quads, &a1, RDF_TYPE),
        vec![&iri(&format!("{MO}MusicArtist")), &iri(&format!("{MO}MusicGroup"))]
    );
    assert!(objects(&quads, &a1, &format!("{FOAF}gender")).is_empty());
    assert_eq!(objects(&quads, &a2, &format!("{FOAF}gender")), vec![&text("female")]);
    assert_eq!(objects(&quads, &a2, &format!("{FOAF}name")), vec![&text("Beyoncé")]);
    assert_eq!(objects(&quads, &a2, RDF_TYPE).len(), 1);
    Ok(())
}

fn run_from_dumps(format: InputFormat, suffix: &str, compression: Compression) -> Result<tempfile::TempDir> {
    let dumps = write_dumps(&full_source(), format, suffix)?;
    let out = tempfile::tempdir()?;
    let config = ExportConfig {
        input_dir: Some(dumps.path().to_path_buf()),
        input_format: format,
        output_dir: out.path().to_path_buf(),
        compression,
        rotation_threshold: 25,
        ..ExportConfig::default()
    };
    let report = Runner::new(config)?.run()?;
    assert!(report.is_success(), "failures: {:?}", report.failed);
    assert_eq!(report.completed.len(), 3);
    Ok(out)
}

#[test]
fn csv_dumps_to_gzip_units() -> Result<()> {
    let out = run_from_dumps(InputFormat::Csv, ".gz", Compression::Gzip)?;
    let mut names: Vec<String> = std::fs::read_dir(out.path())?
        .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<_>>()?;
    names.sort();
    // 20 rows: 10 persons and 10 others give 50 assertions, rotating at 25 and 50
    assert_eq!(
        names,
        vec![
            "00-discographies.trig.gz",
            "01-discographies.trig.gz",
            "02-discographies.trig.gz",
            "artists.trig.gz",
            "memberships.trig.gz",
        ]
    );

    let mut made = 0;
    for name in &names {
        let quads = parse_trig(&read_unit(out.path().join(name))?)?;
        made += quads
            .iter()
            .filter(|q| q.predicate == format!("{FOAF}made"))
            .count();
    }
    // one foaf:made statement per row with two objects
    assert_eq!(made, 40);
    Ok(())
}

#[test]
fn jsonl_dumps_to_plain_units() -> Result<()> {
    let out = run_from_dumps(InputFormat::Jsonl, "", Compression::None)?;
    let text = std::fs::read_to_string(out.path().join("memberships.trig"))?;
    assert!(text.contains("mba:m1 mo:member_of mba:g1 , mba:g2 .\n"));
    let quads = parse_trig(&text)?;
    assert_eq!(quads.len(), 4);
    Ok(())
}

#[test]
fn missing_dump_fails_without_output() -> Result<()> {
    let dumps = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    let config = ExportConfig {
        input_dir: Some(dumps.path().to_path_buf()),
        output_dir: out.path().to_path_buf(),
        continue_on_error: true,
        ..ExportConfig::default()
    };
    let report = Runner::new(config)?.run()?;
    assert_eq!(report.failed.len(), 3);
    assert!(report.failed.iter().all(|f| f.error.class() == "connectivity"));
    assert_eq!(std::fs::read_dir(out.path())?.count(), 0);
    Ok(())
}
