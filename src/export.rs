//! The three export pipelines.
//!
//! Each pipeline pulls one row stream from a [`RowSource`], feeds it to an
//! emitter and writes through its own [`ChunkedSink`]:
//!
//! | dataset         | emitter  | units                         | rotation |
//! |-----------------|----------|-------------------------------|----------|
//! | artists         | grouped  | `artists.trig.gz`             | never    |
//! | memberships     | grouped  | `memberships.trig.gz`         | never    |
//! | discographies   | per row  | `NN-discographies.trig.gz`    | both counters |
//!
//! The row stream is opened before the first unit is created, so a source
//! that cannot be reached leaves no output behind.

use crate::config::{Dataset, ExportConfig};
use crate::emitter::{emit_grouped, emit_rows, EmitStats};
use crate::error::Result;
use crate::progress::ProgressReporter;
use crate::schema::{ArtistSchema, DiscographySchema, MembershipSchema};
use crate::sink::{ChunkedSink, CounterPolicy, SinkPolicy, SinkSummary, UnitNaming, UnitTarget};
use crate::source::RowSource;
use crate::vocab::{Prefix, UnitFrame, FOAF, MBA, MBR, MBT, MO, RDF, RDFS};
use std::time::{Duration, Instant};
use tracing::info;

impl Dataset {
    /// Prefixes declared at the top of every unit of this dataset.
    pub fn prefixes(self) -> &'static [Prefix] {
        match self {
            Dataset::Artists => &[RDF, FOAF, MO, MBA],
            Dataset::Memberships => &[MO, MBA],
            Dataset::Discographies => &[RDF, RDFS, FOAF, MO, MBA, MBT, MBR],
        }
    }

    pub fn naming(self, config: &ExportConfig) -> UnitNaming {
        let name = config.compression.unit_name(self.name());
        match self {
            Dataset::Discographies => UnitNaming::Numbered(name),
            Dataset::Artists | Dataset::Memberships => UnitNaming::Single(name),
        }
    }

    pub fn policy(self, config: &ExportConfig) -> SinkPolicy {
        let p = &config.progress;
        match self {
            Dataset::Artists => SinkPolicy::unbounded(p.artists),
            Dataset::Memberships => SinkPolicy::unbounded(p.memberships),
            Dataset::Discographies => SinkPolicy {
                assertions: CounterPolicy::rotating(p.assertions, config.rotation_threshold),
                authorship: CounterPolicy::rotating(p.authorship, config.authorship_rotation_threshold),
            },
        }
    }
}

/// Outcome of one pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSummary {
    pub dataset: Dataset,
    pub rows: u64,
    pub sink: SinkSummary,
    pub elapsed: Duration,
}

/// Run the pipeline for `dataset`.
///
/// # Errors
/// Any error of the source, the emitter or the sink. Units already closed
/// stay complete; the unit open at the time of the error is left without
/// its epilogue.
pub fn export_dataset<S, T, P>(
    dataset: Dataset,
    source: &mut S,
    target: T,
    config: &ExportConfig,
    progress: P,
) -> Result<DatasetSummary>
where
    S: RowSource + ?Sized,
    T: UnitTarget,
    P: ProgressReporter,
{
    let started = Instant::now();
    info!(dataset = %dataset, "[BEGIN] exporting {dataset}");
    let frame = UnitFrame::new(dataset.prefixes(), &config.graph_iri);
    let naming = dataset.naming(config);
    let policy = dataset.policy(config);

    let (stats, sink): (EmitStats, SinkSummary) = match dataset {
        Dataset::Artists => {
            let rows = source.artists()?;
            let mut sink = ChunkedSink::open(target, frame, naming, policy, progress)?;
            let stats = emit_grouped(ArtistSchema, rows, &mut sink, config.check_key_order)?;
            (stats, sink.close()?)
        }
        Dataset::Memberships => {
            let rows = source.memberships()?;
            let mut sink = ChunkedSink::open(target, frame, naming, policy, progress)?;
            let stats = emit_grouped(MembershipSchema, rows, &mut sink, config.check_key_order)?;
            (stats, sink.close()?)
        }
        Dataset::Discographies => {
            let rows = source.discographies()?;
            let mut sink = ChunkedSink::open(target, frame, naming, policy, progress)?;
            let stats = emit_rows(DiscographySchema, rows, &mut sink)?;
            (stats, sink.close()?)
        }
    };

    let elapsed = started.elapsed();
    info!(
        dataset = %dataset,
        rows = stats.rows,
        statements = sink.statements(),
        units = sink.units.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "[FINAL] exported {dataset}"
    );
    Ok(DatasetSummary {
        dataset,
        rows: stats.rows,
        sink,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::VecSource;
    use crate::testing::{
        assert_unit_framed, assert_unit_truncated, discography_rows, sample_artist_rows,
        sample_membership_rows, MemoryTarget, RecordingProgress,
    };
    use crate::row::ArtistRow;

    fn config() -> ExportConfig {
        ExportConfig {
            input_dir: Some("unused".into()),
            ..ExportConfig::default()
        }
    }

    #[test]
    fn artists_end_to_end() -> Result<()> {
        let target = MemoryTarget::new();
        let mut source = VecSource::new().with_artists(sample_artist_rows());
        let summary = export_dataset(
            Dataset::Artists,
            &mut source,
            target.clone(),
            &config(),
            RecordingProgress::default(),
        )?;
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.sink.unit_names(), vec!["artists.trig.gz"]);

        let units = target.units();
        let text = units[0].text();
        let frame = UnitFrame::new(Dataset::Artists.prefixes(), &config().graph_iri);
        assert_unit_framed(&text, &frame);
        assert!(text.contains(
            "mba:A1 rdf:type mo:MusicArtist , mo:MusicGroup ; foaf:name \"Daft Punk\" \
             ; foaf:based_near \"France\" , \"Belgium\" .\n"
        ));
        assert!(text.contains(
            "mba:A2 rdf:type mo:MusicArtist ; foaf:name \"Beyoncé\" ; foaf:gender \"female\" \
             ; foaf:based_near \"USA\" .\n"
        ));
        Ok(())
    }

    #[test]
    fn zero_rows_give_one_empty_unit() -> Result<()> {
        for dataset in [Dataset::Artists, Dataset::Memberships] {
            let target = MemoryTarget::new();
            export_dataset(
                dataset,
                &mut VecSource::new(),
                target.clone(),
                &config(),
                RecordingProgress::default(),
            )?;
            let units = target.units();
            assert_eq!(units.len(), 1);
            let frame = UnitFrame::new(dataset.prefixes(), &config().graph_iri);
            assert_eq!(units[0].text(), format!("{}{}", frame.prologue(), frame.epilogue()));
        }
        Ok(())
    }

    #[test]
    fn memberships_report_progress_on_their_interval() -> Result<()> {
        let progress = RecordingProgress::default();
        let mut cfg = config();
        cfg.progress.memberships = 2;
        let mut source = VecSource::new().with_memberships(sample_membership_rows());
        let summary = export_dataset(
            Dataset::Memberships,
            &mut source,
            MemoryTarget::new(),
            &cfg,
            progress.clone(),
        )?;
        assert_eq!(summary.sink.statements(), 3);
        let counts: Vec<u64> = progress.reports().iter().map(|r| r.count).collect();
        assert_eq!(counts, vec![2]);
        Ok(())
    }

    #[test]
    fn discographies_rotate_on_each_counter() -> Result<()> {
        let target = MemoryTarget::new();
        let mut cfg = config();
        cfg.compression = crate::config::Compression::None;
        cfg.rotation_threshold = 10;
        cfg.authorship_rotation_threshold = 4;
        // 10 rows: 5 persons (3 assertions each) and 5 others (2 each) give
        // 25 assertions; 10 authorship statements.
        let mut source = VecSource::new().with_discographies(discography_rows(10));
        let summary = export_dataset(
            Dataset::Discographies,
            &mut source,
            target.clone(),
            &cfg,
            RecordingProgress::default(),
        )?;
        assert_eq!(summary.sink.assertions, 25);
        assert_eq!(summary.sink.authorship, 10);
        // rotations at assertions 10, 20 and authorship 4, 8
        assert_eq!(summary.sink.units.len(), 5);
        assert_eq!(summary.sink.units[0].name, "00-discographies.trig");
        assert_eq!(
            summary.sink.units.iter().map(|u| u.statements).sum::<u64>(),
            35
        );

        let frame = UnitFrame::new(Dataset::Discographies.prefixes(), &cfg.graph_iri);
        for unit in target.units() {
            assert!(unit.finished);
            assert_unit_framed(&unit.text(), &frame);
        }
        Ok(())
    }

    #[test]
    fn out_of_order_rows_leave_the_unit_truncated() {
        let target = MemoryTarget::new();
        let mut source = VecSource::new().with_artists(vec![
            ArtistRow::new("b", "B"),
            ArtistRow::new("a", "A"),
        ]);
        let err = export_dataset(
            Dataset::Artists,
            &mut source,
            target.clone(),
            &config(),
            RecordingProgress::default(),
        )
        .err();
        assert_eq!(err.map(|e| e.class()), Some("data_shape"));
        let frame = UnitFrame::new(Dataset::Artists.prefixes(), &config().graph_iri);
        assert_unit_truncated(&target.units()[0].text(), &frame);
    }

    #[test]
    fn unit_creation_failure_is_a_sink_error() {
        let err = export_dataset(
            Dataset::Memberships,
            &mut VecSource::new(),
            MemoryTarget::failing_from(0),
            &config(),
            RecordingProgress::default(),
        )
        .err();
        assert_eq!(err.map(|e| e.class()), Some("sink"));
    }

    #[test]
    fn failed_rotation_keeps_the_closed_unit_complete() {
        let target = MemoryTarget::failing_from(1);
        let mut cfg = config();
        cfg.compression = crate::config::Compression::None;
        cfg.rotation_threshold = 3;
        // the first row is a person: its third assertion triggers rotation
        let mut source = VecSource::new().with_discographies(discography_rows(4));
        let err = export_dataset(
            Dataset::Discographies,
            &mut source,
            target.clone(),
            &cfg,
            RecordingProgress::default(),
        )
        .err();
        assert_eq!(err.map(|e| e.class()), Some("sink"));

        let units = target.units();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].name, "00-discographies.trig");
        assert!(units[0].finished);
        assert!(units[0].text().ends_with("}\n"));
        assert!(units.iter().all(|u| !u.name.starts_with("01-")));
        let frame = UnitFrame::new(Dataset::Discographies.prefixes(), &cfg.graph_iri);
        assert_unit_framed(&units[0].text(), &frame);
    }
}
