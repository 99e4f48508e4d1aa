//! The streaming statement emitters.
//!
//! Two modes share the same [`StatementSink`]:
//!
//! - [`GroupedEmitter`] coalesces consecutive rows with the same grouping
//!   key into one statement. The first row of a group writes the subject and
//!   its fixed predicates, later rows only append predicate-object
//!   fragments. The terminator is written when the key changes and at the
//!   end of the stream.
//! - [`RowEmitter`] writes several independent statements for every row.
//!
//! Neither buffers more than the fragments of the current row.
//!
//! # Ordering
//!
//! Grouping is only correct when all rows of one key are contiguous. With
//! the order check enabled (the default), a key that sorts before the
//! current one fails with [`DataShapeError::OutOfOrderKey`] instead of
//! opening a second statement for an entity that was already written.

use crate::error::{DataShapeError, Result};
use crate::sink::{StatementKind, StatementSink};
use std::fmt::Debug;

/// Written after the last predicate-object pair of every statement.
pub const TERMINATOR: &str = " .\n";

/// Per-dataset hooks for the coalescing emitter.
pub trait GroupedSchema {
    type Row;
    type Key: PartialOrd + Debug;
    /// State of the open statement, reset for every new key.
    type Group: Default;

    /// Dataset name, used in error messages.
    const DATASET: &'static str;
    /// Kind reported to the sink when a statement is closed.
    const KIND: StatementKind;

    fn key(&self, row: &Self::Row) -> Self::Key;

    /// Write the subject and fixed predicates for the first row of a group.
    fn open(
        &self,
        row: &Self::Row,
        group: &mut Self::Group,
        out: &mut String,
    ) -> std::result::Result<(), DataShapeError>;

    /// Write the fragment contributed by a further row of the open group.
    /// Writing nothing is allowed.
    fn extend(
        &self,
        row: &Self::Row,
        group: &mut Self::Group,
        out: &mut String,
    ) -> std::result::Result<(), DataShapeError>;
}

/// Counts returned by the emitters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitStats {
    pub rows: u64,
    pub statements: u64,
}

enum Step {
    Open,
    CloseAndOpen,
    Extend,
}

/// Cross-row coalescing emitter.
pub struct GroupedEmitter<S: GroupedSchema> {
    schema: S,
    current: Option<S::Key>,
    group: S::Group,
    buf: String,
    check_order: bool,
    stats: EmitStats,
}

impl<S: GroupedSchema> GroupedEmitter<S> {
    pub fn new(schema: S) -> Self {
        Self {
            schema,
            current: None,
            group: S::Group::default(),
            buf: String::with_capacity(256),
            check_order: true,
            stats: EmitStats::default(),
        }
    }

    /// Enable or disable the ascending-key check.
    #[must_use]
    pub fn check_order(mut self, enabled: bool) -> Self {
        self.check_order = enabled;
        self
    }

    pub fn stats(&self) -> EmitStats {
        self.stats
    }

    /// Feed one row.
    pub fn push<K: StatementSink + ?Sized>(&mut self, row: &S::Row, sink: &mut K) -> Result<()> {
        let key = self.schema.key(row);
        let step = match &self.current {
            None => Step::Open,
            Some(current) if *current == key => Step::Extend,
            Some(current) => {
                if self.check_order && key < *current {
                    return Err(DataShapeError::OutOfOrderKey {
                        dataset: S::DATASET,
                        previous: format!("{current:?}"),
                        key: format!("{key:?}"),
                    }
                    .into());
                }
                Step::CloseAndOpen
            }
        };

        self.buf.clear();
        match step {
            Step::Extend => {
                self.schema.extend(row, &mut self.group, &mut self.buf)?;
                if !self.buf.is_empty() {
                    sink.write(&self.buf)?;
                }
            }
            Step::Open | Step::CloseAndOpen => {
                let mut group = S::Group::default();
                // Validate the new group before the previous statement is closed
                self.schema.open(row, &mut group, &mut self.buf)?;
                if let Step::CloseAndOpen = step {
                    self.close_statement(sink)?;
                }
                sink.write(&self.buf)?;
                self.group = group;
                self.current = Some(key);
            }
        }
        self.stats.rows += 1;
        Ok(())
    }

    fn close_statement<K: StatementSink + ?Sized>(&mut self, sink: &mut K) -> Result<()> {
        sink.write(TERMINATOR)?;
        self.stats.statements += 1;
        sink.statement_closed(S::KIND)
    }

    /// Close the last statement, if any row was seen.
    pub fn finish<K: StatementSink + ?Sized>(mut self, sink: &mut K) -> Result<EmitStats> {
        if self.current.take().is_some() {
            self.close_statement(sink)?;
        }
        Ok(self.stats)
    }
}

/// A buffer of complete statements produced for one row.
#[derive(Debug, Default)]
pub struct StatementBatch {
    text: String,
    ends: Vec<(StatementKind, usize)>,
}

impl StatementBatch {
    fn clear(&mut self) {
        self.text.clear();
        self.ends.clear();
    }

    /// Add a statement: `body` writes subject and predicates, the terminator
    /// is appended here.
    pub fn push(&mut self, kind: StatementKind, body: impl FnOnce(&mut String)) {
        body(&mut self.text);
        self.text.push_str(TERMINATOR);
        self.ends.push((kind, self.text.len()));
    }

    pub fn len(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    fn statements(&self) -> impl Iterator<Item = (StatementKind, &str)> {
        let mut start = 0;
        self.ends.iter().map(move |&(kind, end)| {
            let text = &self.text[start..end];
            start = end;
            (kind, text)
        })
    }
}

/// Per-dataset hook for the per-row emitter.
pub trait RowSchema {
    type Row;

    const DATASET: &'static str;

    /// Validate `row` and add its statements to `batch`. Nothing reaches the
    /// sink when this fails.
    fn statements(
        &self,
        row: &Self::Row,
        batch: &mut StatementBatch,
    ) -> std::result::Result<(), DataShapeError>;
}

/// Per-row multi-statement emitter.
pub struct RowEmitter<S: RowSchema> {
    schema: S,
    batch: StatementBatch,
    stats: EmitStats,
}

impl<S: RowSchema> RowEmitter<S> {
    pub fn new(schema: S) -> Self {
        Self {
            schema,
            batch: StatementBatch::default(),
            stats: EmitStats::default(),
        }
    }

    pub fn stats(&self) -> EmitStats {
        self.stats
    }

    /// Feed one row; each of its statements is followed by a safe point.
    pub fn push<K: StatementSink + ?Sized>(&mut self, row: &S::Row, sink: &mut K) -> Result<()> {
        self.batch.clear();
        self.schema.statements(row, &mut self.batch)?;
        for (kind, text) in self.batch.statements() {
            sink.write(text)?;
            self.stats.statements += 1;
            sink.statement_closed(kind)?;
        }
        self.stats.rows += 1;
        Ok(())
    }

    pub fn finish(self) -> EmitStats {
        self.stats
    }
}

/// Drive a [`GroupedEmitter`] over a row stream.
pub fn emit_grouped<S, I, K>(schema: S, rows: I, sink: &mut K, check_order: bool) -> Result<EmitStats>
where
    S: GroupedSchema,
    I: IntoIterator<Item = Result<S::Row>>,
    K: StatementSink + ?Sized,
{
    let mut emitter = GroupedEmitter::new(schema).check_order(check_order);
    for row in rows {
        emitter.push(&row?, sink)?;
    }
    emitter.finish(sink)
}

/// Drive a [`RowEmitter`] over a row stream.
pub fn emit_rows<S, I, K>(schema: S, rows: I, sink: &mut K) -> Result<EmitStats>
where
    S: RowSchema,
    I: IntoIterator<Item = Result<S::Row>>,
    K: StatementSink + ?Sized,
{
    let mut emitter = RowEmitter::new(schema);
    for row in rows {
        emitter.push(&row?, sink)?;
    }
    Ok(emitter.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingSink;

    /// `(key, value)` rows; the value list of a key is comma-joined.
    struct Pairs;

    impl GroupedSchema for Pairs {
        type Row = (u32, &'static str);
        type Key = u32;
        type Group = ();

        const DATASET: &'static str = "pairs";
        const KIND: StatementKind = StatementKind::Membership;

        fn key(&self, row: &Self::Row) -> u32 {
            row.0
        }

        fn open(&self, row: &Self::Row, _: &mut (), out: &mut String) -> std::result::Result<(), DataShapeError> {
            out.push_str(&format!("k{} v {}", row.0, row.1));
            Ok(())
        }

        fn extend(&self, row: &Self::Row, _: &mut (), out: &mut String) -> std::result::Result<(), DataShapeError> {
            out.push_str(&format!(" , {}", row.1));
            Ok(())
        }
    }

    fn rows(data: &[(u32, &'static str)]) -> Vec<Result<(u32, &'static str)>> {
        data.iter().copied().map(Ok).collect()
    }

    #[test]
    fn one_terminator_per_contiguous_key() -> Result<()> {
        let mut sink = RecordingSink::default();
        let stats = emit_grouped(
            Pairs,
            rows(&[(1, "a"), (1, "b"), (2, "c"), (3, "d"), (3, "e"), (3, "f")]),
            &mut sink,
            true,
        )?;
        assert_eq!(stats, EmitStats { rows: 6, statements: 3 });
        assert_eq!(sink.text(), "k1 v a , b .\nk2 v c .\nk3 v d , e , f .\n");
        assert_eq!(sink.boundaries().len(), 3);
        Ok(())
    }

    #[test]
    fn no_rows_no_statement() -> Result<()> {
        let mut sink = RecordingSink::default();
        let stats = emit_grouped(Pairs, rows(&[]), &mut sink, true)?;
        assert_eq!(stats, EmitStats::default());
        assert_eq!(sink.text(), "");
        assert!(sink.boundaries().is_empty());
        Ok(())
    }

    #[test]
    fn out_of_order_key_is_rejected() {
        let mut sink = RecordingSink::default();
        let err = emit_grouped(Pairs, rows(&[(2, "a"), (1, "b")]), &mut sink, true).unwrap_err();
        assert!(err.to_string().contains("rows must be ordered by key"));
        // The first statement was never terminated
        assert_eq!(sink.text(), "k2 v a");
    }

    #[test]
    fn order_check_can_be_disabled() -> Result<()> {
        let mut sink = RecordingSink::default();
        let stats = emit_grouped(Pairs, rows(&[(2, "a"), (1, "b")]), &mut sink, false)?;
        assert_eq!(stats.statements, 2);
        Ok(())
    }

    #[test]
    fn boundaries_fall_after_terminators() -> Result<()> {
        let mut sink = RecordingSink::default();
        emit_grouped(Pairs, rows(&[(1, "a"), (2, "b"), (2, "c")]), &mut sink, true)?;
        let text = sink.text();
        for offset in sink.boundaries().iter().map(|b| b.offset) {
            assert!(text[..offset].ends_with(TERMINATOR));
        }
        Ok(())
    }

    struct Doubler;

    impl RowSchema for Doubler {
        type Row = u32;
        const DATASET: &'static str = "doubler";

        fn statements(&self, row: &u32, batch: &mut StatementBatch) -> std::result::Result<(), DataShapeError> {
            batch.push(StatementKind::Recording, |out| out.push_str(&format!("r{row}")));
            if row % 2 == 0 {
                batch.push(StatementKind::Authorship, |out| out.push_str(&format!("a{row}")));
            }
            Ok(())
        }
    }

    #[test]
    fn per_row_mode_closes_every_statement() -> Result<()> {
        let mut sink = RecordingSink::default();
        let stats = emit_rows(Doubler, vec![Ok(1), Ok(2)], &mut sink)?;
        assert_eq!(stats, EmitStats { rows: 2, statements: 3 });
        assert_eq!(sink.text(), "r1 .\nr2 .\na2 .\n");
        let kinds: Vec<StatementKind> = sink.boundaries().iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![StatementKind::Recording, StatementKind::Recording, StatementKind::Authorship]
        );
        Ok(())
    }
}
