//! Assertion functions for checking the framing of output units.

use crate::emitter::TERMINATOR;
use crate::vocab::UnitFrame;

/// Number of statement terminators in `text`.
///
/// Literals never contain a raw newline, so every `" .\n"` closes a
/// statement.
///
/// ```
/// use trig_export::testing::count_statements;
///
/// assert_eq!(count_statements("mba:a foaf:name \"x\" .\nmba:b foaf:name \"y\" .\n"), 2);
/// assert_eq!(count_statements(""), 0);
/// ```
#[must_use]
pub fn count_statements(text: &str) -> usize {
    text.matches(TERMINATOR).count()
}

/// Assert that `text` is a complete unit: prologue, whole statements, epilogue.
///
/// # Panics
///
/// Panics if the prologue or epilogue is missing, or if the body ends in the
/// middle of a statement.
pub fn assert_unit_framed(text: &str, frame: &UnitFrame) {
    let prologue = frame.prologue();
    let epilogue = frame.epilogue();
    assert!(
        text.starts_with(prologue),
        "Unit does not start with the prologue:\n  Expected prefix: {prologue:?}\n  Actual: {text:?}"
    );
    assert!(
        text.ends_with(epilogue),
        "Unit does not end with the epilogue:\n  Expected suffix: {epilogue:?}\n  Actual: {text:?}"
    );
    assert!(
        text.len() >= prologue.len() + epilogue.len(),
        "Unit shorter than its frame: {text:?}"
    );
    let body = &text[prologue.len()..text.len() - epilogue.len()];
    assert!(
        body.is_empty() || body.ends_with(TERMINATOR),
        "Unit body ends inside a statement:\n  Body tail: {:?}",
        &body[body.len().saturating_sub(80)..]
    );
}

/// Assert that `text` starts like a unit but was never closed.
///
/// # Panics
///
/// Panics if the prologue is missing or the epilogue is present.
pub fn assert_unit_truncated(text: &str, frame: &UnitFrame) {
    assert!(
        text.starts_with(frame.prologue()),
        "Unit does not start with the prologue: {text:?}"
    );
    assert!(
        !text.ends_with(frame.epilogue()),
        "Unit was expected to be truncated but ends with the epilogue: {text:?}"
    );
}
