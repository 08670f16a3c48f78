#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::time::Duration;

use serde::Serialize;
use similar::{Algorithm, ChangeTag, TextDiff};

/// Above this many characters on either side the diff is taken line by line.
pub const CHAR_DIFF_LIMIT: usize = 4_000;

/// After this long the diff gives up on a minimal edit script and
/// approximates.
const DIFF_TIMEOUT: Duration = Duration::from_millis(500);

/// What a span of a diff represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpanKind {
    /// Present in the expected output only.
    Added,
    /// Present in the actual output only.
    Deleted,
    /// Present in both.
    Common,
}

/// A run of characters sharing one [`SpanKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffSpan {
    /// What the text represents.
    pub kind: SpanKind,
    /// The raw text.
    pub text: String,
}

/// Diffs the actual output against the expected output and merges
/// neighbouring changes of the same kind.
///
/// Outputs up to [`CHAR_DIFF_LIMIT`] characters are compared character by
/// character, longer ones line by line.
pub fn diff_spans(actual: &str, expected: &str) -> Vec<DiffSpan> {
    let mut config = TextDiff::configure();
    config.algorithm(Algorithm::Myers).timeout(DIFF_TIMEOUT);
    let diff = if actual.len().max(expected.len()) <= CHAR_DIFF_LIMIT {
        config.diff_chars(actual, expected)
    } else {
        config.diff_lines(actual, expected)
    };

    let mut spans: Vec<DiffSpan> = Vec::new();
    for change in diff.iter_all_changes() {
        let kind = match change.tag() {
            ChangeTag::Insert => SpanKind::Added,
            ChangeTag::Delete => SpanKind::Deleted,
            ChangeTag::Equal => SpanKind::Common,
        };
        match spans.last_mut() {
            Some(last) if last.kind == kind => last.text.push_str(change.value()),
            _ => spans.push(DiffSpan {
                kind,
                text: change.value().to_string(),
            }),
        }
    }
    spans
}

/// Makes control characters visible. NUL becomes `[NULL]`; newlines and tabs
/// are kept.
pub fn escape_control(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\0' => out.push_str("[NULL]"),
            '\n' | '\t' => out.push(c),
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbouring_changes_merge() {
        let spans = diff_spans("cat\n", "cart\n");
        assert_eq!(
            spans,
            vec![
                DiffSpan {
                    kind: SpanKind::Common,
                    text: "ca".into(),
                },
                DiffSpan {
                    kind: SpanKind::Added,
                    text: "r".into(),
                },
                DiffSpan {
                    kind: SpanKind::Common,
                    text: "t\n".into(),
                },
            ]
        );
    }

    #[test]
    fn control_characters_are_visible() {
        assert_eq!(escape_control("a\0b\u{7}\n"), "a[NULL]b\\x07\n");
    }
}
