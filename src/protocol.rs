#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The result log written by instrumented test programs.
//!
//! ```text
//! CHECK 0
//! TEST "x == 3"
//! RESULT 0
//! LHS 2
//! RHS 3
//! MSG "x was off by one"
//!
//! SCORE 0
//! ```
//!
//! `CHECK` opens a record, the five following fields complete it. `SCORE`
//! is written once, at exit, and may be missing if the program crashed.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use tracing::warn;

use crate::error::ConfigError;

peg::parser! {
    /// grammars for the lines of a result log.
    pub grammar log_line() for str {
        /// matches spaces and tabs
        rule blank() = quiet!{[' ' | '\t']+}

        /// matches a field name
        rule key() -> &'input str
            = $(['A'..='Z' | 'a'..='z' | '_']+)

        /// parses a line into its field name and (untrimmed) value
        pub rule line() -> (&'input str, &'input str)
            = k:key() v:(blank() v:$([_]*) { v })? { (k, v.unwrap_or("")) }

        /// parses a check identifier
        pub rule identifier() -> usize
            = n:$(['0'..='9']+) {? n.parse().or(Err("usize")) }

        /// parses a `RESULT` value
        pub rule outcome() -> bool
            = "1" { true } / "0" { false }

        /// parses a `SCORE` value
        pub rule score() -> f64
            = n:$("-"? ['0'..='9']+ ("." ['0'..='9']*)? (['e' | 'E'] ['+' | '-']? ['0'..='9']+)?)
            {? n.parse().or(Err("f64")) }
    }
}

/// Encodes `text` as a double-quoted literal, the same way the generated
/// program's `_checkgrade_literal` does.
pub fn encode_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_ascii_control() => out.push_str(&format!("\\u{{{:x}}}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Decodes a literal produced by [`encode_literal`] (or by the generated
/// program).
pub fn decode_literal(literal: &str) -> Result<String, snailquote::UnescapeError> {
    snailquote::unescape(literal)
}

/// Renders `text` as a C++ string literal that can be pasted into source code.
pub fn cpp_string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '?' => out.push_str("\\?"),
            c if c.is_ascii_control() => out.push_str(&format!("\\{:03o}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// One complete record from the log.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Line of the `CHECK` field, 1-based.
    pub line:     usize,
    /// Identifier of the check this evaluation belongs to.
    pub check_id: usize,
    /// Decoded check text as the program knew it.
    pub text:     String,
    /// Whether the check held.
    pub passed:   bool,
    /// Rendered left value, verbatim.
    pub lhs:      String,
    /// Rendered right value, verbatim.
    pub rhs:      String,
    /// Decoded failure message.
    pub message:  String,
}

/// Everything recovered from one result log, in the order it was written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultLog {
    /// Complete records.
    pub entries:         Vec<LogEntry>,
    /// The `SCORE` line, if the program got that far.
    pub score:           Option<f64>,
    /// Records that were opened but never completed.
    pub dropped_records: usize,
}

/// A record whose fields are still being read.
#[derive(Debug, Default)]
struct Pending {
    /// Line of the `CHECK` field.
    line:     usize,
    /// Identifier from the `CHECK` field.
    check_id: usize,
    /// `TEST` field.
    text:     Option<String>,
    /// `RESULT` field.
    passed:   Option<bool>,
    /// `LHS` field.
    lhs:      Option<String>,
    /// `RHS` field.
    rhs:      Option<String>,
    /// `MSG` field.
    message:  Option<String>,
}

impl Pending {
    /// Turns the pending record into an entry if every field was seen.
    fn complete(self) -> Option<LogEntry> {
        Some(LogEntry {
            line:     self.line,
            check_id: self.check_id,
            text:     self.text?,
            passed:   self.passed?,
            lhs:      self.lhs?,
            rhs:      self.rhs?,
            message:  self.message?,
        })
    }
}

/// Sets `slot` once; a second value for the same record is a protocol error.
fn fill<T>(slot: &mut Option<T>, value: T, key: &str) -> Result<(), String> {
    if slot.is_some() {
        return Err(format!("duplicate `{key}` field in one record"));
    }
    *slot = Some(value);
    Ok(())
}

impl ResultLog {
    /// Parses the text of a result log.
    ///
    /// * `text`: log contents; a final line without a newline is ignored since
    ///   the program may have died while writing it
    /// * `source`: name used in error messages
    pub fn parse(text: &str, source: &str) -> Result<Self, ConfigError> {
        let complete = match text.rfind('\n') {
            Some(end) => &text[..=end],
            None => "",
        };

        let mut log = ResultLog::default();
        let mut pending: Option<Pending> = None;

        for (idx, raw_line) in complete.lines().enumerate() {
            let line_no = idx + 1;
            let protocol_error = |reason: String| ConfigError::Protocol {
                path:   source.to_string(),
                line:   line_no,
                reason,
            };

            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            let (key, value) = log_line::line(line)
                .map_err(|e| protocol_error(format!("cannot parse `{line}`: {e}")))?;
            let value = value.trim();

            match key {
                "CHECK" => {
                    log.commit(pending.take(), source);
                    let check_id = log_line::identifier(value)
                        .map_err(|_| protocol_error(format!("bad check id `{value}`")))?;
                    pending = Some(Pending {
                        line: line_no,
                        check_id,
                        ..Pending::default()
                    });
                }
                "SCORE" => {
                    log.commit(pending.take(), source);
                    log.score = Some(
                        log_line::score(value)
                            .map_err(|_| protocol_error(format!("bad score `{value}`")))?,
                    );
                }
                "TEST" | "RESULT" | "LHS" | "RHS" | "MSG" => {
                    let record = pending.as_mut().ok_or_else(|| {
                        protocol_error(format!("`{key}` appears before any `CHECK`"))
                    })?;
                    match key {
                        "TEST" => {
                            let text = decode_literal(value)
                                .map_err(|e| protocol_error(format!("bad TEST literal: {e}")))?;
                            fill(&mut record.text, text, key)
                        }
                        "RESULT" => {
                            let passed = log_line::outcome(value)
                                .map_err(|_| protocol_error(format!("bad result `{value}`")))?;
                            fill(&mut record.passed, passed, key)
                        }
                        "LHS" => fill(&mut record.lhs, value.to_string(), key),
                        "RHS" => fill(&mut record.rhs, value.to_string(), key),
                        _ => {
                            let message = decode_literal(value)
                                .map_err(|e| protocol_error(format!("bad MSG literal: {e}")))?;
                            fill(&mut record.message, message, key)
                        }
                    }
                    .map_err(protocol_error)?;
                }
                other => return Err(protocol_error(format!("unknown field `{other}`"))),
            }
        }

        log.commit(pending, source);
        Ok(log)
    }

    /// Reads and parses the result log at `path`. A missing file is an empty
    /// log: the program never got to write anything.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let bytes = fs::read(path)
            .with_context(|| format!("Could not read result log {}", path.display()))?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(Self::parse(&text, &path.display().to_string())?)
    }

    /// Moves a finished record into the log, or counts it as dropped.
    fn commit(&mut self, pending: Option<Pending>, source: &str) {
        let Some(pending) = pending else {
            return;
        };
        let line = pending.line;
        match pending.complete() {
            Some(entry) => self.entries.push(entry),
            None => {
                warn!("{source}: dropping incomplete record opened on line {line}");
                self.dropped_records += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpp_literals_escape_quotes_and_control_bytes() {
        assert_eq!(cpp_string_literal("a\"b\\c\n\u{1}"), r#""a\"b\\c\n\001""#);
        assert_eq!(cpp_string_literal("??="), r#""\?\?=""#);
    }

    #[test]
    fn nul_is_encoded_as_a_unicode_escape() {
        assert_eq!(encode_literal("a\0b"), r#""a\u{0}b""#);
    }

    #[test]
    fn grammar_splits_key_and_value() {
        assert_eq!(log_line::line("LHS   \"a b\"").unwrap(), ("LHS", "\"a b\""));
        assert_eq!(log_line::line("RHS").unwrap(), ("RHS", ""));
        assert!(log_line::outcome("2").is_err());
        assert_eq!(log_line::score("2.5").unwrap(), 2.5);
    }
}
