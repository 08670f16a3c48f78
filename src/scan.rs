#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Quote- and bracket-aware scanning of C++ fragments.
//!
//! Check bodies and testcase code are never compiled by us, only sliced. The
//! tokenizer here is just precise enough to know when a comma, a comparator or
//! a closing parenthesis is real, and when it sits inside a literal or a
//! comment.

use std::ops::Range;

use crate::error::ConfigError;

/// Multi-character operators are listed first so the longest one wins.
const OPERATORS: [&str; 11] = ["==", "!=", "<=", ">=", "&&", "||", "->", "<<", ">>", "<", ">"];

/// Kinds of tokens produced by [`tokenize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `"..."`, escapes included.
    StringLit,
    /// `'...'`, escapes included.
    CharLit,
    /// `// ...` up to (not including) the newline, or `/* ... */`.
    Comment,
    /// `(`, `[` or `{`.
    Open,
    /// `)`, `]` or `}`.
    Close,
    /// `,`
    Comma,
    /// One of the operators we care about, see [`OPERATORS`].
    Operator,
    /// Anything else, merged into runs.
    Text,
}

/// A slice of the scanned source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// What was found.
    pub kind:  TokenKind,
    /// Byte range within the scanned source.
    pub span:  Range<usize>,
    /// Bracket nesting depth where the token starts. An opening bracket and
    /// its matching closing bracket share the same depth.
    pub depth: usize,
}

impl Token {
    /// Returns the source text covered by this token.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.clone()]
    }
}

/// Length in bytes of a quoted literal starting at the beginning of `rest`.
/// Unterminated literals run to the end of the line.
fn literal_len(rest: &str, quote: char) -> usize {
    let mut escaped = false;
    for (idx, c) in rest.char_indices().skip(1) {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return idx + 1;
        } else if c == '\n' {
            return idx;
        }
    }
    rest.len()
}

/// Splits `source` into tokens. Never fails: malformed input simply produces
/// less useful tokens.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut depth = 0usize;
    let mut idx = 0usize;

    while idx < source.len() {
        let rest = &source[idx..];
        let first = rest.chars().next().unwrap_or_default();
        let prev_is_word = source[..idx]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric() || c == '_');

        let (kind, len) = if rest.starts_with("//") {
            (TokenKind::Comment, rest.find('\n').unwrap_or(rest.len()))
        } else if rest.starts_with("/*") {
            (TokenKind::Comment, rest[2..].find("*/").map_or(rest.len(), |end| end + 4))
        } else if first == '"' {
            (TokenKind::StringLit, literal_len(rest, '"'))
        } else if first == '\'' && !prev_is_word {
            // `1'000` is a digit separator, not a character literal.
            (TokenKind::CharLit, literal_len(rest, '\''))
        } else if matches!(first, '(' | '[' | '{') {
            (TokenKind::Open, 1)
        } else if matches!(first, ')' | ']' | '}') {
            (TokenKind::Close, 1)
        } else if first == ',' {
            (TokenKind::Comma, 1)
        } else if let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            (TokenKind::Operator, op.len())
        } else {
            (TokenKind::Text, first.len_utf8())
        };

        let token_depth = match kind {
            TokenKind::Close => {
                depth = depth.saturating_sub(1);
                depth
            }
            TokenKind::Open => {
                depth += 1;
                depth - 1
            }
            _ => depth,
        };

        let span = idx..idx + len;
        match tokens.last_mut() {
            Some(last) if kind == TokenKind::Text && last.kind == TokenKind::Text => {
                last.span.end = span.end;
            }
            _ => tokens.push(Token {
                kind,
                span,
                depth: token_depth,
            }),
        }
        idx += len;
    }

    tokens
}

/// Splits `text` at top-level commas and trims each piece.
///
/// Commas inside brackets, literals and comments never split. Whitespace-only
/// input yields no arguments at all.
pub fn split_args(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut args = Vec::new();
    let mut start = 0;
    for token in tokenize(text) {
        if token.kind == TokenKind::Comma && token.depth == 0 {
            args.push(text[start..token.span.start].trim().to_string());
            start = token.span.end;
        }
    }
    args.push(text[start..].trim().to_string());
    args
}

/// One `NAME(...)` occurrence found by [`find_markers`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Which marker name matched.
    pub name: String,
    /// Text between the parentheses.
    pub body: String,
    /// Byte range of the whole marker, name through closing parenthesis.
    pub span: Range<usize>,
    /// 1-based line of the marker name.
    pub line: usize,
}

/// Finds every `NAME(...)` in `code` for the given marker names, in source
/// order.
///
/// A name only matches as a whole identifier followed by `(`, possibly after
/// whitespace, and never inside a literal or a comment.
pub fn find_markers(code: &str, names: &[&str]) -> Result<Vec<Marker>, ConfigError> {
    let tokens = tokenize(code);
    let mut markers = Vec::new();

    for (pos, token) in tokens.iter().enumerate() {
        if token.kind != TokenKind::Text {
            continue;
        }
        let Some(open) = tokens.get(pos + 1) else {
            continue;
        };
        if open.kind != TokenKind::Open || open.text(code) != "(" {
            continue;
        }

        let text = token.text(code).trim_end();
        let Some(name) = names.iter().find(|name| {
            text.strip_suffix(**name).is_some_and(|before| {
                !before
                    .chars()
                    .next_back()
                    .is_some_and(|c| c.is_alphanumeric() || c == '_')
            })
        }) else {
            continue;
        };

        let start = token.span.start + text.len() - name.len();
        let line = code[..start].matches('\n').count() + 1;
        let close = tokens[pos + 2..]
            .iter()
            .find(|t| t.kind == TokenKind::Close && t.depth == open.depth)
            .ok_or_else(|| ConfigError::UnterminatedMarker {
                marker: name.to_string(),
                line,
            })?;

        markers.push(Marker {
            name: name.to_string(),
            body: code[open.span.end..close.span.start].to_string(),
            span: start..close.span.end,
            line,
        });
    }

    Ok(markers)
}
