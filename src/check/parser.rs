#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt::{self, Display};

use serde::Serialize;

use crate::{
    constants::TYPE_COMPARATOR,
    error::ConfigError,
    scan::{TokenKind, split_args, tokenize},
};

/// A comparison operator allowed at the top level of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Comparator {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl Comparator {
    /// Returns the operator as written in C++.
    pub fn as_str(self) -> &'static str {
        match self {
            Comparator::Eq => "==",
            Comparator::Ne => "!=",
            Comparator::Lt => "<",
            Comparator::Le => "<=",
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
        }
    }

    /// Maps an operator token to a comparator, if it is one.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "==" => Some(Comparator::Eq),
            "!=" => Some(Comparator::Ne),
            "<" => Some(Comparator::Lt),
            "<=" => Some(Comparator::Le),
            ">" => Some(Comparator::Gt),
            ">=" => Some(Comparator::Ge),
            _ => None,
        }
    }
}

impl Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three shapes a check can take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CheckKind {
    /// `CHECK(expr)`: passes when `expr` is truthy.
    Truthy {
        /// the whole expression
        expr: String,
    },
    /// `CHECK(lhs op rhs)`
    Compare {
        /// left operand, trimmed
        lhs: String,
        /// the single top-level comparator
        op:  Comparator,
        /// right operand, trimmed
        rhs: String,
    },
    /// `CHECK_TYPE(expr, type)`: passes when `decltype(expr)` is `type`.
    TypeMatch {
        /// expression whose type is inspected
        expr:      String,
        /// expected type, as written
        type_name: String,
    },
}

/// One parsed check: the assertion plus any extra message arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckExpression {
    /// Text of the assertion as reported back to students.
    raw:      String,
    /// Structured form of the assertion.
    kind:     CheckKind,
    /// Remaining arguments, streamed together into a failure message.
    messages: Vec<String>,
}

impl CheckExpression {
    /// Parses the body of a `CHECK(...)` marker.
    ///
    /// * `body`: text between the marker's parentheses
    /// * `location`: human readable position used in error messages
    pub fn parse(body: &str, location: &str) -> Result<Self, ConfigError> {
        let mut args = split_args(body).into_iter();
        let test = args
            .next()
            .filter(|arg| !arg.is_empty())
            .ok_or_else(|| ConfigError::EmptyCheck {
                location: location.to_string(),
            })?;

        let kind = classify(&test, location)?;
        Ok(Self {
            raw: test,
            kind,
            messages: args.collect(),
        })
    }

    /// Parses the body of a `CHECK_TYPE(expr, type, ...)` marker.
    pub fn parse_type(body: &str, location: &str) -> Result<Self, ConfigError> {
        let mut args = split_args(body).into_iter();
        let (Some(expr), Some(type_name)) = (args.next(), args.next()) else {
            return Err(ConfigError::TypeCheckArity {
                location: location.to_string(),
            });
        };
        if expr.is_empty() || type_name.is_empty() {
            return Err(ConfigError::EmptyOperand {
                location:   location.to_string(),
                comparator: TYPE_COMPARATOR.to_string(),
            });
        }

        Ok(Self {
            raw: format!("TYPE({expr}) == {type_name}"),
            kind: CheckKind::TypeMatch { expr, type_name },
            messages: args.collect(),
        })
    }

    /// Returns the assertion text.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the structured assertion.
    pub fn kind(&self) -> &CheckKind {
        &self.kind
    }

    /// Returns the extra message expressions.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Returns the left operand (the whole expression for plain checks).
    pub fn lhs(&self) -> &str {
        match &self.kind {
            CheckKind::Truthy { expr } => expr,
            CheckKind::Compare { lhs, .. } => lhs,
            CheckKind::TypeMatch { expr, .. } => expr,
        }
    }

    /// Returns the right operand, empty when there is none.
    pub fn rhs(&self) -> &str {
        match &self.kind {
            CheckKind::Truthy { .. } => "",
            CheckKind::Compare { rhs, .. } => rhs,
            CheckKind::TypeMatch { type_name, .. } => type_name,
        }
    }

    /// Returns the comparator as text: empty, an operator, or `TYPE`.
    pub fn comparator(&self) -> &str {
        match &self.kind {
            CheckKind::Truthy { .. } => "",
            CheckKind::Compare { op, .. } => op.as_str(),
            CheckKind::TypeMatch { .. } => TYPE_COMPARATOR,
        }
    }

    /// Whether the check compares two sides (and so has two values to show).
    pub fn has_comparison(&self) -> bool {
        !matches!(self.kind, CheckKind::Truthy { .. })
    }
}

/// Classifies the first argument of a `CHECK`.
fn classify(test: &str, location: &str) -> Result<CheckKind, ConfigError> {
    let tokens = tokenize(test);

    if tokens
        .iter()
        .any(|t| t.kind == TokenKind::Operator && matches!(t.text(test), "&&" | "||"))
    {
        return Err(ConfigError::CompositeCheck {
            location: location.to_string(),
        });
    }

    let comparisons: Vec<_> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Operator && t.depth == 0)
        .filter_map(|t| Comparator::from_token(t.text(test)).map(|op| (t, op)))
        .collect();

    match comparisons.as_slice() {
        [] => Ok(CheckKind::Truthy {
            expr: test.trim().to_string(),
        }),
        [(token, op)] => {
            let lhs = test[..token.span.start].trim();
            let rhs = test[token.span.end..].trim();
            if lhs.is_empty() || rhs.is_empty() {
                return Err(ConfigError::EmptyOperand {
                    location:   location.to_string(),
                    comparator: op.to_string(),
                });
            }
            Ok(CheckKind::Compare {
                lhs: lhs.to_string(),
                op:  *op,
                rhs: rhs.to_string(),
            })
        }
        _ => Err(ConfigError::MultipleComparisons {
            location: location.to_string(),
        }),
    }
}
