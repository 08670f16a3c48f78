#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Fatal configuration errors.
//!
//! Anything in here means the grading configuration itself is broken, so the
//! whole run is aborted. Grading outcomes (compile errors, timeouts, failed
//! checks, ...) are never represented as errors; see [`crate::status`].

/// An enum to represent everything that can be wrong with a grading
/// configuration, a check expression, or a result log.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A check combined several predicates with `&&` or `||`.
    #[error("{location}: Unit test checks do not allow \"&&\" or \"||\".")]
    CompositeCheck {
        /// where the check was found
        location: String,
    },
    /// A check contained more than one top-level comparison.
    #[error("{location}: Unit test checks can have only one comparison.")]
    MultipleComparisons {
        /// where the check was found
        location: String,
    },
    /// One side of a comparison was empty, eg. `CHECK(== 3)`.
    #[error("{location}: Both sides of `{comparator}` must be non-empty.")]
    EmptyOperand {
        /// where the check was found
        location:   String,
        /// the comparator that is missing an operand
        comparator: String,
    },
    /// `CHECK()` without any argument.
    #[error("{location}: CHECK cannot be empty.")]
    EmptyCheck {
        /// where the check was found
        location: String,
    },
    /// `CHECK_TYPE` needs an expression and a type.
    #[error("{location}: CHECK_TYPE needs at least two args.")]
    TypeCheckArity {
        /// where the check was found
        location: String,
    },
    /// A check marker whose parenthesis is never closed.
    #[error("Line {line}: `{marker}(` has no matching `)`.")]
    UnterminatedMarker {
        /// name of the marker, eg. `CHECK`
        marker: String,
        /// 1-based line number of the marker
        line:   usize,
    },
    /// `${` without a closing `}`.
    #[error("No end to variable on line: {0}")]
    UnterminatedVariable(String),
    /// `${name}` where `name` was never defined.
    #[error("Unknown variable used: {0}")]
    UnknownVariable(String),
    /// A non-blank line where a `:Command` was expected.
    #[error("Line {line} in {source_name} unknown:\n{text}")]
    ExpectedCommand {
        /// name of the configuration being read
        source_name: String,
        /// 1-based line number
        line:        usize,
        /// offending line
        text:        String,
    },
    /// A `:Command` that does not exist.
    #[error("Unknown command '{0}'.")]
    UnknownCommand(String),
    /// A `key=value` setting that the command does not understand.
    #[error("Unknown {command} argument '{key}'.")]
    UnknownSetting {
        /// command the setting was given to
        command: String,
        /// the unknown key
        key:     String,
    },
    /// A setting whose value could not be interpreted.
    #[error("Invalid value '{value}' for setting '{key}'.")]
    InvalidSetting {
        /// setting name
        key:   String,
        /// rejected value
        value: String,
    },
    /// `:Init` appeared more than once.
    #[error(":Init run twice!")]
    InitTwice,
    /// A `:Testcase` came before any `:Compile` block.
    #[error("Cannot set up testcase without compile rules.")]
    MissingCompile,
    /// A testcase gave both a `code_file` and inline code.
    #[error("Test case {0} cannot have both a code filename and in-place code provided.")]
    DuplicateCode(usize),
    /// A setting names a file that does not exist.
    #[error("Testcase {test}: {setting} file '{path}' does not exist.")]
    MissingFile {
        /// testcase the setting belongs to
        test:    usize,
        /// setting name, eg. `expect`
        setting: String,
        /// path as configured
        path:    String,
    },
    /// Unknown report detail level.
    #[error("Trying to set unknown detail level '{0}'.")]
    UnknownDetail(String),
    /// A result log that the parser cannot make sense of.
    #[error("Result log {path}, line {line}: {reason}")]
    Protocol {
        /// path of the result log
        path:   String,
        /// 1-based line number
        line:   usize,
        /// what went wrong
        reason: String,
    },
}
