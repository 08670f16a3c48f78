#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Emits the C++ verification code for one check.
pub mod codegen;
/// Parses check bodies into [`CheckExpression`]s.
pub mod parser;
/// Runtime outcomes of a check, replayed from the result log.
pub mod record;

pub use codegen::instrument;
pub use parser::{CheckExpression, CheckKind, Comparator};
pub use record::{CheckRecord, Evaluation};
