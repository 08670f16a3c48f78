#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Default working directory for generated files (`${dir}`).
pub const DEFAULT_DIR: &str = ".checkgrade";

/// Default run log name inside `${dir}` (`${log}`).
pub const DEFAULT_LOG: &str = "Log.txt";

/// Default value of `${debug}`.
pub const DEFAULT_DEBUG: &str = "false";

/// Everything after this marker on a configuration line is an instructor
/// comment and is dropped before anything else happens.
pub const DEFAULT_COMMENT_MARKER: &str = "///";

/// Seconds a built test program may run before it is killed.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Marker for a boolean or comparison check.
pub const CHECK_MARKER: &str = "CHECK";

/// Marker for a compile-time type comparison.
pub const CHECK_TYPE_MARKER: &str = "CHECK_TYPE";

/// Sentinel comparator reported for `CHECK_TYPE` checks.
pub const TYPE_COMPARATOR: &str = "TYPE";

/// RHS text recorded for checks without a comparison.
pub const NO_RHS: &str = "N/A";

/// First line of the run log.
pub const LOG_BANNER: &str = "== CHECKGRADE TEST LOG ==";

/// Support code placed at the top of every generated test program.
pub const PRELUDE: &str = include_str!("templates/prelude.hpp");

/// Environment variable that overrides the log level (eg. `debug`).
pub const LOG_LEVEL_ENV: &str = "CHECKGRADE_LOG";
