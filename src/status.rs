#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Resolves the raw signals of one testcase run into a single verdict.

use std::fmt::{self, Display};

use serde::Serialize;

/// What the pipeline observed while running one testcase. `None` means the
/// phase was never attempted, which is never evidence of failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Signals {
    /// Exit code of the first failing compile command, or 0.
    pub compile_exit:   Option<i32>,
    /// Exit code of the test program. `None` if it was not run or timed out.
    pub run_exit:       Option<i32>,
    /// Whether the test program was killed at its deadline.
    pub timed_out:      bool,
    /// Result of the output comparison, `None` if nothing was compared.
    pub output_matched: Option<bool>,
    /// Exit code the test program is expected to finish with.
    pub expected_exit:  i32,
    /// Whether every check ran and passed on every evaluation.
    pub checks_passed:  bool,
}

/// The verdict for one testcase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    /// Everything went as expected.
    Passed,
    /// A compile command failed.
    CompileFailed,
    /// The program ran past its deadline.
    TimedOut,
    /// The program exited with a non-zero code when 0 was expected.
    RuntimeError,
    /// The program was expected to fail with a specific code, and did not.
    WrongExitCode {
        /// code from the configuration
        expected: i32,
        /// code the program exited with
        actual:   i32,
    },
    /// At least one check failed or never ran.
    ChecksFailed,
    /// Output did not match the expected output.
    OutputMismatch,
}

impl Status {
    /// Classifies `signals`. The first matching rule wins:
    /// * compile failure
    /// * timeout
    /// * unexpected exit code (a wrong code when a non-zero one was expected,
    ///   otherwise a runtime error)
    /// * failing checks
    /// * output mismatch
    pub fn classify(signals: &Signals) -> Self {
        if signals.compile_exit.is_some_and(|code| code != 0) {
            return Status::CompileFailed;
        }
        if signals.timed_out {
            return Status::TimedOut;
        }
        if let Some(actual) = signals.run_exit
            && actual != signals.expected_exit
        {
            return if signals.expected_exit != 0 {
                Status::WrongExitCode {
                    expected: signals.expected_exit,
                    actual,
                }
            } else {
                Status::RuntimeError
            };
        }
        if !signals.checks_passed {
            return Status::ChecksFailed;
        }
        if signals.output_matched == Some(false) {
            return Status::OutputMismatch;
        }
        Status::Passed
    }

    /// Whether this is [`Status::Passed`].
    pub fn is_passed(&self) -> bool {
        matches!(self, Status::Passed)
    }

    /// Points earned by a testcase worth `points`: all or nothing.
    pub fn earned_points(&self, points: f64) -> f64 {
        if self.is_passed() { points } else { 0.0 }
    }

    /// Short label used in summary tables.
    pub fn label(&self) -> String {
        match self {
            Status::Passed => "Passing".into(),
            Status::CompileFailed => "Compilation Error".into(),
            Status::TimedOut => "Timed Out".into(),
            Status::RuntimeError => "Error During Run".into(),
            Status::WrongExitCode { expected, actual } => {
                format!("Wrong exit code (expected {expected} received {actual})")
            }
            Status::ChecksFailed => "Checks Failing".into(),
            Status::OutputMismatch => "Incorrect Output".into(),
        }
    }

    /// Sentence used on the result line of a testcase.
    pub fn message(&self) -> String {
        match self {
            Status::Passed => "PASSED!".into(),
            Status::CompileFailed => "FAILED during compilation.".into(),
            Status::TimedOut => "FAILED due to timeout.".into(),
            Status::RuntimeError => "FAILED due to run-time error.".into(),
            Status::WrongExitCode { expected, actual } => format!(
                "FAILED due to wrong exit code (expected {expected} received {actual})."
            ),
            Status::ChecksFailed => "FAILED due to unsuccessful check.".into(),
            Status::OutputMismatch => "FAILED due to mis-matched output.".into(),
        }
    }

    /// Colour used for this status, as a CSS colour name.
    pub fn color(&self) -> &'static str {
        match self {
            Status::Passed => "green",
            Status::CompileFailed => "darkred",
            Status::TimedOut => "purple",
            Status::ChecksFailed => "red",
            Status::RuntimeError | Status::WrongExitCode { .. } | Status::OutputMismatch => {
                "orangered"
            }
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ran_cleanly() -> Signals {
        Signals {
            compile_exit:   Some(0),
            run_exit:       Some(0),
            timed_out:      false,
            output_matched: None,
            expected_exit:  0,
            checks_passed:  true,
        }
    }

    #[test]
    fn skipped_phases_are_not_failures() {
        let signals = Signals {
            checks_passed: true,
            ..Signals::default()
        };
        assert_eq!(Status::classify(&signals), Status::Passed);
    }

    #[test]
    fn timeout_beats_exit_code_and_checks() {
        let signals = Signals {
            run_exit: None,
            timed_out: true,
            checks_passed: false,
            ..ran_cleanly()
        };
        assert_eq!(Status::classify(&signals), Status::TimedOut);
    }

    #[test]
    fn checks_beat_output() {
        let signals = Signals {
            checks_passed: false,
            output_matched: Some(false),
            ..ran_cleanly()
        };
        assert_eq!(Status::classify(&signals), Status::ChecksFailed);
    }
}
