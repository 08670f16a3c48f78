#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{path::PathBuf, time::Duration};

use serde::Serialize;
use tracing::warn;
use typed_builder::TypedBuilder;

use crate::{
    check::CheckRecord,
    constants::DEFAULT_TIMEOUT_SECS,
    error::ConfigError,
    protocol::ResultLog,
    status::{Signals, Status},
    vars::Env,
};

/// Files generated for, or read by, one testcase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TestPaths {
    /// Generated C++ source (`${cpp}`).
    pub source:      PathBuf,
    /// Output of every compile command (`${compile}`).
    pub compile_log: PathBuf,
    /// Built program (`${exe}`).
    pub executable:  PathBuf,
    /// Captured standard output (`${out}`).
    pub stdout:      PathBuf,
    /// Captured standard error (`${error}`).
    pub stderr:      PathBuf,
    /// Result log written by the program (`${result}`).
    pub result:      PathBuf,
    /// Reference output to compare against, if any.
    pub expected:    Option<PathBuf>,
    /// File fed to the program's standard input, if any.
    pub input:       Option<PathBuf>,
    /// File the testcase code was loaded from, if it was not inline.
    pub code_file:   Option<PathBuf>,
}

/// How a testcase is run and compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestOptions {
    /// Whether the tested program's own `main` runs after the checks.
    pub run_main:    bool,
    /// Whether output comparison is case sensitive.
    pub match_case:  bool,
    /// Whether output comparison is whitespace sensitive.
    pub match_space: bool,
    /// Wall-clock limit for the test program.
    pub timeout:     Duration,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            run_main:    true,
            match_case:  true,
            match_space: true,
            timeout:     Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// One gradable unit: its configuration, its checks, and what happened when
/// it ran.
#[derive(Debug, Clone, TypedBuilder, Serialize)]
#[builder(field_defaults(setter(into)))]
pub struct Testcase {
    /// Ordinal identifier, starting at 0.
    id:             usize,
    /// Display name.
    #[builder(default)]
    name:           String,
    /// Points awarded when the testcase passes.
    #[builder(default)]
    points:         f64,
    /// Whether details are withheld from student-facing reports.
    #[builder(default)]
    hidden:         bool,
    /// Exit code the program must finish with.
    #[builder(default)]
    expected_exit:  i32,
    /// Command line arguments, as written in the configuration.
    #[builder(default)]
    args:           String,
    /// Generated and consumed files.
    paths:          TestPaths,
    /// Run and compare settings.
    #[builder(default)]
    options:        TestOptions,
    /// Testcase code after variable substitution.
    #[builder(default)]
    code:           Vec<String>,
    /// Code with every check marker replaced by its verification block.
    #[builder(default)]
    instrumented:   String,
    /// Variables visible to this testcase.
    #[builder(default)]
    env:            Env,
    /// Compile commands, substituted.
    #[builder(default)]
    compile:        Vec<String>,
    /// Header lines, substituted.
    #[builder(default)]
    header:         Vec<String>,
    /// Checks in source order; `checks[i].id() == i`.
    #[builder(default)]
    checks:         Vec<CheckRecord>,
    /// What the pipeline observed.
    #[builder(default, setter(skip))]
    signals:        Signals,
    /// The program's own `SCORE` line, if it wrote one.
    #[builder(default, setter(skip))]
    reported_score: Option<f64>,
    /// Records the program opened but never finished.
    #[builder(default, setter(skip))]
    dropped:        usize,
}

impl Testcase {
    /// Returns the identifier.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns the display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the point value.
    pub fn points(&self) -> f64 {
        self.points
    }

    /// Whether this testcase is hidden from students.
    pub fn hidden(&self) -> bool {
        self.hidden
    }

    /// Returns the expected exit code.
    pub fn expected_exit(&self) -> i32 {
        self.expected_exit
    }

    /// Returns the command line arguments.
    pub fn args(&self) -> &str {
        &self.args
    }

    /// Returns the file paths.
    pub fn paths(&self) -> &TestPaths {
        &self.paths
    }

    /// Returns the run and compare settings.
    pub fn options(&self) -> &TestOptions {
        &self.options
    }

    /// Returns the (substituted) testcase code.
    pub fn code(&self) -> &[String] {
        &self.code
    }

    /// Returns the instrumented body of the generated program.
    pub fn instrumented(&self) -> &str {
        &self.instrumented
    }

    /// Returns the variables visible to this testcase.
    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Returns the compile commands.
    pub fn compile(&self) -> &[String] {
        &self.compile
    }

    /// Returns the header lines.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Returns the checks.
    pub fn checks(&self) -> &[CheckRecord] {
        &self.checks
    }

    /// Returns the observed signals.
    pub fn signals(&self) -> &Signals {
        &self.signals
    }

    /// Mutable access to the observed signals, for the pipeline.
    pub fn signals_mut(&mut self) -> &mut Signals {
        &mut self.signals
    }

    /// Returns the score the program reported for itself.
    pub fn reported_score(&self) -> Option<f64> {
        self.reported_score
    }

    /// Number of incomplete records dropped from the result log.
    pub fn dropped_records(&self) -> usize {
        self.dropped
    }

    /// Number of checks.
    pub fn num_checks(&self) -> usize {
        self.checks.len()
    }

    /// Number of checks that passed.
    pub fn count_passed(&self) -> usize {
        self.checks.iter().filter(|c| c.passed()).count()
    }

    /// Number of checks that did not pass, including ones that never ran.
    pub fn count_failed(&self) -> usize {
        self.num_checks() - self.count_passed()
    }

    /// Classifies the current signals.
    pub fn status(&self) -> Status {
        Status::classify(&self.signals)
    }

    /// Points earned: all of them when the testcase passed, none otherwise.
    pub fn earned_points(&self) -> f64 {
        self.status().earned_points(self.points)
    }

    /// Recomputes whether every check passed.
    pub fn update_checks_passed(&mut self) {
        self.signals.checks_passed = self.checks.iter().all(CheckRecord::passed);
    }

    /// Replays a result log into the checks of this testcase.
    ///
    /// A record for a check this testcase does not own is a configuration
    /// error: the program and the configuration are out of sync.
    pub fn apply_log(&mut self, log: &ResultLog) -> Result<(), ConfigError> {
        let id = self.id;
        let owned = self.checks.len();
        let result_path = self.paths.result.display().to_string();

        for entry in &log.entries {
            let check = self.checks.get_mut(entry.check_id).ok_or_else(|| {
                ConfigError::Protocol {
                    path:   result_path.clone(),
                    line:   entry.line,
                    reason: format!(
                        "check {} does not belong to testcase {id} ({owned} checks)",
                        entry.check_id,
                    ),
                }
            })?;

            if entry.text != check.expression().raw() {
                warn!(
                    "Testcase {id}: result log names check {} `{}`, expected `{}`",
                    entry.check_id,
                    entry.text,
                    check.expression().raw()
                );
            }
            check.push(entry.passed, &entry.lhs, &entry.rhs, &entry.message);
        }

        self.reported_score = log.score;
        self.dropped = log.dropped_records;
        self.update_checks_passed();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{check::CheckExpression, protocol::LogEntry};

    fn testcase() -> Testcase {
        let check = CheckExpression::parse("x == 1", "t").unwrap();
        Testcase::builder()
            .id(1usize)
            .points(5.0)
            .paths(TestPaths::default())
            .checks(vec![CheckRecord::new(0, 2, "t", check)])
            .build()
    }

    fn entry(check_id: usize, passed: bool) -> LogEntry {
        LogEntry {
            line: 1,
            check_id,
            text: "x == 1".into(),
            passed,
            lhs: "1".into(),
            rhs: "1".into(),
            message: String::new(),
        }
    }

    #[test]
    fn replaying_a_log_fills_checks() {
        let mut test = testcase();
        let log = ResultLog {
            entries:         vec![entry(0, true), entry(0, true)],
            score:           Some(5.0),
            dropped_records: 0,
        };
        test.apply_log(&log).unwrap();
        assert_eq!(test.checks()[0].num_evaluations(), 2);
        assert!(test.signals().checks_passed);
        assert_eq!(test.reported_score(), Some(5.0));
    }

    #[test]
    fn unknown_check_ids_are_rejected() {
        let mut test = testcase();
        let mut stray = entry(3, true);
        stray.line = 7;
        let log = ResultLog {
            entries: vec![entry(0, true), stray],
            ..ResultLog::default()
        };
        match test.apply_log(&log) {
            Err(ConfigError::Protocol { line, reason, .. }) => {
                assert_eq!(line, 7);
                assert_eq!(reason, "check 3 does not belong to testcase 1 (1 checks)");
            }
            other => panic!("expected a protocol error, got {other:?}"),
        }
    }

    #[test]
    fn checks_that_never_ran_fail_the_testcase() {
        let mut test = testcase();
        test.apply_log(&ResultLog::default()).unwrap();
        assert!(!test.signals().checks_passed);
        assert_eq!(test.count_failed(), 1);
    }
}
