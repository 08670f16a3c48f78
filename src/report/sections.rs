#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use serde::Serialize;

use super::Detail;
use crate::{status::Status, testcase::Testcase};

/// One part of a testcase's details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Section {
    /// Testcase number and name.
    Title,
    /// Result line.
    Status,
    /// Evaluations of each check.
    Checks,
    /// Testcase code.
    Code,
    /// Compiler output.
    CompileLog,
    /// Captured standard error.
    Stderr,
    /// Command line arguments and standard input.
    Input,
    /// Actual versus expected output.
    Diff,
    /// Configuration and parsed checks.
    Debug,
}

/// Decides which sections of `test` a report at `detail` shows, in order.
///
/// Below student detail nothing is shown per testcase. Hidden testcases only
/// show their title and status below instructor detail.
pub fn plan_sections(test: &Testcase, detail: Detail) -> Vec<Section> {
    if detail < Detail::Student {
        return Vec::new();
    }

    let mut sections = vec![Section::Title, Section::Status];
    if test.hidden() && detail < Detail::Instructor {
        return sections;
    }

    let status = test.status();
    let passed_details = detail >= Detail::Full;

    if status == Status::ChecksFailed || passed_details {
        sections.push(Section::Checks);
    }
    if !status.is_passed() || passed_details {
        sections.push(Section::Code);
    }
    if status == Status::CompileFailed {
        sections.push(Section::CompileLog);
    }
    if status == Status::RuntimeError {
        sections.push(Section::Stderr);
    }
    if matches!(status, Status::WrongExitCode { .. } | Status::OutputMismatch) || passed_details {
        sections.push(Section::Input);
    }
    if matches!(status, Status::RuntimeError | Status::OutputMismatch) {
        sections.push(Section::Diff);
    }
    if detail >= Detail::Debug {
        sections.push(Section::Debug);
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testcase::TestPaths;

    fn failing(hidden: bool) -> Testcase {
        let mut test = Testcase::builder()
            .id(0usize)
            .hidden(hidden)
            .paths(TestPaths::default())
            .build();
        let signals = test.signals_mut();
        signals.compile_exit = Some(0);
        signals.run_exit = Some(1);
        test
    }

    #[test]
    fn runtime_errors_show_stderr_and_diff() {
        let sections = plan_sections(&failing(false), Detail::Student);
        assert_eq!(
            sections,
            vec![
                Section::Title,
                Section::Status,
                Section::Code,
                Section::Stderr,
                Section::Diff
            ]
        );
    }

    #[test]
    fn hidden_testcases_need_instructor_detail() {
        let test = failing(true);
        assert_eq!(plan_sections(&test, Detail::Student), vec![Section::Title, Section::Status]);
        assert!(plan_sections(&test, Detail::Instructor).contains(&Section::Stderr));
    }
}
