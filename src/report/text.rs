#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use anyhow::Result;
use colored::Colorize;
use itertools::Itertools;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Panel, Style, object::Rows},
};

use super::{
    Detail, Format,
    diff::{SpanKind, diff_spans, escape_control},
    earned_points, percent,
    sections::Section,
    total_points,
};
use crate::{check::CheckRecord, status::Status, testcase::Testcase, util::read_text};

/// Plain text reports, optionally coloured for a terminal.
#[derive(Debug, Clone, Copy)]
pub struct TextFormat {
    /// Whether ANSI colours are emitted.
    color: bool,
}

/// One row of the summary table.
#[derive(Tabled)]
struct SummaryRow {
    /// `id: name`
    #[tabled(rename = "Test Case")]
    case:   String,
    /// status label
    #[tabled(rename = "Status")]
    status: String,
    /// number of checks
    #[tabled(rename = "Checks")]
    checks: String,
    /// checks that passed
    #[tabled(rename = "Passed")]
    passed: String,
    /// checks that did not pass
    #[tabled(rename = "Failed")]
    failed: String,
    /// `earned / points`
    #[tabled(rename = "Score")]
    score:  String,
}

impl TextFormat {
    /// Text without colours.
    pub fn plain() -> Self {
        Self { color: false }
    }

    /// Text with terminal colours.
    pub fn colored() -> Self {
        Self { color: true }
    }

    /// Colours the result line of a testcase.
    fn paint_status(&self, status: &Status) -> String {
        let message = status.message();
        if !self.color {
            return message;
        }
        match status {
            Status::Passed => message.green().bold().to_string(),
            Status::ChecksFailed => message.red().bold().to_string(),
            Status::CompileFailed => message.red().to_string(),
            Status::TimedOut => message.purple().bold().to_string(),
            Status::RuntimeError | Status::WrongExitCode { .. } | Status::OutputMismatch => {
                message.yellow().bold().to_string()
            }
        }
    }

    /// Colours `Passed!`/`Failed.` for one evaluation.
    fn paint_outcome(&self, passed: bool) -> String {
        match (passed, self.color) {
            (true, false) => "Passed!".to_string(),
            (false, false) => "Failed.".to_string(),
            (true, true) => "Passed!".green().to_string(),
            (false, true) => "Failed.".red().to_string(),
        }
    }

    /// Renders the evaluations of one check that the detail level allows.
    fn check(&self, check: &CheckRecord, detail: Detail) -> String {
        let expression = check.expression();
        let mut out = String::new();

        if check.num_evaluations() == 0 {
            out.push_str(&format!("\nTest: {}\n\n", expression.raw()));
            out.push_str(&format!("Result: {} (never evaluated)\n", self.paint_outcome(false)));
            return out;
        }

        if check.passed_any() && !check.passed() {
            out.push_str(&format!(
                "\n{} of {} evaluations of `{}` passed.\n",
                check.count_passed_evaluations(),
                check.num_evaluations(),
                expression.raw()
            ));
        }

        let width = expression.lhs().len().max(expression.rhs().len());
        for eval in check.evaluations() {
            if eval.passed && detail < Detail::Full {
                continue;
            }
            out.push_str(&format!("\nTest: {}\n\n", expression.raw()));
            out.push_str(&format!("Result: {}\n", self.paint_outcome(eval.passed)));
            if !eval.message.is_empty() {
                out.push_str(&format!("Error Message: {}\n", eval.message));
            }
            if expression.has_comparison() {
                out.push_str(&format!(
                    "Left side : {:<width$}  ==>  {}\n",
                    expression.lhs(),
                    eval.lhs
                ));
                out.push_str(&format!(
                    "Right side: {:<width$}  ==>  {}\n",
                    expression.rhs(),
                    eval.rhs
                ));
            }
        }
        out
    }

    /// Renders the testcase code, marking lines with checks that did not pass.
    fn code(&self, test: &Testcase) -> String {
        if test.code().is_empty() {
            return String::new();
        }

        let failing: Vec<usize> = if test.status().is_passed() {
            Vec::new()
        } else {
            test.checks()
                .iter()
                .filter(|check| !check.passed())
                .map(CheckRecord::line)
                .collect()
        };

        let mut out = String::from("\nSourcecode for Test:\n\n");
        for (idx, line) in test.code().iter().enumerate() {
            if failing.contains(&(idx + 1)) {
                let marked = format!(">> {line}");
                if self.color {
                    out.push_str(&marked.red().bold().to_string());
                } else {
                    out.push_str(&marked);
                }
            } else {
                out.push_str(&format!("   {line}"));
            }
            out.push('\n');
        }
        out
    }

    /// Renders the output diff block.
    fn diff(&self, test: &Testcase) -> Result<String> {
        let actual = read_text(&test.paths().stdout)?;
        let mut out = String::from("\n========== YOUR OUTPUT ==========\n");
        out.push_str(&escape_control(&actual));
        if !actual.is_empty() && !actual.ends_with('\n') {
            out.push('\n');
        }

        let Some(expected_path) = &test.paths().expected else {
            out.push_str("\n========== END OUTPUT ==========\n");
            return Ok(out);
        };
        let expected = read_text(expected_path)?;
        out.push_str("\n========== EXPECTED OUTPUT ==========\n");
        out.push_str(&escape_control(&expected));
        if !expected.is_empty() && !expected.ends_with('\n') {
            out.push('\n');
        }

        out.push_str("\n========== DIFF ==========\n");
        for span in diff_spans(&actual, &expected) {
            let text = escape_control(&span.text);
            let rendered = match (span.kind, self.color) {
                (SpanKind::Common, _) => text,
                (SpanKind::Added, false) => format!("{{+{text}+}}"),
                (SpanKind::Deleted, false) => format!("[-{text}-]"),
                (SpanKind::Added, true) => text.on_green().to_string(),
                (SpanKind::Deleted, true) => text.on_red().to_string(),
            };
            out.push_str(&rendered);
        }
        out.push_str("\n========== END OUTPUT ==========\n");
        Ok(out)
    }

    /// Renders a file section under a banner, one line per file line.
    fn file_block(&self, banner: &str, contents: &str) -> String {
        let mut out = format!("\n{banner}\n");
        for line in contents.lines() {
            out.push_str(&escape_control(line));
            out.push('\n');
        }
        out
    }

    /// Renders configuration and parsing details.
    fn debug(&self, test: &Testcase) -> String {
        let paths = test.paths();
        let options = test.options();
        let describe = |path: &Option<std::path::PathBuf>| {
            path.as_ref()
                .map_or_else(|| "(none)".to_string(), |p| p.display().to_string())
        };

        let mut out = String::from("\n========== DEBUG ==========\n");
        out.push_str(&format!("Name..............: {}\n", test.name()));
        out.push_str(&format!("Points............: {}\n", test.points()));
        out.push_str(&format!("Hidden............: {}\n", test.hidden()));
        out.push_str(&format!("match_case........: {}\n", options.match_case));
        out.push_str(&format!("match_space.......: {}\n", options.match_space));
        out.push_str(&format!("run_main..........: {}\n", options.run_main));
        out.push_str(&format!("Timeout...........: {}s\n", options.timeout.as_secs()));
        out.push_str(&format!("Command Line Args.: {}\n", test.args()));
        out.push_str(&format!("Expected exit code: {}\n", test.expected_exit()));
        out.push_str(&format!("Input file........: {}\n", describe(&paths.input)));
        out.push_str(&format!("Expected output...: {}\n", describe(&paths.expected)));
        out.push_str(&format!("Code file.........: {}\n", describe(&paths.code_file)));
        out.push_str(&format!("Generated source..: {}\n", paths.source.display()));
        out.push_str(&format!("Compiler results..: {}\n", paths.compile_log.display()));
        out.push_str(&format!("Executable........: {}\n", paths.executable.display()));
        out.push_str(&format!("Execution output..: {}\n", paths.stdout.display()));
        out.push_str(&format!("Execution errors..: {}\n", paths.stderr.display()));
        out.push_str(&format!("Result log........: {}\n", paths.result.display()));
        out.push_str(&format!("Signals...........: {:?}\n", test.signals()));
        out.push_str(&format!(
            "Reported score....: {}\n",
            test.reported_score()
                .map_or_else(|| "(none)".to_string(), |s| s.to_string())
        ));
        out.push_str(&format!("Dropped records...: {}\n", test.dropped_records()));

        out.push_str("\n-- Vars --\n");
        for (name, value) in test.env().iter() {
            out.push_str(&format!("  ${{{name}}} = {value}\n"));
        }
        out.push_str("\n-- Compile Lines --\n");
        out.push_str(&test.compile().iter().map(|l| format!("  {l}\n")).join(""));
        out.push_str("\n-- Header Lines --\n");
        out.push_str(&test.header().iter().map(|l| format!("  {l}\n")).join(""));

        out.push_str("\n-- Checks --\n");
        for check in test.checks() {
            let expression = check.expression();
            out.push_str(&format!(
                "  #{} line {}: lhs `{}` comparator `{}` rhs `{}` messages [{}] ({} of {} \
                 evaluations passed)\n",
                check.id(),
                check.line(),
                expression.lhs(),
                expression.comparator(),
                expression.rhs(),
                expression.messages().iter().join(", "),
                check.count_passed_evaluations(),
                check.num_evaluations()
            ));
        }
        out
    }
}

impl Format for TextFormat {
    fn title(&self, title: &str) -> String {
        if self.color {
            format!("{}\n\n", title.bold())
        } else {
            format!("{title}\n\n")
        }
    }

    fn summary(&self, tests: &[Testcase], _link_base: Option<&str>) -> String {
        let mut rows: Vec<SummaryRow> = tests
            .iter()
            .map(|test| SummaryRow {
                case:   format!("{}: {}", test.id(), test.name()),
                status: test.status().label(),
                checks: test.num_checks().to_string(),
                passed: test.count_passed().to_string(),
                failed: test.count_failed().to_string(),
                score:  format!("{} / {}", test.earned_points(), test.points()),
            })
            .collect();
        rows.push(SummaryRow {
            case:   "TOTAL".into(),
            status: String::new(),
            checks: String::new(),
            passed: String::new(),
            failed: String::new(),
            score:  format!("{} / {}", earned_points(tests), total_points(tests)),
        });

        let table = Table::new(&rows)
            .with(Panel::header("Test Results"))
            .with(Panel::footer(format!("Final Score: {}%", percent(tests))))
            .with(
                Modify::new(Rows::first())
                    .with(Alignment::center())
                    .with(Alignment::center_vertical()),
            )
            .with(
                Modify::new(Rows::last())
                    .with(Alignment::center())
                    .with(Alignment::center_vertical()),
            )
            .with(Style::modern())
            .to_string();
        format!("{table}\n\n")
    }

    fn section(&self, test: &Testcase, section: Section, detail: Detail) -> Result<String> {
        let paths = test.paths();
        Ok(match section {
            Section::Title => {
                let mut title = format!("TEST CASE {}: {}", test.id(), test.name());
                if test.hidden() && detail >= Detail::Instructor {
                    title.push_str(" [HIDDEN]");
                }
                let rule = "=".repeat(title.chars().count());
                if self.color {
                    format!("\n{}\n{rule}\n", title.bold())
                } else {
                    format!("\n{title}\n{rule}\n")
                }
            }
            Section::Status => format!("Result: {}\n", self.paint_status(&test.status())),
            Section::Checks => test
                .checks()
                .iter()
                .map(|check| self.check(check, detail))
                .join(""),
            Section::Code => self.code(test),
            Section::CompileLog => {
                let log = read_text(&paths.compile_log)?;
                self.file_block("Compile Results for Test:\n", &log)
            }
            Section::Stderr => {
                let errors = read_text(&paths.stderr)?;
                self.file_block("========== RUN-TIME ERRORS ==========", &errors)
            }
            Section::Input => {
                let mut out = String::new();
                if !test.args().is_empty() {
                    out.push_str(&format!("\nCommand Line Arguments: {}\n", test.args()));
                }
                match &paths.input {
                    Some(input) => {
                        let input = read_text(input)?;
                        out.push_str(&self.file_block("========== INPUT ==========", &input));
                    }
                    None => out.push_str("\nNo input for test.\n"),
                }
                out
            }
            Section::Diff => self.diff(test)?,
            Section::Debug => self.debug(test),
        })
    }
}
