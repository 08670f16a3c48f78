#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use anyhow::Result;
use itertools::Itertools;

use super::{
    Detail, Format,
    diff::{SpanKind, diff_spans, escape_control},
    earned_points, percent,
    sections::Section,
    text::TextFormat,
    total_points,
};
use crate::{check::CheckRecord, testcase::Testcase, util::read_text};

/// Escapes text for use inside HTML elements and attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// HTML fragments, meant to be embedded in a page.
#[derive(Debug, Clone, Copy)]
pub struct HtmlFormat;

impl HtmlFormat {
    /// Wraps `contents` in a shaded, preformatted table cell.
    fn pre_block(&self, heading: &str, color: &str, contents: &str) -> String {
        let mut out = format!(
            "<table>\n<tr><th>{heading}</tr>\n<tr><td valign=\"top\" \
             style=\"background-color:{color}\"><pre>\n"
        );
        out.push_str(&escape_html(&escape_control(contents)));
        out.push_str("</pre></tr></table>\n");
        out
    }

    /// Renders the evaluations of one check that the detail level allows.
    fn check(&self, check: &CheckRecord, detail: Detail) -> String {
        let expression = check.expression();
        let raw = escape_html(expression.raw());
        let mut out = String::new();

        if check.num_evaluations() == 0 {
            out.push_str(&format!(
                "\nTest: <b><code>{raw}</code></b>\n<p>Result: <span style=\"color: \
                 red\"><b>Failed.</b></span> (never evaluated)<br>\n"
            ));
            return out;
        }

        if check.passed_any() && !check.passed() {
            out.push_str(&format!(
                "<p>{} of {} evaluations of <code>{raw}</code> passed.</p>\n",
                check.count_passed_evaluations(),
                check.num_evaluations()
            ));
        }

        for eval in check.evaluations() {
            if eval.passed && detail < Detail::Full {
                continue;
            }
            let (color, message) = if eval.passed {
                ("green", "Passed!")
            } else {
                ("red", "Failed.")
            };
            out.push_str(&format!(
                "\nTest: <b><code>{raw}</code></b>\n<p>Result: <span style=\"color: \
                 {color}\"><b>{message}</b></span><br>\n"
            ));
            if !eval.message.is_empty() {
                out.push_str(&format!("Error Message: {}<br>\n", escape_html(eval.message)));
            }
            if expression.has_comparison() {
                out.push_str(&format!(
                    "<table><tr><td>Left side:<td><code>{}</code><td>&nbsp;&nbsp;==&gt;<td><code>{}</code></tr>\n",
                    escape_html(expression.lhs()),
                    escape_html(eval.lhs)
                ));
                out.push_str(&format!(
                    "<tr><td>Right side:<td><code>{}</code><td>&nbsp;&nbsp;==&gt;<td><code>{}</code></tr></table><br>\n",
                    escape_html(expression.rhs()),
                    escape_html(eval.rhs)
                ));
            }
        }
        out
    }

    /// Renders the testcase code, bolding lines with checks that did not pass.
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

        let mut out = String::from(
            "Sourcecode for Test:<br><br>\n<table style=\"background-color:#E3E0CF;\"><tr><td><pre>\n\n",
        );
        for (idx, line) in test.code().iter().enumerate() {
            let line = escape_html(line);
            if failing.contains(&(idx + 1)) {
                out.push_str(&format!("<b>{line}</b>\n"));
            } else {
                out.push_str(&format!("{line}\n"));
            }
        }
        out.push_str("</pre></tr></table>\n");
        out
    }

    /// Renders both outputs side by side, then the coloured diff.
    fn diff(&self, test: &Testcase) -> Result<String> {
        let actual = read_text(&test.paths().stdout)?;
        let expected = match &test.paths().expected {
            Some(path) => Some(read_text(path)?),
            None => None,
        };

        let mut out = String::from(
            "<table>\n<tr><th>Your Output<th> <th>Expected Output</tr>\n<tr><td valign=\"top\" \
             style=\"background-color:LightGoldenrodYellow\"><pre>\n",
        );
        out.push_str(&escape_html(&escape_control(&actual)));
        out.push_str(
            "</pre>\n<td>&nbsp;<td valign=\"top\" style=\"background-color:LightBlue\"><pre>\n",
        );
        out.push_str(&escape_html(&escape_control(expected.as_deref().unwrap_or(""))));
        out.push_str("</pre></tr></table>\n");

        if let Some(expected) = expected {
            out.push_str(
                "<table>\n<tr><th>Diff</tr>\n<tr><td valign=\"top\" \
                 style=\"background-color:LightGray\"><pre>\n",
            );
            for span in diff_spans(&actual, &expected) {
                let text = escape_html(&escape_control(&span.text));
                match span.kind {
                    SpanKind::Common => out.push_str(&text),
                    SpanKind::Added => out.push_str(&format!(
                        "<span style=\"background-color:LightGreen\">{text}</span>"
                    )),
                    SpanKind::Deleted => out.push_str(&format!(
                        "<span style=\"background-color:LightCoral\">{text}</span>"
                    )),
                }
            }
            out.push_str("</pre></tr></table>\n");
        }
        Ok(out)
    }
}

impl Format for HtmlFormat {
    fn title(&self, title: &str) -> String {
        format!("<h1>{}</h1>\n\n", escape_html(title))
    }

    fn summary(&self, tests: &[Testcase], link_base: Option<&str>) -> String {
        let mut out = format!(
            "<h2>Final Score: <span style=\"color: blue\">{}%</span></h2>\n\n",
            percent(tests)
        );
        out.push_str(
            "<table style=\"background-color:#3fc0FF;\" cellpadding=\"5px\" border=\"1px solid \
             black\" cellspacing=\"0\"><tr><th>Test Case<th>Status<th>Checks<th>Passed<th>Failed<th>Score</tr>\n",
        );

        for test in tests {
            match link_base {
                Some(base) => out.push_str(&format!(
                    "<tr onclick=\"window.location='{}Test{}';\">",
                    escape_html(base),
                    test.id()
                )),
                None => out.push_str("<tr>"),
            }
            out.push_str(&format!(
                "<td>{}: {}<td><span style=\"color: {}\">{}</span><td>{}<td>{}<td>{}<td>{} / {}</tr>\n",
                test.id(),
                escape_html(test.name()),
                test.status().color(),
                escape_html(&test.status().label()),
                test.num_checks(),
                test.count_passed(),
                test.count_failed(),
                test.earned_points(),
                test.points()
            ));
        }
        out.push_str(&format!(
            "<tr><th>TOTAL<td><td><td><td><td>{} / {}</tr></table>\n",
            earned_points(tests),
            total_points(tests)
        ));

        if let Some(base) = link_base {
            out.push_str("<p>Click on a row above to jump to the test case");
            if base == "#" {
                out.push_str(" or scroll down for more details");
            }
            out.push_str(".<br>\n");
        }
        out.push_str("<hr>\n");
        out
    }

    fn section(&self, test: &Testcase, section: Section, detail: Detail) -> Result<String> {
        let paths = test.paths();
        Ok(match section {
            Section::Title => {
                let mut out = format!(
                    "<h2 id=\"Test{}\">Test Case {}: {}",
                    test.id(),
                    test.id(),
                    escape_html(test.name())
                );
                if test.hidden() && detail >= Detail::Instructor {
                    out.push_str(" <small>[HIDDEN]</small>");
                }
                out.push_str("</h2>\n");
                out
            }
            Section::Status => {
                let status = test.status();
                format!(
                    "<b>Result: <span style=\"color: {}\">{}</span></b><br><br>\n\n",
                    status.color(),
                    escape_html(&status.message())
                )
            }
            Section::Checks => test
                .checks()
                .iter()
                .map(|check| self.check(check, detail))
                .join(""),
            Section::Code => self.code(test),
            Section::CompileLog => {
                let log = read_text(&paths.compile_log)?;
                let mut style = "width:800px;".to_string();
                if log.lines().count() > 25 {
                    style.push_str(" height:400px; overflow-y:scroll;");
                }
                format!(
                    "<p>Compile Results for Test:<br><br>\n<table \
                     style=\"background-color:Lavender\"><tr><td style=\"{style} \
                     display:block;\"><pre>\n\n{}</pre></tr></table>\n",
                    escape_html(&escape_control(&log))
                )
            }
            Section::Stderr => {
                let errors = read_text(&paths.stderr)?;
                self.pre_block("Run-time Error Messages:", "LightGray", &errors)
            }
            Section::Input => {
                let mut out = String::new();
                if !test.args().is_empty() {
                    out.push_str(&format!(
                        "Command Line Arguments: <code>{}</code><br>\n",
                        escape_html(test.args())
                    ));
                }
                match &paths.input {
                    Some(input) => {
                        let input = read_text(input)?;
                        out.push_str(&self.pre_block("Input", "LightGreen", &input));
                    }
                    None => out.push_str("No input for test.<br>\n"),
                }
                out
            }
            Section::Diff => self.diff(test)?,
            Section::Debug => format!(
                "<pre>\n{}</pre>\n",
                escape_html(&TextFormat::plain().section(test, Section::Debug, detail)?)
            ),
        })
    }
}
