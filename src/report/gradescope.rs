#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Gradescope's `results.json` format.
//!
//! See <https://gradescope-autograders.readthedocs.io/en/latest/specs/>.

use anyhow::{Context, Result};
use serde::Serialize;
use typed_builder::TypedBuilder;

use super::{Detail, Encoding, earned_points, percent, render_sections, total_points};
use crate::testcase::Testcase;

/// Format Gradescope uses to display `output` fields.
#[derive(Serialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GradescopeOutputFormat {
    /// Plain text; the only format this grader emits.
    #[default]
    Text,
}

/// When students get to see a testcase entry.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GradescopeVisibility {
    /// Once grades are published; used for hidden testcases.
    AfterPublished,
    /// Always.
    Visible,
}

/// Pass/fail marker shown next to a testcase entry.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GradescopeStatus {
    /// The testcase passed.
    Passed,
    /// Anything else.
    Failed,
}

/// The whole `results.json` document.
#[derive(Serialize, Debug, TypedBuilder)]
#[builder(field_defaults(default, setter(into)))]
pub struct GradescopeSubmission {
    /// Earned points over every testcase.
    pub score: f64,

    /// Points summary.
    pub output: String,

    /// Format of `output`.
    pub output_format: GradescopeOutputFormat,

    /// Format of every entry's `output`.
    pub test_output_format: GradescopeOutputFormat,

    /// Per-testcase entries, listed at summary detail and above.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tests: Option<Vec<GradescopeTestCase>>,
}

/// One testcase entry.
#[derive(Serialize, Debug, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct GradescopeTestCase {
    /// Points earned.
    pub score:      f64,
    /// Points available.
    pub max_score:  f64,
    /// Pass/fail marker.
    pub status:     GradescopeStatus,
    /// `id: name`.
    pub name:       String,
    /// Testcase id.
    pub number:     String,
    /// Text report at the sink's detail.
    pub output:     String,
    /// Who may see the entry, and when.
    pub visibility: GradescopeVisibility,
}

/// Builds the Gradescope entry for one testcase.
///
/// The entry's output holds the testcase's text report at `detail`, or just
/// its result line when that level shows no details. Hidden
/// testcases only become visible once grades are published.
fn test_entry(test: &Testcase, detail: Detail) -> Result<GradescopeTestCase> {
    let status = if test.status().is_passed() {
        GradescopeStatus::Passed
    } else {
        GradescopeStatus::Failed
    };
    let visibility = if test.hidden() {
        GradescopeVisibility::AfterPublished
    } else {
        GradescopeVisibility::Visible
    };
    let mut output = render_sections(test, detail, Encoding::Text)?.trim().to_string();
    if output.is_empty() {
        output = test.status().message();
    }

    Ok(GradescopeTestCase::builder()
        .name(format!("{}: {}", test.id(), test.name()))
        .number(test.id().to_string())
        .score(test.earned_points())
        .max_score(test.points())
        .status(status)
        .output(output)
        .visibility(visibility)
        .build())
}

/// Renders `results.json` for a sink at `detail`. Individual tests are only
/// listed at summary detail or above.
pub fn render(tests: &[Testcase], detail: Detail) -> Result<String> {
    if detail == Detail::None {
        return Ok(String::new());
    }

    let summary = format!(
        "{} of {} points ({}%)",
        earned_points(tests),
        total_points(tests),
        percent(tests)
    );
    let entries = if detail >= Detail::Summary {
        let entries = tests
            .iter()
            .map(|test| test_entry(test, detail))
            .collect::<Result<Vec<_>>>()?;
        Some(entries)
    } else {
        None
    };

    let submission = GradescopeSubmission::builder()
        .score(earned_points(tests))
        .output(summary)
        .tests(entries)
        .build();

    let mut json =
        serde_json::to_string_pretty(&submission).context("Could not serialize results.json")?;
    json.push('\n');
    Ok(json)
}
