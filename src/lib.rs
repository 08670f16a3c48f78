//! # checkgrade
//!
//! An autograder for C++ assignments. A grading configuration describes how
//! student code is compiled and which testcases run against it; `CHECK(...)`
//! and `CHECK_TYPE(...)` markers inside testcase code become instrumented
//! assertions whose outcomes are reported at configurable levels of detail.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Check expressions: parsing, code generation and runtime records
pub mod check;
/// Reader for grading configurations
pub mod config;
/// A module defining a bunch of constant values to be used throughout
pub mod constants;
/// Fatal configuration errors
pub mod error;
/// Generate, compile, run and compare phases for one testcase
pub mod pipeline;
/// Spawning child processes with deadlines
pub mod process;
/// The line-oriented result log written by generated programs
pub mod protocol;
/// Report rendering for every detail level and encoding
pub mod report;
/// Lexical scanning of C++ snippets
pub mod scan;
/// Classification of testcase outcomes
pub mod status;
/// Testcases and their observed signals
pub mod testcase;
/// Utility functions for convenience
pub mod util;
/// `${name}` substitution
pub mod vars;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::{config::Plan, report::emit, util::shell_path};

/// Runs every testcase of `plan` in order and records each outcome in the run
/// log. Reports are not written.
pub async fn run_plan(plan: &mut Plan) -> Result<()> {
    plan.prepare()?;
    let shell = shell_path()?;

    for idx in 0..plan.testcases().len() {
        let test = &mut plan.testcases_mut()[idx];
        pipeline::run_testcase(test, &shell)
            .await
            .with_context(|| format!("Testcase {idx} could not be graded"))?;
        plan.log_result(&plan.testcases()[idx])?;
    }
    Ok(())
}

/// Grades the configuration at `config_path` and writes every configured
/// report.
///
/// * `config_path`: the grading configuration
/// * `comment_marker`: instructor comment marker, eg. `///`
pub async fn grade(config_path: &Path, comment_marker: &str) -> Result<Plan> {
    let mut plan = Plan::load(config_path, comment_marker)?;
    info!(
        "Loaded {} testcases and {} reports from {}",
        plan.testcases().len(),
        plan.outputs().len(),
        config_path.display()
    );

    run_plan(&mut plan).await?;

    let (tests, sinks) = plan.reports();
    emit(sinks, tests)?;
    Ok(plan)
}
