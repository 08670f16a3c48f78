#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Runs one testcase through generate, compile, run, compare and record.
//!
//! Grading outcomes never surface as errors here; they end up in the
//! testcase's [`Signals`](crate::status::Signals). An `Err` means the run as a
//! whole cannot continue (broken configuration, unwritable directory, ...).

/// Builds the generated C++ program.
pub mod program;

use std::{
    ffi::{OsStr, OsString},
    fs,
    path::Path,
};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::{
    process::{StdinSource, run_collect},
    protocol::ResultLog,
    testcase::Testcase,
    util::{append_file, read_text, remove_if_exists, write_file},
};

/// Normalizes program output for comparison. Blank lines are always dropped;
/// case is folded unless `match_case`, and all whitespace is removed unless
/// `match_space`.
pub fn normalize_output(text: &str, match_case: bool, match_space: bool) -> Vec<String> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let line = if match_case {
                line.to_string()
            } else {
                line.to_lowercase()
            };
            if match_space {
                line
            } else {
                line.chars().filter(|c| !c.is_whitespace()).collect()
            }
        })
        .collect()
}

/// Shell command that runs the built program with its arguments.
fn run_command(executable: &Path, args: &str) -> String {
    let mut exe = executable.display().to_string();
    if executable.components().count() == 1 && !executable.is_absolute() {
        exe = format!("./{exe}");
    }

    let mut command = format!("exec {}", snailquote::escape(&exe));
    if !args.trim().is_empty() {
        command.push(' ');
        command.push_str(args.trim());
    }
    command
}

/// Writes the generated program and clears artifacts of earlier runs.
fn generate(test: &Testcase) -> Result<()> {
    let paths = test.paths();
    let source = program::assemble(
        test.header(),
        test.instrumented(),
        &paths.result,
        test.points(),
        test.options().run_main,
    );
    write_file(&paths.source, source)?;

    for stale in [&paths.result, &paths.stdout, &paths.stderr, &paths.executable] {
        remove_if_exists(stale)?;
    }
    Ok(())
}

/// Runs the compile commands in order, stopping at the first failure.
/// Returns the exit code of the failing command, or 0.
async fn compile(test: &Testcase, shell: &OsStr) -> Result<i32> {
    let log = &test.paths().compile_log;
    write_file(log, "")?;

    for line in test.compile() {
        debug!("Testcase {}: $ {line}", test.id());
        let out = run_collect(
            shell,
            &[OsString::from("-c"), OsString::from(line)],
            StdinSource::Null,
            None,
            None,
        )
        .await
        .with_context(|| format!("Could not run compile command `{line}`"))?;

        append_file(log, format!("$ {line}\n"))?;
        append_file(log, &out.stdout)?;
        append_file(log, &out.stderr)?;

        let code = out.exit_code().unwrap_or(-1);
        if code != 0 {
            return Ok(code);
        }
    }
    Ok(0)
}

/// Runs the built program under the testcase's deadline and stores its
/// output.
async fn run(test: &mut Testcase, shell: &OsStr) -> Result<()> {
    let paths = test.paths().clone();
    let stdin = match &paths.input {
        Some(input) => StdinSource::Bytes(
            fs::read(input)
                .with_context(|| format!("Could not read input file {}", input.display()))?,
        ),
        None => StdinSource::Null,
    };

    let command = run_command(&paths.executable, test.args());
    debug!("Testcase {}: $ {command}", test.id());
    let out = run_collect(
        shell,
        &[OsString::from("-c"), OsString::from(command)],
        stdin,
        None,
        Some(test.options().timeout),
    )
    .await
    .with_context(|| format!("Could not run {}", paths.executable.display()))?;

    write_file(&paths.stdout, &out.stdout)?;
    write_file(&paths.stderr, &out.stderr)?;

    let signals = test.signals_mut();
    signals.timed_out = out.timed_out;
    signals.run_exit = out.exit_code();
    Ok(())
}

/// Compares captured output with the expected output, when there is one.
fn compare(test: &mut Testcase) -> Result<()> {
    let Some(expected) = test.paths().expected.clone() else {
        return Ok(());
    };

    let options = test.options();
    let actual = read_text(&test.paths().stdout)?;
    let expected = fs::read(&expected)
        .with_context(|| format!("Could not read expected output {}", expected.display()))?;
    let expected = String::from_utf8_lossy(&expected);

    let matched = normalize_output(&actual, options.match_case, options.match_space)
        == normalize_output(&expected, options.match_case, options.match_space);
    test.signals_mut().output_matched = Some(matched);
    Ok(())
}

/// Runs `test` through every phase that applies.
///
/// * `test`: a fully configured testcase
/// * `shell`: shell used for compile commands and to start the program
pub async fn run_testcase(test: &mut Testcase, shell: &OsStr) -> Result<()> {
    let expected_exit = test.expected_exit();
    test.signals_mut().expected_exit = expected_exit;

    info!("Testcase {}: generating {}", test.id(), test.paths().source.display());
    generate(test)?;

    info!("Testcase {}: compiling", test.id());
    let compile_exit = compile(test, shell).await?;
    test.signals_mut().compile_exit = Some(compile_exit);
    if compile_exit != 0 {
        test.update_checks_passed();
        info!("Testcase {}: {}", test.id(), test.status().message());
        return Ok(());
    }

    info!("Testcase {}: running", test.id());
    run(test, shell).await?;

    if !test.signals().timed_out {
        compare(test)?;
    }

    let log = ResultLog::read(&test.paths().result)?;
    test.apply_log(&log)?;

    info!("Testcase {}: {}", test.id(), test.status().message());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_never_count() {
        assert_eq!(
            normalize_output("a\n\n  \nb\n", true, true),
            normalize_output("a\nb", true, true)
        );
    }

    #[test]
    fn case_and_space_folding() {
        assert_eq!(normalize_output("Hello World", false, false), vec!["helloworld"]);
        assert_eq!(normalize_output("Hello World", true, false), vec!["HelloWorld"]);
        assert_ne!(
            normalize_output("a b", true, true),
            normalize_output("a  b", true, true)
        );
    }

    #[test]
    fn bare_executables_get_a_path_prefix() {
        assert_eq!(run_command(Path::new("Test1.exe"), ""), "exec ./Test1.exe");
        let quoted = run_command(Path::new("out dir/Test1.exe"), " 1 2 ");
        assert!(quoted.starts_with("exec "));
        assert!(!quoted.starts_with("exec out dir"));
        assert!(quoted.ends_with(" 1 2"));
    }
}
