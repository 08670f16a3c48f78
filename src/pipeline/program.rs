#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Builds the complete C++ test program for one testcase.

use std::path::Path;

use tracing::debug;

use crate::{
    check::{CheckExpression, CheckRecord, instrument},
    constants::{CHECK_MARKER, CHECK_TYPE_MARKER, PRELUDE},
    error::ConfigError,
    protocol::cpp_string_literal,
    scan::find_markers,
};

/// Replaces every `CHECK(...)` and `CHECK_TYPE(...)` in `code` by its
/// verification block.
///
/// Identifiers are handed out in source order across both markers. Returns the
/// instrumented code and one empty record per check.
pub fn instrument_body(
    code: &str,
    test_id: usize,
) -> Result<(String, Vec<CheckRecord>), ConfigError> {
    let markers = find_markers(code, &[CHECK_MARKER, CHECK_TYPE_MARKER])?;

    let mut body = String::with_capacity(code.len() * 2);
    let mut records: Vec<CheckRecord> = Vec::new();
    let mut copied = 0;

    for marker in markers {
        // A marker nested inside another one is part of that check's text.
        if marker.span.start < copied {
            continue;
        }

        let id = records.len();
        let location = format!("Testcase #{test_id}, line {} (check {id})", marker.line);
        let expression = if marker.name == CHECK_TYPE_MARKER {
            CheckExpression::parse_type(&marker.body, &location)?
        } else {
            CheckExpression::parse(&marker.body, &location)?
        };
        debug!("{location}: {:?}", expression.kind());

        body.push_str(&code[copied..marker.span.start]);
        body.push_str(&instrument(id, &expression));
        copied = marker.span.end;

        records.push(CheckRecord::new(id, marker.line, location, expression));
    }
    body.push_str(&code[copied..]);

    Ok((body, records))
}

/// Assembles the generated program.
///
/// * `header`: configured header lines, usually `#include`s of student code
/// * `body`: output of [`instrument_body`]
/// * `result_path`: where the program writes its result log
/// * `points`: value written on the `SCORE` line when every check passed
/// * `run_main`: whether the tested program's `main` runs after the checks
pub fn assemble(
    header: &[String],
    body: &str,
    result_path: &Path,
    points: f64,
    run_main: bool,
) -> String {
    let mut out = String::new();
    out.push_str(PRELUDE);
    out.push('\n');

    for line in header {
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');

    out.push_str("void _checkgrade_main() {\n");
    out.push_str(&format!(
        "  std::ofstream _checkgrade_results({});\n",
        cpp_string_literal(&result_path.display().to_string())
    ));
    out.push_str("  bool _checkgrade_passed = true;\n");
    out.push_str("  [[maybe_unused]] std::size_t _checkgrade_check_count = 0;\n\n");
    out.push_str(body);
    out.push_str("\n\n");
    out.push_str(&format!(
        "  _checkgrade_results << \"SCORE \" << (_checkgrade_passed ? {points:?} : 0.0) << \
         \"\\n\" << std::flush;\n"
    ));
    out.push_str("}\n\n");

    out.push_str("// Runs the checks before main().\n");
    out.push_str("struct _checkgrade_runner {\n");
    out.push_str("  _checkgrade_runner() {\n");
    out.push_str("    _checkgrade_main();\n");
    if !run_main {
        out.push_str("    std::exit(0);\n");
    }
    out.push_str("  }\n");
    out.push_str("};\n\n");
    out.push_str("static _checkgrade_runner _checkgrade_runner_instance;\n");

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_follow_source_order_across_markers() {
        let code = "int x = 2;\nCHECK_TYPE(x, int);\nCHECK(x == 2, \"x is \", x);\nCHECK(x);";
        let (body, records) = instrument_body(code, 3).unwrap();
        let ids: Vec<_> = records.iter().map(|r| (r.id(), r.line())).collect();
        assert_eq!(ids, vec![(0, 2), (1, 3), (2, 4)]);
        assert_eq!(records[0].expression().comparator(), "TYPE");
        assert_eq!(records[1].location(), "Testcase #3, line 3 (check 1)");
        assert!(body.contains("// CHECK #2"));
        assert!(!body.contains("CHECK(x"));
    }

    #[test]
    fn check_errors_carry_their_location() {
        let err = instrument_body("\n\nCHECK(a && b);", 7).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Testcase #7, line 3 (check 0): Unit test checks do not allow \"&&\" or \"||\"."
        );
    }

    #[test]
    fn suppressed_main_exits_from_the_runner() {
        let program = assemble(&["#include \"a.cpp\"".into()], "", Path::new("r.txt"), 2.0, false);
        assert!(program.contains("#include \"a.cpp\""));
        assert!(program.contains("_checkgrade_results(\"r.txt\")"));
        assert!(program.contains("(_checkgrade_passed ? 2.0 : 0.0)"));
        assert!(program.contains("std::exit(0);"));

        let program = assemble(&[], "", Path::new("r.txt"), 2.0, true);
        assert!(!program.contains("std::exit(0);"));
    }
}
