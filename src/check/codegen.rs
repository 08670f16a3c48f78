#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Turns a parsed check into a self-reporting C++ block.
//!
//! The block relies on three locals declared by the surrounding generated
//! function (see [`crate::pipeline::program`]): `_checkgrade_results` (the
//! result log stream), `_checkgrade_passed` and `_checkgrade_check_count`.
//! Every block writes exactly one record in the format read by
//! [`crate::protocol`], and flushes it right away.

use super::parser::{CheckExpression, CheckKind};
use crate::{
    constants::NO_RHS,
    protocol::{cpp_string_literal, encode_literal},
};

/// True for plain numeric literals such as `3`, `-2.5` or `10u`.
fn is_numeric_literal(text: &str) -> bool {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    digits.chars().next().is_some_and(|c| c.is_ascii_digit() || c == '.')
        && digits
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '\''))
        && digits.chars().any(|c| c.is_ascii_digit())
}

/// Returns the C++ statements for check `id`.
pub fn instrument(id: usize, check: &CheckExpression) -> String {
    let mut out = String::new();

    let (lhs_render, rhs_render) = match check.kind() {
        CheckKind::Truthy { expr } => {
            out.push_str(&format!("  // CHECK #{id}\n  {{\n"));
            out.push_str(&format!("    auto _checkgrade_lhs = {expr};\n"));
            out.push_str("    bool _checkgrade_success = static_cast<bool>(_checkgrade_lhs);\n");
            ("_checkgrade_render(_checkgrade_lhs)".to_string(), cpp_string_literal(NO_RHS))
        }
        CheckKind::Compare { lhs, op, rhs } => {
            out.push_str(&format!("  // CHECK #{id}\n  {{\n"));
            out.push_str(&format!("    auto _checkgrade_lhs = {lhs};\n"));
            out.push_str(&format!("    auto _checkgrade_rhs = {rhs};\n"));
            // Comparing against the literal itself keeps integer promotions
            // the same as in the student's own expression.
            let right = if is_numeric_literal(rhs) {
                rhs.as_str()
            } else {
                "_checkgrade_rhs"
            };
            out.push_str(&format!(
                "    bool _checkgrade_success = (_checkgrade_lhs {op} {right});\n"
            ));
            (
                "_checkgrade_render(_checkgrade_lhs)".to_string(),
                "_checkgrade_render(_checkgrade_rhs)".to_string(),
            )
        }
        CheckKind::TypeMatch { expr, type_name } => {
            out.push_str(&format!("  // CHECK #{id} (CHECK_TYPE)\n  {{\n"));
            out.push_str(&format!("    using _checkgrade_type1 = decltype({expr});\n"));
            out.push_str(&format!("    using _checkgrade_type2 = {type_name};\n"));
            out.push_str(
                "    std::string _checkgrade_lhs = _checkgrade_type_name<_checkgrade_type1>();\n",
            );
            out.push_str(
                "    std::string _checkgrade_rhs = _checkgrade_type_name<_checkgrade_type2>();\n",
            );
            out.push_str(
                "    bool _checkgrade_success = std::is_same<_checkgrade_type1, \
                 _checkgrade_type2>::value;\n",
            );
            (
                "_checkgrade_escape(_checkgrade_lhs)".to_string(),
                "_checkgrade_escape(_checkgrade_rhs)".to_string(),
            )
        }
    };

    out.push_str("    _checkgrade_passed = _checkgrade_passed && _checkgrade_success;\n");
    out.push_str("    ++_checkgrade_check_count;\n");
    out.push_str("    std::string _checkgrade_msg;\n");
    out.push_str("    if (!_checkgrade_success) {\n");
    out.push_str("      std::stringstream _checkgrade_ss;\n");
    for message in check.messages() {
        out.push_str(&format!("      _checkgrade_ss << {message};\n"));
    }
    out.push_str("      _checkgrade_msg = _checkgrade_ss.str();\n");
    out.push_str("    }\n");

    out.push_str(&format!("    _checkgrade_results << \"CHECK {id}\\n\"\n"));
    out.push_str(&format!(
        "      << \"TEST \" << {} << \"\\n\"\n",
        cpp_string_literal(&encode_literal(check.raw()))
    ));
    out.push_str("      << \"RESULT \" << (_checkgrade_success ? 1 : 0) << \"\\n\"\n");
    out.push_str(&format!("      << \"LHS \" << {lhs_render} << \"\\n\"\n"));
    out.push_str(&format!("      << \"RHS \" << {rhs_render} << \"\\n\"\n"));
    out.push_str("      << \"MSG \" << _checkgrade_literal(_checkgrade_msg) << \"\\n\\n\"\n");
    out.push_str("      << std::flush;\n");
    out.push_str("  }\n");

    out
}
