use checkgrade::{
    check::{CheckExpression, CheckKind, Comparator},
    error::ConfigError,
    pipeline::program::instrument_body,
};

fn parse(body: &str) -> Result<CheckExpression, ConfigError> {
    CheckExpression::parse(body, "Testcase #0, line 1 (check 0)")
}

#[test]
fn comparisons_split_into_trimmed_operands() {
    let cases = [
        ("x +1 <= y", "x +1", "<=", "y"),
        ("a == b", "a", "==", "b"),
        ("f(1, 2)!=  g(3)", "f(1, 2)", "!=", "g(3)"),
        (" v.size() > 0 ", "v.size()", ">", "0"),
        ("s >= \"a<b\"", "s", ">=", "\"a<b\""),
        ("n < 10", "n", "<", "10"),
    ];
    for (body, lhs, comparator, rhs) in cases {
        let check = parse(body).unwrap();
        assert_eq!(check.lhs(), lhs, "{body}");
        assert_eq!(check.comparator(), comparator, "{body}");
        assert_eq!(check.rhs(), rhs, "{body}");
        assert!(check.has_comparison());
    }
}

#[test]
fn plain_checks_have_no_comparator() {
    let check = parse("is_sorted(v)").unwrap();
    assert_eq!(check.comparator(), "");
    assert_eq!(check.lhs(), "is_sorted(v)");
    assert_eq!(check.rhs(), "");
    assert!(matches!(check.kind(), CheckKind::Truthy { .. }));
}

#[test]
fn extra_arguments_become_the_message() {
    let check = parse("x == 3, \"x is \", x").unwrap();
    assert_eq!(check.raw(), "x == 3");
    assert_eq!(check.messages(), ["\"x is \"", "x"]);
    assert!(matches!(
        check.kind(),
        CheckKind::Compare {
            op: Comparator::Eq,
            ..
        }
    ));
}

#[test]
fn logical_operators_are_rejected() {
    for body in ["a && b", "a || b", "(a == 1) && (b == 2)", "f(a || b)"] {
        assert!(
            matches!(parse(body), Err(ConfigError::CompositeCheck { .. })),
            "{body}"
        );
    }
    assert!(parse("s == \"a && b\"").is_ok());
}

#[test]
fn chained_comparisons_are_rejected() {
    for body in ["a < b < c", "a == b == c", "x <= y != z"] {
        assert!(
            matches!(parse(body), Err(ConfigError::MultipleComparisons { .. })),
            "{body}"
        );
    }
}

#[test]
fn empty_sides_and_bodies_are_rejected() {
    assert!(matches!(parse("== 3"), Err(ConfigError::EmptyOperand { .. })));
    assert!(matches!(parse("x !="), Err(ConfigError::EmptyOperand { .. })));
    assert!(matches!(parse(""), Err(ConfigError::EmptyCheck { .. })));
}

#[test]
fn type_checks_need_two_arguments() {
    let check = CheckExpression::parse_type("v.size(), size_t", "here").unwrap();
    assert_eq!(check.comparator(), "TYPE");
    assert_eq!(check.rhs(), "size_t");
    assert!(matches!(
        CheckExpression::parse_type("v.size()", "here"),
        Err(ConfigError::TypeCheckArity { .. })
    ));
}

#[test]
fn type_checks_need_both_operands() {
    for body in [", int", "x, ", " , "] {
        match CheckExpression::parse_type(body, "here") {
            Err(ConfigError::EmptyOperand { comparator, .. }) => assert_eq!(comparator, "TYPE"),
            other => panic!("`{body}` parsed as {other:?}"),
        }
    }
}

#[test]
fn instrumented_checks_are_numbered_in_source_order() {
    let code = "CHECK(a == 1);\nCHECK_TYPE(a, int);\n// CHECK(not == a check)\nCHECK(b);";
    let (body, checks) = instrument_body(code, 4).unwrap();

    let raw: Vec<_> = checks.iter().map(|c| c.expression().raw()).collect();
    assert_eq!(raw, ["a == 1", "TYPE(a) == int", "b"]);
    assert_eq!(checks.iter().map(|c| c.line()).collect::<Vec<_>>(), [1, 2, 4]);
    assert_eq!(checks[2].location(), "Testcase #4, line 4 (check 2)");
    assert!(body.contains("// CHECK(not == a check)"));
    assert!(!body.contains("CHECK(a == 1)"));
}

#[test]
fn errors_name_their_location() {
    let error = instrument_body("int x;\nCHECK(a < b < c);", 2).unwrap_err();
    assert!(error.to_string().starts_with("Testcase #2, line 2 (check 0)"));
}
