use std::{
    collections::BTreeSet,
    env::temp_dir,
    fs,
    time::{Duration, Instant},
};

use checkgrade::{
    check::{CheckExpression, CheckRecord},
    report::{
        Detail, Encoding, OutputSink,
        diff::{CHAR_DIFF_LIMIT, DiffSpan, SpanKind, diff_spans},
        render, render_sections,
        sections::{Section, plan_sections},
    },
    status::Signals,
    testcase::{TestPaths, Testcase},
};

fn signals(compile: i32, run: Option<i32>, timed_out: bool, checks: bool, output: bool) -> Signals {
    Signals {
        compile_exit: Some(compile),
        run_exit: run,
        timed_out,
        output_matched: Some(output),
        expected_exit: 0,
        checks_passed: checks,
    }
}

/// One testcase in each status, visible and hidden.
fn every_outcome() -> Vec<Testcase> {
    let outcomes = [
        signals(0, Some(0), false, true, true),
        signals(1, None, false, false, true),
        signals(0, None, true, false, true),
        signals(0, Some(139), false, false, true),
        signals(0, Some(0), false, false, true),
        signals(0, Some(0), false, true, false),
    ];

    let mut tests = Vec::new();
    for hidden in [false, true] {
        for outcome in outcomes {
            let mut test = Testcase::builder()
                .id(tests.len())
                .name(format!("case {}", tests.len()))
                .points(2.0)
                .hidden(hidden)
                .paths(TestPaths::default())
                .build();
            *test.signals_mut() = outcome;
            tests.push(test);
        }
    }
    tests
}

fn sections(test: &Testcase, detail: Detail) -> BTreeSet<Section> {
    plan_sections(test, detail).into_iter().collect()
}

#[test]
fn more_detail_never_shows_less() {
    for test in every_outcome() {
        let summary = sections(&test, Detail::Summary);
        let student = sections(&test, Detail::Student);
        let instructor = sections(&test, Detail::Instructor);
        let full = sections(&test, Detail::Full);
        let debug = sections(&test, Detail::Debug);

        assert!(summary.is_subset(&student), "{:?}", test.status());
        assert!(student.is_subset(&instructor), "{:?}", test.status());
        assert!(instructor.is_subset(&full), "{:?}", test.status());
        assert!(full.is_subset(&debug), "{:?}", test.status());
    }
}

#[test]
fn identical_outputs_diff_to_one_common_span() {
    let text = "line one\nline two\n\tindented\n";
    let spans = diff_spans(text, text);
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].kind, SpanKind::Common);
    assert_eq!(spans[0].text, text);
}

#[test]
fn diffs_cover_both_sides() {
    let spans = diff_spans("cat\n", "cut\n");
    let actual: String = spans
        .iter()
        .filter(|s| s.kind != SpanKind::Added)
        .map(|s| s.text.as_str())
        .collect();
    let expected: String = spans
        .iter()
        .filter(|s| s.kind != SpanKind::Deleted)
        .map(|s| s.text.as_str())
        .collect();
    assert_eq!(actual, "cat\n");
    assert_eq!(expected, "cut\n");
}

fn span(kind: SpanKind, text: &str) -> DiffSpan {
    DiffSpan {
        kind,
        text: text.to_string(),
    }
}

#[test]
fn outputs_at_the_limit_diff_by_character() {
    let body = "0123456789\n".repeat((CHAR_DIFF_LIMIT - 2) / 11);
    let actual = format!("A{body}B");
    let expected = format!("C{body}D");
    assert!(actual.len() <= CHAR_DIFF_LIMIT);

    assert_eq!(
        diff_spans(&actual, &expected),
        vec![
            span(SpanKind::Deleted, "A"),
            span(SpanKind::Added, "C"),
            span(SpanKind::Common, &body),
            span(SpanKind::Deleted, "B"),
            span(SpanKind::Added, "D"),
        ]
    );
}

#[test]
fn long_outputs_diff_by_line() {
    let lines = |changed: &str| {
        (0..3000)
            .map(|n| if n == 1500 { changed.to_string() } else { format!("line {n}\n") })
            .collect::<String>()
    };
    let actual = lines("line 1500\n");
    let expected = lines("line 1500!\n");
    assert!(actual.len() > CHAR_DIFF_LIMIT);

    let spans = diff_spans(&actual, &expected);
    assert_eq!(spans.len(), 4);
    assert_eq!(spans[1], span(SpanKind::Deleted, "line 1500\n"));
    assert_eq!(spans[2], span(SpanKind::Added, "line 1500!\n"));
    assert!(spans[0].text.starts_with("line 0\n"));
    assert!(spans[3].text.ends_with("line 2999\n"));
}

#[test]
fn large_unrelated_outputs_diff_quickly() {
    let actual: String = (0..2000).map(|n| format!("got {n:>5}\n")).collect();
    let expected: String = (0..2000).map(|n| format!("want {n:>4}\n")).collect();
    let single_line_actual = format!("x{}y", "m".repeat(19_000));
    let single_line_expected = format!("y{}x", "m".repeat(19_000));

    let started = Instant::now();
    let spans = diff_spans(&actual, &expected);
    let single = diff_spans(&single_line_actual, &single_line_expected);
    assert!(started.elapsed() < Duration::from_secs(10));

    let rebuilt: String = spans
        .iter()
        .filter(|s| s.kind != SpanKind::Added)
        .map(|s| s.text.as_str())
        .collect();
    assert_eq!(rebuilt, actual);
    assert_eq!(
        single,
        vec![
            span(SpanKind::Deleted, &single_line_actual),
            span(SpanKind::Added, &single_line_expected),
        ]
    );
}

#[test]
fn aggregate_levels() {
    let tests = every_outcome();
    let percent = OutputSink::new(Detail::Percent, Encoding::Text, None, None);
    let score = OutputSink::new(Detail::Score, Encoding::Text, None, None);
    let none = OutputSink::new(Detail::None, Encoding::Html, None, None);

    assert_eq!(render(&percent, &tests).unwrap(), "17%\n");
    assert_eq!(render(&score, &tests).unwrap(), "4 of 24\n");
    assert_eq!(render(&none, &tests).unwrap(), "");
}

#[test]
fn text_summary_lists_every_testcase() {
    let tests = every_outcome();
    let sink = OutputSink::new(Detail::Summary, Encoding::Text, None, None);
    let report = render(&sink, &tests).unwrap();

    assert!(report.starts_with("Autograde Summary"));
    assert!(report.contains("Final Score: 17%"));
    for label in [
        "Passing",
        "Compilation Error",
        "Timed Out",
        "Error During Run",
        "Checks Failing",
        "Incorrect Output",
        "TOTAL",
    ] {
        assert!(report.contains(label), "{label}");
    }
    assert!(!report.contains("TEST CASE"));
}

#[test]
fn hidden_details_need_instructor_eyes() {
    let tests = every_outcome();
    let hidden_crash = &tests[9];
    assert!(hidden_crash.hidden());

    let student = render_sections(hidden_crash, Detail::Student, Encoding::Text).unwrap();
    assert!(student.contains("FAILED due to run-time error."));
    assert!(!student.contains("RUN-TIME ERRORS"));
    assert!(!student.contains("[HIDDEN]"));

    let instructor = render_sections(hidden_crash, Detail::Instructor, Encoding::Text).unwrap();
    assert!(instructor.contains("[HIDDEN]"));
    assert!(instructor.contains("RUN-TIME ERRORS"));
}

#[test]
fn html_rows_link_to_details() {
    let tests = every_outcome();
    let sink = OutputSink::new(Detail::Student, Encoding::Html, None, None);
    let report = render(&sink, &tests).unwrap();
    assert!(report.starts_with("<h1>Autograde Results</h1>"));
    assert!(report.contains("window.location='#Test3'"));
    assert!(report.contains("<h2 id=\"Test3\">"));

    let linked = OutputSink::new(Detail::Summary, Encoding::Html, None, Some("full.html".into()));
    let report = render(&linked, &tests).unwrap();
    assert!(report.contains("window.location='full.html#Test0'"));
    assert!(!report.contains("<h2 id="));
}

#[test]
fn gradescope_results_follow_the_sink_detail() {
    let tests = every_outcome();

    let score_only = OutputSink::new(Detail::Score, Encoding::Json, None, None);
    let json: serde_json::Value = serde_json::from_str(&render(&score_only, &tests).unwrap()).unwrap();
    assert_eq!(json["score"], 4.0);
    assert!(json.get("tests").is_none());
    assert_eq!(json["output_format"], "text");
    assert_eq!(json["test_output_format"], "text");

    let student = OutputSink::new(Detail::Student, Encoding::Json, None, None);
    let json: serde_json::Value = serde_json::from_str(&render(&student, &tests).unwrap()).unwrap();
    let entries = json["tests"].as_array().unwrap();
    assert_eq!(entries.len(), tests.len());
    assert_eq!(entries[0]["status"], "passed");
    assert_eq!(entries[0]["score"], 2.0);
    assert_eq!(entries[1]["status"], "failed");
    assert_eq!(entries[1]["max_score"], 2.0);
    assert_eq!(entries[6]["visibility"], "after_published");
    assert_eq!(entries[0]["visibility"], "visible");
}

#[test]
fn failing_checks_are_explained() {
    let dir = temp_dir().join(format!("checkgrade-report-{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).unwrap();
    let stdout = dir.join("out.txt");
    let expected = dir.join("expected.txt");
    fs::write(&stdout, "Hello\n").unwrap();
    fs::write(&expected, "Hallo\n").unwrap();

    let expression = CheckExpression::parse("add(2, 2) == 4, \"add is off\"", "here").unwrap();
    let mut check = CheckRecord::new(0, 2, "here", expression);
    check.push(true, "4", "4", "");
    check.push(false, "5", "4", "add is off");

    let mut test = Testcase::builder()
        .id(0usize)
        .name("adding")
        .points(1.0)
        .paths(TestPaths {
            stdout: stdout.clone(),
            expected: Some(expected.clone()),
            ..TestPaths::default()
        })
        .code(vec!["int a = 2;".to_string(), "CHECK(add(2, 2) == 4, \"add is off\");".to_string()])
        .checks(vec![check])
        .build();
    test.update_checks_passed();
    test.signals_mut().compile_exit = Some(0);
    test.signals_mut().run_exit = Some(0);
    test.signals_mut().output_matched = Some(false);

    let report = render_sections(&test, Detail::Student, Encoding::Text).unwrap();
    assert!(report.contains("1 of 2 evaluations of `add(2, 2) == 4` passed."));
    assert!(report.contains("Error Message: add is off"));
    assert!(report.contains("Left side : add(2, 2)  ==>  5"));
    assert!(report.contains("Right side: 4          ==>  4"));
    assert!(report.contains(">> CHECK(add(2, 2) == 4"));
    assert!(!report.contains("YOUR OUTPUT"));

    // With checks passing, the output mismatch decides the status.
    let mut passing = test.clone();
    passing.signals_mut().checks_passed = true;
    let report = render_sections(&passing, Detail::Student, Encoding::Text).unwrap();
    assert!(report.contains("FAILED due to mis-matched output."));
    assert!(report.contains("H[-e-]{+a+}llo"));

    let html = render_sections(&passing, Detail::Student, Encoding::Html).unwrap();
    assert!(html.contains("background-color:LightCoral\">e</span>"));

    fs::remove_dir_all(&dir).unwrap();
}
