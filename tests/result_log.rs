use checkgrade::{
    error::ConfigError,
    protocol::{ResultLog, decode_literal, encode_literal},
};

fn record(id: usize, text: &str, passed: bool, lhs: &str, rhs: &str, message: &str) -> String {
    format!(
        "CHECK {id}\nTEST {}\nRESULT {}\nLHS {lhs}\nRHS {rhs}\nMSG {}\n\n",
        encode_literal(text),
        u8::from(passed),
        encode_literal(message)
    )
}

#[test]
fn check_text_survives_the_round_trip() {
    let texts = [
        "x == 3",
        "name == \"Ada\"",
        "s == \"line one\\nline two\"",
        "lines == \"a\nb\"",
        "tab\there \\ and \"quotes\"",
        "nul \0 and bell \u{7}",
    ];
    for text in texts {
        assert_eq!(decode_literal(&encode_literal(text)).unwrap(), text);

        let log = ResultLog::parse(&record(0, text, true, "1", "1", ""), "log").unwrap();
        assert_eq!(log.entries[0].text, text);
    }
}

#[test]
fn records_are_read_in_order() {
    let text = format!(
        "{}{}{}SCORE 0\n",
        record(0, "x == 1", true, "1", "1", ""),
        record(1, "s == \"b\"", false, "\"a\"", "\"b\"", "s was \"a\""),
        record(1, "s == \"b\"", true, "\"b\"", "\"b\"", ""),
    );
    let log = ResultLog::parse(&text, "log").unwrap();

    assert_eq!(log.entries.len(), 3);
    assert_eq!(log.score, Some(0.0));
    assert_eq!(log.dropped_records, 0);

    let failed = &log.entries[1];
    assert_eq!(failed.check_id, 1);
    assert!(!failed.passed);
    assert_eq!(failed.lhs, "\"a\"");
    assert_eq!(failed.message, "s was \"a\"");
}

#[test]
fn a_crash_mid_record_drops_only_that_record() {
    let text = format!("{}CHECK 1\nTEST \"y\"\nRESULT 0\n", record(0, "x", true, "1", "N/A", ""));
    let log = ResultLog::parse(&text, "log").unwrap();
    assert_eq!(log.entries.len(), 1);
    assert_eq!(log.dropped_records, 1);
    assert_eq!(log.score, None);
}

#[test]
fn an_unterminated_last_line_is_ignored() {
    let log = ResultLog::parse("SCORE 5\nSCORE 1", "log").unwrap();
    assert_eq!(log.score, Some(5.0));
}

#[test]
fn protocol_violations_are_fatal() {
    let bad = [
        "WHAT 1\n",
        "RESULT 1\n",
        "CHECK x\n",
        "CHECK 0\nRESULT yes\n",
        "CHECK 0\nLHS 1\nLHS 2\n",
        "SCORE many\n",
    ];
    for text in bad {
        assert!(
            matches!(ResultLog::parse(text, "log"), Err(ConfigError::Protocol { .. })),
            "{text:?}"
        );
    }
}

#[test]
fn errors_point_at_the_line() {
    let error = ResultLog::parse("\nCHECK 0\nOOPS\n", "Test0-result.txt").unwrap_err();
    assert_eq!(
        error,
        ConfigError::Protocol {
            path:   "Test0-result.txt".into(),
            line:   3,
            reason: "unknown field `OOPS`".into(),
        }
    );
}
