use checkgrade::status::{Signals, Status};

fn ran(run_exit: i32, expected_exit: i32) -> Signals {
    Signals {
        compile_exit: Some(0),
        run_exit: Some(run_exit),
        expected_exit,
        checks_passed: true,
        ..Signals::default()
    }
}

#[test]
fn compile_failure_dominates_failed_checks() {
    let signals = Signals {
        compile_exit: Some(1),
        checks_passed: false,
        ..Signals::default()
    };
    assert_eq!(Status::classify(&signals), Status::CompileFailed);
}

#[test]
fn expected_non_zero_exit_can_pass() {
    assert_eq!(Status::classify(&ran(2, 2)), Status::Passed);
}

#[test]
fn unexpected_exit_codes() {
    assert_eq!(Status::classify(&ran(2, 0)), Status::RuntimeError);
    assert_eq!(
        Status::classify(&ran(0, 2)),
        Status::WrongExitCode {
            expected: 2,
            actual:   0,
        }
    );
    assert_eq!(
        Status::classify(&ran(0, 2)).label(),
        "Wrong exit code (expected 2 received 0)"
    );
}

#[test]
fn timeout_beats_everything_but_compilation() {
    let signals = Signals {
        compile_exit: Some(0),
        run_exit: None,
        timed_out: true,
        checks_passed: false,
        output_matched: Some(false),
        ..Signals::default()
    };
    assert_eq!(Status::classify(&signals), Status::TimedOut);
}

#[test]
fn checks_are_judged_before_output() {
    let mut signals = ran(0, 0);
    signals.output_matched = Some(false);
    assert_eq!(Status::classify(&signals), Status::OutputMismatch);

    signals.checks_passed = false;
    assert_eq!(Status::classify(&signals), Status::ChecksFailed);
}

#[test]
fn phases_that_never_ran_are_not_failures() {
    let signals = Signals {
        checks_passed: true,
        ..Signals::default()
    };
    assert_eq!(Status::classify(&signals), Status::Passed);
}

#[test]
fn points_are_all_or_nothing() {
    let outcomes = [
        Status::Passed,
        Status::CompileFailed,
        Status::TimedOut,
        Status::RuntimeError,
        Status::WrongExitCode {
            expected: 3,
            actual:   1,
        },
        Status::ChecksFailed,
        Status::OutputMismatch,
    ];
    for points in [0.0, 1.0, 7.5] {
        for status in outcomes {
            let expected = if status == Status::Passed { points } else { 0.0 };
            assert_eq!(status.earned_points(points), expected, "{status:?} at {points}");
        }
    }
}
