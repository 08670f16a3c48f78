#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use serde::Serialize;

use super::parser::CheckExpression;

/// A check together with everything the test program reported about it.
///
/// A check inside a loop is evaluated many times; every evaluation appends one
/// entry to each of the four parallel vectors, so they always have the same
/// length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckRecord {
    /// Dense identifier, in source order, starting at 0.
    id:         usize,
    /// 1-based line of the marker within the testcase code.
    line:       usize,
    /// Human readable location, eg. `Testcase #2, Line 4 (check 1)`.
    location:   String,
    /// The parsed check.
    expression: CheckExpression,
    /// Outcome of each evaluation.
    outcomes:   Vec<bool>,
    /// Rendered left value of each evaluation.
    lhs_values: Vec<String>,
    /// Rendered right value of each evaluation.
    rhs_values: Vec<String>,
    /// Failure message of each evaluation (empty on success).
    messages:   Vec<String>,
}

/// A borrowed view of one evaluation of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation<'a> {
    /// Index of this evaluation, 0-based.
    pub index:   usize,
    /// Whether the check held.
    pub passed:  bool,
    /// Rendered left value.
    pub lhs:     &'a str,
    /// Rendered right value.
    pub rhs:     &'a str,
    /// Failure message, empty on success.
    pub message: &'a str,
}

impl CheckRecord {
    /// Creates a record with no evaluations yet.
    pub fn new(
        id: usize,
        line: usize,
        location: impl Into<String>,
        expression: CheckExpression,
    ) -> Self {
        Self {
            id,
            line,
            location: location.into(),
            expression,
            outcomes: Vec::new(),
            lhs_values: Vec::new(),
            rhs_values: Vec::new(),
            messages: Vec::new(),
        }
    }

    /// Appends one evaluation. Values are trimmed.
    pub fn push(&mut self, passed: bool, lhs: &str, rhs: &str, message: &str) {
        self.outcomes.push(passed);
        self.lhs_values.push(lhs.trim().to_string());
        self.rhs_values.push(rhs.trim().to_string());
        self.messages.push(message.trim().to_string());
    }

    /// Returns the check identifier.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns the 1-based line of the marker in the testcase code.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Returns the location string used in diagnostics.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Returns the parsed check.
    pub fn expression(&self) -> &CheckExpression {
        &self.expression
    }

    /// Number of recorded evaluations.
    pub fn num_evaluations(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of evaluations that passed.
    pub fn count_passed_evaluations(&self) -> usize {
        self.outcomes.iter().filter(|passed| **passed).count()
    }

    /// True when the check ran at least once and every evaluation passed. A
    /// check that never ran (eg. the program crashed first) has not passed.
    pub fn passed(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|passed| *passed)
    }

    /// True when at least one evaluation passed.
    pub fn passed_any(&self) -> bool {
        self.outcomes.iter().any(|passed| *passed)
    }

    /// Iterates over the recorded evaluations in order.
    pub fn evaluations(&self) -> impl Iterator<Item = Evaluation<'_>> {
        self.outcomes
            .iter()
            .zip(&self.lhs_values)
            .zip(&self.rhs_values)
            .zip(&self.messages)
            .enumerate()
            .map(|(index, (((passed, lhs), rhs), message))| Evaluation {
                index,
                passed: *passed,
                lhs,
                rhs,
                message,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CheckRecord {
        let expr = CheckExpression::parse("f(i) > 0", "test").unwrap();
        CheckRecord::new(0, 1, "test", expr)
    }

    #[test]
    fn never_evaluated_checks_have_not_passed() {
        let record = record();
        assert!(!record.passed());
        assert!(!record.passed_any());
    }

    #[test]
    fn passed_requires_every_evaluation() {
        let mut record = record();
        record.push(true, "1", "0", "");
        record.push(false, " -1 ", "0", "i was 3");
        assert!(!record.passed());
        assert!(record.passed_any());
        assert_eq!(record.count_passed_evaluations(), 1);

        let failing = record.evaluations().nth(1).unwrap();
        assert_eq!(failing.lhs, "-1");
        assert_eq!(failing.message, "i was 3");
    }
}
