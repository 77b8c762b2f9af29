use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A required column is null.
    Missing,
    /// The normalizer could not coerce the value.
    Coercion,
    /// A domain rule rejected a well-typed value.
    Rule,
}

/// One failure reason for one field of one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFailure {
    /// Column key.
    pub column: String,
    pub kind: FailureKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    pub message: String,
}

impl fmt::Display for FieldFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.column, self.message)
    }
}

/// Verdict for a single record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// 0-based index of the record in the input.
    pub row: usize,
    /// Source line number.
    pub line: u64,
    pub verdict: Verdict,
    pub failures: Vec<FieldFailure>,
}

impl ValidationOutcome {
    pub fn from_failures(row: usize, line: u64, failures: Vec<FieldFailure>) -> Self {
        let verdict = if failures.is_empty() {
            Verdict::Accepted
        } else {
            Verdict::Rejected
        };
        Self {
            row,
            line,
            verdict,
            failures,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.verdict == Verdict::Accepted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileVerdict {
    Pass,
    Partial,
    Fail,
}

/// Outcomes for every record of one file, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub outcomes: Vec<ValidationOutcome>,
}

impl ValidationReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn accepted_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_accepted()).count()
    }

    pub fn rejected_count(&self) -> usize {
        self.total() - self.accepted_count()
    }

    /// Failure count per column key, sorted by key.
    pub fn failure_histogram(&self) -> BTreeMap<String, u64> {
        let mut histogram = BTreeMap::new();
        for failure in self.outcomes.iter().flat_map(|o| &o.failures) {
            *histogram.entry(failure.column.clone()).or_insert(0) += 1;
        }
        histogram
    }

    pub fn file_verdict(&self) -> FileVerdict {
        let accepted = self.accepted_count();
        if accepted == 0 {
            FileVerdict::Fail
        } else if accepted == self.total() {
            FileVerdict::Pass
        } else {
            FileVerdict::Partial
        }
    }

    pub fn rejected(&self) -> impl Iterator<Item = &ValidationOutcome> {
        self.outcomes.iter().filter(|o| !o.is_accepted())
    }
}
