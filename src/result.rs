//! Normalized report results and data-quality advisories

use crate::model::ReportKind;
use serde::Serialize;

/// A typed report row with a fixed, documented column schema
pub trait ReportRow: Serialize {
    const COLUMNS: &'static [&'static str];
}

/// Advisory raised when a derived invariant does not hold.
///
/// Signals an upstream data-quality problem; the report is still returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InconsistentAggregate {
    /// A rate that should stay within 0..=100 went above 100
    RateAboveCeiling {
        report: ReportKind,
        subject: String,
        rate: f64,
        numerator: f64,
        denominator: f64,
    },
    /// Shares of a distribution do not add up to 100
    PercentageSumDrift {
        report: ReportKind,
        sum: f64,
        tolerance: f64,
    },
}

impl std::fmt::Display for InconsistentAggregate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InconsistentAggregate::RateAboveCeiling {
                report,
                subject,
                rate,
                numerator,
                denominator,
            } => write!(
                f,
                "{}: rate for {} is {}% ({} of {})",
                report, subject, rate, numerator, denominator
            ),
            InconsistentAggregate::PercentageSumDrift { report, sum, tolerance } => write!(
                f,
                "{}: percentages sum to {} (expected 100 ± {})",
                report, sum, tolerance
            ),
        }
    }
}

impl std::error::Error for InconsistentAggregate {}

impl InconsistentAggregate {
    pub(crate) fn log(&self) {
        log::warn!("⚠️  Inconsistent aggregate: {}", self);
    }
}

/// Outcome of one computation: rows under a fixed schema, or an explicit empty
/// set that still carries the schema
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NormalizedResult<T> {
    Rows {
        columns: &'static [&'static str],
        rows: Vec<T>,
        advisories: Vec<InconsistentAggregate>,
    },
    Empty {
        columns: &'static [&'static str],
    },
}

impl<T: ReportRow> NormalizedResult<T> {
    pub fn from_rows(rows: Vec<T>) -> Self {
        Self::with_advisories(rows, Vec::new())
    }

    pub fn with_advisories(rows: Vec<T>, advisories: Vec<InconsistentAggregate>) -> Self {
        for advisory in &advisories {
            advisory.log();
        }
        if rows.is_empty() {
            NormalizedResult::Empty { columns: T::COLUMNS }
        } else {
            NormalizedResult::Rows {
                columns: T::COLUMNS,
                rows,
                advisories,
            }
        }
    }
}

impl<T> NormalizedResult<T> {
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            NormalizedResult::Rows { columns, .. } | NormalizedResult::Empty { columns } => columns,
        }
    }

    pub fn rows(&self) -> &[T] {
        match self {
            NormalizedResult::Rows { rows, .. } => rows,
            NormalizedResult::Empty { .. } => &[],
        }
    }

    pub fn into_rows(self) -> Vec<T> {
        match self {
            NormalizedResult::Rows { rows, .. } => rows,
            NormalizedResult::Empty { .. } => Vec::new(),
        }
    }

    pub fn advisories(&self) -> &[InconsistentAggregate] {
        match self {
            NormalizedResult::Rows { advisories, .. } => advisories,
            NormalizedResult::Empty { .. } => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, NormalizedResult::Empty { .. })
    }

    pub fn len(&self) -> usize {
        self.rows().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize)]
    struct Pair {
        label: String,
        value: u64,
    }

    impl ReportRow for Pair {
        const COLUMNS: &'static [&'static str] = &["label", "value"];
    }

    #[test]
    fn test_no_rows_is_explicit_empty_with_schema() {
        let result: NormalizedResult<Pair> = NormalizedResult::from_rows(Vec::new());
        assert!(result.is_empty());
        assert_eq!(result.columns(), &["label", "value"]);
        assert!(result.rows().is_empty());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["outcome"], "empty");
        assert_eq!(json["columns"][1], "value");
    }

    #[test]
    fn test_rows_serialize_with_outcome_tag() {
        let result = NormalizedResult::from_rows(vec![Pair {
            label: "a".to_string(),
            value: 3,
        }]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["outcome"], "rows");
        assert_eq!(json["rows"][0]["value"], 3);
        assert_eq!(json["advisories"].as_array().unwrap().len(), 0);
    }
}
