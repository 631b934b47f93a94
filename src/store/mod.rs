//! Data store accessor seam
//!
//! The analytics core never talks to a database directly. Every computation
//! hands a [`QueryDescriptor`] (static SQL plus bound parameters) to a
//! [`QueryExecutor`] and receives typed [`Row`]s back.
//!
//! ```text
//! AggregationEngine ──► DataStore::execute        (independent reads)
//! KpiSynthesizer    ──► DataStore::snapshot ──► Snapshot::execute (one point in time)
//! ```

pub mod sqlite;

pub use sqlite::SqliteStore;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// Label reported in place of a NULL grouping or descriptive column
pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug)]
pub enum DataAccessError {
    /// Store could not be reached (cannot open, busy, locked, I/O failure)
    Unreachable { query: &'static str, reason: String },
    /// Store was reached but refused the statement
    QueryRejected { query: &'static str, reason: String },
    /// A returned row did not match the schema the computation expects
    Decode { query: &'static str, column: String, reason: String },
}

impl DataAccessError {
    pub fn query(&self) -> &'static str {
        match self {
            DataAccessError::Unreachable { query, .. }
            | DataAccessError::QueryRejected { query, .. }
            | DataAccessError::Decode { query, .. } => query,
        }
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, DataAccessError::Unreachable { .. })
    }
}

impl std::fmt::Display for DataAccessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataAccessError::Unreachable { query, reason } => {
                write!(f, "Store unreachable while running {}: {}", query, reason)
            }
            DataAccessError::QueryRejected { query, reason } => {
                write!(f, "Query {} rejected: {}", query, reason)
            }
            DataAccessError::Decode { query, column, reason } => {
                write!(f, "Cannot decode column {} of {}: {}", column, query, reason)
            }
        }
    }
}

impl std::error::Error for DataAccessError {}

/// Typed cell value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Integer(_) => "INTEGER",
            Value::Real(_) => "REAL",
            Value::Text(_) => "TEXT",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

/// One result row: column name to value, in select-list order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    query: &'static str,
    cells: Vec<(String, Value)>,
}

impl Row {
    pub fn new(query: &'static str, cells: Vec<(String, Value)>) -> Self {
        Self { query, cells }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    fn require(&self, column: &str) -> Result<&Value, DataAccessError> {
        self.get(column)
            .ok_or_else(|| self.decode_error(column, "column missing from result".to_string()))
    }

    fn decode_error(&self, column: &str, reason: String) -> DataAccessError {
        DataAccessError::Decode {
            query: self.query,
            column: column.to_string(),
            reason,
        }
    }

    pub fn i64(&self, column: &str) -> Result<i64, DataAccessError> {
        match self.require(column)? {
            Value::Integer(v) => Ok(*v),
            other => Err(self.decode_error(column, format!("expected INTEGER, got {}", other.kind()))),
        }
    }

    /// Numeric column; integers widen, NULL reads as 0 (SUM over no rows)
    pub fn f64(&self, column: &str) -> Result<f64, DataAccessError> {
        match self.require(column)? {
            Value::Integer(v) => Ok(*v as f64),
            Value::Real(v) => Ok(*v),
            Value::Null => Ok(0.0),
            other => Err(self.decode_error(column, format!("expected number, got {}", other.kind()))),
        }
    }

    /// Non-negative count column
    pub fn count(&self, column: &str) -> Result<u64, DataAccessError> {
        let raw = self.i64(column)?;
        u64::try_from(raw).map_err(|_| self.decode_error(column, format!("negative count {}", raw)))
    }

    /// Text column; numbers under TEXT affinity read back as their decimal form
    pub fn text(&self, column: &str) -> Result<String, DataAccessError> {
        match self.require(column)? {
            Value::Text(s) => Ok(s.clone()),
            Value::Integer(v) => Ok(v.to_string()),
            Value::Real(v) => Ok(v.to_string()),
            other => Err(self.decode_error(column, format!("expected TEXT, got {}", other.kind()))),
        }
    }

    /// Grouping or descriptive column; NULL reads as [`UNKNOWN_LABEL`]
    pub fn label(&self, column: &str) -> Result<String, DataAccessError> {
        Ok(self
            .opt_text(column)?
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string()))
    }

    pub fn opt_text(&self, column: &str) -> Result<Option<String>, DataAccessError> {
        match self.require(column)? {
            Value::Null => Ok(None),
            _ => self.text(column).map(Some),
        }
    }
}

/// Parameterized statement. `sql` only ever holds fixed fragments; caller
/// input travels in `params`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    pub name: &'static str,
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryDescriptor {
    pub fn new(name: &'static str, sql: &str) -> Self {
        Self {
            name,
            sql: sql.to_string(),
            params: Vec::new(),
        }
    }

    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }
}

/// Incremental builder for filtered queries.
///
/// Placeholders are anonymous `?`, so parameters must be pushed in the same
/// order their fragments are appended.
#[derive(Debug)]
pub struct SqlBuilder {
    name: &'static str,
    sql: String,
    params: Vec<Value>,
    has_where: bool,
}

impl SqlBuilder {
    pub fn new(name: &'static str, base: &str) -> Self {
        Self {
            name,
            sql: base.trim_end().to_string(),
            params: Vec::new(),
            has_where: false,
        }
    }

    /// Bind a parameter used by a placeholder already present in the base SQL
    pub fn bind(&mut self, value: impl Into<Value>) -> &mut Self {
        self.params.push(value.into());
        self
    }

    /// Append `AND <condition>` (or `WHERE` for the first one) with its parameters
    pub fn filter(&mut self, condition: &str, values: Vec<Value>) -> &mut Self {
        self.sql.push_str(if self.has_where { "\n  AND " } else { "\nWHERE " });
        self.sql.push_str(condition);
        self.params.extend(values);
        self.has_where = true;
        self
    }

    /// Append a trailing clause (GROUP BY, ORDER BY, LIMIT ...)
    pub fn tail(&mut self, clause: &str) -> &mut Self {
        self.sql.push('\n');
        self.sql.push_str(clause.trim());
        self
    }

    pub fn build(&self) -> QueryDescriptor {
        QueryDescriptor {
            name: self.name,
            sql: self.sql.clone(),
            params: self.params.clone(),
        }
    }
}

/// `%term%` pattern for `LIKE ... ESCAPE '\'`, with LIKE metacharacters escaped
pub fn like_contains(term: &str) -> Value {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    Value::Text(pattern)
}

/// Bind a calendar date as `YYYY-MM-DD` text.
///
/// Dates are clamped to four-digit years so SQLite's text comparison keeps
/// calendar order.
pub fn date_param(date: NaiveDate) -> Value {
    if date.year() < 0 {
        Value::from("0000-01-01")
    } else if date.year() > 9999 {
        Value::from("9999-12-31")
    } else {
        Value::Text(date.format("%Y-%m-%d").to_string())
    }
}

/// Executes one parameterized query and returns its rows in order
pub trait QueryExecutor {
    fn execute(&self, query: &QueryDescriptor) -> Result<Vec<Row>, DataAccessError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadConsistency {
    /// Every read in the scope observes the same committed state
    PointInTime,
    /// Reads may observe writes committed between them
    BestEffort,
}

/// Read scope used when several computations must agree on one data version
pub trait Snapshot: QueryExecutor {
    fn consistency(&self) -> ReadConsistency;
}

/// Shared accessor. Independent `execute` calls may run concurrently.
pub trait DataStore: QueryExecutor + Send + Sync {
    fn snapshot(&self) -> Result<Box<dyn Snapshot + '_>, DataAccessError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_orders_params_with_fragments() {
        let mut builder = SqlBuilder::new("test", "SELECT * FROM providers p");
        builder
            .filter("p.city = ?", vec!["Lyon".into()])
            .filter("p.type = ?", vec!["Bakery".into()])
            .tail("ORDER BY p.name");
        let query = builder.build();

        assert_eq!(
            query.sql,
            "SELECT * FROM providers p\nWHERE p.city = ?\n  AND p.type = ?\nORDER BY p.name"
        );
        assert_eq!(query.params, vec![Value::from("Lyon"), Value::from("Bakery")]);
    }

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_contains("50%_off\\"), Value::from("%50\\%\\_off\\\\%"));
        assert_eq!(like_contains("bread"), Value::from("%bread%"));
    }

    #[test]
    fn test_row_accessors() {
        let row = Row::new(
            "test",
            vec![
                ("name".to_string(), Value::from("Food Bank")),
                ("claims".to_string(), Value::Integer(4)),
                ("quantity".to_string(), Value::Integer(12)),
                ("received".to_string(), Value::Null),
                ("contact".to_string(), Value::Null),
            ],
        );

        assert_eq!(row.text("name").unwrap(), "Food Bank");
        assert_eq!(row.count("claims").unwrap(), 4);
        assert_eq!(row.f64("quantity").unwrap(), 12.0);
        assert_eq!(row.f64("received").unwrap(), 0.0);
        assert_eq!(row.opt_text("contact").unwrap(), None);
        assert!(matches!(row.i64("missing"), Err(DataAccessError::Decode { .. })));
        assert!(matches!(row.i64("name"), Err(DataAccessError::Decode { .. })));
    }

    #[test]
    fn test_null_and_numeric_text() {
        let row = Row::new(
            "test",
            vec![
                ("city".to_string(), Value::Null),
                ("code".to_string(), Value::Integer(75001)),
                ("grade".to_string(), Value::Real(2.5)),
            ],
        );

        assert_eq!(row.label("city").unwrap(), UNKNOWN_LABEL);
        assert_eq!(row.label("code").unwrap(), "75001");
        assert_eq!(row.text("grade").unwrap(), "2.5");
        assert!(matches!(row.text("city"), Err(DataAccessError::Decode { .. })));
    }

    #[test]
    fn test_date_param_clamps_to_four_digit_years() {
        assert_eq!(
            date_param(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()),
            Value::from("2026-03-01")
        );
        assert_eq!(date_param(NaiveDate::MIN), Value::from("0000-01-01"));
        assert_eq!(date_param(NaiveDate::MAX), Value::from("9999-12-31"));
    }

    #[test]
    fn test_negative_count_is_decode_error() {
        let row = Row::new("test", vec![("n".to_string(), Value::Integer(-1))]);
        let err = row.count("n").unwrap_err();
        assert!(err.to_string().contains("negative count"));
    }
}
