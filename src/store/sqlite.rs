//! SQLite-backed data store accessor
//!
//! Every `execute` opens its own read-only connection, so independent reads can
//! run on any number of threads at once. `snapshot` pins one connection inside a
//! deferred read transaction: SQLite serves every statement of that transaction
//! from the same committed state.

use super::{
    DataAccessError, DataStore, QueryDescriptor, QueryExecutor, ReadConsistency, Row, Snapshot,
    Value,
};
use crate::sqlite_pragma::apply_read_pragmas;
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, ErrorCode, OpenFlags, ToSql};
use std::path::{Path, PathBuf};
use std::time::Duration;

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Integer(v) => ToSqlOutput::from(*v),
            Value::Real(v) => ToSqlOutput::from(*v),
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

/// Split rusqlite failures into "store down" and "statement refused"
fn classify(query: &'static str, err: rusqlite::Error) -> DataAccessError {
    let unreachable = match &err {
        rusqlite::Error::SqliteFailure(e, _) => matches!(
            e.code,
            ErrorCode::CannotOpen
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::NotADatabase
                | ErrorCode::DatabaseCorrupt
                | ErrorCode::SystemIoFailure
                | ErrorCode::PermissionDenied
                | ErrorCode::FileLockingProtocolFailed
        ),
        _ => false,
    };

    if unreachable {
        DataAccessError::Unreachable {
            query,
            reason: err.to_string(),
        }
    } else {
        DataAccessError::QueryRejected {
            query,
            reason: err.to_string(),
        }
    }
}

fn run_query(conn: &Connection, query: &QueryDescriptor) -> Result<Vec<Row>, DataAccessError> {
    let mut stmt = conn
        .prepare(&query.sql)
        .map_err(|e| classify(query.name, e))?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = stmt
        .query(params_from_iter(query.params.iter()))
        .map_err(|e| classify(query.name, e))?;

    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(|e| classify(query.name, e))? {
        let mut cells = Vec::with_capacity(columns.len());
        for (idx, name) in columns.iter().enumerate() {
            let value = match row.get_ref(idx).map_err(|e| classify(query.name, e))? {
                ValueRef::Null => Value::Null,
                ValueRef::Integer(v) => Value::Integer(v),
                ValueRef::Real(v) => Value::Real(v),
                ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
                ValueRef::Blob(_) => {
                    return Err(DataAccessError::Decode {
                        query: query.name,
                        column: name.clone(),
                        reason: "BLOB values are not supported".to_string(),
                    })
                }
            };
            cells.push((name.clone(), value));
        }
        out.push(Row::new(query.name, cells));
    }

    log::debug!("🔎 {} returned {} rows", query.name, out.len());
    Ok(out)
}

/// Read-only accessor over a SQLite database file
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteStore {
    /// Open the store and probe it once so a bad path fails here, not mid-report
    pub fn open(db_path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self, DataAccessError> {
        let store = Self {
            path: db_path.as_ref().to_path_buf(),
            busy_timeout,
        };

        let conn = store.connect("open")?;
        conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))
            .map_err(|e| classify("open", e))?;

        log::info!("📂 Analytics store opened: {}", store.path.display());
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self, query: &'static str) -> Result<Connection, DataAccessError> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX | OpenFlags::SQLITE_OPEN_URI,
        )
        .map_err(|e| DataAccessError::Unreachable {
            query,
            reason: e.to_string(),
        })?;

        apply_read_pragmas(&conn, self.busy_timeout).map_err(|e| DataAccessError::Unreachable {
            query,
            reason: e.to_string(),
        })?;

        Ok(conn)
    }
}

impl QueryExecutor for SqliteStore {
    fn execute(&self, query: &QueryDescriptor) -> Result<Vec<Row>, DataAccessError> {
        let conn = self.connect(query.name)?;
        run_query(&conn, query)
    }
}

impl DataStore for SqliteStore {
    fn snapshot(&self) -> Result<Box<dyn Snapshot + '_>, DataAccessError> {
        let conn = self.connect("snapshot")?;
        Ok(Box::new(SqliteSnapshot::begin(conn)?))
    }
}

/// One connection held inside a read transaction
pub struct SqliteSnapshot {
    conn: Connection,
}

impl SqliteSnapshot {
    fn begin(conn: Connection) -> Result<Self, DataAccessError> {
        conn.execute_batch("BEGIN DEFERRED")
            .map_err(|e| classify("snapshot", e))?;
        // A deferred transaction only takes its read mark on the first read
        conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))
            .map_err(|e| classify("snapshot", e))?;
        log::debug!("📸 Read snapshot started");
        Ok(Self { conn })
    }
}

impl QueryExecutor for SqliteSnapshot {
    fn execute(&self, query: &QueryDescriptor) -> Result<Vec<Row>, DataAccessError> {
        run_query(&self.conn, query)
    }
}

impl Snapshot for SqliteSnapshot {
    fn consistency(&self) -> ReadConsistency {
        ReadConsistency::PointInTime
    }
}

impl Drop for SqliteSnapshot {
    fn drop(&mut self) {
        if let Err(e) = self.conn.execute_batch("COMMIT") {
            log::warn!("⚠️  Failed to release read snapshot: {}", e);
        }
    }
}
