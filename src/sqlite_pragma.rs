//! Read-path PRAGMAs shared by every analytics connection

use rusqlite::Connection;
use std::time::Duration;

/// Apply the read-only PRAGMA set (busy timeout, in-memory temp tables,
/// page cache, query_only). Must run before any statement on the connection.
pub fn apply_read_pragmas(conn: &Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    conn.busy_timeout(busy_timeout)?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    // Negative value = size in KiB
    conn.pragma_update(None, "cache_size", -16_000)?;
    conn.pragma_update(None, "query_only", "ON")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_only_blocks_writes() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (x INTEGER)", []).unwrap();

        apply_read_pragmas(&conn, Duration::from_millis(100)).unwrap();

        let query_only: i64 = conn
            .query_row("PRAGMA query_only", [], |row| row.get(0))
            .unwrap();
        assert_eq!(query_only, 1);
        assert!(conn.execute("INSERT INTO t (x) VALUES (1)", []).is_err());
    }
}
