//! Temporary SQLite databases for unit tests

use crate::store::SqliteStore;
use rusqlite::{params, Connection};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

pub const SCHEMA: &str = "
    CREATE TABLE providers (
        provider_id INTEGER PRIMARY KEY,
        name        TEXT,
        type        TEXT,
        city        TEXT,
        address     TEXT,
        contact     TEXT
    );
    CREATE TABLE receivers (
        receiver_id INTEGER PRIMARY KEY,
        name        TEXT,
        type        TEXT,
        city        TEXT,
        contact     TEXT
    );
    CREATE TABLE food_listings (
        food_id     INTEGER PRIMARY KEY,
        name        TEXT,
        food_type   TEXT,
        quantity    REAL NOT NULL,
        unit        TEXT,
        expiry_date TEXT,
        status      TEXT,
        provider_id INTEGER NOT NULL REFERENCES providers(provider_id)
    );
    CREATE TABLE claims (
        claim_id         INTEGER PRIMARY KEY,
        claim_date       TEXT,
        status           TEXT,
        quantity_claimed REAL NOT NULL,
        receiver_id      INTEGER NOT NULL REFERENCES receivers(receiver_id),
        food_id          INTEGER NOT NULL REFERENCES food_listings(food_id)
    );
";

/// Schema-initialised database in a temp dir; the writer connection stays open
pub struct FixtureDb {
    _dir: TempDir,
    path: PathBuf,
    conn: Connection,
}

impl FixtureDb {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("foodflow.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        Self { _dir: dir, path, conn }
    }

    /// WAL journal so a reader snapshot and the writer can overlap
    pub fn new_wal() -> Self {
        let db = Self::new();
        db.conn.pragma_update(None, "journal_mode", "WAL").unwrap();
        db
    }

    pub fn store(&self) -> SqliteStore {
        SqliteStore::open(&self.path, Duration::from_millis(500)).unwrap()
    }

    /// Raw statements for rows the typed helpers cannot express (NULL columns)
    pub fn execute(&self, sql: &str) {
        self.conn.execute_batch(sql).unwrap();
    }

    pub fn provider(&self, id: i64, name: &str, kind: &str, city: &str) {
        self.conn
            .execute(
                "INSERT INTO providers (provider_id, name, type, city, address, contact)
                 VALUES (?1, ?2, ?3, ?4, '1 Main St', '555-0100')",
                params![id, name, kind, city],
            )
            .unwrap();
    }

    pub fn receiver(&self, id: i64, name: &str, kind: &str, city: &str) {
        self.conn
            .execute(
                "INSERT INTO receivers (receiver_id, name, type, city, contact)
                 VALUES (?1, ?2, ?3, ?4, '555-0199')",
                params![id, name, kind, city],
            )
            .unwrap();
    }

    #[allow(clippy::too_many_arguments)]
    pub fn listing(
        &self,
        id: i64,
        provider_id: i64,
        name: &str,
        food_type: &str,
        quantity: f64,
        status: &str,
        expiry_date: &str,
    ) {
        self.conn
            .execute(
                "INSERT INTO food_listings (food_id, name, food_type, quantity, unit, expiry_date, status, provider_id)
                 VALUES (?1, ?2, ?3, ?4, 'kg', ?5, ?6, ?7)",
                params![id, name, food_type, quantity, expiry_date, status, provider_id],
            )
            .unwrap();
    }

    pub fn claim(&self, id: i64, food_id: i64, receiver_id: i64, status: &str, quantity: f64, date: &str) {
        self.conn
            .execute(
                "INSERT INTO claims (claim_id, claim_date, status, quantity_claimed, receiver_id, food_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id, date, status, quantity, receiver_id, food_id],
            )
            .unwrap();
    }
}
