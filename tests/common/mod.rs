//! Shared SQLite fixture for integration tests

#![allow(dead_code)]

use foodflow::{AggregationEngine, AnalyticsConfig, SqliteStore};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const SCHEMA: &str = "
    CREATE TABLE providers (provider_id INTEGER PRIMARY KEY, name TEXT, type TEXT,
                            city TEXT, address TEXT, contact TEXT);
    CREATE TABLE receivers (receiver_id INTEGER PRIMARY KEY, name TEXT, type TEXT,
                            city TEXT, contact TEXT);
    CREATE TABLE food_listings (food_id INTEGER PRIMARY KEY, name TEXT, food_type TEXT,
                                quantity REAL NOT NULL, unit TEXT, expiry_date TEXT, status TEXT,
                                provider_id INTEGER NOT NULL);
    CREATE TABLE claims (claim_id INTEGER PRIMARY KEY, claim_date TEXT, status TEXT,
                         quantity_claimed REAL NOT NULL, receiver_id INTEGER NOT NULL, food_id INTEGER NOT NULL);
";

pub struct TestDb {
    _dir: TempDir,
    pub path: PathBuf,
    pub conn: Connection,
}

impl TestDb {
    pub fn empty() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("impact.db");
        let conn = Connection::open(&path).unwrap();
        conn.pragma_update(None, "journal_mode", "WAL").unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        Self { _dir: dir, path, conn }
    }

    /// Small network with every status, two cities and a tie in the claimer ranking
    pub fn seeded() -> Self {
        let db = Self::empty();
        db.conn
            .execute_batch(
                "
                INSERT INTO providers VALUES
                    (1, 'Green Grocer', 'Grocery', 'Lyon', '1 Rue A', '555-0101'),
                    (2, 'Corner Bakery', 'Bakery', 'Paris', '2 Rue B', '555-0102'),
                    (3, 'Quiet Farm', 'Farm', 'Nantes', NULL, NULL);
                INSERT INTO receivers VALUES
                    (1, 'Hope Shelter', 'Shelter', 'Lyon', '555-0201'),
                    (2, 'City NGO', 'NGO', 'Paris', '555-0202'),
                    (3, 'Alpha Kitchen', 'Charity', 'Paris', '555-0203');
                INSERT INTO food_listings VALUES
                    (10, 'Carrots', 'Vegetables', 30, 'kg', '2026-10-19', 'Available', 1),
                    (11, 'Apples', 'Fruits', 20, 'kg', '2026-10-25', 'Claimed', 1),
                    (12, 'Leeks', 'Vegetables', 10, 'kg', '2026-10-12', 'Expired', 2);
                INSERT INTO claims VALUES
                    (1, '2026-10-01 09:00:00', 'Completed', 10, 1, 10),
                    (2, '2026-10-02 09:00:00', 'Completed', 10, 2, 11),
                    (3, '2026-10-03 09:00:00', 'Pending', 5, 3, 10),
                    (4, '2026-10-04 09:00:00', 'Cancelled', 5, 3, 12);
                ",
            )
            .unwrap();
        db
    }

    pub fn engine(&self) -> AggregationEngine {
        let store = SqliteStore::open(&self.path, Duration::from_millis(500)).unwrap();
        let config = AnalyticsConfig {
            db_path: self.path.display().to_string(),
            as_of: chrono::NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
            ..AnalyticsConfig::default()
        };
        AggregationEngine::new(Arc::new(store), config)
    }
}
