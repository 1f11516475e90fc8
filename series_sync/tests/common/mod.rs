#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use alerts::{DeliveryError, NotificationSink};
use async_trait::async_trait;
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::{Integer, Text};
use series_sync::{
    AppConfig,
    db::{connection, migrate},
};
use tempfile::TempDir;

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}
#[derive(QueryableByName)]
struct ForeignKeys {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}
#[derive(QueryableByName)]
struct BusyTimeout {
    #[diesel(sql_type = Integer, column_name = "timeout")]
    busy_timeout: i32,
}

pub struct TestDb {
    pub dir: TempDir, // keep alive for the life of the test
    pub path: String, // <tmpdir>/test.db
}

impl TestDb {
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

pub fn setup_db() -> (TestDb, SqliteConnection) {
    let dir = TempDir::new().expect("tempdir");
    let mut p = PathBuf::from(dir.path());
    p.push("test.db");
    let path = p.to_string_lossy().to_string();

    migrate::run_sqlite(&path).expect("migrations");

    let conn = connection::connect_sqlite(&path).expect("connect");
    (TestDb { dir, path }, conn)
}

pub fn assert_sqlite_pragmas(conn: &mut SqliteConnection) {
    use diesel::sql_query;

    let jm: JournalMode = sql_query("PRAGMA journal_mode;").get_result(conn).unwrap();
    assert_eq!(jm.journal_mode.to_lowercase(), "wal");

    let fk: ForeignKeys = sql_query("PRAGMA foreign_keys;").get_result(conn).unwrap();
    assert_eq!(fk.foreign_keys, 1);

    let bt: BusyTimeout = sql_query("PRAGMA busy_timeout;").get_result(conn).unwrap();
    assert_eq!(bt.busy_timeout, 5000);
}

/// Config pointing every file into the test directory.
pub fn config(db: &TestDb, extra: &str) -> AppConfig {
    let text = format!(
        r#"
        database_url = "{db}"
        limits_file = "{limits}"
        snapshot_file = "{snapshot}"

        [symbols]
        BTC = "Bitcoin"
        ETH = "Ethereum"

        [users.alice]
        chat_id = "100"

        {extra}
        "#,
        db = db.path,
        limits = toml_path(&db.file("limits.json")),
        snapshot = toml_path(&db.file("snapshot.json")),
    );
    series_sync::load_config_str(&text).expect("config")
}

fn toml_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[derive(Default)]
pub struct RecordingSink {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, recipient: &str, text: &str) -> Result<(), DeliveryError> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), text.to_string()));
        Ok(())
    }
}
