//! Embedded schema migrations.

use anyhow::anyhow;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use crate::db::connection::connect_sqlite;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Runs pending migrations on the SQLite database at `url` and returns how many ran.
pub fn run_sqlite(url: &str) -> anyhow::Result<usize> {
    let mut conn = connect_sqlite(url)?;
    let applied = conn.run_pending_migrations(MIGRATIONS).map_err(|e| anyhow!(e))?;
    for version in &applied {
        info!(%version, "migration applied");
    }
    Ok(applied.len())
}

#[cfg(test)]
mod tests {
    use diesel::{Connection, SqliteConnection, connection::SimpleConnection};

    use super::*;

    #[test]
    fn migrations_apply_once_on_temp_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let path = temp.path().to_string_lossy().to_string();

        assert_eq!(run_sqlite(&path).expect("migration run"), 2);
        assert_eq!(run_sqlite(&path).expect("second run"), 0);

        let mut conn = SqliteConnection::establish(&path).unwrap();
        conn.batch_execute("INSERT INTO engine_kv (k,v) VALUES ('hello', 'world')")
            .unwrap();
        conn.batch_execute("INSERT INTO price_points VALUES ('BTC', 20210101, 1.0, 1.0, 1.0)")
            .unwrap();
    }
}
