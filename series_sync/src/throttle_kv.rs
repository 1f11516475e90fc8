//! Durable [`ThrottleStore`] on the `engine_kv` table.
//!
//! Keys are `throttle/{user}/{symbol}/{kind}` with `%` and `/` inside each
//! part percent-escaped, values the JSON encoding of [`ThrottleState`].

use std::sync::{Mutex, MutexGuard};

use alerts::{ThrottleError, ThrottleKey, ThrottleState, ThrottleStore};
use diesel::prelude::*;
use diesel::upsert::excluded;

use crate::{db::connection::connect_sqlite, schema::engine_kv};

const KEY_PREFIX: &str = "throttle";

pub struct SqliteThrottleStore {
    conn: Mutex<SqliteConnection>,
}

impl SqliteThrottleStore {
    pub fn open(database_url: &str) -> anyhow::Result<Self> {
        Ok(Self::from_connection(connect_sqlite(database_url)?))
    }

    pub fn from_connection(conn: SqliteConnection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> Result<MutexGuard<'_, SqliteConnection>, ThrottleError> {
        self.conn
            .lock()
            .map_err(|_| ThrottleError::Store("sqlite connection poisoned".into()))
    }
}

fn escape(part: &str) -> String {
    part.replace('%', "%25").replace('/', "%2F")
}

pub fn kv_key(key: &ThrottleKey) -> String {
    format!(
        "{KEY_PREFIX}/{}/{}/{}",
        escape(&key.user),
        escape(&key.symbol),
        key.kind
    )
}

impl ThrottleStore for SqliteThrottleStore {
    fn get(&self, key: &ThrottleKey) -> Result<Option<ThrottleState>, ThrottleError> {
        let k = kv_key(key);
        let mut conn = self.conn()?;
        let raw = engine_kv::table
            .filter(engine_kv::k.eq(&k))
            .select(engine_kv::v)
            .first::<String>(&mut *conn)
            .optional()
            .map_err(|e| ThrottleError::Store(e.to_string()))?;

        raw.map(|v| {
            serde_json::from_str(&v).map_err(|e| ThrottleError::Corrupt {
                key: k.clone(),
                detail: e.to_string(),
            })
        })
        .transpose()
    }

    fn put(&self, key: &ThrottleKey, state: &ThrottleState) -> Result<(), ThrottleError> {
        let k = kv_key(key);
        let v = serde_json::to_string(state).map_err(|e| ThrottleError::Corrupt {
            key: k.clone(),
            detail: e.to_string(),
        })?;
        let mut conn = self.conn()?;
        diesel::insert_into(engine_kv::table)
            .values((engine_kv::k.eq(&k), engine_kv::v.eq(&v)))
            .on_conflict(engine_kv::k)
            .do_update()
            .set(engine_kv::v.eq(excluded(engine_kv::v)))
            .execute(&mut *conn)
            .map_err(|e| ThrottleError::Store(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alerts::LimitKind;

    use super::*;

    #[test]
    fn key_layout() {
        let key = ThrottleKey::new("alice", "BTC", LimitKind::Low);
        assert_eq!(kv_key(&key), "throttle/alice/BTC/low");
    }

    #[test]
    fn slashes_in_names_do_not_collide() {
        let a = kv_key(&ThrottleKey::new("a/b", "C", LimitKind::Low));
        let b = kv_key(&ThrottleKey::new("a", "b/C", LimitKind::Low));
        assert_ne!(a, b);
        assert_eq!(a, "throttle/a%2Fb/C/low");
        assert_eq!(b, "throttle/a/b%2FC/low");
        assert_ne!(
            kv_key(&ThrottleKey::new("a%2Fb", "C", LimitKind::Low)),
            a
        );
    }
}
