//! Durable local store: the `profiles` table and the `pending_actions`
//! queue, both owned exclusively by [`ProfileStore`].
//!
//! The pool is capped at a single connection, so no two store transactions
//! interleave; reads and writes against the durable tables are
//! linearizable. Failure to open the store is the only fatal condition in
//! the system - every per-operation error afterwards is recovered locally.

pub mod pending;
pub mod profiles;

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No profile found for id {0}")]
    ProfileNotFound(String),

    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

const SQL_CREATE_PROFILES: &str = r#"
CREATE TABLE IF NOT EXISTS profiles (
  id           TEXT PRIMARY KEY NOT NULL,
  first_name   TEXT NOT NULL,
  last_name    TEXT NOT NULL,
  email        TEXT NOT NULL,
  age          INTEGER NOT NULL,
  city         TEXT NOT NULL,
  state        TEXT NOT NULL,
  country      TEXT NOT NULL,
  picture_url  TEXT NOT NULL,
  fetched_page INTEGER NOT NULL,
  created_at   TEXT NOT NULL,
  status       INTEGER NOT NULL DEFAULT 0
)
"#;

const SQL_CREATE_PENDING: &str = r#"
CREATE TABLE IF NOT EXISTS pending_actions (
  id         INTEGER PRIMARY KEY AUTOINCREMENT,
  user_id    TEXT NOT NULL,
  status     INTEGER NOT NULL,
  created_at TEXT NOT NULL
)
"#;

#[derive(Clone)]
pub struct ProfileStore {
    pool: SqlitePool,
}

impl ProfileStore {
    /// Open (or create) the store at `path`.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        debug!(?path, "Opening profile store");
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Self::init(pool).await
    }

    /// In-memory store for tests. Lifetimes are disabled so the single
    /// connection - and with it the database - survives idle periods.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::init(pool).await
    }

    async fn init(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(SQL_CREATE_PROFILES).execute(&pool).await?;
        sqlx::query(SQL_CREATE_PENDING).execute(&pool).await?;
        Ok(Self { pool })
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
