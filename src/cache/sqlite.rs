use std::{path::Path, str::FromStr as _};

use chrono::DateTime;
use sqlx::sqlite::SqliteConnectOptions;
use tracing::error;

use super::{CacheEntry, Store};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("sqlite: {0}")]
    Query(#[from] sqlx::Error),
    #[error("failed to decode cached payload: {0}")]
    Decode(serde_json::Error),
    #[error("failed to encode payload: {0}")]
    Encode(serde_json::Error),
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(i64),
}

/// Persistent store backed by a local SQLite database.
pub struct SqliteStore {
    pool: sqlx::SqlitePool,
}

impl SqliteStore {
    pub async fn open(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)
            .inspect_err(|error| error!(%error, %url, "Failed to parse cache db url"))?;
        Self::connect(options).await
    }

    pub async fn open_file(path: impl AsRef<Path>) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        Self::connect(options).await
    }

    async fn connect(options: SqliteConnectOptions) -> Result<Self, sqlx::Error> {
        let pool = sqlx::pool::PoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .inspect_err(|error| error!(%error, "Failed to open cache db"))?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cache(
                key TEXT NOT NULL PRIMARY KEY,
                data TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            );
        "#,
        )
        .execute(&pool)
        .await
        .inspect_err(|error| error!(%error, "Failed to execute DDL to cache db"))?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &sqlx::SqlitePool {
        &self.pool
    }
}

impl Store for SqliteStore {
    type Error = Error;

    async fn load(&self, key: &str) -> Result<Option<CacheEntry>, Self::Error> {
        let Some((data, timestamp)) =
            sqlx::query_as::<_, (String, i64)>("SELECT data, timestamp FROM cache WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?
        else {
            return Ok(None);
        };
        Ok(Some(CacheEntry {
            data: serde_json::from_str(&data).map_err(Error::Decode)?,
            timestamp: DateTime::from_timestamp_millis(timestamp)
                .ok_or(Error::InvalidTimestamp(timestamp))?,
        }))
    }

    async fn save(&self, key: &str, entry: &CacheEntry) -> Result<(), Self::Error> {
        let data = serde_json::to_string(&entry.data).map_err(Error::Encode)?;
        sqlx::query(
            r#"
            INSERT INTO cache(key, data, timestamp)
            VALUES (?, ?, ?)
            ON CONFLICT(key)
            DO UPDATE SET
                data = EXCLUDED.data,
                timestamp = EXCLUDED.timestamp
        "#,
        )
        .bind(key)
        .bind(data)
        .bind(entry.timestamp.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
