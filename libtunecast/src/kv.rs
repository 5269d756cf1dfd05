//! Persistent key-value storage on SQLite

use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use std::path::Path;

use crate::error::{DbError, Result};

/// Email stashed between the forgot-password and reset-password steps
pub const RETRIEVE_PASSWORD_EMAIL: &str = "@email/retrieve-password";

#[derive(Clone)]
pub struct KeyValueStore {
    pool: SqlitePool,
}

impl KeyValueStore {
    /// Open (creating if needed) the store at `db_path`
    pub async fn new(db_path: &str) -> Result<Self> {
        let expanded_path = shellexpand::tilde(db_path).to_string();
        let path = Path::new(&expanded_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(DbError::IoError)?;
        }

        let db_url = format!("sqlite://{}?mode=rwc", expanded_path.replace('\\', "/"));
        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(DbError::SqlxError)?;

        Self::with_pool(pool).await
    }

    /// In-memory store, gone when the last handle drops
    pub async fn in_memory() -> Result<Self> {
        // A single connection, so every query sees the same memory database.
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(DbError::SqlxError)?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(DbError::MigrationError)?;
        Ok(Self { pool })
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(row.map(|r| r.get("value")))
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO kv (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// Returns true if the key existed
    pub async fn remove(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = KeyValueStore::in_memory().await.unwrap();

        assert_eq!(store.get(RETRIEVE_PASSWORD_EMAIL).await.unwrap(), None);

        store
            .set(RETRIEVE_PASSWORD_EMAIL, "amy@example.com")
            .await
            .unwrap();
        assert_eq!(
            store.get(RETRIEVE_PASSWORD_EMAIL).await.unwrap().as_deref(),
            Some("amy@example.com")
        );

        assert!(store.remove(RETRIEVE_PASSWORD_EMAIL).await.unwrap());
        assert!(!store.remove(RETRIEVE_PASSWORD_EMAIL).await.unwrap());
        assert_eq!(store.get(RETRIEVE_PASSWORD_EMAIL).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let store = KeyValueStore::in_memory().await.unwrap();
        store.set("k", "one").await.unwrap();
        store.set("k", "two").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("kv.db");
        let path = path.to_str().unwrap();

        {
            let store = KeyValueStore::new(path).await.unwrap();
            store.set("k", "v").await.unwrap();
        }

        let store = KeyValueStore::new(path).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
