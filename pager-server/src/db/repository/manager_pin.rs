//! Manager PIN Repository (Singleton)
//!
//! One config row holding the manager's shared access PIN, lazily created
//! with the default value on first read. Comparison against the entered
//! PIN happens client-side; the server only stores and serves it.

use super::{RepoError, RepoResult};
use shared::models::ManagerPinConfig;
use sqlx::SqlitePool;

const SINGLETON_ID: i64 = 1;

/// Factory PIN written on first access
pub const DEFAULT_PIN: &str = "1234";

/// Required PIN length (characters, not bytes)
const PIN_LEN: usize = 4;

fn validate_pin(pin: &str) -> RepoResult<()> {
    if pin.chars().count() != PIN_LEN {
        return Err(RepoError::Validation(format!(
            "Manager PIN must be exactly {PIN_LEN} characters"
        )));
    }
    Ok(())
}

pub async fn get(pool: &SqlitePool) -> RepoResult<Option<ManagerPinConfig>> {
    let config = sqlx::query_as::<_, ManagerPinConfig>(
        "SELECT id, pin, last_updated FROM manager_pin_config WHERE id = ?",
    )
    .bind(SINGLETON_ID)
    .fetch_optional(pool)
    .await?;
    Ok(config)
}

/// Read the manager PIN, creating the default row on first access.
///
/// Concurrent first readers may both attempt the insert; INSERT OR IGNORE
/// on the fixed singleton id makes them converge on one row.
pub async fn get_or_create(pool: &SqlitePool) -> RepoResult<ManagerPinConfig> {
    if let Some(config) = get(pool).await? {
        return Ok(config);
    }

    let now = shared::util::now_millis();
    sqlx::query("INSERT OR IGNORE INTO manager_pin_config (id, pin, last_updated) VALUES (?, ?, ?)")
        .bind(SINGLETON_ID)
        .bind(DEFAULT_PIN)
        .bind(now)
        .execute(pool)
        .await?;

    get(pool)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create manager PIN config".into()))
}

/// Set the manager PIN (the `setManagerPin` callable).
///
/// Rejects anything but an exactly-4-character string before touching the
/// store; upserts the singleton row otherwise.
pub async fn set(pool: &SqlitePool, new_pin: &str) -> RepoResult<ManagerPinConfig> {
    validate_pin(new_pin)?;

    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO manager_pin_config (id, pin, last_updated) VALUES (?1, ?2, ?3) \
         ON CONFLICT(id) DO UPDATE SET pin = excluded.pin, last_updated = excluded.last_updated",
    )
    .bind(SINGLETON_ID)
    .bind(new_pin)
    .bind(now)
    .execute(pool)
    .await?;

    get(pool)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to update manager PIN config".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::test_pool;

    #[tokio::test]
    async fn first_read_creates_the_default_pin() {
        let pool = test_pool().await;

        assert!(get(&pool).await.unwrap().is_none());

        let config = get_or_create(&pool).await.unwrap();
        assert_eq!(config.pin, DEFAULT_PIN);

        // Second read returns the same row, no reset
        let again = get_or_create(&pool).await.unwrap();
        assert_eq!(again.pin, DEFAULT_PIN);
        assert_eq!(again.last_updated, config.last_updated);
    }

    #[tokio::test]
    async fn concurrent_first_readers_converge() {
        let pool = test_pool().await;

        let (a, b) = tokio::join!(get_or_create(&pool), get_or_create(&pool));
        let a = a.unwrap();
        let b = b.unwrap();
        assert_eq!(a.pin, b.pin);
        assert_eq!(a.pin, DEFAULT_PIN);
    }

    #[tokio::test]
    async fn set_rejects_wrong_lengths_before_writing() {
        let pool = test_pool().await;

        for bad in ["12", "12345", ""] {
            let err = set(&pool, bad).await.unwrap_err();
            assert!(matches!(err, RepoError::Validation(_)), "pin {bad:?}");
        }

        // Nothing was written by the rejected calls
        assert!(get(&pool).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_then_get_returns_the_new_pin() {
        let pool = test_pool().await;

        let updated = set(&pool, "AB12").await.unwrap();
        assert_eq!(updated.pin, "AB12");

        let read_back = get_or_create(&pool).await.unwrap();
        assert_eq!(read_back.pin, "AB12");
    }

    #[tokio::test]
    async fn set_overwrites_the_default() {
        let pool = test_pool().await;

        get_or_create(&pool).await.unwrap();
        set(&pool, "Z9Q1").await.unwrap();

        assert_eq!(get_or_create(&pool).await.unwrap().pin, "Z9Q1");
    }
}
