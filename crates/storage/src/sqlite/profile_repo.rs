use async_trait::async_trait;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::ser;
use crate::repository::{ProfileRepository, StorageError};

#[async_trait]
impl ProfileRepository for SqliteRepository {
    async fn load_xp(&self) -> Result<u64, StorageError> {
        let row = sqlx::query("SELECT xp FROM profile WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let Some(row) = row else {
            return Ok(0);
        };

        let xp: i64 = row.try_get("xp").map_err(ser)?;
        u64::try_from(xp).map_err(|_| StorageError::Serialization(format!("invalid xp: {xp}")))
    }

    async fn save_xp(&self, xp: u64) -> Result<(), StorageError> {
        let xp = i64::try_from(xp).map_err(|_| StorageError::Serialization("xp overflow".into()))?;
        sqlx::query(
            r"
            INSERT INTO profile (id, xp)
            VALUES (1, ?1)
            ON CONFLICT(id) DO UPDATE SET xp = excluded.xp
            ",
        )
        .bind(xp)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}
