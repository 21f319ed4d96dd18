use super::{page_offset, StatRecord, StatsStore, StoreError};
use crate::response::Response;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS server_stats (
    server_id VARCHAR(255) NOT NULL,
    user_id VARCHAR(255) NOT NULL,
    feur_count BIGINT NOT NULL DEFAULT 0,
    coubeh_count BIGINT NOT NULL DEFAULT 0,
    total_count BIGINT NOT NULL DEFAULT 0,
    PRIMARY KEY (server_id, user_id)
)"#;

// Counters are added from the proposed row so a single statement covers
// both the insert and the increment.
const UPSERT: &str = r#"
INSERT INTO server_stats (server_id, user_id, feur_count, coubeh_count, total_count)
VALUES ($1, $2, $3, $4, 1)
ON CONFLICT (server_id, user_id) DO UPDATE SET
    feur_count = server_stats.feur_count + EXCLUDED.feur_count,
    coubeh_count = server_stats.coubeh_count + EXCLUDED.coubeh_count,
    total_count = server_stats.total_count + 1"#;

const COUNT_RANKED: &str =
    "SELECT COUNT(*) FROM server_stats WHERE server_id = $1 AND total_count > 0";

const FETCH_PAGE: &str = r#"
SELECT server_id, user_id, feur_count, coubeh_count, total_count
FROM server_stats
WHERE server_id = $1 AND total_count > 0
ORDER BY total_count DESC, user_id ASC
LIMIT $2 OFFSET $3"#;

/// PostgreSQL-backed stats.
#[derive(Clone)]
pub struct PgStatsStore {
    pool: PgPool,
}

impl PgStatsStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("Failed to connect to the database")?;

        Ok(Self { pool })
    }

    /// Create the stats table if it does not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .context("Failed to create the server_stats table")?;

        tracing::info!("Database initialized");
        Ok(())
    }
}

#[async_trait]
impl StatsStore for PgStatsStore {
    async fn record_response(
        &self,
        server_id: &str,
        user_id: &str,
        response: Response,
    ) -> Result<(), StoreError> {
        let (feur, coubeh) = match response {
            Response::Feur => (1_i64, 0_i64),
            Response::Coubeh => (0, 1),
        };

        sqlx::query(UPSERT)
            .bind(server_id)
            .bind(user_id)
            .bind(feur)
            .bind(coubeh)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn count_ranked(&self, server_id: &str) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(COUNT_RANKED)
            .bind(server_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn fetch_page(
        &self,
        server_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<StatRecord>, StoreError> {
        let offset = page_offset(page, page_size)?;

        let rows = sqlx::query_as::<_, StatRecord>(FETCH_PAGE)
            .bind(server_id)
            .bind(i64::from(page_size))
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}
