//! Per-server, per-user counters of which response the bot gave.
//!
//! [`StatsStore`] is the contract the rest of the bot talks to.
//! [`PgStatsStore`] backs it with PostgreSQL; tests use an in-memory store.

mod postgres;

#[cfg(test)]
pub mod memory;

pub use postgres::PgStatsStore;

use crate::response::Response;
use async_trait::async_trait;
use thiserror::Error;

/// One row of the stats table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StatRecord {
    pub server_id: String,
    pub user_id: String,
    pub feur_count: i64,
    pub coubeh_count: i64,
    pub total_count: i64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid page {0}, pages start at 1")]
    InvalidPage(u32),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Count one more `response` for the user, creating the row if needed.
    /// Must be a single atomic upsert.
    async fn record_response(
        &self,
        server_id: &str,
        user_id: &str,
        response: Response,
    ) -> Result<(), StoreError>;

    /// Number of users in the server with at least one response.
    async fn count_ranked(&self, server_id: &str) -> Result<u64, StoreError>;

    /// Users with `total > 0`, ordered by total descending then user id
    /// ascending, sliced to the given 1-indexed page.
    async fn fetch_page(
        &self,
        server_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<StatRecord>, StoreError>;
}

/// Number of pages needed for `count` entries; never less than one.
pub fn pages_for(count: u64, page_size: u32) -> u32 {
    let page_size = u64::from(page_size.max(1));
    let pages = count.div_ceil(page_size).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Page count for the server's leaderboard. Storage errors degrade to a
/// single page.
pub async fn count_pages(store: &dyn StatsStore, server_id: &str, page_size: u32) -> u32 {
    match store.count_ranked(server_id).await {
        Ok(count) => pages_for(count, page_size),
        Err(e) => {
            tracing::error!("Failed to count leaderboard pages for {}: {}", server_id, e);
            1
        }
    }
}

/// Row offset of the first entry of a 1-indexed page.
pub(crate) fn page_offset(page: u32, page_size: u32) -> Result<u64, StoreError> {
    if page == 0 {
        return Err(StoreError::InvalidPage(page));
    }
    Ok(u64::from(page - 1) * u64::from(page_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_for_rounds_up() {
        assert_eq!(pages_for(0, 5), 1);
        assert_eq!(pages_for(1, 5), 1);
        assert_eq!(pages_for(5, 5), 1);
        assert_eq!(pages_for(6, 5), 2);
        assert_eq!(pages_for(11, 5), 3);
    }

    #[test]
    fn pages_for_tolerates_zero_page_size() {
        assert_eq!(pages_for(3, 0), 3);
    }

    #[test]
    fn page_offset_is_zero_based() {
        assert_eq!(page_offset(1, 5).unwrap(), 0);
        assert_eq!(page_offset(3, 5).unwrap(), 10);
        assert!(matches!(page_offset(0, 5), Err(StoreError::InvalidPage(0))));
    }

    #[tokio::test]
    async fn count_pages_uses_ranked_users() {
        let mut store = MockStatsStore::new();
        store.expect_count_ranked().returning(|_| Ok(6));

        assert_eq!(count_pages(&store, "guild", 5).await, 2);
    }

    #[tokio::test]
    async fn count_pages_degrades_to_one_on_error() {
        let mut store = MockStatsStore::new();
        store
            .expect_count_ranked()
            .returning(|_| Err(StoreError::Database(sqlx::Error::PoolTimedOut)));

        assert_eq!(count_pages(&store, "guild", 5).await, 1);
    }

    #[test]
    fn store_error_display() {
        let err = StoreError::InvalidPage(0);
        assert_eq!(err.to_string(), "Invalid page 0, pages start at 1");

        let err = StoreError::from(sqlx::Error::PoolTimedOut);
        assert!(err.to_string().starts_with("Database error:"));
    }
}
