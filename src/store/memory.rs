use super::{page_offset, StatRecord, StatsStore, StoreError};
use crate::response::Response;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// In-process store with the same ordering and atomicity as the SQL one.
#[derive(Default)]
pub struct MemoryStatsStore {
    rows: Mutex<HashMap<(String, String), StatRecord>>,
}

impl MemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, server_id: &str, user_id: &str) -> Option<StatRecord> {
        let key = (server_id.to_string(), user_id.to_string());
        self.rows.lock().await.get(&key).cloned()
    }

    async fn ranked(&self, server_id: &str) -> Vec<StatRecord> {
        let rows = self.rows.lock().await;
        let mut ranked: Vec<StatRecord> = rows
            .values()
            .filter(|r| r.server_id == server_id && r.total_count > 0)
            .cloned()
            .collect();
        ranked.sort_by(|a, b| {
            b.total_count
                .cmp(&a.total_count)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        ranked
    }
}

#[async_trait]
impl StatsStore for MemoryStatsStore {
    async fn record_response(
        &self,
        server_id: &str,
        user_id: &str,
        response: Response,
    ) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().await;
        let record = rows
            .entry((server_id.to_string(), user_id.to_string()))
            .or_insert_with(|| StatRecord {
                server_id: server_id.to_string(),
                user_id: user_id.to_string(),
                feur_count: 0,
                coubeh_count: 0,
                total_count: 0,
            });

        match response {
            Response::Feur => record.feur_count += 1,
            Response::Coubeh => record.coubeh_count += 1,
        }
        record.total_count += 1;
        Ok(())
    }

    async fn count_ranked(&self, server_id: &str) -> Result<u64, StoreError> {
        Ok(self.ranked(server_id).await.len() as u64)
    }

    async fn fetch_page(
        &self,
        server_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<StatRecord>, StoreError> {
        let offset = page_offset(page, page_size)? as usize;

        Ok(self
            .ranked(server_id)
            .await
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::count_pages;
    use std::sync::Arc;

    #[tokio::test]
    async fn first_record_creates_the_row() {
        let store = MemoryStatsStore::new();

        store.record_response("g", "u", Response::Feur).await.unwrap();
        store.record_response("g", "u", Response::Coubeh).await.unwrap();

        let record = store.get("g", "u").await.unwrap();
        assert_eq!(record.feur_count, 1);
        assert_eq!(record.coubeh_count, 1);
        assert_eq!(record.total_count, 2);
    }

    #[tokio::test]
    async fn concurrent_records_keep_total_consistent() {
        let store = Arc::new(MemoryStatsStore::new());

        let mut handles = Vec::new();
        for i in 0..50 {
            let store = store.clone();
            let response = if i % 3 == 0 { Response::Coubeh } else { Response::Feur };
            handles.push(tokio::spawn(async move {
                store.record_response("g", "u", response).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let record = store.get("g", "u").await.unwrap();
        assert_eq!(record.total_count, 50);
        assert_eq!(record.coubeh_count, 17);
        assert_eq!(record.total_count, record.feur_count + record.coubeh_count);
    }

    #[tokio::test]
    async fn servers_are_isolated() {
        let store = MemoryStatsStore::new();

        store.record_response("g1", "u", Response::Feur).await.unwrap();
        store.record_response("g2", "u", Response::Feur).await.unwrap();

        assert_eq!(store.count_ranked("g1").await.unwrap(), 1);
        assert_eq!(store.get("g1", "u").await.unwrap().total_count, 1);
    }

    #[tokio::test]
    async fn page_count_follows_ranked_users() {
        let store = MemoryStatsStore::new();
        assert_eq!(count_pages(&store, "g", 5).await, 1);

        for i in 0..5 {
            store.record_response("g", &format!("u{i}"), Response::Feur).await.unwrap();
        }
        assert_eq!(count_pages(&store, "g", 5).await, 1);

        store.record_response("g", "u5", Response::Feur).await.unwrap();
        assert_eq!(count_pages(&store, "g", 5).await, 2);
    }

    #[tokio::test]
    async fn pages_are_ordered_by_total_then_user_id() {
        let store = MemoryStatsStore::new();
        for (user, times) in [("b", 2), ("a", 2), ("c", 5), ("d", 1)] {
            for _ in 0..times {
                store.record_response("g", user, Response::Feur).await.unwrap();
            }
        }

        let first = store.fetch_page("g", 1, 3).await.unwrap();
        let users: Vec<&str> = first.iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(users, vec!["c", "a", "b"]);

        let second = store.fetch_page("g", 2, 3).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].user_id, "d");

        assert!(store.fetch_page("g", 3, 3).await.unwrap().is_empty());
        assert!(store.fetch_page("g", 0, 3).await.is_err());
    }
}
