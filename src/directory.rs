use async_trait::async_trait;
use serenity::http::Http;
use serenity::model::id::UserId;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Invalid user id: {0}")]
    InvalidId(String),

    #[error("Discord API error: {0}")]
    Discord(#[from] serenity::Error),
}

/// Resolves user ids to the name shown on the leaderboard.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn display_name(&self, user_id: &str) -> Result<String, DirectoryError>;
}

/// Looks users up through the Discord REST API.
pub struct HttpDirectory {
    http: Arc<Http>,
}

impl HttpDirectory {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl UserDirectory for HttpDirectory {
    async fn display_name(&self, user_id: &str) -> Result<String, DirectoryError> {
        let id = parse_user_id(user_id)?;
        let user = self.http.get_user(id).await?;
        Ok(user.name)
    }
}

fn parse_user_id(user_id: &str) -> Result<UserId, DirectoryError> {
    user_id
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(UserId::new)
        .ok_or_else(|| DirectoryError::InvalidId(user_id.to_string()))
}
