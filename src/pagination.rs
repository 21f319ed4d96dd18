//! Navigation state of a rendered leaderboard message.
//!
//! A [`PaginationSession`] belongs to exactly one message and one invoking
//! user. It starts on page 1 with a page count fixed for its whole life, and
//! closes for good once its lifetime elapses.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tokio_util::sync::CancellationToken;

/// A navigation button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavIntent {
    First,
    Previous,
    PageIndicator,
    Next,
    Last,
}

impl NavIntent {
    pub const ALL: [NavIntent; 5] = [
        NavIntent::First,
        NavIntent::Previous,
        NavIntent::PageIndicator,
        NavIntent::Next,
        NavIntent::Last,
    ];

    pub fn custom_id(&self) -> &'static str {
        match self {
            NavIntent::First => "first",
            NavIntent::Previous => "previous",
            NavIntent::PageIndicator => "page",
            NavIntent::Next => "next",
            NavIntent::Last => "last",
        }
    }

    pub fn from_custom_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|intent| intent.custom_id() == id)
    }
}

/// How a navigation control should be drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavControl {
    pub intent: NavIntent,
    pub label: String,
    pub disabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Closed,
}

/// Outcome of a navigation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Accepted; render this page.
    Render(u32),
    /// Sent by someone other than the session owner.
    NotOwner,
    /// The session no longer accepts input.
    Closed,
    /// No transition, e.g. the page indicator.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct PaginationSession {
    owner_user_id: String,
    server_id: String,
    current_page: u32,
    total_pages: u32,
    expires_at: Instant,
    state: SessionState,
}

impl PaginationSession {
    pub fn new(
        owner_user_id: &str,
        server_id: &str,
        total_pages: u32,
        lifetime: Duration,
        now: Instant,
    ) -> Self {
        Self {
            owner_user_id: owner_user_id.to_string(),
            server_id: server_id.to_string(),
            current_page: 1,
            total_pages: total_pages.max(1),
            expires_at: now + lifetime,
            state: SessionState::Active,
        }
    }

    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    #[cfg(test)]
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn close(&mut self) {
        self.state = SessionState::Closed;
    }

    /// Apply a button press from `user_id`.
    pub fn navigate(&mut self, user_id: &str, intent: NavIntent, now: Instant) -> Navigation {
        if self.state == SessionState::Active && now >= self.expires_at {
            self.close();
        }
        if self.state == SessionState::Closed {
            return Navigation::Closed;
        }
        if user_id != self.owner_user_id {
            return Navigation::NotOwner;
        }

        self.current_page = match intent {
            NavIntent::First => 1,
            NavIntent::Previous => self.current_page.saturating_sub(1).max(1),
            NavIntent::Next => self.current_page.saturating_add(1).min(self.total_pages),
            NavIntent::Last => self.total_pages,
            NavIntent::PageIndicator => return Navigation::Ignored,
        };

        Navigation::Render(self.current_page)
    }

    /// Controls for the current page, in display order.
    pub fn controls(&self) -> Vec<NavControl> {
        let at_start = self.current_page == 1;
        let at_end = self.current_page == self.total_pages;

        NavIntent::ALL
            .into_iter()
            .map(|intent| {
                let (label, disabled) = match intent {
                    NavIntent::First => ("<<".to_string(), at_start),
                    NavIntent::Previous => ("<".to_string(), at_start),
                    NavIntent::PageIndicator => (
                        format!("Page {}/{}", self.current_page, self.total_pages),
                        true,
                    ),
                    NavIntent::Next => (">".to_string(), at_end),
                    NavIntent::Last => (">>".to_string(), at_end),
                };
                NavControl {
                    intent,
                    label,
                    disabled,
                }
            })
            .collect()
    }
}

/// A registered session. The owner is kept outside the lock so presses from
/// other users can be turned away without queueing behind a render.
#[derive(Debug)]
pub struct LiveSession {
    owner_user_id: String,
    session: Mutex<PaginationSession>,
}

impl LiveSession {
    fn new(session: PaginationSession) -> Self {
        Self {
            owner_user_id: session.owner_user_id.clone(),
            session: Mutex::new(session),
        }
    }

    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owner_user_id == user_id
    }

    pub async fn lock(&self) -> MutexGuard<'_, PaginationSession> {
        self.session.lock().await
    }
}

pub type SharedSession = Arc<LiveSession>;

/// Live sessions, keyed by the id of the message they drive.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<u64, SharedSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, message_id: u64, session: PaginationSession) -> SharedSession {
        let shared = Arc::new(LiveSession::new(session));
        self.sessions
            .write()
            .await
            .insert(message_id, shared.clone());
        shared
    }

    pub async fn get(&self, message_id: u64) -> Option<SharedSession> {
        self.sessions.read().await.get(&message_id).cloned()
    }

    /// Remove the session and mark it closed.
    pub async fn close(&self, message_id: u64) -> Option<SharedSession> {
        let session = self.sessions.write().await.remove(&message_id)?;
        session.lock().await.close();
        Some(session)
    }

    /// Wait until `expires_at` or until `shutdown` fires, then close the
    /// session. `None` if it was already closed.
    pub async fn close_at(
        &self,
        message_id: u64,
        expires_at: Instant,
        shutdown: &CancellationToken,
    ) -> Option<SharedSession> {
        tokio::select! {
            _ = tokio::time::sleep_until(tokio::time::Instant::from_std(expires_at)) => {}
            _ = shutdown.cancelled() => {}
        }
        self.close(message_id).await
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
