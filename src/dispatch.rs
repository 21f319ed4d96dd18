//! Transport-independent routing of inbound events.

use crate::pagination::NavIntent;
use crate::trigger::TriggerDetector;

pub const LEADERBOARD_COMMAND: &str = "classement";

/// What the gateway handed us, stripped down to what routing needs.
#[derive(Debug, Clone)]
pub enum Inbound<'a> {
    Message {
        content: &'a str,
        author_id: u64,
        author_is_bot: bool,
        guild_id: Option<u64>,
    },
    Command {
        name: &'a str,
        user_id: u64,
        guild_id: Option<u64>,
    },
    Component {
        custom_id: &'a str,
        user_id: u64,
        message_id: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Ignore,
    /// Answer the message and count the answer.
    Retort { server_id: String, user_id: String },
    /// Start a leaderboard session owned by `owner_id`.
    OpenLeaderboard { server_id: String, owner_id: String },
    /// The leaderboard was asked for outside a server.
    GuildOnly,
    Navigate {
        message_id: u64,
        user_id: String,
        intent: NavIntent,
    },
}

pub fn route(event: &Inbound<'_>, detector: &TriggerDetector) -> Route {
    match *event {
        Inbound::Message {
            content,
            author_id,
            author_is_bot,
            guild_id,
        } => {
            if author_is_bot {
                return Route::Ignore;
            }
            match guild_id {
                Some(guild_id) if detector.matches(content) => Route::Retort {
                    server_id: guild_id.to_string(),
                    user_id: author_id.to_string(),
                },
                _ => Route::Ignore,
            }
        }
        Inbound::Command {
            name,
            user_id,
            guild_id,
        } => {
            if name != LEADERBOARD_COMMAND {
                return Route::Ignore;
            }
            match guild_id {
                Some(guild_id) => Route::OpenLeaderboard {
                    server_id: guild_id.to_string(),
                    owner_id: user_id.to_string(),
                },
                None => Route::GuildOnly,
            }
        }
        Inbound::Component {
            custom_id,
            user_id,
            message_id,
        } => match NavIntent::from_custom_id(custom_id) {
            Some(NavIntent::PageIndicator) | None => Route::Ignore,
            Some(intent) => Route::Navigate {
                message_id,
                user_id: user_id.to_string(),
                intent,
            },
        },
    }
}
