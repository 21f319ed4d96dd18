use crate::config::Config;
use crate::directory::HttpDirectory;
use crate::dispatch::{self, Inbound, Route, LEADERBOARD_COMMAND};
use crate::leaderboard;
use crate::pagination::{
    NavControl, NavIntent, Navigation, PaginationSession, SessionRegistry, SharedSession,
};
use crate::response::{self, Response};
use crate::store::{self, PgStatsStore, StatsStore};
use crate::trigger::TriggerDetector;
use anyhow::{Context as _, Result};
use serenity::async_trait;
use serenity::builder::{
    CreateActionRow, CreateButton, CreateCommand, CreateInteractionResponse,
    CreateInteractionResponseFollowup, CreateInteractionResponseMessage, EditInteractionResponse,
};
use serenity::http::Http;
use serenity::model::application::{
    ButtonStyle, CommandInteraction, ComponentInteraction, Interaction,
};
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

const NOT_YOURS: &str = "Ces boutons ne sont pas pour toi !";
const EXPIRED: &str = "Ce classement a expiré, relance /classement.";
const GUILD_ONLY: &str = "Cette commande ne peut être utilisée que dans un serveur.";

/// Everything built once at startup and shared by all handlers.
pub struct App {
    store: Arc<dyn StatsStore>,
    detector: TriggerDetector,
    page_size: u32,
    session_timeout: Duration,
    sessions: SessionRegistry,
    shutdown: CancellationToken,
    tasks: TaskTracker,
}

impl App {
    pub fn new(
        store: Arc<dyn StatsStore>,
        detector: TriggerDetector,
        page_size: u32,
        session_timeout: Duration,
    ) -> Self {
        Self {
            store,
            detector,
            page_size,
            session_timeout,
            sessions: SessionRegistry::new(),
            shutdown: CancellationToken::new(),
            tasks: TaskTracker::new(),
        }
    }

    /// Reply to a trigger, then count the reply. Counting is best effort.
    async fn retort(&self, ctx: &Context, msg: &Message, server_id: &str, user_id: &str) {
        let response: Response = response::pick_response(&mut rand::thread_rng());

        if let Err(e) = msg.reply(&ctx.http, response.text()).await {
            tracing::error!("Failed to send response: {}", e);
            return;
        }
        tracing::info!(
            "Answered {} to {} in {}: {:?}",
            response.tag(),
            msg.author.name,
            server_id,
            msg.content
        );

        if let Err(e) = self.store.record_response(server_id, user_id, response).await {
            tracing::error!("Failed to update stats for {} in {}: {}", user_id, server_id, e);
        }
    }

    /// Start a session on page 1 for `message_id` and make it reachable by
    /// button presses right away.
    async fn register_session(
        &self,
        message_id: u64,
        server_id: &str,
        owner_id: &str,
    ) -> SharedSession {
        let total_pages = store::count_pages(self.store.as_ref(), server_id, self.page_size).await;
        let session = PaginationSession::new(
            owner_id,
            server_id,
            total_pages,
            self.session_timeout,
            Instant::now(),
        );
        tracing::info!(
            "Leaderboard opened by {} in {} ({} page(s))",
            owner_id,
            server_id,
            total_pages
        );
        self.sessions.insert(message_id, session).await
    }

    /// Close the session when its lifetime ends or the bot shuts down,
    /// whichever comes first, and strip the buttons from its message.
    async fn expire_session(
        &self,
        http: Arc<Http>,
        command: CommandInteraction,
        message_id: u64,
        expires_at: Instant,
    ) {
        if self
            .sessions
            .close_at(message_id, expires_at, &self.shutdown)
            .await
            .is_none()
        {
            return;
        }

        let builder = EditInteractionResponse::new().components(vec![]);
        if let Err(e) = command.edit_response(&http, builder).await {
            tracing::warn!("Failed to remove leaderboard buttons on {}: {}", message_id, e);
        }
        tracing::debug!("Leaderboard session {} closed", message_id);
    }
}

struct Handler {
    app: Arc<App>,
}

impl Handler {
    async fn open_leaderboard(
        &self,
        ctx: &Context,
        command: &CommandInteraction,
        server_id: &str,
        owner_id: &str,
    ) {
        if let Err(e) = command.defer(&ctx.http).await {
            tracing::error!("Failed to defer leaderboard command: {}", e);
            return;
        }

        let message_id = match command.get_response(&ctx.http).await {
            Ok(message) => message.id.get(),
            Err(e) => {
                tracing::error!("Failed to fetch deferred leaderboard message: {}", e);
                return;
            }
        };

        let app = &self.app;
        let shared = app.register_session(message_id, server_id, owner_id).await;

        // Presses that arrive before page 1 is out wait here.
        let session = shared.lock().await;
        let directory = HttpDirectory::new(ctx.http.clone());
        let content =
            leaderboard::render_page(app.store.as_ref(), &directory, server_id, 1, app.page_size)
                .await;
        let builder = EditInteractionResponse::new()
            .content(content)
            .components(vec![navigation_row(&session.controls())]);

        if let Err(e) = command.edit_response(&ctx.http, builder).await {
            tracing::error!("Failed to send leaderboard: {}", e);
            drop(session);
            app.sessions.close(message_id).await;
            return;
        }
        let expires_at = session.expires_at();
        drop(session);

        let app = Arc::clone(&self.app);
        let http = ctx.http.clone();
        let command = command.clone();
        self.app.tasks.spawn(async move {
            app.expire_session(http, command, message_id, expires_at).await;
        });
    }

    async fn navigate(
        &self,
        ctx: &Context,
        component: &ComponentInteraction,
        message_id: u64,
        user_id: &str,
        intent: NavIntent,
    ) {
        let Some(session) = self.app.sessions.get(message_id).await else {
            private_notice(ctx, component, EXPIRED).await;
            return;
        };

        if !session.is_owner(user_id) {
            tracing::debug!("{} tried to use leaderboard {}", user_id, message_id);
            private_notice(ctx, component, NOT_YOURS).await;
            return;
        }

        if let Err(e) = component.defer(&ctx.http).await {
            tracing::error!("Failed to acknowledge button on {}: {}", message_id, e);
            return;
        }

        // Held until the edit is sent so presses apply one after another.
        let mut session = session.lock().await;

        match session.navigate(user_id, intent, Instant::now()) {
            Navigation::Render(page) => {
                tracing::debug!(
                    "Leaderboard {} on page {}/{}",
                    message_id,
                    session.current_page(),
                    session.total_pages()
                );
                let directory = HttpDirectory::new(ctx.http.clone());
                let content = leaderboard::render_page(
                    self.app.store.as_ref(),
                    &directory,
                    session.server_id(),
                    page,
                    self.app.page_size,
                )
                .await;
                let builder = EditInteractionResponse::new()
                    .content(content)
                    .components(vec![navigation_row(&session.controls())]);
                if let Err(e) = component.edit_response(&ctx.http, builder).await {
                    tracing::error!("Failed to update leaderboard {}: {}", message_id, e);
                }
            }
            Navigation::Closed => {
                let followup = CreateInteractionResponseFollowup::new()
                    .content(EXPIRED)
                    .ephemeral(true);
                if let Err(e) = component.create_followup(&ctx.http, followup).await {
                    tracing::error!("Failed to send private notice: {}", e);
                }
            }
            Navigation::NotOwner | Navigation::Ignored => {
                tracing::debug!("Ignored {:?} press on leaderboard {}", intent, message_id);
            }
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        let event = Inbound::Message {
            content: &msg.content,
            author_id: msg.author.id.get(),
            author_is_bot: msg.author.bot,
            guild_id: msg.guild_id.map(|g| g.get()),
        };

        if let Route::Retort { server_id, user_id } = dispatch::route(&event, &self.app.detector) {
            self.app.retort(&ctx, &msg, &server_id, &user_id).await;
        }
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        tracing::info!("{} is connected!", ready.user.name);

        let command = CreateCommand::new(LEADERBOARD_COMMAND)
            .description("Affiche le classement des victimes")
            .dm_permission(false);

        if let Err(e) =
            serenity::model::application::Command::create_global_command(&ctx.http, command).await
        {
            tracing::error!("Failed to create slash command: {}", e);
        } else {
            tracing::info!("Registered /{} slash command", LEADERBOARD_COMMAND);
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => {
                let event = Inbound::Command {
                    name: &command.data.name,
                    user_id: command.user.id.get(),
                    guild_id: command.guild_id.map(|g| g.get()),
                };
                match dispatch::route(&event, &self.app.detector) {
                    Route::OpenLeaderboard {
                        server_id,
                        owner_id,
                    } => {
                        self.open_leaderboard(&ctx, &command, &server_id, &owner_id)
                            .await;
                    }
                    Route::GuildOnly => {
                        let response = CreateInteractionResponse::Message(
                            CreateInteractionResponseMessage::new()
                                .content(GUILD_ONLY)
                                .ephemeral(true),
                        );
                        if let Err(e) = command.create_response(&ctx.http, response).await {
                            tracing::error!("Failed to respond to slash command: {}", e);
                        }
                    }
                    _ => {}
                }
            }
            Interaction::Component(component) => {
                let event = Inbound::Component {
                    custom_id: &component.data.custom_id,
                    user_id: component.user.id.get(),
                    message_id: component.message.id.get(),
                };
                if let Route::Navigate {
                    message_id,
                    user_id,
                    intent,
                } = dispatch::route(&event, &self.app.detector)
                {
                    self.navigate(&ctx, &component, message_id, &user_id, intent)
                        .await;
                }
            }
            _ => {}
        }
    }
}

/// Answer a button press with a message only its author can see.
async fn private_notice(ctx: &Context, component: &ComponentInteraction, content: &str) {
    let response = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(content)
            .ephemeral(true),
    );
    if let Err(e) = component.create_response(&ctx.http, response).await {
        tracing::error!("Failed to send private notice: {}", e);
    }
}

fn navigation_row(controls: &[NavControl]) -> CreateActionRow {
    let buttons = controls
        .iter()
        .map(|control| {
            let style = match control.intent {
                NavIntent::PageIndicator => ButtonStyle::Secondary,
                _ => ButtonStyle::Primary,
            };
            CreateButton::new(control.intent.custom_id())
                .label(control.label.clone())
                .style(style)
                .disabled(control.disabled)
        })
        .collect();

    CreateActionRow::Buttons(buttons)
}

pub async fn run_bot(config: &Config) -> Result<()> {
    let credentials = config.credentials()?;
    let detector = TriggerDetector::new(config.trigger_word())?;

    let store = PgStatsStore::connect(&credentials.database_url).await?;
    store.migrate().await?;

    let app = Arc::new(App::new(
        Arc::new(store),
        detector,
        config.page_size(),
        config.session_timeout(),
    ));

    tracing::info!(
        "Starting Discord bot (trigger: {:?})...",
        app.detector.word()
    );

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&credentials.discord_bot_token, intents)
        .event_handler(Handler { app: app.clone() })
        .await
        .context("Failed to create Discord client")?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            return;
        }

        tracing::info!(
            "Shutting down, closing {} leaderboard(s)...",
            app.sessions.len().await
        );
        app.shutdown.cancel();
        app.tasks.close();
        app.tasks.wait().await;
        shard_manager.shutdown_all().await;
    });

    client.start().await.context("Discord client error")?;

    tracing::info!("feurbot stopped");
    Ok(())
}
