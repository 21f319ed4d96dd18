mod cli;
mod config;
mod directory;
mod discord;
mod dispatch;
mod leaderboard;
mod pagination;
mod response;
mod store;
mod trigger;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use config::Config;
use directory::HttpDirectory;
use std::sync::Arc;
use store::{PgStatsStore, StatsStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "feurbot=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Daemon => {
            tracing::info!("Starting feurbot daemon...");
            let config = Config::load()?;
            discord::run_bot(&config).await?;
        }
        Command::Install => {
            config::install()?;
        }
        Command::Config => {
            config::show()?;
        }
        Command::Leaderboard { guild_id, page } => {
            let config = Config::load()?;
            print_leaderboard(&config, guild_id, page).await?;
        }
    }

    Ok(())
}

async fn print_leaderboard(config: &Config, guild_id: u64, page: u32) -> Result<()> {
    let credentials = config.credentials()?;
    let store = PgStatsStore::connect(&credentials.database_url).await?;
    let directory = HttpDirectory::new(Arc::new(serenity::http::Http::new(
        &credentials.discord_bot_token,
    )));

    let server_id = guild_id.to_string();
    let page_size = config.page_size();
    let total_pages = store::count_pages(&store, &server_id, page_size).await;
    let store: &dyn StatsStore = &store;
    let text = leaderboard::render_page(store, &directory, &server_id, page, page_size).await;

    println!("{}", text);
    println!("Page {}/{}", page, total_pages);
    Ok(())
}
