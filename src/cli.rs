use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "feurbot")]
#[command(about = "Discord bot that answers \"quoi\" with \"feur\" and ranks its victims")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the Discord bot daemon (listens for messages)
    Daemon,

    /// Initial setup (Discord token, database URL)
    Install,

    /// Show current configuration
    Config,

    /// Print a page of a server's leaderboard
    Leaderboard {
        /// Discord server (guild) ID
        guild_id: u64,

        /// Page to print, starting at 1
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,
    },
}
