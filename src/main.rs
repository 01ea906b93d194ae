//! Task Chat Bot
//!
//! Receives free-text chat messages, infers a task action through a
//! text-completion function, and stores tasks per user in SQLite.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use task_chat_bot::bot::{self, BotContext};
use task_chat_bot::cli::{Cli, Command};
use task_chat_bot::config::Config;
use task_chat_bot::logging::{self, LogTarget};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let mut config = Config::load_or_default(cli.config.as_deref())?;

    // Override from CLI arguments
    if let Some(db_path) = &cli.database {
        config.store.db_path = db_path.clone();
    }
    if let Some(token) = &cli.token {
        config.bot.token = Some(token.clone());
    }

    let ctx = BotContext::from_config(config)?;

    match cli.command {
        Some(Command::Console(args)) => {
            let answered = bot::console::run_stdio(&ctx, args.user).await?;
            info!(answered, "console finished");
        }
        Some(Command::Serve) | None => {
            bot::telegram::run(Arc::new(ctx)).await?;
        }
    }

    Ok(())
}
