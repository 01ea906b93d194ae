//! CLI command definitions for task-chat-bot
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Chat-driven task manager bot
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to database file, or :memory: (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Chat transport credential (overrides config)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the Telegram bot (default if no subcommand given)
    Serve,

    /// Chat with the bot over stdin/stdout
    Console(ConsoleArgs),
}

#[derive(Args, Debug)]
pub struct ConsoleArgs {
    /// User id the console session acts as
    #[arg(short, long, default_value_t = 1)]
    pub user: i64,
}
