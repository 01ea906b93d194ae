//! Bot adapter: routes chat text through the interpreter and the task service.
//!
//! Transports (Telegram, console) only move text in and out; everything they
//! need is carried by an explicitly constructed [`BotContext`].

pub mod console;
pub mod telegram;

use crate::config::Config;
use crate::db::Database;
use crate::error::BotError;
use crate::interpreter::Interpreter;
use crate::llm::{self, Completion};
use crate::service::{INVALID_ACTION, TaskService};
use crate::types::UserId;
use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Greeting command.
pub const START_COMMAND: &str = "/start";

/// Reply when a collaborator fails.
pub const TRY_AGAIN: &str = "Sorry, something went wrong. Please try again.";

/// Everything a transport needs to answer a message.
pub struct BotContext {
    pub config: Config,
    pub interpreter: Interpreter,
    pub service: TaskService,
}

impl BotContext {
    pub fn new(config: Config, db: Database, completion: Arc<dyn Completion>) -> Self {
        let interpreter = Interpreter::new(completion, config.completion.prompt_template.clone());
        Self {
            config,
            interpreter,
            service: TaskService::new(db),
        }
    }

    /// Open the store and completion provider named in `config`.
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate()?;
        config.ensure_db_dir()?;
        let db = Database::open(&config.store.db_path)?;
        let completion = llm::from_config(&config.completion)?;
        info!(db_path = %config.store.db_path.display(), "store opened");
        Ok(Self::new(config, db, completion))
    }

    /// Produce the reply for one inbound message. Never fails.
    pub async fn handle_message(&self, user_id: UserId, text: &str) -> String {
        let text = text.trim();
        if is_start_command(text) {
            return self.config.bot.welcome.clone();
        }

        let action = match self.interpreter.interpret(text).await {
            Ok(action) => action,
            Err(err) => return render_error(user_id, &err),
        };
        info!(user_id, action = %action, "handling message");

        match self.service.handle_action(user_id, &action) {
            Ok(reply) => reply,
            Err(err) => render_error(user_id, &err),
        }
    }
}

/// `/start`, `/start@SomeBot`, optionally followed by arguments.
pub fn is_start_command(text: &str) -> bool {
    let command = text.split_whitespace().next().unwrap_or_default();
    let name = command.split('@').next().unwrap_or_default();
    name == START_COMMAND
}

fn render_error(user_id: UserId, err: &BotError) -> String {
    match err {
        BotError::MalformedCompletion(reason) => {
            warn!(user_id, code = ?err.code(), %reason, "could not interpret message");
            INVALID_ACTION.to_string()
        }
        BotError::Validation { field, reason } => {
            warn!(user_id, code = ?err.code(), %field, %reason, "rejected request");
            format!("Invalid request: {} {}", field, reason)
        }
        _ => {
            error!(user_id, code = ?err.code(), error = %err, "message handling failed");
            TRY_AGAIN.to_string()
        }
    }
}
