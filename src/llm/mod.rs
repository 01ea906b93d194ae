//! Text-completion boundary.
//!
//! The interpreter only needs "instruction text in, free text out". Output is
//! not assumed to be deterministic across calls.

pub mod client;

use crate::config::{CompletionConfig, CompletionProvider};
use crate::error::{BotError, BotResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub use client::HttpCompletion;

/// A function mapping an instruction string to a free-text string.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, prompt: &str) -> BotResult<String>;
}

/// Build the provider selected in config.
pub fn from_config(config: &CompletionConfig) -> BotResult<Arc<dyn Completion>> {
    match config.provider {
        CompletionProvider::Http => Ok(Arc::new(HttpCompletion::from_config(config)?)),
        CompletionProvider::Scripted => Ok(Arc::new(ScriptedCompletion::new(
            config.responses.clone(),
        )?)),
    }
}

/// Replays a fixed list of responses, wrapping around after the last one.
#[derive(Debug)]
pub struct ScriptedCompletion {
    responses: Vec<String>,
    next: AtomicUsize,
}

impl ScriptedCompletion {
    pub fn new<I, S>(responses: I) -> BotResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let responses: Vec<String> = responses.into_iter().map(Into::into).collect();
        if responses.is_empty() {
            return Err(BotError::config("scripted completion needs at least one response"));
        }
        Ok(Self {
            responses,
            next: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Completion for ScriptedCompletion {
    async fn complete(&self, _prompt: &str) -> BotResult<String> {
        let i = self.next.fetch_add(1, Ordering::Relaxed) % self.responses.len();
        Ok(self.responses[i].clone())
    }
}
