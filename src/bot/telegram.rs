//! Telegram transport.

use super::BotContext;
use crate::types::UserId;
use anyhow::{Result, anyhow};
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, info};

/// Telegram's cap on message text, in UTF-16 code units.
const MAX_MESSAGE_LEN: usize = 4096;

/// Poll Telegram and answer every text message until interrupted.
pub async fn run(ctx: Arc<BotContext>) -> Result<()> {
    let token = ctx
        .config
        .bot
        .token
        .clone()
        .ok_or_else(|| anyhow!("bot.token (or TASK_BOT_TOKEN) is not set"))?;
    let bot = Bot::new(token);

    info!("Starting Telegram polling");

    let handler = Update::filter_message().endpoint(on_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![ctx])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Telegram polling stopped");
    Ok(())
}

async fn on_message(bot: Bot, msg: Message, ctx: Arc<BotContext>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        debug!(chat_id = msg.chat.id.0, "ignoring non-text message");
        return Ok(());
    };

    let reply = ctx.handle_message(sender_id(&msg), text).await;
    let chunks = split_reply(&reply, MAX_MESSAGE_LEN);
    if chunks.len() > 1 {
        debug!(chat_id = msg.chat.id.0, parts = chunks.len(), "splitting long reply");
    }
    for chunk in chunks {
        bot.send_message(msg.chat.id, chunk).await?;
    }
    Ok(())
}

/// The acting user: the sender when known, else the chat.
fn sender_id(msg: &Message) -> UserId {
    msg.from
        .as_ref()
        .and_then(|user| UserId::try_from(user.id.0).ok())
        .unwrap_or(msg.chat.id.0)
}

/// Break a reply into pieces of at most `limit` UTF-16 units.
///
/// Pieces end on line boundaries; a single line longer than `limit` is cut
/// between characters.
fn split_reply(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len: usize = line.chars().map(char::len_utf16).sum();
        if current_len + line_len > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if line_len <= limit {
            current.push_str(line);
            current_len += line_len;
            continue;
        }
        for ch in line.chars() {
            let ch_len = ch.len_utf16();
            if current_len + ch_len > limit {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            current.push(ch);
            current_len += ch_len;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
        .into_iter()
        .map(|chunk| chunk.trim_end_matches('\n').to_string())
        .filter(|chunk| !chunk.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn group_message(from: Option<serde_json::Value>) -> Message {
        let mut value = json!({
            "message_id": 1,
            "date": 1_700_000_000,
            "chat": {"id": -100, "type": "group", "title": "Tasks"},
            "text": "list my tasks",
        });
        if let Some(from) = from {
            value["from"] = from;
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn sender_is_the_author_when_present() {
        let msg = group_message(Some(json!({"id": 42, "is_bot": false, "first_name": "Ann"})));
        assert_eq!(sender_id(&msg), 42);
    }

    #[test]
    fn sender_falls_back_to_chat_without_author() {
        let msg = group_message(None);
        assert!(msg.from.is_none());
        assert_eq!(sender_id(&msg), -100);
    }

    #[test]
    fn short_reply_is_sent_whole() {
        let reply = "ID: 1, Description: Buy milk\nID: 2, Description: Call mum";
        assert_eq!(split_reply(reply, MAX_MESSAGE_LEN), vec![reply.to_string()]);
    }

    #[test]
    fn long_list_splits_on_line_boundaries() {
        let lines: Vec<String> = (1..=300)
            .map(|i| format!("ID: {}, Description: task number {}", i, i))
            .collect();
        let reply = lines.join("\n");
        assert!(reply.len() > MAX_MESSAGE_LEN);

        let chunks = split_reply(&reply, MAX_MESSAGE_LEN);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.encode_utf16().count() <= MAX_MESSAGE_LEN));
        assert!(chunks.iter().all(|c| c.starts_with("ID: ")));
        assert_eq!(chunks.join("\n"), reply);
    }

    #[test]
    fn overlong_line_is_cut_between_characters() {
        let reply = "x".repeat(10);
        assert_eq!(split_reply(&reply, 4), vec!["xxxx", "xxxx", "xx"]);
    }

    #[test]
    fn limit_counts_utf16_units() {
        // Each emoji is a surrogate pair.
        let reply = "\u{1F600}".repeat(3);
        let chunks = split_reply(&reply, 4);
        assert_eq!(chunks, vec!["\u{1F600}\u{1F600}", "\u{1F600}"]);
    }
}
