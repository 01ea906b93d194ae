//! Line-oriented transport over any async reader and writer.
//!
//! Each input line is one message from a single fixed user; each reply is
//! written back followed by a blank line.

use super::BotContext;
use crate::types::UserId;
use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::info;

/// Run until the reader is exhausted. Returns the number of messages answered.
pub async fn run<R, W>(ctx: &BotContext, user_id: UserId, reader: R, mut writer: W) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!(user_id, "console session started");
    let mut lines = reader.lines();
    let mut answered = 0;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let reply = ctx.handle_message(user_id, &line).await;
        writer.write_all(reply.as_bytes()).await?;
        writer.write_all(b"\n\n").await?;
        writer.flush().await?;
        answered += 1;
    }

    info!(user_id, answered, "console session ended");
    Ok(answered)
}

/// Run against the process's stdin and stdout.
pub async fn run_stdio(ctx: &BotContext, user_id: UserId) -> Result<usize> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    run(ctx, user_id, stdin, tokio::io::stdout()).await
}
