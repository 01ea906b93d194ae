//! End-to-end tests: chat text through interpreter, service and store.
//!
//! The completion function is a scripted stand-in so replies are deterministic.

use std::sync::Arc;
use task_chat_bot::bot::{BotContext, TRY_AGAIN, console};
use task_chat_bot::config::Config;
use task_chat_bot::db::Database;
use task_chat_bot::error::{BotError, BotResult};
use task_chat_bot::llm::{Completion, ScriptedCompletion};
use task_chat_bot::service::{INVALID_ACTION, NO_TASKS_FOUND, TASK_DELETED, TASK_NOT_FOUND};

/// Build a context whose completion function replays `responses` in order.
fn context(responses: &[&str]) -> BotContext {
    let db = Database::open_in_memory().expect("Failed to create in-memory database");
    let llm = ScriptedCompletion::new(responses.iter().copied()).expect("responses");
    BotContext::new(Config::default(), db, Arc::new(llm))
}

struct FailingCompletion;

#[async_trait::async_trait]
impl Completion for FailingCompletion {
    async fn complete(&self, _prompt: &str) -> BotResult<String> {
        Err(BotError::Completion("connection refused".into()))
    }
}

#[tokio::test]
async fn start_command_returns_welcome() {
    let ctx = context(&["Action: list"]);

    let reply = ctx.handle_message(1, "/start").await;

    assert_eq!(
        reply,
        "Welcome to the Task Bot! Send a task description or use /list to see tasks."
    );
}

#[tokio::test]
async fn full_crud_conversation() {
    let ctx = context(&[
        r#"Action: create, Description: "Buy groceries""#,
        "Action: list",
        r#"Action: update, ID: 1, Description: "Buy groceries and milk""#,
        "Action: read, ID: 1",
        "Action: delete, ID: 1",
        "Action: list",
    ]);
    let user = 123;

    assert_eq!(
        ctx.handle_message(user, "I need to buy groceries").await,
        "Task created: Buy groceries (ID: 1)"
    );
    assert_eq!(
        ctx.handle_message(user, "what's on my list?").await,
        "ID: 1, Description: Buy groceries"
    );
    assert_eq!(
        ctx.handle_message(user, "add milk to task 1").await,
        "Task updated: Buy groceries and milk (ID: 1)"
    );
    assert_eq!(
        ctx.handle_message(user, "show task 1").await,
        "Task: Buy groceries and milk (ID: 1)"
    );
    assert_eq!(ctx.handle_message(user, "done with 1").await, TASK_DELETED);
    assert_eq!(ctx.handle_message(user, "anything left?").await, NO_TASKS_FOUND);
}

#[tokio::test]
async fn delete_of_missing_task_is_not_found() {
    let ctx = context(&["Action: delete, ID: 1"]);

    assert_eq!(ctx.handle_message(7, "delete task 1").await, TASK_NOT_FOUND);
}

#[tokio::test]
async fn users_cannot_see_each_others_tasks() {
    let ctx = context(&[
        r#"{"action": "create", "description": "Alice's secret"}"#,
        r#"{"action": "read", "id": 1}"#,
        r#"{"action": "delete", "id": 1}"#,
        r#"{"action": "list"}"#,
    ]);

    assert_eq!(
        ctx.handle_message(1, "remember my secret").await,
        "Task created: Alice's secret (ID: 1)"
    );
    assert_eq!(ctx.handle_message(2, "show task 1").await, TASK_NOT_FOUND);
    assert_eq!(ctx.handle_message(2, "delete task 1").await, TASK_NOT_FOUND);
    assert_eq!(ctx.handle_message(2, "list").await, NO_TASKS_FOUND);
}

#[tokio::test]
async fn malformed_completion_is_invalid_action() {
    let ctx = context(&["I'm not sure what you want", "Action: archive, ID: 1"]);

    assert_eq!(ctx.handle_message(1, "hmm").await, INVALID_ACTION);
    assert_eq!(ctx.handle_message(1, "archive 1").await, INVALID_ACTION);
}

#[tokio::test]
async fn completion_failure_is_contained() {
    let db = Database::open_in_memory().unwrap();
    let ctx = BotContext::new(Config::default(), db, Arc::new(FailingCompletion));

    assert_eq!(ctx.handle_message(1, "add a task").await, TRY_AGAIN);
    // Greeting does not touch the completion function.
    assert!(ctx.handle_message(1, "/start").await.starts_with("Welcome"));
}

#[tokio::test]
async fn from_config_with_scripted_provider() {
    let mut config = Config::default();
    config.store.db_path = ":memory:".into();
    config.completion.provider = task_chat_bot::config::CompletionProvider::Scripted;
    config.completion.responses = vec![r#"Action: create, Description: "Water plants""#.into()];

    let ctx = BotContext::from_config(config).expect("context");

    assert_eq!(
        ctx.handle_message(9, "water the plants").await,
        "Task created: Water plants (ID: 1)"
    );
}

#[tokio::test]
async fn console_answers_each_line() {
    let ctx = context(&[
        r#"Action: create, Description: "Buy groceries""#,
        "Action: list",
    ]);
    let input: &[u8] = b"buy groceries\n\nshow my tasks\n";
    let mut output = Vec::new();

    let answered = console::run(&ctx, 5, input, &mut output).await.unwrap();

    assert_eq!(answered, 2);
    assert_eq!(
        String::from_utf8(output).unwrap(),
        "Task created: Buy groceries (ID: 1)\n\nID: 1, Description: Buy groceries\n\n"
    );
}
