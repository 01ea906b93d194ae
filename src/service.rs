//! Action dispatch and reply rendering.

use crate::db::Database;
use crate::error::{BotError, BotResult};
use crate::interpreter::ActionDescriptor;
use crate::types::{NewTask, Task, TaskUpdate, UserId};
use tracing::debug;

pub const TASK_NOT_FOUND: &str = "Task not found";
pub const NO_TASKS_FOUND: &str = "No tasks found";
pub const TASK_DELETED: &str = "Task deleted";
pub const INVALID_ACTION: &str = "Invalid action";

/// Runs one action against the store and renders the reply.
///
/// Holds no state of its own beyond the store handle.
#[derive(Clone)]
pub struct TaskService {
    db: Database,
}

impl TaskService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Execute `action` for `user_id`.
    ///
    /// Missing tasks render as "Task not found". Validation and store failures
    /// are returned to the caller.
    pub fn handle_action(&self, user_id: UserId, action: &ActionDescriptor) -> BotResult<String> {
        match self.dispatch(user_id, action) {
            Err(BotError::NotFound(task_id)) => {
                debug!(user_id, task_id, "task not found");
                Ok(TASK_NOT_FOUND.to_string())
            }
            other => other,
        }
    }

    fn dispatch(&self, user_id: UserId, action: &ActionDescriptor) -> BotResult<String> {
        match action {
            ActionDescriptor::Create { description } => {
                let task = self
                    .db
                    .create_task(user_id, NewTask::new(description.as_str()))?;
                Ok(format!("Task created: {} (ID: {})", task.description, task.id))
            }
            ActionDescriptor::Read { id } => {
                let task = self.db.get_task(user_id, *id)?.ok_or(BotError::NotFound(*id))?;
                Ok(format!("Task: {} (ID: {})", task.description, task.id))
            }
            ActionDescriptor::Update { id, description } => {
                let update = TaskUpdate {
                    description: description.clone(),
                };
                let task = self
                    .db
                    .update_task(user_id, *id, update)?
                    .ok_or(BotError::NotFound(*id))?;
                Ok(format!("Task updated: {} (ID: {})", task.description, task.id))
            }
            ActionDescriptor::Delete { id } => {
                if self.db.delete_task(user_id, *id)? {
                    Ok(TASK_DELETED.to_string())
                } else {
                    Err(BotError::NotFound(*id))
                }
            }
            ActionDescriptor::List => Ok(render_list(&self.db.list_tasks(user_id)?)),
        }
    }
}

/// One `ID: n, Description: text` line per task.
pub fn render_list(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return NO_TASKS_FOUND.to_string();
    }
    tasks
        .iter()
        .map(|t| format!("ID: {}, Description: {}", t.id, t.description))
        .collect::<Vec<_>>()
        .join("\n")
}
