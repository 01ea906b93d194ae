//! Task CRUD, scoped to the owning user.
//!
//! Every lookup filters on both `id` and `user_id`; that pair is the only
//! access control between chat users.

use super::{Database, now_ms};
use crate::error::BotError;
use crate::types::{NewTask, Task, TaskId, TaskUpdate, UserId};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
    })
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
fn get_task_internal(conn: &Connection, user_id: UserId, task_id: TaskId) -> Result<Option<Task>> {
    let task = conn
        .query_row(
            "SELECT id, user_id, description, created_at FROM tasks
             WHERE id = ?1 AND user_id = ?2",
            params![task_id, user_id],
            parse_task_row,
        )
        .optional()?;
    Ok(task)
}

impl Database {
    /// Create a new task for `user_id`.
    ///
    /// The description is trimmed and must not be empty.
    pub fn create_task(&self, user_id: UserId, input: NewTask) -> Result<Task> {
        let description = input.description.trim();
        if description.is_empty() {
            return Err(BotError::validation("description", "must not be empty").into());
        }
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO tasks (user_id, description, created_at) VALUES (?1, ?2, ?3)",
                params![user_id, description, now],
            )?;
            let id = tx.last_insert_rowid();

            tx.commit()?;
            debug!(user_id, task_id = id, "task created");

            Ok(Task {
                id,
                user_id,
                description: description.to_string(),
                created_at: now,
            })
        })
    }

    /// Get a task by ID. Returns `None` when it does not exist or is owned by someone else.
    pub fn get_task(&self, user_id: UserId, task_id: TaskId) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, user_id, task_id))
    }

    /// Update a task's description and return the re-read row.
    ///
    /// Only the description can change. A blank or absent description leaves
    /// the row as it is. Returns `None` when the task is not found.
    pub fn update_task(
        &self,
        user_id: UserId,
        task_id: TaskId,
        update: TaskUpdate,
    ) -> Result<Option<Task>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if get_task_internal(&tx, user_id, task_id)?.is_none() {
                return Ok(None);
            }

            if let Some(description) = update.new_description() {
                tx.execute(
                    "UPDATE tasks SET description = ?1 WHERE id = ?2 AND user_id = ?3",
                    params![description, task_id, user_id],
                )?;
            }

            let task = get_task_internal(&tx, user_id, task_id)?;
            tx.commit()?;
            debug!(user_id, task_id, "task updated");

            Ok(task)
        })
    }

    /// Delete a task. Returns `false` when there was nothing of the user's to delete.
    pub fn delete_task(&self, user_id: UserId, task_id: TaskId) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let removed = tx.execute(
                "DELETE FROM tasks WHERE id = ?1 AND user_id = ?2",
                params![task_id, user_id],
            )?;

            tx.commit()?;
            debug!(user_id, task_id, removed, "task delete");

            Ok(removed > 0)
        })
    }

    /// List a user's tasks in creation order.
    pub fn list_tasks(&self, user_id: UserId) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, description, created_at FROM tasks
                 WHERE user_id = ?1 ORDER BY id ASC",
            )?;
            let tasks = stmt
                .query_map(params![user_id], parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }
}
