//! Core types for the task bot.

use serde::{Deserialize, Serialize};

/// Opaque identifier of the chat user that owns a task.
pub type UserId = i64;

/// Store-assigned task identifier. Monotonic, never reused.
pub type TaskId = i64;

/// A task owned by one chat user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub user_id: UserId,
    pub description: String,
    /// Creation time in UTC epoch milliseconds. Set once.
    pub created_at: i64,
}

/// Request shape for creating a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub description: String,
}

impl NewTask {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// Request shape for updating a task.
///
/// `None`, empty and whitespace-only descriptions all leave the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    #[serde(default)]
    pub description: Option<String>,
}

impl TaskUpdate {
    pub fn description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
        }
    }

    /// The replacement description, if this update carries a usable one.
    pub fn new_description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_update_carries_no_description() {
        assert_eq!(TaskUpdate::default().new_description(), None);
        assert_eq!(TaskUpdate::description("").new_description(), None);
        assert_eq!(TaskUpdate::description("   ").new_description(), None);
        assert_eq!(
            TaskUpdate::description("  Call mum ").new_description(),
            Some("Call mum")
        );
    }
}
