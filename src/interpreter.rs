//! Free text to action descriptor.
//!
//! The user's message is embedded in an instruction template and handed to a
//! [`Completion`]. Its reply must follow one of two shapes:
//!
//! - a JSON object `{"action": "update", "id": 1, "description": "Buy milk"}`
//! - a single line `Action: update, ID: 1, Description: "Buy milk"`
//!
//! Both shapes go through the same field validation. Anything else is a
//! [`BotError::MalformedCompletion`].

use crate::config::INPUT_PLACEHOLDER;
use crate::error::{BotError, BotResult};
use crate::llm::Completion;
use crate::types::TaskId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Structured intent derived from a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionDescriptor {
    Create { description: String },
    Read { id: TaskId },
    /// A blank or missing description leaves the task unchanged; the reply
    /// still reads "Task updated".
    Update {
        id: TaskId,
        description: Option<String>,
    },
    Delete { id: TaskId },
    List,
}

impl ActionDescriptor {
    pub fn verb(&self) -> &'static str {
        match self {
            ActionDescriptor::Create { .. } => "create",
            ActionDescriptor::Read { .. } => "read",
            ActionDescriptor::Update { .. } => "update",
            ActionDescriptor::Delete { .. } => "delete",
            ActionDescriptor::List => "list",
        }
    }
}

impl fmt::Display for ActionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Turns chat text into an [`ActionDescriptor`] via a completion function.
#[derive(Clone)]
pub struct Interpreter {
    completion: Arc<dyn Completion>,
    template: String,
}

impl Interpreter {
    pub fn new(completion: Arc<dyn Completion>, template: impl Into<String>) -> Self {
        Self {
            completion,
            template: template.into(),
        }
    }

    /// Instruction text sent for `input`.
    pub fn prompt(&self, input: &str) -> String {
        self.template.replace(INPUT_PLACEHOLDER, input)
    }

    pub async fn interpret(&self, input: &str) -> BotResult<ActionDescriptor> {
        let output = self.completion.complete(&self.prompt(input)).await?;
        debug!(completion = %output, "completion received");
        parse_completion(&output)
    }
}

/// Parse a completion reply into an action.
pub fn parse_completion(output: &str) -> BotResult<ActionDescriptor> {
    let raw = if let Some(line) = output.lines().map(str::trim).find(|l| is_action_line(l)) {
        RawAction::from_line(line)?
    } else if let Some(json) = extract_json(output) {
        RawAction::from_json(json)?
    } else {
        return Err(BotError::malformed("no action found in completion"));
    };
    raw.into_descriptor()
}

/// Extract a JSON object from a reply that may carry surrounding text.
fn extract_json(output: &str) -> Option<&str> {
    let start = output.find('{')?;
    let end = output.rfind('}')?;
    if end < start {
        return None;
    }
    output.get(start..=end)
}

/// `Action:` at the start of a line, any case.
fn is_action_line(line: &str) -> bool {
    const KEY: &str = "action";
    match (line.get(..KEY.len()), line.get(KEY.len()..)) {
        (Some(head), Some(tail)) => {
            head.eq_ignore_ascii_case(KEY) && tail.trim_start().starts_with(':')
        }
        _ => false,
    }
}

/// Fields as they came out of the completion, before validation.
#[derive(Debug, Default)]
struct RawAction {
    action: Option<String>,
    id: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Action,
    Id,
    Description,
}

impl Field {
    fn from_key(key: &str) -> BotResult<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "action" => Ok(Field::Action),
            "id" => Ok(Field::Id),
            "description" => Ok(Field::Description),
            other => Err(BotError::malformed(format!("unknown field '{}'", other))),
        }
    }
}

impl RawAction {
    /// Every key must be a known field; `null` counts as absent.
    fn from_json(json: &str) -> BotResult<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| BotError::malformed(format!("invalid JSON: {}", e)))?;
        let obj = value
            .as_object()
            .ok_or_else(|| BotError::malformed("expected a JSON object"))?;

        let mut raw = RawAction::default();
        for (key, value) in obj {
            let field = Field::from_key(key)?;
            let text = match value {
                Value::Null => continue,
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                other => {
                    return Err(BotError::malformed(format!(
                        "field '{}' has unexpected value {}",
                        key, other
                    )));
                }
            };
            raw.set(field, &text)?;
        }

        Ok(raw)
    }

    /// Parse `Key: value, Key: "quoted, value"` pairs.
    ///
    /// An unquoted description runs to the end of the line.
    fn from_line(line: &str) -> BotResult<Self> {
        let mut raw = RawAction::default();
        let mut rest = line.trim();

        loop {
            let (key, after) = rest
                .split_once(':')
                .ok_or_else(|| BotError::malformed(format!("expected 'Key: value' in '{}'", rest)))?;
            let field = Field::from_key(key)?;
            let after = after.trim_start();

            let (value, remainder) = if let Some(quoted) = after.strip_prefix('"') {
                let end = quoted
                    .find('"')
                    .ok_or_else(|| BotError::malformed("unterminated quoted value"))?;
                (&quoted[..end], &quoted[end + 1..])
            } else if field == Field::Description {
                (after, "")
            } else {
                match after.find(',') {
                    Some(i) => (&after[..i], &after[i..]),
                    None => (after, ""),
                }
            };

            raw.set(field, value.trim())?;

            let remainder = remainder.trim_start();
            if remainder.is_empty() {
                break;
            }
            rest = remainder
                .strip_prefix(',')
                .ok_or_else(|| BotError::malformed(format!("unexpected text '{}'", remainder)))?
                .trim_start();
        }

        Ok(raw)
    }

    fn set(&mut self, field: Field, value: &str) -> BotResult<()> {
        let slot = match field {
            Field::Action => &mut self.action,
            Field::Id => &mut self.id,
            Field::Description => &mut self.description,
        };
        if slot.is_some() {
            return Err(BotError::malformed(format!("duplicate field {:?}", field)));
        }
        *slot = Some(value.to_string());
        Ok(())
    }

    fn id(&self) -> BotResult<TaskId> {
        let raw = self
            .id
            .as_deref()
            .ok_or_else(|| BotError::malformed("missing task id"))?;
        match raw.trim().parse::<TaskId>() {
            Ok(id) if id > 0 => Ok(id),
            _ => Err(BotError::malformed(format!("invalid task id '{}'", raw))),
        }
    }

    fn into_descriptor(self) -> BotResult<ActionDescriptor> {
        let verb = self
            .action
            .as_deref()
            .map(|a| a.trim().to_ascii_lowercase())
            .ok_or_else(|| BotError::malformed("missing action"))?;

        match verb.as_str() {
            "create" => {
                let description = self
                    .description
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty())
                    .ok_or_else(|| BotError::malformed("create requires a description"))?;
                Ok(ActionDescriptor::Create { description })
            }
            "read" => Ok(ActionDescriptor::Read { id: self.id()? }),
            "update" => {
                let id = self.id()?;
                Ok(ActionDescriptor::Update {
                    id,
                    description: self.description,
                })
            }
            "delete" => Ok(ActionDescriptor::Delete { id: self.id()? }),
            "list" => Ok(ActionDescriptor::List),
            other => Err(BotError::malformed(format!("unknown action '{}'", other))),
        }
    }
}
