//! Request-body schemas.
//!
//! Each schema walks its keys in declaration order and stops at the first
//! failing rule, so a response always carries exactly one message. String
//! values are trimmed before length checks and the trimmed value is what
//! gets persisted. Keys outside the schema are rejected once every declared
//! key has passed.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{AskRequest, ProjectInput, TaskInput, TaskStatus};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Message overrides for a single string key. `None` falls back to the
/// generic wording that quotes the key name.
#[derive(Default)]
struct Messages {
    required: Option<&'static str>,
    empty: Option<&'static str>,
    min: Option<&'static str>,
    format: Option<&'static str>,
}

struct StringRule {
    key: &'static str,
    required: bool,
    allow_empty: bool,
    min: Option<usize>,
    max: Option<usize>,
    hex_len: Option<usize>,
    messages: Messages,
}

impl StringRule {
    fn new(key: &'static str) -> Self {
        Self {
            key,
            required: false,
            allow_empty: false,
            min: None,
            max: None,
            hex_len: None,
            messages: Messages::default(),
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn allow_empty(mut self) -> Self {
        self.allow_empty = true;
        self
    }

    fn length(mut self, min: Option<usize>, max: usize) -> Self {
        self.min = min;
        self.max = Some(max);
        self
    }

    fn hex(mut self, len: usize) -> Self {
        self.hex_len = Some(len);
        self
    }

    fn messages(mut self, messages: Messages) -> Self {
        self.messages = messages;
        self
    }

    fn fail(&self, custom: Option<&'static str>, generic: String) -> ValidationError {
        ValidationError::new(custom.map(str::to_string).unwrap_or(generic))
    }

    /// Returns the trimmed value, or `None` when an optional key is absent.
    fn check(&self, body: &Map<String, Value>) -> Result<Option<String>, ValidationError> {
        let key = self.key;
        let raw = match body.get(key) {
            None => {
                if self.required {
                    return Err(self.fail(
                        self.messages.required,
                        format!("\"{}\" is required", key),
                    ));
                }
                return Ok(None);
            }
            Some(Value::String(s)) => s,
            Some(_) => return Err(ValidationError::new(format!("\"{}\" must be a string", key))),
        };

        let value = raw.trim();
        if value.is_empty() {
            if self.allow_empty {
                return Ok(Some(String::new()));
            }
            return Err(self.fail(
                self.messages.empty,
                format!("\"{}\" is not allowed to be empty", key),
            ));
        }

        if let Some(len) = self.hex_len {
            if !value.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(self.fail(
                    self.messages.format,
                    format!("\"{}\" must only contain hexadecimal characters", key),
                ));
            }
            if value.chars().count() != len {
                return Err(self.fail(
                    self.messages.format,
                    format!("\"{}\" length must be {} characters long", key, len),
                ));
            }
        }

        let count = value.chars().count();
        if let Some(min) = self.min {
            if count < min {
                return Err(self.fail(
                    self.messages.min,
                    format!("\"{}\" length must be at least {} characters long", key, min),
                ));
            }
        }
        if let Some(max) = self.max {
            if count > max {
                return Err(ValidationError::new(format!(
                    "\"{}\" length must be less than or equal to {} characters long",
                    key, max
                )));
            }
        }

        Ok(Some(value.to_string()))
    }
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, ValidationError> {
    body.as_object()
        .ok_or_else(|| ValidationError::new("\"value\" must be of type object"))
}

fn reject_unknown_keys(body: &Map<String, Value>, allowed: &[&str]) -> Result<(), ValidationError> {
    match body.keys().find(|k| !allowed.contains(&k.as_str())) {
        Some(key) => Err(ValidationError::new(format!("\"{}\" is not allowed", key))),
        None => Ok(()),
    }
}

fn status_message() -> String {
    let names: Vec<&str> = TaskStatus::ALL.iter().map(TaskStatus::as_str).collect();
    format!("\"status\" must be one of [{}]", names.join(", "))
}

fn check_status(body: &Map<String, Value>, required: bool) -> Result<Option<TaskStatus>, ValidationError> {
    match body.get("status") {
        None if required => Err(ValidationError::new("\"status\" is required")),
        None => Ok(None),
        Some(Value::String(s)) => s
            .parse::<TaskStatus>()
            .map(Some)
            .map_err(|_| ValidationError::new(status_message())),
        Some(_) => Err(ValidationError::new(status_message())),
    }
}

fn project_name_rule() -> StringRule {
    StringRule::new("name")
        .required()
        .length(Some(3), 100)
        .messages(Messages {
            empty: Some("Project name is required."),
            min: Some("Project name must be at least 3 characters long."),
            ..Messages::default()
        })
}

fn project_description_rule() -> StringRule {
    StringRule::new("description")
        .required()
        .length(Some(10), 500)
        .messages(Messages {
            empty: Some("Project description is required."),
            min: Some("Project description must be at least 10 characters long."),
            ..Messages::default()
        })
}

/// Validate a project create/update body: `{ name, description }`.
pub fn validate_project(body: &Value) -> Result<ProjectInput, ValidationError> {
    let body = as_object(body)?;
    let name = project_name_rule().check(body)?.unwrap_or_default();
    let description = project_description_rule().check(body)?.unwrap_or_default();
    reject_unknown_keys(body, &["name", "description"])?;
    Ok(ProjectInput { name, description })
}

/// Validate a task create/update body: `{ title, description?, project, status? }`.
pub fn validate_task(body: &Value) -> Result<TaskInput, ValidationError> {
    let body = as_object(body)?;
    let title = StringRule::new("title")
        .required()
        .length(Some(3), 100)
        .check(body)?
        .unwrap_or_default();
    let description = StringRule::new("description")
        .allow_empty()
        .length(None, 500)
        .check(body)?;
    let project = StringRule::new("project")
        .required()
        .hex(24)
        .messages(Messages {
            required: Some("Project ID is required for a task."),
            format: Some("Invalid Project ID format."),
            ..Messages::default()
        })
        .check(body)?
        .unwrap_or_default();
    let status = check_status(body, false)?;
    reject_unknown_keys(body, &["title", "description", "project", "status"])?;
    Ok(TaskInput {
        title,
        description,
        project,
        status,
    })
}

/// Validate a status-only update body: `{ status }`.
pub fn validate_status_update(body: &Value) -> Result<TaskStatus, ValidationError> {
    let body = as_object(body)?;
    let status = check_status(body, true)?.unwrap_or_default();
    reject_unknown_keys(body, &["status"])?;
    Ok(status)
}

/// Validate an AI question body. All three fields must be present and
/// non-empty; there is no per-field message.
pub fn validate_ask(body: &Value) -> Result<AskRequest, ValidationError> {
    const MESSAGE: &str = "Question, taskId, and contextType are required";
    let field = |key: &str| -> Result<String, ValidationError> {
        body.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| ValidationError::new(MESSAGE))
    };
    Ok(AskRequest {
        question: field("question")?,
        task_id: field("taskId")?,
        context_type: field("contextType")?,
    })
}
