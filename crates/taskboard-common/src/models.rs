use std::fmt;
use std::str::FromStr;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Board column a task sits in. The set is closed; there are no custom states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Done")]
    Done,
}

impl TaskStatus {
    /// Column order used by the board and by validation messages.
    pub const ALL: [TaskStatus; 3] = [Self::ToDo, Self::InProgress, Self::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToDo => "To Do",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
        }
    }

    /// Position of the status in [`TaskStatus::ALL`].
    pub fn index(&self) -> usize {
        match self {
            Self::ToDo => 0,
            Self::InProgress => 1,
            Self::Done => 2,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "To Do" => Ok(Self::ToDo),
            "In Progress" => Ok(Self::InProgress),
            "Done" => Ok(Self::Done),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    /// Id of the owning project.
    pub project: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "deletedAt", default)]
    pub deleted_at: Option<String>,
}

impl Task {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Validated body for project create/update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInput {
    pub name: String,
    pub description: String,
}

/// Validated body for task create/update.
///
/// `description` is `None` when the key was absent, which leaves the stored
/// value untouched on update and defaults to empty on create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInput {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub project: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: TaskStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(rename = "taskId")]
    pub task_id: String,
    #[serde(rename = "contextType")]
    pub context_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Generate a 24-character lowercase hex identifier.
pub fn new_object_id() -> String {
    uuid::Uuid::new_v4().as_bytes()[..12]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Whether `s` has the shape of an identifier produced by [`new_object_id`].
pub fn is_object_id(s: &str) -> bool {
    s.len() == 24 && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Current UTC time as RFC 3339 with millisecond precision.
///
/// Values produced here sort lexically in creation order.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_with_display_names() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"In Progress\""
        );
        let parsed: TaskStatus = serde_json::from_str("\"To Do\"").unwrap();
        assert_eq!(parsed, TaskStatus::ToDo);
    }

    #[test]
    fn status_from_str_rejects_unknown() {
        assert_eq!("Done".parse::<TaskStatus>().unwrap(), TaskStatus::Done);
        assert!("done".parse::<TaskStatus>().is_err());
        assert!("Blocked".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn status_index_matches_all_order() {
        for (i, status) in TaskStatus::ALL.iter().enumerate() {
            assert_eq!(status.index(), i);
        }
    }

    #[test]
    fn task_uses_client_field_names() {
        let task = Task {
            id: "a".repeat(24),
            title: "Draft brief".into(),
            description: String::new(),
            status: TaskStatus::ToDo,
            project: "b".repeat(24),
            created_at: "2026-01-01T00:00:00.000Z".into(),
            deleted_at: None,
        };
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["_id"], "a".repeat(24));
        assert_eq!(json["status"], "To Do");
        assert_eq!(json["createdAt"], "2026-01-01T00:00:00.000Z");
        assert!(json["deletedAt"].is_null());
    }

    #[test]
    fn task_deserializes_without_deleted_at() {
        let json = serde_json::json!({
            "_id": "t1",
            "title": "Write docs",
            "description": "",
            "status": "Done",
            "project": "p1",
            "createdAt": "2026-01-01T00:00:00.000Z"
        });
        let task: Task = serde_json::from_value(json).unwrap();
        assert!(!task.is_deleted());
        assert_eq!(task.status, TaskStatus::Done);
    }

    #[test]
    fn object_ids_are_24_hex_and_unique() {
        let a = new_object_id();
        let b = new_object_id();
        assert!(is_object_id(&a));
        assert!(is_object_id(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn is_object_id_rejects_bad_shapes() {
        assert!(!is_object_id("local-123"));
        assert!(!is_object_id(&"z".repeat(24)));
        assert!(!is_object_id(&"a".repeat(23)));
        assert!(is_object_id(&"AbCdEf012345".repeat(2)));
    }

    #[test]
    fn timestamps_sort_in_creation_order() {
        let first = now_timestamp();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = now_timestamp();
        assert!(first < second);
    }
}
