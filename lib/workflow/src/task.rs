//! Remote task status as reported by the cluster.
//!
//! The status endpoint answers with an array holding one object:
//! `[{"state": "...", "formattedMessage": "...", "messageParameters": [...]}]`.
//! A bare object is accepted too.

use serde_json::Value as JsonValue;
use std::fmt;

/// State of a remote task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    /// Accepted but not started (`PENDING`, `QUEUED`, `UNINITIALIZED`).
    Pending,
    /// In progress.
    Running,
    /// Finished successfully.
    Complete,
    /// Finished with an error.
    Error,
    /// A state this client does not know; treated as still in progress.
    Unknown(String),
}

impl TaskState {
    /// Parses the wire representation.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "PENDING" | "QUEUED" | "UNINITIALIZED" => Self::Pending,
            "RUNNING" => Self::Running,
            "COMPLETE" => Self::Complete,
            "ERROR" => Self::Error,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Returns true for COMPLETE and ERROR.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("PENDING"),
            Self::Running => f.write_str("RUNNING"),
            Self::Complete => f.write_str("COMPLETE"),
            Self::Error => f.write_str("ERROR"),
            Self::Unknown(raw) => f.write_str(raw),
        }
    }
}

/// One status observation of a task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskStatus {
    /// Current state.
    pub state: TaskState,
    /// Formatted message, populated for ERROR.
    pub message: String,
    /// Message parameters, populated for ERROR.
    pub parameters: JsonValue,
}

impl TaskStatus {
    /// Decodes a status response body.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the body has no task object or
    /// the object has no string `state`.
    pub fn from_body(body: &JsonValue) -> Result<Self, String> {
        let object = match body {
            JsonValue::Array(items) => items
                .first()
                .ok_or_else(|| "empty status list".to_string())?,
            JsonValue::Object(_) => body,
            other => return Err(format!("expected status object, got {other}")),
        };

        let state = object
            .get("state")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| "status has no 'state'".to_string())?;

        Ok(Self {
            state: TaskState::parse(state),
            message: object
                .get("formattedMessage")
                .and_then(JsonValue::as_str)
                .unwrap_or_default()
                .to_string(),
            parameters: object
                .get("messageParameters")
                .cloned()
                .unwrap_or(JsonValue::Null),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_array_wrapped_error() {
        let body = json!([{
            "state": "ERROR",
            "formattedMessage": "Insufficient resources",
            "messageParameters": {"required": "8GB"}
        }]);

        let status = TaskStatus::from_body(&body).unwrap();

        assert_eq!(status.state, TaskState::Error);
        assert_eq!(status.message, "Insufficient resources");
        assert_eq!(status.parameters, json!({"required": "8GB"}));
    }

    #[test]
    fn parses_bare_object() {
        let status = TaskStatus::from_body(&json!({"state": "RUNNING"})).unwrap();
        assert_eq!(status.state, TaskState::Running);
        assert_eq!(status.message, "");
        assert_eq!(status.parameters, JsonValue::Null);
    }

    #[test]
    fn rejects_malformed_bodies() {
        assert!(TaskStatus::from_body(&json!([])).is_err());
        assert!(TaskStatus::from_body(&json!("COMPLETE")).is_err());
        assert!(TaskStatus::from_body(&json!([{"progress": 3}])).is_err());
    }

    #[test]
    fn state_classification() {
        assert_eq!(TaskState::parse("QUEUED"), TaskState::Pending);
        assert!(TaskState::parse("COMPLETE").is_terminal());
        assert!(TaskState::parse("ERROR").is_terminal());
        assert!(!TaskState::parse("RUNNING").is_terminal());
        let unknown = TaskState::parse("PAUSED");
        assert!(!unknown.is_terminal());
        assert_eq!(unknown.to_string(), "PAUSED");
    }
}
