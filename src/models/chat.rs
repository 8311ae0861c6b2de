use serde::{ Deserialize, Serialize };
use std::fmt;

pub type ThreadId = String;
pub type RunId = String;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    /// Any other author (system, tool, ...). Never rendered as a reply.
    #[serde(other)]
    Other,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Other => write!(f, "other"),
        }
    }
}

/// One entry of the visible transcript.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub text: String,
    pub created_at: i64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Thread {
    pub id: ThreadId,
    #[serde(default)]
    pub created_at: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub value: String,
}

/// A content segment of a thread message. Only text segments are rendered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: TextContent },
    #[serde(other)]
    Other,
}

impl MessageContent {
    pub fn text(value: impl Into<String>) -> Self {
        MessageContent::Text { text: TextContent { value: value.into() } }
    }
}

/// A message as stored by the provider on a thread.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub content: Vec<MessageContent>,
    #[serde(default)]
    pub created_at: i64,
}

impl ThreadMessage {
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| match part {
                MessageContent::Text { text } => Some(text.value.as_str()),
                MessageContent::Other => None,
            })
            .collect()
    }

    pub fn to_chat_message(&self) -> ChatMessage {
        ChatMessage {
            id: self.id.clone(),
            role: self.role,
            text: self.text(),
            created_at: self.created_at,
        }
    }
}

/// Run status as reported by the provider. Statuses this client does not
/// know are kept verbatim and treated as still running.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
    Cancelled,
    Expired,
    Other(String),
}

impl RunStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Expired => "expired",
            RunStatus::Other(s) => s.as_str(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, RunStatus::Failed | RunStatus::Cancelled | RunStatus::Expired)
    }

    pub fn is_terminal(&self) -> bool {
        *self == RunStatus::Completed || self.is_failure()
    }
}

impl From<String> for RunStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "queued" => RunStatus::Queued,
            "in_progress" => RunStatus::InProgress,
            "completed" => RunStatus::Completed,
            "failed" => RunStatus::Failed,
            "cancelled" => RunStatus::Cancelled,
            "expired" => RunStatus::Expired,
            _ => RunStatus::Other(s),
        }
    }
}

impl From<&str> for RunStatus {
    fn from(s: &str) -> Self {
        RunStatus::from(s.to_string())
    }
}

impl From<RunStatus> for String {
    fn from(status: RunStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RunError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub thread_id: ThreadId,
    #[serde(default)]
    pub assistant_id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_status_is_not_terminal() {
        let status = RunStatus::from("requires_action");
        assert_eq!(status, RunStatus::Other("requires_action".into()));
        assert!(!status.is_terminal());
        assert_eq!(status.to_string(), "requires_action");
    }

    #[test]
    fn failure_statuses_are_terminal() {
        for s in ["failed", "cancelled", "expired"] {
            let status = RunStatus::from(s);
            assert!(status.is_failure(), "{s}");
            assert!(status.is_terminal(), "{s}");
        }
        assert!(RunStatus::Completed.is_terminal());
        assert!(!RunStatus::Completed.is_failure());
        assert!(!RunStatus::Queued.is_terminal());
    }

    #[test]
    fn message_text_skips_non_text_parts() {
        let raw = serde_json::json!({
            "id": "msg_1",
            "role": "assistant",
            "created_at": 1700000000,
            "content": [
                { "type": "text", "text": { "value": "Hola", "annotations": [] } },
                { "type": "image_file", "image_file": { "file_id": "file_9" } },
                { "type": "text", "text": { "value": ", mundo", "annotations": [] } }
            ]
        });
        let msg: ThreadMessage = serde_json::from_value(raw).unwrap();
        assert_eq!(msg.content.len(), 3);
        assert_eq!(msg.text(), "Hola, mundo");
    }

    #[test]
    fn unknown_role_does_not_break_the_page() {
        let raw = serde_json::json!([
            { "id": "msg_3", "role": "system", "content": [] },
            { "id": "msg_2", "role": "assistant", "content": [
                { "type": "text", "text": { "value": "Hola" } }
            ] }
        ]);
        let page: Vec<ThreadMessage> = serde_json::from_value(raw).unwrap();
        assert_eq!(page[0].role, Role::Other);
        assert_eq!(page[1].role, Role::Assistant);
    }
}
