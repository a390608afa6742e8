//! Records exchanged with the chat backend

use serde::{Deserialize, Serialize};

/// Label shown for a session that was never named
pub const UNNAMED_SESSION_LABEL: &str = "未命名对话";

/// A named conversation thread persisted by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Session {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
        }
    }

    /// Name to display, falling back to the unnamed label when absent or empty
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => UNNAMED_SESSION_LABEL,
        }
    }
}

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a session's history; `content` is markdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// A file attached to a session; `filepath` is the download location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub filepath: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_fallback() {
        assert_eq!(Session::new("a", "Trip").display_name(), "Trip");
        assert_eq!(Session::new("b", "").display_name(), UNNAMED_SESSION_LABEL);

        let unnamed: Session = serde_json::from_str(r#"{"id":"c","name":null}"#).unwrap();
        assert_eq!(unnamed.display_name(), UNNAMED_SESSION_LABEL);

        let missing: Session = serde_json::from_str(r#"{"id":"d"}"#).unwrap();
        assert_eq!(missing.name, None);
    }

    #[test]
    fn test_role_wire_format() {
        let msg: Message =
            serde_json::from_str(r#"{"role":"assistant","content":"**hi**"}"#).unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert!(serde_json::from_str::<Role>("\"system\"").is_err());
    }
}
