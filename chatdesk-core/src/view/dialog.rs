//! Session dialogs and their local validation

use thiserror::Error;

/// Modal opened from the new-session button or an entry's action menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionDialog {
    NewSession {
        name: String,
    },
    Rename {
        session_id: Option<String>,
        name: String,
    },
    Delete {
        session_id: Option<String>,
        name: String,
    },
    Attachments {
        session_id: Option<String>,
        name: String,
    },
}

/// Rejections raised before any request is made
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DialogError {
    #[error("请输入对话名称")]
    MissingName,
    #[error("未获取到当前对话ID")]
    MissingSessionId,
    #[error("附件对话框没有可提交的修改")]
    NothingToSubmit,
}

/// A validated session change ready to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionMutation {
    Create { name: String },
    Rename { session_id: String, name: String },
    Delete { session_id: String },
}

impl SessionMutation {
    /// Label used in failure toasts
    pub fn label(&self) -> &'static str {
        match self {
            SessionMutation::Create { .. } => "新建对话",
            SessionMutation::Rename { .. } => "修改对话",
            SessionMutation::Delete { .. } => "删除对话",
        }
    }
}

impl SessionDialog {
    /// Blank new-session dialog
    pub fn new_session() -> Self {
        SessionDialog::NewSession {
            name: String::new(),
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        match self {
            SessionDialog::NewSession { .. } => None,
            SessionDialog::Rename { session_id, .. }
            | SessionDialog::Delete { session_id, .. }
            | SessionDialog::Attachments { session_id, .. } => session_id.as_deref(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SessionDialog::NewSession { name }
            | SessionDialog::Rename { name, .. }
            | SessionDialog::Delete { name, .. }
            | SessionDialog::Attachments { name, .. } => name,
        }
    }

    /// Edit the name field
    pub fn set_name(&mut self, value: impl Into<String>) {
        match self {
            SessionDialog::NewSession { name }
            | SessionDialog::Rename { name, .. }
            | SessionDialog::Delete { name, .. }
            | SessionDialog::Attachments { name, .. } => *name = value.into(),
        }
    }

    /// Check required fields and produce the request to send
    pub fn validate(&self) -> Result<SessionMutation, DialogError> {
        match self {
            SessionDialog::NewSession { name } => Ok(SessionMutation::Create {
                name: required_name(name)?,
            }),
            SessionDialog::Rename { session_id, name } => {
                let name = required_name(name)?;
                Ok(SessionMutation::Rename {
                    session_id: required_id(session_id)?,
                    name,
                })
            }
            SessionDialog::Delete { session_id, .. } => Ok(SessionMutation::Delete {
                session_id: required_id(session_id)?,
            }),
            SessionDialog::Attachments { .. } => Err(DialogError::NothingToSubmit),
        }
    }
}

fn required_name(name: &str) -> Result<String, DialogError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(DialogError::MissingName)
    } else {
        Ok(trimmed.to_string())
    }
}

fn required_id(session_id: &Option<String>) -> Result<String, DialogError> {
    match session_id.as_deref() {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(DialogError::MissingSessionId),
    }
}
