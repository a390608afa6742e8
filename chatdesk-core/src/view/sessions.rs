//! Session list view model

use crate::model::Session;
use crate::view::dialog::SessionDialog;

/// Per-entry action menu item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Delete,
    ViewAttachments,
    Rename,
}

impl SessionAction {
    /// Menu order as rendered
    pub const ALL: [SessionAction; 3] = [
        SessionAction::Delete,
        SessionAction::ViewAttachments,
        SessionAction::Rename,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionAction::Delete => "delete",
            SessionAction::ViewAttachments => "attachments",
            SessionAction::Rename => "rename",
        }
    }
}

/// Link that selects a session on page load
pub fn session_href(session_id: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(session_id.as_bytes()).collect();
    format!("/?session_id={}", encoded)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntry {
    pub id: String,
    pub label: String,
    pub href: String,
    pub active: bool,
}

impl SessionEntry {
    pub fn from_session(session: &Session, active_id: Option<&str>) -> Self {
        Self {
            id: session.id.clone(),
            label: session.display_name().to_string(),
            href: session_href(&session.id),
            active: active_id == Some(session.id.as_str()),
        }
    }

    /// Dialog seeded with this entry's id and label
    pub fn dialog_for(&self, action: SessionAction) -> SessionDialog {
        let session_id = Some(self.id.clone());
        let name = self.label.trim().to_string();
        match action {
            SessionAction::Delete => SessionDialog::Delete { session_id, name },
            SessionAction::Rename => SessionDialog::Rename { session_id, name },
            SessionAction::ViewAttachments => SessionDialog::Attachments { session_id, name },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionList {
    entries: Vec<SessionEntry>,
}

impl SessionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build entries in backend order, marking the one matching `active_id`
    pub fn build(sessions: &[Session], active_id: Option<&str>) -> Vec<SessionEntry> {
        sessions
            .iter()
            .map(|s| SessionEntry::from_session(s, active_id))
            .collect()
    }

    pub fn replace(&mut self, entries: Vec<SessionEntry>) {
        self.entries = entries;
    }

    pub fn entries(&self) -> &[SessionEntry] {
        &self.entries
    }

    pub fn find(&self, session_id: &str) -> Option<&SessionEntry> {
        self.entries.iter().find(|e| e.id == session_id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_marks_active_and_falls_back() {
        let sessions = vec![Session::new("a", "Trip"), Session::new("b", "")];
        let entries = SessionList::build(&sessions, Some("b"));

        assert_eq!(entries[0].label, "Trip");
        assert!(!entries[0].active);
        assert_eq!(entries[1].label, "未命名对话");
        assert!(entries[1].active);
        assert_eq!(entries[1].href, "/?session_id=b");
        assert_eq!(session_href("a&b#c d"), "/?session_id=a%26b%23c+d");
    }

    #[test]
    fn test_build_without_active_id() {
        let sessions = vec![Session::new("a", "Trip")];
        let entries = SessionList::build(&sessions, None);
        assert!(entries.iter().all(|e| !e.active));
    }

    #[test]
    fn test_dialog_seeding() {
        let entry = SessionEntry::from_session(&Session::new("a", "Trip"), None);
        assert_eq!(
            entry.dialog_for(SessionAction::Rename),
            SessionDialog::Rename {
                session_id: Some("a".to_string()),
                name: "Trip".to_string()
            }
        );
        assert_eq!(entry.dialog_for(SessionAction::Delete).session_id(), Some("a"));
    }
}
