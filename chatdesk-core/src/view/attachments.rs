//! Attachments list shown in the per-session dialog

use crate::model::Attachment;

pub const ATTACHMENTS_LOAD_FAILED: &str = "加载引用资料失败";

#[derive(Debug, Clone, Default)]
pub struct AttachmentList {
    session_id: Option<String>,
    items: Vec<Attachment>,
    notice: Option<String>,
}

impl AttachmentList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list with the attachments of `session_id`
    pub fn replace(&mut self, session_id: &str, items: Vec<Attachment>) {
        self.session_id = Some(session_id.to_string());
        self.items = items;
        self.notice = None;
    }

    /// Append a freshly uploaded file. Ignored unless the list currently
    /// shows `session_id`.
    pub fn push(&mut self, session_id: &str, item: Attachment) -> bool {
        if self.session_id() != Some(session_id) {
            return false;
        }
        self.notice = None;
        self.items.push(item);
        true
    }

    /// Forget the contents, leaving no session shown
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Replace the contents with a single notice line
    pub fn show_notice(&mut self, session_id: &str, text: impl Into<String>) {
        self.session_id = Some(session_id.to_string());
        self.items.clear();
        self.notice = Some(text.into());
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn items(&self) -> &[Attachment] {
        &self.items
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }
}
