//! User-facing flows
//!
//! Each flow is a one-shot request/response cycle that ends in a view
//! update. The view mutex is only held in the synchronous segments before
//! and after a request, never across an await.

pub mod chat;
pub mod crud;
pub mod history;
pub mod sessions;
pub mod upload;

use std::sync::Arc;

use chatdesk_core::view::{Toast, ViewState};
use parking_lot::Mutex;

use crate::api::ChatApi;
use crate::surface::{Navigator, Notifier};

pub use chat::{ChatSubmissionFlow, SubmitOutcome};
pub use crud::{CrudOutcome, SessionCrud};
pub use history::MessageHistorySync;
pub use sessions::SessionListSync;
pub use upload::{AttachmentUploadFlow, UploadOutcome};

/// View state shared between the page and its flows
pub type SharedView = Arc<Mutex<ViewState>>;

/// Result of a fetch-and-render cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Rendered this many items
    Loaded(usize),
    /// The request failed; the error text was logged
    Failed(String),
}

impl SyncOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, SyncOutcome::Loaded(_))
    }
}

/// Collaborators every flow needs
#[derive(Clone)]
pub struct FlowContext {
    pub api: Arc<ChatApi>,
    pub view: SharedView,
    pub notifier: Arc<dyn Notifier>,
    pub navigator: Arc<dyn Navigator>,
}

impl FlowContext {
    pub fn new(
        api: Arc<ChatApi>,
        view: SharedView,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            api,
            view,
            notifier,
            navigator,
        }
    }

    pub(crate) fn toast_error(&self, text: impl Into<String>) {
        self.notifier.toast(Toast::error(text));
    }
}
