//! The chat page: view state plus every flow that mutates it

use std::sync::Arc;

use chatdesk_core::render::render_page;
use chatdesk_core::view::{SessionAction, SessionDialog, ViewState};
use parking_lot::Mutex;
use reqwest::Url;
use tracing::{debug, warn};

use crate::api::{ChatApi, FileUpload};
use crate::error::{ClientError, ClientResult};
use crate::flows::{
    AttachmentUploadFlow, ChatSubmissionFlow, CrudOutcome, FlowContext, MessageHistorySync,
    SessionCrud, SessionListSync, SharedView, SubmitOutcome, SyncOutcome, UploadOutcome,
};
use crate::surface::{Navigator, Notifier};

/// What the page address tells us
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContext {
    pub active_session: Option<String>,
}

impl PageContext {
    pub fn new(active_session: Option<String>) -> Self {
        Self {
            active_session: active_session.filter(|id| !id.is_empty()),
        }
    }

    /// Read the `session_id` query parameter of a page URL. Relative
    /// locations such as `/?session_id=a` are accepted.
    pub fn from_url(location: &str) -> ClientResult<Self> {
        let url = Url::parse(location)
            .or_else(|_| Url::parse("http://localhost/").and_then(|base| base.join(location)))
            .map_err(|e| ClientError::Url(format!("{}: {}", location, e)))?;
        let session = url
            .query_pairs()
            .find(|(key, _)| key == "session_id")
            .map(|(_, value)| value.into_owned());
        Ok(Self::new(session))
    }
}

/// Results of the initial page load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLoad {
    pub sessions: SyncOutcome,
    /// `None` when no session is selected
    pub history: Option<SyncOutcome>,
}

pub struct ChatPage {
    ctx: FlowContext,
    page: PageContext,
}

impl ChatPage {
    pub fn new(
        api: ChatApi,
        page: PageContext,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let view: SharedView = Arc::new(Mutex::new(ViewState::new()));
        Self {
            ctx: FlowContext::new(Arc::new(api), view, notifier, navigator),
            page,
        }
    }

    pub fn from_context(ctx: FlowContext, page: PageContext) -> Self {
        Self { ctx, page }
    }

    pub fn view(&self) -> SharedView {
        Arc::clone(&self.ctx.view)
    }

    pub fn active_session(&self) -> Option<&str> {
        self.page.active_session.as_deref()
    }

    /// Fetch only the sidebar, marking the active session
    pub async fn load_sessions(&self) -> SyncOutcome {
        SessionListSync::new(self.ctx.clone(), self.page.active_session.clone())
            .load()
            .await
    }

    /// Fetch the session list and the active session's history concurrently
    pub async fn load(&self) -> PageLoad {
        let sessions = SessionListSync::new(self.ctx.clone(), self.page.active_session.clone());
        let history = MessageHistorySync::new(self.ctx.clone());

        match self.active_session() {
            Some(session_id) => {
                let (sessions, history) = tokio::join!(sessions.load(), history.load(session_id));
                PageLoad {
                    sessions,
                    history: Some(history),
                }
            }
            None => PageLoad {
                sessions: sessions.load().await,
                history: None,
            },
        }
    }

    pub fn set_composer(&self, text: impl Into<String>) {
        self.ctx.view.lock().composer = text.into();
    }

    /// Send whatever is in the input box to the active session
    pub async fn submit(&self) -> SubmitOutcome {
        let text = self.ctx.view.lock().composer.clone();
        self.submit_text(&text).await
    }

    pub async fn submit_text(&self, text: &str) -> SubmitOutcome {
        let Some(session_id) = self.active_session() else {
            warn!("No active session, message not sent");
            return SubmitOutcome::Rejected;
        };
        ChatSubmissionFlow::new(self.ctx.clone())
            .submit(session_id, text)
            .await
    }

    /// Upload from the chat input to the active session
    pub async fn upload(&self, file: FileUpload) -> Option<UploadOutcome> {
        let Some(session_id) = self.active_session() else {
            warn!("No active session, upload skipped");
            return None;
        };
        Some(
            AttachmentUploadFlow::new(self.ctx.clone())
                .upload_inline(session_id, file)
                .await,
        )
    }

    /// Open the dialog for `action` on a listed session. The attachments
    /// dialog also loads that session's attachments.
    pub async fn open_action(&self, session_id: &str, action: SessionAction) -> Option<SessionDialog> {
        let dialog = {
            let mut view = self.ctx.view.lock();
            let entry = view.sessions.find(session_id)?;
            let dialog = entry.dialog_for(action);
            view.dialog = Some(dialog.clone());
            dialog
        };
        debug!("Opened {} dialog for {}", action.as_str(), session_id);

        if action == SessionAction::ViewAttachments {
            self.load_attachments(session_id).await;
        }
        Some(dialog)
    }

    pub fn open_new_session(&self) {
        self.open_dialog(SessionDialog::new_session());
    }

    /// Open an already seeded dialog, for hosts that know the session
    /// without the sidebar list. An attachments dialog for another session
    /// empties the shown list until `load_attachments` refills it.
    pub fn open_dialog(&self, dialog: SessionDialog) {
        let mut view = self.ctx.view.lock();
        if let SessionDialog::Attachments { session_id, .. } = &dialog {
            if view.attachments.session_id() != session_id.as_deref() {
                view.attachments.reset();
            }
        }
        view.dialog = Some(dialog);
    }

    pub async fn load_attachments(&self, session_id: &str) -> SyncOutcome {
        AttachmentUploadFlow::new(self.ctx.clone())
            .load_attachments(session_id)
            .await
    }

    pub fn set_dialog_name(&self, name: impl Into<String>) {
        if let Some(dialog) = self.ctx.view.lock().dialog.as_mut() {
            dialog.set_name(name);
        }
    }

    pub fn close_dialog(&self) {
        self.ctx.view.lock().dialog = None;
    }

    /// Confirm the open dialog; `None` when no dialog is open
    pub async fn confirm_dialog(&self) -> Option<CrudOutcome> {
        let dialog = self.ctx.view.lock().dialog.clone()?;
        let outcome = SessionCrud::new(self.ctx.clone()).confirm(&dialog).await;
        if matches!(outcome, CrudOutcome::Navigated(_) | CrudOutcome::Reloaded) {
            self.close_dialog();
        }
        Some(outcome)
    }

    /// Upload into the session of the open attachments dialog
    pub async fn upload_to_dialog_session(&self, file: FileUpload) -> Option<UploadOutcome> {
        let session_id = {
            let view = self.ctx.view.lock();
            match view.dialog.as_ref() {
                Some(SessionDialog::Attachments { session_id, .. }) => session_id.clone(),
                _ => None,
            }
        }?;
        Some(
            AttachmentUploadFlow::new(self.ctx.clone())
                .upload_to_session(&session_id, file)
                .await,
        )
    }

    pub fn render(&self) -> String {
        render_page(&self.ctx.view.lock())
    }
}
