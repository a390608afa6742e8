//! Message history synchronization

use tracing::{error, info};

use super::{FlowContext, SyncOutcome};

pub const HISTORY_LOAD_FAILED: &str = "加载历史消息失败";

/// Fetches and renders the ordered message log of one session
pub struct MessageHistorySync {
    ctx: FlowContext,
}

impl MessageHistorySync {
    pub fn new(ctx: FlowContext) -> Self {
        Self { ctx }
    }

    /// The pane is emptied before the request goes out, so a failed load
    /// leaves it empty rather than showing another session's history.
    pub async fn load(&self, session_id: &str) -> SyncOutcome {
        self.ctx.view.lock().messages.clear();

        match self.ctx.api.list_messages(session_id).await {
            Ok(messages) => {
                let mut view = self.ctx.view.lock();
                view.messages.replace_all(&messages);
                view.messages.scroll_to_bottom();
                info!("Rendered {} messages of session {}", messages.len(), session_id);
                SyncOutcome::Loaded(messages.len())
            }
            Err(e) => {
                error!("{}: {}", HISTORY_LOAD_FAILED, e);
                self.ctx.toast_error(HISTORY_LOAD_FAILED);
                SyncOutcome::Failed(e.to_string())
            }
        }
    }
}
