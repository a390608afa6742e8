//! Session list synchronization

use chatdesk_core::view::SessionList;
use tracing::{error, info};

use super::{FlowContext, SyncOutcome};

pub const SESSIONS_LOAD_FAILED: &str = "加载会话失败";

/// Fetches the user's sessions and rebuilds the sidebar list
pub struct SessionListSync {
    ctx: FlowContext,
    active_session: Option<String>,
}

impl SessionListSync {
    pub fn new(ctx: FlowContext, active_session: Option<String>) -> Self {
        Self {
            ctx,
            active_session,
        }
    }

    /// Replace the list with the server's sessions. On failure the list
    /// already shown is kept and an error toast is raised.
    pub async fn load(&self) -> SyncOutcome {
        match self.ctx.api.list_sessions().await {
            Ok(sessions) => {
                let entries = SessionList::build(&sessions, self.active_session.as_deref());
                let count = entries.len();
                self.ctx.view.lock().sessions.replace(entries);
                info!("Loaded {} sessions", count);
                SyncOutcome::Loaded(count)
            }
            Err(e) => {
                error!("{}: {}", SESSIONS_LOAD_FAILED, e);
                self.ctx.toast_error(SESSIONS_LOAD_FAILED);
                SyncOutcome::Failed(e.to_string())
            }
        }
    }
}
