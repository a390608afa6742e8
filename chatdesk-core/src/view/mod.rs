//! View models
//!
//! Plain data the client flows mutate and the renderer turns into markup.
//! Nothing here performs I/O, so every transition can be unit-tested.

pub mod attachments;
pub mod dialog;
pub mod messages;
pub mod sessions;
pub mod toast;

pub use attachments::AttachmentList;
pub use dialog::{DialogError, SessionDialog, SessionMutation};
pub use messages::{CorrelationId, ExchangeState, MessageNode, MessagePane, PendingExchange};
pub use sessions::{SessionAction, SessionEntry, SessionList};
pub use toast::Toast;

/// Everything one chat page shows
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub sessions: SessionList,
    pub messages: MessagePane,
    pub attachments: AttachmentList,
    pub dialog: Option<SessionDialog>,
    /// Contents of the message input box
    pub composer: String,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }
}
