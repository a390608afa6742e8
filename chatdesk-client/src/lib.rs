//! Client side of the chatdesk service
//!
//! Authenticated access to the chat backend and the flows that keep the
//! page's view state in step with it.

pub mod account;
pub mod api;
pub mod auth;
pub mod error;
pub mod flows;
pub mod page;
pub mod requester;
pub mod surface;

pub use account::AccountClient;
pub use api::{ChatApi, FileUpload};
pub use auth::{
    strategy_for, BearerToken, CookieCredential, CredentialStrategy, FileTokenStore,
    MemoryTokenStore, TokenStore,
};
pub use error::{ClientError, ClientResult};
pub use flows::{FlowContext, SharedView, SubmitOutcome, SyncOutcome};
pub use page::{ChatPage, PageContext, PageLoad};
pub use requester::AuthenticatedRequester;
pub use surface::{Navigator, Notifier, RecordingSurface, SurfaceEvent};
