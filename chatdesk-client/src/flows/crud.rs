//! Session create/rename/delete from the session dialogs

use chatdesk_core::view::sessions::session_href;
use chatdesk_core::view::{DialogError, SessionDialog, SessionMutation};
use tracing::{error, info, warn};

use super::FlowContext;
use crate::api::MutationReply;
use crate::error::ClientResult;

const UNKNOWN_ERROR: &str = "未知错误";

/// How a confirmed dialog ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrudOutcome {
    /// Rejected locally, nothing was sent
    Invalid(DialogError),
    /// The toast text that was shown
    Failed(String),
    /// A new session was created and the page moved to it
    Navigated(String),
    /// The page was reloaded to show the change
    Reloaded,
}

pub struct SessionCrud {
    ctx: FlowContext,
}

impl SessionCrud {
    pub fn new(ctx: FlowContext) -> Self {
        Self { ctx }
    }

    /// Validate the dialog and send the resulting mutation
    pub async fn confirm(&self, dialog: &SessionDialog) -> CrudOutcome {
        match dialog.validate() {
            Ok(mutation) => self.apply(mutation).await,
            Err(e) => {
                warn!("Session dialog rejected: {}", e);
                if e != DialogError::NothingToSubmit {
                    self.ctx.toast_error(e.to_string());
                }
                CrudOutcome::Invalid(e)
            }
        }
    }

    pub async fn apply(&self, mutation: SessionMutation) -> CrudOutcome {
        let label = mutation.label();
        let reply = match self.send(&mutation).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("{}失败: {}", label, e);
                let text = format!("{}失败", label);
                self.ctx.toast_error(text.clone());
                return CrudOutcome::Failed(text);
            }
        };

        if !reply.success {
            return self.rejected(label, reply.error.as_deref());
        }

        match mutation {
            SessionMutation::Create { name } => match reply.id {
                Some(id) if !id.is_empty() => {
                    info!("Created session {} ({})", id, name);
                    let href = session_href(&id);
                    self.ctx.navigator.redirect(&href);
                    CrudOutcome::Navigated(href)
                }
                _ => self.rejected(label, None),
            },
            SessionMutation::Rename { session_id, name } => {
                info!("Renamed session {} to {}", session_id, name);
                self.ctx.navigator.reload();
                CrudOutcome::Reloaded
            }
            SessionMutation::Delete { session_id } => {
                info!("Deleted session {}", session_id);
                self.ctx.navigator.reload();
                CrudOutcome::Reloaded
            }
        }
    }

    async fn send(&self, mutation: &SessionMutation) -> ClientResult<MutationReply> {
        match mutation {
            SessionMutation::Create { name } => self.ctx.api.new_session(name).await,
            SessionMutation::Rename { session_id, name } => {
                self.ctx.api.change_session(session_id, name).await
            }
            SessionMutation::Delete { session_id } => self.ctx.api.delete_session(session_id).await,
        }
    }

    fn rejected(&self, label: &str, reason: Option<&str>) -> CrudOutcome {
        let reason = reason.filter(|r| !r.is_empty()).unwrap_or(UNKNOWN_ERROR);
        let text = format!("{}失败: {}", label, reason);
        warn!("{}", text);
        self.ctx.toast_error(text.clone());
        CrudOutcome::Failed(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::testing::context;
    use crate::surface::SurfaceEvent;
    use chatdesk_core::view::Toast;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_blank_name_sends_nothing() {
        let mut server = Server::new_async().await;
        let create = server.mock("POST", "/new_session").expect(0).create_async().await;

        let (ctx, surface) = context(&server.url());
        let outcome = SessionCrud::new(ctx)
            .confirm(&SessionDialog::new_session())
            .await;

        assert_eq!(outcome, CrudOutcome::Invalid(DialogError::MissingName));
        assert_eq!(surface.toasts(), vec![Toast::error("请输入对话名称")]);
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_session_id_sends_nothing() {
        let mut server = Server::new_async().await;
        let delete = server.mock("POST", "/del_session").expect(0).create_async().await;

        let (ctx, surface) = context(&server.url());
        let dialog = SessionDialog::Delete {
            session_id: None,
            name: "Trip".to_string(),
        };
        let outcome = SessionCrud::new(ctx).confirm(&dialog).await;

        assert_eq!(outcome, CrudOutcome::Invalid(DialogError::MissingSessionId));
        assert_eq!(surface.toasts(), vec![Toast::error("未获取到当前对话ID")]);
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_navigates_to_new_session() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/new_session")
            .match_body(Matcher::UrlEncoded("name".into(), "Trip".into()))
            .with_status(200)
            .with_body(r#"{"id":"s9","name":"Trip","success":true}"#)
            .create_async()
            .await;

        let (ctx, surface) = context(&server.url());
        let mut dialog = SessionDialog::new_session();
        dialog.set_name(" Trip ");
        let outcome = SessionCrud::new(ctx).confirm(&dialog).await;

        assert_eq!(outcome, CrudOutcome::Navigated("/?session_id=s9".to_string()));
        assert_eq!(surface.redirects(), vec!["/?session_id=s9".to_string()]);
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_rename_and_delete_reload() {
        let mut server = Server::new_async().await;
        let rename = server
            .mock("POST", "/change_session")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("name".into(), "New".into()),
                Matcher::UrlEncoded("session_id".into(), "a".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"id":"a","name":"New","success":true}"#)
            .create_async()
            .await;
        let delete = server
            .mock("POST", "/del_session")
            .match_body(Matcher::UrlEncoded("session_id".into(), "a".into()))
            .with_status(200)
            .with_body(r#"{"id":"a","success":true}"#)
            .create_async()
            .await;

        let (ctx, surface) = context(&server.url());
        let crud = SessionCrud::new(ctx);

        let rename_dialog = SessionDialog::Rename {
            session_id: Some("a".to_string()),
            name: "New".to_string(),
        };
        assert_eq!(crud.confirm(&rename_dialog).await, CrudOutcome::Reloaded);

        let delete_dialog = SessionDialog::Delete {
            session_id: Some("a".to_string()),
            name: "New".to_string(),
        };
        assert_eq!(crud.confirm(&delete_dialog).await, CrudOutcome::Reloaded);

        assert_eq!(surface.events(), vec![SurfaceEvent::Reload, SurfaceEvent::Reload]);
        rename.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_backend_rejection_toasts_reason_or_fallback() {
        let mut server = Server::new_async().await;
        let _rename = server
            .mock("POST", "/change_session")
            .with_status(200)
            .with_body(r#"{"success":false,"error":"duplicate name"}"#)
            .create_async()
            .await;
        let _delete = server
            .mock("POST", "/del_session")
            .with_status(200)
            .with_body(r#"{"success":false}"#)
            .create_async()
            .await;

        let (ctx, surface) = context(&server.url());
        let crud = SessionCrud::new(ctx);

        crud.apply(SessionMutation::Rename {
            session_id: "a".to_string(),
            name: "x".to_string(),
        })
        .await;
        crud.apply(SessionMutation::Delete {
            session_id: "a".to_string(),
        })
        .await;

        assert_eq!(
            surface.toasts(),
            vec![
                Toast::error("修改对话失败: duplicate name"),
                Toast::error("删除对话失败: 未知错误"),
            ]
        );
        assert!(surface.redirects().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_toasts_label_only() {
        let mut server = Server::new_async().await;
        let _create = server
            .mock("POST", "/new_session")
            .with_status(500)
            .create_async()
            .await;

        let (ctx, surface) = context(&server.url());
        let outcome = SessionCrud::new(ctx)
            .apply(SessionMutation::Create {
                name: "Trip".to_string(),
            })
            .await;

        assert_eq!(outcome, CrudOutcome::Failed("新建对话失败".to_string()));
        assert_eq!(surface.toasts(), vec![Toast::error("新建对话失败")]);
    }
}
