//! Attachment uploads and the per-session attachments list

use chatdesk_core::view::attachments::ATTACHMENTS_LOAD_FAILED;
use chatdesk_core::view::messages::{UPLOADING_CAPTION, UPLOAD_FAILED_TEXT};
use chatdesk_core::view::MessageNode;
use chatdesk_core::{Attachment, Role};
use tracing::{error, info};

use super::{FlowContext, SyncOutcome};
use crate::api::FileUpload;

pub const UPLOAD_FAILED_TOAST: &str = "上传文件失败";

/// How an upload ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The server accepted the file; `message` was shown to the user
    Uploaded {
        message: String,
        attachment: Option<Attachment>,
    },
    Failed(String),
}

/// Sends files to a session, either from the chat input or from the
/// attachments dialog
pub struct AttachmentUploadFlow {
    ctx: FlowContext,
}

impl AttachmentUploadFlow {
    pub fn new(ctx: FlowContext) -> Self {
        Self { ctx }
    }

    /// Upload from the chat input. Progress and result show up in the
    /// message pane in place of a placeholder.
    pub async fn upload_inline(&self, session_id: &str, file: FileUpload) -> UploadOutcome {
        let id = {
            let mut view = self.ctx.view.lock();
            let id = view.messages.begin_exchange(UPLOADING_CAPTION);
            view.messages.scroll_to_bottom();
            id
        };

        match self.ctx.api.upload(session_id, file).await {
            Ok(reply) => {
                info!("Upload to {} finished: {}", session_id, reply.message);
                self.ctx.notifier.alert(&reply.message);
                let mut view = self.ctx.view.lock();
                view.messages
                    .resolve(&id, MessageNode::text(Role::Assistant, reply.message.clone()));
                view.messages.scroll_to_bottom();
                UploadOutcome::Uploaded {
                    attachment: reply.attachment(),
                    message: reply.message,
                }
            }
            Err(e) => {
                error!("Upload to {} failed: {}", session_id, e);
                let mut view = self.ctx.view.lock();
                view.messages.fail(&id, UPLOAD_FAILED_TEXT);
                view.messages.scroll_to_bottom();
                UploadOutcome::Failed(e.to_string())
            }
        }
    }

    /// Upload from the attachments dialog. A new file is appended to the
    /// attachments list when that list shows `session_id`; failures only
    /// raise a toast.
    pub async fn upload_to_session(&self, session_id: &str, file: FileUpload) -> UploadOutcome {
        match self.ctx.api.upload(session_id, file).await {
            Ok(reply) => {
                info!("Upload to {} finished: {}", session_id, reply.message);
                self.ctx.notifier.alert(&reply.message);
                let attachment = reply.attachment();
                if let Some(item) = &attachment {
                    self.ctx
                        .view
                        .lock()
                        .attachments
                        .push(session_id, item.clone());
                }
                UploadOutcome::Uploaded {
                    message: reply.message,
                    attachment,
                }
            }
            Err(e) => {
                error!("{}: {}", UPLOAD_FAILED_TOAST, e);
                self.ctx.toast_error(UPLOAD_FAILED_TOAST);
                UploadOutcome::Failed(e.to_string())
            }
        }
    }

    /// Refill the attachments list of `session_id`. On failure the list is
    /// replaced by a single notice.
    pub async fn load_attachments(&self, session_id: &str) -> SyncOutcome {
        match self.ctx.api.list_attachments(session_id).await {
            Ok(items) => {
                let count = items.len();
                self.ctx.view.lock().attachments.replace(session_id, items);
                SyncOutcome::Loaded(count)
            }
            Err(e) => {
                error!("{}: {}", ATTACHMENTS_LOAD_FAILED, e);
                self.ctx
                    .view
                    .lock()
                    .attachments
                    .show_notice(session_id, ATTACHMENTS_LOAD_FAILED);
                SyncOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::testing::context;
    use crate::surface::SurfaceEvent;
    use chatdesk_core::view::{ExchangeState, Toast};
    use mockito::{Matcher, Server};

    fn pdf() -> FileUpload {
        FileUpload::new("notes.pdf", b"%PDF-1.4".to_vec())
    }

    #[tokio::test]
    async fn test_inline_upload_replaces_placeholder_and_alerts() {
        let mut server = Server::new_async().await;
        let upload = server
            .mock("POST", "/upload")
            .match_header("content-type", Matcher::Regex("^multipart/form-data".to_string()))
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="file"; filename="notes.pdf""#.to_string()),
                Matcher::Regex(r#"name="session_id""#.to_string()),
                Matcher::Regex("%PDF-1.4".to_string()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"status":"success","message":"notes.pdf 上传成功","filename":"notes.pdf","filepath":"static/loads/u/s1/notes.pdf"}"#,
            )
            .create_async()
            .await;

        let (ctx, surface) = context(&server.url());
        let outcome = AttachmentUploadFlow::new(ctx.clone())
            .upload_inline("s1", pdf())
            .await;

        assert!(matches!(outcome, UploadOutcome::Uploaded { ref message, .. } if message == "notes.pdf 上传成功"));
        let view = ctx.view.lock();
        assert_eq!(
            view.messages.nodes(),
            &[MessageNode::text(Role::Assistant, "notes.pdf 上传成功")]
        );
        assert_eq!(view.messages.exchanges()[0].state, ExchangeState::Resolved);
        assert_eq!(
            surface.events(),
            vec![SurfaceEvent::Alert("notes.pdf 上传成功".to_string())]
        );
        upload.assert_async().await;
    }

    #[tokio::test]
    async fn test_inline_upload_failure_text() {
        let mut server = Server::new_async().await;
        let _upload = server
            .mock("POST", "/upload")
            .with_status(403)
            .with_body(r#"{"detail":"会话不存在"}"#)
            .create_async()
            .await;

        let (ctx, surface) = context(&server.url());
        let outcome = AttachmentUploadFlow::new(ctx.clone())
            .upload_inline("s1", pdf())
            .await;

        assert!(matches!(outcome, UploadOutcome::Failed(_)));
        assert_eq!(
            ctx.view.lock().messages.nodes(),
            &[MessageNode::text(Role::Assistant, "Error: 上传文件失败.")]
        );
        assert!(surface.events().is_empty());
    }

    #[tokio::test]
    async fn test_modal_upload_appends_attachment() {
        let mut server = Server::new_async().await;
        let _upload = server
            .mock("POST", "/upload")
            .with_status(200)
            .with_body(r#"{"message":"ok","filename":"notes.pdf","filepath":"static/loads/u/s1/notes.pdf"}"#)
            .create_async()
            .await;

        let (ctx, _surface) = context(&server.url());
        ctx.view.lock().attachments.replace("s1", vec![]);
        AttachmentUploadFlow::new(ctx.clone())
            .upload_to_session("s1", pdf())
            .await;

        let view = ctx.view.lock();
        assert_eq!(view.attachments.items().len(), 1);
        assert_eq!(view.attachments.items()[0].filename, "notes.pdf");
        assert!(view.messages.is_empty());
    }

    #[tokio::test]
    async fn test_modal_upload_leaves_other_session_list_alone() {
        let mut server = Server::new_async().await;
        let _upload = server
            .mock("POST", "/upload")
            .with_status(200)
            .with_body(r#"{"message":"ok","filename":"notes.pdf","filepath":"static/loads/u/s2/notes.pdf"}"#)
            .create_async()
            .await;

        let (ctx, _surface) = context(&server.url());
        ctx.view.lock().attachments.replace("s1", vec![]);
        let outcome = AttachmentUploadFlow::new(ctx.clone())
            .upload_to_session("s2", pdf())
            .await;

        assert!(matches!(outcome, UploadOutcome::Uploaded { attachment: Some(_), .. }));
        let view = ctx.view.lock();
        assert_eq!(view.attachments.session_id(), Some("s1"));
        assert!(view.attachments.items().is_empty());
    }

    #[tokio::test]
    async fn test_modal_upload_of_existing_file_adds_nothing() {
        let mut server = Server::new_async().await;
        let _upload = server
            .mock("POST", "/upload")
            .with_status(200)
            .with_body(r#"{"status":"success","message":"notes.pdf 已存在，无需重复上传"}"#)
            .create_async()
            .await;

        let (ctx, surface) = context(&server.url());
        let outcome = AttachmentUploadFlow::new(ctx.clone())
            .upload_to_session("s1", pdf())
            .await;

        assert!(matches!(outcome, UploadOutcome::Uploaded { attachment: None, .. }));
        assert!(ctx.view.lock().attachments.items().is_empty());
        assert_eq!(
            surface.events(),
            vec![SurfaceEvent::Alert("notes.pdf 已存在，无需重复上传".to_string())]
        );
    }

    #[tokio::test]
    async fn test_modal_upload_failure_toasts() {
        let mut server = Server::new_async().await;
        let _upload = server
            .mock("POST", "/upload")
            .with_status(500)
            .create_async()
            .await;

        let (ctx, surface) = context(&server.url());
        AttachmentUploadFlow::new(ctx.clone())
            .upload_to_session("s1", pdf())
            .await;

        assert_eq!(surface.toasts(), vec![Toast::error("上传文件失败")]);
    }

    #[tokio::test]
    async fn test_load_attachments_and_failure_notice() {
        let mut server = Server::new_async().await;
        let _ok = server
            .mock("GET", "/collections/s1")
            .with_status(200)
            .with_body(r#"[{"filename":"a.pdf","filepath":"static/loads/u/s1/a.pdf"}]"#)
            .create_async()
            .await;
        let _broken = server
            .mock("GET", "/collections/s2")
            .with_status(500)
            .create_async()
            .await;

        let (ctx, _surface) = context(&server.url());
        let flow = AttachmentUploadFlow::new(ctx.clone());

        assert_eq!(flow.load_attachments("s1").await, SyncOutcome::Loaded(1));
        assert_eq!(ctx.view.lock().attachments.session_id(), Some("s1"));

        assert!(matches!(flow.load_attachments("s2").await, SyncOutcome::Failed(_)));
        let view = ctx.view.lock();
        assert!(view.attachments.items().is_empty());
        assert_eq!(view.attachments.notice(), Some("加载引用资料失败"));
    }
}
