//! Optimistic chat submission

use chatdesk_core::view::messages::CHAT_FAILED_TEXT;
use chatdesk_core::view::{CorrelationId, MessageNode};
use chatdesk_core::Role;
use tracing::{debug, error};

use super::FlowContext;

/// How a submission ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input; nothing changed and nothing was sent
    Rejected,
    /// The placeholder was replaced by the answer
    Resolved { id: CorrelationId, answer: String },
    /// The placeholder was replaced by the failure text
    Failed { id: CorrelationId, error: String },
    /// The pane was reset before the request settled; nothing was shown
    Abandoned { id: CorrelationId },
}

/// Shows the user's message and a placeholder at once, then swaps the
/// placeholder for the assistant's answer when it arrives
pub struct ChatSubmissionFlow {
    ctx: FlowContext,
}

impl ChatSubmissionFlow {
    pub fn new(ctx: FlowContext) -> Self {
        Self { ctx }
    }

    pub async fn submit(&self, session_id: &str, input: &str) -> SubmitOutcome {
        let message = input.trim();
        if message.is_empty() {
            return SubmitOutcome::Rejected;
        }

        let id = {
            let mut view = self.ctx.view.lock();
            view.messages.push_markdown(Role::User, message);
            view.composer.clear();
            let id = view.messages.begin_exchange("");
            view.messages.scroll_to_bottom();
            id
        };
        debug!("Submitted message to session {}, awaiting {}", session_id, id);

        match self.ctx.api.chat(session_id, message).await {
            Ok(reply) => {
                let mut view = self.ctx.view.lock();
                let node = MessageNode::from_markdown(Role::Assistant, &reply.answer);
                if !view.messages.resolve(&id, node) {
                    return SubmitOutcome::Abandoned { id };
                }
                view.messages.scroll_to_bottom();
                SubmitOutcome::Resolved {
                    id,
                    answer: reply.answer,
                }
            }
            Err(e) => {
                error!("Chat request for {} failed: {}", id, e);
                let mut view = self.ctx.view.lock();
                if !view.messages.fail(&id, CHAT_FAILED_TEXT) {
                    return SubmitOutcome::Abandoned { id };
                }
                view.messages.scroll_to_bottom();
                SubmitOutcome::Failed {
                    id,
                    error: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::testing::{context, context_without_token};
    use chatdesk_core::render::render_message_pane;
    use chatdesk_core::view::ExchangeState;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_blank_input_changes_nothing() {
        let mut server = Server::new_async().await;
        let chat = server.mock("POST", "/chat").expect(0).create_async().await;

        let (ctx, _surface) = context(&server.url());
        ctx.view.lock().composer = "   ".to_string();
        let flow = ChatSubmissionFlow::new(ctx.clone());

        assert_eq!(flow.submit("a", "   \n\t").await, SubmitOutcome::Rejected);
        assert_eq!(flow.submit("a", "").await, SubmitOutcome::Rejected);

        let view = ctx.view.lock();
        assert!(view.messages.is_empty());
        assert!(view.messages.exchanges().is_empty());
        assert_eq!(view.composer, "   ");
        chat.assert_async().await;
    }

    #[tokio::test]
    async fn test_answer_replaces_placeholder_in_place() {
        let mut server = Server::new_async().await;
        let chat = server
            .mock("POST", "/chat")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("session_id".into(), "a".into()),
                Matcher::UrlEncoded("message".into(), "hi".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"answer":"hello"}"#)
            .expect(1)
            .create_async()
            .await;

        let (ctx, _surface) = context(&server.url());
        ctx.view.lock().composer = " hi ".to_string();
        let flow = ChatSubmissionFlow::new(ctx.clone());

        let outcome = flow.submit("a", " hi ").await;
        let SubmitOutcome::Resolved { id, answer } = outcome else {
            panic!("expected a resolved exchange, got {:?}", outcome);
        };

        assert_eq!(answer, "hello");

        let view = ctx.view.lock();
        assert_eq!(
            view.messages.nodes(),
            &[
                MessageNode::from_markdown(Role::User, "hi"),
                MessageNode::from_markdown(Role::Assistant, "hello"),
            ]
        );
        assert_eq!(view.messages.exchanges().len(), 1);
        assert_eq!(view.messages.exchange_state(&id), Some(ExchangeState::Resolved));
        assert_eq!(view.messages.pending_count(), 0);
        assert!(view.composer.is_empty());
        assert!(!render_message_pane(&view.messages).contains("···"));
        chat.assert_async().await;
    }

    #[tokio::test]
    async fn test_failure_shows_error_text_without_dots() {
        let mut server = Server::new_async().await;
        let _chat = server
            .mock("POST", "/chat")
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let (ctx, _surface) = context(&server.url());
        let flow = ChatSubmissionFlow::new(ctx.clone());

        let outcome = flow.submit("a", "hi").await;
        assert!(matches!(outcome, SubmitOutcome::Failed { .. }));

        let view = ctx.view.lock();
        assert_eq!(view.messages.len(), 2);
        assert_eq!(
            view.messages.nodes()[1],
            MessageNode::text(Role::Assistant, "Error: Unable to fetch response.")
        );
        let html = render_message_pane(&view.messages);
        assert!(html.contains("Error: Unable to fetch response."));
        assert!(!html.contains("···"));
    }

    #[tokio::test]
    async fn test_malformed_answer_is_a_failure() {
        let mut server = Server::new_async().await;
        let _chat = server
            .mock("POST", "/chat")
            .with_status(200)
            .with_body(r#"{"reply":"wrong field"}"#)
            .create_async()
            .await;

        let (ctx, _surface) = context(&server.url());
        let outcome = ChatSubmissionFlow::new(ctx.clone()).submit("a", "hi").await;

        assert!(matches!(outcome, SubmitOutcome::Failed { .. }));
        assert_eq!(ctx.view.lock().messages.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_bearer_token_redirects_and_fails_placeholder() {
        let mut server = Server::new_async().await;
        let chat = server.mock("POST", "/chat").expect(0).create_async().await;

        let (ctx, surface) = context_without_token(&server.url());
        let outcome = ChatSubmissionFlow::new(ctx.clone()).submit("a", "hi").await;

        assert!(matches!(outcome, SubmitOutcome::Failed { .. }));
        assert_eq!(surface.redirects(), vec!["/account/login".to_string()]);
        assert_eq!(ctx.view.lock().messages.pending_count(), 0);
        chat.assert_async().await;
    }

    #[tokio::test]
    async fn test_reply_after_pane_reset_is_dropped() {
        let mut server = Server::new_async().await;
        let _chat = server
            .mock("POST", "/chat")
            .with_status(200)
            .with_body(r#"{"answer":"late"}"#)
            .create_async()
            .await;

        let (ctx, _surface) = context(&server.url());
        let flow = ChatSubmissionFlow::new(ctx.clone());

        let view = ctx.view.clone();
        let submit = flow.submit("a", "hi");
        let reset = async {
            tokio::task::yield_now().await;
            view.lock().messages.clear();
        };
        let (outcome, ()) = tokio::join!(submit, reset);

        assert!(matches!(outcome, SubmitOutcome::Abandoned { .. }));
        let view = ctx.view.lock();
        assert!(view.messages.is_empty());
        assert!(view.messages.exchanges().is_empty());
    }
}
