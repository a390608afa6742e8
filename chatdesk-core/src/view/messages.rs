//! Message pane view model and the optimistic placeholder state machine

use std::sync::atomic::{AtomicU64, Ordering};

use crate::model::{Message, Role};
use crate::render::render_markdown;

/// Loading indicator shown inside a pending placeholder
pub const LOADING_DOTS: &str = "···";
/// Replaces the chat placeholder when the request or its body fails
pub const CHAT_FAILED_TEXT: &str = "Error: Unable to fetch response.";
/// Replaces the upload placeholder when the upload fails
pub const UPLOAD_FAILED_TEXT: &str = "Error: 上传文件失败.";
/// Caption of the inline upload placeholder
pub const UPLOADING_CAPTION: &str = "文件上传中";

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Identifies one placeholder from dispatch until it is settled
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// New id derived from the current time
    pub fn generate() -> Self {
        Self::at(chrono::Utc::now().timestamp_millis())
    }

    /// New id for a submission made at `millis`. A process-wide sequence
    /// keeps ids distinct when two submissions share a millisecond.
    pub fn at(millis: i64) -> Self {
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self(format!("loading-{}-{}", millis, seq))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Pending,
    Resolved,
    Failed,
}

/// Placeholder standing in for the assistant's forthcoming reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingExchange {
    pub id: CorrelationId,
    pub role: Role,
    /// Text shown before the loading dots, empty for chat replies
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageNode {
    /// Markdown already rendered to sanitized HTML
    Rendered { role: Role, html: String },
    /// Literal text, escaped when rendered
    Text { role: Role, text: String },
    Pending(PendingExchange),
}

impl MessageNode {
    pub fn from_markdown(role: Role, markdown: &str) -> Self {
        MessageNode::Rendered {
            role,
            html: render_markdown(markdown),
        }
    }

    pub fn text(role: Role, text: impl Into<String>) -> Self {
        MessageNode::Text {
            role,
            text: text.into(),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            MessageNode::Rendered { role, .. } | MessageNode::Text { role, .. } => *role,
            MessageNode::Pending(pending) => pending.role,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, MessageNode::Pending(_))
    }
}

impl From<&Message> for MessageNode {
    fn from(message: &Message) -> Self {
        MessageNode::from_markdown(message.role, &message.content)
    }
}

/// Bookkeeping for one placeholder's lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRecord {
    pub id: CorrelationId,
    pub state: ExchangeState,
}

/// Ordered message log of the active session
#[derive(Debug, Clone, Default)]
pub struct MessagePane {
    nodes: Vec<MessageNode>,
    exchanges: Vec<ExchangeRecord>,
    scroll_requests: u64,
}

impl MessagePane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[MessageNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop every node along with its exchange records. Placeholders still
    /// in flight are abandoned; their later settlement finds nothing.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.exchanges.clear();
    }

    pub fn push(&mut self, node: MessageNode) {
        self.nodes.push(node);
    }

    pub fn push_markdown(&mut self, role: Role, markdown: &str) {
        self.nodes.push(MessageNode::from_markdown(role, markdown));
    }

    /// Replace the whole log with `messages`, oldest first
    pub fn replace_all(&mut self, messages: &[Message]) {
        self.nodes = messages.iter().map(MessageNode::from).collect();
        self.exchanges.clear();
    }

    /// Append a placeholder for an assistant reply and return its id
    pub fn begin_exchange(&mut self, caption: impl Into<String>) -> CorrelationId {
        let id = CorrelationId::generate();
        self.nodes.push(MessageNode::Pending(PendingExchange {
            id: id.clone(),
            role: Role::Assistant,
            caption: caption.into(),
        }));
        self.exchanges.push(ExchangeRecord {
            id: id.clone(),
            state: ExchangeState::Pending,
        });
        id
    }

    /// Replace the placeholder `id` with a successful reply
    pub fn resolve(&mut self, id: &CorrelationId, node: MessageNode) -> bool {
        self.settle(id, node, ExchangeState::Resolved)
    }

    /// Replace the placeholder `id` with literal failure text
    pub fn fail(&mut self, id: &CorrelationId, text: &str) -> bool {
        self.settle(id, MessageNode::text(Role::Assistant, text), ExchangeState::Failed)
    }

    fn settle(&mut self, id: &CorrelationId, node: MessageNode, state: ExchangeState) -> bool {
        let Some(index) = self.position_of(id) else {
            tracing::debug!("placeholder {} no longer present, dropping reply", id);
            return false;
        };
        self.nodes[index] = node;
        if let Some(record) = self.exchanges.iter_mut().find(|r| &r.id == id) {
            record.state = state;
        }
        true
    }

    /// Index of the placeholder `id`, if it is still shown
    pub fn position_of(&self, id: &CorrelationId) -> Option<usize> {
        self.nodes.iter().position(|node| match node {
            MessageNode::Pending(pending) => &pending.id == id,
            _ => false,
        })
    }

    pub fn pending_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_pending()).count()
    }

    pub fn exchanges(&self) -> &[ExchangeRecord] {
        &self.exchanges
    }

    pub fn exchange_state(&self, id: &CorrelationId) -> Option<ExchangeState> {
        self.exchanges.iter().find(|r| &r.id == id).map(|r| r.state)
    }

    /// Ask the surface to bring the newest node into view
    pub fn scroll_to_bottom(&mut self) {
        self.scroll_requests += 1;
    }

    pub fn scroll_requests(&self) -> u64 {
        self.scroll_requests
    }
}
