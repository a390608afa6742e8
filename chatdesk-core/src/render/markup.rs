//! Markup for each view model. All interpolated text is escaped here;
//! `MessageNode::Rendered` html is trusted because it comes from
//! `render_markdown`.

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use crate::render::markdown::is_safe_href;
use crate::view::messages::LOADING_DOTS;
use crate::view::{
    AttachmentList, MessageNode, MessagePane, SessionAction, SessionEntry, SessionList, Toast,
    ViewState,
};

pub fn render_session_entry(entry: &SessionEntry) -> String {
    let class = if entry.active { r#" class="active""# } else { "" };
    let actions: String = SessionAction::ALL
        .iter()
        .map(|action| {
            format!(
                r#"<button type="button" class="session-action" data-action="{name}" data-session-id="{id}">{name}</button>"#,
                name = action.as_str(),
                id = attr(&entry.id),
            )
        })
        .collect();

    format!(
        r#"<li{class}><a id="{id}" href="{href}"><span class="max-width-80">{label}</span></a><span class="badge session-actions">{actions}</span></li>"#,
        id = attr(&entry.id),
        href = attr(&entry.href),
        label = text(&entry.label),
    )
}

pub fn render_session_list(list: &SessionList) -> String {
    let items: Vec<String> = list.entries().iter().map(render_session_entry).collect();
    format!("<ul id=\"session-list\">{}</ul>", items.join(""))
}

pub fn render_message_node(node: &MessageNode) -> String {
    match node {
        MessageNode::Rendered { role, html } => {
            format!(r#"<div class="message {role}">{html}</div>"#)
        }
        MessageNode::Text { role, text: body } => {
            format!(r#"<div class="message {role}">{}</div>"#, text(body))
        }
        MessageNode::Pending(pending) => format!(
            r#"<div id="{id}" class="message {role} pending">{caption}<span class="dots">{LOADING_DOTS}</span></div>"#,
            id = attr(pending.id.as_str()),
            role = pending.role,
            caption = text(&pending.caption),
        ),
    }
}

pub fn render_message_pane(pane: &MessagePane) -> String {
    let nodes: Vec<String> = pane.nodes().iter().map(render_message_node).collect();
    format!("<div id=\"chat-box\">{}</div>", nodes.join("\n"))
}

pub fn render_attachment_list(list: &AttachmentList) -> String {
    if let Some(notice) = list.notice() {
        return format!(
            "<ul id=\"collect-modal\" class=\"collection\"><p>{}</p></ul>",
            text(notice)
        );
    }

    let items: String = list
        .items()
        .iter()
        .map(|item| {
            let href = if is_safe_href(&item.filepath) {
                item.filepath.as_str()
            } else {
                "#"
            };
            format!(
                r#"<li class="collection-item"><div>{name}<a href="{href}" class="secondary-content" download>download</a></div></li>"#,
                name = text(&item.filename),
                href = attr(href),
            )
        })
        .collect();
    format!("<ul id=\"collect-modal\" class=\"collection\">{items}</ul>")
}

pub fn render_toast(toast: &Toast) -> String {
    format!(r#"<div class="toast red lighten-2">{}</div>"#, text(&toast.text))
}

/// Session list, message pane and attachments list of one page
pub fn render_page(view: &ViewState) -> String {
    [
        render_session_list(&view.sessions),
        render_message_pane(&view.messages),
        render_attachment_list(&view.attachments),
    ]
    .join("\n")
}
