//! Rendering from view models to HTML fragments

pub mod markdown;
pub mod markup;

pub use markdown::render_markdown;
pub use markup::{
    render_attachment_list, render_message_node, render_message_pane, render_page,
    render_session_entry, render_session_list, render_toast,
};
