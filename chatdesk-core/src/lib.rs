//! Core types for chatdesk
//!
//! This crate holds the data model exchanged with the chat backend, the
//! view models the client flows mutate, the markup renderer, and the
//! shared configuration and logging setup.

pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod render;
pub mod view;

pub use error::{Error, Result};
pub use model::{Attachment, Message, Role, Session};
