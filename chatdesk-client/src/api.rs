//! REST surface of the chat backend

use std::path::Path;

use chatdesk_core::{Attachment, Message, Session};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ClientError, ClientResult};
use crate::requester::AuthenticatedRequester;

/// Reply of `POST /chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub answer: String,
}

/// Reply of `POST /upload`. `filename` and `filepath` are absent when the
/// file was already uploaded to the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReply {
    #[serde(default)]
    pub status: Option<String>,
    pub message: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub filepath: Option<String>,
}

impl UploadReply {
    /// The stored file, when the reply describes a new one
    pub fn attachment(&self) -> Option<Attachment> {
        match (&self.filename, &self.filepath) {
            (Some(filename), Some(filepath)) => Some(Attachment {
                filename: filename.clone(),
                filepath: filepath.clone(),
            }),
            _ => None,
        }
    }
}

/// Reply of the session mutation endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationReply {
    pub success: bool,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A file read into memory, ready for a multipart body
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            file_name,
            bytes,
            mime,
        }
    }

    /// Read `path` from disk; the file name part is sent as the upload name
    pub async fn from_path(path: &Path) -> ClientResult<Self> {
        if !path.is_file() {
            return Err(ClientError::FileNotFound(path.display().to_string()));
        }
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ClientError::Validation(format!("Invalid file name: {:?}", path)))?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(file_name, bytes))
    }

    fn into_part(self) -> ClientResult<Part> {
        Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.mime)
            .map_err(ClientError::from)
    }
}

/// Typed calls against the chat backend, all authenticated
pub struct ChatApi {
    requester: AuthenticatedRequester,
}

impl ChatApi {
    pub fn new(requester: AuthenticatedRequester) -> Self {
        Self { requester }
    }

    /// `GET /sessions`, newest first as ordered by the server
    pub async fn list_sessions(&self) -> ClientResult<Vec<Session>> {
        let url = self.requester.endpoint(&["sessions"])?;
        let sessions: Vec<Session> = self.requester.get_json(url).await?;
        debug!("Fetched {} sessions", sessions.len());
        Ok(sessions)
    }

    /// `GET /messages/{session_id}`, oldest first
    pub async fn list_messages(&self, session_id: &str) -> ClientResult<Vec<Message>> {
        let url = self.requester.endpoint(&["messages", session_id])?;
        let messages: Vec<Message> = self.requester.get_json(url).await?;
        debug!("Fetched {} messages for {}", messages.len(), session_id);
        Ok(messages)
    }

    /// `GET /collections/{session_id}`
    pub async fn list_attachments(&self, session_id: &str) -> ClientResult<Vec<Attachment>> {
        let url = self.requester.endpoint(&["collections", session_id])?;
        self.requester.get_json(url).await
    }

    /// `POST /chat`
    pub async fn chat(&self, session_id: &str, message: &str) -> ClientResult<ChatReply> {
        let url = self.requester.endpoint(&["chat"])?;
        self.requester
            .post_form(url, &[("session_id", session_id), ("message", message)])
            .await
    }

    /// `POST /upload` with the `file` and `session_id` parts
    pub async fn upload(&self, session_id: &str, file: FileUpload) -> ClientResult<UploadReply> {
        let url = self.requester.endpoint(&["upload"])?;
        info!(
            "Uploading {} ({} bytes) to session {}",
            file.file_name,
            file.bytes.len(),
            session_id
        );
        let form = Form::new()
            .part("file", file.into_part()?)
            .text("session_id", session_id.to_string());
        self.requester.post_multipart(url, form).await
    }

    /// `POST /new_session`
    pub async fn new_session(&self, name: &str) -> ClientResult<MutationReply> {
        let url = self.requester.endpoint(&["new_session"])?;
        self.requester.post_form(url, &[("name", name)]).await
    }

    /// `POST /change_session`
    pub async fn change_session(&self, session_id: &str, name: &str) -> ClientResult<MutationReply> {
        let url = self.requester.endpoint(&["change_session"])?;
        self.requester
            .post_form(url, &[("name", name), ("session_id", session_id)])
            .await
    }

    /// `POST /del_session`
    pub async fn delete_session(&self, session_id: &str) -> ClientResult<MutationReply> {
        let url = self.requester.endpoint(&["del_session"])?;
        self.requester
            .post_form(url, &[("session_id", session_id)])
            .await
    }
}
