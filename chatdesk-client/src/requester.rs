//! Authenticated request wrapper

use std::sync::Arc;

use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::auth::CredentialStrategy;
use crate::error::{ClientError, ClientResult};
use crate::surface::Navigator;

/// Sends requests to the chat backend with the configured credential and
/// sends the user to the login page when the credential is missing or
/// rejected.
pub struct AuthenticatedRequester {
    client: Client,
    base_url: Url,
    login_path: String,
    strategy: Arc<dyn CredentialStrategy>,
    navigator: Arc<dyn Navigator>,
}

impl AuthenticatedRequester {
    pub fn new(
        base_url: Url,
        login_path: impl Into<String>,
        strategy: Arc<dyn CredentialStrategy>,
        navigator: Arc<dyn Navigator>,
    ) -> ClientResult<Self> {
        let client = strategy.configure_client(Client::builder()).build()?;
        let base_url = normalize_base(base_url);
        debug!("Requests to {} carry {:?} credentials", base_url, strategy.kind());
        Ok(Self {
            client,
            base_url,
            login_path: login_path.into(),
            strategy,
            navigator,
        })
    }

    /// Endpoint URL for `segments` below the base URL; each segment is
    /// percent-encoded
    pub fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        endpoint(&self.base_url, segments)
    }

    /// Unauthenticated request builder, for callers that add headers before
    /// handing it to `send`
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Attach the credential and send. A 401 redirects to the login page but
    /// the response is still returned.
    pub async fn send(&self, request: RequestBuilder) -> ClientResult<Response> {
        let request = match self.strategy.attach(request) {
            Ok(request) => request,
            Err(ClientError::MissingCredential) => {
                warn!("No credential stored, redirecting to {}", self.login_path);
                self.navigator.redirect(&self.login_path);
                return Err(ClientError::MissingCredential);
            }
            Err(e) => return Err(e),
        };

        let response = request.send().await?;
        debug!("{} {}", response.status(), response.url());
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(
                "Credential rejected by {}, redirecting to {}",
                response.url(),
                self.login_path
            );
            self.navigator.redirect(&self.login_path);
        }
        Ok(response)
    }

    pub async fn get(&self, url: Url) -> ClientResult<Response> {
        self.send(self.request(Method::GET, url)).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ClientResult<T> {
        let response = self.get(url).await?;
        read_json(response).await
    }

    pub async fn post_form<F, T>(&self, url: Url, form: &F) -> ClientResult<T>
    where
        F: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(self.request(Method::POST, url).form(form)).await?;
        read_json(response).await
    }

    pub async fn post_multipart<T: DeserializeOwned>(&self, url: Url, form: Form) -> ClientResult<T> {
        let response = self
            .send(self.request(Method::POST, url).multipart(form))
            .await?;
        read_json(response).await
    }
}

/// Decode a JSON body, turning non-success statuses into errors
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Unauthorized(detail_or(body, "invalid credential")));
    }
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::Status {
            status: status.as_u16(),
            body: detail_or(body, ""),
        });
    }

    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Pull FastAPI-style `{"detail": "..."}` out of an error body
pub(crate) fn detail_or(body: String, fallback: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string));
    match detail {
        Some(detail) => detail,
        None if body.trim().is_empty() => fallback.to_string(),
        None => body,
    }
}

fn normalize_base(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.set_query(None);
    base.set_fragment(None);
    base
}

pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> ClientResult<Url> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| ClientError::Url(format!("{} cannot be a base URL", base)))?;
        path.pop_if_empty().extend(segments);
    }
    Ok(url)
}
