//! Login, registration and logout against the account endpoints

use std::sync::Arc;

use reqwest::{Client, Response, StatusCode, Url};
use tracing::{info, warn};

use crate::auth::{TokenStore, ACCESS_TOKEN_COOKIE};
use crate::error::{ClientError, ClientResult};
use crate::requester::{detail_or, endpoint};

/// Unauthenticated client for the account pages. A successful login or
/// registration stores the issued token for later requests.
pub struct AccountClient {
    client: Client,
    base_url: Url,
    store: Arc<dyn TokenStore>,
}

impl AccountClient {
    pub fn new(base_url: &Url, store: Arc<dyn TokenStore>) -> ClientResult<Self> {
        let mut base_url = base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            client: Client::builder().build()?,
            base_url,
            store,
        })
    }

    /// `POST /account/token`
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<String> {
        let url = endpoint(&self.base_url, &["account", "token"])?;
        let response = self
            .client
            .post(url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        let token = self.accept(response).await?;
        info!("Logged in as {}", username);
        Ok(token)
    }

    /// `POST /account/register`, which also logs the new user in
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        invite_code: &str,
    ) -> ClientResult<String> {
        let url = endpoint(&self.base_url, &["account", "register"])?;
        let response = self
            .client
            .post(url)
            .form(&[
                ("username", username),
                ("password", password),
                ("invite_code", invite_code),
            ])
            .send()
            .await?;

        let token = self.accept(response).await?;
        info!("Registered {}", username);
        Ok(token)
    }

    /// Forget the stored token
    pub fn logout(&self) -> ClientResult<()> {
        self.store.clear()?;
        info!("Cleared stored credential");
        Ok(())
    }

    async fn accept(&self, response: Response) -> ClientResult<String> {
        let status = response.status();
        let token = response
            .cookies()
            .find(|c| c.name() == ACCESS_TOKEN_COOKIE)
            .map(|c| c.value().to_string());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Account request rejected with {}", status);
            return Err(match status {
                StatusCode::UNAUTHORIZED => ClientError::Unauthorized(detail_or(body, "用户名或密码错误")),
                StatusCode::BAD_REQUEST => ClientError::Validation(detail_or(body, "请求无效")),
                _ => ClientError::Status {
                    status: status.as_u16(),
                    body: detail_or(body, ""),
                },
            });
        }

        let token = token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ClientError::Backend(format!("response carried no {} cookie", ACCESS_TOKEN_COOKIE)))?;
        self.store.save(&token)?;
        Ok(token)
    }
}
