use std::sync::Arc;

use anyhow::{Context, Result};
use chatdesk_client::{
    strategy_for, AccountClient, AuthenticatedRequester, ChatApi, ChatPage, FileTokenStore,
    MemoryTokenStore, PageContext, TokenStore,
};
use chatdesk_core::config::{Config, ConfigLoader};
use reqwest::Url;
use tracing::debug;

use crate::terminal::TerminalSurface;

/// Everything a command needs to reach the backend
pub struct ClientSetup {
    pub config: Config,
    pub base_url: Url,
    pub surface: Arc<TerminalSurface>,
    token_file: FileTokenStore,
}

impl ClientSetup {
    pub fn new(loader: &ConfigLoader, config: Config) -> Result<Self> {
        let base_url = Url::parse(&config.server.base_url)
            .with_context(|| format!("Invalid server.base_url: {}", config.server.base_url))?;
        let token_file = FileTokenStore::new(loader.token_path(&config));
        Ok(Self {
            config,
            base_url,
            surface: Arc::new(TerminalSurface::new()),
            token_file,
        })
    }

    /// A token given in the configuration wins over the stored one
    fn token_store(&self) -> Arc<dyn TokenStore> {
        if self.config.auth.token.is_empty() {
            debug!("Reading credential from {:?}", self.token_file.path());
            Arc::new(self.token_file.clone())
        } else {
            debug!("Using credential from configuration");
            Arc::new(MemoryTokenStore::new(Some(self.config.auth.token.clone())))
        }
    }

    pub fn api(&self) -> Result<ChatApi> {
        let strategy = strategy_for(self.config.auth.strategy, &self.base_url, self.token_store());
        let requester = AuthenticatedRequester::new(
            self.base_url.clone(),
            self.config.server.login_path.clone(),
            strategy,
            self.surface.clone(),
        )?;
        Ok(ChatApi::new(requester))
    }

    pub fn page(&self, session: Option<String>) -> Result<ChatPage> {
        Ok(ChatPage::new(
            self.api()?,
            PageContext::new(session),
            self.surface.clone(),
            self.surface.clone(),
        ))
    }

    /// Account operations always persist to the token file
    pub fn account(&self) -> Result<AccountClient> {
        Ok(AccountClient::new(
            &self.base_url,
            Arc::new(self.token_file.clone()),
        )?)
    }

    pub fn token_path(&self) -> &std::path::Path {
        self.token_file.path()
    }
}
