//! Credential storage and the request authentication strategies

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chatdesk_core::config::AuthStrategy;
use parking_lot::RwLock;
use reqwest::cookie::Jar;
use reqwest::{ClientBuilder, RequestBuilder, Url};
use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// Name of the cookie the chat backend authenticates with
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Holds the single credential value, read on every authenticated request
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str) -> ClientResult<()>;
    fn clear(&self) -> ClientResult<()>;
}

/// Token kept in memory only
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token.filter(|t| !t.is_empty())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn save(&self, token: &str) -> ClientResult<()> {
        *self.token.write() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        *self.token.write() = None;
        Ok(())
    }
}

/// Token persisted in a file, one value, surrounding whitespace ignored
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        let token = content.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }

    fn save(&self, token: &str) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)?;
        debug!("Stored credential in {:?}", self.path);
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// How a credential travels with each request
pub trait CredentialStrategy: Send + Sync {
    fn kind(&self) -> AuthStrategy;

    /// Adjust the HTTP client once, before it is built
    fn configure_client(&self, builder: ClientBuilder) -> ClientBuilder {
        builder
    }

    /// Attach the credential to one request. `MissingCredential` means the
    /// request must not be sent.
    fn attach(&self, request: RequestBuilder) -> ClientResult<RequestBuilder>;
}

/// `Authorization: Bearer <token>` from the token store
pub struct BearerToken {
    store: Arc<dyn TokenStore>,
}

impl BearerToken {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }
}

impl CredentialStrategy for BearerToken {
    fn kind(&self) -> AuthStrategy {
        AuthStrategy::Bearer
    }

    fn attach(&self, request: RequestBuilder) -> ClientResult<RequestBuilder> {
        match self.store.load() {
            Some(token) => Ok(request.bearer_auth(token)),
            None => Err(ClientError::MissingCredential),
        }
    }
}

/// Ambient cookie credential. The jar is refreshed from the token store on
/// every request but a missing token never blocks the request.
pub struct CookieCredential {
    jar: Arc<Jar>,
    origin: Url,
    store: Arc<dyn TokenStore>,
}

impl CookieCredential {
    pub fn new(origin: Url, store: Arc<dyn TokenStore>) -> Self {
        let credential = Self {
            jar: Arc::new(Jar::default()),
            origin,
            store,
        };
        credential.sync_jar();
        credential
    }

    fn sync_jar(&self) {
        if let Some(token) = self.store.load() {
            self.jar.add_cookie_str(
                &format!("{}={}; Path=/", ACCESS_TOKEN_COOKIE, token),
                &self.origin,
            );
        }
    }
}

impl CredentialStrategy for CookieCredential {
    fn kind(&self) -> AuthStrategy {
        AuthStrategy::Cookie
    }

    fn configure_client(&self, builder: ClientBuilder) -> ClientBuilder {
        builder.cookie_provider(Arc::clone(&self.jar))
    }

    fn attach(&self, request: RequestBuilder) -> ClientResult<RequestBuilder> {
        self.sync_jar();
        Ok(request)
    }
}

/// Build the strategy selected by configuration
pub fn strategy_for(
    kind: AuthStrategy,
    origin: &Url,
    store: Arc<dyn TokenStore>,
) -> Arc<dyn CredentialStrategy> {
    match kind {
        AuthStrategy::Bearer => Arc::new(BearerToken::new(store)),
        AuthStrategy::Cookie => Arc::new(CookieCredential::new(origin.clone(), store)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_ignores_empty_seed() {
        let store = MemoryTokenStore::new(Some(String::new()));
        assert_eq!(store.load(), None);
        store.save("t").unwrap();
        assert_eq!(store.load(), Some("t".to_string()));
        store.clear().unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_file_store_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(temp_dir.path().join("nested").join("token"));

        assert_eq!(store.load(), None);
        store.save("abc").unwrap();
        assert_eq!(store.load(), Some("abc".to_string()));

        std::fs::write(store.path(), "  \n").unwrap();
        assert_eq!(store.load(), None);

        store.clear().unwrap();
        store.clear().unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn test_bearer_without_token_refuses() {
        let strategy = BearerToken::new(Arc::new(MemoryTokenStore::default()));
        let request = reqwest::Client::new().get("http://127.0.0.1:1/sessions");
        assert!(matches!(
            strategy.attach(request),
            Err(ClientError::MissingCredential)
        ));
    }

    #[test]
    fn test_bearer_header_keeps_caller_headers() {
        let store = Arc::new(MemoryTokenStore::new(Some("tok".to_string())));
        let strategy = BearerToken::new(store);
        let request = reqwest::Client::new()
            .get("http://127.0.0.1:1/sessions")
            .header("X-Request-Id", "42");

        let built = strategy.attach(request).unwrap().build().unwrap();
        assert_eq!(built.headers()["authorization"], "Bearer tok");
        assert_eq!(built.headers()["x-request-id"], "42");
    }

    #[test]
    fn test_strategy_for_selects_variant() {
        let origin = Url::parse("http://127.0.0.1:8000/").unwrap();
        let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::default());
        assert_eq!(
            strategy_for(AuthStrategy::Bearer, &origin, Arc::clone(&store)).kind(),
            AuthStrategy::Bearer
        );
        assert_eq!(
            strategy_for(AuthStrategy::Cookie, &origin, store).kind(),
            AuthStrategy::Cookie
        );
    }
}
