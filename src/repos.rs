//! Repository-listing collaborators wired through the graph
//!
//! The application scope ([`NetModule`]) builds the HTTP client from
//! [`NetworkConfig`]; the user scope ([`ApiModule`]) builds the
//! [`RepositoryService`] on top of the client the application scope exposes.
//! The wire layer sits behind [`Transport`], and HTTP failures travel on their
//! own [`HttpError`] channel, never as [`DiError`](crate::DiError).

use crate::config::{NetworkConfig, PreferenceStore};
use crate::{DiError, Module, ProviderKey, Recipe, Result, Scope};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[cfg(feature = "logging")]
use tracing::{debug, warn};

pub const APPLICATION_SCOPE: &str = "application";
pub const USER_SCOPE: &str = "user";

/// Qualifier for the base URL `String`
pub const BASE_URL: &str = "base_url";
/// Qualifier for the cache directory `PathBuf`
pub const CACHE_DIR: &str = "cache_dir";
/// Qualifier for the cache size `u64`
pub const CACHE_SIZE: &str = "cache_size";

/// One entry of a user's repository list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
}

/// Failures of a repository request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    Decode(String),

    /// The transport dropped the request without completing it
    #[error("Request dropped before completion")]
    Dropped,
}

/// On-disk HTTP response cache settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpCache {
    dir: PathBuf,
    max_bytes: u64,
}

impl HttpCache {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: u64) -> Result<Self> {
        if max_bytes == 0 {
            return Err(DiError::creation_failed::<Self>("cache size must be non-zero"));
        }
        Ok(Self {
            dir: dir.into(),
            max_bytes,
        })
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }
}

/// Opaque HTTP client handed through the graph
#[derive(Debug)]
pub struct HttpClient {
    base_url: String,
    cache: Arc<HttpCache>,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>, cache: Arc<HttpCache>) -> Self {
        Self {
            base_url: base_url.into(),
            cache,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache(&self) -> &Arc<HttpCache> {
        &self.cache
    }

    /// Join `path` onto the base URL
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

/// Outcome of a repository request
pub type RepositoriesResult = std::result::Result<Vec<Repository>, HttpError>;

/// Completion handed to a [`Transport`]; call it exactly once.
pub type Completion = Box<dyn FnOnce(RepositoriesResult) + Send>;

/// Wire layer performing the GET and mapping the body to repositories.
pub trait Transport: Send + Sync {
    fn get(&self, client: &HttpClient, url: &str, done: Completion);
}

/// Graph key type for the transport
pub type SharedTransport = Arc<dyn Transport>;

/// Receiver of a repository request's outcome.
///
/// Both paths are required, and each takes `Box<Self>` so exactly one of
/// them runs, once.
pub trait RepositoriesCallback: Send {
    fn on_success(self: Box<Self>, repositories: Vec<Repository>);

    fn on_failure(self: Box<Self>, error: HttpError);
}

/// Holds a callback until an outcome arrives; a guard dropped without one
/// reports [`HttpError::Dropped`].
struct Pending(Option<Box<dyn RepositoriesCallback>>);

impl Pending {
    fn complete(mut self, result: RepositoriesResult) {
        let Some(callback) = self.0.take() else {
            return;
        };
        match result {
            Ok(repositories) => callback.on_success(repositories),
            Err(error) => {
                #[cfg(feature = "logging")]
                warn!(target: "scoped_graph", error = %error, "Repository request failed");
                callback.on_failure(error)
            }
        }
    }
}

impl Drop for Pending {
    fn drop(&mut self) {
        if let Some(callback) = self.0.take() {
            #[cfg(feature = "logging")]
            warn!(target: "scoped_graph", "Transport dropped a request without completing it");
            callback.on_failure(HttpError::Dropped);
        }
    }
}

/// GitHub logins: ASCII letters, digits and `-`
fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

/// Typed REST interface: list a user's repositories
pub struct RepositoryService {
    client: Arc<HttpClient>,
    transport: SharedTransport,
}

impl RepositoryService {
    pub fn new(client: Arc<HttpClient>, transport: SharedTransport) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &Arc<HttpClient> {
        &self.client
    }

    /// Submit `GET /users/{username}/repos`; `callback` is completed by the
    /// transport. Result order and duplicates are passed through as received.
    ///
    /// The username is used as given: anything but ASCII letters, digits and
    /// `-` fails with [`HttpError::InvalidRequest`] before any request. If the
    /// transport drops the request, the callback gets [`HttpError::Dropped`].
    pub fn get_repositories(&self, username: &str, callback: Box<dyn RepositoriesCallback>) {
        if !is_valid_username(username) {
            callback.on_failure(HttpError::InvalidRequest(format!(
                "invalid username {username:?}"
            )));
            return;
        }

        let url = self.client.url(&format!("users/{username}/repos"));

        #[cfg(feature = "logging")]
        debug!(target: "scoped_graph", url = %url, "Requesting repositories");

        let pending = Pending(Some(callback));
        self.transport
            .get(&self.client, &url, Box::new(move |result| pending.complete(result)));
    }

    /// Await the repository list instead of passing a callback.
    #[cfg(feature = "async")]
    pub async fn fetch_repositories(&self, username: &str) -> RepositoriesResult {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.get_repositories(username, Box::new(OneshotCallback(tx)));
        rx.await.unwrap_or(Err(HttpError::Dropped))
    }
}

impl std::fmt::Debug for RepositoryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryService")
            .field("client", &self.client)
            .finish()
    }
}

#[cfg(feature = "async")]
struct OneshotCallback(tokio::sync::oneshot::Sender<RepositoriesResult>);

#[cfg(feature = "async")]
impl RepositoriesCallback for OneshotCallback {
    fn on_success(self: Box<Self>, repositories: Vec<Repository>) {
        // Receiver gone means the caller stopped waiting
        let _ = self.0.send(Ok(repositories));
    }

    fn on_failure(self: Box<Self>, error: HttpError) {
        let _ = self.0.send(Err(error));
    }
}

/// Application-scope providers: configuration values, HTTP cache and client,
/// preference store and transport.
pub struct NetModule {
    config: NetworkConfig,
    transport: SharedTransport,
}

impl NetModule {
    pub fn new(config: NetworkConfig, transport: SharedTransport) -> Self {
        Self { config, transport }
    }

    /// The application scope with this module installed
    pub fn scope(&self) -> Result<Scope> {
        let mut scope = Scope::new(APPLICATION_SCOPE);
        scope.install(self)?;
        Ok(scope)
    }
}

impl Module for NetModule {
    fn configure(&self, scope: &mut Scope) -> Result<()> {
        let config = &self.config;

        scope.register(
            Recipe::transient::<String>()
                .named(BASE_URL)
                .value(config.base_url().to_string()),
        )?;
        scope.register(
            Recipe::transient::<PathBuf>()
                .named(CACHE_DIR)
                .value(config.cache_dir().clone()),
        )?;
        scope.register(
            Recipe::transient::<u64>()
                .named(CACHE_SIZE)
                .value(config.cache_size()),
        )?;
        scope.register(Recipe::cached::<PreferenceStore>().instance(config.preferences().clone()))?;
        scope.register(Recipe::cached::<SharedTransport>().instance(Arc::clone(&self.transport)))?;

        scope.register(
            Recipe::cached::<HttpCache>()
                .depends_on(ProviderKey::named::<PathBuf>(CACHE_DIR))
                .depends_on(ProviderKey::named::<u64>(CACHE_SIZE))
                .build(|deps| {
                    let dir = deps.get_named::<PathBuf>(CACHE_DIR)?;
                    let size = deps.get_named::<u64>(CACHE_SIZE)?;
                    HttpCache::new(dir.as_path(), *size)
                }),
        )?;
        scope.register(
            Recipe::cached::<HttpClient>()
                .depends_on(ProviderKey::named::<String>(BASE_URL))
                .depends_on(ProviderKey::of::<HttpCache>())
                .build(|deps| {
                    let base_url = deps.get_named::<String>(BASE_URL)?;
                    Ok(HttpClient::new(base_url.as_str(), deps.get::<HttpCache>()?))
                }),
        )?;

        scope
            .expose(ProviderKey::of::<HttpClient>())
            .expose(ProviderKey::of::<PreferenceStore>())
            .expose(ProviderKey::of::<SharedTransport>());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "NetModule"
    }
}

/// User-scope providers: the repository service
pub struct ApiModule;

impl ApiModule {
    /// The user scope with this module installed
    pub fn scope(&self) -> Result<Scope> {
        let mut scope = Scope::child_of(USER_SCOPE, APPLICATION_SCOPE);
        scope.install(self)?;
        Ok(scope)
    }
}

impl Module for ApiModule {
    fn configure(&self, scope: &mut Scope) -> Result<()> {
        scope.register(
            Recipe::cached::<RepositoryService>()
                .depends_on(ProviderKey::of::<HttpClient>())
                .depends_on(ProviderKey::of::<SharedTransport>())
                .build(|deps| {
                    let transport = deps.get::<SharedTransport>()?.as_ref().clone();
                    Ok(RepositoryService::new(deps.get::<HttpClient>()?, transport))
                }),
        )?;
        scope.expose(ProviderKey::of::<RepositoryService>());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ApiModule"
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory transport keyed by URL; unknown URLs answer 404.
    #[derive(Default)]
    pub(crate) struct StaticTransport {
        responses: HashMap<String, RepositoriesResult>,
        pub(crate) requests: Mutex<Vec<String>>,
    }

    impl StaticTransport {
        pub(crate) fn with(mut self, url: &str, result: RepositoriesResult) -> Self {
            self.responses.insert(url.to_string(), result);
            self
        }
    }

    impl Transport for StaticTransport {
        fn get(&self, _client: &HttpClient, url: &str, done: Completion) {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(url.to_string());
            }
            let result = self.responses.get(url).cloned().unwrap_or(Err(HttpError::Status {
                status: 404,
                message: "Not Found".into(),
            }));
            done(result);
        }
    }

    /// Records which callback path ran
    pub(crate) struct Recorder(pub(crate) Arc<Mutex<Vec<RepositoriesResult>>>);

    impl RepositoriesCallback for Recorder {
        fn on_success(self: Box<Self>, repositories: Vec<Repository>) {
            self.0.lock().unwrap().push(Ok(repositories));
        }

        fn on_failure(self: Box<Self>, error: HttpError) {
            self.0.lock().unwrap().push(Err(error));
        }
    }

    pub(crate) fn repo(id: u64, name: &str) -> Repository {
        Repository {
            id,
            name: name.to_string(),
            full_name: format!("octocat/{name}"),
        }
    }
}
