// crates/client/src/lib.rs
//! Client core for the job board.
//!
//! The moving parts, leaf-first: [`SessionStore`] owns the credential and
//! user identity; [`AuthorizedClient`] wraps outbound HTTP with bearer
//! attachment and one-shot refresh-and-retry; [`FilterState`] debounces
//! filter edits; [`JobFeedController`] orchestrates the paginated feed
//! cache. [`JobBoardClient`] wires them together with explicit injection;
//! nothing in this crate is a global.

pub mod config;
pub mod error;
pub mod feed;
pub mod filters;
pub mod http;
pub mod jobs;
pub mod session;

pub use config::ClientConfig;
pub use error::ApiError;
pub use feed::{FeedPhase, FeedSnapshot, JobFeedController};
pub use filters::{FilterEvent, FilterState, FilterValues};
pub use http::AuthorizedClient;
pub use jobs::JobsApi;
pub use session::{
    CredentialStore, FileCredentialStore, MemoryCredentialStore, Session, SessionStore,
};

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::debug;

use jobboard_types::{LoginRequest, RegistrationRequest, User};

/// The assembled client: one of everything, wired together.
pub struct JobBoardClient {
    config: ClientConfig,
    http: reqwest::Client,
    pub session: Arc<SessionStore>,
    pub filters: Arc<FilterState>,
    pub feed: Arc<JobFeedController>,
    pub jobs: JobsApi,
    /// Handed to the feed listener on [`JobBoardClient::start`].
    filter_rx: Mutex<Option<mpsc::Receiver<FilterEvent>>>,
}

impl JobBoardClient {
    /// Build with the default credentials file under the home directory.
    /// Falls back to an in-memory store when no home dir is resolvable.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let store: Box<dyn CredentialStore> = match FileCredentialStore::default_path() {
            Some(path) => Box::new(FileCredentialStore::new(path)),
            None => {
                debug!("no home directory; session will not persist");
                Box::new(MemoryCredentialStore::default())
            }
        };
        Self::with_store(config, store)
    }

    pub fn with_store(
        config: ClientConfig,
        store: Box<dyn CredentialStore>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let session = Arc::new(SessionStore::new(store));
        let client = Arc::new(AuthorizedClient::new(
            http.clone(),
            config.base_url.clone(),
            Arc::clone(&session),
        ));
        let (filters, filter_rx) = FilterState::new(config.debounce);
        let feed = Arc::new(JobFeedController::new(
            Arc::clone(&client),
            Arc::clone(&session),
            Arc::clone(&filters),
            config.page_limit,
        ));
        let jobs = JobsApi::new(client);

        Ok(Self {
            config,
            http,
            session,
            filters,
            feed,
            jobs,
            filter_rx: Mutex::new(Some(filter_rx)),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Restore any persisted session, start the filter listener, and load
    /// the first feed page. Call once, from inside the runtime.
    pub async fn start(&self) -> Result<(), ApiError> {
        self.session.restore();
        let rx = match self.filter_rx.lock() {
            Ok(mut guard) => guard.take(),
            Err(e) => {
                tracing::error!("Mutex poisoned taking filter receiver: {e}");
                None
            }
        };
        if let Some(rx) = rx {
            Arc::clone(&self.feed).spawn_listener(rx);
        }
        self.feed.refresh().await
    }

    /// Authenticate and establish the session.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let credentials = LoginRequest { email: email.into(), password: password.into() };
        self.session
            .login(&self.http, &self.config.base_url, &credentials)
            .await
    }

    /// Drop the session. The next feed reset renders the anonymous view.
    pub fn logout(&self) {
        self.session.logout();
    }

    /// `POST /users/register`. Does not log the new account in; callers
    /// follow up with [`JobBoardClient::login`].
    pub async fn register(&self, payload: &RegistrationRequest) -> Result<User, ApiError> {
        let url = format!("{}/users/register", self.config.base_url.trim_end_matches('/'));
        let resp = self.http.post(url).json(payload).send().await?;
        if !resp.status().is_success() {
            return Err(ApiError::from_response(resp).await);
        }
        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facade_wires_collaborators() {
        let client = JobBoardClient::with_store(
            ClientConfig::with_base_url("http://localhost:1"),
            Box::new(MemoryCredentialStore::default()),
        )
        .unwrap();

        assert!(!client.session.is_authenticated());
        assert_eq!(client.config().page_limit, 20);
        // The filter receiver is armed exactly once.
        assert!(client.filter_rx.lock().unwrap().is_some());

        let snap = tokio_test::block_on(client.feed.snapshot());
        assert!(snap.jobs.is_empty());
        assert_eq!(snap.phase, FeedPhase::Idle);
        assert!(!snap.has_more);
        assert!(snap.error.is_none());
    }
}
