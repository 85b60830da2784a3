// crates/client/src/session.rs
//! Session lifecycle: login, logout, restore, and credential persistence.
//!
//! A [`SessionStore`] owns the current [`Session`] and is injected into
//! every collaborator that needs it; there is no ambient global. The
//! session is all-or-nothing: a token without a user (or the reverse) is
//! treated as no session at all.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use jobboard_types::{LoginRequest, LoginResponse, User};

use crate::error::ApiError;

/// The authenticated identity plus bearer token currently held by the
/// client.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub user: User,
}

/// On-disk credential payload. Token and user are independent fields; a
/// restore only succeeds when both are present.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<User>,
}

/// Storage backend for the persisted session.
///
/// Implementations are expected to be cheap; the store is called from
/// non-async paths and must not block for long.
pub trait CredentialStore: Send + Sync {
    /// The persisted token and user, or `None` when nothing usable is
    /// stored. Implementations discard malformed or partial data
    /// themselves so a later load does not resurrect it.
    fn load(&self) -> Option<(String, User)>;
    fn save(&self, token: &str, user: &User);
    fn clear(&self);
}

/// JSON-file credential store, the production backend.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.jobboard/credentials.json`, or `None` when the home directory
    /// cannot be determined.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".jobboard").join("credentials.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Option<(String, User)> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                debug!("could not read credentials file: {e}");
                return None;
            }
        };

        let parsed: CredentialsFile = match serde_json::from_slice(&bytes) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("discarding malformed credentials file: {e}");
                self.clear();
                return None;
            }
        };

        match (parsed.access_token, parsed.user) {
            (Some(token), Some(user)) if !token.is_empty() => Some((token, user)),
            _ => {
                // One half without the other is as useless as neither.
                debug!("discarding partial credentials file");
                self.clear();
                None
            }
        }
    }

    fn save(&self, token: &str, user: &User) {
        let payload = CredentialsFile {
            access_token: Some(token.to_string()),
            user: Some(user.clone()),
        };
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("could not create credentials directory: {e}");
                return;
            }
        }
        match serde_json::to_vec_pretty(&payload) {
            Ok(bytes) => {
                if let Err(e) = std::fs::write(&self.path, bytes) {
                    warn!("could not persist credentials: {e}");
                }
            }
            Err(e) => warn!("could not serialize credentials: {e}"),
        }
    }

    fn clear(&self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("could not remove credentials file: {e}");
            }
        }
    }
}

/// In-memory credential store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryCredentialStore {
    slot: RwLock<Option<(String, User)>>,
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Option<(String, User)> {
        match self.slot.read() {
            Ok(guard) => guard.clone(),
            Err(e) => {
                tracing::error!("RwLock poisoned reading credentials: {e}");
                None
            }
        }
    }

    fn save(&self, token: &str, user: &User) {
        if let Ok(mut guard) = self.slot.write() {
            *guard = Some((token.to_string(), user.clone()));
        }
    }

    fn clear(&self) {
        if let Ok(mut guard) = self.slot.write() {
            *guard = None;
        }
    }
}

/// Owner of the current credential and user identity.
pub struct SessionStore {
    session: RwLock<Option<Session>>,
    store: Box<dyn CredentialStore>,
}

impl SessionStore {
    pub fn new(store: Box<dyn CredentialStore>) -> Self {
        Self { session: RwLock::new(None), store }
    }

    /// Load any persisted session. Malformed or partial data degrades to
    /// anonymous without surfacing an error.
    pub fn restore(&self) {
        match self.store.load() {
            Some((access_token, user)) => {
                debug!(admin = user.is_admin, "restored persisted session");
                self.set(Some(Session { access_token, user }));
            }
            None => {
                debug!("no persisted session; starting anonymous");
                self.set(None);
            }
        }
    }

    /// Authenticate against `POST /users/login`.
    ///
    /// On success the normalized user and token are persisted and become
    /// the in-memory session. On failure the state is left untouched and
    /// the server-reported reason is returned.
    pub async fn login(
        &self,
        http: &reqwest::Client,
        base_url: &str,
        credentials: &LoginRequest,
    ) -> Result<Session, ApiError> {
        let url = format!("{}/users/login", base_url.trim_end_matches('/'));
        let resp = http.post(url).json(credentials).send().await?;
        if !resp.status().is_success() {
            return Err(ApiError::from_response(resp).await);
        }

        let body: LoginResponse = resp.json().await?;
        let user = body.normalized_user();
        let session = Session { access_token: body.access_token, user };

        self.store.save(&session.access_token, &session.user);
        self.set(Some(session.clone()));
        debug!(admin = session.user.is_admin, "login succeeded");
        Ok(session)
    }

    /// Drop the persisted credential and the in-memory session. Safe to
    /// call repeatedly or while anonymous.
    pub fn logout(&self) {
        self.store.clear();
        self.set(None);
    }

    pub fn is_authenticated(&self) -> bool {
        self.read(|session| {
            session.map(|s| !s.access_token.is_empty()).unwrap_or(false)
        })
    }

    pub fn is_admin(&self) -> bool {
        self.read(|session| session.map(|s| s.user.is_admin).unwrap_or(false))
            && self.is_authenticated()
    }

    pub fn access_token(&self) -> Option<String> {
        self.read(|session| session.map(|s| s.access_token.clone()))
    }

    pub fn current_user(&self) -> Option<User> {
        self.read(|session| session.map(|s| s.user.clone()))
    }

    /// Swap in a rotated token, keeping the current user. Used by the
    /// refresh path; a no-op when the session was cleared in the meantime.
    pub fn replace_token(&self, token: String) {
        let updated = match self.session.write() {
            Ok(mut guard) => match guard.as_mut() {
                Some(session) => {
                    session.access_token = token;
                    Some(session.clone())
                }
                None => None,
            },
            Err(e) => {
                tracing::error!("RwLock poisoned replacing token: {e}");
                None
            }
        };
        match updated {
            Some(session) => self.store.save(&session.access_token, &session.user),
            None => debug!("token rotation ignored; no active session"),
        }
    }

    fn set(&self, value: Option<Session>) {
        match self.session.write() {
            Ok(mut guard) => *guard = value,
            Err(e) => tracing::error!("RwLock poisoned writing session: {e}"),
        }
    }

    fn read<T>(&self, f: impl FnOnce(Option<&Session>) -> T) -> T {
        match self.session.read() {
            Ok(guard) => f(guard.as_ref()),
            Err(e) => {
                tracing::error!("RwLock poisoned reading session: {e}");
                f(None)
            }
        }
    }
}
