// crates/client/src/http.rs
//! Authorized HTTP plumbing.
//!
//! [`AuthorizedClient`] attaches the session's bearer token to outgoing
//! requests and resolves 401 responses with a one-shot refresh-and-retry:
//! refresh the token, retry the original request once, and if the refresh
//! itself fails, log the session out and hand the caller the original 401.
//! Refreshing is single-flight so near-simultaneous 401s produce exactly
//! one refresh call.

use std::sync::Arc;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use jobboard_types::RefreshResponse;

use crate::error::ApiError;
use crate::session::SessionStore;

pub struct AuthorizedClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
    /// Serializes refresh attempts. Callers that arrive while a refresh is
    /// in flight wait here and then reuse the rotated token.
    refresh_gate: Mutex<()>,
}

impl AuthorizedClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, session: Arc<SessionStore>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url, session, refresh_gate: Mutex::new(()) }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Start a request against `path`. Headers and query parameters added
    /// by the caller are preserved; the bearer token is attached at send
    /// time so it is always current.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    /// Send a request, resolving 401 with one refresh-and-retry.
    ///
    /// The returned response can still be any non-success status; use
    /// [`AuthorizedClient::json`] or [`AuthorizedClient::expect_success`]
    /// to map those through the error taxonomy.
    pub async fn send(&self, req: RequestBuilder) -> Result<Response, ApiError> {
        let mut request = req.build()?;
        let sent_token = self.session.access_token();
        if let Some(token) = sent_token.as_deref() {
            attach_bearer(&mut request, token);
        }
        let retry = request.try_clone();

        let resp = self.http.execute(request).await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }

        // 401 on an anonymous request: nothing to refresh, pass it through.
        let Some(stale_token) = sent_token else {
            return Ok(resp);
        };
        let Some(mut retry) = retry else {
            warn!("unauthorized response on a non-cloneable request; returning it unretried");
            return Ok(resp);
        };

        match self.refresh_token(&stale_token).await {
            Ok(fresh) => {
                debug!("retrying request with refreshed token");
                attach_bearer(&mut retry, &fresh);
                Ok(self.http.execute(retry).await?)
            }
            Err(err) => {
                warn!(error = %err, "token refresh failed; clearing session");
                self.session.logout();
                Ok(resp)
            }
        }
    }

    /// Send and parse a JSON body, mapping non-success statuses through
    /// the error taxonomy.
    pub async fn json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        let resp = self.expect_success(req).await?;
        Ok(resp.json().await?)
    }

    /// Send and discard the body, mapping non-success statuses through the
    /// error taxonomy.
    pub async fn expect_success(&self, req: RequestBuilder) -> Result<Response, ApiError> {
        let resp = self.send(req).await?;
        if !resp.status().is_success() {
            return Err(ApiError::from_response(resp).await);
        }
        Ok(resp)
    }

    /// Exchange `stale_token` for a fresh one at `POST /users/refresh`.
    ///
    /// Single-flight: the gate serializes refreshers, and a waiter whose
    /// stale token was already rotated by the winner skips the network
    /// call entirely.
    async fn refresh_token(&self, stale_token: &str) -> Result<String, ApiError> {
        let _guard = self.refresh_gate.lock().await;

        match self.session.access_token() {
            Some(current) if current != stale_token => {
                debug!("token already rotated by a concurrent refresh");
                return Ok(current);
            }
            Some(_) => {}
            // Session cleared while we waited for the gate.
            None => return Err(ApiError::Unauthorized { detail: None }),
        }

        let resp = self
            .http
            .post(self.url("/users/refresh"))
            .bearer_auth(stale_token)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ApiError::from_response(resp).await);
        }

        let body: RefreshResponse = resp.json().await?;
        self.session.replace_token(body.access_token.clone());
        debug!("access token refreshed");
        Ok(body.access_token)
    }
}

fn attach_bearer(request: &mut reqwest::Request, token: &str) {
    match HeaderValue::from_str(&format!("Bearer {token}")) {
        // insert, not append: a retried request must not carry two
        // Authorization headers.
        Ok(value) => {
            request.headers_mut().insert(AUTHORIZATION, value);
        }
        Err(e) => warn!("token not attachable as header value: {e}"),
    }
}
