// crates/client/src/error.rs
//! Error taxonomy for API calls.
//!
//! Every variant renders as a message the display layer can show as-is.
//! 401 is normally resolved inside [`crate::http::AuthorizedClient`] by a
//! one-shot token refresh; callers only see `Unauthorized` when that
//! refresh itself failed (or there was no session to refresh).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    /// 401 that survived the internal refresh attempt. Carries the
    /// server-reported reason when one was parseable (login rejections
    /// report "Invalid credentials" this way).
    #[error("{}", detail.as_deref().unwrap_or("your session has expired, please sign in again"))]
    Unauthorized { detail: Option<String> },

    #[error("the requested posting could not be found")]
    NotFound,

    #[error("the server hit an internal error ({status}), please try again")]
    Server { status: u16 },

    /// Any other 4xx, surfaced with the server-provided detail text.
    #[error("{detail}")]
    Validation { status: u16, detail: String },

    /// A status change the posting lifecycle does not allow, rejected
    /// before any network traffic.
    #[error(transparent)]
    Transition(#[from] jobboard_types::InvalidTransition),
}

impl ApiError {
    /// Classify a non-success response, consuming its body for detail text.
    pub async fn from_response(resp: reqwest::Response) -> Self {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Self::from_status(status, &body)
    }

    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 => Self::Unauthorized { detail: extract_detail(body) },
            404 => Self::NotFound,
            s if s >= 500 => Self::Server { status: s },
            s => Self::Validation {
                status: s,
                detail: extract_detail(body)
                    .unwrap_or_else(|| format!("request failed with status {s}")),
            },
        }
    }
}

/// Pull the human-readable message out of a FastAPI error body.
///
/// `detail` is usually a string; 422 validation errors carry a list of
/// objects instead, which is flattened to its `msg` fields.
fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            if msgs.is_empty() {
                None
            } else {
                Some(msgs.join("; "))
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_by_status() {
        assert!(matches!(ApiError::from_status(401, ""), ApiError::Unauthorized { .. }));
        assert!(matches!(ApiError::from_status(404, ""), ApiError::NotFound));
        assert!(matches!(ApiError::from_status(500, ""), ApiError::Server { status: 500 }));
        assert!(matches!(ApiError::from_status(503, ""), ApiError::Server { status: 503 }));
        assert!(matches!(
            ApiError::from_status(400, ""),
            ApiError::Validation { status: 400, .. }
        ));
    }

    #[test]
    fn test_string_detail_is_surfaced() {
        let err = ApiError::from_status(400, r#"{"detail": "Passwords do not match"}"#);
        assert_eq!(err.to_string(), "Passwords do not match");
    }

    #[test]
    fn test_unauthorized_carries_server_reason() {
        let err = ApiError::from_status(401, r#"{"detail": "Invalid credentials"}"#);
        assert_eq!(err.to_string(), "Invalid credentials");

        let bare = ApiError::from_status(401, "");
        assert_eq!(bare.to_string(), "your session has expired, please sign in again");
    }

    #[test]
    fn test_validation_list_detail_is_flattened() {
        let body = r#"{"detail": [
            {"loc": ["body", "title"], "msg": "field required", "type": "value_error"},
            {"loc": ["body", "application_url"], "msg": "invalid url", "type": "value_error"}
        ]}"#;
        let err = ApiError::from_status(422, body);
        assert_eq!(err.to_string(), "field required; invalid url");
    }

    #[test]
    fn test_unparseable_body_falls_back_to_status() {
        let err = ApiError::from_status(418, "<html>teapot</html>");
        assert_eq!(err.to_string(), "request failed with status 418");
    }
}
