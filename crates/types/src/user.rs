// crates/types/src/user.rs
//! The account snapshot held by a session.

use serde::{Deserialize, Serialize};

/// A normalized user record.
///
/// Replaced wholesale on login and cleared on logout; never mutated field
/// by field. Everything except `is_admin` is nullable because the login
/// endpoint may omit profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "codegen", derive(ts_rs::TS), ts(export))]
pub struct User {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

impl User {
    /// "First Last", falling back to the email, falling back to "Account".
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.to_string(),
            (None, Some(last)) => last.to_string(),
            (None, None) => self
                .email
                .clone()
                .unwrap_or_else(|| "Account".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default_to_none() {
        let user: User = serde_json::from_str("{}").unwrap();
        assert_eq!(user, User::default());
        assert!(!user.is_admin);
    }

    #[test]
    fn test_display_name_fallbacks() {
        let full = User {
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            ..User::default()
        };
        assert_eq!(full.display_name(), "Ada Lovelace");

        let email_only = User {
            email: Some("ada@example.com".into()),
            ..User::default()
        };
        assert_eq!(email_only.display_name(), "ada@example.com");

        assert_eq!(User::default().display_name(), "Account");
    }
}
