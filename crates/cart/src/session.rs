//! Signed-in user identity.
//!
//! The storefront keeps the signed-in user as a JSON blob in session storage
//! (`{"name": "...", ...}`). The cart view needs that identity before it can
//! issue any request, so it is parsed up front and handed to the view
//! explicitly.

use pickngo_core::{UserName, UserNameError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when resolving the session user.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Nothing is stored for the session user.
    #[error("No signed-in user in session")]
    NoSession,

    /// The stored value is not valid JSON of the expected shape.
    #[error("Malformed session user: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The stored value has no usable `name`.
    #[error("Invalid session user name: {0}")]
    InvalidName(#[from] UserNameError),
}

/// Session-stored user identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Name the backend files cart rows under.
    pub name: UserName,
    /// Email, when the storefront stored one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Session blob as stored; every field may be missing.
#[derive(Deserialize)]
struct StoredUser {
    name: Option<String>,
    email: Option<String>,
}

impl CurrentUser {
    /// Identity for `name`.
    #[must_use]
    pub const fn new(name: UserName) -> Self {
        Self { name, email: None }
    }

    /// Parse a user name into an identity.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidName`] if `name` is blank or too long.
    pub fn from_name(name: &str) -> Result<Self, SessionError> {
        Ok(Self::new(UserName::parse(name)?))
    }

    /// Resolve the identity from the raw session-storage value.
    ///
    /// # Errors
    ///
    /// - [`SessionError::NoSession`] if `raw` is absent, blank, `null`, or has no `name`
    /// - [`SessionError::Malformed`] if `raw` is not a JSON object
    /// - [`SessionError::InvalidName`] if `name` is blank or too long
    pub fn from_session_json(raw: Option<&str>) -> Result<Self, SessionError> {
        let raw = raw.map(str::trim).filter(|s| !s.is_empty() && *s != "null");
        let Some(raw) = raw else {
            return Err(SessionError::NoSession);
        };

        let stored: StoredUser = serde_json::from_str(raw)?;
        let name = stored.name.ok_or(SessionError::NoSession)?;

        Ok(Self {
            name: UserName::parse(&name)?,
            email: stored.email.filter(|e| !e.trim().is_empty()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_session_json() {
        let user =
            CurrentUser::from_session_json(Some(r#"{"name":"alice","email":"a@example.com","id":3}"#))
                .unwrap();
        assert_eq!(user.name.as_str(), "alice");
        assert_eq!(user.email.as_deref(), Some("a@example.com"));
    }

    #[test]
    fn test_missing_session() {
        assert!(matches!(
            CurrentUser::from_session_json(None),
            Err(SessionError::NoSession)
        ));
        assert!(matches!(
            CurrentUser::from_session_json(Some("null")),
            Err(SessionError::NoSession)
        ));
        assert!(matches!(
            CurrentUser::from_session_json(Some("  ")),
            Err(SessionError::NoSession)
        ));
    }

    #[test]
    fn test_missing_name() {
        assert!(matches!(
            CurrentUser::from_session_json(Some(r#"{"email":"a@example.com"}"#)),
            Err(SessionError::NoSession)
        ));
    }

    #[test]
    fn test_malformed_session() {
        assert!(matches!(
            CurrentUser::from_session_json(Some("{not json")),
            Err(SessionError::Malformed(_))
        ));
        assert!(matches!(
            CurrentUser::from_session_json(Some("[1,2]")),
            Err(SessionError::Malformed(_))
        ));
    }

    #[test]
    fn test_blank_name() {
        assert!(matches!(
            CurrentUser::from_session_json(Some(r#"{"name":"  "}"#)),
            Err(SessionError::InvalidName(UserNameError::Blank))
        ));
        assert!(matches!(
            CurrentUser::from_name(""),
            Err(SessionError::InvalidName(_))
        ));
    }
}
