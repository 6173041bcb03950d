//! Storefront user name type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`UserName`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UserNameError {
    /// The input is empty or only whitespace.
    #[error("user name cannot be blank")]
    Blank,
    /// The input is too long.
    #[error("user name must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// The display name of a signed-in storefront user.
///
/// Cart rows are owned by user name (the backend filters on exact equality),
/// so this is the identity the cart view works with. Surrounding whitespace
/// is trimmed; inner characters are kept verbatim.
///
/// ## Examples
///
/// ```
/// use pickngo_core::UserName;
///
/// assert_eq!(UserName::parse("  alice ").unwrap().as_str(), "alice");
/// assert!(UserName::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct UserName(String);

impl UserName {
    /// Maximum length of a user name.
    pub const MAX_LENGTH: usize = 255;

    /// Parse a `UserName` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or longer than
    /// [`Self::MAX_LENGTH`] characters.
    pub fn parse(s: &str) -> Result<Self, UserNameError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(UserNameError::Blank);
        }
        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(UserNameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the user name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserName {
    type Error = UserNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<UserName> for String {
    fn from(name: UserName) -> Self {
        name.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        assert_eq!(UserName::parse(" bob\t").unwrap().as_str(), "bob");
    }

    #[test]
    fn test_parse_keeps_inner_spaces() {
        assert_eq!(
            UserName::parse("Juan dela Cruz").unwrap().as_str(),
            "Juan dela Cruz"
        );
    }

    #[test]
    fn test_parse_blank() {
        assert_eq!(UserName::parse(""), Err(UserNameError::Blank));
        assert_eq!(UserName::parse("  "), Err(UserNameError::Blank));
    }

    #[test]
    fn test_parse_too_long() {
        let long = "a".repeat(UserName::MAX_LENGTH + 1);
        assert!(matches!(
            UserName::parse(&long),
            Err(UserNameError::TooLong { .. })
        ));
    }

    #[test]
    fn test_deserialize_validates() {
        let name: UserName = serde_json::from_str("\"carol\"").unwrap();
        assert_eq!(name.as_str(), "carol");
        assert!(serde_json::from_str::<UserName>("\"\"").is_err());
    }
}
