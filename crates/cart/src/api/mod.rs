//! Cart and transaction resources of the storefront backend.
//!
//! # Architecture
//!
//! - The backend owns both collections; this crate never caches them
//! - [`CartResource`] and [`TransactionResource`] are the seams the view
//!   talks to, so tests can swap in fakes
//! - [`RestClient`] implements both over `reqwest`
//!
//! # Endpoints
//!
//! - `GET  {base}/carts?filters[user_name][$eq]={name}&_limit={limit}` → `{ data: CartItem[] }`
//! - `DELETE {base}/carts/{id}` → 2xx
//! - `POST {base}/transactions` with `{ data: TransactionRecord }` → `{ data: { id, .. } }`

mod client;
pub mod types;

pub use client::RestClient;
pub use types::*;

use pickngo_core::{CartItemId, TransactionId, UserName};
use thiserror::Error;

/// Errors that can occur when talking to the backend API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// API token cannot be sent as a header value.
    #[error("Invalid API token: {0}")]
    InvalidToken(String),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// HTTP status code, when the backend answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            Self::RateLimited(_) => Some(429),
            _ => None,
        }
    }
}

/// Read/delete access to a user's cart rows.
pub trait CartResource {
    /// Fetch every cart row whose `user_name` equals `user`, in server order.
    async fn list_for_user(&self, user: &UserName) -> Result<Vec<CartItem>, ApiError>;

    /// Delete one cart row.
    async fn delete_item(&self, id: CartItemId) -> Result<(), ApiError>;
}

/// Create access to purchase records.
pub trait TransactionResource {
    /// Persist one transaction record.
    ///
    /// `Ok` means the backend stored the record. The server id is returned
    /// when the reply carries one.
    async fn create_transaction(
        &self,
        record: &TransactionRecord,
    ) -> Result<Option<TransactionId>, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Status {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 500 - boom");

        let err = ApiError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }

    #[test]
    fn test_api_error_status() {
        assert_eq!(ApiError::NotFound("carts/9".to_string()).status(), Some(404));
        assert_eq!(ApiError::RateLimited(1).status(), Some(429));
        let err = ApiError::Url(url::ParseError::EmptyHost);
        assert_eq!(err.status(), None);
    }
}
