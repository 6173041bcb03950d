//! Unified error handling with Sentry integration.
//!
//! [`CartError`] is what the cart view and the CLI hand back to callers.
//! Sentry calls are no-ops until a client is initialised, so library code
//! can report unconditionally.

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::session::SessionError;
use crate::view::CheckoutError;

/// Crate-level error type.
#[derive(Debug, Error)]
pub enum CartError {
    /// Backend API call failed.
    #[error("Backend error: {0}")]
    Api(#[from] ApiError),

    /// Session user is missing or malformed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Checkout did not complete.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),
}

/// Report an error to Sentry and log it with the event id.
pub fn capture_error(err: &(dyn std::error::Error + 'static), context: &str) {
    let event_id = sentry::capture_error(err);
    tracing::error!(
        error = %err,
        sentry_event_id = %event_id,
        "{context}"
    );
}

/// Set the Sentry user context from the session user.
pub fn set_sentry_user(name: &str, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            username: Some(name.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of cart
/// actions leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Removed item", Some(&[("item_id", "12")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
