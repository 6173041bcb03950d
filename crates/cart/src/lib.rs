//! Pick'n'Go Cart library.
//!
//! The cart panel of the storefront as a library: it loads the signed-in
//! user's cart rows from the backend REST API, tracks which rows are selected,
//! computes running totals, removes rows, and checks out by posting one
//! transaction record per selected row before deleting the purchased rows.
//!
//! # Modules
//!
//! - [`config`] - Environment-driven configuration
//! - [`session`] - Signed-in user identity
//! - [`api`] - Cart and transaction resources, plus the `reqwest` client
//! - [`view`] - The [`CartView`](view::CartView) view-model
//! - [`error`] - Crate-level error type and Sentry helpers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod session;
pub mod view;

pub use api::{ApiError, CartResource, RestClient, TransactionResource};
pub use config::{CartConfig, ConfigError};
pub use error::CartError;
pub use session::{CurrentUser, SessionError};
pub use view::{CartView, CheckoutError, CheckoutReceipt, Notice};
