//! Core types for Pick'n'Go.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod user_name;

pub use id::*;
pub use price::{CurrencyCode, Price};
pub use user_name::{UserName, UserNameError};
