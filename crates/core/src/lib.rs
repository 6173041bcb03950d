//! Pick'n'Go Core - Shared types library.
//!
//! This crate provides common types used across the Pick'n'Go cart components:
//! - `cart` - Cart view-model and REST client for the storefront backend
//! - `cli` - Command-line front end for browsing and checking out a cart
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices and user names

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
