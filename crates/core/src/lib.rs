//! Chillhous Core - Shared types library.
//!
//! This crate provides common types used across the Chillhous components:
//! - `storefront` - Catalog, cart and wishlist core backed by Shopify
//! - `cli` - Command-line front-end driving the storefront core
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe Shopify IDs and money amounts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
