//! Chillhous Storefront library.
//!
//! The storefront core: a cart mirrored against a Shopify cart, a local
//! wishlist, and the catalog filter pipeline, together with the Shopify
//! Storefront API client they run on.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod shopify;
pub mod state;
pub mod storage;
pub mod wishlist;
