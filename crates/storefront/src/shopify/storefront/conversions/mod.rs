//! Type conversion functions for Shopify Storefront API responses.

pub mod cart;
pub mod products;

pub use cart::{convert_line_refs, convert_user_error, format_checkout_url};
pub use products::convert_product;
