//! Local cart mirrored against a Shopify cart.
//!
//! # Architecture
//!
//! - `CartState` is the local record: lines, remote cart ID and checkout URL
//! - `CartStore` owns the state, performs every change against the remote
//!   cart first and applies the result locally only on success
//! - `CartBackend` is the port to the remote cart (`StorefrontClient` in
//!   production)
//! - The state is persisted under `chillhous-cart` after every change
//!
//! # Invariants
//!
//! - No remote cart means no lines
//! - Every persisted line carries its remote line ID
//! - A checkout URL only exists alongside a remote cart

pub mod backend;
mod store;

pub use backend::{CartBackend, RemoteCartError, classify_user_errors, is_cart_gone};
pub use store::{CartError, CartStore};

use chillhous_core::{CartId, CartLineId, Money, ProductId, VariantId};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::shopify::{Product, ProductVariant, SelectedOption};

/// Display metadata copied from the catalog when a line is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineDetails {
    /// Product the variant belongs to.
    pub product_id: ProductId,
    /// Product URL handle.
    pub handle: String,
    /// Product title.
    pub product_title: String,
    /// Variant title.
    pub variant_title: String,
    /// Featured image URL.
    pub image_url: Option<String>,
    /// Option values that identify the variant.
    pub selected_options: Vec<SelectedOption>,
}

/// One line of the local cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Remote line ID.
    pub remote_line_id: Option<CartLineId>,
    /// Variant held by the line. Unique within the cart.
    pub variant_id: VariantId,
    /// Unit price at add time.
    pub unit_price: Money,
    /// Quantity, always at least 1.
    pub quantity: u32,
    /// Display metadata.
    pub details: CartLineDetails,
}

/// Input to `CartStore::add_item`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartLine {
    /// Variant to add.
    pub variant_id: VariantId,
    /// Unit price.
    pub unit_price: Money,
    /// Quantity to add.
    pub quantity: u32,
    /// Display metadata.
    pub details: CartLineDetails,
}

impl NewCartLine {
    /// Build a line for a variant of a catalog product.
    #[must_use]
    pub fn from_variant(product: &Product, variant: &ProductVariant, quantity: u32) -> Self {
        Self {
            variant_id: variant.id.clone(),
            unit_price: variant.price.clone(),
            quantity,
            details: CartLineDetails {
                product_id: product.id.clone(),
                handle: product.handle.clone(),
                product_title: product.title.clone(),
                variant_title: variant.title.clone(),
                image_url: product.featured_image().map(|i| i.url.clone()),
                selected_options: variant.selected_options.clone(),
            },
        }
    }

    pub(crate) fn into_line(self, remote_line_id: CartLineId) -> CartLine {
        CartLine {
            remote_line_id: Some(remote_line_id),
            variant_id: self.variant_id,
            unit_price: self.unit_price,
            quantity: self.quantity,
            details: self.details,
        }
    }
}

/// The local cart record, as persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartState {
    /// Cart lines in insertion order.
    pub lines: Vec<CartLine>,
    /// Remote cart ID.
    pub remote_cart_id: Option<CartId>,
    /// Checkout URL of the remote cart.
    pub checkout_url: Option<String>,
}

impl CartState {
    /// Line holding `variant_id`.
    #[must_use]
    pub fn line(&self, variant_id: &VariantId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.variant_id == variant_id)
    }

    pub(crate) fn line_mut(&mut self, variant_id: &VariantId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| &l.variant_id == variant_id)
    }

    /// Whether `cart_id` is still the current remote cart.
    #[must_use]
    pub fn is_current(&self, cart_id: &CartId) -> bool {
        self.remote_cart_id.as_ref() == Some(cart_id)
    }

    /// Repair a record read from storage so the invariants hold.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        if self.remote_cart_id.is_none() {
            if !self.lines.is_empty() || self.checkout_url.is_some() {
                warn!(
                    lines = self.lines.len(),
                    "Stored cart has no remote cart, discarding lines"
                );
            }
            return Self::default();
        }

        let before = self.lines.len();
        self.lines.retain(|l| l.remote_line_id.is_some());
        if self.lines.len() != before {
            warn!(
                dropped = before - self.lines.len(),
                "Dropped stored cart lines without remote line ID"
            );
        }

        // Later duplicates of a variant are dropped
        let mut seen = Vec::with_capacity(self.lines.len());
        self.lines.retain(|l| {
            if seen.contains(&l.variant_id) {
                false
            } else {
                seen.push(l.variant_id.clone());
                true
            }
        });

        self.lines.retain(|l| l.quantity > 0);

        // An empty cart is never linked to a remote cart
        if self.lines.is_empty() {
            warn!("Stored cart has no usable lines, unlinking remote cart");
            return Self::default();
        }

        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(variant: &str, remote: Option<&str>, quantity: u32) -> CartLine {
        CartLine {
            remote_line_id: remote.map(CartLineId::new),
            variant_id: VariantId::new(variant),
            unit_price: Money::new("10.00", "USD"),
            quantity,
            details: CartLineDetails {
                product_id: ProductId::new("p1"),
                handle: "tee".to_string(),
                product_title: "Tee".to_string(),
                variant_title: "M".to_string(),
                image_url: None,
                selected_options: vec![],
            },
        }
    }

    #[test]
    fn test_sanitize_drops_lines_without_cart() {
        let state = CartState {
            lines: vec![line("v1", Some("l1"), 1)],
            remote_cart_id: None,
            checkout_url: Some("https://x".to_string()),
        };
        assert_eq!(state.sanitized(), CartState::default());
    }

    #[test]
    fn test_sanitize_drops_unsynced_and_duplicate_lines() {
        let state = CartState {
            lines: vec![
                line("v1", Some("l1"), 1),
                line("v2", None, 2),
                line("v1", Some("l9"), 5),
                line("v3", Some("l3"), 0),
            ],
            remote_cart_id: Some(CartId::new("c1")),
            checkout_url: None,
        }
        .sanitized();

        assert_eq!(state.lines.len(), 1);
        assert_eq!(state.lines[0].remote_line_id, Some(CartLineId::new("l1")));
        assert_eq!(state.remote_cart_id, Some(CartId::new("c1")));
    }

    #[test]
    fn test_sanitize_unlinks_cart_when_every_line_is_dropped() {
        let unsynced = CartState {
            lines: vec![line("v1", None, 1)],
            remote_cart_id: Some(CartId::new("c1")),
            checkout_url: Some("https://x".to_string()),
        };
        assert_eq!(unsynced.sanitized(), CartState::default());

        let emptied = CartState {
            lines: vec![line("v1", Some("l1"), 0), line("v2", Some("l2"), 0)],
            remote_cart_id: Some(CartId::new("c1")),
            checkout_url: Some("https://x".to_string()),
        };
        assert_eq!(emptied.sanitized(), CartState::default());
    }

    #[test]
    fn test_state_serializes_camel_case() {
        let state = CartState {
            lines: vec![line("v1", Some("l1"), 2)],
            remote_cart_id: Some(CartId::new("c1")),
            checkout_url: Some("https://x".to_string()),
        };
        let json = serde_json::to_value(&state).unwrap();

        assert_eq!(json["remoteCartId"], "c1");
        assert_eq!(json["lines"][0]["remoteLineId"], "l1");
        assert_eq!(json["lines"][0]["unitPrice"]["amount"], "10.00");

        let back: CartState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
