//! Domain types for Shopify Storefront API.
//!
//! These types provide a clean, ergonomic API separate from the raw
//! GraphQL wire types in the client module.

use serde::{Deserialize, Serialize};

pub use chillhous_core::Money;
use chillhous_core::{CartId, CartLineId, ProductId, VariantId};

// =============================================================================
// Product Types
// =============================================================================

/// Price range for a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    /// Minimum price among all variants.
    pub min_variant_price: Money,
}

/// Product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Image URL.
    pub url: String,
    /// Alt text for accessibility.
    pub alt_text: Option<String>,
}

/// Selected option on a product variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectedOption {
    /// Option name (e.g., "Size", "Color").
    pub name: String,
    /// Selected value (e.g., "Large", "Blue").
    pub value: String,
}

impl SelectedOption {
    /// Create a new option selection.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Product option definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOption {
    /// Option name (e.g., "Size").
    pub name: String,
    /// Available values (e.g., `["Small", "Medium", "Large"]`).
    pub values: Vec<String>,
}

/// A product variant (specific combination of options).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariant {
    /// Variant ID.
    pub id: VariantId,
    /// Variant title (combination of option values).
    pub title: String,
    /// Current price.
    pub price: Money,
    /// Whether this variant is available for sale.
    pub available_for_sale: bool,
    /// Selected options for this variant.
    pub selected_options: Vec<SelectedOption>,
}

impl ProductVariant {
    /// Whether every chosen option matches this variant's own selection.
    fn matches(&self, chosen: &[SelectedOption]) -> bool {
        chosen.iter().all(|choice| {
            self.selected_options
                .iter()
                .any(|own| own.name == choice.name && own.value == choice.value)
        })
    }
}

/// A product in the store.
///
/// Immutable snapshot of one catalog fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// URL handle.
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Plain text description.
    pub description: String,
    /// Product type (used as the category label). Empty when unset.
    pub product_type: String,
    /// Price range across variants.
    pub price_range: PriceRange,
    /// Product images.
    pub images: Vec<Image>,
    /// Product variants.
    pub variants: Vec<ProductVariant>,
    /// Product options.
    pub options: Vec<ProductOption>,
}

impl Product {
    /// First image, if any.
    #[must_use]
    pub fn featured_image(&self) -> Option<&Image> {
        self.images.first()
    }

    /// Pick the variant matching the chosen option values.
    ///
    /// Falls back to the first variant when the product has no options or
    /// when no variant matches every choice.
    #[must_use]
    pub fn find_variant(&self, chosen: &[SelectedOption]) -> Option<&ProductVariant> {
        if self.options.is_empty() {
            return self.variants.first();
        }

        self.variants
            .iter()
            .find(|variant| variant.matches(chosen))
            .or_else(|| self.variants.first())
    }
}

// =============================================================================
// Cart Types
// =============================================================================

/// User error from cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartUserError {
    /// Error code, when Shopify provides one.
    pub code: Option<String>,
    /// Field path that caused the error.
    pub field: Option<Vec<String>>,
    /// Human-readable error message.
    pub message: String,
}

/// Result of creating a remote cart with a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedCart {
    /// Remote cart ID.
    pub cart_id: CartId,
    /// Checkout URL (already tagged with the online store channel).
    pub checkout_url: String,
    /// Remote ID of the line that was created with the cart.
    pub line_id: CartLineId,
}

/// A remote cart line reduced to its identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineRef {
    /// Cart line ID.
    pub id: CartLineId,
    /// Variant the line holds.
    pub variant_id: VariantId,
}
