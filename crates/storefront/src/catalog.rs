//! Catalog filtering and sorting.
//!
//! Pure functions over a fetched product list. `filter_products` applies the
//! category filter, then the price bucket, then the sort. Every stage is
//! skipped when set to its default.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use icu_collator::options::{CollatorOptions, Strength};
use icu_collator::{Collator, CollatorBorrowed};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::warn;

use crate::shopify::Product;

/// Category label of products without a product type.
pub const UNCATEGORIZED: &str = "Other";

/// Number of related products shown on a product page.
pub const RELATED_PRODUCTS_LIMIT: usize = 4;

/// Unknown filter value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind}: {value}")]
pub struct ParseFilterError {
    kind: &'static str,
    value: String,
}

// =============================================================================
// Filter values
// =============================================================================

/// Category stage selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    /// Keep every product.
    #[default]
    All,
    /// Keep products with this label.
    Only(String),
}

impl CategoryFilter {
    fn matches(&self, product: &Product) -> bool {
        match self {
            Self::All => true,
            Self::Only(category) => category_label(product) == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s == "all" {
            Self::All
        } else {
            Self::Only(s.to_string())
        })
    }
}

/// Price bucket over the minimum variant price. Ranges include the lower
/// bound and exclude the upper one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PriceBucket {
    /// No price filtering.
    #[default]
    All,
    /// `[0, 25)`
    Under25,
    /// `[25, 50)`
    From25To50,
    /// `[50, 100)`
    From50To100,
    /// `[100, ∞)`
    From100,
}

impl PriceBucket {
    /// Every bucket, in display order.
    pub const ALL: [Self; 5] = [
        Self::All,
        Self::Under25,
        Self::From25To50,
        Self::From50To100,
        Self::From100,
    ];

    /// URL-style value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Under25 => "0-25",
            Self::From25To50 => "25-50",
            Self::From50To100 => "50-100",
            Self::From100 => "100+",
        }
    }

    fn bounds(self) -> Option<(Decimal, Option<Decimal>)> {
        match self {
            Self::All => None,
            Self::Under25 => Some((Decimal::ZERO, Some(Decimal::from(25)))),
            Self::From25To50 => Some((Decimal::from(25), Some(Decimal::from(50)))),
            Self::From50To100 => Some((Decimal::from(50), Some(Decimal::from(100)))),
            Self::From100 => Some((Decimal::from(100), None)),
        }
    }

    /// Whether a price falls into the bucket.
    ///
    /// Unparsable prices (`None`) only fall into `All`.
    #[must_use]
    pub fn contains(self, price: Option<Decimal>) -> bool {
        let Some((low, high)) = self.bounds() else {
            return true;
        };
        let Some(price) = price else {
            return false;
        };
        price >= low && high.is_none_or(|high| price < high)
    }
}

impl fmt::Display for PriceBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceBucket {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| ParseFilterError {
                kind: "price range",
                value: s.to_string(),
            })
    }
}

/// Sort order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortKey {
    /// Input order.
    #[default]
    Default,
    /// Cheapest first.
    PriceAsc,
    /// Most expensive first.
    PriceDesc,
    /// Title A to Z.
    NameAsc,
    /// Title Z to A.
    NameDesc,
}

impl SortKey {
    /// Every sort key, in display order.
    pub const ALL: [Self; 5] = [
        Self::Default,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::NameAsc,
        Self::NameDesc,
    ];

    /// URL-style value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ParseFilterError {
                kind: "sort key",
                value: s.to_string(),
            })
    }
}

/// Catalog filter selection. `Default` shows everything in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    /// Category stage.
    pub category: CategoryFilter,
    /// Price stage.
    pub price_range: PriceBucket,
    /// Sort stage.
    pub sort_key: SortKey,
}

impl FilterState {
    /// Whether any stage is set.
    #[must_use]
    pub fn is_active(&self) -> bool {
        *self != Self::default()
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Category label of a product.
#[must_use]
pub fn category_label(product: &Product) -> &str {
    if product.product_type.is_empty() {
        UNCATEGORIZED
    } else {
        &product.product_type
    }
}

fn min_price(product: &Product) -> Option<Decimal> {
    product.price_range.min_variant_price.decimal()
}

/// Unparsable prices sort last in both directions.
fn compare_prices(a: Option<Decimal>, b: Option<Decimal>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if descending => b.cmp(&a),
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Root-locale collator at tertiary strength, as used for title sorting.
fn title_collator() -> Option<CollatorBorrowed<'static>> {
    let mut options = CollatorOptions::default();
    options.strength = Some(Strength::Tertiary);

    Collator::try_new(Default::default(), options)
        .inspect_err(|e| warn!(error = %e, "Collator unavailable, sorting titles by code point"))
        .ok()
}

/// Locale-aware title order. Collation ties fall back to the raw string.
fn compare_titles(collator: Option<&CollatorBorrowed<'_>>, a: &str, b: &str) -> Ordering {
    collator
        .map_or_else(
            || a.to_lowercase().cmp(&b.to_lowercase()),
            |collator| collator.compare(a, b),
        )
        .then_with(|| a.cmp(b))
}

/// Filter and sort products.
///
/// Sorting is stable: products with equal keys keep their input order.
#[must_use]
pub fn filter_products<'a>(products: &'a [Product], filter: &FilterState) -> Vec<&'a Product> {
    let mut result: Vec<&Product> = products
        .iter()
        .filter(|p| filter.category.matches(p))
        .filter(|p| filter.price_range.contains(min_price(p)))
        .collect();

    match filter.sort_key {
        SortKey::Default => {}
        SortKey::PriceAsc => {
            result.sort_by(|a, b| compare_prices(min_price(a), min_price(b), false));
        }
        SortKey::PriceDesc => {
            result.sort_by(|a, b| compare_prices(min_price(a), min_price(b), true));
        }
        SortKey::NameAsc => {
            let collator = title_collator();
            result.sort_by(|a, b| compare_titles(collator.as_ref(), &a.title, &b.title));
        }
        SortKey::NameDesc => {
            let collator = title_collator();
            result.sort_by(|a, b| compare_titles(collator.as_ref(), &b.title, &a.title));
        }
    }

    result
}

/// Distinct category labels of all products, sorted.
#[must_use]
pub fn categories(products: &[Product]) -> Vec<String> {
    products
        .iter()
        .map(category_label)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}

/// Products whose title or product type contains `query`, ignoring case.
///
/// An empty query matches everything.
#[must_use]
pub fn search_products<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return products.iter().collect();
    }

    products
        .iter()
        .filter(|p| {
            p.title.to_lowercase().contains(&query)
                || p.product_type.to_lowercase().contains(&query)
        })
        .collect()
}

/// Up to `limit` products other than `current_handle`, in input order.
#[must_use]
pub fn related_products<'a>(
    products: &'a [Product],
    current_handle: &str,
    limit: usize,
) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| p.handle != current_handle)
        .take(limit)
        .collect()
}
