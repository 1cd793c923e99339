//! Local wishlist.
//!
//! A persisted set of products keyed by product ID, kept in insertion order.
//! No remote counterpart.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chillhous_core::{Money, ProductId};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::shopify::Product;
use crate::storage::{KeyValueStorage, StorageError, WISHLIST_STORAGE_KEY};

/// A saved product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    /// Product ID.
    pub id: ProductId,
    /// Product URL handle.
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Featured image URL.
    pub image_url: Option<String>,
    /// Minimum variant price.
    pub price: Money,
}

impl From<&Product> for WishlistItem {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            handle: product.handle.clone(),
            title: product.title.clone(),
            image_url: product.featured_image().map(|i| i.url.clone()),
            price: product.price_range.min_variant_price.clone(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WishlistRecord {
    items: Vec<WishlistItem>,
}

/// Persisted wishlist.
pub struct WishlistStore {
    storage: Arc<dyn KeyValueStorage>,
    items: RwLock<Vec<WishlistItem>>,
}

impl std::fmt::Debug for WishlistStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WishlistStore")
            .field("items", &*self.read())
            .finish_non_exhaustive()
    }
}

impl WishlistStore {
    /// Create a store, restoring the persisted wishlist.
    pub fn load(storage: Arc<dyn KeyValueStorage>) -> Self {
        let items = match storage.load(WISHLIST_STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<WishlistRecord>(&raw) {
                Ok(record) => dedup(record.items),
                Err(e) => {
                    warn!(error = %e, "Stored wishlist is unreadable, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                error!(error = %e, "Failed to read stored wishlist, starting empty");
                Vec::new()
            }
        };

        Self {
            storage,
            items: RwLock::new(items),
        }
    }

    /// Saved items in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<WishlistItem> {
        self.read().clone()
    }

    /// Whether a product is saved.
    #[must_use]
    pub fn is_in_wishlist(&self, id: &ProductId) -> bool {
        self.read().iter().any(|i| &i.id == id)
    }

    /// Save an item. Already saved products are left as they are.
    pub fn add_item(&self, item: WishlistItem) {
        let mut items = self.write();
        if items.iter().any(|i| i.id == item.id) {
            return;
        }
        debug!(product_id = %item.id, "Added to wishlist");
        items.push(item);
        self.persist(&items);
    }

    /// Remove a product.
    pub fn remove_item(&self, id: &ProductId) {
        let mut items = self.write();
        items.retain(|i| &i.id != id);
        self.persist(&items);
    }

    /// Add the item if missing, otherwise remove it.
    ///
    /// Returns whether the product is saved afterwards.
    pub fn toggle_item(&self, item: WishlistItem) -> bool {
        let mut items = self.write();
        let saved = if let Some(pos) = items.iter().position(|i| i.id == item.id) {
            items.remove(pos);
            false
        } else {
            items.push(item);
            true
        };
        self.persist(&items);
        saved
    }

    /// Remove everything.
    pub fn clear_wishlist(&self) {
        let mut items = self.write();
        items.clear();
        self.persist(&items);
    }

    fn persist(&self, items: &[WishlistItem]) {
        let record = WishlistRecord {
            items: items.to_vec(),
        };
        let result = serde_json::to_string(&record)
            .map_err(StorageError::from)
            .and_then(|raw| self.storage.save(WISHLIST_STORAGE_KEY, &raw));

        if let Err(e) = result {
            error!(error = %e, "Failed to persist wishlist");
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<WishlistItem>> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<WishlistItem>> {
        self.items.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn dedup(items: Vec<WishlistItem>) -> Vec<WishlistItem> {
    let mut out: Vec<WishlistItem> = Vec::with_capacity(items.len());
    for item in items {
        if !out.iter().any(|i| i.id == item.id) {
            out.push(item);
        }
    }
    out
}
