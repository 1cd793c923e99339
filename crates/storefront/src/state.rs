//! Application state shared across the presentation layer.

use std::sync::Arc;

use crate::cart::{CartBackend, CartStore};
use crate::config::StorefrontConfig;
use crate::shopify::StorefrontClient;
use crate::storage::{JsonFileStorage, KeyValueStorage};
use crate::wishlist::WishlistStore;

/// Application state, built once at startup.
///
/// This struct is cheaply cloneable via `Arc` and owns the single cart store
/// and the single wishlist store of the session.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    storefront: StorefrontClient,
    cart: CartStore,
    wishlist: WishlistStore,
}

impl AppState {
    /// Create the application state backed by Shopify and the data directory.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let storefront = StorefrontClient::new(&config.shopify);
        let storage: Arc<dyn KeyValueStorage> = Arc::new(JsonFileStorage::new(&config.data_dir));
        let backend: Arc<dyn CartBackend> = Arc::new(storefront.clone());

        Self::with_parts(config, storefront, backend, storage)
    }

    /// Create the application state from explicit parts.
    ///
    /// Lets tests swap the cart backend and the storage.
    #[must_use]
    pub fn with_parts(
        config: StorefrontConfig,
        storefront: StorefrontClient,
        backend: Arc<dyn CartBackend>,
        storage: Arc<dyn KeyValueStorage>,
    ) -> Self {
        let cart = CartStore::load(backend, storage.clone());
        let wishlist = WishlistStore::load(storage);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                storefront,
                cart,
                wishlist,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Shopify Storefront API client.
    #[must_use]
    pub fn storefront(&self) -> &StorefrontClient {
        &self.inner.storefront
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// Get a reference to the wishlist store.
    #[must_use]
    pub fn wishlist(&self) -> &WishlistStore {
        &self.inner.wishlist
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::{ShopifyStorefrontConfig, StorefrontToken};
    use crate::storage::MemoryStorage;
    use crate::wishlist::WishlistItem;

    fn config() -> StorefrontConfig {
        StorefrontConfig {
            shopify: ShopifyStorefrontConfig {
                store: "chillhous.myshopify.com".to_string(),
                api_version: "2025-07".to_string(),
                token: StorefrontToken::Public("public-token".to_string()),
            },
            data_dir: PathBuf::from(".chillhous"),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[test]
    fn test_clones_share_stores() {
        let config = config();
        let storefront = StorefrontClient::new(&config.shopify);
        let backend: Arc<dyn CartBackend> = Arc::new(storefront.clone());
        let state = AppState::with_parts(config, storefront, backend, Arc::new(MemoryStorage::new()));
        let clone = state.clone();

        state.wishlist().add_item(WishlistItem {
            id: chillhous_core::ProductId::new("p1"),
            handle: "tee".to_string(),
            title: "Tee".to_string(),
            image_url: None,
            price: chillhous_core::Money::new("10.0", "USD"),
        });

        assert_eq!(clone.wishlist().items().len(), 1);
        assert!(clone.cart().items().is_empty());
        assert_eq!(
            clone.config().shopify.endpoint(),
            "https://chillhous.myshopify.com/api/2025-07/graphql.json"
        );
    }
}
