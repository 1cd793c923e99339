//! Integration tests for the Chillhous storefront core.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p chillhous-integration-tests
//! ```
//!
//! No network access is needed: `MockCartBackend` simulates the Shopify cart
//! in memory, including expiry, rejections and transport failures.
//!
//! # Test Categories
//!
//! - `cart_sync` - Cart store against the simulated remote cart
//! - `catalog_pipeline` - Filter, sort and facet behavior

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chillhous_core::{CartId, CartLineId, Money, ProductId, VariantId};
use chillhous_storefront::cart::{
    CartBackend, CartLineDetails, CartStore, NewCartLine, RemoteCartError, classify_user_errors,
};
use chillhous_storefront::shopify::{
    CartLineRef, CartUserError, CreatedCart, GraphQLError, PriceRange, Product, ShopifyError,
};
use chillhous_storefront::storage::{KeyValueStorage, MemoryStorage};

/// Failure to inject into the next remote call.
#[derive(Debug, Clone)]
pub enum Failure {
    /// Validation error from the cart (`userErrors`).
    Rejected(String),
    /// Cart reported as gone through its message only.
    CartGone,
    /// Network or HTTP failure.
    Transport,
}

#[derive(Debug, Clone)]
struct RemoteLine {
    id: CartLineId,
    variant_id: VariantId,
    quantity: u32,
}

#[derive(Default)]
struct Remote {
    carts: HashMap<CartId, Vec<RemoteLine>>,
    next_cart: u32,
    next_line: u32,
    failures: VecDeque<Failure>,
    calls: Vec<String>,
    omit_added_lines: bool,
}

/// In-memory stand-in for the Shopify cart API.
///
/// Cart IDs are `c1`, `c2`, ... and line IDs `l1`, `l2`, ... in creation
/// order. Line lists come back newest first.
#[derive(Default)]
pub struct MockCartBackend {
    remote: Mutex<Remote>,
    hold: tokio::sync::Mutex<()>,
}

impl MockCartBackend {
    /// Create an empty remote.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn remote(&self) -> std::sync::MutexGuard<'_, Remote> {
        self.remote.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail the next remote call.
    pub fn fail_next(&self, failure: Failure) {
        self.remote().failures.push_back(failure);
    }

    /// Drop a cart, as Shopify does on expiry or completed checkout.
    pub fn expire_cart(&self, cart_id: &CartId) {
        self.remote().carts.remove(cart_id);
    }

    /// Leave new lines out of `add_line` responses.
    pub fn omit_added_lines(&self) {
        self.remote().omit_added_lines = true;
    }

    /// Calls made so far, e.g. `create v1 1` or `update l1 3`.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.remote().calls.clone()
    }

    /// Remote quantity of a variant.
    #[must_use]
    pub fn remote_quantity(&self, cart_id: &CartId, variant_id: &VariantId) -> Option<u32> {
        self.remote()
            .carts
            .get(cart_id)?
            .iter()
            .find(|l| &l.variant_id == variant_id)
            .map(|l| l.quantity)
    }

    /// Block every remote call until the returned guard is dropped.
    pub async fn hold(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.hold.lock().await
    }

    async fn enter(&self, call: String) -> Result<(), RemoteCartError> {
        drop(self.hold.lock().await);
        tokio::task::yield_now().await;

        let mut remote = self.remote();
        remote.calls.push(call);
        match remote.failures.pop_front() {
            None => Ok(()),
            Some(Failure::Rejected(message)) => Err(RemoteCartError::Rejected(vec![user_error(
                Some("INVALID"),
                &message,
            )])),
            Some(Failure::CartGone) => classify_user_errors(vec![user_error(
                None,
                "The specified cart does not exist.",
            )]),
            Some(Failure::Transport) => Err(RemoteCartError::Transport(ShopifyError::GraphQL(
                vec![GraphQLError::message("HTTP 502 Bad Gateway")],
            ))),
        }
    }
}

fn user_error(code: Option<&str>, message: &str) -> CartUserError {
    CartUserError {
        code: code.map(String::from),
        field: None,
        message: message.to_string(),
    }
}

fn missing_cart() -> RemoteCartError {
    classify_user_errors(vec![user_error(
        Some("INVALID"),
        "The specified cart does not exist.",
    )])
    .err()
    .unwrap_or(RemoteCartError::CartNotFound)
}

fn line_refs(lines: &[RemoteLine]) -> Vec<CartLineRef> {
    lines
        .iter()
        .rev()
        .map(|l| CartLineRef {
            id: l.id.clone(),
            variant_id: l.variant_id.clone(),
        })
        .collect()
}

impl Remote {
    fn new_line(&mut self, variant_id: &VariantId, quantity: u32) -> RemoteLine {
        self.next_line += 1;
        RemoteLine {
            id: CartLineId::new(format!("l{}", self.next_line)),
            variant_id: variant_id.clone(),
            quantity,
        }
    }
}

#[async_trait]
impl CartBackend for MockCartBackend {
    async fn create_cart(
        &self,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<CreatedCart, RemoteCartError> {
        self.enter(format!("create {variant_id} {quantity}")).await?;

        let mut remote = self.remote();
        remote.next_cart += 1;
        let cart_id = CartId::new(format!("c{}", remote.next_cart));
        let line = remote.new_line(variant_id, quantity);
        let line_id = line.id.clone();
        remote.carts.insert(cart_id.clone(), vec![line]);

        Ok(CreatedCart {
            checkout_url: format!("https://x/cart/{cart_id}?channel=online_store"),
            cart_id,
            line_id,
        })
    }

    async fn add_line(
        &self,
        cart_id: &CartId,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<Vec<CartLineRef>, RemoteCartError> {
        self.enter(format!("add {variant_id} {quantity}")).await?;

        let mut guard = self.remote();
        let remote = &mut *guard;
        let lines = remote.carts.get_mut(cart_id).ok_or_else(missing_cart)?;

        if let Some(existing) = lines.iter_mut().find(|l| &l.variant_id == variant_id) {
            existing.quantity += quantity;
        } else if !remote.omit_added_lines {
            remote.next_line += 1;
            lines.push(RemoteLine {
                id: CartLineId::new(format!("l{}", remote.next_line)),
                variant_id: variant_id.clone(),
                quantity,
            });
        }
        Ok(line_refs(lines))
    }

    async fn update_line(
        &self,
        cart_id: &CartId,
        line_id: &CartLineId,
        quantity: u32,
    ) -> Result<(), RemoteCartError> {
        self.enter(format!("update {line_id} {quantity}")).await?;

        let mut remote = self.remote();
        let lines = remote.carts.get_mut(cart_id).ok_or_else(missing_cart)?;
        let line = lines
            .iter_mut()
            .find(|l| &l.id == line_id)
            .ok_or_else(|| RemoteCartError::Rejected(vec![user_error(Some("INVALID"), "Line not found")]))?;
        line.quantity = quantity;
        Ok(())
    }

    async fn remove_line(
        &self,
        cart_id: &CartId,
        line_id: &CartLineId,
    ) -> Result<(), RemoteCartError> {
        self.enter(format!("remove {line_id}")).await?;

        let mut remote = self.remote();
        let lines = remote.carts.get_mut(cart_id).ok_or_else(missing_cart)?;
        lines.retain(|l| &l.id != line_id);
        Ok(())
    }

    async fn total_quantity(&self, cart_id: &CartId) -> Result<Option<u64>, RemoteCartError> {
        self.enter("total".to_string()).await?;

        Ok(self
            .remote()
            .carts
            .get(cart_id)
            .map(|lines| lines.iter().map(|l| u64::from(l.quantity)).sum()))
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// A cart store over `backend` with in-memory storage.
#[must_use]
pub fn cart_store(backend: &Arc<MockCartBackend>) -> CartStore {
    cart_store_with(backend, Arc::new(MemoryStorage::new()))
}

/// A cart store over `backend` and `storage`.
#[must_use]
pub fn cart_store_with(
    backend: &Arc<MockCartBackend>,
    storage: Arc<dyn KeyValueStorage>,
) -> CartStore {
    let backend: Arc<dyn CartBackend> = backend.clone();
    CartStore::load(backend, storage)
}

/// A line to add for `variant` at 12.50 USD.
#[must_use]
pub fn new_line(variant: &str, quantity: u32) -> NewCartLine {
    NewCartLine {
        variant_id: VariantId::new(variant),
        unit_price: Money::new("12.50", "USD"),
        quantity,
        details: CartLineDetails {
            product_id: ProductId::new(format!("gid://shopify/Product/{variant}")),
            handle: format!("product-{variant}"),
            product_title: format!("Product {variant}"),
            variant_title: "Default Title".to_string(),
            image_url: None,
            selected_options: vec![],
        },
    }
}

/// A catalog product with a single price.
#[must_use]
pub fn product(handle: &str, title: &str, product_type: &str, price: &str) -> Product {
    Product {
        id: ProductId::new(format!("gid://shopify/Product/{handle}")),
        handle: handle.to_string(),
        title: title.to_string(),
        description: String::new(),
        product_type: product_type.to_string(),
        price_range: PriceRange {
            min_variant_price: Money::new(price, "USD"),
        },
        images: vec![],
        variants: vec![],
        options: vec![],
    }
}
