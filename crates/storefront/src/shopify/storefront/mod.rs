//! Shopify Storefront API client implementation.
//!
//! Uses `graphql_client` request/response envelopes with `reqwest` 0.13 for HTTP.
//! Caches products using `moka` (5-minute TTL). Cart operations are never cached.

mod cache;
mod conversions;

pub mod queries;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chillhous_core::{CartId, CartLineId, VariantId};
use graphql_client::{GraphQLQuery, Response};
use moka::future::Cache;
use tracing::{debug, instrument, warn};

use crate::cart::backend::{CartBackend, RemoteCartError, classify_user_errors};
use crate::config::{ShopifyStorefrontConfig, StorefrontToken};
use crate::shopify::types::{CartLineRef, CreatedCart, Product};
use crate::shopify::{GraphQLError, GraphQLErrorLocation, ShopifyError};

use cache::CacheValue;
use conversions::{convert_line_refs, convert_product, convert_user_error, format_checkout_url};
use queries::{
    AddToCart, CartLineInput, CreateCart, GetCartQuantity, GetProductByHandle, GetProducts,
    RemoveFromCart, UpdateCartLines, add_to_cart, create_cart, get_cart_quantity,
    get_product_by_handle, get_products, remove_from_cart, update_cart_lines,
};

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Provides type-safe access to products and cart operations.
/// Products are cached for 5 minutes.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    token: StorefrontToken,
    cache: Cache<String, CacheValue>,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    #[must_use]
    pub fn new(config: &ShopifyStorefrontConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(StorefrontClientInner {
                client: reqwest::Client::new(),
                endpoint: config.endpoint(),
                token: config.token.clone(),
                cache,
            }),
        }
    }

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError> {
        let request_body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header(self.inner.token.header_name(), self.inner.token.value())
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        // Store without an active plan: every call fails until billing is fixed
        if status == reqwest::StatusCode::PAYMENT_REQUIRED {
            warn!("Shopify API returned 402, store billing plan is inactive");
            return Err(ShopifyError::PaymentRequired);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::GraphQL(vec![GraphQLError::message(format!(
                "HTTP {status}: {}",
                response_text.chars().take(200).collect::<String>()
            ))]));
        }

        let response: Response<Q::ResponseData> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");

            return Err(ShopifyError::GraphQL(
                errors
                    .into_iter()
                    .map(|e| GraphQLError {
                        message: e.message,
                        locations: e.locations.map_or_else(Vec::new, |locs| {
                            locs.into_iter()
                                .map(|l| GraphQLErrorLocation {
                                    line: i64::from(l.line),
                                    column: i64::from(l.column),
                                })
                                .collect()
                        }),
                        path: e.path.map_or_else(Vec::new, |p| {
                            p.into_iter()
                                .map(|fragment| match fragment {
                                    graphql_client::PathFragment::Key(s) => {
                                        serde_json::Value::String(s)
                                    }
                                    graphql_client::PathFragment::Index(i) => {
                                        serde_json::Value::Number(i.into())
                                    }
                                })
                                .collect()
                        }),
                    })
                    .collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::GraphQL(vec![GraphQLError::message("No data in response")])
        })
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a product by its handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_product_by_handle(&self, handle: &str) -> Result<Product, ShopifyError> {
        let cache_key = format!("product:{handle}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let variables = get_product_by_handle::Variables {
            handle: handle.to_string(),
        };

        let data = self.execute::<GetProductByHandle>(variables).await?;

        let product_data = data
            .product
            .ok_or_else(|| ShopifyError::NotFound(format!("Product not found: {handle}")))?;

        let product = convert_product(product_data);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get the first `first` products, optionally narrowed by a Shopify
    /// search query (e.g. `product_type:Hoodies`).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_products(
        &self,
        first: i64,
        query: Option<String>,
    ) -> Result<Vec<Product>, ShopifyError> {
        let cache_key = format!("products:{first}");

        // Only unfiltered listings are cached
        if query.is_none()
            && let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let variables = get_products::Variables {
            first,
            query: query.clone(),
        };

        let data = self.execute::<GetProducts>(variables).await?;

        let products: Vec<Product> = data
            .products
            .edges
            .into_iter()
            .map(|e| convert_product(e.node))
            .collect();

        if query.is_none() {
            self.inner
                .cache
                .insert(cache_key, CacheValue::Products(products.clone()))
                .await;
        }

        Ok(products)
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Invalidate a cached product.
    pub async fn invalidate_product(&self, handle: &str) {
        let cache_key = format!("product:{handle}");
        self.inner.cache.invalidate(&cache_key).await;
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

// =============================================================================
// Cart Methods (not cached - mutable state)
// =============================================================================

fn line_input(variant_id: &VariantId, quantity: u32) -> CartLineInput {
    CartLineInput {
        merchandise_id: variant_id.to_string(),
        quantity: i64::from(quantity),
    }
}

fn missing_payload(operation: &str) -> RemoteCartError {
    RemoteCartError::Transport(ShopifyError::GraphQL(vec![GraphQLError::message(format!(
        "{operation} returned no payload"
    ))]))
}

#[async_trait]
impl CartBackend for StorefrontClient {
    #[instrument(skip(self), fields(variant_id = %variant_id))]
    async fn create_cart(
        &self,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<CreatedCart, RemoteCartError> {
        let variables = create_cart::Variables {
            input: create_cart::CartInput {
                lines: vec![line_input(variant_id, quantity)],
            },
        };

        let data = self.execute::<CreateCart>(variables).await?;
        let payload = data.cart_create.ok_or_else(|| missing_payload("cartCreate"))?;

        classify_user_errors(payload.user_errors.into_iter().map(convert_user_error).collect())?;

        let cart = payload.cart.ok_or_else(|| missing_payload("cartCreate"))?;
        let checkout_url = cart
            .checkout_url
            .ok_or_else(|| missing_payload("cartCreate checkoutUrl"))?;

        let lines = convert_line_refs(cart.lines);
        let line = lines
            .iter()
            .find(|l| &l.variant_id == variant_id)
            .or_else(|| lines.first())
            .ok_or_else(|| missing_payload("cartCreate lines"))?;

        Ok(CreatedCart {
            cart_id: CartId::new(cart.id),
            checkout_url: format_checkout_url(&checkout_url),
            line_id: line.id.clone(),
        })
    }

    #[instrument(skip(self), fields(cart_id = %cart_id, variant_id = %variant_id))]
    async fn add_line(
        &self,
        cart_id: &CartId,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<Vec<CartLineRef>, RemoteCartError> {
        let variables = add_to_cart::Variables {
            cart_id: cart_id.to_string(),
            lines: vec![line_input(variant_id, quantity)],
        };

        let data = self.execute::<AddToCart>(variables).await?;
        let payload = data
            .cart_lines_add
            .ok_or_else(|| missing_payload("cartLinesAdd"))?;

        classify_user_errors(payload.user_errors.into_iter().map(convert_user_error).collect())?;

        Ok(payload
            .cart
            .map(|cart| convert_line_refs(cart.lines))
            .unwrap_or_default())
    }

    #[instrument(skip(self), fields(cart_id = %cart_id, line_id = %line_id))]
    async fn update_line(
        &self,
        cart_id: &CartId,
        line_id: &CartLineId,
        quantity: u32,
    ) -> Result<(), RemoteCartError> {
        let variables = update_cart_lines::Variables {
            cart_id: cart_id.to_string(),
            lines: vec![update_cart_lines::CartLineUpdateInput {
                id: line_id.to_string(),
                quantity: i64::from(quantity),
            }],
        };

        let data = self.execute::<UpdateCartLines>(variables).await?;
        let payload = data
            .cart_lines_update
            .ok_or_else(|| missing_payload("cartLinesUpdate"))?;

        classify_user_errors(payload.user_errors.into_iter().map(convert_user_error).collect())
    }

    #[instrument(skip(self), fields(cart_id = %cart_id, line_id = %line_id))]
    async fn remove_line(
        &self,
        cart_id: &CartId,
        line_id: &CartLineId,
    ) -> Result<(), RemoteCartError> {
        let variables = remove_from_cart::Variables {
            cart_id: cart_id.to_string(),
            line_ids: vec![line_id.to_string()],
        };

        let data = self.execute::<RemoveFromCart>(variables).await?;
        let payload = data
            .cart_lines_remove
            .ok_or_else(|| missing_payload("cartLinesRemove"))?;

        classify_user_errors(payload.user_errors.into_iter().map(convert_user_error).collect())
    }

    #[instrument(skip(self), fields(cart_id = %cart_id))]
    async fn total_quantity(&self, cart_id: &CartId) -> Result<Option<u64>, RemoteCartError> {
        let variables = get_cart_quantity::Variables {
            id: cart_id.to_string(),
        };

        let data = self.execute::<GetCartQuantity>(variables).await?;

        Ok(data
            .cart
            .map(|cart| u64::try_from(cart.total_quantity).unwrap_or(0)))
    }
}
