//! Integration tests for the cart store against a simulated Shopify cart.
//!
//! These tests verify reconciliation, failure handling and persistence
//! without network access.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chillhous_core::{CartId, CartLineId, VariantId};
use chillhous_integration_tests::{Failure, MockCartBackend, cart_store, cart_store_with, new_line};
use chillhous_storefront::cart::{CartError, CartState};
use chillhous_storefront::storage::{CART_STORAGE_KEY, JsonFileStorage, KeyValueStorage};
use rust_decimal::Decimal;

fn variant(id: &str) -> VariantId {
    VariantId::new(id)
}

// =============================================================================
// Add
// =============================================================================

#[tokio::test]
async fn test_first_add_creates_remote_cart() {
    let backend = MockCartBackend::new();
    let cart = cart_store(&backend);

    cart.add_item(new_line("v1", 1)).await.unwrap();

    let state = cart.snapshot();
    assert_eq!(state.remote_cart_id, Some(CartId::new("c1")));
    assert_eq!(state.lines.len(), 1);
    assert_eq!(state.lines[0].variant_id, variant("v1"));
    assert_eq!(state.lines[0].quantity, 1);
    assert_eq!(state.lines[0].remote_line_id, Some(CartLineId::new("l1")));
    assert!(cart.checkout_url().unwrap().contains("channel=online_store"));
}

#[tokio::test]
async fn test_new_lines_matched_by_variant_not_position() {
    let backend = MockCartBackend::new();
    let cart = cart_store(&backend);

    for v in ["v1", "v2", "v3"] {
        cart.add_item(new_line(v, 1)).await.unwrap();
    }

    // The mock returns lines newest first
    let state = cart.snapshot();
    let ids: Vec<_> = state
        .lines
        .iter()
        .map(|l| (l.variant_id.as_str().to_string(), l.remote_line_id.clone().unwrap()))
        .collect();
    assert_eq!(
        ids,
        vec![
            ("v1".to_string(), CartLineId::new("l1")),
            ("v2".to_string(), CartLineId::new("l2")),
            ("v3".to_string(), CartLineId::new("l3")),
        ]
    );
}

#[tokio::test]
async fn test_adding_existing_variant_updates_quantity() {
    let backend = MockCartBackend::new();
    let cart = cart_store(&backend);

    cart.add_item(new_line("v1", 1)).await.unwrap();
    cart.add_item(new_line("v1", 2)).await.unwrap();

    assert_eq!(cart.items()[0].quantity, 3);
    assert_eq!(backend.calls(), ["create v1 1", "update l1 3"]);
    assert_eq!(backend.remote_quantity(&CartId::new("c1"), &variant("v1")), Some(3));
}

#[tokio::test]
async fn test_line_missing_from_response_is_not_appended() {
    let backend = MockCartBackend::new();
    let cart = cart_store(&backend);
    cart.add_item(new_line("v1", 1)).await.unwrap();

    backend.omit_added_lines();
    let err = cart.add_item(new_line("v2", 1)).await.unwrap_err();

    assert!(matches!(err, CartError::LineNotReturned(v) if v == variant("v2")));
    assert_eq!(cart.items().len(), 1);
    assert!(cart.items().iter().all(|l| l.remote_line_id.is_some()));
}

// =============================================================================
// Update / remove
// =============================================================================

#[tokio::test]
async fn test_update_quantity_zero_matches_remove() {
    let via_update = {
        let backend = MockCartBackend::new();
        let cart = cart_store(&backend);
        cart.add_item(new_line("v1", 1)).await.unwrap();
        cart.add_item(new_line("v2", 2)).await.unwrap();
        cart.update_quantity(&variant("v1"), 0).await.unwrap();
        cart.snapshot()
    };

    let via_remove = {
        let backend = MockCartBackend::new();
        let cart = cart_store(&backend);
        cart.add_item(new_line("v1", 1)).await.unwrap();
        cart.add_item(new_line("v2", 2)).await.unwrap();
        cart.remove_item(&variant("v1")).await.unwrap();
        cart.snapshot()
    };

    assert_eq!(via_update, via_remove);
    assert_eq!(via_update.lines.len(), 1);
}

#[tokio::test]
async fn test_negative_quantity_removes() {
    let backend = MockCartBackend::new();
    let cart = cart_store(&backend);
    cart.add_item(new_line("v1", 1)).await.unwrap();

    cart.update_quantity(&variant("v1"), -3).await.unwrap();

    assert_eq!(cart.snapshot(), CartState::default());
    assert_eq!(backend.calls(), ["create v1 1", "remove l1"]);
}

#[tokio::test]
async fn test_removing_last_line_clears_cart() {
    let backend = MockCartBackend::new();
    let cart = cart_store(&backend);
    cart.add_item(new_line("v1", 1)).await.unwrap();
    cart.add_item(new_line("v2", 1)).await.unwrap();

    cart.remove_item(&variant("v1")).await.unwrap();
    assert!(cart.remote_cart_id().is_some());

    cart.remove_item(&variant("v2")).await.unwrap();
    let state = cart.snapshot();
    assert!(state.lines.is_empty());
    assert_eq!(state.remote_cart_id, None);
    assert_eq!(state.checkout_url, None);
}

#[tokio::test]
async fn test_unknown_variant_is_noop() {
    let backend = MockCartBackend::new();
    let cart = cart_store(&backend);
    cart.add_item(new_line("v1", 1)).await.unwrap();

    cart.update_quantity(&variant("nope"), 4).await.unwrap();
    cart.remove_item(&variant("nope")).await.unwrap();

    assert_eq!(backend.calls(), ["create v1 1"]);
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_cart_not_found_on_update_clears_everything() {
    let backend = MockCartBackend::new();
    let cart = cart_store(&backend);
    for v in ["v1", "v2", "v3"] {
        cart.add_item(new_line(v, 1)).await.unwrap();
    }

    backend.expire_cart(&CartId::new("c1"));
    let err = cart.update_quantity(&variant("v2"), 5).await.unwrap_err();

    assert!(matches!(err, CartError::CartExpired));
    let state = cart.snapshot();
    assert!(state.lines.is_empty());
    assert_eq!(state.remote_cart_id, None);
    assert_eq!(state.checkout_url, None);
}

#[tokio::test]
async fn test_cart_not_found_on_add_clears_everything() {
    let backend = MockCartBackend::new();
    let cart = cart_store(&backend);
    cart.add_item(new_line("v1", 1)).await.unwrap();

    backend.fail_next(Failure::CartGone);
    let err = cart.add_item(new_line("v2", 1)).await.unwrap_err();

    assert!(matches!(err, CartError::CartExpired));
    assert_eq!(cart.snapshot(), CartState::default());

    // The next add starts a fresh remote cart
    cart.add_item(new_line("v2", 1)).await.unwrap();
    assert_eq!(cart.remote_cart_id(), Some(CartId::new("c2")));
}

#[tokio::test]
async fn test_rejection_leaves_state_unchanged() {
    let backend = MockCartBackend::new();
    let cart = cart_store(&backend);
    cart.add_item(new_line("v1", 1)).await.unwrap();
    let before = cart.snapshot();

    backend.fail_next(Failure::Rejected("Only 2 items left in stock".to_string()));
    let err = cart.update_quantity(&variant("v1"), 10).await.unwrap_err();

    match err {
        CartError::Rejected(errors) => {
            assert_eq!(errors[0].message, "Only 2 items left in stock");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
    assert_eq!(cart.snapshot(), before);
}

#[tokio::test]
async fn test_transport_failure_is_not_retried() {
    let backend = MockCartBackend::new();
    let cart = cart_store(&backend);

    backend.fail_next(Failure::Transport);
    let err = cart.add_item(new_line("v1", 1)).await.unwrap_err();

    assert!(matches!(err, CartError::Remote(_)));
    assert_eq!(cart.snapshot(), CartState::default());
    assert_eq!(backend.calls().len(), 1);
    assert!(!cart.is_loading());
}

// =============================================================================
// Sync
// =============================================================================

#[tokio::test]
async fn test_sync_keeps_live_cart_and_is_idempotent() {
    let backend = MockCartBackend::new();
    let cart = cart_store(&backend);
    cart.add_item(new_line("v1", 2)).await.unwrap();
    let before = cart.snapshot();

    cart.sync_cart().await.unwrap();
    let once = cart.snapshot();
    cart.sync_cart().await.unwrap();

    assert_eq!(once, before);
    assert_eq!(cart.snapshot(), once);
}

#[tokio::test]
async fn test_sync_clears_after_checkout_completed() {
    let backend = MockCartBackend::new();
    let cart = cart_store(&backend);
    cart.add_item(new_line("v1", 1)).await.unwrap();

    backend.expire_cart(&CartId::new("c1"));
    cart.sync_cart().await.unwrap();
    let once = cart.snapshot();
    cart.sync_cart().await.unwrap();

    assert_eq!(once, CartState::default());
    assert_eq!(cart.snapshot(), once);
    // The second sync had no cart to check
    assert_eq!(backend.calls(), ["create v1 1", "total"]);
}

#[tokio::test]
async fn test_sync_is_not_reentrant() {
    let backend = MockCartBackend::new();
    let cart = Arc::new(cart_store(&backend));
    cart.add_item(new_line("v1", 1)).await.unwrap();

    let held = backend.hold().await;
    let first = tokio::spawn({
        let cart = cart.clone();
        async move { cart.sync_cart().await }
    });
    while !cart.is_syncing() {
        tokio::task::yield_now().await;
    }

    // Second sync returns at once without a remote call
    cart.sync_cart().await.unwrap();
    drop(held);
    first.await.unwrap().unwrap();

    assert!(!cart.is_syncing());
    assert_eq!(backend.calls(), ["create v1 1", "total"]);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn test_concurrent_adds_are_serialized() {
    let backend = MockCartBackend::new();
    let cart = cart_store(&backend);

    let (a, b) = tokio::join!(
        cart.add_item(new_line("v1", 1)),
        cart.add_item(new_line("v1", 1))
    );
    a.unwrap();
    b.unwrap();

    // One cart, one line, the second add saw the first
    assert_eq!(backend.calls(), ["create v1 1", "update l1 2"]);
    assert_eq!(cart.items().len(), 1);
    assert_eq!(cart.items()[0].quantity, 2);
}

#[tokio::test]
async fn test_is_loading_spans_the_call() {
    let backend = MockCartBackend::new();
    let cart = Arc::new(cart_store(&backend));
    assert!(!cart.is_loading());

    let held = backend.hold().await;
    backend.fail_next(Failure::Transport);
    let task = tokio::spawn({
        let cart = cart.clone();
        async move { cart.add_item(new_line("v1", 1)).await }
    });
    while !cart.is_loading() {
        tokio::task::yield_now().await;
    }

    // Readers are not blocked by the in-flight call
    assert!(cart.items().is_empty());

    drop(held);
    assert!(task.await.unwrap().is_err());
    assert!(!cart.is_loading());
}

#[tokio::test]
async fn test_total_items_tracks_quantities() {
    let backend = MockCartBackend::new();
    let cart = cart_store(&backend);

    cart.add_item(new_line("v1", 2)).await.unwrap();
    cart.add_item(new_line("v2", 1)).await.unwrap();
    cart.update_quantity(&variant("v2"), 4).await.unwrap();
    cart.add_item(new_line("v1", 1)).await.unwrap();
    cart.remove_item(&variant("v1")).await.unwrap();
    cart.add_item(new_line("v3", 5)).await.unwrap();

    let sum: u64 = cart.items().iter().map(|l| u64::from(l.quantity)).sum();
    assert_eq!(cart.total_items(), sum);
    assert_eq!(cart.total_items(), 9);
    assert_eq!(cart.total_price(), Decimal::new(11250, 2));
}

// =============================================================================
// Persistence
// =============================================================================

#[tokio::test]
async fn test_cart_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let storage: Arc<dyn KeyValueStorage> = Arc::new(JsonFileStorage::new(dir.path()));
    let backend = MockCartBackend::new();

    let cart = cart_store_with(&backend, storage.clone());
    cart.add_item(new_line("v1", 2)).await.unwrap();
    cart.add_item(new_line("v2", 1)).await.unwrap();
    let before = cart.snapshot();
    drop(cart);

    let restored = cart_store_with(&backend, storage);
    assert_eq!(restored.snapshot(), before);

    restored.update_quantity(&variant("v2"), 3).await.unwrap();
    assert_eq!(restored.total_items(), 5);
}

#[tokio::test]
async fn test_inconsistent_record_is_sanitized_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let storage: Arc<dyn KeyValueStorage> = Arc::new(JsonFileStorage::new(dir.path()));
    let line = |variant: &str, remote: Option<&str>| {
        serde_json::json!({
            "remoteLineId": remote,
            "variantId": variant,
            "unitPrice": { "amount": "12.50", "currency_code": "USD" },
            "quantity": 1,
            "details": {
                "productId": "p1",
                "handle": "tee",
                "productTitle": "Tee",
                "variantTitle": "M",
                "imageUrl": null,
                "selectedOptions": []
            }
        })
    };
    let record = serde_json::json!({
        "lines": [line("v1", Some("l1")), line("v2", None)],
        "remoteCartId": "c9",
        "checkoutUrl": "https://x"
    });
    storage
        .save(CART_STORAGE_KEY, &record.to_string())
        .unwrap();

    let cart = cart_store_with(&MockCartBackend::new(), storage);

    let items = cart.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].variant_id, variant("v1"));
    assert_eq!(cart.remote_cart_id(), Some(CartId::new("c9")));
}

#[tokio::test]
async fn test_unreadable_record_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let storage: Arc<dyn KeyValueStorage> = Arc::new(JsonFileStorage::new(dir.path()));
    storage.save(CART_STORAGE_KEY, "{ not json").unwrap();

    let cart = cart_store_with(&MockCartBackend::new(), storage);
    assert_eq!(cart.snapshot(), CartState::default());
}
