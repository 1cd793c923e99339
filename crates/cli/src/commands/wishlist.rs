//! Wishlist commands.

#![allow(clippy::print_stdout)]

use chillhous_core::ProductId;
use chillhous_storefront::error::Result;
use chillhous_storefront::state::AppState;
use chillhous_storefront::wishlist::WishlistItem;

/// Print saved products.
pub fn show(state: &AppState) {
    let items = state.wishlist().items();
    if items.is_empty() {
        println!("Wishlist is empty");
        return;
    }

    for item in items {
        println!(
            "{:<32} {:>12}  {}  ({})",
            item.handle,
            item.price.display(),
            item.title,
            item.id
        );
    }
}

/// Remove every saved product.
pub fn clear(state: &AppState) {
    state.wishlist().clear_wishlist();
    println!("Wishlist cleared");
}

/// Save or unsave a product.
pub async fn toggle(state: &AppState, handle: &str) -> Result<()> {
    let product = state.storefront().get_product_by_handle(handle).await?;

    if state.wishlist().toggle_item(WishlistItem::from(&product)) {
        println!("Saved {}", product.title);
    } else {
        println!("Removed {}", product.title);
    }
    Ok(())
}

/// Remove a saved product by ID.
pub fn remove(state: &AppState, product_id: &str) {
    state.wishlist().remove_item(&ProductId::new(product_id));
    show(state);
}
