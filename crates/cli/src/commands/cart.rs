//! Cart commands.

#![allow(clippy::print_stdout)]

use chillhous_core::VariantId;
use chillhous_storefront::cart::NewCartLine;
use chillhous_storefront::error::{AppError, Result};
use chillhous_storefront::shopify::SelectedOption;
use chillhous_storefront::state::AppState;

/// Print the cart.
pub fn show(state: &AppState) {
    let cart = state.cart();
    let items = cart.items();

    if items.is_empty() {
        println!("Cart is empty");
        return;
    }

    for line in &items {
        let options = line
            .details
            .selected_options
            .iter()
            .map(|o| format!("{}: {}", o.name, o.value))
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{:>3} x {:<32} {:<24} {:>12}  {}",
            line.quantity,
            line.details.product_title,
            options,
            line.unit_price.display(),
            line.variant_id
        );
    }

    let currency = items
        .first()
        .map(|l| l.unit_price.currency_code.as_str())
        .unwrap_or_default();
    println!();
    println!(
        "{} item(s), total {currency} {:.2}",
        cart.total_items(),
        cart.total_price().round_dp(2)
    );
}

/// Reconcile with the remote cart, then print it.
pub async fn sync(state: &AppState) -> Result<()> {
    state.cart().sync_cart().await?;
    show(state);
    Ok(())
}

/// Empty the local cart.
pub fn clear(state: &AppState) {
    state.cart().clear_cart();
    println!("Cart cleared");
}

/// Print the checkout URL.
pub fn checkout(state: &AppState) -> Result<()> {
    let url = state
        .cart()
        .checkout_url()
        .ok_or_else(|| AppError::BadRequest("cart is empty".to_string()))?;
    println!("{url}");
    Ok(())
}

/// Add the variant of a product matching the chosen options.
pub async fn add(
    state: &AppState,
    handle: &str,
    options: &[SelectedOption],
    quantity: u32,
) -> Result<()> {
    let product = state.storefront().get_product_by_handle(handle).await?;
    let variant = product
        .find_variant(options)
        .ok_or_else(|| AppError::NotFound(format!("No variants for product {handle}")))?;

    if !variant.available_for_sale {
        return Err(AppError::BadRequest(format!(
            "{} ({}) is sold out",
            product.title, variant.title
        )));
    }

    state
        .cart()
        .add_item(NewCartLine::from_variant(&product, variant, quantity))
        .await?;

    println!("Added {quantity} x {} ({})", product.title, variant.title);
    show(state);
    Ok(())
}

/// Set the quantity of a line.
pub async fn update(state: &AppState, variant: &str, quantity: i64) -> Result<()> {
    state
        .cart()
        .update_quantity(&VariantId::new(variant), quantity)
        .await?;
    show(state);
    Ok(())
}

/// Remove a line.
pub async fn remove(state: &AppState, variant: &str) -> Result<()> {
    state.cart().remove_item(&VariantId::new(variant)).await?;
    show(state);
    Ok(())
}
