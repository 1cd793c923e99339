//! Catalog browsing commands.

#![allow(clippy::print_stdout)]

use chillhous_storefront::catalog::{
    FilterState, RELATED_PRODUCTS_LIMIT, categories as category_labels, category_label,
    filter_products, related_products, search_products,
};
use chillhous_storefront::error::Result;
use chillhous_storefront::shopify::Product;
use chillhous_storefront::state::AppState;

fn print_row(product: &Product) {
    println!(
        "{:<32} {:<16} {:>12}  {}",
        product.handle,
        category_label(product),
        product.price_range.min_variant_price.display(),
        product.title
    );
}

/// List products through the filter pipeline.
pub async fn list(state: &AppState, filter: &FilterState, first: i64) -> Result<()> {
    let products = state.storefront().get_products(first, None).await?;
    let shown = filter_products(&products, filter);

    if shown.is_empty() {
        println!("No products match the current filters");
        return Ok(());
    }

    if filter.is_active() {
        println!("{} of {} products", shown.len(), products.len());
    }
    for product in shown {
        print_row(product);
    }
    Ok(())
}

/// Print the category facet list.
pub async fn categories(state: &AppState, first: i64) -> Result<()> {
    let products = state.storefront().get_products(first, None).await?;
    for label in category_labels(&products) {
        println!("{label}");
    }
    Ok(())
}

/// Search products by title or type.
pub async fn search(state: &AppState, query: &str, first: i64) -> Result<()> {
    let products = state.storefront().get_products(first, None).await?;
    let found = search_products(&products, query);

    println!("{} result(s) for {query:?}", found.len());
    for product in found {
        print_row(product);
    }
    Ok(())
}

/// Show a product with its variants and related products.
pub async fn product(state: &AppState, handle: &str, first: i64) -> Result<()> {
    let product = state.storefront().get_product_by_handle(handle).await?;
    let saved = state.wishlist().is_in_wishlist(&product.id);

    println!("{}{}", product.title, if saved { "  [saved]" } else { "" });
    println!("{}", category_label(&product));
    println!("From {}", product.price_range.min_variant_price.display());
    if let Some(image) = product.featured_image() {
        println!("{}", image.url);
    }
    if !product.description.is_empty() {
        println!();
        println!("{}", product.description);
    }

    if !product.options.is_empty() {
        println!();
        for option in &product.options {
            println!("{}: {}", option.name, option.values.join(", "));
        }
    }

    println!();
    for variant in &product.variants {
        println!(
            "{:<48} {:<24} {:>12}  {}",
            variant.id,
            variant.title,
            variant.price.display(),
            if variant.available_for_sale {
                "available"
            } else {
                "sold out"
            }
        );
    }

    let products = state.storefront().get_products(first, None).await?;
    let related = related_products(&products, &product.handle, RELATED_PRODUCTS_LIMIT);
    if !related.is_empty() {
        println!();
        println!("You may also like:");
        for product in related {
            print_row(product);
        }
    }
    Ok(())
}
