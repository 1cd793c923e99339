//! Product type conversion functions.

use chillhous_core::{ProductId, VariantId};

use crate::shopify::types::{
    Image, Money, PriceRange, Product, ProductOption, ProductVariant, SelectedOption,
};

use super::super::queries::{ImageNode, MoneyV2, ProductNode, VariantNode};

fn convert_money(money: MoneyV2) -> Money {
    Money {
        amount: money.amount,
        currency_code: money.currency_code,
    }
}

fn convert_image(image: ImageNode) -> Image {
    Image {
        url: image.url,
        alt_text: image.alt_text,
    }
}

fn convert_variant(variant: VariantNode) -> ProductVariant {
    ProductVariant {
        id: VariantId::new(variant.id),
        title: variant.title,
        price: convert_money(variant.price),
        available_for_sale: variant.available_for_sale,
        selected_options: variant
            .selected_options
            .into_iter()
            .map(|o| SelectedOption {
                name: o.name,
                value: o.value,
            })
            .collect(),
    }
}

/// Convert a product node from any product query.
pub fn convert_product(node: ProductNode) -> Product {
    Product {
        id: ProductId::new(node.id),
        handle: node.handle,
        title: node.title,
        description: node.description,
        product_type: node.product_type.unwrap_or_default(),
        price_range: PriceRange {
            min_variant_price: convert_money(node.price_range.min_variant_price),
        },
        images: node
            .images
            .edges
            .into_iter()
            .map(|e| convert_image(e.node))
            .collect(),
        variants: node
            .variants
            .edges
            .into_iter()
            .map(|e| convert_variant(e.node))
            .collect(),
        options: node
            .options
            .into_iter()
            .map(|o| ProductOption {
                name: o.name,
                values: o.values,
            })
            .collect(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::shopify::storefront::queries::get_products;

    const PRODUCTS_RESPONSE: &str = r#"{
        "products": {
            "edges": [
                {
                    "node": {
                        "id": "gid://shopify/Product/1",
                        "title": "Lounge Hoodie",
                        "description": "Soft.",
                        "handle": "lounge-hoodie",
                        "productType": "",
                        "priceRange": { "minVariantPrice": { "amount": "59.0", "currencyCode": "EUR" } },
                        "images": { "edges": [ { "node": { "url": "https://cdn/h.jpg", "altText": null } } ] },
                        "variants": { "edges": [ {
                            "node": {
                                "id": "gid://shopify/ProductVariant/11",
                                "title": "M / Sand",
                                "price": { "amount": "59.0", "currencyCode": "EUR" },
                                "availableForSale": true,
                                "selectedOptions": [ { "name": "Size", "value": "M" }, { "name": "Color", "value": "Sand" } ]
                            }
                        } ] },
                        "options": [ { "name": "Size", "values": ["S", "M"] } ]
                    }
                }
            ]
        }
    }"#;

    #[test]
    fn test_convert_product_from_response() {
        let data: get_products::ResponseData = serde_json::from_str(PRODUCTS_RESPONSE).unwrap();
        let node = data.products.edges.into_iter().next().unwrap().node;
        let product = convert_product(node);

        assert_eq!(product.id.as_str(), "gid://shopify/Product/1");
        assert_eq!(product.handle, "lounge-hoodie");
        assert_eq!(product.product_type, "");
        assert_eq!(product.price_range.min_variant_price, Money::new("59.0", "EUR"));
        assert_eq!(product.featured_image().map(|i| i.url.as_str()), Some("https://cdn/h.jpg"));
        assert_eq!(product.variants.len(), 1);
        assert_eq!(product.variants[0].selected_options.len(), 2);
        assert_eq!(product.options[0].values, vec!["S", "M"]);
    }

    #[test]
    fn test_convert_product_null_product_type() {
        let json = PRODUCTS_RESPONSE.replace("\"productType\": \"\"", "\"productType\": null");
        let data: get_products::ResponseData = serde_json::from_str(&json).unwrap();
        let node = data.products.edges.into_iter().next().unwrap().node;
        assert_eq!(convert_product(node).product_type, "");
    }
}
