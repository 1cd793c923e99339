//! Cart type conversion functions.

use chillhous_core::{CartLineId, VariantId};
use tracing::warn;
use url::Url;

use crate::shopify::types::{CartLineRef, CartUserError};

use super::super::queries::{CartLineNode, Connection, UserErrorNode};

/// Sales channel Shopify should attribute checkouts to.
const CHECKOUT_CHANNEL: &str = "online_store";

pub fn convert_user_error(e: UserErrorNode) -> CartUserError {
    CartUserError {
        code: e.code,
        field: e.field,
        message: e.message,
    }
}

/// Reduce cart lines to their IDs.
///
/// Lines whose merchandise is not a product variant are skipped.
pub fn convert_line_refs(lines: Connection<CartLineNode>) -> Vec<CartLineRef> {
    lines
        .edges
        .into_iter()
        .filter_map(|edge| {
            let node = edge.node;
            let Some(variant_id) = node.merchandise.and_then(|m| m.id) else {
                warn!(line_id = %node.id, "Cart line without variant merchandise");
                return None;
            };
            Some(CartLineRef {
                id: CartLineId::new(node.id),
                variant_id: VariantId::new(variant_id),
            })
        })
        .collect()
}

/// Tag a checkout URL with the online store channel.
///
/// Unparsable URLs are returned unchanged.
pub fn format_checkout_url(checkout_url: &str) -> String {
    let Ok(mut url) = Url::parse(checkout_url) else {
        return checkout_url.to_string();
    };

    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "channel")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair("channel", CHECKOUT_CHANNEL);

    url.to_string()
}
