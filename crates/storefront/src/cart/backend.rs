//! Port to the remote cart resource.
//!
//! `CartStore` only talks to the remote cart through `CartBackend`.
//! `StorefrontClient` is the production implementation; tests script their own.

use async_trait::async_trait;
use chillhous_core::{CartId, CartLineId, VariantId};
use thiserror::Error;

use crate::shopify::{CartLineRef, CartUserError, CreatedCart, ShopifyError};

/// User error codes that mean the remote cart no longer exists.
const CART_GONE_CODES: &[&str] = &["CART_NOT_FOUND", "NOT_FOUND"];

/// Catch-all code Shopify uses for many unrelated validation failures.
const GENERIC_CODE: &str = "INVALID";

/// Message fragments (lowercase) that mean the remote cart no longer exists.
const CART_GONE_PHRASES: &[&str] = &["cart not found", "does not exist"];

/// Failure of a remote cart operation.
#[derive(Debug, Error)]
pub enum RemoteCartError {
    /// The remote cart expired, was completed, or never existed.
    #[error("Remote cart not found")]
    CartNotFound,

    /// The remote cart refused the change.
    #[error("Remote cart rejected the change: {}", format_user_errors(.0))]
    Rejected(Vec<CartUserError>),

    /// Network, HTTP or GraphQL failure.
    #[error(transparent)]
    Transport(#[from] ShopifyError),
}

/// Remote cart operations used by the cart store.
#[async_trait]
pub trait CartBackend: Send + Sync {
    /// Create a remote cart holding a single line.
    async fn create_cart(
        &self,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<CreatedCart, RemoteCartError>;

    /// Add a line, returning every line of the cart afterwards.
    async fn add_line(
        &self,
        cart_id: &CartId,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<Vec<CartLineRef>, RemoteCartError>;

    /// Set the quantity of an existing line.
    async fn update_line(
        &self,
        cart_id: &CartId,
        line_id: &CartLineId,
        quantity: u32,
    ) -> Result<(), RemoteCartError>;

    /// Remove a line.
    async fn remove_line(&self, cart_id: &CartId, line_id: &CartLineId)
    -> Result<(), RemoteCartError>;

    /// Total item count of the cart, or `None` when the cart does not exist.
    async fn total_quantity(&self, cart_id: &CartId) -> Result<Option<u64>, RemoteCartError>;
}

/// Whether a user error says the cart itself is gone.
///
/// A specific code decides on its own. Without a code, or with the generic
/// `INVALID` code, the message is matched against known phrases.
#[must_use]
pub fn is_cart_gone(error: &CartUserError) -> bool {
    match error.code.as_deref() {
        Some(code) if CART_GONE_CODES.contains(&code) => true,
        Some(code) if code != GENERIC_CODE => false,
        _ => {
            let message = error.message.to_lowercase();
            CART_GONE_PHRASES.iter().any(|p| message.contains(p))
        }
    }
}

/// Turn mutation user errors into a result.
///
/// # Errors
///
/// Returns `CartNotFound` if any error reports the cart as gone, otherwise
/// `Rejected` with all errors.
pub fn classify_user_errors(errors: Vec<CartUserError>) -> Result<(), RemoteCartError> {
    if errors.is_empty() {
        return Ok(());
    }

    if errors.iter().any(is_cart_gone) {
        return Err(RemoteCartError::CartNotFound);
    }

    Err(RemoteCartError::Rejected(errors))
}

pub(crate) fn format_user_errors(errors: &[CartUserError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user_error(code: Option<&str>, message: &str) -> CartUserError {
        CartUserError {
            code: code.map(String::from),
            field: None,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_no_errors_is_ok() {
        assert!(classify_user_errors(vec![]).is_ok());
    }

    #[test]
    fn test_structured_code_wins() {
        assert!(is_cart_gone(&user_error(Some("CART_NOT_FOUND"), "whatever")));
        assert!(is_cart_gone(&user_error(Some("NOT_FOUND"), "")));
        // A specific unrelated code is never reinterpreted from its message
        assert!(!is_cart_gone(&user_error(
            Some("MERCHANDISE_NOT_FOUND"),
            "Merchandise does not exist"
        )));
    }

    #[test]
    fn test_phrase_fallback() {
        assert!(is_cart_gone(&user_error(None, "Cart not found")));
        assert!(is_cart_gone(&user_error(
            Some("INVALID"),
            "The specified cart does not exist."
        )));
        assert!(!is_cart_gone(&user_error(Some("INVALID"), "Quantity is invalid")));
    }

    #[test]
    fn test_classify_rejected_keeps_all_errors() {
        let err = classify_user_errors(vec![
            user_error(Some("INVALID"), "Quantity is invalid"),
            user_error(None, "Variant is sold out"),
        ])
        .unwrap_err();

        match err {
            RemoteCartError::Rejected(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_gone_beats_rejection() {
        let err = classify_user_errors(vec![
            user_error(Some("INVALID"), "Quantity is invalid"),
            user_error(Some("CART_NOT_FOUND"), "Cart not found"),
        ])
        .unwrap_err();
        assert!(matches!(err, RemoteCartError::CartNotFound));
    }

    #[test]
    fn test_rejected_display() {
        let err = RemoteCartError::Rejected(vec![
            user_error(None, "Sold out"),
            user_error(None, "Limit reached"),
        ]);
        assert_eq!(
            err.to_string(),
            "Remote cart rejected the change: Sold out, Limit reached"
        );
    }
}
