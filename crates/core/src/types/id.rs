//! Newtype IDs for type-safe Shopify references.
//!
//! Shopify identifies every resource with an opaque global ID string
//! (e.g. `gid://shopify/ProductVariant/123`). Use the `define_id!` macro to
//! create wrappers that prevent accidentally mixing IDs from different
//! resource types.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Into<String>` implementations
///
/// # Example
///
/// ```rust
/// # use chillhous_core::define_id;
/// define_id!(OrderId);
/// define_id!(CustomerId);
///
/// let order_id = OrderId::new("gid://shopify/Order/1");
/// let customer_id = CustomerId::new("gid://shopify/Customer/1");
///
/// // These are different types, so this won't compile:
/// // let _: OrderId = customer_id;
/// assert_eq!(order_id.as_str(), "gid://shopify/Order/1");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a Shopify global ID string.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying ID string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the ID string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(ProductId);
define_id!(VariantId);
define_id!(CartId);
define_id!(CartLineId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_is_raw_gid() {
        let id = VariantId::new("gid://shopify/ProductVariant/42");
        assert_eq!(id.to_string(), "gid://shopify/ProductVariant/42");
    }

    #[test]
    fn test_id_serializes_transparently() {
        let id = CartId::new("gid://shopify/Cart/abc");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"gid://shopify/Cart/abc\"");

        let back: CartId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_id_conversions() {
        let id: CartLineId = "gid://shopify/CartLine/1".into();
        let raw: String = id.clone().into();
        assert_eq!(raw, id.as_str());
        assert_eq!(id.into_inner(), "gid://shopify/CartLine/1");
    }
}
