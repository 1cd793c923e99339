//! GraphQL operation definitions for the Shopify Storefront API.
//!
//! Each operation implements `graphql_client::GraphQLQuery` by hand: the
//! document lives next to its variables and response types, laid out the
//! same way the derive macro would generate them (`module::Variables`,
//! `module::ResponseData`).

use graphql_client::{GraphQLQuery, QueryBody};
use serde::{Deserialize, Serialize};

// =============================================================================
// Shared wire types
// =============================================================================

/// Relay-style connection (`{ edges { node } }`).
#[derive(Debug, Clone, Deserialize)]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyV2 {
    pub amount: String,
    pub currency_code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRangeNode {
    pub min_variant_price: MoneyV2,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageNode {
    pub url: String,
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectedOptionNode {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantNode {
    pub id: String,
    pub title: String,
    pub price: MoneyV2,
    pub available_for_sale: bool,
    #[serde(default)]
    pub selected_options: Vec<SelectedOptionNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptionNode {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductNode {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub handle: String,
    #[serde(default)]
    pub product_type: Option<String>,
    pub price_range: PriceRangeNode,
    pub images: Connection<ImageNode>,
    pub variants: Connection<VariantNode>,
    #[serde(default)]
    pub options: Vec<OptionNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserErrorNode {
    pub code: Option<String>,
    pub field: Option<Vec<String>>,
    pub message: String,
}

/// Merchandise on a cart line; only `ProductVariant` exists today.
#[derive(Debug, Clone, Deserialize)]
pub struct MerchandiseNode {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartLineNode {
    pub id: String,
    pub merchandise: Option<MerchandiseNode>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    pub merchandise_id: String,
    pub quantity: i64,
}

// =============================================================================
// Product queries
// =============================================================================

pub struct GetProducts;

pub mod get_products {
    use super::{Connection, Deserialize, ProductNode, Serialize};

    pub const OPERATION_NAME: &str = "GetProducts";
    pub const QUERY: &str = r"
query GetProducts($first: Int!, $query: String) {
  products(first: $first, query: $query) {
    edges {
      node {
        id
        title
        description
        handle
        productType
        priceRange { minVariantPrice { amount currencyCode } }
        images(first: 5) { edges { node { url altText } } }
        variants(first: 10) {
          edges {
            node {
              id
              title
              price { amount currencyCode }
              availableForSale
              selectedOptions { name value }
            }
          }
        }
        options { name values }
      }
    }
  }
}
";

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub first: i64,
        pub query: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub products: Connection<ProductNode>,
    }
}

impl GraphQLQuery for GetProducts {
    type Variables = get_products::Variables;
    type ResponseData = get_products::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: get_products::QUERY,
            operation_name: get_products::OPERATION_NAME,
        }
    }
}

pub struct GetProductByHandle;

pub mod get_product_by_handle {
    use super::{Deserialize, ProductNode, Serialize};

    pub const OPERATION_NAME: &str = "GetProductByHandle";
    pub const QUERY: &str = r"
query GetProductByHandle($handle: String!) {
  product(handle: $handle) {
    id
    title
    description
    handle
    productType
    priceRange { minVariantPrice { amount currencyCode } }
    images(first: 10) { edges { node { url altText } } }
    variants(first: 20) {
      edges {
        node {
          id
          title
          price { amount currencyCode }
          availableForSale
          selectedOptions { name value }
        }
      }
    }
    options { name values }
  }
}
";

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub handle: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub product: Option<ProductNode>,
    }
}

impl GraphQLQuery for GetProductByHandle {
    type Variables = get_product_by_handle::Variables;
    type ResponseData = get_product_by_handle::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: get_product_by_handle::QUERY,
            operation_name: get_product_by_handle::OPERATION_NAME,
        }
    }
}

// =============================================================================
// Cart mutations and queries
// =============================================================================

pub struct CreateCart;

pub mod create_cart {
    use super::{CartLineInput, CartLineNode, Connection, Deserialize, Serialize, UserErrorNode};

    pub const OPERATION_NAME: &str = "CreateCart";
    pub const QUERY: &str = r"
mutation CreateCart($input: CartInput!) {
  cartCreate(input: $input) {
    cart {
      id
      checkoutUrl
      lines(first: 100) { edges { node { id merchandise { ... on ProductVariant { id } } } } }
    }
    userErrors { code field message }
  }
}
";

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub input: CartInput,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct CartInput {
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_create: Option<CartCreatePayload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartCreatePayload {
        pub cart: Option<CreatedCartNode>,
        #[serde(default)]
        pub user_errors: Vec<UserErrorNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CreatedCartNode {
        pub id: String,
        pub checkout_url: Option<String>,
        pub lines: Connection<CartLineNode>,
    }
}

impl GraphQLQuery for CreateCart {
    type Variables = create_cart::Variables;
    type ResponseData = create_cart::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: create_cart::QUERY,
            operation_name: create_cart::OPERATION_NAME,
        }
    }
}

pub struct AddToCart;

pub mod add_to_cart {
    use super::{CartLineInput, CartLineNode, Connection, Deserialize, Serialize, UserErrorNode};

    pub const OPERATION_NAME: &str = "AddToCart";
    pub const QUERY: &str = r"
mutation AddToCart($cartId: ID!, $lines: [CartLineInput!]!) {
  cartLinesAdd(cartId: $cartId, lines: $lines) {
    cart {
      id
      lines(first: 100) { edges { node { id merchandise { ... on ProductVariant { id } } } } }
    }
    userErrors { code field message }
  }
}
";

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_add: Option<CartLinesAddPayload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartLinesAddPayload {
        pub cart: Option<CartWithLines>,
        #[serde(default)]
        pub user_errors: Vec<UserErrorNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct CartWithLines {
        pub id: String,
        pub lines: Connection<CartLineNode>,
    }
}

impl GraphQLQuery for AddToCart {
    type Variables = add_to_cart::Variables;
    type ResponseData = add_to_cart::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: add_to_cart::QUERY,
            operation_name: add_to_cart::OPERATION_NAME,
        }
    }
}

pub struct UpdateCartLines;

pub mod update_cart_lines {
    use super::{Deserialize, Serialize, UserErrorNode};

    pub const OPERATION_NAME: &str = "UpdateCartLines";
    pub const QUERY: &str = r"
mutation UpdateCartLines($cartId: ID!, $lines: [CartLineUpdateInput!]!) {
  cartLinesUpdate(cartId: $cartId, lines: $lines) {
    cart { id }
    userErrors { code field message }
  }
}
";

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineUpdateInput>,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct CartLineUpdateInput {
        pub id: String,
        pub quantity: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_update: Option<CartLinesUpdatePayload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartLinesUpdatePayload {
        #[serde(default)]
        pub user_errors: Vec<UserErrorNode>,
    }
}

impl GraphQLQuery for UpdateCartLines {
    type Variables = update_cart_lines::Variables;
    type ResponseData = update_cart_lines::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: update_cart_lines::QUERY,
            operation_name: update_cart_lines::OPERATION_NAME,
        }
    }
}

pub struct RemoveFromCart;

pub mod remove_from_cart {
    use super::{Deserialize, Serialize, UserErrorNode};

    pub const OPERATION_NAME: &str = "RemoveFromCart";
    pub const QUERY: &str = r"
mutation RemoveFromCart($cartId: ID!, $lineIds: [ID!]!) {
  cartLinesRemove(cartId: $cartId, lineIds: $lineIds) {
    cart { id }
    userErrors { code field message }
  }
}
";

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub line_ids: Vec<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_remove: Option<CartLinesRemovePayload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartLinesRemovePayload {
        #[serde(default)]
        pub user_errors: Vec<UserErrorNode>,
    }
}

impl GraphQLQuery for RemoveFromCart {
    type Variables = remove_from_cart::Variables;
    type ResponseData = remove_from_cart::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: remove_from_cart::QUERY,
            operation_name: remove_from_cart::OPERATION_NAME,
        }
    }
}

pub struct GetCartQuantity;

pub mod get_cart_quantity {
    use super::{Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "GetCartQuantity";
    pub const QUERY: &str = r"
query GetCartQuantity($id: ID!) {
  cart(id: $id) { id totalQuantity }
}
";

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub cart: Option<CartQuantityNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartQuantityNode {
        pub id: String,
        pub total_quantity: i64,
    }
}

impl GraphQLQuery for GetCartQuantity {
    type Variables = get_cart_quantity::Variables;
    type ResponseData = get_cart_quantity::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: get_cart_quantity::QUERY,
            operation_name: get_cart_quantity::OPERATION_NAME,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_build_query_serializes_camel_case_variables() {
        let body = AddToCart::build_query(add_to_cart::Variables {
            cart_id: "gid://shopify/Cart/c1".to_string(),
            lines: vec![CartLineInput {
                merchandise_id: "gid://shopify/ProductVariant/v1".to_string(),
                quantity: 2,
            }],
        });

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["operationName"], "AddToCart");
        assert_eq!(json["variables"]["cartId"], "gid://shopify/Cart/c1");
        assert_eq!(
            json["variables"]["lines"][0]["merchandiseId"],
            "gid://shopify/ProductVariant/v1"
        );
        assert_eq!(json["variables"]["lines"][0]["quantity"], 2);
    }

    #[test]
    fn test_operation_names_match_documents() {
        for (name, query) in [
            (get_products::OPERATION_NAME, get_products::QUERY),
            (get_product_by_handle::OPERATION_NAME, get_product_by_handle::QUERY),
            (create_cart::OPERATION_NAME, create_cart::QUERY),
            (add_to_cart::OPERATION_NAME, add_to_cart::QUERY),
            (update_cart_lines::OPERATION_NAME, update_cart_lines::QUERY),
            (remove_from_cart::OPERATION_NAME, remove_from_cart::QUERY),
            (get_cart_quantity::OPERATION_NAME, get_cart_quantity::QUERY),
        ] {
            assert!(query.contains(&format!(" {name}(")), "{name} not in document");
        }
    }
}
