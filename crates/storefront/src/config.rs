//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPIFY_STORE` - Shopify store domain (e.g., your-store.myshopify.com)
//! - `SHOPIFY_STOREFRONT_PUBLIC_TOKEN` or `SHOPIFY_STOREFRONT_PRIVATE_TOKEN` -
//!   Storefront API access token (the private token wins when both are set)
//!
//! ## Optional
//! - `SHOPIFY_API_VERSION` - API version (default: 2025-07)
//! - `CHILLHOUS_DATA_DIR` - Directory for persisted cart and wishlist (default: .chillhous)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const DEFAULT_API_VERSION: &str = "2025-07";
const DEFAULT_DATA_DIR: &str = ".chillhous";
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Shopify Storefront API configuration
    pub shopify: ShopifyStorefrontConfig,
    /// Directory holding the persisted cart and wishlist records
    pub data_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g., production)
    pub sentry_environment: Option<String>,
}

/// How requests to the Storefront API are authenticated.
#[derive(Clone)]
pub enum StorefrontToken {
    /// Public access token (the one browsers use).
    Public(String),
    /// Private access token (server-side only).
    Private(SecretString),
}

impl StorefrontToken {
    /// Header name Shopify expects for this kind of token.
    #[must_use]
    pub const fn header_name(&self) -> &'static str {
        match self {
            Self::Public(_) => "X-Shopify-Storefront-Access-Token",
            Self::Private(_) => "Shopify-Storefront-Private-Token",
        }
    }

    /// Raw token value for the request header.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Public(token) => token,
            Self::Private(token) => token.expose_secret(),
        }
    }
}

impl std::fmt::Debug for StorefrontToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public(token) => f.debug_tuple("Public").field(token).finish(),
            Self::Private(_) => f.debug_tuple("Private").field(&"[REDACTED]").finish(),
        }
    }
}

/// Shopify Storefront API configuration.
#[derive(Debug, Clone)]
pub struct ShopifyStorefrontConfig {
    /// Shopify store domain (e.g., your-store.myshopify.com)
    pub store: String,
    /// Shopify API version (e.g., 2025-07)
    pub api_version: String,
    /// Access token used for every request
    pub token: StorefrontToken,
}

impl ShopifyStorefrontConfig {
    /// GraphQL endpoint for this store and API version.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!(
            "https://{}/api/{}/graphql.json",
            self.store, self.api_version
        )
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the private token fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let shopify = ShopifyStorefrontConfig::from_env()?;
        let data_dir = PathBuf::from(get_env_or_default("CHILLHOUS_DATA_DIR", DEFAULT_DATA_DIR));
        if data_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "CHILLHOUS_DATA_DIR".to_string(),
                "must not be empty".to_string(),
            ));
        }

        Ok(Self {
            shopify,
            data_dir,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

impl ShopifyStorefrontConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let store = get_required_env("SHOPIFY_STORE")?;
        validate_store_domain(&store)?;

        let token = if let Some(private) = get_optional_env("SHOPIFY_STOREFRONT_PRIVATE_TOKEN") {
            validate_secret_strength(&private, "SHOPIFY_STOREFRONT_PRIVATE_TOKEN")?;
            StorefrontToken::Private(SecretString::from(private))
        } else {
            StorefrontToken::Public(get_required_env("SHOPIFY_STOREFRONT_PUBLIC_TOKEN")?)
        };

        Ok(Self {
            store,
            api_version: get_env_or_default("SHOPIFY_API_VERSION", DEFAULT_API_VERSION),
            token,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable (empty values count as unset).
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// The store must be a bare host name; the endpoint is built from it.
fn validate_store_domain(store: &str) -> Result<(), ConfigError> {
    if store.is_empty() || store.contains("://") || store.contains('/') {
        return Err(ConfigError::InvalidEnvVar(
            "SHOPIFY_STORE".to_string(),
            format!("expected a bare domain like your-store.myshopify.com (got '{store}')"),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the token issued by Shopify."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-storefront-token", "TEST_VAR");
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("shpat_9f2Kq7LxB3mZ8vR1tY6wN4cD0hJ5", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_store_domain() {
        assert!(validate_store_domain("aeuy9r-dc.myshopify.com").is_ok());
        assert!(validate_store_domain("https://aeuy9r-dc.myshopify.com").is_err());
        assert!(validate_store_domain("shop.com/api").is_err());
        assert!(validate_store_domain("").is_err());
    }

    #[test]
    fn test_endpoint() {
        let config = ShopifyStorefrontConfig {
            store: "test.myshopify.com".to_string(),
            api_version: "2025-07".to_string(),
            token: StorefrontToken::Public("public".to_string()),
        };
        assert_eq!(
            config.endpoint(),
            "https://test.myshopify.com/api/2025-07/graphql.json"
        );
    }

    #[test]
    fn test_token_headers() {
        let public = StorefrontToken::Public("abc".to_string());
        assert_eq!(public.header_name(), "X-Shopify-Storefront-Access-Token");
        assert_eq!(public.value(), "abc");

        let private = StorefrontToken::Private(SecretString::from("def"));
        assert_eq!(private.header_name(), "Shopify-Storefront-Private-Token");
        assert_eq!(private.value(), "def");
    }

    #[test]
    fn test_shopify_config_debug_redacts_private_token() {
        let config = ShopifyStorefrontConfig {
            store: "test.myshopify.com".to_string(),
            api_version: "2025-07".to_string(),
            token: StorefrontToken::Private(SecretString::from("super_secret_private_token")),
        };

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("test.myshopify.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_private_token"));
    }
}
