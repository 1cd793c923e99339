//! Chillhous CLI - storefront catalog, cart and wishlist from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! chillhous catalog list --category Hoodies --price 25-50 --sort price-asc
//! chillhous product cloud-hoodie
//!
//! # Cart
//! chillhous cart add cloud-hoodie --option Size=M --quantity 2
//! chillhous cart show
//! chillhous cart checkout
//!
//! # Wishlist
//! chillhous wishlist toggle cloud-hoodie
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPIFY_STORE` - Store domain (e.g., chillhous.myshopify.com)
//! - `SHOPIFY_STOREFRONT_PUBLIC_TOKEN` or `SHOPIFY_STOREFRONT_PRIVATE_TOKEN`
//! - `CHILLHOUS_DATA_DIR` - Where the cart and wishlist are kept
//! - `SENTRY_DSN` - Optional error tracking

#![cfg_attr(not(test), forbid(unsafe_code))]

use chillhous_storefront::catalog::{CategoryFilter, FilterState, PriceBucket, SortKey};
use chillhous_storefront::config::StorefrontConfig;
use chillhous_storefront::error::{AppError, report};
use chillhous_storefront::shopify::SelectedOption;
use chillhous_storefront::state::AppState;
use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// Products fetched for catalog views.
const DEFAULT_PRODUCT_COUNT: i64 = 50;

#[derive(Parser)]
#[command(name = "chillhous")]
#[command(author, version, about = "Chillhous storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Show a product and related products
    Product {
        /// Product handle
        handle: String,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List products, filtered and sorted
    List {
        /// Category label, or "all"
        #[arg(short, long, default_value = "all")]
        category: CategoryFilter,

        /// Price range (0-25, 25-50, 50-100, 100+, all)
        #[arg(short, long, default_value = "all")]
        price: PriceBucket,

        /// Sort order (default, price-asc, price-desc, name-asc, name-desc)
        #[arg(short, long, default_value = "default")]
        sort: SortKey,

        /// Number of products to fetch
        #[arg(long, default_value_t = DEFAULT_PRODUCT_COUNT)]
        first: i64,
    },
    /// List category labels
    Categories,
    /// Search products by title or type
    Search {
        /// Search text
        query: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart contents
    Show,
    /// Reconcile with the remote cart
    Sync,
    /// Empty the local cart
    Clear,
    /// Print the checkout URL
    Checkout,
    /// Add a product variant
    Add {
        /// Product handle
        handle: String,

        /// Option choice, e.g. Size=M (repeatable)
        #[arg(short, long = "option", value_parser = parse_option)]
        options: Vec<SelectedOption>,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set the quantity of a line (0 removes it)
    Update {
        /// Variant ID
        variant: String,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove {
        /// Variant ID
        variant: String,
    },
}

#[derive(Subcommand)]
enum WishlistAction {
    /// Show saved products
    Show,
    /// Remove everything
    Clear,
    /// Save or unsave a product
    Toggle {
        /// Product handle
        handle: String,
    },
    /// Remove a saved product
    Remove {
        /// Product ID
        product_id: String,
    },
}

fn parse_option(s: &str) -> Result<SelectedOption, String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected Name=Value, got {s:?}"))?;
    if name.trim().is_empty() {
        return Err(format!("missing option name in {s:?}"));
    }
    Ok(SelectedOption::new(name.trim(), value.trim()))
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let sentry_guard = init_sentry(&config);

    // Logs go to stderr so command output stays clean
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "chillhous_storefront=info,chillhous_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let state = AppState::new(config);

    let code = match run(cli, &state).await {
        Ok(()) => 0,
        Err(e) => {
            report(&e);
            1
        }
    };

    // Flush pending Sentry events before exiting
    drop(sentry_guard);
    std::process::exit(code);
}

async fn run(cli: Cli, state: &AppState) -> Result<(), AppError> {
    // Catch up with checkouts and expiry that happened since the last run
    if let Err(e) = state.cart().sync_cart().await {
        tracing::warn!(error = %e, "Cart sync failed");
    }

    match cli.command {
        Commands::Catalog { action } => match action {
            CatalogAction::List {
                category,
                price,
                sort,
                first,
            } => {
                let filter = FilterState {
                    category,
                    price_range: price,
                    sort_key: sort,
                };
                commands::catalog::list(state, &filter, first).await?;
            }
            CatalogAction::Categories => {
                commands::catalog::categories(state, DEFAULT_PRODUCT_COUNT).await?;
            }
            CatalogAction::Search { query } => {
                commands::catalog::search(state, &query, DEFAULT_PRODUCT_COUNT).await?;
            }
        },
        Commands::Product { handle } => {
            commands::catalog::product(state, &handle, DEFAULT_PRODUCT_COUNT).await?;
        }
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(state),
            CartAction::Sync => commands::cart::sync(state).await?,
            CartAction::Clear => commands::cart::clear(state),
            CartAction::Checkout => commands::cart::checkout(state)?,
            CartAction::Add {
                handle,
                options,
                quantity,
            } => commands::cart::add(state, &handle, &options, quantity).await?,
            CartAction::Update { variant, quantity } => {
                commands::cart::update(state, &variant, quantity).await?;
            }
            CartAction::Remove { variant } => commands::cart::remove(state, &variant).await?,
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::Show => commands::wishlist::show(state),
            WishlistAction::Clear => commands::wishlist::clear(state),
            WishlistAction::Toggle { handle } => commands::wishlist::toggle(state, &handle).await?,
            WishlistAction::Remove { product_id } => commands::wishlist::remove(state, &product_id),
        },
    }
    Ok(())
}
