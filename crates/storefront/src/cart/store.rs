//! The cart store.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chillhous_core::{CartId, CartLineId, VariantId};
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::backend::{CartBackend, RemoteCartError, format_user_errors};
use super::{CartLine, CartState, NewCartLine};
use crate::error::add_breadcrumb;
use crate::shopify::{CartUserError, ShopifyError};
use crate::storage::{CART_STORAGE_KEY, KeyValueStorage, StorageError};

/// Errors returned by cart operations.
///
/// Every error leaves the local cart in a consistent state. Only
/// `CartExpired` changes it (the cart is cleared).
#[derive(Debug, Error)]
pub enum CartError {
    /// The remote cart is gone; the local cart was cleared.
    #[error("Cart expired and was cleared")]
    CartExpired,

    /// The remote cart refused the change.
    #[error("Cart change rejected: {}", format_user_errors(.0))]
    Rejected(Vec<CartUserError>),

    /// Request to the remote cart failed.
    #[error("Cart request failed: {0}")]
    Remote(#[from] ShopifyError),

    /// Quantity out of range.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// The remote cart accepted a new line but did not return it.
    #[error("Remote cart did not return a line for variant {0}")]
    LineNotReturned(VariantId),

    /// The cart was cleared or replaced while the request was in flight.
    #[error("Cart changed while the request was in flight")]
    Superseded,
}

/// Counts in-flight mutations for `is_loading`.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn enter(pending: &'a AtomicUsize) -> Self {
        pending.fetch_add(1, Ordering::AcqRel);
        Self(pending)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Resets the syncing flag.
struct SyncGuard<'a>(&'a AtomicBool);

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Serialized cart state waiting to be written, tagged with its revision.
struct PendingWrite {
    revision: u64,
    raw: Result<String, StorageError>,
}

/// Local cart mirrored against a remote cart.
///
/// Mutations (`add_item`, `update_quantity`, `remove_item`) run one at a
/// time in call order. Each one sees the state left by the previous one.
/// `sync_cart` runs outside that queue and skips if a sync is already
/// running. Readers never wait on the network or on storage.
pub struct CartStore {
    backend: Arc<dyn CartBackend>,
    storage: Arc<dyn KeyValueStorage>,
    state: RwLock<CartState>,
    revision: AtomicU64,
    persisted: std::sync::Mutex<u64>,
    mutation: Mutex<()>,
    pending: AtomicUsize,
    syncing: AtomicBool,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("state", &*self.read())
            .field("loading", &self.is_loading())
            .field("syncing", &self.is_syncing())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Create a store, restoring the persisted cart.
    ///
    /// A missing record starts an empty cart. An unreadable record is logged
    /// and replaced by an empty cart.
    pub fn load(backend: Arc<dyn CartBackend>, storage: Arc<dyn KeyValueStorage>) -> Self {
        let state = match storage.load(CART_STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<CartState>(&raw) {
                Ok(state) => state.sanitized(),
                Err(e) => {
                    warn!(error = %e, "Stored cart is unreadable, starting empty");
                    CartState::default()
                }
            },
            Ok(None) => CartState::default(),
            Err(e) => {
                error!(error = %e, "Failed to read stored cart, starting empty");
                CartState::default()
            }
        };

        debug!(
            lines = state.lines.len(),
            has_remote_cart = state.remote_cart_id.is_some(),
            "Cart loaded"
        );

        Self {
            backend,
            storage,
            state: RwLock::new(state),
            revision: AtomicU64::new(0),
            persisted: std::sync::Mutex::new(0),
            mutation: Mutex::new(()),
            pending: AtomicUsize::new(0),
            syncing: AtomicBool::new(false),
        }
    }

    // =========================================================================
    // Readers
    // =========================================================================

    /// Current lines.
    #[must_use]
    pub fn items(&self) -> Vec<CartLine> {
        self.read().lines.clone()
    }

    /// Copy of the whole state.
    #[must_use]
    pub fn snapshot(&self) -> CartState {
        self.read().clone()
    }

    /// Whether a mutation is running or queued.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.pending.load(Ordering::Acquire) > 0
    }

    /// Whether a sync is running.
    #[must_use]
    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    /// Checkout URL of the remote cart.
    #[must_use]
    pub fn checkout_url(&self) -> Option<String> {
        self.read().checkout_url.clone()
    }

    /// Remote cart ID.
    #[must_use]
    pub fn remote_cart_id(&self) -> Option<CartId> {
        self.read().remote_cart_id.clone()
    }

    /// Sum of line quantities.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.read().lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Sum of unit price times quantity. Malformed prices count as zero.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.read()
            .lines
            .iter()
            .map(|l| {
                l.unit_price.decimal().unwrap_or_else(|| {
                    debug!(variant_id = %l.variant_id, amount = %l.unit_price.amount, "Malformed line price");
                    Decimal::ZERO
                }) * Decimal::from(l.quantity)
            })
            .sum()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add a variant to the cart.
    ///
    /// Creates the remote cart on first use. Adding a variant that is already
    /// in the cart increases its quantity.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` for a zero quantity and the remote failure
    /// otherwise. See [`CartError`].
    pub async fn add_item(&self, item: NewCartLine) -> Result<(), CartError> {
        if item.quantity == 0 {
            return Err(CartError::InvalidQuantity(0));
        }

        let _loading = LoadingGuard::enter(&self.pending);
        let _gate = self.mutation.lock().await;

        add_breadcrumb(
            "cart",
            "Add item",
            Some(&[("variant_id", item.variant_id.as_str())]),
        );

        let (cart_id, existing) = {
            let state = self.read();
            let existing = state
                .line(&item.variant_id)
                .map(|l| (l.remote_line_id.clone(), l.quantity));
            (state.remote_cart_id.clone(), existing)
        };

        let Some(cart_id) = cart_id else {
            return self.create_with(item).await;
        };

        match existing {
            Some((Some(line_id), quantity)) => {
                let quantity = quantity.saturating_add(item.quantity);
                self.set_quantity(&cart_id, &line_id, &item.variant_id, quantity)
                    .await
            }
            Some((None, _)) => {
                warn!(variant_id = %item.variant_id, "Cart line has no remote line ID yet, skipping add");
                Ok(())
            }
            None => self.append_line(&cart_id, item).await,
        }
    }

    /// Set the quantity of a line. Zero or less removes it.
    ///
    /// Lines that are missing or not yet synced are left alone.
    ///
    /// # Errors
    ///
    /// Returns the remote failure, or `InvalidQuantity` above `u32::MAX` for a
    /// synced line.
    pub async fn update_quantity(
        &self,
        variant_id: &VariantId,
        quantity: i64,
    ) -> Result<(), CartError> {
        if quantity <= 0 {
            return self.remove_item(variant_id).await;
        }

        let _loading = LoadingGuard::enter(&self.pending);
        let _gate = self.mutation.lock().await;

        add_breadcrumb(
            "cart",
            "Update quantity",
            Some(&[("variant_id", variant_id.as_str())]),
        );

        let Some((cart_id, line_id)) = self.remote_line(variant_id) else {
            debug!(variant_id = %variant_id, "No synced line to update");
            return Ok(());
        };
        let quantity = u32::try_from(quantity).map_err(|_| CartError::InvalidQuantity(quantity))?;

        self.set_quantity(&cart_id, &line_id, variant_id, quantity)
            .await
    }

    /// Remove a line. Removing the last line clears the cart.
    ///
    /// Lines that are missing or not yet synced are left alone.
    ///
    /// # Errors
    ///
    /// Returns the remote failure. See [`CartError`].
    pub async fn remove_item(&self, variant_id: &VariantId) -> Result<(), CartError> {
        let _loading = LoadingGuard::enter(&self.pending);
        let _gate = self.mutation.lock().await;

        add_breadcrumb(
            "cart",
            "Remove item",
            Some(&[("variant_id", variant_id.as_str())]),
        );

        let Some((cart_id, line_id)) = self.remote_line(variant_id) else {
            debug!(variant_id = %variant_id, "No synced line to remove");
            return Ok(());
        };

        if let Err(e) = self.backend.remove_line(&cart_id, &line_id).await {
            return Err(self.fail(Some(&cart_id), "remove_line", e));
        }

        self.apply(&cart_id, |state| {
            state.lines.retain(|l| &l.variant_id != variant_id);
            if state.lines.is_empty() {
                *state = CartState::default();
            }
        })
    }

    /// Reconcile with the remote cart.
    ///
    /// Clears the local cart when the remote cart is gone or empty. Does
    /// nothing without a remote cart or while another sync is running.
    ///
    /// # Errors
    ///
    /// Returns the remote failure, leaving the cart unchanged.
    pub async fn sync_cart(&self) -> Result<(), CartError> {
        let Some(cart_id) = self.remote_cart_id() else {
            return Ok(());
        };

        if self
            .syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Cart sync already running");
            return Ok(());
        }
        let _syncing = SyncGuard(&self.syncing);

        match self.backend.total_quantity(&cart_id).await {
            Ok(Some(total)) if total > 0 => {
                debug!(cart_id = %cart_id, total, "Remote cart is alive");
                Ok(())
            }
            Ok(_) | Err(RemoteCartError::CartNotFound) => {
                info!(cart_id = %cart_id, "Remote cart is gone or empty, clearing local cart");
                self.clear_if_current(&cart_id);
                Ok(())
            }
            Err(e) => Err(self.fail(Some(&cart_id), "total_quantity", e)),
        }
    }

    /// Reset the local cart. The remote cart is abandoned.
    pub fn clear_cart(&self) {
        let pending = {
            let mut state = self.write();
            *state = CartState::default();
            self.stage(&state)
        };
        self.persist(pending);
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn create_with(&self, item: NewCartLine) -> Result<(), CartError> {
        let created = match self
            .backend
            .create_cart(&item.variant_id, item.quantity)
            .await
        {
            Ok(created) => created,
            Err(e) => return Err(self.fail(None, "create_cart", e)),
        };

        let pending = {
            let mut state = self.write();
            if state.remote_cart_id.is_some() {
                warn!(cart_id = %created.cart_id, "Another cart appeared meanwhile, discarding created cart");
                return Err(CartError::Superseded);
            }

            info!(cart_id = %created.cart_id, "Created remote cart");
            *state = CartState {
                lines: vec![item.into_line(created.line_id)],
                remote_cart_id: Some(created.cart_id),
                checkout_url: Some(created.checkout_url),
            };
            self.stage(&state)
        };
        self.persist(pending);
        Ok(())
    }

    async fn append_line(&self, cart_id: &CartId, item: NewCartLine) -> Result<(), CartError> {
        let lines = match self
            .backend
            .add_line(cart_id, &item.variant_id, item.quantity)
            .await
        {
            Ok(lines) => lines,
            Err(e) => return Err(self.fail(Some(cart_id), "add_line", e)),
        };

        // Response line order is not guaranteed, match by variant
        let Some(line_id) = lines
            .into_iter()
            .find(|l| l.variant_id == item.variant_id)
            .map(|l| l.id)
        else {
            warn!(variant_id = %item.variant_id, "Added line missing from remote response");
            return Err(CartError::LineNotReturned(item.variant_id));
        };

        self.apply(cart_id, move |state| {
            if let Some(existing) = state.line_mut(&item.variant_id) {
                existing.remote_line_id = Some(line_id);
                existing.quantity = existing.quantity.saturating_add(item.quantity);
            } else {
                state.lines.push(item.into_line(line_id));
            }
        })
    }

    async fn set_quantity(
        &self,
        cart_id: &CartId,
        line_id: &CartLineId,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<(), CartError> {
        if let Err(e) = self.backend.update_line(cart_id, line_id, quantity).await {
            return Err(self.fail(Some(cart_id), "update_line", e));
        }

        self.apply(cart_id, |state| {
            if let Some(line) = state.line_mut(variant_id) {
                line.quantity = quantity;
            }
        })
    }

    /// Apply a successful remote result if `cart_id` is still current.
    fn apply(
        &self,
        cart_id: &CartId,
        change: impl FnOnce(&mut CartState),
    ) -> Result<(), CartError> {
        let pending = {
            let mut state = self.write();
            if !state.is_current(cart_id) {
                warn!(cart_id = %cart_id, "Cart changed while request was in flight, discarding result");
                return Err(CartError::Superseded);
            }
            change(&mut *state);
            self.stage(&state)
        };
        self.persist(pending);
        Ok(())
    }

    /// Map a remote failure, clearing the cart when it is gone.
    fn fail(&self, cart_id: Option<&CartId>, operation: &str, err: RemoteCartError) -> CartError {
        match err {
            RemoteCartError::CartNotFound => {
                warn!(operation, "Remote cart not found, clearing local cart");
                if let Some(cart_id) = cart_id {
                    self.clear_if_current(cart_id);
                }
                CartError::CartExpired
            }
            RemoteCartError::Rejected(errors) => {
                warn!(operation, errors = ?errors, "Remote cart rejected change");
                CartError::Rejected(errors)
            }
            RemoteCartError::Transport(e) => {
                error!(operation, error = %e, "Remote cart request failed");
                CartError::Remote(e)
            }
        }
    }

    fn clear_if_current(&self, cart_id: &CartId) {
        let pending = {
            let mut state = self.write();
            if !state.is_current(cart_id) {
                return;
            }
            *state = CartState::default();
            self.stage(&state)
        };
        self.persist(pending);
    }

    fn remote_line(&self, variant_id: &VariantId) -> Option<(CartId, CartLineId)> {
        let state = self.read();
        let cart_id = state.remote_cart_id.clone()?;
        let line_id = state.line(variant_id)?.remote_line_id.clone()?;
        Some((cart_id, line_id))
    }

    /// Serialize `state` under the write lock so revisions follow state order.
    fn stage(&self, state: &CartState) -> PendingWrite {
        PendingWrite {
            revision: self.revision.fetch_add(1, Ordering::AcqRel) + 1,
            raw: serde_json::to_string(state).map_err(StorageError::from),
        }
    }

    /// Write a staged snapshot after the state lock is released.
    ///
    /// A snapshot older than the last one written is skipped.
    fn persist(&self, pending: PendingWrite) {
        let mut persisted = self
            .persisted
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if pending.revision <= *persisted {
            debug!(revision = pending.revision, "Skipping stale cart snapshot");
            return;
        }

        *persisted = pending.revision;
        if let Err(e) = pending
            .raw
            .and_then(|raw| self.storage.save(CART_STORAGE_KEY, &raw))
        {
            error!(error = %e, "Failed to persist cart");
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CartState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CartState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
