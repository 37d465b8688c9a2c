//! Shared cart store and the cart page.
//!
//! [`CartStore`] mirrors the user's cart. It never edits lines locally: every
//! mutation is sent to the backend and followed by a full re-fetch, and the
//! fetched snapshot replaces the previous one wholesale. Pages that show cart
//! data (catalog, cart, the badge in the header) share one store and observe
//! it through [`CartStore::subscribe`].

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, instrument};

use shopfront_core::{CartLineId, Money, ProductId};

use super::generation::Generation;
use crate::api::CommerceApi;
use crate::api::types::CartSnapshot;
use crate::error::{ClientError, Result, add_breadcrumb};
use crate::notice::Notice;
use crate::validation::{ValidationError, parse_quantity};

// =============================================================================
// AddedProductsIndex
// =============================================================================

/// Server-confirmed cart position of one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartPosition {
    pub quantity: u32,
    pub line: CartLineId,
}

/// Product id to cart position, derived from a [`CartSnapshot`].
///
/// Rebuilt after every cart fetch so its keys and quantities always equal
/// the last snapshot's.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddedProductsIndex(BTreeMap<ProductId, CartPosition>);

impl AddedProductsIndex {
    #[must_use]
    pub fn from_snapshot(snapshot: &CartSnapshot) -> Self {
        Self(
            snapshot
                .items
                .iter()
                .map(|line| {
                    (
                        line.product.id,
                        CartPosition {
                            quantity: line.quantity,
                            line: line.id,
                        },
                    )
                })
                .collect(),
        )
    }

    #[must_use]
    pub fn get(&self, product: ProductId) -> Option<CartPosition> {
        self.0.get(&product).copied()
    }

    #[must_use]
    pub fn contains(&self, product: ProductId) -> bool {
        self.0.contains_key(&product)
    }

    pub fn products(&self) -> impl Iterator<Item = ProductId> + '_ {
        self.0.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// CartStore
// =============================================================================

/// Observable cart state.
#[derive(Debug, Clone, Default)]
pub struct CartState {
    /// Last fetched cart; empty after a failed fetch.
    pub snapshot: CartSnapshot,
    pub index: AddedProductsIndex,
    /// A fetch is in flight.
    pub loading: bool,
    /// The last fetch failed and the empty cart shown is not the real one.
    pub load_failed: bool,
    /// Outcome of the last action, until dismissed.
    pub notice: Option<Notice>,
}

/// Shared mirror of the authenticated user's cart.
pub struct CartStore<A> {
    inner: Arc<CartStoreInner<A>>,
}

struct CartStoreInner<A> {
    api: A,
    state: watch::Sender<CartState>,
    generation: Generation,
}

impl<A> Clone for CartStore<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: CommerceApi> CartStore<A> {
    /// Create an empty store. Call [`refresh`](Self::refresh) to load the cart.
    #[must_use]
    pub fn new(api: A) -> Self {
        let (state, _) = watch::channel(CartState::default());
        Self {
            inner: Arc::new(CartStoreInner {
                api,
                state,
                generation: Generation::new(),
            }),
        }
    }

    /// Receive every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> CartState {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.inner.state.borrow().snapshot.clone()
    }

    #[must_use]
    pub fn index(&self) -> AddedProductsIndex {
        self.inner.state.borrow().index.clone()
    }

    /// Rounded display total of the current snapshot.
    #[must_use]
    pub fn total(&self) -> Money {
        self.inner.state.borrow().snapshot.total()
    }

    /// Item count for the cart badge.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.inner.state.borrow().snapshot.total_quantity()
    }

    /// Fetch the cart and replace the snapshot and index.
    ///
    /// On failure the store shows an empty cart rather than stale lines.
    ///
    /// # Errors
    ///
    /// Returns the request error; it is also recorded as the store's notice.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<()> {
        let ticket = self.inner.generation.begin();
        self.inner.state.send_modify(|s| s.loading = true);

        let result = self.inner.api.get_cart().await;
        if !self.inner.generation.is_current(ticket) {
            debug!("Discarding superseded cart response");
            return Ok(());
        }

        match result {
            Ok(snapshot) => {
                debug!(lines = snapshot.items.len(), "Cart refreshed");
                let index = AddedProductsIndex::from_snapshot(&snapshot);
                self.inner.state.send_modify(|s| {
                    s.snapshot = snapshot;
                    s.index = index;
                    s.loading = false;
                    s.load_failed = false;
                });
                Ok(())
            }
            Err(err) => {
                let notice = err.notice("Could not load the cart");
                self.inner.state.send_modify(|s| {
                    s.snapshot = CartSnapshot::default();
                    s.index = AddedProductsIndex::default();
                    s.loading = false;
                    s.load_failed = true;
                    s.notice = Some(notice);
                });
                Err(err)
            }
        }
    }

    /// Set the quantity of an existing line, then re-fetch.
    ///
    /// # Errors
    ///
    /// Returns `Validation` without calling the backend if `quantity < 1`,
    /// or the request error.
    #[instrument(skip(self), fields(line_id = %line))]
    pub async fn set_line_quantity(&self, line: CartLineId, quantity: u32) -> Result<()> {
        if quantity < 1 {
            return Err(self.reject(ValidationError::QuantityTooLow));
        }
        add_breadcrumb(
            "cart",
            "Updated line quantity",
            Some(&[
                ("line_id", line.to_string().as_str()),
                ("quantity", quantity.to_string().as_str()),
            ]),
        );
        let result = self.inner.api.update_cart_line(line, quantity).await;
        self.settle(result, "Could not update the quantity", "Quantity updated")
            .await
    }

    /// Add `quantity` of `product` as a new line, then re-fetch.
    ///
    /// # Errors
    ///
    /// Returns `Validation` without calling the backend if `quantity < 1`,
    /// or the request error.
    #[instrument(skip(self), fields(product_id = %product))]
    pub async fn add_line(&self, product: ProductId, quantity: u32) -> Result<()> {
        if quantity < 1 {
            return Err(self.reject(ValidationError::QuantityTooLow));
        }
        add_breadcrumb(
            "cart",
            "Added product",
            Some(&[("product_id", product.to_string().as_str())]),
        );
        let result = self.inner.api.add_cart_line(product, quantity).await;
        self.settle(result, "Could not add the product", "Product added to the cart")
            .await
    }

    /// Delete a line, then re-fetch.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    #[instrument(skip(self), fields(line_id = %line))]
    pub async fn remove_line(&self, line: CartLineId) -> Result<()> {
        add_breadcrumb(
            "cart",
            "Removed line",
            Some(&[("line_id", line.to_string().as_str())]),
        );
        let result = self.inner.api.remove_cart_line(line).await;
        self.settle(result, "Could not remove the product", "Product removed")
            .await
    }

    pub fn dismiss_notice(&self) {
        self.inner.state.send_modify(|s| s.notice = None);
    }

    /// Forget the cart, e.g. after logout.
    pub fn reset(&self) {
        self.inner.generation.begin();
        self.inner.state.send_replace(CartState::default());
    }

    /// Record a locally rejected input and return it as an error.
    pub(crate) fn reject(&self, err: ValidationError) -> ClientError {
        let err = ClientError::from(err);
        self.notify(err.notice("Invalid quantity"));
        err
    }

    fn notify(&self, notice: Notice) {
        self.inner.state.send_modify(|s| s.notice = Some(notice));
    }

    async fn settle(&self, result: Result<()>, context: &str, success: &str) -> Result<()> {
        match result {
            Ok(()) => {
                self.notify(Notice::success(success));
                self.refresh().await
            }
            Err(err) => {
                self.notify(err.notice(context));
                Err(err)
            }
        }
    }
}

// =============================================================================
// CartPage
// =============================================================================

/// The cart page: per-line quantity inputs over the shared store.
pub struct CartPage<A> {
    store: CartStore<A>,
    edits: HashMap<CartLineId, String>,
}

impl<A: CommerceApi> CartPage<A> {
    #[must_use]
    pub fn new(store: CartStore<A>) -> Self {
        Self {
            store,
            edits: HashMap::new(),
        }
    }

    #[must_use]
    pub const fn store(&self) -> &CartStore<A> {
        &self.store
    }

    /// Text of the quantity input: the local edit, else the confirmed quantity.
    #[must_use]
    pub fn quantity_input(&self, line: CartLineId) -> String {
        self.edits.get(&line).cloned().unwrap_or_else(|| {
            self.store
                .snapshot()
                .line(line)
                .map_or_else(String::new, |l| l.quantity.to_string())
        })
    }

    /// Record what the user typed. Nothing is sent until [`submit`](Self::submit).
    pub fn edit(&mut self, line: CartLineId, raw: impl Into<String>) {
        self.edits.insert(line, raw.into());
    }

    /// Send the edited quantity of `line`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` without calling the backend for non-numeric or
    /// non-positive input, or the request error.
    pub async fn submit(&mut self, line: CartLineId) -> Result<()> {
        let raw = self.quantity_input(line);
        let quantity = parse_quantity(&raw).map_err(|e| self.store.reject(e))?;
        self.store.set_line_quantity(line, quantity).await?;
        self.edits.remove(&line);
        Ok(())
    }

    /// Remove `line` from the cart.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn remove(&mut self, line: CartLineId) -> Result<()> {
        self.store.remove_line(line).await?;
        self.edits.remove(&line);
        Ok(())
    }
}
