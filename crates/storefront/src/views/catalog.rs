//! Paginated catalog with per-product cart controls.
//!
//! Each listed product gets a tri-state control derived from the shared
//! cart's [`AddedProductsIndex`](super::cart::AddedProductsIndex) and the
//! quantity the user typed for it, so no per-product "is it in my cart"
//! request is ever made.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use moka::future::Cache;
use tracing::{debug, instrument};

use shopfront_core::ProductId;

use super::cart::{CartPosition, CartStore};
use super::generation::Generation;
use crate::api::CommerceApi;
use crate::api::types::{Page, ProductRef};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::notice::Notice;
use crate::validation::{ValidationError, check_quantity, parse_quantity};

const CACHE_CAPACITY: u64 = 256;

// =============================================================================
// Button state
// =============================================================================

/// What the cart control of a product says.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonLabel {
    /// Not in the cart.
    Add,
    /// In the cart with a different quantity than typed.
    Update,
    /// In the cart with exactly the typed quantity.
    Added,
}

impl ButtonLabel {
    #[must_use]
    pub const fn text(&self) -> &'static str {
        match self {
            Self::Add => "Add to Cart",
            Self::Update => "Update Cart",
            Self::Added => "Already Added",
        }
    }
}

/// Label and enablement of a product's cart control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartButton {
    pub label: ButtonLabel,
    pub enabled: bool,
}

/// Derive the cart control from the product's cart position and the
/// quantity currently shown for it.
#[must_use]
pub const fn button_state(
    position: Option<CartPosition>,
    display_quantity: u32,
    available: u32,
) -> CartButton {
    match position {
        None => CartButton {
            label: ButtonLabel::Add,
            enabled: true,
        },
        Some(position) if position.quantity == display_quantity => CartButton {
            label: ButtonLabel::Added,
            enabled: false,
        },
        Some(_) => CartButton {
            label: ButtonLabel::Update,
            enabled: display_quantity >= 1 && display_quantity <= available,
        },
    }
}

// =============================================================================
// CatalogView
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PageKey {
    query: String,
    page: u32,
    size: u32,
}

/// Observable catalog state.
#[derive(Debug, Clone, Default)]
pub struct CatalogState {
    /// Active search; empty lists the whole catalog.
    pub query: String,
    pub page: Page<ProductRef>,
    pub loading: bool,
    pub notice: Option<Notice>,
}

/// Catalog listing and search over the shared cart.
pub struct CatalogView<A> {
    api: A,
    cart: CartStore<A>,
    cache: Option<Cache<PageKey, Page<ProductRef>>>,
    page_size: u32,
    state: Mutex<CatalogState>,
    edits: Mutex<HashMap<ProductId, u32>>,
    generation: Generation,
}

impl<A: CommerceApi> CatalogView<A> {
    /// Create a view using `config`'s page size and cache TTL.
    #[must_use]
    pub fn new(api: A, cart: CartStore<A>, config: &ClientConfig) -> Self {
        let cache = (!config.catalog_cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(config.catalog_cache_ttl)
                .build()
        });

        Self {
            api,
            cart,
            cache,
            page_size: config.catalog_page_size,
            state: Mutex::new(CatalogState::default()),
            edits: Mutex::new(HashMap::new()),
            generation: Generation::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> CatalogState {
        self.lock_state().clone()
    }

    #[must_use]
    pub fn products(&self) -> Vec<ProductRef> {
        self.lock_state().page.items.clone()
    }

    /// One-based page number for display.
    #[must_use]
    pub fn ui_page(&self) -> u32 {
        self.lock_state().page.number + 1
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore<A> {
        &self.cart
    }

    /// Load the first page together with the cart.
    ///
    /// # Errors
    ///
    /// Returns the first request error; both outcomes are still applied.
    pub async fn open(&self) -> Result<()> {
        let (page, cart) = tokio::join!(self.load_page(0), self.cart.refresh());
        self.sync_with_cart();
        page.and(cart)
    }

    /// Switch to `query` (blank lists everything) and load its first page.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn search(&self, query: &str) -> Result<()> {
        self.lock_state().query = query.trim().to_string();
        self.load_page(0).await
    }

    /// Load a page by its one-based number as shown to the user.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn set_page_one_based(&self, page: u32) -> Result<()> {
        self.load_page(page.saturating_sub(1)).await
    }

    /// Load the zero-based `page` of the active query.
    ///
    /// # Errors
    ///
    /// Returns the request error, which is also recorded as the notice.
    #[instrument(skip(self))]
    pub async fn load_page(&self, page: u32) -> Result<()> {
        let key = PageKey {
            query: self.lock_state().query.clone(),
            page,
            size: self.page_size,
        };
        let ticket = self.generation.begin();

        let result = if let Some(cached) = self.cached(&key).await {
            debug!(query = %key.query, page, "Catalog cache hit");
            Ok(cached)
        } else {
            self.lock_state().loading = true;
            let result = self.api.list_catalog(&key.query, page, key.size).await;
            if let (Ok(fetched), Some(cache)) = (&result, &self.cache) {
                cache.insert(key.clone(), fetched.clone()).await;
            }
            result
        };

        if !self.generation.is_current(ticket) {
            debug!(query = %key.query, page, "Discarding superseded catalog response");
            return Ok(());
        }

        let mut state = self.lock_state();
        state.loading = false;
        match result {
            Ok(fetched) => {
                state.page = fetched;
                Ok(())
            }
            Err(err) => {
                state.notice = Some(err.notice("Could not load the products"));
                Err(err)
            }
        }
    }

    /// Drop cached pages, e.g. after stock changed.
    pub fn invalidate(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
        }
    }

    /// Quantity shown for `product`: the typed value, else the quantity in
    /// the cart, else 1.
    ///
    /// The cart quantity is read from the shared store on every call, so a
    /// change made elsewhere shows up here without a reload.
    #[must_use]
    pub fn display_quantity(&self, product: ProductId) -> u32 {
        self.lock_edits().get(&product).copied().unwrap_or_else(|| {
            self.cart
                .index()
                .get(product)
                .map_or(1, |position| position.quantity)
        })
    }

    /// Record the quantity typed for `product`.
    pub fn edit_quantity(&self, product: ProductId, quantity: u32) {
        self.lock_edits().insert(product, quantity);
    }

    /// Record the raw text typed for `product`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for non-numeric or non-positive input, which is
    /// also recorded as the notice. The previous value is kept.
    pub fn edit_quantity_input(&self, product: ProductId, raw: &str) -> Result<u32> {
        let quantity = parse_quantity(raw).map_err(|e| self.reject(e))?;
        self.edit_quantity(product, quantity);
        Ok(quantity)
    }

    /// Cart control for `product`.
    #[must_use]
    pub fn button(&self, product: &ProductRef) -> CartButton {
        button_state(
            self.cart.index().get(product.id),
            self.display_quantity(product.id),
            product.available_quantity,
        )
    }

    /// Forget typed values that already match the cart, so those products
    /// follow the cart from now on.
    pub fn sync_with_cart(&self) {
        let index = self.cart.index();
        self.lock_edits()
            .retain(|product, typed| index.get(*product).is_none_or(|p| p.quantity != *typed));
    }

    /// Add or update `product` in the cart with its displayed quantity.
    ///
    /// # Errors
    ///
    /// Returns `Validation` without calling the backend if the quantity is
    /// outside `[1, available]` or the product is not on the current page,
    /// or the request error.
    #[instrument(skip(self), fields(product_id = %product))]
    pub async fn submit(&self, product: ProductId) -> Result<()> {
        let Some(listed) = self.products().into_iter().find(|p| p.id == product) else {
            return Err(ClientError::NotFound(format!("product {product}")));
        };
        let quantity = self.display_quantity(product);
        if let Err(e) = check_quantity(quantity, listed.available_quantity) {
            return Err(self.reject(e));
        }

        match self.cart.index().get(product) {
            Some(position) => self.cart.set_line_quantity(position.line, quantity).await?,
            None => self.cart.add_line(product, quantity).await?,
        }

        self.lock_edits().remove(&product);
        Ok(())
    }

    /// Validate `raw` and submit it for `product`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` without calling the backend for non-numeric or
    /// non-positive input, otherwise as [`submit`](Self::submit).
    pub async fn submit_input(&self, product: ProductId, raw: &str) -> Result<()> {
        self.edit_quantity_input(product, raw)?;
        self.submit(product).await
    }

    pub fn dismiss_notice(&self) {
        self.lock_state().notice = None;
    }

    fn reject(&self, err: ValidationError) -> ClientError {
        let err = ClientError::from(err);
        self.lock_state().notice = Some(err.notice("Invalid quantity"));
        err
    }

    async fn cached(&self, key: &PageKey) -> Option<Page<ProductRef>> {
        match &self.cache {
            Some(cache) => cache.get(key).await,
            None => None,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_edits(&self) -> MutexGuard<'_, HashMap<ProductId, u32>> {
        self.edits.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::{FakeApi, SLOW_QUERY, line, product};
    use shopfront_core::CartLineId;
    use std::time::Duration;

    fn config(cache_ttl_secs: u64) -> ClientConfig {
        let mut config = ClientConfig::new("http://localhost:8080/api").unwrap();
        config.catalog_page_size = 2;
        config.catalog_cache_ttl = Duration::from_secs(cache_ttl_secs);
        config
    }

    fn view(api: &FakeApi, cache_ttl_secs: u64) -> CatalogView<FakeApi> {
        CatalogView::new(
            api.clone(),
            CartStore::new(api.clone()),
            &config(cache_ttl_secs),
        )
    }

    fn shop() -> FakeApi {
        FakeApi::new()
            .with_products(vec![
                product(42, "Mug", 1_000, 8),
                product(43, "Tea", 250, 5),
                product(44, "Teapot", 3_000, 1),
            ])
            .with_cart(vec![line(7, product(42, "Mug", 1_000, 8), 2)])
    }

    fn position(quantity: u32) -> Option<CartPosition> {
        Some(CartPosition {
            quantity,
            line: CartLineId::new(7),
        })
    }

    #[test]
    fn test_button_state_is_pure() {
        assert_eq!(
            button_state(None, 1, 5),
            CartButton { label: ButtonLabel::Add, enabled: true }
        );
        assert_eq!(
            button_state(position(2), 2, 5),
            CartButton { label: ButtonLabel::Added, enabled: false }
        );
        assert_eq!(
            button_state(position(2), 3, 5),
            CartButton { label: ButtonLabel::Update, enabled: true }
        );
        assert!(!button_state(position(2), 6, 5).enabled);
        assert!(!button_state(position(2), 0, 5).enabled);
        assert_eq!(ButtonLabel::Added.text(), "Already Added");
    }

    #[tokio::test]
    async fn test_open_loads_page_and_cart() {
        let api = shop();
        let catalog = view(&api, 0);
        catalog.open().await.unwrap();

        assert_eq!(catalog.products().len(), 2);
        assert_eq!(catalog.state().page.total_pages, 2);
        let products = catalog.products();
        let (mug, tea) = (&products[0], &products[1]);
        assert_eq!(catalog.display_quantity(mug.id), 2);
        assert_eq!(catalog.button(mug).label, ButtonLabel::Added);
        assert_eq!(catalog.display_quantity(tea.id), 1);
        assert_eq!(catalog.button(tea).label, ButtonLabel::Add);
    }

    #[tokio::test]
    async fn test_update_reconciles_to_added() {
        let api = shop();
        let catalog = view(&api, 0);
        catalog.open().await.unwrap();
        api.clear_calls();

        let mug = catalog.products()[0].clone();
        catalog.edit_quantity(mug.id, 5);
        assert_eq!(catalog.button(&mug).label, ButtonLabel::Update);

        catalog.submit(mug.id).await.unwrap();

        assert_eq!(api.calls(), vec!["PUT /cart/items/7?quantity=5", "GET /cart"]);
        assert_eq!(catalog.button(&mug), CartButton { label: ButtonLabel::Added, enabled: false });
        let snapshot = catalog.cart().snapshot();
        let updated = snapshot.line(CartLineId::new(7)).unwrap();
        assert_eq!(updated.subtotal().rounded().to_string(), "$50.00");
    }

    #[tokio::test]
    async fn test_add_creates_line_and_indexes_it() {
        let api = shop();
        let catalog = view(&api, 0);
        catalog.open().await.unwrap();
        api.clear_calls();

        let tea = catalog.products()[1].clone();
        catalog.edit_quantity(tea.id, 3);
        catalog.submit(tea.id).await.unwrap();

        assert_eq!(api.calls(), vec!["POST /cart/items?productId=43&quantity=3", "GET /cart"]);
        let index = catalog.cart().index();
        assert_eq!(index.get(tea.id).unwrap().quantity, 3);
        let server: Vec<_> = api.cart().items.iter().map(|l| l.product.id).collect();
        assert_eq!(index.products().collect::<Vec<_>>(), server);
        assert_eq!(catalog.button(&tea).label, ButtonLabel::Added);
    }

    #[tokio::test]
    async fn test_quantity_over_stock_is_rejected_locally() {
        let api = shop();
        let catalog = view(&api, 0);
        catalog.open().await.unwrap();
        api.clear_calls();

        let tea = catalog.products()[1].clone();
        catalog.edit_quantity(tea.id, 6);
        let err = catalog.submit(tea.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        catalog.edit_quantity(tea.id, 0);
        assert!(catalog.submit(tea.id).await.is_err());
        assert!(api.calls().is_empty());
        assert!(catalog.state().notice.is_some());
    }

    #[tokio::test]
    async fn test_search_and_one_based_paging() {
        let api = shop();
        let catalog = view(&api, 0);

        catalog.search("tea").await.unwrap();
        catalog.set_page_one_based(2).await.unwrap();

        assert_eq!(
            api.calls(),
            vec![
                "GET /catalog/search?query=tea&page=0&size=2",
                "GET /catalog/search?query=tea&page=1&size=2",
            ]
        );
        assert!(catalog.products().is_empty());
        assert_eq!(catalog.ui_page(), 2);

        catalog.search("  ").await.unwrap();
        assert_eq!(api.calls().last().unwrap(), "GET /catalog?page=0&size=2");
    }

    #[tokio::test]
    async fn test_cached_pages_skip_the_backend() {
        let api = shop();
        let catalog = view(&api, 60);

        catalog.load_page(0).await.unwrap();
        catalog.load_page(1).await.unwrap();
        catalog.load_page(0).await.unwrap();
        assert_eq!(api.calls().len(), 2);
        assert_eq!(catalog.products()[0].id, ProductId::new(42));

        catalog.invalidate();
        catalog.load_page(0).await.unwrap();
        assert_eq!(api.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_superseded_response_is_discarded() {
        let api = shop();
        let catalog = view(&api, 0);

        let slow = async {
            catalog.search(SLOW_QUERY).await.unwrap();
        };
        let fast = async {
            tokio::task::yield_now().await;
            catalog.search("mug").await.unwrap();
            api.release();
        };
        tokio::join!(slow, fast);

        let state = catalog.state();
        assert_eq!(state.page.items.len(), 1);
        assert_eq!(state.page.items[0].description, "Mug");
    }

    #[tokio::test]
    async fn test_failed_load_sets_notice() {
        let api = shop();
        api.fail("list_catalog", reqwest::StatusCode::BAD_GATEWAY);
        let catalog = view(&api, 0);

        assert!(catalog.load_page(0).await.is_err());
        let state = catalog.state();
        assert!(!state.loading);
        assert_eq!(state.notice.unwrap().message, "Could not load the products");
    }

    #[tokio::test]
    async fn test_follows_cart_changed_elsewhere() {
        let api = shop();
        let catalog = view(&api, 0);
        catalog.open().await.unwrap();
        let mug = catalog.products()[0].clone();

        catalog.cart().set_line_quantity(CartLineId::new(7), 5).await.unwrap();

        assert_eq!(catalog.display_quantity(mug.id), 5);
        assert_eq!(catalog.button(&mug), CartButton { label: ButtonLabel::Added, enabled: false });

        catalog.edit_quantity(mug.id, 3);
        catalog.cart().refresh().await.unwrap();
        assert_eq!(catalog.button(&mug).label, ButtonLabel::Update);
    }

    #[tokio::test]
    async fn test_submit_then_follows_cart() {
        let api = shop();
        let catalog = view(&api, 0);
        catalog.open().await.unwrap();
        let mug = catalog.products()[0].clone();

        catalog.edit_quantity(mug.id, 4);
        catalog.submit(mug.id).await.unwrap();
        catalog.cart().set_line_quantity(CartLineId::new(7), 6).await.unwrap();

        assert_eq!(catalog.display_quantity(mug.id), 6);
        assert_eq!(catalog.button(&mug).label, ButtonLabel::Added);
    }

    #[tokio::test]
    async fn test_sync_forgets_values_matching_cart() {
        let api = shop();
        let catalog = view(&api, 0);
        catalog.edit_quantity(ProductId::new(42), 2);
        catalog.edit_quantity(ProductId::new(43), 4);
        catalog.open().await.unwrap();

        catalog.cart().set_line_quantity(CartLineId::new(7), 3).await.unwrap();
        assert_eq!(catalog.display_quantity(ProductId::new(42)), 3);
        assert_eq!(catalog.display_quantity(ProductId::new(43)), 4);
    }

    #[tokio::test]
    async fn test_bad_text_is_rejected_without_calls() {
        let api = shop();
        let catalog = view(&api, 0);
        catalog.open().await.unwrap();
        api.clear_calls();
        let tea = catalog.products()[1].clone();

        for raw in ["abc", "", "-1", "0"] {
            let err = catalog.submit_input(tea.id, raw).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "input {raw:?}");
        }
        assert!(api.calls().is_empty());
        assert_eq!(catalog.display_quantity(tea.id), 1);
        assert_eq!(
            catalog.state().notice.unwrap().message,
            "Quantity must be at least 1"
        );

        catalog.submit_input(tea.id, " 2 ").await.unwrap();
        assert_eq!(api.calls(), vec!["POST /cart/items?productId=43&quantity=2", "GET /cart"]);
    }
}
