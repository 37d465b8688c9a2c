//! In-memory backend for view tests.
//!
//! [`FakeApi`] behaves like the REST backend closely enough for the views:
//! cart mutations change the stored cart, cancelling an order flips its
//! status, and every call is recorded as `METHOD /path?query` so tests can
//! assert on the exact request sequence.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use reqwest::StatusCode;
use serde_json::json;
use tokio::sync::Notify;

use shopfront_core::{CartLineId, Email, Money, OrderId, OrderStatus, ProductId};

use crate::api::CommerceApi;
use crate::api::types::{
    CartLine, CartSnapshot, LoginRequest, LoginResponse, Order, OrderLine, OrderOwner, Page,
    PasswordReset, ProductRef, ProfileUpdate, RegisterRequest, UserProfile, ValidateResponse,
};
use crate::error::{ClientError, Result};
use crate::session::{test_profile, unsigned_token};

/// Password the fake accepts at login.
pub const PASSWORD: &str = "secret123";

/// Catalog query that blocks until [`FakeApi::release`] is called.
pub const SLOW_QUERY: &str = "slow";

#[derive(Clone, Default)]
pub struct FakeApi {
    inner: Arc<FakeBackend>,
}

#[derive(Default)]
struct FakeBackend {
    calls: Mutex<Vec<String>>,
    cart: Mutex<CartSnapshot>,
    products: Mutex<Vec<ProductRef>>,
    orders: Mutex<Vec<Order>>,
    failures: Mutex<HashMap<&'static str, StatusCode>>,
    validated_email: Mutex<Option<String>>,
    gate: Notify,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap()
}

pub fn product(id: i64, description: &str, cents: i64, available: u32) -> ProductRef {
    ProductRef {
        id: ProductId::new(id),
        description: description.to_string(),
        amount: Money::from_cents(cents),
        available_quantity: available,
        image: None,
    }
}

pub fn line(id: i64, product: ProductRef, quantity: u32) -> CartLine {
    CartLine {
        id: CartLineId::new(id),
        price: product.amount,
        product,
        quantity,
    }
}

pub fn order(id: i64, status: OrderStatus, email: &str) -> Order {
    Order {
        id: OrderId::new(id),
        order_number: (!status.is_pending()).then(|| format!("ORD-{id:04}")),
        status,
        shipping_address: Some("Calle 1, Madrid".to_string()),
        items: vec![OrderLine {
            id: shopfront_core::OrderLineId::new(id * 10),
            product: product(42, "Mug", 1_000, 8),
            price: Money::from_cents(1_000),
            quantity: 2,
        }],
        user: Some(OrderOwner {
            id: None,
            email: Email::parse(email).unwrap(),
            first_name: "Ana".to_string(),
            last_name: "Pérez".to_string(),
        }),
    }
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cart(self, lines: Vec<CartLine>) -> Self {
        *lock(&self.inner.cart) = CartSnapshot { items: lines };
        self
    }

    pub fn with_products(self, products: Vec<ProductRef>) -> Self {
        *lock(&self.inner.products) = products;
        self
    }

    pub fn with_orders(self, orders: Vec<Order>) -> Self {
        *lock(&self.inner.orders) = orders;
        self
    }

    /// Make every call to `operation` fail with `status`.
    pub fn fail(&self, operation: &'static str, status: StatusCode) {
        lock(&self.inner.failures).insert(operation, status);
    }

    pub fn recover(&self, operation: &'static str) {
        lock(&self.inner.failures).remove(operation);
    }

    /// Email `/auth/validate` echoes; defaults to the test profile's.
    pub fn set_validated_email(&self, email: &str) {
        *lock(&self.inner.validated_email) = Some(email.to_string());
    }

    /// Let one blocked [`SLOW_QUERY`] catalog call finish.
    pub fn release(&self) {
        self.inner.gate.notify_one();
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.inner.calls).clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.inner.calls).clear();
    }

    pub fn cart(&self) -> CartSnapshot {
        lock(&self.inner.cart).clone()
    }

    pub fn set_cart_quantity(&self, line: CartLineId, quantity: u32) {
        if let Some(l) = lock(&self.inner.cart).items.iter_mut().find(|l| l.id == line) {
            l.quantity = quantity;
        }
    }

    fn record(&self, operation: &'static str, call: String) -> Result<()> {
        lock(&self.inner.calls).push(call);
        match lock(&self.inner.failures).get(operation) {
            None => Ok(()),
            Some(&StatusCode::UNAUTHORIZED) => {
                Err(ClientError::Unauthenticated("rejected".to_string()))
            }
            Some(&StatusCode::FORBIDDEN) => Err(ClientError::Forbidden("rejected".to_string())),
            Some(&StatusCode::NOT_FOUND) => Err(ClientError::NotFound(operation.to_string())),
            Some(&status) => Err(ClientError::Api {
                status,
                message: if status.is_client_error() {
                    "Rejected by backend".to_string()
                } else {
                    String::new()
                },
            }),
        }
    }
}

impl CommerceApi for FakeApi {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        self.record("login", "POST /auth/login".to_string())?;
        if request.password != PASSWORD {
            return Err(ClientError::Api {
                status: StatusCode::UNAUTHORIZED,
                message: "Invalid credentials".to_string(),
            });
        }
        let mut user = test_profile();
        user.email = Email::parse(&request.email).unwrap();
        Ok(LoginResponse {
            token: unsigned_token(&json!({"sub": request.email, "roles": "USER", "exp": 4_000_000_000_i64})),
            user,
        })
    }

    async fn validate_token(&self, _token: &str) -> Result<ValidateResponse> {
        self.record("validate_token", "POST /auth/validate".to_string())?;
        let email = lock(&self.inner.validated_email)
            .clone()
            .unwrap_or_else(|| test_profile().email.into_inner());
        Ok(ValidateResponse { email })
    }

    async fn register(&self, request: &RegisterRequest) -> Result<()> {
        self.record("register", format!("POST /users email={}", request.email))
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile> {
        let call = format!(
            "PUT /users/profile password={}",
            if update.password.is_some() { "set" } else { "unchanged" }
        );
        self.record("update_profile", call)?;
        let mut profile = test_profile();
        profile.first_name.clone_from(&update.first_name);
        profile.last_name.clone_from(&update.last_name);
        profile.shipping_address = Some(update.shipping_address.clone());
        profile.birth_date = Some(update.birth_date.clone());
        Ok(profile)
    }

    async fn request_password_reset(&self, email: &str) -> Result<()> {
        self.record(
            "request_password_reset",
            format!("POST /users/password-reset/request email={email}"),
        )
    }

    async fn reset_password(&self, reset: &PasswordReset) -> Result<()> {
        self.record(
            "reset_password",
            format!("POST /users/password-reset/reset code={}", reset.reset_code),
        )
    }

    async fn get_cart(&self) -> Result<CartSnapshot> {
        self.record("get_cart", "GET /cart".to_string())?;
        Ok(self.cart())
    }

    async fn add_cart_line(&self, product: ProductId, quantity: u32) -> Result<()> {
        self.record(
            "add_cart_line",
            format!("POST /cart/items?productId={product}&quantity={quantity}"),
        )?;
        let listed = lock(&self.inner.products)
            .iter()
            .find(|p| p.id == product)
            .cloned()
            .unwrap_or_else(|| self::product(product.as_i64(), "Unlisted", 100, 10));
        let mut cart = lock(&self.inner.cart);
        if let Some(existing) = cart.items.iter_mut().find(|l| l.product.id == product) {
            existing.quantity += quantity;
        } else {
            let next = cart.items.iter().map(|l| l.id.as_i64()).max().unwrap_or(0) + 1;
            cart.items.push(line(next, listed, quantity));
        }
        Ok(())
    }

    async fn update_cart_line(&self, line: CartLineId, quantity: u32) -> Result<()> {
        self.record(
            "update_cart_line",
            format!("PUT /cart/items/{line}?quantity={quantity}"),
        )?;
        self.set_cart_quantity(line, quantity);
        Ok(())
    }

    async fn remove_cart_line(&self, line: CartLineId) -> Result<()> {
        self.record("remove_cart_line", format!("DELETE /cart/items/{line}"))?;
        lock(&self.inner.cart).items.retain(|l| l.id != line);
        Ok(())
    }

    async fn list_catalog(&self, query: &str, page: u32, size: u32) -> Result<Page<ProductRef>> {
        let call = if query.trim().is_empty() {
            format!("GET /catalog?page={page}&size={size}")
        } else {
            format!("GET /catalog/search?query={query}&page={page}&size={size}")
        };
        self.record("list_catalog", call)?;
        if query == SLOW_QUERY {
            self.inner.gate.notified().await;
        }

        let needle = query.trim().to_lowercase();
        let matching: Vec<ProductRef> = lock(&self.inner.products)
            .iter()
            .filter(|p| needle.is_empty() || p.description.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        let size = size.max(1) as usize;
        let total_pages = u32::try_from(matching.len().div_ceil(size)).unwrap();
        let items = matching
            .into_iter()
            .skip(page as usize * size)
            .take(size)
            .collect();
        Ok(Page {
            items,
            number: page,
            total_pages,
        })
    }

    async fn initiate_order(&self, shipping_address: &str) -> Result<Order> {
        self.record(
            "initiate_order",
            format!("POST /orders/initiate?shippingAddress={shipping_address}"),
        )?;
        let mut orders = lock(&self.inner.orders);
        let id = orders.iter().map(|o| o.id.as_i64()).max().unwrap_or(0) + 1;
        let mut created = order(id, OrderStatus::Pending, "ana@example.com");
        created.shipping_address = Some(shipping_address.to_string());
        orders.push(created.clone());
        lock(&self.inner.cart).items.clear();
        Ok(created)
    }

    async fn confirm_order(&self, order: OrderId) -> Result<()> {
        self.record("confirm_order", format!("POST /orders/{order}/confirm"))?;
        self.set_status(order, OrderStatus::Confirmed);
        Ok(())
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        self.record("list_orders", "GET /orders".to_string())?;
        Ok(lock(&self.inner.orders).clone())
    }

    async fn get_order(&self, order: OrderId) -> Result<Order> {
        self.record("get_order", format!("GET /orders/{order}"))?;
        lock(&self.inner.orders)
            .iter()
            .find(|o| o.id == order)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("/orders/{order}")))
    }

    async fn cancel_order(&self, order: OrderId) -> Result<()> {
        self.record("cancel_order", format!("DELETE /orders/{order}"))?;
        self.set_status(order, OrderStatus::Cancelled);
        Ok(())
    }
}

impl FakeApi {
    fn set_status(&self, order: OrderId, status: OrderStatus) {
        if let Some(o) = lock(&self.inner.orders).iter_mut().find(|o| o.id == order) {
            o.status = status;
            if !status.is_pending() && o.order_number.is_none() {
                o.order_number = Some(format!("ORD-{:04}", order.as_i64()));
            }
        }
    }
}
