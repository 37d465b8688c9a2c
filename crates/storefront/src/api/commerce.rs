//! Storefront operations against the REST API.

use std::future::Future;

use shopfront_core::{CartLineId, OrderId, ProductId};

use super::ApiClient;
use super::types::{
    CartSnapshot, Listing, LoginRequest, LoginResponse, Order, Page, PasswordReset,
    PasswordResetRequest, ProductRef, ProfileUpdate, RegisterRequest, UserProfile,
    ValidateRequest, ValidateResponse,
};
use crate::error::Result;

/// Backend operations used by the storefront views.
///
/// Implemented by [`ApiClient`]; views are generic over it so they can run
/// against an in-memory backend.
pub trait CommerceApi: Send + Sync {
    // Auth & account
    fn login(&self, request: &LoginRequest) -> impl Future<Output = Result<LoginResponse>> + Send;
    /// Ask the backend which account `token` belongs to.
    fn validate_token(&self, token: &str) -> impl Future<Output = Result<ValidateResponse>> + Send;
    fn register(&self, request: &RegisterRequest) -> impl Future<Output = Result<()>> + Send;
    fn update_profile(
        &self,
        update: &ProfileUpdate,
    ) -> impl Future<Output = Result<UserProfile>> + Send;
    fn request_password_reset(&self, email: &str) -> impl Future<Output = Result<()>> + Send;
    fn reset_password(&self, reset: &PasswordReset) -> impl Future<Output = Result<()>> + Send;

    // Cart
    fn get_cart(&self) -> impl Future<Output = Result<CartSnapshot>> + Send;
    fn add_cart_line(
        &self,
        product: ProductId,
        quantity: u32,
    ) -> impl Future<Output = Result<()>> + Send;
    fn update_cart_line(
        &self,
        line: CartLineId,
        quantity: u32,
    ) -> impl Future<Output = Result<()>> + Send;
    fn remove_cart_line(&self, line: CartLineId) -> impl Future<Output = Result<()>> + Send;

    /// One catalog page. A blank `query` lists, anything else searches.
    fn list_catalog(
        &self,
        query: &str,
        page: u32,
        size: u32,
    ) -> impl Future<Output = Result<Page<ProductRef>>> + Send;

    // Orders
    fn initiate_order(
        &self,
        shipping_address: &str,
    ) -> impl Future<Output = Result<Order>> + Send;
    fn confirm_order(&self, order: OrderId) -> impl Future<Output = Result<()>> + Send;
    fn list_orders(&self) -> impl Future<Output = Result<Vec<Order>>> + Send;
    fn get_order(&self, order: OrderId) -> impl Future<Output = Result<Order>> + Send;
    fn cancel_order(&self, order: OrderId) -> impl Future<Output = Result<()>> + Send;
}

impl CommerceApi for ApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        self.post("/auth/login").json(request).fetch().await
    }

    async fn validate_token(&self, token: &str) -> Result<ValidateResponse> {
        self.post("/auth/validate")
            .json(&ValidateRequest {
                token: token.to_string(),
            })
            .fetch()
            .await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<()> {
        self.post("/users").json(request).send().await
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile> {
        self.put("/users/profile").json(update).fetch().await
    }

    async fn request_password_reset(&self, email: &str) -> Result<()> {
        self.post("/users/password-reset/request")
            .json(&PasswordResetRequest {
                email: email.to_string(),
            })
            .send()
            .await
    }

    async fn reset_password(&self, reset: &PasswordReset) -> Result<()> {
        self.post("/users/password-reset/reset")
            .json(reset)
            .send()
            .await
    }

    async fn get_cart(&self) -> Result<CartSnapshot> {
        self.get("/cart").fetch().await
    }

    async fn add_cart_line(&self, product: ProductId, quantity: u32) -> Result<()> {
        self.post("/cart/items")
            .query(&[("productId", product.as_i64()), ("quantity", i64::from(quantity))])
            .send()
            .await
    }

    async fn update_cart_line(&self, line: CartLineId, quantity: u32) -> Result<()> {
        self.put(&format!("/cart/items/{line}"))
            .query(&[("quantity", quantity)])
            .send()
            .await
    }

    async fn remove_cart_line(&self, line: CartLineId) -> Result<()> {
        self.delete(&format!("/cart/items/{line}")).send().await
    }

    async fn list_catalog(&self, query: &str, page: u32, size: u32) -> Result<Page<ProductRef>> {
        let query = query.trim();
        if query.is_empty() {
            self.get("/catalog")
                .query(&[("page", page), ("size", size)])
                .fetch()
                .await
        } else {
            self.get("/catalog/search")
                .query(&[("query", query)])
                .query(&[("page", page), ("size", size)])
                .fetch()
                .await
        }
    }

    async fn initiate_order(&self, shipping_address: &str) -> Result<Order> {
        self.post("/orders/initiate")
            .query(&[("shippingAddress", shipping_address)])
            .fetch()
            .await
    }

    async fn confirm_order(&self, order: OrderId) -> Result<()> {
        self.post(&format!("/orders/{order}/confirm")).send().await
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let listing: Listing<Order> = self.get("/orders").fetch().await?;
        Ok(listing.0)
    }

    async fn get_order(&self, order: OrderId) -> Result<Order> {
        self.get(&format!("/orders/{order}")).fetch().await
    }

    async fn cancel_order(&self, order: OrderId) -> Result<()> {
        self.delete(&format!("/orders/{order}")).send().await
    }
}
