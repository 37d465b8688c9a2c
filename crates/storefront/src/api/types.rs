//! Wire types for the Shopfront REST API.
//!
//! These mirror backend responses transiently; the client never owns or
//! persists them, except for the session profile.

use serde::{Deserialize, Deserializer, Serialize};

use shopfront_core::{
    CartLineId, Email, Money, OrderId, OrderLineId, OrderStatus, ProductId, RoleId, RoleSet,
    UserId, UserStatus,
};

// =============================================================================
// Users & Auth
// =============================================================================

/// A role reference as embedded in user payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RoleId>,
    pub name: String,
}

/// The authenticated user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: Email,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub roles: Vec<RoleRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
}

impl UserProfile {
    /// Roles carried on the profile, parsed case-insensitively.
    #[must_use]
    pub fn role_set(&self) -> RoleSet {
        self.roles
            .iter()
            .filter_map(|role| role.name.parse().ok())
            .collect()
    }

    /// First word of first and last name, e.g. "Ana Pérez".
    #[must_use]
    pub fn short_name(&self) -> String {
        let first = self.first_name.split_whitespace().next().unwrap_or("User");
        let last = self.last_name.split_whitespace().next().unwrap_or("");
        format!("{first} {last}").trim_end().to_string()
    }
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response of `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Body of `POST /auth/validate`.
#[derive(Debug, Clone, Serialize)]
pub struct ValidateRequest {
    pub token: String,
}

/// Response of `POST /auth/validate`: the email the token belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateResponse {
    pub email: String,
}

/// Body of `POST /users`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub birth_date: String,
    pub shipping_address: String,
    pub password: String,
}

/// Body of `PUT /users/profile`. Absent password keeps the current one.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub shipping_address: String,
    pub birth_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Body of `POST /users/password-reset/request`.
#[derive(Debug, Clone, Serialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Body of `POST /users/password-reset/reset`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordReset {
    pub email: String,
    pub reset_code: String,
    pub new_password: String,
}

// =============================================================================
// Catalog
// =============================================================================

/// A product as listed in the catalog and referenced by cart and order lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
    pub id: ProductId,
    #[serde(default)]
    pub description: String,
    #[serde(alias = "price", default)]
    pub amount: Money,
    #[serde(default)]
    pub available_quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Zero-based page index.
    pub number: u32,
    pub total_pages: u32,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            number: 0,
            total_pages: 0,
        }
    }
}

/// The backend answers paginated endpoints either with a page object or,
/// on some deployments, a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum PageWire<T> {
    #[serde(rename_all = "camelCase")]
    Paged {
        content: Vec<T>,
        #[serde(default)]
        total_pages: u32,
        #[serde(default)]
        number: u32,
    },
    Bare(Vec<T>),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Page<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match PageWire::deserialize(deserializer)? {
            PageWire::Paged {
                content,
                total_pages,
                number,
            } => Self {
                items: content,
                number,
                total_pages,
            },
            PageWire::Bare(items) => Self {
                items,
                number: 0,
                total_pages: 1,
            },
        })
    }
}

/// A list that may arrive bare or wrapped in a page object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing<T>(pub Vec<T>);

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Listing<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Page::deserialize(deserializer).map(|page| Self(page.items))
    }
}

// =============================================================================
// Cart
// =============================================================================

/// One line of the user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Line identity, stable across quantity edits.
    pub id: CartLineId,
    pub product: ProductRef,
    pub price: Money,
    pub quantity: u32,
}

impl CartLine {
    /// `price * quantity`, unrounded.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.price.times(self.quantity)
    }
}

/// The full cart as last returned by `GET /cart`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<CartLine>,
}

impl CartSnapshot {
    /// Rounded display total.
    #[must_use]
    pub fn total(&self) -> Money {
        shopfront_core::display_total(self.items.iter().map(|l| (l.price, l.quantity)))
    }

    /// Sum of quantities, for the cart badge.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|l| l.quantity).sum()
    }

    /// Find a line by its identity.
    #[must_use]
    pub fn line(&self, id: CartLineId) -> Option<&CartLine> {
        self.items.iter().find(|l| l.id == id)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Orders
// =============================================================================

/// One immutable line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub product: ProductRef,
    pub price: Money,
    pub quantity: u32,
}

/// The account an order belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderOwner {
    #[serde(default)]
    pub id: Option<UserId>,
    pub email: Email,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// An order as returned by `/orders` and `/admin/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// Assigned by the backend once the order leaves `PENDING`.
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub order_number: Option<String>,
    pub status: OrderStatus,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub user: Option<OrderOwner>,
}

impl Order {
    /// Rounded display total; non-authoritative.
    #[must_use]
    pub fn total(&self) -> Money {
        shopfront_core::display_total(self.items.iter().map(|l| (l.price, l.quantity)))
    }

    /// Order number for display: cancelled orders show "Cancelled", orders
    /// without a number yet show "Pending".
    #[must_use]
    pub fn order_number_text(&self) -> String {
        if self.status.is_cancelled() {
            return "Cancelled".to_string();
        }
        self.order_number
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Pending".to_string())
    }
}

// =============================================================================
// Serde helpers
// =============================================================================

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept a string or a number and keep it as text.
fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        match Option::<serde_json::Value>::deserialize(deserializer)? {
            Some(serde_json::Value::String(s)) => Some(s),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        },
    )
}
