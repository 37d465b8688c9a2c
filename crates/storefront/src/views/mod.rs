//! View models for the storefront pages.
//!
//! Each view holds the state one page renders and turns user actions into
//! backend calls. Failures never escape a view silently: every operation
//! returns the error and records a [`Notice`](crate::notice::Notice) for it.
//!
//! # Views
//!
//! - `cart` - Shared cart store and the cart page
//! - `catalog` - Product listing/search with per-product cart controls
//! - `orders` - Order history with status-gated actions
//! - `checkout` - Initiate and confirm an order
//! - `navigation` - Role-derived navigation entries

pub mod cart;
pub mod catalog;
pub mod checkout;
mod confirm;
mod generation;
pub mod navigation;
pub mod orders;

pub use cart::{AddedProductsIndex, CartPage, CartPosition, CartState, CartStore};
pub use catalog::{ButtonLabel, CartButton, CatalogState, CatalogView, button_state};
pub use checkout::CheckoutView;
pub use confirm::Confirmation;
pub use generation::{Generation, Ticket};
pub use navigation::{NavEntry, Navigation, navigation, session_roles};
pub use orders::{OrderAction, OrderCommand, OrdersState, OrdersView, actions_for};
