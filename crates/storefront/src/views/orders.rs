//! The user's order history.
//!
//! Order state transitions belong to the backend. This view only decides
//! which actions to offer for a status, asks for confirmation, sends the
//! request and re-fetches.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, instrument};

use shopfront_core::{Email, OrderId, OrderStatus};

use super::confirm::Confirmation;
use super::generation::Generation;
use crate::api::CommerceApi;
use crate::api::types::Order;
use crate::error::{Result, add_breadcrumb};
use crate::notice::Notice;

/// A mutating action a regular user may take on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    Confirm,
    Cancel,
}

impl OrderAction {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Confirm => "Confirm",
            Self::Cancel => "Cancel",
        }
    }
}

/// Actions offered for an order in `status`. Only pending orders have any.
#[must_use]
pub const fn actions_for(status: OrderStatus) -> &'static [OrderAction] {
    match status {
        OrderStatus::Pending => &[OrderAction::Confirm, OrderAction::Cancel],
        _ => &[],
    }
}

/// An order action awaiting confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderCommand {
    pub order: OrderId,
    pub action: OrderAction,
}

/// Observable order list state.
#[derive(Debug, Clone, Default)]
pub struct OrdersState {
    pub orders: Vec<Order>,
    /// Order opened in the detail view.
    pub selected: Option<Order>,
    pub loading: bool,
    pub notice: Option<Notice>,
}

/// Order history of the signed-in user.
pub struct OrdersView<A> {
    api: A,
    owner: Option<Email>,
    state: Mutex<OrdersState>,
    generation: Generation,
}

impl<A: CommerceApi> OrdersView<A> {
    #[must_use]
    pub fn new(api: A) -> Self {
        Self {
            api,
            owner: None,
            state: Mutex::new(OrdersState::default()),
            generation: Generation::new(),
        }
    }

    /// Only show orders whose owner has `email`.
    ///
    /// For backends that return more than the caller's own orders. This is a
    /// display filter; it does not keep anyone from reading the response.
    #[must_use]
    pub fn with_owner_filter(mut self, email: Email) -> Self {
        self.owner = Some(email);
        self
    }

    #[must_use]
    pub fn state(&self) -> OrdersState {
        self.lock_state().clone()
    }

    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.lock_state().orders.clone()
    }

    /// Fetch the order list.
    ///
    /// # Errors
    ///
    /// Returns the request error, which is also recorded as the notice.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<()> {
        let ticket = self.generation.begin();
        self.lock_state().loading = true;

        let result = self.api.list_orders().await;
        if !self.generation.is_current(ticket) {
            debug!("Discarding superseded order list");
            return Ok(());
        }

        let mut state = self.lock_state();
        state.loading = false;
        match result {
            Ok(orders) => {
                state.orders = orders.into_iter().filter(|o| self.owns(o)).collect();
                Ok(())
            }
            Err(err) => {
                state.notice = Some(err.notice("Could not load your orders"));
                Err(err)
            }
        }
    }

    /// Load one order into the detail view.
    ///
    /// # Errors
    ///
    /// Returns the request error, which is also recorded as the notice.
    pub async fn open_detail(&self, order: OrderId) -> Result<Order> {
        match self.api.get_order(order).await {
            Ok(detail) => {
                self.lock_state().selected = Some(detail.clone());
                Ok(detail)
            }
            Err(err) => {
                self.lock_state().notice = Some(err.notice("Could not load the order"));
                Err(err)
            }
        }
    }

    pub fn close_detail(&self) {
        self.lock_state().selected = None;
    }

    /// Ask to perform `action` on `order`.
    ///
    /// Returns `None` when the listed order does not offer that action.
    pub fn request(&self, order: OrderId, action: OrderAction) -> Option<Confirmation<OrderCommand>> {
        let state = self.lock_state();
        let listed = state.orders.iter().find(|o| o.id == order)?;
        if !actions_for(listed.status).contains(&action) {
            return None;
        }
        let prompt = match action {
            OrderAction::Confirm => format!("Confirm order #{}?", listed.id),
            OrderAction::Cancel => format!("Cancel order #{}? This cannot be undone.", listed.id),
        };
        Some(Confirmation::new(OrderCommand { order, action }, prompt))
    }

    /// Perform a confirmed action, then re-fetch the list.
    ///
    /// # Errors
    ///
    /// Returns the request error, which is also recorded as the notice.
    #[instrument(skip(self, confirmation), fields(order_id = %confirmation.action().order))]
    pub async fn confirm(&self, confirmation: Confirmation<OrderCommand>) -> Result<()> {
        let OrderCommand { order, action } = confirmation.into_action();
        add_breadcrumb(
            "orders",
            action.label(),
            Some(&[("order_id", order.to_string().as_str())]),
        );

        let (result, context, success) = match action {
            OrderAction::Confirm => (
                self.api.confirm_order(order).await,
                "Could not confirm the order",
                "Order confirmed",
            ),
            OrderAction::Cancel => (
                self.api.cancel_order(order).await,
                "Could not cancel the order",
                "Order cancelled",
            ),
        };

        match result {
            Ok(()) => {
                self.lock_state().notice = Some(Notice::success(success));
                self.refresh().await
            }
            Err(err) => {
                self.lock_state().notice = Some(err.notice(context));
                Err(err)
            }
        }
    }

    pub fn dismiss_notice(&self) {
        self.lock_state().notice = None;
    }

    fn owns(&self, order: &Order) -> bool {
        let Some(owner) = &self.owner else {
            return true;
        };
        order
            .user
            .as_ref()
            .is_some_and(|u| u.email.as_str().eq_ignore_ascii_case(owner.as_str()))
    }

    fn lock_state(&self) -> MutexGuard<'_, OrdersState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
