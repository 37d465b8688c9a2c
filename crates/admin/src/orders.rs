//! Order administration: every customer's orders, with forced status changes.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, instrument};

use shopfront_core::{OrderId, OrderStatus};
use shopfront_storefront::SessionHandle;
use shopfront_storefront::api::types::Order;
use shopfront_storefront::error::add_breadcrumb;
use shopfront_storefront::notice::Notice;
use shopfront_storefront::views::{Confirmation, Generation};

use crate::access::{StaffRole, status_options};
use crate::api::AdminApi;
use crate::error::{AdminError, Result};

/// A status change awaiting confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub order: OrderId,
    pub status: OrderStatus,
}

/// Observable admin order list state.
#[derive(Debug, Clone, Default)]
pub struct AdminOrdersState {
    pub orders: Vec<Order>,
    pub selected: Option<Order>,
    pub loading: bool,
    pub notice: Option<Notice>,
}

/// The order administration screen.
pub struct AdminOrdersView<A> {
    api: A,
    role: Option<StaffRole>,
    state: Mutex<AdminOrdersState>,
    generation: Generation,
}

impl<A: AdminApi> AdminOrdersView<A> {
    /// Create the view for the staff member signed in to `session`.
    #[must_use]
    pub fn new(api: A, session: &SessionHandle) -> Self {
        Self {
            api,
            role: StaffRole::from_session(session),
            state: Mutex::new(AdminOrdersState::default()),
            generation: Generation::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> AdminOrdersState {
        self.lock_state().clone()
    }

    /// Orders that are not cancelled, in backend order.
    #[must_use]
    pub fn active_orders(&self) -> Vec<Order> {
        self.partition(false)
    }

    #[must_use]
    pub fn cancelled_orders(&self) -> Vec<Order> {
        self.partition(true)
    }

    /// Statuses the signed-in role may pick; empty for non-staff.
    #[must_use]
    pub fn status_options(&self) -> Vec<OrderStatus> {
        self.role.map(status_options).unwrap_or_default()
    }

    /// Fetch every order.
    ///
    /// # Errors
    ///
    /// Returns `Denied` for non-staff sessions, or the request error.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<()> {
        if self.role.is_none() {
            return Err(AdminError::Denied("list orders"));
        }
        let ticket = self.generation.begin();
        self.lock_state().loading = true;

        let result = self.api.list_all_orders().await;
        if !self.generation.is_current(ticket) {
            debug!("Discarding superseded admin order list");
            return Ok(());
        }

        let mut state = self.lock_state();
        state.loading = false;
        match result {
            Ok(orders) => {
                state.orders = orders;
                Ok(())
            }
            Err(err) => {
                state.notice = Some(err.notice("Could not load orders"));
                Err(err.into())
            }
        }
    }

    /// Load one order into the detail view.
    ///
    /// # Errors
    ///
    /// Returns `Denied` for non-staff sessions, or the request error.
    pub async fn open_detail(&self, order: OrderId) -> Result<Order> {
        if self.role.is_none() {
            return Err(AdminError::Denied("view orders"));
        }
        match self.api.get_any_order(order).await {
            Ok(detail) => {
                self.lock_state().selected = Some(detail.clone());
                Ok(detail)
            }
            Err(err) => {
                self.lock_state().notice = Some(err.notice("Could not load the order"));
                Err(err.into())
            }
        }
    }

    /// Ask to move `order` to `status`.
    ///
    /// # Errors
    ///
    /// Returns `Denied` when the role may not select `status`, or
    /// `NotApplicable` when the order is not listed.
    pub fn request_status_change(
        &self,
        order: OrderId,
        status: OrderStatus,
    ) -> Result<Confirmation<StatusChange>> {
        let Some(role) = self.role else {
            return Err(AdminError::Denied("change order status"));
        };
        if !role.can_set_status(status) {
            return Err(AdminError::Denied("cancel orders"));
        }
        let state = self.lock_state();
        let Some(listed) = state.orders.iter().find(|o| o.id == order) else {
            return Err(AdminError::NotApplicable(format!("Order {order} is not listed")));
        };
        Ok(Confirmation::new(
            StatusChange { order, status },
            format!(
                "Change order #{} from {} to {}?",
                listed.id,
                listed.status.label(),
                status.label()
            ),
        ))
    }

    /// Apply a confirmed status change, then re-fetch the list.
    ///
    /// # Errors
    ///
    /// Returns `Denied` when the role may not select the status, or the
    /// request error.
    #[instrument(skip(self, confirmation), fields(order_id = %confirmation.action().order))]
    pub async fn confirm(&self, confirmation: Confirmation<StatusChange>) -> Result<()> {
        let StatusChange { order, status } = confirmation.into_action();
        if !self.role.is_some_and(|r| r.can_set_status(status)) {
            return Err(AdminError::Denied("change order status"));
        }
        add_breadcrumb(
            "admin.orders",
            "Changed order status",
            Some(&[
                ("order_id", order.to_string().as_str()),
                ("status", status.as_str()),
            ]),
        );

        if let Err(err) = self.api.set_order_status(order, status).await {
            self.lock_state().notice = Some(err.notice("Could not change the order status"));
            return Err(err.into());
        }

        info!(order_id = %order, status = %status, "Order status changed");
        self.lock_state().notice = Some(Notice::success(format!(
            "Order #{order} is now {}",
            status.label()
        )));
        self.refresh().await
    }

    pub fn dismiss_notice(&self) {
        self.lock_state().notice = None;
    }

    fn partition(&self, cancelled: bool) -> Vec<Order> {
        self.lock_state()
            .orders
            .iter()
            .filter(|o| o.status.is_cancelled() == cancelled)
            .cloned()
            .collect()
    }

    fn lock_state(&self) -> MutexGuard<'_, AdminOrdersState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{FakeAdminApi, order, staff_session};
    use reqwest::StatusCode;

    fn board() -> FakeAdminApi {
        FakeAdminApi::new().with_orders(vec![
            order(1, OrderStatus::Pending),
            order(2, OrderStatus::Shipped),
            order(3, OrderStatus::Cancelled),
        ])
    }

    #[tokio::test]
    async fn test_orders_split_active_and_cancelled() {
        let view = AdminOrdersView::new(board(), &staff_session("WORKER"));
        view.refresh().await.unwrap();

        let active: Vec<_> = view.active_orders().iter().map(|o| o.id).collect();
        assert_eq!(active, vec![OrderId::new(1), OrderId::new(2)]);
        assert_eq!(view.cancelled_orders()[0].id, OrderId::new(3));
        assert_eq!(view.cancelled_orders()[0].order_number_text(), "Cancelled");
    }

    #[tokio::test]
    async fn test_worker_cannot_cancel() {
        let api = board();
        let view = AdminOrdersView::new(api.clone(), &staff_session("WORKER"));
        view.refresh().await.unwrap();

        assert!(!view.status_options().contains(&OrderStatus::Cancelled));
        assert!(matches!(
            view.request_status_change(OrderId::new(1), OrderStatus::Cancelled),
            Err(AdminError::Denied(_))
        ));
        assert!(view.request_status_change(OrderId::new(1), OrderStatus::Processing).is_ok());
    }

    #[tokio::test]
    async fn test_admin_status_change_refetches() {
        let api = board();
        let view = AdminOrdersView::new(api.clone(), &staff_session("ADMIN"));
        view.refresh().await.unwrap();
        api.clear_calls();

        let pending = view.request_status_change(OrderId::new(1), OrderStatus::Cancelled).unwrap();
        assert_eq!(pending.prompt(), "Change order #1 from Pending to Cancelled?");
        view.confirm(pending).await.unwrap();

        assert_eq!(
            api.calls(),
            vec!["PUT /admin/orders/1/status?newStatus=CANCELLED", "GET /admin/orders"]
        );
        assert_eq!(view.cancelled_orders().len(), 2);
    }

    #[tokio::test]
    async fn test_customer_is_denied() {
        let api = board();
        let view = AdminOrdersView::new(api.clone(), &staff_session("USER"));
        assert!(view.status_options().is_empty());
        assert!(matches!(view.refresh().await, Err(AdminError::Denied(_))));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_change_keeps_list() {
        let api = board();
        let view = AdminOrdersView::new(api.clone(), &staff_session("ADMIN"));
        view.refresh().await.unwrap();
        api.fail("set_order_status", StatusCode::BAD_GATEWAY);

        let pending = view.request_status_change(OrderId::new(2), OrderStatus::Delivered).unwrap();
        assert!(view.confirm(pending).await.is_err());
        assert_eq!(view.active_orders()[1].status, OrderStatus::Shipped);
        assert_eq!(
            view.state().notice.unwrap().message,
            "Could not change the order status"
        );
    }

    #[tokio::test]
    async fn test_detail() {
        let view = AdminOrdersView::new(board(), &staff_session("WORKER"));
        let detail = view.open_detail(OrderId::new(2)).await.unwrap();
        assert_eq!(detail.total().to_string(), "$10.00");
        assert_eq!(view.state().selected.unwrap().order_number_text(), "ORD-0002");
    }
}
