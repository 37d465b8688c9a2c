//! Checkout: initiate an order from the cart, then confirm it.

use tracing::{info, instrument};

use shopfront_core::OrderId;

use super::cart::CartStore;
use crate::api::CommerceApi;
use crate::api::types::Order;
use crate::error::{ClientError, Result, add_breadcrumb};
use crate::notice::Notice;
use crate::session::SessionHandle;
use crate::validation::ValidationError;

/// The checkout page.
pub struct CheckoutView<A> {
    api: A,
    cart: CartStore<A>,
    registered_address: Option<String>,
    address: String,
    use_registered: bool,
    initiated: Option<Order>,
    notice: Option<Notice>,
}

impl<A: CommerceApi> CheckoutView<A> {
    /// Start checkout, defaulting the address to the one on the profile.
    #[must_use]
    pub fn new(api: A, cart: CartStore<A>, session: &SessionHandle) -> Self {
        let registered_address = session
            .profile()
            .and_then(|p| p.shipping_address)
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());

        Self {
            api,
            cart,
            address: registered_address.clone().unwrap_or_default(),
            use_registered: registered_address.is_some(),
            registered_address,
            initiated: None,
            notice: None,
        }
    }

    /// Address the order will ship to.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    #[must_use]
    pub const fn uses_registered_address(&self) -> bool {
        self.use_registered
    }

    /// Switch between the profile's address and a typed one.
    ///
    /// Has no effect when the profile has no address.
    pub fn use_registered_address(&mut self, enabled: bool) {
        match (&self.registered_address, enabled) {
            (Some(registered), true) => {
                self.address.clone_from(registered);
                self.use_registered = true;
            }
            (_, false) => {
                self.use_registered = false;
            }
            (None, true) => {}
        }
    }

    /// Type a different address.
    pub fn set_address(&mut self, address: impl Into<String>) {
        self.address = address.into();
        self.use_registered = false;
    }

    /// The order created by [`initiate`](Self::initiate), awaiting confirmation.
    #[must_use]
    pub const fn initiated(&self) -> Option<&Order> {
        self.initiated.as_ref()
    }

    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Create a pending order from the cart.
    ///
    /// # Errors
    ///
    /// Returns `Validation` without calling the backend if the address is
    /// blank, or the request error.
    #[instrument(skip(self))]
    pub async fn initiate(&mut self) -> Result<&Order> {
        let address = self.address.trim().to_string();
        if address.is_empty() {
            return Err(self.fail(ValidationError::ShippingAddressRequired.into(), ""));
        }

        add_breadcrumb("checkout", "Initiated order", None);
        match self.api.initiate_order(&address).await {
            Ok(order) => {
                info!(order_id = %order.id, "Order initiated");
                self.notice = None;
                Ok(&*self.initiated.insert(order))
            }
            Err(err) => Err(self.fail(err, "Could not start the order")),
        }
    }

    /// Confirm the initiated order and reload the cart.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if nothing was initiated, or the request error.
    #[instrument(skip(self))]
    pub async fn confirm(&mut self) -> Result<OrderId> {
        let Some(order) = self.initiated.as_ref().map(|o| o.id) else {
            return Err(self.fail(ValidationError::NoOrderInitiated.into(), ""));
        };

        add_breadcrumb(
            "checkout",
            "Confirmed order",
            Some(&[("order_id", order.to_string().as_str())]),
        );
        if let Err(err) = self.api.confirm_order(order).await {
            return Err(self.fail(err, "Could not confirm the order"));
        }

        info!(order_id = %order, "Order confirmed");
        self.initiated = None;
        self.notice = Some(Notice::success("Order confirmed"));
        self.cart.refresh().await?;
        Ok(order)
    }

    fn fail(&mut self, err: ClientError, context: &str) -> ClientError {
        self.notice = Some(err.notice(context));
        err
    }
}
