//! Single-user storefront session binding the configurator, cart and checkout.
use std::sync::Arc;

use crate::cart::{Cart, CartAction, CartItemId};
use crate::catalog::Catalog;
use crate::checkout::{CheckoutAction, CheckoutFlow, CheckoutStep};
use crate::configuration::{ConfigAction, Configuration};
use crate::error::{CheckoutError, StoreError};
use crate::order::{Order, OrderId, OrderStamp};
use crate::pricing::{self, PriceQuote};
use crate::totals::CartSummary;

/// Discrete user intents the session understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreAction {
    Configure(ConfigAction),
    AddToCart,
    Cart(CartAction),
    BeginCheckout,
    Checkout(CheckoutAction),
    LeaveCheckout,
    PlaceOrder,
    StartOver,
}

/// What changed after an accepted action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    ConfigurationChanged { progress: u8 },
    ItemAdded(CartItemId),
    CartChanged(CartSummary),
    CheckoutStep(CheckoutStep),
    CheckoutClosed,
    OrderPlaced(OrderId),
    Restarted,
}

/// Session state. Every rejected action leaves it exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontSession {
    catalog: Arc<Catalog>,
    configuration: Configuration,
    cart: Cart,
    checkout: Option<CheckoutFlow>,
    last_order: Option<Order>,
}

impl StorefrontSession {
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            configuration: Configuration::default(),
            cart: Cart::new(),
            checkout: None,
            last_order: None,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub const fn checkout(&self) -> Option<&CheckoutFlow> {
        self.checkout.as_ref()
    }

    #[must_use]
    pub fn checkout_step(&self) -> Option<CheckoutStep> {
        self.checkout.as_ref().map(CheckoutFlow::step)
    }

    /// The most recently confirmed order, for the confirmation page.
    #[must_use]
    pub const fn last_order(&self) -> Option<&Order> {
        self.last_order.as_ref()
    }

    #[must_use]
    pub fn progress(&self) -> u8 {
        self.configuration.progress()
    }

    #[must_use]
    pub fn quote(&self) -> PriceQuote {
        pricing::quote(&self.configuration, &self.catalog)
    }

    #[must_use]
    pub fn can_add_to_cart(&self) -> bool {
        self.configuration.can_add_to_cart(&self.catalog)
    }

    #[must_use]
    pub fn cart_summary(&self) -> CartSummary {
        CartSummary::from_cart(&self.cart, &self.catalog.rules)
    }

    /// Apply one user action. Orders placed here are stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns the rejection category; no state changes on error.
    pub fn dispatch(&mut self, action: StoreAction) -> Result<StoreEvent, StoreError> {
        let result = self.apply(action);
        if let Err(err) = &result {
            log::trace!("action rejected: {err}");
        }
        result
    }

    fn apply(&mut self, action: StoreAction) -> Result<StoreEvent, StoreError> {
        match action {
            StoreAction::Configure(edit) => {
                self.configuration = self.configuration.clone().reduce(edit);
                Ok(StoreEvent::ConfigurationChanged {
                    progress: self.progress(),
                })
            }
            StoreAction::AddToCart => {
                let id = self.cart.add_item(&self.configuration, &self.catalog)?;
                Ok(StoreEvent::ItemAdded(id))
            }
            StoreAction::Cart(edit) => {
                self.cart = self.cart.reduce(edit, &self.catalog)?;
                Ok(StoreEvent::CartChanged(self.cart_summary()))
            }
            StoreAction::BeginCheckout => {
                if self.checkout.is_some() {
                    return Err(StoreError::AlreadyInCheckout);
                }
                if self.cart.is_empty() {
                    return Err(CheckoutError::EmptyCart.into());
                }
                let flow = CheckoutFlow::new();
                let step = flow.step();
                self.checkout = Some(flow);
                log::debug!("checkout opened with {} items", self.cart.item_count());
                Ok(StoreEvent::CheckoutStep(step))
            }
            StoreAction::Checkout(edit) => {
                let flow = self.checkout.as_ref().ok_or(StoreError::NotInCheckout)?;
                let next = flow.apply(edit)?;
                let step = next.step();
                self.checkout = Some(next);
                Ok(StoreEvent::CheckoutStep(step))
            }
            StoreAction::LeaveCheckout => {
                self.checkout.take().ok_or(StoreError::NotInCheckout)?;
                Ok(StoreEvent::CheckoutClosed)
            }
            StoreAction::PlaceOrder => self.place_order(OrderStamp::now()),
            StoreAction::StartOver => {
                self.configuration = Configuration::default();
                self.checkout = None;
                self.last_order = None;
                Ok(StoreEvent::Restarted)
            }
        }
    }

    /// Place the order with an explicit identity and timestamp.
    ///
    /// # Errors
    ///
    /// Fails when no checkout is open, outside the payment step, with
    /// incomplete card details, or on an empty cart.
    pub fn place_order(&mut self, stamp: OrderStamp) -> Result<StoreEvent, StoreError> {
        let flow = self.checkout.as_ref().ok_or(StoreError::NotInCheckout)?;
        let (order, cart) = flow.place_order(&self.cart, &self.catalog.rules, stamp)?;
        let id = order.id.clone();
        self.cart = cart;
        self.checkout = None;
        self.last_order = Some(order);
        Ok(StoreEvent::OrderPlaced(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::{CustomerField, PaymentField};
    use crate::error::ValidationError;
    use rust_decimal_macros::dec;

    fn session() -> StorefrontSession {
        StorefrontSession::new(Arc::new(Catalog::load_from_static().unwrap()))
    }

    fn configure(session: &mut StorefrontSession) {
        for edit in [
            ConfigAction::SetWidth(Some(dec!(120))),
            ConfigAction::SetHeight(Some(dec!(180))),
            ConfigAction::SelectFabric("Blackout".into()),
            ConfigAction::SelectColor("Charcoal".into()),
            ConfigAction::SelectMounting("Inside Mount".into()),
            ConfigAction::SelectControl("Cordless".into()),
            ConfigAction::SetQuantity(2),
        ] {
            session.dispatch(StoreAction::Configure(edit)).unwrap();
        }
    }

    #[test]
    fn add_to_cart_keeps_draft() {
        let mut session = session();
        configure(&mut session);
        assert_eq!(session.progress(), 100);
        assert!(session.can_add_to_cart());
        assert_eq!(session.quote().total, dec!(460.4));
        let draft = session.configuration().clone();

        let event = session.dispatch(StoreAction::AddToCart).unwrap();
        assert!(matches!(event, StoreEvent::ItemAdded(_)));
        assert_eq!(session.configuration(), &draft);
        assert_eq!(session.progress(), 100);
        assert_eq!(session.cart().item_count(), 2);
        assert_eq!(session.cart_summary().shipping, dec!(0));

        session.dispatch(StoreAction::AddToCart).unwrap();
        assert_eq!(session.cart().line_count(), 2);
        assert_eq!(session.cart().item_count(), 4);
    }

    #[test]
    fn both_add_paths_leave_draft_alone() {
        let mut via_session = session();
        configure(&mut via_session);
        let mut via_cart = via_session.clone();

        via_session.dispatch(StoreAction::AddToCart).unwrap();
        let draft = via_cart.configuration().clone();
        via_cart
            .dispatch(StoreAction::Cart(CartAction::Add(draft)))
            .unwrap();

        assert_eq!(via_session.configuration(), via_cart.configuration());
        assert_eq!(via_session.cart(), via_cart.cart());
    }

    #[test]
    fn rejected_add_keeps_draft_and_cart() {
        let mut session = session();
        configure(&mut session);
        session
            .dispatch(StoreAction::Configure(ConfigAction::SetWidth(Some(dec!(20)))))
            .unwrap();
        let draft = session.configuration().clone();
        let err = session.dispatch(StoreAction::AddToCart).unwrap_err();
        assert_eq!(err.validation(), Some(ValidationError::DimensionOutOfRange));
        assert_eq!(session.configuration(), &draft);
        assert!(session.cart().is_empty());
    }

    #[test]
    fn checkout_gates() {
        let mut session = session();
        assert_eq!(
            session.dispatch(StoreAction::BeginCheckout),
            Err(StoreError::Checkout(CheckoutError::EmptyCart))
        );
        assert_eq!(
            session.dispatch(StoreAction::Checkout(CheckoutAction::ContinueToPayment)),
            Err(StoreError::NotInCheckout)
        );
        assert_eq!(
            session.dispatch(StoreAction::PlaceOrder),
            Err(StoreError::NotInCheckout)
        );

        configure(&mut session);
        session.dispatch(StoreAction::AddToCart).unwrap();
        assert_eq!(
            session.dispatch(StoreAction::BeginCheckout),
            Ok(StoreEvent::CheckoutStep(CheckoutStep::Shipping))
        );
        assert_eq!(
            session.dispatch(StoreAction::BeginCheckout),
            Err(StoreError::AlreadyInCheckout)
        );
        assert_eq!(
            session.dispatch(StoreAction::LeaveCheckout),
            Ok(StoreEvent::CheckoutClosed)
        );
        assert_eq!(session.checkout_step(), None);
    }

    #[test]
    fn full_purchase_records_order_and_empties_cart() {
        let mut session = session();
        configure(&mut session);
        session.dispatch(StoreAction::AddToCart).unwrap();
        session.dispatch(StoreAction::BeginCheckout).unwrap();
        for (field, value) in [
            (CustomerField::Name, "Ada"),
            (CustomerField::Email, "ada@example.com"),
            (CustomerField::Phone, "555"),
            (CustomerField::Address, "1 Main St"),
            (CustomerField::City, "Springfield"),
            (CustomerField::PostalCode, "12345"),
        ] {
            session
                .dispatch(StoreAction::Checkout(CheckoutAction::UpdateCustomer(
                    field,
                    value.into(),
                )))
                .unwrap();
        }
        session
            .dispatch(StoreAction::Checkout(CheckoutAction::ContinueToPayment))
            .unwrap();
        for (field, value) in [
            (PaymentField::CardNumber, "4242 4242 4242 4242"),
            (PaymentField::Expiry, "04/29"),
            (PaymentField::Cvc, "424"),
        ] {
            session
                .dispatch(StoreAction::Checkout(CheckoutAction::UpdatePayment(
                    field,
                    value.into(),
                )))
                .unwrap();
        }
        let event = session.dispatch(StoreAction::PlaceOrder).unwrap();
        let order = session.last_order().unwrap();
        assert_eq!(event, StoreEvent::OrderPlaced(order.id.clone()));
        assert_eq!(order.total, dec!(506.44));
        assert!(session.cart().is_empty());
        assert_eq!(session.checkout_step(), None);

        session.dispatch(StoreAction::StartOver).unwrap();
        assert!(session.last_order().is_none());
    }
}
