//! Order finalization and the confirmation record.
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::cart::{Cart, CartItem};
use crate::checkout::CustomerInfo;
use crate::constants::{ORDER_ID_LEN, ORDER_ID_PREFIX};
use crate::error::CheckoutError;
use crate::rules::PricingRules;
use crate::totals::CheckoutTotals;

/// Human-facing order reference such as `ORD-1A2B3C4D`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(String);

impl OrderId {
    /// Derive a reference from a UUID: prefix plus its first hex characters, uppercased.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        let hex = uuid.simple().to_string();
        let short: String = hex.chars().take(ORDER_ID_LEN).collect();
        Self(format!("{ORDER_ID_PREFIX}{}", short.to_uppercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity and creation time for an order about to be placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderStamp {
    pub id: OrderId,
    pub placed_at: DateTime<Utc>,
}

impl OrderStamp {
    /// Fresh random reference stamped with the current time.
    #[must_use]
    pub fn now() -> Self {
        Self {
            id: OrderId::from_uuid(Uuid::new_v4()),
            placed_at: Utc::now(),
        }
    }

    /// Deterministic stamp for replays and tests.
    #[must_use]
    pub fn fixed(uuid: Uuid, placed_at: DateTime<Utc>) -> Self {
        Self {
            id: OrderId::from_uuid(uuid),
            placed_at,
        }
    }
}

/// Fulfilment milestones shown on the confirmation page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTimeline {
    pub placed: DateTime<Utc>,
    pub production_complete: DateTime<Utc>,
    pub estimated_delivery: DateTime<Utc>,
}

/// Immutable record of a placed order.
///
/// Subtotal, shipping, tax and total are each captured at placement so the
/// confirmation never has to reconstruct one figure from another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub items: Vec<CartItem>,
    pub customer: CustomerInfo,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub placed_at: DateTime<Utc>,
}

impl Order {
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(CartItem::quantity).sum()
    }

    #[must_use]
    pub const fn totals(&self) -> CheckoutTotals {
        CheckoutTotals {
            subtotal: self.subtotal,
            shipping: self.shipping,
            tax: self.tax,
            total: self.total,
        }
    }

    #[must_use]
    pub fn timeline(&self, rules: &PricingRules) -> OrderTimeline {
        OrderTimeline {
            placed: self.placed_at,
            production_complete: self.placed_at + Duration::days(i64::from(rules.production_days)),
            estimated_delivery: self.placed_at + Duration::days(i64::from(rules.delivery_days)),
        }
    }
}

/// Snapshot the cart into an order and hand back an emptied cart.
///
/// The returned cart continues the ID sequence of the one consumed.
///
/// # Errors
///
/// Returns [`CheckoutError::EmptyCart`] when there is nothing to order.
pub fn finalize(
    cart: &Cart,
    customer: &CustomerInfo,
    rules: &PricingRules,
    stamp: OrderStamp,
) -> Result<(Order, Cart), CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let totals = CheckoutTotals::from_subtotal(cart.subtotal(), rules);
    let order = Order {
        id: stamp.id,
        items: cart.items().to_vec(),
        customer: customer.clone(),
        subtotal: totals.subtotal,
        shipping: totals.shipping,
        tax: totals.tax,
        total: totals.total,
        placed_at: stamp.placed_at,
    };
    log::info!(
        "order {} placed: {} items, total {}",
        order.id,
        order.item_count(),
        order.total
    );
    Ok((order, cart.emptied()))
}
