//! Shipping, tax and grand total derived from a cart subtotal.
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::rules::PricingRules;

/// Flat shipping below the free-shipping threshold, zero at or above it.
#[must_use]
pub fn shipping(subtotal: Decimal, rules: &PricingRules) -> Decimal {
    if subtotal >= rules.free_shipping_threshold {
        Decimal::ZERO
    } else {
        rules.flat_shipping
    }
}

#[must_use]
pub fn tax(subtotal: Decimal, rules: &PricingRules) -> Decimal {
    subtotal * rules.tax_rate
}

#[must_use]
pub fn total(subtotal: Decimal, rules: &PricingRules) -> Decimal {
    subtotal + shipping(subtotal, rules) + tax(subtotal, rules)
}

/// How much more the customer must spend to unlock free shipping.
#[must_use]
pub fn free_shipping_remaining(subtotal: Decimal, rules: &PricingRules) -> Decimal {
    (rules.free_shipping_threshold - subtotal).max(Decimal::ZERO)
}

/// Surcharges for a single subtotal, computed together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutTotals {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl CheckoutTotals {
    #[must_use]
    pub fn from_subtotal(subtotal: Decimal, rules: &PricingRules) -> Self {
        let shipping = shipping(subtotal, rules);
        let tax = tax(subtotal, rules);
        Self {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }
}

/// Cart sidebar and checkout summary. Never stored; build it when needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSummary {
    pub line_count: usize,
    pub item_count: u32,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub free_shipping_remaining: Decimal,
}

impl CartSummary {
    #[must_use]
    pub fn from_cart(cart: &Cart, rules: &PricingRules) -> Self {
        let totals = CheckoutTotals::from_subtotal(cart.subtotal(), rules);
        Self {
            line_count: cart.line_count(),
            item_count: cart.item_count(),
            subtotal: totals.subtotal,
            shipping: totals.shipping,
            tax: totals.tax,
            total: totals.total,
            free_shipping_remaining: free_shipping_remaining(totals.subtotal, rules),
        }
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
    pub fn qualifies_for_free_shipping(&self) -> bool {
        self.free_shipping_remaining == Decimal::ZERO
    }
}
