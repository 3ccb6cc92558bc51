//! Centralized pricing and checkout constants for the storefront engine.
//!
//! These values seed `PricingRules` whenever a catalog document omits a rule,
//! and fix the quantity bounds that every configuration and cart line obeys.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// Pricing ------------------------------------------------------------------
pub const BASE_RATE_PER_SQM: Decimal = dec!(80);
/// Square centimetres per square metre.
pub const AREA_DIVISOR: Decimal = dec!(10000);
pub const MIN_DIMENSION: Decimal = dec!(30);
pub const MAX_DIMENSION: Decimal = dec!(300);

// Quantity -----------------------------------------------------------------
pub const MIN_QUANTITY: u32 = 1;
pub const MAX_QUANTITY: u32 = 50;

// Checkout -----------------------------------------------------------------
pub const FREE_SHIPPING_THRESHOLD: Decimal = dec!(200);
pub const FLAT_SHIPPING: Decimal = dec!(25);
pub const TAX_RATE: Decimal = dec!(0.10);

// Fulfilment ---------------------------------------------------------------
pub const PRODUCTION_DAYS: u32 = 5;
pub const DELIVERY_DAYS: u32 = 7;

// Identifiers and patterns -------------------------------------------------
pub(crate) const ORDER_ID_PREFIX: &str = "ORD-";
pub(crate) const ORDER_ID_LEN: usize = 8;
pub(crate) const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

// Progress -----------------------------------------------------------------
pub(crate) const PROGRESS_GATE_POINTS: u8 = 25;
