//! Pricing and checkout rules injected alongside the catalog tables.
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;

/// Errors raised when pricing rule invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingRulesError {
    #[error("minimum dimension {min} exceeds maximum {max}")]
    DimensionBounds { min: Decimal, max: Decimal },
    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: Decimal },
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: Decimal },
    #[error("tax rate must be between 0 and 1 (got {value})")]
    TaxRateRange { value: Decimal },
    #[error("production window {production} days exceeds delivery window {delivery} days")]
    DeliveryWindow { production: u32, delivery: u32 },
}

/// Rate card used by the pricing calculator and checkout totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingRules {
    #[serde(default = "PricingRules::default_base_rate")]
    pub base_rate_per_sqm: Decimal,
    #[serde(default = "PricingRules::default_area_divisor")]
    pub area_divisor: Decimal,
    #[serde(default = "PricingRules::default_min_dimension")]
    pub min_dimension: Decimal,
    #[serde(default = "PricingRules::default_max_dimension")]
    pub max_dimension: Decimal,
    #[serde(default = "PricingRules::default_free_shipping_threshold")]
    pub free_shipping_threshold: Decimal,
    #[serde(default = "PricingRules::default_flat_shipping")]
    pub flat_shipping: Decimal,
    #[serde(default = "PricingRules::default_tax_rate")]
    pub tax_rate: Decimal,
    #[serde(default = "PricingRules::default_production_days")]
    pub production_days: u32,
    #[serde(default = "PricingRules::default_delivery_days")]
    pub delivery_days: u32,
}

impl PricingRules {
    const fn default_base_rate() -> Decimal {
        constants::BASE_RATE_PER_SQM
    }

    const fn default_area_divisor() -> Decimal {
        constants::AREA_DIVISOR
    }

    const fn default_min_dimension() -> Decimal {
        constants::MIN_DIMENSION
    }

    const fn default_max_dimension() -> Decimal {
        constants::MAX_DIMENSION
    }

    const fn default_free_shipping_threshold() -> Decimal {
        constants::FREE_SHIPPING_THRESHOLD
    }

    const fn default_flat_shipping() -> Decimal {
        constants::FLAT_SHIPPING
    }

    const fn default_tax_rate() -> Decimal {
        constants::TAX_RATE
    }

    const fn default_production_days() -> u32 {
        constants::PRODUCTION_DAYS
    }

    const fn default_delivery_days() -> u32 {
        constants::DELIVERY_DAYS
    }

    /// Whether a single dimension lies inside the inclusive accepted range.
    #[must_use]
    pub fn dimension_in_range(&self, value: Decimal) -> bool {
        value >= self.min_dimension && value <= self.max_dimension
    }

    /// Check the rule invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), PricingRulesError> {
        if self.min_dimension > self.max_dimension {
            return Err(PricingRulesError::DimensionBounds {
                min: self.min_dimension,
                max: self.max_dimension,
            });
        }
        if self.area_divisor <= Decimal::ZERO {
            return Err(PricingRulesError::NonPositive {
                field: "area_divisor",
                value: self.area_divisor,
            });
        }
        if self.min_dimension <= Decimal::ZERO {
            return Err(PricingRulesError::NonPositive {
                field: "min_dimension",
                value: self.min_dimension,
            });
        }
        for (field, value) in [
            ("base_rate_per_sqm", self.base_rate_per_sqm),
            ("free_shipping_threshold", self.free_shipping_threshold),
            ("flat_shipping", self.flat_shipping),
        ] {
            if value < Decimal::ZERO {
                return Err(PricingRulesError::Negative { field, value });
            }
        }
        if self.tax_rate < Decimal::ZERO || self.tax_rate > Decimal::ONE {
            return Err(PricingRulesError::TaxRateRange {
                value: self.tax_rate,
            });
        }
        if self.production_days > self.delivery_days {
            return Err(PricingRulesError::DeliveryWindow {
                production: self.production_days,
                delivery: self.delivery_days,
            });
        }
        Ok(())
    }
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            base_rate_per_sqm: Self::default_base_rate(),
            area_divisor: Self::default_area_divisor(),
            min_dimension: Self::default_min_dimension(),
            max_dimension: Self::default_max_dimension(),
            free_shipping_threshold: Self::default_free_shipping_threshold(),
            flat_shipping: Self::default_flat_shipping(),
            tax_rate: Self::default_tax_rate(),
            production_days: Self::default_production_days(),
            delivery_days: Self::default_delivery_days(),
        }
    }
}
