//! User-input error categories surfaced to the presentation layer.
//!
//! Every variant is recoverable: the rejected action leaves state untouched
//! and the user corrects input and resubmits.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::checkout::CheckoutStep;

/// Field-level validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("width and height are required to continue")]
    MissingDimensions,
    #[error("dimensions must be between the minimum and maximum size")]
    DimensionOutOfRange,
    #[error("fabric, color, mounting and control must all be selected")]
    IncompleteSelection,
    #[error("all shipping fields and a valid email address are required")]
    IncompleteShippingInfo,
    #[error("card number, expiry and CVC are required")]
    IncompletePaymentInfo,
}

impl ValidationError {
    /// Short machine-readable key for notification lookups.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::MissingDimensions => "missing_dimensions",
            Self::DimensionOutOfRange => "dimension_out_of_range",
            Self::IncompleteSelection => "incomplete_selection",
            Self::IncompleteShippingInfo => "incomplete_shipping_info",
            Self::IncompletePaymentInfo => "incomplete_payment_info",
        }
    }
}

/// Rejections raised by the checkout step gate and order finalizer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("action requires the {expected} step but checkout is at {actual}")]
    WrongStep {
        expected: CheckoutStep,
        actual: CheckoutStep,
    },
    #[error("checkout is unavailable for an empty cart")]
    EmptyCart,
}

/// Rejections raised by the storefront session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Checkout(#[from] CheckoutError),
    #[error("no checkout is in progress")]
    NotInCheckout,
    #[error("checkout is already in progress")]
    AlreadyInCheckout,
}

impl StoreError {
    /// The validation category behind this rejection, if any.
    #[must_use]
    pub fn validation(&self) -> Option<ValidationError> {
        match self {
            Self::Validation(err) | Self::Checkout(CheckoutError::Validation(err)) => Some(*err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_keys_are_distinct() {
        let keys = [
            ValidationError::MissingDimensions.key(),
            ValidationError::DimensionOutOfRange.key(),
            ValidationError::IncompleteSelection.key(),
            ValidationError::IncompleteShippingInfo.key(),
            ValidationError::IncompletePaymentInfo.key(),
        ];
        let unique: std::collections::HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
    }

    #[test]
    fn store_error_exposes_nested_validation() {
        let err = StoreError::from(CheckoutError::from(ValidationError::IncompletePaymentInfo));
        assert_eq!(err.validation(), Some(ValidationError::IncompletePaymentInfo));
        assert_eq!(StoreError::NotInCheckout.validation(), None);
        assert_eq!(
            StoreError::Checkout(CheckoutError::EmptyCart).validation(),
            None
        );
    }

    #[test]
    fn wrong_step_message_names_both_steps() {
        let err = CheckoutError::WrongStep {
            expected: CheckoutStep::Payment,
            actual: CheckoutStep::Shipping,
        };
        assert_eq!(
            err.to_string(),
            "action requires the payment step but checkout is at shipping"
        );
    }
}
