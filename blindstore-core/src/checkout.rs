//! Two-step checkout: shipping details, then payment, then order placement.
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::cart::Cart;
use crate::constants::EMAIL_PATTERN;
use crate::error::{CheckoutError, ValidationError};
use crate::order::{self, Order, OrderStamp};
use crate::rules::PricingRules;

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).ok()).as_ref()
}

/// Shipping contact collected in the first checkout step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomerField {
    Name,
    Email,
    Phone,
    Address,
    City,
    PostalCode,
}

impl CustomerField {
    pub const ALL: [Self; 6] = [
        Self::Name,
        Self::Email,
        Self::Phone,
        Self::Address,
        Self::City,
        Self::PostalCode,
    ];
}

impl CustomerInfo {
    #[must_use]
    pub fn field(&self, field: CustomerField) -> &str {
        match field {
            CustomerField::Name => &self.name,
            CustomerField::Email => &self.email,
            CustomerField::Phone => &self.phone,
            CustomerField::Address => &self.address,
            CustomerField::City => &self.city,
            CustomerField::PostalCode => &self.postal_code,
        }
    }

    pub fn set_field(&mut self, field: CustomerField, value: String) {
        let slot = match field {
            CustomerField::Name => &mut self.name,
            CustomerField::Email => &mut self.email,
            CustomerField::Phone => &mut self.phone,
            CustomerField::Address => &mut self.address,
            CustomerField::City => &mut self.city,
            CustomerField::PostalCode => &mut self.postal_code,
        };
        *slot = value;
    }

    /// Fields that are empty after trimming, in form order.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<CustomerField> {
        CustomerField::ALL
            .into_iter()
            .filter(|field| self.field(*field).trim().is_empty())
            .collect()
    }

    /// The email exactly as stored, so surrounding whitespace fails.
    #[must_use]
    pub fn email_valid(&self) -> bool {
        email_regex().is_some_and(|re| re.is_match(&self.email))
    }

    /// All six fields present and the email well formed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty() && self.email_valid()
    }
}

/// Card fields collected in the second step. Never copied into an order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentDetails {
    pub card_number: String,
    pub expiry: String,
    pub cvc: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentField {
    CardNumber,
    Expiry,
    Cvc,
}

impl PaymentDetails {
    pub fn set_field(&mut self, field: PaymentField, value: String) {
        match field {
            PaymentField::CardNumber => self.card_number = value,
            PaymentField::Expiry => self.expiry = value,
            PaymentField::Cvc => self.cvc = value,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        [&self.card_number, &self.expiry, &self.cvc]
            .iter()
            .all(|value| !value.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStep {
    Shipping,
    Payment,
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Shipping => "shipping",
            Self::Payment => "payment",
        })
    }
}

/// Checkout draft. Payment fields exist only once shipping is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutFlow {
    Shipping {
        customer: CustomerInfo,
    },
    Payment {
        customer: CustomerInfo,
        payment: PaymentDetails,
    },
}

impl Default for CheckoutFlow {
    fn default() -> Self {
        Self::Shipping {
            customer: CustomerInfo::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutAction {
    UpdateCustomer(CustomerField, String),
    UpdatePayment(PaymentField, String),
    ContinueToPayment,
    EditShipping,
}

impl CheckoutFlow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        match self {
            Self::Shipping { .. } => CheckoutStep::Shipping,
            Self::Payment { .. } => CheckoutStep::Payment,
        }
    }

    #[must_use]
    pub const fn customer(&self) -> &CustomerInfo {
        match self {
            Self::Shipping { customer } | Self::Payment { customer, .. } => customer,
        }
    }

    #[must_use]
    pub const fn payment(&self) -> Option<&PaymentDetails> {
        match self {
            Self::Shipping { .. } => None,
            Self::Payment { payment, .. } => Some(payment),
        }
    }

    fn wrong_step(&self, expected: CheckoutStep) -> CheckoutError {
        let err = CheckoutError::WrongStep {
            expected,
            actual: self.step(),
        };
        log::trace!("checkout rejected: {err}");
        err
    }

    /// Apply one checkout action, producing the next flow.
    ///
    /// # Errors
    ///
    /// Rejects actions issued at the wrong step and a shipping form that is
    /// incomplete or carries a malformed email.
    pub fn apply(&self, action: CheckoutAction) -> Result<Self, CheckoutError> {
        let next = match (self, action) {
            (Self::Shipping { customer }, CheckoutAction::UpdateCustomer(field, value)) => {
                let mut customer = customer.clone();
                customer.set_field(field, value);
                Self::Shipping { customer }
            }
            (Self::Payment { customer, payment }, CheckoutAction::UpdatePayment(field, value)) => {
                let mut payment = payment.clone();
                payment.set_field(field, value);
                Self::Payment {
                    customer: customer.clone(),
                    payment,
                }
            }
            (Self::Shipping { customer }, CheckoutAction::ContinueToPayment) => {
                if !customer.is_complete() {
                    log::trace!("shipping rejected, missing {:?}", customer.missing_fields());
                    return Err(ValidationError::IncompleteShippingInfo.into());
                }
                Self::Payment {
                    customer: customer.clone(),
                    payment: PaymentDetails::default(),
                }
            }
            (Self::Payment { customer, .. }, CheckoutAction::EditShipping) => Self::Shipping {
                customer: customer.clone(),
            },
            (
                Self::Payment { .. },
                CheckoutAction::UpdateCustomer(..) | CheckoutAction::ContinueToPayment,
            ) => {
                return Err(self.wrong_step(CheckoutStep::Shipping));
            }
            (
                Self::Shipping { .. },
                CheckoutAction::UpdatePayment(..) | CheckoutAction::EditShipping,
            ) => {
                return Err(self.wrong_step(CheckoutStep::Payment));
            }
        };
        if next.step() != self.step() {
            log::debug!("checkout {} -> {}", self.step(), next.step());
        }
        Ok(next)
    }

    /// Place the order from the payment step.
    ///
    /// # Errors
    ///
    /// Fails outside the payment step, with incomplete card fields, or on an
    /// empty cart. The cart and flow are left as they were.
    pub fn place_order(
        &self,
        cart: &Cart,
        rules: &PricingRules,
        stamp: OrderStamp,
    ) -> Result<(Order, Cart), CheckoutError> {
        let Self::Payment { customer, payment } = self else {
            return Err(self.wrong_step(CheckoutStep::Payment));
        };
        if !payment.is_complete() {
            return Err(ValidationError::IncompletePaymentInfo.into());
        }
        order::finalize(cart, customer, rules, stamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_shipping() -> CheckoutFlow {
        [
            (CustomerField::Name, "Grace Hopper"),
            (CustomerField::Email, "grace@navy.mil"),
            (CustomerField::Phone, "555-0199"),
            (CustomerField::Address, "1 Compiler Ct"),
            (CustomerField::City, "Arlington"),
            (CustomerField::PostalCode, "22201"),
        ]
        .into_iter()
        .fold(CheckoutFlow::new(), |flow, (field, value)| {
            flow.apply(CheckoutAction::UpdateCustomer(field, value.into()))
                .unwrap()
        })
    }

    #[test]
    fn email_pattern_matches_storefront_rules() {
        let mut info = CustomerInfo::default();
        for (email, valid) in [
            ("a@b.co", true),
            ("first.last@shop.example.com", true),
            ("no-at-sign.com", false),
            ("two@@signs.com", false),
            ("user@nodot", false),
            ("spa ce@x.com", false),
            (" a@b.co", false),
            ("a@b.co\n", false),
            ("", false),
        ] {
            info.email = email.into();
            assert_eq!(info.email_valid(), valid, "{email}");
        }
    }

    #[test]
    fn padded_email_blocks_payment_step() {
        let padded = filled_shipping()
            .apply(CheckoutAction::UpdateCustomer(
                CustomerField::Email,
                "grace@navy.mil ".into(),
            ))
            .unwrap();
        assert_eq!(
            padded.apply(CheckoutAction::ContinueToPayment),
            Err(CheckoutError::Validation(ValidationError::IncompleteShippingInfo))
        );
    }

    #[test]
    fn continue_requires_every_field_and_valid_email() {
        let flow = filled_shipping()
            .apply(CheckoutAction::UpdateCustomer(CustomerField::City, "  ".into()))
            .unwrap();
        assert_eq!(flow.customer().missing_fields(), vec![CustomerField::City]);
        assert_eq!(
            flow.apply(CheckoutAction::ContinueToPayment),
            Err(CheckoutError::Validation(ValidationError::IncompleteShippingInfo))
        );

        let flow = filled_shipping()
            .apply(CheckoutAction::UpdateCustomer(CustomerField::Email, "grace".into()))
            .unwrap();
        assert!(flow.customer().missing_fields().is_empty());
        assert!(flow.apply(CheckoutAction::ContinueToPayment).is_err());

        let paying = filled_shipping()
            .apply(CheckoutAction::ContinueToPayment)
            .unwrap();
        assert_eq!(paying.step(), CheckoutStep::Payment);
        assert_eq!(paying.payment(), Some(&PaymentDetails::default()));
    }

    #[test]
    fn edit_shipping_keeps_customer_and_drops_payment() {
        let paying = filled_shipping()
            .apply(CheckoutAction::ContinueToPayment)
            .unwrap()
            .apply(CheckoutAction::UpdatePayment(PaymentField::CardNumber, "4111".into()))
            .unwrap();
        let back = paying.apply(CheckoutAction::EditShipping).unwrap();
        assert_eq!(back.step(), CheckoutStep::Shipping);
        assert_eq!(back.customer(), paying.customer());
        assert_eq!(back.payment(), None);

        let again = back.apply(CheckoutAction::ContinueToPayment).unwrap();
        assert_eq!(again.payment().map(|p| p.card_number.as_str()), Some(""));
    }

    #[test]
    fn wrong_step_actions_are_rejected() {
        let shipping = CheckoutFlow::new();
        assert_eq!(
            shipping.apply(CheckoutAction::EditShipping),
            Err(CheckoutError::WrongStep {
                expected: CheckoutStep::Payment,
                actual: CheckoutStep::Shipping,
            })
        );
        assert!(matches!(
            shipping.apply(CheckoutAction::UpdatePayment(PaymentField::Cvc, "123".into())),
            Err(CheckoutError::WrongStep { .. })
        ));

        let paying = filled_shipping()
            .apply(CheckoutAction::ContinueToPayment)
            .unwrap();
        assert_eq!(
            paying.apply(CheckoutAction::ContinueToPayment),
            Err(CheckoutError::WrongStep {
                expected: CheckoutStep::Shipping,
                actual: CheckoutStep::Payment,
            })
        );
        assert!(paying
            .apply(CheckoutAction::UpdateCustomer(CustomerField::Name, "X".into()))
            .is_err());
    }

    #[test]
    fn place_order_requires_payment_step_and_fields() {
        let rules = PricingRules::default();
        let cart = Cart::new();
        assert!(matches!(
            filled_shipping().place_order(&cart, &rules, OrderStamp::now()),
            Err(CheckoutError::WrongStep { .. })
        ));

        let paying = filled_shipping()
            .apply(CheckoutAction::ContinueToPayment)
            .unwrap()
            .apply(CheckoutAction::UpdatePayment(PaymentField::CardNumber, "4111 1111".into()))
            .unwrap()
            .apply(CheckoutAction::UpdatePayment(PaymentField::Expiry, "12/30".into()))
            .unwrap();
        assert_eq!(
            paying.place_order(&cart, &rules, OrderStamp::now()),
            Err(CheckoutError::Validation(ValidationError::IncompletePaymentInfo))
        );

        let ready = paying
            .apply(CheckoutAction::UpdatePayment(PaymentField::Cvc, "123".into()))
            .unwrap();
        assert_eq!(
            ready.place_order(&cart, &rules, OrderStamp::now()),
            Err(CheckoutError::EmptyCart)
        );
    }
}
