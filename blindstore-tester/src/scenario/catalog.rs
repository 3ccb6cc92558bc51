use anyhow::{Result, anyhow};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use super::TestScenario;
use crate::logic::shopper::{ShopperStrategy, ShoppingPlan, ShoppingSummary};
use blindstore_core::{
    CatalogKind, CheckoutAction, CheckoutError, CheckoutStep, ConfigAction, CustomerField,
    PaymentField, StoreAction, StoreError, StorefrontSession, ValidationError, shipping, tax,
    total,
};

pub fn catalog_scenarios() -> Vec<TestScenario> {
    vec![
        TestScenario::new(
            "Reference Quote",
            base_plan().with_expectation(reference_quote_expectation),
        ),
        TestScenario::new(
            "Shipping Threshold",
            base_plan().with_expectation(shipping_threshold_expectation),
        ),
        TestScenario::new(
            "Dimension Bounds",
            base_plan().with_expectation(dimension_bounds_expectation),
        ),
        TestScenario::new(
            "Empty Cart Checkout",
            base_plan().with_expectation(empty_checkout_expectation),
        ),
        TestScenario::new(
            "Checkout Step Gate",
            base_plan().with_expectation(checkout_gate_expectation),
        ),
    ]
}

pub fn find_catalog_scenario(name: &str) -> Option<TestScenario> {
    catalog_scenarios()
        .into_iter()
        .find(|scenario| scenario.name == name)
}

fn base_plan() -> ShoppingPlan {
    ShoppingPlan::new(ShopperStrategy::Purchaser).with_max_actions(0)
}

fn fresh_session(summary: &ShoppingSummary) -> StorefrontSession {
    StorefrontSession::new(Arc::clone(&summary.catalog))
}

fn configure(session: &mut StorefrontSession, edits: Vec<ConfigAction>) -> Result<()> {
    for edit in edits {
        session
            .dispatch(StoreAction::Configure(edit))
            .map_err(|err| anyhow!("configuration edit rejected: {err}"))?;
    }
    Ok(())
}

#[derive(Debug)]
struct Choices {
    fabric: String,
    color: String,
    mounting: String,
    control: String,
}

/// First entry of each table, so the checks hold for any loaded catalog.
fn first_choices(summary: &ShoppingSummary) -> Result<Choices> {
    let catalog = &summary.catalog;
    let first = |kind: CatalogKind| {
        catalog
            .table(kind)
            .first()
            .map(|entry| entry.name.clone())
            .ok_or_else(|| anyhow!("catalog has no {kind} entries"))
    };
    Ok(Choices {
        fabric: first(CatalogKind::Fabric)?,
        color: first(CatalogKind::Color)?,
        mounting: first(CatalogKind::Mounting)?,
        control: first(CatalogKind::Control)?,
    })
}

fn full_draft(width: Decimal, height: Decimal, choices: &Choices) -> Vec<ConfigAction> {
    vec![
        ConfigAction::SetWidth(Some(width)),
        ConfigAction::SetHeight(Some(height)),
        ConfigAction::SelectFabric(choices.fabric.clone()),
        ConfigAction::SelectColor(choices.color.clone()),
        ConfigAction::SelectMounting(choices.mounting.clone()),
        ConfigAction::SelectControl(choices.control.clone()),
    ]
}

fn reference_choices(summary: &ShoppingSummary) -> Result<Choices> {
    Ok(Choices {
        fabric: "Blackout".to_string(),
        control: "Cordless".to_string(),
        ..first_choices(summary)?
    })
}

fn reference_quote_expectation(summary: &ShoppingSummary) -> Result<()> {
    let catalog = &summary.catalog;
    let blackout = catalog
        .fabric("Blackout")
        .ok_or_else(|| anyhow!("catalog lacks the Blackout fabric"))?;
    let cordless = catalog
        .control("Cordless")
        .ok_or_else(|| anyhow!("catalog lacks the Cordless control"))?;

    let mut session = fresh_session(summary);
    let mut edits = full_draft(dec!(120), dec!(180), &reference_choices(summary)?);
    edits.push(ConfigAction::SetQuantity(2));
    configure(&mut session, edits)?;

    let quote = session.quote();
    let rules = &catalog.rules;
    let area = dec!(120) * dec!(180) / rules.area_divisor;
    let expected_unit = area * rules.base_rate_per_sqm + area * blackout.price + cordless.price;
    anyhow::ensure!(
        quote.area == area,
        "Area should be {area}, quoted {}",
        quote.area
    );
    anyhow::ensure!(
        quote.unit_price == expected_unit,
        "Unit price should be {expected_unit}, quoted {}",
        quote.unit_price
    );
    anyhow::ensure!(
        quote.total == expected_unit * dec!(2),
        "Line total should double the unit price, quoted {}",
        quote.total
    );
    anyhow::ensure!(
        session.progress() == 100,
        "Complete draft should read 100% progress, read {}",
        session.progress()
    );

    session
        .dispatch(StoreAction::AddToCart)
        .map_err(|err| anyhow!("complete draft rejected: {err}"))?;
    let cart_summary = session.cart_summary();
    anyhow::ensure!(
        cart_summary.subtotal == quote.total,
        "Cart subtotal {} should equal the quoted line total {}",
        cart_summary.subtotal,
        quote.total
    );
    anyhow::ensure!(
        cart_summary.total == total(quote.total, rules),
        "Cart grand total disagrees with the rate card"
    );
    anyhow::ensure!(
        session.configuration().progress() == 100,
        "Draft should survive adding to cart"
    );
    Ok(())
}

fn shipping_threshold_expectation(summary: &ShoppingSummary) -> Result<()> {
    let rules = &summary.catalog.rules;
    let threshold = rules.free_shipping_threshold;
    let cent = dec!(0.01);

    anyhow::ensure!(
        shipping(threshold, rules).is_zero(),
        "Subtotal at the threshold ships free"
    );
    anyhow::ensure!(
        shipping(threshold - cent, rules) == rules.flat_shipping,
        "Subtotal one cent under the threshold pays flat shipping"
    );
    anyhow::ensure!(
        tax(threshold, rules) == threshold * rules.tax_rate,
        "Tax applies to the subtotal only"
    );

    let choices = first_choices(summary)?;
    let mut session = fresh_session(summary);
    configure(
        &mut session,
        full_draft(rules.min_dimension, rules.min_dimension, &choices),
    )?;
    session
        .dispatch(StoreAction::AddToCart)
        .map_err(|err| anyhow!("minimum-size blind rejected: {err}"))?;
    let cart = session.cart_summary();
    if cart.subtotal < threshold {
        anyhow::ensure!(
            cart.shipping == rules.flat_shipping,
            "Small order should pay flat shipping, paid {}",
            cart.shipping
        );
        anyhow::ensure!(
            cart.free_shipping_remaining == threshold - cart.subtotal,
            "Remaining-for-free-shipping should be {}, read {}",
            threshold - cart.subtotal,
            cart.free_shipping_remaining
        );
    }
    Ok(())
}

fn dimension_bounds_expectation(summary: &ShoppingSummary) -> Result<()> {
    let rules = &summary.catalog.rules;
    let choices = first_choices(summary)?;
    let below = rules.min_dimension - Decimal::ONE;
    let above = rules.max_dimension + Decimal::ONE;

    for (width, height) in [(below, rules.min_dimension), (rules.max_dimension, above)] {
        let mut session = fresh_session(summary);
        configure(&mut session, full_draft(width, height, &choices))?;
        let before = session.clone();
        match session.dispatch(StoreAction::AddToCart) {
            Err(err) if err.validation() == Some(ValidationError::DimensionOutOfRange) => {}
            Err(err) => anyhow::bail!("{width}x{height} rejected for the wrong reason: {err}"),
            Ok(_) => anyhow::bail!("{width}x{height} was accepted outside the size range"),
        }
        anyhow::ensure!(session == before, "Rejected add mutated the session");
    }

    for (width, height) in [
        (rules.min_dimension, rules.min_dimension),
        (rules.max_dimension, rules.max_dimension),
    ] {
        let mut session = fresh_session(summary);
        configure(&mut session, full_draft(width, height, &choices))?;
        session
            .dispatch(StoreAction::AddToCart)
            .map_err(|err| anyhow!("{width}x{height} should be accepted: {err}"))?;
    }

    let mut session = fresh_session(summary);
    configure(
        &mut session,
        vec![
            ConfigAction::SelectFabric(choices.fabric),
            ConfigAction::SelectControl(choices.control),
        ],
    )?;
    match session.dispatch(StoreAction::AddToCart) {
        Err(err) if err.validation() == Some(ValidationError::MissingDimensions) => Ok(()),
        other => Err(anyhow!(
            "Draft without dimensions should report missing dimensions, got {other:?}"
        )),
    }
}

fn empty_checkout_expectation(summary: &ShoppingSummary) -> Result<()> {
    let mut session = fresh_session(summary);
    match session.dispatch(StoreAction::BeginCheckout) {
        Err(StoreError::Checkout(CheckoutError::EmptyCart)) => {}
        other => anyhow::bail!("Checkout over an empty cart should fail, got {other:?}"),
    }
    anyhow::ensure!(session.checkout().is_none(), "No checkout should be open");
    match session.dispatch(StoreAction::PlaceOrder) {
        Err(StoreError::NotInCheckout) => Ok(()),
        other => Err(anyhow!(
            "Placing an order without checkout should fail, got {other:?}"
        )),
    }
}

fn checkout_gate_expectation(summary: &ShoppingSummary) -> Result<()> {
    let choices = first_choices(summary)?;
    let rules = &summary.catalog.rules;
    let mut session = fresh_session(summary);
    configure(
        &mut session,
        full_draft(rules.min_dimension, rules.max_dimension, &choices),
    )?;
    session
        .dispatch(StoreAction::AddToCart)
        .map_err(|err| anyhow!("draft rejected: {err}"))?;
    session
        .dispatch(StoreAction::BeginCheckout)
        .map_err(|err| anyhow!("checkout did not open: {err}"))?;

    match session.dispatch(StoreAction::Checkout(CheckoutAction::ContinueToPayment)) {
        Err(err) if err.validation() == Some(ValidationError::IncompleteShippingInfo) => {}
        other => anyhow::bail!("Blank shipping form should be rejected, got {other:?}"),
    }

    for (field, value) in [
        (CustomerField::Name, "Quinn Harper"),
        (CustomerField::Email, "quinn.harper"),
        (CustomerField::Phone, "555-0199"),
        (CustomerField::Address, "12 Dock Lane"),
        (CustomerField::City, "Halifax"),
        (CustomerField::PostalCode, "B3H 1A1"),
    ] {
        session
            .dispatch(StoreAction::Checkout(CheckoutAction::UpdateCustomer(
                field,
                value.to_string(),
            )))
            .map_err(|err| anyhow!("shipping edit rejected: {err}"))?;
    }
    anyhow::ensure!(
        session
            .dispatch(StoreAction::Checkout(CheckoutAction::ContinueToPayment))
            .is_err(),
        "Malformed email should keep checkout on the shipping step"
    );
    anyhow::ensure!(
        session.checkout_step() == Some(CheckoutStep::Shipping),
        "Checkout should still be at shipping"
    );

    session
        .dispatch(StoreAction::Checkout(CheckoutAction::UpdateCustomer(
            CustomerField::Email,
            "quinn@harper.ca".to_string(),
        )))
        .map_err(|err| anyhow!("email edit rejected: {err}"))?;
    session
        .dispatch(StoreAction::Checkout(CheckoutAction::ContinueToPayment))
        .map_err(|err| anyhow!("complete shipping form rejected: {err}"))?;
    anyhow::ensure!(
        session.checkout_step() == Some(CheckoutStep::Payment),
        "Checkout should advance to payment"
    );

    session
        .dispatch(StoreAction::Checkout(CheckoutAction::UpdatePayment(
            PaymentField::CardNumber,
            "4111 1111 1111 1111".to_string(),
        )))
        .map_err(|err| anyhow!("card edit rejected: {err}"))?;
    match session.dispatch(StoreAction::PlaceOrder) {
        Err(err) if err.validation() == Some(ValidationError::IncompletePaymentInfo) => {}
        other => anyhow::bail!("Partial card details should block the order, got {other:?}"),
    }
    anyhow::ensure!(
        !session.cart().is_empty() && session.last_order().is_none(),
        "Blocked order must leave the cart intact"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::shopper::Shopper;
    use blindstore_core::Catalog;

    fn empty_summary() -> ShoppingSummary {
        Shopper::new(Arc::new(Catalog::load_from_static().unwrap()), false)
            .run_plan(&base_plan(), 0)
    }

    #[test]
    fn every_catalog_check_passes_on_the_embedded_catalog() {
        let summary = empty_summary();
        for scenario in catalog_scenarios() {
            for expectation in &scenario.plan.expectations {
                expectation
                    .evaluate(&summary)
                    .unwrap_or_else(|err| panic!("{}: {err:#}", scenario.name));
            }
        }
    }

    #[test]
    fn reference_quote_matches_known_figures() {
        let summary = empty_summary();
        let mut session = fresh_session(&summary);
        let mut edits = full_draft(dec!(120), dec!(180), &reference_choices(&summary).unwrap());
        edits.push(ConfigAction::SetQuantity(2));
        configure(&mut session, edits).unwrap();
        let quote = session.quote();
        assert_eq!(quote.unit_price, dec!(230.2));
        assert_eq!(quote.total, dec!(460.4));
    }

    #[test]
    fn find_catalog_scenario_by_name() {
        assert!(find_catalog_scenario("Dimension Bounds").is_some());
        assert!(find_catalog_scenario("dimension-bounds").is_none());
    }
}
