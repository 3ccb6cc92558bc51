use anyhow::{Result, anyhow};
use std::collections::HashSet;
use std::sync::Arc;

use crate::logic::shopper::{
    DEFAULT_MAX_ACTIONS, Shopper, ShopperStrategy, ShoppingPlan, ShoppingSummary,
};

pub mod catalog;

use catalog::find_catalog_scenario;

// Logic test scenario
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: ShoppingPlan,
}

impl TestScenario {
    #[must_use]
    pub fn new(name: impl Into<String>, plan: ShoppingPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

fn no_violations(summary: &ShoppingSummary) -> Result<()> {
    anyhow::ensure!(
        summary.violations.is_empty(),
        "{} invariant violation(s), first: {}",
        summary.violations.len(),
        summary.violations.first().map_or("", String::as_str)
    );
    Ok(())
}

fn smoke_expectation(summary: &ShoppingSummary) -> Result<()> {
    no_violations(summary)?;
    anyhow::ensure!(
        summary.actions.len() == 20,
        "Smoke run should record every action, recorded {}",
        summary.actions.len()
    );
    anyhow::ensure!(summary.accepted() > 0, "Smoke run accepted no actions");
    Ok(())
}

fn purchaser_expectation(summary: &ShoppingSummary) -> Result<()> {
    no_violations(summary)?;
    anyhow::ensure!(
        !summary.orders.is_empty(),
        "Purchaser placed no orders in {} actions",
        summary.actions.len()
    );

    let mut seen = HashSet::new();
    for order in &summary.orders {
        let id = order.id.as_str();
        let suffix = id
            .strip_prefix("ORD-")
            .ok_or_else(|| anyhow!("Order id {id} lacks the ORD- prefix"))?;
        anyhow::ensure!(
            suffix.len() == 8
                && suffix
                    .chars()
                    .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()),
            "Order id {id} is not eight uppercase hex characters"
        );
        anyhow::ensure!(seen.insert(id.to_string()), "Duplicate order id {id}");
        anyhow::ensure!(order.item_count() >= 1, "Order {id} has no units");
        anyhow::ensure!(
            !order.customer.name.trim().is_empty(),
            "Order {id} is missing the customer name"
        );
    }
    Ok(())
}

fn abandon_expectation(summary: &ShoppingSummary) -> Result<()> {
    no_violations(summary)?;
    anyhow::ensure!(
        summary.orders.is_empty(),
        "Abandoner unexpectedly placed {} order(s)",
        summary.orders.len()
    );
    anyhow::ensure!(
        summary.final_session.last_order().is_none(),
        "Abandoned session still carries a confirmation"
    );
    Ok(())
}

fn chaos_expectation(summary: &ShoppingSummary) -> Result<()> {
    no_violations(summary)?;
    anyhow::ensure!(
        summary.rejected() > 0,
        "Chaos run produced no rejected actions in {} steps",
        summary.actions.len()
    );
    Ok(())
}

fn deterministic_replay_expectation(summary: &ShoppingSummary) -> Result<()> {
    let replay = Shopper::new(Arc::clone(&summary.catalog), false).run_plan(
        &ShoppingPlan::new(summary.strategy).with_max_actions(summary.actions.len()),
        summary.seed,
    );
    anyhow::ensure!(
        replay.actions == summary.actions,
        "Replay of seed {} diverged from the original action path",
        summary.seed
    );
    anyhow::ensure!(
        replay.final_session == summary.final_session,
        "Replay of seed {} ended in a different session state",
        summary.seed
    );
    let original_ids: Vec<&str> = summary.orders.iter().map(|o| o.id.as_str()).collect();
    let replay_ids: Vec<&str> = replay.orders.iter().map(|o| o.id.as_str()).collect();
    anyhow::ensure!(
        original_ids == replay_ids,
        "Replay of seed {} produced different order ids",
        summary.seed
    );
    Ok(())
}

fn smoke_scenario() -> TestScenario {
    TestScenario::new(
        "Smoke Test",
        ShoppingPlan::new(ShopperStrategy::Purchaser)
            .with_max_actions(20)
            .with_expectation(smoke_expectation),
    )
}

fn strategy_scenario(
    name: &str,
    strategy: ShopperStrategy,
    expectation: fn(&ShoppingSummary) -> Result<()>,
) -> TestScenario {
    TestScenario::new(
        name,
        ShoppingPlan::new(strategy)
            .with_max_actions(DEFAULT_MAX_ACTIONS)
            .with_expectation(expectation),
    )
}

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    match name.to_lowercase().as_str() {
        "smoke" => Some(smoke_scenario()),
        "purchaser" | "purchase" => Some(strategy_scenario(
            "Purchaser Journey",
            ShopperStrategy::Purchaser,
            purchaser_expectation,
        )),
        "churn" | "churner" => Some(strategy_scenario(
            "Cart Churn",
            ShopperStrategy::Churner,
            no_violations,
        )),
        "abandon" | "abandoner" => Some(strategy_scenario(
            "Checkout Abandonment",
            ShopperStrategy::Abandoner,
            abandon_expectation,
        )),
        "chaos" => Some(TestScenario::new(
            "Chaos Shopper",
            ShoppingPlan::new(ShopperStrategy::Chaos)
                .with_max_actions(DEFAULT_MAX_ACTIONS * 2)
                .with_expectation(chaos_expectation),
        )),
        "deterministic-replay" | "replay" => Some(strategy_scenario(
            "Deterministic Replay",
            ShopperStrategy::Chaos,
            deterministic_replay_expectation,
        )),
        "reference-quote" | "quote" => find_catalog_scenario("Reference Quote"),
        "shipping-threshold" | "shipping" => find_catalog_scenario("Shipping Threshold"),
        "dimension-bounds" | "bounds" => find_catalog_scenario("Dimension Bounds"),
        "empty-checkout" => find_catalog_scenario("Empty Cart Checkout"),
        "checkout-gate" | "gate" => find_catalog_scenario("Checkout Step Gate"),
        _ => None,
    }
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    vec![
        ("smoke", "Smoke Test"),
        ("purchaser", "Purchaser Journey"),
        ("churn", "Cart Churn"),
        ("abandon", "Checkout Abandonment"),
        ("chaos", "Chaos Shopper"),
        ("deterministic-replay", "Deterministic Replay"),
        ("reference-quote", "Reference Quote"),
        ("shipping-threshold", "Shipping Threshold"),
        ("dimension-bounds", "Dimension Bounds"),
        ("empty-checkout", "Empty Cart Checkout"),
        ("checkout-gate", "Checkout Step Gate"),
    ]
}
