use blindstore_core::numbers::decimal_to_f64;
use colored::Colorize;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::logic::shopper::{Shopper, ShoppingPlan, ShoppingSummary};
use crate::scenario::TestScenario;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub orders_placed: usize,
    pub rejected_actions: usize,
    /// Mean grand total of the orders placed, in currency units.
    pub average_order_value: f64,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    shopper: Shopper,
    verbose: bool,
}

impl LogicTester {
    pub const fn new(shopper: Shopper, verbose: bool) -> Self {
        Self { shopper, verbose }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.verbose {
                println!(
                    "🧪 Testing scenario: {} (shopper: {} seed: {})",
                    scenario.name.bright_white(),
                    scenario.plan.strategy.label(),
                    seed
                );
            }

            let result = self.run_single_scenario(scenario, seed, iterations);
            results.push(result);
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let tally = self.run_iterations(&scenario.plan, seed, iterations);

        let avg_duration = if tally.performance_data.is_empty() {
            Duration::ZERO
        } else {
            tally.performance_data.iter().sum::<Duration>()
                / u32::try_from(tally.performance_data.len()).unwrap_or(1)
        };

        let average_order_value = if tally.orders == 0 {
            0.0
        } else {
            decimal_to_f64(tally.revenue / Decimal::from(tally.orders))
        };

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            seed,
            passed: tally.failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: tally.successes,
            orders_placed: tally.orders,
            rejected_actions: tally.rejections,
            average_order_value,
            failures: tally.failures,
            average_duration: avg_duration,
            performance_data: tally.performance_data,
        }
    }

    fn run_iterations(&self, plan: &ShoppingPlan, seed: u64, iterations: usize) -> IterationTally {
        let mut tally = IterationTally::default();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let summary = self.shopper.run_plan(plan, iteration_seed);
            tally.orders += summary.orders.len();
            tally.revenue += summary.orders.iter().map(|order| order.total).sum::<Decimal>();
            tally.rejections += summary.rejected();

            if let Some(err) = evaluate_expectations(plan, &summary) {
                let context = summarize_action_path(&summary);
                tally.failures.push(format!(
                    "Iteration {} (shopper {}, seed {}, actions {}, orders {}): {} | {}",
                    i + 1,
                    summary.strategy.label(),
                    summary.seed,
                    summary.actions.len(),
                    summary.orders.len(),
                    err,
                    context
                ));

                if self.verbose {
                    println!(
                        "  ❌ Iteration {}/{} failed: {}",
                        i + 1,
                        iterations,
                        err.clone().red()
                    );
                    println!("     ↳ Seed {} | Last actions: {}", summary.seed, context);
                }
            } else {
                tally.successes += 1;
                let duration = start_time.elapsed();
                tally.performance_data.push(duration);

                if self.verbose {
                    println!(
                        "  ✅ Iteration {}/{} passed ({duration:?}) ok:{} rejected:{} orders:{}",
                        i + 1,
                        iterations,
                        summary.accepted(),
                        summary.rejected(),
                        summary.orders.len()
                    );
                }
            }
        }

        tally
    }
}

#[derive(Debug, Default)]
struct IterationTally {
    successes: usize,
    orders: usize,
    rejections: usize,
    revenue: Decimal,
    failures: Vec<String>,
    performance_data: Vec<Duration>,
}

fn evaluate_expectations(plan: &ShoppingPlan, summary: &ShoppingSummary) -> Option<String> {
    for expectation in &plan.expectations {
        if let Err(err) = expectation.evaluate(summary) {
            return Some(format!("{err:#}"));
        }
    }
    None
}

fn summarize_action_path(summary: &ShoppingSummary) -> String {
    if summary.actions.is_empty() {
        return "no actions recorded".to_string();
    }

    summary
        .actions
        .iter()
        .rev()
        .take(3)
        .map(|record| {
            format!(
                "#{} {} -> {}",
                record.step, record.action, record.outcome
            )
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_micros().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = u128::deserialize(deserializer)?;
        Ok(Duration::from_micros(u64::try_from(micros).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let micros: Vec<u128> = durations.iter().map(Duration::as_micros).collect();
        micros.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = Vec::<u128>::deserialize(deserializer)?;
        Ok(micros
            .into_iter()
            .map(|m| Duration::from_micros(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::shopper::ShopperStrategy;
    use blindstore_core::Catalog;
    use std::sync::Arc;

    fn no_violations(summary: &ShoppingSummary) -> anyhow::Result<()> {
        anyhow::ensure!(summary.violations.is_empty(), "violations found");
        Ok(())
    }

    fn always_fails(_summary: &ShoppingSummary) -> anyhow::Result<()> {
        anyhow::bail!("always fails")
    }

    fn tester() -> LogicTester {
        let catalog = Arc::new(Catalog::load_from_static().unwrap());
        LogicTester::new(Shopper::new(catalog, false), false)
    }

    #[test]
    fn passing_scenario_counts_every_iteration() {
        let scenario = TestScenario::new(
            "clean",
            ShoppingPlan::new(ShopperStrategy::Purchaser).with_expectation(no_violations),
        );
        let results = tester().run_scenario(&scenario, &[1, 2], 3);
        assert_eq!(results.len(), 2);
        for result in results {
            assert!(result.passed);
            assert_eq!(result.successful_iterations, 3);
            assert_eq!(result.performance_data.len(), 3);
        }
    }

    #[test]
    fn failing_expectation_is_reported_with_context() {
        let scenario = TestScenario::new(
            "never",
            ShoppingPlan::new(ShopperStrategy::Churner)
                .with_max_actions(5)
                .with_expectation(always_fails),
        );
        let results = tester().run_scenario(&scenario, &[9], 2);
        let result = &results[0];
        assert!(!result.passed);
        assert_eq!(result.successful_iterations, 0);
        assert_eq!(result.failures.len(), 2);
        assert!(result.failures[0].contains("always fails"));
        assert!(result.failures[0].contains("seed 9"));
        assert_eq!(result.average_duration, Duration::ZERO);
    }

    #[test]
    fn durations_serialize_as_micros() {
        let result = ScenarioResult {
            scenario_name: "timing".to_string(),
            seed: 1,
            passed: true,
            iterations_run: 1,
            successful_iterations: 1,
            orders_placed: 0,
            rejected_actions: 0,
            average_order_value: 0.0,
            failures: Vec::new(),
            average_duration: Duration::from_micros(1500),
            performance_data: vec![Duration::from_micros(1500)],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["average_duration"], 1500);
        let back: ScenarioResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.performance_data, vec![Duration::from_micros(1500)]);
    }
}
