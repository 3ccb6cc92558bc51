//! Seeded shopper simulations driving a storefront session action by action.
use anyhow::Result;
use blindstore_core::{
    CartAction, CartItem, CartItemId, Catalog, CatalogKind, CheckoutAction, CheckoutFlow,
    CheckoutStep, ConfigAction, CustomerField, Order, OrderStamp, PaymentField, StoreAction,
    StoreError, StoreEvent, StorefrontSession, shipping, tax,
};
use chrono::{DateTime, Utc};
use colored::Colorize;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Builder;

pub const DEFAULT_MAX_ACTIONS: usize = 60;

/// Epoch second of the first simulated order; later orders advance by a minute per step.
const SIMULATED_EPOCH: i64 = 1_767_258_000;

const CUSTOMER_NAMES: [&str; 4] = ["Avery Chen", "Sam Okafor", "Riley Novak", "Morgan Diaz"];
const CITIES: [&str; 4] = ["Austin", "Leeds", "Toronto", "Wellington"];
const BAD_EMAILS: [&str; 4] = ["avery", "sam@", "riley@nodot", "two words@x.io"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShopperStrategy {
    /// Configures valid blinds, checks out and places orders
    Purchaser,
    /// Edits drafts and cart lines at random, never checks out
    Churner,
    /// Reaches checkout, fumbles the forms, then walks away
    Abandoner,
    /// Issues any action at any time, valid or not
    Chaos,
}

impl ShopperStrategy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Purchaser => "purchaser",
            Self::Churner => "churner",
            Self::Abandoner => "abandoner",
            Self::Chaos => "chaos",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShoppingPlan {
    pub strategy: ShopperStrategy,
    pub max_actions: usize,
    pub expectations: Vec<ShoppingExpectation>,
}

impl ShoppingPlan {
    #[must_use]
    pub const fn new(strategy: ShopperStrategy) -> Self {
        Self {
            strategy,
            max_actions: DEFAULT_MAX_ACTIONS,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_max_actions(mut self, max_actions: usize) -> Self {
        self.max_actions = max_actions;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<ShoppingExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Assertion hook run after a shopping run completes.
type ShoppingExpectationFn = Arc<dyn Fn(&ShoppingSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct ShoppingExpectation(ShoppingExpectationFn);

impl std::fmt::Debug for ShoppingExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShoppingExpectation").finish()
    }
}

impl ShoppingExpectation {
    pub fn evaluate(&self, summary: &ShoppingSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for ShoppingExpectation
where
    F: Fn(&ShoppingSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// One dispatched action and how the session answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    pub step: usize,
    pub action: String,
    pub accepted: bool,
    pub outcome: String,
}

/// Complete record of a shopping run.
#[derive(Debug, Clone)]
pub struct ShoppingSummary {
    pub seed: u64,
    pub strategy: ShopperStrategy,
    pub catalog: Arc<Catalog>,
    pub actions: Vec<ActionRecord>,
    pub orders: Vec<Order>,
    pub violations: Vec<String>,
    pub final_session: StorefrontSession,
}

impl ShoppingSummary {
    #[must_use]
    pub fn accepted(&self) -> usize {
        self.actions.iter().filter(|record| record.accepted).count()
    }

    #[must_use]
    pub fn rejected(&self) -> usize {
        self.actions.len() - self.accepted()
    }
}

/// Runs shopping plans against a shared catalog.
#[derive(Debug, Clone)]
pub struct Shopper {
    catalog: Arc<Catalog>,
    verbose: bool,
}

impl Shopper {
    #[must_use]
    pub const fn new(catalog: Arc<Catalog>, verbose: bool) -> Self {
        Self { catalog, verbose }
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn run_plan(&self, plan: &ShoppingPlan, seed: u64) -> ShoppingSummary {
        let mut session = StorefrontSession::new(Arc::clone(&self.catalog));
        let mut policy = ShopperPolicy::new(plan.strategy, seed);
        let mut actions = Vec::with_capacity(plan.max_actions);
        let mut orders = Vec::new();
        let mut violations = Vec::new();

        if self.verbose {
            println!(
                "🛍️  Starting shopper | seed:{seed} strategy:{} actions:{}",
                plan.strategy.label(),
                plan.max_actions
            );
        }

        for step in 0..plan.max_actions {
            let action = policy.next_action(&session);
            let label = describe_action(&action);
            let before = session.clone();

            let outcome = match action {
                StoreAction::PlaceOrder => session.place_order(policy.stamp(step)),
                other => session.dispatch(other),
            };

            match &outcome {
                Ok(StoreEvent::OrderPlaced(_)) => {
                    if let Some(order) = session.last_order() {
                        orders.push(order.clone());
                    }
                }
                Ok(StoreEvent::CartChanged(_)) => policy.retire_missing(&before, &session),
                Err(_) if session != before => {
                    violations.push(format!("step {step}: rejected {label} mutated the session"));
                }
                _ => {}
            }

            violations.extend(
                audit_session(&session)
                    .into_iter()
                    .map(|violation| format!("step {step}: {violation}")),
            );

            let record = ActionRecord {
                step,
                action: label,
                accepted: outcome.is_ok(),
                outcome: describe_outcome(&outcome),
            };
            if self.verbose {
                let mark = if record.accepted {
                    "✓".green()
                } else {
                    "✗".yellow()
                };
                println!("  {mark} {:>3} {} -> {}", step, record.action, record.outcome);
            }
            actions.push(record);
        }

        log::debug!(
            "shopper seed {seed} ({}) finished: {} actions, {} orders, {} violations",
            plan.strategy.label(),
            actions.len(),
            orders.len(),
            violations.len()
        );

        ShoppingSummary {
            seed,
            strategy: plan.strategy,
            catalog: Arc::clone(&self.catalog),
            actions,
            orders,
            violations,
            final_session: session,
        }
    }
}

/// Check the cart and totals invariants that must hold after every action.
#[must_use]
pub fn audit_session(session: &StorefrontSession) -> Vec<String> {
    let mut violations = Vec::new();
    let cart = session.cart();
    let rules = &session.catalog().rules;

    let line_sum: Decimal = cart.items().iter().map(CartItem::total_price).sum();
    if cart.subtotal() != line_sum {
        violations.push(format!(
            "subtotal {} differs from line sum {line_sum}",
            cart.subtotal()
        ));
    }
    let units: u32 = cart.items().iter().map(CartItem::quantity).sum();
    if cart.item_count() != units {
        violations.push(format!(
            "item count {} differs from unit sum {units}",
            cart.item_count()
        ));
    }
    for item in cart.items() {
        if !(1..=50).contains(&item.quantity()) {
            violations.push(format!("{} quantity {} out of range", item.id(), item.quantity()));
        }
        if item.total_price() != item.unit_price() * Decimal::from(item.quantity()) {
            violations.push(format!("{} total does not match unit x quantity", item.id()));
        }
        if !rules.dimension_in_range(item.width) || !rules.dimension_in_range(item.height) {
            violations.push(format!("{} accepted with out-of-range dimensions", item.id()));
        }
    }

    let summary = session.cart_summary();
    if summary.total != summary.subtotal + summary.shipping + summary.tax {
        violations.push("cart total is not subtotal + shipping + tax".to_string());
    }
    if summary.tax != tax(summary.subtotal, rules)
        || summary.shipping != shipping(summary.subtotal, rules)
    {
        violations.push("cart surcharges disagree with the rate card".to_string());
    }

    if !matches!(session.progress(), 0 | 25 | 50 | 75 | 100) {
        violations.push(format!("progress {} is not a gate multiple", session.progress()));
    }

    if let Some(order) = session.last_order() {
        if order.total != order.subtotal + order.shipping + order.tax {
            violations.push(format!("order {} total does not add up", order.id));
        }
        if order.items.is_empty() {
            violations.push(format!("order {} has no items", order.id));
        }
    }

    violations
}

fn describe_action(action: &StoreAction) -> String {
    match action {
        StoreAction::Configure(edit) => format!("configure {edit:?}"),
        StoreAction::AddToCart => "add-to-cart".to_string(),
        StoreAction::Cart(CartAction::Add(_)) => "cart add".to_string(),
        StoreAction::Cart(CartAction::UpdateQuantity(id, quantity)) => {
            format!("cart set {id} x{quantity}")
        }
        StoreAction::Cart(CartAction::Increment(id)) => format!("cart increment {id}"),
        StoreAction::Cart(CartAction::Decrement(id)) => format!("cart decrement {id}"),
        StoreAction::Cart(CartAction::Remove(id)) => format!("cart remove {id}"),
        StoreAction::Cart(CartAction::Clear) => "cart clear".to_string(),
        StoreAction::BeginCheckout => "begin-checkout".to_string(),
        StoreAction::Checkout(CheckoutAction::UpdateCustomer(field, value)) => {
            format!("customer {field:?}={value:?}")
        }
        StoreAction::Checkout(CheckoutAction::UpdatePayment(field, _)) => {
            format!("payment {field:?}")
        }
        StoreAction::Checkout(CheckoutAction::ContinueToPayment) => {
            "continue-to-payment".to_string()
        }
        StoreAction::Checkout(CheckoutAction::EditShipping) => "edit-shipping".to_string(),
        StoreAction::LeaveCheckout => "leave-checkout".to_string(),
        StoreAction::PlaceOrder => "place-order".to_string(),
        StoreAction::StartOver => "start-over".to_string(),
    }
}

fn describe_outcome(outcome: &Result<StoreEvent, StoreError>) -> String {
    match outcome {
        Ok(StoreEvent::ConfigurationChanged { progress }) => format!("progress {progress}%"),
        Ok(StoreEvent::ItemAdded(id)) => format!("added {id}"),
        Ok(StoreEvent::CartChanged(summary)) => format!("subtotal {}", summary.subtotal),
        Ok(StoreEvent::CheckoutStep(step)) => format!("at {step}"),
        Ok(StoreEvent::CheckoutClosed) => "checkout closed".to_string(),
        Ok(StoreEvent::OrderPlaced(id)) => format!("placed {id}"),
        Ok(StoreEvent::Restarted) => "restarted".to_string(),
        Err(err) => err.validation().map_or_else(
            || err.to_string(),
            |validation| validation.key().to_string(),
        ),
    }
}

/// Chooses the next action for a strategy from the visible session state.
struct ShopperPolicy {
    strategy: ShopperStrategy,
    rng: ChaCha8Rng,
    retired: Vec<CartItemId>,
    target_lines: usize,
}

impl ShopperPolicy {
    fn new(strategy: ShopperStrategy, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let target_lines = rng.gen_range(1..=3);
        Self {
            strategy,
            rng,
            retired: Vec::new(),
            target_lines,
        }
    }

    fn stamp(&mut self, step: usize) -> OrderStamp {
        let uuid = Builder::from_random_bytes(self.rng.r#gen()).into_uuid();
        let offset = i64::try_from(step).unwrap_or(i64::MAX / 60) * 60;
        let placed_at =
            DateTime::<Utc>::from_timestamp(SIMULATED_EPOCH.saturating_add(offset), 0)
                .unwrap_or_default();
        OrderStamp::fixed(uuid, placed_at)
    }

    fn retire_missing(&mut self, before: &StorefrontSession, after: &StorefrontSession) {
        let remaining: HashSet<CartItemId> =
            after.cart().items().iter().map(CartItem::id).collect();
        self.retired.extend(
            before
                .cart()
                .items()
                .iter()
                .map(CartItem::id)
                .filter(|id| !remaining.contains(id)),
        );
    }

    fn next_action(&mut self, session: &StorefrontSession) -> StoreAction {
        match self.strategy {
            ShopperStrategy::Purchaser => self.purchaser(session),
            ShopperStrategy::Churner => self.churner(session),
            ShopperStrategy::Abandoner => self.abandoner(session),
            ShopperStrategy::Chaos => self.chaos(session),
        }
    }

    fn purchaser(&mut self, session: &StorefrontSession) -> StoreAction {
        match session.checkout() {
            None => {
                if let Some(edit) = self.fill_draft(session) {
                    return StoreAction::Configure(edit);
                }
                if session.cart().line_count() < self.target_lines {
                    if self.rng.gen_bool(0.25) {
                        let quantity = self.rng.gen_range(1..=4);
                        return StoreAction::Configure(ConfigAction::SetQuantity(quantity));
                    }
                    // The draft survives an add; resize it before the next line.
                    if !session.cart().is_empty() && self.rng.gen_bool(0.5) {
                        let width = self.valid_dimension();
                        return StoreAction::Configure(ConfigAction::SetWidth(Some(width)));
                    }
                    return StoreAction::AddToCart;
                }
                StoreAction::BeginCheckout
            }
            Some(flow) => self.complete_checkout(flow, true),
        }
    }

    fn churner(&mut self, session: &StorefrontSession) -> StoreAction {
        let roll = self.rng.gen_range(0..100);
        match roll {
            0..=34 => StoreAction::Configure(self.random_edit(session.catalog(), 0.15)),
            35..=54 => StoreAction::AddToCart,
            55..=89 => StoreAction::Cart(self.random_cart_edit(session)),
            90..=94 => StoreAction::Configure(ConfigAction::Reset),
            _ => StoreAction::StartOver,
        }
    }

    fn abandoner(&mut self, session: &StorefrontSession) -> StoreAction {
        match session.checkout() {
            None if session.cart().is_empty() => self
                .fill_draft(session)
                .map_or(StoreAction::AddToCart, StoreAction::Configure),
            None => StoreAction::BeginCheckout,
            Some(flow) => {
                if self.rng.gen_bool(0.15) {
                    return StoreAction::LeaveCheckout;
                }
                if flow.step() == CheckoutStep::Payment && self.rng.gen_bool(0.3) {
                    return StoreAction::Checkout(CheckoutAction::EditShipping);
                }
                match self.complete_checkout(flow, false) {
                    StoreAction::PlaceOrder => StoreAction::LeaveCheckout,
                    other => other,
                }
            }
        }
    }

    fn chaos(&mut self, session: &StorefrontSession) -> StoreAction {
        match self.rng.gen_range(0..12) {
            0 | 1 => StoreAction::Configure(self.random_edit(session.catalog(), 0.3)),
            2 => StoreAction::AddToCart,
            3 | 4 => StoreAction::Cart(self.random_cart_edit(session)),
            5 => StoreAction::BeginCheckout,
            6 => StoreAction::Checkout(self.random_customer_edit(true)),
            7 => StoreAction::Checkout(self.random_payment_edit()),
            8 => StoreAction::Checkout(if self.rng.gen_bool(0.5) {
                CheckoutAction::ContinueToPayment
            } else {
                CheckoutAction::EditShipping
            }),
            9 => StoreAction::LeaveCheckout,
            10 => StoreAction::PlaceOrder,
            _ => match self.fill_draft(session) {
                Some(edit) => StoreAction::Configure(edit),
                None => StoreAction::StartOver,
            },
        }
    }

    /// Next edit that passes an unfilled gate with a valid catalog value.
    fn fill_draft(&mut self, session: &StorefrontSession) -> Option<ConfigAction> {
        let draft = session.configuration();
        let catalog = session.catalog();
        if draft.width.is_none() {
            return Some(ConfigAction::SetWidth(Some(self.valid_dimension())));
        }
        if draft.height.is_none() {
            return Some(ConfigAction::SetHeight(Some(self.valid_dimension())));
        }
        if draft.fabric.is_none() {
            return Some(ConfigAction::SelectFabric(self.pick(catalog, CatalogKind::Fabric)));
        }
        if draft.color.is_none() {
            return Some(ConfigAction::SelectColor(self.pick(catalog, CatalogKind::Color)));
        }
        if draft.mounting.is_none() {
            return Some(ConfigAction::SelectMounting(
                self.pick(catalog, CatalogKind::Mounting),
            ));
        }
        if draft.control.is_none() {
            return Some(ConfigAction::SelectControl(self.pick(catalog, CatalogKind::Control)));
        }
        if !draft.is_complete(catalog) {
            return Some(ConfigAction::Reset);
        }
        None
    }

    fn complete_checkout(&mut self, flow: &CheckoutFlow, honest: bool) -> StoreAction {
        match flow {
            CheckoutFlow::Shipping { customer } => {
                if let Some(field) = customer.missing_fields().first() {
                    return StoreAction::Checkout(CheckoutAction::UpdateCustomer(
                        *field,
                        self.customer_value(*field, honest),
                    ));
                }
                if !honest && customer.email_valid() && self.rng.gen_bool(0.5) {
                    return StoreAction::Checkout(CheckoutAction::UpdateCustomer(
                        CustomerField::Email,
                        self.customer_value(CustomerField::Email, false),
                    ));
                }
                if !customer.email_valid() {
                    let fixed = honest || self.rng.gen_bool(0.5);
                    return StoreAction::Checkout(CheckoutAction::UpdateCustomer(
                        CustomerField::Email,
                        self.customer_value(CustomerField::Email, fixed),
                    ));
                }
                StoreAction::Checkout(CheckoutAction::ContinueToPayment)
            }
            CheckoutFlow::Payment { payment, .. } => {
                let missing = [
                    (PaymentField::CardNumber, &payment.card_number),
                    (PaymentField::Expiry, &payment.expiry),
                    (PaymentField::Cvc, &payment.cvc),
                ]
                .into_iter()
                .find(|(_, value)| value.trim().is_empty());
                match missing {
                    Some((field, _)) => StoreAction::Checkout(CheckoutAction::UpdatePayment(
                        field,
                        payment_value(field),
                    )),
                    None => StoreAction::PlaceOrder,
                }
            }
        }
    }

    fn valid_dimension(&mut self) -> Decimal {
        Decimal::from(self.rng.gen_range(30..=300_u32))
    }

    fn pick(&mut self, catalog: &Catalog, kind: CatalogKind) -> String {
        catalog
            .table(kind)
            .choose(&mut self.rng)
            .map(|entry| entry.name.clone())
            .unwrap_or_default()
    }

    fn random_edit(&mut self, catalog: &Catalog, invalid_rate: f64) -> ConfigAction {
        let invalid = self.rng.gen_bool(invalid_rate);
        match self.rng.gen_range(0..8) {
            0 | 1 => {
                let value = if invalid {
                    self.rng.gen_range(0..=29_u32)
                } else {
                    self.rng.gen_range(30..=300_u32)
                };
                let dimension = Some(Decimal::from(value));
                if self.rng.gen_bool(0.5) {
                    ConfigAction::SetWidth(dimension)
                } else {
                    ConfigAction::SetHeight(dimension)
                }
            }
            2 => ConfigAction::SelectFabric(if invalid {
                "Velvet".to_string()
            } else {
                self.pick(catalog, CatalogKind::Fabric)
            }),
            3 => ConfigAction::SelectColor(self.pick(catalog, CatalogKind::Color)),
            4 => ConfigAction::SelectMounting(self.pick(catalog, CatalogKind::Mounting)),
            5 => ConfigAction::SelectControl(if invalid {
                String::new()
            } else {
                self.pick(catalog, CatalogKind::Control)
            }),
            6 => ConfigAction::SetQuantity(self.rng.gen_range(0..=60)),
            _ => {
                if self.rng.gen_bool(0.5) {
                    ConfigAction::IncrementQuantity
                } else {
                    ConfigAction::DecrementQuantity
                }
            }
        }
    }

    fn random_cart_edit(&mut self, session: &StorefrontSession) -> CartAction {
        let live: Vec<CartItemId> = session.cart().items().iter().map(CartItem::id).collect();
        let target = if !self.retired.is_empty() && (live.is_empty() || self.rng.gen_bool(0.1)) {
            self.retired.choose(&mut self.rng).copied()
        } else {
            live.choose(&mut self.rng).copied()
        };
        let Some(id) = target else {
            return CartAction::Add(session.configuration().clone());
        };
        match self.rng.gen_range(0..10) {
            0..=3 => CartAction::UpdateQuantity(id, self.rng.gen_range(0..=60)),
            4 | 5 => CartAction::Increment(id),
            6 | 7 => CartAction::Decrement(id),
            8 => CartAction::Remove(id),
            _ => CartAction::Add(session.configuration().clone()),
        }
    }

    fn random_customer_edit(&mut self, honest: bool) -> CheckoutAction {
        let field = *CustomerField::ALL
            .choose(&mut self.rng)
            .unwrap_or(&CustomerField::Name);
        let value = if self.rng.gen_bool(0.1) {
            "   ".to_string()
        } else {
            self.customer_value(field, honest)
        };
        CheckoutAction::UpdateCustomer(field, value)
    }

    fn random_payment_edit(&mut self) -> CheckoutAction {
        let field = *[PaymentField::CardNumber, PaymentField::Expiry, PaymentField::Cvc]
            .choose(&mut self.rng)
            .unwrap_or(&PaymentField::Cvc);
        let value = if self.rng.gen_bool(0.2) {
            String::new()
        } else {
            payment_value(field)
        };
        CheckoutAction::UpdatePayment(field, value)
    }

    fn customer_value(&mut self, field: CustomerField, honest: bool) -> String {
        let index = self.rng.gen_range(0..CUSTOMER_NAMES.len());
        match field {
            CustomerField::Name => CUSTOMER_NAMES[index].to_string(),
            CustomerField::Email if honest => {
                let local = CUSTOMER_NAMES[index]
                    .split_whitespace()
                    .next()
                    .unwrap_or("shopper")
                    .to_lowercase();
                format!("{local}@example.com")
            }
            CustomerField::Email => BAD_EMAILS[index].to_string(),
            CustomerField::Phone => format!("555-{:04}", self.rng.gen_range(0..10_000)),
            CustomerField::Address => format!("{} Harbour Road", self.rng.gen_range(1..900)),
            CustomerField::City => CITIES[index].to_string(),
            CustomerField::PostalCode => format!("{:05}", self.rng.gen_range(0..100_000)),
        }
    }
}

fn payment_value(field: PaymentField) -> String {
    match field {
        PaymentField::CardNumber => "4242 4242 4242 4242",
        PaymentField::Expiry => "09/29",
        PaymentField::Cvc => "737",
    }
    .to_string()
}
