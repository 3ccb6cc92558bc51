//! Blindstore Core
//!
//! Order composition and pricing engine for a made-to-order window blind
//! storefront. This crate turns configuration choices into priced cart items,
//! aggregates the cart into checkout totals, gates the two-step checkout and
//! finalizes orders, without UI or platform-specific dependencies.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod configuration;
pub mod constants;
pub mod error;
pub mod numbers;
pub mod order;
pub mod pricing;
pub mod rules;
pub mod session;
pub mod totals;

use anyhow::Context;
use std::sync::Arc;

// Re-export commonly used types
pub use cart::{Cart, CartAction, CartItem, CartItemId};
pub use catalog::{Catalog, CatalogEntry, CatalogError, CatalogKind};
pub use checkout::{
    CheckoutAction, CheckoutFlow, CheckoutStep, CustomerField, CustomerInfo, PaymentDetails,
    PaymentField,
};
pub use configuration::{ConfigAction, Configuration, ProgressGate};
pub use error::{CheckoutError, StoreError, ValidationError};
pub use numbers::{parse_dimension_input, parse_quantity_input, round_money};
pub use order::{Order, OrderId, OrderStamp, OrderTimeline, finalize};
pub use pricing::{PriceQuote, area_sqm, quote, unit_price};
pub use rules::{PricingRules, PricingRulesError};
pub use session::{StoreAction, StoreEvent, StorefrontSession};
pub use totals::{CartSummary, CheckoutTotals, free_shipping_remaining, shipping, tax, total};

/// Trait for abstracting catalog loading.
/// Platform-specific implementations should provide this
pub trait CatalogLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the catalog tables and pricing rules.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read or parsed.
    fn load_catalog(&self) -> Result<Catalog, Self::Error>;
}

/// Loader for the catalog embedded in this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCatalogLoader;

impl CatalogLoader for StaticCatalogLoader {
    type Error = CatalogError;

    fn load_catalog(&self) -> Result<Catalog, Self::Error> {
        Catalog::load_from_static()
    }
}

/// Main storefront engine for opening shopping sessions
pub struct StorefrontEngine<L>
where
    L: CatalogLoader,
{
    loader: L,
}

impl<L> StorefrontEngine<L>
where
    L: CatalogLoader,
{
    /// Create a new engine with the provided catalog loader
    pub const fn new(loader: L) -> Self {
        Self { loader }
    }

    /// Load and validate the catalog once, ready to share across sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or breaks an invariant.
    pub fn load_catalog(&self) -> anyhow::Result<Arc<Catalog>> {
        let catalog = self
            .loader
            .load_catalog()
            .context("failed to load storefront catalog")?;
        catalog.validate().context("storefront catalog is invalid")?;
        log::debug!(
            "catalog loaded: {} fabrics, {} colors, {} mountings, {} controls",
            catalog.fabrics.len(),
            catalog.colors.len(),
            catalog.mountings.len(),
            catalog.controls.len()
        );
        Ok(Arc::new(catalog))
    }

    /// Open a fresh session over a newly loaded catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or breaks an invariant.
    pub fn open_session(&self) -> anyhow::Result<StorefrontSession> {
        self.load_catalog().map(StorefrontSession::new)
    }
}

impl Default for StorefrontEngine<StaticCatalogLoader> {
    fn default() -> Self {
        Self::new(StaticCatalogLoader)
    }
}
