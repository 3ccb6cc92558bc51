//! In-progress blind configuration, its reducer, and the progress tracker.
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CatalogKind};
use crate::constants::{MAX_QUANTITY, MIN_QUANTITY, PROGRESS_GATE_POINTS};
use crate::error::ValidationError;
use crate::numbers::clamp_quantity;
use crate::pricing;

/// Draft description of a single custom blind. Never carries a price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub width: Option<Decimal>,
    pub height: Option<Decimal>,
    pub fabric: Option<String>,
    pub color: Option<String>,
    pub mounting: Option<String>,
    pub control: Option<String>,
    quantity: u32,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            fabric: None,
            color: None,
            mounting: None,
            control: None,
            quantity: MIN_QUANTITY,
        }
    }
}

/// Discrete edits a user can make to the draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigAction {
    SetWidth(Option<Decimal>),
    SetHeight(Option<Decimal>),
    SelectFabric(String),
    SelectColor(String),
    SelectMounting(String),
    SelectControl(String),
    SetQuantity(u32),
    IncrementQuantity,
    DecrementQuantity,
    Reset,
}

/// The four independent progress gates, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressGate {
    Dimensions,
    Fabric,
    Color,
    Options,
}

impl ProgressGate {
    pub const ALL: [Self; 4] = [Self::Dimensions, Self::Fabric, Self::Color, Self::Options];
}

fn selection(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl Configuration {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Set the quantity, clamped into the accepted range.
    pub const fn set_quantity(&mut self, quantity: u32) {
        self.quantity = clamp_quantity(quantity);
    }

    /// Apply one edit, producing the next draft.
    #[must_use]
    pub fn reduce(mut self, action: ConfigAction) -> Self {
        match action {
            ConfigAction::SetWidth(width) => self.width = width,
            ConfigAction::SetHeight(height) => self.height = height,
            ConfigAction::SelectFabric(name) => self.fabric = selection(name),
            ConfigAction::SelectColor(name) => self.color = selection(name),
            ConfigAction::SelectMounting(name) => self.mounting = selection(name),
            ConfigAction::SelectControl(name) => self.control = selection(name),
            ConfigAction::SetQuantity(quantity) => self.set_quantity(quantity),
            ConfigAction::IncrementQuantity => {
                self.set_quantity(self.quantity.saturating_add(1).min(MAX_QUANTITY));
            }
            ConfigAction::DecrementQuantity => {
                self.set_quantity(self.quantity.saturating_sub(1).max(MIN_QUANTITY));
            }
            ConfigAction::Reset => return Self::default(),
        }
        self
    }

    #[must_use]
    pub const fn has_dimensions(&self) -> bool {
        self.width.is_some() && self.height.is_some()
    }

    /// Whether a gate's fields are filled in. Range checks are not applied here.
    #[must_use]
    pub const fn gate_passed(&self, gate: ProgressGate) -> bool {
        match gate {
            ProgressGate::Dimensions => self.has_dimensions(),
            ProgressGate::Fabric => self.fabric.is_some(),
            ProgressGate::Color => self.color.is_some(),
            ProgressGate::Options => self.mounting.is_some() && self.control.is_some(),
        }
    }

    /// Completion percentage: 25 points per passed gate.
    #[must_use]
    pub fn progress(&self) -> u8 {
        ProgressGate::ALL
            .iter()
            .filter(|gate| self.gate_passed(**gate))
            .map(|_| PROGRESS_GATE_POINTS)
            .sum()
    }

    /// Fully filled in with dimensions inside the accepted range.
    #[must_use]
    pub fn is_complete(&self, catalog: &Catalog) -> bool {
        self.progress() == 100 && self.dimensions_in_range(catalog)
    }

    fn dimensions_in_range(&self, catalog: &Catalog) -> bool {
        match (self.width, self.height) {
            (Some(width), Some(height)) => {
                catalog.rules.dimension_in_range(width) && catalog.rules.dimension_in_range(height)
            }
            _ => false,
        }
    }

    fn selection_known(&self, catalog: &Catalog, kind: CatalogKind) -> bool {
        let selected = match kind {
            CatalogKind::Fabric => self.fabric.as_deref(),
            CatalogKind::Color => self.color.as_deref(),
            CatalogKind::Mounting => self.mounting.as_deref(),
            CatalogKind::Control => self.control.as_deref(),
        };
        selected.is_some_and(|name| catalog.contains(kind, name))
    }

    /// Check the draft can become a cart item.
    ///
    /// Categories are reported in order: dimensions present, dimensions in
    /// range, then all four selections present in the catalog.
    ///
    /// # Errors
    ///
    /// Returns the first failing category.
    pub fn validate_for_cart(&self, catalog: &Catalog) -> Result<(), ValidationError> {
        if !self.has_dimensions() {
            return Err(ValidationError::MissingDimensions);
        }
        if !self.dimensions_in_range(catalog) {
            return Err(ValidationError::DimensionOutOfRange);
        }
        if !CatalogKind::ALL
            .iter()
            .all(|kind| self.selection_known(catalog, *kind))
        {
            return Err(ValidationError::IncompleteSelection);
        }
        Ok(())
    }

    /// Mirrors the add-to-cart button: fully filled in and priced above zero.
    #[must_use]
    pub fn can_add_to_cart(&self, catalog: &Catalog) -> bool {
        self.progress() == 100 && pricing::unit_price(self, catalog) > Decimal::ZERO
    }
}
