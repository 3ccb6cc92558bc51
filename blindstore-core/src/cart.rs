//! Shopping cart of priced, made-to-order line items.
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::{Catalog, CatalogKind};
use crate::configuration::Configuration;
use crate::constants::{MAX_QUANTITY, MIN_QUANTITY};
use crate::error::ValidationError;
use crate::numbers::clamp_quantity;
use crate::pricing;

/// Session-unique line identifier. Never reused, never renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CartItemId(u64);

impl CartItemId {
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CartItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item-{}", self.0)
    }
}

/// Priced snapshot of an accepted configuration. Only the quantity may change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    id: CartItemId,
    pub width: Decimal,
    pub height: Decimal,
    pub fabric: String,
    pub fabric_price: Decimal,
    pub color: String,
    pub mounting: String,
    pub control: String,
    pub control_price: Decimal,
    quantity: u32,
    unit_price: Decimal,
    total_price: Decimal,
}

impl CartItem {
    /// Snapshot a draft into a line item.
    ///
    /// # Errors
    ///
    /// Returns the draft's validation category if it cannot be accepted.
    pub fn from_configuration(
        id: CartItemId,
        config: &Configuration,
        catalog: &Catalog,
    ) -> Result<Self, ValidationError> {
        config.validate_for_cart(catalog)?;

        let (Some(width), Some(height)) = (config.width, config.height) else {
            return Err(ValidationError::MissingDimensions);
        };
        let (Some(fabric), Some(color), Some(mounting), Some(control)) = (
            config.fabric.clone(),
            config.color.clone(),
            config.mounting.clone(),
            config.control.clone(),
        ) else {
            return Err(ValidationError::IncompleteSelection);
        };

        let unit_price = pricing::unit_price(config, catalog);
        let quantity = config.quantity();
        Ok(Self {
            id,
            width,
            height,
            fabric_price: catalog.price_of(CatalogKind::Fabric, Some(&fabric)),
            control_price: catalog.price_of(CatalogKind::Control, Some(&control)),
            fabric,
            color,
            mounting,
            control,
            quantity,
            unit_price,
            total_price: unit_price * Decimal::from(quantity),
        })
    }

    #[must_use]
    pub const fn id(&self) -> CartItemId {
        self.id
    }

    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Unit price fixed when the item entered the cart.
    #[must_use]
    pub const fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    #[must_use]
    pub const fn total_price(&self) -> Decimal {
        self.total_price
    }

    /// Clamp and apply a new quantity, recomputing the line total.
    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = clamp_quantity(quantity);
        self.total_price = self.unit_price * Decimal::from(self.quantity);
    }
}

/// Quantity and removal edits on existing lines, plus insertion of a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    Add(Configuration),
    UpdateQuantity(CartItemId, u32),
    Increment(CartItemId),
    Decrement(CartItemId),
    Remove(CartItemId),
    Clear,
}

/// Insertion-ordered cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
    next_id: u64,
}

impl Cart {
    /// Create a new empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Find an item by ID.
    #[must_use]
    pub fn get(&self, id: CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    fn get_mut(&mut self, id: CartItemId) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    /// Validate, price and append a draft. Returns the new line's ID.
    ///
    /// # Errors
    ///
    /// Returns the draft's validation category; the cart is left unchanged.
    pub fn add_item(
        &mut self,
        config: &Configuration,
        catalog: &Catalog,
    ) -> Result<CartItemId, ValidationError> {
        let id = CartItemId(self.next_id.saturating_add(1));
        let item = CartItem::from_configuration(id, config, catalog)?;
        self.next_id = id.0;
        log::debug!(
            "cart add {id}: {}x {} {}x{} @ {}",
            item.quantity,
            item.fabric,
            item.width,
            item.height,
            item.unit_price
        );
        self.items.push(item);
        Ok(id)
    }

    /// Set a line's quantity, clamped to the accepted range. Unknown IDs are ignored.
    pub fn update_quantity(&mut self, id: CartItemId, quantity: u32) {
        if let Some(item) = self.get_mut(id) {
            item.set_quantity(quantity);
            log::debug!("cart quantity {id} -> {}", item.quantity);
        }
    }

    /// Step a line's quantity by one toward the upper bound.
    pub fn increment(&mut self, id: CartItemId) {
        if let Some(current) = self.get(id).map(CartItem::quantity) {
            self.update_quantity(id, current.saturating_add(1).min(MAX_QUANTITY));
        }
    }

    /// Step a line's quantity by one toward the lower bound.
    pub fn decrement(&mut self, id: CartItemId) {
        if let Some(current) = self.get(id).map(CartItem::quantity) {
            self.update_quantity(id, current.saturating_sub(1).max(MIN_QUANTITY));
        }
    }

    /// Remove a line. Unknown IDs are ignored; remaining IDs are untouched.
    pub fn remove_item(&mut self, id: CartItemId) {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        if self.items.len() != before {
            log::debug!("cart remove {id}");
        }
    }

    /// Drop every line while keeping the ID sequence.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// An empty cart that continues this cart's ID sequence.
    #[must_use]
    pub const fn emptied(&self) -> Self {
        Self {
            items: Vec::new(),
            next_id: self.next_id,
        }
    }

    /// Apply one action, producing the next cart.
    ///
    /// # Errors
    ///
    /// `Add` fails with the draft's validation category; `self` is untouched.
    pub fn reduce(&self, action: CartAction, catalog: &Catalog) -> Result<Self, ValidationError> {
        let mut next = self.clone();
        match action {
            CartAction::Add(config) => {
                next.add_item(&config, catalog)?;
            }
            CartAction::UpdateQuantity(id, quantity) => next.update_quantity(id, quantity),
            CartAction::Increment(id) => next.increment(id),
            CartAction::Decrement(id) => next.decrement(id),
            CartAction::Remove(id) => next.remove_item(id),
            CartAction::Clear => next.clear(),
        }
        Ok(next)
    }

    /// Sum of line totals, recomputed on every call.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartItem::total_price).sum()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(CartItem::quantity).sum()
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
