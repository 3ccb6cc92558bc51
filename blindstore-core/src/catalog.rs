//! Catalog tables: fabrics, colors, mountings and control mechanisms.
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::rules::{PricingRules, PricingRulesError};

const DEFAULT_CATALOG_DATA: &str = include_str!("../data/catalog.json");

/// Which catalog table an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Fabric,
    Color,
    Mounting,
    Control,
}

impl CatalogKind {
    pub const ALL: [Self; 4] = [Self::Fabric, Self::Color, Self::Mounting, Self::Control];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fabric => "fabric",
            Self::Color => "color",
            Self::Mounting => "mounting",
            Self::Control => "control",
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single selectable option.
///
/// For fabrics `price` is charged per square metre, for controls it is a flat
/// surcharge; colors and mountings carry no price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub badge: Option<String>,
    /// Hex colour code, colors only.
    #[serde(default)]
    pub swatch: Option<String>,
}

impl CatalogEntry {
    #[must_use]
    pub fn new(name: impl Into<String>, price: Decimal) -> Self {
        Self {
            name: name.into(),
            price,
            description: String::new(),
            badge: None,
            swatch: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog JSON parsing error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{kind} table is empty")]
    EmptyTable { kind: CatalogKind },
    #[error("duplicate {kind} identifier '{name}'")]
    DuplicateEntry { kind: CatalogKind, name: String },
    #[error("{kind} '{name}' has an empty identifier")]
    BlankIdentifier { kind: CatalogKind, name: String },
    #[error("{kind} '{name}' has negative price {price}")]
    NegativePrice {
        kind: CatalogKind,
        name: String,
        price: Decimal,
    },
    #[error("invalid pricing rules: {0}")]
    Rules(#[from] PricingRulesError),
}

/// Complete reference data for the configurator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub fabrics: Vec<CatalogEntry>,
    pub colors: Vec<CatalogEntry>,
    pub mountings: Vec<CatalogEntry>,
    pub controls: Vec<CatalogEntry>,
    #[serde(default)]
    pub rules: PricingRules,
}

impl Catalog {
    /// Parse and validate a catalog document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or any table breaks an invariant.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load the catalog shipped with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded document fails validation.
    pub fn load_from_static() -> Result<Self, CatalogError> {
        Self::from_json(DEFAULT_CATALOG_DATA)
    }

    /// Check table and rule invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for kind in CatalogKind::ALL {
            let table = self.table(kind);
            if table.is_empty() {
                return Err(CatalogError::EmptyTable { kind });
            }
            let mut seen = HashSet::with_capacity(table.len());
            for entry in table {
                if entry.name.trim().is_empty() {
                    return Err(CatalogError::BlankIdentifier {
                        kind,
                        name: entry.name.clone(),
                    });
                }
                if !seen.insert(entry.name.as_str()) {
                    return Err(CatalogError::DuplicateEntry {
                        kind,
                        name: entry.name.clone(),
                    });
                }
                if entry.price < Decimal::ZERO {
                    return Err(CatalogError::NegativePrice {
                        kind,
                        name: entry.name.clone(),
                        price: entry.price,
                    });
                }
            }
        }
        self.rules.validate()?;
        Ok(())
    }

    #[must_use]
    pub fn table(&self, kind: CatalogKind) -> &[CatalogEntry] {
        match kind {
            CatalogKind::Fabric => &self.fabrics,
            CatalogKind::Color => &self.colors,
            CatalogKind::Mounting => &self.mountings,
            CatalogKind::Control => &self.controls,
        }
    }

    /// Find an entry by identifier.
    #[must_use]
    pub fn find(&self, kind: CatalogKind, name: &str) -> Option<&CatalogEntry> {
        self.table(kind).iter().find(|entry| entry.name == name)
    }

    #[must_use]
    pub fn contains(&self, kind: CatalogKind, name: &str) -> bool {
        self.find(kind, name).is_some()
    }

    /// Price contribution of an entry, zero when the identifier is unknown.
    #[must_use]
    pub fn price_of(&self, kind: CatalogKind, name: Option<&str>) -> Decimal {
        name.and_then(|name| self.find(kind, name))
            .map_or(Decimal::ZERO, |entry| entry.price)
    }

    #[must_use]
    pub fn fabric(&self, name: &str) -> Option<&CatalogEntry> {
        self.find(CatalogKind::Fabric, name)
    }

    #[must_use]
    pub fn color(&self, name: &str) -> Option<&CatalogEntry> {
        self.find(CatalogKind::Color, name)
    }

    #[must_use]
    pub fn mounting(&self, name: &str) -> Option<&CatalogEntry> {
        self.find(CatalogKind::Mounting, name)
    }

    #[must_use]
    pub fn control(&self, name: &str) -> Option<&CatalogEntry> {
        self.find(CatalogKind::Control, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn static_catalog_loads_storefront_tables() {
        let catalog = Catalog::load_from_static().unwrap();
        assert_eq!(catalog.fabrics.len(), 4);
        assert_eq!(catalog.colors.len(), 10);
        assert_eq!(catalog.mountings.len(), 2);
        assert_eq!(catalog.controls.len(), 3);

        let blackout = catalog.fabric("Blackout").unwrap();
        assert_eq!(blackout.price, dec!(15));
        assert_eq!(blackout.badge.as_deref(), Some("Popular"));
        assert_eq!(catalog.control("Motorized").unwrap().price, dec!(150));
        assert_eq!(catalog.control("Chain").unwrap().price, Decimal::ZERO);
        assert_eq!(
            catalog.color("Sage").unwrap().swatch.as_deref(),
            Some("#9CAF88")
        );
        assert!(catalog.mounting("Inside Mount").is_some());
        assert_eq!(catalog.rules, PricingRules::default());
    }

    #[test]
    fn price_of_unknown_is_zero() {
        let catalog = Catalog::load_from_static().unwrap();
        assert_eq!(
            catalog.price_of(CatalogKind::Fabric, Some("Velvet")),
            Decimal::ZERO
        );
        assert_eq!(catalog.price_of(CatalogKind::Control, None), Decimal::ZERO);
        assert_eq!(
            catalog.price_of(CatalogKind::Control, Some("Cordless")),
            dec!(25)
        );
    }

    #[test]
    fn rejects_duplicates_and_negative_prices() {
        let json = r#"{
            "fabrics": [{ "name": "Sheer", "price": 10 }, { "name": "Sheer", "price": 11 }],
            "colors": [{ "name": "White" }],
            "mountings": [{ "name": "Inside Mount" }],
            "controls": [{ "name": "Chain" }]
        }"#;
        let err = Catalog::from_json(json).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::DuplicateEntry {
                kind: CatalogKind::Fabric,
                ..
            }
        ));

        let json = r#"{
            "fabrics": [{ "name": "Sheer", "price": 10 }],
            "colors": [{ "name": "White" }],
            "mountings": [{ "name": "Inside Mount" }],
            "controls": [{ "name": "Chain", "price": -5 }]
        }"#;
        let err = Catalog::from_json(json).unwrap_err();
        assert!(err.to_string().contains("negative price"));
    }

    #[test]
    fn rejects_empty_tables_and_bad_json() {
        let json = r#"{ "fabrics": [], "colors": [], "mountings": [], "controls": [] }"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(CatalogError::EmptyTable {
                kind: CatalogKind::Fabric
            })
        ));
        assert!(matches!(
            Catalog::from_json("{ not json"),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn rule_violations_surface_through_catalog() {
        let json = r#"{
            "fabrics": [{ "name": "Sheer", "price": 10 }],
            "colors": [{ "name": "White" }],
            "mountings": [{ "name": "Inside Mount" }],
            "controls": [{ "name": "Chain" }],
            "rules": { "tax_rate": 2 }
        }"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(CatalogError::Rules(PricingRulesError::TaxRateRange { .. }))
        ));
    }
}
