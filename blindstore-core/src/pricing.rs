//! Area-based pricing for custom blinds.
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CatalogKind};
use crate::configuration::Configuration;

/// Price breakdown for the configurator summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Square metres.
    pub area: Decimal,
    pub base: Decimal,
    pub fabric_cost: Decimal,
    pub control_cost: Decimal,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub total: Decimal,
}

impl PriceQuote {
    /// A zero quote means the draft cannot be priced yet.
    #[must_use]
    pub fn is_priced(&self) -> bool {
        self.unit_price > Decimal::ZERO
    }
}

/// Area in square metres, or `None` while either dimension is missing or not
/// positive, or when the product does not fit a `Decimal`.
#[must_use]
pub fn area_sqm(
    width: Option<Decimal>,
    height: Option<Decimal>,
    catalog: &Catalog,
) -> Option<Decimal> {
    match (width, height) {
        (Some(width), Some(height)) if width > Decimal::ZERO && height > Decimal::ZERO => {
            width.checked_mul(height)?.checked_div(catalog.rules.area_divisor)
        }
        _ => None,
    }
}

/// Full price breakdown for a draft.
///
/// Color and mounting never affect price; unknown fabric or control
/// identifiers contribute nothing. A draft whose price overflows quotes as
/// unpriced.
#[must_use]
pub fn quote(config: &Configuration, catalog: &Catalog) -> PriceQuote {
    let quantity = config.quantity();
    priced(config, catalog, quantity).unwrap_or(PriceQuote {
        quantity,
        ..PriceQuote::default()
    })
}

fn priced(config: &Configuration, catalog: &Catalog, quantity: u32) -> Option<PriceQuote> {
    let area = area_sqm(config.width, config.height, catalog)?;
    let base = area.checked_mul(catalog.rules.base_rate_per_sqm)?;
    let fabric_cost = catalog
        .price_of(CatalogKind::Fabric, config.fabric.as_deref())
        .checked_mul(area)?;
    let control_cost = catalog.price_of(CatalogKind::Control, config.control.as_deref());
    let unit_price = base.checked_add(fabric_cost)?.checked_add(control_cost)?;

    Some(PriceQuote {
        area,
        base,
        fabric_cost,
        control_cost,
        unit_price,
        quantity,
        total: unit_price.checked_mul(Decimal::from(quantity))?,
    })
}

/// Unit price of a draft; exactly zero while dimensions are missing.
#[must_use]
pub fn unit_price(config: &Configuration, catalog: &Catalog) -> Decimal {
    quote(config, catalog).unit_price
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::ConfigAction;
    use crate::numbers::parse_dimension_input;
    use rust_decimal_macros::dec;

    fn catalog() -> Catalog {
        Catalog::load_from_static().unwrap()
    }

    fn sized(width: Decimal, height: Decimal) -> Configuration {
        Configuration::new()
            .reduce(ConfigAction::SetWidth(Some(width)))
            .reduce(ConfigAction::SetHeight(Some(height)))
    }

    #[test]
    fn blackout_cordless_reference_quote() {
        let catalog = catalog();
        let config = sized(dec!(120), dec!(180))
            .reduce(ConfigAction::SelectFabric("Blackout".into()))
            .reduce(ConfigAction::SelectControl("Cordless".into()))
            .reduce(ConfigAction::SetQuantity(2));
        let quote = quote(&config, &catalog);
        assert_eq!(quote.area, dec!(2.16));
        assert_eq!(quote.base, dec!(172.8));
        assert_eq!(quote.fabric_cost, dec!(32.4));
        assert_eq!(quote.control_cost, dec!(25));
        assert_eq!(quote.unit_price, dec!(230.2));
        assert_eq!(quote.total, dec!(460.4));
        assert!(quote.is_priced());
    }

    #[test]
    fn missing_or_zero_dimension_prices_to_zero() {
        let catalog = catalog();
        let config = Configuration::new()
            .reduce(ConfigAction::SetWidth(Some(dec!(120))))
            .reduce(ConfigAction::SelectControl("Motorized".into()));
        assert_eq!(unit_price(&config, &catalog), Decimal::ZERO);

        let config = config.reduce(ConfigAction::SetHeight(Some(Decimal::ZERO)));
        assert_eq!(unit_price(&config, &catalog), Decimal::ZERO);
        assert!(!quote(&config, &catalog).is_priced());

        let config = config.reduce(ConfigAction::SetHeight(Some(dec!(-10))));
        assert_eq!(unit_price(&config, &catalog), Decimal::ZERO);
    }

    #[test]
    fn oversized_dimensions_quote_as_unpriced() {
        let catalog = catalog();
        let config = Configuration::new()
            .reduce(ConfigAction::SetWidth(parse_dimension_input(
                "79228162514264337593543950335",
            )))
            .reduce(ConfigAction::SetHeight(parse_dimension_input("2")))
            .reduce(ConfigAction::SelectFabric("Blackout".into()))
            .reduce(ConfigAction::SelectControl("Cordless".into()))
            .reduce(ConfigAction::SetQuantity(3));
        assert_eq!(area_sqm(config.width, config.height, &catalog), None);
        let quote = quote(&config, &catalog);
        assert!(!quote.is_priced());
        assert_eq!(quote.total, Decimal::ZERO);
        assert_eq!(quote.quantity, 3);
        assert!(!config.can_add_to_cart(&catalog));

        let wide = Configuration::new()
            .reduce(ConfigAction::SetWidth(Some(Decimal::MAX)))
            .reduce(ConfigAction::SetHeight(Some(dec!(10000))))
            .reduce(ConfigAction::SelectFabric("Blackout".into()));
        assert!(!super::quote(&wide, &catalog).is_priced());
    }

    #[test]
    fn color_and_mounting_do_not_change_price() {
        let catalog = catalog();
        let base = sized(dec!(90), dec!(150)).reduce(ConfigAction::SelectFabric("Sheer".into()));
        let dressed = base
            .clone()
            .reduce(ConfigAction::SelectColor("Charcoal".into()))
            .reduce(ConfigAction::SelectMounting("Outside Mount".into()));
        assert_eq!(unit_price(&base, &catalog), unit_price(&dressed, &catalog));
    }

    #[test]
    fn unknown_fabric_contributes_nothing() {
        let catalog = catalog();
        let plain = sized(dec!(100), dec!(100));
        let unknown = plain.clone().reduce(ConfigAction::SelectFabric("Velvet".into()));
        assert_eq!(unit_price(&plain, &catalog), dec!(80));
        assert_eq!(unit_price(&unknown, &catalog), dec!(80));
    }

    #[test]
    fn price_is_monotone_in_area() {
        let catalog = catalog();
        for fabric in ["Blackout", "Light Filtering", "Sheer", "Solar Screen"] {
            for control in ["Chain", "Cordless", "Motorized"] {
                let mut previous = Decimal::ZERO;
                for side in (30..=300).step_by(15) {
                    let side = Decimal::from(side);
                    let config = sized(side, side)
                        .reduce(ConfigAction::SelectFabric(fabric.into()))
                        .reduce(ConfigAction::SelectControl(control.into()));
                    let price = unit_price(&config, &catalog);
                    assert!(price >= Decimal::ZERO);
                    assert!(price >= previous, "{fabric}/{control} dropped at {side}");
                    previous = price;
                }
            }
        }
    }
}
