pub mod assets;
pub mod reports;
pub mod shopper;
pub mod tester;

pub use assets::load_catalog;
pub use shopper::Shopper;
pub use tester::*;
