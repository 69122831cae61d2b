pub mod common;
pub mod ingredient;
pub mod offer;
pub mod price_ledger;
pub mod price_update;
pub mod recipe;
pub mod unit;
