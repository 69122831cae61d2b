pub mod entities;
pub mod validity;

pub use entities::*;
pub use validity::{ValidityLabel, validity_label};
