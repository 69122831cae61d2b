pub mod services;
pub mod value_objects;

pub use services::{convert_unit_price, normalize};
pub use value_objects::{Unit, UnitFamily};
