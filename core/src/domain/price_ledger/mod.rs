pub mod cursor;
pub mod entities;
pub mod ports;
pub mod services;
pub mod value_objects;

pub use cursor::PriceHistoryCursor;
pub use entities::*;
pub use ports::*;
pub use value_objects::*;
