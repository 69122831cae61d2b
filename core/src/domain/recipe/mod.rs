pub mod calculator;
pub mod entities;
pub mod ports;
pub mod services;
pub mod value_objects;

pub use calculator::{calculate_breakdown, compute_cost};
pub use entities::*;
pub use ports::*;
pub use value_objects::*;
