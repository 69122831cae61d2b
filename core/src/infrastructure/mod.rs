pub mod memory;
pub mod notifier;
pub mod price_source;
