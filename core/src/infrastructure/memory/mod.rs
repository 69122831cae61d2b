//! In-process adapters for the persistence ports. State lives behind a tokio
//! `RwLock` and is lost with the process.

pub mod calculation_repository;
pub mod ingredient_repository;
pub mod price_history_repository;
pub mod recipe_repository;
pub mod settings_repository;

pub use calculation_repository::InMemoryPriceCalculationRepository;
pub use ingredient_repository::InMemoryIngredientRepository;
pub use price_history_repository::InMemoryPriceHistoryRepository;
pub use recipe_repository::InMemoryRecipeRepository;
pub use settings_repository::InMemoryPriceSettingsRepository;
