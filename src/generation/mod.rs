pub mod controller;
pub mod provider;
pub mod templates;

pub use controller::{GenerationController, GenerationSnapshot, GenerationStatus};
pub use provider::{normalize_ingredients, MockRecipeProvider, RecipeProvider, TimeoutProvider};
pub use templates::{RecipeTemplate, TEMPLATES};
