mod recipe;

pub use recipe::{NutritionInfo, Recipe, RecipeStep};
