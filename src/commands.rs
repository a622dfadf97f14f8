//! Operations the app screens call. Each returns either a value or the
//! [`Alert`] the screen should show.

use crate::{
    errors::{Alert, AppError},
    filters::FilterCriteria,
    generation::GenerationSnapshot,
    models::Recipe,
    stores::{AddOutcome, CollectionKind},
    AppState,
};

pub async fn generate_recipe(
    state: &AppState,
    ingredients: Vec<String>,
    dietary_preference: Option<String>,
) -> Result<Recipe, Alert> {
    let preference = dietary_preference.or_else(|| state.settings.get().dietary_preference);
    state
        .generator
        .generate(ingredients, preference)
        .await
        .map_err(Alert::from)
}

pub async fn retry_generation(state: &AppState) -> Result<Recipe, Alert> {
    state.generator.retry().await.map_err(Alert::from)
}

pub fn generation_status(state: &AppState) -> GenerationSnapshot {
    state.generator.snapshot()
}

/// Returns `true` when the recipe was newly saved.
pub fn save_recipe(state: &AppState, recipe: Recipe) -> bool {
    state.saved.add(recipe) == AddOutcome::Added
}

/// Saves the recipe, or unsaves it if a recipe with that title is already
/// saved. Returns whether it is saved afterwards.
pub fn toggle_saved(state: &AppState, recipe: Recipe) -> bool {
    if state.saved.remove(&recipe.title) {
        false
    } else {
        state.saved.add(recipe);
        true
    }
}

pub fn is_saved(state: &AppState, title: &str) -> bool {
    state.saved.contains(title)
}

pub fn get_recipe(state: &AppState, kind: CollectionKind, title: &str) -> Result<Recipe, Alert> {
    state
        .collection(kind)
        .get(title)
        .ok_or_else(|| AppError::NotFound(title.to_string()).into())
}

pub fn delete_recipe(state: &AppState, kind: CollectionKind, title: &str) -> bool {
    state.collection(kind).remove(title)
}

pub fn clear_collection(state: &AppState, kind: CollectionKind) {
    state.collection(kind).clear_all();
}

/// Adds a tag and returns the recipe's tags afterwards.
pub fn add_tag(
    state: &AppState,
    kind: CollectionKind,
    title: &str,
    tag: &str,
) -> Result<Vec<String>, Alert> {
    if tag.trim().is_empty() {
        return Err(AppError::validation("Tags can't be empty").into());
    }
    let store = state.collection(kind);
    store.add_tag(title, tag);
    store
        .get(title)
        .map(|recipe| recipe.tags)
        .ok_or_else(|| AppError::NotFound(title.to_string()).into())
}

pub fn remove_tag(
    state: &AppState,
    kind: CollectionKind,
    title: &str,
    tag: &str,
) -> Result<Vec<String>, Alert> {
    let store = state.collection(kind);
    store.remove_tag(title, tag);
    store
        .get(title)
        .map(|recipe| recipe.tags)
        .ok_or_else(|| AppError::NotFound(title.to_string()).into())
}

pub fn set_tags(
    state: &AppState,
    kind: CollectionKind,
    title: &str,
    tags: Vec<String>,
) -> Result<(), Alert> {
    if state.collection(kind).set_all_tags(title, tags) {
        Ok(())
    } else {
        Err(AppError::NotFound(title.to_string()).into())
    }
}

pub fn rate_recipe(
    state: &AppState,
    kind: CollectionKind,
    title: &str,
    rating: f64,
) -> Result<(), Alert> {
    if !(0.0..=5.0).contains(&rating) {
        return Err(AppError::validation("Ratings go from 0 to 5 stars").into());
    }
    if state.collection(kind).set_rating(title, rating) {
        Ok(())
    } else {
        Err(AppError::NotFound(title.to_string()).into())
    }
}

/// Replaces the active criteria and returns the resulting view.
pub fn filter_recipes(
    state: &AppState,
    kind: CollectionKind,
    criteria: FilterCriteria,
) -> Vec<Recipe> {
    state.collection(kind).set_criteria(criteria);
    state.visible_recipes(kind)
}

pub fn reset_filters(state: &AppState, kind: CollectionKind) -> Vec<Recipe> {
    state.collection(kind).reset_filters();
    state.visible_recipes(kind)
}

pub fn list_tags(state: &AppState, kind: CollectionKind) -> Vec<String> {
    state.collection(kind).distinct_tags()
}
