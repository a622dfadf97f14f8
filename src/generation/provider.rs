use std::{
    collections::HashSet,
    sync::{Mutex, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use uuid::Uuid;

use super::templates::{select_candidates, RecipeTemplate, TEMPLATES};
use crate::errors::AppError;
use crate::models::Recipe;

/// Anything that can turn an ingredient list into a recipe.
#[async_trait]
pub trait RecipeProvider: Send + Sync {
    async fn generate_recipe(
        &self,
        ingredients: &[String],
        dietary_preference: Option<&str>,
    ) -> Result<Recipe, AppError>;
}

/// Trims entries, drops blanks and case-insensitive repeats. An empty result
/// is a validation error.
pub fn normalize_ingredients(ingredients: &[String]) -> Result<Vec<String>, AppError> {
    let mut seen = HashSet::new();
    let normalized: Vec<String> = ingredients
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .filter(|item| seen.insert(item.to_lowercase()))
        .map(str::to_string)
        .collect();

    if normalized.is_empty() {
        return Err(AppError::validation("Add at least one ingredient"));
    }
    Ok(normalized)
}

/// Picks a random matching template after an artificial delay that stands
/// in for network latency.
pub struct MockRecipeProvider {
    delay: Duration,
    templates: &'static [RecipeTemplate],
    rng: Mutex<StdRng>,
}

impl MockRecipeProvider {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            templates: TEMPLATES,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic selection for tests.
    pub fn with_seed(delay: Duration, seed: u64) -> Self {
        Self {
            delay,
            templates: TEMPLATES,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn with_templates(mut self, templates: &'static [RecipeTemplate]) -> Self {
        self.templates = templates;
        self
    }

    fn choose(&self, candidates: &[&'static RecipeTemplate]) -> Option<&'static RecipeTemplate> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        candidates.choose(&mut *rng).copied()
    }
}

#[async_trait]
impl RecipeProvider for MockRecipeProvider {
    async fn generate_recipe(
        &self,
        ingredients: &[String],
        dietary_preference: Option<&str>,
    ) -> Result<Recipe, AppError> {
        let ingredients = normalize_ingredients(ingredients)?;
        let preference = dietary_preference
            .map(str::trim)
            .filter(|preference| !preference.is_empty());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let candidates = select_candidates(self.templates, &ingredients, preference);
        debug!(
            "{} template candidates for {} ingredients",
            candidates.len(),
            ingredients.len()
        );
        let template = self
            .choose(&candidates)
            .ok_or_else(|| AppError::generation("no recipe template is available"))?;

        let mut recipe = template.instantiate(&ingredients, preference);
        if recipe.title.trim().is_empty() || recipe.ingredients.is_empty() {
            return Err(AppError::generation("template produced an incomplete recipe"));
        }
        recipe.id = Some(Uuid::new_v4().to_string());
        recipe.created_at = Some(Utc::now());

        info!("Generated \"{}\" from template {}", recipe.title, template.name);
        Ok(recipe)
    }
}

/// Races the wrapped provider against a fixed deadline.
pub struct TimeoutProvider<P> {
    inner: P,
    timeout: Duration,
}

impl<P> TimeoutProvider<P> {
    pub fn new(inner: P, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<P: RecipeProvider> RecipeProvider for TimeoutProvider<P> {
    async fn generate_recipe(
        &self,
        ingredients: &[String],
        dietary_preference: Option<&str>,
    ) -> Result<Recipe, AppError> {
        match tokio::time::timeout(
            self.timeout,
            self.inner.generate_recipe(ingredients, dietary_preference),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(self.timeout)),
        }
    }
}
