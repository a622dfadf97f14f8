use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{info, warn};
use serde::Serialize;

use super::provider::RecipeProvider;
use crate::errors::{AppError, ErrorKind};
use crate::models::Recipe;
use crate::stores::CollectionStore;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum GenerationStatus {
    Idle,
    Generating,
}

impl Default for GenerationStatus {
    fn default() -> Self {
        GenerationStatus::Idle
    }
}

#[derive(Debug, Clone, Default)]
struct GenerationState {
    status: GenerationStatus,
    last_request: Option<GenerationRequest>,
    last_error: Option<ErrorKind>,
}

#[derive(Debug, Clone)]
struct GenerationRequest {
    ingredients: Vec<String>,
    dietary_preference: Option<String>,
}

/// What the generate screen renders: spinner state and the last failure.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSnapshot {
    pub status: GenerationStatus,
    pub last_error: Option<ErrorKind>,
    pub can_retry: bool,
}

/// Runs one generation at a time and records every result in history.
#[derive(Clone)]
pub struct GenerationController {
    provider: Arc<dyn RecipeProvider>,
    history: Arc<CollectionStore>,
    state: Arc<Mutex<GenerationState>>,
}

impl GenerationController {
    pub fn new(provider: Arc<dyn RecipeProvider>, history: Arc<CollectionStore>) -> Self {
        Self {
            provider,
            history,
            state: Arc::new(Mutex::new(GenerationState::default())),
        }
    }

    pub fn snapshot(&self) -> GenerationSnapshot {
        let state = self.lock_state();
        GenerationSnapshot {
            status: state.status,
            last_error: state.last_error,
            can_retry: state.last_request.is_some() && state.status == GenerationStatus::Idle,
        }
    }

    pub fn is_generating(&self) -> bool {
        self.lock_state().status == GenerationStatus::Generating
    }

    /// Generates a recipe and pushes it to the front of history. A second
    /// call while one is in flight is rejected.
    pub async fn generate(
        &self,
        ingredients: Vec<String>,
        dietary_preference: Option<String>,
    ) -> Result<Recipe, AppError> {
        let _in_flight = self.begin(GenerationRequest {
            ingredients: ingredients.clone(),
            dietary_preference: dietary_preference.clone(),
        })?;

        let result = self
            .provider
            .generate_recipe(&ingredients, dietary_preference.as_deref())
            .await;

        match &result {
            Ok(recipe) => {
                let outcome = self.history.add(recipe.clone());
                info!("Recorded \"{}\" in history ({:?})", recipe.title, outcome);
                self.lock_state().last_error = None;
            }
            Err(err) => {
                warn!("Recipe generation failed: {err}");
                self.lock_state().last_error = Some(err.kind());
            }
        }

        result
    }

    /// Re-runs the most recent request, as offered by the error dialog.
    pub async fn retry(&self) -> Result<Recipe, AppError> {
        let request = self
            .lock_state()
            .last_request
            .clone()
            .ok_or_else(|| AppError::validation("There is nothing to retry yet"))?;
        self.generate(request.ingredients, request.dietary_preference)
            .await
    }

    fn begin(&self, request: GenerationRequest) -> Result<InFlight, AppError> {
        let mut state = self.lock_state();
        if state.status == GenerationStatus::Generating {
            return Err(AppError::validation("A recipe is already being generated"));
        }
        state.status = GenerationStatus::Generating;
        state.last_request = Some(request);
        Ok(InFlight {
            state: Arc::clone(&self.state),
        })
    }

    fn lock_state(&self) -> MutexGuard<'_, GenerationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns the controller to idle when the request finishes or is dropped.
struct InFlight {
    state: Arc<Mutex<GenerationState>>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.status = GenerationStatus::Idle;
    }
}
