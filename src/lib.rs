pub mod commands;
pub mod errors;
pub mod filters;
pub mod generation;
pub mod models;
pub mod settings;
pub mod storage;
pub mod stores;
pub mod utils;

use std::{fs, path::Path, sync::Arc};

use anyhow::{Context, Result};
use log::info;

use filters::FilterCriteria;
use generation::{GenerationController, MockRecipeProvider, RecipeProvider};
use models::Recipe;
use settings::SettingsStore;
use storage::{KeyValueStore, SqliteStorage};
use stores::{CollectionConfig, CollectionKind, CollectionStore};

/// Everything the screens share: both recipe collections, the generator and
/// user settings.
pub struct AppState {
    pub saved: Arc<CollectionStore>,
    pub history: Arc<CollectionStore>,
    pub generator: GenerationController,
    pub settings: SettingsStore,
}

impl AppState {
    /// Opens on-disk state under `data_dir`, creating it on first launch.
    pub fn initialize(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir).with_context(|| {
            format!("failed to create app data directory {}", data_dir.display())
        })?;

        let settings = SettingsStore::new(data_dir.join("settings.json"))?;
        let storage: Arc<dyn KeyValueStore> =
            Arc::new(SqliteStorage::open(data_dir.join("recipegen.sqlite3"))?);
        let provider: Arc<dyn RecipeProvider> =
            Arc::new(MockRecipeProvider::new(settings.generation_delay()));

        Self::assemble(storage, settings, provider)
    }

    /// Wires the stores and generator over caller-supplied collaborators.
    pub fn assemble(
        storage: Arc<dyn KeyValueStore>,
        settings: SettingsStore,
        provider: Arc<dyn RecipeProvider>,
    ) -> Result<Self> {
        let preferences = settings.get();

        let saved = Arc::new(CollectionStore::open(
            CollectionConfig::saved(),
            Arc::clone(&storage),
        )?);
        let history = Arc::new(CollectionStore::open(
            CollectionConfig::history(preferences.history_limit),
            storage,
        )?);

        let initial = FilterCriteria::default().sorted_by(preferences.default_sort);
        saved.set_criteria(initial.clone());
        history.set_criteria(initial);

        let generator = GenerationController::new(provider, Arc::clone(&history));

        Ok(Self {
            saved,
            history,
            generator,
            settings,
        })
    }

    pub fn collection(&self, kind: CollectionKind) -> &CollectionStore {
        match kind {
            CollectionKind::Saved => &self.saved,
            CollectionKind::History => &self.history,
        }
    }

    /// The filtered view of `kind`. For history, `savedOnly` further limits
    /// it to recipes that are also saved.
    pub fn visible_recipes(&self, kind: CollectionKind) -> Vec<Recipe> {
        let store = self.collection(kind);
        let saved_only = kind == CollectionKind::History && store.criteria().saved_only;

        store.with_filtered(|view| {
            view.iter()
                .filter(|recipe| !saved_only || self.saved.contains(&recipe.title))
                .map(|recipe| (*recipe).clone())
                .collect()
        })
    }

    /// Waits for pending writes in both collections.
    pub fn flush(&self) {
        self.saved.flush();
        self.history.flush();
    }
}

/// Entry point for the host shell: sets up logging and opens app state.
pub fn run(data_dir: &Path) -> Result<AppState> {
    utils::init_logging();
    info!("recipegen starting up...");

    let state = AppState::initialize(data_dir)?;
    info!(
        "Loaded {} saved recipes and {} history entries",
        state.saved.len(),
        state.history.len()
    );
    Ok(state)
}
