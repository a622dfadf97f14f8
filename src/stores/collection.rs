use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use anyhow::Result;
use chrono::{Local, Utc};
use serde::Serialize;
use serde_json::Value;

use super::persister::Persister;
use crate::{
    filters::{collect_distinct_tags, filter_indices_at, FilterCriteria},
    models::Recipe,
    storage::KeyValueStore,
};
use crate::{log_debug, log_error, log_info, log_warn};

const ENABLE_LOGS: bool = true;

pub const SAVED_RECIPES_KEY: &str = "saved-recipes-storage";
pub const RECIPE_HISTORY_KEY: &str = "recipe-history-storage";
pub const DEFAULT_HISTORY_LIMIT: usize = 30;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CollectionKind {
    Saved,
    History,
}

impl CollectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Saved => "saved",
            CollectionKind::History => "history",
        }
    }
}

/// What `add` does when a recipe with the same title is already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    Skip,
    /// Drop the stored entry and insert the new one at the front.
    MoveToFront,
}

#[derive(Debug, Clone)]
pub struct CollectionConfig {
    pub kind: CollectionKind,
    pub storage_key: String,
    pub duplicate_policy: DuplicatePolicy,
    /// Entries past this many are evicted from the back on insert.
    pub capacity: Option<usize>,
}

impl CollectionConfig {
    pub fn saved() -> Self {
        Self {
            kind: CollectionKind::Saved,
            storage_key: SAVED_RECIPES_KEY.to_string(),
            duplicate_policy: DuplicatePolicy::Skip,
            capacity: None,
        }
    }

    pub fn history(limit: usize) -> Self {
        Self {
            kind: CollectionKind::History,
            storage_key: RECIPE_HISTORY_KEY.to_string(),
            duplicate_policy: DuplicatePolicy::MoveToFront,
            capacity: Some(limit),
        }
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Skipped,
    Moved,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ChangeKind {
    Added,
    Removed,
    Cleared,
    Tagged,
    Rated,
    Filtered,
}

/// Sent to subscribers after every change to the list or the criteria.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionEvent {
    pub collection: CollectionKind,
    pub change: ChangeKind,
    pub total: usize,
    pub visible: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&CollectionEvent) + Send + Sync>;

struct CollectionState {
    recipes: Vec<Recipe>,
    criteria: FilterCriteria,
    /// Positions into `recipes`, in display order.
    view: Vec<usize>,
}

impl CollectionState {
    fn refresh_view(&mut self) {
        self.view = filter_indices_at(&self.recipes, &self.criteria, &Local::now());
    }

    fn position(&self, title: &str) -> Option<usize> {
        self.recipes.iter().position(|recipe| recipe.title == title)
    }
}

/// Owns one persisted recipe list and its filtered view.
///
/// Mutations run synchronously on the caller's thread, recompute the view,
/// queue a snapshot write and then notify subscribers.
pub struct CollectionStore {
    config: CollectionConfig,
    state: RwLock<CollectionState>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_subscription: AtomicU64,
    persister: Persister,
}

impl CollectionStore {
    /// Hydrates from `storage` and starts the store's writer thread.
    pub fn open(config: CollectionConfig, storage: Arc<dyn KeyValueStore>) -> Result<Self> {
        let recipes = hydrate(storage.as_ref(), &config.storage_key);
        log_info!(
            "Loaded {} recipes into {} collection",
            recipes.len(),
            config.kind.as_str()
        );

        let persister = Persister::spawn(config.kind.as_str(), storage)?;

        let mut state = CollectionState {
            recipes,
            criteria: FilterCriteria::default(),
            view: Vec::new(),
        };
        if let Some(capacity) = config.capacity {
            state.recipes.truncate(capacity);
        }
        state.refresh_view();

        Ok(Self {
            config,
            state: RwLock::new(state),
            listeners: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
            persister,
        })
    }

    pub fn kind(&self) -> CollectionKind {
        self.config.kind
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    /// Inserts `recipe` at the front, stamping `createdAt` when missing.
    pub fn add(&self, mut recipe: Recipe) -> AddOutcome {
        if recipe.created_at.is_none() {
            recipe.created_at = Some(Utc::now());
        }
        let policy = self.config.duplicate_policy;
        let capacity = self.config.capacity;

        let outcome = self.mutate(ChangeKind::Added, |state| {
            let outcome = match (state.position(&recipe.title), policy) {
                (Some(_), DuplicatePolicy::Skip) => return AddOutcome::Skipped,
                (Some(index), DuplicatePolicy::MoveToFront) => {
                    state.recipes.remove(index);
                    AddOutcome::Moved
                }
                (None, _) => AddOutcome::Added,
            };
            state.recipes.insert(0, recipe);
            if let Some(capacity) = capacity {
                state.recipes.truncate(capacity);
            }
            outcome
        });

        log_debug!("{} add: {:?}", self.config.kind.as_str(), outcome);
        outcome
    }

    /// Removes the first recipe titled `title`. Returns whether one existed.
    pub fn remove(&self, title: &str) -> bool {
        self.mutate(ChangeKind::Removed, |state| match state.position(title) {
            Some(index) => {
                state.recipes.remove(index);
                true
            }
            None => false,
        })
    }

    pub fn clear_all(&self) {
        log_warn!("Clearing {} collection", self.config.kind.as_str());
        self.mutate(ChangeKind::Cleared, |state| {
            let had_items = !state.recipes.is_empty();
            state.recipes.clear();
            had_items
        });
    }

    /// Returns `false` when the recipe is missing or already has the tag.
    pub fn add_tag(&self, title: &str, tag: &str) -> bool {
        self.update_recipe(title, ChangeKind::Tagged, |recipe| recipe.add_tag(tag))
    }

    pub fn remove_tag(&self, title: &str, tag: &str) -> bool {
        self.update_recipe(title, ChangeKind::Tagged, |recipe| recipe.remove_tag(tag))
    }

    /// Replaces the recipe's tags as given. Returns `false` if no recipe
    /// has that title.
    pub fn set_all_tags(&self, title: &str, tags: Vec<String>) -> bool {
        self.update_recipe(title, ChangeKind::Tagged, |recipe| {
            recipe.set_tags(tags);
            true
        })
    }

    /// Sets the rating, clamped to 0..=5.
    pub fn set_rating(&self, title: &str, rating: f64) -> bool {
        let rating = if rating.is_finite() {
            rating.clamp(0.0, 5.0)
        } else {
            0.0
        };
        self.update_recipe(title, ChangeKind::Rated, |recipe| {
            recipe.rating = Some(rating);
            true
        })
    }

    pub fn contains(&self, title: &str) -> bool {
        self.read_state().position(title).is_some()
    }

    pub fn get(&self, title: &str) -> Option<Recipe> {
        let state = self.read_state();
        state.position(title).map(|index| state.recipes[index].clone())
    }

    pub fn len(&self) -> usize {
        self.read_state().recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Full list in stored order.
    pub fn recipes(&self) -> Vec<Recipe> {
        self.read_state().recipes.clone()
    }

    /// The filtered view as owned copies.
    pub fn filtered(&self) -> Vec<Recipe> {
        self.with_filtered(|view| view.iter().map(|recipe| (*recipe).clone()).collect())
    }

    /// Runs `f` over the filtered view, borrowing straight from the store.
    pub fn with_filtered<R>(&self, f: impl FnOnce(&[&Recipe]) -> R) -> R {
        let state = self.read_state();
        let view: Vec<&Recipe> = state.view.iter().map(|&index| &state.recipes[index]).collect();
        f(&view)
    }

    pub fn distinct_tags(&self) -> Vec<String> {
        collect_distinct_tags(&self.read_state().recipes)
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.read_state().criteria.clone()
    }

    pub fn set_criteria(&self, criteria: FilterCriteria) {
        self.update_criteria(|current| *current = criteria);
    }

    pub fn update_criteria(&self, f: impl FnOnce(&mut FilterCriteria)) {
        let event = {
            let mut state = self.write_state();
            f(&mut state.criteria);
            state.refresh_view();
            self.event(&state, ChangeKind::Filtered)
        };
        self.notify(&event);
    }

    /// Drops every constraint and restores insertion order.
    pub fn reset_filters(&self) {
        self.set_criteria(FilterCriteria::default());
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&CollectionEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.lock_listeners().push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.lock_listeners();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Blocks until every snapshot queued so far has reached storage.
    pub fn flush(&self) {
        self.persister.flush();
    }

    fn update_recipe(
        &self,
        title: &str,
        change: ChangeKind,
        f: impl FnOnce(&mut Recipe) -> bool,
    ) -> bool {
        self.mutate(change, |state| match state.position(title) {
            Some(index) => f(&mut state.recipes[index]),
            None => false,
        })
    }

    /// Applies `f` under the write lock. Any result other than "nothing
    /// changed" refreshes the view, persists and notifies.
    fn mutate<R: Changed>(
        &self,
        change: ChangeKind,
        f: impl FnOnce(&mut CollectionState) -> R,
    ) -> R {
        let (result, snapshot) = {
            let mut state = self.write_state();
            let result = f(&mut state);
            if !result.changed() {
                return result;
            }
            state.refresh_view();
            let payload = match serde_json::to_string(&state.recipes) {
                Ok(payload) => Some(payload),
                Err(err) => {
                    log_error!(
                        "Failed to serialize {} collection: {err}",
                        self.config.kind.as_str()
                    );
                    None
                }
            };
            (result, (payload, self.event(&state, change)))
        };

        let (payload, event) = snapshot;
        if let Some(payload) = payload {
            self.persister.write(&self.config.storage_key, payload);
        }
        self.notify(&event);
        result
    }

    fn event(&self, state: &CollectionState, change: ChangeKind) -> CollectionEvent {
        CollectionEvent {
            collection: self.config.kind,
            change,
            total: state.recipes.len(),
            visible: state.view.len(),
        }
    }

    fn notify(&self, event: &CollectionEvent) {
        let listeners: Vec<Listener> = self
            .lock_listeners()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CollectionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CollectionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_listeners(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Listener)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Whether a mutation result means the list actually changed.
trait Changed {
    fn changed(&self) -> bool;
}

impl Changed for bool {
    fn changed(&self) -> bool {
        *self
    }
}

impl Changed for AddOutcome {
    fn changed(&self) -> bool {
        *self != AddOutcome::Skipped
    }
}

/// Reads the persisted list. Unreadable storage or a non-array payload
/// starts the store empty; individual records that fail to decode are
/// skipped.
fn hydrate(storage: &dyn KeyValueStore, key: &str) -> Vec<Recipe> {
    let raw = match storage.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            log_error!("Failed to read {key}: {err:#}");
            return Vec::new();
        }
    };

    let entries: Vec<Value> = match serde_json::from_str(&raw) {
        Ok(entries) => entries,
        Err(err) => {
            log_warn!("Ignoring unreadable {key} payload: {err}");
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<Recipe>(entry) {
            Ok(recipe) => Some(recipe),
            Err(err) => {
                log_warn!("Skipping malformed recipe in {key}: {err}");
                None
            }
        })
        .collect()
}
