pub mod collection;
mod persister;

pub use collection::{
    AddOutcome, ChangeKind, CollectionConfig, CollectionEvent, CollectionKind, CollectionStore,
    DuplicatePolicy, SubscriptionId, DEFAULT_HISTORY_LIMIT, RECIPE_HISTORY_KEY, SAVED_RECIPES_KEY,
};
