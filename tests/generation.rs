use std::{sync::Arc, time::Duration};

use recipegen_lib::{
    commands,
    errors::ErrorKind,
    filters::FilterCriteria,
    generation::{GenerationStatus, MockRecipeProvider, RecipeProvider, TimeoutProvider},
    models::Recipe,
    settings::SettingsStore,
    storage::MemoryStorage,
    stores::CollectionKind,
    AppState,
};

fn app_with(provider: Arc<dyn RecipeProvider>) -> (AppState, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let settings = SettingsStore::new(dir.path().join("settings.json")).unwrap();
    let state = AppState::assemble(Arc::new(MemoryStorage::new()), settings, provider).unwrap();
    (state, dir)
}

fn instant_app() -> (AppState, tempfile::TempDir) {
    app_with(Arc::new(MockRecipeProvider::with_seed(Duration::ZERO, 42)))
}

fn ingredients(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

#[tokio::test]
async fn generated_recipe_lands_at_the_front_of_history() {
    let (state, _dir) = instant_app();

    let first = commands::generate_recipe(&state, ingredients(&["eggs", "spinach"]), None)
        .await
        .unwrap();
    let second = commands::generate_recipe(&state, ingredients(&["rice", "chicken"]), None)
        .await
        .unwrap();

    let history = state.history.recipes();
    assert_eq!(history[0].title, second.title);
    assert!(history.iter().any(|recipe| recipe.title == first.title));
    assert_eq!(
        commands::generation_status(&state).status,
        GenerationStatus::Idle
    );
}

#[tokio::test]
async fn second_request_is_rejected_while_one_is_running() {
    let (state, _dir) = app_with(Arc::new(MockRecipeProvider::with_seed(
        Duration::from_millis(200),
        3,
    )));

    let (first, second) = tokio::join!(
        commands::generate_recipe(&state, ingredients(&["pasta", "tomato"]), None),
        async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            assert!(state.generator.is_generating());
            commands::generate_recipe(&state, ingredients(&["tofu"]), None).await
        }
    );

    assert!(first.is_ok());
    let alert = second.unwrap_err();
    assert_eq!(alert.kind, ErrorKind::Validation);
    assert_eq!(state.history.len(), 1);
}

#[tokio::test]
async fn timeouts_surface_as_retryable_alerts() {
    let slow = MockRecipeProvider::with_seed(Duration::from_millis(300), 5);
    let (state, _dir) = app_with(Arc::new(TimeoutProvider::new(
        slow,
        Duration::from_millis(30),
    )));

    let alert = commands::generate_recipe(&state, ingredients(&["beans"]), None)
        .await
        .unwrap_err();
    assert_eq!(alert.kind, ErrorKind::Timeout);
    assert!(alert.retryable);

    let snapshot = commands::generation_status(&state);
    assert_eq!(snapshot.status, GenerationStatus::Idle);
    assert_eq!(snapshot.last_error, Some(ErrorKind::Timeout));
    assert!(snapshot.can_retry);
    assert!(state.history.is_empty());
}

#[tokio::test]
async fn retry_reuses_the_last_request() {
    let (state, _dir) = instant_app();

    let alert = commands::retry_generation(&state).await.unwrap_err();
    assert_eq!(alert.kind, ErrorKind::Validation);

    commands::generate_recipe(&state, ingredients(&["lentils"]), Some("vegan".into()))
        .await
        .unwrap();
    let retried = commands::retry_generation(&state).await.unwrap();
    assert!(retried.has_tag("vegan"));
}

#[tokio::test]
async fn empty_ingredient_lists_are_not_retryable() {
    let (state, _dir) = instant_app();

    let alert = commands::generate_recipe(&state, ingredients(&["  ", ""]), None)
        .await
        .unwrap_err();
    assert_eq!(alert.kind, ErrorKind::Validation);
    assert!(!alert.retryable);
    assert!(state.history.is_empty());
}

#[tokio::test]
async fn settings_preference_applies_when_none_is_given() {
    let (state, _dir) = instant_app();
    state
        .settings
        .update_with(|settings| settings.dietary_preference = Some("vegetarian".into()))
        .unwrap();

    let recipe = commands::generate_recipe(&state, ingredients(&["potato"]), None)
        .await
        .unwrap();
    assert!(recipe.has_tag("vegetarian"));
}

#[test]
fn toggle_saved_flips_membership() {
    let (state, _dir) = instant_app();
    let recipe = Recipe::new("Shakshuka");

    assert!(commands::toggle_saved(&state, recipe.clone()));
    assert!(commands::is_saved(&state, "Shakshuka"));
    assert!(!commands::save_recipe(&state, recipe.clone()));

    assert!(!commands::toggle_saved(&state, recipe));
    assert!(!commands::is_saved(&state, "Shakshuka"));
}

#[test]
fn tag_and_rating_commands_validate_input() {
    let (state, _dir) = instant_app();
    commands::save_recipe(&state, Recipe::new("Shakshuka"));

    let tags = commands::add_tag(&state, CollectionKind::Saved, "Shakshuka", "Brunch").unwrap();
    assert_eq!(tags, vec!["Brunch"]);

    let blank = commands::add_tag(&state, CollectionKind::Saved, "Shakshuka", "  ").unwrap_err();
    assert_eq!(blank.kind, ErrorKind::Validation);

    let missing = commands::add_tag(&state, CollectionKind::Saved, "Paella", "Rice").unwrap_err();
    assert_eq!(missing.kind, ErrorKind::NotFound);

    let out_of_range =
        commands::rate_recipe(&state, CollectionKind::Saved, "Shakshuka", 7.0).unwrap_err();
    assert_eq!(out_of_range.kind, ErrorKind::Validation);

    commands::rate_recipe(&state, CollectionKind::Saved, "Shakshuka", 4.5).unwrap();
    let stored = commands::get_recipe(&state, CollectionKind::Saved, "Shakshuka").unwrap();
    assert_eq!(stored.rating, Some(4.5));

    let tags = commands::remove_tag(&state, CollectionKind::Saved, "Shakshuka", "brunch").unwrap();
    assert!(tags.is_empty());
    assert_eq!(
        commands::list_tags(&state, CollectionKind::Saved),
        Vec::<String>::new()
    );
}

#[test]
fn saved_only_narrows_history_to_saved_titles() {
    let (state, _dir) = instant_app();
    state.history.add(Recipe::new("Soup"));
    state.history.add(Recipe::new("Salad"));
    commands::save_recipe(&state, Recipe::new("Soup"));

    let visible = commands::filter_recipes(
        &state,
        CollectionKind::History,
        FilterCriteria::new().with_saved_only(true),
    );
    let titles: Vec<&str> = visible.iter().map(|recipe| recipe.title.as_str()).collect();
    assert_eq!(titles, vec!["Soup"]);

    let all = commands::reset_filters(&state, CollectionKind::History);
    assert_eq!(all.len(), 2);
}

#[test]
fn delete_and_clear_collections() {
    let (state, _dir) = instant_app();
    state.history.add(Recipe::new("Soup"));
    state.history.add(Recipe::new("Salad"));

    assert!(commands::delete_recipe(&state, CollectionKind::History, "Soup"));
    assert!(!commands::delete_recipe(&state, CollectionKind::History, "Soup"));

    commands::clear_collection(&state, CollectionKind::History);
    assert!(state.history.is_empty());

    let alert = commands::get_recipe(&state, CollectionKind::History, "Salad").unwrap_err();
    assert_eq!(alert.kind, ErrorKind::NotFound);
    assert!(!alert.retryable);
}
