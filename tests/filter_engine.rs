use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use recipegen_lib::filters::{
    apply_filters_at, collect_distinct_tags, reset_filters, DateBucket, FilterCriteria, SortKey,
};
use recipegen_lib::models::Recipe;

fn tz() -> FixedOffset {
    FixedOffset::west_opt(5 * 3600).unwrap()
}

fn local(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<FixedOffset> {
    tz().with_ymd_and_hms(y, m, d, h, min, s).unwrap()
}

fn recipe(title: &str, tags: &[&str], created_at: Option<DateTime<Utc>>) -> Recipe {
    let mut recipe = Recipe::new(title);
    recipe.tags = tags.iter().map(|tag| tag.to_string()).collect();
    recipe.created_at = created_at;
    recipe
}

fn titles(recipes: &[&Recipe]) -> Vec<String> {
    recipes.iter().map(|recipe| recipe.title.clone()).collect()
}

fn sample() -> Vec<Recipe> {
    let now = local(2024, 6, 12, 18, 0, 0).with_timezone(&Utc);
    let mut curry = recipe(
        "Coconut Curry",
        &["Vegan", "Dinner"],
        Some(now - Duration::hours(2)),
    );
    curry.ingredients = vec!["400 ml coconut milk".into(), "chickpeas".into()];
    curry.rating = Some(4.5);

    let mut pancakes = recipe(
        "pancakes",
        &["Breakfast", "Sweet"],
        Some(now - Duration::days(3)),
    );
    pancakes.description = "Fluffy and golden".into();
    pancakes.rating = Some(3.0);

    let mut stir_fry = recipe(
        "Beef Stir-Fry",
        &["Quick", "Dinner"],
        Some(now - Duration::days(20)),
    );
    stir_fry.ingredients = vec!["beef strips".into(), "soy sauce".into()];

    let toast = recipe("Avocado Toast", &[], None);

    vec![curry, pancakes, stir_fry, toast]
}

#[test]
fn result_is_a_subset_of_the_source_by_identity() {
    let source = sample();
    let now = local(2024, 6, 12, 18, 0, 0);
    let criteria = FilterCriteria::new()
        .with_tags(["dinner"])
        .sorted_by(SortKey::Name);

    let result = apply_filters_at(&source, &criteria, &now);
    assert_eq!(result.len(), 2);
    for item in result {
        assert!(source.iter().any(|original| std::ptr::eq(original, item)));
    }
}

#[test]
fn reapplying_the_same_criteria_is_idempotent() {
    let source = sample();
    let now = local(2024, 6, 12, 18, 0, 0);
    let criteria = FilterCriteria::new()
        .with_search("a")
        .with_date_bucket(DateBucket::Month)
        .sorted_by(SortKey::Rating);

    let once: Vec<Recipe> = apply_filters_at(&source, &criteria, &now)
        .into_iter()
        .cloned()
        .collect();
    let twice = apply_filters_at(&once, &criteria, &now);

    assert_eq!(titles(&twice), once.iter().map(|r| r.title.clone()).collect::<Vec<_>>());
}

#[test]
fn required_tags_use_and_semantics_ignoring_case() {
    let source = vec![recipe("Weeknight Pasta", &["Quick", "Dinner"], None)];
    let now = local(2024, 6, 12, 18, 0, 0);

    let both = FilterCriteria::new().with_tags(["quick", "vegan"]);
    assert!(apply_filters_at(&source, &both, &now).is_empty());

    let one = FilterCriteria::new().with_tags(["quick"]);
    assert_eq!(apply_filters_at(&source, &one, &now).len(), 1);
}

#[test]
fn untagged_recipes_never_pass_a_tag_constraint() {
    let source = sample();
    let now = local(2024, 6, 12, 18, 0, 0);

    let tagged_only = FilterCriteria::new().with_tagged_only(true);
    let result = apply_filters_at(&source, &tagged_only, &now);
    assert!(!titles(&result).contains(&"Avocado Toast".to_string()));
    assert_eq!(result.len(), 3);
}

#[test]
fn today_bucket_starts_at_local_midnight() {
    let yesterday_late = local(2024, 6, 11, 23, 59, 0).with_timezone(&Utc);
    let today_early = local(2024, 6, 12, 0, 0, 1).with_timezone(&Utc);
    let source = vec![
        recipe("Late Snack", &[], Some(yesterday_late)),
        recipe("Early Breakfast", &[], Some(today_early)),
    ];

    let now = local(2024, 6, 12, 9, 30, 0);
    let criteria = FilterCriteria::new().with_date_bucket(DateBucket::Today);
    assert_eq!(
        titles(&apply_filters_at(&source, &criteria, &now)),
        vec!["Early Breakfast"]
    );
}

#[test]
fn recipes_without_timestamp_fail_any_date_bucket() {
    let source = sample();
    let now = local(2024, 6, 12, 18, 0, 0);

    let week = FilterCriteria::new().with_date_bucket(DateBucket::Week);
    // Monday 2024-06-10 onwards: curry (2h ago) and pancakes (Sunday the 9th) fall either side.
    assert_eq!(titles(&apply_filters_at(&source, &week, &now)), vec!["Coconut Curry"]);

    let month = FilterCriteria::new().with_date_bucket(DateBucket::Month);
    assert_eq!(
        titles(&apply_filters_at(&source, &month, &now)),
        vec!["Coconut Curry", "pancakes"]
    );
}

#[test]
fn search_matches_title_description_ingredients_and_tags() {
    let source = sample();
    let now = local(2024, 6, 12, 18, 0, 0);
    let search = |text: &str| {
        let criteria = FilterCriteria::new()
            .with_search(text)
            .sorted_by(SortKey::Name);
        titles(&apply_filters_at(&source, &criteria, &now))
    };

    assert_eq!(search("CURRY"), vec!["Coconut Curry"]);
    assert_eq!(search("golden"), vec!["pancakes"]);
    assert_eq!(search("soy"), vec!["Beef Stir-Fry"]);
    assert_eq!(search("sweet"), vec!["pancakes"]);
    assert_eq!(search("   ").len(), source.len());
}

#[test]
fn newest_sort_puts_latest_first_and_missing_timestamps_last() {
    let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let t2 = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
    let source = vec![
        recipe("first", &[], Some(t1)),
        recipe("undated", &[], None),
        recipe("second", &[], Some(t2)),
    ];
    let now = local(2024, 6, 12, 18, 0, 0);

    let newest = FilterCriteria::new().sorted_by(SortKey::Newest);
    assert_eq!(
        titles(&apply_filters_at(&source, &newest, &now)),
        vec!["second", "first", "undated"]
    );

    let oldest = FilterCriteria::new().sorted_by(SortKey::Oldest);
    assert_eq!(
        titles(&apply_filters_at(&source, &oldest, &now)),
        vec!["undated", "first", "second"]
    );
}

#[test]
fn rating_sort_is_descending_with_missing_as_zero() {
    let source = sample();
    let now = local(2024, 6, 12, 18, 0, 0);
    let criteria = FilterCriteria::new().sorted_by(SortKey::Rating);

    assert_eq!(
        titles(&apply_filters_at(&source, &criteria, &now)),
        vec!["Coconut Curry", "pancakes", "Beef Stir-Fry", "Avocado Toast"]
    );
}

#[test]
fn name_sort_ignores_case() {
    let source = sample();
    let now = local(2024, 6, 12, 18, 0, 0);
    let criteria = FilterCriteria::new().sorted_by(SortKey::Name);

    assert_eq!(
        titles(&apply_filters_at(&source, &criteria, &now)),
        vec!["Avocado Toast", "Beef Stir-Fry", "Coconut Curry", "pancakes"]
    );
}

#[test]
fn filtering_leaves_the_source_untouched() {
    let source = sample();
    let before = source.clone();
    let now = local(2024, 6, 12, 18, 0, 0);

    let _ = apply_filters_at(
        &source,
        &FilterCriteria::new().with_search("beef").sorted_by(SortKey::Name),
        &now,
    );
    assert_eq!(source, before);
    assert_eq!(reset_filters(&source), before);
}

#[test]
fn default_criteria_match_a_reset() {
    let source = sample();
    let now = local(2024, 6, 12, 18, 0, 0);

    let unfiltered: Vec<Recipe> = apply_filters_at(&source, &FilterCriteria::default(), &now)
        .into_iter()
        .cloned()
        .collect();
    assert_eq!(unfiltered, reset_filters(&source));
}

#[test]
fn distinct_tags_cover_the_whole_collection() {
    assert_eq!(
        collect_distinct_tags(&sample()),
        vec!["Vegan", "Dinner", "Breakfast", "Sweet", "Quick"]
    );
}
