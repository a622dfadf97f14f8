//! Filter, search and sort pipeline shared by the saved and history
//! collections.
//!
//! Everything here is a pure function of the source slice, the criteria and
//! the clock. Results borrow from the source so the filtered view is always a
//! subset of it by identity.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Datelike, Days, Duration, Local, NaiveDate, TimeZone, Utc};

use super::criteria::{DateBucket, FilterCriteria, SortKey};
use crate::models::Recipe;

/// Filters and sorts `source` against the local wall clock.
pub fn apply_filters<'a>(source: &'a [Recipe], criteria: &FilterCriteria) -> Vec<&'a Recipe> {
    apply_filters_at(source, criteria, &Local::now())
}

/// Same as [`apply_filters`] with an explicit "now".
pub fn apply_filters_at<'a, Tz: TimeZone>(
    source: &'a [Recipe],
    criteria: &FilterCriteria,
    now: &DateTime<Tz>,
) -> Vec<&'a Recipe> {
    filter_indices_at(source, criteria, now)
        .into_iter()
        .map(|index| &source[index])
        .collect()
}

/// Positions in `source` that survive `criteria`, in display order.
pub fn filter_indices_at<Tz: TimeZone>(
    source: &[Recipe],
    criteria: &FilterCriteria,
    now: &DateTime<Tz>,
) -> Vec<usize> {
    let required_tags = criteria.required_tags();
    let needle = criteria.search_needle();
    let cutoff = date_cutoff(criteria.date_bucket, now);

    let mut indices: Vec<usize> = source
        .iter()
        .enumerate()
        .filter(|(_, recipe)| {
            matches_tags(recipe, &required_tags)
                && (!criteria.tagged_only || recipe.has_tags())
                && cutoff.map_or(true, |cutoff| recipe.created_at_or_epoch() >= cutoff)
                && needle.as_deref().map_or(true, |needle| recipe.matches_text(needle))
        })
        .map(|(index, _)| index)
        .collect();

    if let Some(key) = criteria.sort {
        sort_indices(source, &mut indices, key);
    }
    indices
}

/// Unfiltered copy in insertion order.
pub fn reset_filters(source: &[Recipe]) -> Vec<Recipe> {
    source.to_vec()
}

/// Every tag used across `source`, deduplicated case-sensitively in
/// first-seen order.
pub fn collect_distinct_tags(source: &[Recipe]) -> Vec<String> {
    let mut seen = HashSet::new();
    source
        .iter()
        .flat_map(|recipe| recipe.tags.iter())
        .filter(|tag| seen.insert(tag.as_str()))
        .cloned()
        .collect()
}

/// Start of the window `bucket` covers, as local midnight converted to UTC.
/// `All` has no cutoff.
pub fn date_cutoff<Tz: TimeZone>(bucket: DateBucket, now: &DateTime<Tz>) -> Option<DateTime<Utc>> {
    let today = now.date_naive();
    let start = match bucket {
        DateBucket::All => return None,
        DateBucket::Today => today,
        DateBucket::Week => {
            let since_monday = u64::from(now.weekday().num_days_from_monday());
            today.checked_sub_days(Days::new(since_monday))?
        }
        DateBucket::Month => today.with_day(1)?,
    };
    local_midnight(&now.timezone(), start)
}

fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<DateTime<Utc>> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    // Zones that jump the clock at midnight have no 00:00; use the first
    // instant after the gap.
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

fn matches_tags(recipe: &Recipe, required: &[String]) -> bool {
    if required.is_empty() {
        return true;
    }
    if !recipe.has_tags() {
        return false;
    }
    let present: Vec<String> = recipe.tags.iter().map(|tag| tag.to_lowercase()).collect();
    required.iter().all(|tag| present.contains(tag))
}

fn sort_indices(source: &[Recipe], indices: &mut [usize], key: SortKey) {
    // `sort_by` is stable, so equal keys keep insertion order.
    match key {
        SortKey::Newest => indices.sort_by(|&a, &b| {
            source[b]
                .created_at_or_epoch()
                .cmp(&source[a].created_at_or_epoch())
        }),
        SortKey::Oldest => indices.sort_by(|&a, &b| {
            source[a]
                .created_at_or_epoch()
                .cmp(&source[b].created_at_or_epoch())
        }),
        SortKey::Name => {
            indices.sort_by(|&a, &b| compare_titles(&source[a].title, &source[b].title))
        }
        SortKey::Rating => indices.sort_by(|&a, &b| {
            source[b]
                .rating_or_zero()
                .total_cmp(&source[a].rating_or_zero())
        }),
    }
}

/// Alphabetical title order that ignores case first and falls back to a
/// code-point comparison so distinct titles never compare equal.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    let folded_a = a.chars().flat_map(char::to_lowercase);
    let folded_b = b.chars().flat_map(char::to_lowercase);
    folded_a.cmp(folded_b).then_with(|| a.cmp(b))
}
