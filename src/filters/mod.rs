pub mod criteria;
pub mod engine;

pub use criteria::{DateBucket, FilterCriteria, SortKey};
pub use engine::{
    apply_filters, apply_filters_at, collect_distinct_tags, compare_titles, date_cutoff,
    filter_indices_at, reset_filters,
};
