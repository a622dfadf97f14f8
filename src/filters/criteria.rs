use serde::{Deserialize, Serialize};

/// Recency window applied to `createdAt`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DateBucket {
    All,
    Today,
    Week,
    Month,
}

impl Default for DateBucket {
    fn default() -> Self {
        DateBucket::All
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Newest,
    Oldest,
    Name,
    /// Highest rating first. There is no ascending variant.
    Rating,
}

/// Everything a list screen can narrow or reorder a collection by.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterCriteria {
    pub search_text: String,
    /// Every tag listed must be present on the recipe, ignoring case.
    pub tags: Vec<String>,
    pub date_bucket: DateBucket,
    pub tagged_only: bool,
    /// Only meaningful for the history list, where it narrows the view to
    /// recipes that are also saved. The filter engine itself ignores it.
    pub saved_only: bool,
    /// `None` keeps the collection's stored order.
    pub sort: Option<SortKey>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_date_bucket(mut self, bucket: DateBucket) -> Self {
        self.date_bucket = bucket;
        self
    }

    pub fn with_tagged_only(mut self, tagged_only: bool) -> Self {
        self.tagged_only = tagged_only;
        self
    }

    pub fn with_saved_only(mut self, saved_only: bool) -> Self {
        self.saved_only = saved_only;
        self
    }

    pub fn sorted_by(mut self, sort: SortKey) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn unsorted(mut self) -> Self {
        self.sort = None;
        self
    }

    /// Trimmed, lower-cased search text, or `None` when blank.
    pub fn search_needle(&self) -> Option<String> {
        let trimmed = self.search_text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_lowercase())
        }
    }

    /// Lower-cased required tags with blank entries dropped.
    pub fn required_tags(&self) -> Vec<String> {
        self.tags
            .iter()
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
            .map(str::to_lowercase)
            .collect()
    }

    /// True when no dimension narrows the collection.
    pub fn is_unconstrained(&self) -> bool {
        self.search_needle().is_none()
            && self.required_tags().is_empty()
            && self.date_bucket == DateBucket::All
            && !self.tagged_only
            && !self.saved_only
    }
}
