//! Filter engine: picks the records matching continent/country/city/category
//! constraints or a free-text search.

use crate::models::LocationRecord;
use serde::Serialize;
use std::collections::BTreeSet;

/// Sentinel meaning "no constraint" for a structured dimension.
pub const ALL: &str = "All";
/// Search terms shorter than this produce no suggestions.
pub const MIN_SEARCH_LEN: usize = 2;
/// Maximum number of search suggestions.
pub const MAX_SUGGESTIONS: usize = 5;

/// Transient filter selection. Recomputed per filter action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    pub continent: String,
    pub country: String,
    pub city: String,
    /// Free-text term; when present it replaces the structured filters.
    pub search: Option<String>,
    /// Accepted AQI category labels. Empty means every category.
    pub categories: BTreeSet<String>,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self::region(ALL, ALL, ALL)
    }
}

impl FilterCriteria {
    pub fn region(continent: &str, country: &str, city: &str) -> Self {
        Self {
            continent: continent.to_string(),
            country: country.to_string(),
            city: city.to_string(),
            search: None,
            categories: BTreeSet::new(),
        }
    }

    pub fn with_search(mut self, term: &str) -> Self {
        let term = term.trim();
        self.search = (!term.is_empty()).then(|| term.to_string());
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    fn constrains(value: &str) -> bool {
        value != ALL
    }

    /// Whether `record` passes these criteria.
    pub fn matches(&self, record: &LocationRecord) -> bool {
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            return record.city.to_lowercase().contains(&term)
                || record.country.to_lowercase().contains(&term);
        }

        (!Self::constrains(&self.continent) || record.continent == self.continent)
            && (!Self::constrains(&self.country) || record.country == self.country)
            && (!Self::constrains(&self.city) || record.city == self.city)
            && (self.categories.is_empty() || self.categories.contains(&record.aqi_category))
    }
}

/// Records matching `criteria`, in input order. An empty result is not an error.
pub fn apply_filter(records: &[LocationRecord], criteria: &FilterCriteria) -> Vec<LocationRecord> {
    records
        .iter()
        .filter(|record| criteria.matches(record))
        .cloned()
        .collect()
}

/// Up to five records whose city or country contains `term` (case-insensitive).
pub fn search_suggestions<'a>(records: &'a [LocationRecord], term: &str) -> Vec<&'a LocationRecord> {
    let term = term.trim();
    if term.chars().count() < MIN_SEARCH_LEN {
        return Vec::new();
    }
    let criteria = FilterCriteria::default().with_search(term);
    records
        .iter()
        .filter(|record| criteria.matches(record))
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// Distinct, sorted values available for each structured dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub continents: Vec<String>,
    pub countries: Vec<String>,
    pub cities: Vec<String>,
}

impl FilterOptions {
    pub fn from_records(records: &[LocationRecord]) -> Self {
        let collect = |field: fn(&LocationRecord) -> &String| {
            records
                .iter()
                .map(|r| field(r).clone())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect::<Vec<_>>()
        };
        Self {
            continents: collect(|r| &r.continent),
            countries: collect(|r| &r.country),
            cities: collect(|r| &r.city),
        }
    }
}
