//! Payloads for the non-map dashboard endpoints: global summary, per-entity monthly
//! series, paired comparisons and the category histogram.
//!
//! The backend is lax about types, so most fields default when absent.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Accepts a number, a numeric string, or anything else (mapped to `None`).
fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite()))
}

fn lenient_series<'de, D>(deserializer: D) -> std::result::Result<Vec<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .map(|v| match v {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .collect())
}

/// One entry in the "top polluted countries" list.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollutedCountry {
    #[serde(rename = "Country", default)]
    pub country: String,
    /// Yearly average AQI (the backend keys it by year).
    #[serde(rename = "2024", default, deserialize_with = "lenient_f64")]
    pub aqi: Option<f64>,
}

/// Response of `/api/dashboard/data`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DashboardSummary {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub global_avg_aqi: Option<f64>,
    #[serde(default)]
    pub monitored_countries_count: u32,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub top_polluted_countries: Vec<PollutedCountry>,
}

/// Response of `/api/country-data/{country}` and `/api/city-data/{city}/{state}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EntitySeries {
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rank: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub avg_aqi: Option<f64>,
    #[serde(default, deserialize_with = "lenient_series")]
    pub monthly_data: Vec<Option<f64>>,
    #[serde(default)]
    pub months: Vec<String>,
}

/// Seasonal averages, rounded to one decimal place. `None` when the season has no data.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SeasonalAverages {
    /// Jan, Feb, Dec.
    pub winter: Option<f64>,
    /// Mar to May.
    pub summer: Option<f64>,
    /// Jun to Sep.
    pub monsoon: Option<f64>,
    /// Oct, Nov.
    pub post_monsoon: Option<f64>,
}

const FULL_MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// One side of a comparison payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ComparedEntity {
    #[serde(alias = "city", alias = "country")]
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default, deserialize_with = "lenient_series")]
    pub monthly_values: Vec<Option<f64>>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub avg_aqi: Option<f64>,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn mean(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, count) = values
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| round1(sum / count as f64))
}

impl ComparedEntity {
    pub fn label(&self) -> String {
        self.display.clone().unwrap_or_else(|| match &self.state {
            Some(state) => format!("{}, {}", self.name, state),
            None => self.name.clone(),
        })
    }

    fn month(&self, index: usize) -> Option<f64> {
        self.monthly_values.get(index).copied().flatten()
    }

    /// Average of the available monthly values, or the backend's own average.
    pub fn average(&self) -> Option<f64> {
        mean(self.monthly_values.iter().copied()).or(self.avg_aqi)
    }

    pub fn seasonal(&self) -> SeasonalAverages {
        let pick = |months: &[usize]| mean(months.iter().map(|&m| self.month(m)));
        SeasonalAverages {
            winter: pick(&[0, 1, 11]),
            summer: pick(&[2, 3, 4]),
            monsoon: pick(&[5, 6, 7, 8]),
            post_monsoon: pick(&[9, 10]),
        }
    }

    /// Month name and value of the worst month. Ties go to the earliest month.
    pub fn peak_month(&self) -> Option<(&'static str, f64)> {
        self.extreme(|candidate, best| candidate > best)
    }

    /// Month name and value of the cleanest month. Ties go to the earliest month.
    pub fn cleanest_month(&self) -> Option<(&'static str, f64)> {
        self.extreme(|candidate, best| candidate < best)
    }

    fn extreme(&self, better: impl Fn(f64, f64) -> bool) -> Option<(&'static str, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (index, value) in self.monthly_values.iter().enumerate().take(12) {
            if let Some(value) = value {
                if best.map_or(true, |(_, b)| better(*value, b)) {
                    best = Some((index, *value));
                }
            }
        }
        best.map(|(index, value)| (FULL_MONTHS[index], value))
    }
}

/// Response of the city/country comparison endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Comparison {
    #[serde(alias = "city1", alias = "country1")]
    pub first: ComparedEntity,
    #[serde(alias = "city2", alias = "country2")]
    pub second: ComparedEntity,
    #[serde(default)]
    pub months: Vec<String>,
}

/// A city row in the histogram payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CityAqi {
    #[serde(rename = "City", default)]
    pub city: String,
    #[serde(rename = "Country", default)]
    pub country: String,
    #[serde(rename = "AQI Value", default, deserialize_with = "lenient_f64")]
    pub aqi: Option<f64>,
    #[serde(rename = "AQI Category", default)]
    pub category: Option<String>,
}

/// Response of `/api/aqi-csv-data`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategoryHistogram {
    #[serde(default)]
    pub category_counts: BTreeMap<String, u64>,
    #[serde(default)]
    pub top_cities: Vec<CityAqi>,
    #[serde(default)]
    pub cleanest_cities: Vec<CityAqi>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl CategoryHistogram {
    pub fn total(&self) -> u64 {
        self.category_counts.values().sum()
    }
}
