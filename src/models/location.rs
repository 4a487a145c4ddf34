//! Canonical monitoring-point record and the normalization that produces it.
//!
//! Upstream payloads are loosely typed: numbers arrive as strings, identity fields go
//! missing, and the same pollutant shows up under several key spellings (`PM2_5`,
//! `PM2.5`, `pm2_5`). `normalize_record` is the single place that copes with all of
//! that; everything downstream only sees `LocationRecord`.

use crate::error::{AppError, Result};
use crate::models::aqi::classify;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, warn};

/// Fallback for missing identity strings.
pub const UNKNOWN: &str = "Unknown";

/// A single pollutant sub-reading, optionally annotated with its own category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub value: f64,
    pub category: Option<String>,
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.category {
            Some(category) => write!(f, "{} ({})", self.value, category),
            None => write!(f, "{}", self.value),
        }
    }
}

/// One monitoring point, after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    pub city: String,
    pub country: String,
    pub continent: String,
    pub latitude: f64,
    pub longitude: f64,
    pub aqi: f64,
    pub aqi_category: String,
    pub pm2_5: Option<Reading>,
    pub pm10: Option<Reading>,
    pub o3: Option<Reading>,
    pub no2: Option<Reading>,
    pub wind_speed: Option<f64>,
    /// Degrees, folded into `[0, 360)`.
    pub wind_direction: Option<f64>,
    pub temperature: Option<f64>,
    /// Raw observation timestamp as sent by the backend; parsed lazily for display.
    pub observed_at: Option<String>,
}

impl LocationRecord {
    /// Minimal record with derived category; mostly useful for fixtures and snapshots.
    pub fn new(city: &str, country: &str, continent: &str, latitude: f64, longitude: f64, aqi: f64) -> Self {
        Self {
            city: city.to_string(),
            country: country.to_string(),
            continent: continent.to_string(),
            latitude,
            longitude,
            aqi,
            aqi_category: classify(aqi).category.label().to_string(),
            pm2_5: None,
            pm10: None,
            o3: None,
            no2: None,
            wind_speed: None,
            wind_direction: None,
            temperature: None,
            observed_at: None,
        }
    }

    /// True when the coordinates can be placed on a map.
    pub fn has_valid_coordinates(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && !(self.latitude == 0.0 && self.longitude == 0.0)
    }
}

// Key spellings seen in the wild, canonical spelling first.
const CITY_KEYS: &[&str] = &["city", "City"];
const COUNTRY_KEYS: &[&str] = &["country", "Country"];
const CONTINENT_KEYS: &[&str] = &["continent", "Continent"];
const LATITUDE_KEYS: &[&str] = &["latitude", "Latitude", "lat"];
const LONGITUDE_KEYS: &[&str] = &["longitude", "Longitude", "lng", "lon"];
const AQI_KEYS: &[&str] = &["aqi", "AQI", "AQI Value", "value"];
const AQI_CATEGORY_KEYS: &[&str] = &["aqiCategory", "AQI_Category", "AQI Category"];
const PM25_KEYS: &[&str] = &["pm2_5", "PM2_5", "PM2.5", "pm25"];
const PM25_CATEGORY_KEYS: &[&str] = &["pm2_5Category", "PM2_5_Category", "PM2.5_Category"];
const PM10_KEYS: &[&str] = &["pm10", "PM10"];
const PM10_CATEGORY_KEYS: &[&str] = &["pm10Category", "PM10_Category"];
const O3_KEYS: &[&str] = &["o3", "O3"];
const O3_CATEGORY_KEYS: &[&str] = &["o3Category", "O3_Category"];
const NO2_KEYS: &[&str] = &["no2", "NO2"];
const NO2_CATEGORY_KEYS: &[&str] = &["no2Category", "NO2_Category"];
const WIND_SPEED_KEYS: &[&str] = &["windSpeed", "wind_speed"];
const WIND_DIRECTION_KEYS: &[&str] = &["windDirection", "wind_direction"];
const TEMPERATURE_KEYS: &[&str] = &["temperature", "Temperature"];
const OBSERVED_AT_KEYS: &[&str] = &["observedAt", "time", "timestamp"];

/// First non-null value under any of the given keys.
fn lookup<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| !value.is_null())
}

/// Lenient numeric parse: JSON numbers and numeric strings; anything else, or a
/// non-finite result, is `None`.
fn parse_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

fn number_or_zero(obj: &Map<String, Value>, keys: &[&str]) -> f64 {
    lookup(obj, keys).and_then(parse_number).unwrap_or(0.0)
}

fn optional_number(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    // Present-but-garbage degrades to 0 like every other numeric field.
    lookup(obj, keys).map(|v| parse_number(v).unwrap_or(0.0))
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn identity(obj: &Map<String, Value>, keys: &[&str]) -> String {
    lookup(obj, keys)
        .and_then(text)
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn reading(obj: &Map<String, Value>, value_keys: &[&str], category_keys: &[&str]) -> Option<Reading> {
    // Our own serialized form nests the reading as `{ value, category }`.
    if let Some(Value::Object(nested)) = lookup(obj, value_keys) {
        return Some(Reading {
            value: number_or_zero(nested, &["value"]),
            category: lookup(nested, &["category"]).and_then(text),
        });
    }
    let value = optional_number(obj, value_keys)?;
    Some(Reading {
        value,
        category: lookup(obj, category_keys).and_then(text),
    })
}

/// Normalizes one raw upstream record.
///
/// Returns `None` only when `raw` is not a JSON object. Every field-level defect is
/// defaulted: numbers fall back to 0, identity strings to `"Unknown"`, and a missing
/// AQI category is derived from the AQI value.
pub fn normalize_record(raw: &Value) -> Option<LocationRecord> {
    let obj = raw.as_object()?;

    let aqi = number_or_zero(obj, AQI_KEYS);
    let aqi_category = lookup(obj, AQI_CATEGORY_KEYS)
        .and_then(text)
        .unwrap_or_else(|| classify(aqi).category.label().to_string());

    Some(LocationRecord {
        city: identity(obj, CITY_KEYS),
        country: identity(obj, COUNTRY_KEYS),
        continent: identity(obj, CONTINENT_KEYS),
        latitude: number_or_zero(obj, LATITUDE_KEYS),
        longitude: number_or_zero(obj, LONGITUDE_KEYS),
        aqi,
        aqi_category,
        pm2_5: reading(obj, PM25_KEYS, PM25_CATEGORY_KEYS),
        pm10: reading(obj, PM10_KEYS, PM10_CATEGORY_KEYS),
        o3: reading(obj, O3_KEYS, O3_CATEGORY_KEYS),
        no2: reading(obj, NO2_KEYS, NO2_CATEGORY_KEYS),
        wind_speed: optional_number(obj, WIND_SPEED_KEYS),
        wind_direction: optional_number(obj, WIND_DIRECTION_KEYS).map(|d| d.rem_euclid(360.0)),
        temperature: optional_number(obj, TEMPERATURE_KEYS),
        observed_at: lookup(obj, OBSERVED_AT_KEYS).and_then(text),
    })
}

/// Normalizes a record payload: either a bare array or an envelope with a `markers` array.
///
/// Elements that are not objects are dropped with a warning.
pub fn normalize_records(payload: &Value) -> Result<Vec<LocationRecord>> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(obj) => match obj.get("markers") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(AppError::DataShape(
                    "expected an array of records or an object with a `markers` array".to_string(),
                ))
            },
        },
        other => {
            return Err(AppError::DataShape(format!(
                "expected an array of records, got {}",
                json_kind(other)
            )))
        },
    };

    let records: Vec<LocationRecord> = items.iter().filter_map(normalize_record).collect();
    if records.len() < items.len() {
        warn!(
            "Dropped {} malformed record(s) during normalization",
            items.len() - records.len()
        );
    }
    debug!("Normalized {} record(s)", records.len());
    Ok(records)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
