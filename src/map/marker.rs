//! Marker factory: turns one `LocationRecord` into a renderable marker.
//!
//! Construction is pure. Binding markers to the visible map is the marker set's job.

use crate::models::{classify, text_color_for_background, AqiCategory, LocationRecord, Reading};
use chrono::{DateTime, NaiveDateTime};
use serde::Serialize;
use std::fmt;
use tracing::warn;

/// Placeholder for pollutant readings missing from a record.
pub const MISSING_READING: &str = "N/A";
/// Shown when a record carries a timestamp that cannot be parsed.
pub const UNPARSEABLE_TIMESTAMP: &str = "Recently";
/// Marker badge edge length in pixels.
pub const MARKER_ICON_SIZE: u32 = 36;

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lng)
    }
}

/// The round AQI badge drawn at the marker position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerIcon {
    pub label: String,
    pub background: &'static str,
    pub text_color: &'static str,
    pub size: u32,
}

/// Popup content bound to a marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Popup {
    pub city: String,
    pub country: String,
    pub aqi_label: String,
    pub category: String,
    pub color: &'static str,
    pub text_color: &'static str,
    /// `(pollutant, display value)` rows in fixed order: PM2.5, PM10, O3, NO2.
    pub readings: Vec<(&'static str, String)>,
    /// `None` when the record carried no timestamp at all.
    pub last_updated: Option<String>,
}

impl fmt::Display for Popup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}]", self.country)?;
        writeln!(f, "{}", self.city)?;
        writeln!(f, "AQI {} - {}", self.aqi_label, self.category)?;
        for (name, value) in &self.readings {
            writeln!(f, "  {:<6} {}", format!("{}:", name), value)?;
        }
        if let Some(updated) = &self.last_updated {
            writeln!(f, "Last updated: {}", updated)?;
        }
        Ok(())
    }
}

/// A record together with everything derived for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedMarker {
    pub record: LocationRecord,
    pub position: LatLng,
    pub category: AqiCategory,
    pub icon: MarkerIcon,
    pub popup: Popup,
}

fn display_reading(reading: &Option<Reading>) -> String {
    reading
        .as_ref()
        .map(Reading::to_string)
        .unwrap_or_else(|| MISSING_READING.to_string())
}

/// Formats a backend timestamp for display, or `"Recently"` when it cannot be parsed.
pub fn format_timestamp(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.format("%Y-%m-%d %H:%M %:z").to_string();
    }
    for pattern in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, pattern) {
            return parsed.format("%Y-%m-%d %H:%M").to_string();
        }
    }
    UNPARSEABLE_TIMESTAMP.to_string()
}

/// Builds a marker for `record`, or `None` when it cannot be placed on the map
/// (non-finite coordinates, or latitude and longitude both exactly zero).
pub fn create_marker(record: &LocationRecord) -> Option<RenderedMarker> {
    if !record.has_valid_coordinates() {
        warn!(
            "Skipping {}, {}: invalid coordinates ({}, {})",
            record.city, record.country, record.latitude, record.longitude
        );
        return None;
    }

    let aqi = if record.aqi.is_nan() || record.aqi == f64::NEG_INFINITY { 0.0 } else { record.aqi };
    let classification = classify(aqi);
    let text_color = text_color_for_background(classification.color);
    let aqi_label = if aqi.is_finite() { format!("{}", aqi.round()) } else { "∞".to_string() };
    let category = if record.aqi_category.trim().is_empty() {
        classification.category.label().to_string()
    } else {
        record.aqi_category.clone()
    };

    let popup = Popup {
        city: record.city.clone(),
        country: record.country.clone(),
        aqi_label: aqi_label.clone(),
        category,
        color: classification.color,
        text_color,
        readings: vec![
            ("PM2.5", display_reading(&record.pm2_5)),
            ("PM10", display_reading(&record.pm10)),
            ("O3", display_reading(&record.o3)),
            ("NO2", display_reading(&record.no2)),
        ],
        last_updated: record.observed_at.as_deref().map(format_timestamp),
    };

    Some(RenderedMarker {
        record: record.clone(),
        position: LatLng::new(record.latitude, record.longitude),
        category: classification.category,
        icon: MarkerIcon {
            label: aqi_label,
            background: classification.color,
            text_color,
            size: MARKER_ICON_SIZE,
        },
        popup,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(lat: f64, lng: f64, aqi: f64) -> LocationRecord {
        LocationRecord::new("Delhi", "India", "Asia", lat, lng, aqi)
    }

    #[test]
    fn test_rejects_origin_and_nan_coordinates() {
        assert!(create_marker(&record(0.0, 0.0, 10.0)).is_none());
        assert!(create_marker(&record(f64::NAN, 12.0, 10.0)).is_none());
        assert!(create_marker(&record(12.0, f64::INFINITY, 10.0)).is_none());
    }

    #[test]
    fn test_equator_and_meridian_alone_are_valid() {
        assert!(create_marker(&record(0.0, 12.0, 10.0)).is_some());
        assert!(create_marker(&record(12.0, 0.0, 10.0)).is_some());
    }

    #[test]
    fn test_icon_uses_classifier_color() {
        let marker = create_marker(&record(28.6, 77.2, 187.4)).unwrap();
        assert_eq!(marker.category, AqiCategory::Unhealthy);
        assert_eq!(marker.icon.background, "#cc0033");
        assert_eq!(marker.icon.text_color, "#ffffff");
        assert_eq!(marker.icon.label, "187");
        assert_eq!(marker.position, LatLng::new(28.6, 77.2));
    }

    #[test]
    fn test_moderate_badge_uses_dark_text() {
        let marker = create_marker(&record(28.6, 77.2, 75.0)).unwrap();
        assert_eq!(marker.popup.text_color, "#000000");
    }

    #[test]
    fn test_missing_pollutants_render_as_na() {
        let mut rec = record(28.6, 77.2, 187.0);
        rec.pm10 = Some(Reading {
            value: 162.0,
            category: Some("Unhealthy".to_string()),
        });
        let marker = create_marker(&rec).unwrap();
        let rows = &marker.popup.readings;
        assert_eq!(rows[0], ("PM2.5", "N/A".to_string()));
        assert_eq!(rows[1], ("PM10", "162 (Unhealthy)".to_string()));
        assert!(marker.popup.to_string().contains("PM2.5: N/A"));
    }

    #[test]
    fn test_timestamp_handling() {
        let mut rec = record(28.6, 77.2, 10.0);
        assert_eq!(create_marker(&rec).unwrap().popup.last_updated, None);

        rec.observed_at = Some("yesterday-ish".to_string());
        assert_eq!(
            create_marker(&rec).unwrap().popup.last_updated.as_deref(),
            Some("Recently")
        );

        rec.observed_at = Some("2024-05-01 10:00:00".to_string());
        assert_eq!(
            create_marker(&rec).unwrap().popup.last_updated.as_deref(),
            Some("2024-05-01 10:00")
        );

        rec.observed_at = Some("2024-05-01T10:00:00Z".to_string());
        assert_eq!(
            create_marker(&rec).unwrap().popup.last_updated.as_deref(),
            Some("2024-05-01 10:00 +00:00")
        );
    }

    #[test]
    fn test_positive_infinite_aqi_is_hazardous() {
        let marker = create_marker(&record(28.6, 77.2, f64::INFINITY)).unwrap();
        assert_eq!(marker.category, AqiCategory::Hazardous);
        assert_eq!(marker.icon.label, "∞");
    }

    #[test]
    fn test_nan_aqi_is_shown_as_zero() {
        let marker = create_marker(&record(28.6, 77.2, f64::NAN)).unwrap();
        assert_eq!(marker.icon.label, "0");
        assert_eq!(marker.category, AqiCategory::Good);
    }
}
