//! AQI classification shared by every other component.
//!
//! The category table is closed and ordered; `classify` is total over all `f64`
//! inputs. NaN and non-positive values are coerced to 0 first; `+inf` is Hazardous.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the six fixed AQI severity bands, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AqiCategory {
    Good,
    Moderate,
    #[serde(rename = "Unhealthy for Sensitive Groups")]
    UnhealthyForSensitiveGroups,
    Unhealthy,
    #[serde(rename = "Very Unhealthy")]
    VeryUnhealthy,
    Hazardous,
}

/// Upper bound (inclusive) of each finite band. Anything above the last bound is `Hazardous`.
const THRESHOLDS: [(f64, AqiCategory); 5] = [
    (50.0, AqiCategory::Good),
    (100.0, AqiCategory::Moderate),
    (150.0, AqiCategory::UnhealthyForSensitiveGroups),
    (200.0, AqiCategory::Unhealthy),
    (300.0, AqiCategory::VeryUnhealthy),
];

impl AqiCategory {
    /// All categories in severity order.
    pub const ALL: [AqiCategory; 6] = [
        AqiCategory::Good,
        AqiCategory::Moderate,
        AqiCategory::UnhealthyForSensitiveGroups,
        AqiCategory::Unhealthy,
        AqiCategory::VeryUnhealthy,
        AqiCategory::Hazardous,
    ];

    /// Display label, exactly as the backend spells it.
    pub fn label(self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
        }
    }

    /// Hex display colour for the band.
    pub fn color(self) -> &'static str {
        match self {
            AqiCategory::Good => "#009966",
            AqiCategory::Moderate => "#ffde33",
            AqiCategory::UnhealthyForSensitiveGroups => "#ff9933",
            AqiCategory::Unhealthy => "#cc0033",
            AqiCategory::VeryUnhealthy => "#660099",
            AqiCategory::Hazardous => "#7e0023",
        }
    }

    /// Legend range text for the band.
    pub fn range(self) -> &'static str {
        match self {
            AqiCategory::Good => "0-50",
            AqiCategory::Moderate => "51-100",
            AqiCategory::UnhealthyForSensitiveGroups => "101-150",
            AqiCategory::Unhealthy => "151-200",
            AqiCategory::VeryUnhealthy => "201-300",
            AqiCategory::Hazardous => "301+",
        }
    }

    /// Parses a backend label back into a category. Matching is exact.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of classifying a single AQI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub category: AqiCategory,
    pub color: &'static str,
}

/// Maps an AQI value to its category and display colour.
pub fn classify(aqi: f64) -> Classification {
    let value = if aqi > 0.0 { aqi } else { 0.0 };
    let category = THRESHOLDS
        .iter()
        .find(|(upper, _)| value <= *upper)
        .map(|(_, category)| *category)
        .unwrap_or(AqiCategory::Hazardous);
    Classification {
        category,
        color: category.color(),
    }
}

/// Text colour that stays readable on top of an AQI badge colour.
pub fn text_color_for_background(background: &str) -> &'static str {
    // Only the yellow band needs dark text.
    if background.eq_ignore_ascii_case(AqiCategory::Moderate.color()) {
        "#000000"
    } else {
        "#ffffff"
    }
}
