//! Terminal rendering of map views and dashboard payloads.
//!
//! Everything here is pure: functions build a `comfy_table::Table` or a `String`
//! and leave printing to the caller.

use crate::config::Theme;
use crate::map::{FilterCriteria, MapItem, MapView, RenderedMarker};
use crate::models::{
    classify, text_color_for_background, AqiCategory, CategoryHistogram, Comparison, DashboardSummary,
    EntitySeries,
};
use chrono::{DateTime, Local, Utc};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::{ASCII_FULL, UTF8_FULL};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

const SHORT_MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
/// Names listed in a cluster row before collapsing into "+N more".
const CLUSTER_PREVIEW: usize = 3;
const MISSING: &str = "-";

fn rgb(hex: &str) -> Color {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return Color::Grey;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(128);
    Color::Rgb {
        r: channel(0),
        g: channel(2),
        b: channel(4),
    }
}

/// A cell painted like the AQI badge: category colour behind, contrast colour in front.
pub fn aqi_cell(text: impl ToString, background: &'static str) -> Cell {
    Cell::new(text)
        .bg(rgb(background))
        .fg(rgb(text_color_for_background(background)))
        .set_alignment(CellAlignment::Center)
}

fn value_cell(value: Option<f64>) -> Cell {
    match value {
        Some(v) => aqi_cell(format!("{:.1}", v), classify(v).color),
        None => Cell::new(MISSING).set_alignment(CellAlignment::Center),
    }
}

fn table(theme: Theme, headers: &[&str]) -> Table {
    let header_color = match theme {
        Theme::Dark => Color::Cyan,
        Theme::Light => Color::DarkBlue,
    };
    let mut table = Table::new();
    match theme {
        Theme::Dark => table.load_preset(UTF8_FULL).apply_modifier(UTF8_ROUND_CORNERS),
        Theme::Light => table.load_preset(ASCII_FULL),
    };
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).fg(header_color).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
    table
}

fn month_labels(months: &[String], len: usize) -> Vec<String> {
    (0..len)
        .map(|i| {
            months
                .get(i)
                .cloned()
                .or_else(|| SHORT_MONTHS.get(i).map(|m| m.to_string()))
                .unwrap_or_else(|| format!("#{}", i + 1))
        })
        .collect()
}

/// Header lines above the map table: mode, viewport, freshness and weather.
pub fn status_text(view: &MapView, now: DateTime<Utc>) -> String {
    let mut lines = vec![
        format!(
            "Mode: {}   Region: {:?}   Center: {}   Zoom: {}{}",
            view.mode,
            view.region,
            view.viewport.center,
            view.viewport.zoom,
            if view.fullscreen { "   [fullscreen]" } else { "" }
        ),
        format!(
            "Last updated: {}",
            view.last_updated
                .map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "never".to_string())
        ),
        format!(
            "Weather: wind {:.1} km/h from {:.0}°, {:.1}°C",
            view.weather.wind_speed_kmh, view.weather.wind_direction_deg, view.weather.temperature_c
        ),
    ];
    let criteria = &view.criteria;
    if let Some(term) = &criteria.search {
        lines.push(format!("Search: {:?}", term));
    } else if *criteria != FilterCriteria::default() {
        let mut filter = format!("Filter: {} / {} / {}", criteria.continent, criteria.country, criteria.city);
        if !criteria.categories.is_empty() {
            let categories: Vec<&str> = criteria.categories.iter().map(String::as_str).collect();
            filter.push_str(&format!(" [{}]", categories.join(", ")));
        }
        lines.push(filter);
    }
    if let Some(transient) = view.transient {
        let left = (transient.expires_at - now).num_seconds().max(0);
        lines.push(format!("You are here: {} ({}s)", transient.position, left));
    }
    lines.join("\n")
}

fn worst<'a>(markers: impl Iterator<Item = &'a RenderedMarker>) -> Option<&'a RenderedMarker> {
    markers.max_by(|a, b| a.record.aqi.total_cmp(&b.record.aqi))
}

/// One row per drawn item at the current zoom: a lone marker or a cluster badge.
pub fn map_table(view: &MapView, theme: Theme) -> Table {
    let mut table = table(theme, &["", "Location", "Position", "AQI", "Category"]);
    for item in &view.items {
        match item {
            MapItem::Single(index) => {
                let Some(marker) = view.markers.get(*index) else {
                    continue;
                };
                table.add_row(vec![
                    Cell::new("●").fg(rgb(marker.icon.background)),
                    Cell::new(format!("{}, {}", marker.record.city, marker.record.country)),
                    Cell::new(marker.position),
                    aqi_cell(&marker.icon.label, marker.icon.background),
                    Cell::new(&marker.popup.category),
                ]);
            },
            MapItem::Cluster { center, members } => {
                let members: Vec<&RenderedMarker> =
                    members.iter().filter_map(|&i| view.markers.get(i)).collect();
                let Some(peak) = worst(members.iter().copied()) else {
                    continue;
                };
                let mut names: Vec<&str> = members
                    .iter()
                    .take(CLUSTER_PREVIEW)
                    .map(|m| m.record.city.as_str())
                    .collect();
                let more = members.len().saturating_sub(CLUSTER_PREVIEW);
                let more_label = format!("+{} more", more);
                if more > 0 {
                    names.push(&more_label);
                }
                table.add_row(vec![
                    Cell::new(members.len()).add_attribute(Attribute::Bold),
                    Cell::new(names.join(", ")),
                    Cell::new(center),
                    aqi_cell(format!("max {}", peak.icon.label), peak.icon.background),
                    Cell::new(&peak.popup.category),
                ]);
            },
        }
    }
    table
}

/// The six bands with their colours and ranges.
pub fn legend_table(theme: Theme) -> Table {
    let mut table = table(theme, &["Category", "AQI range"]);
    for category in AqiCategory::ALL {
        table.add_row(vec![aqi_cell(category.label(), category.color()), Cell::new(category.range())]);
    }
    table
}

pub fn dashboard_table(summary: &DashboardSummary, theme: Theme) -> Table {
    let mut table = table(theme, &["#", "Country", "AQI"]);
    for (rank, entry) in summary.top_polluted_countries.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(&entry.country),
            value_cell(entry.aqi),
        ]);
    }
    table
}

/// Monthly AQI for one city or country.
pub fn series_table(series: &EntitySeries, theme: Theme) -> Table {
    let mut table = table(theme, &["Month", "AQI"]);
    let labels = month_labels(&series.months, series.monthly_data.len());
    for (label, value) in labels.into_iter().zip(&series.monthly_data) {
        table.add_row(vec![Cell::new(label), value_cell(*value)]);
    }
    table
}

/// Side-by-side monthly values followed by summary rows.
pub fn comparison_table(comparison: &Comparison, theme: Theme) -> Table {
    let first = &comparison.first;
    let second = &comparison.second;
    let mut table = table(theme, &["", first.label().as_str(), second.label().as_str()]);

    let len = first.monthly_values.len().max(second.monthly_values.len());
    for (i, label) in month_labels(&comparison.months, len).into_iter().enumerate() {
        table.add_row(vec![
            Cell::new(label),
            value_cell(first.monthly_values.get(i).copied().flatten()),
            value_cell(second.monthly_values.get(i).copied().flatten()),
        ]);
    }

    let month = |m: Option<(&'static str, f64)>| {
        m.map(|(name, v)| format!("{} ({:.1})", name, v))
            .unwrap_or_else(|| MISSING.to_string())
    };
    table.add_row(vec![
        Cell::new("Average").add_attribute(Attribute::Bold),
        value_cell(first.average()),
        value_cell(second.average()),
    ]);
    table.add_row(vec![
        Cell::new("Worst month"),
        Cell::new(month(first.peak_month())),
        Cell::new(month(second.peak_month())),
    ]);
    table.add_row(vec![
        Cell::new("Cleanest month"),
        Cell::new(month(first.cleanest_month())),
        Cell::new(month(second.cleanest_month())),
    ]);

    let (a, b) = (first.seasonal(), second.seasonal());
    for (season, x, y) in [
        ("Winter", a.winter, b.winter),
        ("Summer", a.summer, b.summer),
        ("Monsoon", a.monsoon, b.monsoon),
        ("Post-monsoon", a.post_monsoon, b.post_monsoon),
    ] {
        table.add_row(vec![Cell::new(season), value_cell(x), value_cell(y)]);
    }
    table
}

/// Counts per category in severity order, with a share bar. Unknown labels go last.
pub fn histogram_table(histogram: &CategoryHistogram, theme: Theme) -> Table {
    let mut table = table(theme, &["Category", "Cities", "Share", ""]);
    let total = histogram.total();

    let mut rows: Vec<(&str, u64, &'static str)> = AqiCategory::ALL
        .iter()
        .map(|c| (c.label(), histogram.category_counts.get(c.label()).copied().unwrap_or(0), c.color()))
        .collect();
    rows.extend(
        histogram
            .category_counts
            .iter()
            .filter(|(label, _)| AqiCategory::from_label(label).is_none())
            .map(|(label, count)| (label.as_str(), *count, "#808080")),
    );

    for (label, count, color) in rows {
        let share = if total == 0 { 0.0 } else { count as f64 * 100.0 / total as f64 };
        table.add_row(vec![
            aqi_cell(label, color),
            Cell::new(count).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.1}%", share)).set_alignment(CellAlignment::Right),
            Cell::new("█".repeat((share / 2.0).round() as usize)).fg(rgb(color)),
        ]);
    }
    table
}
