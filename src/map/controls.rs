//! Map controller: the single owner of map state and the user-triggered actions
//! that change it (refresh, region focus, filtering, geolocation, fullscreen and the
//! realtime/static toggle).
//!
//! Every data action issues a request generation before it awaits the network. When
//! the response arrives, it is applied only if no newer request has been issued in
//! the meantime; otherwise it is discarded.

use crate::api::{Endpoint, Gateway, SnapshotStore};
use crate::error::{AppError, Result};
use crate::map::cluster::{ClusterPolicy, MapItem};
use crate::map::filter::{apply_filter, search_suggestions, FilterCriteria, FilterOptions, ALL};
use crate::map::marker::{LatLng, RenderedMarker};
use crate::map::marker_set::MarkerSet;
use crate::models::LocationRecord;
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// How long the "you are here" marker stays on the map.
pub const TRANSIENT_MARKER_SECS: i64 = 5;
/// Zoom used when centering on the user's position.
pub const LOCATE_ZOOM: u8 = 10;
/// Zoom used when jumping to a search result.
pub const SEARCH_RESULT_ZOOM: u8 = 12;

/// Map center and zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: LatLng,
    pub zoom: u8,
}

impl Viewport {
    pub const INDIA: Viewport = Viewport {
        center: LatLng::new(20.5937, 78.9629),
        zoom: 4,
    };
    pub const GLOBAL: Viewport = Viewport {
        center: LatLng::new(20.0, 0.0),
        zoom: 2,
    };
}

/// Where map data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataMode {
    Realtime,
    Static,
}

impl fmt::Display for DataMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataMode::Realtime => f.write_str("realtime"),
            DataMode::Static => f.write_str("static"),
        }
    }
}

/// What the map is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    India,
    Global,
    /// Anything reached through the filter controls.
    Custom,
}

impl Region {
    pub const INDIA_COUNTRY: &'static str = "India";
}

/// Regions reachable from the focus controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionPreset {
    India,
    Global,
}

impl From<RegionPreset> for Region {
    fn from(preset: RegionPreset) -> Self {
        match preset {
            RegionPreset::India => Region::India,
            RegionPreset::Global => Region::Global,
        }
    }
}

/// Source of the platform's last-known position.
pub trait Geolocator: Send + Sync {
    fn current_position(&self) -> Result<LatLng>;
}

/// Geolocation backed by a configured setting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfiguredLocation {
    Unsupported,
    Denied,
    At(LatLng),
}

impl Geolocator for ConfiguredLocation {
    fn current_position(&self) -> Result<LatLng> {
        match self {
            ConfiguredLocation::Unsupported => Err(AppError::UnsupportedCapability("Geolocation")),
            ConfiguredLocation::Denied => Err(AppError::GeolocationDenied(
                "permission to read the current position was denied".to_string(),
            )),
            ConfiguredLocation::At(position) => Ok(*position),
        }
    }
}

/// The short-lived marker placed at the user's position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransientMarker {
    pub position: LatLng,
    pub expires_at: DateTime<Utc>,
}

/// Weather shown next to the map, taken from the first displayed record carrying any.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherSummary {
    pub wind_speed_kmh: f64,
    pub temperature_c: f64,
    pub wind_direction_deg: f64,
}

impl Default for WeatherSummary {
    fn default() -> Self {
        Self {
            wind_speed_kmh: 3.5,
            temperature_c: 28.0,
            wind_direction_deg: 120.0,
        }
    }
}

impl WeatherSummary {
    pub fn from_markers(markers: &[RenderedMarker]) -> Self {
        let mut summary = Self::default();
        let carrier = markers.iter().map(|m| &m.record).find(|r| {
            r.wind_speed.is_some() || r.temperature.is_some() || r.wind_direction.is_some()
        });
        if let Some(record) = carrier {
            if let Some(speed) = record.wind_speed {
                summary.wind_speed_kmh = speed;
            }
            if let Some(temperature) = record.temperature {
                summary.temperature_c = temperature;
            }
            if let Some(direction) = record.wind_direction {
                summary.wind_direction_deg = direction;
            }
        }
        summary
    }
}

/// Ticket identifying one data request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Generation(u64);

/// Monotonic request counter.
#[derive(Debug, Default)]
pub struct RequestGenerations {
    latest: AtomicU64,
}

impl RequestGenerations {
    pub fn issue(&self) -> Generation {
        Generation(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.latest.load(Ordering::SeqCst) == generation.0
    }
}

/// Result of one data action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOutcome {
    /// Markers on the map after the action.
    pub shown: usize,
    /// Where this particular load came from (may be `Static` while the mode is `Realtime`).
    pub source: DataMode,
    /// `true` when a newer request superseded this one and its data was dropped.
    pub stale: bool,
}

/// Everything needed to draw the map once.
#[derive(Debug, Clone)]
pub struct MapView {
    pub viewport: Viewport,
    pub markers: Vec<RenderedMarker>,
    pub items: Vec<MapItem>,
    pub transient: Option<TransientMarker>,
    pub fullscreen: bool,
    pub mode: DataMode,
    pub region: Region,
    pub criteria: FilterCriteria,
    pub last_updated: Option<DateTime<Utc>>,
    pub weather: WeatherSummary,
}

#[derive(Debug)]
struct MapState {
    markers: MarkerSet,
    /// Every record from the last applied load, before filtering.
    source: Vec<LocationRecord>,
    criteria: FilterCriteria,
    region: Region,
    mode: DataMode,
    viewport: Viewport,
    fullscreen: bool,
    transient: Option<TransientMarker>,
    last_updated: Option<DateTime<Utc>>,
}

/// What to load and how to narrow it.
struct LoadPlan {
    endpoint: Endpoint,
    criteria: FilterCriteria,
    /// Keep only this country from realtime data; an empty result then counts as a failure.
    restrict_country: Option<&'static str>,
}

/// Owns the map state and drives the gateway, snapshot and marker set.
pub struct MapController {
    gateway: Gateway,
    snapshot: SnapshotStore,
    geolocator: Box<dyn Geolocator>,
    fullscreen_supported: bool,
    generations: RequestGenerations,
    state: Mutex<MapState>,
}

impl MapController {
    pub fn new(
        gateway: Gateway,
        snapshot: SnapshotStore,
        geolocator: Box<dyn Geolocator>,
        fullscreen_supported: bool,
    ) -> Self {
        Self {
            gateway,
            snapshot,
            geolocator,
            fullscreen_supported,
            generations: RequestGenerations::default(),
            state: Mutex::new(MapState {
                markers: MarkerSet::new(ClusterPolicy::default()),
                source: Vec::new(),
                criteria: FilterCriteria::region(ALL, Region::INDIA_COUNTRY, ALL),
                region: Region::India,
                mode: DataMode::Realtime,
                viewport: Viewport::INDIA,
                fullscreen: false,
                transient: None,
                last_updated: None,
            }),
        }
    }

    // The lock is never held across an await point.
    fn state(&self) -> MutexGuard<'_, MapState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn mode(&self) -> DataMode {
        self.state().mode
    }

    pub fn viewport(&self) -> Viewport {
        self.state().viewport
    }

    pub fn marker_count(&self) -> usize {
        self.state().markers.len()
    }

    /// Whether any load has been committed, even one that left the map empty.
    pub fn has_loaded(&self) -> bool {
        self.state().last_updated.is_some()
    }

    /// Snapshot of everything drawable, with expired transient markers hidden.
    pub fn view(&self, now: DateTime<Utc>) -> MapView {
        let state = self.state();
        MapView {
            viewport: state.viewport,
            markers: state.markers.markers().to_vec(),
            items: state.markers.items(state.viewport.zoom),
            transient: state.transient.filter(|t| t.expires_at > now),
            fullscreen: state.fullscreen,
            mode: state.mode,
            region: state.region,
            criteria: state.criteria.clone(),
            last_updated: state.last_updated,
            weather: WeatherSummary::from_markers(state.markers.markers()),
        }
    }

    /// Filter option lists derived from the last loaded records.
    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions::from_records(&self.state().source)
    }

    /// Starts a data request. Any earlier request still in flight becomes stale.
    pub fn begin_request(&self) -> Generation {
        let generation = self.generations.issue();
        debug!("Issued request generation {:?}", generation);
        generation
    }

    /// Applies loaded records if `generation` is still the newest request.
    ///
    /// Returns `false` (and changes nothing) when the response is stale.
    pub fn commit(
        &self,
        generation: Generation,
        source: Vec<LocationRecord>,
        visible: &[LocationRecord],
        now: DateTime<Utc>,
    ) -> bool {
        let mut state = self.state();
        if !self.generations.is_current(generation) {
            warn!(
                "Discarding stale response for request {:?}; a newer request was issued",
                generation
            );
            return false;
        }
        state.markers.replace_all(visible);
        state.source = source;
        state.last_updated = Some(now);
        true
    }

    /// Initial page load: India, realtime first.
    pub async fn load_initial(&self) -> Result<LoadOutcome> {
        self.focus_region(RegionPreset::India).await
    }

    /// Re-fetches the current selection and replaces the markers.
    pub async fn refresh(&self) -> Result<LoadOutcome> {
        let (mode, region, criteria) = {
            let state = self.state();
            (state.mode, state.region, state.criteria.clone())
        };
        let plan = if mode == DataMode::Realtime && region == Region::India {
            LoadPlan {
                endpoint: Endpoint::IndiaAqiData { refresh: true },
                criteria,
                restrict_country: Some(Region::INDIA_COUNTRY),
            }
        } else {
            LoadPlan {
                endpoint: Endpoint::filter_markers(
                    &criteria.continent,
                    &criteria.country,
                    &criteria.city,
                    mode == DataMode::Realtime,
                ),
                criteria,
                restrict_country: None,
            }
        };
        info!("Refreshing map data ({} mode, {:?})", mode, region);
        self.run(plan).await
    }

    /// Moves to a preset region and reloads with region-scoped criteria.
    pub async fn focus_region(&self, preset: RegionPreset) -> Result<LoadOutcome> {
        let (viewport, criteria, endpoint, restrict_country) = match preset {
            RegionPreset::India => (
                Viewport::INDIA,
                FilterCriteria::region(ALL, Region::INDIA_COUNTRY, ALL),
                Endpoint::IndiaAqiData { refresh: false },
                Some(Region::INDIA_COUNTRY),
            ),
            RegionPreset::Global => (
                Viewport::GLOBAL,
                FilterCriteria::default(),
                Endpoint::filter_markers(ALL, ALL, ALL, true),
                None,
            ),
        };
        {
            let mut state = self.state();
            state.viewport = viewport;
            state.region = preset.into();
            state.criteria = criteria.clone();
        }
        self.run(LoadPlan {
            endpoint,
            criteria,
            restrict_country,
        })
        .await
    }

    /// Applies new filter criteria. The structured part is sent to the backend; search
    /// and category constraints are applied locally to whatever comes back.
    pub async fn apply_filter(&self, criteria: FilterCriteria) -> Result<LoadOutcome> {
        let mode = {
            let mut state = self.state();
            state.criteria = criteria.clone();
            state.region = Region::Custom;
            state.mode
        };
        let endpoint = Endpoint::filter_markers(
            &criteria.continent,
            &criteria.country,
            &criteria.city,
            mode == DataMode::Realtime,
        );
        self.run(LoadPlan {
            endpoint,
            criteria,
            restrict_country: None,
        })
        .await
    }

    /// Sets the data source for subsequent loads without loading anything.
    pub fn select_mode(&self, mode: DataMode) {
        self.state().mode = mode;
        info!("Data mode set to {}", mode);
    }

    /// Switches between realtime and static data, then refreshes.
    pub async fn set_mode(&self, mode: DataMode) -> Result<LoadOutcome> {
        self.select_mode(mode);
        self.refresh().await
    }

    async fn run(&self, plan: LoadPlan) -> Result<LoadOutcome> {
        let generation = self.begin_request();
        let mode = self.mode();

        let (records, source) = match mode {
            DataMode::Realtime => match self.fetch_realtime(&plan).await {
                Ok(records) => (records, DataMode::Realtime),
                Err(e) => {
                    warn!("Realtime load failed ({}); falling back to static snapshot", e);
                    (self.load_static(&plan)?, DataMode::Static)
                },
            },
            DataMode::Static => (self.load_static(&plan)?, DataMode::Static),
        };

        let visible = apply_filter(&records, &plan.criteria);
        if visible.is_empty() {
            info!("No records match the current selection");
        }
        let applied = self.commit(generation, records, &visible, Utc::now());
        Ok(LoadOutcome {
            shown: self.marker_count(),
            source,
            stale: !applied,
        })
    }

    async fn fetch_realtime(&self, plan: &LoadPlan) -> Result<Vec<LocationRecord>> {
        let records = self.gateway.fetch_records(&plan.endpoint).await?;
        match plan.restrict_country {
            Some(country) => {
                let restricted: Vec<_> = records.into_iter().filter(|r| r.country == country).collect();
                if restricted.is_empty() {
                    return Err(AppError::DataShape(format!("no valid records for {}", country)));
                }
                Ok(restricted)
            },
            None => Ok(records),
        }
    }

    fn load_static(&self, plan: &LoadPlan) -> Result<Vec<LocationRecord>> {
        match plan.restrict_country {
            Some(country) => self.snapshot.load_for_country(country),
            None => self.snapshot.load(),
        }
    }

    /// Local search over the last loaded records.
    pub fn search(&self, term: &str) -> Vec<LocationRecord> {
        let state = self.state();
        search_suggestions(&state.source, term)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Centers the map on a search result.
    pub fn jump_to(&self, position: LatLng) {
        self.state().viewport = Viewport {
            center: position,
            zoom: SEARCH_RESULT_ZOOM,
        };
    }

    /// Centers on the platform's position and drops a transient marker there.
    ///
    /// On failure nothing changes; the error is returned for the caller to show.
    pub fn locate(&self, now: DateTime<Utc>) -> Result<TransientMarker> {
        let position = self.geolocator.current_position().map_err(|e| {
            warn!("Geolocation failed: {}", e);
            e
        })?;
        let marker = TransientMarker {
            position,
            expires_at: now + Duration::seconds(TRANSIENT_MARKER_SECS),
        };
        let mut state = self.state();
        state.viewport = Viewport {
            center: position,
            zoom: LOCATE_ZOOM,
        };
        state.transient = Some(marker);
        info!("Centered map on current position {}", position);
        Ok(marker)
    }

    /// Drops the transient marker once it has expired.
    pub fn prune_transient(&self, now: DateTime<Utc>) {
        let mut state = self.state();
        if state.transient.map_or(false, |t| t.expires_at <= now) {
            state.transient = None;
        }
    }

    /// Flips fullscreen display. Returns the new state.
    pub fn toggle_fullscreen(&self) -> Result<bool> {
        if !self.fullscreen_supported {
            return Err(AppError::UnsupportedCapability("Fullscreen"));
        }
        let mut state = self.state();
        state.fullscreen = !state.fullscreen;
        Ok(state.fullscreen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockito::{Matcher, Server};
    use serde_json::json;

    const MISSING_SNAPSHOT: &str = "/definitely/not/here/marker_data.json";

    fn controller(base_url: &str, location: ConfiguredLocation) -> MapController {
        MapController::new(
            Gateway::new(base_url).unwrap(),
            SnapshotStore::new(MISSING_SNAPSHOT),
            Box::new(location),
            true,
        )
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    }

    fn india_body() -> String {
        json!([
            { "City": "Delhi", "Country": "India", "Continent": "Asia", "Latitude": 28.61, "Longitude": 77.2, "AQI": 187, "wind_speed": 9 },
            { "City": "Lahore", "Country": "Pakistan", "Continent": "Asia", "Latitude": 31.5, "Longitude": 74.3, "AQI": 170 },
            { "City": "Patna", "Country": "India", "Continent": "Asia", "Latitude": 25.6, "Longitude": 85.1, "AQI": 150 }
        ])
        .to_string()
    }

    #[test]
    fn test_generations_are_monotonic() {
        let generations = RequestGenerations::default();
        let first = generations.issue();
        let second = generations.issue();
        assert!(second > first);
        assert!(!generations.is_current(first));
        assert!(generations.is_current(second));
    }

    #[test]
    fn test_stale_commit_is_discarded() {
        let controller = controller("http://127.0.0.1:9", ConfiguredLocation::Unsupported);
        let older = controller.begin_request();
        let newer = controller.begin_request();

        let fresh = vec![LocationRecord::new("Tokyo", "Japan", "Asia", 35.6, 139.6, 42.0)];
        assert!(controller.commit(newer, fresh.clone(), &fresh, t0()));

        let late = vec![
            LocationRecord::new("Delhi", "India", "Asia", 28.6, 77.2, 187.0),
            LocationRecord::new("Patna", "India", "Asia", 25.6, 85.1, 150.0),
        ];
        assert!(!controller.commit(older, late.clone(), &late, t0()));

        let view = controller.view(t0());
        assert_eq!(view.markers.len(), 1);
        assert_eq!(view.markers[0].record.city, "Tokyo");
    }

    #[tokio::test]
    async fn test_initial_load_keeps_only_india() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/india-aqi-data")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(india_body())
            .create_async()
            .await;

        let controller = controller(&server.url(), ConfiguredLocation::Unsupported);
        let outcome = controller.load_initial().await.unwrap();
        assert_eq!(outcome, LoadOutcome { shown: 2, source: DataMode::Realtime, stale: false });

        let view = controller.view(t0());
        assert_eq!(view.viewport, Viewport::INDIA);
        assert_eq!(view.weather.wind_speed_kmh, 9.0);
        assert_eq!(view.weather.temperature_c, 28.0);
    }

    #[tokio::test]
    async fn test_india_records_without_continent_are_kept() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/india-aqi-data")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    { "City": "Delhi", "Country": "India", "Latitude": 28.61, "Longitude": 77.2, "AQI": 187 },
                    { "City": "Mumbai", "Country": "India", "Latitude": 19.07, "Longitude": 72.87, "AQI": 95 }
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let controller = controller(&server.url(), ConfiguredLocation::Unsupported);
        let outcome = controller.load_initial().await.unwrap();
        assert_eq!(outcome, LoadOutcome { shown: 2, source: DataMode::Realtime, stale: false });
        assert_eq!(controller.view(t0()).region, Region::India);
    }

    #[tokio::test]
    async fn test_realtime_failure_falls_back_to_static_for_one_operation() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/india-aqi-data")
            .with_status(503)
            .create_async()
            .await;

        let controller = controller(&server.url(), ConfiguredLocation::Unsupported);
        let outcome = controller.load_initial().await.unwrap();
        assert_eq!(outcome.source, DataMode::Static);
        assert!(outcome.shown > 0);
        assert!(controller
            .view(t0())
            .markers
            .iter()
            .all(|m| m.record.country == "India"));
        // The fallback does not stick.
        assert_eq!(controller.mode(), DataMode::Realtime);
    }

    #[tokio::test]
    async fn test_refresh_in_india_uses_refresh_flag() {
        let mut server = Server::new_async().await;
        let plain = server
            .mock("GET", "/api/india-aqi-data")
            .match_query(Matcher::Missing)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(india_body())
            .create_async()
            .await;
        let refreshed = server
            .mock("GET", "/api/india-aqi-data")
            .match_query(Matcher::UrlEncoded("refresh".into(), "true".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(india_body())
            .create_async()
            .await;

        let controller = controller(&server.url(), ConfiguredLocation::Unsupported);
        controller.load_initial().await.unwrap();
        let outcome = controller.refresh().await.unwrap();
        assert_eq!(outcome.shown, 2);
        plain.assert_async().await;
        refreshed.assert_async().await;
    }

    #[tokio::test]
    async fn test_global_view_and_filters_hit_filter_markers() {
        let mut server = Server::new_async().await;
        let _global = server
            .mock("GET", "/api/filter-markers")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("continent".into(), "All".into()),
                Matcher::UrlEncoded("use_api".into(), "true".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    { "City": "London", "Country": "United Kingdom", "Continent": "Europe", "Latitude": 51.5, "Longitude": -0.12, "AQI": 38 },
                    { "City": "Tokyo", "Country": "Japan", "Continent": "Asia", "Latitude": 35.6, "Longitude": 139.6, "AQI": 42 }
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let controller = controller(&server.url(), ConfiguredLocation::Unsupported);
        let outcome = controller.focus_region(RegionPreset::Global).await.unwrap();
        assert_eq!(outcome.shown, 2);
        assert_eq!(controller.viewport(), Viewport::GLOBAL);
        assert_eq!(controller.filter_options().countries, vec!["Japan", "United Kingdom"]);

        let outcome = controller
            .apply_filter(FilterCriteria::default().with_search("lon"))
            .await
            .unwrap();
        assert_eq!(outcome.shown, 1);
        assert_eq!(controller.view(t0()).markers[0].record.city, "London");
        assert_eq!(controller.search("tok")[0].city, "Tokyo");
    }

    #[tokio::test]
    async fn test_filter_with_no_matches_shows_empty_map() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/filter-markers")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let controller = controller(&server.url(), ConfiguredLocation::Unsupported);
        let outcome = controller
            .apply_filter(FilterCriteria::region("Antarctica", ALL, ALL))
            .await
            .unwrap();
        assert_eq!(outcome.shown, 0);
        assert_eq!(outcome.source, DataMode::Realtime);
        assert!(controller.has_loaded());
        assert_eq!(controller.marker_count(), 0);
    }

    #[tokio::test]
    async fn test_static_mode_reads_snapshot_without_network() {
        let controller = controller("http://127.0.0.1:9", ConfiguredLocation::Unsupported);
        let outcome = controller.set_mode(DataMode::Static).await.unwrap();
        assert_eq!(outcome.source, DataMode::Static);
        assert!(outcome.shown > 0);
        assert_eq!(controller.mode(), DataMode::Static);
    }

    #[test]
    fn test_locate_success_sets_viewport_and_transient_marker() {
        let position = LatLng::new(48.85, 2.35);
        let controller = controller("http://127.0.0.1:9", ConfiguredLocation::At(position));
        let marker = controller.locate(t0()).unwrap();
        assert_eq!(marker.expires_at, t0() + Duration::seconds(5));
        assert_eq!(controller.viewport(), Viewport { center: position, zoom: LOCATE_ZOOM });

        assert!(controller.view(t0() + Duration::seconds(4)).transient.is_some());
        assert!(controller.view(t0() + Duration::seconds(5)).transient.is_none());
        controller.prune_transient(t0() + Duration::seconds(6));
        assert!(controller.view(t0()).transient.is_none());
    }

    #[test]
    fn test_locate_failure_leaves_markers_unchanged() {
        let controller = controller("http://127.0.0.1:9", ConfiguredLocation::Denied);
        let generation = controller.begin_request();
        let records = vec![LocationRecord::new("Delhi", "India", "Asia", 28.6, 77.2, 187.0)];
        controller.commit(generation, records.clone(), &records, t0());
        let before = controller.view(t0());

        let result = controller.locate(t0());
        assert!(matches!(result, Err(AppError::GeolocationDenied(_))));

        let after = controller.view(t0());
        assert_eq!(before.markers, after.markers);
        assert_eq!(before.viewport, after.viewport);
        assert!(after.transient.is_none());
    }

    #[test]
    fn test_locate_unsupported() {
        let controller = controller("http://127.0.0.1:9", ConfiguredLocation::Unsupported);
        assert!(matches!(
            controller.locate(t0()),
            Err(AppError::UnsupportedCapability("Geolocation"))
        ));
    }

    #[test]
    fn test_fullscreen_toggle() {
        let controller = controller("http://127.0.0.1:9", ConfiguredLocation::Unsupported);
        assert!(controller.toggle_fullscreen().unwrap());
        assert!(!controller.toggle_fullscreen().unwrap());

        let unsupported = MapController::new(
            Gateway::new("http://127.0.0.1:9").unwrap(),
            SnapshotStore::new(MISSING_SNAPSHOT),
            Box::new(ConfiguredLocation::Unsupported),
            false,
        );
        assert!(matches!(
            unsupported.toggle_fullscreen(),
            Err(AppError::UnsupportedCapability("Fullscreen"))
        ));
    }

    #[test]
    fn test_jump_to_search_result() {
        let controller = controller("http://127.0.0.1:9", ConfiguredLocation::Unsupported);
        controller.jump_to(LatLng::new(51.5, -0.12));
        assert_eq!(controller.viewport().zoom, SEARCH_RESULT_ZOOM);
    }
}
