//! Provides a client for the dashboard backend's JSON endpoints.
//!
//! This module defines the `Gateway` struct, the closed set of `Endpoint`s it can
//! reach, and typed helpers on top of the raw `fetch_json` call. Records destined
//! for the map are normalized here before anything else sees them.

use crate::error::{AppError, Result};
use crate::models::{
    normalize_records, CategoryHistogram, Comparison, DashboardSummary, EntitySeries,
    LocationRecord,
};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info};

/// Default backend root when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Every endpoint the dashboard consumes. All are `GET` and answer with JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `/api/dashboard/data`
    DashboardSummary,
    /// `/api/map/data` (record envelope with filter option lists)
    MapData,
    /// `/api/interactive-map-data`
    InteractiveMapData,
    /// `/api/india-aqi-data`, optionally asking the backend to bypass its cache.
    IndiaAqiData { refresh: bool },
    /// `/api/filter-markers?continent=&country=&city=`
    FilterMarkers {
        continent: String,
        country: String,
        city: String,
        use_api: bool,
    },
    /// `/api/city-data/{city}/{state}`
    CityData { city: String, state: String },
    /// `/api/country-data/{country}`
    CountryData { country: String },
    /// `/api/city-comparison-data?city1=&state1=&city2=&state2=`
    CityComparison {
        city1: String,
        state1: String,
        city2: String,
        state2: String,
    },
    /// `/api/country-comparison-data?country1=&country2=`
    CountryComparison { country1: String, country2: String },
    /// `/api/aqi-csv-data`
    AqiCsvData,
}

impl Endpoint {
    pub fn filter_markers(continent: &str, country: &str, city: &str, use_api: bool) -> Self {
        Endpoint::FilterMarkers {
            continent: continent.to_string(),
            country: country.to_string(),
            city: city.to_string(),
            use_api,
        }
    }

    /// Path segments below the base URL. Dynamic segments are percent-encoded by `Url`.
    fn segments(&self) -> Vec<&str> {
        match self {
            Endpoint::DashboardSummary => vec!["api", "dashboard", "data"],
            Endpoint::MapData => vec!["api", "map", "data"],
            Endpoint::InteractiveMapData => vec!["api", "interactive-map-data"],
            Endpoint::IndiaAqiData { .. } => vec!["api", "india-aqi-data"],
            Endpoint::FilterMarkers { .. } => vec!["api", "filter-markers"],
            Endpoint::CityData { city, state } => vec!["api", "city-data", city.as_str(), state.as_str()],
            Endpoint::CountryData { country } => vec!["api", "country-data", country.as_str()],
            Endpoint::CityComparison { .. } => vec!["api", "city-comparison-data"],
            Endpoint::CountryComparison { .. } => vec!["api", "country-comparison-data"],
            Endpoint::AqiCsvData => vec!["api", "aqi-csv-data"],
        }
    }

    fn query(&self) -> Vec<(&'static str, &str)> {
        match self {
            Endpoint::IndiaAqiData { refresh: true } => vec![("refresh", "true")],
            Endpoint::FilterMarkers {
                continent,
                country,
                city,
                use_api,
            } => {
                let mut query = vec![("continent", continent.as_str()), ("country", country.as_str()), ("city", city.as_str())];
                if *use_api {
                    query.push(("use_api", "true"));
                }
                query
            },
            Endpoint::CityComparison {
                city1,
                state1,
                city2,
                state2,
            } => vec![
                ("city1", city1.as_str()),
                ("state1", state1.as_str()),
                ("city2", city2.as_str()),
                ("state2", state2.as_str()),
            ],
            Endpoint::CountryComparison { country1, country2 } => {
                vec![("country1", country1.as_str()), ("country2", country2.as_str())]
            },
            _ => Vec::new(),
        }
    }
}

/// An asynchronous client for the dashboard backend.
///
/// Does not retry and enforces no timeout of its own; a failed call is reported
/// once and left to the caller.
#[derive(Debug, Clone)]
pub struct Gateway {
    client: Client,
    base_url: Url,
}

impl Gateway {
    /// Creates a new `Gateway` rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the URL does not parse or cannot carry a path.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("invalid base URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!(
                "base URL {} cannot carry a path",
                base_url
            )));
        }
        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    /// Full URL (path and query) for an endpoint.
    pub fn url_for(&self, endpoint: &Endpoint) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(endpoint.segments());
        }
        let query = endpoint.query();
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        url
    }

    /// Issues the `GET` and returns the parsed JSON body.
    ///
    /// # Errors
    ///
    /// * `AppError::Network` on transport failure or a non-2xx status (status and reason kept).
    /// * `AppError::Api` if the body cannot be read or is not JSON.
    pub async fn fetch_json(&self, endpoint: &Endpoint) -> Result<Value> {
        let url = self.url_for(endpoint);
        info!("GET {}", url);

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            error!("Request to {} failed: {}", url, e);
            AppError::network(&e)
        })?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                error!(
                    "Request to {} failed with status {}",
                    url,
                    e.status().unwrap_or_default()
                );
                return Err(AppError::network(&e));
            },
        };

        let body: Value = response.json().await.map_err(|e| {
            error!("Error parsing response JSON from {}: {}", url, e);
            AppError::Api(e.into())
        })?;

        debug!("Received payload from {}", url);
        Ok(body)
    }

    async fn fetch_typed<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<T> {
        let body = self.fetch_json(endpoint).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Fetches a record endpoint and normalizes every element.
    pub async fn fetch_records(&self, endpoint: &Endpoint) -> Result<Vec<LocationRecord>> {
        let body = self.fetch_json(endpoint).await?;
        let records = normalize_records(&body)?;
        info!("Fetched {} location record(s)", records.len());
        Ok(records)
    }

    pub async fn fetch_dashboard_summary(&self) -> Result<DashboardSummary> {
        self.fetch_typed(&Endpoint::DashboardSummary).await
    }

    pub async fn fetch_country_series(&self, country: &str) -> Result<EntitySeries> {
        self.fetch_typed(&Endpoint::CountryData {
            country: country.to_string(),
        })
        .await
    }

    pub async fn fetch_city_series(&self, city: &str, state: &str) -> Result<EntitySeries> {
        self.fetch_typed(&Endpoint::CityData {
            city: city.to_string(),
            state: state.to_string(),
        })
        .await
    }

    pub async fn fetch_city_comparison(
        &self,
        (city1, state1): (&str, &str),
        (city2, state2): (&str, &str),
    ) -> Result<Comparison> {
        self.fetch_typed(&Endpoint::CityComparison {
            city1: city1.to_string(),
            state1: state1.to_string(),
            city2: city2.to_string(),
            state2: state2.to_string(),
        })
        .await
    }

    pub async fn fetch_country_comparison(&self, country1: &str, country2: &str) -> Result<Comparison> {
        self.fetch_typed(&Endpoint::CountryComparison {
            country1: country1.to_string(),
            country2: country2.to_string(),
        })
        .await
    }

    pub async fn fetch_category_histogram(&self) -> Result<CategoryHistogram> {
        self.fetch_typed(&Endpoint::AqiCsvData).await
    }
}
