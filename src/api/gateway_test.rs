#[cfg(test)]
mod tests {
    use crate::api::{Endpoint, Gateway};
    use crate::error::{AppError, Result};
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[test]
    fn test_url_for_encodes_path_and_query() {
        let gateway = Gateway::new("http://localhost:5000").unwrap();

        let url = gateway.url_for(&Endpoint::CityData {
            city: "New Delhi".to_string(),
            state: "Delhi NCT".to_string(),
        });
        assert_eq!(url.as_str(), "http://localhost:5000/api/city-data/New%20Delhi/Delhi%20NCT");

        let url = gateway.url_for(&Endpoint::filter_markers("Asia", "India", "All", true));
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/api/filter-markers?continent=Asia&country=India&city=All&use_api=true"
        );

        let url = gateway.url_for(&Endpoint::IndiaAqiData { refresh: false });
        assert_eq!(url.as_str(), "http://localhost:5000/api/india-aqi-data");
    }

    #[test]
    fn test_url_for_keeps_base_path_prefix() {
        let gateway = Gateway::new("http://example.com/dashboard/").unwrap();
        let url = gateway.url_for(&Endpoint::DashboardSummary);
        assert_eq!(url.as_str(), "http://example.com/dashboard/api/dashboard/data");
    }

    #[test]
    fn test_new_rejects_bad_base_url() {
        assert!(matches!(Gateway::new("not a url"), Err(AppError::Config(_))));
        assert!(matches!(Gateway::new("mailto:someone@example.com"), Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_fetch_records_normalizes_payload() -> Result<()> {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/filter-markers")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("continent".into(), "Europe".into()),
                Matcher::UrlEncoded("country".into(), "All".into()),
                Matcher::UrlEncoded("city".into(), "All".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    { "City": "London", "Country": "United Kingdom", "Continent": "Europe",
                      "Latitude": "51.5", "Longitude": -0.12, "AQI": "38", "PM2_5": 9 },
                    "garbage",
                    { "City": null, "Latitude": 48.8, "Longitude": 2.35, "AQI": "high" }
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let gateway = Gateway::new(&server.url())?;
        let records = gateway
            .fetch_records(&Endpoint::filter_markers("Europe", "All", "All", false))
            .await?;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].city, "London");
        assert_eq!(records[0].latitude, 51.5);
        assert_eq!(records[0].aqi, 38.0);
        assert_eq!(records[0].pm2_5.as_ref().map(|r| r.value), Some(9.0));
        assert_eq!(records[1].city, "Unknown");
        assert_eq!(records[1].aqi, 0.0);
        assert_eq!(records[1].aqi_category, "Good");
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_records_accepts_map_envelope() -> Result<()> {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/map/data")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "markers": [{ "City": "Paris", "Latitude": 48.8, "Longitude": 2.3 }],
                    "continents": ["Europe"],
                    "countries": ["France"],
                    "cities": ["Paris"],
                    "timestamp": "2024-05-01T10:00:00"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let gateway = Gateway::new(&server.url())?;
        let records = gateway.fetch_records(&Endpoint::MapData).await?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].city, "Paris");
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_json_surfaces_status_and_reason() -> Result<()> {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/india-aqi-data")
            .with_status(500)
            .with_body(r#"{"error":"boom"}"#)
            .create_async()
            .await;

        let gateway = Gateway::new(&server.url())?;
        let result = gateway
            .fetch_json(&Endpoint::IndiaAqiData { refresh: false })
            .await;

        match result {
            Err(AppError::Network { status, reason }) => {
                assert_eq!(status, Some(500));
                assert_eq!(reason, "Internal Server Error");
            },
            other => panic!("Expected Network error, got {:?}", other),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_json_transport_failure_is_network_error() -> Result<()> {
        // Nothing listens on port 9 of the loopback interface.
        let gateway = Gateway::new("http://127.0.0.1:9")?;
        let result = gateway.fetch_json(&Endpoint::DashboardSummary).await;
        assert!(matches!(result, Err(AppError::Network { status: None, .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_records_rejects_error_object() -> Result<()> {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/interactive-map-data")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"no data"}"#)
            .create_async()
            .await;

        let gateway = Gateway::new(&server.url())?;
        let result = gateway.fetch_records(&Endpoint::InteractiveMapData).await;
        assert!(matches!(result, Err(AppError::DataShape(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_dashboard_summary() -> Result<()> {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/dashboard/data")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "global_avg_aqi": 61.5,
                    "monitored_countries_count": 2,
                    "timestamp": "2024-05-01T10:00:00",
                    "top_polluted_countries": [
                        { "Country": "Chad", "2024": 91.8 },
                        { "Country": "Bangladesh", "2024": 78.0 }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let gateway = Gateway::new(&server.url())?;
        let summary = gateway.fetch_dashboard_summary().await?;
        assert_eq!(summary.global_avg_aqi, Some(61.5));
        assert_eq!(summary.monitored_countries_count, 2);
        assert_eq!(summary.top_polluted_countries[0].country, "Chad");
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_city_comparison_sends_all_params() -> Result<()> {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/city-comparison-data")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("city1".into(), "Delhi".into()),
                Matcher::UrlEncoded("state1".into(), "Delhi NCT".into()),
                Matcher::UrlEncoded("city2".into(), "Patna".into()),
                Matcher::UrlEncoded("state2".into(), "Bihar".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "city1": { "city": "Delhi", "state": "Delhi NCT", "monthly_values": [200, 180] },
                    "city2": { "city": "Patna", "state": "Bihar", "monthly_values": [150, null] },
                    "months": ["January", "February"]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let gateway = Gateway::new(&server.url())?;
        let comparison = gateway
            .fetch_city_comparison(("Delhi", "Delhi NCT"), ("Patna", "Bihar"))
            .await?;
        assert_eq!(comparison.first.name, "Delhi");
        assert_eq!(comparison.second.average(), Some(150.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_country_series() -> Result<()> {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/country-data/India")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "name": "India",
                    "rank": 5,
                    "avg_aqi": 50.6,
                    "monthly_data": [90, 80, 60, 50, 45, 30, 20, 20, 25, 60, 85, 95],
                    "months": ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let gateway = Gateway::new(&server.url())?;
        let series = gateway.fetch_country_series("India").await?;
        assert_eq!(series.name, "India");
        assert_eq!(series.monthly_data.len(), 12);
        assert_eq!(series.rank, Some(5.0));
        Ok(())
    }
}
