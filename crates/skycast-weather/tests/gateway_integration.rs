//! Integration tests for WeatherGateway using wiremock.
//!
//! These tests verify URL construction, caching and failure propagation
//! against a mock OpenWeatherMap server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::Value;
use skycast_weather::{
    aggregate, CacheStore, ForecastCalendar, FetchClient, GatewayEndpoints, ManualClock,
    TransportError, Units, WeatherError, WeatherGateway,
};
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-key";

/// Helper to create a current-conditions payload
fn current_json(name: &str, temp: f64) -> Value {
    serde_json::json!({
        "coord": { "lon": 2.35, "lat": 48.85 },
        "weather": [{ "id": 800, "main": "Clear", "description": "clear sky", "icon": "01d" }],
        "main": {
            "temp": temp, "feels_like": temp, "temp_min": temp - 2.0, "temp_max": temp + 2.0,
            "pressure": 1015, "humidity": 52
        },
        "wind": { "speed": 3.6, "deg": 240 },
        "dt": 1748779200,
        "sys": { "country": "FR", "sunrise": 1748749800, "sunset": 1748807400 },
        "timezone": 7200,
        "id": 2988507,
        "name": name
    })
}

/// Helper to create a forecast payload with one sample every 3 hours
fn forecast_json(start: i64, samples: usize) -> Value {
    let list: Vec<Value> = (0..samples)
        .map(|i| {
            let temp = 10.0 + i as f64;
            serde_json::json!({
                "dt": start + (i as i64) * 3 * 3600,
                "main": {
                    "temp": temp, "feels_like": temp, "temp_min": temp - 1.0, "temp_max": temp + 1.0,
                    "pressure": 1010, "humidity": 70
                },
                "weather": [{ "id": 500, "main": "Rain", "description": format!("sample {i}"), "icon": "10d" }],
                "wind": { "speed": 2.0, "deg": 90 },
                "pop": 0.2
            })
        })
        .collect();

    serde_json::json!({
        "cod": "200",
        "cnt": samples,
        "list": list,
        "city": { "id": 1, "name": "Paris", "country": "FR", "coord": { "lat": 48.85, "lon": 2.35 } }
    })
}

fn gateway_for(server: &MockServer) -> WeatherGateway {
    gateway_with_cache(server, Arc::new(CacheStore::system()))
}

fn gateway_with_cache(server: &MockServer, cache: Arc<CacheStore>) -> WeatherGateway {
    let fetcher = skycast_weather::HttpFetchClient::new(std::time::Duration::from_secs(5)).unwrap();
    WeatherGateway::new(
        fetcher,
        cache,
        GatewayEndpoints::single_host(&server.uri()),
        API_KEY,
    )
}

/// Fetch client that records calls and replays a fixed outcome
struct ScriptedFetcher {
    calls: AtomicUsize,
    status: Option<u16>,
    payload: Value,
}

impl ScriptedFetcher {
    fn ok(payload: Value) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            status: None,
            payload,
        }
    }

    fn failing(status: u16) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            status: Some(status),
            payload: Value::Null,
        }
    }
}

#[async_trait]
impl FetchClient for ScriptedFetcher {
    async fn request(&self, _url: &Url) -> Result<Value, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.status {
            Some(status) => Err(TransportError::Status {
                status,
                reason: "scripted".into(),
            }),
            None => Ok(self.payload.clone()),
        }
    }
}

fn scripted_gateway(fetcher: ScriptedFetcher) -> WeatherGateway<ScriptedFetcher> {
    WeatherGateway::new(
        fetcher,
        Arc::new(CacheStore::system()),
        GatewayEndpoints::default(),
        API_KEY,
    )
}

#[tokio::test]
async fn test_current_by_name_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "Paris"))
        .and(query_param("appid", API_KEY))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_json("Paris", 21.3)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server);
    let weather = gateway.current_by_name("Paris", Units::Metric).await.unwrap();

    assert_eq!(weather.name, "Paris");
    assert_eq!(weather.main.temp, 21.3);
    assert_eq!(weather.weather[0].icon, "01d");
}

#[tokio::test]
async fn test_repeated_lookup_served_from_cache() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_json("Paris", 21.3)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server);
    let first = gateway.current_by_name("Paris", Units::Metric).await.unwrap();
    let second = gateway.current_by_name("Paris", Units::Metric).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(gateway.cache().len(), 1);
}

#[tokio::test]
async fn test_units_never_share_a_cache_entry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_json("Paris", 20.0)))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("units", "imperial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_json("Paris", 68.0)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server);
    let metric = gateway.current_by_name("Paris", Units::Metric).await.unwrap();
    let imperial = gateway.current_by_name("Paris", Units::Imperial).await.unwrap();
    let metric_again = gateway.current_by_name("Paris", Units::Metric).await.unwrap();
    let imperial_again = gateway.current_by_name("Paris", Units::Imperial).await.unwrap();

    assert_eq!(metric.main.temp, 20.0);
    assert_eq!(imperial.main.temp, 68.0);
    assert_eq!(metric_again.main.temp, 20.0);
    assert_eq!(imperial_again.main.temp, 68.0);
    assert_eq!(gateway.cache().len(), 2);
}

#[tokio::test]
async fn test_stale_entry_is_refetched() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json(1748736000, 8)))
        .expect(2)
        .mount(&mock_server)
        .await;

    let clock = Arc::new(ManualClock::new(Utc::now()));
    let gateway = gateway_with_cache(&mock_server, Arc::new(CacheStore::new(clock.clone())));

    gateway.forecast_by_name("Paris", Units::Metric).await.unwrap();
    clock.advance(Duration::minutes(9));
    gateway.forecast_by_name("Paris", Units::Metric).await.unwrap();
    clock.advance(Duration::minutes(2));
    gateway.forecast_by_name("Paris", Units::Metric).await.unwrap();
}

#[tokio::test]
async fn test_error_status_propagates_and_is_not_cached() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "cod": "404",
            "message": "city not found"
        })))
        .expect(2)
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server);

    for _ in 0..2 {
        let result = gateway.current_by_name("Atlantis", Units::Metric).await;
        assert!(
            matches!(
                result,
                Err(WeatherError::Transport(TransportError::Status { status: 404, .. }))
            ),
            "expected a 404 transport error, got {result:?}"
        );
    }
    assert!(gateway.cache().is_empty());
}

#[tokio::test]
async fn test_non_json_body_is_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server);
    let result = gateway.current_by_name("Paris", Units::Metric).await;

    assert!(matches!(
        result,
        Err(WeatherError::Transport(TransportError::InvalidBody(_)))
    ));
}

#[tokio::test]
async fn test_unexpected_shape_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "name": "Paris" })))
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server);
    let result = gateway.current_by_name("Paris", Units::Metric).await;

    assert!(matches!(result, Err(WeatherError::Decode(_))));
}

#[tokio::test]
async fn test_current_by_coordinates_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lat", "48.85"))
        .and(query_param("lon", "2.35"))
        .and(query_param("units", "imperial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_json("Paris", 70.0)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server);
    let weather = gateway
        .current_by_coordinates(48.85, 2.35, Units::Imperial)
        .await
        .unwrap();

    assert_eq!(weather.main.temp, 70.0);
}

#[tokio::test]
async fn test_forecast_by_coordinates_aggregates() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("lat", "48.85"))
        .and(query_param("lon", "2.35"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json(1748736000, 40)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server);
    let forecast = gateway
        .forecast_by_coordinates(48.85, 2.35, Units::Metric)
        .await
        .unwrap();
    assert_eq!(forecast.list.len(), 40);

    let days = aggregate(&forecast.list, &ForecastCalendar::utc()).unwrap();
    assert_eq!(days.len(), 5);
    // Eight samples per day starting at midnight UTC
    assert_eq!(days[0].description, "sample 0");
    assert_eq!(days[0].temp_min, 9.0);
    assert_eq!(days[0].temp_max, 18.0);
    assert_eq!(days[1].description, "sample 8");
}

#[tokio::test]
async fn test_suggest_cities_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/direct"))
        .and(query_param("q", "Port"))
        .and(query_param("limit", "5"))
        .and(query_param("appid", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "name": "Portland", "country": "US", "state": "Oregon", "lat": 45.5, "lon": -122.6 },
            { "name": "Porto", "country": "PT", "lat": 41.1, "lon": -8.6 }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server);
    let suggestions = gateway.suggest_cities("Port").await;

    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions[0].state.as_deref(), Some("Oregon"));
    assert_eq!(suggestions[1].name, "Porto");
    assert!(suggestions[1].state.is_none());
}

#[tokio::test]
async fn test_suggest_cities_swallows_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/direct"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server);
    assert!(gateway.suggest_cities("Paris").await.is_empty());
}

#[tokio::test]
async fn test_short_query_skips_fetch_client() {
    let gateway = scripted_gateway(ScriptedFetcher::ok(serde_json::json!([])));

    assert!(gateway.suggest_cities("Pa").await.is_empty());
    assert!(gateway.suggest_cities("").await.is_empty());
    assert_eq!(gateway_calls(&gateway), 0);
}

#[tokio::test]
async fn test_suggest_failure_returns_empty() {
    let gateway = scripted_gateway(ScriptedFetcher::failing(503));

    assert!(gateway.suggest_cities("Par").await.is_empty());
    assert_eq!(gateway_calls(&gateway), 1);
}

#[tokio::test]
async fn test_suggestions_capped_at_five() {
    let cities: Vec<Value> = (0..8)
        .map(|i| serde_json::json!({ "name": format!("City {i}"), "country": "XX" }))
        .collect();
    let gateway = scripted_gateway(ScriptedFetcher::ok(Value::Array(cities)));

    assert_eq!(gateway.suggest_cities("City").await.len(), 5);
}

#[tokio::test]
async fn test_current_failure_propagates_from_fetch_client() {
    let gateway = scripted_gateway(ScriptedFetcher::failing(401));
    let result = gateway.current_by_name("Paris", Units::Metric).await;

    assert!(matches!(
        result,
        Err(WeatherError::Transport(TransportError::Status { status: 401, .. }))
    ));
}

fn gateway_calls(gateway: &WeatherGateway<ScriptedFetcher>) -> usize {
    gateway.fetcher().calls.load(Ordering::SeqCst)
}

#[tokio::test]
async fn test_name_and_coordinate_lookups_use_separate_entries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lat", "1"))
        .and(query_param("lon", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_json("ByCoordinates", 10.0)))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "1_2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_json("ByName", 20.0)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server);

    let by_coords = gateway
        .current_by_coordinates(1.0, 2.0, Units::Metric)
        .await
        .unwrap();
    let by_name = gateway.current_by_name("1_2", Units::Metric).await.unwrap();

    assert_eq!(by_coords.name, "ByCoordinates");
    assert_eq!(by_name.name, "ByName");
    assert_eq!(gateway.cache().len(), 2);
}
