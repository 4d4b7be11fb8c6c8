//! Integration tests for OpenWeatherClient and WeatherStore using wiremock.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::sync::Arc;

use theweather_forecast::{
    Coordinate, ForecastSource, OpenWeatherClient, SqliteForecastCache, Units, WeatherError,
    WeatherStore,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn pune() -> Coordinate {
    Coordinate::new(18.5204, 73.8567)
}

/// Forecast body with one entry, shaped like the real API response.
fn forecast_body() -> serde_json::Value {
    serde_json::json!({
        "cod": "200",
        "message": 0,
        "cnt": 1,
        "list": [{
            "dt": 1714564800,
            "main": {
                "temp": 29.4, "feels_like": 30.2, "temp_min": 29.0, "temp_max": 29.4,
                "pressure": 1008, "sea_level": 1008, "grnd_level": 944,
                "humidity": 61, "temp_kf": 0.4
            },
            "weather": [{"id": 804, "main": "Clouds", "description": "overcast clouds", "icon": "04d"}],
            "clouds": {"all": 100},
            "wind": {"speed": 3.2, "deg": 280, "gust": 4.0},
            "visibility": 10000,
            "pop": 0,
            "sys": {"pod": "d"},
            "dt_txt": "2024-05-01 12:00:00"
        }],
        "city": {
            "id": 1259229,
            "name": "Pune",
            "coord": {"lat": 18.5204, "lon": 73.8567},
            "country": "IN",
            "population": 3124458,
            "timezone": 19800,
            "sunrise": 1714521000,
            "sunset": 1714564200
        }
    })
}

fn client(server: &MockServer) -> OpenWeatherClient {
    OpenWeatherClient::new_with_base_url("test-key", Units::Metric, &server.uri()).unwrap()
}

#[tokio::test]
async fn test_fetch_forecast_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .and(query_param("lat", "18.5204"))
        .and(query_param("lon", "73.8567"))
        .and(query_param("units", "metric"))
        .and(query_param("appid", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let snapshot = client(&mock_server).fetch_forecast(pune()).await.unwrap();

    assert_eq!(snapshot.city.name, "Pune");
    assert_eq!(snapshot.city.timezone, 19800);
    assert_eq!(snapshot.list.len(), 1);
    assert_eq!(snapshot.list[0].main.temp, 29.4);
    assert_eq!(snapshot.list[0].weather[0].icon, "04d");
    assert_eq!(snapshot.list[0].rain.three_hours, 0.0);
}

#[tokio::test]
async fn test_imperial_units_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .and(query_param("units", "imperial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client =
        OpenWeatherClient::new_with_base_url("test-key", Units::Imperial, &mock_server.uri())
            .unwrap();
    assert!(client.fetch_forecast(pune()).await.is_ok());
}

#[tokio::test]
async fn test_unauthorized_is_invalid_api_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "cod": 401,
            "message": "Invalid API key. Please see https://openweathermap.org/faq#error401 for more info."
        })))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).fetch_forecast(pune()).await.unwrap_err();
    assert!(matches!(err, WeatherError::InvalidApiKey));
}

#[tokio::test]
async fn test_server_error_carries_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "cod": "500",
            "message": "Internal error"
        })))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).fetch_forecast(pune()).await.unwrap_err();
    match err {
        WeatherError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "Internal error");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_plain_text_error_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).fetch_forecast(pune()).await.unwrap_err();
    assert!(matches!(
        err,
        WeatherError::Api { status: 502, ref message } if message == "Bad Gateway"
    ));
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "cod": "200",
            "city": {"name": "Pune"}
        })))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).fetch_forecast(pune()).await.unwrap_err();
    assert!(matches!(err, WeatherError::Parse(_)));
}

#[tokio::test]
async fn test_cache_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("weather_database.sqlite3");
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    {
        let store = WeatherStore::new(
            Arc::new(client(&mock_server)),
            SqliteForecastCache::new(&db_path).unwrap(),
        );
        let state = store.get_forecast(pune()).await;
        assert_eq!(state.data().unwrap().list[0].main.pressure, 1008);
    }

    // Second process: the cached row is served without another request.
    let store = WeatherStore::new(
        Arc::new(client(&mock_server)),
        SqliteForecastCache::new(&db_path).unwrap(),
    );
    let snapshot = store.get_forecast(pune()).await.into_data().unwrap();

    assert_eq!(snapshot.city.name, "Pune");
    assert_eq!(snapshot.city.sunrise, 1714521000);
    assert_eq!(snapshot.list[0].main.humidity, 61);
    assert_eq!(snapshot.list[0].weather[0].description, "overcast clouds");
    // Fields outside the cache row come back empty.
    assert_eq!(snapshot.city.country, "");
    assert_eq!(snapshot.list[0].visibility, 0);
}

#[tokio::test]
async fn test_refresh_overwrites_single_row() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("weather_database.sqlite3");
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(3)
        .mount(&mock_server)
        .await;

    let store = WeatherStore::new(
        Arc::new(client(&mock_server)),
        SqliteForecastCache::new(&db_path).unwrap(),
    );
    for _ in 0..3 {
        assert!(store.refresh(pune()).await.is_success());
    }

    let cache = SqliteForecastCache::new(&db_path).unwrap();
    assert_eq!(cache.row_count().unwrap(), 1);
}
