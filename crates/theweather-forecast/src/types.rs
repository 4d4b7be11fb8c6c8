use serde::{Deserialize, Serialize};

/// Measurement system passed as the `units` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
    Standard,
}

impl Units {
    pub fn as_query_value(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
            Self::Standard => "standard",
        }
    }
}

/// A (latitude, longitude) pair. No range validation is performed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// One complete forecast result for a location, in the shape of the
/// OpenWeatherMap `data/2.5/forecast` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSnapshot {
    pub city: City,
    #[serde(default)]
    pub cnt: i32,
    #[serde(default)]
    pub cod: String,
    #[serde(default)]
    pub message: i64,
    pub list: Vec<ForecastEntry>,
}

impl ForecastSnapshot {
    /// The entry closest to now; the API returns entries in time order.
    pub fn first_entry(&self) -> Option<&ForecastEntry> {
        self.list.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct City {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub coord: Coord,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub population: i64,
    /// Shift from UTC in seconds
    #[serde(default)]
    pub timezone: i32,
    /// Unix seconds
    #[serde(default)]
    pub sunrise: i64,
    /// Unix seconds
    #[serde(default)]
    pub sunset: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

/// A single 3-hour forecast step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ForecastEntry {
    /// Unix seconds
    #[serde(default)]
    pub dt: i64,
    /// `"YYYY-MM-DD HH:MM:SS"` in UTC
    #[serde(default)]
    pub dt_txt: String,
    pub main: MainReadings,
    #[serde(default)]
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub clouds: Clouds,
    #[serde(default)]
    pub wind: Wind,
    #[serde(default)]
    pub visibility: i32,
    /// Probability of precipitation, 0.0..=1.0
    #[serde(default)]
    pub pop: f64,
    #[serde(default)]
    pub rain: Rain,
    #[serde(default)]
    pub sys: Sys,
}

impl ForecastEntry {
    /// The primary condition; the API lists it first.
    pub fn condition(&self) -> Option<&Condition> {
        self.weather.first()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct MainReadings {
    pub temp: f64,
    #[serde(default)]
    pub feels_like: f64,
    #[serde(default)]
    pub temp_min: f64,
    #[serde(default)]
    pub temp_max: f64,
    /// hPa
    #[serde(default)]
    pub pressure: i32,
    #[serde(default)]
    pub sea_level: i32,
    #[serde(default)]
    pub grnd_level: i32,
    /// Percent
    #[serde(default)]
    pub humidity: i32,
    #[serde(default)]
    pub temp_kf: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Condition {
    #[serde(default)]
    pub id: i32,
    /// Short group name, e.g. "Clouds"
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
    /// Icon identifier, e.g. "04d"
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Clouds {
    #[serde(default)]
    pub all: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Wind {
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub deg: i32,
    #[serde(default)]
    pub gust: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Rain {
    /// Volume for the last 3 hours, mm
    #[serde(rename = "3h", default)]
    pub three_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Sys {
    /// Part of day: "d" or "n"
    #[serde(default)]
    pub pod: String,
}

/// Location service errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service disabled")]
    ServiceDisabled,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

/// Weather fetch/cache errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Weather API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Invalid API key")]
    InvalidApiKey,
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Cache error: {0}")]
    Cache(String),
    #[error("Cache database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Location error: {0}")]
    Location(#[from] LocationError),
}

impl WeatherError {
    /// True for transport-level failures (no response at all).
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(e) if e.is_connect() || e.is_timeout() || e.is_request())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    const SAMPLE: &str = r#"{
        "cod": "200",
        "message": 0,
        "cnt": 1,
        "list": [{
            "dt": 1714564800,
            "main": {
                "temp": 29.4, "feels_like": 30.1, "temp_min": 28.9, "temp_max": 29.4,
                "pressure": 1008, "sea_level": 1008, "grnd_level": 940,
                "humidity": 61, "temp_kf": 0.5
            },
            "weather": [{"id": 804, "main": "Clouds", "description": "overcast clouds", "icon": "04d"}],
            "clouds": {"all": 100},
            "wind": {"speed": 3.2, "deg": 270, "gust": 4.1},
            "visibility": 10000,
            "pop": 0.12,
            "rain": {"3h": 0.25},
            "sys": {"pod": "d"},
            "dt_txt": "2024-05-01 12:00:00"
        }],
        "city": {
            "id": 1259229, "name": "Pune", "coord": {"lat": 18.5204, "lon": 73.8567},
            "country": "IN", "population": 3124458, "timezone": 19800,
            "sunrise": 1714521000, "sunset": 1714564200
        }
    }"#;

    #[test]
    fn test_parse_full_response() {
        let snapshot: ForecastSnapshot = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(snapshot.city.name, "Pune");
        assert_eq!(snapshot.city.timezone, 19800);
        assert_eq!(snapshot.list.len(), 1);

        let entry = snapshot.first_entry().unwrap();
        assert_eq!(entry.main.pressure, 1008);
        assert_eq!(entry.rain.three_hours, 0.25);
        assert_eq!(entry.condition().unwrap().icon, "04d");
    }

    #[test]
    fn test_optional_sections_default() {
        let json = r#"{
            "list": [{"main": {"temp": 10.0}, "dt_txt": "2024-01-01 00:00:00"}],
            "city": {"name": "Nowhere"}
        }"#;
        let snapshot: ForecastSnapshot = serde_json::from_str(json).unwrap();
        let entry = snapshot.first_entry().unwrap();
        assert_eq!(entry.rain, Rain::default());
        assert_eq!(entry.wind.gust, 0.0);
        assert!(entry.condition().is_none());
        assert_eq!(snapshot.cod, "");
    }

    #[test]
    fn test_missing_list_is_rejected() {
        let json = r#"{"city": {"name": "Pune"}}"#;
        assert!(serde_json::from_str::<ForecastSnapshot>(json).is_err());
    }

    #[test]
    fn test_units_query_value() {
        assert_eq!(Units::default().as_query_value(), "metric");
        assert_eq!(Units::Imperial.as_query_value(), "imperial");
    }

    #[test]
    fn test_coordinate_display() {
        assert_eq!(Coordinate::new(18.52, 73.8567).to_string(), "18.5200, 73.8567");
    }
}
