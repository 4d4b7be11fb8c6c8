//! Conversions between a full forecast and the flattened cache row.
//!
//! The row keeps only the location label, sunrise/sunset and the first
//! entry's headline readings, so a snapshot rebuilt from it is lossy:
//! every other field comes back as zero or empty.

use crate::cache::CacheRow;
use crate::types::{
    City, Clouds, Condition, Coord, ForecastEntry, ForecastSnapshot, MainReadings, Rain, Sys,
    Wind,
};

/// Flatten the first entry of `snapshot` into a cache row.
///
/// An empty forecast list produces empty strings and zero readings.
pub fn row_from_snapshot(snapshot: &ForecastSnapshot, captured_at_ms: i64) -> CacheRow {
    let entry = snapshot.first_entry();
    let condition = entry.and_then(ForecastEntry::condition);

    CacheRow {
        id: 0,
        city_name: snapshot.city.name.clone(),
        icon_id: condition.map(|c| c.icon.clone()).unwrap_or_default(),
        temperature: entry.map(|e| e.main.temp).unwrap_or_default(),
        main_description: condition.map(|c| c.main.clone()).unwrap_or_default(),
        description: condition.map(|c| c.description.clone()).unwrap_or_default(),
        pressure: entry.map(|e| e.main.pressure).unwrap_or_default(),
        humidity: entry.map(|e| e.main.humidity).unwrap_or_default(),
        wind_speed: entry.map(|e| e.wind.speed).unwrap_or_default(),
        date_time: entry.map(|e| e.dt_txt.clone()).unwrap_or_default(),
        sunrise: snapshot.city.sunrise,
        sunset: snapshot.city.sunset,
        timestamp: captured_at_ms,
    }
}

/// Rebuild a single-entry snapshot from a cache row.
pub fn snapshot_from_row(row: &CacheRow) -> ForecastSnapshot {
    let entry = ForecastEntry {
        dt: 0,
        dt_txt: row.date_time.clone(),
        main: MainReadings {
            temp: row.temperature,
            feels_like: row.temperature,
            temp_min: row.temperature,
            temp_max: row.temperature,
            pressure: row.pressure,
            sea_level: 0,
            grnd_level: 0,
            humidity: row.humidity,
            temp_kf: 0.0,
        },
        weather: vec![Condition {
            id: 0,
            main: row.main_description.clone(),
            description: row.description.clone(),
            icon: row.icon_id.clone(),
        }],
        clouds: Clouds::default(),
        wind: Wind {
            speed: row.wind_speed,
            deg: 0,
            gust: 0.0,
        },
        visibility: 0,
        pop: 0.0,
        rain: Rain::default(),
        sys: Sys::default(),
    };

    ForecastSnapshot {
        city: City {
            id: 0,
            name: row.city_name.clone(),
            coord: Coord::default(),
            country: String::new(),
            population: 0,
            timezone: 0,
            sunrise: row.sunrise,
            sunset: row.sunset,
        },
        cnt: 1,
        cod: String::new(),
        message: 0,
        list: vec![entry],
    }
}
