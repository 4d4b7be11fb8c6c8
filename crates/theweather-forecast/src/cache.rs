//! Single-row persistence of the most recent forecast.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::types::WeatherError;

/// Flattened first entry of a forecast plus capture metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRow {
    /// Storage id; 0 before the row has been inserted
    pub id: i64,
    pub city_name: String,
    pub icon_id: String,
    pub temperature: f64,
    pub main_description: String,
    pub description: String,
    pub pressure: i32,
    pub humidity: i32,
    pub wind_speed: f64,
    pub date_time: String,
    pub sunrise: i64,
    pub sunset: i64,
    /// Capture time, Unix milliseconds
    pub timestamp: i64,
}

/// Storage for the cache row.
///
/// Inserting replaces whatever was there before; only the newest row is
/// ever returned. Implementations don't need to be Sync - the store wraps
/// them in a Mutex.
pub trait ForecastCache: Send {
    /// Insert or replace the row, returning its storage id.
    fn insert_row(&self, row: &CacheRow) -> Result<i64, WeatherError>;

    /// The most recently inserted row, if any.
    fn latest_row(&self) -> Result<Option<CacheRow>, WeatherError>;
}

/// SQLite-backed cache.
pub struct SqliteForecastCache {
    conn: Connection,
}

impl SqliteForecastCache {
    /// Open (or create) the cache database at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, WeatherError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| WeatherError::Cache(format!("Failed to create cache dir: {}", e)))?;
        }
        let conn = Connection::open(path)?;
        let cache = Self { conn };
        cache.init_schema()?;
        Ok(cache)
    }

    /// Create an in-memory cache (for testing).
    #[cfg(test)]
    pub fn in_memory() -> Result<Self, WeatherError> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn };
        cache.init_schema()?;
        Ok(cache)
    }

    fn init_schema(&self) -> Result<(), WeatherError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS weather_cache (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                city_name TEXT NOT NULL,
                icon_id TEXT NOT NULL,
                temperature REAL NOT NULL,
                main_description TEXT NOT NULL,
                description TEXT NOT NULL,
                pressure INTEGER NOT NULL,
                humidity INTEGER NOT NULL,
                wind_speed REAL NOT NULL,
                date_time TEXT NOT NULL,
                sunrise INTEGER NOT NULL,
                sunset INTEGER NOT NULL,
                timestamp INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Number of rows physically stored.
    pub fn row_count(&self) -> Result<u32, WeatherError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM weather_cache", [], |row| row.get(0))?;
        Ok(count)
    }

    fn row_to_cache(row: &rusqlite::Row) -> rusqlite::Result<CacheRow> {
        Ok(CacheRow {
            id: row.get(0)?,
            city_name: row.get(1)?,
            icon_id: row.get(2)?,
            temperature: row.get(3)?,
            main_description: row.get(4)?,
            description: row.get(5)?,
            pressure: row.get(6)?,
            humidity: row.get(7)?,
            wind_speed: row.get(8)?,
            date_time: row.get(9)?,
            sunrise: row.get(10)?,
            sunset: row.get(11)?,
            timestamp: row.get(12)?,
        })
    }
}

impl ForecastCache for SqliteForecastCache {
    fn insert_row(&self, row: &CacheRow) -> Result<i64, WeatherError> {
        let tx = self.conn.unchecked_transaction()?;

        // id 0 means "not stored yet": NULL lets AUTOINCREMENT pick a new id.
        tx.execute(
            r#"
            INSERT OR REPLACE INTO weather_cache
            (id, city_name, icon_id, temperature, main_description, description, pressure, humidity, wind_speed, date_time, sunrise, sunset, timestamp)
            VALUES (NULLIF(?1, 0), ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                row.id,
                row.city_name,
                row.icon_id,
                row.temperature,
                row.main_description,
                row.description,
                row.pressure,
                row.humidity,
                row.wind_speed,
                row.date_time,
                row.sunrise,
                row.sunset,
                row.timestamp,
            ],
        )?;
        let id = tx.last_insert_rowid();

        // Last write wins: nothing older than the new row is kept.
        tx.execute("DELETE FROM weather_cache WHERE id <> ?1", params![id])?;
        tx.commit()?;

        Ok(id)
    }

    fn latest_row(&self) -> Result<Option<CacheRow>, WeatherError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, city_name, icon_id, temperature, main_description, description, pressure, humidity, wind_speed, date_time, sunrise, sunset, timestamp FROM weather_cache ORDER BY id DESC LIMIT 1",
                [],
                Self::row_to_cache,
            )
            .optional()?;
        Ok(row)
    }
}

/// Process-local cache; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryForecastCache {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    row: Option<CacheRow>,
    last_id: i64,
}

impl MemoryForecastCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ForecastCache for MemoryForecastCache {
    fn insert_row(&self, row: &CacheRow) -> Result<i64, WeatherError> {
        let mut state = self.state.lock();
        state.last_id += 1;
        let id = state.last_id;
        state.row = Some(CacheRow { id, ..row.clone() });
        Ok(id)
    }

    fn latest_row(&self) -> Result<Option<CacheRow>, WeatherError> {
        Ok(self.state.lock().row.clone())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    fn row(city: &str, temperature: f64) -> CacheRow {
        CacheRow {
            id: 0,
            city_name: city.to_string(),
            icon_id: "04d".to_string(),
            temperature,
            main_description: "Clouds".to_string(),
            description: "overcast clouds".to_string(),
            pressure: 1008,
            humidity: 61,
            wind_speed: 3.2,
            date_time: "2024-05-01 12:00:00".to_string(),
            sunrise: 1_714_521_000,
            sunset: 1_714_564_200,
            timestamp: 1_714_564_800_000,
        }
    }

    #[test]
    fn test_empty_cache_has_no_row() {
        let cache = SqliteForecastCache::in_memory().unwrap();
        assert!(cache.latest_row().unwrap().is_none());
    }

    #[test]
    fn test_insert_and_read_back() {
        let cache = SqliteForecastCache::in_memory().unwrap();
        let id = cache.insert_row(&row("Pune", 29.4)).unwrap();

        let stored = cache.latest_row().unwrap().unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored, CacheRow { id, ..row("Pune", 29.4) });
    }

    #[test]
    fn test_last_write_wins_and_single_row_kept() {
        let cache = SqliteForecastCache::in_memory().unwrap();
        cache.insert_row(&row("Pune", 29.4)).unwrap();
        cache.insert_row(&row("Mumbai", 31.0)).unwrap();
        cache.insert_row(&row("Delhi", 35.5)).unwrap();

        let latest = cache.latest_row().unwrap().unwrap();
        assert_eq!(latest.city_name, "Delhi");
        assert_eq!(cache.row_count().unwrap(), 1);
    }

    #[test]
    fn test_replace_existing_id() {
        let cache = SqliteForecastCache::in_memory().unwrap();
        let id = cache.insert_row(&row("Pune", 29.4)).unwrap();

        let again = cache
            .insert_row(&CacheRow { id, ..row("Pune", 30.0) })
            .unwrap();

        assert_eq!(again, id);
        assert_eq!(cache.latest_row().unwrap().unwrap().temperature, 30.0);
        assert_eq!(cache.row_count().unwrap(), 1);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("weather.sqlite3");

        {
            let cache = SqliteForecastCache::new(&path).unwrap();
            cache.insert_row(&row("Pune", 29.4)).unwrap();
        }

        let reopened = SqliteForecastCache::new(&path).unwrap();
        let latest = reopened.latest_row().unwrap().expect("row should survive reopen");
        assert_eq!(latest.city_name, "Pune");
    }

    #[test]
    fn test_memory_cache_last_write_wins() {
        let cache = MemoryForecastCache::new();
        assert!(cache.latest_row().unwrap().is_none());

        let first = cache.insert_row(&row("Pune", 29.4)).unwrap();
        let second = cache.insert_row(&row("Mumbai", 31.0)).unwrap();

        assert!(second > first);
        let latest = cache.latest_row().unwrap().unwrap();
        assert_eq!(latest.city_name, "Mumbai");
        assert_eq!(latest.id, second);
    }
}
