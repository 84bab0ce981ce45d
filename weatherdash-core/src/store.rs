//! Flat-file storage for favorites, search history and saved weather records.
//!
//! Each collection lives in its own JSON file and is rewritten in full on every
//! mutation. Storage failures are logged and reported as `false`, never raised.
//! There is no locking; concurrent writers from different processes may lose updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::model::CurrentWeather;

pub const FAVORITES_FILE: &str = "favorites.json";
pub const HISTORY_FILE: &str = "search_history.json";
pub const SAVED_WEATHER_FILE: &str = "saved_weather.json";

pub const HISTORY_CAP: usize = 50;
pub const SAVED_WEATHER_CAP: usize = 100;
pub const DEFAULT_HISTORY_LIMIT: usize = 20;
pub const DEFAULT_SAVED_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteLocation {
    pub name: String,
    pub query: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub added_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHistoryItem {
    pub query: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default = "default_success")]
    pub success: bool,
}

fn default_success() -> bool {
    true
}

/// The subset of current weather kept with a saved record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature: f64,
    pub weather_description: String,
    pub humidity: u8,
    pub wind_speed: f64,
    pub pressure: u32,
}

impl From<&CurrentWeather> for WeatherSnapshot {
    fn from(weather: &CurrentWeather) -> Self {
        Self {
            temperature: weather.temperature,
            weather_description: weather.weather_description.clone(),
            humidity: weather.humidity,
            wind_speed: weather.wind_speed,
            pressure: weather.pressure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedWeatherRecord {
    pub location: String,
    pub timestamp: DateTime<Utc>,
    pub weather_data: WeatherSnapshot,
    #[serde(default)]
    pub user_note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportBundle {
    pub favorites: Vec<FavoriteLocation>,
    pub history: Vec<SearchHistoryItem>,
    pub saved_weather: Vec<SavedWeatherRecord>,
    pub export_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    pub favorites_count: usize,
    pub history_count: usize,
    pub saved_weather_count: usize,
}

fn same_query(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[derive(Debug, Clone)]
pub struct WeatherStore {
    dir: PathBuf,
}

impl WeatherStore {
    /// Store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn load<T: DeserializeOwned>(&self, file: &str) -> Vec<T> {
        let path = self.path(file);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to read store file");
                return Vec::new();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(items) => items,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to parse store file");
                Vec::new()
            }
        }
    }

    fn save<T: Serialize>(&self, file: &str, items: &[T]) -> bool {
        let path = self.path(file);

        let result = fs::create_dir_all(&self.dir)
            .map_err(|e| e.to_string())
            .and_then(|_| serde_json::to_string_pretty(items).map_err(|e| e.to_string()))
            .and_then(|json| fs::write(&path, json).map_err(|e| e.to_string()));

        match result {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(path = %path.display(), error = %err, "failed to save store file");
                false
            }
        }
    }

    // Favorites

    pub fn favorites(&self) -> Vec<FavoriteLocation> {
        self.load(FAVORITES_FILE)
    }

    /// Returns `false` if a favorite with the same query (ignoring case) exists,
    /// or if the file could not be written.
    pub fn add_favorite(&self, name: &str, query: &str, lat: Option<f64>, lon: Option<f64>) -> bool {
        let mut favorites = self.favorites();

        if favorites.iter().any(|f| same_query(&f.query, query)) {
            tracing::info!(query, "location already in favorites");
            return false;
        }

        favorites.push(FavoriteLocation {
            name: name.to_string(),
            query: query.to_string(),
            lat,
            lon,
            added_date: Some(Utc::now()),
        });
        self.save(FAVORITES_FILE, &favorites)
    }

    /// Returns `false` when nothing matched.
    pub fn remove_favorite(&self, query: &str) -> bool {
        let favorites = self.favorites();
        let before = favorites.len();

        let kept: Vec<_> = favorites
            .into_iter()
            .filter(|f| !same_query(&f.query, query))
            .collect();

        if kept.len() < before {
            self.save(FAVORITES_FILE, &kept)
        } else {
            false
        }
    }

    pub fn is_favorite(&self, query: &str) -> bool {
        self.favorites().iter().any(|f| same_query(&f.query, query))
    }

    // Search history

    /// Most recent searches first.
    pub fn search_history(&self, limit: usize) -> Vec<SearchHistoryItem> {
        let mut history: Vec<SearchHistoryItem> = self.load(HISTORY_FILE);
        history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        history.truncate(limit);
        history
    }

    /// Record a search. An earlier entry for the same query (ignoring case) is replaced.
    pub fn add_search_history(&self, query: &str, success: bool) -> bool {
        let mut history: Vec<_> = self
            .search_history(usize::MAX)
            .into_iter()
            .filter(|item| !same_query(&item.query, query))
            .collect();

        history.insert(
            0,
            SearchHistoryItem {
                query: query.to_string(),
                timestamp: Utc::now(),
                success,
            },
        );
        history.truncate(HISTORY_CAP);

        self.save(HISTORY_FILE, &history)
    }

    pub fn clear_search_history(&self) -> bool {
        self.save::<SearchHistoryItem>(HISTORY_FILE, &[])
    }

    // Saved weather records

    /// Most recent records first.
    pub fn saved_weather(&self, limit: usize) -> Vec<SavedWeatherRecord> {
        let mut records: Vec<SavedWeatherRecord> = self.load(SAVED_WEATHER_FILE);
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records.truncate(limit);
        records
    }

    pub fn save_weather_record(
        &self,
        location: &str,
        weather_data: WeatherSnapshot,
        note: Option<String>,
    ) -> bool {
        let mut records = self.saved_weather(usize::MAX);

        records.insert(
            0,
            SavedWeatherRecord {
                location: location.to_string(),
                timestamp: Utc::now(),
                weather_data,
                user_note: note.filter(|n| !n.trim().is_empty()),
            },
        );
        records.truncate(SAVED_WEATHER_CAP);

        self.save(SAVED_WEATHER_FILE, &records)
    }

    /// Delete records whose timestamp matches exactly. Returns `false` when nothing matched.
    pub fn delete_weather_record(&self, timestamp: &DateTime<Utc>) -> bool {
        let records = self.saved_weather(usize::MAX);
        let before = records.len();

        let kept: Vec<_> = records
            .into_iter()
            .filter(|r| r.timestamp != *timestamp)
            .collect();

        if kept.len() < before {
            self.save(SAVED_WEATHER_FILE, &kept)
        } else {
            false
        }
    }

    pub fn weather_records_by_location(&self, location: &str) -> Vec<SavedWeatherRecord> {
        self.saved_weather(usize::MAX)
            .into_iter()
            .filter(|r| same_query(&r.location, location))
            .collect()
    }

    // Whole-store operations

    pub fn storage_stats(&self) -> StorageStats {
        StorageStats {
            favorites_count: self.favorites().len(),
            history_count: self.search_history(usize::MAX).len(),
            saved_weather_count: self.saved_weather(usize::MAX).len(),
        }
    }

    pub fn export_data(&self) -> ExportBundle {
        ExportBundle {
            favorites: self.favorites(),
            history: self.search_history(usize::MAX),
            saved_weather: self.saved_weather(usize::MAX),
            export_date: Utc::now(),
        }
    }

    /// Overwrite the collections present in `data`; absent ones are left alone.
    ///
    /// Every present collection is validated before anything is written, so a
    /// malformed bundle changes nothing and returns `false`.
    pub fn import_data(&self, data: &serde_json::Value) -> bool {
        match self.try_import(data) {
            Ok(written) => written,
            Err(err) => {
                tracing::error!(error = %err, "failed to import data");
                false
            }
        }
    }

    /// [`Self::import_data`] for a JSON document.
    pub fn import_json(&self, json: &str) -> bool {
        match serde_json::from_str::<serde_json::Value>(json) {
            Ok(value) => self.import_data(&value),
            Err(err) => {
                tracing::error!(error = %err, "import is not valid JSON");
                false
            }
        }
    }

    fn try_import(&self, data: &serde_json::Value) -> Result<bool, serde_json::Error> {
        fn section<T: DeserializeOwned>(
            data: &serde_json::Value,
            key: &str,
        ) -> Result<Option<Vec<T>>, serde_json::Error> {
            data.get(key).map(|v| Vec::<T>::deserialize(v)).transpose()
        }

        if !data.is_object() {
            return Err(serde::de::Error::custom("import data must be a JSON object"));
        }

        let favorites = section::<FavoriteLocation>(data, "favorites")?;
        let history = section::<SearchHistoryItem>(data, "history")?;
        let saved = section::<SavedWeatherRecord>(data, "saved_weather")?;

        let mut ok = true;
        if let Some(favorites) = favorites {
            ok &= self.save(FAVORITES_FILE, &favorites);
        }
        if let Some(history) = history {
            ok &= self.save(HISTORY_FILE, &history);
        }
        if let Some(saved) = saved {
            ok &= self.save(SAVED_WEATHER_FILE, &saved);
        }
        Ok(ok)
    }
}
