use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Snapshot of one current-weather response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub city: String,
    pub country: String,
    /// Observation time, Unix seconds.
    pub timestamp: i64,
    /// Shift from UTC in seconds.
    pub timezone_offset: i32,
    pub weather_main: String,
    pub weather_description: String,
    pub weather_icon: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub pressure: u32,
    pub wind_speed: f64,
    pub wind_deg: Option<u16>,
    pub visibility: Option<u32>,
    pub lat: f64,
    pub lon: f64,
}

impl CurrentWeather {
    /// `"Seoul, KR"`
    pub fn location_label(&self) -> String {
        format!("{}, {}", self.city, self.country)
    }
}

/// One 3-hour slot of the 5-day forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub timestamp: i64,
    pub temperature: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub weather_main: String,
    pub weather_description: String,
    pub weather_icon: String,
    pub humidity: u8,
    pub wind_speed: f64,
    /// Probability of precipitation, 0–100.
    pub pop: f64,
}

/// Per-day aggregate of [`ForecastEntry`] values sharing a UTC calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub temp_min: f64,
    pub temp_max: f64,
    pub temp_avg: f64,
    pub weather_icon: String,
    pub weather_main: String,
    pub weather_description: String,
    pub humidity_avg: f64,
    pub wind_speed_avg: f64,
    pub pop_max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecastEntry {
    pub timestamp: i64,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub pressure: Option<u32>,
    pub wind_speed: f64,
    pub wind_deg: Option<u16>,
    pub weather_main: String,
    pub weather_description: String,
    pub weather_icon: String,
    /// Probability of precipitation, 0–100.
    pub pop: f64,
    /// Precipitation amount in mm.
    pub precipitation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyDetailEntry {
    pub timestamp: i64,
    pub date: NaiveDate,
    pub temp_min: f64,
    pub temp_max: f64,
    pub temp_day: f64,
    pub temp_night: f64,
    pub temp_morning: f64,
    pub temp_evening: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub weather_main: String,
    pub weather_description: String,
    pub weather_icon: String,
    /// Probability of precipitation, 0–100.
    pub pop: f64,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
    pub uv_index: Option<f64>,
}

/// Which path produced an extended view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastSource {
    Extended,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyForecast {
    pub lat: f64,
    pub lon: f64,
    pub timezone_offset: i32,
    pub daily_forecasts: Vec<DailyDetailEntry>,
    pub source: ForecastSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub lat: f64,
    pub lon: f64,
    pub timezone_offset: i32,
    pub hourly_forecasts: Vec<HourlyForecastEntry>,
    pub source: ForecastSource,
}

/// Raw payload of the extended endpoint, already mapped to the public types.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtendedForecast {
    pub lat: f64,
    pub lon: f64,
    pub timezone_offset: i32,
    pub hourly: Vec<HourlyForecastEntry>,
    pub daily: Vec<DailyDetailEntry>,
}
