//! Core library for the `weatherdash` tool.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Location input parsing (city names, Korean city names, coordinates)
//! - The OpenWeather client with retries and derived forecast views
//! - Flat-file storage for favorites, search history and saved records
//!
//! It is used by `weatherdash-cli`, but can also be reused by other front ends.

pub mod config;
pub mod error;
pub mod forecast;
pub mod location;
pub mod model;
pub mod provider;
pub mod retry;
pub mod store;
pub mod units;

pub use config::Config;
pub use error::{ClientError, LocationError};
pub use location::{LocationQuery, parse_location_input};
pub use model::{
    CurrentWeather, DailyDetailEntry, DailySummary, ForecastEntry, ForecastSource,
    HourlyForecast, HourlyForecastEntry, WeeklyForecast,
};
pub use provider::{WeatherProvider, openweather::OpenWeatherClient};
pub use retry::RetryPolicy;
pub use store::{
    ExportBundle, FavoriteLocation, SavedWeatherRecord, SearchHistoryItem, WeatherSnapshot,
    WeatherStore,
};
pub use units::UnitSystem;
