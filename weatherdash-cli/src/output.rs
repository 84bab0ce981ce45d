//! Plain-text rendering of core results.

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use std::path::Path;

use weatherdash_core::{
    CurrentWeather, DailySummary, FavoriteLocation, ForecastEntry, ForecastSource,
    HourlyForecast, SavedWeatherRecord, SearchHistoryItem, UnitSystem, WeeklyForecast,
    location::{CityGroup, PopularCity},
    store::StorageStats,
};

/// Unix timestamp shifted by a UTC offset in seconds.
fn local_time(timestamp: i64, offset_secs: i32) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(timestamp + i64::from(offset_secs), 0).map(|dt| dt.naive_utc())
}

fn fmt_time(timestamp: i64, offset_secs: i32, pattern: &str) -> String {
    local_time(timestamp, offset_secs)
        .map(|t| t.format(pattern).to_string())
        .unwrap_or_else(|| "-".into())
}

fn fmt_saved_at(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn percent(pop: f64) -> String {
    format!("{pop:.0}%")
}

fn source_note(source: ForecastSource) {
    if source == ForecastSource::Fallback {
        println!("(estimated from the 5-day forecast)");
    }
}

pub fn current(w: &CurrentWeather, units: UnitSystem) {
    println!("{}  {}", w.location_label(), fmt_time(w.timestamp, w.timezone_offset, "%Y-%m-%d %H:%M"));
    println!("  {} ({})", w.weather_description, w.weather_main);
    println!(
        "  Temperature: {} (feels like {})",
        units.format_temperature(w.temperature),
        units.format_temperature(w.feels_like)
    );
    println!("  Humidity:    {}%", w.humidity);
    println!("  Pressure:    {} hPa", w.pressure);
    match w.wind_deg {
        Some(deg) => println!("  Wind:        {} at {deg}°", units.format_wind_speed(w.wind_speed)),
        None => println!("  Wind:        {}", units.format_wind_speed(w.wind_speed)),
    }
    if let Some(vis) = w.visibility {
        println!("  Visibility:  {:.1} km", f64::from(vis) / 1000.0);
    }
}

pub fn forecast(entries: &[ForecastEntry], units: UnitSystem) {
    if entries.is_empty() {
        println!("No forecast data.");
        return;
    }
    for e in entries {
        println!(
            "{}  {:>8}  {:>4}  {}",
            fmt_time(e.timestamp, 0, "%m-%d %H:%M"),
            units.format_temperature(e.temperature),
            percent(e.pop),
            e.weather_description
        );
    }
}

pub fn daily(days: &[DailySummary], units: UnitSystem) {
    if days.is_empty() {
        println!("No forecast data.");
        return;
    }
    for d in days {
        println!(
            "{}  {:>8} / {:<8}  avg {:>8}  {:>4}  {}",
            d.date.format("%a %m-%d"),
            units.format_temperature(d.temp_min),
            units.format_temperature(d.temp_max),
            units.format_temperature(d.temp_avg),
            percent(d.pop_max),
            d.weather_description
        );
    }
}

pub fn weekly(weekly: &WeeklyForecast, units: UnitSystem) {
    source_note(weekly.source);
    for d in &weekly.daily_forecasts {
        let mut line = format!(
            "{}  {:>8} / {:<8}  {:>4}  {}",
            d.date.format("%a %m-%d"),
            units.format_temperature(d.temp_min),
            units.format_temperature(d.temp_max),
            percent(d.pop),
            d.weather_description
        );
        if let Some(uv) = d.uv_index {
            line.push_str(&format!("  UV {uv:.1}"));
        }
        println!("{line}");
    }
}

pub fn hourly(hourly: &HourlyForecast, units: UnitSystem) {
    source_note(hourly.source);
    for h in &hourly.hourly_forecasts {
        println!(
            "{}  {:>8}  {:>4}  {:>5.1} mm  {}",
            fmt_time(h.timestamp, hourly.timezone_offset, "%m-%d %H:%M"),
            units.format_temperature(h.temperature),
            percent(h.pop),
            h.precipitation,
            h.weather_description
        );
    }
}

pub fn comparison(results: &[CurrentWeather], units: UnitSystem) {
    if results.is_empty() {
        println!("No locations could be fetched.");
        return;
    }
    for w in results {
        println!(
            "{:<20} {:>8}  {:>3}%  {:>9}  {}",
            w.location_label(),
            units.format_temperature(w.temperature),
            w.humidity,
            units.format_wind_speed(w.wind_speed),
            w.weather_description
        );
    }
}

pub fn city_groups(groups: &[CityGroup]) {
    for group in groups {
        println!("{}", group.region);
        city_matches(group.cities);
    }
}

pub fn city_matches(cities: &[PopularCity]) {
    if cities.is_empty() {
        println!("  (no matches)");
    }
    for c in cities {
        println!("  {:<10} {}", c.name, c.query);
    }
}

pub fn favorites(favorites: &[FavoriteLocation]) {
    if favorites.is_empty() {
        println!("No favorites yet.");
        return;
    }
    for f in favorites {
        match (f.lat, f.lon) {
            (Some(lat), Some(lon)) => println!("{:<16} {}  ({lat:.4}, {lon:.4})", f.name, f.query),
            _ => println!("{:<16} {}", f.name, f.query),
        }
    }
}

pub fn history(items: &[SearchHistoryItem]) {
    if items.is_empty() {
        println!("No search history.");
        return;
    }
    for item in items {
        let mark = if item.success { " " } else { "!" };
        println!("{mark} {}  {}", fmt_saved_at(&item.timestamp), item.query);
    }
}

pub fn records(records: &[SavedWeatherRecord], units: UnitSystem) {
    if records.is_empty() {
        println!("No saved records.");
        return;
    }
    for r in records {
        let data = &r.weather_data;
        println!(
            "{}  {}  {}  {}",
            r.timestamp.to_rfc3339(),
            r.location,
            units.format_temperature(data.temperature),
            data.weather_description
        );
        if let Some(note) = &r.user_note {
            println!("    {note}");
        }
    }
}

pub fn stats(stats: &StorageStats, dir: &Path) {
    println!("Data directory: {}", dir.display());
    println!("  Favorites:      {}", stats.favorites_count);
    println!("  Search history: {}", stats.history_count);
    println!("  Saved records:  {}", stats.saved_weather_count);
}
