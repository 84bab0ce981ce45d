//! Derived forecast views built from 3-hour forecast entries.

use chrono::{DateTime, NaiveDate, Utc};

use crate::model::{DailyDetailEntry, DailySummary, ForecastEntry, HourlyForecastEntry};

/// The 5-day endpoint never covers more than this many calendar days.
pub const MAX_DAILY_DAYS: usize = 5;

pub const DEFAULT_DAILY_DAYS: usize = 5;

fn utc_date(ts: i64) -> NaiveDate {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|dt| dt.date_naive())
        .unwrap_or_default()
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    values.sum::<f64>() / n as f64
}

/// Most frequent icon; ties go to whichever tied icon appeared first.
fn dominant_icon<'a>(icons: impl Iterator<Item = &'a str>) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for icon in icons {
        match counts.iter_mut().find(|(seen, _)| *seen == icon) {
            Some((_, n)) => *n += 1,
            None => counts.push((icon, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (icon, n) in counts {
        if best.is_none_or(|(_, top)| n > top) {
            best = Some((icon, n));
        }
    }
    best.map(|(icon, _)| icon.to_string()).unwrap_or_default()
}

/// Group entries by UTC calendar date, in the order dates first appear.
pub fn group_by_date(entries: &[ForecastEntry]) -> Vec<(NaiveDate, Vec<&ForecastEntry>)> {
    let mut groups: Vec<(NaiveDate, Vec<&ForecastEntry>)> = Vec::new();
    for entry in entries {
        let date = utc_date(entry.timestamp);
        match groups.iter_mut().find(|(d, _)| *d == date) {
            Some((_, list)) => list.push(entry),
            None => groups.push((date, vec![entry])),
        }
    }
    groups
}

fn summarize(date: NaiveDate, day: &[&ForecastEntry]) -> DailySummary {
    let temps = || day.iter().map(|e| e.temperature);

    DailySummary {
        date,
        temp_min: temps().fold(f64::INFINITY, f64::min),
        temp_max: temps().fold(f64::NEG_INFINITY, f64::max),
        temp_avg: mean(temps()),
        weather_icon: dominant_icon(day.iter().map(|e| e.weather_icon.as_str())),
        weather_main: day.first().map(|e| e.weather_main.clone()).unwrap_or_default(),
        weather_description: day
            .first()
            .map(|e| e.weather_description.clone())
            .unwrap_or_default(),
        humidity_avg: mean(day.iter().map(|e| f64::from(e.humidity))),
        wind_speed_avg: mean(day.iter().map(|e| e.wind_speed)),
        pop_max: day.iter().map(|e| e.pop).fold(0.0, f64::max),
    }
}

/// Collapse 3-hour entries into at most `days` daily summaries.
///
/// `days` is capped at `MAX_DAILY_DAYS`; zero yields nothing. Only dates present in
/// `entries` are produced.
pub fn aggregate_daily(entries: &[ForecastEntry], days: usize) -> Vec<DailySummary> {
    let days = days.min(MAX_DAILY_DAYS);

    group_by_date(entries)
        .into_iter()
        .take(days)
        .map(|(date, day)| summarize(date, &day))
        .collect()
}

impl From<&DailySummary> for DailyDetailEntry {
    fn from(day: &DailySummary) -> Self {
        let midnight = day
            .date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or_default();

        DailyDetailEntry {
            timestamp: midnight,
            date: day.date,
            temp_min: day.temp_min,
            temp_max: day.temp_max,
            temp_day: day.temp_avg,
            temp_night: day.temp_avg,
            temp_morning: day.temp_avg,
            temp_evening: day.temp_avg,
            humidity: day.humidity_avg,
            wind_speed: day.wind_speed_avg,
            weather_main: day.weather_main.clone(),
            weather_description: day.weather_description.clone(),
            weather_icon: day.weather_icon.clone(),
            pop: day.pop_max,
            sunrise: None,
            sunset: None,
            uv_index: None,
        }
    }
}

impl From<&ForecastEntry> for HourlyForecastEntry {
    fn from(entry: &ForecastEntry) -> Self {
        HourlyForecastEntry {
            timestamp: entry.timestamp,
            temperature: entry.temperature,
            feels_like: entry.temperature,
            humidity: entry.humidity,
            pressure: None,
            wind_speed: entry.wind_speed,
            wind_deg: None,
            weather_main: entry.weather_main.clone(),
            weather_description: entry.weather_description.clone(),
            weather_icon: entry.weather_icon.clone(),
            pop: entry.pop,
            // Rough mm estimate; the 3-hour endpoint has no amount.
            precipitation: entry.pop * 10.0,
        }
    }
}

/// Daily detail entries reconstructed from 3-hour data.
pub fn fallback_daily(entries: &[ForecastEntry]) -> Vec<DailyDetailEntry> {
    aggregate_daily(entries, MAX_DAILY_DAYS)
        .iter()
        .map(DailyDetailEntry::from)
        .collect()
}

/// Hourly entries reconstructed from 3-hour data, covering roughly `hours` hours.
pub fn fallback_hourly(entries: &[ForecastEntry], hours: usize) -> Vec<HourlyForecastEntry> {
    let slots = (hours / 3).max(1);
    entries.iter().take(slots).map(HourlyForecastEntry::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-01-01T00:00:00Z
    const DAY0: i64 = 1_704_067_200;
    const HOUR: i64 = 3600;

    fn entry(ts: i64, temp: f64, icon: &str, pop: f64) -> ForecastEntry {
        ForecastEntry {
            timestamp: ts,
            temperature: temp,
            temp_min: temp - 1.0,
            temp_max: temp + 1.0,
            weather_main: "Clouds".into(),
            weather_description: format!("desc-{ts}"),
            weather_icon: icon.into(),
            humidity: 50,
            wind_speed: 2.0,
            pop,
        }
    }

    #[test]
    fn aggregates_single_day() {
        let entries = vec![
            entry(DAY0, 10.0, "01d", 0.0),
            entry(DAY0 + 3 * HOUR, 14.0, "02d", 40.0),
            entry(DAY0 + 6 * HOUR, 12.0, "02d", 20.0),
        ];

        let days = aggregate_daily(&entries, 5);
        assert_eq!(days.len(), 1);

        let day = &days[0];
        assert_eq!(day.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(day.temp_min, 10.0);
        assert_eq!(day.temp_max, 14.0);
        assert_eq!(day.temp_avg, 12.0);
        assert_eq!(day.pop_max, 40.0);
        assert_eq!(day.weather_icon, "02d");
        assert_eq!(day.weather_description, format!("desc-{DAY0}"));
        assert_eq!(day.humidity_avg, 50.0);
        assert_eq!(day.wind_speed_avg, 2.0);
    }

    #[test]
    fn icon_ties_go_to_first_seen() {
        let entries = vec![
            entry(DAY0, 1.0, "10d", 0.0),
            entry(DAY0 + HOUR, 1.0, "04d", 0.0),
            entry(DAY0 + 2 * HOUR, 1.0, "04d", 0.0),
            entry(DAY0 + 3 * HOUR, 1.0, "10d", 0.0),
        ];
        assert_eq!(aggregate_daily(&entries, 1)[0].weather_icon, "10d");
    }

    #[test]
    fn groups_by_utc_date_in_first_seen_order() {
        let entries: Vec<_> = (0..16)
            .map(|i| entry(DAY0 + 21 * HOUR + i * 3 * HOUR, i as f64, "01d", 0.0))
            .collect();

        let days = aggregate_daily(&entries, 5);
        // 21:00 on day 0, then 8 slots on day 1, the remaining 7 on day 2.
        assert_eq!(days.len(), 3);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(days[2].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(days[0].temp_max, 0.0);
        assert_eq!(days[1].temp_min, 1.0);
        assert_eq!(days[1].temp_max, 8.0);
    }

    #[test]
    fn truncates_and_caps_day_count() {
        let entries: Vec<_> = (0..7).map(|d| entry(DAY0 + d * 24 * HOUR, 5.0, "01d", 0.0)).collect();

        assert_eq!(aggregate_daily(&entries, 2).len(), 2);
        assert!(aggregate_daily(&entries, 0).is_empty());
        assert_eq!(aggregate_daily(&entries, 10).len(), MAX_DAILY_DAYS);
        assert!(aggregate_daily(&[], 5).is_empty());
    }

    #[test]
    fn daily_fallback_defaults() {
        let entries = vec![entry(DAY0 + HOUR, 10.0, "01d", 30.0), entry(DAY0 + 4 * HOUR, 20.0, "01d", 0.0)];
        let detail = fallback_daily(&entries);

        assert_eq!(detail.len(), 1);
        let day = &detail[0];
        assert_eq!(day.timestamp, DAY0);
        assert_eq!(day.temp_day, 15.0);
        assert_eq!(day.temp_night, 15.0);
        assert_eq!(day.temp_morning, 15.0);
        assert_eq!(day.temp_evening, 15.0);
        assert_eq!(day.pop, 30.0);
        assert_eq!(day.sunrise, None);
        assert_eq!(day.uv_index, None);
    }

    #[test]
    fn hourly_fallback_defaults() {
        let entries: Vec<_> = (0..16).map(|i| entry(DAY0 + i * 3 * HOUR, 7.5, "01n", 20.0)).collect();

        let hourly = fallback_hourly(&entries, 24);
        assert_eq!(hourly.len(), 8);
        assert_eq!(hourly[0].feels_like, 7.5);
        assert_eq!(hourly[0].precipitation, 200.0);
        assert_eq!(hourly[0].pressure, None);

        assert_eq!(fallback_hourly(&entries, 48).len(), 16);
        assert_eq!(fallback_hourly(&entries, 1).len(), 1);
    }
}
