use crate::{
    Config,
    error::ClientError,
    forecast::{self, DEFAULT_DAILY_DAYS},
    location::LocationQuery,
    model::{
        CurrentWeather, DailySummary, ExtendedForecast, ForecastEntry, ForecastSource,
        HourlyForecast, WeeklyForecast,
    },
    provider::openweather::OpenWeatherClient,
    units::UnitSystem,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

pub const WEEKLY_DAYS: usize = 7;
pub const DEFAULT_HOURLY_HOURS: usize = 24;
pub const MAX_HOURLY_HOURS: usize = 48;

/// Blocks the extended endpoint can leave out of its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendedPart {
    Current,
    Minutely,
    Hourly,
    Daily,
    Alerts,
}

impl ExtendedPart {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtendedPart::Current => "current",
            ExtendedPart::Minutely => "minutely",
            ExtendedPart::Hourly => "hourly",
            ExtendedPart::Daily => "daily",
            ExtendedPart::Alerts => "alerts",
        }
    }

    pub fn join(parts: &[ExtendedPart]) -> String {
        parts.iter().map(ExtendedPart::as_str).collect::<Vec<_>>().join(",")
    }
}

const WEEKLY_EXCLUDE: &[ExtendedPart] = &[
    ExtendedPart::Current,
    ExtendedPart::Minutely,
    ExtendedPart::Hourly,
    ExtendedPart::Alerts,
];

const HOURLY_EXCLUDE: &[ExtendedPart] = &[
    ExtendedPart::Current,
    ExtendedPart::Minutely,
    ExtendedPart::Daily,
    ExtendedPart::Alerts,
];

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_weather(
        &self,
        location: &LocationQuery,
        units: UnitSystem,
    ) -> Result<CurrentWeather, ClientError>;

    /// 5-day forecast in 3-hour slots.
    async fn forecast(
        &self,
        location: &LocationQuery,
        units: UnitSystem,
    ) -> Result<Vec<ForecastEntry>, ClientError>;

    async fn extended_forecast(
        &self,
        lat: f64,
        lon: f64,
        units: UnitSystem,
        exclude: &[ExtendedPart],
    ) -> Result<ExtendedForecast, ClientError>;

    /// Daily summaries aggregated from the 5-day forecast (at most 5 days).
    async fn daily_forecast(
        &self,
        location: &LocationQuery,
        units: UnitSystem,
        days: Option<usize>,
    ) -> Result<Vec<DailySummary>, ClientError> {
        let entries = self.forecast(location, units).await?;
        Ok(forecast::aggregate_daily(&entries, days.unwrap_or(DEFAULT_DAILY_DAYS)))
    }

    /// Coordinates and UTC offset (seconds) for `location`. Name queries cost one
    /// current-weather call; coordinate queries have no known offset and report 0.
    async fn resolve_coordinates(
        &self,
        location: &LocationQuery,
        units: UnitSystem,
    ) -> Result<(f64, f64, i32), ClientError> {
        if let Some((lat, lon)) = location.as_coordinates() {
            return Ok((lat, lon, 0));
        }
        let current = self.current_weather(location, units).await?;
        Ok((current.lat, current.lon, current.timezone_offset))
    }

    /// 7-day detail from the extended endpoint, or rebuilt from the 5-day forecast
    /// when that endpoint fails.
    async fn weekly_forecast(
        &self,
        location: &LocationQuery,
        units: UnitSystem,
    ) -> Result<WeeklyForecast, ClientError> {
        let (lat, lon, offset) = self.resolve_coordinates(location, units).await?;

        match self.extended_forecast(lat, lon, units, WEEKLY_EXCLUDE).await {
            Ok(extended) => Ok(WeeklyForecast {
                lat: extended.lat,
                lon: extended.lon,
                timezone_offset: extended.timezone_offset,
                daily_forecasts: extended.daily.into_iter().take(WEEKLY_DAYS).collect(),
                source: ForecastSource::Extended,
            }),
            Err(err) => {
                tracing::warn!(%location, error = %err, "extended daily forecast unavailable, using 5-day data");
                let entries = self.forecast(location, units).await?;
                Ok(WeeklyForecast {
                    lat,
                    lon,
                    timezone_offset: offset,
                    daily_forecasts: forecast::fallback_daily(&entries),
                    source: ForecastSource::Fallback,
                })
            }
        }
    }

    /// Hourly detail for the next `hours` hours (default 24, at most 48).
    async fn hourly_forecast(
        &self,
        location: &LocationQuery,
        units: UnitSystem,
        hours: Option<usize>,
    ) -> Result<HourlyForecast, ClientError> {
        let hours = hours.unwrap_or(DEFAULT_HOURLY_HOURS).clamp(1, MAX_HOURLY_HOURS);
        let (lat, lon, offset) = self.resolve_coordinates(location, units).await?;

        match self.extended_forecast(lat, lon, units, HOURLY_EXCLUDE).await {
            Ok(extended) => Ok(HourlyForecast {
                lat: extended.lat,
                lon: extended.lon,
                timezone_offset: extended.timezone_offset,
                hourly_forecasts: extended.hourly.into_iter().take(hours).collect(),
                source: ForecastSource::Extended,
            }),
            Err(err) => {
                tracing::warn!(%location, error = %err, "extended hourly forecast unavailable, using 3-hour data");
                let entries = self.forecast(location, units).await?;
                Ok(HourlyForecast {
                    lat,
                    lon,
                    timezone_offset: offset,
                    hourly_forecasts: forecast::fallback_hourly(&entries, hours),
                    source: ForecastSource::Fallback,
                })
            }
        }
    }

    /// Current weather for each location in turn. Failed locations are logged and skipped.
    async fn current_weather_many(
        &self,
        locations: &[LocationQuery],
        units: UnitSystem,
    ) -> Vec<CurrentWeather> {
        let mut results = Vec::with_capacity(locations.len());
        for location in locations {
            match self.current_weather(location, units).await {
                Ok(weather) => results.push(weather),
                Err(err) => {
                    tracing::warn!(%location, error = %err, "skipping location");
                }
            }
        }
        results
    }
}

/// Construct the OpenWeather client from config.
///
/// A missing API key is not an error here; every request will fail with
/// [`ClientError::MissingApiKey`] instead.
pub fn provider_from_config(config: &Config) -> anyhow::Result<OpenWeatherClient> {
    OpenWeatherClient::from_config(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DailyDetailEntry, HourlyForecastEntry};
    use std::sync::Mutex;

    const DAY0: i64 = 1_704_067_200;

    #[derive(Debug, Default)]
    struct FakeProvider {
        extended_fails: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakeProvider {
        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn current(city: &str) -> CurrentWeather {
        CurrentWeather {
            city: city.into(),
            country: "KR".into(),
            timestamp: DAY0,
            timezone_offset: 32400,
            weather_main: "Clear".into(),
            weather_description: "맑음".into(),
            weather_icon: "01d".into(),
            temperature: 20.0,
            feels_like: 19.0,
            humidity: 40,
            pressure: 1013,
            wind_speed: 1.5,
            wind_deg: Some(90),
            visibility: Some(10000),
            lat: 37.57,
            lon: 126.98,
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn current_weather(
            &self,
            location: &LocationQuery,
            _units: UnitSystem,
        ) -> Result<CurrentWeather, ClientError> {
            self.record("weather");
            match location.as_city() {
                Some("Nowhere") => Err(ClientError::NotFound),
                Some(city) => Ok(current(city)),
                None => Ok(current("coords")),
            }
        }

        async fn forecast(
            &self,
            _location: &LocationQuery,
            _units: UnitSystem,
        ) -> Result<Vec<ForecastEntry>, ClientError> {
            self.record("forecast");
            Ok((0..40)
                .map(|i| ForecastEntry {
                    timestamp: DAY0 + i * 3 * 3600,
                    temperature: i as f64,
                    temp_min: i as f64,
                    temp_max: i as f64,
                    weather_main: "Rain".into(),
                    weather_description: "비".into(),
                    weather_icon: "10d".into(),
                    humidity: 80,
                    wind_speed: 3.0,
                    pop: 50.0,
                })
                .collect())
        }

        async fn extended_forecast(
            &self,
            lat: f64,
            lon: f64,
            _units: UnitSystem,
            exclude: &[ExtendedPart],
        ) -> Result<ExtendedForecast, ClientError> {
            self.record(&format!("onecall:{}", ExtendedPart::join(exclude)));
            if self.extended_fails {
                return Err(ClientError::InvalidApiKey);
            }
            let day = DailyDetailEntry {
                timestamp: DAY0,
                date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                temp_min: 1.0,
                temp_max: 9.0,
                temp_day: 8.0,
                temp_night: 2.0,
                temp_morning: 3.0,
                temp_evening: 6.0,
                humidity: 60.0,
                wind_speed: 4.0,
                weather_main: "Clear".into(),
                weather_description: "맑음".into(),
                weather_icon: "01d".into(),
                pop: 0.0,
                sunrise: Some(DAY0 + 7 * 3600),
                sunset: Some(DAY0 + 17 * 3600),
                uv_index: Some(2.5),
            };
            let hour = HourlyForecastEntry {
                timestamp: DAY0,
                temperature: 5.0,
                feels_like: 3.0,
                humidity: 70,
                pressure: Some(1020),
                wind_speed: 2.0,
                wind_deg: Some(180),
                weather_main: "Clouds".into(),
                weather_description: "구름".into(),
                weather_icon: "03d".into(),
                pop: 10.0,
                precipitation: 0.0,
            };
            Ok(ExtendedForecast {
                lat,
                lon,
                timezone_offset: 32400,
                hourly: vec![hour; 48],
                daily: vec![day; 8],
            })
        }
    }

    #[tokio::test]
    async fn weekly_uses_extended_endpoint_when_available() {
        let provider = FakeProvider::default();
        let weekly = provider
            .weekly_forecast(&LocationQuery::city("Seoul,KR"), UnitSystem::Metric)
            .await
            .unwrap();

        assert_eq!(weekly.source, ForecastSource::Extended);
        assert_eq!(weekly.daily_forecasts.len(), WEEKLY_DAYS);
        assert_eq!((weekly.lat, weekly.lon), (37.57, 126.98));
        assert_eq!(
            provider.calls(),
            vec!["weather", "onecall:current,minutely,hourly,alerts"]
        );
    }

    #[tokio::test]
    async fn weekly_falls_back_to_five_day_data() {
        let provider = FakeProvider {
            extended_fails: true,
            ..Default::default()
        };
        let weekly = provider
            .weekly_forecast(&LocationQuery::coordinates(37.5, 127.0), UnitSystem::Metric)
            .await
            .unwrap();

        assert_eq!(weekly.source, ForecastSource::Fallback);
        assert_eq!(weekly.daily_forecasts.len(), 5);
        assert_eq!((weekly.lat, weekly.lon), (37.5, 127.0));
        assert_eq!(weekly.timezone_offset, 0);
        let first = &weekly.daily_forecasts[0];
        assert_eq!(first.temp_night, first.temp_day);
        assert_eq!(first.sunrise, None);
        // Coordinates were given, so no lookup call was needed.
        assert_eq!(
            provider.calls(),
            vec!["onecall:current,minutely,hourly,alerts", "forecast"]
        );
    }

    #[tokio::test]
    async fn hourly_respects_requested_hours() {
        let provider = FakeProvider::default();
        let hourly = provider
            .hourly_forecast(&LocationQuery::coordinates(1.0, 2.0), UnitSystem::Metric, Some(24))
            .await
            .unwrap();
        assert_eq!(hourly.source, ForecastSource::Extended);
        assert_eq!(hourly.hourly_forecasts.len(), 24);

        let capped = provider
            .hourly_forecast(&LocationQuery::coordinates(1.0, 2.0), UnitSystem::Metric, Some(100))
            .await
            .unwrap();
        assert_eq!(capped.hourly_forecasts.len(), MAX_HOURLY_HOURS);
    }

    #[tokio::test]
    async fn hourly_fallback_estimates_precipitation() {
        let provider = FakeProvider {
            extended_fails: true,
            ..Default::default()
        };
        let hourly = provider
            .hourly_forecast(&LocationQuery::city("Seoul,KR"), UnitSystem::Metric, None)
            .await
            .unwrap();

        assert_eq!(hourly.source, ForecastSource::Fallback);
        assert_eq!(hourly.hourly_forecasts.len(), 8);
        // Offset comes from the current-weather lookup used to resolve the city.
        assert_eq!(hourly.timezone_offset, 32400);
        let first = &hourly.hourly_forecasts[0];
        assert_eq!(first.feels_like, first.temperature);
        assert_eq!(first.precipitation, 500.0);
    }

    #[tokio::test]
    async fn daily_forecast_defaults_to_five_days() {
        let provider = FakeProvider::default();
        let days = provider
            .daily_forecast(&LocationQuery::city("Seoul,KR"), UnitSystem::Metric, None)
            .await
            .unwrap();
        assert_eq!(days.len(), 5);
        assert_eq!(days[0].temp_min, 0.0);
        assert_eq!(days[0].temp_max, 7.0);
        assert_eq!(days[0].temp_avg, 3.5);
    }

    #[tokio::test]
    async fn many_locations_skip_failures() {
        let provider = FakeProvider::default();
        let locations = vec![
            LocationQuery::city("Seoul"),
            LocationQuery::city("Nowhere"),
            LocationQuery::city("Busan"),
        ];

        let results = provider.current_weather_many(&locations, UnitSystem::Metric).await;
        let cities: Vec<_> = results.iter().map(|w| w.city.as_str()).collect();
        assert_eq!(cities, vec!["Seoul", "Busan"]);
    }

    #[test]
    fn exclude_lists_render_in_order() {
        assert_eq!(ExtendedPart::join(HOURLY_EXCLUDE), "current,minutely,daily,alerts");
    }

    #[test]
    fn provider_from_config_without_key_still_builds() {
        let cfg = Config::default();
        assert!(provider_from_config(&cfg).is_ok());
    }
}
