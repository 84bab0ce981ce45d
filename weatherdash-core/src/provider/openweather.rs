use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;

use crate::{
    Config,
    error::ClientError,
    location::LocationQuery,
    model::{CurrentWeather, DailyDetailEntry, ExtendedForecast, ForecastEntry, HourlyForecastEntry},
    retry::RetryPolicy,
    units::UnitSystem,
};

use super::{ExtendedPart, WeatherProvider};

pub const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const OPENWEATHER_ICON_URL: &str = "https://openweathermap.org/img/wn";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Language of condition descriptions in responses.
const RESPONSE_LANG: &str = "kr";

/// `"01d"` → `https://openweathermap.org/img/wn/01d@2x.png`
pub fn icon_url(icon: &str) -> String {
    format!("{OPENWEATHER_ICON_URL}/{icon}@2x.png")
}

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: Option<String>,
    http: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl OpenWeatherClient {
    pub fn new(api_key: Option<String>) -> Result<Self, ClientError> {
        Self::with_options(api_key, OPENWEATHER_BASE_URL, DEFAULT_TIMEOUT, RetryPolicy::default())
    }

    pub fn with_options(
        api_key: Option<String>,
        base_url: &str,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Request(e.to_string()))?;

        Ok(Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = Self::with_options(
            config.api_key().map(str::to_owned),
            OPENWEATHER_BASE_URL,
            Duration::from_secs(config.request_timeout_secs),
            RetryPolicy::new(config.max_retries),
        )?;
        Ok(client)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let res = self.http.get(url).query(params).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if let Some(err) = ClientError::from_status(status.as_u16(), &body) {
            tracing::warn!(url, %status, "provider returned an error status");
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        mut params: Vec<(&'static str, String)>,
        units: UnitSystem,
    ) -> Result<T, ClientError> {
        let api_key = self.api_key.as_deref().ok_or(ClientError::MissingApiKey)?;

        let url = format!("{}/{endpoint}", self.base_url);
        params.push(("appid", api_key.to_string()));
        params.push(("units", units.as_str().to_string()));
        params.push(("lang", RESPONSE_LANG.to_string()));

        self.retry.run(endpoint, || self.get_once(&url, &params)).await
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current_weather(
        &self,
        location: &LocationQuery,
        units: UnitSystem,
    ) -> Result<CurrentWeather, ClientError> {
        let parsed: OwCurrentResponse =
            self.get_json("weather", location.query_pairs(), units).await?;
        Ok(parsed.into())
    }

    async fn forecast(
        &self,
        location: &LocationQuery,
        units: UnitSystem,
    ) -> Result<Vec<ForecastEntry>, ClientError> {
        let parsed: OwForecastResponse =
            self.get_json("forecast", location.query_pairs(), units).await?;
        Ok(parsed.list.into_iter().map(ForecastEntry::from).collect())
    }

    async fn extended_forecast(
        &self,
        lat: f64,
        lon: f64,
        units: UnitSystem,
        exclude: &[ExtendedPart],
    ) -> Result<ExtendedForecast, ClientError> {
        let params = vec![
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("exclude", ExtendedPart::join(exclude)),
        ];
        let parsed: OwOneCallResponse = self.get_json("onecall", params, units).await?;
        Ok(parsed.into())
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    #[serde(default)]
    temp_min: Option<f64>,
    #[serde(default)]
    temp_max: Option<f64>,
    #[serde(default)]
    pressure: u32,
    humidity: u8,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct OwWeather {
    #[serde(default)]
    main: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Default, Deserialize)]
struct OwWind {
    #[serde(default)]
    speed: f64,
    deg: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    #[serde(default)]
    timezone: i32,
    coord: OwCoord,
    sys: OwSys,
    main: OwMain,
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
    visibility: Option<u32>,
}

fn first_condition(weather: &[OwWeather]) -> OwWeather {
    weather.first().cloned().unwrap_or_default()
}

impl From<OwCurrentResponse> for CurrentWeather {
    fn from(raw: OwCurrentResponse) -> Self {
        let condition = first_condition(&raw.weather);
        CurrentWeather {
            city: raw.name,
            country: raw.sys.country,
            timestamp: raw.dt,
            timezone_offset: raw.timezone,
            weather_main: condition.main,
            weather_description: condition.description,
            weather_icon: condition.icon,
            temperature: raw.main.temp,
            feels_like: raw.main.feels_like,
            humidity: raw.main.humidity,
            pressure: raw.main.pressure,
            wind_speed: raw.wind.speed,
            wind_deg: raw.wind.deg,
            visibility: raw.visibility,
            lat: raw.coord.lat,
            lon: raw.coord.lon,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwForecastItem {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
    #[serde(default)]
    pop: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastItem>,
}

impl From<OwForecastItem> for ForecastEntry {
    fn from(item: OwForecastItem) -> Self {
        let condition = first_condition(&item.weather);
        ForecastEntry {
            timestamp: item.dt,
            temperature: item.main.temp,
            temp_min: item.main.temp_min.unwrap_or(item.main.temp),
            temp_max: item.main.temp_max.unwrap_or(item.main.temp),
            weather_main: condition.main,
            weather_description: condition.description,
            weather_icon: condition.icon,
            humidity: item.main.humidity,
            wind_speed: item.wind.speed,
            pop: item.pop * 100.0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwRain {
    #[serde(rename = "1h", default)]
    one_hour: f64,
}

#[derive(Debug, Deserialize)]
struct OwHourly {
    dt: i64,
    temp: f64,
    feels_like: f64,
    #[serde(default)]
    pressure: Option<u32>,
    humidity: u8,
    #[serde(default)]
    wind_speed: f64,
    wind_deg: Option<u16>,
    #[serde(default)]
    weather: Vec<OwWeather>,
    #[serde(default)]
    pop: f64,
    rain: Option<OwRain>,
    snow: Option<OwRain>,
}

#[derive(Debug, Deserialize)]
struct OwDailyTemp {
    day: f64,
    min: f64,
    max: f64,
    night: f64,
    eve: f64,
    morn: f64,
}

#[derive(Debug, Deserialize)]
struct OwDaily {
    dt: i64,
    sunrise: Option<i64>,
    sunset: Option<i64>,
    temp: OwDailyTemp,
    humidity: f64,
    #[serde(default)]
    wind_speed: f64,
    #[serde(default)]
    weather: Vec<OwWeather>,
    #[serde(default)]
    pop: f64,
    uvi: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwOneCallResponse {
    lat: f64,
    lon: f64,
    #[serde(default)]
    timezone_offset: i32,
    #[serde(default)]
    hourly: Vec<OwHourly>,
    #[serde(default)]
    daily: Vec<OwDaily>,
}

impl From<OwHourly> for HourlyForecastEntry {
    fn from(raw: OwHourly) -> Self {
        let condition = first_condition(&raw.weather);
        let precipitation = raw.rain.map(|r| r.one_hour).unwrap_or_default()
            + raw.snow.map(|s| s.one_hour).unwrap_or_default();

        HourlyForecastEntry {
            timestamp: raw.dt,
            temperature: raw.temp,
            feels_like: raw.feels_like,
            humidity: raw.humidity,
            pressure: raw.pressure,
            wind_speed: raw.wind_speed,
            wind_deg: raw.wind_deg,
            weather_main: condition.main,
            weather_description: condition.description,
            weather_icon: condition.icon,
            pop: raw.pop * 100.0,
            precipitation,
        }
    }
}

impl From<OwDaily> for DailyDetailEntry {
    fn from(raw: OwDaily) -> Self {
        let condition = first_condition(&raw.weather);
        let date = DateTime::<Utc>::from_timestamp(raw.dt, 0)
            .map(|dt| dt.date_naive())
            .unwrap_or_default();

        DailyDetailEntry {
            timestamp: raw.dt,
            date,
            temp_min: raw.temp.min,
            temp_max: raw.temp.max,
            temp_day: raw.temp.day,
            temp_night: raw.temp.night,
            temp_morning: raw.temp.morn,
            temp_evening: raw.temp.eve,
            humidity: raw.humidity,
            wind_speed: raw.wind_speed,
            weather_main: condition.main,
            weather_description: condition.description,
            weather_icon: condition.icon,
            pop: raw.pop * 100.0,
            sunrise: raw.sunrise,
            sunset: raw.sunset,
            uv_index: raw.uvi,
        }
    }
}

impl From<OwOneCallResponse> for ExtendedForecast {
    fn from(raw: OwOneCallResponse) -> Self {
        ExtendedForecast {
            lat: raw.lat,
            lon: raw.lon,
            timezone_offset: raw.timezone_offset,
            hourly: raw.hourly.into_iter().map(HourlyForecastEntry::from).collect(),
            daily: raw.daily.into_iter().map(DailyDetailEntry::from).collect(),
        }
    }
}
