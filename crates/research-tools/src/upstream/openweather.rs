//! OpenWeatherMap client
//!
//! Geocoding (`/geo/1.0/direct`) followed by current conditions
//! (`/data/2.5/weather`, metric units).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::WeatherService;
use crate::error::{Result, ToolsError};
use crate::model::{CurrentWeather, Location};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Name of the variable holding the API key
pub const API_KEY_VAR: &str = "OPENWEATHERMAP_API_KEY";

pub struct OpenWeatherClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenWeatherClient {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// Key from `OPENWEATHERMAP_API_KEY`. A missing key is not an error
    /// here; every lookup reports it instead.
    pub fn from_env() -> Result<Self> {
        Self::new(std::env::var(API_KEY_VAR).ok())
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ToolsError::MissingCredential(API_KEY_VAR.into()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .client
            .get(self.url(path))
            .query(query)
            .query(&[("appid", self.api_key()?)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|e| e.message);
            return Err(ToolsError::UpstreamStatus {
                status: status.as_u16(),
                message,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl WeatherService for OpenWeatherClient {
    async fn geocode(&self, location: &str) -> Result<Option<Location>> {
        let places: Vec<GeoPlace> = self
            .get_json(
                "/geo/1.0/direct",
                &[("q", location.to_string()), ("limit", "1".into())],
            )
            .await?;

        Ok(places.into_iter().next().map(|p| Location {
            name: p.name,
            lat: p.lat,
            lon: p.lon,
            country: p.country,
        }))
    }

    async fn current(&self, location: &Location) -> Result<CurrentWeather> {
        let report: WeatherReport = self
            .get_json(
                "/data/2.5/weather",
                &[
                    ("lat", location.lat.to_string()),
                    ("lon", location.lon.to_string()),
                    ("units", "metric".into()),
                ],
            )
            .await?;

        let description = report
            .weather
            .into_iter()
            .next()
            .map(|w| w.description)
            .ok_or_else(|| ToolsError::Parse("weather report has no conditions".into()))?;

        Ok(CurrentWeather {
            temperature: report.main.temp,
            feels_like: report.main.feels_like,
            description,
            humidity: report.main.humidity,
            wind_speed: report.wind.speed,
        })
    }

    fn name(&self) -> &str {
        "OpenWeatherMap"
    }
}

#[derive(Debug, Deserialize)]
struct GeoPlace {
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WeatherReport {
    weather: Vec<Conditions>,
    main: MainReadings,
    wind: Wind,
}

#[derive(Debug, Deserialize)]
struct Conditions {
    description: String,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    feels_like: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct Wind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}
