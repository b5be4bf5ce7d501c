//! weatherapi.com client used by the weather tools.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::errors::AgentError;

pub const DEFAULT_API_BASE: &str = "http://api.weatherapi.com/v1";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Condition {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub code: i64,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct CurrentWeather {
    pub last_updated: String,
    pub temp_c: f64,
    pub temp_f: f64,
    pub is_day: i64,
    pub condition: Condition,
    pub wind_kph: f64,
    pub wind_mph: f64,
    pub wind_dir: String,
    pub precip_mm: f64,
    pub humidity: i64,
    pub cloud: i64,
    pub feelslike_c: f64,
    pub feelslike_f: f64,
    pub uv: f64,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Location {
    pub name: String,
    pub region: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub tz_id: String,
    pub localtime: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherResponse {
    #[serde(default)]
    pub location: Location,
    pub current: CurrentWeather,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Day {
    pub maxtemp_c: f64,
    pub mintemp_c: f64,
    pub daily_chance_of_rain: i64,
    pub condition: Condition,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ForecastDay {
    pub date: String,
    #[serde(default)]
    pub day: Day,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Forecast {
    #[serde(default)]
    pub forecastday: Vec<ForecastDay>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherForecastResponse {
    #[serde(default)]
    pub location: Location,
    pub forecast: Forecast,
}

#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    api_base: String,
    api_key: Option<String>,
}

impl WeatherClient {
    pub fn new(api_base: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub async fn current(&self, location: &str) -> Result<WeatherResponse, AgentError> {
        log::info!("Fetching current weather for {}", location);
        let url = format!(
            "{}/current.json?key={}&q={}&aqi=no",
            self.api_base,
            urlencoding::encode(self.api_key()?),
            urlencoding::encode(location)
        );
        self.get_json(&url).await
    }

    pub async fn forecast(
        &self,
        location: &str,
        days: u32,
    ) -> Result<WeatherForecastResponse, AgentError> {
        log::info!("Fetching weather forecast for {} ({} days)", location, days);
        let url = format!(
            "{}/forecast.json?key={}&q={}&days={}&aqi=no&alerts=no",
            self.api_base,
            urlencoding::encode(self.api_key()?),
            urlencoding::encode(location),
            days
        );
        self.get_json(&url).await
    }

    fn api_key(&self) -> Result<&str, AgentError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AgentError::ConfigError("weather API key is not configured".to_string()))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, AgentError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            AgentError::tool("weather", format!("request failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::tool(
                "weather",
                format!("status {}: {}", status, body),
            ));
        }

        response.json::<T>().await.map_err(|e| {
            AgentError::tool("weather", format!("invalid response: {}", e))
        })
    }
}
