//! Multi-day weather forecast tool backed by weatherapi.com.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::args::TypedTool;
use crate::errors::AgentError;
use crate::weather::{Forecast, WeatherClient};

pub const MAX_FORECAST_DAYS: i64 = 7;

#[derive(Debug, Deserialize)]
pub struct WeatherForecastArgs {
    pub location: String,
    #[serde(default)]
    pub days: Option<i64>,
}

impl WeatherForecastArgs {
    /// Requested day count, defaulting to 1 and clamped to the upstream limit.
    pub fn days(&self) -> u32 {
        self.days.unwrap_or(1).clamp(1, MAX_FORECAST_DAYS) as u32
    }
}

pub struct WeatherForecastTool {
    client: WeatherClient,
}

impl WeatherForecastTool {
    pub fn new(client: WeatherClient) -> Self {
        Self { client }
    }
}

pub fn format_forecast(location: &str, forecast: &Forecast) -> String {
    let mut response = format!("Weather forecast for {}:\n", location);
    for day in &forecast.forecastday {
        response.push_str(&format!(
            "{}: {} (min {:.1}°C, max {:.1}°C, {}% chance of rain)\n",
            day.date,
            day.day.condition.text,
            day.day.mintemp_c,
            day.day.maxtemp_c,
            day.day.daily_chance_of_rain
        ));
    }
    response
}

#[async_trait]
impl TypedTool for WeatherForecastTool {
    type Args = WeatherForecastArgs;

    const NAME: &'static str = "get_weather_forecast";
    const DESCRIPTION: &'static str = "Get weather forecast at the given location for the given days";

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "Given location"
                },
                "days": {
                    "type": "integer",
                    "description": "Number of days to forecast (1-7)"
                }
            },
            "required": ["location"]
        })
    }

    async fn call(&self, args: WeatherForecastArgs) -> Result<String, AgentError> {
        let days = args.days();
        log::info!("Executing get_weather_forecast for {} ({} days)", args.location, days);

        match self
            .client
            .forecast(&args.location, days)
            .await
        {
            Ok(response) => {
                for day in &response.forecast.forecastday {
                    log::debug!("Forecast {}: {}", day.date, day.day.condition.text);
                }
                Ok(format_forecast(&args.location, &response.forecast))
            }
            Err(e) => Ok(format!("Weather forecast service error: {}", e)),
        }
    }
}
