//! Current weather tool backed by weatherapi.com.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::args::TypedTool;
use crate::errors::AgentError;
use crate::weather::{WeatherClient, WeatherResponse};

#[derive(Debug, Deserialize)]
pub struct WeatherArgs {
    pub location: String,
}

pub struct WeatherTool {
    client: WeatherClient,
}

impl WeatherTool {
    pub fn new(client: WeatherClient) -> Self {
        Self { client }
    }
}

/// Renders current conditions as one line of text for the model.
pub fn format_current_weather(requested: &str, weather: &WeatherResponse) -> String {
    let place = if weather.location.name.is_empty() {
        requested.to_string()
    } else if weather.location.country.is_empty() {
        weather.location.name.clone()
    } else {
        format!("{}, {}", weather.location.name, weather.location.country)
    };
    let current = &weather.current;
    format!(
        "Current weather in {}: {}, {:.1}°C (feels like {:.1}°C), humidity {}%, wind {:.1} km/h {}",
        place,
        current.condition.text,
        current.temp_c,
        current.feelslike_c,
        current.humidity,
        current.wind_kph,
        current.wind_dir
    )
    .trim_end()
    .to_string()
}

#[async_trait]
impl TypedTool for WeatherTool {
    type Args = WeatherArgs;

    const NAME: &'static str = "get_weather";
    const DESCRIPTION: &'static str = "Get the current weather at the given location";

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "City name, postcode, or 'lat,lon' coordinates"
                }
            },
            "required": ["location"]
        })
    }

    async fn call(&self, args: WeatherArgs) -> Result<String, AgentError> {
        log::info!("Executing get_weather for {}", args.location);
        match self.client.current(&args.location).await {
            Ok(weather) => Ok(format_current_weather(&args.location, &weather)),
            Err(e) => Ok(format!("Weather service error: {}", e)),
        }
    }
}
