//! Weather Tool
//!
//! Current conditions for a named place.

use std::sync::Arc;

use async_trait::async_trait;

use agent_core::{
    ParamType, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema,
    tool::ParameterSchema,
};

use crate::error::ToolsError;
use crate::model::CurrentWeather;
use crate::upstream::WeatherService;

pub struct WeatherTool {
    service: Arc<dyn WeatherService>,
}

impl WeatherTool {
    pub fn new(service: Arc<dyn WeatherService>) -> Self {
        Self { service }
    }

    pub fn format_report(location: &str, weather: &CurrentWeather) -> String {
        format!(
            "Weather in {location}:\n\
             - Temperature: {}°C (feels like {}°C)\n\
             - Conditions: {}\n\
             - Humidity: {}%\n\
             - Wind: {} m/s",
            weather.temperature,
            weather.feels_like,
            weather.description,
            weather.humidity,
            weather.wind_speed
        )
    }

    async fn lookup(&self, location: &str) -> Result<String, String> {
        let place = match self.service.geocode(location).await {
            Ok(Some(place)) => place,
            Ok(None) => return Ok(format!("Could not find location: {location}")),
            Err(ToolsError::MissingCredential(var)) => {
                return Err(format!("Error: {var} not found in environment variables"));
            }
            Err(e) => return Err(format!("Error getting weather: {e}")),
        };

        match self.service.current(&place).await {
            Ok(weather) => Ok(Self::format_report(location, &weather)),
            Err(e @ ToolsError::UpstreamStatus { .. }) => Err(format!(
                "Error getting weather data: {}",
                e.upstream_message().unwrap_or("Unknown error")
            )),
            Err(ToolsError::MissingCredential(var)) => {
                Err(format!("Error: {var} not found in environment variables"))
            }
            Err(e) => Err(format!("Error getting weather: {e}")),
        }
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("get_weather", "Get the current weather for a specific location.").param(
            ParameterSchema::required(
                "location",
                ParamType::String,
                "City name and optional country code (e.g., 'London,uk' or 'New York')",
            ),
        )
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let location = call.str_arg("location").unwrap_or_default();

        Ok(match self.lookup(location).await {
            Ok(report) => ToolResult::success("get_weather", report),
            Err(message) => {
                tracing::warn!(service = self.service.name(), location, "{message}");
                ToolResult::failure("get_weather", message)
            }
        })
    }
}
