//! # tool-servers
//!
//! Each binary wraps one research tool in a [`ToolServer`]:
//!
//! - `websearch-server`: `search_web` over stdio
//! - `weather-server`: `get_weather` over HTTP (`WEATHER_SERVER_ADDR`)
//! - `papers-server`: `search_papers` over stdio
//!
//! Logs always go to stderr; on the stdio servers stdout carries protocol
//! traffic only.

use std::net::SocketAddr;
use std::sync::Arc;

use agent_core::ToolRegistry;
use agent_mcp::ToolServer;
use research_tools::tools::{PaperSearchTool, WeatherTool, WebSearchTool};
use research_tools::{ArxivClient, DuckDuckGoClient, OpenWeatherClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default bind address for the weather server
pub const DEFAULT_WEATHER_ADDR: &str = "127.0.0.1:8000";

/// Load `.env` and install a stderr subscriber filtered by `RUST_LOG`
pub fn init(default_filter: &str) {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

pub fn websearch_server() -> anyhow::Result<ToolServer> {
    let mut tools = ToolRegistry::new();
    tools.register(WebSearchTool::new(Arc::new(DuckDuckGoClient::new()?)));
    Ok(ToolServer::new("WebSearch", tools))
}

pub fn weather_server() -> anyhow::Result<ToolServer> {
    let client = OpenWeatherClient::from_env()?;
    let mut tools = ToolRegistry::new();
    tools.register(WeatherTool::new(Arc::new(client)));
    Ok(ToolServer::new("Weather", tools))
}

pub fn papers_server() -> anyhow::Result<ToolServer> {
    let mut tools = ToolRegistry::new();
    tools.register(PaperSearchTool::new(Arc::new(ArxivClient::new()?)));
    Ok(ToolServer::new("ResearchPapers", tools))
}

/// `WEATHER_SERVER_ADDR`, or the default
pub fn weather_addr() -> anyhow::Result<SocketAddr> {
    let raw = std::env::var("WEATHER_SERVER_ADDR").unwrap_or_else(|_| DEFAULT_WEATHER_ADDR.into());
    raw.parse()
        .map_err(|e| anyhow::anyhow!("invalid WEATHER_SERVER_ADDR '{raw}': {e}"))
}
