//! # research-tools
//!
//! The three research tools served to the agent, one per tool server:
//!
//! | tool            | upstream        | parameters                         |
//! |-----------------|-----------------|------------------------------------|
//! | `search_web`    | DuckDuckGo HTML | `query`                            |
//! | `get_weather`   | OpenWeatherMap  | `location`                         |
//! | `search_papers` | arXiv           | `query`, `max_results` (default 3) |
//!
//! Tools never fail across the wire: every upstream problem becomes a
//! single descriptive line of text for the model.

pub mod error;
pub mod model;
pub mod svckit;
pub mod upstream;

pub use error::{Result, ToolsError};
pub use model::{CurrentWeather, Location, Paper, SearchHit};
pub use upstream::{
    ArxivClient, DuckDuckGoClient, OpenWeatherClient, PaperArchive, SearchEngine, WeatherService,
};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{PaperSearchTool, WeatherTool, WebSearchTool};
}
