//! Upstream Services
//!
//! Abstractions over the third-party APIs the tools sit on, plus one HTTP
//! implementation of each and in-memory mocks for tests.

mod arxiv;
mod duckduckgo;
mod mock;
mod openweather;

pub use arxiv::ArxivClient;
pub use duckduckgo::DuckDuckGoClient;
pub use mock::{MockPaperArchive, MockSearchEngine, MockWeatherService};
pub use openweather::OpenWeatherClient;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{CurrentWeather, Location, Paper, SearchHit};

/// Web search backend
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Top `max_results` hits for a query
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;

    fn name(&self) -> &str;
}

/// Geocoding plus current conditions
#[async_trait]
pub trait WeatherService: Send + Sync {
    /// Resolve a free-form place name; `None` when nothing matches
    async fn geocode(&self, location: &str) -> Result<Option<Location>>;

    async fn current(&self, location: &Location) -> Result<CurrentWeather>;

    fn name(&self) -> &str;
}

/// Research paper archive
#[async_trait]
pub trait PaperArchive: Send + Sync {
    /// Newest submissions first
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Paper>>;

    fn name(&self) -> &str;
}
