//! Mock Upstreams
//!
//! In-memory stand-ins for the real services. Each can also be told to fail
//! so the tools' error paths can be exercised without a network.

use std::collections::HashMap;

use async_trait::async_trait;

use super::{PaperArchive, SearchEngine, WeatherService};
use crate::error::{Result, ToolsError};
use crate::model::{CurrentWeather, Location, Paper, SearchHit};

/// How a mock should fail, if at all
#[derive(Clone, Debug)]
enum Failure {
    Status(u16, Option<String>),
    Parse(String),
}

impl Failure {
    fn to_error(&self) -> ToolsError {
        match self {
            Self::Status(status, message) => ToolsError::UpstreamStatus {
                status: *status,
                message: message.clone(),
            },
            Self::Parse(msg) => ToolsError::Parse(msg.clone()),
        }
    }
}

/// Search engine with canned hits
#[derive(Default)]
pub struct MockSearchEngine {
    hits: Vec<SearchHit>,
    failure: Option<Failure>,
}

impl MockSearchEngine {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            failure: None,
        }
    }

    /// Every search fails as if the upstream answered with `status`
    pub fn failing(status: u16) -> Self {
        Self {
            hits: Vec::new(),
            failure: Some(Failure::Status(status, None)),
        }
    }
}

#[async_trait]
impl SearchEngine for MockSearchEngine {
    async fn search(&self, _query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        if let Some(failure) = &self.failure {
            return Err(failure.to_error());
        }
        Ok(self.hits.iter().take(max_results).cloned().collect())
    }

    fn name(&self) -> &str {
        "MockSearch"
    }
}

/// Weather service that knows a fixed set of places
pub struct MockWeatherService {
    places: HashMap<String, CurrentWeather>,
    has_key: bool,
    failure: Option<Failure>,
}

impl Default for MockWeatherService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWeatherService {
    pub fn new() -> Self {
        Self {
            places: HashMap::new(),
            has_key: true,
            failure: None,
        }
    }

    #[must_use]
    pub fn with_place(mut self, name: impl Into<String>, weather: CurrentWeather) -> Self {
        self.places.insert(name.into().to_lowercase(), weather);
        self
    }

    /// Behave as if no API key was configured
    #[must_use]
    pub const fn without_key(mut self) -> Self {
        self.has_key = false;
        self
    }

    /// Geocoding succeeds but the conditions lookup is rejected
    #[must_use]
    pub fn rejecting_conditions(mut self, status: u16, message: Option<&str>) -> Self {
        self.failure = Some(Failure::Status(status, message.map(str::to_string)));
        self
    }

    /// Conditions come back unreadable
    #[must_use]
    pub fn garbling_conditions(mut self) -> Self {
        self.failure = Some(Failure::Parse("unexpected payload".into()));
        self
    }

    fn check_key(&self) -> Result<()> {
        if self.has_key {
            Ok(())
        } else {
            Err(ToolsError::MissingCredential("OPENWEATHERMAP_API_KEY".into()))
        }
    }
}

#[async_trait]
impl WeatherService for MockWeatherService {
    async fn geocode(&self, location: &str) -> Result<Option<Location>> {
        self.check_key()?;
        let key = location.to_lowercase();
        Ok(self.places.contains_key(&key).then(|| Location {
            name: key,
            lat: 0.0,
            lon: 0.0,
            country: None,
        }))
    }

    async fn current(&self, location: &Location) -> Result<CurrentWeather> {
        self.check_key()?;
        if let Some(failure) = &self.failure {
            return Err(failure.to_error());
        }
        self.places
            .get(&location.name)
            .cloned()
            .ok_or_else(|| ToolsError::Parse(format!("no readings for {}", location.name)))
    }

    fn name(&self) -> &str {
        "MockWeather"
    }
}

/// Paper archive with canned papers
#[derive(Default)]
pub struct MockPaperArchive {
    papers: Vec<Paper>,
    failure: Option<Failure>,
}

impl MockPaperArchive {
    pub fn new(papers: Vec<Paper>) -> Self {
        Self {
            papers,
            failure: None,
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            papers: Vec::new(),
            failure: Some(Failure::Status(status, None)),
        }
    }
}

#[async_trait]
impl PaperArchive for MockPaperArchive {
    async fn search(&self, _query: &str, max_results: usize) -> Result<Vec<Paper>> {
        if let Some(failure) = &self.failure {
            return Err(failure.to_error());
        }
        Ok(self.papers.iter().take(max_results).cloned().collect())
    }

    fn name(&self) -> &str {
        "MockArchive"
    }
}
