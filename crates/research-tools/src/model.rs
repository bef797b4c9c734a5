//! Domain Models
//!
//! What the upstream services hand back, independent of their wire formats.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One web search result
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub description: String,
}

impl SearchHit {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            description: description.into(),
        }
    }
}

/// A geocoded place
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub country: Option<String>,
}

/// Current conditions at a location, metric units
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    /// Degrees Celsius
    pub temperature: f64,
    pub feels_like: f64,
    pub description: String,
    /// Percent
    pub humidity: f64,
    /// Metres per second
    pub wind_speed: f64,
}

/// A paper from the archive
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub title: String,
    pub authors: Vec<String>,
    pub published: DateTime<Utc>,
    pub summary: String,
    pub pdf_url: String,
}

impl Paper {
    /// Author names joined by commas
    pub fn author_line(&self) -> String {
        self.authors.join(", ")
    }
}

/// Collapse runs of whitespace (line breaks, indentation) into single spaces
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep at most `max` characters, appending `...` when anything was cut
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(
            normalize_whitespace("  Attention Is\n    All You Need "),
            "Attention Is All You Need"
        );
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        assert_eq!(truncate_chars("héllo wörld", 4), "héll...");
        assert_eq!(truncate_chars("exact", 5), "exact");
    }
}
