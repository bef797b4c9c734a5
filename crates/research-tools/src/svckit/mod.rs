//! Service Kit - Agent Tools
//!
//! The tools each server exposes, built on the upstream traits.

mod papers;
mod weather;
mod web_search;

pub use papers::PaperSearchTool;
pub use weather::WeatherTool;
pub use web_search::WebSearchTool;
