//! Web Search Tool
//!
//! Top three web results for a query.

use std::sync::Arc;

use async_trait::async_trait;

use agent_core::{
    ParamType, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema,
    tool::ParameterSchema,
};

use crate::model::SearchHit;
use crate::upstream::SearchEngine;

const MAX_RESULTS: usize = 3;

pub struct WebSearchTool {
    engine: Arc<dyn SearchEngine>,
}

impl WebSearchTool {
    pub fn new(engine: Arc<dyn SearchEngine>) -> Self {
        Self { engine }
    }

    /// Render hits the way the model sees them
    pub fn format_results(query: &str, hits: &[SearchHit]) -> String {
        if hits.is_empty() {
            return "No results found.".into();
        }
        let body = hits
            .iter()
            .map(|hit| {
                format!(
                    "Title: {}\nURL: {}\nDescription: {}",
                    hit.title, hit.url, hit.description
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        format!("Search results for '{query}':\n{body}")
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("search_web", "Search the web for information.").param(
            ParameterSchema::required("query", ParamType::String, "The search query"),
        )
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let query = call.str_arg("query").unwrap_or_default();

        match self.engine.search(query, MAX_RESULTS).await {
            Ok(hits) => Ok(ToolResult::success(
                "search_web",
                Self::format_results(query, &hits),
            )),
            Err(e) => {
                tracing::warn!(engine = self.engine.name(), error = %e, "Web search failed");
                Ok(ToolResult::failure(
                    "search_web",
                    format!("Error performing search: {e}"),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::{DuckDuckGoClient, MockSearchEngine};
    use serde_json::json;

    fn call(query: &str) -> ToolCall {
        ToolCall::new("search_web", json!({ "query": query }).as_object().cloned().unwrap())
    }

    #[tokio::test]
    async fn test_no_results() {
        let tool = WebSearchTool::new(Arc::new(MockSearchEngine::default()));
        let result = tool.execute(&call("quantum computing")).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output, "No results found.");
    }

    #[tokio::test]
    async fn test_formats_three_results() {
        let hits = (1..=4)
            .map(|i| SearchHit::new(format!("Result {i}"), format!("https://r{i}.example"), format!("About {i}")))
            .collect();
        let tool = WebSearchTool::new(Arc::new(MockSearchEngine::new(hits)));

        let result = tool.execute(&call("rust")).await.unwrap();
        assert!(result.output.starts_with("Search results for 'rust':\nTitle: Result 1\nURL: https://r1.example\nDescription: About 1\n\nTitle: Result 2"));
        assert!(result.output.contains("Result 3"));
        assert!(!result.output.contains("Result 4"));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_text() {
        let tool = WebSearchTool::new(Arc::new(MockSearchEngine::failing(503)));
        let result = tool.execute(&call("rust")).await.unwrap();
        assert!(!result.success);
        assert!(result.output.starts_with("Error performing search: "));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_text() {
        let engine = DuckDuckGoClient::with_base_url("http://127.0.0.1:1").unwrap();
        let tool = WebSearchTool::new(Arc::new(engine));
        let result = tool.execute(&call("rust")).await.unwrap();
        assert!(result.output.starts_with("Error performing search: "));
    }
}
