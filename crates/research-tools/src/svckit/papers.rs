//! Paper Search Tool
//!
//! Most recent archive submissions matching a query.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use agent_core::{
    ParamType, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema,
    tool::ParameterSchema,
};

use crate::model::{Paper, truncate_chars};
use crate::upstream::PaperArchive;

const DEFAULT_MAX_RESULTS: i64 = 3;
const RESULT_CAP: i64 = 50;
const AUTHORS_LIMIT: usize = 100;
const SUMMARY_LIMIT: usize = 200;

pub struct PaperSearchTool {
    archive: Arc<dyn PaperArchive>,
}

impl PaperSearchTool {
    pub fn new(archive: Arc<dyn PaperArchive>) -> Self {
        Self { archive }
    }

    pub fn format_paper(paper: &Paper) -> String {
        let summary: String = paper.summary.chars().take(SUMMARY_LIMIT).collect();
        format!(
            "Title: {}\nAuthors: {}\nPublished: {}\nSummary: {summary}...\nURL: {}",
            paper.title,
            truncate_chars(&paper.author_line(), AUTHORS_LIMIT),
            paper.published.format("%Y-%m-%d"),
            paper.pdf_url
        )
    }

    pub fn format_papers(papers: &[Paper]) -> String {
        if papers.is_empty() {
            return "No papers found matching your query.".into();
        }
        let separator = format!("\n{}\n", "-".repeat(80));
        papers
            .iter()
            .map(Self::format_paper)
            .collect::<Vec<_>>()
            .join(&separator)
    }
}

#[async_trait]
impl Tool for PaperSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("search_papers", "Search for research papers on ArXiv.")
            .param(ParameterSchema::required(
                "query",
                ParamType::String,
                "Search query for papers",
            ))
            .param(ParameterSchema::optional(
                "max_results",
                ParamType::Integer,
                "Maximum number of results to return (default: 3)",
                Some(json!(DEFAULT_MAX_RESULTS)),
            ))
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let query = call.str_arg("query").unwrap_or_default();
        let max_results = call
            .int_arg("max_results")
            .unwrap_or(DEFAULT_MAX_RESULTS)
            .clamp(0, RESULT_CAP);
        let max_results = usize::try_from(max_results).unwrap_or_default();

        match self.archive.search(query, max_results).await {
            Ok(papers) => Ok(ToolResult::success("search_papers", Self::format_papers(&papers))),
            Err(e) => {
                tracing::warn!(archive = self.archive.name(), error = %e, "Paper search failed");
                Ok(ToolResult::failure(
                    "search_papers",
                    format!("Error searching for papers: {e}"),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::{ArxivClient, MockPaperArchive};
    use chrono::{TimeZone, Utc};

    fn paper(n: u32, title: &str) -> Paper {
        Paper {
            title: title.into(),
            authors: vec!["Ada Lovelace".into(), "Alan Turing".into()],
            published: Utc.with_ymd_and_hms(2025, 1, n, 12, 0, 0).unwrap(),
            summary: format!("Summary of {title}."),
            pdf_url: format!("http://arxiv.org/pdf/2501.0000{n}v1"),
        }
    }

    fn call(args: serde_json::Value) -> ToolCall {
        ToolCall::new("search_papers", args.as_object().cloned().unwrap())
    }

    #[tokio::test]
    async fn test_two_papers() {
        let archive = MockPaperArchive::new(vec![
            paper(2, "Sparse Transformers"),
            paper(1, "Vision Transformers"),
            paper(3, "Not Requested"),
        ]);
        let tool = PaperSearchTool::new(Arc::new(archive));

        let result = tool
            .execute(&call(json!({"query": "transformers", "max_results": 2})))
            .await
            .unwrap();
        let out = result.output;

        assert!(out.contains("Title: Sparse Transformers"));
        assert!(out.contains("Title: Vision Transformers"));
        assert!(out.contains("URL: http://arxiv.org/pdf/2501.00002v1"));
        assert!(out.contains("URL: http://arxiv.org/pdf/2501.00001v1"));
        assert!(out.contains(&"-".repeat(80)));
        assert!(out.contains("Published: 2025-01-02"));
        assert!(!out.contains("Not Requested"));
    }

    #[tokio::test]
    async fn test_default_max_results() {
        let archive = MockPaperArchive::new((1..=5).map(|n| paper(n, &format!("P{n}"))).collect());
        let tool = PaperSearchTool::new(Arc::new(archive));
        let result = tool.execute(&call(json!({"query": "x"}))).await.unwrap();
        assert_eq!(result.output.matches("Title: ").count(), 3);
    }

    #[tokio::test]
    async fn test_no_papers_and_failure() {
        let tool = PaperSearchTool::new(Arc::new(MockPaperArchive::default()));
        let result = tool.execute(&call(json!({"query": "x"}))).await.unwrap();
        assert_eq!(result.output, "No papers found matching your query.");

        let tool = PaperSearchTool::new(Arc::new(MockPaperArchive::failing(503)));
        let result = tool.execute(&call(json!({"query": "x"}))).await.unwrap();
        assert!(!result.success);
        assert!(result.output.starts_with("Error searching for papers: "));
    }

    #[tokio::test]
    async fn test_unreachable_archive_is_text() {
        let archive = ArxivClient::with_base_url("http://127.0.0.1:1").unwrap();
        let tool = PaperSearchTool::new(Arc::new(archive));
        let result = tool.execute(&call(json!({"query": "transformers"}))).await.unwrap();
        assert!(!result.success);
        assert!(result.output.starts_with("Error searching for papers: "));
    }

    #[test]
    fn test_truncation() {
        let mut p = paper(1, "Long");
        p.authors = (0..30).map(|i| format!("Author Number {i}")).collect();
        p.summary = "x".repeat(500);

        let out = PaperSearchTool::format_paper(&p);
        let authors = out.lines().nth(1).unwrap();
        assert_eq!(authors.chars().count(), "Authors: ".len() + 100 + 3);
        assert!(authors.ends_with("..."));

        let summary = out.lines().nth(3).unwrap();
        assert_eq!(summary, format!("Summary: {}...", "x".repeat(200)));
    }
}
