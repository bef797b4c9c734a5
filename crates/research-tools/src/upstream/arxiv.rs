//! arXiv query API
//!
//! Results come back as an Atom feed. A malformed query yields a feed with
//! a single entry whose id points at `/api/errors`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::PaperArchive;
use crate::error::{Result, ToolsError};
use crate::model::{Paper, normalize_whitespace};

const DEFAULT_BASE_URL: &str = "https://export.arxiv.org";

pub struct ArxivClient {
    client: reqwest::Client,
    base_url: String,
}

impl ArxivClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl PaperArchive for ArxivClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Paper>> {
        let response = self
            .client
            .get(format!("{}/api/query", self.base_url.trim_end_matches('/')))
            .query(&[
                ("search_query", query.to_string()),
                ("start", "0".into()),
                ("max_results", max_results.to_string()),
                ("sortBy", "submittedDate".into()),
                ("sortOrder", "descending".into()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolsError::UpstreamStatus {
                status: status.as_u16(),
                message: status.canonical_reason().map(str::to_string),
            });
        }

        let papers = parse_feed(&response.text().await?)?;
        tracing::debug!(query, papers = papers.len(), "arXiv search");
        Ok(papers)
    }

    fn name(&self) -> &str {
        "arXiv"
    }
}

fn parse_feed(xml: &str) -> Result<Vec<Paper>> {
    let feed: Feed = quick_xml::de::from_str(xml)?;
    feed.entries.into_iter().map(Paper::try_from).collect()
}

impl TryFrom<Entry> for Paper {
    type Error = ToolsError;

    fn try_from(entry: Entry) -> Result<Self> {
        if entry.id.contains("/api/errors") {
            return Err(ToolsError::UpstreamStatus {
                status: 400,
                message: Some(normalize_whitespace(&entry.summary)),
            });
        }

        let published = entry
            .published
            .as_deref()
            .ok_or_else(|| ToolsError::Parse(format!("entry {} has no publication date", entry.id)))
            .and_then(|raw| {
                DateTime::parse_from_rfc3339(raw)
                    .map(|d| d.with_timezone(&Utc))
                    .map_err(|e| ToolsError::Parse(format!("publication date '{raw}': {e}")))
            })?;

        let pdf_url = entry
            .links
            .iter()
            .find(|l| l.title.as_deref() == Some("pdf") || l.kind.as_deref() == Some("application/pdf"))
            .map_or_else(|| entry.id.replacen("/abs/", "/pdf/", 1), |l| l.href.clone());

        Ok(Self {
            title: normalize_whitespace(&entry.title),
            authors: entry.authors.into_iter().map(|a| normalize_whitespace(&a.name)).collect(),
            published,
            summary: normalize_whitespace(&entry.summary),
            pdf_url,
        })
    }
}

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    id: String,
    #[serde(default)]
    published: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(rename = "author", default)]
    authors: Vec<Author>,
    #[serde(rename = "link", default)]
    links: Vec<Link>,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Link {
    #[serde(rename = "@href")]
    href: String,
    #[serde(rename = "@title", default)]
    title: Option<String>,
    #[serde(rename = "@type", default)]
    kind: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <link href="http://arxiv.org/api/query?search_query%3Dtransformers" rel="self" type="application/atom+xml"/>
  <title type="html">ArXiv Query: search_query=transformers</title>
  <id>http://arxiv.org/api/abc</id>
  <updated>2025-01-10T00:00:00-05:00</updated>
  <opensearch:totalResults xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">2</opensearch:totalResults>
  <entry>
    <id>http://arxiv.org/abs/2501.00001v1</id>
    <updated>2025-01-09T18:00:00Z</updated>
    <published>2025-01-09T18:00:00Z</published>
    <title>Sparse Transformers
      for Long Documents</title>
    <summary>  We study attention.
  It scales.
</summary>
    <author>
      <name>Ada Lovelace</name>
    </author>
    <author>
      <name>Alan Turing</name>
    </author>
    <link href="http://arxiv.org/abs/2501.00001v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2501.00001v1" rel="related" type="application/pdf"/>
    <category term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2501.00002v2</id>
    <published>2025-01-08T09:30:00Z</published>
    <title>Vision Transformers Revisited</title>
    <summary>Patches all the way down.</summary>
    <author><name>Grace Hopper</name></author>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_feed() {
        let papers = parse_feed(FEED).unwrap();
        assert_eq!(papers.len(), 2);

        assert_eq!(papers[0].title, "Sparse Transformers for Long Documents");
        assert_eq!(papers[0].summary, "We study attention. It scales.");
        assert_eq!(papers[0].authors, vec!["Ada Lovelace", "Alan Turing"]);
        assert_eq!(papers[0].published.format("%Y-%m-%d").to_string(), "2025-01-09");
        assert_eq!(papers[0].pdf_url, "http://arxiv.org/pdf/2501.00001v1");

        // No pdf link: derived from the abstract id
        assert_eq!(papers[1].pdf_url, "http://arxiv.org/pdf/2501.00002v2");
    }

    #[test]
    fn test_empty_feed() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>ArXiv Query</title><id>x</id></feed>"#;
        assert!(parse_feed(xml).unwrap().is_empty());
    }

    #[test]
    fn test_error_entry() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/api/errors#incorrect_id_format_for_1234</id>
    <title>Error</title>
    <summary>incorrect id format for 1234</summary>
  </entry>
</feed>"#;
        let err = parse_feed(xml).unwrap_err();
        assert_eq!(err.upstream_message(), Some("incorrect id format for 1234"));
    }

    #[test]
    fn test_garbage_is_xml_error() {
        assert!(matches!(parse_feed("not xml at all <"), Err(ToolsError::Xml(_))));
    }
}
