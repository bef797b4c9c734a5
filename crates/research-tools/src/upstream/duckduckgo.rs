//! DuckDuckGo HTML search
//!
//! Scrapes the JavaScript-free results page; no API key needed.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use super::SearchEngine;
use crate::error::{Result, ToolsError};
use crate::model::SearchHit;

const DEFAULT_BASE_URL: &str = "https://html.duckduckgo.com";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; research-agent/0.1)";

pub struct DuckDuckGoClient {
    client: reqwest::Client,
    base_url: String,
}

impl DuckDuckGoClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl SearchEngine for DuckDuckGoClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let response = self
            .client
            .get(format!("{}/html/", self.base_url.trim_end_matches('/')))
            .query(&[("q", query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolsError::UpstreamStatus {
                status: status.as_u16(),
                message: status.canonical_reason().map(str::to_string),
            });
        }

        let html = response.text().await?;
        let hits = extract_results(&html, max_results);
        tracing::debug!(query, hits = hits.len(), "DuckDuckGo search");
        Ok(hits)
    }

    fn name(&self) -> &str {
        "DuckDuckGo"
    }
}

/// Pull results out of the HTML page, skipping sponsored entries
fn extract_results(html: &str, max_results: usize) -> Vec<SearchHit> {
    html.split("result__body")
        .skip(1)
        .filter_map(parse_result)
        .take(max_results)
        .collect()
}

fn parse_result(chunk: &str) -> Option<SearchHit> {
    let anchor = chunk.split("class=\"result__a\"").nth(1)?;
    let href = attribute(anchor, "href")?;
    if href.contains("duckduckgo.com/y.js") {
        return None;
    }

    let title = inner_text(anchor)?;
    if title.is_empty() {
        return None;
    }

    let description = chunk
        .split("class=\"result__snippet\"")
        .nth(1)
        .and_then(inner_text)
        .unwrap_or_default();

    Some(SearchHit::new(title, resolve_href(&html_decode(href)), description))
}

/// Value of `name="..."` inside the tag that `tag_rest` is positioned in
fn attribute<'a>(tag_rest: &'a str, name: &str) -> Option<&'a str> {
    let tag = tag_rest.split('>').next()?;
    let start = tag.find(&format!("{name}=\""))? + name.len() + 2;
    let len = tag[start..].find('"')?;
    Some(&tag[start..start + len])
}

/// Text between the end of the current tag and the closing `</a>`, with
/// inline markup removed
fn inner_text(tag_rest: &str) -> Option<String> {
    let body = tag_rest.split_once('>')?.1;
    let body = body.split("</a>").next()?;
    Some(html_decode(&strip_tags(body)).trim().to_string())
}

fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Result links go through a redirect (`//duckduckgo.com/l/?uddg=<target>`)
fn resolve_href(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };

    Url::parse(&absolute)
        .ok()
        .filter(|url| url.path().starts_with("/l/"))
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "uddg")
                .map(|(_, target)| target.into_owned())
        })
        .unwrap_or(absolute)
}

fn html_decode(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<div class="result results_links results_links_deep result--ad">
  <div class="links_main links_deep result__body">
    <h2 class="result__title"><a rel="nofollow" class="result__a" href="https://duckduckgo.com/y.js?ad_domain=shop.example">Buy Qubits</a></h2>
  </div>
</div>
<div class="result results_links results_links_deep web-result">
  <div class="links_main links_deep result__body">
    <h2 class="result__title">
      <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fen.wikipedia.org%2Fwiki%2FQuantum_computing&amp;rut=abc">Quantum computing - <b>Wikipedia</b></a>
    </h2>
    <a class="result__url" href="//duckduckgo.com/l/?uddg=x">en.wikipedia.org/wiki/Quantum_computing</a>
    <a class="result__snippet" href="//duckduckgo.com/l/?uddg=x">A <b>quantum</b> computer exploits quantum mechanical phenomena &amp; more.</a>
  </div>
</div>
<div class="result results_links results_links_deep web-result">
  <div class="links_main links_deep result__body">
    <h2 class="result__title"><a rel="nofollow" class="result__a" href="https://www.ibm.com/topics/quantum-computing">What Is Quantum Computing? | IBM</a></h2>
  </div>
</div>
"#;

    #[test]
    fn test_extract_results() {
        let hits = extract_results(PAGE, 3);
        assert_eq!(hits.len(), 2);

        assert_eq!(hits[0].title, "Quantum computing - Wikipedia");
        assert_eq!(hits[0].url, "https://en.wikipedia.org/wiki/Quantum_computing");
        assert_eq!(
            hits[0].description,
            "A quantum computer exploits quantum mechanical phenomena & more."
        );

        assert_eq!(hits[1].url, "https://www.ibm.com/topics/quantum-computing");
        assert_eq!(hits[1].description, "");
    }

    #[test]
    fn test_extract_respects_limit_and_empty_page() {
        assert_eq!(extract_results(PAGE, 1).len(), 1);
        assert!(extract_results("<html><body>No results.</body></html>", 3).is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let client = DuckDuckGoClient::with_base_url("http://127.0.0.1:1").unwrap();
        let err = client.search("rust", 3).await.unwrap_err();
        assert!(matches!(err, ToolsError::Network(_)));
    }
}
