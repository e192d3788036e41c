//! Hosted-index search client.

pub mod hit;

use crate::config;
use anyhow::{Context, Result};
use hit::RawHit;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Timeout for the search request.
const HTTP_TIMEOUT_SECS: u64 = 10;

/// Breadcrumb levels requested from the index.
const HIERARCHY_LEVELS: &[&str] = &["lvl0", "lvl1", "lvl2", "lvl3", "lvl4", "lvl5", "lvl6"];

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<RawHit>,
}

/// Query the docs index for `phrase`, scoped to a documentation version.
///
/// An empty phrase returns no hits without touching the network. Transport
/// and auth failures propagate untouched; the caller decides nothing is
/// worth salvaging from a failed search.
pub fn search(phrase: &str, version: &str, limit: usize) -> Result<Vec<RawHit>> {
    if phrase.is_empty() {
        return Ok(Vec::new());
    }

    let index = config::index_for(version);
    let url = format!(
        "https://{}-dsn.algolia.net/1/indexes/{}/query",
        index.app_id, index.index
    );
    debug!(phrase, version, limit, index = index.index, "search request");

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .user_agent(concat!("vuedocs/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building http client")?;

    let response = client
        .post(&url)
        .header("X-Algolia-Application-Id", index.app_id)
        .header("X-Algolia-API-Key", index.search_key)
        .json(&serde_json::json!({ "params": request_params(phrase, version, limit) }))
        .send()
        .context("querying search index")?;

    if !response.status().is_success() {
        anyhow::bail!("search index returned {}", response.status());
    }

    let parsed: SearchResponse = response.json().context("parsing search response")?;
    Ok(parsed.hits)
}

/// Build the url-encoded request parameter string.
fn request_params(phrase: &str, version: &str, limit: usize) -> String {
    let facet_filters = serde_json::json!([format!("version:v{version}")]).to_string();

    let mut retrieve: Vec<String> = HIERARCHY_LEVELS
        .iter()
        .map(|lvl| format!("hierarchy.{lvl}"))
        .collect();
    retrieve.extend(["content", "type", "url"].map(str::to_string));
    let retrieve = serde_json::json!(retrieve).to_string();

    // Snippets capped at 10 words; lvl0 is a page title and never snippeted.
    let mut snippet: Vec<String> = HIERARCHY_LEVELS[1..]
        .iter()
        .map(|lvl| format!("hierarchy.{lvl}:10"))
        .collect();
    snippet.push("content:10".to_string());
    let snippet = serde_json::json!(snippet).to_string();

    let limit = limit.to_string();
    let pairs: &[(&str, &str)] = &[
        ("query", phrase),
        ("facetFilters", &facet_filters),
        ("attributesToRetrieve", &retrieve),
        ("attributesToSnippet", &snippet),
        ("snippetEllipsisText", "..."),
        ("page", "0"),
        ("hitsPerPage", &limit),
    ];

    pairs
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_phrase_short_circuits() {
        let hits = search("", "3", 20).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn params_carry_version_facet() {
        let params = request_params("router", "2", 20);
        let facet = urlencoding::encode(r#"["version:v2"]"#).into_owned();
        assert!(params.contains(&format!("facetFilters={facet}")));
    }

    #[test]
    fn params_request_full_attribute_set() {
        let params = request_params("router", "3", 20);
        let decoded = urlencoding::decode(&params).unwrap();
        for lvl in HIERARCHY_LEVELS {
            assert!(decoded.contains(&format!("hierarchy.{lvl}")));
        }
        assert!(decoded.contains(r#""content","type","url""#));
        assert!(decoded.contains("hierarchy.lvl6:10"));
        assert!(decoded.contains("content:10"));
        assert!(!decoded.contains("hierarchy.lvl0:10"));
    }

    #[test]
    fn params_encode_phrase_and_paging() {
        let params = request_params("composition api", "3", 5);
        assert!(params.contains("query=composition%20api"));
        assert!(params.contains("page=0"));
        assert!(params.contains("hitsPerPage=5"));
        assert!(params.contains("snippetEllipsisText=..."));
    }

    #[test]
    fn response_without_hits_parses_empty() {
        let parsed: SearchResponse = serde_json::from_str(r#"{"nbHits": 0}"#).unwrap();
        assert!(parsed.hits.is_empty());
    }
}
