// Search result scraping: turns a query into the batch's list of page URLs.
//
// Uses the plain-HTML Google results page. Result links there are wrapped in
// redirects of the form `/url?q=<target>&sa=U&...`; cached copies carry
// `webcache` in the target and are dropped.

use anyhow::{Context, Result};
use percent_encoding::percent_decode_str;
use scraper::{Html, Selector};
use tracing::{debug, info};

const SEARCH_URL: &str = "https://www.google.com/search";

/// Result counts the results page honours. Other values are accepted but
/// the page rounds them.
pub const SUPPORTED_RESULT_COUNTS: [u32; 6] = [10, 20, 30, 40, 50, 100];

/// Search for `query` and return up to `n_results` outbound result URLs,
/// in ranking order.
pub async fn search_urls(client: &reqwest::Client, query: &str, n_results: u32) -> Result<Vec<String>> {
    if !SUPPORTED_RESULT_COUNTS.contains(&n_results) {
        debug!(n_results, "Result count is not one of the page's fixed sizes");
    }

    let num = n_results.to_string();
    let response = client
        .get(SEARCH_URL)
        .query(&[("q", query), ("num", num.as_str())])
        .send()
        .await
        .with_context(|| format!("Search request failed for query: {query}"))?;

    if !response.status().is_success() {
        anyhow::bail!("Search for '{}' returned {}", query, response.status());
    }

    let html = response
        .text()
        .await
        .context("Failed to read search results body")?;

    let urls = parse_result_links(&html);
    info!(query = query, found = urls.len(), "Collected search result URLs");
    Ok(urls)
}

/// Extract result target URLs from a results page, in document order.
pub fn parse_result_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(anchors) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&anchors)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.contains("url?q=") && !href.contains("webcache"))
        .filter_map(result_target)
        .collect()
}

/// The target of a `/url?q=<target>&sa=U...` redirect link: everything
/// between `?q=` and `&sa=U`, percent-decoded. Raw `&` and `+` inside the
/// target are kept as they are.
fn result_target(href: &str) -> Option<String> {
    let (_, rest) = href.split_once("?q=")?;
    let raw = rest.split_once("&sa=U").map_or(rest, |(target, _)| target);
    let target = percent_decode_str(raw).decode_utf8_lossy().into_owned();
    (!target.is_empty()).then_some(target)
}
