// Name collector: runs every page through fetch -> text -> NER and keeps the
// PERSON spans.
//
// Pages are processed one after another in input order. A page that fails to
// fetch or recognize is logged and skipped; it never aborts the batch.

use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

use crate::ner::traits::EntityRecognizer;
use crate::scrape::exclusion::SiteFilter;
use crate::scrape::fetcher::PageFetcher;
use crate::scrape::text::extract_text;

/// Per-batch bookkeeping for the report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectStats {
    pub processed: usize,
    pub excluded: usize,
    pub failed: usize,
}

/// Names found across a batch, in URL order, plus what happened to each URL.
#[derive(Debug, Clone, Default)]
pub struct Collected {
    pub names: Vec<String>,
    pub stats: CollectStats,
}

/// Collects candidate person names from pages.
///
/// Both collaborators are injected so tests can swap in stubs for the
/// network and the model.
pub struct NameCollector<'a> {
    fetcher: &'a dyn PageFetcher,
    recognizer: &'a dyn EntityRecognizer,
}

impl<'a> NameCollector<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, recognizer: &'a dyn EntityRecognizer) -> Self {
        Self {
            fetcher,
            recognizer,
        }
    }

    /// Collect PERSON names from every non-excluded URL, in order.
    pub async fn collect(&self, urls: &[String], filter: &SiteFilter) -> Collected {
        let mut collected = Collected::default();

        for url in urls {
            if filter.is_excluded(url) {
                info!(url = %url, "Skipping excluded page");
                collected.stats.excluded += 1;
                continue;
            }

            info!(url = %url, "Getting names from page");
            match self.names_from_page(url).await {
                Ok(names) => {
                    collected.stats.processed += 1;
                    collected.names.extend(names);
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "Failed to process page, skipping");
                    collected.stats.failed += 1;
                }
            }
        }

        info!(
            names = collected.names.len(),
            processed = collected.stats.processed,
            excluded = collected.stats.excluded,
            failed = collected.stats.failed,
            "Name collection finished"
        );

        collected
    }

    /// All cleaned PERSON names on a single page, in text order.
    pub async fn names_from_page(&self, url: &str) -> Result<Vec<String>> {
        let html = self.fetcher.fetch(url).await?;
        let text = extract_text(&html);
        let spans = self.recognizer.recognize(&text).await?;

        Ok(spans
            .into_iter()
            .filter(|span| span.is_person())
            .map(|span| clean_name(&span.text))
            .collect())
    }
}

/// Trim surrounding whitespace, tabs and newlines from a candidate name.
pub fn clean_name(raw: &str) -> String {
    raw.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_name_trims_control_whitespace() {
        assert_eq!(clean_name("\t Miri Regev \n"), "Miri Regev");
    }

    #[test]
    fn test_clean_name_keeps_inner_spacing() {
        assert_eq!(clean_name("Miri  Regev"), "Miri  Regev");
    }

    #[test]
    fn test_clean_name_all_whitespace() {
        assert_eq!(clean_name("\n\t\r "), "");
    }
}
