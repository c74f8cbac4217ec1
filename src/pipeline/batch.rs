// Batch pipeline: one best-effort pass over an ordered list of page URLs.
//
// Collect names page by page, count them, then cluster the distinct
// variants. Clustering failure does not discard the counts.

use tracing::{info, warn};

use crate::clustering::kmeans::KMeans;
use crate::clustering::{cluster_report, ClusterReport};
use crate::error::ClusterError;
use crate::names::collector::{CollectStats, NameCollector};
use crate::names::frequency::{count, NameFrequencyTable};
use crate::ner::traits::EntityRecognizer;
use crate::scrape::exclusion::SiteFilter;
use crate::scrape::fetcher::PageFetcher;

/// Settings for the aggregation half of a batch.
#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub k: usize,
    pub seed: u64,
}

/// What a batch produced.
#[derive(Debug)]
pub struct BatchOutcome {
    pub names: Vec<String>,
    pub stats: CollectStats,
    pub frequencies: NameFrequencyTable,
    pub clusters: Result<ClusterReport, ClusterError>,
}

/// Run the whole pipeline over `urls`.
pub async fn run(
    urls: &[String],
    filter: &SiteFilter,
    fetcher: &dyn PageFetcher,
    recognizer: &dyn EntityRecognizer,
    settings: &BatchSettings,
) -> BatchOutcome {
    info!(urls = urls.len(), "Starting batch");

    let collected = NameCollector::new(fetcher, recognizer)
        .collect(urls, filter)
        .await;

    let frequencies = count(&collected.names);
    let clusters = cluster_report(
        &collected.names,
        &KMeans::new(settings.k).with_seed(settings.seed),
    );

    if let Err(e) = &clusters {
        warn!(error = %e, "Clustering skipped");
    }

    BatchOutcome {
        names: collected.names,
        stats: collected.stats,
        frequencies,
        clusters,
    }
}
