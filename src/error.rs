// Typed errors for the two seams where callers branch on the failure kind.
//
// Page fetches are recovered locally (the page is skipped), clustering errors
// are surfaced to the caller. Everything else in the crate uses anyhow.

use thiserror::Error;

/// A single page could not be retrieved.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

/// Clustering was asked for an impossible number of clusters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClusterError {
    #[error("invalid cluster count {k}: must be between 1 and {distinct} (distinct names)")]
    InvalidClusterCount { k: usize, distinct: usize },
}
