use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::scrape::exclusion::{SiteFilter, DEFAULT_EXCLUDED_SITES};

pub const DEFAULT_RESULTS: u32 = 50;
pub const DEFAULT_CLUSTERS: usize = 2;
pub const DEFAULT_TOP_N: usize = 20;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. CLI flags
/// override the numeric defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory containing the ONNX NER model files
    pub model_dir: PathBuf,
    /// URL substrings that are never fetched
    pub excluded_sites: Vec<String>,
    /// Search results requested per query
    pub n_results: u32,
    /// Number of name clusters
    pub k: usize,
    /// Size of the frequency report
    pub top_n: usize,
    /// k-means RNG seed
    pub seed: u64,
    /// Per-request HTTP timeout
    pub timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables. Everything has a default.
    pub fn load() -> Result<Self> {
        let model_dir = env::var("NAMESCOUT_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| crate::ner::download::default_model_dir());

        let excluded_sites = match env::var("NAMESCOUT_EXCLUDED_SITES") {
            Ok(raw) => parse_site_list(&raw),
            Err(_) => DEFAULT_EXCLUDED_SITES.iter().map(|s| s.to_string()).collect(),
        };

        Ok(Self {
            model_dir,
            excluded_sites,
            n_results: env_or("NAMESCOUT_RESULTS", DEFAULT_RESULTS)?,
            k: env_or("NAMESCOUT_CLUSTERS", DEFAULT_CLUSTERS)?,
            top_n: env_or("NAMESCOUT_TOP_N", DEFAULT_TOP_N)?,
            seed: env_or("NAMESCOUT_SEED", crate::clustering::kmeans::DEFAULT_SEED)?,
            timeout: Duration::from_secs(env_or("NAMESCOUT_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?),
        })
    }

    pub fn site_filter(&self) -> SiteFilter {
        SiteFilter::new(self.excluded_sites.iter().cloned())
    }

    /// Check that the NER model has been downloaded.
    /// Call this before any operation that runs recognition.
    pub fn require_model(&self) -> Result<()> {
        if !crate::ner::download::model_files_present(&self.model_dir) {
            anyhow::bail!(
                "NER model files not found in {}\n\
                 Run `namescout download-model` to download them.",
                self.model_dir.display()
            );
        }
        Ok(())
    }
}

/// Split a comma-separated site list, dropping blanks.
pub fn parse_site_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read and parse `key`, falling back to `default` when unset.
fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_site_list() {
        assert_eq!(
            parse_site_list("facebook, youtube ,,twitter"),
            vec!["facebook", "youtube", "twitter"]
        );
    }

    #[test]
    fn test_parse_site_list_empty() {
        assert!(parse_site_list("").is_empty());
    }

    #[test]
    fn test_env_or_default_when_unset() {
        let value: u32 = env_or("NAMESCOUT_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }
}
