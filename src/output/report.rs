// Batch report: the serializable summary of one run, printed with --json.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::clustering::ClusterReport;
use crate::names::collector::CollectStats;
use crate::names::frequency::NameFrequencyTable;

#[derive(Debug, Clone, Serialize)]
pub struct NameCount {
    pub name: String,
    pub count: usize,
}

/// Everything one batch produced.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub generated_at: DateTime<Utc>,
    /// Search query, when the URLs came from a search
    pub query: Option<String>,
    pub urls: usize,
    pub stats: CollectStats,
    pub total_names: usize,
    pub top_names: Vec<NameCount>,
    pub clusters: Option<ClusterReport>,
    /// Why clustering did not run, if it failed
    pub cluster_error: Option<String>,
}

impl BatchReport {
    pub fn new(
        query: Option<String>,
        urls: usize,
        stats: CollectStats,
        table: &NameFrequencyTable,
        top_n: usize,
        clusters: std::result::Result<ClusterReport, crate::error::ClusterError>,
    ) -> Self {
        let (clusters, cluster_error) = match clusters {
            Ok(report) => (Some(report), None),
            Err(e) => (None, Some(e.to_string())),
        };

        Self {
            generated_at: Utc::now(),
            query,
            urls,
            stats,
            total_names: table.total(),
            top_names: table
                .top_n(top_n)
                .into_iter()
                .map(|(name, count)| NameCount { name, count })
                .collect(),
            clusters,
            cluster_error,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize batch report")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClusterError;
    use crate::names::frequency::count;

    #[test]
    fn test_report_records_cluster_error() {
        let table = count(&["Regev"]);
        let report = BatchReport::new(
            None,
            1,
            CollectStats::default(),
            &table,
            5,
            Err(ClusterError::InvalidClusterCount { k: 2, distinct: 1 }),
        );
        assert!(report.clusters.is_none());
        assert!(report.cluster_error.unwrap().contains("invalid cluster count 2"));
        assert_eq!(report.top_names.len(), 1);
    }

    #[test]
    fn test_report_json_has_top_names() {
        let table = count(&["Miri Regev", "Miri Regev"]);
        let report = BatchReport::new(
            Some("Miri Regev".to_string()),
            3,
            CollectStats::default(),
            &table,
            5,
            Err(ClusterError::InvalidClusterCount { k: 2, distinct: 1 }),
        );
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["top_names"][0]["name"], "Miri Regev");
        assert_eq!(json["top_names"][0]["count"], 2);
        assert_eq!(json["query"], "Miri Regev");
    }
}
