// Name-variant clustering: TF-IDF vectors over distinct names, grouped with
// seeded k-means.
//
// Clusters carry no semantic guarantee. The only contract is that k-means
// ran to convergence on the TF-IDF vectors; whether a cluster holds the
// variants of one person is for the reader of the report to judge.

pub mod kmeans;
pub mod tfidf;

use serde::Serialize;
use tracing::info;

use crate::error::ClusterError;
use kmeans::KMeans;
use tfidf::TfIdfVectorizer;

/// Distinct name to cluster id, in the order names were first seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterAssignment {
    pub k: usize,
    pub assignments: Vec<(String, usize)>,
}

impl ClusterAssignment {
    /// Cluster id of `name`, if it was part of the input.
    pub fn get(&self, name: &str) -> Option<usize> {
        self.assignments
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Number of different ids actually used.
    pub fn distinct_clusters(&self) -> usize {
        let mut ids: Vec<usize> = self.assignments.iter().map(|(_, id)| *id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    /// Names in cluster `id`, in first-seen order.
    pub fn members(&self, id: usize) -> Vec<&str> {
        self.assignments
            .iter()
            .filter(|(_, c)| *c == id)
            .map(|(n, _)| n.as_str())
            .collect()
    }
}

/// Everything the clustering step produces for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterReport {
    pub assignment: ClusterAssignment,
    /// Sorted TF-IDF feature names
    pub vocabulary: Vec<String>,
    /// (distinct names, features)
    pub shape: (usize, usize),
    pub inertia: f64,
}

/// Deduplicate `names`, keeping first-seen order.
pub fn distinct_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    names
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

/// Cluster the distinct names in `names` into `k` groups with the default
/// seed.
pub fn cluster<S: AsRef<str>>(names: &[S], k: usize) -> Result<ClusterAssignment, ClusterError> {
    cluster_report(names, &KMeans::new(k)).map(|report| report.assignment)
}

/// Cluster with explicit k-means settings and keep the vectorizer details.
pub fn cluster_report<S: AsRef<str>>(
    names: &[S],
    kmeans: &KMeans,
) -> Result<ClusterReport, ClusterError> {
    let distinct = distinct_names(names);
    if kmeans.k == 0 || kmeans.k > distinct.len() {
        return Err(ClusterError::InvalidClusterCount {
            k: kmeans.k,
            distinct: distinct.len(),
        });
    }

    let matrix = TfIdfVectorizer::new().fit_transform(&distinct);
    let shape = matrix.shape();
    let fit = kmeans.fit(&matrix.rows)?;

    info!(
        names = distinct.len(),
        features = shape.1,
        k = kmeans.k,
        inertia = fit.inertia,
        "Clustered name variants"
    );

    let assignments = distinct.into_iter().zip(fit.labels).collect();

    Ok(ClusterReport {
        assignment: ClusterAssignment {
            k: kmeans.k,
            assignments,
        },
        vocabulary: matrix.vocabulary,
        shape,
        inertia: fit.inertia,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_names_keeps_first_seen_order() {
        let names = ["B", "A", "B", "C", "A"];
        assert_eq!(distinct_names(&names), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_members_and_get() {
        let assignment = ClusterAssignment {
            k: 2,
            assignments: vec![
                ("Miri Regev".to_string(), 0),
                ("Netanyahu".to_string(), 1),
                ("Miriam Regev".to_string(), 0),
            ],
        };
        assert_eq!(assignment.members(0), vec!["Miri Regev", "Miriam Regev"]);
        assert_eq!(assignment.get("Netanyahu"), Some(1));
        assert_eq!(assignment.get("Bibi"), None);
        assert_eq!(assignment.distinct_clusters(), 2);
    }
}
