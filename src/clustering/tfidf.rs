// TF-IDF vectorization of short documents (here: one name per document).
//
// Weighting follows the usual smoothed form:
//   tf  = raw term count in the document
//   idf = ln((1 + n) / (1 + df)) + 1
// and each row is scaled to unit L2 length. A term that appears in every
// document still keeps weight 1 * tf, so single-token names are never zeroed.

use std::collections::BTreeMap;

use serde::Serialize;

/// Dense document-term matrix. Rows follow the input documents, columns
/// follow `vocabulary` (sorted).
#[derive(Debug, Clone, Serialize)]
pub struct TfIdfMatrix {
    pub vocabulary: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl TfIdfMatrix {
    /// (documents, features), the shape of the feature matrix.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.vocabulary.len())
    }
}

/// Fits a vocabulary over a set of documents and weights each one.
#[derive(Debug, Clone)]
pub struct TfIdfVectorizer {
    /// Lower-case tokens before building the vocabulary
    pub lowercase: bool,
}

impl Default for TfIdfVectorizer {
    fn default() -> Self {
        Self { lowercase: true }
    }
}

impl TfIdfVectorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whitespace-delimited tokens of a document.
    pub fn tokenize(&self, document: &str) -> Vec<String> {
        document
            .split_whitespace()
            .map(|token| {
                if self.lowercase {
                    token.to_lowercase()
                } else {
                    token.to_string()
                }
            })
            .collect()
    }

    /// Build the vocabulary from `documents` and return their weighted rows.
    pub fn fit_transform<S: AsRef<str>>(&self, documents: &[S]) -> TfIdfMatrix {
        let tokenized: Vec<Vec<String>> = documents
            .iter()
            .map(|doc| self.tokenize(doc.as_ref()))
            .collect();

        // Document frequency per term; BTreeMap keeps the vocabulary sorted
        let mut df: BTreeMap<&str, usize> = BTreeMap::new();
        for tokens in &tokenized {
            let mut seen: Vec<&str> = tokens.iter().map(String::as_str).collect();
            seen.sort_unstable();
            seen.dedup();
            for term in seen {
                *df.entry(term).or_insert(0) += 1;
            }
        }

        let vocabulary: Vec<String> = df.keys().map(|t| t.to_string()).collect();
        let column: BTreeMap<&str, usize> = df
            .keys()
            .enumerate()
            .map(|(i, term)| (*term, i))
            .collect();

        let n_docs = tokenized.len() as f64;
        let idf: Vec<f64> = df
            .values()
            .map(|&d| ((1.0 + n_docs) / (1.0 + d as f64)).ln() + 1.0)
            .collect();

        let rows = tokenized
            .iter()
            .map(|tokens| {
                let mut row = vec![0.0_f64; vocabulary.len()];
                for token in tokens {
                    row[column[token.as_str()]] += 1.0;
                }
                for (weight, idf) in row.iter_mut().zip(&idf) {
                    *weight *= idf;
                }
                l2_normalize(&mut row);
                row
            })
            .collect();

        TfIdfMatrix { vocabulary, rows }
    }
}

/// Scale `row` to unit length. Zero rows are left as they are.
fn l2_normalize(row: &mut [f64]) {
    let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > f64::EPSILON {
        for v in row.iter_mut() {
            *v /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_is_sorted_and_lowercased() {
        let m = TfIdfVectorizer::new().fit_transform(&["Miri Regev", "Netanyahu", "miriam REGEV"]);
        assert_eq!(m.vocabulary, vec!["miri", "miriam", "netanyahu", "regev"]);
        assert_eq!(m.shape(), (3, 4));
    }

    #[test]
    fn test_rows_are_unit_length() {
        let m = TfIdfVectorizer::new().fit_transform(&["Miri Regev", "Miriam Regev", "Netanyahu"]);
        for row in &m.rows {
            let norm: f64 = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-10, "row norm was {norm}");
        }
    }

    #[test]
    fn test_shared_term_weighs_less_than_unique_term() {
        let m = TfIdfVectorizer::new().fit_transform(&["Miri Regev", "Miriam Regev", "Netanyahu"]);
        let miri = m.vocabulary.iter().position(|t| t == "miri").unwrap();
        let regev = m.vocabulary.iter().position(|t| t == "regev").unwrap();
        assert!(m.rows[0][miri] > m.rows[0][regev]);
    }

    #[test]
    fn test_empty_document_is_zero_row() {
        let m = TfIdfVectorizer::new().fit_transform(&["", "Regev"]);
        assert!(m.rows[0].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_no_documents() {
        let m = TfIdfVectorizer::new().fit_transform::<&str>(&[]);
        assert_eq!(m.shape(), (0, 0));
    }

    #[test]
    fn test_case_preserved_when_lowercase_off() {
        let v = TfIdfVectorizer { lowercase: false };
        assert_eq!(v.tokenize("Miri Regev"), vec!["Miri", "Regev"]);
    }
}
