// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! TF-IDF vectorization over a frozen vocabulary
//!
//! `fit` builds the vocabulary and smoothed idf table from the training
//! documents; `transform` maps a document to a dense vector with one entry
//! per vocabulary term. Terms outside the vocabulary are dropped.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Term -> stable index, frozen once fit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    terms: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

impl From<Vec<String>> for Vocabulary {
    fn from(terms: Vec<String>) -> Self {
        let mut index = HashMap::with_capacity(terms.len());
        let mut kept = Vec::with_capacity(terms.len());
        for term in terms {
            if !index.contains_key(&term) {
                index.insert(term.clone(), kept.len());
                kept.push(term);
            }
        }
        Self { terms: kept, index }
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocabulary: Vocabulary) -> Self {
        vocabulary.terms
    }
}

/// Smoothed inverse document frequency: ln((N+1)/(df+1)) + 1
pub fn smoothed_idf(n_docs: usize, df: usize) -> f64 {
    ((n_docs as f64 + 1.0) / (df as f64 + 1.0)).ln() + 1.0
}

/// Fitted TF-IDF state: vocabulary, document frequencies and idf weights
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TfIdfModel {
    pub vocabulary: Vocabulary,
    /// Documents containing each vocabulary term, by index
    pub document_frequency: Vec<usize>,
    /// idf weight of each vocabulary term, by index
    pub idf: Vec<f64>,
    /// Number of documents the model was fit on
    pub n_docs: usize,
}

impl TfIdfModel {
    /// Build vocabulary and idf table from training documents.
    /// Vocabulary order is lexicographic so fitting is reproducible.
    pub fn fit(docs: &[Vec<String>]) -> Self {
        let mut df: BTreeMap<&str, usize> = BTreeMap::new();
        for doc in docs {
            let unique: BTreeSet<&str> = doc.iter().map(String::as_str).collect();
            for term in unique {
                *df.entry(term).or_insert(0) += 1;
            }
        }

        let n_docs = docs.len();
        let terms: Vec<String> = df.keys().map(|t| t.to_string()).collect();
        let document_frequency: Vec<usize> = df.values().copied().collect();
        let idf = document_frequency.iter().map(|d| smoothed_idf(n_docs, *d)).collect();

        tracing::debug!("TF-IDF fit: documents={}, vocabulary={}", n_docs, terms.len());

        Self {
            vocabulary: Vocabulary::from(terms),
            document_frequency,
            idf,
            n_docs,
        }
    }

    /// Vector dimension
    pub fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    /// Sparse in-vocabulary term counts of a document, keyed by index
    fn term_counts(&self, doc: &[String]) -> BTreeMap<usize, usize> {
        let mut counts = BTreeMap::new();
        for term in doc {
            if let Some(idx) = self.vocabulary.index_of(term) {
                *counts.entry(idx).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Dense TF-IDF vector of one document, `tf = count / maxCount`
    pub fn transform(&self, doc: &[String]) -> Vec<f64> {
        let counts = self.term_counts(doc);
        let mut vector = vec![0.0; self.dimension()];

        let max_count = counts.values().copied().max().unwrap_or(1).max(1) as f64;
        for (idx, count) in counts {
            vector[idx] = (count as f64 / max_count) * self.idf[idx];
        }

        vector
    }

    pub fn transform_all(&self, docs: &[Vec<String>]) -> Vec<Vec<f64>> {
        docs.iter().map(|doc| self.transform(doc)).collect()
    }

    /// Internal consistency of restored state
    pub fn is_consistent(&self) -> bool {
        let n = self.vocabulary.len();
        self.idf.len() == n && self.document_frequency.len() == n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Vec<String> {
        text.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_fit_vocabulary_sorted_and_stable() {
        let docs = vec![doc("zebra apple"), doc("mango apple")];
        let model = TfIdfModel::fit(&docs);

        assert_eq!(model.vocabulary.terms(), &["apple", "mango", "zebra"]);
        assert_eq!(model.vocabulary.index_of("mango"), Some(1));
        assert_eq!(model.document_frequency, vec![2, 1, 1]);
        assert_eq!(TfIdfModel::fit(&docs), model);
    }

    #[test]
    fn test_idf_is_one_for_ubiquitous_terms() {
        let docs = vec![doc("alpha beta beta"); 7];
        let model = TfIdfModel::fit(&docs);

        for idf in &model.idf {
            assert!((idf - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_idf_smoothing() {
        let docs = vec![doc("common rare"), doc("common"), doc("common")];
        let model = TfIdfModel::fit(&docs);
        let rare = model.vocabulary.index_of("rare").unwrap();
        let common = model.vocabulary.index_of("common").unwrap();

        assert!((model.idf[rare] - ((4.0f64 / 2.0).ln() + 1.0)).abs() < 1e-12);
        assert!((model.idf[common] - 1.0).abs() < 1e-12);
        assert!(model.idf[rare] > model.idf[common]);
    }

    #[test]
    fn test_transform_tf_normalized_by_max_count() {
        let docs = vec![doc("a b"), doc("b c")];
        let model = TfIdfModel::fit(&docs);
        let vector = model.transform(&doc("b b a"));

        let a = model.vocabulary.index_of("a").unwrap();
        let b = model.vocabulary.index_of("b").unwrap();
        let c = model.vocabulary.index_of("c").unwrap();

        assert_eq!(vector.len(), 3);
        assert!((vector[b] - model.idf[b]).abs() < 1e-12);
        assert!((vector[a] - 0.5 * model.idf[a]).abs() < 1e-12);
        assert_eq!(vector[c], 0.0);
    }

    #[test]
    fn test_unknown_terms_dropped() {
        let model = TfIdfModel::fit(&[doc("known words only")]);
        let before = model.clone();

        let vector = model.transform(&doc("brand new vocabulary"));
        assert_eq!(vector.len(), model.dimension());
        assert!(vector.iter().all(|v| *v == 0.0));

        // Unknown terms do not dilute tf of known ones
        let mixed = model.transform(&doc("known unseen unseen unseen"));
        let known = model.vocabulary.index_of("known").unwrap();
        assert!((mixed[known] - model.idf[known]).abs() < 1e-12);

        assert_eq!(model, before);
    }

    #[test]
    fn test_vocabulary_serializes_as_term_list() {
        let model = TfIdfModel::fit(&[doc("b a")]);
        let json = serde_json::to_value(&model.vocabulary).unwrap();
        assert_eq!(json, serde_json::json!(["a", "b"]));

        let restored: TfIdfModel = serde_json::from_str(&serde_json::to_string(&model).unwrap()).unwrap();
        assert_eq!(restored.vocabulary.index_of("b"), Some(1));
        assert!(restored.is_consistent());
    }

    #[test]
    fn test_empty_fit() {
        let model = TfIdfModel::fit(&[]);
        assert_eq!(model.dimension(), 0);
        assert!(model.transform(&doc("anything")).is_empty());
    }
}
