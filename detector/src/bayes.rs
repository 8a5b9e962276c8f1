// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Bag-of-words naive Bayes over stem presence

use crate::classifier::{ClassScores, NewsClassifier};
use crate::datasets::Label;
use crate::error::{DetectorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Naive Bayes classifier with Laplace smoothing.
///
/// For each label it keeps the number of training documents and, per stem,
/// the number of those documents that contain the stem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BayesClassifier {
    /// Training documents per label
    doc_counts: BTreeMap<Label, usize>,
    /// Per label: stem -> documents containing it
    term_counts: BTreeMap<Label, BTreeMap<String, usize>>,
}

impl BayesClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Train from preprocessed documents, replacing any previous state.
    ///
    /// An empty training set leaves the classifier untrained.
    pub fn train(&mut self, docs: &[Vec<String>], labels: &[Label]) -> Result<()> {
        if docs.len() != labels.len() {
            return Err(DetectorError::DimensionMismatch {
                expected: docs.len(),
                found: labels.len(),
            });
        }

        self.doc_counts.clear();
        self.term_counts.clear();

        if docs.is_empty() {
            tracing::warn!("Bayes classifier received no training documents");
            return Ok(());
        }

        for (doc, label) in docs.iter().zip(labels) {
            *self.doc_counts.entry(*label).or_insert(0) += 1;

            let counts = self.term_counts.entry(*label).or_default();
            let unique: BTreeSet<&String> = doc.iter().collect();
            for term in unique {
                *counts.entry(term.clone()).or_insert(0) += 1;
            }
        }

        tracing::debug!(
            "Bayes trained: docs={:?}, vocabulary={}",
            self.doc_counts,
            self.vocabulary_size()
        );

        Ok(())
    }

    pub fn total_docs(&self) -> usize {
        self.doc_counts.values().sum()
    }

    /// Number of distinct stems seen in training
    pub fn vocabulary_size(&self) -> usize {
        self.term_counts
            .values()
            .flat_map(|counts| counts.keys())
            .collect::<BTreeSet<_>>()
            .len()
    }

    fn is_known(&self, term: &str) -> bool {
        self.term_counts.values().any(|counts| counts.contains_key(term))
    }

    /// Unnormalized log score of each label
    pub fn log_scores(&self, tokens: &[String]) -> Vec<(Label, f64)> {
        let total = self.total_docs() as f64;
        let unique: BTreeSet<&String> = tokens.iter().filter(|t| self.is_known(t)).collect();

        Label::ALL
            .iter()
            .map(|label| {
                let docs = self.doc_counts.get(label).copied().unwrap_or(0) as f64;
                // Smoothed prior so a label absent from training is not -inf
                let mut score = ((docs + 1.0) / (total + Label::ALL.len() as f64)).ln();
                let counts = self.term_counts.get(label);
                for term in &unique {
                    let n = counts.and_then(|c| c.get(*term)).copied().unwrap_or(0) as f64;
                    score += ((n + 1.0) / (docs + 2.0)).ln();
                }
                (*label, score)
            })
            .collect()
    }
}

impl NewsClassifier for BayesClassifier {
    fn name(&self) -> &str {
        "Bayes"
    }

    fn is_trained(&self) -> bool {
        self.total_docs() > 0
    }

    fn class_scores(&self, tokens: &[String]) -> Option<ClassScores> {
        if !self.is_trained() {
            return None;
        }
        Some(ClassScores::from_log_scores(&self.log_scores(tokens)))
    }
}
