// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Binary logistic regression trained by full-batch gradient descent,
//! and its pairing with a TF-IDF vectorizer.

use crate::classifier::{ClassScores, NewsClassifier};
use crate::datasets::Label;
use crate::error::{DetectorError, Result};
use crate::tfidf::TfIdfModel;
use serde::{Deserialize, Serialize};

/// Probability above which class 1 is predicted
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Gradient descent settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainOptions {
    pub steps: usize,
    pub learning_rate: f64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            steps: 1500,
            learning_rate: 5e-3,
        }
    }
}

pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Weight vector with the bias at index 0
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    weights: Vec<f64>,
}

impl LogisticRegression {
    pub fn from_weights(weights: Vec<f64>) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Number of input features (excluding the bias)
    pub fn dimension(&self) -> usize {
        self.weights.len().saturating_sub(1)
    }

    /// w·x with an implicit leading 1 for the bias
    fn decision(&self, features: &[f64]) -> f64 {
        self.weights[0]
            + self.weights[1..]
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }

    /// Train from zero weights for exactly `options.steps` steps.
    ///
    /// `labels` are class indices in {0, 1}. No regularization and no
    /// convergence check: identical inputs give identical weights.
    pub fn train(features: &[Vec<f64>], labels: &[u8], options: &TrainOptions) -> Result<Self> {
        if features.len() != labels.len() {
            return Err(DetectorError::DimensionMismatch {
                expected: features.len(),
                found: labels.len(),
            });
        }
        if features.is_empty() {
            return Err(DetectorError::EmptyDataset);
        }

        let dim = features[0].len();
        if let Some(row) = features.iter().find(|row| row.len() != dim) {
            return Err(DetectorError::DimensionMismatch {
                expected: dim,
                found: row.len(),
            });
        }

        let n = features.len() as f64;
        let mut model = Self::from_weights(vec![0.0; dim + 1]);
        let mut gradient = vec![0.0; dim + 1];

        for step in 0..options.steps {
            gradient.iter_mut().for_each(|g| *g = 0.0);

            for (row, label) in features.iter().zip(labels) {
                let error = sigmoid(model.decision(row)) - f64::from(*label);
                gradient[0] += error;
                for (g, x) in gradient[1..].iter_mut().zip(row) {
                    *g += error * x;
                }
            }

            let scale = options.learning_rate / n;
            for (w, g) in model.weights.iter_mut().zip(&gradient) {
                *w -= scale * g;
            }

            if step % 500 == 0 {
                tracing::debug!("Logistic regression step {}/{}", step, options.steps);
            }
        }

        Ok(model)
    }

    /// P(class 1) of one feature vector
    pub fn predict_one(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.dimension() || self.weights.is_empty() {
            return Err(DetectorError::DimensionMismatch {
                expected: self.dimension(),
                found: features.len(),
            });
        }
        Ok(sigmoid(self.decision(features)))
    }

    /// P(class 1) of every row
    pub fn predict_proba(&self, features: &[Vec<f64>]) -> Result<Vec<f64>> {
        features.iter().map(|row| self.predict_one(row)).collect()
    }

    /// Class indices at the 0.5 threshold
    pub fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<u8>> {
        Ok(self
            .predict_proba(features)?
            .into_iter()
            .map(|p| u8::from(p > DECISION_THRESHOLD))
            .collect())
    }
}

/// TF-IDF features fed to logistic regression; class 1 is `Real`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TfIdfLogReg {
    pub tfidf: TfIdfModel,
    pub regression: LogisticRegression,
}

impl TfIdfLogReg {
    /// Fit the vectorizer on `docs`, then train the regression on its vectors
    pub fn train(docs: &[Vec<String>], labels: &[Label], options: &TrainOptions) -> Result<Self> {
        if docs.len() != labels.len() {
            return Err(DetectorError::DimensionMismatch {
                expected: docs.len(),
                found: labels.len(),
            });
        }

        let tfidf = TfIdfModel::fit(docs);
        let features = tfidf.transform_all(docs);
        let targets: Vec<u8> = labels.iter().map(Label::class_index).collect();
        let regression = LogisticRegression::train(&features, &targets, options)?;

        tracing::debug!(
            "TF-IDF logistic regression trained: vocabulary={}, steps={}",
            tfidf.dimension(),
            options.steps
        );

        Ok(Self { tfidf, regression })
    }

    /// Weight vector length must be vocabulary size plus bias
    pub fn is_consistent(&self) -> bool {
        self.tfidf.is_consistent() && self.regression.weights().len() == self.tfidf.dimension() + 1
    }

    /// P(real) of a preprocessed document
    pub fn probability_real(&self, tokens: &[String]) -> Result<f64> {
        self.regression.predict_one(&self.tfidf.transform(tokens))
    }
}

impl NewsClassifier for TfIdfLogReg {
    fn name(&self) -> &str {
        "TF-IDF+LogReg"
    }

    fn is_trained(&self) -> bool {
        self.is_consistent() && self.tfidf.n_docs > 0
    }

    fn class_scores(&self, tokens: &[String]) -> Option<ClassScores> {
        if !self.is_trained() {
            return None;
        }
        self.probability_real(tokens).ok().map(ClassScores::from_probability_real)
    }
}
