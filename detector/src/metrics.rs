// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Held-out evaluation of trained classifiers
//!
//! Implements:
//! - 2x2 confusion matrix over {fake, real}
//! - Accuracy, and precision/recall/F1 for the `fake` class
//!
//! Zero-denominator convention: accuracy, precision and recall are 1 when
//! their denominator is zero ("no disagreement observed").

use crate::classifier::NewsClassifier;
use crate::datasets::{Label, Record};
use crate::error::{DetectorError, Result};
use crate::preprocess::Preprocessor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

type NestedCounts = BTreeMap<Label, BTreeMap<Label, usize>>;

/// Confusion matrix with `fake` as the positive class.
///
/// Serializes as `{actual: {predicted: count}}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "NestedCounts", into = "NestedCounts")]
pub struct ConfusionMatrix {
    /// Fake predicted as fake
    pub tp: usize,
    /// Real predicted as real
    pub tn: usize,
    /// Real predicted as fake
    pub fp: usize,
    /// Fake predicted as real
    pub fn_: usize,
}

impl ConfusionMatrix {
    /// Create from predictions and ground truth labels
    pub fn from_predictions(predictions: &[Label], ground_truth: &[Label]) -> Result<Self> {
        if predictions.len() != ground_truth.len() {
            return Err(DetectorError::DimensionMismatch {
                expected: ground_truth.len(),
                found: predictions.len(),
            });
        }

        let mut matrix = Self::default();
        for (pred, truth) in predictions.iter().zip(ground_truth) {
            matrix.record(*truth, *pred);
        }
        Ok(matrix)
    }

    pub fn record(&mut self, actual: Label, predicted: Label) {
        match (actual, predicted) {
            (Label::Fake, Label::Fake) => self.tp += 1,
            (Label::Real, Label::Real) => self.tn += 1,
            (Label::Real, Label::Fake) => self.fp += 1,
            (Label::Fake, Label::Real) => self.fn_ += 1,
        }
    }

    /// Count for an (actual, predicted) cell
    pub fn count(&self, actual: Label, predicted: Label) -> usize {
        match (actual, predicted) {
            (Label::Fake, Label::Fake) => self.tp,
            (Label::Real, Label::Real) => self.tn,
            (Label::Real, Label::Fake) => self.fp,
            (Label::Fake, Label::Real) => self.fn_,
        }
    }

    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_
    }

    /// (TP + TN) / Total, 1 when empty
    pub fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.total())
    }

    /// TP / (TP + FP) for `fake`
    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    /// TP / (TP + FN) for `fake`
    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    /// TN / (TN + FP)
    pub fn specificity(&self) -> f64 {
        ratio(self.tn, self.tn + self.fp)
    }

    pub fn f1_score(&self) -> f64 {
        let precision = self.precision();
        let recall = self.recall();
        let denom = precision + recall;
        if denom == 0.0 {
            return 0.0;
        }
        2.0 * precision * recall / denom
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 1.0;
    }
    numerator as f64 / denominator as f64
}

impl From<ConfusionMatrix> for NestedCounts {
    fn from(cm: ConfusionMatrix) -> Self {
        Label::ALL
            .iter()
            .map(|actual| {
                let row = Label::ALL
                    .iter()
                    .map(|predicted| (*predicted, cm.count(*actual, *predicted)))
                    .collect();
                (*actual, row)
            })
            .collect()
    }
}

impl From<NestedCounts> for ConfusionMatrix {
    fn from(nested: NestedCounts) -> Self {
        let cell = |actual: Label, predicted: Label| {
            nested
                .get(&actual)
                .and_then(|row| row.get(&predicted))
                .copied()
                .unwrap_or(0)
        };
        Self {
            tp: cell(Label::Fake, Label::Fake),
            tn: cell(Label::Real, Label::Real),
            fp: cell(Label::Real, Label::Fake),
            fn_: cell(Label::Fake, Label::Real),
        }
    }
}

/// Metrics of one evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationMetrics {
    pub accuracy: f64,
    pub precision_fake: f64,
    pub recall_fake: f64,
    pub f1_fake: f64,
    pub specificity: f64,
    pub support: usize,
    pub confusion: ConfusionMatrix,
}

impl EvaluationMetrics {
    pub fn from_confusion_matrix(cm: ConfusionMatrix) -> Self {
        Self {
            accuracy: cm.accuracy(),
            precision_fake: cm.precision(),
            recall_fake: cm.recall(),
            f1_fake: cm.f1_score(),
            specificity: cm.specificity(),
            support: cm.total(),
            confusion: cm,
        }
    }

    pub fn from_predictions(predictions: &[Label], ground_truth: &[Label]) -> Result<Self> {
        ConfusionMatrix::from_predictions(predictions, ground_truth).map(Self::from_confusion_matrix)
    }

    /// Format as a human-readable string
    pub fn format(&self) -> String {
        let cm = &self.confusion;
        format!(
            r#"Classification Report
=====================
Accuracy:          {:.4} ({:.2}%)
Precision (fake):  {:.4}
Recall (fake):     {:.4}
F1 (fake):         {:.4}
Specificity:       {:.4}
Support:           {}

Confusion Matrix:
                  Predicted
                  Fake      Real
Actual Fake      {:>6}    {:>6}
       Real      {:>6}    {:>6}
"#,
            self.accuracy,
            self.accuracy * 100.0,
            self.precision_fake,
            self.recall_fake,
            self.f1_fake,
            self.specificity,
            self.support,
            cm.tp,
            cm.fn_,
            cm.fp,
            cm.tn,
        )
    }
}

/// Evaluate a trained classifier on already-preprocessed documents
pub fn evaluate_documents(
    classifier: &dyn NewsClassifier,
    docs: &[Vec<String>],
    labels: &[Label],
) -> Result<EvaluationMetrics> {
    if !classifier.is_trained() {
        return Err(DetectorError::ModelUnavailable);
    }

    let predictions = docs
        .iter()
        .map(|doc| classifier.classify(doc).ok_or(DetectorError::ModelUnavailable))
        .collect::<Result<Vec<Label>>>()?;

    EvaluationMetrics::from_predictions(&predictions, labels)
}

/// Preprocess a held-out split and evaluate a trained classifier on it
pub fn evaluate(
    classifier: &dyn NewsClassifier,
    preprocessor: &Preprocessor,
    test: &[&Record],
) -> Result<EvaluationMetrics> {
    let docs: Vec<Vec<String>> = test.iter().map(|r| preprocessor.preprocess(&r.text)).collect();
    let labels: Vec<Label> = test.iter().map(|r| r.label).collect();
    evaluate_documents(classifier, &docs, &labels)
}
