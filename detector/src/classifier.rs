// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Common interface of the trained classifiers

use crate::bayes::BayesClassifier;
use crate::datasets::Label;
use crate::error::Result;
use crate::logreg::{TfIdfLogReg, TrainOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Normalized per-label scores (they sum to 1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassScores(BTreeMap<Label, f64>);

impl ClassScores {
    /// Softmax over per-label log scores
    pub fn from_log_scores(log_scores: &[(Label, f64)]) -> Self {
        let max = log_scores
            .iter()
            .map(|(_, s)| *s)
            .fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<(Label, f64)> = log_scores.iter().map(|(l, s)| (*l, (s - max).exp())).collect();
        let total: f64 = exps.iter().map(|(_, e)| e).sum();

        Self(exps.into_iter().map(|(l, e)| (l, e / total)).collect())
    }

    /// Scores from the probability of the `Real` class
    pub fn from_probability_real(p_real: f64) -> Self {
        Self(BTreeMap::from([(Label::Fake, 1.0 - p_real), (Label::Real, p_real)]))
    }

    pub fn get(&self, label: Label) -> f64 {
        self.0.get(&label).copied().unwrap_or(0.0)
    }

    pub fn probability_fake(&self) -> f64 {
        self.get(Label::Fake)
    }

    /// Highest-scoring label; ties go to the earlier label (`Fake`)
    pub fn best(&self) -> Label {
        let mut best = Label::Fake;
        let mut best_score = f64::NEG_INFINITY;
        for label in Label::ALL {
            let score = self.get(label);
            if score > best_score {
                best = label;
                best_score = score;
            }
        }
        best
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Label, &f64)> {
        self.0.iter()
    }
}

/// Trait for every trained text classifier
pub trait NewsClassifier: Send + Sync {
    /// Short model name
    fn name(&self) -> &str;

    fn is_trained(&self) -> bool;

    /// Per-label scores for a preprocessed document, `None` when untrained
    fn class_scores(&self, tokens: &[String]) -> Option<ClassScores>;

    /// Predicted label for a preprocessed document, `None` when untrained
    fn classify(&self, tokens: &[String]) -> Option<Label> {
        self.class_scores(tokens).map(|scores| scores.best())
    }
}

/// Which statistical classifier the pipeline trains
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassifierKind {
    #[default]
    Bayes,
    TfidfLogreg,
}

impl ClassifierKind {
    pub const ALL: [ClassifierKind; 2] = [ClassifierKind::Bayes, ClassifierKind::TfidfLogreg];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassifierKind::Bayes => "bayes",
            ClassifierKind::TfidfLogreg => "tfidf-logreg",
        }
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassifierKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "bayes" => Ok(ClassifierKind::Bayes),
            "tfidf-logreg" | "tfidf" => Ok(ClassifierKind::TfidfLogreg),
            other => anyhow::bail!("unknown classifier '{}'", other),
        }
    }
}

/// A trained classifier in persistable form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ModelArtifact {
    Bayes(BayesClassifier),
    TfidfLogreg(TfIdfLogReg),
}

impl ModelArtifact {
    /// Train a fresh classifier of `kind` on preprocessed documents
    pub fn train(kind: ClassifierKind, docs: &[Vec<String>], labels: &[Label], options: &TrainOptions) -> Result<Self> {
        match kind {
            ClassifierKind::Bayes => {
                let mut bayes = BayesClassifier::new();
                bayes.train(docs, labels)?;
                Ok(ModelArtifact::Bayes(bayes))
            }
            ClassifierKind::TfidfLogreg => TfIdfLogReg::train(docs, labels, options).map(ModelArtifact::TfidfLogreg),
        }
    }

    pub fn kind(&self) -> ClassifierKind {
        match self {
            ModelArtifact::Bayes(_) => ClassifierKind::Bayes,
            ModelArtifact::TfidfLogreg(_) => ClassifierKind::TfidfLogreg,
        }
    }

    fn inner(&self) -> &dyn NewsClassifier {
        match self {
            ModelArtifact::Bayes(model) => model,
            ModelArtifact::TfidfLogreg(model) => model,
        }
    }
}

impl NewsClassifier for ModelArtifact {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn is_trained(&self) -> bool {
        self.inner().is_trained()
    }

    fn class_scores(&self, tokens: &[String]) -> Option<ClassScores> {
        self.inner().class_scores(tokens)
    }
}
