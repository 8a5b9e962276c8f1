// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Real/fake news classification pipeline
//!
//! This crate provides:
//! - CSV corpus loading (ISOT-style `True.csv` / `Fake.csv`)
//! - Seeded shuffling and stratified 80/20 splitting
//! - Text preprocessing (tokenize, stop words, Snowball stemming)
//! - A rule-based heuristic scorer
//! - Naive Bayes and TF-IDF + logistic regression classifiers
//! - Model caching, held-out evaluation and rule/model blending

pub mod analysis_log;
pub mod bayes;
pub mod cache;
pub mod classifier;
pub mod datasets;
pub mod error;
pub mod logreg;
pub mod metrics;
pub mod pipeline;
pub mod preprocess;
pub mod rules;
pub mod split;
pub mod tfidf;

pub use analysis_log::AnalysisLog;
pub use bayes::BayesClassifier;
pub use cache::{CacheError, FileCache, MemoryCache, ModelCache, StoredModel};
pub use classifier::{ClassScores, ClassifierKind, ModelArtifact, NewsClassifier};
pub use datasets::{CsvCorpus, Label, NewsMetadata, Record};
pub use error::{DetectorError, Result};
pub use logreg::{LogisticRegression, TfIdfLogReg, TrainOptions};
pub use metrics::{ConfusionMatrix, EvaluationMetrics};
pub use pipeline::{
    BlendedAnalysis, DecisionSource, Detector, DetectorConfig, ModelAnalysis, ModelSelection, TrainingStatus,
    TrainingSummary,
};
pub use preprocess::Preprocessor;
pub use rules::{RedFlag, RuleAnalysis, RuleScorer};
pub use split::{stratified_split, SeededShuffler, Split};
pub use tfidf::TfIdfModel;
