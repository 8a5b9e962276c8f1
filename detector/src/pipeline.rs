// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Training, caching and inference pipeline
//!
//! Orchestrates:
//! - Cache lookup (primary path, then fallback)
//! - Working-set preparation and stratified splitting
//! - Classifier training and held-out evaluation
//! - Artifact persistence
//! - Rule, model and blended analysis

use crate::cache::{CacheError, ModelCache, StoredModel};
use crate::classifier::{ClassScores, ClassifierKind, ModelArtifact, NewsClassifier};
use crate::datasets::{label_distribution, Label, NewsMetadata, Record};
use crate::error::{DetectorError, Result};
use crate::logreg::TrainOptions;
use crate::metrics::{evaluate_documents, ConfusionMatrix, EvaluationMetrics};
use crate::preprocess::{render, Preprocessor};
use crate::rules::{RuleAnalysis, RuleScorer};
use crate::split::{balance, sample_per_label, stratified_split, DEFAULT_SEED};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which classifier(s) to train
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelSelection {
    #[default]
    Bayes,
    TfidfLogreg,
    /// Train every kind and keep the most accurate
    Best,
}

impl ModelSelection {
    /// Kinds trained under this selection, in tie-break order
    pub fn kinds(&self) -> Vec<ClassifierKind> {
        match self {
            ModelSelection::Bayes => vec![ClassifierKind::Bayes],
            ModelSelection::TfidfLogreg => vec![ClassifierKind::TfidfLogreg],
            ModelSelection::Best => ClassifierKind::ALL.to_vec(),
        }
    }

    /// Whether a cached artifact of `kind` satisfies this selection
    pub fn accepts(&self, kind: ClassifierKind) -> bool {
        self.kinds().contains(&kind)
    }
}

impl From<ClassifierKind> for ModelSelection {
    fn from(kind: ClassifierKind) -> Self {
        match kind {
            ClassifierKind::Bayes => ModelSelection::Bayes,
            ClassifierKind::TfidfLogreg => ModelSelection::TfidfLogreg,
        }
    }
}

impl fmt::Display for ModelSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSelection::Best => f.write_str("best"),
            ModelSelection::Bayes => f.write_str(ClassifierKind::Bayes.as_str()),
            ModelSelection::TfidfLogreg => f.write_str(ClassifierKind::TfidfLogreg.as_str()),
        }
    }
}

impl FromStr for ModelSelection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        if s.trim().eq_ignore_ascii_case("best") {
            return Ok(ModelSelection::Best);
        }
        s.parse::<ClassifierKind>().map(ModelSelection::from)
    }
}

/// Configuration for the detector pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectorConfig {
    /// Seed string for shuffling and splitting
    pub seed: String,
    /// Cap on the working set, split evenly across labels
    pub sample_size: Option<usize>,
    /// Equalize label counts before sampling
    pub balance: bool,
    /// Rule-based-only mode: no cache lookup, no training
    pub skip_training: bool,
    pub model_path: PathBuf,
    pub fallback_model_path: Option<PathBuf>,
    pub selection: ModelSelection,
    pub train_options: TrainOptions,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED.to_string(),
            sample_size: None,
            balance: false,
            skip_training: false,
            model_path: PathBuf::from("model.json"),
            fallback_model_path: Some(PathBuf::from("models").join("model.json")),
            selection: ModelSelection::default(),
            train_options: TrainOptions::default(),
        }
    }
}

impl DetectorConfig {
    /// Records used for training: balanced first, then capped
    pub fn working_set<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        let mut working: Vec<&Record> = records.iter().collect();
        if self.balance {
            working = balance(&working);
        }
        if let Some(cap) = self.sample_size {
            working = sample_per_label(&working, cap);
        }
        working
    }

    /// Primary then fallback, without duplicates
    fn cache_paths(&self) -> Vec<&Path> {
        let mut paths = vec![self.model_path.as_path()];
        if let Some(fallback) = self.fallback_model_path.as_deref() {
            if fallback != self.model_path {
                paths.push(fallback);
            }
        }
        paths
    }
}

/// Held-out score of one candidate classifier
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateScore {
    pub classifier: ClassifierKind,
    pub accuracy: f64,
}

/// Evaluation of a freshly trained model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingMetrics {
    /// Records returned by the loader
    pub size: usize,
    /// Records left after balancing and sampling
    pub working_size: usize,
    pub train_size: usize,
    pub test_size: usize,
    pub classifier: ClassifierKind,
    #[serde(flatten)]
    pub metrics: EvaluationMetrics,
    /// Every candidate when more than one kind was trained
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<CandidateScore>,
}

impl TrainingMetrics {
    pub fn confusion(&self) -> &ConfusionMatrix {
        &self.metrics.confusion
    }
}

/// How the current model (if any) came to be
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum TrainingStatus {
    Evaluated(TrainingMetrics),
    LoadedFromCache { classifier: ClassifierKind },
    NoTrain,
    EmptyDataset,
}

/// Training diagnostics attached to every model analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingSummary {
    pub trained: bool,
    #[serde(flatten)]
    pub status: TrainingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_to: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_error: Option<String>,
}

impl TrainingSummary {
    fn untrained(status: TrainingStatus) -> Self {
        Self {
            trained: false,
            status,
            saved_to: None,
            save_error: None,
        }
    }
}

/// Verdict of the trained classifier
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelAnalysis {
    pub predicted_category: Label,
    pub probability_fake: f64,
    pub scores: ClassScores,
    pub classifier: ClassifierKind,
    /// Rendered stem stream the classifier saw
    pub tokens: String,
    pub training: TrainingSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionSource {
    Model,
    Rules,
}

/// Rule and model verdicts side by side
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlendedAnalysis {
    pub predicted_category: Label,
    pub decided_by: DecisionSource,
    /// Whether the rules agree with the model; absent without a model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agreement: Option<bool>,
    pub rules: RuleAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelAnalysis>,
}

/// Trained detector, immutable after initialization
pub struct Detector {
    config: DetectorConfig,
    preprocessor: Preprocessor,
    rules: RuleScorer,
    model: Option<ModelArtifact>,
    summary: TrainingSummary,
}

impl Detector {
    /// Load a cached model or train a fresh one.
    ///
    /// With `skip_training` set neither the cache nor `loader` is touched and
    /// only rule analysis is available. Otherwise `loader` runs only when no
    /// usable cached model exists. A failing loader is treated as an empty
    /// dataset.
    pub fn initialize<F>(config: DetectorConfig, cache: &dyn ModelCache, loader: F) -> Result<Self>
    where
        F: FnOnce() -> anyhow::Result<Vec<Record>>,
    {
        let preprocessor = Preprocessor::new();
        let rules = RuleScorer::new();

        if config.skip_training {
            tracing::info!("Training disabled; rules only");
            return Ok(Self {
                config,
                preprocessor,
                rules,
                model: None,
                summary: TrainingSummary::untrained(TrainingStatus::NoTrain),
            });
        }

        if let Some(stored) = load_cached(&config, cache) {
            let classifier = stored.model.kind();
            let summary = TrainingSummary {
                trained: true,
                status: TrainingStatus::LoadedFromCache { classifier },
                saved_to: None,
                save_error: None,
            };
            return Ok(Self {
                config,
                preprocessor,
                rules,
                model: Some(stored.model),
                summary,
            });
        }

        let records = loader().unwrap_or_else(|e| {
            tracing::warn!("Failed to load training records: {:#}", e);
            Vec::new()
        });

        let (model, summary) = match train_and_evaluate(&config, &preprocessor, &records)? {
            Some((artifact, metrics)) => {
                let (saved_to, save_error) = persist(&config, cache, &artifact);
                let summary = TrainingSummary {
                    trained: true,
                    status: TrainingStatus::Evaluated(metrics),
                    saved_to,
                    save_error,
                };
                (Some(artifact), summary)
            }
            None => (None, TrainingSummary::untrained(TrainingStatus::EmptyDataset)),
        };

        Ok(Self {
            config,
            preprocessor,
            rules,
            model,
            summary,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn model(&self) -> Option<&ModelArtifact> {
        self.model.as_ref()
    }

    pub fn training_summary(&self) -> &TrainingSummary {
        &self.summary
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    pub fn analyze_with_rules(&self, text: &str, metadata: Option<&NewsMetadata>) -> Result<RuleAnalysis> {
        require_text(text)?;
        Ok(self.rules.score(text, metadata))
    }

    pub fn analyze_with_model(&self, text: &str) -> Result<ModelAnalysis> {
        require_text(text)?;
        let model = self.model.as_ref().ok_or(DetectorError::ModelUnavailable)?;

        let tokens = self.preprocessor.preprocess(text);
        let scores = model.class_scores(&tokens).ok_or(DetectorError::ModelUnavailable)?;

        Ok(ModelAnalysis {
            predicted_category: scores.best(),
            probability_fake: scores.probability_fake(),
            scores,
            classifier: model.kind(),
            tokens: render(&tokens),
            training: self.summary.clone(),
        })
    }

    /// Model verdict when a model exists, rule verdict otherwise
    pub fn analyze_blended(&self, text: &str, metadata: Option<&NewsMetadata>) -> Result<BlendedAnalysis> {
        let rules = self.analyze_with_rules(text, metadata)?;
        let model = match self.analyze_with_model(text) {
            Ok(analysis) => Some(analysis),
            Err(DetectorError::ModelUnavailable) => None,
            Err(e) => return Err(e),
        };

        let blended = match &model {
            Some(m) => BlendedAnalysis {
                predicted_category: m.predicted_category,
                decided_by: DecisionSource::Model,
                agreement: Some(m.predicted_category == rules.predicted_category),
                rules,
                model,
            },
            None => BlendedAnalysis {
                predicted_category: rules.predicted_category,
                decided_by: DecisionSource::Rules,
                agreement: None,
                rules,
                model: None,
            },
        };
        Ok(blended)
    }
}

fn require_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(DetectorError::EmptyText);
    }
    Ok(())
}

/// First usable artifact over the configured paths
fn load_cached(config: &DetectorConfig, cache: &dyn ModelCache) -> Option<StoredModel> {
    for path in config.cache_paths() {
        match cache.load(path) {
            Ok(stored) if config.selection.accepts(stored.model.kind()) => {
                tracing::info!("Loaded {} model from {}", stored.model.kind(), path.display());
                return Some(stored);
            }
            Ok(stored) => {
                tracing::info!(
                    "Ignoring cached {} model at {}: selection is {}",
                    stored.model.kind(),
                    path.display(),
                    config.selection
                );
            }
            Err(CacheError::NotFound(_)) => {
                tracing::debug!("No cached model at {}", path.display());
            }
            Err(e) => {
                tracing::warn!("Unusable cached model at {}: {}", path.display(), e);
            }
        }
    }
    None
}

/// Save to the primary path, then once to the fallback
fn persist(config: &DetectorConfig, cache: &dyn ModelCache, artifact: &ModelArtifact) -> (Option<PathBuf>, Option<String>) {
    let stored = StoredModel::new(artifact.clone());

    let primary_err = match cache.save(&stored, &config.model_path) {
        Ok(()) => return (Some(config.model_path.clone()), None),
        Err(e) => e,
    };
    tracing::warn!("Failed to save model to {}: {}", config.model_path.display(), primary_err);

    let Some(fallback) = config.fallback_model_path.as_ref().filter(|p| **p != config.model_path) else {
        return (None, Some(primary_err.to_string()));
    };

    match cache.save(&stored, fallback) {
        Ok(()) => (Some(fallback.clone()), None),
        Err(e) => {
            tracing::warn!("Failed to save model to fallback {}: {}", fallback.display(), e);
            (None, Some(format!("{}; fallback: {}", primary_err, e)))
        }
    }
}

/// Prepare the working set, split, train every selected kind and keep the best.
/// `None` when there is nothing to train on.
fn train_and_evaluate(
    config: &DetectorConfig,
    preprocessor: &Preprocessor,
    records: &[Record],
) -> Result<Option<(ModelArtifact, TrainingMetrics)>> {
    let working = config.working_set(records);
    if working.is_empty() {
        tracing::warn!("No training records available");
        return Ok(None);
    }

    tracing::info!(
        "Working set: {} records {:?}",
        working.len(),
        label_distribution(working.iter().copied())
    );

    let split = stratified_split(&working, &config.seed);
    let train_docs: Vec<Vec<String>> = split.train.iter().map(|r| preprocessor.preprocess(&r.text)).collect();
    let train_labels: Vec<Label> = split.train.iter().map(|r| r.label).collect();
    let test_docs: Vec<Vec<String>> = split.test.iter().map(|r| preprocessor.preprocess(&r.text)).collect();
    let test_labels: Vec<Label> = split.test.iter().map(|r| r.label).collect();

    tracing::info!("Split: train={}, test={}", split.train.len(), split.test.len());

    let mut best: Option<(ModelArtifact, EvaluationMetrics)> = None;
    let mut candidates = Vec::new();

    for kind in config.selection.kinds() {
        let artifact = ModelArtifact::train(kind, &train_docs, &train_labels, &config.train_options)?;
        let metrics = evaluate_documents(&artifact, &test_docs, &test_labels)?;

        tracing::info!(
            "  {} - Accuracy: {:.4}, Precision(fake): {:.4}, Recall(fake): {:.4}",
            artifact.name(),
            metrics.accuracy,
            metrics.precision_fake,
            metrics.recall_fake
        );

        candidates.push(CandidateScore {
            classifier: kind,
            accuracy: metrics.accuracy,
        });

        let better = best.as_ref().map_or(true, |(_, current)| metrics.accuracy > current.accuracy);
        if better {
            best = Some((artifact, metrics));
        }
    }

    let Some((artifact, metrics)) = best else {
        return Ok(None);
    };

    if candidates.len() < 2 {
        candidates.clear();
    }

    let summary = TrainingMetrics {
        size: records.len(),
        working_size: split.total(),
        train_size: split.train.len(),
        test_size: split.test.len(),
        classifier: artifact.kind(),
        metrics,
        candidates,
    };

    Ok(Some((artifact, summary)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{FileCache, MemoryCache};

    fn corpus() -> Vec<Record> {
        let fake = [
            "SHOCKING miracle cure the government is hiding from you",
            "Secret conspiracy exposed: celebrities are lizards",
            "You won't believe this miracle diet doctors hate",
            "Insane conspiracy theory about secret moon base goes viral",
            "Miracle pill cures everything, shocking secret revealed",
            "Celebrity secret conspiracy shocking truth exposed",
            "Unbelievable miracle water cures disease overnight",
            "Secret lizard conspiracy controls the banks",
            "Shocking hidden miracle the elites conceal",
            "Viral conspiracy claims secret cure suppressed",
        ];
        let real = [
            "Senate committee approves annual budget after debate",
            "Parliament passes infrastructure budget with bipartisan vote",
            "Central bank holds interest rates steady, officials said",
            "Senate votes on budget amendment for public schools",
            "Committee hearing examines federal budget proposal",
            "Officials report quarterly economic growth figures",
            "Lawmakers debate budget committee recommendations",
            "Senate confirms nominee after committee hearing",
            "Government publishes annual budget report for parliament",
            "Finance ministers meet to discuss trade and budget policy",
        ];
        fake.iter()
            .map(|t| Record::new(*t, Label::Fake))
            .chain(real.iter().map(|t| Record::new(*t, Label::Real)))
            .collect()
    }

    fn loader() -> anyhow::Result<Vec<Record>> {
        Ok(corpus())
    }

    fn no_loader() -> anyhow::Result<Vec<Record>> {
        panic!("loader must not run")
    }

    const PROBES: [&str; 3] = [
        "Secret miracle cure exposed",
        "Senate committee passes the budget",
        "Officials discuss conspiracy budget",
    ];

    #[test]
    fn test_trains_and_evaluates() {
        let cache = MemoryCache::new();
        let detector = Detector::initialize(DetectorConfig::default(), &cache, loader).unwrap();
        let summary = detector.training_summary();

        assert!(summary.trained);
        assert_eq!(summary.saved_to, Some(PathBuf::from("model.json")));
        assert!(summary.save_error.is_none());
        assert!(cache.contains(Path::new("model.json")));

        match &summary.status {
            TrainingStatus::Evaluated(metrics) => {
                assert_eq!(metrics.size, 20);
                assert_eq!(metrics.working_size, 20);
                assert_eq!(metrics.train_size, 16);
                assert_eq!(metrics.test_size, 4);
                assert_eq!(metrics.classifier, ClassifierKind::Bayes);
                assert_eq!(metrics.confusion().total(), 4);
                assert!(metrics.candidates.is_empty());
            }
            other => panic!("unexpected status {:?}", other),
        }

        let analysis = detector.analyze_with_model("Secret miracle cure conspiracy").unwrap();
        assert_eq!(analysis.predicted_category, Label::Fake);
        assert_eq!(analysis.classifier, ClassifierKind::Bayes);
        assert!(analysis.tokens.contains("miracl"));
    }

    #[test]
    fn test_memory_cache_round_trip_identical_predictions() {
        let cache = MemoryCache::new();
        let trained = Detector::initialize(DetectorConfig::default(), &cache, loader).unwrap();
        let restored = Detector::initialize(DetectorConfig::default(), &cache, no_loader).unwrap();

        assert_eq!(
            restored.training_summary().status,
            TrainingStatus::LoadedFromCache {
                classifier: ClassifierKind::Bayes
            }
        );
        for probe in PROBES {
            let a = trained.analyze_with_model(probe).unwrap();
            let b = restored.analyze_with_model(probe).unwrap();
            assert_eq!(a.scores, b.scores);
            assert_eq!(a.predicted_category, b.predicted_category);
        }
    }

    #[test]
    fn test_file_cache_round_trip_identical_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let config = DetectorConfig {
            model_path: dir.path().join("model.json"),
            fallback_model_path: None,
            selection: ModelSelection::TfidfLogreg,
            train_options: TrainOptions {
                steps: 300,
                learning_rate: 0.5,
            },
            ..DetectorConfig::default()
        };

        let trained = Detector::initialize(config.clone(), &FileCache::new(), loader).unwrap();
        assert!(config.model_path.exists());
        let restored = Detector::initialize(config, &FileCache::new(), no_loader).unwrap();

        for probe in PROBES {
            let a = trained.analyze_with_model(probe).unwrap();
            let b = restored.analyze_with_model(probe).unwrap();
            assert_eq!(a.classifier, ClassifierKind::TfidfLogreg);
            assert_eq!(a.scores, b.scores);
        }
    }

    #[test]
    fn test_skip_training_runs_rules_only() {
        let config = DetectorConfig {
            skip_training: true,
            ..DetectorConfig::default()
        };
        let detector = Detector::initialize(config, &MemoryCache::new(), no_loader).unwrap();

        assert!(!detector.training_summary().trained);
        assert_eq!(detector.training_summary().status, TrainingStatus::NoTrain);
        assert_eq!(detector.analyze_with_model("some text").unwrap_err(), DetectorError::ModelUnavailable);

        let blended = detector.analyze_blended("URGENT!! send bitcoin now", None).unwrap();
        assert_eq!(blended.decided_by, DecisionSource::Rules);
        assert_eq!(blended.predicted_category, blended.rules.predicted_category);
        assert!(blended.model.is_none());
        assert!(blended.agreement.is_none());
    }

    #[test]
    fn test_skip_training_ignores_cached_model() {
        let cache = MemoryCache::new();
        Detector::initialize(DetectorConfig::default(), &cache, loader).unwrap();
        assert!(cache.contains(Path::new("model.json")));

        let config = DetectorConfig {
            skip_training: true,
            ..DetectorConfig::default()
        };
        let detector = Detector::initialize(config, &cache, no_loader).unwrap();
        assert!(!detector.training_summary().trained);
        assert_eq!(detector.training_summary().status, TrainingStatus::NoTrain);
        assert!(detector.model().is_none());
        assert_eq!(detector.analyze_with_model(PROBES[0]).unwrap_err(), DetectorError::ModelUnavailable);
        assert_eq!(
            detector.analyze_blended(PROBES[0], None).unwrap().decided_by,
            DecisionSource::Rules
        );
    }

    #[test]
    fn test_empty_dataset() {
        let detector = Detector::initialize(DetectorConfig::default(), &MemoryCache::new(), || Ok(Vec::new())).unwrap();
        assert_eq!(detector.training_summary().status, TrainingStatus::EmptyDataset);
        assert!(detector.model().is_none());

        let failing = Detector::initialize(DetectorConfig::default(), &MemoryCache::new(), || {
            anyhow::bail!("data directory missing")
        })
        .unwrap();
        assert_eq!(failing.training_summary().status, TrainingStatus::EmptyDataset);
    }

    #[test]
    fn test_save_falls_back() {
        let cache = MemoryCache::new();
        cache.deny_writes("model.json");
        let detector = Detector::initialize(DetectorConfig::default(), &cache, loader).unwrap();

        let fallback = PathBuf::from("models").join("model.json");
        assert_eq!(detector.training_summary().saved_to.as_ref(), Some(&fallback));
        assert!(cache.contains(&fallback));

        // The fallback copy is found on the next start
        let restored = Detector::initialize(DetectorConfig::default(), &cache, no_loader).unwrap();
        assert!(matches!(restored.training_summary().status, TrainingStatus::LoadedFromCache { .. }));
    }

    #[test]
    fn test_save_error_is_recorded() {
        let cache = MemoryCache::new();
        cache.deny_writes("model.json");
        cache.deny_writes(PathBuf::from("models").join("model.json"));

        let detector = Detector::initialize(DetectorConfig::default(), &cache, loader).unwrap();
        let summary = detector.training_summary();
        assert!(summary.trained);
        assert!(summary.saved_to.is_none());
        assert!(summary.save_error.is_some());
        assert!(detector.analyze_with_model(PROBES[1]).is_ok());
    }

    #[test]
    fn test_corrupt_cache_retrains() {
        let cache = MemoryCache::new();
        cache.insert_raw("model.json", "{\"formatVersion\": 1");
        let detector = Detector::initialize(DetectorConfig::default(), &cache, loader).unwrap();
        assert!(matches!(detector.training_summary().status, TrainingStatus::Evaluated(_)));
    }

    #[test]
    fn test_kind_mismatch_retrains() {
        let cache = MemoryCache::new();
        Detector::initialize(DetectorConfig::default(), &cache, loader).unwrap();

        let config = DetectorConfig {
            selection: ModelSelection::TfidfLogreg,
            ..DetectorConfig::default()
        };
        let detector = Detector::initialize(config, &cache, loader).unwrap();
        match &detector.training_summary().status {
            TrainingStatus::Evaluated(metrics) => assert_eq!(metrics.classifier, ClassifierKind::TfidfLogreg),
            other => panic!("unexpected status {:?}", other),
        }
    }

    #[test]
    fn test_best_selection_compares_candidates() {
        let config = DetectorConfig {
            selection: ModelSelection::Best,
            ..DetectorConfig::default()
        };
        let detector = Detector::initialize(config, &MemoryCache::new(), loader).unwrap();
        match &detector.training_summary().status {
            TrainingStatus::Evaluated(metrics) => {
                assert_eq!(metrics.candidates.len(), 2);
                let best = metrics
                    .candidates
                    .iter()
                    .map(|c| c.accuracy)
                    .fold(f64::NEG_INFINITY, f64::max);
                assert!((metrics.metrics.accuracy - best).abs() < 1e-12);
            }
            other => panic!("unexpected status {:?}", other),
        }
    }

    #[test]
    fn test_sample_size_and_balance() {
        let mut records = corpus();
        records.push(Record::new("Extra senate budget story", Label::Real));
        let config = DetectorConfig {
            balance: true,
            sample_size: Some(8),
            ..DetectorConfig::default()
        };
        let detector = Detector::initialize(config, &MemoryCache::new(), move || Ok(records)).unwrap();
        match &detector.training_summary().status {
            TrainingStatus::Evaluated(metrics) => {
                assert_eq!(metrics.size, 21);
                assert_eq!(metrics.working_size, 8);
                assert_eq!(metrics.train_size, 6);
            }
            other => panic!("unexpected status {:?}", other),
        }
    }

    #[test]
    fn test_blended_prefers_model() {
        let detector = Detector::initialize(DetectorConfig::default(), &MemoryCache::new(), loader).unwrap();
        let metadata = NewsMetadata {
            author: Some("Jane Doe".to_string()),
            publisher: Some("Reuters".to_string()),
        };

        let blended = detector.analyze_blended("Senate committee approves the budget", Some(&metadata)).unwrap();
        let model = blended.model.as_ref().unwrap();
        assert_eq!(blended.decided_by, DecisionSource::Model);
        assert_eq!(blended.predicted_category, model.predicted_category);
        assert_eq!(blended.agreement, Some(model.predicted_category == blended.rules.predicted_category));
    }

    #[test]
    fn test_empty_text_rejected() {
        let detector = Detector::initialize(DetectorConfig::default(), &MemoryCache::new(), loader).unwrap();
        assert_eq!(detector.analyze_with_rules("  ", None).unwrap_err(), DetectorError::EmptyText);
        assert_eq!(detector.analyze_with_model("").unwrap_err(), DetectorError::EmptyText);
        assert_eq!(detector.analyze_blended("\n", None).unwrap_err(), DetectorError::EmptyText);
    }

    #[test]
    fn test_summary_json_shape() {
        let detector = Detector::initialize(DetectorConfig::default(), &MemoryCache::new(), loader).unwrap();
        let json = serde_json::to_value(detector.training_summary()).unwrap();

        assert_eq!(json["trained"], true);
        assert_eq!(json["status"], "evaluated");
        assert_eq!(json["size"], 20);
        assert_eq!(json["workingSize"], 20);
        assert_eq!(json["trainSize"], 16);
        assert_eq!(json["classifier"], "bayes");
        assert!(json["confusion"]["fake"].is_object());
        assert!(json.get("precisionFake").is_some());
        assert_eq!(json["savedTo"], "model.json");
    }

    #[test]
    fn test_selection_parse() {
        assert_eq!("best".parse::<ModelSelection>().unwrap(), ModelSelection::Best);
        assert_eq!("tfidf".parse::<ModelSelection>().unwrap(), ModelSelection::TfidfLogreg);
        assert!(ModelSelection::Best.accepts(ClassifierKind::TfidfLogreg));
        assert!(!ModelSelection::Bayes.accepts(ClassifierKind::TfidfLogreg));
    }

    #[test]
    fn test_detector_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Detector>();
    }
}
