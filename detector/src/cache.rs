// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Persistence of trained model artifacts
//!
//! `ModelCache` is the port the pipeline talks to. `FileCache` stores pretty
//! JSON on disk; `MemoryCache` keeps the same JSON in memory.

use crate::classifier::{ModelArtifact, NewsClassifier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Version written into every stored artifact
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CacheError {
    #[error("no cached model at {0}")]
    NotFound(PathBuf),

    #[error("cached model is corrupt: {0}")]
    Corrupt(String),

    #[error("cache I/O failed: {0}")]
    Io(String),
}

/// Envelope around a persisted artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredModel {
    pub format_version: u32,
    pub created_at: DateTime<Utc>,
    pub model: ModelArtifact,
}

impl StoredModel {
    pub fn new(model: ModelArtifact) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            created_at: Utc::now(),
            model,
        }
    }

    /// Reject envelopes this build cannot use
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.format_version != FORMAT_VERSION {
            return Err(CacheError::Corrupt(format!(
                "unsupported format version {} (expected {})",
                self.format_version, FORMAT_VERSION
            )));
        }
        if !self.model.is_trained() {
            return Err(CacheError::Corrupt(format!(
                "{} artifact is empty or inconsistent",
                self.model.kind()
            )));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, CacheError> {
        serde_json::to_string_pretty(self).map_err(|e| CacheError::Corrupt(e.to_string()))
    }

    /// Parse and validate
    pub fn from_json(json: &str) -> Result<Self, CacheError> {
        let stored: Self = serde_json::from_str(json).map_err(|e| CacheError::Corrupt(e.to_string()))?;
        stored.validate()?;
        Ok(stored)
    }
}

/// Load/save port for trained artifacts
pub trait ModelCache: Send + Sync {
    fn load(&self, path: &Path) -> Result<StoredModel, CacheError>;

    fn save(&self, model: &StoredModel, path: &Path) -> Result<(), CacheError>;
}

/// Artifacts as JSON files
#[derive(Debug, Clone, Copy, Default)]
pub struct FileCache;

impl FileCache {
    pub fn new() -> Self {
        Self
    }
}

impl ModelCache for FileCache {
    fn load(&self, path: &Path) -> Result<StoredModel, CacheError> {
        if !path.exists() {
            return Err(CacheError::NotFound(path.to_path_buf()));
        }
        let json = std::fs::read_to_string(path).map_err(|e| CacheError::Io(format!("{}: {}", path.display(), e)))?;
        StoredModel::from_json(&json)
    }

    fn save(&self, model: &StoredModel, path: &Path) -> Result<(), CacheError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::Io(format!("{}: {}", parent.display(), e)))?;
        }
        let json = model.to_json()?;
        std::fs::write(path, json).map_err(|e| CacheError::Io(format!("{}: {}", path.display(), e)))?;
        tracing::info!("Model saved to {}", path.display());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    entries: HashMap<PathBuf, String>,
    read_only: HashSet<PathBuf>,
}

/// In-memory cache holding the serialized JSON per path
#[derive(Debug, Default)]
pub struct MemoryCache {
    state: Mutex<MemoryState>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> Result<T, CacheError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| CacheError::Io("memory cache lock poisoned".to_string()))?;
        Ok(f(&mut state))
    }

    /// Store raw contents at `path`, bypassing validation
    pub fn insert_raw(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        let (path, contents) = (path.into(), contents.into());
        let _ = self.with_state(|s| s.entries.insert(path, contents));
    }

    /// Make later saves to `path` fail
    pub fn deny_writes(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let _ = self.with_state(|s| s.read_only.insert(path));
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.with_state(|s| s.entries.contains_key(path)).unwrap_or(false)
    }
}

impl ModelCache for MemoryCache {
    fn load(&self, path: &Path) -> Result<StoredModel, CacheError> {
        let json = self
            .with_state(|s| s.entries.get(path).cloned())?
            .ok_or_else(|| CacheError::NotFound(path.to_path_buf()))?;
        StoredModel::from_json(&json)
    }

    fn save(&self, model: &StoredModel, path: &Path) -> Result<(), CacheError> {
        let json = model.to_json()?;
        self.with_state(|s| {
            if s.read_only.contains(path) {
                return Err(CacheError::Io(format!("{} is read-only", path.display())));
            }
            s.entries.insert(path.to_path_buf(), json);
            Ok(())
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bayes::BayesClassifier;
    use crate::datasets::Label;
    use crate::logreg::{LogisticRegression, TfIdfLogReg, TrainOptions};

    fn doc(text: &str) -> Vec<String> {
        text.split_whitespace().map(String::from).collect()
    }

    fn bayes_artifact() -> ModelArtifact {
        let mut bayes = BayesClassifier::new();
        bayes
            .train(&[doc("shock secret"), doc("senat budget")], &[Label::Fake, Label::Real])
            .unwrap();
        ModelArtifact::Bayes(bayes)
    }

    #[test]
    fn test_file_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("model.json");
        let cache = FileCache::new();

        let stored = StoredModel::new(bayes_artifact());
        cache.save(&stored, &path).unwrap();
        let loaded = cache.load(&path).unwrap();

        assert_eq!(loaded, stored);
        let probe = doc("secret budget");
        assert_eq!(loaded.model.class_scores(&probe), stored.model.class_scores(&probe));
    }

    #[test]
    fn test_file_cache_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert_eq!(FileCache::new().load(&path), Err(CacheError::NotFound(path)));
    }

    #[test]
    fn test_file_cache_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(FileCache::new().load(&path), Err(CacheError::Corrupt(_))));
    }

    #[test]
    fn test_envelope_shape() {
        let json: serde_json::Value = serde_json::from_str(&StoredModel::new(bayes_artifact()).to_json().unwrap()).unwrap();
        assert_eq!(json["formatVersion"], FORMAT_VERSION);
        assert_eq!(json["model"]["kind"], "bayes");
        assert!(json["createdAt"].is_string());
    }

    #[test]
    fn test_memory_cache_round_trip() {
        let cache = MemoryCache::new();
        let path = Path::new("model.json");
        let stored = StoredModel::new(bayes_artifact());

        assert!(matches!(cache.load(path), Err(CacheError::NotFound(_))));
        cache.save(&stored, path).unwrap();
        assert!(cache.contains(path));
        assert_eq!(cache.load(path).unwrap(), stored);
    }

    #[test]
    fn test_memory_cache_denied_write() {
        let cache = MemoryCache::new();
        cache.deny_writes("locked.json");
        let err = cache.save(&StoredModel::new(bayes_artifact()), Path::new("locked.json")).unwrap_err();
        assert!(matches!(err, CacheError::Io(_)));
        assert!(!cache.contains(Path::new("locked.json")));
    }

    #[test]
    fn test_rejects_mismatched_weight_length() {
        let docs = vec![doc("a b"), doc("b c")];
        let mut model = TfIdfLogReg::train(&docs, &[Label::Fake, Label::Real], &TrainOptions::default()).unwrap();
        model.regression = LogisticRegression::from_weights(vec![0.0; 2]);

        let cache = MemoryCache::new();
        let json = serde_json::to_string(&StoredModel::new(ModelArtifact::TfidfLogreg(model))).unwrap();
        cache.insert_raw("model.json", json);

        assert!(matches!(cache.load(Path::new("model.json")), Err(CacheError::Corrupt(_))));
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut stored = StoredModel::new(bayes_artifact());
        stored.format_version = FORMAT_VERSION + 1;
        let json = serde_json::to_string(&stored).unwrap();
        assert!(matches!(StoredModel::from_json(&json), Err(CacheError::Corrupt(_))));
    }
}
