// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Append-only JSON-lines log of analyses

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct LogLine<'a, T: Serialize> {
    timestamp: DateTime<Utc>,
    method: &'a str,
    #[serde(flatten)]
    entry: &'a T,
}

/// One timestamped JSON object per line. Failures are logged, never raised.
#[derive(Debug, Clone)]
pub struct AnalysisLog {
    path: PathBuf,
}

impl AnalysisLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `logs/analyses.jsonl` under the working directory
    pub fn default_path() -> PathBuf {
        PathBuf::from("logs").join("analyses.jsonl")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `entry` (a JSON object) tagged with a timestamp and the method used
    pub fn append<T: Serialize>(&self, method: &str, entry: &T) {
        if let Err(e) = self.try_append(method, entry) {
            tracing::warn!("Failed to append analysis log entry: {:#}", e);
        }
    }

    fn try_append<T: Serialize>(&self, method: &str, entry: &T) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }

        let line = serde_json::to_string(&LogLine {
            timestamp: Utc::now(),
            method,
            entry,
        })?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}
