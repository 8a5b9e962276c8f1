// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Labeled news records and the CSV corpus loader

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs::File;
use std::path::Path;

/// Binary label for news classification.
///
/// Variant order is the fixed binary ordering used by the regression:
/// `Fake` is class 0 and `Real` is class 1 (lexicographic by name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    /// Fabricated or misleading news
    Fake,
    /// Authentic news
    Real,
}

impl Label {
    /// Both labels, in class-index order
    pub const ALL: [Label; 2] = [Label::Fake, Label::Real];

    /// Class index in the fixed binary ordering
    pub fn class_index(&self) -> u8 {
        match self {
            Label::Fake => 0,
            Label::Real => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Fake => "fake",
            Label::Real => "real",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single labeled text, immutable once loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub text: String,
    pub label: Label,
}

impl Record {
    pub fn new(text: impl Into<String>, label: Label) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

/// Optional attribution attached to a text at inference time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsMetadata {
    pub author: Option<String>,
    pub publisher: Option<String>,
}

impl NewsMetadata {
    /// Author, if present and not blank
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref().map(str::trim).filter(|a| !a.is_empty())
    }

    /// Publisher, if present and not blank
    pub fn publisher(&self) -> Option<&str> {
        self.publisher.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}

/// Count records per label
pub fn label_distribution<'a, I>(records: I) -> BTreeMap<Label, usize>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut dist = BTreeMap::new();
    for record in records {
        *dist.entry(record.label).or_insert(0) += 1;
    }
    dist
}

/// Loader for a directory holding `True.csv` (real) and `Fake.csv` (fake)
#[derive(Debug, Clone, Default)]
pub struct CsvCorpus {
    /// Maximum rows kept from each file
    pub per_file_limit: Option<usize>,
}

impl CsvCorpus {
    pub fn new(per_file_limit: Option<usize>) -> Self {
        Self {
            per_file_limit: per_file_limit.filter(|limit| *limit > 0),
        }
    }

    /// Load both files, real first, then deduplicate on normalized text
    pub fn load_dir(&self, data_dir: &Path) -> Result<Vec<Record>> {
        let mut records = Vec::new();

        for (file_name, label) in [("True.csv", Label::Real), ("Fake.csv", Label::Fake)] {
            let path = data_dir.join(file_name);
            if !path.exists() {
                tracing::warn!("Corpus file not found, skipping: {}", path.display());
                continue;
            }
            let loaded = self.load_csv(&path, label)?;
            tracing::info!("Loaded {} {} records from {}", loaded.len(), label, path.display());
            records.extend(loaded);
        }

        let before = records.len();
        let records = dedupe(records);
        if records.len() < before {
            tracing::debug!("Dropped {} duplicate records", before - records.len());
        }

        Ok(records)
    }

    /// Load one CSV file; every row gets the same label
    pub fn load_csv(&self, path: &Path, label: Label) -> Result<Vec<Record>> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open corpus file: {}", path.display()))?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let headers = reader
            .headers()
            .with_context(|| format!("Failed to read header row of {}", path.display()))?
            .clone();
        let column = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
        let title_col = column("title").or_else(|| column("headline"));
        let text_col = column("text");

        let mut records = Vec::new();

        for (idx, result) in reader.records().enumerate() {
            if self.per_file_limit.is_some_and(|limit| records.len() >= limit) {
                break;
            }

            let row = match result {
                Ok(row) => row,
                Err(e) => {
                    tracing::warn!("Skipping malformed row {} in {}: {}", idx, path.display(), e);
                    continue;
                }
            };

            let title = title_col.and_then(|i| row.get(i)).unwrap_or("").trim();
            let body = text_col.and_then(|i| row.get(i)).unwrap_or("").trim();

            // Combine title and body the way headlines read in a feed
            let text = [title, body]
                .iter()
                .filter(|part| !part.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join(". ");

            if !text.is_empty() {
                records.push(Record::new(text, label));
            }
        }

        Ok(records)
    }
}

fn dedupe(records: Vec<Record>) -> Vec<Record> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| {
            let key = record
                .text
                .to_lowercase()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            !key.is_empty() && seen.insert(key)
        })
        .collect()
}
