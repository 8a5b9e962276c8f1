// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Reproducible shuffling and stratified train/test splitting
//!
//! All randomness comes from a ChaCha8 generator whose 32-byte seed is the
//! SHA-256 digest of a seed string, so a given seed yields the same
//! permutation on every run and in every process.

use crate::datasets::{Label, Record};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

/// Fraction of each label group that goes to the training split
pub const TRAIN_FRACTION: f64 = 0.8;

/// Seed used when the caller does not provide one
pub const DEFAULT_SEED: &str = "fake-news-detector";

/// Deterministic shuffler seeded from a string
#[derive(Debug, Clone)]
pub struct SeededShuffler {
    rng: ChaCha8Rng,
}

impl SeededShuffler {
    pub fn new(seed: &str) -> Self {
        let digest: [u8; 32] = Sha256::digest(seed.as_bytes()).into();
        Self {
            rng: ChaCha8Rng::from_seed(digest),
        }
    }

    /// Fisher-Yates shuffle in place, advancing the generator
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}

/// Train/test partition borrowing from the input records
#[derive(Debug, Clone, Default)]
pub struct Split<'a> {
    pub train: Vec<&'a Record>,
    pub test: Vec<&'a Record>,
}

impl Split<'_> {
    pub fn total(&self) -> usize {
        self.train.len() + self.test.len()
    }
}

/// Group records by label in class order, keeping input order within a group
fn group_by_label<'a>(records: &[&'a Record]) -> Vec<(Label, Vec<&'a Record>)> {
    Label::ALL
        .iter()
        .map(|label| {
            let group: Vec<&Record> = records.iter().copied().filter(|r| r.label == *label).collect();
            (*label, group)
        })
        .filter(|(_, group)| !group.is_empty())
        .collect()
}

/// Number of records of a group of size `n` that go to training
pub fn train_size(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    ((n as f64 * TRAIN_FRACTION).floor() as usize).max(1)
}

/// Shuffle each label group with one shared generator and split it 80/20.
///
/// A non-empty group always contributes at least one training record; a
/// group of one record has an empty test subset.
pub fn stratified_split<'a>(records: &[&'a Record], seed: &str) -> Split<'a> {
    let mut shuffler = SeededShuffler::new(seed);
    let mut split = Split::default();

    for (label, mut group) in group_by_label(records) {
        shuffler.shuffle(&mut group);
        let cut = train_size(group.len());
        let test = group.split_off(cut);

        tracing::debug!("Split {}: train={}, test={}", label, group.len(), test.len());

        split.train.extend(group);
        split.test.extend(test);
    }

    split
}

/// Downsample every label to the minority count (first records of each group).
/// Leaves the set unchanged unless both labels are present.
pub fn balance<'a>(records: &[&'a Record]) -> Vec<&'a Record> {
    let groups = group_by_label(records);
    if groups.len() < Label::ALL.len() {
        return records.to_vec();
    }

    let min_count = groups.iter().map(|(_, g)| g.len()).min().unwrap_or(0);
    groups
        .into_iter()
        .flat_map(|(_, group)| group.into_iter().take(min_count))
        .collect()
}

/// Cap the working set at roughly `cap` records, divided evenly per label
pub fn sample_per_label<'a>(records: &[&'a Record], cap: usize) -> Vec<&'a Record> {
    if cap == 0 || cap >= records.len() {
        return records.to_vec();
    }

    let groups = group_by_label(records);
    let per_label = (cap / groups.len().max(1)).max(1);
    groups
        .into_iter()
        .flat_map(|(_, group)| group.into_iter().take(per_label))
        .collect()
}
