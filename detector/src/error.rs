// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

use thiserror::Error;

/// Errors surfaced by the classification pipeline
#[derive(Debug, Error, PartialEq)]
pub enum DetectorError {
    #[error("text is required")]
    EmptyText,

    #[error("no trained model is available")]
    ModelUnavailable,

    #[error("no training records available")]
    EmptyDataset,

    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
}

pub type Result<T> = std::result::Result<T, DetectorError>;
