// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Rule-based red-flag scorer
//!
//! Works on the raw text and needs no training, so it is always available,
//! including before a model has been trained or restored.

use crate::datasets::{Label, NewsMetadata};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence added per red flag
pub const FLAG_WEIGHT: f64 = 0.2;
/// Confidence at or above which the text is called fake
pub const FAKE_THRESHOLD: f64 = 0.5;
/// Confidence removed when the publisher is a known credible outlet
pub const CREDIBLE_DISCOUNT: f64 = 0.3;
/// Confidence added when neither author nor publisher is known
pub const MISSING_ATTRIBUTION_PENALTY: f64 = 0.2;

/// A single surface-level signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RedFlag {
    #[serde(rename = "urgency words")]
    Urgency,
    #[serde(rename = "money/transfer keywords")]
    MoneyTransfer,
    #[serde(rename = "many exclamation marks")]
    Exclamations,
    #[serde(rename = "generic greeting")]
    GenericGreeting,
    #[serde(rename = "contains link(s)")]
    Links,
    #[serde(rename = "sensational/clickbait language")]
    Sensational,
    #[serde(rename = "many ALL-CAPS words")]
    AllCaps,
    #[serde(rename = "suspicious author name")]
    SuspiciousAuthor,
    #[serde(rename = "unverified publisher")]
    UnverifiedPublisher,
    #[serde(rename = "credible source")]
    CredibleSource,
    #[serde(rename = "no author/publisher information")]
    MissingAttribution,
}

impl RedFlag {
    pub fn description(&self) -> &'static str {
        match self {
            RedFlag::Urgency => "urgency words",
            RedFlag::MoneyTransfer => "money/transfer keywords",
            RedFlag::Exclamations => "many exclamation marks",
            RedFlag::GenericGreeting => "generic greeting",
            RedFlag::Links => "contains link(s)",
            RedFlag::Sensational => "sensational/clickbait language",
            RedFlag::AllCaps => "many ALL-CAPS words",
            RedFlag::SuspiciousAuthor => "suspicious author name",
            RedFlag::UnverifiedPublisher => "unverified publisher",
            RedFlag::CredibleSource => "credible source",
            RedFlag::MissingAttribution => "no author/publisher information",
        }
    }
}

impl fmt::Display for RedFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Output of the rule scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleAnalysis {
    pub predicted_category: Label,
    /// Estimated probability of fake, in [0, 1]
    pub rules_confidence: f64,
    pub red_flags: Vec<RedFlag>,
}

impl RuleAnalysis {
    pub fn has_flag(&self, flag: RedFlag) -> bool {
        self.red_flags.contains(&flag)
    }
}

/// Hand-written heuristic scorer
#[derive(Debug, Clone)]
pub struct RuleScorer {
    urgency_words: Vec<&'static str>,
    sensational_phrases: Vec<&'static str>,
    suspicious_authors: Vec<&'static str>,
    suspicious_publishers: Vec<&'static str>,
    money: Regex,
    greeting: Regex,
    link: Regex,
    caps_run: Regex,
    capitalized: Regex,
    credible_publisher: Regex,
}

impl RuleScorer {
    pub fn new() -> Self {
        Self {
            urgency_words: vec!["urgent", "immediately", "asap", "important", "help", "deadline"],
            sensational_phrases: vec![
                "shocking",
                "embarrassing",
                "disturbing",
                "you won't believe",
                "won't believe",
                "exposed",
                "destroyed",
                "goes viral",
                "must see",
                "epic fail",
                "insane",
                "unbelievable",
                "crazy",
                "jaw-dropping",
                "mind-blowing",
            ],
            suspicious_authors: vec!["anonymous", "unknown", "staff", "editor", "admin"],
            suspicious_publishers: vec!["blog", "wordpress", "tumblr", "medium", "unknown"],
            money: Regex::new(r"(?i)(\$|usd|million|billion|wire\s*transfer|gift\s*card|bitcoin|crypto)")
                .expect("money pattern is valid"),
            greeting: Regex::new(r"(?i)(dear\s+(friend|customer|user)|greetings\s+my\s+dear\s+friend)")
                .expect("greeting pattern is valid"),
            link: Regex::new(r"(?i)https?://\S+|www\.[^\s)]+").expect("link pattern is valid"),
            caps_run: Regex::new(r"[A-Z]{3,}").expect("caps pattern is valid"),
            capitalized: Regex::new(r"^[A-Z][a-z]+$").expect("capitalized pattern is valid"),
            // Whole words only: a bare "ap" must not match "newspaper"
            credible_publisher: Regex::new(
                r"(?i)\b(bbc|cnn|reuters|ap|associated press|new york times|washington post|wall street journal)\b",
            )
            .expect("credible publisher pattern is valid"),
        }
    }

    /// Red flags raised by the text itself
    pub fn text_flags(&self, text: &str) -> Vec<RedFlag> {
        let mut flags = Vec::new();
        let lower = text.to_lowercase();

        if self.urgency_words.iter().any(|w| lower.contains(w)) {
            flags.push(RedFlag::Urgency);
        }
        if self.money.is_match(text) {
            flags.push(RedFlag::MoneyTransfer);
        }
        if text.matches('!').count() >= 2 {
            flags.push(RedFlag::Exclamations);
        }
        if self.greeting.is_match(text) {
            flags.push(RedFlag::GenericGreeting);
        }
        if self.link.is_match(text) {
            flags.push(RedFlag::Links);
        }
        if self.sensational_phrases.iter().any(|p| lower.contains(p)) {
            flags.push(RedFlag::Sensational);
        }

        let caps_words = text
            .split_whitespace()
            .filter(|w| self.caps_run.is_match(w) && !self.capitalized.is_match(w))
            .count();
        if caps_words >= 3 {
            flags.push(RedFlag::AllCaps);
        }

        flags
    }

    /// Red flags raised by author/publisher attribution
    pub fn attribution_flags(&self, metadata: &NewsMetadata) -> Vec<RedFlag> {
        let mut flags = Vec::new();
        let author = metadata.author();
        let publisher = metadata.publisher();

        if let Some(author) = author {
            let author = author.to_lowercase();
            if self.suspicious_authors.iter().any(|s| author.contains(s)) {
                flags.push(RedFlag::SuspiciousAuthor);
            }
        }

        if let Some(publisher) = publisher {
            let lower = publisher.to_lowercase();
            if self.suspicious_publishers.iter().any(|s| lower.contains(s)) {
                flags.push(RedFlag::UnverifiedPublisher);
            }
            if self.credible_publisher.is_match(publisher) {
                flags.push(RedFlag::CredibleSource);
            }
        }

        if author.is_none() && publisher.is_none() {
            flags.push(RedFlag::MissingAttribution);
        }

        flags
    }

    /// Score a text. Absent metadata is treated as no attribution at all.
    pub fn score(&self, text: &str, metadata: Option<&NewsMetadata>) -> RuleAnalysis {
        let empty = NewsMetadata::default();
        let mut red_flags = self.text_flags(text);
        red_flags.extend(self.attribution_flags(metadata.unwrap_or(&empty)));

        let mut confidence = (red_flags.len() as f64 * FLAG_WEIGHT).min(1.0);
        if red_flags.contains(&RedFlag::CredibleSource) {
            confidence = (confidence - CREDIBLE_DISCOUNT).max(0.0);
        }
        if red_flags.contains(&RedFlag::MissingAttribution) {
            confidence = (confidence + MISSING_ATTRIBUTION_PENALTY).min(1.0);
        }

        let predicted_category = if confidence >= FAKE_THRESHOLD {
            Label::Fake
        } else {
            Label::Real
        };

        RuleAnalysis {
            predicted_category,
            rules_confidence: confidence,
            red_flags,
        }
    }
}

impl Default for RuleScorer {
    fn default() -> Self {
        Self::new()
    }
}
