// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Standalone model comparison
//!
//! Trains every classifier kind on the same stratified split, scores the
//! rule-based heuristics on the same held-out records, and prints a report
//! for each.

use anyhow::{Context, Result};
use clap::builder::FalseyValueParser;
use clap::Parser;
use fakenews_detector::classifier::{ClassifierKind, ModelArtifact, NewsClassifier};
use fakenews_detector::datasets::{label_distribution, CsvCorpus, Label, Record};
use fakenews_detector::logreg::TrainOptions;
use fakenews_detector::metrics::{evaluate_documents, EvaluationMetrics};
use fakenews_detector::pipeline::DetectorConfig;
use fakenews_detector::preprocess::Preprocessor;
use fakenews_detector::rules::RuleScorer;
use fakenews_detector::split::{stratified_split, DEFAULT_SEED};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "evaluate-models")]
#[command(about = "Compare the rule scorer and every classifier on one split")]
#[command(version)]
struct Args {
    /// Directory holding True.csv and Fake.csv
    #[arg(short, long, env = "DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Maximum rows read from each CSV file
    #[arg(long, env = "SAMPLE_PER_CSV")]
    sample_per_csv: Option<usize>,

    /// Seed string for shuffling and splitting
    #[arg(short, long, env = "MODEL_SEED", default_value = DEFAULT_SEED)]
    seed: String,

    /// Cap on the working set
    #[arg(long, env = "SAMPLE_SIZE")]
    sample_size: Option<usize>,

    /// Equalize label counts first
    #[arg(long, env = "BALANCE", value_parser = FalseyValueParser::new())]
    balance: bool,

    /// Only run this classifier (bayes, tfidf-logreg)
    #[arg(short, long)]
    classifier: Option<ClassifierKind>,

    /// Gradient descent steps for logistic regression
    #[arg(long, default_value_t = TrainOptions::default().steps)]
    steps: usize,

    /// Learning rate for logistic regression
    #[arg(long, default_value_t = TrainOptions::default().learning_rate)]
    learning_rate: f64,

    /// Write all results as JSON to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ModelResult {
    model_name: String,
    metrics: EvaluationMetrics,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ComparisonResults {
    seed: String,
    train_size: usize,
    test_size: usize,
    test_distribution: BTreeMap<Label, usize>,
    results: Vec<ModelResult>,
    timestamp: chrono::DateTime<chrono::Utc>,
}

fn print_distribution(name: &str, records: &[&Record]) {
    println!("\n{} distribution:", name);
    for (label, count) in label_distribution(records.iter().copied()) {
        println!(
            "  {}: {} ({:.1}%)",
            label,
            count,
            count as f64 / records.len().max(1) as f64 * 100.0
        );
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let records = CsvCorpus::new(args.sample_per_csv)
        .load_dir(&args.data_dir)
        .with_context(|| format!("loading corpus from {}", args.data_dir.display()))?;

    let config = DetectorConfig {
        seed: args.seed.clone(),
        sample_size: args.sample_size,
        balance: args.balance,
        ..DetectorConfig::default()
    };
    let working = config.working_set(&records);
    if working.is_empty() {
        anyhow::bail!("no records found in {}", args.data_dir.display());
    }

    let split = stratified_split(&working, &config.seed);
    println!("\nCorpus: {}", args.data_dir.display());
    println!("  Working set: {}", split.total());
    println!("  Train samples: {}", split.train.len());
    println!("  Test samples: {}", split.test.len());
    print_distribution("Train", &split.train);
    print_distribution("Test", &split.test);

    let preprocessor = Preprocessor::new();
    let train_docs: Vec<Vec<String>> = split.train.iter().map(|r| preprocessor.preprocess(&r.text)).collect();
    let train_labels: Vec<Label> = split.train.iter().map(|r| r.label).collect();
    let test_docs: Vec<Vec<String>> = split.test.iter().map(|r| preprocessor.preprocess(&r.text)).collect();
    let test_labels: Vec<Label> = split.test.iter().map(|r| r.label).collect();

    let options = TrainOptions {
        steps: args.steps,
        learning_rate: args.learning_rate,
    };

    println!("\n{}", "=".repeat(70));
    println!("MODEL EVALUATION");
    println!("{}", "=".repeat(70));

    let mut results = Vec::new();

    // The rule scorer needs no training and reads the raw text
    if args.classifier.is_none() {
        let scorer = RuleScorer::new();
        let predictions: Vec<Label> = split
            .test
            .iter()
            .map(|r| scorer.score(&r.text, None).predicted_category)
            .collect();
        let metrics = EvaluationMetrics::from_predictions(&predictions, &test_labels)?;
        println!("\n## Rules ##");
        println!("{}", metrics.format());
        results.push(ModelResult {
            model_name: "Rules".to_string(),
            metrics,
        });
    }

    for kind in ClassifierKind::ALL {
        if args.classifier.is_some_and(|only| only != kind) {
            continue;
        }

        tracing::info!("Training {}", kind);
        let model = ModelArtifact::train(kind, &train_docs, &train_labels, &options)?;
        let metrics = evaluate_documents(&model, &test_docs, &test_labels)?;

        println!("\n## {} ##", model.name());
        println!("{}", metrics.format());
        results.push(ModelResult {
            model_name: model.name().to_string(),
            metrics,
        });
    }

    println!("{}", "=".repeat(70));
    println!("{:<15} {:>10} {:>12} {:>12} {:>10}", "Model", "Accuracy", "Prec(fake)", "Rec(fake)", "F1(fake)");
    println!("{:-<70}", "");
    for result in &results {
        println!(
            "{:<15} {:>10.4} {:>12.4} {:>12.4} {:>10.4}",
            result.model_name,
            result.metrics.accuracy,
            result.metrics.precision_fake,
            result.metrics.recall_fake,
            result.metrics.f1_fake
        );
    }

    if let Some(output) = &args.output {
        let comparison = ComparisonResults {
            seed: config.seed.clone(),
            train_size: split.train.len(),
            test_size: split.test.len(),
            test_distribution: label_distribution(split.test.iter().copied()),
            results,
            timestamp: chrono::Utc::now(),
        };
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(output, serde_json::to_string_pretty(&comparison)?)
            .with_context(|| format!("writing {}", output.display()))?;
        println!("\nJSON results saved to: {}", output.display());
    }

    println!("\nEvaluation complete!");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::ffi::OsStr;

    #[test]
    fn test_balance_reads_env() {
        let command = Args::command();
        let balance = command
            .get_arguments()
            .find(|arg| arg.get_id() == "balance")
            .unwrap();
        assert_eq!(balance.get_env(), Some(OsStr::new("BALANCE")));
    }

    #[test]
    fn test_balance_flag_parses() {
        let args = Args::try_parse_from(["evaluate-models", "--balance"]).unwrap();
        assert!(args.balance);
    }
}
