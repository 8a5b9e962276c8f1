// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Command-line front end for the fake news detector
//!
//! Usage:
//!   fakenews --text "SHOCKING news!!" --method rules
//!   fakenews --data-dir ./data --classifier best --summary
//!   echo "Senate passes budget" | fakenews --method blended --publisher Reuters

use anyhow::{Context, Result};
use clap::builder::FalseyValueParser;
use clap::{Parser, ValueEnum};
use fakenews_detector::analysis_log::AnalysisLog;
use fakenews_detector::cache::FileCache;
use fakenews_detector::datasets::{CsvCorpus, NewsMetadata};
use fakenews_detector::logreg::TrainOptions;
use fakenews_detector::pipeline::{Detector, DetectorConfig, ModelSelection};
use fakenews_detector::split::DEFAULT_SEED;
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Method {
    Rules,
    Model,
    Blended,
}

impl Method {
    fn as_str(&self) -> &'static str {
        match self {
            Method::Rules => "rules",
            Method::Model => "model",
            Method::Blended => "blended",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "fakenews")]
#[command(about = "Classify a news text as real or fake")]
#[command(version)]
struct Args {
    /// Text to analyze (read from stdin when omitted)
    #[arg(short, long)]
    text: Option<String>,

    /// Analysis method
    #[arg(short, long, value_enum, default_value = "blended")]
    method: Method,

    /// Author of the article
    #[arg(long)]
    author: Option<String>,

    /// Publisher of the article
    #[arg(long)]
    publisher: Option<String>,

    /// Print the training summary and exit
    #[arg(long)]
    summary: bool,

    /// Directory holding True.csv and Fake.csv
    #[arg(short, long, env = "DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Maximum rows read from each CSV file
    #[arg(long, env = "SAMPLE_PER_CSV")]
    sample_per_csv: Option<usize>,

    /// Seed string for shuffling and splitting
    #[arg(short, long, env = "MODEL_SEED", default_value = DEFAULT_SEED)]
    seed: String,

    /// Cap on the training working set
    #[arg(long, env = "SAMPLE_SIZE")]
    sample_size: Option<usize>,

    /// Equalize label counts before training
    #[arg(long, env = "BALANCE", value_parser = FalseyValueParser::new())]
    balance: bool,

    /// Rule-based-only mode: skip the model cache and training
    #[arg(long, env = "NO_TRAIN", value_parser = FalseyValueParser::new())]
    no_train: bool,

    /// Primary model cache path
    #[arg(long, env = "MODEL_PATH", default_value = "model.json")]
    model_path: PathBuf,

    /// Fallback model cache path
    #[arg(long, default_value = "models/model.json")]
    fallback_model_path: PathBuf,

    /// Train TF-IDF + logistic regression instead of Bayes
    #[arg(long, env = "USE_TFIDF", value_parser = FalseyValueParser::new())]
    use_tfidf: bool,

    /// Classifier to train (bayes, tfidf-logreg, best); overrides --use-tfidf
    #[arg(long)]
    classifier: Option<ModelSelection>,

    /// Gradient descent steps for logistic regression
    #[arg(long)]
    steps: Option<usize>,

    /// Learning rate for logistic regression
    #[arg(long)]
    learning_rate: Option<f64>,

    /// Append each analysis to a JSON-lines log
    #[arg(long, env = "LOG_RESULTS", value_parser = FalseyValueParser::new())]
    log_results: bool,

    /// Analysis log path
    #[arg(long, default_value = "logs/analyses.jsonl")]
    log_file: PathBuf,
}

impl Args {
    fn detector_config(&self) -> DetectorConfig {
        let defaults = TrainOptions::default();
        let selection = self.classifier.unwrap_or(if self.use_tfidf {
            ModelSelection::TfidfLogreg
        } else {
            ModelSelection::Bayes
        });

        DetectorConfig {
            seed: self.seed.clone(),
            sample_size: self.sample_size,
            balance: self.balance,
            skip_training: self.no_train,
            model_path: self.model_path.clone(),
            fallback_model_path: Some(self.fallback_model_path.clone()),
            selection,
            train_options: TrainOptions {
                steps: self.steps.unwrap_or(defaults.steps),
                learning_rate: self.learning_rate.unwrap_or(defaults.learning_rate),
            },
        }
    }

    fn input_text(&self) -> Result<String> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("reading text from stdin")?;
        Ok(text)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.detector_config();

    tracing::info!("Classifier: {}, seed: {}", config.selection, config.seed);

    let corpus = CsvCorpus::new(args.sample_per_csv);
    let data_dir = args.data_dir.clone();
    let detector = Detector::initialize(config, &FileCache::new(), move || {
        corpus
            .load_dir(&data_dir)
            .with_context(|| format!("loading corpus from {}", data_dir.display()))
    })?;

    if args.summary {
        println!("{}", serde_json::to_string_pretty(detector.training_summary())?);
        return Ok(());
    }

    let text = args.input_text()?;
    let metadata = NewsMetadata {
        author: args.author.clone(),
        publisher: args.publisher.clone(),
    };

    let result = match args.method {
        Method::Rules => serde_json::to_value(detector.analyze_with_rules(&text, Some(&metadata))?)?,
        Method::Model => serde_json::to_value(detector.analyze_with_model(&text)?)?,
        Method::Blended => serde_json::to_value(detector.analyze_blended(&text, Some(&metadata))?)?,
    };

    println!("{}", serde_json::to_string_pretty(&result)?);

    if args.log_results {
        AnalysisLog::new(&args.log_file).append(args.method.as_str(), &result);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::ffi::OsStr;

    #[test]
    fn test_switches_read_env() {
        let command = Args::command();
        for (id, var) in [
            ("balance", "BALANCE"),
            ("no_train", "NO_TRAIN"),
            ("use_tfidf", "USE_TFIDF"),
            ("log_results", "LOG_RESULTS"),
        ] {
            let arg = command.get_arguments().find(|arg| arg.get_id() == id).unwrap();
            assert_eq!(arg.get_env(), Some(OsStr::new(var)), "{}", id);
        }
    }

    #[test]
    fn test_no_train_maps_to_skip_training() {
        let args = Args::try_parse_from(["fakenews", "--no-train", "--text", "hello"]).unwrap();
        assert!(args.detector_config().skip_training);
    }
}
