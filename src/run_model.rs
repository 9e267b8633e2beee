// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Standalone model runner
//!
//! Trains and evaluates individual profile classifiers for quick testing

use anyhow::Result;
use clap::Parser;
use credilink::classifiers::{all_classifiers, ModelType};
use credilink::config::ServiceConfig;
use credilink::datasets::{Dataset, Verdict};
use credilink::metrics::ClassificationReport;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "run-model")]
#[command(about = "Train and evaluate profile classifiers")]
#[command(version)]
struct Args {
    /// Model to run (KNN, LinearSVC, NaiveBayes); all when omitted
    #[arg(short, long)]
    model: Option<ModelType>,

    /// Labelled CSV dataset (synthetic when omitted)
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Random seed
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Number of samples for synthetic dataset
    #[arg(short, long, default_value_t = 1000)]
    num_samples: usize,

    /// Share of samples used for training
    #[arg(short, long, default_value_t = 0.8)]
    train_fraction: f64,

    /// List available models
    #[arg(long)]
    list: bool,
}

fn print_distribution(title: &str, samples: &[credilink::Sample]) {
    let dist = Dataset::label_distribution(samples);
    println!("\n{} distribution:", title);
    for label in [Verdict::Real, Verdict::Fake] {
        let count = dist.get(&label).copied().unwrap_or(0);
        let share = if samples.is_empty() { 0.0 } else { count as f64 / samples.len() as f64 * 100.0 };
        println!("  {}: {} ({:.1}%)", label, count, share);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = ServiceConfig {
        seed: args.seed,
        reference_size: args.num_samples,
        train_fraction: args.train_fraction,
        ..ServiceConfig::default()
    };

    // List available models
    if args.list {
        println!("Available models:");
        println!("-----------------");
        for model in all_classifiers(&config) {
            println!("  {}: {}", model.name(), model.description());
        }
        return Ok(());
    }

    // Load dataset
    let dataset = match args.path {
        Some(ref path) => {
            tracing::info!("Loading {} (seed={})", path.display(), args.seed);
            Dataset::load_csv(path, args.train_fraction, args.seed)?
        }
        None => {
            tracing::info!("Loading synthetic dataset ({} samples, seed={})", args.num_samples, args.seed);
            Dataset::load_synthetic(args.num_samples, args.train_fraction, args.seed)
        }
    };

    println!("\nDataset: {}", dataset.config.name);
    println!("  Train samples: {}", dataset.train.len());
    println!("  Test samples: {}", dataset.test.len());
    print_distribution("Train", &dataset.train);
    print_distribution("Test", &dataset.test);

    anyhow::ensure!(!dataset.test.is_empty(), "test split is empty; lower --train-fraction or add rows");

    println!("\n{}", "=".repeat(70));
    println!("MODEL EVALUATION");
    println!("{}", "=".repeat(70));

    for mut model in all_classifiers(&config) {
        // Filter if specific model requested
        if args.model.is_some_and(|m| m != model.model_type()) {
            continue;
        }

        println!("\n## {} ##", model.name());
        println!("{}", model.description());
        println!("{}", "-".repeat(50));

        model.train(&dataset.train);

        let scores = model.score_batch(&dataset.test);
        let pred_labels: Vec<Verdict> = scores.iter().map(|s| s.verdict).collect();
        let true_labels: Vec<Verdict> = dataset.test.iter().map(|s| s.label).collect();
        let probabilities: Vec<f64> = scores.iter().map(|s| s.probability).collect();

        let report = ClassificationReport::from_predictions_with_probs(&pred_labels, &true_labels, &probabilities);

        println!("{}", report.format());
    }

    println!("\n{}", "=".repeat(70));
    println!("Evaluation complete!");

    Ok(())
}
