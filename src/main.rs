// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! CrediLink dashboard CLI
//!
//! Usage:
//!   credilink check @nasa
//!   credilink predict --model KNN --followers 12 --follows 4000
//!   credilink test-dataset profiles.csv --model NaiveBayes
//!   credilink compare --output results --format both

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use credilink::config::ServiceConfig;
use credilink::dashboard::{
    AppModel, AppMsg, DashboardMode, DatasetTesterView, ManualInputForm, ModelComparison, Page, UrlChecker,
};
use credilink::datasets::Dataset;
use credilink::features::FeatureKey;
use credilink::pipeline::{EvaluationConfig, EvaluationPipeline};
use credilink::services::{CsvUpload, LocalModelService};
use credilink::ModelType;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "credilink")]
#[command(about = "Assess the credibility of social media profiles")]
#[command(version)]
struct Args {
    /// JSON service configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Random seed (overrides the config file)
    #[arg(short, long, global = true)]
    seed: Option<u64>,

    /// Labelled CSV to train on instead of the synthetic reference set
    #[arg(short, long, global = true)]
    reference: Option<PathBuf>,

    /// Print raw JSON records instead of rendered views
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a profile URL or handle
    Check {
        /// e.g. instagram.com/nasa or @nasa
        #[arg(default_value = "")]
        url_or_handle: String,
    },
    /// Classify manually entered profile features
    Predict {
        #[arg(short, long, default_value = "LinearSVC")]
        model: ModelType,

        #[command(flatten)]
        features: FeatureArgs,
    },
    /// Evaluate a model against a labelled CSV file
    TestDataset {
        file: Option<PathBuf>,

        #[arg(short, long, default_value = "LinearSVC")]
        model: ModelType,
    },
    /// Compare model performance on the held-out reference split
    Compare {
        /// Directory for JSON/Markdown results
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Both)]
        format: OutputFormat,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Markdown,
    Both,
}

/// Per-feature overrides of the manual form defaults
#[derive(ClapArgs, Debug)]
struct FeatureArgs {
    #[arg(long)]
    profile_pic: Option<f64>,
    #[arg(long)]
    nums_length_username: Option<f64>,
    #[arg(long)]
    fullname_words: Option<f64>,
    #[arg(long)]
    nums_length_fullname: Option<f64>,
    #[arg(long)]
    name_equals_username: Option<f64>,
    #[arg(long)]
    description_length: Option<f64>,
    #[arg(long)]
    external_url: Option<f64>,
    #[arg(long)]
    private: Option<f64>,
    #[arg(long)]
    posts: Option<f64>,
    #[arg(long)]
    followers: Option<f64>,
    #[arg(long)]
    follows: Option<f64>,
}

impl FeatureArgs {
    fn overrides(&self) -> Vec<(FeatureKey, f64)> {
        [
            (FeatureKey::ProfilePic, self.profile_pic),
            (FeatureKey::NumsLengthUsername, self.nums_length_username),
            (FeatureKey::FullnameWords, self.fullname_words),
            (FeatureKey::NumsLengthFullname, self.nums_length_fullname),
            (FeatureKey::NameEqualsUsername, self.name_equals_username),
            (FeatureKey::DescriptionLength, self.description_length),
            (FeatureKey::ExternalUrl, self.external_url),
            (FeatureKey::Private, self.private),
            (FeatureKey::Posts, self.posts),
            (FeatureKey::Followers, self.followers),
            (FeatureKey::Follows, self.follows),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }
}

fn spinner(message: &'static str, json: bool) -> Result<ProgressBar> {
    if json {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// Print either the rendered view or the raw record, and map the view error to the exit code
fn emit<T: Serialize>(json: bool, header: &str, rendered: String, record: Option<&T>, error: Option<&str>) -> Result<ExitCode> {
    if json {
        let value = match (record, error) {
            (_, Some(error)) => serde_json::json!({ "error": error }),
            (Some(record), None) => serde_json::to_value(record)?,
            (None, None) => serde_json::Value::Null,
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}\n{}", header, rendered);
    }
    Ok(if error.is_some() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn build_service(args: &Args) -> Result<LocalModelService> {
    let mut config = match args.config {
        Some(ref path) => ServiceConfig::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => ServiceConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let pb = spinner("Training models...", args.json)?;
    let service = match args.reference {
        Some(ref path) => {
            let dataset = Dataset::load_csv(path, config.train_fraction, config.seed)
                .with_context(|| format!("loading reference dataset {}", path.display()))?;
            LocalModelService::with_reference(config, dataset)
        }
        None => LocalModelService::new(config),
    };
    pb.finish_and_clear();
    Ok(service)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut app = AppModel::new();

    match args.command {
        Command::Check { ref url_or_handle } => {
            app.update(AppMsg::SelectMode(DashboardMode::Url));
            let service = build_service(&args)?;

            let mut view = UrlChecker::new();
            view.set_input(url_or_handle.as_str());
            let pb = spinner("Analyzing...", args.json)?;
            view.submit(&service, &service).await;
            pb.finish_and_clear();

            emit(args.json, &app.render_header(), view.render(), view.report.as_ref(), view.error.as_deref())
        }
        Command::Predict { model, ref features } => {
            app.update(AppMsg::SelectMode(DashboardMode::Manual));
            let service = build_service(&args)?;

            let mut form = ManualInputForm::new();
            form.set_model(model);
            for (key, value) in features.overrides() {
                form.set_feature(key, value);
            }
            let pb = spinner("Predicting...", args.json)?;
            form.submit(&service).await;
            pb.finish_and_clear();

            emit(args.json, &app.render_header(), form.render(), form.prediction.as_ref(), form.error.as_deref())
        }
        Command::TestDataset { ref file, model } => {
            app.update(AppMsg::SelectMode(DashboardMode::Dataset));
            let service = build_service(&args)?;

            let mut view = DatasetTesterView::new();
            view.set_model(model);
            if let Some(path) = file {
                let upload = CsvUpload::from_path(path).with_context(|| format!("reading {}", path.display()))?;
                view.select_file(upload);
            }
            let pb = spinner("Testing...", args.json)?;
            view.submit(&service).await;
            pb.finish_and_clear();

            emit(args.json, &app.render_header(), view.render(), view.results.as_ref(), view.error.as_deref())
        }
        Command::Compare { ref output, format } => {
            app.update(AppMsg::Navigate(Page::Comparison));
            let service = build_service(&args)?;

            let mut view = ModelComparison::new();
            let pb = spinner("Loading model performance...", args.json)?;
            view.mount(&service).await;
            pb.finish_and_clear();

            let code = emit(args.json, &app.render_header(), view.render(), Some(&view.data), view.error.as_deref())?;

            if let Some(ref output) = output {
                let config = EvaluationConfig {
                    service: service.config().clone(),
                    dataset_path: args.reference.clone(),
                    models: vec![],
                };
                let results = EvaluationPipeline::new(config).run_on(&service)?;

                std::fs::create_dir_all(output)?;
                let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");

                if matches!(format, OutputFormat::Json | OutputFormat::Both) {
                    let json_path = output.join(format!("compare_{}.json", timestamp));
                    EvaluationPipeline::save_results(&results, &json_path)?;
                    eprintln!("JSON results saved to: {}", json_path.display());
                }
                if matches!(format, OutputFormat::Markdown | OutputFormat::Both) {
                    let md_path = output.join(format!("compare_{}.md", timestamp));
                    std::fs::write(&md_path, EvaluationPipeline::generate_report(&results))
                        .with_context(|| format!("writing {}", md_path.display()))?;
                    eprintln!("Markdown report saved to: {}", md_path.display());
                }
            }
            Ok(code)
        }
    }
}
