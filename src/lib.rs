// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! CrediLink: social-media profile credibility checks
//!
//! This crate provides:
//! - The eleven-feature profile schema and per-feature credibility analysis
//! - Labelled dataset loading (CSV with header aliasing, seeded synthetic data)
//! - KNN, LinearSVC and naive Bayes classifiers over profile features
//! - Evaluation metrics (Accuracy, Precision, Recall, F1, AUC-ROC)
//! - Service traits for prediction, scraping, dataset testing and model performance
//! - Headless dashboard views that render to text
//! - Reproducible evaluation pipeline with seeded randomness

pub mod analyzer;
pub mod classifiers;
pub mod config;
pub mod dashboard;
pub mod datasets;
pub mod error;
pub mod features;
pub mod metrics;
pub mod pipeline;
pub mod scraper;
pub mod services;

pub use analyzer::{analyze, breakdown, credibility_score, FeatureAnalysis, FeatureCredibility, Indicator};
pub use classifiers::{ModelType, Prediction, ProfileClassifier};
pub use config::ServiceConfig;
pub use dashboard::{AppModel, DashboardMode, DatasetTesterView, ManualInputForm, ModelComparison, Page, UrlChecker};
pub use datasets::{Dataset, DatasetConfig, Sample, Verdict};
pub use error::{CrediLinkError, Result};
pub use features::{FeatureKey, ProfileFeatures, ScrapedData};
pub use metrics::{ClassificationReport, ConfusionMatrix, ModelPerformance, TestResults};
pub use pipeline::{EvaluationConfig, EvaluationPipeline, EvaluationResults};
pub use services::{CsvUpload, DatasetTester, LocalModelService, PerformanceSource, Predictor, ProfileScraper};
