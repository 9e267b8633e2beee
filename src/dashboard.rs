// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Headless dashboard views
//!
//! Every view owns its own state (input, loading flag, result, error) and is
//! driven in two halves: `begin_*` validates input and enters the loading
//! state, `complete` stores the outcome and leaves it. The async `submit`
//! methods tie the two halves around a single service call. Views render to
//! plain text.

use crate::analyzer::{breakdown, plain_number, FeatureCredibility};
use crate::classifiers::{ModelType, Prediction};
use crate::error::Result;
use crate::features::{FeatureKey, ProfileFeatures, ScrapedData};
use crate::metrics::{ModelPerformance, TestResults};
use crate::services::{CsvUpload, DatasetTester, PerformanceSource, Predictor, ProfileScraper};
use serde::Serialize;

pub const MSG_EMPTY_URL: &str = "Please enter a URL or handle.";
pub const MSG_CHECK_FAILED: &str = "Failed to check profile. Please try again.";
pub const MSG_PREDICT_FAILED: &str = "Prediction failed. Please try again.";
pub const MSG_NO_FILE: &str = "Please select a CSV file to test.";
pub const MSG_DATASET_FAILED: &str = "Failed to process the dataset.";
pub const MSG_PERFORMANCE_FAILED: &str = "Failed to load model performance data.";

/// Model used for URL checks
pub const URL_CHECK_MODEL: ModelType = ModelType::LinearSvc;

// ──────────────────── navigation ────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Page {
    #[default]
    Dashboard,
    Comparison,
}

impl Page {
    pub fn label(self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Comparison => "Model Comparison",
        }
    }
}

/// Input tabs on the dashboard page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum DashboardMode {
    #[default]
    Url,
    Manual,
    Dataset,
}

impl DashboardMode {
    pub const ALL: [DashboardMode; 3] = [DashboardMode::Url, DashboardMode::Manual, DashboardMode::Dataset];

    pub fn label(self) -> &'static str {
        match self {
            DashboardMode::Url => "URL Profile Check",
            DashboardMode::Manual => "Manual Input",
            DashboardMode::Dataset => "Dataset Testing",
        }
    }
}

/// Navigation events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMsg {
    Navigate(Page),
    SelectMode(DashboardMode),
}

/// Page and tab selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppModel {
    pub page: Page,
    pub mode: DashboardMode,
}

impl AppModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a navigation event. Returns `true` if anything changed.
    pub fn update(&mut self, msg: AppMsg) -> bool {
        match msg {
            AppMsg::Navigate(page) if page != self.page => {
                self.page = page;
                true
            }
            AppMsg::SelectMode(mode) if mode != self.mode => {
                self.mode = mode;
                true
            }
            _ => false,
        }
    }

    /// Header bar with the current page and, on the dashboard, the active tab
    pub fn render_header(&self) -> String {
        let mark = |selected: bool, label: &str| {
            if selected {
                format!("[{}]", label)
            } else {
                format!(" {} ", label)
            }
        };

        let mut out = String::from("CrediLink  ");
        for page in [Page::Dashboard, Page::Comparison] {
            out.push_str(&mark(page == self.page, page.label()));
            out.push(' ');
        }
        out.push('\n');

        if self.page == Page::Dashboard {
            for mode in DashboardMode::ALL {
                out.push_str(&mark(mode == self.mode, mode.label()));
                out.push(' ');
            }
            out.push('\n');
        }
        out
    }
}

fn percent(fraction: f64) -> String {
    format!("{:.0}%", fraction * 100.0)
}

fn failure(message: &'static str, err: &crate::error::CrediLinkError) -> String {
    tracing::warn!("{}: {}", message, err);
    message.to_string()
}

// ──────────────────── URL check ────────────────────

/// Scraped data and the verdict it received
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlReport {
    pub scraped_data: ScrapedData,
    pub prediction: Prediction,
}

impl UrlReport {
    pub fn breakdown(&self) -> Vec<FeatureCredibility> {
        breakdown(&self.scraped_data)
    }
}

async fn check_profile<S, P>(input: &str, scraper: &S, predictor: &P) -> Result<UrlReport>
where
    S: ProfileScraper,
    P: Predictor,
{
    let scraped_data = scraper.scrape_profile(input).await?;
    let prediction = predictor.predict(&scraped_data.features, URL_CHECK_MODEL).await?;
    Ok(UrlReport {
        scraped_data,
        prediction,
    })
}

#[derive(Debug, Clone, Default)]
pub struct UrlChecker {
    pub input: String,
    pub is_loading: bool,
    pub report: Option<UrlReport>,
    pub error: Option<String>,
}

impl UrlChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    /// Returns `false` (and sets the inline error) when there is nothing to check
    pub fn begin_check(&mut self) -> bool {
        if self.input.is_empty() {
            self.error = Some(MSG_EMPTY_URL.to_string());
            return false;
        }
        self.is_loading = true;
        self.report = None;
        self.error = None;
        true
    }

    pub fn complete(&mut self, outcome: Result<UrlReport>) {
        match outcome {
            Ok(report) => self.report = Some(report),
            Err(err) => self.error = Some(failure(MSG_CHECK_FAILED, &err)),
        }
        self.is_loading = false;
    }

    /// Scrape the profile, then classify it; the prediction is skipped if scraping fails
    pub async fn submit<S, P>(&mut self, scraper: &S, predictor: &P)
    where
        S: ProfileScraper,
        P: Predictor,
    {
        if !self.begin_check() {
            return;
        }
        let outcome = check_profile(&self.input, scraper, predictor).await;
        self.complete(outcome);
    }

    pub fn render(&self) -> String {
        let mut out = String::from("Social Media URL Profile Check\n");
        out.push_str("Enter a profile URL or handle to automatically analyze its credibility.\n\n");

        if self.is_loading {
            out.push_str("Analyzing...\n");
        }
        if let Some(ref error) = self.error {
            out.push_str(&format!("{}\n", error));
        }

        if let Some(ref report) = self.report {
            out.push_str(&format!(
                "Prediction: {}    Confidence Score: {}    Final Credibility Score: {}%\n\n",
                report.prediction.result,
                percent(report.prediction.confidence),
                report.scraped_data.final_credibility_score
            ));

            out.push_str("Feature Credibility Breakdown\n");
            out.push_str(&format!("{:<24} {:<16} {}\n", "Feature", "Value", "Indicator"));
            out.push_str(&format!("{}\n", "-".repeat(50)));
            for row in report.breakdown() {
                out.push_str(&format!("{:<24} {:<16} {}\n", row.label, row.analysis, row.indicator));
            }
        }
        out
    }
}

// ──────────────────── manual input ────────────────────

#[derive(Debug, Clone)]
pub struct ManualInputForm {
    pub features: ProfileFeatures,
    pub model: ModelType,
    pub is_loading: bool,
    pub prediction: Option<Prediction>,
    pub error: Option<String>,
}

impl Default for ManualInputForm {
    fn default() -> Self {
        Self {
            features: ProfileFeatures::default(),
            model: ModelType::LinearSvc,
            is_loading: false,
            prediction: None,
            error: None,
        }
    }
}

impl ManualInputForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_feature(&mut self, key: FeatureKey, value: f64) {
        self.features = self.features.with(key, value);
    }

    pub fn set_model(&mut self, model: ModelType) {
        self.model = model;
    }

    pub fn begin_predict(&mut self) {
        self.is_loading = true;
        self.prediction = None;
        self.error = None;
    }

    pub fn complete(&mut self, outcome: Result<Prediction>) {
        match outcome {
            Ok(prediction) => self.prediction = Some(prediction),
            Err(err) => self.error = Some(failure(MSG_PREDICT_FAILED, &err)),
        }
        self.is_loading = false;
    }

    pub async fn submit<P: Predictor>(&mut self, predictor: &P) {
        self.begin_predict();
        let outcome = predictor.predict(&self.features, self.model).await;
        self.complete(outcome);
    }

    pub fn render(&self) -> String {
        let mut out = String::from("Manual Feature Input\n");
        out.push_str("Enter profile feature values to classify an account.\n\n");

        for (key, value) in self.features.iter() {
            out.push_str(&format!("{:<24} {}\n", key.label(), plain_number(value)));
        }
        out.push_str(&format!("{:<24} {}\n\n", "ML Model", self.model));

        if self.is_loading {
            out.push_str("Predicting...\n");
        }
        if let Some(ref error) = self.error {
            out.push_str(&format!("{}\n", error));
        }
        if let Some(ref prediction) = self.prediction {
            out.push_str("Prediction Result\n");
            out.push_str(&format!("{}\n", prediction.result));
            out.push_str(&format!("Confidence: {}\n", percent(prediction.confidence)));
        }
        out
    }
}

// ──────────────────── dataset testing ────────────────────

#[derive(Debug, Clone)]
pub struct DatasetTesterView {
    pub file: Option<CsvUpload>,
    pub model: ModelType,
    pub is_loading: bool,
    pub results: Option<TestResults>,
    pub error: Option<String>,
}

impl Default for DatasetTesterView {
    fn default() -> Self {
        Self {
            file: None,
            model: ModelType::LinearSvc,
            is_loading: false,
            results: None,
            error: None,
        }
    }
}

impl DatasetTesterView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_file(&mut self, upload: CsvUpload) {
        self.file = Some(upload);
    }

    pub fn set_model(&mut self, model: ModelType) {
        self.model = model;
    }

    /// Returns `false` (and sets the inline error) when no file is selected
    pub fn begin_test(&mut self) -> bool {
        if self.file.is_none() {
            self.error = Some(MSG_NO_FILE.to_string());
            return false;
        }
        self.is_loading = true;
        self.results = None;
        self.error = None;
        true
    }

    pub fn complete(&mut self, outcome: Result<TestResults>) {
        match outcome {
            Ok(results) => self.results = Some(results),
            Err(err) => self.error = Some(failure(MSG_DATASET_FAILED, &err)),
        }
        self.is_loading = false;
    }

    pub async fn submit<T: DatasetTester>(&mut self, tester: &T) {
        if !self.begin_test() {
            return;
        }
        let Some(ref upload) = self.file else {
            return;
        };
        let outcome = tester.test_dataset(upload, self.model).await;
        self.complete(outcome);
    }

    pub fn render(&self) -> String {
        let mut out = String::from("Dataset Testing\n");
        out.push_str("Upload a CSV file to evaluate model performance.\n\n");
        let file = self.file.as_ref().map_or("(none)", |f| f.name.as_str());
        out.push_str(&format!("CSV File: {}\nML Model: {}\n\n", file, self.model));

        if self.is_loading {
            out.push_str("Testing...\n");
        }
        if let Some(ref error) = self.error {
            out.push_str(&format!("{}\n", error));
        }

        if let Some(ref results) = self.results {
            out.push_str("Performance Statistics\n");
            for (label, value) in [
                ("Accuracy", results.accuracy),
                ("F1-Score", results.f1_score),
                ("Precision", results.precision),
                ("Recall", results.recall),
            ] {
                out.push_str(&format!("  {:<10} {}\n", label, plain_number(value)));
            }

            let cm = &results.confusion_matrix;
            out.push_str("\nConfusion Matrix\n");
            out.push_str(&format!(
                "  {:>6} True Positive    {:>6} False Positive\n",
                cm.true_positive, cm.false_positive
            ));
            out.push_str(&format!(
                "  {:>6} False Negative   {:>6} True Negative\n",
                cm.false_negative, cm.true_negative
            ));
        }
        out
    }
}

// ──────────────────── model comparison ────────────────────

const CHART_WIDTH: usize = 40;

/// Series drawn for every model, in legend order
pub const CHART_SERIES: [(&str, fn(&TestResults) -> f64); 4] = [
    ("Accuracy", |r: &TestResults| r.accuracy),
    ("F1-Score", |r: &TestResults| r.f1_score),
    ("Precision", |r: &TestResults| r.precision),
    ("Recall", |r: &TestResults| r.recall),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub series: &'static str,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarGroup {
    pub model: ModelType,
    pub bars: Vec<Bar>,
}

#[derive(Debug, Clone)]
pub struct ModelComparison {
    pub data: Vec<ModelPerformance>,
    pub is_loading: bool,
    pub error: Option<String>,
    mounted: bool,
}

impl Default for ModelComparison {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            is_loading: true,
            error: None,
            mounted: false,
        }
    }
}

impl ModelComparison {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn complete(&mut self, outcome: Result<Vec<ModelPerformance>>) {
        match outcome {
            Ok(data) => self.data = data,
            Err(err) => self.error = Some(failure(MSG_PERFORMANCE_FAILED, &err)),
        }
        self.is_loading = false;
    }

    /// Fetch performance data. Only the first call reaches the source.
    pub async fn mount<S: PerformanceSource>(&mut self, source: &S) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        let outcome = source.models_performance().await;
        self.complete(outcome);
    }

    pub fn bar_groups(&self) -> Vec<BarGroup> {
        self.data
            .iter()
            .map(|perf| BarGroup {
                model: perf.model,
                bars: CHART_SERIES
                    .iter()
                    .map(|&(series, metric)| Bar {
                        series,
                        value: metric(&perf.results),
                    })
                    .collect(),
            })
            .collect()
    }

    pub fn render(&self) -> String {
        if self.is_loading {
            return "Loading model performance...\n".to_string();
        }
        if let Some(ref error) = self.error {
            return format!("{}\n", error);
        }

        let mut out = String::from("Model Performance Comparison\n");
        out.push_str("Comparing key performance metrics across different machine learning models.\n");

        for group in self.bar_groups() {
            out.push_str(&format!("\n{}\n", group.model));
            for bar in &group.bars {
                let filled = (bar.value.clamp(0.0, 1.0) * CHART_WIDTH as f64).round() as usize;
                out.push_str(&format!(
                    "  {:<10} {}{} {:.4}\n",
                    bar.series,
                    "█".repeat(filled),
                    "░".repeat(CHART_WIDTH - filled),
                    bar.value
                ));
            }
        }
        out
    }
}
