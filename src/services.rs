// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Service boundaries used by the dashboard views
//!
//! Each view depends only on the capability it needs:
//! - [`Predictor`]: classify one feature record
//! - [`ProfileScraper`]: turn a URL or handle into scraped features
//! - [`DatasetTester`]: score a model against an uploaded CSV
//! - [`PerformanceSource`]: per-model results for the comparison chart
//!
//! [`LocalModelService`] implements all four in-process.

use crate::classifiers::{classifier_for, ModelType, Prediction, ProfileClassifier};
use crate::config::ServiceConfig;
use crate::datasets::{fingerprint, Dataset, Sample, Verdict};
use crate::error::{CrediLinkError, Result};
use crate::features::{ProfileFeatures, ScrapedData};
use crate::metrics::{ModelPerformance, TestResults};
use crate::scraper::SimulatedScraper;
use std::path::Path;

#[allow(async_fn_in_trait)]
pub trait Predictor {
    async fn predict(&self, features: &ProfileFeatures, model: ModelType) -> Result<Prediction>;
}

#[allow(async_fn_in_trait)]
pub trait ProfileScraper {
    async fn scrape_profile(&self, url_or_handle: &str) -> Result<ScrapedData>;
}

#[allow(async_fn_in_trait)]
pub trait DatasetTester {
    async fn test_dataset(&self, upload: &CsvUpload, model: ModelType) -> Result<TestResults>;
}

#[allow(async_fn_in_trait)]
pub trait PerformanceSource {
    async fn models_performance(&self) -> Result<Vec<ModelPerformance>>;
}

/// A CSV file as selected by the user, read whole
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvUpload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl CsvUpload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| CrediLinkError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }
}

/// In-process implementation of every service boundary.
///
/// All three models are trained once, at construction, on the reference
/// dataset's training split.
pub struct LocalModelService {
    config: ServiceConfig,
    reference: Dataset,
    models: Vec<Box<dyn ProfileClassifier>>,
    scraper: SimulatedScraper,
}

impl LocalModelService {
    /// Train on the synthetic reference dataset
    pub fn new(config: ServiceConfig) -> Self {
        let reference = Dataset::load_synthetic(config.reference_size, config.train_fraction, config.seed);
        Self::with_reference(config, reference)
    }

    /// Train on a caller-supplied reference dataset
    pub fn with_reference(config: ServiceConfig, reference: Dataset) -> Self {
        tracing::info!(
            "Training {} models on '{}' ({} train / {} test samples)",
            ModelType::ALL.len(),
            reference.config.name,
            reference.train.len(),
            reference.test.len()
        );

        let models = ModelType::ALL
            .into_iter()
            .map(|model| {
                let mut classifier = classifier_for(model, &config);
                classifier.train(&reference.train);
                tracing::debug!("Trained {}", classifier.name());
                classifier
            })
            .collect();

        Self {
            config,
            reference,
            models,
            scraper: SimulatedScraper::new(),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn reference(&self) -> &Dataset {
        &self.reference
    }

    /// Trained classifier for the given model type
    pub fn classifier(&self, model: ModelType) -> Result<&dyn ProfileClassifier> {
        self.models
            .iter()
            .find(|c| c.model_type() == model && c.is_trained())
            .map(|c| &**c)
            .ok_or(CrediLinkError::Untrained {
                model: model.as_str(),
            })
    }

    /// Evaluate one model on a set of labelled samples
    pub fn evaluate(&self, model: ModelType, samples: &[Sample]) -> Result<TestResults> {
        if samples.is_empty() {
            return Err(CrediLinkError::EmptyDataset);
        }
        let classifier = self.classifier(model)?;
        let predicted: Vec<Verdict> = classifier.score_batch(samples).iter().map(|s| s.verdict).collect();
        let actual: Vec<Verdict> = samples.iter().map(|s| s.label).collect();
        Ok(TestResults::from_predictions(&predicted, &actual))
    }
}

impl Predictor for LocalModelService {
    async fn predict(&self, features: &ProfileFeatures, model: ModelType) -> Result<Prediction> {
        let prediction = self.classifier(model)?.predict(features);
        tracing::debug!(
            "{} predicted {} ({:.3})",
            model,
            prediction.result,
            prediction.confidence
        );
        Ok(prediction)
    }
}

impl ProfileScraper for LocalModelService {
    async fn scrape_profile(&self, url_or_handle: &str) -> Result<ScrapedData> {
        self.scraper.scrape(url_or_handle)
    }
}

impl DatasetTester for LocalModelService {
    async fn test_dataset(&self, upload: &CsvUpload, model: ModelType) -> Result<TestResults> {
        tracing::info!(
            "Testing {} on {} ({} bytes, sha256 {})",
            model,
            upload.name,
            upload.bytes.len(),
            fingerprint(&upload.bytes)
        );
        let samples = Dataset::samples_from_csv(upload.bytes.as_slice(), &upload.name)?;
        let results = self.evaluate(model, &samples)?;
        tracing::info!(
            "  {} on {} rows - Accuracy: {:.4}, F1: {:.4}",
            model,
            samples.len(),
            results.accuracy,
            results.f1_score
        );
        Ok(results)
    }
}

impl PerformanceSource for LocalModelService {
    async fn models_performance(&self) -> Result<Vec<ModelPerformance>> {
        ModelType::ALL
            .into_iter()
            .map(|model| {
                Ok(ModelPerformance {
                    model,
                    results: self.evaluate(model, &self.reference.test)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "profile pic,nums/length username,fullname words,nums/length fullname,name==username,description length,external URL,private,#posts,#followers,#follows,fake\n";

    fn service() -> LocalModelService {
        LocalModelService::new(ServiceConfig {
            reference_size: 400,
            ..ServiceConfig::default()
        })
    }

    #[tokio::test]
    async fn test_predict_defaults() {
        let svc = service();
        let prediction = svc.predict(&ProfileFeatures::default(), ModelType::LinearSvc).await.unwrap();
        assert_eq!(prediction.result, Verdict::Real);
        assert!((0.0..=1.0).contains(&prediction.confidence));
    }

    #[tokio::test]
    async fn test_performance_order_and_range() {
        let svc = service();
        let perf = svc.models_performance().await.unwrap();
        let order: Vec<ModelType> = perf.iter().map(|p| p.model).collect();
        assert_eq!(order, ModelType::ALL.to_vec());
        for p in &perf {
            assert!(p.results.accuracy > 0.8, "{} accuracy {}", p.model, p.results.accuracy);
            assert!(p.results.f1_score <= 1.0);
            assert_eq!(p.results.confusion_matrix.total(), svc.reference().test.len());
        }
    }

    #[tokio::test]
    async fn test_dataset_upload() {
        let svc = service();
        let csv = format!(
            "{}1,0,2,0,0,90,1,0,300,1500,250,0\n0,0.67,0,0,1,0,0,0,0,4,3200,1\n",
            HEADER
        );
        let results = svc
            .test_dataset(&CsvUpload::new("two.csv", csv), ModelType::NaiveBayes)
            .await
            .unwrap();
        assert_eq!(results.confusion_matrix.total(), 2);
        assert_eq!(results.accuracy, 1.0);
    }

    #[tokio::test]
    async fn test_dataset_upload_failures() {
        let svc = service();
        let empty = svc.test_dataset(&CsvUpload::new("empty.csv", HEADER), ModelType::Knn).await;
        assert!(empty.is_err());

        let missing = svc
            .test_dataset(&CsvUpload::new("bad.csv", "a,b\n1,2\n"), ModelType::Knn)
            .await;
        assert!(matches!(missing, Err(CrediLinkError::MissingColumn { .. })));

        let nan = svc
            .test_dataset(
                &CsvUpload::new("nan.csv", format!("{}1,0,2,0,0,90,1,0,NaN,1500,250,0\n", HEADER)),
                ModelType::Knn,
            )
            .await;
        assert!(matches!(nan, Err(CrediLinkError::BadValue { record: 1, .. })));
    }

    #[tokio::test]
    async fn test_scrape_through_service() {
        let svc = service();
        let a = svc.scrape_profile("@nasa").await.unwrap();
        let b = svc.scrape_profile("instagram.com/nasa").await.unwrap();
        assert_eq!(a, b);
        assert!(svc.scrape_profile("").await.is_err());
    }

    #[test]
    fn test_csv_upload_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.csv");
        std::fs::write(&path, HEADER).unwrap();
        let upload = CsvUpload::from_path(&path).unwrap();
        assert_eq!(upload.name, "profiles.csv");
        assert_eq!(upload.bytes, HEADER.as_bytes());
        assert!(CsvUpload::from_path(&dir.path().join("nope.csv")).is_err());
    }
}
