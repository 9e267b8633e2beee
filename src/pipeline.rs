// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Reproducible evaluation pipeline for fake-profile detection
//!
//! Orchestrates:
//! - Reference dataset loading (synthetic or CSV)
//! - Model training and held-out evaluation
//! - Metrics computation
//! - Results serialization (JSON and Markdown)

use crate::analyzer::credibility_score;
use crate::classifiers::ModelType;
use crate::config::ServiceConfig;
use crate::datasets::{Dataset, Verdict};
use crate::metrics::{ClassificationReport, ModelPerformance};
use crate::services::LocalModelService;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Configuration for the evaluation pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub service: ServiceConfig,
    /// Labelled CSV to use instead of the synthetic reference set
    pub dataset_path: Option<PathBuf>,
    /// Specific models to evaluate (empty = all)
    pub models: Vec<ModelType>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            dataset_path: None,
            models: vec![],
        }
    }
}

impl EvaluationConfig {
    pub fn load_dataset(&self) -> Result<Dataset> {
        let svc = &self.service;
        let dataset = match self.dataset_path {
            Some(ref path) => {
                tracing::info!("Loading reference dataset from {}", path.display());
                Dataset::load_csv(path, svc.train_fraction, svc.seed)
                    .with_context(|| format!("loading reference dataset {}", path.display()))?
            }
            None => {
                tracing::info!("Loading synthetic dataset with seed {}", svc.seed);
                Dataset::load_synthetic(svc.reference_size, svc.train_fraction, svc.seed)
            }
        };

        tracing::info!(
            "Dataset loaded: {} samples (train={}, test={})",
            dataset.total_samples(),
            dataset.train.len(),
            dataset.test.len()
        );
        Ok(dataset)
    }
}

/// Results from a single model evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResult {
    pub model: ModelType,
    pub model_description: String,
    pub report: ClassificationReport,
    pub predictions_sample: Vec<PredictionSample>,
    pub training_samples: usize,
    pub eval_samples: usize,
}

/// A sample prediction for inspection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionSample {
    pub id: String,
    pub predicted: Verdict,
    pub actual: Verdict,
    /// P(fake)
    pub probability: f64,
    pub credibility_score: u8,
    pub correct: bool,
}

/// Complete evaluation results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResults {
    pub config: EvaluationConfig,
    pub dataset_info: DatasetInfo,
    pub model_results: Vec<ModelResult>,
    pub summary: EvaluationSummary,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub id: String,
    pub name: String,
    pub total_samples: usize,
    pub train_samples: usize,
    pub test_samples: usize,
    pub label_distribution: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub best_model: Option<ModelType>,
    pub best_f1: f64,
    pub best_accuracy: f64,
    pub performance: Vec<ModelPerformance>,
}

/// Main evaluation pipeline
pub struct EvaluationPipeline {
    config: EvaluationConfig,
}

impl EvaluationPipeline {
    pub fn new(config: EvaluationConfig) -> Self {
        Self { config }
    }

    /// Load the reference dataset, train every model and evaluate
    pub fn run(&self) -> Result<EvaluationResults> {
        let dataset = self.config.load_dataset()?;
        let service = LocalModelService::with_reference(self.config.service.clone(), dataset);
        self.run_on(&service)
    }

    /// Evaluate the models already trained by `service` on its held-out split
    pub fn run_on(&self, service: &LocalModelService) -> Result<EvaluationResults> {
        let dataset = service.reference();
        let eval_samples = &dataset.test;
        anyhow::ensure!(!eval_samples.is_empty(), "reference dataset has an empty test split");

        let dataset_info = DatasetInfo {
            id: dataset.config.id.clone(),
            name: dataset.config.name.clone(),
            total_samples: dataset.total_samples(),
            train_samples: dataset.train.len(),
            test_samples: eval_samples.len(),
            label_distribution: Dataset::label_distribution(eval_samples)
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        };

        let mut model_results = Vec::new();
        for model in ModelType::ALL {
            // Filter if specific models requested
            if !self.config.models.is_empty() && !self.config.models.contains(&model) {
                continue;
            }

            tracing::info!("Evaluating model: {}", model);
            let classifier = service.classifier(model)?;
            let scores = classifier.score_batch(eval_samples);

            let pred_labels: Vec<Verdict> = scores.iter().map(|s| s.verdict).collect();
            let true_labels: Vec<Verdict> = eval_samples.iter().map(|s| s.label).collect();
            let probabilities: Vec<f64> = scores.iter().map(|s| s.probability).collect();
            let report = ClassificationReport::from_predictions_with_probs(&pred_labels, &true_labels, &probabilities);

            tracing::info!(
                "  {} - Accuracy: {:.4}, F1: {:.4}, MCC: {:.4}",
                model,
                report.accuracy,
                report.f1_score,
                report.mcc
            );

            // Sample predictions for inspection (first 10 errors, first 10 correct)
            let mut predictions_sample = Vec::new();
            let (mut errors, mut corrects) = (0, 0);
            for (score, sample) in scores.iter().zip(eval_samples) {
                let correct = score.verdict == sample.label;
                if (!correct && errors < 10) || (correct && corrects < 10) {
                    predictions_sample.push(PredictionSample {
                        id: sample.id.clone(),
                        predicted: score.verdict,
                        actual: sample.label,
                        probability: score.probability,
                        credibility_score: credibility_score(&sample.features),
                        correct,
                    });
                    if correct {
                        corrects += 1;
                    } else {
                        errors += 1;
                    }
                }
                if errors >= 10 && corrects >= 10 {
                    break;
                }
            }

            model_results.push(ModelResult {
                model,
                model_description: classifier.description().to_string(),
                report,
                predictions_sample,
                training_samples: dataset.train.len(),
                eval_samples: eval_samples.len(),
            });
        }

        Ok(EvaluationResults {
            config: self.config.clone(),
            dataset_info,
            summary: Self::summarize(&model_results),
            model_results,
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    fn summarize(model_results: &[ModelResult]) -> EvaluationSummary {
        let mut summary = EvaluationSummary {
            best_model: None,
            best_f1: 0.0,
            best_accuracy: 0.0,
            performance: Vec::with_capacity(model_results.len()),
        };

        for r in model_results {
            if summary.best_model.is_none() || r.report.f1_score > summary.best_f1 {
                summary.best_model = Some(r.model);
                summary.best_f1 = r.report.f1_score;
                summary.best_accuracy = r.report.accuracy;
            }
            summary.performance.push(ModelPerformance {
                model: r.model,
                results: r.report.test_results(),
            });
        }
        summary
    }

    /// Save results to JSON file
    pub fn save_results(results: &EvaluationResults, output_path: &Path) -> Result<()> {
        std::fs::create_dir_all(output_path.parent().unwrap_or(Path::new(".")))?;
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(output_path, json)
            .with_context(|| format!("writing {}", output_path.display()))?;
        tracing::info!("Results saved to {}", output_path.display());
        Ok(())
    }

    /// Generate a markdown report
    pub fn generate_report(results: &EvaluationResults) -> String {
        let mut report = String::new();

        report.push_str("# CrediLink Model Evaluation Report\n\n");
        report.push_str(&format!("**Generated:** {}\n\n", results.timestamp.format("%Y-%m-%d %H:%M:%S UTC")));
        report.push_str(&format!("**Version:** {}\n\n", results.version));

        report.push_str("## Dataset\n\n");
        report.push_str(&format!("- **ID:** {}\n", results.dataset_info.id));
        report.push_str(&format!("- **Name:** {}\n", results.dataset_info.name));
        report.push_str(&format!("- **Total Samples:** {}\n", results.dataset_info.total_samples));
        report.push_str(&format!(
            "- **Split Sizes:** Train={}, Test={}\n",
            results.dataset_info.train_samples, results.dataset_info.test_samples
        ));
        for (label, count) in &results.dataset_info.label_distribution {
            report.push_str(&format!("- **{} (test):** {}\n", label, count));
        }
        report.push('\n');

        report.push_str("## Summary\n\n");
        match results.summary.best_model {
            Some(best) => report.push_str(&format!(
                "**Best Model:** {} (F1={:.4}, Accuracy={:.4})\n\n",
                best, results.summary.best_f1, results.summary.best_accuracy
            )),
            None => report.push_str("**Best Model:** none evaluated\n\n"),
        }

        report.push_str("### Model Comparison\n\n");
        report.push_str("| Model | Accuracy | F1 Score | Precision | Recall | MCC | AUC-ROC |\n");
        report.push_str("|-------|----------|----------|-----------|--------|-----|---------|\n");

        for result in &results.model_results {
            let auc = result.report.auc_roc.map_or("-".to_string(), |v| format!("{:.4}", v));
            report.push_str(&format!(
                "| {} | {:.4} | {:.4} | {:.4} | {:.4} | {:.4} | {} |\n",
                result.model,
                result.report.accuracy,
                result.report.f1_score,
                result.report.precision,
                result.report.recall,
                result.report.mcc,
                auc
            ));
        }

        report.push_str("\n## Detailed Results\n\n");

        for result in &results.model_results {
            report.push_str(&format!("### {}\n\n", result.model));
            report.push_str(&format!("*{}*\n\n", result.model_description));
            report.push_str(&format!("- Training samples: {}\n", result.training_samples));
            report.push_str(&format!("- Evaluation samples: {}\n\n", result.eval_samples));
            report.push_str(&format!("```\n{}\n```\n\n", result.report.format()));

            let misses: Vec<_> = result.predictions_sample.iter().filter(|p| !p.correct).take(3).collect();
            if !misses.is_empty() {
                report.push_str("#### Sample Misclassifications\n\n");
                for p in misses {
                    report.push_str(&format!(
                        "- `{}`: predicted {} (P(fake)={:.2}), actual {}, credibility score {}\n",
                        p.id, p.predicted, p.probability, p.actual, p.credibility_score
                    ));
                }
                report.push('\n');
            }
        }

        report.push_str("## Configuration\n\n");
        report.push_str(&format!(
            "```json\n{}\n```\n",
            serde_json::to_string_pretty(&results.config).unwrap_or_default()
        ));

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> EvaluationConfig {
        EvaluationConfig {
            service: ServiceConfig {
                reference_size: 300,
                ..ServiceConfig::default()
            },
            ..EvaluationConfig::default()
        }
    }

    #[test]
    fn test_pipeline_synthetic() {
        let results = EvaluationPipeline::new(small_config()).run().expect("Pipeline should succeed");

        assert_eq!(results.model_results.len(), 3);
        assert!(results.summary.best_model.is_some());
        assert!(results.summary.best_f1 > 0.8 && results.summary.best_f1 <= 1.0);
        let order: Vec<_> = results.summary.performance.iter().map(|p| p.model).collect();
        assert_eq!(order, ModelType::ALL.to_vec());
        for r in &results.model_results {
            assert!(r.report.auc_roc.is_some());
            assert!(r.predictions_sample.len() <= 20);
        }
    }

    #[test]
    fn test_pipeline_specific_models() {
        let config = EvaluationConfig {
            models: vec![ModelType::Knn, ModelType::NaiveBayes],
            ..small_config()
        };
        let results = EvaluationPipeline::new(config).run().expect("Pipeline should succeed");
        let models: Vec<_> = results.model_results.iter().map(|r| r.model).collect();
        assert_eq!(models, vec![ModelType::Knn, ModelType::NaiveBayes]);
    }

    #[test]
    fn test_summary_matches_service_performance() {
        let config = small_config();
        let service = LocalModelService::new(config.service.clone());
        let results = EvaluationPipeline::new(config).run_on(&service).unwrap();

        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let perf = rt
            .block_on(crate::services::PerformanceSource::models_performance(&service))
            .unwrap();
        assert_eq!(results.summary.performance, perf);
    }

    #[test]
    fn test_generate_report_and_save() {
        let results = EvaluationPipeline::new(small_config()).run().unwrap();
        let report = EvaluationPipeline::generate_report(&results);

        assert!(report.contains("CrediLink Model Evaluation Report"));
        assert!(report.contains("Model Comparison"));
        assert!(report.contains("Best Model"));
        assert!(report.contains("| LinearSVC |"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("results.json");
        EvaluationPipeline::save_results(&results, &path).unwrap();
        let saved: EvaluationResults = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.model_results.len(), 3);
    }

    #[test]
    fn test_missing_dataset_path_fails() {
        let config = EvaluationConfig {
            dataset_path: Some(PathBuf::from("/nonexistent/profiles.csv")),
            ..small_config()
        };
        assert!(EvaluationPipeline::new(config).run().is_err());
    }
}
