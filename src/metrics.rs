// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Evaluation metrics for fake-profile classification
//!
//! FAKE is the positive class throughout:
//! - Confusion Matrix
//! - Accuracy, Precision, Recall, F1-Score
//! - AUC-ROC and Brier score (for probabilistic predictions)
//! - Matthews Correlation Coefficient (MCC)

use crate::classifiers::ModelType;
use crate::datasets::Verdict;
use serde::{Deserialize, Serialize};

/// Confusion matrix for binary classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfusionMatrix {
    /// Fake accounts flagged as fake
    pub true_positive: usize,
    /// Genuine accounts flagged as fake
    pub false_positive: usize,
    /// Fake accounts passed as genuine
    pub false_negative: usize,
    /// Genuine accounts passed as genuine
    pub true_negative: usize,
}

impl ConfusionMatrix {
    /// Create from predictions and ground truth labels
    pub fn from_predictions(predictions: &[Verdict], ground_truth: &[Verdict]) -> Self {
        debug_assert_eq!(predictions.len(), ground_truth.len());

        let mut matrix = Self::default();
        for (pred, truth) in predictions.iter().zip(ground_truth.iter()) {
            match (pred, truth) {
                (Verdict::Fake, Verdict::Fake) => matrix.true_positive += 1,
                (Verdict::Real, Verdict::Real) => matrix.true_negative += 1,
                (Verdict::Fake, Verdict::Real) => matrix.false_positive += 1,
                (Verdict::Real, Verdict::Fake) => matrix.false_negative += 1,
            }
        }
        matrix
    }

    /// Total number of samples
    pub fn total(&self) -> usize {
        self.true_positive + self.true_negative + self.false_positive + self.false_negative
    }

    /// Accuracy: (TP + TN) / Total
    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    /// Precision: TP / (TP + FP)
    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    /// Recall (Sensitivity): TP / (TP + FN)
    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    /// Specificity: TN / (TN + FP)
    pub fn specificity(&self) -> f64 {
        ratio(self.true_negative, self.true_negative + self.false_positive)
    }

    /// F1 Score: 2 * (Precision * Recall) / (Precision + Recall)
    pub fn f1_score(&self) -> f64 {
        self.f_beta_score(1.0)
    }

    /// F-beta Score: (1 + beta^2) * (Precision * Recall) / (beta^2 * Precision + Recall)
    pub fn f_beta_score(&self, beta: f64) -> f64 {
        let precision = self.precision();
        let recall = self.recall();
        let beta_sq = beta * beta;
        let denom = beta_sq * precision + recall;
        if denom == 0.0 {
            return 0.0;
        }
        (1.0 + beta_sq) * precision * recall / denom
    }

    /// Matthews Correlation Coefficient, in [-1, 1]
    pub fn mcc(&self) -> f64 {
        let tp = self.true_positive as f64;
        let tn = self.true_negative as f64;
        let fp = self.false_positive as f64;
        let fn_ = self.false_negative as f64;

        let numerator = tp * tn - fp * fn_;
        let denominator = ((tp + fp) * (tp + fn_) * (tn + fp) * (tn + fn_)).sqrt();

        if denominator == 0.0 {
            return 0.0;
        }
        numerator / denominator
    }

    /// Balanced Accuracy: (Sensitivity + Specificity) / 2
    pub fn balanced_accuracy(&self) -> f64 {
        (self.recall() + self.specificity()) / 2.0
    }
}

fn ratio(num: usize, denom: usize) -> f64 {
    if denom == 0 {
        return 0.0;
    }
    num as f64 / denom as f64
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Headline scores for one model on one dataset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResults {
    pub accuracy: f64,
    pub f1_score: f64,
    pub precision: f64,
    pub recall: f64,
    pub confusion_matrix: ConfusionMatrix,
}

impl TestResults {
    /// Scores as fractions rounded to four decimals
    pub fn from_confusion_matrix(cm: ConfusionMatrix) -> Self {
        Self {
            accuracy: round4(cm.accuracy()),
            f1_score: round4(cm.f1_score()),
            precision: round4(cm.precision()),
            recall: round4(cm.recall()),
            confusion_matrix: cm,
        }
    }

    pub fn from_predictions(predictions: &[Verdict], ground_truth: &[Verdict]) -> Self {
        Self::from_confusion_matrix(ConfusionMatrix::from_predictions(predictions, ground_truth))
    }
}

/// Test results tagged with the model that produced them
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPerformance {
    pub model: ModelType,
    #[serde(flatten)]
    pub results: TestResults,
}

/// Full classification report with all metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub confusion_matrix: ConfusionMatrix,
    pub accuracy: f64,
    pub balanced_accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub f2_score: f64,
    pub mcc: f64,
    pub specificity: f64,
    pub support: usize,
    /// AUC-ROC score (if probabilities available)
    pub auc_roc: Option<f64>,
    /// Brier score (calibration metric, lower is better)
    pub brier_score: Option<f64>,
}

impl ClassificationReport {
    /// Generate full report from confusion matrix
    pub fn from_confusion_matrix(cm: ConfusionMatrix) -> Self {
        Self {
            accuracy: cm.accuracy(),
            balanced_accuracy: cm.balanced_accuracy(),
            precision: cm.precision(),
            recall: cm.recall(),
            f1_score: cm.f1_score(),
            f2_score: cm.f_beta_score(2.0),
            mcc: cm.mcc(),
            specificity: cm.specificity(),
            support: cm.total(),
            confusion_matrix: cm,
            auc_roc: None,
            brier_score: None,
        }
    }

    /// Generate report from predictions, ground truth and P(fake) scores
    pub fn from_predictions_with_probs(
        predictions: &[Verdict],
        ground_truth: &[Verdict],
        probabilities: &[f64],
    ) -> Self {
        let cm = ConfusionMatrix::from_predictions(predictions, ground_truth);
        let mut report = Self::from_confusion_matrix(cm);
        report.auc_roc = Some(auc_roc(ground_truth, probabilities));
        report.brier_score = Some(brier_score(ground_truth, probabilities));
        report
    }

    /// Headline subset for the dashboard views
    pub fn test_results(&self) -> TestResults {
        TestResults::from_confusion_matrix(self.confusion_matrix)
    }

    /// Format as a human-readable string
    pub fn format(&self) -> String {
        let mut out = format!(
            r#"Classification Report
=====================
Accuracy:          {:.4} ({:.2}%)
Balanced Accuracy: {:.4} ({:.2}%)
Precision:         {:.4}
Recall:            {:.4}
F1 Score:          {:.4}
F2 Score:          {:.4}
MCC:               {:.4}
Specificity:       {:.4}
Support:           {}

Confusion Matrix:
                Predicted
                FAKE     REAL
Actual FAKE   {:>6}   {:>6}
       REAL   {:>6}   {:>6}
"#,
            self.accuracy, self.accuracy * 100.0,
            self.balanced_accuracy, self.balanced_accuracy * 100.0,
            self.precision,
            self.recall,
            self.f1_score,
            self.f2_score,
            self.mcc,
            self.specificity,
            self.support,
            self.confusion_matrix.true_positive, self.confusion_matrix.false_negative,
            self.confusion_matrix.false_positive, self.confusion_matrix.true_negative,
        );

        if let Some(auc) = self.auc_roc {
            out.push_str(&format!("\nAUC-ROC:           {:.4}\n", auc));
        }
        if let Some(brier) = self.brier_score {
            out.push_str(&format!("Brier Score:       {:.4}\n", brier));
        }
        out
    }
}

/// AUC-ROC via the trapezoidal rule over descending P(fake)
fn auc_roc(ground_truth: &[Verdict], probabilities: &[f64]) -> f64 {
    let mut pairs: Vec<(Verdict, f64)> = ground_truth
        .iter()
        .copied()
        .zip(probabilities.iter().copied())
        .collect();
    pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let n_pos = pairs.iter().filter(|(l, _)| *l == Verdict::Fake).count() as f64;
    let n_neg = pairs.len() as f64 - n_pos;
    if n_pos == 0.0 || n_neg == 0.0 {
        return 0.5;
    }

    let (mut tp, mut fp) = (0.0, 0.0);
    let (mut tpr_prev, mut fpr_prev) = (0.0, 0.0);
    let mut auc = 0.0;

    for (label, _) in &pairs {
        if *label == Verdict::Fake {
            tp += 1.0;
        } else {
            fp += 1.0;
        }
        let tpr = tp / n_pos;
        let fpr = fp / n_neg;
        auc += (fpr - fpr_prev) * (tpr + tpr_prev) / 2.0;
        tpr_prev = tpr;
        fpr_prev = fpr;
    }

    auc
}

fn brier_score(ground_truth: &[Verdict], probabilities: &[f64]) -> f64 {
    if ground_truth.is_empty() {
        return 1.0;
    }
    let sum: f64 = ground_truth
        .iter()
        .zip(probabilities.iter())
        .map(|(label, prob)| (prob - label.to_binary() as f64).powi(2))
        .sum();
    sum / ground_truth.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::Verdict::{Fake, Real};

    #[test]
    fn test_confusion_matrix_perfect() {
        let predictions = vec![Fake, Fake, Real, Real];
        let ground_truth = vec![Fake, Fake, Real, Real];

        let cm = ConfusionMatrix::from_predictions(&predictions, &ground_truth);

        assert_eq!(cm.true_positive, 2);
        assert_eq!(cm.true_negative, 2);
        assert_eq!(cm.false_positive, 0);
        assert_eq!(cm.false_negative, 0);
        assert!((cm.accuracy() - 1.0).abs() < 1e-6);
        assert!((cm.f1_score() - 1.0).abs() < 1e-6);
        assert!((cm.mcc() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_confusion_matrix_worst() {
        let predictions = vec![Real, Real, Fake, Fake];
        let ground_truth = vec![Fake, Fake, Real, Real];

        let cm = ConfusionMatrix::from_predictions(&predictions, &ground_truth);

        assert_eq!(cm.false_positive, 2);
        assert_eq!(cm.false_negative, 2);
        assert!(cm.accuracy().abs() < 1e-6);
        assert!((cm.mcc() + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_matrix_scores_zero() {
        let cm = ConfusionMatrix::default();
        assert_eq!(cm.accuracy(), 0.0);
        assert_eq!(cm.precision(), 0.0);
        assert_eq!(cm.f1_score(), 0.0);
        assert_eq!(cm.mcc(), 0.0);
    }

    #[test]
    fn test_test_results_rounding() {
        // 2 of 3 correct
        let results = TestResults::from_predictions(&[Fake, Real, Fake], &[Fake, Real, Real]);
        assert_eq!(results.accuracy, 0.6667);
        assert_eq!(results.precision, 0.5);
        assert_eq!(results.recall, 1.0);
        assert_eq!(results.confusion_matrix.false_positive, 1);
    }

    #[test]
    fn test_model_performance_wire_shape() {
        let perf = ModelPerformance {
            model: ModelType::LinearSvc,
            results: TestResults::from_predictions(&[Fake], &[Fake]),
        };
        let json = serde_json::to_value(perf).unwrap();
        assert_eq!(json["model"], "LinearSVC");
        assert_eq!(json["f1Score"], 1.0);
        assert_eq!(json["confusionMatrix"]["truePositive"], 1);
    }

    #[test]
    fn test_auc_roc_perfect() {
        let auc = auc_roc(&[Fake, Fake, Real, Real], &[0.9, 0.8, 0.2, 0.1]);
        assert!((auc - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_brier_score_perfect() {
        let brier = brier_score(&[Fake, Real], &[1.0, 0.0]);
        assert!(brier.abs() < 1e-6);
    }

    #[test]
    fn test_classification_report_format() {
        let report = ClassificationReport::from_predictions_with_probs(
            &[Fake, Fake, Real, Real],
            &[Fake, Real, Real, Real],
            &[0.9, 0.6, 0.3, 0.1],
        );
        let formatted = report.format();

        assert!(formatted.contains("Classification Report"));
        assert!(formatted.contains("Confusion Matrix"));
        assert!(formatted.contains("AUC-ROC"));
        assert_eq!(report.test_results().confusion_matrix.true_negative, 2);
    }
}
