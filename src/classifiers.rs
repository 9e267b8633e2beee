// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Profile classifiers
//!
//! Implements the three models offered by the dashboard:
//! - k-nearest neighbours over standardized features
//! - Linear SVM trained with Pegasos sub-gradient descent
//! - Gaussian naive Bayes
//!
//! Count features (posts, followers, ...) are `ln(1 + x)` transformed before
//! standardization.

use crate::config::ServiceConfig;
use crate::datasets::{Sample, Verdict};
use crate::error::CrediLinkError;
use crate::features::{FeatureKey, ProfileFeatures, FEATURE_COUNT};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three supported models
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelType {
    #[serde(rename = "KNN")]
    Knn,
    #[default]
    #[serde(rename = "LinearSVC")]
    LinearSvc,
    #[serde(rename = "NaiveBayes")]
    NaiveBayes,
}

impl ModelType {
    /// All models in display order
    pub const ALL: [ModelType; 3] = [ModelType::Knn, ModelType::LinearSvc, ModelType::NaiveBayes];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Knn => "KNN",
            ModelType::LinearSvc => "LinearSVC",
            ModelType::NaiveBayes => "NaiveBayes",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ModelType::Knn => "k-nearest neighbours vote over standardized features",
            ModelType::LinearSvc => "Linear SVM trained with Pegasos sub-gradient descent",
            ModelType::NaiveBayes => "Gaussian naive Bayes with variance smoothing",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = CrediLinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(|c| c.to_lowercase())
            .collect();
        match key.as_str() {
            "knn" => Ok(ModelType::Knn),
            "linearsvc" | "svc" | "svm" => Ok(ModelType::LinearSvc),
            "naivebayes" | "nb" => Ok(ModelType::NaiveBayes),
            _ => Err(CrediLinkError::UnknownModel { name: s.to_string() }),
        }
    }
}

/// Verdict and its confidence, as shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub result: Verdict,
    /// Probability of `result`, in [0, 1]
    pub confidence: f64,
}

/// Raw model output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub verdict: Verdict,
    /// P(fake)
    pub probability: f64,
}

impl Score {
    fn from_probability(probability: f64) -> Self {
        let probability = probability.clamp(0.0, 1.0);
        Self {
            verdict: if probability > 0.5 { Verdict::Fake } else { Verdict::Real },
            probability,
        }
    }

    pub fn to_prediction(self) -> Prediction {
        let confidence = match self.verdict {
            Verdict::Fake => self.probability,
            Verdict::Real => 1.0 - self.probability,
        };
        Prediction {
            result: self.verdict,
            confidence,
        }
    }
}

/// Trait for all profile classifiers
pub trait ProfileClassifier: Send + Sync {
    /// Train the model on the given samples
    fn train(&mut self, samples: &[Sample]);

    /// Score a single profile
    fn score(&self, features: &ProfileFeatures) -> Score;

    /// Verdict with confidence for a single profile
    fn predict(&self, features: &ProfileFeatures) -> Prediction {
        self.score(features).to_prediction()
    }

    /// Score multiple samples
    fn score_batch(&self, samples: &[Sample]) -> Vec<Score> {
        samples.iter().map(|s| self.score(&s.features)).collect()
    }

    fn model_type(&self) -> ModelType;

    fn is_trained(&self) -> bool;

    fn name(&self) -> &str {
        self.model_type().as_str()
    }

    fn description(&self) -> &str {
        self.model_type().description()
    }
}

/// Log-transform counts, then standardize with training statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureScaler {
    mean: [f64; FEATURE_COUNT],
    std: [f64; FEATURE_COUNT],
}

impl Default for FeatureScaler {
    fn default() -> Self {
        Self {
            mean: [0.0; FEATURE_COUNT],
            std: [1.0; FEATURE_COUNT],
        }
    }
}

impl FeatureScaler {
    fn raw(features: &ProfileFeatures) -> [f64; FEATURE_COUNT] {
        let mut v = features.to_vector();
        for (x, key) in v.iter_mut().zip(FeatureKey::ALL) {
            if key.is_count() {
                *x = x.max(0.0).ln_1p();
            }
        }
        v
    }

    pub fn fit(samples: &[Sample]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let n = samples.len() as f64;
        let rows: Vec<_> = samples.iter().map(|s| Self::raw(&s.features)).collect();

        let mut mean = [0.0; FEATURE_COUNT];
        for row in &rows {
            for (m, x) in mean.iter_mut().zip(row) {
                *m += x / n;
            }
        }
        let mut std = [0.0; FEATURE_COUNT];
        for row in &rows {
            for ((s, x), m) in std.iter_mut().zip(row).zip(&mean) {
                *s += (x - m).powi(2) / n;
            }
        }
        for s in std.iter_mut() {
            // constant columns
            *s = if *s > 1e-12 { s.sqrt() } else { 1.0 };
        }

        Self { mean, std }
    }

    pub fn transform(&self, features: &ProfileFeatures) -> [f64; FEATURE_COUNT] {
        let mut v = Self::raw(features);
        for ((x, m), s) in v.iter_mut().zip(&self.mean).zip(&self.std) {
            *x = (*x - m) / s;
        }
        v
    }
}

fn squared_distance(a: &[f64; FEATURE_COUNT], b: &[f64; FEATURE_COUNT]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// k-nearest neighbours: P(fake) is the fake share of the k closest samples
#[derive(Debug, Clone)]
pub struct KnnClassifier {
    k: usize,
    scaler: FeatureScaler,
    points: Vec<([f64; FEATURE_COUNT], Verdict)>,
}

impl KnnClassifier {
    pub fn new(k: usize) -> Self {
        Self {
            k: k.max(1),
            scaler: FeatureScaler::default(),
            points: Vec::new(),
        }
    }
}

impl ProfileClassifier for KnnClassifier {
    fn train(&mut self, samples: &[Sample]) {
        self.scaler = FeatureScaler::fit(samples);
        self.points = samples
            .iter()
            .map(|s| (self.scaler.transform(&s.features), s.label))
            .collect();
    }

    fn score(&self, features: &ProfileFeatures) -> Score {
        if self.points.is_empty() {
            return Score::from_probability(0.5);
        }
        let x = self.scaler.transform(features);

        let mut distances: Vec<(f64, Verdict)> = self
            .points
            .iter()
            .map(|(p, label)| (squared_distance(&x, p), *label))
            .collect();
        let k = self.k.min(distances.len());
        distances.select_nth_unstable_by(k - 1, |a, b| {
            a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal)
        });

        let fake_votes = distances[..k].iter().filter(|(_, l)| *l == Verdict::Fake).count();
        Score::from_probability(fake_votes as f64 / k as f64)
    }

    fn model_type(&self) -> ModelType {
        ModelType::Knn
    }

    fn is_trained(&self) -> bool {
        !self.points.is_empty()
    }
}

/// Linear SVM (hinge loss, L2 penalty) trained with Pegasos.
///
/// The bias is folded into the weight vector as a constant input.
#[derive(Debug, Clone)]
pub struct LinearSvcClassifier {
    lambda: f64,
    epochs: usize,
    seed: u64,
    scaler: FeatureScaler,
    weights: [f64; FEATURE_COUNT + 1],
    trained: bool,
}

impl LinearSvcClassifier {
    pub fn new(lambda: f64, epochs: usize, seed: u64) -> Self {
        Self {
            lambda: lambda.max(1e-9),
            epochs: epochs.max(1),
            seed,
            scaler: FeatureScaler::default(),
            weights: [0.0; FEATURE_COUNT + 1],
            trained: false,
        }
    }

    fn augment(&self, features: &ProfileFeatures) -> [f64; FEATURE_COUNT + 1] {
        let mut x = [1.0; FEATURE_COUNT + 1];
        x[..FEATURE_COUNT].copy_from_slice(&self.scaler.transform(features));
        x
    }

    /// Signed distance to the separating hyperplane; positive means fake
    pub fn decision_function(&self, features: &ProfileFeatures) -> f64 {
        let x = self.augment(features);
        self.weights.iter().zip(&x).map(|(w, xi)| w * xi).sum()
    }
}

impl ProfileClassifier for LinearSvcClassifier {
    fn train(&mut self, samples: &[Sample]) {
        self.scaler = FeatureScaler::fit(samples);
        self.weights = [0.0; FEATURE_COUNT + 1];
        self.trained = false;
        if samples.is_empty() {
            return;
        }

        let data: Vec<([f64; FEATURE_COUNT + 1], f64)> = samples
            .iter()
            .map(|s| {
                let y = if s.label == Verdict::Fake { 1.0 } else { -1.0 };
                (self.augment(&s.features), y)
            })
            .collect();

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut order: Vec<usize> = (0..data.len()).collect();
        let mut t = 0usize;

        for _ in 0..self.epochs {
            order.shuffle(&mut rng);
            for &i in &order {
                t += 1;
                let (x, y) = &data[i];
                let eta = 1.0 / (self.lambda * t as f64);
                let margin: f64 = y * self.weights.iter().zip(x).map(|(w, xi)| w * xi).sum::<f64>();

                let shrink = 1.0 - eta * self.lambda;
                for w in self.weights.iter_mut() {
                    *w *= shrink;
                }
                if margin < 1.0 {
                    for (w, xi) in self.weights.iter_mut().zip(x) {
                        *w += eta * y * xi;
                    }
                }
            }
        }

        self.trained = true;
        tracing::debug!("LinearSVC trained: {} updates, weights={:?}", t, self.weights);
    }

    fn score(&self, features: &ProfileFeatures) -> Score {
        if !self.trained {
            return Score::from_probability(0.5);
        }
        let margin = self.decision_function(features);
        Score::from_probability(1.0 / (1.0 + (-2.0 * margin).exp()))
    }

    fn model_type(&self) -> ModelType {
        ModelType::LinearSvc
    }

    fn is_trained(&self) -> bool {
        self.trained
    }
}

#[derive(Debug, Clone, Copy)]
struct ClassStats {
    log_prior: f64,
    mean: [f64; FEATURE_COUNT],
    var: [f64; FEATURE_COUNT],
}

/// Gaussian naive Bayes over standardized features
#[derive(Debug, Clone)]
pub struct NaiveBayesClassifier {
    var_smoothing: f64,
    scaler: FeatureScaler,
    fake: Option<ClassStats>,
    real: Option<ClassStats>,
}

impl NaiveBayesClassifier {
    pub fn new(var_smoothing: f64) -> Self {
        Self {
            var_smoothing: var_smoothing.max(1e-9),
            scaler: FeatureScaler::default(),
            fake: None,
            real: None,
        }
    }

    fn class_stats(&self, rows: &[[f64; FEATURE_COUNT]], total: usize) -> ClassStats {
        // Laplace-smoothed prior keeps an absent class finite
        let log_prior = ((rows.len() as f64 + 1.0) / (total as f64 + 2.0)).ln();
        if rows.is_empty() {
            return ClassStats {
                log_prior,
                mean: [0.0; FEATURE_COUNT],
                var: [1.0; FEATURE_COUNT],
            };
        }

        let n = rows.len() as f64;
        let mut mean = [0.0; FEATURE_COUNT];
        for row in rows {
            for (m, x) in mean.iter_mut().zip(row) {
                *m += x / n;
            }
        }
        let mut var = [self.var_smoothing; FEATURE_COUNT];
        for row in rows {
            for ((v, x), m) in var.iter_mut().zip(row).zip(&mean) {
                *v += (x - m).powi(2) / n;
            }
        }
        ClassStats { log_prior, mean, var }
    }

    fn log_likelihood(stats: &ClassStats, x: &[f64; FEATURE_COUNT]) -> f64 {
        let mut ll = stats.log_prior;
        for ((xi, m), v) in x.iter().zip(&stats.mean).zip(&stats.var) {
            ll -= 0.5 * ((2.0 * std::f64::consts::PI * v).ln() + (xi - m).powi(2) / v);
        }
        ll
    }
}

impl ProfileClassifier for NaiveBayesClassifier {
    fn train(&mut self, samples: &[Sample]) {
        self.scaler = FeatureScaler::fit(samples);
        if samples.is_empty() {
            self.fake = None;
            self.real = None;
            return;
        }

        let (mut fake_rows, mut real_rows) = (Vec::new(), Vec::new());
        for s in samples {
            let row = self.scaler.transform(&s.features);
            match s.label {
                Verdict::Fake => fake_rows.push(row),
                Verdict::Real => real_rows.push(row),
            }
        }

        self.fake = Some(self.class_stats(&fake_rows, samples.len()));
        self.real = Some(self.class_stats(&real_rows, samples.len()));
    }

    fn score(&self, features: &ProfileFeatures) -> Score {
        let (Some(fake), Some(real)) = (&self.fake, &self.real) else {
            return Score::from_probability(0.5);
        };
        let x = self.scaler.transform(features);

        let fake_score = Self::log_likelihood(fake, &x);
        let real_score = Self::log_likelihood(real, &x);

        // Convert log scores to probability
        let max_score = fake_score.max(real_score);
        let fake_exp = (fake_score - max_score).exp();
        let real_exp = (real_score - max_score).exp();

        Score::from_probability(fake_exp / (fake_exp + real_exp))
    }

    fn model_type(&self) -> ModelType {
        ModelType::NaiveBayes
    }

    fn is_trained(&self) -> bool {
        self.fake.is_some()
    }
}

/// Build an untrained classifier of the given type
pub fn classifier_for(model: ModelType, config: &ServiceConfig) -> Box<dyn ProfileClassifier> {
    match model {
        ModelType::Knn => Box::new(KnnClassifier::new(config.knn_neighbors)),
        ModelType::LinearSvc => Box::new(LinearSvcClassifier::new(
            config.svm_lambda,
            config.svm_epochs,
            config.seed,
        )),
        ModelType::NaiveBayes => Box::new(NaiveBayesClassifier::new(config.nb_var_smoothing)),
    }
}

/// Factory function to create all classifiers, in display order
pub fn all_classifiers(config: &ServiceConfig) -> Vec<Box<dyn ProfileClassifier>> {
    ModelType::ALL
        .into_iter()
        .map(|m| classifier_for(m, config))
        .collect()
}
