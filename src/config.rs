// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Service configuration

use crate::error::{CrediLinkError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for the local model service.
///
/// Every field has a default, so a JSON file only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Size of the synthetic reference dataset
    pub reference_size: usize,
    /// Share of the reference dataset used for training
    pub train_fraction: f64,
    pub knn_neighbors: usize,
    pub svm_epochs: usize,
    /// Pegasos regularisation strength
    pub svm_lambda: f64,
    /// Added to every per-class variance in naive Bayes
    pub nb_var_smoothing: f64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            reference_size: 1000,
            train_fraction: 0.8,
            knn_neighbors: 5,
            svm_epochs: 20,
            svm_lambda: 1e-3,
            nb_var_smoothing: 0.05,
        }
    }
}

impl ServiceConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| CrediLinkError::ConfigParse { details: e.to_string() })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| CrediLinkError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        tracing::debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let fail = |details: &str| {
            Err(CrediLinkError::ConfigParse {
                details: details.to_string(),
            })
        };
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return fail("train_fraction must lie strictly between 0 and 1");
        }
        if self.reference_size < 10 {
            return fail("reference_size must be at least 10");
        }
        if self.knn_neighbors == 0 {
            return fail("knn_neighbors must be positive");
        }
        if self.svm_epochs == 0 || self.svm_lambda <= 0.0 {
            return fail("svm_epochs and svm_lambda must be positive");
        }
        if self.nb_var_smoothing <= 0.0 {
            return fail("nb_var_smoothing must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ServiceConfig::from_json(r#"{"seed": 7, "knn_neighbors": 9}"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.knn_neighbors, 9);
        assert_eq!(config.svm_epochs, ServiceConfig::default().svm_epochs);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            ServiceConfig::from_json(r#"{"train_fraction": 1.0}"#),
            Err(CrediLinkError::ConfigParse { .. })
        ));
        assert!(ServiceConfig::from_json(r#"{"knn_neighbors": 0}"#).is_err());
        assert!(ServiceConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"reference_size": 200}}"#).unwrap();
        let config = ServiceConfig::load(file.path()).unwrap();
        assert_eq!(config.reference_size, 200);

        let missing = ServiceConfig::load(Path::new("/nonexistent/credilink.json"));
        assert!(matches!(missing, Err(CrediLinkError::Io { .. })));
    }
}
