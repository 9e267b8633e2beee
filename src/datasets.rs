// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Labelled profile datasets for training and evaluation

use crate::error::{CrediLinkError, Result};
use crate::features::{FeatureKey, ProfileFeatures};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Binary verdict for a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// Genuine account
    #[serde(rename = "REAL")]
    Real,
    /// Fake or automated account
    #[serde(rename = "FAKE")]
    Fake,
}

impl Verdict {
    /// Convert to numeric value (1 = fake, 0 = real)
    pub fn to_binary(&self) -> u8 {
        match self {
            Verdict::Fake => 1,
            Verdict::Real => 0,
        }
    }

    /// Create from binary prediction (1 = fake, 0 = real)
    pub fn from_binary(value: u8) -> Self {
        if value == 1 {
            Verdict::Fake
        } else {
            Verdict::Real
        }
    }

    /// Parse a CSV label cell: 1/0, fake/real, true/false
    pub fn parse_label(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "1" | "1.0" | "fake" | "true" | "yes" => Some(Verdict::Fake),
            "0" | "0.0" | "real" | "false" | "no" => Some(Verdict::Real),
            _ => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Real => f.write_str("REAL"),
            Verdict::Fake => f.write_str("FAKE"),
        }
    }
}

/// A single labelled profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    /// Unique identifier
    pub id: String,
    pub features: ProfileFeatures,
    /// Ground truth label
    pub label: Verdict,
}

/// Descriptive information about a loaded dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub id: String,
    pub name: String,
    pub description: String,
    pub source: String,
}

/// A loaded dataset split for training and evaluation
#[derive(Debug, Clone)]
pub struct Dataset {
    pub config: DatasetConfig,
    pub train: Vec<Sample>,
    pub test: Vec<Sample>,
}

/// Header spellings accepted for each feature, compared after normalisation
const FEATURE_ALIASES: [(FeatureKey, &[&str]); 11] = [
    (FeatureKey::ProfilePic, &["profilepic", "haspic", "haspicture"]),
    (FeatureKey::NumsLengthUsername, &["numslengthusername", "usernamedigitratio"]),
    (FeatureKey::FullnameWords, &["fullnamewords"]),
    (FeatureKey::NumsLengthFullname, &["numslengthfullname", "fullnamedigitratio"]),
    (FeatureKey::NameEqualsUsername, &["nameusername", "nameequalsusername"]),
    (FeatureKey::DescriptionLength, &["descriptionlength", "biolength"]),
    (FeatureKey::ExternalUrl, &["externalurl"]),
    (FeatureKey::Private, &["private", "isprivate"]),
    (FeatureKey::Posts, &["posts", "numposts"]),
    (FeatureKey::Followers, &["followers", "numfollowers"]),
    (FeatureKey::Follows, &["follows", "numfollows", "following"]),
];

const LABEL_ALIASES: &[&str] = &["fake", "label", "isfake", "target"];

fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Column positions resolved from a CSV header row
struct ColumnMap {
    features: [usize; 11],
    label: usize,
}

impl ColumnMap {
    fn resolve(headers: &csv::StringRecord) -> Result<Self> {
        let normalized: Vec<String> = headers.iter().map(normalize_header).collect();
        let find = |aliases: &[&str]| normalized.iter().position(|h| aliases.contains(&h.as_str()));

        let mut features = [0usize; 11];
        for (slot, (key, aliases)) in features.iter_mut().zip(FEATURE_ALIASES.iter()) {
            *slot = find(aliases).ok_or(CrediLinkError::MissingColumn { column: key.as_str() })?;
        }
        let label = find(LABEL_ALIASES).ok_or(CrediLinkError::MissingColumn { column: "fake" })?;

        Ok(Self { features, label })
    }
}

impl Dataset {
    /// Parse labelled samples from CSV content with a header row
    pub fn samples_from_csv<R: Read>(reader: R, id_prefix: &str) -> Result<Vec<Sample>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|source| CrediLinkError::Csv { record: 0, source })?
            .clone();
        let columns = ColumnMap::resolve(&headers)?;

        let mut samples = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result.map_err(|source| CrediLinkError::Csv { record: idx + 1, source })?;

            if record.iter().all(|cell| cell.is_empty()) {
                tracing::debug!("Skipping blank record {}", idx + 1);
                continue;
            }

            let mut features = ProfileFeatures::default();
            for (&col, (key, _)) in columns.features.iter().zip(FEATURE_ALIASES.iter()) {
                let raw = record.get(col).unwrap_or("");
                let bad_value = || CrediLinkError::BadValue {
                    column: key.as_str().to_string(),
                    value: raw.to_string(),
                    record: idx + 1,
                };
                let value: f64 = raw.parse().map_err(|_| bad_value())?;
                if !key.accepts(value) {
                    return Err(bad_value());
                }
                features = features.with(*key, value);
            }

            let raw_label = record.get(columns.label).unwrap_or("");
            let label = Verdict::parse_label(raw_label).ok_or_else(|| CrediLinkError::BadValue {
                column: headers.get(columns.label).unwrap_or("fake").to_string(),
                value: raw_label.to_string(),
                record: idx + 1,
            })?;

            samples.push(Sample {
                id: format!("{}_{}", id_prefix, idx),
                features,
                label,
            });
        }

        if samples.is_empty() {
            return Err(CrediLinkError::EmptyDataset);
        }
        Ok(samples)
    }

    /// Load a labelled CSV file and split it into train/test with a seeded shuffle
    pub fn load_csv(path: &Path, train_fraction: f64, seed: u64) -> Result<Self> {
        let file = File::open(path).map_err(|source| CrediLinkError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "csv".to_string());

        let mut samples = Self::samples_from_csv(file, &stem)?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        samples.shuffle(&mut rng);

        let (train, test) = Self::split(samples, train_fraction);
        let config = DatasetConfig {
            id: stem.clone(),
            name: format!("{} (CSV)", stem),
            description: "Labelled profiles loaded from CSV".to_string(),
            source: path.display().to_string(),
        };

        Ok(Self { config, train, test })
    }

    /// Generate a synthetic labelled dataset with realistic marginals
    pub fn load_synthetic(size: usize, train_fraction: f64, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let config = DatasetConfig {
            id: "synthetic".to_string(),
            name: "Synthetic Profile Dataset".to_string(),
            description: "Generated genuine and fake account profiles".to_string(),
            source: "generated".to_string(),
        };

        let samples: Vec<Sample> = (0..size)
            .map(|i| {
                let label = if rng.gen_bool(0.5) { Verdict::Fake } else { Verdict::Real };
                Sample {
                    id: format!("synthetic_{}", i),
                    features: synthetic_profile(&mut rng, label),
                    label,
                }
            })
            .collect();

        let (train, test) = Self::split(samples, train_fraction);
        Self { config, train, test }
    }

    fn split(mut samples: Vec<Sample>, train_fraction: f64) -> (Vec<Sample>, Vec<Sample>) {
        let n = samples.len();
        let train_end = ((n as f64 * train_fraction.clamp(0.0, 1.0)) as usize).min(n);
        let test = samples.split_off(train_end);
        (samples, test)
    }

    /// Get total number of samples across all splits
    pub fn total_samples(&self) -> usize {
        self.train.len() + self.test.len()
    }

    /// Get label distribution for a split
    pub fn label_distribution(samples: &[Sample]) -> HashMap<Verdict, usize> {
        let mut dist = HashMap::new();
        for sample in samples {
            *dist.entry(sample.label).or_insert(0) += 1;
        }
        dist
    }
}

/// Draw one profile from the class-conditional distributions
pub(crate) fn synthetic_profile(rng: &mut ChaCha8Rng, label: Verdict) -> ProfileFeatures {
    let flag = |rng: &mut ChaCha8Rng, p: f64| if rng.gen_bool(p) { 1.0 } else { 0.0 };
    let log_count = |rng: &mut ChaCha8Rng, lo: f64, hi: f64| 10f64.powf(rng.gen_range(lo..hi)).floor();

    match label {
        Verdict::Real => ProfileFeatures {
            profile_pic: flag(rng, 0.95),
            nums_length_username: if rng.gen_bool(0.6) { 0.0 } else { round2(rng.gen_range(0.0..0.3)) },
            fullname_words: *[1.0, 2.0, 2.0, 2.0, 3.0, 4.0].choose(rng).unwrap_or(&2.0),
            nums_length_fullname: if rng.gen_bool(0.95) { 0.0 } else { round2(rng.gen_range(0.0..0.2)) },
            name_equals_username: flag(rng, 0.02),
            description_length: if rng.gen_bool(0.2) { 0.0 } else { rng.gen_range(10..150) as f64 },
            external_url: flag(rng, 0.4),
            private: flag(rng, 0.35),
            posts: log_count(rng, 1.0, 3.3),
            followers: log_count(rng, 2.0, 4.0),
            follows: log_count(rng, 1.7, 3.0),
        },
        Verdict::Fake => ProfileFeatures {
            profile_pic: flag(rng, 0.4),
            nums_length_username: if rng.gen_bool(0.5) { 0.0 } else { round2(rng.gen_range(0.2..0.8)) },
            fullname_words: *[0.0, 0.0, 1.0, 1.0, 2.0].choose(rng).unwrap_or(&1.0),
            nums_length_fullname: if rng.gen_bool(0.8) { 0.0 } else { round2(rng.gen_range(0.0..0.5)) },
            name_equals_username: flag(rng, 0.15),
            description_length: if rng.gen_bool(0.75) { 0.0 } else { rng.gen_range(1..40) as f64 },
            external_url: flag(rng, 0.03),
            private: flag(rng, 0.25),
            posts: log_count(rng, 0.0, 1.5) - 1.0,
            followers: log_count(rng, 0.0, 2.5),
            follows: log_count(rng, 1.5, 3.8),
        },
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// SHA-256 fingerprint of raw dataset bytes, hex encoded
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSTAGRAM_CSV: &str = "\
profile pic,nums/length username,fullname words,nums/length fullname,name==username,description length,external URL,private,#posts,#followers,#follows,fake
1,0.27,0,0,0,53,0,0,32,1000,955,0
1,0,2,0,0,44,0,0,286,2740,533,0
0,0.55,1,0.44,1,0,0,0,0,21,259,1
";

    #[test]
    fn test_label_parsing() {
        assert_eq!(Verdict::parse_label("1"), Some(Verdict::Fake));
        assert_eq!(Verdict::parse_label(" FAKE "), Some(Verdict::Fake));
        assert_eq!(Verdict::parse_label("real"), Some(Verdict::Real));
        assert_eq!(Verdict::parse_label("0"), Some(Verdict::Real));
        assert_eq!(Verdict::parse_label("maybe"), None);
    }

    #[test]
    fn test_instagram_headers() {
        let samples = Dataset::samples_from_csv(INSTAGRAM_CSV.as_bytes(), "ig").unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].features.nums_length_username, 0.27);
        assert_eq!(samples[1].features.followers, 2740.0);
        assert_eq!(samples[2].label, Verdict::Fake);
        assert_eq!(samples[2].features.name_equals_username, 1.0);
        assert_eq!(samples[0].id, "ig_0");
    }

    #[test]
    fn test_camel_case_headers() {
        let csv = "profilePic,numsLengthUsername,fullnameWords,numsLengthFullname,nameEqualsUsername,descriptionLength,externalURL,private,posts,followers,follows,label\n\
                   1,0.1,2,0,0,80,1,0,150,500,200,real\n";
        let samples = Dataset::samples_from_csv(csv.as_bytes(), "t").unwrap();
        assert_eq!(samples[0].features, ProfileFeatures::default());
        assert_eq!(samples[0].label, Verdict::Real);
    }

    #[test]
    fn test_missing_column() {
        let csv = "profile pic,fake\n1,0\n";
        let err = Dataset::samples_from_csv(csv.as_bytes(), "t").unwrap_err();
        assert!(matches!(err, CrediLinkError::MissingColumn { column: "numsLengthUsername" }));
    }

    #[test]
    fn test_bad_value_and_empty() {
        let bad = INSTAGRAM_CSV.replace("286", "lots");
        let err = Dataset::samples_from_csv(bad.as_bytes(), "t").unwrap_err();
        assert!(matches!(err, CrediLinkError::BadValue { record: 2, .. }));

        let header_only = INSTAGRAM_CSV.lines().next().unwrap();
        let err = Dataset::samples_from_csv(header_only.as_bytes(), "t").unwrap_err();
        assert!(matches!(err, CrediLinkError::EmptyDataset));
    }

    #[test]
    fn test_non_finite_and_out_of_range_values() {
        let cases = [
            ("286", "NaN", "posts"),
            ("2740", "inf", "followers"),
            ("533", "-1", "follows"),
            ("0.27", "1.5", "numsLengthUsername"),
            ("44,0,0,286", "44,-1,0,286", "externalURL"),
        ];
        for (from, to, column) in cases {
            let bad = INSTAGRAM_CSV.replacen(from, to, 1);
            let err = Dataset::samples_from_csv(bad.as_bytes(), "t").unwrap_err();
            match err {
                CrediLinkError::BadValue { column: c, value, .. } => {
                    assert_eq!(c, column, "replacing {:?}", from);
                    assert!(to.contains(value.as_str()));
                }
                other => panic!("unexpected error for {:?}: {:?}", to, other),
            }
        }
    }

    #[test]
    fn test_synthetic_dataset() {
        let dataset = Dataset::load_synthetic(100, 0.8, 42);

        assert_eq!(dataset.config.id, "synthetic");
        assert_eq!(dataset.total_samples(), 100);
        assert_eq!(dataset.train.len(), 80);
        assert_eq!(dataset.test.len(), 20);

        let again = Dataset::load_synthetic(100, 0.8, 42);
        assert_eq!(dataset.train[7].features, again.train[7].features);
    }

    #[test]
    fn test_label_distribution() {
        let dataset = Dataset::load_synthetic(1000, 0.8, 42);
        let dist = Dataset::label_distribution(&dataset.train);

        let fake = *dist.get(&Verdict::Fake).unwrap_or(&0);
        let real = *dist.get(&Verdict::Real).unwrap_or(&0);

        // Allow 20% deviation from perfect balance
        let expected = dataset.train.len() / 2;
        let tolerance = expected / 5;

        assert!((fake as i64 - expected as i64).unsigned_abs() < tolerance as u64);
        assert!((real as i64 - expected as i64).unsigned_abs() < tolerance as u64);
    }

    #[test]
    fn test_synthetic_counts_are_non_negative() {
        let dataset = Dataset::load_synthetic(500, 1.0, 7);
        for s in &dataset.train {
            assert!(s.features.posts >= 0.0);
            assert!(s.features.followers >= 1.0);
            assert!((0.0..=1.0).contains(&s.features.nums_length_username));
        }
    }

    #[test]
    fn test_load_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.csv");
        std::fs::write(&path, INSTAGRAM_CSV).unwrap();

        let dataset = Dataset::load_csv(&path, 0.5, 1).unwrap();
        assert_eq!(dataset.config.id, "train");
        assert_eq!(dataset.total_samples(), 3);
        assert_eq!(dataset.train.len(), 1);
    }

    #[test]
    fn test_fingerprint() {
        assert_eq!(
            fingerprint(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
