// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Per-feature credibility heuristics
//!
//! Maps a single feature value to a short judgment and a tri-state
//! indicator. The thresholds are the only domain rules of the system, so the
//! `>` / `>=` distinctions below are load-bearing.

use crate::features::{FeatureKey, ProfileFeatures, ScrapedData, FEATURE_COUNT};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tri-state judgment of one feature value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Indicator {
    Positive,
    Negative,
    Neutral,
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Indicator::Positive => "Positive",
            Indicator::Negative => "Negative",
            Indicator::Neutral => "Neutral",
        };
        f.write_str(s)
    }
}

/// Judgment text plus indicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureAnalysis {
    pub analysis: String,
    pub indicator: Indicator,
}

impl FeatureAnalysis {
    fn new(analysis: impl Into<String>, indicator: Indicator) -> Self {
        Self {
            analysis: analysis.into(),
            indicator,
        }
    }
}

/// One row of the credibility breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCredibility {
    pub feature: FeatureKey,
    pub label: String,
    pub value: f64,
    pub analysis: String,
    pub indicator: Indicator,
}

/// Analyze a feature given by its wire identifier.
///
/// Unknown identifiers echo the value back with a neutral indicator.
pub fn analyze(feature: &str, value: f64) -> FeatureAnalysis {
    match FeatureKey::from_wire(feature) {
        Some(key) => analyze_key(key, value),
        None => FeatureAnalysis::new(plain_number(value), Indicator::Neutral),
    }
}

/// Analyze a known feature
pub fn analyze_key(key: FeatureKey, value: f64) -> FeatureAnalysis {
    use Indicator::*;

    match key {
        FeatureKey::ProfilePic => {
            if value == 1.0 {
                FeatureAnalysis::new("Present", Positive)
            } else {
                FeatureAnalysis::new("Missing", Negative)
            }
        }
        FeatureKey::NumsLengthUsername => {
            if value > 0.5 {
                FeatureAnalysis::new("High ratio", Negative)
            } else if value > 0.2 {
                FeatureAnalysis::new("Some numbers", Neutral)
            } else {
                FeatureAnalysis::new("Low ratio", Positive)
            }
        }
        FeatureKey::FullnameWords => {
            let text = format!("{} words", plain_number(value));
            if value >= 2.0 {
                FeatureAnalysis::new(text, Positive)
            } else {
                FeatureAnalysis::new(text, Negative)
            }
        }
        FeatureKey::NameEqualsUsername => {
            if value == 0.0 {
                FeatureAnalysis::new("Does not match", Positive)
            } else {
                FeatureAnalysis::new("Matches", Negative)
            }
        }
        FeatureKey::DescriptionLength => {
            let text = format!("{} chars", plain_number(value));
            if value > 20.0 {
                FeatureAnalysis::new(text, Positive)
            } else {
                FeatureAnalysis::new(text, Negative)
            }
        }
        FeatureKey::ExternalUrl => {
            if value == 1.0 {
                FeatureAnalysis::new("Present", Positive)
            } else {
                FeatureAnalysis::new("Missing", Neutral)
            }
        }
        FeatureKey::Private => {
            if value == 1.0 {
                FeatureAnalysis::new("Private", Neutral)
            } else {
                FeatureAnalysis::new("Public", Positive)
            }
        }
        FeatureKey::Posts => count_rule(value, value > 10.0),
        FeatureKey::Followers => count_rule(value, value > 100.0),
        // Following thousands of accounts is typical of follow-back bots
        FeatureKey::Follows => count_rule(value, value <= 2000.0),
        FeatureKey::NumsLengthFullname => FeatureAnalysis::new(plain_number(value), Neutral),
    }
}

fn count_rule(value: f64, credible: bool) -> FeatureAnalysis {
    let indicator = if credible {
        Indicator::Positive
    } else {
        Indicator::Negative
    };
    FeatureAnalysis::new(grouped_number(value), indicator)
}

/// Build the per-feature breakdown for a scraped profile, in schema order
pub fn breakdown(scraped: &ScrapedData) -> Vec<FeatureCredibility> {
    feature_breakdown(&scraped.features)
}

/// Breakdown for a bare feature record
pub fn feature_breakdown(features: &ProfileFeatures) -> Vec<FeatureCredibility> {
    features
        .iter()
        .map(|(key, value)| {
            let FeatureAnalysis { analysis, indicator } = analyze_key(key, value);
            FeatureCredibility {
                feature: key,
                label: key.label().to_string(),
                value,
                analysis,
                indicator,
            }
        })
        .collect()
}

/// Aggregate 0..=100 score: positives count fully, neutrals half
pub fn credibility_score(features: &ProfileFeatures) -> u8 {
    let (positives, neutrals) = features.iter().fold((0usize, 0usize), |(p, n), (k, v)| {
        match analyze_key(k, v).indicator {
            Indicator::Positive => (p + 1, n),
            Indicator::Neutral => (p, n + 1),
            Indicator::Negative => (p, n),
        }
    });
    let score = 100.0 * (positives as f64 + 0.5 * neutrals as f64) / FEATURE_COUNT as f64;
    score.round().clamp(0.0, 100.0) as u8
}

/// Shortest plain decimal rendering (2 -> "2", 0.25 -> "0.25")
pub fn plain_number(value: f64) -> String {
    if value == 0.0 {
        // avoids "-0"
        return "0".to_string();
    }
    format!("{}", value)
}

/// en-US grouped rendering with at most three fraction digits (1234.5 -> "1,234.5")
pub fn grouped_number(value: f64) -> String {
    if !value.is_finite() || value.abs() >= u64::MAX as f64 {
        return plain_number(value);
    }

    let rounded = (value * 1000.0).round() / 1000.0;
    let negative = rounded < 0.0;
    let abs = rounded.abs();

    let mut int_part = abs.trunc() as u64;
    let mut frac_part = ((abs - abs.trunc()) * 1000.0).round() as u64;
    if frac_part >= 1000 {
        int_part += 1;
        frac_part = 0;
    }

    let digits = int_part.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if frac_part > 0 {
        let frac = format!("{:03}", frac_part);
        grouped.push('.');
        grouped.push_str(frac.trim_end_matches('0'));
    }

    if negative && grouped != "0" {
        grouped.insert(0, '-');
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indicator(feature: &str, value: f64) -> Indicator {
        analyze(feature, value).indicator
    }

    #[test]
    fn test_profile_pic() {
        assert_eq!(analyze("profilePic", 1.0), FeatureAnalysis::new("Present", Indicator::Positive));
        assert_eq!(analyze("profilePic", 0.0), FeatureAnalysis::new("Missing", Indicator::Negative));
    }

    #[test]
    fn test_username_ratio_boundaries() {
        assert_eq!(indicator("numsLengthUsername", 0.51), Indicator::Negative);
        assert_eq!(indicator("numsLengthUsername", 0.5), Indicator::Neutral);
        assert_eq!(indicator("numsLengthUsername", 0.21), Indicator::Neutral);
        assert_eq!(indicator("numsLengthUsername", 0.2), Indicator::Positive);
        assert_eq!(indicator("numsLengthUsername", 0.0), Indicator::Positive);
        assert_eq!(analyze("numsLengthUsername", 0.3).analysis, "Some numbers");
    }

    #[test]
    fn test_fullname_words_is_inclusive() {
        assert_eq!(indicator("fullnameWords", 2.0), Indicator::Positive);
        assert_eq!(indicator("fullnameWords", 1.0), Indicator::Negative);
        assert_eq!(analyze("fullnameWords", 3.0).analysis, "3 words");
    }

    #[test]
    fn test_binary_flags() {
        assert_eq!(indicator("nameEqualsUsername", 0.0), Indicator::Positive);
        assert_eq!(indicator("nameEqualsUsername", 1.0), Indicator::Negative);
        assert_eq!(indicator("externalURL", 1.0), Indicator::Positive);
        assert_eq!(indicator("externalURL", 0.0), Indicator::Neutral);
        assert_eq!(indicator("private", 1.0), Indicator::Neutral);
        assert_eq!(indicator("private", 0.0), Indicator::Positive);
        assert_eq!(analyze("private", 0.0).analysis, "Public");
    }

    #[test]
    fn test_count_boundaries_are_exclusive() {
        assert_eq!(indicator("descriptionLength", 21.0), Indicator::Positive);
        assert_eq!(indicator("descriptionLength", 20.0), Indicator::Negative);
        assert_eq!(analyze("descriptionLength", 20.0).analysis, "20 chars");
        assert_eq!(indicator("posts", 11.0), Indicator::Positive);
        assert_eq!(indicator("posts", 10.0), Indicator::Negative);
        assert_eq!(indicator("followers", 101.0), Indicator::Positive);
        assert_eq!(indicator("followers", 100.0), Indicator::Negative);
        assert_eq!(indicator("follows", 2001.0), Indicator::Negative);
        assert_eq!(indicator("follows", 2000.0), Indicator::Positive);
    }

    #[test]
    fn test_unknown_and_unlisted_keys_are_neutral() {
        assert_eq!(analyze("likes", 42.0), FeatureAnalysis::new("42", Indicator::Neutral));
        assert_eq!(analyze("numsLengthFullname", 0.25), FeatureAnalysis::new("0.25", Indicator::Neutral));
    }

    #[test]
    fn test_grouped_number() {
        assert_eq!(grouped_number(0.0), "0");
        assert_eq!(grouped_number(999.0), "999");
        assert_eq!(grouped_number(1234.0), "1,234");
        assert_eq!(grouped_number(1234567.0), "1,234,567");
        assert_eq!(grouped_number(1234.5), "1,234.5");
        assert_eq!(grouped_number(2.0004), "2");
        assert_eq!(grouped_number(1e20), "100000000000000000000");
        assert_eq!(grouped_number(-1e20), "-100000000000000000000");
        assert_eq!(analyze("followers", 15300.0).analysis, "15,300");
    }

    #[test]
    fn test_breakdown_covers_schema() {
        let rows = feature_breakdown(&ProfileFeatures::default());
        assert_eq!(rows.len(), FEATURE_COUNT);
        assert_eq!(rows[0].label, "Profile Picture");
        assert_eq!(rows[10].feature, FeatureKey::Follows);
    }

    #[test]
    fn test_credibility_score() {
        // Defaults: everything positive except numsLengthFullname, which is always neutral
        assert_eq!(credibility_score(&ProfileFeatures::default()), 95);

        let private = ProfileFeatures::default().with(FeatureKey::Private, 1.0);
        assert_eq!(credibility_score(&private), 91);

        let bot = ProfileFeatures {
            profile_pic: 0.0,
            nums_length_username: 0.8,
            fullname_words: 0.0,
            nums_length_fullname: 0.0,
            name_equals_username: 1.0,
            description_length: 0.0,
            external_url: 0.0,
            private: 0.0,
            posts: 0.0,
            followers: 12.0,
            follows: 4000.0,
        };
        // public (+1), externalURL and numsLengthFullname neutral (+0.5 each)
        assert_eq!(credibility_score(&bot), 18);
    }
}
