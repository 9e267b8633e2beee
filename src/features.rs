// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Profile feature schema shared by the analyzer, classifiers and datasets
//!
//! Eleven numeric attributes describe an account. Binary flags are stored as
//! 0/1, ratios in [0, 1] and counts as non-negative whole numbers, all as
//! `f64` so the same record feeds the classifiers without conversion.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of features in the schema
pub const FEATURE_COUNT: usize = 11;

/// Identifier of a single profile feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeatureKey {
    ProfilePic,
    NumsLengthUsername,
    FullnameWords,
    NumsLengthFullname,
    NameEqualsUsername,
    DescriptionLength,
    #[serde(rename = "externalURL")]
    ExternalUrl,
    Private,
    Posts,
    Followers,
    Follows,
}

impl FeatureKey {
    /// All keys in schema order
    pub const ALL: [FeatureKey; FEATURE_COUNT] = [
        FeatureKey::ProfilePic,
        FeatureKey::NumsLengthUsername,
        FeatureKey::FullnameWords,
        FeatureKey::NumsLengthFullname,
        FeatureKey::NameEqualsUsername,
        FeatureKey::DescriptionLength,
        FeatureKey::ExternalUrl,
        FeatureKey::Private,
        FeatureKey::Posts,
        FeatureKey::Followers,
        FeatureKey::Follows,
    ];

    /// Wire identifier, as used in serialized records
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureKey::ProfilePic => "profilePic",
            FeatureKey::NumsLengthUsername => "numsLengthUsername",
            FeatureKey::FullnameWords => "fullnameWords",
            FeatureKey::NumsLengthFullname => "numsLengthFullname",
            FeatureKey::NameEqualsUsername => "nameEqualsUsername",
            FeatureKey::DescriptionLength => "descriptionLength",
            FeatureKey::ExternalUrl => "externalURL",
            FeatureKey::Private => "private",
            FeatureKey::Posts => "posts",
            FeatureKey::Followers => "followers",
            FeatureKey::Follows => "follows",
        }
    }

    /// Human-readable label for reports
    pub fn label(&self) -> &'static str {
        match self {
            FeatureKey::ProfilePic => "Profile Picture",
            FeatureKey::NumsLengthUsername => "Numbers in Username",
            FeatureKey::FullnameWords => "Words in Full Name",
            FeatureKey::NumsLengthFullname => "Numbers in Full Name",
            FeatureKey::NameEqualsUsername => "Name Matches Username",
            FeatureKey::DescriptionLength => "Description Length",
            FeatureKey::ExternalUrl => "External URL",
            FeatureKey::Private => "Private Account",
            FeatureKey::Posts => "# Posts",
            FeatureKey::Followers => "# Followers",
            FeatureKey::Follows => "# Follows",
        }
    }

    /// Look up a key by its wire identifier
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// Whether the feature is an unbounded count (posts, followers, ...)
    pub fn is_count(&self) -> bool {
        matches!(
            self,
            FeatureKey::FullnameWords
                | FeatureKey::DescriptionLength
                | FeatureKey::Posts
                | FeatureKey::Followers
                | FeatureKey::Follows
        )
    }

    /// Finite, non-negative, and within [0, 1] for flags and ratios
    pub fn accepts(&self, value: f64) -> bool {
        value.is_finite() && value >= 0.0 && (self.is_count() || value <= 1.0)
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The eleven numeric features of one profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFeatures {
    /// 1 if the account has a profile picture
    pub profile_pic: f64,
    /// Digits in the username divided by its length
    pub nums_length_username: f64,
    /// Number of words in the full name
    pub fullname_words: f64,
    /// Digits in the full name divided by its length
    pub nums_length_fullname: f64,
    /// 1 if the full name equals the username
    pub name_equals_username: f64,
    /// Length of the bio in characters
    pub description_length: f64,
    /// 1 if the bio links an external URL
    #[serde(rename = "externalURL")]
    pub external_url: f64,
    /// 1 if the account is private
    pub private: f64,
    pub posts: f64,
    pub followers: f64,
    pub follows: f64,
}

/// Manual-input defaults describe a typical established account
impl Default for ProfileFeatures {
    fn default() -> Self {
        Self {
            profile_pic: 1.0,
            nums_length_username: 0.1,
            fullname_words: 2.0,
            nums_length_fullname: 0.0,
            name_equals_username: 0.0,
            description_length: 80.0,
            external_url: 1.0,
            private: 0.0,
            posts: 150.0,
            followers: 500.0,
            follows: 200.0,
        }
    }
}

impl ProfileFeatures {
    /// Read one feature
    pub fn get(&self, key: FeatureKey) -> f64 {
        match key {
            FeatureKey::ProfilePic => self.profile_pic,
            FeatureKey::NumsLengthUsername => self.nums_length_username,
            FeatureKey::FullnameWords => self.fullname_words,
            FeatureKey::NumsLengthFullname => self.nums_length_fullname,
            FeatureKey::NameEqualsUsername => self.name_equals_username,
            FeatureKey::DescriptionLength => self.description_length,
            FeatureKey::ExternalUrl => self.external_url,
            FeatureKey::Private => self.private,
            FeatureKey::Posts => self.posts,
            FeatureKey::Followers => self.followers,
            FeatureKey::Follows => self.follows,
        }
    }

    /// Return a copy with one feature replaced
    pub fn with(mut self, key: FeatureKey, value: f64) -> Self {
        let slot = match key {
            FeatureKey::ProfilePic => &mut self.profile_pic,
            FeatureKey::NumsLengthUsername => &mut self.nums_length_username,
            FeatureKey::FullnameWords => &mut self.fullname_words,
            FeatureKey::NumsLengthFullname => &mut self.nums_length_fullname,
            FeatureKey::NameEqualsUsername => &mut self.name_equals_username,
            FeatureKey::DescriptionLength => &mut self.description_length,
            FeatureKey::ExternalUrl => &mut self.external_url,
            FeatureKey::Private => &mut self.private,
            FeatureKey::Posts => &mut self.posts,
            FeatureKey::Followers => &mut self.followers,
            FeatureKey::Follows => &mut self.follows,
        };
        *slot = value;
        self
    }

    /// Iterate `(key, value)` pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (FeatureKey, f64)> + '_ {
        FeatureKey::ALL.into_iter().map(move |k| (k, self.get(k)))
    }

    /// Feature vector in schema order
    pub fn to_vector(&self) -> [f64; FEATURE_COUNT] {
        let mut v = [0.0; FEATURE_COUNT];
        for (slot, key) in v.iter_mut().zip(FeatureKey::ALL) {
            *slot = self.get(key);
        }
        v
    }

    /// Build from a vector in schema order
    pub fn from_vector(v: &[f64; FEATURE_COUNT]) -> Self {
        FeatureKey::ALL
            .into_iter()
            .zip(v.iter())
            .fold(Self::default(), |acc, (k, &x)| acc.with(k, x))
    }
}

/// Scraped profile: features plus the aggregate credibility score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedData {
    #[serde(flatten)]
    pub features: ProfileFeatures,
    /// Aggregate score in 0..=100
    pub final_credibility_score: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_round_trip_keeps_order() {
        let f = ProfileFeatures::default();
        let v = f.to_vector();
        assert_eq!(v[0], 1.0);
        assert_eq!(v[5], 80.0);
        assert_eq!(v[10], 200.0);
        assert_eq!(ProfileFeatures::from_vector(&v), f);
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_value(ProfileFeatures::default()).unwrap();
        for key in FeatureKey::ALL {
            assert!(json.get(key.as_str()).is_some(), "missing {}", key);
        }
        assert_eq!(FeatureKey::from_wire("externalURL"), Some(FeatureKey::ExternalUrl));
        assert_eq!(FeatureKey::from_wire("bogus"), None);
    }

    #[test]
    fn test_scraped_data_is_flat() {
        let scraped = ScrapedData {
            features: ProfileFeatures::default(),
            final_credibility_score: 87,
        };
        let json = serde_json::to_value(scraped).unwrap();
        assert_eq!(json["finalCredibilityScore"], 87);
        assert_eq!(json["followers"], 500.0);
    }
}
