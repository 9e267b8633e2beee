// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Error types for the credibility services

use std::path::PathBuf;
use thiserror::Error;

/// Shared `Result` alias for the library.
pub type Result<T> = std::result::Result<T, CrediLinkError>;

/// Failures surfaced by the service clients and dataset loaders
#[derive(Debug, Error)]
pub enum CrediLinkError {
    #[error("invalid profile handle: {input:?}")]
    InvalidHandle { input: String },

    #[error("unknown model type: {name}")]
    UnknownModel { name: String },

    #[error("CSV read failure at record {record}: {source}")]
    Csv {
        record: usize,
        #[source]
        source: csv::Error,
    },

    #[error("dataset is missing required column '{column}'")]
    MissingColumn { column: &'static str },

    #[error("bad value {value:?} for '{column}' at record {record}")]
    BadValue {
        column: String,
        value: String,
        record: usize,
    },

    #[error("dataset contains no labelled rows")]
    EmptyDataset,

    #[error("model {model} has not been trained")]
    Untrained { model: &'static str },

    #[error("IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration parse failure: {details}")]
    ConfigParse { details: String },
}
