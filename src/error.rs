use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum GeneScoreError {
    #[error("malformed gene-set catalog {input}: {reason}")]
    #[diagnostic(code(kira_genescore::catalog))]
    MalformedCatalog { input: String, reason: String },

    #[error("malformed expression matrix {input}: {reason}")]
    #[diagnostic(code(kira_genescore::matrix))]
    MalformedMatrix { input: String, reason: String },

    #[error("unsupported scoring method `{name}` (expected one of: mean, median, sum, zscore_mean)")]
    #[diagnostic(code(kira_genescore::method))]
    UnsupportedMethod { name: String },

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("inconsistent score table: {0}")]
    InvalidTable(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl GeneScoreError {
    pub fn catalog(input: impl Into<String>, reason: impl Into<String>) -> Self {
        GeneScoreError::MalformedCatalog {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn matrix(input: impl Into<String>, reason: impl Into<String>) -> Self {
        GeneScoreError::MalformedMatrix {
            input: input.into(),
            reason: reason.into(),
        }
    }
}
