use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GeneScoreError;

/// Token written wherever a score could not be computed.
pub const MISSING_TOKEN: &str = "NA";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMethod {
    Mean,
    Median,
    Sum,
    ZscoreMean,
}

impl ScoringMethod {
    pub const ALL: [ScoringMethod; 4] = [
        ScoringMethod::Mean,
        ScoringMethod::Median,
        ScoringMethod::Sum,
        ScoringMethod::ZscoreMean,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringMethod::Mean => "mean",
            ScoringMethod::Median => "median",
            ScoringMethod::Sum => "sum",
            ScoringMethod::ZscoreMean => "zscore_mean",
        }
    }
}

impl fmt::Display for ScoringMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ScoringMethod {
    type Err = GeneScoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == normalized)
            .ok_or_else(|| GeneScoreError::UnsupportedMethod {
                name: value.to_string(),
            })
    }
}

/// Non-fatal conditions collected during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreWarning {
    EmptyIntersection { gene_set: String },
    ScoreOverflow { gene_set: String, sample: String },
    RenderSkipped { reason: String },
}

impl fmt::Display for ScoreWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreWarning::EmptyIntersection { gene_set } => write!(
                f,
                "gene set `{gene_set}` has no genes in the matrix; scores set to {MISSING_TOKEN}"
            ),
            ScoreWarning::ScoreOverflow { gene_set, sample } => write!(
                f,
                "gene set `{gene_set}` overflows f64 for sample `{sample}`; score set to {MISSING_TOKEN}"
            ),
            ScoreWarning::RenderSkipped { reason } => write!(f, "heatmap skipped: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneSetCoverage {
    pub gene_set: String,
    pub requested: usize,
    pub matched: usize,
}
