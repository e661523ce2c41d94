use rayon::prelude::*;
use tracing::{debug, warn};

use crate::catalog::{GeneSet, GeneSetCatalog};
use crate::domain::{GeneSetCoverage, ScoreWarning, ScoringMethod};
use crate::error::GeneScoreError;
use crate::matrix::ExpressionMatrix;

/// Samples x gene sets table of aggregate scores. Cells without a computable
/// score hold `f64::NAN`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreTable {
    samples: Vec<String>,
    gene_sets: Vec<String>,
    // Row-major: one row per sample.
    values: Vec<f64>,
}

impl ScoreTable {
    /// Builds a table from per-gene-set columns, each holding one score per sample.
    pub fn from_columns(
        samples: Vec<String>,
        gene_sets: Vec<String>,
        columns: &[Vec<f64>],
    ) -> Result<Self, GeneScoreError> {
        if columns.len() != gene_sets.len() {
            return Err(GeneScoreError::InvalidTable(format!(
                "{} columns for {} gene sets",
                columns.len(),
                gene_sets.len()
            )));
        }
        if let Some((set_idx, column)) = columns
            .iter()
            .enumerate()
            .find(|(_, column)| column.len() != samples.len())
        {
            return Err(GeneScoreError::InvalidTable(format!(
                "column for `{}` has {} scores, expected {}",
                gene_sets[set_idx],
                column.len(),
                samples.len()
            )));
        }
        Ok(Self::assemble(samples, gene_sets, columns))
    }

    // Callers guarantee one column per gene set and one score per sample.
    fn assemble(samples: Vec<String>, gene_sets: Vec<String>, columns: &[Vec<f64>]) -> Self {
        let mut values = vec![f64::NAN; samples.len() * gene_sets.len()];
        for (set_idx, column) in columns.iter().enumerate() {
            for (sample_idx, value) in column.iter().enumerate() {
                values[sample_idx * gene_sets.len() + set_idx] = *value;
            }
        }
        Self {
            samples,
            gene_sets,
            values,
        }
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn gene_sets(&self) -> &[String] {
        &self.gene_sets
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn n_gene_sets(&self) -> usize {
        self.gene_sets.len()
    }

    pub fn get(&self, sample_idx: usize, set_idx: usize) -> f64 {
        self.values[sample_idx * self.gene_sets.len() + set_idx]
    }

    pub fn score(&self, sample: &str, gene_set: &str) -> Option<f64> {
        let sample_idx = self.samples.iter().position(|s| s == sample)?;
        let set_idx = self.gene_sets.iter().position(|g| g == gene_set)?;
        Some(self.get(sample_idx, set_idx))
    }

    pub fn row(&self, sample_idx: usize) -> &[f64] {
        let width = self.gene_sets.len();
        &self.values[sample_idx * width..(sample_idx + 1) * width]
    }

    pub fn column(&self, set_idx: usize) -> Vec<f64> {
        (0..self.samples.len())
            .map(|sample_idx| self.get(sample_idx, set_idx))
            .collect()
    }

    /// Byte-level equality, treating NaN cells as equal to each other.
    pub fn same_bits(&self, other: &ScoreTable) -> bool {
        self.samples == other.samples
            && self.gene_sets == other.gene_sets
            && self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

#[derive(Debug, Clone)]
pub struct ScoreOutcome {
    pub table: ScoreTable,
    pub coverage: Vec<GeneSetCoverage>,
    pub warnings: Vec<ScoreWarning>,
}

/// Scores every gene set of `catalog` against every sample of `matrix`.
///
/// Gene sets are processed in parallel, but each cell is reduced
/// sequentially over the matched genes sorted by identifier, so the result
/// does not depend on the thread count.
pub fn compute(
    catalog: &GeneSetCatalog,
    matrix: &ExpressionMatrix,
    method: ScoringMethod,
) -> ScoreOutcome {
    let scored: Vec<ScoredSet> = catalog
        .sets()
        .par_iter()
        .map(|set| score_gene_set(set, matrix, method))
        .collect();

    let mut columns = Vec::with_capacity(scored.len());
    let mut coverage = Vec::with_capacity(scored.len());
    let mut warnings = Vec::new();
    for scored_set in scored {
        let set_coverage = scored_set.coverage;
        debug!(
            gene_set = %set_coverage.gene_set,
            requested = set_coverage.requested,
            matched = set_coverage.matched,
            "gene-set coverage"
        );
        if set_coverage.matched == 0 {
            let warning = ScoreWarning::EmptyIntersection {
                gene_set: set_coverage.gene_set.clone(),
            };
            warn!("{warning}");
            warnings.push(warning);
        }
        for sample_idx in scored_set.overflowed {
            let warning = ScoreWarning::ScoreOverflow {
                gene_set: set_coverage.gene_set.clone(),
                sample: matrix.column_ids()[sample_idx].clone(),
            };
            warn!("{warning}");
            warnings.push(warning);
        }
        columns.push(scored_set.scores);
        coverage.push(set_coverage);
    }

    let table = ScoreTable::assemble(matrix.column_ids().to_vec(), catalog.names(), &columns);
    ScoreOutcome {
        table,
        coverage,
        warnings,
    }
}

struct ScoredSet {
    scores: Vec<f64>,
    coverage: GeneSetCoverage,
    // Samples whose aggregate left the finite range; their cells hold NaN.
    overflowed: Vec<usize>,
}

fn score_gene_set(set: &GeneSet, matrix: &ExpressionMatrix, method: ScoringMethod) -> ScoredSet {
    let matched: Vec<&str> = set
        .genes()
        .iter()
        .map(String::as_str)
        .filter(|gene| matrix.contains(gene))
        .collect();
    let coverage = GeneSetCoverage {
        gene_set: set.name().to_string(),
        requested: set.genes().len(),
        matched: matched.len(),
    };
    let n_samples = matrix.n_samples();
    if matched.is_empty() {
        return ScoredSet {
            scores: vec![f64::NAN; n_samples],
            coverage,
            overflowed: Vec::new(),
        };
    }

    let mut ordered = matched;
    ordered.sort_unstable();
    let rows: Vec<Vec<f64>> = ordered
        .iter()
        .filter_map(|gene| matrix.values_for(gene))
        .map(|values| match method {
            ScoringMethod::ZscoreMean => zscores(values),
            _ => values.to_vec(),
        })
        .collect();

    let mut cell = Vec::with_capacity(rows.len());
    let mut overflowed = Vec::new();
    let scores: Vec<f64> = (0..n_samples)
        .map(|sample_idx| {
            cell.clear();
            cell.extend(rows.iter().map(|row| row[sample_idx]));
            let score = aggregate(method, &mut cell);
            if score.is_finite() {
                score
            } else {
                overflowed.push(sample_idx);
                f64::NAN
            }
        })
        .collect();
    ScoredSet {
        scores,
        coverage,
        overflowed,
    }
}

fn aggregate(method: ScoringMethod, values: &mut [f64]) -> f64 {
    match method {
        ScoringMethod::Sum => values.iter().sum(),
        ScoringMethod::Mean | ScoringMethod::ZscoreMean => mean(values),
        ScoringMethod::Median => median(values),
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_unstable_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Per-gene z-scores across samples using the sample standard deviation.
/// A gene without variation (or with a single sample) scores 0 everywhere.
fn zscores(values: &[f64]) -> Vec<f64> {
    let constant = values.iter().all(|value| *value == values[0]);
    if values.len() < 2 || constant {
        return vec![0.0; values.len()];
    }
    match standardize(values) {
        Some(z) => z,
        None => {
            // Moments overflowed; z-scores are scale-free, so retry on values in [-1, 1].
            let scale = values.iter().fold(0.0_f64, |acc, value| acc.max(value.abs()));
            let scaled: Vec<f64> = values.iter().map(|value| value / scale).collect();
            standardize(&scaled).unwrap_or_else(|| vec![f64::NAN; values.len()])
        }
    }
}

fn standardize(values: &[f64]) -> Option<Vec<f64>> {
    let mu = mean(values);
    let variance =
        values.iter().map(|value| (value - mu).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    let sd = variance.sqrt();
    if !mu.is_finite() || !sd.is_finite() {
        return None;
    }
    Some(values.iter().map(|value| (value - mu) / sd).collect())
}
