use std::collections::HashSet;
use std::sync::LazyLock;

use camino::{Utf8Path, Utf8PathBuf};
use csv::{ReaderBuilder, WriterBuilder};
use regex::Regex;
use serde::Serialize;

use crate::domain::MISSING_TOKEN;
use crate::error::GeneScoreError;
use crate::fs_util::write_atomic;
use crate::score::ScoreTable;

pub const SAMPLE_COLUMN: &str = "sample";
pub const REPORT_EXTENSION: &str = "txt";

static UNSAFE_FILE_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new("[^A-Za-z0-9]").unwrap());

#[derive(Debug, Clone, Serialize)]
pub struct ReportFile {
    pub gene_set: String,
    pub path: String,
}

/// Writes one tab-separated `sample<TAB>score` table per gene set.
#[derive(Debug, Clone)]
pub struct ScoreReportWriter {
    outdir: Utf8PathBuf,
}

impl ScoreReportWriter {
    pub fn new(outdir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            outdir: outdir.into(),
        }
    }

    pub fn outdir(&self) -> &Utf8Path {
        &self.outdir
    }

    pub fn write(&self, table: &ScoreTable) -> Result<Vec<ReportFile>, GeneScoreError> {
        let names = report_file_names(table.gene_sets());
        let mut files = Vec::with_capacity(names.len());
        for (set_idx, file_name) in names.iter().enumerate() {
            let content = render_report(table, set_idx)?;
            let path = self.outdir.join(file_name);
            write_atomic(&path, content.as_bytes())?;
            files.push(ReportFile {
                gene_set: table.gene_sets()[set_idx].clone(),
                path: path.to_string(),
            });
        }
        Ok(files)
    }
}

/// Text of the report for the gene set at `set_idx`. Header is
/// `sample<TAB><gene set name>`; rows follow the table's sample order.
pub fn render_report(table: &ScoreTable, set_idx: usize) -> Result<String, GeneScoreError> {
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(Vec::new());
    writer
        .write_record([SAMPLE_COLUMN, table.gene_sets()[set_idx].as_str()])
        .map_err(|err| GeneScoreError::Filesystem(err.to_string()))?;
    for (sample_idx, sample) in table.samples().iter().enumerate() {
        let score = format_score(table.get(sample_idx, set_idx));
        writer
            .write_record([sample.as_str(), score.as_str()])
            .map_err(|err| GeneScoreError::Filesystem(err.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| GeneScoreError::Filesystem(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| GeneScoreError::Filesystem(err.to_string()))
}

/// Shortest decimal that parses back to the same `f64`, or the missing token.
pub fn format_score(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        MISSING_TOKEN.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReport {
    pub gene_set: String,
    /// `None` marks a missing score.
    pub scores: Vec<(String, Option<f64>)>,
}

/// Reads back a report produced by [`render_report`].
pub fn parse_report(text: &str) -> Result<ParsedReport, GeneScoreError> {
    let invalid = |reason: String| GeneScoreError::Filesystem(format!("invalid score report: {reason}"));
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_reader(text.as_bytes());
    let header = reader.headers().map_err(|err| invalid(err.to_string()))?;
    if header.len() != 2 || &header[0] != SAMPLE_COLUMN {
        return Err(invalid(format!("unexpected header {header:?}")));
    }
    let gene_set = header[1].to_string();

    let mut scores = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| invalid(err.to_string()))?;
        let score = match &record[1] {
            MISSING_TOKEN => None,
            cell => Some(
                cell.parse::<f64>()
                    .map_err(|_| invalid(format!("non-numeric score `{cell}`")))?,
            ),
        };
        scores.push((record[0].to_string(), score));
    }
    Ok(ParsedReport { gene_set, scores })
}

/// File names for each gene set: characters outside `[A-Za-z0-9]` become
/// `_`, and names colliding case-insensitively get `_2`, `_3`, ... suffixes.
pub fn report_file_names(gene_sets: &[String]) -> Vec<String> {
    let mut taken = HashSet::new();
    gene_sets
        .iter()
        .map(|name| {
            let stem = UNSAFE_FILE_CHARS.replace_all(name, "_").into_owned();
            let mut candidate = stem.clone();
            let mut suffix = 2;
            while !taken.insert(candidate.to_lowercase()) {
                candidate = format!("{stem}_{suffix}");
                suffix += 1;
            }
            format!("{candidate}.{REPORT_EXTENSION}")
        })
        .collect()
}
