use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::File;
use std::io::Read;

use camino::Utf8Path;
use csv::{ReaderBuilder, StringRecord, Trim};
use flate2::read::GzDecoder;
use tracing::debug;

use crate::error::GeneScoreError;

/// Genes x samples table of expression values, stored row-major.
#[derive(Debug, Clone)]
pub struct ExpressionMatrix {
    genes: Vec<String>,
    samples: Vec<String>,
    values: Vec<f64>,
    index: HashMap<String, usize>,
}

impl ExpressionMatrix {
    pub fn load(path: &Utf8Path) -> Result<Self, GeneScoreError> {
        let file = File::open(path.as_std_path())
            .map_err(|err| GeneScoreError::matrix(path.as_str(), format!("unreadable: {err}")))?;
        let mut text = String::new();
        let read = if path.extension() == Some("gz") {
            GzDecoder::new(file).read_to_string(&mut text)
        } else {
            let mut file = file;
            file.read_to_string(&mut text)
        };
        read.map_err(|err| GeneScoreError::matrix(path.as_str(), format!("unreadable: {err}")))?;
        Self::parse(&text, path.as_str())
    }

    /// Parses delimited text: a header of sample identifiers followed by one
    /// row per gene, gene identifier first. Tab-delimited when the header
    /// contains a tab, comma-delimited otherwise.
    pub fn parse(text: &str, origin: &str) -> Result<Self, GeneScoreError> {
        let header_line = text.lines().find(|line| !line.trim().is_empty()).ok_or_else(|| {
            GeneScoreError::matrix(origin, "matrix is empty")
        })?;
        let delimiter = if header_line.contains('\t') { b'\t' } else { b',' };

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(text.as_bytes());
        let header = reader
            .headers()
            .map_err(|err| GeneScoreError::matrix(origin, err.to_string()))?
            .clone();

        let mut detected: Option<HeaderLayout> = None;
        let mut genes = Vec::new();
        let mut values = Vec::new();
        let mut index = HashMap::new();

        for (row, record) in reader.records().enumerate() {
            let line = row + 2;
            let record = record.map_err(|err| GeneScoreError::matrix(origin, err.to_string()))?;
            let layout = match detected {
                Some(layout) => layout,
                None => {
                    let layout = HeaderLayout::detect(&header, &record, origin)?;
                    debug!(
                        input = origin,
                        labelled = layout.sample_offset == 1,
                        samples = layout.row_width - 1,
                        "matrix header layout"
                    );
                    detected = Some(layout);
                    layout
                }
            };
            if record.len() != layout.row_width {
                return Err(GeneScoreError::matrix(
                    origin,
                    format!(
                        "line {line} has {} fields, expected {} (gene identifier + {} samples)",
                        record.len(),
                        layout.row_width,
                        layout.row_width - 1
                    ),
                ));
            }

            let gene = record.get(0).unwrap_or_default().to_string();
            if gene.is_empty() {
                return Err(GeneScoreError::matrix(
                    origin,
                    format!("line {line} has an empty gene identifier"),
                ));
            }
            match index.entry(gene.clone()) {
                Entry::Occupied(_) => {
                    return Err(GeneScoreError::matrix(
                        origin,
                        format!("gene identifier `{gene}` is duplicated (line {line})"),
                    ));
                }
                Entry::Vacant(slot) => {
                    slot.insert(genes.len());
                }
            }

            for (column, cell) in record.iter().enumerate().skip(1) {
                values.push(parse_cell(cell).ok_or_else(|| {
                    GeneScoreError::matrix(
                        origin,
                        format!(
                            "non-numeric value `{cell}` for gene `{gene}` at line {line}, column {}",
                            column + 1
                        ),
                    )
                })?);
            }
            genes.push(gene);
        }

        let Some(layout) = detected else {
            return Err(GeneScoreError::matrix(origin, "matrix has no gene rows"));
        };
        let samples: Vec<String> = header
            .iter()
            .skip(layout.sample_offset)
            .map(str::to_string)
            .collect();
        validate_samples(&samples, origin)?;

        Ok(Self {
            genes,
            samples,
            values,
            index,
        })
    }

    pub fn row_ids(&self) -> &[String] {
        &self.genes
    }

    pub fn column_ids(&self) -> &[String] {
        &self.samples
    }

    pub fn contains(&self, gene: &str) -> bool {
        self.index.contains_key(gene)
    }

    pub fn values_for(&self, gene: &str) -> Option<&[f64]> {
        let row = *self.index.get(gene)?;
        let width = self.samples.len();
        Some(&self.values[row * width..(row + 1) * width])
    }

    pub fn n_genes(&self) -> usize {
        self.genes.len()
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }
}

// Header cells that name the gene column rather than a sample.
const ROW_LABELS: &[&str] = &["gene", "genes", "gene_id", "geneid", "gene_name", "symbol", "id"];

#[derive(Debug, Clone, Copy)]
struct HeaderLayout {
    // Index of the first sample identifier within the header record.
    sample_offset: usize,
    row_width: usize,
}

impl HeaderLayout {
    fn detect(
        header: &StringRecord,
        first_row: &StringRecord,
        origin: &str,
    ) -> Result<Self, GeneScoreError> {
        if first_row.len() == header.len() {
            Ok(Self {
                sample_offset: 1,
                row_width: header.len(),
            })
        } else if first_row.len() == header.len() + 1 {
            let first = header.get(0).unwrap_or_default();
            if ROW_LABELS.iter().any(|label| first.eq_ignore_ascii_case(label)) {
                return Err(GeneScoreError::matrix(
                    origin,
                    format!(
                        "header starts with row label `{first}` but data rows have one more field than the header"
                    ),
                ));
            }
            Ok(Self {
                sample_offset: 0,
                row_width: first_row.len(),
            })
        } else {
            Err(GeneScoreError::matrix(
                origin,
                format!(
                    "header has {} fields but the first data row has {}",
                    header.len(),
                    first_row.len()
                ),
            ))
        }
    }
}

fn parse_cell(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn validate_samples(samples: &[String], origin: &str) -> Result<(), GeneScoreError> {
    if samples.is_empty() {
        return Err(GeneScoreError::matrix(origin, "matrix has no sample columns"));
    }
    let mut seen = HashMap::new();
    for (position, sample) in samples.iter().enumerate() {
        if sample.is_empty() {
            return Err(GeneScoreError::matrix(
                origin,
                format!("sample identifier in header column {} is empty", position + 1),
            ));
        }
        if seen.insert(sample.as_str(), position).is_some() {
            return Err(GeneScoreError::matrix(
                origin,
                format!("sample identifier `{sample}` is duplicated"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parses_labelled_header() {
        let matrix = ExpressionMatrix::parse("gene\ts1\ts2\nA\t1\t2\nB\t3\t4.5\n", "mem").unwrap();
        assert_eq!(matrix.column_ids(), ["s1", "s2"]);
        assert_eq!(matrix.row_ids(), ["A", "B"]);
        assert_eq!(matrix.values_for("B").unwrap(), [3.0, 4.5]);
        assert!(matrix.values_for("C").is_none());
    }

    #[test]
    fn parses_sample_only_header() {
        let matrix = ExpressionMatrix::parse("s1,s2\nA,1,2\n", "mem").unwrap();
        assert_eq!(matrix.column_ids(), ["s1", "s2"]);
        assert_eq!(matrix.values_for("A").unwrap(), [1.0, 2.0]);
    }

    #[test]
    fn rejects_nan_literal() {
        let err = ExpressionMatrix::parse("gene\ts1\nA\tNaN\n", "mem").unwrap_err();
        assert_matches!(err, GeneScoreError::MalformedMatrix { .. });
    }

    #[test]
    fn rejects_header_without_rows() {
        let err = ExpressionMatrix::parse("gene\ts1\n", "mem").unwrap_err();
        assert_matches!(err, GeneScoreError::MalformedMatrix { reason, .. } if reason.contains("no gene rows"));
    }
}
