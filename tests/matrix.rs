use std::io::Write;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;
use flate2::Compression;
use flate2::write::GzEncoder;

use kira_genescore::error::GeneScoreError;
use kira_genescore::matrix::ExpressionMatrix;

const COUNTS: &str = "gene\tS1\tS2\tS3\nACTB\t100\t120\t90\nGAPDH\t80\t85\t70\nISG15\t5\t50\t0\n";

#[test]
fn exposes_ids_and_values() {
    let matrix = ExpressionMatrix::parse(COUNTS, "counts.tsv").unwrap();
    assert_eq!(matrix.row_ids(), ["ACTB", "GAPDH", "ISG15"]);
    assert_eq!(matrix.column_ids(), ["S1", "S2", "S3"]);
    assert_eq!(matrix.values_for("ISG15").unwrap(), [5.0, 50.0, 0.0]);
}

#[test]
fn loads_gzipped_csv() {
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("counts.csv.gz")).unwrap();
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(b"gene,S1,S2\nA,1,2\nB,-0.5,3e2\n").unwrap();
    std::fs::write(path.as_std_path(), encoder.finish().unwrap()).unwrap();

    let matrix = ExpressionMatrix::load(&path).unwrap();
    assert_eq!(matrix.values_for("B").unwrap(), [-0.5, 300.0]);
}

#[test]
fn duplicate_gene_is_malformed() {
    let err = ExpressionMatrix::parse("gene\tS1\nA\t1\nA\t2\n", "mem").unwrap_err();
    assert_matches!(err, GeneScoreError::MalformedMatrix { reason, .. } if reason.contains("`A`"));
}

#[test]
fn duplicate_sample_is_malformed() {
    let err = ExpressionMatrix::parse("gene\tS1\tS1\nA\t1\t2\n", "mem").unwrap_err();
    assert_matches!(err, GeneScoreError::MalformedMatrix { reason, .. } if reason.contains("S1"));
}

#[test]
fn non_numeric_cell_is_malformed() {
    let err = ExpressionMatrix::parse("gene\tS1\tS2\nA\t1\tNA\n", "mem").unwrap_err();
    assert_matches!(err, GeneScoreError::MalformedMatrix { reason, .. } if reason.contains("non-numeric"));
}

#[test]
fn ragged_row_is_malformed() {
    let err = ExpressionMatrix::parse("gene\tS1\tS2\nA\t1\t2\nB\t3\n", "mem").unwrap_err();
    assert_matches!(err, GeneScoreError::MalformedMatrix { reason, .. } if reason.contains("line 3"));

    let err = ExpressionMatrix::parse("gene\tS1\tS2\nA\t1\t2\t3\t4\n", "mem").unwrap_err();
    assert_matches!(err, GeneScoreError::MalformedMatrix { .. });
}

#[test]
fn missing_file_is_malformed() {
    let err = ExpressionMatrix::load(&Utf8PathBuf::from("/nonexistent/counts.tsv")).unwrap_err();
    assert_matches!(err, GeneScoreError::MalformedMatrix { .. });
}

#[test]
fn row_label_over_wider_rows_is_malformed() {
    let err = ExpressionMatrix::parse("gene\tS1\tS2\nA\t1\t2\t3\n", "mem").unwrap_err();
    assert_matches!(err, GeneScoreError::MalformedMatrix { reason, .. } if reason.contains("`gene`"));

    let err = ExpressionMatrix::parse("ID,S1\nA,1,2\n", "mem").unwrap_err();
    assert_matches!(err, GeneScoreError::MalformedMatrix { .. });
}
