use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use kira_genescore::config::{Config, ConfigLoader, ConfigOverrides, HeatmapEntry};
use kira_genescore::error::GeneScoreError;

#[test]
fn resolve_file_and_apply_overrides() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("kira-genescore.json");
    std::fs::write(
        &path,
        r#"{"outdir": "results", "stage_id": "QC", "heatmap": {"cell_size": 8}, "threads": 2}"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(resolved.outdir, Utf8PathBuf::from("results"));
    assert_eq!(resolved.stage_id, "QC");
    assert_eq!(resolved.heatmap.cell_size, 8);
    assert!(resolved.heatmap.enabled);
    assert_eq!(resolved.threads, Some(2));

    let overridden = resolved.apply(ConfigOverrides {
        outdir: Some("elsewhere".to_string()),
        stage_id: None,
        no_heatmap: true,
        threads: Some(0),
    });
    assert_eq!(overridden.outdir, Utf8PathBuf::from("elsewhere"));
    assert_eq!(overridden.stage_id, "QC");
    assert!(!overridden.heatmap.enabled);
    assert_eq!(overridden.threads, Some(2));
}

#[test]
fn heatmap_can_be_disabled_in_file() {
    let resolved = ConfigLoader::resolve_config(Config {
        heatmap: Some(HeatmapEntry {
            enabled: Some(false),
            cell_size: None,
            file_name: Some("qc.png".to_string()),
        }),
        ..Config::default()
    });
    assert!(!resolved.heatmap.enabled);
    assert_eq!(resolved.heatmap.file_name, "qc.png");
}

#[test]
fn explicit_missing_config_is_an_error() {
    let err = ConfigLoader::resolve(Some("/nonexistent/kira-genescore.json")).unwrap_err();
    assert_matches!(err, GeneScoreError::ConfigRead(_));
}

#[test]
fn invalid_json_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, GeneScoreError::ConfigParse(_));
}
