use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use kira_genescore::catalog::GeneSetCatalog;
use kira_genescore::error::GeneScoreError;

#[test]
fn load_yaml_catalog() {
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("sets.yml")).unwrap();
    std::fs::write(
        path.as_std_path(),
        "interferon:\n  - ISG15\n  - MX1\nhousekeeping: [ACTB, GAPDH, ACTB]\n",
    )
    .unwrap();

    let catalog = GeneSetCatalog::load(&path).unwrap();
    assert_eq!(catalog.names(), vec!["interferon", "housekeeping"]);
    assert_eq!(catalog.get("housekeeping").unwrap().genes(), ["ACTB", "GAPDH"]);
}

#[test]
fn json_documents_are_accepted() {
    let catalog = GeneSetCatalog::parse(r#"{"b": ["X"], "a": ["Y", "Z"]}"#, "mem").unwrap();
    assert_eq!(catalog.names(), vec!["b", "a"]);
}

#[test]
fn duplicated_name_is_malformed() {
    let err = GeneSetCatalog::parse("dup: [A]\nother: [B]\ndup: [C]\n", "sets.yml").unwrap_err();
    assert_matches!(err, GeneScoreError::MalformedCatalog { input, .. } if input == "sets.yml");
}

#[test]
fn empty_documents_are_malformed() {
    assert_matches!(
        GeneSetCatalog::parse("", "mem").unwrap_err(),
        GeneScoreError::MalformedCatalog { .. }
    );
    assert_matches!(
        GeneSetCatalog::parse("{}", "mem").unwrap_err(),
        GeneScoreError::MalformedCatalog { .. }
    );
}

#[test]
fn empty_name_is_malformed() {
    let err = GeneSetCatalog::parse("\"  \": [A]\n", "mem").unwrap_err();
    assert_matches!(err, GeneScoreError::MalformedCatalog { reason, .. } if reason.contains("empty"));
}

#[test]
fn non_string_members_are_malformed() {
    let err = GeneSetCatalog::parse("set:\n  nested: true\n", "mem").unwrap_err();
    assert_matches!(err, GeneScoreError::MalformedCatalog { .. });

    let err = GeneSetCatalog::parse("set: [[A, B]]\n", "mem").unwrap_err();
    assert_matches!(err, GeneScoreError::MalformedCatalog { .. });
}

#[test]
fn empty_gene_list_is_allowed() {
    let catalog = GeneSetCatalog::parse("empty: []\n", "mem").unwrap();
    assert!(catalog.get("empty").unwrap().genes().is_empty());
}
