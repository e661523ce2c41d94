use std::fs;
use std::process::{Command, Output};

use camino::Utf8PathBuf;

const CATALOG: &str = "interferon: [ISG15, MX1]\nhousekeeping: [ACTB]\n";
const COUNTS: &str = "gene\tS1\tS2\nACTB\t100\t120\nISG15\t5\t50\nMX1\t3\t40\n";

struct Workspace {
    _temp: tempfile::TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    fn new(catalog: &str, counts: &str) -> Self {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        fs::write(root.join("sets.yml").as_std_path(), catalog).unwrap();
        fs::write(root.join("counts.tsv").as_std_path(), counts).unwrap();
        Self { _temp: temp, root }
    }

    fn outdir(&self) -> Utf8PathBuf {
        self.root.join("out")
    }

    fn run(&self, method: &str, extra: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_kira-genescore"))
            .current_dir(self.root.as_std_path())
            .env("RUST_LOG", "off")
            .args(["sets.yml", "counts.tsv", method, "--outdir", self.outdir().as_str()])
            .args(extra)
            .output()
            .unwrap()
    }
}

#[test]
fn successful_run_exits_zero() {
    let workspace = Workspace::new(CATALOG, COUNTS);
    let output = workspace.run("mean", &[]);
    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));

    let interferon = fs::read_to_string(workspace.outdir().join("interferon.txt").as_std_path()).unwrap();
    assert_eq!(interferon, "sample\tinterferon\nS1\t4\nS2\t45\n");
}

#[test]
fn all_missing_scores_still_exit_zero() {
    let workspace = Workspace::new("ghost: [NOPE]\nphantom: [NADA]\n", COUNTS);
    let output = workspace.run("zscore_mean", &[]);
    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));

    let ghost = fs::read_to_string(workspace.outdir().join("ghost.txt").as_std_path()).unwrap();
    assert_eq!(ghost, "sample\tghost\nS1\tNA\nS2\tNA\n");
}

#[test]
fn malformed_catalog_exits_two() {
    let workspace = Workspace::new("- not\n- a mapping\n", COUNTS);
    let output = workspace.run("mean", &[]);
    assert_eq!(output.status.code(), Some(2));
    assert!(!workspace.outdir().as_std_path().exists());
}

#[test]
fn malformed_matrix_exits_three() {
    let workspace = Workspace::new(CATALOG, "gene\tS1\nACTB\tmany\n");
    let output = workspace.run("mean", &[]);
    assert_eq!(output.status.code(), Some(3));
    assert!(!workspace.outdir().as_std_path().exists());
}

#[test]
fn unsupported_method_exits_four_before_reading_config() {
    let workspace = Workspace::new(CATALOG, COUNTS);
    let output = workspace.run("bogus", &["--config", "/nonexistent/c.json"]);
    assert_eq!(output.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&output.stderr).contains("bogus"));
    assert!(!workspace.outdir().as_std_path().exists());
}

#[test]
fn unsupported_method_wins_over_missing_inputs() {
    let workspace = Workspace::new(CATALOG, COUNTS);
    fs::remove_file(workspace.root.join("sets.yml").as_std_path()).unwrap();
    fs::remove_file(workspace.root.join("counts.tsv").as_std_path()).unwrap();
    let output = workspace.run("Mean", &[]);
    assert_eq!(output.status.code(), Some(4));
    assert!(!workspace.outdir().as_std_path().exists());
}

#[test]
fn positionals_are_catalog_then_matrix() {
    let workspace = Workspace::new(CATALOG, COUNTS);
    let output = Command::new(env!("CARGO_BIN_EXE_kira-genescore"))
        .current_dir(workspace.root.as_std_path())
        .env("RUST_LOG", "off")
        .args(["counts.tsv", "sets.yml", "sum", "--outdir", workspace.outdir().as_str()])
        .output()
        .unwrap();
    // The matrix text is not a name -> identifiers mapping.
    assert_eq!(output.status.code(), Some(2));
    assert!(!workspace.outdir().as_std_path().exists());
}

#[test]
fn unreadable_config_exits_one() {
    let workspace = Workspace::new(CATALOG, COUNTS);
    let output = workspace.run("mean", &["--config", "/nonexistent/c.json"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!workspace.outdir().as_std_path().exists());
}
