use std::fs;
use std::path::Path;
use std::process::Command;

const TRACKED_CRATES: &[&str] = &["csv", "image", "rayon", "serde_yaml"];

fn emit_rustc_version() {
    let rustc = std::env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    let version = Command::new(rustc)
        .arg("--version")
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .and_then(|text| text.split_whitespace().nth(1).map(str::to_string));
    if let Some(version) = version {
        println!("cargo:rustc-env=KIRA_GS_RUSTC_VERSION={version}");
    }
}

fn emit_locked_versions() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let lock_path = Path::new(&manifest_dir).join("Cargo.lock");
    println!("cargo:rerun-if-changed={}", lock_path.display());

    let Ok(lock) = fs::read_to_string(&lock_path) else {
        return;
    };

    // Cargo.lock lists `name = "..."` immediately followed by `version = "..."`.
    let mut resolved = Vec::new();
    let mut current: Option<&str> = None;
    for line in lock.lines() {
        let line = line.trim();
        if let Some(name) = line.strip_prefix("name = ") {
            current = Some(name.trim_matches('"'));
            continue;
        }
        if let (Some(name), Some(version)) = (current.take(), line.strip_prefix("version = ")) {
            if TRACKED_CRATES.contains(&name) && !resolved.iter().any(|(n, _)| *n == name) {
                resolved.push((name, version.trim_matches('"')));
            }
        }
    }

    let encoded = resolved
        .iter()
        .map(|(name, version)| format!("{name}={version}"))
        .collect::<Vec<_>>()
        .join(";");
    println!("cargo:rustc-env=KIRA_GS_LOCKED_VERSIONS={encoded}");
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    emit_rustc_version();
    emit_locked_versions();
}
