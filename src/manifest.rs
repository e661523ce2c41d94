use camino::{Utf8Path, Utf8PathBuf};
use serde_yaml::{Mapping, Value};

use crate::error::GeneScoreError;
use crate::fs_util::write_atomic;

pub const UNKNOWN_VERSION: &str = "unknown";
pub const DEFAULT_STAGE_ID: &str = "GENE_SET_SCORES";
pub const MANIFEST_FILE_NAME: &str = "versions.yml";

/// Libraries doing the numeric, parsing or rendering work.
pub const COMPUTATIONAL_LIBRARIES: &[&str] = &["csv", "image", "rayon", "serde_yaml"];

/// Tool name to version, in recording order, keyed by the invoking stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildManifest {
    stage_id: String,
    tools: Vec<(String, String)>,
}

impl BuildManifest {
    pub fn new(stage_id: impl Into<String>) -> Self {
        Self {
            stage_id: stage_id.into(),
            tools: Vec::new(),
        }
    }

    /// Manifest for this build: the engine itself, the compiler and every
    /// computational library, with versions captured at compile time.
    pub fn resolve(stage_id: impl Into<String>) -> Self {
        let mut manifest = Self::new(stage_id);
        manifest.record(env!("CARGO_PKG_NAME"), Some(env!("CARGO_PKG_VERSION")));
        manifest.record("rustc", option_env!("KIRA_GS_RUSTC_VERSION"));
        let locked = option_env!("KIRA_GS_LOCKED_VERSIONS").unwrap_or_default();
        for library in COMPUTATIONAL_LIBRARIES {
            manifest.record(library, locked_version(locked, library));
        }
        manifest
    }

    /// Records `tool`; an unresolved or blank version becomes [`UNKNOWN_VERSION`].
    /// Recording an existing tool again keeps the first version.
    pub fn record(&mut self, tool: &str, version: Option<&str>) {
        if self.tools.iter().any(|(name, _)| name == tool) {
            return;
        }
        let version = version
            .map(str::trim)
            .filter(|version| !version.is_empty())
            .unwrap_or(UNKNOWN_VERSION);
        self.tools.push((tool.to_string(), version.to_string()));
    }

    pub fn stage_id(&self) -> &str {
        &self.stage_id
    }

    pub fn tools(&self) -> &[(String, String)] {
        &self.tools
    }

    pub fn version_of(&self, tool: &str) -> Option<&str> {
        self.tools
            .iter()
            .find(|(name, _)| name == tool)
            .map(|(_, version)| version.as_str())
    }

    pub fn to_yaml(&self) -> Result<String, GeneScoreError> {
        let mut tools = Mapping::new();
        for (name, version) in &self.tools {
            tools.insert(Value::String(name.clone()), Value::String(version.clone()));
        }
        let mut root = Mapping::new();
        root.insert(Value::String(self.stage_id.clone()), Value::Mapping(tools));
        serde_yaml::to_string(&root).map_err(|err| GeneScoreError::Filesystem(err.to_string()))
    }
}

fn locked_version<'a>(encoded: &'a str, library: &str) -> Option<&'a str> {
    encoded
        .split(';')
        .filter_map(|entry| entry.split_once('='))
        .find(|(name, _)| *name == library)
        .map(|(_, version)| version)
}

#[derive(Debug, Clone)]
pub struct BuildManifestWriter {
    outdir: Utf8PathBuf,
}

impl BuildManifestWriter {
    pub fn new(outdir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            outdir: outdir.into(),
        }
    }

    /// Only filesystem failures can surface here; every tool is always present.
    pub fn write(&self, manifest: &BuildManifest) -> Result<Utf8PathBuf, GeneScoreError> {
        let path = self.outdir.join(MANIFEST_FILE_NAME);
        write_manifest(&path, manifest)?;
        Ok(path)
    }
}

fn write_manifest(path: &Utf8Path, manifest: &BuildManifest) -> Result<(), GeneScoreError> {
    let yaml = manifest.to_yaml()?;
    write_atomic(path, yaml.as_bytes())
}
