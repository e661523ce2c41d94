use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::GeneScoreError;
use crate::manifest::DEFAULT_STAGE_ID;
use crate::render::DEFAULT_CELL_SIZE;

pub const DEFAULT_CONFIG_FILE: &str = "kira-genescore.json";
pub const DEFAULT_HEATMAP_FILE: &str = "gene_set_scores_heatmap.png";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub outdir: Option<String>,
    #[serde(default)]
    pub stage_id: Option<String>,
    #[serde(default)]
    pub heatmap: Option<HeatmapEntry>,
    #[serde(default)]
    pub threads: Option<usize>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct HeatmapEntry {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub cell_size: Option<u32>,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatmapSettings {
    pub enabled: bool,
    pub cell_size: u32,
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub outdir: Utf8PathBuf,
    pub stage_id: String,
    pub heatmap: HeatmapSettings,
    pub threads: Option<usize>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        ConfigLoader::resolve_config(Config::default())
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub outdir: Option<String>,
    pub stage_id: Option<String>,
    pub no_heatmap: bool,
    pub threads: Option<usize>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path` when given, otherwise `kira-genescore.json` from the
    /// working directory when it exists, otherwise the built-in defaults.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, GeneScoreError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(ResolvedConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| GeneScoreError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| GeneScoreError::ConfigParse(err.to_string()))?;

        Ok(Self::resolve_config(config))
    }

    pub fn resolve_config(config: Config) -> ResolvedConfig {
        let heatmap = config.heatmap.unwrap_or_default();
        ResolvedConfig {
            schema_version: config.schema_version.unwrap_or(1),
            outdir: Utf8PathBuf::from(config.outdir.unwrap_or_else(|| ".".to_string())),
            stage_id: config
                .stage_id
                .unwrap_or_else(|| DEFAULT_STAGE_ID.to_string()),
            heatmap: HeatmapSettings {
                enabled: heatmap.enabled.unwrap_or(true),
                cell_size: heatmap.cell_size.unwrap_or(DEFAULT_CELL_SIZE),
                file_name: heatmap
                    .file_name
                    .unwrap_or_else(|| DEFAULT_HEATMAP_FILE.to_string()),
            },
            threads: config.threads.filter(|threads| *threads > 0),
        }
    }
}

impl ResolvedConfig {
    pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(outdir) = overrides.outdir {
            self.outdir = Utf8PathBuf::from(outdir);
        }
        if let Some(stage_id) = overrides.stage_id {
            self.stage_id = stage_id;
        }
        if overrides.no_heatmap {
            self.heatmap.enabled = false;
        }
        if let Some(threads) = overrides.threads.filter(|threads| *threads > 0) {
            self.threads = Some(threads);
        }
        self
    }
}
