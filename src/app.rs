use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::GeneSetCatalog;
use crate::config::ResolvedConfig;
use crate::domain::{GeneSetCoverage, ScoreWarning, ScoringMethod};
use crate::error::GeneScoreError;
use crate::fs_util::{ensure_dir, write_atomic};
use crate::manifest::{BuildManifest, BuildManifestWriter};
use crate::matrix::ExpressionMatrix;
use crate::render::HeatmapRenderer;
use crate::report::{ReportFile, ScoreReportWriter};
use crate::score::{self, ScoreTable};

pub const RUN_SUMMARY_FILE: &str = "run_summary.json";

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub catalog_path: Utf8PathBuf,
    pub matrix_path: Utf8PathBuf,
    pub method: ScoringMethod,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub method: ScoringMethod,
    pub generated_at: String,
    pub samples: usize,
    pub gene_sets: usize,
    pub coverage: Vec<GeneSetCoverage>,
    pub warnings: Vec<ScoreWarning>,
    pub reports: Vec<ReportFile>,
    pub heatmap: Option<String>,
    pub manifest: String,
    pub summary: String,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Debug, Clone)]
pub struct App {
    config: ResolvedConfig,
}

impl App {
    pub fn new(config: ResolvedConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Runs one scoring invocation. Every fatal condition is detected before
    /// the output directory is touched; warnings never abort the run.
    pub fn run(
        &self,
        request: &RunRequest,
        sink: &dyn ProgressSink,
    ) -> Result<RunResult, GeneScoreError> {
        let started = Instant::now();
        let method = request.method;

        sink.event(ProgressEvent {
            message: format!("phase=Load; catalog {}", request.catalog_path),
            elapsed: None,
        });
        let catalog = GeneSetCatalog::load(&request.catalog_path)?;
        sink.event(ProgressEvent {
            message: format!("phase=Load; matrix {}", request.matrix_path),
            elapsed: None,
        });
        let matrix = ExpressionMatrix::load(&request.matrix_path)?;
        info!(
            gene_sets = catalog.len(),
            genes = matrix.n_genes(),
            samples = matrix.n_samples(),
            "inputs loaded"
        );

        sink.event(ProgressEvent {
            message: format!("phase=Score; method {method}"),
            elapsed: Some(started.elapsed()),
        });
        let outcome = score::compute(&catalog, &matrix, method);
        let mut warnings = outcome.warnings;

        let outdir = self.config.outdir.as_path();
        ensure_dir(outdir)?;

        sink.event(ProgressEvent {
            message: "phase=Write; score tables".to_string(),
            elapsed: Some(started.elapsed()),
        });
        let reports = ScoreReportWriter::new(outdir).write(&outcome.table)?;

        let heatmap = if self.config.heatmap.enabled {
            sink.event(ProgressEvent {
                message: "phase=Render; heatmap".to_string(),
                elapsed: Some(started.elapsed()),
            });
            match self.render_heatmap(&outcome.table, outdir) {
                Ok(path) => Some(path.to_string()),
                Err(reason) => {
                    let warning = ScoreWarning::RenderSkipped { reason };
                    warn!("{warning}");
                    warnings.push(warning);
                    None
                }
            }
        } else {
            None
        };

        sink.event(ProgressEvent {
            message: "phase=Write; build manifest".to_string(),
            elapsed: Some(started.elapsed()),
        });
        let manifest = BuildManifestWriter::new(outdir)
            .write(&BuildManifest::resolve(self.config.stage_id.as_str()))?;

        let summary_path = outdir.join(RUN_SUMMARY_FILE);
        let result = RunResult {
            method,
            generated_at: Utc::now().to_rfc3339(),
            samples: outcome.table.n_samples(),
            gene_sets: outcome.table.n_gene_sets(),
            coverage: outcome.coverage,
            warnings,
            reports,
            heatmap,
            manifest: manifest.to_string(),
            summary: summary_path.to_string(),
        };
        let summary = serde_json::to_vec_pretty(&result)
            .map_err(|err| GeneScoreError::Filesystem(err.to_string()))?;
        write_atomic(&summary_path, &summary)?;

        sink.event(ProgressEvent {
            message: format!(
                "phase=Done; {} score tables, {} warnings",
                result.reports.len(),
                result.warnings.len()
            ),
            elapsed: Some(started.elapsed()),
        });
        Ok(result)
    }

    fn render_heatmap(&self, table: &ScoreTable, outdir: &Utf8Path) -> Result<Utf8PathBuf, String> {
        let heatmap = HeatmapRenderer::new(self.config.heatmap.cell_size)
            .render(table)
            .map_err(|skipped| skipped.0)?;
        let png = heatmap.encode_png().map_err(|skipped| skipped.0)?;
        let path = outdir.join(&self.config.heatmap.file_name);
        write_atomic(&path, &png).map_err(|err| err.to_string())?;
        Ok(path)
    }
}
