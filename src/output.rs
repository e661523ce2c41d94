use std::io::{self, Write};

use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink, RunResult};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Human,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_run(result: &RunResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Forwards progress events to the tracing subscriber.
pub struct LogSink;

impl ProgressSink for LogSink {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "{}", event.message),
            None => tracing::info!("{}", event.message),
        }
    }
}

pub fn summary_lines(result: &RunResult) -> Vec<String> {
    let mut lines = vec![format!(
        "scored {} gene sets x {} samples with `{}`",
        result.gene_sets, result.samples, result.method
    )];
    for coverage in &result.coverage {
        lines.push(format!(
            "  {}: {}/{} genes matched",
            coverage.gene_set, coverage.matched, coverage.requested
        ));
    }
    lines.push(format!("score tables: {}", result.reports.len()));
    if let Some(heatmap) = &result.heatmap {
        lines.push(format!("heatmap: {heatmap}"));
    }
    lines.push(format!("manifest: {}", result.manifest));
    for warning in &result.warnings {
        lines.push(format!("warning: {warning}"));
    }
    lines
}

pub fn print_summary(result: &RunResult) {
    for line in summary_lines(result) {
        println!("{line}");
    }
}
