use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kira_genescore::app::{App, RunRequest};
use kira_genescore::config::{ConfigLoader, ConfigOverrides};
use kira_genescore::domain::ScoringMethod;
use kira_genescore::error::GeneScoreError;
use kira_genescore::output::{JsonOutput, LogSink, OutputMode, print_summary};

#[derive(Parser)]
#[command(name = "kira-genescore")]
#[command(about = "Score gene sets per sample from an expression matrix (mean, median, sum, zscore_mean)")]
#[command(version, author)]
struct Cli {
    /// Gene-set catalog: YAML/JSON mapping of gene-set name to gene identifiers
    catalog: Utf8PathBuf,

    /// Count matrix: delimited text, header of sample ids, first column gene ids (.gz accepted)
    matrix: Utf8PathBuf,

    /// Scoring method: mean, median, sum or zscore_mean
    method: String,

    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    outdir: Option<String>,

    #[arg(long)]
    stage_id: Option<String>,

    #[arg(long)]
    no_heatmap: bool,

    #[arg(long)]
    threads: Option<usize>,

    /// Print the run result as JSON on stdout
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<GeneScoreError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &GeneScoreError) -> u8 {
    match error {
        GeneScoreError::MalformedCatalog { .. } => 2,
        GeneScoreError::MalformedMatrix { .. } => 3,
        GeneScoreError::UnsupportedMethod { .. } => 4,
        GeneScoreError::ConfigRead(_)
        | GeneScoreError::ConfigParse(_)
        | GeneScoreError::InvalidTable(_)
        | GeneScoreError::Filesystem(_) => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    // Rejected before the config file or any input is touched.
    let method: ScoringMethod = cli.method.parse()?;
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let config = ConfigLoader::resolve(cli.config.as_deref())?.apply(ConfigOverrides {
        outdir: cli.outdir,
        stage_id: cli.stage_id,
        no_heatmap: cli.no_heatmap,
        threads: cli.threads,
    });

    if let Some(threads) = config.threads {
        if let Err(err) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            tracing::warn!("could not size thread pool to {threads}: {err}");
        }
    }

    let request = RunRequest {
        catalog_path: cli.catalog,
        matrix_path: cli.matrix,
        method,
    };
    let app = App::new(config);

    match output_mode {
        OutputMode::Json => {
            let result = app.run(&request, &JsonOutput)?;
            JsonOutput::print_run(&result).into_diagnostic()?;
        }
        OutputMode::Human => {
            let result = app.run(&request, &LogSink)?;
            print_summary(&result);
        }
    }
    Ok(())
}
