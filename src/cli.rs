use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use scrubline::config::Settings;
use scrubline::dataset::Dataset;
use scrubline::pipeline::{PipelineSpec, RunReport, STEP_CATALOGUE, ensure_valid, run_pipeline, validate_pipeline};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "scrubline", version, about = "Deterministic cleaning pipelines for tabular data")]
pub struct Cli {
    /// Settings file. Defaults to <config dir>/scrubline/config.json
    #[arg(long, global = true, env = "SCRUBLINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG still wins)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a pipeline spec over a dataset
    Run {
        /// Pipeline spec (JSON)
        #[arg(short, long)]
        spec: PathBuf,

        /// Input dataset (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output dataset path. Defaults to cleaned_<input name> next to the input.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the run report as JSON to this path
        #[arg(short, long)]
        report: Option<PathBuf>,
    },
    /// Check a pipeline spec against a dataset's schema without running it
    Validate {
        /// Pipeline spec (JSON)
        #[arg(short, long)]
        spec: PathBuf,

        /// Input dataset (JSON)
        #[arg(short, long)]
        input: PathBuf,
    },
    /// List the supported step ops
    Steps,
}

pub fn run_command(command: Commands, settings: &Settings) -> Result<()> {
    match command {
        Commands::Run {
            spec,
            input,
            output,
            report,
        } => {
            let output = output.unwrap_or_else(|| default_output_path(&input));
            let report = handle_run(&spec, &input, &output, report.as_deref(), settings)?;
            println!("{}", report.summary());
            for entry in &report.entries {
                println!("{entry}");
            }
            println!("Output written to {}", output.display());
            Ok(())
        }
        Commands::Validate { spec, input } => handle_validate(&spec, &input),
        Commands::Steps => {
            for (op, summary) in STEP_CATALOGUE {
                println!("{op:<22}{summary}");
            }
            Ok(())
        }
    }
}

fn load_inputs(spec_path: &Path, input_path: &Path) -> Result<(PipelineSpec, Dataset)> {
    let spec = PipelineSpec::from_file(spec_path)
        .with_context(|| format!("Failed to load pipeline spec: {}", spec_path.display()))?;
    let dataset = Dataset::from_file(input_path)
        .with_context(|| format!("Failed to load dataset: {}", input_path.display()))?;
    Ok((spec, dataset))
}

fn handle_run(
    spec_path: &Path,
    input_path: &Path,
    output_path: &Path,
    report_path: Option<&Path>,
    settings: &Settings,
) -> Result<RunReport> {
    let (spec, dataset) = load_inputs(spec_path, input_path)?;
    tracing::info!(
        "Running '{}' on {} ({} rows, {} columns)",
        spec.name,
        input_path.display(),
        dataset.height(),
        dataset.width()
    );

    ensure_valid(&spec, &dataset.schema()).context("Pipeline spec does not fit the input")?;
    let (cleaned, report) =
        run_pipeline(&spec, dataset, settings).with_context(|| format!("Pipeline '{}' failed", spec.name))?;

    cleaned
        .to_file(output_path, settings.pretty_json)
        .with_context(|| format!("Failed to write output: {}", output_path.display()))?;
    if let Some(path) = report_path {
        report
            .to_file(path, settings.pretty_json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
    }
    Ok(report)
}

fn handle_validate(spec_path: &Path, input_path: &Path) -> Result<()> {
    let (spec, dataset) = load_inputs(spec_path, input_path)?;
    let errors = validate_pipeline(&spec, &dataset.schema());
    if errors.is_empty() {
        println!("Pipeline '{}' is valid ({} steps)", spec.name, spec.steps.len());
        return Ok(());
    }
    for error in &errors {
        println!("{error}");
    }
    anyhow::bail!("Pipeline '{}' has {} problem(s)", spec.name, errors.len())
}

fn default_output_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map_or_else(|| "output.json".to_owned(), |n| n.to_string_lossy().into_owned());
    input.with_file_name(format!("cleaned_{name}"))
}
