use clap::{Parser, Subcommand};
use hf_sim::{CaseConfig, Controller, Fracture, RunSummary};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::Level;

mod error;

use error::{CliError, CliResult};

#[derive(Parser)]
#[command(name = "hf-cli")]
#[command(about = "Planar hydraulic fracture propagation", long_about = None)]
struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log: Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a case file and build its initial state
    Validate {
        /// Path to the case YAML file
        case_path: PathBuf,
    },
    /// Run a case to completion
    Run {
        /// Path to the case YAML file
        case_path: PathBuf,
        /// Write the summary and final state as JSON (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Report per-stage timings at the end of the run
        #[arg(long)]
        timing: bool,
    },
}

/// What a run writes out.
#[derive(Serialize)]
struct RunOutput<'a> {
    summary: &'a RunSummary,
    fracture: &'a Fracture,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_max_level(cli.log).init();

    match cli.command {
        Commands::Validate { case_path } => cmd_validate(&case_path),
        Commands::Run {
            case_path,
            output,
            timing,
        } => cmd_run(&case_path, output.as_deref(), timing),
    }
}

fn load_case(path: &Path) -> CliResult<CaseConfig> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::CaseRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&text).map_err(|source| CliError::CaseParse {
        path: path.to_path_buf(),
        source,
    })
}

fn cmd_validate(case_path: &Path) -> CliResult<()> {
    println!("Validating case: {}", case_path.display());
    let case = load_case(case_path)?;
    let controller = Controller::from_case(&case)?;
    let f = controller.latest();
    let mesh = &controller.problem().mesh;
    println!("✓ Case is valid");
    println!("  Mesh: {} x {} cells", mesh.nx(), mesh.ny());
    println!(
        "  Initial footprint: {} channel, {} tip cells at t = {:.4e} s",
        f.sets.channel.len(),
        f.sets.tip.len(),
        f.time
    );
    Ok(())
}

fn cmd_run(case_path: &Path, output: Option<&Path>, timing: bool) -> CliResult<()> {
    if timing {
        hf_core::timing::enable_timing();
    }
    let case = load_case(case_path)?;
    let mut controller = Controller::from_case(&case)?;
    let summary = controller.run()?;

    let f = controller.latest();
    let area = controller.problem().mesh.cell_area();
    eprintln!(
        "✓ Run finished ({:?}) after {} steps at t = {:.4e} s",
        summary.end, summary.steps, summary.time
    );
    eprintln!("  Footprint area: {:.4e} m²", f.footprint_area(area));
    eprintln!("  Efficiency: {:.4}", f.efficiency());
    if let Some(r) = f.mean_radius([0.0, 0.0]) {
        eprintln!("  Mean radius: {r:.4} m");
    }

    let json = serde_json::to_string_pretty(&RunOutput {
        summary: &summary,
        fracture: f,
    })?;
    match output {
        Some(path) => std::fs::write(path, json).map_err(|source| CliError::OutputWrite {
            path: path.to_path_buf(),
            source,
        })?,
        None => println!("{json}"),
    }
    Ok(())
}
