use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use mfem_solver::{
    AnalysisPipeline, Cantilever, DiffusionDomain, LaminateMaterial, MechanicalModel,
    PlateMaterial,
};
use serde::Serialize;
use tracing::Level;

mod demo;
mod error;
mod job;

use demo::Scenario;
use error::CliError;
use job::{ModalJob, StaticJob};

#[derive(Parser)]
#[command(name = "mfem-cli")]
#[command(about = "Modal and static finite element analysis of grid-topology MEMS cantilevers")]
struct Args {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Natural frequencies and tip readouts of a cantilever job
    Modal {
        job: PathBuf,
        /// Number of modes (default: from the job file, else 3)
        #[arg(long)]
        modes: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Steady diffusion solve of a domain job
    Static {
        job: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Run a bundled scenario
    Demo {
        #[arg(value_enum)]
        scenario: Scenario,
        #[arg(long)]
        json: bool,
    },
}

fn print_report<T: Serialize>(report: &T, text: String, json: bool) -> Result<(), CliError> {
    if json {
        let out = serde_json::to_string_pretty(report).map_err(|source| CliError::Json {
            context: "report".to_string(),
            source,
        })?;
        println!("{out}");
    } else {
        println!("{text}");
    }
    Ok(())
}

fn run_modal(
    cantilever: Cantilever,
    model: MechanicalModel,
    modes: usize,
    json: bool,
) -> Result<(), CliError> {
    if !json {
        print!("{cantilever}");
    }
    let report = AnalysisPipeline::modal(modes).run_modal(cantilever, model)?;
    print_report(&report, report.format(), json)
}

fn run_static(domain: DiffusionDomain, json: bool) -> Result<(), CliError> {
    let report = AnalysisPipeline::static_diffusion().run_static(domain)?;
    print_report(&report, report.format(), json)
}

fn run(args: Args) -> Result<(), CliError> {
    match args.command {
        Command::Modal { job, modes, json } => {
            let job: ModalJob = job::load(&job)?;
            let modes = modes.or(job.modes).unwrap_or(demo::DEMO_MODES);
            let (cantilever, model) = job.into_parts()?;
            run_modal(cantilever, model, modes, json)
        }
        Command::Static { job, json } => {
            let job: StaticJob = job::load(&job)?;
            run_static(job.into_domain()?, json)
        }
        Command::Demo { scenario, json } => match scenario {
            Scenario::Plate => run_modal(
                demo::paddle_cantilever()?,
                PlateMaterial::soi_mumps().into(),
                demo::DEMO_MODES,
                json,
            ),
            Scenario::Laminate => run_modal(
                demo::paddle_cantilever()?,
                LaminateMaterial::piezo_mumps().into(),
                demo::DEMO_MODES,
                json,
            ),
            Scenario::Poisson => run_static(demo::poisson_domain()?, json),
        },
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}
