//! Command-line driver for the civil-violence model.
//!
//! `run` executes one simulation and optionally writes its reporters;
//! `sweep` runs the network-size x discount-factor x seed batch.

use std::path::{Path, PathBuf};

use civil_violence::SimulationConfig;
use civil_violence::SimulationState;
use civil_violence::batch::ParameterSweep;
use civil_violence::metrics::{write_jsonl, write_model_csv};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Networked civil violence simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// JSON file with configuration overrides.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl ConfigArgs {
    fn load(&self) -> Result<SimulationConfig, civil_violence::ConfigError> {
        match &self.config {
            Some(path) => SimulationConfig::from_json_file(path),
            None => Ok(SimulationConfig::default()),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one simulation until it terminates.
    Run {
        #[command(flatten)]
        config: ConfigArgs,
        /// Override the configured seed.
        #[arg(long)]
        seed: Option<u64>,
        /// Stop after this many steps even if the model is still running.
        #[arg(long)]
        steps: Option<u64>,
        /// Directory for model.csv, model.jsonl and agents.jsonl.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Run the parameter sweep and write CSV results.
    Sweep {
        #[command(flatten)]
        config: ConfigArgs,
        #[arg(long, value_delimiter = ',', default_value = "1,11,21")]
        network_sizes: Vec<usize>,
        #[arg(long, value_delimiter = ',', default_value = "0,0.33,0.5,0.66,1")]
        discounts: Vec<f64>,
        /// Seeds 1..=N are swept.
        #[arg(long, default_value_t = 10)]
        runs: u64,
        #[arg(long, default_value_t = 500)]
        max_steps: u64,
        #[arg(long, default_value = "data")]
        out: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .compact()
        .init();

    match Cli::parse().command {
        Command::Run {
            config,
            seed,
            steps,
            out,
        } => {
            let mut config = config.load()?;
            if seed.is_some() {
                config.seed = seed;
            }
            run_single(config, steps, out.as_deref())
        }
        Command::Sweep {
            config,
            network_sizes,
            discounts,
            runs,
            max_steps,
            out,
        } => {
            let sweep = ParameterSweep::new(config.load()?, max_steps)
                .vary("citizen_network_size", network_sizes)
                .vary("network_discount_factor", discounts)
                .vary("seed", 1..=runs);
            let outcomes = sweep.run();
            let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
            let report = sweep.write_results(&outcomes, &out)?;
            info!(
                runs = outcomes.len(),
                failed,
                written = report.runs_written,
                write_failures = report.failures.len(),
                out = %out.display(),
                "sweep complete"
            );
            Ok(())
        }
    }
}

fn run_single(
    config: SimulationConfig,
    steps: Option<u64>,
    out: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut state = SimulationState::initialize(config)?;
    while state.is_running() && steps.is_none_or(|limit| state.iteration() < limit) {
        state.step();
    }
    let counts = state.counts();
    info!(
        iteration = state.iteration(),
        seed = state.seed(),
        quiescent = counts.quiescent,
        active = counts.active,
        jailed = counts.jailed,
        speed = state.speed_of_rebellion_transmission(),
        "run finished"
    );

    if let Some(dir) = out {
        std::fs::create_dir_all(dir)?;
        let metrics = state.into_metrics();
        write_model_csv(&dir.join("model.csv"), metrics.model_rows())?;
        write_jsonl(&dir.join("model.jsonl"), metrics.model_rows())?;
        write_jsonl(&dir.join("agents.jsonl"), metrics.agent_rows())?;
        info!(out = %dir.display(), "reporters written");
    }
    Ok(())
}
