// Purpose: Provides the command-line interface for the banker simulation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use banker_error::{InitError, InitResult};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tokio::sync::watch;
use tracing::{error, info};

use crate::config::SimulationConfig;
use crate::engine::Simulation;
use crate::reporter::ConsoleReporter;

/// Banker's algorithm simulation: concurrent customers competing for a fixed
/// pool of resources, with every grant checked for safety.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    /// Initial available units, one value per resource type
    #[clap(required = true, value_name = "AVAILABLE")]
    pub available: Vec<u32>,

    /// TOML file with simulation settings
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Number of customers
    #[clap(long)]
    pub customers: Option<usize>,

    /// Request cycles per customer (default: run until Ctrl-C)
    #[clap(long)]
    pub iterations: Option<u64>,

    /// Seed for maxima, amounts and delays
    #[clap(long)]
    pub seed: Option<u64>,

    /// Longest idle time between cycles, in milliseconds
    #[clap(long)]
    pub max_think_ms: Option<u64>,

    /// Longest time granted units are held, in milliseconds
    #[clap(long)]
    pub max_hold_ms: Option<u64>,

    /// Print the final report as JSON
    #[clap(long)]
    pub json: bool,
}

impl Cli {
    /// Layer flags over the config file over defaults, and check the
    /// positional counts against the number of resource types.
    pub fn resolve(&self) -> InitResult<(SimulationConfig, Vec<u32>)> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::load(path)?,
            None => SimulationConfig::default(),
        };

        if let Some(customers) = self.customers {
            config.customers = customers;
        }
        if let Some(iterations) = self.iterations {
            config.iterations = Some(iterations);
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(ms) = self.max_think_ms {
            config.max_think_ms = ms;
        }
        if let Some(ms) = self.max_hold_ms {
            config.max_hold_ms = ms;
        }

        config.validate()?;
        config.initial_pool(&self.available)?;
        Ok((config, self.available.clone()))
    }
}

/// Run the CLI
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let (config, available) = match cli.resolve() {
        Ok(resolved) => resolved,
        Err(err @ InitError::ResourceCountMismatch { .. }) => {
            Cli::command().error(ErrorKind::WrongNumberOfValues, err).exit()
        }
        Err(err) => return Err(err).context("Failed to initialise simulation"),
    };

    run_simulation(config, &available, cli.json).await
}

async fn run_simulation(config: SimulationConfig, available: &[u32], json: bool) -> Result<()> {
    let (cancel_tx, cancel_rx) = watch::channel(false);
    ctrlc::set_handler(move || {
        info!("Interrupt received, stopping customers");
        let _ = cancel_tx.send(true);
    })
    .map_err(|e| InitError::Signal(e.to_string()))?;

    let simulation = Simulation::random(config, available).context("Failed to initialise simulation")?;
    if let Some(seed) = simulation.seed() {
        info!(seed, "Simulation seeded; pass --seed {} to replay", seed);
    }

    let report = match simulation.run(Arc::new(ConsoleReporter::new()), cancel_rx).await {
        Ok(report) => report,
        Err(err) => {
            if let Some(coded) = err.banker_error() {
                error!(domain = %coded.domain(), code = %coded.code(), error_code = coded.error_code(), "Simulation aborted");
            }
            return Err(err.into());
        }
    };

    if json {
        println!("{}", report.to_json()?);
    } else {
        println!("{}", report);
    }

    if !report.is_clean() {
        for violation in &report.violations {
            error!("Invariant violation: {}", violation);
        }
        return Err(anyhow!("Simulation finished with {} invariant violations", report.violations.len()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("banker-sim").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_positional_counts_with_defaults() {
        let (config, available) = parse(&["10", "5", "7"]).resolve().unwrap();
        assert_eq!(available, vec![10, 5, 7]);
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn test_wrong_count_is_rejected() {
        assert_eq!(
            parse(&["10", "5"]).resolve().unwrap_err(),
            InitError::ResourceCountMismatch { expected: 3, actual: 2 }
        );
        assert!(Cli::try_parse_from(["banker-sim"]).is_err());
    }

    #[test]
    fn test_non_numeric_counts_fail_to_parse() {
        assert!(Cli::try_parse_from(["banker-sim", "10", "x", "7"]).is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "resources = 2\ncustomers = 4\nseed = 1").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = parse(&["--config", &path, "--seed", "9", "--iterations", "3", "4", "4"]);
        let (config, available) = cli.resolve().unwrap();
        assert_eq!(available, vec![4, 4]);
        assert_eq!(config.customers, 4);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.iterations, Some(3));
    }

    #[test]
    fn test_zero_customers_is_init_error() {
        let err = parse(&["--customers", "0", "1", "1", "1"]).resolve().unwrap_err();
        assert_eq!(err, InitError::NoCustomers);
    }
}
