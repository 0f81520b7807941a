//! Configuration for Simulation
//!
//! Defaults, optionally overridden by a TOML file, optionally overridden again
//! by command-line flags.

use std::fs;
use std::path::Path;
use std::time::Duration;

use banker_core::ResourceVector;
use banker_error::{ensure, InitError, InitResult};
use serde::{Deserialize, Serialize};

//-----------------------------------------------------------------------------
// Configuration Structures
//-----------------------------------------------------------------------------

pub const DEFAULT_CUSTOMERS: usize = 5;
pub const DEFAULT_RESOURCES: usize = 3;
pub const DEFAULT_MAX_DELAY_MS: u64 = 1000;

/// Shape and pacing of one simulation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Number of concurrent customers
    pub customers: usize,
    /// Number of resource types; the CLI expects this many counts
    pub resources: usize,
    /// Request cycles per customer; `None` runs until cancelled
    pub iterations: Option<u64>,
    /// Upper bound of the idle delay between cycles
    pub max_think_ms: u64,
    /// Upper bound of how long granted units are held before a release
    pub max_hold_ms: u64,
    /// Seed for maxima, amounts and delays; `None` draws one from entropy
    pub seed: Option<u64>,
    /// Check ledger invariants after every transaction
    pub check_invariants: bool,
    /// Hand back everything still held when a customer stops
    pub release_on_exit: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            customers: DEFAULT_CUSTOMERS,
            resources: DEFAULT_RESOURCES,
            iterations: None,
            max_think_ms: DEFAULT_MAX_DELAY_MS,
            max_hold_ms: DEFAULT_MAX_DELAY_MS,
            seed: None,
            check_invariants: true,
            release_on_exit: true,
        }
    }
}

impl SimulationConfig {
    pub fn from_toml_str(content: &str) -> InitResult<Self> {
        toml::from_str(content).map_err(|e| InitError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> InitResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| InitError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> InitResult<()> {
        ensure!(self.customers > 0, InitError::NoCustomers);
        ensure!(self.resources > 0, InitError::NoResourceTypes);
        Ok(())
    }

    /// Turn the initial available counts into the total pool, checking that
    /// there is exactly one count per resource type.
    pub fn initial_pool(&self, available: &[u32]) -> InitResult<ResourceVector> {
        ensure!(
            available.len() == self.resources,
            InitError::ResourceCountMismatch {
                expected: self.resources,
                actual: available.len(),
            }
        );
        Ok(ResourceVector::new(available.to_vec()))
    }

    pub fn max_think(&self) -> Duration {
        Duration::from_millis(self.max_think_ms)
    }

    pub fn max_hold(&self) -> Duration {
        Duration::from_millis(self.max_hold_ms)
    }
}
