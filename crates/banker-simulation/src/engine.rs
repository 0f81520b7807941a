//! Simulation engine
//!
//! Builds the ledger from the initial pool and each customer's drawn maximum,
//! then runs one tokio task per customer against a shared resource manager
//! and collects what happened.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use banker_core::{CustomerId, Ledger, ResourceManager, ResourceVector};
use banker_error::{bail, DenialReason, InitError, InitResult};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, info_span, Instrument};

use crate::config::SimulationConfig;
use crate::customer::{CustomerActor, CustomerContext, CustomerStats};
use crate::demand::{DemandSource, RandomDemand};
use crate::error::{SimulationError, SimulationResult};
use crate::invariant::InvariantObserver;
use crate::randomness::SeededRng;
use crate::reporter::OutcomeReporter;

/// A fully initialised run waiting to be started
pub struct Simulation {
    config: SimulationConfig,
    seed: Option<u64>,
    manager: Arc<ResourceManager>,
    sources: Vec<Box<dyn DemandSource>>,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("config", &self.config)
            .field("seed", &self.seed)
            .field("manager", &self.manager)
            .field("sources", &self.sources.len())
            .finish()
    }
}

impl Simulation {
    /// Random run: maxima, amounts and delays all come from one seeded stream
    /// per customer, derived from the configured (or entropy) seed.
    pub fn random(config: SimulationConfig, available: &[u32]) -> InitResult<Self> {
        config.validate()?;
        let total = config.initial_pool(available)?;
        let root = SeededRng::from_optional_seed(config.seed);

        let mut sources: Vec<Box<dyn DemandSource>> = Vec::with_capacity(config.customers);
        let mut maxima = Vec::with_capacity(config.customers);
        for i in 0..config.customers {
            let mut source = RandomDemand::new(root.fork(i as u64), config.max_think(), config.max_hold());
            maxima.push(source.maximum(CustomerId(i), &total));
            sources.push(Box::new(source));
        }

        let ledger = Ledger::new(total, maxima)?;
        let seed = root.seed();
        info!(seed, "drew customer maxima");
        Ok(Self::from_parts(config, ledger, sources)?.with_seed(seed))
    }

    /// Run with caller-chosen sources; each source first supplies its
    /// customer's maximum.
    pub fn with_sources(
        config: SimulationConfig,
        available: &[u32],
        mut sources: Vec<Box<dyn DemandSource>>,
    ) -> InitResult<Self> {
        config.validate()?;
        let total = config.initial_pool(available)?;
        if sources.len() != config.customers {
            bail!(InitError::Config(format!(
                "{} demand sources for {} configured customers",
                sources.len(),
                config.customers
            )));
        }
        let maxima: Vec<ResourceVector> = sources
            .iter_mut()
            .enumerate()
            .map(|(i, source)| source.maximum(CustomerId(i), &total))
            .collect();
        let ledger = Ledger::new(total, maxima)?;
        Self::from_parts(config, ledger, sources)
    }

    /// Assemble a run from an existing ledger, one source per customer
    pub fn from_parts(config: SimulationConfig, ledger: Ledger, sources: Vec<Box<dyn DemandSource>>) -> InitResult<Self> {
        if sources.len() != ledger.customer_count() {
            bail!(InitError::Config(format!(
                "{} demand sources for {} customers",
                sources.len(),
                ledger.customer_count()
            )));
        }
        Ok(Self {
            config,
            seed: None,
            manager: Arc::new(ResourceManager::new(ledger)),
            sources,
        })
    }

    fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Seed of a random run, for replay
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn manager(&self) -> &Arc<ResourceManager> {
        &self.manager
    }

    /// Spawn every customer, wait for all of them, and report.
    pub async fn run(
        self,
        reporter: Arc<dyn OutcomeReporter>,
        cancel: watch::Receiver<bool>,
    ) -> SimulationResult<SimulationReport> {
        let started_at = Utc::now();
        let clock = Instant::now();
        let observer = self
            .config
            .check_invariants
            .then(|| Arc::new(InvariantObserver::with_standard_checkers()));
        let initial = self.manager.snapshot()?;

        info!(
            customers = self.manager.customer_count(),
            resources = self.manager.resource_count(),
            iterations = ?self.config.iterations,
            "starting simulation"
        );

        let handles: Vec<_> = self
            .sources
            .into_iter()
            .enumerate()
            .map(|(i, source)| {
                let ctx = CustomerContext::new(CustomerId(i), Arc::clone(&self.manager));
                let mut actor = CustomerActor::new(ctx, source, Arc::clone(&reporter))
                    .with_iterations(self.config.iterations)
                    .with_release_on_exit(self.config.release_on_exit);
                if let Some(observer) = &observer {
                    actor = actor.with_observer(Arc::clone(observer));
                }
                tokio::spawn(actor.run(cancel.clone()).instrument(info_span!("customer", customer = i)))
            })
            .collect();

        let mut customers = Vec::with_capacity(handles.len());
        for joined in join_all(handles).await {
            let stats = joined.map_err(|e| SimulationError::Task(e.to_string()))??;
            customers.push(stats);
        }

        let final_ledger = self.manager.snapshot()?;
        let violations: Vec<String> = observer
            .map(|observer| {
                observer.observe(&final_ledger);
                observer.violations().iter().map(ToString::to_string).collect()
            })
            .unwrap_or_default();

        let report = SimulationReport {
            seed: self.seed,
            started_at,
            elapsed: clock.elapsed(),
            initial_ledger: initial,
            final_ledger,
            customers,
            violations,
        };
        info!(grants = report.grants(), denials = report.denials(), "simulation finished");
        Ok(report)
    }
}

/// Outcome of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub seed: Option<u64>,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub initial_ledger: Ledger,
    pub final_ledger: Ledger,
    pub customers: Vec<CustomerStats>,
    pub violations: Vec<String>,
}

impl SimulationReport {
    pub fn requests(&self) -> u64 {
        self.customers.iter().map(|c| c.requests).sum()
    }

    pub fn grants(&self) -> u64 {
        self.customers.iter().map(|c| c.grants).sum()
    }

    pub fn denials(&self) -> u64 {
        self.customers.iter().map(CustomerStats::denied).sum()
    }

    pub fn denials_for(&self, reason: DenialReason) -> u64 {
        self.customers.iter().map(|c| c.denied_for(reason)).sum()
    }

    pub fn releases(&self) -> u64 {
        self.customers.iter().map(|c| c.releases).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(seed) = self.seed {
            writeln!(f, "Seed: {}", seed)?;
        }
        writeln!(
            f,
            "Requests: {} granted, {} denied ({} exceeded need, {} exceeded available, {} unsafe); {} releases",
            self.grants(),
            self.denials(),
            self.denials_for(DenialReason::ExceedsNeed),
            self.denials_for(DenialReason::ExceedsAvailable),
            self.denials_for(DenialReason::Unsafe),
            self.releases()
        )?;
        writeln!(f, "Available at end: {}", self.final_ledger.available())?;
        for (i, record) in self.final_ledger.customers().iter().enumerate() {
            writeln!(
                f,
                "Customer {}: maximum {} allocation {} need {}",
                i,
                record.maximum(),
                record.allocation(),
                record.need()
            )?;
        }
        if self.violations.is_empty() {
            write!(f, "Invariants: all held")
        } else {
            write!(f, "Invariants: {} violations", self.violations.len())
        }
    }
}
