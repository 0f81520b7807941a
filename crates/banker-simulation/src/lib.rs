//! Banker Simulation
//!
//! Drives the banker resource manager with a fixed population of concurrent
//! customers, each repeatedly requesting, holding and releasing resources.
//!
//! ## Core Components
//!
//! - **Simulation**: builds the ledger and runs one task per customer
//! - **CustomerActor**: the request/hold/release/think loop, bounded by an
//!   iteration limit or a cancellation signal
//! - **DemandSource**: seeded random or scripted maxima, amounts and delays
//! - **OutcomeReporter**: one line per request outcome and release
//! - **InvariantObserver**: checks every committed state
//!
//! ## Getting Started
//! ```rust,no_run
//! use std::sync::Arc;
//! use banker_simulation::{ConsoleReporter, Simulation, SimulationConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = SimulationConfig { iterations: Some(10), seed: Some(42), ..Default::default() };
//! let simulation = Simulation::random(config, &[10, 5, 7])?;
//! let (_cancel, cancelled) = tokio::sync::watch::channel(false);
//! let report = simulation.run(Arc::new(ConsoleReporter::new()), cancelled).await?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod customer;
pub mod demand;
pub mod engine;
pub mod error;
pub mod invariant;
pub mod randomness;
pub mod reporter;

pub use config::SimulationConfig;
pub use customer::{CustomerActor, CustomerContext, CustomerStats};
pub use demand::{DemandSource, RandomDemand, ScriptedDemand};
pub use engine::{Simulation, SimulationReport};
pub use error::{SimulationError, SimulationResult};
pub use invariant::{InvariantChecker, InvariantObserver, InvariantResult, InvariantType};
pub use randomness::SeededRng;
pub use reporter::{ConsoleReporter, OutcomeEvent, OutcomeReporter, RecordingReporter};
