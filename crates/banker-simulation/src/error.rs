//! Error types for the simulation harness
//!
//! Startup problems surface as `InitError`, malformed ledger calls as
//! `LedgerError`. Denials are not errors and never appear here.

//-----------------------------------------------------------------------------
// Error Types
//-----------------------------------------------------------------------------

use banker_error::{BankerError, InitError, LedgerError};
use thiserror::Error;

/// Main error type for the simulation crate.
#[derive(Error, Debug)]
pub enum SimulationError {
    /// The simulation could not be set up.
    #[error(transparent)]
    Init(#[from] InitError),

    /// A customer made a call the resource manager refused to process.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// A customer task panicked or was aborted.
    #[error("customer task failed: {0}")]
    Task(String),
}

/// Result type alias for simulation operations.
pub type SimulationResult<T> = Result<T, SimulationError>;

impl SimulationError {
    /// The coded error underneath, if this came from the allocator
    pub fn banker_error(&self) -> Option<&dyn BankerError> {
        match self {
            SimulationError::Init(e) => Some(e as &dyn BankerError),
            SimulationError::Ledger(e) => Some(e),
            SimulationError::Task(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banker_error::{ErrorCode, ErrorDomain};

    #[test]
    fn test_banker_error_exposes_domain_and_code() {
        let err = SimulationError::from(LedgerError::LockPoisoned);
        let coded = err.banker_error().unwrap();
        assert_eq!(coded.domain(), ErrorDomain::Ledger);
        assert_eq!(coded.code(), ErrorCode(2004));
        assert_eq!(coded.error_code(), "LEDGER_LOCK_POISONED");

        let err = SimulationError::from(InitError::NoCustomers);
        assert_eq!(err.banker_error().unwrap().domain(), ErrorDomain::Init);
        assert_eq!(err.to_string(), "at least one customer is required");

        assert!(SimulationError::Task("join failed".into()).banker_error().is_none());
    }
}
