// Ledger usage errors
// Raised for malformed calls into the resource manager

use std::any::Any;

use thiserror::Error;

use crate::{BankerError, ErrorCode, ErrorDomain};

/// Ledger error codes
pub mod codes {
    use crate::ErrorCode;

    // Ledger codes start at 2000
    pub const UNKNOWN_CUSTOMER: ErrorCode = ErrorCode(2001);
    pub const DIMENSION_MISMATCH: ErrorCode = ErrorCode(2002);
    pub const EXCEEDS_ALLOCATION: ErrorCode = ErrorCode(2003);
    pub const LOCK_POISONED: ErrorCode = ErrorCode(2004);
}

/// Errors returned by the resource manager for calls it refuses to process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The customer index is outside the fixed population
    #[error("unknown customer {customer} (population is {customers})")]
    UnknownCustomer { customer: usize, customers: usize },

    /// An amount vector does not have one entry per resource type
    #[error("expected {expected} resource amounts, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A release names more units than the customer currently holds
    #[error("customer {customer} cannot release {requested} units of resource {resource}: holds {held}")]
    ExceedsAllocation {
        customer: usize,
        resource: usize,
        requested: u32,
        held: u32,
    },

    /// Another thread panicked while holding the ledger lock
    #[error("ledger lock poisoned")]
    LockPoisoned,
}

impl BankerError for LedgerError {
    fn error_code(&self) -> &'static str {
        match self {
            LedgerError::UnknownCustomer { .. } => "LEDGER_UNKNOWN_CUSTOMER",
            LedgerError::DimensionMismatch { .. } => "LEDGER_DIMENSION_MISMATCH",
            LedgerError::ExceedsAllocation { .. } => "LEDGER_EXCEEDS_ALLOCATION",
            LedgerError::LockPoisoned => "LEDGER_LOCK_POISONED",
        }
    }

    fn code(&self) -> ErrorCode {
        match self {
            LedgerError::UnknownCustomer { .. } => codes::UNKNOWN_CUSTOMER,
            LedgerError::DimensionMismatch { .. } => codes::DIMENSION_MISMATCH,
            LedgerError::ExceedsAllocation { .. } => codes::EXCEEDS_ALLOCATION,
            LedgerError::LockPoisoned => codes::LOCK_POISONED,
        }
    }

    fn domain(&self) -> ErrorDomain {
        ErrorDomain::Ledger
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Result type for resource manager operations
pub type LedgerResult<T> = Result<T, LedgerError>;
