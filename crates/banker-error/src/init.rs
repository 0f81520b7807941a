// Initialization errors
// Any of these aborts the system before customer activity begins

use std::any::Any;

use thiserror::Error;

use crate::{BankerError, ErrorCode, ErrorDomain};

/// Initialization error codes
pub mod codes {
    use crate::ErrorCode;

    // Init codes start at 3000
    pub const NO_RESOURCE_TYPES: ErrorCode = ErrorCode(3001);
    pub const NO_CUSTOMERS: ErrorCode = ErrorCode(3002);
    pub const RESOURCE_COUNT_MISMATCH: ErrorCode = ErrorCode(3003);
    pub const MAXIMUM_EXCEEDS_TOTAL: ErrorCode = ErrorCode(3004);
    pub const CONFIG: ErrorCode = ErrorCode(3005);
    pub const SIGNAL: ErrorCode = ErrorCode(3006);
    pub const INCONSISTENT_LEDGER: ErrorCode = ErrorCode(3007);
}

/// Fatal errors raised while building the ledger or the simulation around it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InitError {
    #[error("at least one resource type is required")]
    NoResourceTypes,

    #[error("at least one customer is required")]
    NoCustomers,

    #[error("expected {expected} resource counts, got {actual}")]
    ResourceCountMismatch { expected: usize, actual: usize },

    #[error("customer {customer} declares maximum {maximum} of resource {resource}, but only {total} exist")]
    MaximumExceedsTotal {
        customer: usize,
        resource: usize,
        maximum: u32,
        total: u32,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to install signal handler: {0}")]
    Signal(String),

    /// A restored ledger snapshot breaks conservation or a maximum bound
    #[error("inconsistent ledger: {0}")]
    InconsistentLedger(String),
}

impl BankerError for InitError {
    fn error_code(&self) -> &'static str {
        match self {
            InitError::NoResourceTypes => "INIT_NO_RESOURCE_TYPES",
            InitError::NoCustomers => "INIT_NO_CUSTOMERS",
            InitError::ResourceCountMismatch { .. } => "INIT_RESOURCE_COUNT_MISMATCH",
            InitError::MaximumExceedsTotal { .. } => "INIT_MAXIMUM_EXCEEDS_TOTAL",
            InitError::Config(_) => "INIT_CONFIG",
            InitError::Signal(_) => "INIT_SIGNAL",
            InitError::InconsistentLedger(_) => "INIT_INCONSISTENT_LEDGER",
        }
    }

    fn code(&self) -> ErrorCode {
        match self {
            InitError::NoResourceTypes => codes::NO_RESOURCE_TYPES,
            InitError::NoCustomers => codes::NO_CUSTOMERS,
            InitError::ResourceCountMismatch { .. } => codes::RESOURCE_COUNT_MISMATCH,
            InitError::MaximumExceedsTotal { .. } => codes::MAXIMUM_EXCEEDS_TOTAL,
            InitError::Config(_) => codes::CONFIG,
            InitError::Signal(_) => codes::SIGNAL,
            InitError::InconsistentLedger(_) => codes::INCONSISTENT_LEDGER,
        }
    }

    fn domain(&self) -> ErrorDomain {
        ErrorDomain::Init
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Result type for startup operations
pub type InitResult<T> = Result<T, InitError>;
