// Banker Error Handling Framework
// Central location for the error taxonomy shared by the allocator and its harness

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;

// Re-export common error handling tools for convenience
pub use anyhow;
pub use thiserror;

// Module structure
mod macros;

// Error families
mod denial;
mod init;
mod ledger;

// Public exports
pub use denial::DenialReason;
pub use init::{InitError, InitResult};
pub use ledger::{LedgerError, LedgerResult};

/// Error domains representing the components that raise errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorDomain {
    Arbiter,
    Ledger,
    Init,
}

impl fmt::Display for ErrorDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorDomain::Arbiter => write!(f, "arbiter"),
            ErrorDomain::Ledger => write!(f, "ledger"),
            ErrorDomain::Init => write!(f, "init"),
        }
    }
}

/// Numeric error code, grouped in thousands per domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct ErrorCode(pub u32);

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

/// Base trait for all errors raised by the banker crates.
pub trait BankerError: StdError + fmt::Debug + fmt::Display + Send + Sync + Any + 'static {
    /// Returns a unique static string code for this error.
    fn error_code(&self) -> &'static str;

    /// Numeric code for structured reporting.
    fn code(&self) -> ErrorCode;

    /// The component this error originates from.
    fn domain(&self) -> ErrorDomain;

    /// Indicates if the condition is temporary and retrying later might succeed.
    fn is_transient(&self) -> bool {
        false
    }

    /// Returns this error as a `&dyn Any` to allow downcasting.
    fn as_any(&self) -> &dyn Any;
}
