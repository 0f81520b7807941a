// Request denial reasons
// A denial is an ordinary outcome of the arbiter, not a failure of the call

use std::any::Any;

use thiserror::Error;

use crate::{BankerError, ErrorCode, ErrorDomain};

/// Arbiter error codes
pub mod codes {
    use crate::ErrorCode;

    // Arbiter codes start at 1000
    pub const EXCEEDS_NEED: ErrorCode = ErrorCode(1001);
    pub const EXCEEDS_AVAILABLE: ErrorCode = ErrorCode(1002);
    pub const UNSAFE: ErrorCode = ErrorCode(1003);
}

/// Why the arbiter refused a request.
///
/// In every case the ledger is left exactly as it was before the call.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum DenialReason {
    /// The request asks for more than the customer's remaining declared need.
    /// This is a caller fault and retrying the same request will never succeed.
    #[error("request exceeds the customer's remaining need")]
    ExceedsNeed,

    /// The request asks for more units than are currently free.
    #[error("request exceeds the available resources")]
    ExceedsAvailable,

    /// Granting the request would leave no guaranteed completion order.
    #[error("granting the request would leave the system in an unsafe state")]
    Unsafe,
}

impl DenialReason {
    /// Short label used in report lines and statistics
    pub fn label(&self) -> &'static str {
        match self {
            DenialReason::ExceedsNeed => "exceeds need",
            DenialReason::ExceedsAvailable => "exceeds available",
            DenialReason::Unsafe => "unsafe",
        }
    }
}

impl BankerError for DenialReason {
    fn error_code(&self) -> &'static str {
        match self {
            DenialReason::ExceedsNeed => "ARBITER_EXCEEDS_NEED",
            DenialReason::ExceedsAvailable => "ARBITER_EXCEEDS_AVAILABLE",
            DenialReason::Unsafe => "ARBITER_UNSAFE",
        }
    }

    fn code(&self) -> ErrorCode {
        match self {
            DenialReason::ExceedsNeed => codes::EXCEEDS_NEED,
            DenialReason::ExceedsAvailable => codes::EXCEEDS_AVAILABLE,
            DenialReason::Unsafe => codes::UNSAFE,
        }
    }

    fn domain(&self) -> ErrorDomain {
        ErrorDomain::Arbiter
    }

    fn is_transient(&self) -> bool {
        !matches!(self, DenialReason::ExceedsNeed)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
