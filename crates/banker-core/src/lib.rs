//! Banker Core
//!
//! Deadlock-avoiding allocation of a fixed pool of reusable resource types
//! among a fixed population of customers.
//!
//! ## Core Components
//!
//! - **Ledger**: available pool plus per-customer maximum and allocation;
//!   need is derived
//! - **safety**: the Banker's safety test over a hypothetical state
//! - **ResourceManager**: serializes requests and releases behind one lock,
//!   applying a request provisionally and rolling it back if unsafe
//!
//! ## Getting Started
//! ```rust
//! use banker_core::{CustomerId, Ledger, RequestOutcome, ResourceManager, ResourceVector};
//!
//! let ledger = Ledger::new(
//!     ResourceVector::from([10]),
//!     vec![ResourceVector::from([6]), ResourceVector::from([6])],
//! )?;
//! let manager = ResourceManager::new(ledger);
//!
//! assert_eq!(manager.request(CustomerId(0), &ResourceVector::from([5]))?, RequestOutcome::Granted);
//! manager.release(CustomerId(0), &ResourceVector::from([5]))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod ledger;
pub mod manager;
pub mod safety;
pub mod vector;

pub use banker_error::{DenialReason, InitError, InitResult, LedgerError, LedgerResult};
pub use ledger::{CustomerRecord, InvariantViolation, Ledger};
pub use manager::{RequestOutcome, ResourceManager};
pub use safety::{is_safe, safe_sequence};
pub use vector::{CustomerId, ResourceVector};
