//! Resource manager
//!
//! The single owner of the ledger. Every request and release runs to
//! completion under one mutex, including the safety check, so callers only
//! ever observe committed states and all calls are applied in some serial
//! order.

use std::sync::{Mutex, MutexGuard};

use banker_error::{BankerError, DenialReason, LedgerError, LedgerResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ledger::{CustomerRecord, Ledger};
use crate::vector::{CustomerId, ResourceVector};

/// Result of a well-formed request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestOutcome {
    Granted,
    Denied(DenialReason),
}

impl RequestOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, RequestOutcome::Granted)
    }
}

/// Thread-safe front to the ledger
#[derive(Debug)]
pub struct ResourceManager {
    ledger: Mutex<Ledger>,
    customers: usize,
    resources: usize,
}

impl ResourceManager {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            customers: ledger.customer_count(),
            resources: ledger.resource_count(),
            ledger: Mutex::new(ledger),
        }
    }

    pub fn customer_count(&self) -> usize {
        self.customers
    }

    pub fn resource_count(&self) -> usize {
        self.resources
    }

    fn lock(&self) -> LedgerResult<MutexGuard<'_, Ledger>> {
        self.ledger.lock().map_err(|_| LedgerError::LockPoisoned)
    }

    /// Ask for `amounts` on behalf of `customer`.
    ///
    /// The request is checked against the customer's need, then against the
    /// free pool, then applied provisionally and kept only if the resulting
    /// state is safe. A denied request leaves the ledger exactly as it was.
    /// `Err` is reserved for malformed calls.
    pub fn request(&self, customer: CustomerId, amounts: &ResourceVector) -> LedgerResult<RequestOutcome> {
        let mut ledger = self.lock()?;

        let checkpoint = ledger.checkpoint(customer)?;
        if let Err(reason) = ledger.grant(customer, amounts)? {
            if !reason.is_transient() {
                warn!(%customer, %amounts, code = %reason.code(), "request can never be granted: {}", reason);
            }
            return Ok(RequestOutcome::Denied(reason));
        }

        match ledger.safe_sequence() {
            Some(order) => {
                debug!(%customer, %amounts, ?order, "request granted");
                debug_assert!(ledger.check_invariants().is_empty());
                Ok(RequestOutcome::Granted)
            }
            None => {
                ledger.restore(checkpoint);
                debug!(%customer, %amounts, "request rolled back: unsafe");
                Ok(RequestOutcome::Denied(DenialReason::Unsafe))
            }
        }
    }

    /// Return `amounts` held by `customer` to the pool.
    ///
    /// Releasing more than the customer holds of any type is rejected with
    /// `LedgerError::ExceedsAllocation` and changes nothing. No safety check
    /// is needed: shrinking an allocation cannot make the state less safe.
    pub fn release(&self, customer: CustomerId, amounts: &ResourceVector) -> LedgerResult<()> {
        let mut ledger = self.lock()?;
        ledger.reclaim(customer, amounts).inspect_err(|err| {
            warn!(%customer, %amounts, %err, "release rejected");
        })?;
        debug!(%customer, %amounts, "released");
        Ok(())
    }

    /// Return everything `customer` holds, reporting what was released.
    pub fn release_all(&self, customer: CustomerId) -> LedgerResult<ResourceVector> {
        let mut ledger = self.lock()?;
        let held = ledger.customer(customer)?.allocation().clone();
        ledger.reclaim(customer, &held)?;
        debug!(%customer, amounts = %held, "released all");
        Ok(held)
    }

    /// Consistent copy of the whole ledger
    pub fn snapshot(&self) -> LedgerResult<Ledger> {
        Ok(self.lock()?.clone())
    }

    /// Consistent copy of one customer's record
    pub fn customer_view(&self, customer: CustomerId) -> LedgerResult<CustomerRecord> {
        Ok(self.lock()?.customer(customer)?.clone())
    }
}
