// Purpose: Defines the customer actor that repeatedly requests, holds and releases resources.

use std::collections::BTreeMap;
use std::future;
use std::sync::Arc;
use std::time::Duration;

use banker_core::{CustomerId, RequestOutcome, ResourceManager};
use banker_error::{DenialReason, LedgerError, LedgerResult};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::demand::DemandSource;
use crate::invariant::InvariantObserver;
use crate::reporter::{OutcomeEvent, OutcomeReporter};

/// Everything a customer needs to reach the shared ledger
#[derive(Debug, Clone)]
pub struct CustomerContext {
    pub id: CustomerId,
    pub manager: Arc<ResourceManager>,
}

impl CustomerContext {
    pub fn new(id: CustomerId, manager: Arc<ResourceManager>) -> Self {
        Self { id, manager }
    }
}

/// What one customer did over its run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CustomerStats {
    pub customer: usize,
    pub cycles: u64,
    pub requests: u64,
    pub grants: u64,
    pub denials: BTreeMap<DenialReason, u64>,
    pub releases: u64,
    pub rejected_releases: u64,
}

impl CustomerStats {
    pub fn new(customer: CustomerId) -> Self {
        Self {
            customer: customer.index(),
            ..Default::default()
        }
    }

    fn record_request(&mut self, outcome: RequestOutcome) {
        self.requests += 1;
        match outcome {
            RequestOutcome::Granted => self.grants += 1,
            RequestOutcome::Denied(reason) => *self.denials.entry(reason).or_default() += 1,
        }
    }

    pub fn denied(&self) -> u64 {
        self.denials.values().sum()
    }

    pub fn denied_for(&self, reason: DenialReason) -> u64 {
        self.denials.get(&reason).copied().unwrap_or(0)
    }
}

fn mark_seen(cancel: &mut watch::Receiver<bool>) -> bool {
    *cancel.borrow_and_update()
}

fn is_cancelled(cancel: &watch::Receiver<bool>) -> bool {
    *cancel.borrow()
}

/// Resolves once the cancellation flag is raised. A dropped sender never cancels.
pub(crate) async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if mark_seen(cancel) {
            return;
        }
        if cancel.changed().await.is_err() {
            future::pending::<()>().await;
        }
    }
}

/// One concurrent customer
pub struct CustomerActor {
    ctx: CustomerContext,
    source: Box<dyn DemandSource>,
    reporter: Arc<dyn OutcomeReporter>,
    observer: Option<Arc<InvariantObserver>>,
    iterations: Option<u64>,
    release_on_exit: bool,
}

impl CustomerActor {
    pub fn new(ctx: CustomerContext, source: Box<dyn DemandSource>, reporter: Arc<dyn OutcomeReporter>) -> Self {
        Self {
            ctx,
            source,
            reporter,
            observer: None,
            iterations: None,
            release_on_exit: false,
        }
    }

    /// Stop after this many request cycles
    pub fn with_iterations(mut self, iterations: Option<u64>) -> Self {
        self.iterations = iterations;
        self
    }

    /// Check invariants on a fresh snapshot after every transaction
    pub fn with_observer(mut self, observer: Arc<InvariantObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_release_on_exit(mut self, release_on_exit: bool) -> Self {
        self.release_on_exit = release_on_exit;
        self
    }

    /// Run cycles until the iteration limit is reached or `cancel` is raised.
    ///
    /// Each cycle requests an amount drawn against the current need; on a
    /// grant it holds, then releases an amount drawn against the current
    /// allocation. Denials are ordinary: the customer just tries again next
    /// cycle. Only malformed ledger calls end the run with an error.
    pub async fn run(mut self, mut cancel: watch::Receiver<bool>) -> LedgerResult<CustomerStats> {
        let id = self.ctx.id;
        let mut stats = CustomerStats::new(id);
        info!("customer started");

        while self.iterations.map_or(true, |limit| stats.cycles < limit) && !is_cancelled(&cancel) {
            let need = self.ctx.manager.customer_view(id)?.need();
            let amounts = self.source.request(id, &need);
            let outcome = self.ctx.manager.request(id, &amounts)?;
            stats.record_request(outcome);
            self.reporter.report(&OutcomeEvent::Request { customer: id, amounts, outcome });
            self.check_invariants()?;

            if outcome.is_granted() {
                let hold = self.source.hold_delay();
                pause(hold, &mut cancel).await;
                self.release_some(&mut stats)?;
            }

            stats.cycles += 1;
            let think = self.source.think_delay();
            pause(think, &mut cancel).await;
        }

        if self.release_on_exit {
            let held = self.ctx.manager.release_all(id)?;
            if !held.is_zero() {
                stats.releases += 1;
                self.reporter.report(&OutcomeEvent::Release { customer: id, amounts: held });
                self.check_invariants()?;
            }
        }

        info!(cycles = stats.cycles, grants = stats.grants, denied = stats.denied(), "customer stopped");
        Ok(stats)
    }

    fn release_some(&mut self, stats: &mut CustomerStats) -> LedgerResult<()> {
        let id = self.ctx.id;
        let held = self.ctx.manager.customer_view(id)?.allocation().clone();
        let amounts = self.source.release(id, &held);

        match self.ctx.manager.release(id, &amounts) {
            Ok(()) => {
                stats.releases += 1;
                self.reporter.report(&OutcomeEvent::Release { customer: id, amounts });
            }
            Err(error @ LedgerError::ExceedsAllocation { .. }) => {
                stats.rejected_releases += 1;
                self.reporter.report(&OutcomeEvent::ReleaseRejected { customer: id, amounts, error });
            }
            Err(error) => return Err(error),
        }
        self.check_invariants()
    }

    fn check_invariants(&self) -> LedgerResult<()> {
        if let Some(observer) = &self.observer {
            let snapshot = self.ctx.manager.snapshot()?;
            for violation in observer.observe(&snapshot) {
                warn!(%violation, "invariant violated");
            }
        }
        Ok(())
    }
}

/// Wait `delay`, cut short by cancellation. A zero delay still yields so
/// other customers get a turn.
async fn pause(delay: Duration, cancel: &mut watch::Receiver<bool>) {
    if delay.is_zero() {
        tokio::task::yield_now().await;
        return;
    }
    debug!(?delay, "pausing");
    tokio::select! {
        _ = tokio::time::sleep(delay) => {}
        _ = cancelled(cancel) => {}
    }
}
