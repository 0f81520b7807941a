//! Demand generation
//!
//! Where customers get their declared maxima, the amounts they ask for and
//! give back, and how long they wait. The random source draws everything
//! uniformly from a seeded stream; the scripted source replays fixed values
//! so runs can be pinned down exactly in tests.

use std::collections::VecDeque;
use std::time::Duration;

use banker_core::{CustomerId, ResourceVector};

use crate::randomness::SeededRng;

/// Supplies the numbers a customer acts on
pub trait DemandSource: Send {
    /// Declared maximum for `customer`, at most `total` of each type
    fn maximum(&mut self, customer: CustomerId, total: &ResourceVector) -> ResourceVector;

    /// Next request, drawn against the customer's current need
    fn request(&mut self, customer: CustomerId, need: &ResourceVector) -> ResourceVector;

    /// Next release, drawn against what the customer currently holds
    fn release(&mut self, customer: CustomerId, held: &ResourceVector) -> ResourceVector;

    /// Idle time between cycles
    fn think_delay(&mut self) -> Duration;

    /// Time granted units are held before releasing
    fn hold_delay(&mut self) -> Duration;
}

/// Uniform draws from a seeded stream
#[derive(Debug, Clone)]
pub struct RandomDemand {
    rng: SeededRng,
    max_think: Duration,
    max_hold: Duration,
}

impl RandomDemand {
    pub fn new(rng: SeededRng, max_think: Duration, max_hold: Duration) -> Self {
        Self { rng, max_think, max_hold }
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    fn each_up_to(&mut self, bound: &ResourceVector) -> ResourceVector {
        bound.iter().map(|&b| self.rng.up_to(b)).collect()
    }

    fn delay_up_to(&mut self, max: Duration) -> Duration {
        let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(self.rng.gen_range(0..=max_ms))
    }
}

impl DemandSource for RandomDemand {
    fn maximum(&mut self, _customer: CustomerId, total: &ResourceVector) -> ResourceVector {
        self.each_up_to(total)
    }

    fn request(&mut self, _customer: CustomerId, need: &ResourceVector) -> ResourceVector {
        self.each_up_to(need)
    }

    fn release(&mut self, _customer: CustomerId, held: &ResourceVector) -> ResourceVector {
        self.each_up_to(held)
    }

    fn think_delay(&mut self) -> Duration {
        self.delay_up_to(self.max_think)
    }

    fn hold_delay(&mut self) -> Duration {
        self.delay_up_to(self.max_hold)
    }
}

/// Replays queued values with no delays.
///
/// Once the request queue runs dry every request is all zeros; once the
/// release queue runs dry every release returns everything held.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDemand {
    maxima: VecDeque<ResourceVector>,
    requests: VecDeque<ResourceVector>,
    releases: VecDeque<ResourceVector>,
}

impl ScriptedDemand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_maximum(mut self, maximum: impl Into<ResourceVector>) -> Self {
        self.maxima.push_back(maximum.into());
        self
    }

    pub fn with_request(mut self, amounts: impl Into<ResourceVector>) -> Self {
        self.requests.push_back(amounts.into());
        self
    }

    pub fn with_release(mut self, amounts: impl Into<ResourceVector>) -> Self {
        self.releases.push_back(amounts.into());
        self
    }
}

impl DemandSource for ScriptedDemand {
    fn maximum(&mut self, _customer: CustomerId, total: &ResourceVector) -> ResourceVector {
        self.maxima.pop_front().unwrap_or_else(|| total.clone())
    }

    fn request(&mut self, _customer: CustomerId, need: &ResourceVector) -> ResourceVector {
        self.requests
            .pop_front()
            .unwrap_or_else(|| ResourceVector::zeros(need.len()))
    }

    fn release(&mut self, _customer: CustomerId, held: &ResourceVector) -> ResourceVector {
        self.releases.pop_front().unwrap_or_else(|| held.clone())
    }

    fn think_delay(&mut self) -> Duration {
        Duration::ZERO
    }

    fn hold_delay(&mut self) -> Duration {
        Duration::ZERO
    }
}
