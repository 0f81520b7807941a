//! Resource ledger
//!
//! Holds the available pool and one record per customer. Need is derived from
//! Maximum and Allocation and never stored, so it cannot drift. Every mutator
//! computes the new values first and only then writes them, which keeps the
//! ledger consistent even on the failure path.

use std::fmt;

use banker_error::{bail, ensure, DenialReason, InitError, InitResult, LedgerError, LedgerResult};
use serde::{Deserialize, Serialize};

use crate::safety;
use crate::vector::{CustomerId, ResourceVector};

/// Declared maximum and current holdings of one customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    maximum: ResourceVector,
    allocation: ResourceVector,
}

impl CustomerRecord {
    fn new(maximum: ResourceVector) -> Self {
        let allocation = ResourceVector::zeros(maximum.len());
        Self { maximum, allocation }
    }

    pub fn maximum(&self) -> &ResourceVector {
        &self.maximum
    }

    pub fn allocation(&self) -> &ResourceVector {
        &self.allocation
    }

    /// Units the customer may still request: `maximum - allocation`
    pub fn need(&self) -> ResourceVector {
        self.maximum
            .iter()
            .zip(self.allocation.iter())
            .map(|(max, held)| max.saturating_sub(*held))
            .collect()
    }

    /// True once the customer holds its whole declared maximum
    pub fn is_satisfied(&self) -> bool {
        self.need().is_zero()
    }
}

/// A broken ledger invariant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvariantViolation {
    /// `available[j] + sum(allocation[.][j]) != total[j]`
    Conservation {
        resource: usize,
        available: u64,
        allocated: u64,
        total: u32,
    },
    /// `allocation[i][j] > maximum[i][j]`, i.e. a negative need
    AllocationExceedsMaximum {
        customer: usize,
        resource: usize,
        allocation: u32,
        maximum: u32,
    },
    /// A row whose length differs from the number of resource types
    Shape { customer: usize },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conservation { resource, available, allocated, total } => write!(
                f,
                "resource {}: available {} + allocated {} != total {}",
                resource, available, allocated, total
            ),
            Self::AllocationExceedsMaximum { customer, resource, allocation, maximum } => write!(
                f,
                "customer {} holds {} of resource {} above its maximum {}",
                customer, allocation, resource, maximum
            ),
            Self::Shape { customer } => write!(f, "customer {} has a malformed row", customer),
        }
    }
}

/// Pre-transaction values of the rows a grant touches
#[derive(Debug, Clone)]
pub(crate) struct Checkpoint {
    customer: CustomerId,
    available: ResourceVector,
    allocation: ResourceVector,
}

/// The shared allocation state
///
/// Deserializing runs the same checks as [`Ledger::new`] and additionally
/// rejects snapshots that break conservation or a maximum bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LedgerParts")]
pub struct Ledger {
    total: ResourceVector,
    available: ResourceVector,
    customers: Vec<CustomerRecord>,
}

/// Unvalidated wire form of a ledger
#[derive(Deserialize)]
struct LedgerParts {
    total: ResourceVector,
    available: ResourceVector,
    customers: Vec<CustomerRecord>,
}

impl TryFrom<LedgerParts> for Ledger {
    type Error = InitError;

    fn try_from(parts: LedgerParts) -> InitResult<Self> {
        let LedgerParts { total, available, customers } = parts;
        check_maxima(&total, customers.iter().map(CustomerRecord::maximum))?;
        for row in std::iter::once(&available).chain(customers.iter().map(CustomerRecord::allocation)) {
            ensure!(
                row.len() == total.len(),
                InitError::ResourceCountMismatch {
                    expected: total.len(),
                    actual: row.len(),
                }
            );
        }

        let ledger = Self { total, available, customers };
        let violations = ledger.check_invariants();
        if !violations.is_empty() {
            let details: Vec<String> = violations.iter().map(ToString::to_string).collect();
            bail!(InitError::InconsistentLedger(details.join("; ")));
        }
        Ok(ledger)
    }
}

/// Every maximum has one entry per resource type and fits within the total.
fn check_maxima<'a>(
    total: &ResourceVector,
    maxima: impl ExactSizeIterator<Item = &'a ResourceVector>,
) -> InitResult<()> {
    ensure!(!total.is_empty(), InitError::NoResourceTypes);
    ensure!(maxima.len() > 0, InitError::NoCustomers);

    for (customer, maximum) in maxima.enumerate() {
        ensure!(
            maximum.len() == total.len(),
            InitError::ResourceCountMismatch {
                expected: total.len(),
                actual: maximum.len(),
            }
        );
        if let Some(resource) = total.first_shortfall(maximum) {
            bail!(InitError::MaximumExceedsTotal {
                customer,
                resource,
                maximum: maximum[resource],
                total: total[resource],
            });
        }
    }
    Ok(())
}

impl Ledger {
    /// Build a ledger with every unit free and every customer holding nothing.
    ///
    /// Each maximum must fit within the total of its resource type, otherwise
    /// the starting state would already be unsafe.
    pub fn new(total: ResourceVector, maxima: Vec<ResourceVector>) -> InitResult<Self> {
        check_maxima(&total, maxima.iter())?;

        Ok(Self {
            available: total.clone(),
            total,
            customers: maxima.into_iter().map(CustomerRecord::new).collect(),
        })
    }

    pub fn total(&self) -> &ResourceVector {
        &self.total
    }

    pub fn available(&self) -> &ResourceVector {
        &self.available
    }

    pub fn resource_count(&self) -> usize {
        self.total.len()
    }

    pub fn customer_count(&self) -> usize {
        self.customers.len()
    }

    pub fn customers(&self) -> &[CustomerRecord] {
        &self.customers
    }

    pub fn customer(&self, id: CustomerId) -> LedgerResult<&CustomerRecord> {
        self.customers.get(id.index()).ok_or(LedgerError::UnknownCustomer {
            customer: id.index(),
            customers: self.customers.len(),
        })
    }

    pub fn allocation_matrix(&self) -> Vec<ResourceVector> {
        self.customers.iter().map(|c| c.allocation.clone()).collect()
    }

    pub fn need_matrix(&self) -> Vec<ResourceVector> {
        self.customers.iter().map(CustomerRecord::need).collect()
    }

    /// Completion order for the current state, if one exists
    pub fn safe_sequence(&self) -> Option<Vec<CustomerId>> {
        safety::safe_sequence(&self.available, &self.allocation_matrix(), &self.need_matrix())
    }

    pub fn is_safe(&self) -> bool {
        self.safe_sequence().is_some()
    }

    /// Every invariant the current state breaks; empty when consistent.
    pub fn check_invariants(&self) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();
        let resources = self.total.len();

        for (customer, record) in self.customers.iter().enumerate() {
            if record.maximum.len() != resources || record.allocation.len() != resources {
                violations.push(InvariantViolation::Shape { customer });
                continue;
            }
            for resource in 0..resources {
                let (held, max) = (record.allocation[resource], record.maximum[resource]);
                if held > max {
                    violations.push(InvariantViolation::AllocationExceedsMaximum {
                        customer,
                        resource,
                        allocation: held,
                        maximum: max,
                    });
                }
            }
        }

        for resource in 0..resources {
            let allocated: u64 = self
                .customers
                .iter()
                .filter_map(|c| c.allocation.as_slice().get(resource))
                .map(|&held| u64::from(held))
                .sum();
            let available = self.available.as_slice().get(resource).copied().map_or(0, u64::from);
            let total = self.total[resource];
            if available + allocated != u64::from(total) {
                violations.push(InvariantViolation::Conservation {
                    resource,
                    available,
                    allocated,
                    total,
                });
            }
        }

        violations
    }

    /// Reject unknown customers and amount vectors of the wrong length
    pub(crate) fn validate(&self, id: CustomerId, amounts: &ResourceVector) -> LedgerResult<()> {
        self.customer(id)?;
        ensure!(
            amounts.len() == self.resource_count(),
            LedgerError::DimensionMismatch {
                expected: self.resource_count(),
                actual: amounts.len(),
            }
        );
        Ok(())
    }

    pub(crate) fn checkpoint(&self, id: CustomerId) -> LedgerResult<Checkpoint> {
        Ok(Checkpoint {
            customer: id,
            available: self.available.clone(),
            allocation: self.customer(id)?.allocation.clone(),
        })
    }

    /// Put back exactly the values captured by `checkpoint`
    pub(crate) fn restore(&mut self, checkpoint: Checkpoint) {
        if let Some(record) = self.customers.get_mut(checkpoint.customer.index()) {
            record.allocation = checkpoint.allocation;
            self.available = checkpoint.available;
        }
    }

    /// Move `amounts` from the pool to the customer.
    ///
    /// Checks need before availability. On refusal nothing is written.
    pub(crate) fn grant(&mut self, id: CustomerId, amounts: &ResourceVector) -> LedgerResult<Result<(), DenialReason>> {
        self.validate(id, amounts)?;
        let record = &self.customers[id.index()];

        if !record.need().covers(amounts) {
            return Ok(Err(DenialReason::ExceedsNeed));
        }
        let Some(available) = self.available.checked_sub(amounts) else {
            return Ok(Err(DenialReason::ExceedsAvailable));
        };
        let Some(allocation) = record.allocation.checked_add(amounts) else {
            return Ok(Err(DenialReason::ExceedsNeed));
        };

        self.available = available;
        self.customers[id.index()].allocation = allocation;
        Ok(Ok(()))
    }

    /// Move `amounts` from the customer back to the pool.
    ///
    /// Refuses, without writing anything, if the customer holds less than
    /// `amounts` of any resource type.
    pub(crate) fn reclaim(&mut self, id: CustomerId, amounts: &ResourceVector) -> LedgerResult<()> {
        self.validate(id, amounts)?;
        let record = &self.customers[id.index()];

        let Some(allocation) = record.allocation.checked_sub(amounts) else {
            return Err(match record.allocation.first_shortfall(amounts) {
                Some(resource) => LedgerError::ExceedsAllocation {
                    customer: id.index(),
                    resource,
                    requested: amounts[resource],
                    held: record.allocation[resource],
                },
                None => LedgerError::DimensionMismatch {
                    expected: record.allocation.len(),
                    actual: amounts.len(),
                },
            });
        };
        let mut available = self.available.clone();
        available.saturating_add_assign(amounts);

        self.available = available;
        self.customers[id.index()].allocation = allocation;
        Ok(())
    }
}
