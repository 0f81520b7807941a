// Purpose: Defines the invariant checking system for monitoring ledger state and reporting violations
//
// Checkers run against consistent ledger snapshots taken after each
// transaction, so a broken invariant is caught at the step that broke it.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use banker_core::Ledger;

/// Type of invariant being checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantType {
    /// Conservation, non-negative need and well-formed rows
    LedgerConsistency,
    /// A completion order exists for the committed state
    SafeState,
}

impl fmt::Display for InvariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LedgerConsistency => write!(f, "LedgerConsistency"),
            Self::SafeState => write!(f, "SafeState"),
        }
    }
}

/// Result of an invariant check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantResult {
    Satisfied,
    Violated {
        invariant_type: InvariantType,
        message: String,
    },
}

impl InvariantResult {
    pub fn is_violated(&self) -> bool {
        matches!(self, Self::Violated { .. })
    }
}

impl fmt::Display for InvariantResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Satisfied => write!(f, "satisfied"),
            Self::Violated { invariant_type, message } => write!(f, "{}: {}", invariant_type, message),
        }
    }
}

/// Trait defining an invariant checker
pub trait InvariantChecker: Send + Sync + fmt::Debug {
    fn invariant_type(&self) -> InvariantType;

    fn check(&self, ledger: &Ledger) -> InvariantResult;
}

/// Conservation of units and `need = maximum - allocation >= 0`
#[derive(Debug, Clone, Default)]
pub struct LedgerConsistencyChecker;

impl InvariantChecker for LedgerConsistencyChecker {
    fn invariant_type(&self) -> InvariantType {
        InvariantType::LedgerConsistency
    }

    fn check(&self, ledger: &Ledger) -> InvariantResult {
        let violations = ledger.check_invariants();
        if violations.is_empty() {
            return InvariantResult::Satisfied;
        }
        InvariantResult::Violated {
            invariant_type: self.invariant_type(),
            message: violations.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "),
        }
    }
}

/// Committed states must always be safe
#[derive(Debug, Clone, Default)]
pub struct SafeStateChecker;

impl InvariantChecker for SafeStateChecker {
    fn invariant_type(&self) -> InvariantType {
        InvariantType::SafeState
    }

    fn check(&self, ledger: &Ledger) -> InvariantResult {
        if ledger.is_safe() {
            InvariantResult::Satisfied
        } else {
            InvariantResult::Violated {
                invariant_type: self.invariant_type(),
                message: format!("no completion order exists with available {}", ledger.available()),
            }
        }
    }
}

/// Runs every registered checker over each observed snapshot
pub struct InvariantObserver {
    checkers: Vec<Box<dyn InvariantChecker>>,
    violation_callback: Option<Box<dyn Fn(&InvariantResult) + Send + Sync>>,
    violation_count: AtomicUsize,
    violations: Mutex<Vec<InvariantResult>>,
}

impl fmt::Debug for InvariantObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvariantObserver")
            .field("checkers", &self.checkers)
            .field("has_violation_callback", &self.violation_callback.is_some())
            .field("violation_count", &self.violation_count())
            .finish()
    }
}

impl Default for InvariantObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantObserver {
    /// An observer with no checkers
    pub fn new() -> Self {
        Self {
            checkers: Vec::new(),
            violation_callback: None,
            violation_count: AtomicUsize::new(0),
            violations: Mutex::new(Vec::new()),
        }
    }

    /// An observer with every ledger checker registered
    pub fn with_standard_checkers() -> Self {
        let mut observer = Self::new();
        observer
            .add_checker(Box::new(LedgerConsistencyChecker))
            .add_checker(Box::new(SafeStateChecker));
        observer
    }

    pub fn add_checker(&mut self, checker: Box<dyn InvariantChecker>) -> &mut Self {
        self.checkers.push(checker);
        self
    }

    pub fn set_violation_callback<F>(&mut self, callback: F) -> &mut Self
    where
        F: Fn(&InvariantResult) + Send + Sync + 'static,
    {
        self.violation_callback = Some(Box::new(callback));
        self
    }

    pub fn violation_count(&self) -> usize {
        self.violation_count.load(Ordering::Relaxed)
    }

    pub fn violations(&self) -> Vec<InvariantResult> {
        self.violations.lock().map(|v| v.clone()).unwrap_or_default()
    }

    /// Check one snapshot, returning the violations it produced
    pub fn observe(&self, ledger: &Ledger) -> Vec<InvariantResult> {
        let found: Vec<InvariantResult> = self
            .checkers
            .iter()
            .map(|checker| checker.check(ledger))
            .filter(InvariantResult::is_violated)
            .collect();

        for result in &found {
            self.violation_count.fetch_add(1, Ordering::Relaxed);
            if let Some(callback) = &self.violation_callback {
                callback(result);
            }
        }
        if !found.is_empty() {
            if let Ok(mut violations) = self.violations.lock() {
                violations.extend(found.iter().cloned());
            }
        }
        found
    }
}
