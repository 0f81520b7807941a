// Purpose: Defines the OutcomeReporter trait for observing request and release outcomes
//
// Each outcome becomes one complete line; writers never split a line, so
// output from concurrent customers cannot interleave mid-line.

use std::io::{self, Write};
use std::sync::Mutex;

use banker_core::{CustomerId, RequestOutcome, ResourceVector};
use banker_error::LedgerError;
use serde::Serialize;
use tracing::error;

/// Something a customer did that is worth reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum OutcomeEvent {
    Request {
        customer: CustomerId,
        amounts: ResourceVector,
        outcome: RequestOutcome,
    },
    Release {
        customer: CustomerId,
        amounts: ResourceVector,
    },
    ReleaseRejected {
        customer: CustomerId,
        amounts: ResourceVector,
        #[serde(serialize_with = "serialize_display")]
        error: LedgerError,
    },
}

fn serialize_display<S: serde::Serializer>(error: &LedgerError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

impl OutcomeEvent {
    pub fn customer(&self) -> CustomerId {
        match self {
            Self::Request { customer, .. }
            | Self::Release { customer, .. }
            | Self::ReleaseRejected { customer, .. } => *customer,
        }
    }

    /// The line printed for this event
    pub fn line(&self) -> String {
        match self {
            Self::Request { customer, amounts, outcome: RequestOutcome::Granted } => format!(
                "Customer {} requested {} and the request has been granted.",
                customer, amounts
            ),
            Self::Request { customer, amounts, outcome: RequestOutcome::Denied(reason) } => format!(
                "Customer {} requested {} but the request has been denied ({}).",
                customer,
                amounts,
                reason.label()
            ),
            Self::Release { customer, amounts } => format!("Customer {} released {}.", customer, amounts),
            Self::ReleaseRejected { customer, amounts, error } => {
                format!("Customer {} could not release {}: {}.", customer, amounts, error)
            }
        }
    }
}

/// Trait for observing customer outcomes
pub trait OutcomeReporter: Send + Sync {
    fn report(&self, event: &OutcomeEvent);
}

/// Writes each outcome as one line to stdout
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }
}

impl OutcomeReporter for ConsoleReporter {
    fn report(&self, event: &OutcomeEvent) {
        let mut line = event.line();
        line.push('\n');
        // One write under the stdout lock keeps the line whole.
        let mut stdout = io::stdout().lock();
        if let Err(e) = stdout.write_all(line.as_bytes()).and_then(|_| stdout.flush()) {
            error!("Failed to write outcome: {}", e);
        }
    }
}

/// Keeps every outcome in memory, in reporting order
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<OutcomeEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<OutcomeEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    pub fn events_for(&self, customer: CustomerId) -> Vec<OutcomeEvent> {
        self.events().into_iter().filter(|e| e.customer() == customer).collect()
    }
}

impl OutcomeReporter for RecordingReporter {
    fn report(&self, event: &OutcomeEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banker_error::DenialReason;

    #[test]
    fn test_lines() {
        let granted = OutcomeEvent::Request {
            customer: CustomerId(2),
            amounts: ResourceVector::from([1, 0, 3]),
            outcome: RequestOutcome::Granted,
        };
        assert_eq!(granted.line(), "Customer 2 requested [1 0 3] and the request has been granted.");

        let denied = OutcomeEvent::Request {
            customer: CustomerId(0),
            amounts: ResourceVector::from([4]),
            outcome: RequestOutcome::Denied(DenialReason::Unsafe),
        };
        assert_eq!(denied.line(), "Customer 0 requested [4] but the request has been denied (unsafe).");

        let released = OutcomeEvent::Release { customer: CustomerId(1), amounts: ResourceVector::from([0, 2]) };
        assert_eq!(released.line(), "Customer 1 released [0 2].");
    }

    #[test]
    fn test_recording_reporter_filters_by_customer() {
        let reporter = RecordingReporter::new();
        for i in 0..3 {
            reporter.report(&OutcomeEvent::Release { customer: CustomerId(i % 2), amounts: ResourceVector::from([1]) });
        }
        assert_eq!(reporter.events().len(), 3);
        assert_eq!(reporter.events_for(CustomerId(0)).len(), 2);
    }

    #[test]
    fn test_event_serializes_error_as_text() {
        let event = OutcomeEvent::ReleaseRejected {
            customer: CustomerId(0),
            amounts: ResourceVector::from([1]),
            error: LedgerError::ExceedsAllocation { customer: 0, resource: 0, requested: 1, held: 0 },
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value["ReleaseRejected"]["error"],
            serde_json::json!("customer 0 cannot release 1 units of resource 0: holds 0")
        );
    }
}
