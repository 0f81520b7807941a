// Purpose: End-to-end runs of the simulation engine with scripted and seeded demand.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use banker_core::{Ledger, ResourceVector};
use banker_error::InitError;
use banker_simulation::{
    DemandSource, OutcomeEvent, RecordingReporter, ScriptedDemand, Simulation, SimulationConfig,
};
use tokio::sync::watch;

fn quick_config(customers: usize, resources: usize, iterations: Option<u64>, seed: u64) -> SimulationConfig {
    SimulationConfig {
        customers,
        resources,
        iterations,
        max_think_ms: 0,
        max_hold_ms: 0,
        seed: Some(seed),
        ..Default::default()
    }
}

fn assert_returned_everything(initial: &Ledger, last: &Ledger) {
    assert_eq!(last.available(), initial.total());
    for record in last.customers() {
        assert!(record.allocation().is_zero());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_seeded_random_run_stays_safe() {
    let simulation = Simulation::random(quick_config(5, 3, Some(50), 7), &[10, 5, 7]).unwrap();
    assert_eq!(simulation.seed(), Some(7));

    let reporter = Arc::new(RecordingReporter::new());
    let (_cancel, cancelled) = watch::channel(false);
    let report = simulation.run(reporter.clone(), cancelled).await.unwrap();

    assert!(report.is_clean(), "violations: {:?}", report.violations);
    assert_eq!(report.customers.len(), 5);
    assert!(report.customers.iter().all(|c| c.cycles == 50));
    assert_eq!(report.requests(), 250);
    assert_eq!(report.grants() + report.denials(), report.requests());
    assert_returned_everything(&report.initial_ledger, &report.final_ledger);

    let request_events = reporter
        .events()
        .iter()
        .filter(|e| matches!(e, OutcomeEvent::Request { .. }))
        .count();
    assert_eq!(request_events as u64, report.requests());
}

#[test]
fn test_same_seed_draws_same_maxima() {
    let a = Simulation::random(quick_config(5, 3, Some(1), 99), &[10, 5, 7]).unwrap();
    let b = Simulation::random(quick_config(5, 3, Some(1), 99), &[10, 5, 7]).unwrap();
    assert_eq!(a.manager().snapshot().unwrap(), b.manager().snapshot().unwrap());

    for record in a.manager().snapshot().unwrap().customers() {
        assert!(ResourceVector::from([10, 5, 7]).covers(record.maximum()));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_scripted_customers_contend_for_one_pool() {
    // Total [3], maxima [2] and [2]: at most one customer may hold two units.
    let sources: Vec<Box<dyn DemandSource>> = vec![
        Box::new(ScriptedDemand::new().with_maximum([2]).with_request([2]).with_request([1])),
        Box::new(ScriptedDemand::new().with_maximum([2]).with_request([1]).with_request([2])),
    ];
    let simulation = Simulation::with_sources(quick_config(2, 1, Some(2), 0), &[3], sources).unwrap();

    let reporter = Arc::new(RecordingReporter::new());
    let (_cancel, cancelled) = watch::channel(false);
    let report = simulation.run(reporter, cancelled).await.unwrap();

    assert!(report.is_clean());
    assert_eq!(report.requests(), 4);
    assert_eq!(report.customers[0].rejected_releases, 0);
    assert_returned_everything(&report.initial_ledger, &report.final_ledger);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancellation_stops_unbounded_run() {
    let mut config = quick_config(5, 3, None, 21);
    config.max_think_ms = 5;
    config.max_hold_ms = 5;
    let simulation = Simulation::random(config, &[10, 5, 7]).unwrap();

    let (cancel, cancelled) = watch::channel(false);
    let run = tokio::spawn(simulation.run(Arc::new(RecordingReporter::new()), cancelled));

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.send(true).unwrap();

    let report = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("customers did not stop after cancellation")
        .unwrap()
        .unwrap();
    assert!(report.is_clean());
    assert_returned_everything(&report.initial_ledger, &report.final_ledger);
}

#[tokio::test]
async fn test_run_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "customers = 3\nresources = 2\niterations = 5\nseed = 3\nmax_think_ms = 0\nmax_hold_ms = 0"
    )
    .unwrap();

    let config = SimulationConfig::load(file.path()).unwrap();
    let simulation = Simulation::random(config, &[4, 4]).unwrap();
    let (_cancel, cancelled) = watch::channel(false);
    let report = simulation.run(Arc::new(RecordingReporter::new()), cancelled).await.unwrap();

    assert_eq!(report.customers.len(), 3);
    assert_eq!(report.requests(), 15);

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["seed"], 3);
    assert_eq!(json["customers"].as_array().unwrap().len(), 3);
    assert!(report.to_string().contains("Invariants: all held"));
}

#[test]
fn test_initialisation_errors() {
    assert_eq!(
        Simulation::random(quick_config(5, 3, None, 1), &[10, 5]).unwrap_err(),
        InitError::ResourceCountMismatch { expected: 3, actual: 2 }
    );
    assert_eq!(
        Simulation::random(quick_config(0, 3, None, 1), &[1, 1, 1]).unwrap_err(),
        InitError::NoCustomers
    );

    let sources: Vec<Box<dyn DemandSource>> = vec![Box::new(ScriptedDemand::new().with_maximum([4]))];
    assert!(matches!(
        Simulation::with_sources(quick_config(1, 1, None, 1), &[3], sources),
        Err(InitError::MaximumExceedsTotal { .. })
    ));

    let sources: Vec<Box<dyn DemandSource>> = vec![Box::new(ScriptedDemand::new()), Box::new(ScriptedDemand::new())];
    assert!(matches!(
        Simulation::with_sources(quick_config(3, 1, None, 1), &[3], sources),
        Err(InitError::Config(message)) if message == "2 demand sources for 3 configured customers"
    ));

    let ledger = Ledger::new([3].into(), vec![ResourceVector::from([1]), ResourceVector::from([1])]).unwrap();
    assert!(matches!(
        Simulation::from_parts(quick_config(2, 1, None, 1), ledger, Vec::new()),
        Err(InitError::Config(_))
    ));
}
