// Purpose: End-to-end allocation scenarios against the resource manager.

use banker_core::{
    CustomerId, DenialReason, Ledger, LedgerError, RequestOutcome, ResourceManager, ResourceVector,
};

fn manager(total: &[u32], maxima: &[&[u32]]) -> ResourceManager {
    let ledger = Ledger::new(
        ResourceVector::new(total.to_vec()),
        maxima.iter().map(|m| ResourceVector::new(m.to_vec())).collect(),
    )
    .expect("valid ledger");
    ResourceManager::new(ledger)
}

fn v(counts: &[u32]) -> ResourceVector {
    ResourceVector::new(counts.to_vec())
}

#[test]
fn single_customer_takes_everything() {
    let manager = manager(&[10], &[&[10]]);

    assert_eq!(manager.request(CustomerId(0), &v(&[10])), Ok(RequestOutcome::Granted));

    let ledger = manager.snapshot().unwrap();
    assert_eq!(ledger.available(), &v(&[0]));
    assert!(ledger.customer(CustomerId(0)).unwrap().is_satisfied());
}

#[test]
fn second_customer_denied_when_pool_is_short() {
    let manager = manager(&[10], &[&[6], &[6]]);

    assert_eq!(manager.request(CustomerId(0), &v(&[5])), Ok(RequestOutcome::Granted));
    let before = manager.snapshot().unwrap();

    // Five units remain, but customer 1 asks for six.
    assert_eq!(
        manager.request(CustomerId(1), &v(&[6])),
        Ok(RequestOutcome::Denied(DenialReason::ExceedsAvailable))
    );
    assert_eq!(manager.snapshot().unwrap(), before);

    // Five would fit the pool but leaves neither customer able to finish.
    assert_eq!(
        manager.request(CustomerId(1), &v(&[5])),
        Ok(RequestOutcome::Denied(DenialReason::Unsafe))
    );
    assert_eq!(manager.snapshot().unwrap(), before);
}

#[test]
fn request_completing_a_customer_is_safe() {
    let manager = manager(&[3], &[&[2], &[2]]);

    assert_eq!(manager.request(CustomerId(0), &v(&[1])), Ok(RequestOutcome::Granted));
    // Customer 1 reaches its maximum, can finish, and frees enough for customer 0.
    assert_eq!(manager.request(CustomerId(1), &v(&[2])), Ok(RequestOutcome::Granted));

    let ledger = manager.snapshot().unwrap();
    assert_eq!(ledger.available(), &v(&[0]));
    assert_eq!(ledger.safe_sequence(), Some(vec![CustomerId(1), CustomerId(0)]));
}

#[test]
fn partial_request_with_one_unit_left_is_still_safe() {
    let manager = manager(&[3], &[&[2], &[2]]);

    assert_eq!(manager.request(CustomerId(0), &v(&[1])), Ok(RequestOutcome::Granted));
    // One unit stays free and customer 0 needs exactly one more, so it can
    // finish first and release two for customer 1.
    assert_eq!(manager.request(CustomerId(1), &v(&[1])), Ok(RequestOutcome::Granted));
    assert_eq!(
        manager.snapshot().unwrap().safe_sequence(),
        Some(vec![CustomerId(0), CustomerId(1)])
    );
}

#[test]
fn request_leaving_no_completion_order_is_denied() {
    let manager = manager(&[3], &[&[3], &[3]]);

    assert_eq!(manager.request(CustomerId(0), &v(&[1])), Ok(RequestOutcome::Granted));
    assert_eq!(
        manager.request(CustomerId(1), &v(&[1])),
        Ok(RequestOutcome::Denied(DenialReason::Unsafe))
    );

    let ledger = manager.snapshot().unwrap();
    assert_eq!(ledger.available(), &v(&[2]));
    assert!(ledger.customer(CustomerId(1)).unwrap().allocation().is_zero());
}

#[test]
fn request_above_need_is_denied_even_when_free() {
    let manager = manager(&[10], &[&[3]]);

    assert_eq!(
        manager.request(CustomerId(0), &v(&[4])),
        Ok(RequestOutcome::Denied(DenialReason::ExceedsNeed))
    );
    assert!(manager.snapshot().unwrap().customer(CustomerId(0)).unwrap().allocation().is_zero());
}

#[test]
fn release_of_unheld_units_is_rejected() {
    let manager = manager(&[4, 4], &[&[2, 2]]);
    manager.request(CustomerId(0), &v(&[2, 0])).unwrap();
    let before = manager.snapshot().unwrap();

    assert_eq!(
        manager.release(CustomerId(0), &v(&[0, 1])),
        Err(LedgerError::ExceedsAllocation { customer: 0, resource: 1, requested: 1, held: 0 })
    );
    assert_eq!(manager.snapshot().unwrap(), before);
    assert!(before.check_invariants().is_empty());
}

#[test]
fn release_returns_units_to_pool_and_need() {
    let manager = manager(&[5, 5, 5], &[&[3, 2, 1], &[1, 1, 1]]);
    manager.request(CustomerId(0), &v(&[3, 1, 0])).unwrap();

    manager.release(CustomerId(0), &v(&[2, 1, 0])).unwrap();

    let ledger = manager.snapshot().unwrap();
    let record = ledger.customer(CustomerId(0)).unwrap();
    assert_eq!(ledger.available(), &v(&[4, 5, 5]));
    assert_eq!(record.allocation(), &v(&[1, 0, 0]));
    assert_eq!(record.need(), v(&[2, 2, 1]));
}
