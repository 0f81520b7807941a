//! Banker's safety test
//!
//! A state is safe when some order exists in which every customer can obtain
//! its remaining need from the free pool, finish, and hand its allocation
//! back. The search works on a private copy of the pool and never touches the
//! ledger.
//!
//! Customers are scanned in ascending index order and the first eligible one
//! is retired each round, so the sequence found for a given state is always
//! the same.

use tracing::trace;

use crate::vector::{CustomerId, ResourceVector};

/// The completion order for the given state, or `None` if the state is unsafe.
///
/// `allocation` and `need` are indexed by customer and must have the same
/// number of rows, each as long as `available`. Malformed input is reported
/// as unsafe.
pub fn safe_sequence(
    available: &ResourceVector,
    allocation: &[ResourceVector],
    need: &[ResourceVector],
) -> Option<Vec<CustomerId>> {
    let customers = need.len();
    if allocation.len() != customers {
        return None;
    }
    if allocation.iter().chain(need).any(|row| row.len() != available.len()) {
        return None;
    }

    let mut work = available.clone();
    let mut finished = vec![false; customers];
    let mut order = Vec::with_capacity(customers);

    for _ in 0..customers {
        let Some(next) = (0..customers).find(|&i| !finished[i] && work.covers(&need[i])) else {
            trace!(finished = order.len(), %work, "no customer can finish");
            return None;
        };
        finished[next] = true;
        work.saturating_add_assign(&allocation[next]);
        order.push(CustomerId(next));
    }

    Some(order)
}

/// Whether a completion order exists for the given state
pub fn is_safe(available: &ResourceVector, allocation: &[ResourceVector], need: &[ResourceVector]) -> bool {
    safe_sequence(available, allocation, need).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(rows: &[&[u32]]) -> Vec<ResourceVector> {
        rows.iter().map(|r| ResourceVector::new(r.to_vec())).collect()
    }

    #[test]
    fn test_textbook_state_is_safe() {
        // Five customers, three resource types.
        let available = ResourceVector::from([3, 3, 2]);
        let allocation = rows(&[&[0, 1, 0], &[2, 0, 0], &[3, 0, 2], &[2, 1, 1], &[0, 0, 2]]);
        let need = rows(&[&[7, 4, 3], &[1, 2, 2], &[6, 0, 0], &[0, 1, 1], &[4, 3, 1]]);

        let order = safe_sequence(&available, &allocation, &need).expect("safe");
        assert_eq!(
            order,
            vec![CustomerId(1), CustomerId(3), CustomerId(0), CustomerId(2), CustomerId(4)]
        );
    }

    #[test]
    fn test_safety_depends_on_free_pool() {
        // The textbook state after customer 0 is handed [0 2 0].
        let available = ResourceVector::from([3, 1, 2]);
        let allocation = rows(&[&[0, 3, 0], &[2, 0, 0], &[3, 0, 2], &[2, 1, 1], &[0, 0, 2]]);
        let need = rows(&[&[7, 2, 3], &[1, 2, 2], &[6, 0, 0], &[0, 1, 1], &[4, 3, 1]]);

        // One unit less of resource 1 and nobody can finish.
        let available_after = ResourceVector::from([3, 0, 2]);
        assert!(is_safe(&available, &allocation, &need));
        assert!(!is_safe(&available_after, &allocation, &need));
    }

    #[test]
    fn test_scan_restarts_from_lowest_index() {
        // Customer 1 is the only one eligible at first; once it returns its
        // allocation customer 0 becomes eligible ahead of customer 2.
        let available = ResourceVector::from([1]);
        let allocation = rows(&[&[0], &[2], &[0]]);
        let need = rows(&[&[3], &[1], &[3]]);

        assert_eq!(
            safe_sequence(&available, &allocation, &need),
            Some(vec![CustomerId(1), CustomerId(0), CustomerId(2)])
        );
    }

    #[test]
    fn test_no_customers_is_safe() {
        assert_eq!(safe_sequence(&ResourceVector::from([1]), &[], &[]), Some(vec![]));
    }

    #[test]
    fn test_malformed_input_is_unsafe() {
        let available = ResourceVector::from([1, 1]);
        assert!(!is_safe(&available, &rows(&[&[0, 0]]), &[]));
        assert!(!is_safe(&available, &rows(&[&[0]]), &rows(&[&[0]])));
    }

    #[test]
    fn test_does_not_mutate_inputs() {
        let available = ResourceVector::from([1]);
        let allocation = rows(&[&[1]]);
        let need = rows(&[&[1]]);
        assert!(is_safe(&available, &allocation, &need));
        assert_eq!(available, ResourceVector::from([1]));
        assert_eq!(allocation, rows(&[&[1]]));
    }
}
