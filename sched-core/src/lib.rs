mod error;
mod scheduler;
mod types;

pub use error::SchedulerError;
pub use scheduler::{Scheduler, SchedulerIter};
pub use types::{BatchExecutionResult, ScheduledTxnInfo};

#[cfg(test)]
mod tests {
    use super::*;
    use sched_state::ContextManager;
    use sched_wire::{create_batch, create_transaction, generate_keypair, Batch};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn new_scheduler() -> (Scheduler, ContextManager) {
        let ctx_mgr = ContextManager::new();
        let root = ctx_mgr.get_first_root();
        let scheduler = Scheduler::new(ctx_mgr.get_squash_handler(), root);
        (scheduler, ctx_mgr)
    }

    fn one_txn_batch(name: &str) -> Batch {
        let (sk, pk) = generate_keypair();
        let txn = create_transaction(name, &sk, &pk);
        create_batch(vec![txn], &sk, &pk)
    }

    fn named_batch(names: &[&str]) -> Batch {
        let (sk, pk) = generate_keypair();
        let txns: Vec<_> = names.iter().map(|n| create_transaction(n, &sk, &pk)).collect();
        create_batch(txns, &sk, &pk)
    }

    /// Transactions dispatch in the order their batches were added and, within
    /// a batch, in the order they appear there (S1).
    #[test_log::test]
    fn dispatches_in_fifo_order() {
        let (scheduler, _ctx_mgr) = new_scheduler();
        let batch = named_batch(&["a", "b", "c"]);
        let expected: Vec<String> = batch.transaction_signatures().into_iter().map(String::from).collect();
        scheduler.add_batch(batch).unwrap();
        scheduler.finalize();

        let mut seen = Vec::new();
        while let Some(info) = scheduler.next_transaction() {
            seen.push(info.txn.header_signature.clone());
            scheduler
                .set_transaction_execution_result(&info.txn.header_signature, true, Some(0))
                .unwrap();
        }
        assert_eq!(seen, expected);
    }

    /// At most one transaction is ever in flight: a second call to
    /// `next_transaction` while one is outstanding returns `None` (S3).
    #[test_log::test]
    fn only_one_transaction_in_flight_at_a_time() {
        let (scheduler, _ctx_mgr) = new_scheduler();
        scheduler.add_batch(named_batch(&["a", "b"])).unwrap();

        let first = scheduler.next_transaction().unwrap();
        assert!(scheduler.next_transaction().is_none());

        scheduler
            .set_transaction_execution_result(&first.txn.header_signature, true, Some(0))
            .unwrap();
        assert!(scheduler.next_transaction().is_some());
    }

    /// The blocking iterator suspends when the queue is empty and wakes once
    /// a batch is added from another thread (S2).
    #[test_log::test]
    fn iterator_blocks_until_a_batch_is_added() {
        let (scheduler, _ctx_mgr) = new_scheduler();
        let (tx, rx) = mpsc::channel();
        let producer = scheduler.clone();

        let handle = thread::spawn(move || {
            let mut iter = producer.iter();
            let info = iter.next().expect("a transaction eventually arrives");
            tx.send(info.txn.header_signature).unwrap();
        });

        // Give the consumer thread a chance to block on the empty queue.
        thread::sleep(Duration::from_millis(50));
        assert!(rx.try_recv().is_err());

        let batch = one_txn_batch("only");
        let expected_sig = batch.transactions[0].header_signature.clone();
        scheduler.add_batch(batch).unwrap();

        let received = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(received, expected_sig);
        handle.join().unwrap();
    }

    /// Two iterators observe the identical sequence of transactions in
    /// lockstep: a second iterator's `next()` returns the same pending
    /// transaction a first iterator already dispatched, before any result
    /// has been reported for it (mirrors `test_transaction_order`).
    #[test_log::test]
    fn two_iterators_observe_the_same_pending_transaction() {
        let (scheduler, _ctx_mgr) = new_scheduler();
        let batch = one_txn_batch("only");
        let expected_sig = batch.transactions[0].header_signature.clone();
        scheduler.add_batch(batch).unwrap();
        scheduler.finalize();

        let mut iter1 = scheduler.iter();
        let mut iter2 = scheduler.iter();

        let from_iter1 = iter1.next().expect("a transaction is queued");
        assert_eq!(from_iter1.txn.header_signature, expected_sig);

        let from_iter2 = iter2.next().expect("the same pending transaction, not blocked");
        assert_eq!(from_iter2.txn.header_signature, expected_sig);
        assert_eq!(from_iter1.state_hash, from_iter2.state_hash);
        assert_eq!(from_iter1.base_context_ids, from_iter2.base_context_ids);

        scheduler
            .set_transaction_execution_result(&expected_sig, true, Some(0))
            .unwrap();
        assert!(iter1.next().is_none());
        assert!(iter2.next().is_none());
    }

    /// A fully valid batch squashes into a new state root that becomes the
    /// base for the next batch (S4, invariant "current_base advances only at
    /// batch boundaries").
    #[test_log::test]
    fn valid_batch_squashes_and_advances_base() {
        let (scheduler, ctx_mgr) = new_scheduler();
        let first_root = ctx_mgr.get_first_root();
        let batch = one_txn_batch("a");
        let sig = batch.transactions[0].header_signature.clone();
        scheduler.add_batch(batch.clone()).unwrap();

        let info = scheduler.next_transaction().unwrap();
        assert_eq!(info.state_hash, first_root);
        let addr = info.txn.header.outputs[0].clone();
        let ctx = ctx_mgr
            .create_context(&info.state_hash, info.txn.header.inputs.clone(), info.txn.header.outputs.clone(), info.base_context_ids.clone())
            .unwrap();
        ctx_mgr.set(ctx, vec![(addr, b"value".to_vec())]).unwrap();
        scheduler
            .set_transaction_execution_result(&sig, true, Some(ctx))
            .unwrap();

        let result = scheduler
            .get_batch_execution_result(&batch.header_signature)
            .expect("batch is resolved once its only transaction reports");
        assert!(result.is_valid);
        let new_root = result.state_hash.unwrap();
        assert_ne!(new_root, first_root);

        let next_batch = one_txn_batch("b");
        scheduler.add_batch(next_batch).unwrap();
        let next_info = scheduler.next_transaction().unwrap();
        assert_eq!(next_info.state_hash, new_root);
    }

    /// A single invalid transaction fails the whole batch and leaves the
    /// base state unchanged for whatever comes next (edge case in §4.D).
    #[test_log::test]
    fn invalid_transaction_discards_the_whole_batch() {
        let (scheduler, ctx_mgr) = new_scheduler();
        let first_root = ctx_mgr.get_first_root();
        let batch = named_batch(&["a", "b"]);
        scheduler.add_batch(batch.clone()).unwrap();

        let first = scheduler.next_transaction().unwrap();
        scheduler
            .set_transaction_execution_result(&first.txn.header_signature, true, Some(0))
            .unwrap();
        let second = scheduler.next_transaction().unwrap();
        scheduler
            .set_transaction_execution_result(&second.txn.header_signature, false, None)
            .unwrap();

        let result = scheduler
            .get_batch_execution_result(&batch.header_signature)
            .unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.state_hash, None);

        let next_batch = one_txn_batch("c");
        scheduler.add_batch(next_batch).unwrap();
        let next_info = scheduler.next_transaction().unwrap();
        assert_eq!(next_info.state_hash, first_root);
    }

    /// `complete(false)` reflects drained-and-finalized state without
    /// blocking; `complete(true)` blocks until that state is reached.
    #[test_log::test]
    fn complete_reports_drained_and_finalized_state() {
        let (scheduler, _ctx_mgr) = new_scheduler();
        assert!(!scheduler.complete(false));

        let batch = one_txn_batch("a");
        let sig = batch.transactions[0].header_signature.clone();
        scheduler.add_batch(batch).unwrap();
        scheduler.finalize();
        assert!(!scheduler.complete(false));

        let info = scheduler.next_transaction().unwrap();
        scheduler
            .set_transaction_execution_result(&info.txn.header_signature, true, Some(0))
            .unwrap();
        assert_eq!(info.txn.header_signature, sig);
        assert!(scheduler.complete(false));
    }

    /// Reporting a result with no transaction in flight, or for a signature
    /// that doesn't match the one in flight, is protocol misuse and is
    /// reported as an error, never a panic (§7).
    #[test_log::test]
    fn misuse_is_reported_as_an_error_not_a_panic() {
        let (scheduler, _ctx_mgr) = new_scheduler();
        assert!(scheduler
            .set_transaction_execution_result("nonexistent", true, Some(0))
            .is_err());

        let batch = named_batch(&["a", "b"]);
        scheduler.add_batch(batch.clone()).unwrap();
        let first = scheduler.next_transaction().unwrap();
        let other_sig = batch.transactions[1].header_signature.clone();
        assert_ne!(first.txn.header_signature, other_sig);
        assert!(scheduler
            .set_transaction_execution_result(&other_sig, true, Some(0))
            .is_err());
    }

    /// `add_batch` after `finalize` is rejected.
    #[test_log::test]
    fn add_batch_after_finalize_is_rejected() {
        let (scheduler, _ctx_mgr) = new_scheduler();
        scheduler.finalize();
        assert!(scheduler.add_batch(one_txn_batch("late")).is_err());
    }
}
