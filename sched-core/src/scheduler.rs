// The serial scheduler dispatches transactions from a FIFO of added batches
// one at a time, never more than one in flight. Batches are drained in the
// order they were added and their transactions in the order they appear
// within the batch; dispatch of a batch's first transaction may begin
// before `add_batch` has returned for a later batch, but a transaction from
// batch N+1 is never dispatched before every transaction of batch N has
// been dispatched.
//
// When the last outstanding result for the current batch is recorded, the
// scheduler reaches a batch boundary: if every transaction in the batch
// was valid, their contexts are squashed (in dispatch order) into a new
// state root and that root becomes the base for the next batch; if any
// transaction was invalid, the batch is discarded and the base state is
// unchanged.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Condvar, Mutex};

use tracing::{debug, trace};

use sched_base::Result;
use sched_state::{ContextId, SquashHandler};
use sched_wire::{Batch, Transaction};

use crate::error::SchedulerError;
use crate::types::{BatchExecutionResult, ScheduledTxnInfo};

struct QueuedTxn {
    txn: Transaction,
    batch_sig: String,
}

struct Inner {
    fifo: VecDeque<QueuedTxn>,
    batch_txn_counts: HashMap<String, usize>,
    in_flight: Option<(String, String)>,
    current_batch_sig: Option<String>,
    current_batch_remaining: usize,
    current_batch_all_valid: bool,
    successful_contexts: Vec<ContextId>,
    current_base: String,
    results: HashMap<String, (bool, Option<ContextId>)>,
    batch_results: HashMap<String, BatchExecutionResult>,
    finalized: bool,
    /// The info handed out for the currently in-flight transaction, kept
    /// around so a second concurrent iterator observes the same pending
    /// transaction instead of blocking until its result is reported.
    pending_info: Option<ScheduledTxnInfo>,
}

struct Shared {
    inner: Mutex<Inner>,
    cv: Condvar,
    squash: SquashHandler,
}

/// Serializes dispatch of a sequence of batches against a single state
/// lineage. Cloning a `Scheduler` shares the same underlying queue; it is
/// the intended way to hand the scheduler to a dispatch thread while an
/// iterator consumes it elsewhere.
#[derive(Clone)]
pub struct Scheduler {
    shared: Arc<Shared>,
}

impl Scheduler {
    pub fn new(squash: SquashHandler, first_state_root: String) -> Self {
        Scheduler {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    fifo: VecDeque::new(),
                    batch_txn_counts: HashMap::new(),
                    in_flight: None,
                    current_batch_sig: None,
                    current_batch_remaining: 0,
                    current_batch_all_valid: true,
                    successful_contexts: Vec::new(),
                    current_base: first_state_root,
                    results: HashMap::new(),
                    batch_results: HashMap::new(),
                    finalized: false,
                    pending_info: None,
                }),
                cv: Condvar::new(),
                squash,
            }),
        }
    }

    /// Appends `batch`'s transactions to the dispatch queue. Returns
    /// `AddBatchAfterFinalize` if `finalize` was already called.
    pub fn add_batch(&self, batch: Batch) -> Result<()> {
        let mut inner = self.shared.inner.lock().unwrap();
        if inner.finalized {
            return Err(SchedulerError::AddBatchAfterFinalize.into());
        }
        debug!(
            batch = batch.header_signature.as_str(),
            txns = batch.transactions.len(),
            "add_batch"
        );
        inner
            .batch_txn_counts
            .insert(batch.header_signature.clone(), batch.transactions.len());
        for txn in batch.transactions {
            inner.fifo.push_back(QueuedTxn {
                txn,
                batch_sig: batch.header_signature.clone(),
            });
        }
        self.shared.cv.notify_all();
        Ok(())
    }

    /// Declares that no further batches will be added. Once the queue
    /// drains and no transaction is in flight, the iterator and `complete`
    /// see the scheduler as done.
    pub fn finalize(&self) {
        let mut inner = self.shared.inner.lock().unwrap();
        inner.finalized = true;
        self.shared.cv.notify_all();
    }

    /// Dispatches the next queued transaction, or returns `None` if
    /// another transaction is already in flight or the queue is empty.
    /// Non-blocking; see `iter()` for the blocking form.
    pub fn next_transaction(&self) -> Option<ScheduledTxnInfo> {
        let mut inner = self.shared.inner.lock().unwrap();
        Self::try_dispatch(&mut inner)
    }

    fn try_dispatch(inner: &mut Inner) -> Option<ScheduledTxnInfo> {
        if inner.in_flight.is_some() {
            return None;
        }
        let queued = inner.fifo.pop_front()?;
        if inner.current_batch_sig.as_deref() != Some(queued.batch_sig.as_str()) {
            let total = inner
                .batch_txn_counts
                .get(&queued.batch_sig)
                .copied()
                .unwrap_or(0);
            inner.current_batch_sig = Some(queued.batch_sig.clone());
            inner.current_batch_remaining = total;
            inner.current_batch_all_valid = true;
            inner.successful_contexts.clear();
        }
        let info = ScheduledTxnInfo {
            txn: queued.txn.clone(),
            state_hash: inner.current_base.clone(),
            // At most the last successful context, per the documented
            // `ScheduledTxnInfo::base_context_ids` contract -- not the
            // whole history of successful contexts in the batch so far.
            base_context_ids: inner.successful_contexts.last().copied().into_iter().collect(),
        };
        trace!(
            txn = queued.txn.header_signature.as_str(),
            batch = queued.batch_sig.as_str(),
            "dispatch"
        );
        inner.in_flight = Some((queued.txn.header_signature.clone(), queued.batch_sig));
        inner.pending_info = Some(info.clone());
        Some(info)
    }

    /// Records the outcome of the currently in-flight transaction and, if
    /// it was the last outstanding result in its batch, squashes (or
    /// discards) the batch.
    pub fn set_transaction_execution_result(
        &self,
        header_signature: &str,
        is_valid: bool,
        context_id: Option<ContextId>,
    ) -> Result<()> {
        let mut inner = self.shared.inner.lock().unwrap();
        let (in_flight_sig, batch_sig) = match inner.in_flight.clone() {
            None => return Err(SchedulerError::ResultBeforeDispatch.into()),
            Some(pair) => pair,
        };
        if in_flight_sig != header_signature {
            return Err(SchedulerError::UnknownTransaction(header_signature.to_string()).into());
        }
        debug!(txn = header_signature, is_valid, "set_transaction_execution_result");
        inner
            .results
            .insert(header_signature.to_string(), (is_valid, context_id));
        if is_valid {
            if let Some(ctx) = context_id {
                inner.successful_contexts.push(ctx);
            }
        } else {
            inner.current_batch_all_valid = false;
        }
        inner.in_flight = None;
        inner.pending_info = None;
        inner.current_batch_remaining = inner.current_batch_remaining.saturating_sub(1);

        if inner.current_batch_remaining == 0 {
            let all_valid = inner.current_batch_all_valid;
            let contexts = std::mem::take(&mut inner.successful_contexts);
            let result = if all_valid {
                let new_root = self.shared.squash.squash(&contexts)?;
                inner.current_base = new_root.clone();
                BatchExecutionResult {
                    is_valid: true,
                    state_hash: Some(new_root),
                }
            } else {
                BatchExecutionResult {
                    is_valid: false,
                    state_hash: None,
                }
            };
            debug!(
                batch = batch_sig.as_str(),
                is_valid = result.is_valid,
                "batch boundary"
            );
            inner.batch_results.insert(batch_sig, result);
            inner.current_batch_sig = None;
        }

        self.shared.cv.notify_all();
        Ok(())
    }

    /// The result of `batch_sig`, if every one of its transactions has
    /// been resolved. Returns `None` if the batch is unknown or still in
    /// flight; this call never blocks.
    pub fn get_batch_execution_result(&self, batch_sig: &str) -> Option<BatchExecutionResult> {
        let inner = self.shared.inner.lock().unwrap();
        inner.batch_results.get(batch_sig).cloned()
    }

    fn is_complete_locked(inner: &Inner) -> bool {
        inner.finalized && inner.fifo.is_empty() && inner.in_flight.is_none()
    }

    /// True once `finalize` has been called, the queue is drained, and
    /// nothing is in flight. With `block = true`, waits for that condition
    /// instead of sampling it once.
    pub fn complete(&self, block: bool) -> bool {
        let mut inner = self.shared.inner.lock().unwrap();
        if !block {
            return Self::is_complete_locked(&inner);
        }
        while !Self::is_complete_locked(&inner) {
            inner = self.shared.cv.wait(inner).unwrap();
        }
        true
    }

    /// A blocking iterator over dispatched transactions: each call to
    /// `next()` waits until a transaction can be dispatched or the
    /// scheduler is permanently done.
    pub fn iter(&self) -> SchedulerIter {
        SchedulerIter {
            scheduler: self.clone(),
        }
    }
}

pub struct SchedulerIter {
    scheduler: Scheduler,
}

impl Iterator for SchedulerIter {
    type Item = ScheduledTxnInfo;

    /// Two iterators observe the identical sequence of `ScheduledTxnInfo`:
    /// if a transaction is already in flight (dispatched to some other
    /// iterator, its result not yet reported), this returns that same
    /// pending transaction again rather than blocking for a fresh one.
    fn next(&mut self) -> Option<ScheduledTxnInfo> {
        let shared = &self.scheduler.shared;
        let mut inner = shared.inner.lock().unwrap();
        loop {
            if let Some(info) = inner.pending_info.clone() {
                return Some(info);
            }
            if let Some(info) = Scheduler::try_dispatch(&mut inner) {
                return Some(info);
            }
            if Scheduler::is_complete_locked(&inner) {
                return None;
            }
            inner = shared.cv.wait(inner).unwrap();
        }
    }
}
