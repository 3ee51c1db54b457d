use sched_state::ContextId;
use sched_wire::Transaction;

/// What the scheduler hands to an executor for one dispatched transaction:
/// the transaction itself, the state hash its context should be created
/// against, and the contexts (if any) it should chain off.
#[derive(Clone, Debug)]
pub struct ScheduledTxnInfo {
    pub txn: Transaction,
    pub state_hash: String,
    pub base_context_ids: Vec<ContextId>,
}

/// The outcome of a batch once every one of its transactions has a result:
/// either it squashed cleanly into a new state root, or it was discarded
/// (any invalid transaction fails the whole batch) and `state_hash` is
/// `None`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BatchExecutionResult {
    pub is_valid: bool,
    pub state_hash: Option<String>,
}
