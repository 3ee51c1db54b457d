// The facade a consumer actually links against: a single `SchedulingCore`
// that owns the context manager feeding the serial scheduler's squash
// handler, plus the fork rule and consensus shim a block-completion path
// needs. The predecessor tree is exposed separately -- it's the parallel-
// scheduling conflict index, not on the serial scheduler's hot path (see
// `sched-tree`).

pub use sched_base::{Error, Result};
pub use sched_consensus::{compare_forks, BlockHeader, ConsensusShim};
pub use sched_core::{BatchExecutionResult, Scheduler, SchedulerError, SchedulerIter, ScheduledTxnInfo};
pub use sched_state::{Address, ContextError, ContextId, ContextManager, Snapshot, SquashHandler};
pub use sched_tree::{tokenize, PredecessorTree, TreeNode};
pub use sched_wire::{
    create_batch, create_transaction, fixture_address, generate_keypair, sha512_hex, sign, Batch,
    BatchHeader, PrivateKey, PublicKey, Transaction, TransactionHeader,
};

/// Bundles a context manager with the serial scheduler it squashes batches
/// into. This is the minimum a block-production or block-validation path
/// needs to drain a queue of batches against one state lineage.
pub struct SchedulingCore {
    pub context_manager: ContextManager,
    pub scheduler: Scheduler,
    pub consensus: ConsensusShim,
}

impl SchedulingCore {
    pub fn new() -> Self {
        let context_manager = ContextManager::new();
        let first_root = context_manager.get_first_root();
        let scheduler = Scheduler::new(context_manager.get_squash_handler(), first_root);
        SchedulingCore {
            context_manager,
            scheduler,
            consensus: ConsensusShim,
        }
    }
}

impl Default for SchedulingCore {
    fn default() -> Self {
        Self::new()
    }
}
