// The context manager creates and commits state-modification contexts
// against a backing key-value state. A context is a tentative overlay: it
// can be built atop a committed state root, atop other not-yet-committed
// contexts (so a batch's transactions can chain off one another before any
// of them are promoted), or both. Committing a list of contexts applies
// their writes in order atop their shared base and either promotes the
// result to the canonical table (`virtual=false`) or merely reports the
// hash it would produce (`virtual=true`).
//
// The manager is otherwise a black box to its callers: it does not know
// about transactions, batches, or the scheduler, only about state_hash
// strings, context ids, and address/value writes.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};
use tracing::debug;

use sched_base::Result;

use crate::error::ContextError;

pub type ContextId = u64;
pub type Address = String;
pub type Snapshot = BTreeMap<Address, Vec<u8>>;

struct ContextRecord {
    base_state_hash: String,
    base_contexts: Vec<ContextId>,
    inputs: Vec<String>,
    outputs: Vec<String>,
    writes: BTreeMap<Address, Vec<u8>>,
}

struct Inner {
    roots: HashMap<String, Snapshot>,
    contexts: HashMap<ContextId, ContextRecord>,
    next_id: ContextId,
}

fn hash_snapshot(snapshot: &Snapshot) -> String {
    let mut hasher = Sha256::new();
    for (addr, value) in snapshot {
        hasher.update(addr.as_bytes());
        hasher.update([0u8]);
        hasher.update(value);
        hasher.update([0u8]);
    }
    sched_base::encode(&hasher.finalize())
}

#[derive(Clone)]
pub struct ContextManager {
    inner: Arc<Mutex<Inner>>,
}

impl Default for ContextManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextManager {
    pub fn new() -> Self {
        let first_root = hash_snapshot(&Snapshot::new());
        let mut roots = HashMap::new();
        roots.insert(first_root, Snapshot::new());
        ContextManager {
            inner: Arc::new(Mutex::new(Inner {
                roots,
                contexts: HashMap::new(),
                next_id: 0,
            })),
        }
    }

    pub fn get_first_root(&self) -> String {
        hash_snapshot(&Snapshot::new())
    }

    pub fn create_context(
        &self,
        state_hash: &str,
        inputs: Vec<String>,
        outputs: Vec<String>,
        base_contexts: Vec<ContextId>,
    ) -> Result<ContextId> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.roots.contains_key(state_hash) {
            return Err(ContextError::UnknownStateRoot(state_hash.to_string()).into());
        }
        for base in &base_contexts {
            if !inner.contexts.contains_key(base) {
                return Err(ContextError::UnknownContext(*base).into());
            }
        }
        let id = inner.next_id;
        inner.next_id += 1;
        debug!(context_id = id, state_hash, "create_context");
        inner.contexts.insert(
            id,
            ContextRecord {
                base_state_hash: state_hash.to_string(),
                base_contexts,
                inputs,
                outputs,
                writes: BTreeMap::new(),
            },
        );
        Ok(id)
    }

    pub fn set(&self, context_id: ContextId, writes: Vec<(Address, Vec<u8>)>) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let ctx = inner
            .contexts
            .get_mut(&context_id)
            .ok_or(ContextError::UnknownContext(context_id))?;
        for (addr, _) in &writes {
            if !ctx.outputs.iter().any(|o| o == addr) {
                return Err(ContextError::WriteOutsideOutputs {
                    context: context_id,
                    addr: addr.clone(),
                }
                .into());
            }
        }
        for (addr, value) in writes {
            ctx.writes.insert(addr, value);
        }
        Ok(())
    }

    /// Reads `addr` as seen through `context_id`: its own tentative writes
    /// first, then its base contexts (most recently listed first), then the
    /// snapshot at its base state hash.
    pub fn get(&self, context_id: ContextId, addr: &str) -> Result<Option<Vec<u8>>> {
        let inner = self.inner.lock().unwrap();
        Self::get_locked(&inner, context_id, addr)
    }

    fn get_locked(inner: &Inner, context_id: ContextId, addr: &str) -> Result<Option<Vec<u8>>> {
        let ctx = inner
            .contexts
            .get(&context_id)
            .ok_or(ContextError::UnknownContext(context_id))?;
        if let Some(v) = ctx.writes.get(addr) {
            return Ok(Some(v.clone()));
        }
        for base in ctx.base_contexts.iter().rev() {
            if let Some(v) = Self::get_locked(inner, *base, addr)? {
                return Ok(Some(v));
            }
        }
        Ok(inner
            .roots
            .get(&ctx.base_state_hash)
            .and_then(|snap| snap.get(addr))
            .cloned())
    }

    /// Finalizes the listed contexts in order, atop the first context's
    /// base state, producing a post-state hash. `virtual=true` computes the
    /// hash without persisting; `virtual=false` additionally promotes the
    /// result into the backing table.
    pub fn commit_context(&self, context_ids: &[ContextId], virtual_: bool) -> Result<String> {
        let mut inner = self.inner.lock().unwrap();
        if context_ids.is_empty() {
            return Ok(hash_snapshot(&Snapshot::new()));
        }
        let base_hash = inner
            .contexts
            .get(&context_ids[0])
            .ok_or(ContextError::UnknownContext(context_ids[0]))?
            .base_state_hash
            .clone();
        let mut snapshot = inner
            .roots
            .get(&base_hash)
            .cloned()
            .ok_or_else(|| ContextError::UnknownStateRoot(base_hash.clone()))?;
        for cid in context_ids {
            let ctx = inner
                .contexts
                .get(cid)
                .ok_or(ContextError::UnknownContext(*cid))?;
            for (addr, value) in &ctx.writes {
                snapshot.insert(addr.clone(), value.clone());
            }
        }
        let new_root = hash_snapshot(&snapshot);
        if !virtual_ {
            inner.roots.insert(new_root.clone(), snapshot);
            for cid in context_ids {
                inner.contexts.remove(cid);
            }
            debug!(new_root, "commit_context promoted");
        } else {
            debug!(new_root, "commit_context virtual");
        }
        Ok(new_root)
    }

    pub fn get_squash_handler(&self) -> SquashHandler {
        SquashHandler {
            manager: self.clone(),
        }
    }
}

/// An opaque handle the scheduler invokes at batch boundaries to collapse a
/// list of successful contexts into a single post-state hash. Equivalent to
/// `ContextManager::commit_context(.., virtual=false)`.
#[derive(Clone)]
pub struct SquashHandler {
    manager: ContextManager,
}

impl SquashHandler {
    pub fn squash(&self, context_ids: &[ContextId]) -> Result<String> {
        self.manager.commit_context(context_ids, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn first_root_is_stable_and_known() {
        let mgr = ContextManager::new();
        let root = mgr.get_first_root();
        let ctx = mgr
            .create_context(&root, vec!["a".into()], vec!["a".into()], vec![])
            .unwrap();
        assert_eq!(mgr.get(ctx, "a").unwrap(), None);
    }

    #[test_log::test]
    fn set_and_commit_changes_the_root() {
        let mgr = ContextManager::new();
        let root = mgr.get_first_root();
        let ctx = mgr
            .create_context(&root, vec!["a".into()], vec!["a".into()], vec![])
            .unwrap();
        mgr.set(ctx, vec![("a".into(), b"1".to_vec())]).unwrap();
        let new_root = mgr.commit_context(&[ctx], false).unwrap();
        assert_ne!(new_root, root);

        let ctx2 = mgr
            .create_context(&new_root, vec!["a".into()], vec!["a".into()], vec![])
            .unwrap();
        assert_eq!(mgr.get(ctx2, "a").unwrap(), Some(b"1".to_vec()));
    }

    #[test_log::test]
    fn virtual_commit_does_not_persist() {
        let mgr = ContextManager::new();
        let root = mgr.get_first_root();
        let ctx = mgr
            .create_context(&root, vec!["a".into()], vec!["a".into()], vec![])
            .unwrap();
        mgr.set(ctx, vec![("a".into(), b"1".to_vec())]).unwrap();
        let virt_root = mgr.commit_context(&[ctx], true).unwrap();
        assert_ne!(virt_root, root);
        // The context survives a virtual commit (only real commits retire it).
        assert!(mgr
            .create_context(&virt_root, vec![], vec![], vec![])
            .is_err());
    }

    #[test_log::test]
    fn write_outside_outputs_is_rejected() {
        let mgr = ContextManager::new();
        let root = mgr.get_first_root();
        let ctx = mgr
            .create_context(&root, vec!["a".into()], vec!["a".into()], vec![])
            .unwrap();
        assert!(mgr.set(ctx, vec![("b".into(), b"1".to_vec())]).is_err());
    }

    #[test_log::test]
    fn chained_contexts_within_a_batch_see_each_others_writes() {
        let mgr = ContextManager::new();
        let root = mgr.get_first_root();
        let ctx1 = mgr
            .create_context(&root, vec!["a".into()], vec!["a".into()], vec![])
            .unwrap();
        mgr.set(ctx1, vec![("a".into(), b"1".to_vec())]).unwrap();

        let ctx2 = mgr
            .create_context(&root, vec!["a".into()], vec!["a".into()], vec![ctx1])
            .unwrap();
        assert_eq!(mgr.get(ctx2, "a").unwrap(), Some(b"1".to_vec()));

        let squash = mgr.get_squash_handler();
        let new_root = squash.squash(&[ctx1, ctx2]).unwrap();
        assert_ne!(new_root, root);
    }
}
