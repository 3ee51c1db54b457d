// The predecessor tree is a radix index, keyed by tokenized hex addresses,
// over the readers and writers that have touched each address. It answers,
// for any address a new reader or writer shows up at, the set of prior
// operations it must be ordered after to avoid a conflict.
//
// Nodes own their children directly (no back-pointers, no arena): every
// query starts at the root and walks down, so there's never a need to walk
// up. `set_writer` prunes the subtree below the node it writes to -- a
// writer at a prefix invalidates all finer-grained activity below it, and
// the pruned nodes genuinely stop existing (not just become invisible).

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::token::tokenize;

#[derive(Debug, Clone)]
pub struct TreeNode<Id> {
    readers: Vec<Id>,
    writer: Option<Id>,
    children: BTreeMap<String, TreeNode<Id>>,
}

impl<Id> Default for TreeNode<Id> {
    fn default() -> Self {
        TreeNode {
            readers: Vec::new(),
            writer: None,
            children: BTreeMap::new(),
        }
    }
}

impl<Id: Clone + Ord> TreeNode<Id> {
    pub fn readers(&self) -> &[Id] {
        &self.readers
    }

    pub fn writer(&self) -> Option<&Id> {
        self.writer.as_ref()
    }

    pub fn child_tokens(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    fn collect_writers(&self, out: &mut BTreeSet<Id>) {
        if let Some(w) = &self.writer {
            out.insert(w.clone());
        }
        for child in self.children.values() {
            child.collect_writers(out);
        }
    }

    fn collect_readers_and_writers(&self, out: &mut BTreeSet<Id>) {
        out.extend(self.readers.iter().cloned());
        if let Some(w) = &self.writer {
            out.insert(w.clone());
        }
        for child in self.children.values() {
            child.collect_readers_and_writers(out);
        }
    }
}

/// Prefix-indexed tree of reader/writer sets over tokenized addresses.
///
/// Not internally synchronized: single-thread-owned by its caller, same as
/// any other plain data structure. It exists to answer predecessor queries
/// for parallel scheduling variants and for conflict reasoning in tests; the
/// serial scheduler's hot path doesn't touch it.
#[derive(Debug, Clone)]
pub struct PredecessorTree<Id> {
    token_size: usize,
    root: TreeNode<Id>,
}

impl<Id: Clone + Ord> PredecessorTree<Id> {
    pub fn new(token_size: usize) -> Self {
        PredecessorTree {
            token_size,
            root: TreeNode::default(),
        }
    }

    fn walk_mut(&mut self, addr: &str) -> &mut TreeNode<Id> {
        let mut node = &mut self.root;
        for tok in tokenize(addr, self.token_size) {
            node = node
                .children
                .entry(tok.to_string())
                .or_insert_with(TreeNode::default);
        }
        node
    }

    /// Appends `id` to the readers at `addr`, creating any missing nodes
    /// along the way. Not idempotent: adding the same id twice records it
    /// twice (count assertions in tests depend on this; predecessor queries
    /// fold readers into a set regardless).
    pub fn add_reader(&mut self, addr: &str, id: Id) {
        self.walk_mut(addr).readers.push(id);
    }

    /// Sets the writer at `addr`, creating any missing nodes along the way,
    /// and prunes every descendant of that node: a writer at a prefix
    /// invalidates all finer-grained activity below it.
    pub fn set_writer(&mut self, addr: &str, id: Id) {
        let node = self.walk_mut(addr);
        node.writer = Some(id);
        node.children.clear();
    }

    pub fn get(&self, addr: &str) -> Option<&TreeNode<Id>> {
        let mut node = &self.root;
        for tok in tokenize(addr, self.token_size) {
            node = node.children.get(tok)?;
        }
        Some(node)
    }

    /// Walks from the root toward `addr`, returning the strict ancestors of
    /// the node at `addr` (root first) and, if every token resolved, the
    /// node itself. If `addr` is absent the walk stops at the deepest
    /// existing ancestor and the node half of the result is `None` -- the
    /// missing tail is treated as a fresh, empty node.
    fn ancestors_and_node(&self, addr: &str) -> (Vec<&TreeNode<Id>>, Option<&TreeNode<Id>>) {
        let mut ancestors = Vec::new();
        let mut node = &self.root;
        for tok in tokenize(addr, self.token_size) {
            ancestors.push(node);
            match node.children.get(tok) {
                Some(child) => node = child,
                None => return (ancestors, None),
            }
        }
        (ancestors, Some(node))
    }

    /// The set of ids that must precede a *read* at `addr`: every writer on
    /// the path from the root to `addr` (inclusive), plus every writer in
    /// the subtree rooted at `addr`.
    pub fn find_read_predecessors(&self, addr: &str) -> BTreeSet<Id> {
        let (ancestors, node) = self.ancestors_and_node(addr);
        let mut out = BTreeSet::new();
        for a in ancestors {
            if let Some(w) = &a.writer {
                out.insert(w.clone());
            }
        }
        if let Some(n) = node {
            n.collect_writers(&mut out);
        }
        out
    }

    /// The set of ids that must precede a *write* at `addr`: every reader
    /// and writer on the path from the root to `addr` (inclusive), plus
    /// every reader and writer in the subtree rooted at `addr`.
    pub fn find_write_predecessors(&self, addr: &str) -> BTreeSet<Id> {
        let (ancestors, node) = self.ancestors_and_node(addr);
        let mut out = BTreeSet::new();
        for a in ancestors {
            out.extend(a.readers.iter().cloned());
            if let Some(w) = &a.writer {
                out.insert(w.clone());
            }
        }
        if let Some(n) = node {
            n.collect_readers_and_writers(&mut out);
        }
        out
    }
}
