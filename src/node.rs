//! Module implement the in-memory btree node and its lazy slots.
//!
//! A node materialized from disk starts out with every key and child
//! held by reference, sequence numbers into the log. Slots resolve on
//! first touch, through the operation's [Batch], and stay resolved for
//! the life of the operation. Nodes created by the current mutation
//! hold their children directly.

use std::{cmp::Ordering, convert::TryFrom, result};

use crate::{
    alog::Log,
    batch::Batch,
    wire::{Child, Level},
    Error, Result,
};

/// Maximum number of children per node. A node accumulating
/// `MAX_CHILDREN - 1` keys after an insert is split.
pub const MAX_CHILDREN: usize = 4;

// Lazy reference to the key bytes carried by block `seq`. Resolved on
// first compare and cached.
#[derive(Clone)]
pub struct KeySlot {
    pub seq: u64,
    pub bytes: Option<Vec<u8>>,
}

impl KeySlot {
    pub fn new(seq: u64) -> KeySlot {
        KeySlot { seq, bytes: None }
    }

    pub fn with_bytes(seq: u64, bytes: Vec<u8>) -> KeySlot {
        KeySlot { seq, bytes: Some(bytes) }
    }
}

// Lazy reference to a subtree, either still `(seq, offset)` into some
// block's embedded index, or materialized into an owned node. Nodes
// created by the current mutation are stamped `(0, 0)` and always
// carry the node; they are never read back through `(seq, offset)`.
pub struct ChildSlot {
    pub seq: u64,
    pub offset: u64,
    pub node: Option<Box<Node>>,
}

impl ChildSlot {
    pub fn new(seq: u64, offset: u64) -> ChildSlot {
        ChildSlot { seq, offset, node: None }
    }

    pub fn fresh(node: Node) -> ChildSlot {
        ChildSlot { seq: 0, offset: 0, node: Some(Box::new(node)) }
    }
}

pub struct Node {
    pub keys: Vec<KeySlot>,
    pub children: Vec<ChildSlot>,
    pub changed: bool,
}

impl Node {
    // Fresh empty node, created by the current mutation.
    pub fn new() -> Node {
        Node { keys: vec![], children: vec![], changed: true }
    }

    pub fn from_level(level: &Level) -> Node {
        let keys = level.keys.iter().map(|seq| KeySlot::new(*seq)).collect();
        let children = level
            .children
            .iter()
            .map(|child| ChildSlot::new(child.seq, child.offset))
            .collect();
        Node { keys, children, changed: false }
    }

    // Grow a new root after the old root split into `left` and `right`.
    pub fn new_root(median: KeySlot, left: Node, right: Node) -> Node {
        Node {
            keys: vec![median],
            children: vec![ChildSlot::fresh(left), ChildSlot::fresh(right)],
            changed: true,
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    // Resolve the i-th key into its bytes, caching them in the slot.
    pub fn as_key<L>(&mut self, i: usize, batch: &mut Batch<L>) -> Result<&[u8]>
    where
        L: Log,
    {
        let slot = match self.keys.get_mut(i) {
            Some(slot) => slot,
            None => return err_at!(Fatal, msg: "key {} out of range", i),
        };
        if slot.bytes.is_none() {
            slot.bytes = Some(batch.key_bytes(slot.seq)?);
        }
        match &slot.bytes {
            Some(bytes) => Ok(bytes),
            None => unreachable!(),
        }
    }

    // Binary search for `key`, resolving only the keys the probe
    // touches. Ok(i) hits an equal key, Err(i) is the insert position.
    pub fn search<L>(
        &mut self,
        key: &[u8],
        batch: &mut Batch<L>,
    ) -> Result<result::Result<usize, usize>>
    where
        L: Log,
    {
        let (mut lo, mut hi) = (0, self.keys.len());
        while lo < hi {
            let mid = (lo + hi) / 2;
            match self.as_key(mid, batch)?.cmp(key) {
                Ordering::Equal => return Ok(Ok(mid)),
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
            }
        }
        Ok(Err(lo))
    }

    // Replace the key at position `i`. Caller makes sure the
    // replacement compares equal to the old key.
    pub fn set_key(&mut self, i: usize, slot: KeySlot) {
        self.keys[i] = slot;
        self.changed = true;
    }

    // Splice `slot` into the node, and `right` as its right sibling
    // subtree when supplied. An equal key is overwritten in place.
    // Return whether the node can stay as is, false means the caller
    // must split it.
    pub fn insert_key<L>(
        &mut self,
        mut slot: KeySlot,
        right: Option<Node>,
        batch: &mut Batch<L>,
    ) -> Result<bool>
    where
        L: Log,
    {
        self.changed = true;

        let key = match &slot.bytes {
            Some(bytes) => bytes.clone(),
            None => {
                let bytes = batch.key_bytes(slot.seq)?;
                slot.bytes = Some(bytes.clone());
                bytes
            }
        };

        match self.search(&key, batch)? {
            Ok(i) => {
                self.keys[i] = slot;
                Ok(true)
            }
            Err(i) => {
                self.keys.insert(i, slot);
                if let Some(right) = right {
                    self.children.insert(i + 1, ChildSlot::fresh(right));
                }
                Ok(self.keys.len() < MAX_CHILDREN - 1)
            }
        }
    }

    // Resolve the i-th child and move it out of its slot, the caller
    // hands it back via `put_child` while unwinding.
    pub fn take_child<L>(&mut self, i: usize, batch: &mut Batch<L>) -> Result<Node>
    where
        L: Log,
    {
        let (seq, offset) = match self.children.get_mut(i) {
            Some(slot) => match slot.node.take() {
                Some(node) => return Ok(*node),
                None => (slot.seq, slot.offset),
            },
            None => {
                let n = self.children.len();
                return err_at!(Fatal, msg: "child {} out of range {}", i, n);
            }
        };
        batch.load_node(seq, offset)
    }

    pub fn put_child(&mut self, i: usize, node: Node) -> Result<()> {
        match self.children.get_mut(i) {
            Some(slot) => {
                slot.node = Some(Box::new(node));
                Ok(())
            }
            None => err_at!(Fatal, msg: "child {} out of range {}", i, self.children.len()),
        }
    }

    // Split a full node in two. Self keeps the low half, the median
    // key moves up to the parent, the returned node takes the high
    // half.
    pub fn split(&mut self) -> Result<(KeySlot, Node)> {
        if self.keys.len() < MAX_CHILDREN - 1 {
            return err_at!(Fatal, msg: "split on node with {} keys", self.keys.len());
        }
        self.changed = true;

        let h = self.keys.len() / 2;
        let keys = self.keys.split_off(self.keys.len() - h);
        let median = match self.keys.pop() {
            Some(slot) => slot,
            None => return err_at!(Fatal, msg: "split emptied the node"),
        };
        let children = match self.children.len() {
            0 => vec![],
            n if n < h + 2 => {
                return err_at!(Fatal, msg: "split on node with {} children", n)
            }
            n => self.children.split_off(n - (h + 1)),
        };

        Ok((median, Node { keys, children, changed: true }))
    }

    // Serialize the changed spine of this subtree into `levels`,
    // post-order, reserving offset slots parent-first so that the
    // overall root lands at offset ZERO. Children that did not change
    // keep their existing `(seq, offset)` reference, changed children
    // are stamped with `new_seq`, the sequence number the containing
    // block is about to be appended at.
    pub fn build_index(&mut self, levels: &mut Vec<Level>, new_seq: u64) -> Result<u64> {
        let off = levels.len();
        levels.push(Level::default());

        let keys: Vec<u64> = self.keys.iter().map(|slot| slot.seq).collect();
        let mut children = Vec::with_capacity(self.children.len());
        for slot in self.children.iter_mut() {
            let child = match slot.node.as_deref_mut() {
                Some(node) if node.changed => {
                    let offset = node.build_index(levels, new_seq)?;
                    Child { seq: new_seq, offset }
                }
                _ => Child { seq: slot.seq, offset: slot.offset },
            };
            children.push(child);
        }

        levels[off] = Level { keys, children };
        err_at!(FailConvert, u64::try_from(off))
    }
}

#[cfg(test)]
#[path = "node_test.rs"]
mod node_test;
