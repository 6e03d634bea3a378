//! Module implement [Block], one decoded entry from the log.

use std::convert::TryFrom;

use crate::{
    node::Node,
    wire::{self, Level, Record},
    Error, Result,
};

/// One decoded log entry. This is also the item returned by lookups
/// and iteration, the full record whose key matched.
///
/// The embedded index travels as an opaque blob and is inflated into
/// its levels on the first tree-node access, after which the raw bytes
/// are dropped. A block caches its own `key`, so key references into
/// the block resolve without another log read.
#[derive(Clone)]
pub struct Block {
    seq: u64,
    key: Vec<u8>,
    value: Option<Vec<u8>>,
    index: Index,
}

#[derive(Clone)]
enum Index {
    Blob(Vec<u8>),
    Levels(Vec<Level>),
}

impl Block {
    pub(crate) fn from_record(seq: u64, record: Record) -> Block {
        Block {
            seq,
            key: record.key,
            value: record.value,
            index: Index::Blob(record.index),
        }
    }

    /// Return the sequence number at which this block was appended.
    #[inline]
    pub fn to_seq(&self) -> u64 {
        self.seq
    }

    /// Return the key carried by this block.
    #[inline]
    pub fn as_key(&self) -> &[u8] {
        &self.key
    }

    /// Return the value carried by this block, if any.
    #[inline]
    pub fn as_value(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }

    // Materialize the tree node at `offset` of this block's embedded
    // index. Every call hands out a fresh node view.
    pub(crate) fn to_node(&mut self, offset: u64) -> Result<Node> {
        self.inflate()?;

        let levels = match &self.index {
            Index::Levels(levels) => levels,
            Index::Blob(_) => unreachable!(),
        };
        let off = err_at!(FailConvert, usize::try_from(offset))?;
        let level = match levels.get(off) {
            Some(level) => level,
            None => {
                let (n, m) = (offset, levels.len());
                return err_at!(Corrupt, msg: "node offset {} out of range {}", n, m);
            }
        };
        if !level.children.is_empty() && level.children.len() != level.keys.len() + 1 {
            let (n, m) = (level.keys.len(), level.children.len());
            return err_at!(Corrupt, msg: "node with {} keys, {} children", n, m);
        }

        Ok(Node::from_level(level))
    }

    fn inflate(&mut self) -> Result<()> {
        if let Index::Blob(data) = &self.index {
            self.index = Index::Levels(wire::from_index_bytes(data)?);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "block_test.rs"]
mod block_test;
