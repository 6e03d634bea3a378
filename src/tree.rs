//! Module implement [Tree], the index facade over a [Log].

use lazy_static::lazy_static;
use log::debug;

use crate::{alog::Log, batch::Batch, block::Block, scan::Iter, Error, Result};

lazy_static! {
    /// Payload of the header block at seq ZERO. Only its existence is
    /// significant, the bytes themselves are never interpreted.
    pub static ref HEADER_BLOCK: Vec<u8> = {
        let marker = "cowbt/header/v1";
        marker.as_bytes().to_vec()
    };
}

/// Ordered key-value index embedded in an append-only block log.
///
/// Keys and values are byte strings, keys ordered lexicographically.
/// Writes must be serialized by the application, the index assumes a
/// single writer.
pub struct Tree<L> {
    log: L,
}

impl<L> Tree<L>
where
    L: Log,
{
    /// Open an index over `log`, appending the header block when the
    /// log is still empty.
    pub fn open(log: L) -> Result<Tree<L>> {
        let mut tree = Tree { log };
        tree.ready()?;
        Ok(tree)
    }

    /// Make sure the log is ready and carries the header block.
    /// Idempotent.
    pub fn ready(&mut self) -> Result<()> {
        self.log.ready()?;
        if self.log.len()? == 0 {
            let seq = self.log.append(&HEADER_BLOCK)?;
            if seq != 0 {
                return err_at!(Fatal, msg: "header block landed at {}", seq);
            }
            debug!("appended header block to empty log");
        }
        Ok(())
    }

    /// Lookup `key`. Return the block carrying its latest value, None
    /// when the key was never put.
    pub fn get(&mut self, key: &[u8]) -> Result<Option<Block>> {
        Batch::new(&mut self.log).get(key)
    }

    /// Insert or overwrite `key`. Exactly one block is appended to
    /// the log, carrying `{key, value}` and the changed tree spine.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        Batch::new(&mut self.log).put(key, value)
    }

    /// In-order iteration over the snapshot that is current now.
    /// Items are the blocks carrying each live key's latest value.
    pub fn iter(&mut self) -> Result<Iter<L>> {
        Iter::new(&mut self.log)
    }

    pub fn as_log(&self) -> &L {
        &self.log
    }

    pub fn into_log(self) -> L {
        self.log
    }
}

#[cfg(test)]
#[path = "tree_test.rs"]
mod tree_test;
