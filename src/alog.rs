//! Module define the append-only log contract consumed by the btree.

use std::convert::TryFrom;

use crate::{Error, Result};
#[allow(unused_imports)]
use crate::{Journal, Tree};

/// Contract for the underlying append-only block store.
///
/// Blocks are opaque byte strings addressed by their sequence number,
/// assigned in append order starting from ZERO. Appended blocks are
/// immutable, `len` is monotonically non-decreasing, and a reader that
/// captured `len` can keep reading blocks below it while a writer
/// appends. [Tree] consumes this contract and never mutates the store
/// through any other path.
pub trait Log {
    /// Prepare the log for reads and appends. Until ready returns
    /// success `len` may not be readable. Idempotent.
    fn ready(&mut self) -> Result<()>;

    /// Number of blocks appended so far.
    fn len(&self) -> Result<u64>;

    /// Read back block `seq`. Reading at or beyond `len` fails.
    fn get(&mut self, seq: u64) -> Result<Vec<u8>>;

    /// Append one block and return its assigned sequence number,
    /// which is the log's length before the append.
    fn append(&mut self, block: &[u8]) -> Result<u64>;
}

/// Heap backed [Log] implementation. Handy for tests and for
/// ephemeral indexes, [Journal] is the durable variant.
#[derive(Clone, Default)]
pub struct MemLog {
    blocks: Vec<Vec<u8>>,
}

impl MemLog {
    pub fn new() -> MemLog {
        MemLog { blocks: Vec::default() }
    }

    /// Drop every block at `seq >= len`, simulating a log that lost
    /// its tail in a crash.
    pub fn truncate(&mut self, len: u64) -> Result<()> {
        let len = err_at!(FailConvert, usize::try_from(len))?;
        self.blocks.truncate(len);
        Ok(())
    }
}

impl Log for MemLog {
    fn ready(&mut self) -> Result<()> {
        Ok(())
    }

    fn len(&self) -> Result<u64> {
        err_at!(FailConvert, u64::try_from(self.blocks.len()))
    }

    fn get(&mut self, seq: u64) -> Result<Vec<u8>> {
        let off = err_at!(FailConvert, usize::try_from(seq))?;
        match self.blocks.get(off) {
            Some(block) => Ok(block.clone()),
            None => err_at!(IOError, msg: "missing block {}/{}", seq, self.blocks.len()),
        }
    }

    fn append(&mut self, block: &[u8]) -> Result<u64> {
        let seq = err_at!(FailConvert, u64::try_from(self.blocks.len()))?;
        self.blocks.push(block.to_vec());
        Ok(seq)
    }
}

#[cfg(test)]
#[path = "alog_test.rs"]
mod alog_test;
