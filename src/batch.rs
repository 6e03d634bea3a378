//! Module implement [Batch], the per-operation scratchpad.

use std::collections::HashMap;

use crate::{
    alog::Log,
    block::Block,
    node::{KeySlot, Node},
    wire::{self, Level, Record},
    Error, Result,
};

/// Scratchpad for one `get`, `put` or iteration. Holds the block
/// cache, a `seq -> Block` map that guarantees every log entry is
/// read and decoded at most once per operation, shared by every key
/// and child reference the operation resolves.
pub struct Batch<'a, L> {
    log: &'a mut L,
    blocks: HashMap<u64, Block>,
}

impl<'a, L> Batch<'a, L>
where
    L: Log,
{
    pub fn new(log: &'a mut L) -> Batch<'a, L> {
        Batch { log, blocks: HashMap::new() }
    }

    // Fetch block `seq` through the cache.
    pub fn get_block(&mut self, seq: u64) -> Result<&mut Block> {
        if !self.blocks.contains_key(&seq) {
            let data = self.log.get(seq)?;
            let record = Record::from_bytes(&data)?;
            self.blocks.insert(seq, Block::from_record(seq, record));
        }
        match self.blocks.get_mut(&seq) {
            Some(block) => Ok(block),
            None => unreachable!(),
        }
    }

    // Resolve a key reference into its bytes, the key carried by
    // block `seq`.
    pub fn key_bytes(&mut self, seq: u64) -> Result<Vec<u8>> {
        Ok(self.get_block(seq)?.as_key().to_vec())
    }

    // Materialize the tree node at `(seq, offset)`.
    pub fn load_node(&mut self, seq: u64, offset: u64) -> Result<Node> {
        self.get_block(seq)?.to_node(offset)
    }

    // Root of the current snapshot, the node at offset ZERO of the
    // last block's embedded index. None as long as only the header
    // block exists.
    pub fn get_root(&mut self) -> Result<Option<Node>> {
        let n = self.log.len()?;
        if n < 2 {
            return Ok(None);
        }
        Ok(Some(self.load_node(n - 1, 0)?))
    }

    pub fn get(&mut self, key: &[u8]) -> Result<Option<Block>> {
        let mut node = match self.get_root()? {
            Some(node) => node,
            None => return Ok(None),
        };

        loop {
            match node.search(key, self)? {
                Ok(i) => {
                    let seq = node.keys[i].seq;
                    let block = self.get_block(seq)?.clone();
                    break Ok(Some(block));
                }
                Err(_) if node.is_leaf() => break Ok(None),
                Err(i) => node = node.take_child(i, self)?,
            }
        }
    }

    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let seq = self.log.len()?;
        let target = KeySlot::with_bytes(seq, key.to_vec());

        let mut node = match self.get_root()? {
            None => {
                // first key, the tree is a single fresh leaf
                let mut node = Node::new();
                node.insert_key(target, None, self)?;
                node
            }
            Some(mut node) => {
                // walk down to the affected node, moving each child
                // out of its slot; the spine is rewritten regardless
                let mut stack: Vec<(Node, usize)> = vec![];
                let mut pending: Option<(KeySlot, Node)> = None;
                loop {
                    match node.search(key, self)? {
                        Ok(i) => {
                            // existing key, overwrite in place and
                            // rewrite the spine above it
                            node.set_key(i, target);
                            break;
                        }
                        Err(_) if node.is_leaf() => {
                            if !node.insert_key(target, None, self)? {
                                pending = Some(node.split()?);
                            }
                            break;
                        }
                        Err(i) => {
                            node.changed = true;
                            let child = node.take_child(i, self)?;
                            stack.push((node, i));
                            node = child;
                        }
                    }
                }

                // unwind, re-attaching children and propagating splits
                while let Some((mut parent, i)) = stack.pop() {
                    parent.put_child(i, node)?;
                    node = parent;
                    if let Some((median, right)) = pending.take() {
                        if !node.insert_key(median, Some(right), self)? {
                            pending = Some(node.split()?);
                        }
                    }
                }
                match pending.take() {
                    Some((median, right)) => Node::new_root(median, node, right),
                    None => node,
                }
            }
        };

        let mut levels: Vec<Level> = vec![];
        node.build_index(&mut levels, seq)?;

        let record = Record {
            key: key.to_vec(),
            value: Some(value.to_vec()),
            index: wire::to_index_bytes(&levels)?,
        };
        let at = self.log.append(&record.to_bytes()?)?;
        if at != seq {
            return err_at!(Fatal, msg: "append landed at {}, expected {}", at, seq);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "batch_test.rs"]
mod batch_test;
