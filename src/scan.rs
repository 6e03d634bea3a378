//! Module implement in-order iteration over the index.

use crate::{alog::Log, batch::Batch, block::Block, node::Node, Result};

// One in-flight node during iteration. The counter `i` interleaves
// children and keys, child0 key0 child1 key1 .. childK, by parity:
// even counts descend into child `i >> 1`, odd counts emit key
// `i >> 1`. The frame is done once `i >> 1` passes the last key.
struct Frame {
    node: Node,
    i: usize,
}

/// Lazy in-order iterator over every live key, yielding the block
/// that carries the key's latest value. The iterator owns its batch,
/// so it walks the snapshot that was current when it was created and
/// reads every log entry at most once. An error aborts iteration.
pub struct Iter<'a, L> {
    batch: Batch<'a, L>,
    stack: Vec<Frame>,
}

impl<'a, L> Iter<'a, L>
where
    L: Log,
{
    pub(crate) fn new(log: &'a mut L) -> Result<Iter<'a, L>> {
        let mut batch = Batch::new(log);
        let stack = match batch.get_root()? {
            Some(node) => vec![Frame { node, i: 0 }],
            None => vec![],
        };
        Ok(Iter { batch, stack })
    }

    fn step(&mut self) -> Result<Option<Block>> {
        loop {
            let frame = match self.stack.last_mut() {
                Some(frame) => frame,
                None => return Ok(None),
            };
            let at = frame.i >> 1;

            if frame.i & 1 == 1 {
                if at >= frame.node.keys.len() {
                    self.stack.pop();
                    continue;
                }
                frame.i += 1;
                let seq = frame.node.keys[at].seq;
                let block = self.batch.get_block(seq)?.clone();
                return Ok(Some(block));
            }

            frame.i += 1;
            if !frame.node.is_leaf() {
                if at >= frame.node.children.len() {
                    self.stack.pop();
                    continue;
                }
                let child = frame.node.take_child(at, &mut self.batch)?;
                self.stack.push(Frame { node: child, i: 0 });
            }
        }
    }
}

impl<'a, L> Iterator for Iter<'a, L>
where
    L: Log,
{
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.step() {
            Ok(Some(block)) => Some(Ok(block)),
            Ok(None) => None,
            Err(err) => {
                self.stack.drain(..);
                Some(Err(err))
            }
        }
    }
}
