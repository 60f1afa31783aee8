//! This module contains nesting layout information: block order within a
//! region and operation order within a block, together with the parent
//! back-references derived from that order.
use cranelift_entity::SecondaryMap;

use super::{BlockId, OpId, RegionId};

#[derive(Debug, Clone, Default)]
pub struct Layout {
    regions: SecondaryMap<RegionId, RegionNode>,
    blocks: SecondaryMap<BlockId, BlockNode>,
    ops: SecondaryMap<OpId, OpNode>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry_block(&self, region: RegionId) -> Option<BlockId> {
        self.regions[region].first_block
    }

    pub fn last_block(&self, region: RegionId) -> Option<BlockId> {
        self.regions[region].last_block
    }

    pub fn is_region_empty(&self, region: RegionId) -> bool {
        self.entry_block(region).is_none()
    }

    /// Returns `true` if `region` contains exactly one block.
    pub fn has_one_block(&self, region: RegionId) -> bool {
        let node = &self.regions[region];
        node.first_block.is_some() && node.first_block == node.last_block
    }

    pub fn num_blocks(&self, region: RegionId) -> usize {
        self.iter_block(region).count()
    }

    pub fn block_region(&self, block: BlockId) -> Option<RegionId> {
        self.blocks[block].region
    }

    pub fn is_block_inserted(&self, block: BlockId) -> bool {
        self.blocks[block].region.is_some()
    }

    pub fn prev_block_of(&self, block: BlockId) -> Option<BlockId> {
        debug_assert!(self.is_block_inserted(block));
        self.blocks[block].prev
    }

    pub fn next_block_of(&self, block: BlockId) -> Option<BlockId> {
        debug_assert!(self.is_block_inserted(block));
        self.blocks[block].next
    }

    pub fn first_op_of(&self, block: BlockId) -> Option<OpId> {
        self.blocks[block].first_op
    }

    pub fn last_op_of(&self, block: BlockId) -> Option<OpId> {
        self.blocks[block].last_op
    }

    pub fn is_block_empty(&self, block: BlockId) -> bool {
        self.first_op_of(block).is_none()
    }

    pub fn prev_op_of(&self, op: OpId) -> Option<OpId> {
        debug_assert!(self.is_op_inserted(op));
        self.ops[op].prev
    }

    pub fn next_op_of(&self, op: OpId) -> Option<OpId> {
        debug_assert!(self.is_op_inserted(op));
        self.ops[op].next
    }

    pub fn op_block(&self, op: OpId) -> Option<BlockId> {
        self.ops[op].block
    }

    pub fn is_op_inserted(&self, op: OpId) -> bool {
        self.ops[op].block.is_some()
    }

    pub fn iter_block(&self, region: RegionId) -> impl Iterator<Item = BlockId> + '_ {
        BlockIter {
            next: self.regions[region].first_block,
            blocks: &self.blocks,
        }
    }

    pub fn iter_op(&self, block: BlockId) -> impl Iterator<Item = OpId> + '_ {
        OpIter {
            next: self.blocks[block].first_op,
            ops: &self.ops,
        }
    }

    pub fn append_block(&mut self, block: BlockId, region: RegionId) {
        debug_assert!(!self.is_block_inserted(block));

        let mut block_node = BlockNode::with_region(region);
        let region_node = &mut self.regions[region];

        if let Some(last_block) = region_node.last_block {
            self.blocks[last_block].next = Some(block);
            block_node.prev = Some(last_block);
        } else {
            region_node.first_block = Some(block);
        }

        region_node.last_block = Some(block);
        self.blocks[block].relink(block_node);
    }

    pub fn insert_block_before(&mut self, block: BlockId, before: BlockId) {
        debug_assert!(self.is_block_inserted(before));
        debug_assert!(!self.is_block_inserted(block));

        let region = self.blocks[before].region.unwrap();
        let mut block_node = BlockNode::with_region(region);

        match self.blocks[before].prev {
            Some(prev) => {
                block_node.prev = Some(prev);
                self.blocks[prev].next = Some(block);
            }
            None => self.regions[region].first_block = Some(block),
        }

        block_node.next = Some(before);
        self.blocks[before].prev = Some(block);
        self.blocks[block].relink(block_node);
    }

    pub fn insert_block_after(&mut self, block: BlockId, after: BlockId) {
        debug_assert!(self.is_block_inserted(after));
        debug_assert!(!self.is_block_inserted(block));

        let region = self.blocks[after].region.unwrap();
        let mut block_node = BlockNode::with_region(region);

        match self.blocks[after].next {
            Some(next) => {
                block_node.next = Some(next);
                self.blocks[next].prev = Some(block);
            }
            None => self.regions[region].last_block = Some(block),
        }

        block_node.prev = Some(after);
        self.blocks[after].next = Some(block);
        self.blocks[block].relink(block_node);
    }

    /// Detaches `block` from its region. The operations of the block stay in
    /// the block.
    pub fn remove_block(&mut self, block: BlockId) {
        debug_assert!(self.is_block_inserted(block));

        let block_node = &self.blocks[block];
        let region = block_node.region.unwrap();
        match (block_node.prev, block_node.next) {
            (Some(prev), Some(next)) => {
                self.blocks[prev].next = Some(next);
                self.blocks[next].prev = Some(prev);
            }
            (Some(prev), None) => {
                self.blocks[prev].next = None;
                self.regions[region].last_block = Some(prev);
            }
            (None, Some(next)) => {
                self.blocks[next].prev = None;
                self.regions[region].first_block = Some(next);
            }
            (None, None) => {
                self.regions[region].first_block = None;
                self.regions[region].last_block = None;
            }
        }

        self.blocks[block].relink(BlockNode::default());
    }

    pub fn append_op(&mut self, op: OpId, block: BlockId) {
        debug_assert!(!self.is_op_inserted(op));

        let block_node = &mut self.blocks[block];
        let mut op_node = OpNode::with_block(block);

        if let Some(last_op) = block_node.last_op {
            op_node.prev = Some(last_op);
            self.ops[last_op].next = Some(op);
        } else {
            block_node.first_op = Some(op);
        }

        block_node.last_op = Some(op);
        self.ops[op] = op_node;
    }

    pub fn prepend_op(&mut self, op: OpId, block: BlockId) {
        debug_assert!(!self.is_op_inserted(op));

        let block_node = &mut self.blocks[block];
        let mut op_node = OpNode::with_block(block);

        if let Some(first_op) = block_node.first_op {
            op_node.next = Some(first_op);
            self.ops[first_op].prev = Some(op);
        } else {
            block_node.last_op = Some(op);
        }

        block_node.first_op = Some(op);
        self.ops[op] = op_node;
    }

    pub fn insert_op_before(&mut self, op: OpId, before: OpId) {
        debug_assert!(self.is_op_inserted(before));
        debug_assert!(!self.is_op_inserted(op));

        let before_node = &self.ops[before];
        let block = before_node.block.unwrap();
        let mut op_node = OpNode::with_block(block);

        match before_node.prev {
            Some(prev) => {
                op_node.prev = Some(prev);
                self.ops[prev].next = Some(op);
            }
            None => self.blocks[block].first_op = Some(op),
        }
        op_node.next = Some(before);
        self.ops[before].prev = Some(op);
        self.ops[op] = op_node;
    }

    pub fn insert_op_after(&mut self, op: OpId, after: OpId) {
        debug_assert!(self.is_op_inserted(after));
        debug_assert!(!self.is_op_inserted(op));

        let after_node = &self.ops[after];
        let block = after_node.block.unwrap();
        let mut op_node = OpNode::with_block(block);

        match after_node.next {
            Some(next) => {
                op_node.next = Some(next);
                self.ops[next].prev = Some(op);
            }
            None => self.blocks[block].last_op = Some(op),
        }
        op_node.prev = Some(after);
        self.ops[after].next = Some(op);
        self.ops[op] = op_node;
    }

    /// Removes an operation from the layout.
    pub fn remove_op(&mut self, op: OpId) {
        debug_assert!(self.is_op_inserted(op));

        let op_node = &self.ops[op];
        let block_node = &mut self.blocks[op_node.block.unwrap()];
        match (op_node.prev, op_node.next) {
            (Some(prev), Some(next)) => {
                self.ops[prev].next = Some(next);
                self.ops[next].prev = Some(prev);
            }
            (Some(prev), None) => {
                self.ops[prev].next = None;
                block_node.last_op = Some(prev);
            }
            (None, Some(next)) => {
                self.ops[next].prev = None;
                block_node.first_op = Some(next);
            }
            (None, None) => {
                block_node.first_op = None;
                block_node.last_op = None;
            }
        }

        self.ops[op] = OpNode::default();
    }
}

struct BlockIter<'a> {
    next: Option<BlockId>,
    blocks: &'a SecondaryMap<BlockId, BlockNode>,
}

impl Iterator for BlockIter<'_> {
    type Item = BlockId;

    fn next(&mut self) -> Option<BlockId> {
        let next = self.next?;
        self.next = self.blocks[next].next;
        Some(next)
    }
}

struct OpIter<'a> {
    next: Option<OpId>,
    ops: &'a SecondaryMap<OpId, OpNode>,
}

impl Iterator for OpIter<'_> {
    type Item = OpId;

    fn next(&mut self) -> Option<OpId> {
        let next = self.next?;
        self.next = self.ops[next].next;
        Some(next)
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
struct RegionNode {
    first_block: Option<BlockId>,
    last_block: Option<BlockId>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
struct BlockNode {
    /// A region in which the block exists.
    region: Option<RegionId>,
    prev: Option<BlockId>,
    next: Option<BlockId>,
    first_op: Option<OpId>,
    last_op: Option<OpId>,
}

impl BlockNode {
    fn with_region(region: RegionId) -> Self {
        Self {
            region: Some(region),
            ..Self::default()
        }
    }

    /// Replaces the region links of the node, keeping its operation list.
    fn relink(&mut self, links: BlockNode) {
        self.region = links.region;
        self.prev = links.prev;
        self.next = links.next;
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
struct OpNode {
    /// A block in which the op exists.
    block: Option<BlockId>,
    prev: Option<OpId>,
    next: Option<OpId>,
}

impl OpNode {
    fn with_block(block: BlockId) -> Self {
        Self {
            block: Some(block),
            prev: None,
            next: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataFlowGraph, OperationState};

    fn make_dummy_op(dfg: &mut DataFlowGraph) -> OpId {
        dfg.make_op(OperationState::new("test.op"))
    }

    #[test]
    fn test_block_insertion() {
        let mut layout = Layout::new();
        let mut dfg = DataFlowGraph::new();
        let region = dfg.make_region();
        assert_eq!(layout.entry_block(region), None);
        assert_eq!(layout.last_block(region), None);

        // block1.
        let b1 = dfg.make_block();
        layout.append_block(b1, region);
        assert_eq!(layout.entry_block(region), Some(b1));
        assert_eq!(layout.last_block(region), Some(b1));
        assert_eq!(layout.block_region(b1), Some(region));
        assert!(layout.has_one_block(region));

        // block1 -> block2.
        let b2 = dfg.make_block();
        layout.append_block(b2, region);
        assert_eq!(layout.next_block_of(b1), Some(b2));
        assert_eq!(layout.prev_block_of(b2), Some(b1));
        assert!(!layout.has_one_block(region));

        // block1 -> block3 -> block2.
        let b3 = dfg.make_block();
        layout.insert_block_after(b3, b1);
        assert_eq!(layout.last_block(region), Some(b2));
        assert_eq!(layout.next_block_of(b1), Some(b3));
        assert_eq!(layout.prev_block_of(b2), Some(b3));

        // block4 -> block1 -> block3 -> block2.
        let b4 = dfg.make_block();
        layout.insert_block_before(b4, b1);
        assert_eq!(layout.entry_block(region), Some(b4));
        assert_eq!(
            layout.iter_block(region).collect::<Vec<_>>(),
            vec![b4, b1, b3, b2]
        );
    }

    #[test]
    fn test_block_removal_keeps_ops() {
        let mut layout = Layout::new();
        let mut dfg = DataFlowGraph::new();
        let region = dfg.make_region();

        let b1 = dfg.make_block();
        let b2 = dfg.make_block();
        layout.append_block(b1, region);
        layout.append_block(b2, region);
        let op = make_dummy_op(&mut dfg);
        layout.append_op(op, b2);

        layout.remove_block(b2);
        assert!(!layout.is_block_inserted(b2));
        assert_eq!(layout.block_region(b2), None);
        assert_eq!(layout.last_block(region), Some(b1));
        assert_eq!(layout.first_op_of(b2), Some(op));
        assert_eq!(layout.op_block(op), Some(b2));

        layout.remove_block(b1);
        assert!(layout.is_region_empty(region));
    }

    #[test]
    fn test_op_insertion_and_removal() {
        let mut layout = Layout::new();
        let mut dfg = DataFlowGraph::new();
        let region = dfg.make_region();
        let b1 = dfg.make_block();
        layout.append_block(b1, region);
        assert!(layout.is_block_empty(b1));

        // op1 -> op2.
        let o1 = make_dummy_op(&mut dfg);
        let o2 = make_dummy_op(&mut dfg);
        layout.append_op(o1, b1);
        layout.append_op(o2, b1);
        assert_eq!(layout.op_block(o1), Some(b1));
        assert_eq!(layout.next_op_of(o1), Some(o2));

        // op0 -> op1 -> op3 -> op2.
        let o3 = make_dummy_op(&mut dfg);
        layout.insert_op_after(o3, o1);
        let o0 = make_dummy_op(&mut dfg);
        layout.prepend_op(o0, b1);
        assert_eq!(layout.iter_op(b1).collect::<Vec<_>>(), vec![o0, o1, o3, o2]);

        // op0 -> op4 -> op1 -> op3 -> op2.
        let o4 = make_dummy_op(&mut dfg);
        layout.insert_op_before(o4, o1);
        assert_eq!(layout.prev_op_of(o1), Some(o4));

        // op0 -> op4 -> op3.
        layout.remove_op(o1);
        layout.remove_op(o2);
        assert!(!layout.is_op_inserted(o1));
        assert_eq!(layout.last_op_of(b1), Some(o3));
        assert_eq!(layout.iter_op(b1).collect::<Vec<_>>(), vec![o0, o4, o3]);
    }
}
