//! Control flow edges derived from the successor lists of operations.
use std::collections::BTreeSet;

use cranelift_entity::SecondaryMap;

use crate::{BlockId, Ir, OpId};

/// Successor and predecessor sets of every block.
///
/// Edges are never stored in the IR itself. An operation that sits in block
/// `b` and names `s` as a successor contributes the edge `b -> s`, wherever
/// the operation is located in `b`.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct ControlFlowGraph {
    blocks: SecondaryMap<BlockId, BlockNode>,
}

impl ControlFlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compute(&mut self, ir: &Ir) {
        self.clear();

        for op in ir.dfg.ops.keys() {
            self.analyze_op(ir, op);
        }
    }

    pub fn preds_of(&self, block: BlockId) -> impl Iterator<Item = &BlockId> {
        self.blocks[block].preds()
    }

    pub fn succs_of(&self, block: BlockId) -> impl Iterator<Item = &BlockId> {
        self.blocks[block].succs()
    }

    pub fn pred_num_of(&self, block: BlockId) -> usize {
        self.blocks[block].pred_num()
    }

    pub fn succ_num_of(&self, block: BlockId) -> usize {
        self.blocks[block].succ_num()
    }

    pub fn has_preds(&self, block: BlockId) -> bool {
        self.pred_num_of(block) != 0
    }

    /// Returns blocks reachable from `entry` in post order.
    pub fn post_order(&self, entry: BlockId) -> CfgPostOrder<'_> {
        CfgPostOrder::new(self, entry)
    }

    pub fn add_edge(&mut self, from: BlockId, to: BlockId) {
        self.blocks[to].push_pred(from);
        self.blocks[from].push_succ(to);
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    fn analyze_op(&mut self, ir: &Ir, op: OpId) {
        let Some(block) = ir.parent_block(op) else {
            return;
        };

        for &dest in ir.op(op).successors() {
            self.add_edge(block, dest);
        }
    }
}

#[derive(Default, Clone, Debug, PartialEq, Eq)]
struct BlockNode {
    preds: BTreeSet<BlockId>,
    succs: BTreeSet<BlockId>,
}

impl BlockNode {
    fn push_pred(&mut self, pred: BlockId) {
        self.preds.insert(pred);
    }

    fn push_succ(&mut self, succ: BlockId) {
        self.succs.insert(succ);
    }

    fn preds(&self) -> impl Iterator<Item = &BlockId> {
        self.preds.iter()
    }

    fn succs(&self) -> impl Iterator<Item = &BlockId> {
        self.succs.iter()
    }

    fn pred_num(&self) -> usize {
        self.preds.len()
    }

    fn succ_num(&self) -> usize {
        self.succs.len()
    }
}

pub struct CfgPostOrder<'a> {
    cfg: &'a ControlFlowGraph,
    node_state: SecondaryMap<BlockId, NodeState>,
    stack: Vec<BlockId>,
}

impl<'a> CfgPostOrder<'a> {
    fn new(cfg: &'a ControlFlowGraph, entry: BlockId) -> Self {
        Self {
            cfg,
            node_state: SecondaryMap::default(),
            stack: vec![entry],
        }
    }
}

impl Iterator for CfgPostOrder<'_> {
    type Item = BlockId;

    fn next(&mut self) -> Option<BlockId> {
        while let Some(&block) = self.stack.last() {
            if self.node_state[block].is_unvisited() {
                self.node_state[block].set_visited();
                for &succ in self.cfg.succs_of(block) {
                    if self.node_state[succ].is_unvisited() {
                        self.stack.push(succ);
                    }
                }
            } else {
                self.stack.pop();
                if !self.node_state[block].has_finished() {
                    self.node_state[block].set_finished();
                    return Some(block);
                }
            }
        }

        None
    }
}

#[derive(Default, Debug, Clone, Copy)]
struct NodeState(u8);

impl NodeState {
    fn is_unvisited(self) -> bool {
        self.0 == 0
    }

    fn has_finished(self) -> bool {
        self.0 == 2
    }

    fn set_visited(&mut self) {
        self.0 = 1;
    }

    fn set_finished(&mut self) {
        self.0 = 2;
    }
}
