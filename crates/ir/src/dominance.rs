//! This module contains dominance queries over nested regions.
//!
//! Each region with more than one block gets its own dominator tree. The
//! tree is computed with the algorithm by Keith D. Cooper., Timothy J.
//! Harvey., and Ken Kennedy.: A Simple, Fast Dominance Algorithm:
//! <https://www.cs.rice.edu/~keith/EMBED/dom.pdf>
//!
//! Queries between entities in different regions are answered by walking the
//! use side up the nesting tree until it reaches the region of the definition.

use cranelift_entity::{packed_option::PackedOption, SecondaryMap};
use rustc_hash::FxHashMap;

use crate::{BlockId, ControlFlowGraph, Ir, OpId, RegionId, RegionKind, Value, ValueId};

#[derive(Default, Debug, Clone)]
pub struct DomTree {
    doms: SecondaryMap<BlockId, PackedOption<BlockId>>,
    rpo: Vec<BlockId>,
}

impl DomTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.doms.clear();
        self.rpo.clear();
    }

    pub fn entry(&self) -> Option<BlockId> {
        self.rpo.first().copied()
    }

    /// Returns the immediate dominator of the `block`.
    /// Returns None if the `block` is unreachable from the entry block, or the `block` is the entry block itself.
    pub fn idom_of(&self, block: BlockId) -> Option<BlockId> {
        if self.entry() == Some(block) {
            return None;
        }
        self.doms[block].expand()
    }

    /// Returns `true` if block1 strictly dominates block2.
    pub fn strictly_dominates(&self, block1: BlockId, block2: BlockId) -> bool {
        let mut current_block = block2;
        while let Some(block) = self.idom_of(current_block) {
            if block == block1 {
                return true;
            }
            current_block = block;
        }

        false
    }

    /// Returns `true` if block1 dominates block2.
    pub fn dominates(&self, block1: BlockId, block2: BlockId) -> bool {
        if block1 == block2 {
            return true;
        }

        self.strictly_dominates(block1, block2)
    }

    /// Same as [`Self::strictly_dominates`], except that an unreachable
    /// `block2` is dominated by every block, and an unreachable `block1`
    /// dominates nothing.
    pub fn properly_dominates(&self, block1: BlockId, block2: BlockId) -> bool {
        if block1 == block2 {
            return false;
        }
        if !self.is_reachable(block2) {
            return true;
        }
        if !self.is_reachable(block1) {
            return false;
        }

        self.strictly_dominates(block1, block2)
    }

    /// Computes the tree of the region whose entry block is `entry`.
    pub fn compute(&mut self, cfg: &ControlFlowGraph, entry: BlockId) {
        self.clear();

        self.rpo = cfg.post_order(entry).collect();
        self.rpo.reverse();

        let block_num = self.rpo.len();

        let mut rpo_nums = SecondaryMap::with_capacity(block_num);
        for (i, &block) in self.rpo.iter().enumerate() {
            rpo_nums[block] = (block_num - i) as u32;
        }

        self.doms[entry] = entry.into();

        let mut changed = true;
        while changed {
            changed = false;
            for &block in self.rpo.iter().skip(1) {
                let processed_pred =
                    match cfg.preds_of(block).find(|&&pred| self.doms[pred].is_some()) {
                        Some(pred) => *pred,
                        _ => continue,
                    };
                let mut new_dom = processed_pred;

                for &pred in cfg.preds_of(block) {
                    if pred != processed_pred && self.doms[pred].is_some() {
                        new_dom = self.intersect(new_dom, pred, &rpo_nums);
                    }
                }
                if Some(new_dom) != self.doms[block].expand() {
                    changed = true;
                    self.doms[block] = new_dom.into();
                }
            }
        }
    }

    /// Returns `true` if block is reachable from the entry block.
    pub fn is_reachable(&self, block: BlockId) -> bool {
        self.doms[block].is_some()
    }

    fn intersect(
        &self,
        mut b1: BlockId,
        mut b2: BlockId,
        rpo_nums: &SecondaryMap<BlockId, u32>,
    ) -> BlockId {
        while b1 != b2 {
            while rpo_nums[b1] < rpo_nums[b2] {
                b1 = self.doms[b1].unwrap();
            }
            while rpo_nums[b2] < rpo_nums[b1] {
                b2 = self.doms[b2].unwrap();
            }
        }

        b1
    }
}

/// Reachability and dominance queries for everything nested under a root
/// operation.
///
/// The IR must be structurally valid and must not change while the info is
/// alive.
#[derive(Debug)]
pub struct DominanceInfo<'a> {
    ir: &'a Ir,
    trees: FxHashMap<RegionId, DomTree>,
    op_order: SecondaryMap<OpId, u32>,
}

impl<'a> DominanceInfo<'a> {
    /// Builds the info from `cfg`, which must be computed from `ir`.
    pub fn new(ir: &'a Ir, cfg: &ControlFlowGraph, root: OpId) -> Self {
        let mut regions = Vec::new();
        ir.walk(root, &mut |op| regions.extend_from_slice(ir.op(op).regions()));

        // Uses nested under `root` may refer to values defined around it.
        let mut current = root;
        while let Some(region) = ir.parent_region(current) {
            regions.push(region);
            match ir.region_parent_op(region) {
                Some(parent) => current = parent,
                None => break,
            }
        }

        let mut info = Self {
            ir,
            trees: FxHashMap::default(),
            op_order: SecondaryMap::new(),
        };
        for region in regions {
            info.compute_region(cfg, region);
        }
        info
    }

    fn compute_region(&mut self, cfg: &ControlFlowGraph, region: RegionId) {
        let ir = self.ir;
        let layout = &ir.layout;
        for block in layout.iter_block(region) {
            for (pos, op) in layout.iter_op(block).enumerate() {
                self.op_order[op] = pos as u32;
            }
        }

        let Some(entry) = layout.entry_block(region) else {
            return;
        };
        if layout.has_one_block(region) {
            return;
        }

        let mut tree = DomTree::new();
        tree.compute(cfg, entry);
        self.trees.insert(region, tree);
    }

    /// Returns the dominator tree of `region`, if it has more than one block.
    pub fn dom_tree(&self, region: RegionId) -> Option<&DomTree> {
        self.trees.get(&region)
    }

    /// Returns `true` if `block` is reachable from the entry block of its
    /// region. Blocks of regions without a dominator tree are reachable.
    pub fn is_reachable_from_entry(&self, block: BlockId) -> bool {
        let tree = self
            .ir
            .layout
            .block_region(block)
            .and_then(|region| self.trees.get(&region));
        match tree {
            Some(tree) => tree.is_reachable(block),
            None => true,
        }
    }

    /// Returns `true` if the definition of `value` properly dominates `user`.
    ///
    /// An operation result never dominates the defining operation or
    /// anything nested inside it. A block argument dominates every operation
    /// of its block.
    pub fn properly_dominates(&self, value: ValueId, user: OpId) -> bool {
        match self.ir.dfg.value(value) {
            Value::OpResult { op, .. } => self.properly_dominates_impl(op, user, false),
            Value::BlockArg { block, .. } => match self.ir.parent_block(user) {
                Some(user_block) => self.dominates_block(block, user_block),
                None => false,
            },
        }
    }

    /// Returns `true` if `a` properly dominates `b`. An operation properly
    /// dominates the operations nested inside it.
    pub fn properly_dominates_op(&self, a: OpId, b: OpId) -> bool {
        self.properly_dominates_impl(a, b, true)
    }

    pub fn dominates_op(&self, a: OpId, b: OpId) -> bool {
        a == b || self.properly_dominates_op(a, b)
    }

    pub fn dominates_block(&self, a: BlockId, b: BlockId) -> bool {
        a == b || self.properly_dominates_block(a, b)
    }

    pub fn properly_dominates_block(&self, a: BlockId, b: BlockId) -> bool {
        if a == b {
            return false;
        }

        let Some(region) = self.ir.layout.block_region(a) else {
            return false;
        };
        let mut b = b;
        if self.ir.layout.block_region(b) != Some(region) {
            match self.ir.find_ancestor_block_in_region(region, b) {
                Some(ancestor) if ancestor == a => return true,
                Some(ancestor) => b = ancestor,
                None => return false,
            }
        }

        match self.trees.get(&region) {
            Some(tree) => tree.properly_dominates(a, b),
            None => false,
        }
    }

    /// Returns `true` if the operations of `block` must respect SSA
    /// dominance. Blocks of graph regions are free of ordering constraints.
    pub fn has_ssa_dominance(&self, block: BlockId) -> bool {
        let Some(region) = self.ir.layout.block_region(block) else {
            return true;
        };
        let Some(parent) = self.ir.region_parent_op(region) else {
            return true;
        };
        match self.ir.region_index(region) {
            Some(idx) => self.ir.region_kind(parent, idx) == RegionKind::SsaCfg,
            None => true,
        }
    }

    fn properly_dominates_impl(&self, a: OpId, b: OpId, enclosing_op_ok: bool) -> bool {
        let (Some(a_block), Some(b_block)) = (self.ir.parent_block(a), self.ir.parent_block(b))
        else {
            return false;
        };

        if a == b {
            return !self.has_ssa_dominance(a_block);
        }

        let mut b = b;
        let mut b_block = b_block;
        let a_region = self.ir.layout.block_region(a_block);
        if a_region != self.ir.layout.block_region(b_block) {
            let Some(ancestor) = a_region.and_then(|r| self.ir.find_ancestor_op_in_region(r, b))
            else {
                return false;
            };
            if ancestor == a && enclosing_op_ok {
                return true;
            }
            b = ancestor;
            b_block = match self.ir.parent_block(b) {
                Some(block) => block,
                None => return false,
            };
        }

        if a_block == b_block {
            if !self.has_ssa_dominance(a_block) {
                return true;
            }
            return self.is_before_in_block(a, b);
        }

        self.properly_dominates_block(a_block, b_block)
    }

    fn is_before_in_block(&self, a: OpId, b: OpId) -> bool {
        let (pos_a, pos_b) = (self.op_order[a], self.op_order[b]);
        if pos_a != pos_b {
            return pos_a < pos_b;
        }

        // Positions of blocks outside the root's scope are not cached.
        let mut next = self.ir.layout.next_op_of(a);
        while let Some(op) = next {
            if op == b {
                return true;
            }
            next = self.ir.layout.next_op_of(op);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::many_single_char_names)]

    use super::*;
    use crate::{
        builder::{test_util::test_context, OpBuilder},
        OperationState,
    };

    fn branch(builder: &mut OpBuilder, from: BlockId, dests: &[BlockId]) {
        builder.switch_to_block(from);
        if dests.is_empty() {
            builder.insert(OperationState::new("test.ret"));
        } else {
            builder.insert(OperationState::new("test.br").successors(dests.iter().copied()));
        }
    }

    fn dom_info(ir: &Ir, root: OpId) -> DominanceInfo<'_> {
        let mut cfg = ControlFlowGraph::new();
        cfg.compute(ir);
        DominanceInfo::new(ir, &cfg, root)
    }

    fn region_ir() -> (Ir, OpId, RegionId) {
        let mut ir = Ir::new(test_context());
        let root = ir.create_op(OperationState::new("test.op").regions(1));
        let region = ir.op(root).regions()[0];
        (ir, root, region)
    }

    #[test]
    fn dom_tree_if_else() {
        let (mut ir, root, region) = region_ir();
        let mut builder = OpBuilder::new(&mut ir);

        let entry_block = builder.append_block(region);
        let then_block = builder.append_block(region);
        let else_block = builder.append_block(region);
        let merge_block = builder.append_block(region);

        branch(&mut builder, entry_block, &[else_block, then_block]);
        branch(&mut builder, then_block, &[merge_block]);
        branch(&mut builder, else_block, &[merge_block]);
        branch(&mut builder, merge_block, &[]);

        let info = dom_info(&ir, root);
        let dom_tree = info.dom_tree(region).unwrap();
        assert_eq!(dom_tree.idom_of(entry_block), None);
        assert_eq!(dom_tree.idom_of(then_block), Some(entry_block));
        assert_eq!(dom_tree.idom_of(else_block), Some(entry_block));
        assert_eq!(dom_tree.idom_of(merge_block), Some(entry_block));
        assert!(info.properly_dominates_block(entry_block, merge_block));
        assert!(!info.properly_dominates_block(then_block, merge_block));
    }

    #[test]
    fn unreachable_edge() {
        let (mut ir, root, region) = region_ir();
        let mut builder = OpBuilder::new(&mut ir);

        let a = builder.append_block(region);
        let b = builder.append_block(region);
        let c = builder.append_block(region);
        let d = builder.append_block(region);
        let e = builder.append_block(region);

        branch(&mut builder, a, &[b, c]);
        branch(&mut builder, b, &[e]);
        branch(&mut builder, c, &[e]);
        branch(&mut builder, d, &[e]);
        branch(&mut builder, e, &[]);

        let info = dom_info(&ir, root);
        let dom_tree = info.dom_tree(region).unwrap();
        assert_eq!(dom_tree.idom_of(a), None);
        assert_eq!(dom_tree.idom_of(b), Some(a));
        assert_eq!(dom_tree.idom_of(c), Some(a));
        assert_eq!(dom_tree.idom_of(d), None);
        assert_eq!(dom_tree.idom_of(e), Some(a));

        assert!(info.is_reachable_from_entry(a));
        assert!(!info.is_reachable_from_entry(d));
        // Unreachable blocks are dominated by everything and dominate nothing.
        assert!(info.properly_dominates_block(e, d));
        assert!(!info.properly_dominates_block(d, e));
    }

    #[test]
    fn dom_tree_complex() {
        let (mut ir, root, region) = region_ir();
        let mut builder = OpBuilder::new(&mut ir);

        let blocks: Vec<_> = (0..13).map(|_| builder.append_block(region)).collect();
        let &[a, b, c, d, e, f, g, h, i, j, k, l, m] = blocks.as_slice() else {
            unreachable!();
        };

        branch(&mut builder, a, &[c, b]);
        branch(&mut builder, b, &[g, d]);
        branch(&mut builder, c, &[h, e]);
        branch(&mut builder, d, &[g, f]);
        branch(&mut builder, e, &[h, c]);
        branch(&mut builder, f, &[k, i]);
        branch(&mut builder, g, &[j]);
        branch(&mut builder, h, &[m]);
        branch(&mut builder, i, &[l]);
        branch(&mut builder, j, &[i]);
        branch(&mut builder, k, &[l]);
        branch(&mut builder, l, &[m, b]);
        branch(&mut builder, m, &[]);

        let info = dom_info(&ir, root);
        let dom_tree = info.dom_tree(region).unwrap();
        assert_eq!(dom_tree.idom_of(a), None);
        assert_eq!(dom_tree.idom_of(b), Some(a));
        assert_eq!(dom_tree.idom_of(c), Some(a));
        assert_eq!(dom_tree.idom_of(d), Some(b));
        assert_eq!(dom_tree.idom_of(e), Some(c));
        assert_eq!(dom_tree.idom_of(f), Some(d));
        assert_eq!(dom_tree.idom_of(g), Some(b));
        assert_eq!(dom_tree.idom_of(h), Some(c));
        assert_eq!(dom_tree.idom_of(i), Some(b));
        assert_eq!(dom_tree.idom_of(j), Some(g));
        assert_eq!(dom_tree.idom_of(k), Some(f));
        assert_eq!(dom_tree.idom_of(m), Some(a));
    }

    #[test]
    fn values_across_nesting() {
        let (mut ir, root, region) = region_ir();
        let mut builder = OpBuilder::new(&mut ir);

        let entry = builder.append_block(region);
        let arg = builder.append_block_arg(entry);
        builder.switch_to_block(entry);
        let def = builder.insert(OperationState::new("test.op").results(1).regions(1));
        let v0 = builder.ir().op(def).results()[0];
        let inner_region = builder.ir().op(def).regions()[0];
        let holder = builder.insert(OperationState::new("test.op").regions(1));
        let holder_region = builder.ir().op(holder).regions()[0];

        let inside_def = builder.append_block(inner_region);
        builder.switch_to_block(inside_def);
        let nested_in_def = builder.insert(OperationState::new("test.op").operands([v0]));

        let inside_holder = builder.append_block(holder_region);
        builder.switch_to_block(inside_holder);
        let nested_user = builder.insert(OperationState::new("test.op").operands([v0, arg]));

        let info = dom_info(&ir, root);
        assert!(info.properly_dominates(v0, holder));
        assert!(info.properly_dominates(v0, nested_user));
        assert!(info.properly_dominates(arg, nested_user));
        assert!(info.properly_dominates(arg, def));
        assert!(!info.properly_dominates(v0, def));
        assert!(!info.properly_dominates(v0, nested_in_def));
        assert!(info.properly_dominates_op(def, nested_in_def));
        assert!(!info.properly_dominates_op(holder, def));
    }

    #[test]
    fn graph_regions_ignore_order() {
        let mut ir = Ir::new(test_context());
        let root = ir.create_op(OperationState::new("test.graph").regions(1));
        let region = ir.op(root).regions()[0];
        let mut builder = OpBuilder::new(&mut ir);

        let block = builder.append_block(region);
        builder.switch_to_block(block);
        let user = builder.insert(OperationState::new("test.op").results(1));
        let def = builder.insert(OperationState::new("test.op").results(1));
        let v_def = builder.ir().op(def).results()[0];
        let v_user = builder.ir().op(user).results()[0];

        let info = dom_info(&ir, root);
        assert!(!info.has_ssa_dominance(block));
        assert!(info.properly_dominates(v_def, user));
        assert!(info.properly_dominates(v_user, user));
    }
}
