//! The [`Ir`] container and nesting queries over it.
use std::sync::Arc;

use crate::{
    BlockId, Context, DataFlowGraph, Dialect, Layout, OpId, OpTrait, OperationData,
    OperationInfo, OperationState, RegionId, RegionKind,
};

/// A nested IR graph together with the context its operation kinds are
/// resolved against.
#[derive(Debug, Clone)]
pub struct Ir {
    ctx: Arc<Context>,
    pub dfg: DataFlowGraph,
    pub layout: Layout,
}

impl Ir {
    pub fn new(ctx: impl Into<Arc<Context>>) -> Self {
        Self {
            ctx: ctx.into(),
            dfg: DataFlowGraph::new(),
            layout: Layout::new(),
        }
    }

    pub fn ctx(&self) -> &Arc<Context> {
        &self.ctx
    }

    /// Creates an operation that is not inserted into any block.
    pub fn create_op(&mut self, state: OperationState) -> OpId {
        self.dfg.make_op(state)
    }

    pub fn op(&self, op: OpId) -> &OperationData {
        self.dfg.op(op)
    }

    pub fn op_info(&self, op: OpId) -> Option<&OperationInfo> {
        self.ctx.op_info(self.op(op).name())
    }

    pub fn is_registered(&self, op: OpId) -> bool {
        self.op_info(op).is_some()
    }

    pub fn op_dialect(&self, op: OpId) -> Option<&Dialect> {
        self.ctx.dialect(self.op(op).name().dialect())
    }

    /// Returns `true` if `op` has `trait_`, or if `op` is unregistered and
    /// therefore might have it.
    pub fn might_have_trait(&self, op: OpId, trait_: OpTrait) -> bool {
        match self.op_info(op) {
            Some(info) => info.has_trait(trait_),
            None => true,
        }
    }

    /// Returns the kind of the `idx`-th region of `op`. Unregistered
    /// operations hold SSA CFG regions.
    pub fn region_kind(&self, op: OpId, idx: usize) -> RegionKind {
        match self.op_info(op) {
            Some(info) => info.region_kind(idx),
            None => RegionKind::SsaCfg,
        }
    }

    pub fn parent_block(&self, op: OpId) -> Option<BlockId> {
        self.layout.op_block(op)
    }

    pub fn parent_region(&self, op: OpId) -> Option<RegionId> {
        self.layout.block_region(self.parent_block(op)?)
    }

    pub fn parent_op(&self, op: OpId) -> Option<OpId> {
        self.region_parent_op(self.parent_region(op)?)
    }

    pub fn region_parent_op(&self, region: RegionId) -> Option<OpId> {
        self.dfg.region(region).parent()
    }

    pub fn block_parent_op(&self, block: BlockId) -> Option<OpId> {
        self.region_parent_op(self.layout.block_region(block)?)
    }

    /// Returns the position of `region` among the regions of its parent op.
    pub fn region_index(&self, region: RegionId) -> Option<usize> {
        let parent = self.region_parent_op(region)?;
        self.op(parent).regions().iter().position(|&r| r == region)
    }

    /// Returns the position of `block` in its region.
    pub fn block_index(&self, block: BlockId) -> Option<usize> {
        let region = self.layout.block_region(block)?;
        self.layout.iter_block(region).position(|b| b == block)
    }

    /// Returns the successors declared by the last operation of `block`.
    pub fn block_successors(&self, block: BlockId) -> &[BlockId] {
        match self.layout.last_op_of(block) {
            Some(last) => self.op(last).successors(),
            None => &[],
        }
    }

    /// Returns `true` if `ancestor` strictly encloses `region`.
    pub fn is_proper_ancestor(&self, ancestor: RegionId, region: RegionId) -> bool {
        let mut current = region;
        while let Some(parent) = self
            .region_parent_op(current)
            .and_then(|op| self.parent_region(op))
        {
            if parent == ancestor {
                return true;
            }
            current = parent;
        }
        false
    }

    /// Returns the ancestor of `op` (or `op` itself) that is located directly
    /// in `region`.
    pub fn find_ancestor_op_in_region(&self, region: RegionId, op: OpId) -> Option<OpId> {
        let mut current = op;
        loop {
            let parent = self.parent_region(current)?;
            if parent == region {
                return Some(current);
            }
            current = self.region_parent_op(parent)?;
        }
    }

    /// Returns the ancestor of `block` (or `block` itself) that is located
    /// directly in `region`.
    pub fn find_ancestor_block_in_region(
        &self,
        region: RegionId,
        block: BlockId,
    ) -> Option<BlockId> {
        let mut current = block;
        loop {
            if self.layout.block_region(current)? == region {
                return Some(current);
            }
            let op = self.block_parent_op(current)?;
            current = self.parent_block(op)?;
        }
    }

    /// Visits `op` and every operation nested in it, in pre-order.
    pub fn walk(&self, op: OpId, f: &mut impl FnMut(OpId)) {
        f(op);
        for &region in self.op(op).regions() {
            for block in self.layout.iter_block(region) {
                for nested in self.layout.iter_op(block) {
                    self.walk(nested, f);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{test_util::test_context, OpBuilder};

    #[test]
    fn ancestor_queries() {
        let mut ir = Ir::new(test_context());
        let root = ir.create_op(OperationState::new("test.op").regions(2));
        let outer = ir.op(root).regions()[0];
        let sibling = ir.op(root).regions()[1];

        let mut builder = OpBuilder::new(&mut ir);
        let b0 = builder.append_block(outer);
        builder.switch_to_block(b0);
        let holder = builder.insert(OperationState::new("test.op").regions(1));
        let inner = builder.ir().op(holder).regions()[0];
        let b1 = builder.append_block(inner);
        builder.switch_to_block(b1);
        let leaf = builder.insert(OperationState::new("test.op"));

        assert_eq!(ir.parent_op(leaf), Some(holder));
        assert_eq!(ir.parent_op(holder), Some(root));
        assert_eq!(ir.parent_op(root), None);
        assert_eq!(ir.region_index(sibling), Some(1));
        assert_eq!(ir.block_index(b1), Some(0));

        assert!(ir.is_proper_ancestor(outer, inner));
        assert!(!ir.is_proper_ancestor(inner, outer));
        assert!(!ir.is_proper_ancestor(outer, outer));
        assert!(!ir.is_proper_ancestor(sibling, inner));

        assert_eq!(ir.find_ancestor_op_in_region(outer, leaf), Some(holder));
        assert_eq!(ir.find_ancestor_op_in_region(sibling, leaf), None);
        assert_eq!(ir.find_ancestor_block_in_region(outer, b1), Some(b0));

        let mut visited = Vec::new();
        ir.walk(root, &mut |op| visited.push(op));
        assert_eq!(visited, vec![root, holder, leaf]);
    }

    #[test]
    fn unregistered_ops_might_have_any_trait() {
        let mut ir = Ir::new(test_context());
        let unknown = ir.create_op(OperationState::new("lax.anything"));
        let known = ir.create_op(OperationState::new("test.op"));

        assert!(!ir.is_registered(unknown));
        assert!(ir.might_have_trait(unknown, OpTrait::IsTerminator));
        assert!(ir.might_have_trait(unknown, OpTrait::NoTerminator));
        assert!(!ir.might_have_trait(known, OpTrait::IsTerminator));
        assert_eq!(ir.op_dialect(unknown).map(Dialect::namespace), Some("lax"));
    }
}
