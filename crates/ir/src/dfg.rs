//! This module contains the data flow graph of the IR.
//!
//! The data flow graph owns every operation, value, block and region of an
//! [`crate::Ir`]. Nesting order lives in [`crate::Layout`].
use std::collections::BTreeSet;

use cranelift_entity::{entity_impl, packed_option::PackedOption, PrimaryMap, SecondaryMap};
use smallvec::SmallVec;

use crate::{OpId, OperationData, OperationState, Value, ValueId};

#[derive(Debug, Clone, Default)]
pub struct DataFlowGraph {
    #[doc(hidden)]
    pub ops: PrimaryMap<OpId, OperationData>,
    #[doc(hidden)]
    pub values: PrimaryMap<ValueId, Value>,
    #[doc(hidden)]
    pub blocks: PrimaryMap<BlockId, Block>,
    #[doc(hidden)]
    pub regions: PrimaryMap<RegionId, Region>,
    users: SecondaryMap<ValueId, BTreeSet<OpId>>,
}

impl DataFlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an operation together with its results and regions.
    pub fn make_op(&mut self, state: OperationState) -> OpId {
        let (data, num_results, num_regions) = state.into_data();
        let op = self.ops.push(data);

        for idx in 0..num_results {
            let result = self.values.push(Value::OpResult { op, idx });
            self.ops[op].results.push(result);
        }

        for _ in 0..num_regions {
            let region = self.regions.push(Region::with_parent(op));
            self.ops[op].regions.push(region);
        }

        self.attach_user(op);
        op
    }

    pub fn make_block(&mut self) -> BlockId {
        self.blocks.push(Block::new())
    }

    /// Makes a region that is not owned by any operation.
    pub fn make_region(&mut self) -> RegionId {
        self.regions.push(Region::default())
    }

    pub fn append_block_arg(&mut self, block: BlockId) -> ValueId {
        let idx = self.blocks[block].args.len();
        let value = self.values.push(Value::BlockArg { block, idx });
        self.blocks[block].args.push(value);
        value
    }

    /// Appends an existing value to the argument list of `block` without
    /// touching the owner recorded on the value.
    #[doc(hidden)]
    pub fn attach_block_arg(&mut self, block: BlockId, value: ValueId) {
        self.blocks[block].args.push(value);
    }

    pub fn op(&self, op: OpId) -> &OperationData {
        &self.ops[op]
    }

    pub fn value(&self, value: ValueId) -> Value {
        self.values[value]
    }

    pub fn block(&self, block: BlockId) -> &Block {
        &self.blocks[block]
    }

    pub fn region(&self, region: RegionId) -> &Region {
        &self.regions[region]
    }

    pub fn has_op(&self, op: OpId) -> bool {
        self.ops.is_valid(op)
    }

    pub fn has_value(&self, value: ValueId) -> bool {
        self.values.is_valid(value)
    }

    pub fn has_block(&self, block: BlockId) -> bool {
        self.blocks.is_valid(block)
    }

    pub fn op_result(&self, op: OpId, idx: usize) -> Option<ValueId> {
        self.ops[op].result(idx)
    }

    /// Replaces the operand slot `idx` of `op`. Passing `None` empties the slot.
    pub fn set_operand(&mut self, op: OpId, idx: usize, value: Option<ValueId>) {
        let old = self.ops[op].operands[idx].expand();
        self.ops[op].operands[idx] = value.into();

        if let Some(old) = old {
            let still_used = self.ops[op]
                .operands
                .iter()
                .any(|operand| operand.expand() == Some(old));
            if !still_used {
                self.remove_user(old, op);
            }
        }

        if let Some(value) = value {
            self.users[value].insert(op);
        }
    }

    /// Empties the operand slot `idx` of `op`.
    pub fn clear_operand(&mut self, op: OpId, idx: usize) {
        self.set_operand(op, idx, None);
    }

    pub fn attach_user(&mut self, op: OpId) {
        let data = &self.ops[op];
        for value in data.operands.iter().filter_map(|operand| operand.expand()) {
            self.users[value].insert(op);
        }
    }

    pub fn untrack_op(&mut self, op: OpId) {
        let data = &self.ops[op];
        for value in data.operands.iter().filter_map(|operand| operand.expand()) {
            self.users[value].remove(&op);
        }
    }

    pub fn remove_user(&mut self, value: ValueId, user: OpId) {
        self.users[value].remove(&user);
    }

    /// Returns all operations that use `value`.
    pub fn users(&self, value: ValueId) -> impl Iterator<Item = &OpId> {
        self.users[value].iter()
    }

    /// Returns the number of operations that use `value`.
    pub fn users_num(&self, value: ValueId) -> usize {
        self.users[value].len()
    }

    /// Rewrites every use of `value` to `alias`.
    pub fn replace_all_uses(&mut self, value: ValueId, alias: ValueId) {
        let mut users = std::mem::take(&mut self.users[value]);
        for op in &users {
            for operand in self.ops[*op].operands.iter_mut() {
                if operand.expand() == Some(value) {
                    *operand = alias.into();
                }
            }
        }
        self.users[alias].append(&mut users);
    }
}

/// An opaque reference to [`Block`].
#[derive(Clone, PartialEq, Eq, Copy, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);
entity_impl!(BlockId, "block");

/// A block data definition.
///
/// A block owns its arguments. Operation order and the parent region are
/// managed by [`super::layout::Layout`].
#[derive(Debug, Clone, Default)]
pub struct Block {
    args: SmallVec<[ValueId; 4]>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn args(&self) -> &[ValueId] {
        &self.args
    }

    pub fn num_args(&self) -> usize {
        self.args.len()
    }
}

/// An opaque reference to [`Region`].
#[derive(Clone, PartialEq, Eq, Copy, Hash, PartialOrd, Ord)]
pub struct RegionId(pub u32);
entity_impl!(RegionId, "region");

/// A region data definition.
///
/// The parent operation is fixed when the region is created. Block order is
/// managed by [`super::layout::Layout`].
#[derive(Debug, Clone, Default)]
pub struct Region {
    parent: PackedOption<OpId>,
}

impl Region {
    fn with_parent(op: OpId) -> Self {
        Self { parent: op.into() }
    }

    pub fn parent(&self) -> Option<OpId> {
        self.parent.expand()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn users_follow_operand_updates() {
        let mut dfg = DataFlowGraph::new();
        let def = dfg.make_op(OperationState::new("test.op").results(2));
        let v0 = dfg.op_result(def, 0).unwrap();
        let v1 = dfg.op_result(def, 1).unwrap();

        let user = dfg.make_op(OperationState::new("test.op").operands([v0, v0]));
        assert_eq!(dfg.users_num(v0), 1);

        dfg.set_operand(user, 0, Some(v1));
        assert_eq!(dfg.users_num(v0), 1);
        assert_eq!(dfg.users_num(v1), 1);

        dfg.clear_operand(user, 1);
        assert_eq!(dfg.users_num(v0), 0);
        assert_eq!(dfg.op(user).operand(1), None);
        assert_eq!(dfg.op(user).operand(0), Some(v1));
    }

    #[test]
    fn replace_all_uses() {
        let mut dfg = DataFlowGraph::new();
        let def = dfg.make_op(OperationState::new("test.op").results(2));
        let v0 = dfg.op_result(def, 0).unwrap();
        let v1 = dfg.op_result(def, 1).unwrap();
        let user = dfg.make_op(OperationState::new("test.op").operands([v0, v1, v0]));

        dfg.replace_all_uses(v0, v1);
        assert_eq!(dfg.users_num(v0), 0);
        assert_eq!(dfg.users(v1).copied().collect::<Vec<_>>(), vec![user]);
        assert!(dfg.op(user).operands().all(|operand| operand == Some(v1)));
    }

    #[test]
    fn block_args_record_owner() {
        let mut dfg = DataFlowGraph::new();
        let b0 = dfg.make_block();
        let b1 = dfg.make_block();
        let a0 = dfg.append_block_arg(b0);
        let a1 = dfg.append_block_arg(b0);
        assert_eq!(dfg.value(a1), Value::BlockArg { block: b0, idx: 1 });

        dfg.attach_block_arg(b1, a0);
        assert_eq!(dfg.block(b1).args(), &[a0]);
        assert_eq!(dfg.value(a0).owner_block(), Some(b0));
    }
}
