//! This module contains the value definition of the IR.
use cranelift_entity::entity_impl;

use crate::{BlockId, OpId};

/// An opaque reference to [`Value`].
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Copy, Hash)]
pub struct ValueId(pub u32);
entity_impl!(ValueId, "v");

/// A value data definition.
///
/// Values are never owned by the operations that use them; operand slots only
/// hold a [`ValueId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    /// The value is the `idx`-th result of `op`.
    OpResult { op: OpId, idx: usize },

    /// The value is the `idx`-th argument of `block`.
    ///
    /// `block` is the owner recorded on the value itself. It normally matches
    /// the block whose argument list stores the value.
    BlockArg { block: BlockId, idx: usize },
}

impl Value {
    /// Returns the operation defining this value, if it is an operation result.
    pub fn defining_op(&self) -> Option<OpId> {
        match self {
            Self::OpResult { op, .. } => Some(*op),
            Self::BlockArg { .. } => None,
        }
    }

    /// Returns the recorded owner block, if this value is a block argument.
    pub fn owner_block(&self) -> Option<BlockId> {
        match self {
            Self::BlockArg { block, .. } => Some(*block),
            Self::OpResult { .. } => None,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Self::OpResult { idx, .. } | Self::BlockArg { idx, .. } => *idx,
        }
    }

    pub fn is_block_arg(&self) -> bool {
        matches!(self, Self::BlockArg { .. })
    }
}
