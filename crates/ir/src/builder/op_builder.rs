use crate::{BlockId, Ir, OpId, OperationState, RegionId, ValueId};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorLocation {
    At(OpId),
    BlockTop(BlockId),
    BlockBottom(BlockId),
    #[default]
    NoWhere,
}

/// Creates operations and blocks at a cursor position.
pub struct OpBuilder<'a> {
    ir: &'a mut Ir,
    loc: CursorLocation,
}

impl<'a> OpBuilder<'a> {
    pub fn new(ir: &'a mut Ir) -> Self {
        Self {
            ir,
            loc: CursorLocation::NoWhere,
        }
    }

    pub fn ir(&self) -> &Ir {
        self.ir
    }

    pub fn ir_mut(&mut self) -> &mut Ir {
        self.ir
    }

    pub fn loc(&self) -> CursorLocation {
        self.loc
    }

    pub fn set_location(&mut self, loc: CursorLocation) {
        self.loc = loc;
    }

    pub fn switch_to_block(&mut self, block: BlockId) {
        self.loc = CursorLocation::BlockBottom(block);
    }

    /// Makes a block and appends it to `region`.
    pub fn append_block(&mut self, region: RegionId) -> BlockId {
        let block = self.ir.dfg.make_block();
        self.ir.layout.append_block(block, region);
        block
    }

    /// Makes a block that belongs to no region.
    pub fn make_block(&mut self) -> BlockId {
        self.ir.dfg.make_block()
    }

    pub fn append_block_arg(&mut self, block: BlockId) -> ValueId {
        self.ir.dfg.append_block_arg(block)
    }

    /// Creates an operation and inserts it at the cursor. The cursor moves
    /// past the new operation.
    pub fn insert(&mut self, state: OperationState) -> OpId {
        let op = self.ir.dfg.make_op(state);
        self.insert_op(op);
        op
    }

    /// Inserts an existing operation that is not in any block at the cursor.
    pub fn insert_op(&mut self, op: OpId) {
        match self.loc {
            CursorLocation::At(at) => {
                self.ir.layout.insert_op_after(op, at);
                self.loc = CursorLocation::At(op);
            }
            CursorLocation::BlockTop(block) => {
                self.ir.layout.prepend_op(op, block);
                self.loc = CursorLocation::At(op);
            }
            CursorLocation::BlockBottom(block) => self.ir.layout.append_op(op, block),
            CursorLocation::NoWhere => panic!("cursor loc points to `NoWhere`"),
        }
    }

    /// Same as [`Self::insert`], returning the first result of the new
    /// operation.
    pub fn insert_value(&mut self, state: OperationState) -> Option<ValueId> {
        let op = self.insert(state);
        self.ir.dfg.op_result(op, 0)
    }

    /// Removes the operation at the cursor from its block and moves the
    /// cursor to the previous operation, or to the top of the block.
    pub fn remove_op(&mut self) {
        let CursorLocation::At(op) = self.loc else {
            panic!("cursor does not point to an operation");
        };

        let next_loc = match (self.ir.layout.prev_op_of(op), self.ir.layout.op_block(op)) {
            (Some(prev), _) => CursorLocation::At(prev),
            (None, Some(block)) => CursorLocation::BlockTop(block),
            (None, None) => CursorLocation::NoWhere,
        };
        self.ir.dfg.untrack_op(op);
        self.ir.layout.remove_op(op);
        self.loc = next_loc;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::test_util::test_context;

    #[test]
    fn cursor_positions() {
        let mut ir = Ir::new(test_context());
        let root = ir.create_op(OperationState::new("test.op").regions(1));
        let region = ir.op(root).regions()[0];

        let mut builder = OpBuilder::new(&mut ir);
        let block = builder.append_block(region);
        builder.switch_to_block(block);
        let o1 = builder.insert(OperationState::new("test.op"));
        let o3 = builder.insert(OperationState::new("test.op"));

        builder.set_location(CursorLocation::BlockTop(block));
        let o0 = builder.insert(OperationState::new("test.op"));
        let o2 = builder.insert(OperationState::new("test.op"));
        assert_eq!(builder.loc(), CursorLocation::At(o2));

        builder.remove_op();
        assert_eq!(builder.loc(), CursorLocation::At(o0));

        assert_eq!(ir.layout.iter_op(block).collect::<Vec<_>>(), vec![o0, o1, o3]);
    }
}
