//! Structural checks over the operation/region/block tree.
use strata_ir::{BlockId, InvariantError, Location, OpId, OpTrait, RegionId, RegionKind};
use tracing::trace;

use super::OperationVerifier;
use crate::diagnostic::{Diagnostic, DiagnosticCode};

impl OperationVerifier<'_> {
    pub(super) fn verify_operation(&self, op: OpId) -> Result<(), Diagnostic> {
        let ir = self.ir;
        let data = ir.op(op);

        if data.operands().any(|operand| operand.is_none()) {
            return Err(self.op_error(op, DiagnosticCode::NullOperand, "null operand found"));
        }

        for (name, attr) in data.attrs() {
            let Some(dialect) = name.dialect_prefix().and_then(|ns| ir.ctx().dialect(ns)) else {
                continue;
            };
            dialect
                .verify_attribute(ir, op, name, attr)
                .map_err(|err| {
                    self.hook_error(op, DiagnosticCode::DialectAttributeInvalid, err.message.clone(), err)
                })?;
        }

        let info = ir.op_info(op);
        if let Some(info) = info {
            info.verify_invariants(ir, op).map_err(|err| {
                let message = self.op_message(op, &err.message);
                self.hook_error(op, DiagnosticCode::CustomInvariantViolation, message, err)
            })?;
        }

        for (idx, &region) in data.regions().iter().enumerate() {
            if info.is_some() && ir.region_kind(op, idx) == RegionKind::Graph {
                let num_blocks = ir.layout.num_blocks(region);
                if num_blocks > 1 {
                    let message = self.op_message(
                        op,
                        format_args!("expects graph region #{idx} to have 0 or 1 blocks"),
                    );
                    return Err(self.op_error(op, DiagnosticCode::MalformedGraphRegion, message));
                }
            }
            self.verify_region(region)?;
        }

        if info.is_some() {
            return Ok(());
        }

        let name = data.name();
        match ir.op_dialect(op) {
            None if self.allow_unregistered_dialects => Ok(()),
            None => {
                let message = self.op_message(
                    op,
                    "created with unregistered dialect. If this is intended, please call \
                     allow_unregistered_dialects() on the Context",
                );
                Err(self.op_error(op, DiagnosticCode::UnregisteredOperationDisallowed, message))
            }
            Some(dialect) if dialect.allows_unknown_operations() => Ok(()),
            Some(dialect) => {
                let message = format!(
                    "unregistered operation '{name}' found in dialect ('{}') that does not allow \
                     unknown operations",
                    dialect.namespace()
                );
                Err(self.op_error(op, DiagnosticCode::UnregisteredOperationDisallowed, message))
            }
        }
    }

    fn verify_region(&self, region: RegionId) -> Result<(), Diagnostic> {
        let layout = &self.ir.layout;
        let Some(entry) = layout.entry_block(region) else {
            return Ok(());
        };
        trace!(%region, "verifying region");

        if self.cfg.has_preds(entry) {
            let parent = self.ir.region_parent_op(region);
            let loc = parent.map(|op| self.op_loc(op)).unwrap_or_default();
            let mut diag = Diagnostic::error(
                DiagnosticCode::EntryBlockHasPredecessors,
                "entry block of region may not have predecessors",
                loc,
            );
            diag.op = parent;
            return Err(diag);
        }

        for block in layout.iter_block(region) {
            self.verify_block(block)?;
        }
        Ok(())
    }

    fn verify_block(&self, block: BlockId) -> Result<(), Diagnostic> {
        let ir = self.ir;
        let layout = &ir.layout;
        trace!(%block, "verifying block");

        for &arg in ir.dfg.block(block).args() {
            if ir.dfg.value(arg).owner_block() != Some(block) {
                return Err(self.block_error(
                    block,
                    DiagnosticCode::BlockArgumentOwnerMismatch,
                    "block argument not owned by block",
                ));
            }
        }

        let Some(last) = layout.last_op_of(block) else {
            if self.may_be_valid_without_terminator(block) {
                return Ok(());
            }
            return Err(self.block_error(
                block,
                DiagnosticCode::EmptyBlockMissingTerminator,
                "empty block: expect at least a terminator",
            ));
        };

        for op in layout.iter_op(block) {
            if ir.op(op).num_successors() != 0 && op != last {
                return Err(self.op_error(
                    op,
                    DiagnosticCode::MidBlockBranch,
                    "operation with block successors must terminate its parent block",
                ));
            }
            self.verify_operation(op)?;
        }

        let region = layout.block_region(block);
        for &succ in ir.block_successors(block) {
            if layout.block_region(succ) != region {
                let message = self.op_message(last, "branching to block of a different region");
                return Err(self.op_error(last, DiagnosticCode::CrossRegionBranch, message));
            }
        }

        if self.may_be_valid_without_terminator(block)
            || ir.might_have_trait(last, OpTrait::IsTerminator)
        {
            return Ok(());
        }

        let message = format!("block with no terminator, has '{}'", ir.op(last).name());
        Err(self.op_error(last, DiagnosticCode::MissingTerminator, message))
    }

    /// A block may omit its terminator if it has no parent region, or if it is
    /// the only block of a region whose parent is missing or might have
    /// [`OpTrait::NoTerminator`].
    fn may_be_valid_without_terminator(&self, block: BlockId) -> bool {
        let layout = &self.ir.layout;
        let Some(region) = layout.block_region(block) else {
            return true;
        };
        if !layout.has_one_block(region) {
            return false;
        }

        match self.ir.region_parent_op(region) {
            Some(op) => self.ir.might_have_trait(op, OpTrait::NoTerminator),
            None => true,
        }
    }

    fn op_error(&self, op: OpId, code: DiagnosticCode, message: impl Into<String>) -> Diagnostic {
        Diagnostic::error(code, message, self.op_loc(op)).with_op(op)
    }

    /// Reports at the first operation of `block`, falling back to the parent
    /// operation of the block.
    fn block_error(&self, block: BlockId, code: DiagnosticCode, message: &str) -> Diagnostic {
        let op = self
            .ir
            .layout
            .first_op_of(block)
            .or_else(|| self.ir.block_parent_op(block));
        match op {
            Some(op) => self.op_error(op, code, message),
            None => Diagnostic::error(code, message, Location::Unknown),
        }
    }

    fn hook_error(
        &self,
        op: OpId,
        code: DiagnosticCode,
        message: String,
        err: InvariantError,
    ) -> Diagnostic {
        let loc = self.op_loc(op);
        err.notes
            .into_iter()
            .fold(self.op_error(op, code, message), |diag, note| {
                diag.with_note(loc.clone(), note)
            })
    }
}
