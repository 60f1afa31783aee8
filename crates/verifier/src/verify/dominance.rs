//! Operand dominance checks and their diagnostics.
use strata_ir::{Location, OpId, RegionId, Value, ValueId};
use tracing::trace;

use super::OperationVerifier;
use crate::diagnostic::{Diagnostic, DiagnosticCode};

/// Where a definition sits relative to a use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Nesting {
    SameBlock,
    SameRegion,
    ParentRegion,
    ChildRegion,
    Unrelated,
}

impl OperationVerifier<'_> {
    /// Checks that every operand of every operation nested in `op` properly
    /// dominates its use.
    ///
    /// Operands of operations in unreachable blocks are not checked, but
    /// regions nested in them are.
    pub(super) fn verify_dominance_of_contained_regions(&self, op: OpId) -> Result<(), Diagnostic> {
        let ir = self.ir;
        let Some(dom_info) = &self.dom_info else {
            return Ok(());
        };

        for &region in ir.op(op).regions() {
            for block in ir.layout.iter_block(region) {
                let is_reachable = dom_info.is_reachable_from_entry(block);
                trace!(%block, is_reachable, "checking dominance");

                for nested in ir.layout.iter_op(block) {
                    if is_reachable {
                        for (idx, operand) in ir.op(nested).operands().enumerate() {
                            let Some(value) = operand else {
                                continue;
                            };
                            if !dom_info.properly_dominates(value, nested) {
                                return Err(self.diagnose_invalid_operand_dominance(
                                    nested, idx, value,
                                ));
                            }
                        }
                    }

                    if ir.op(nested).num_regions() != 0 {
                        self.verify_dominance_of_contained_regions(nested)?;
                    }
                }
            }
        }

        Ok(())
    }

    fn diagnose_invalid_operand_dominance(
        &self,
        op: OpId,
        operand_idx: usize,
        value: ValueId,
    ) -> Diagnostic {
        let ir = self.ir;
        let diag = Diagnostic::error(
            DiagnosticCode::OperandNotDominated,
            format!("operand #{operand_idx} does not dominate this use"),
            self.op_loc(op),
        )
        .with_op(op);

        let use_block = ir.parent_block(op);
        let use_region = ir.parent_region(op);

        match ir.dfg.value(value) {
            Value::OpResult { op: def, .. } => {
                let def_block = ir.parent_block(def);
                let def_region = ir.parent_region(def);
                let nesting = if def_block.is_some() && def_block == use_block {
                    Nesting::SameBlock
                } else {
                    self.classify(def_region, use_region)
                };

                let detail = match nesting {
                    Nesting::SameBlock => "op in the same block",
                    Nesting::SameRegion => "op in the same region",
                    Nesting::ParentRegion => "op in a parent region",
                    Nesting::ChildRegion => "op in a child region",
                    Nesting::Unrelated => "op is neither in a parent nor in a child region",
                };
                diag.with_note(self.op_loc(def), format!("operand defined here ({detail})"))
            }

            Value::BlockArg { block, idx } => {
                let loc = ir
                    .block_parent_op(block)
                    .map(|parent| self.op_loc(parent))
                    .unwrap_or(Location::Unknown);
                let Some(def_region) = ir.layout.block_region(block) else {
                    return diag.with_note(loc, " (block without parent)");
                };
                if use_block == Some(block) {
                    panic!("internal error in dominance verification");
                }

                let detail = match self.classify(Some(def_region), use_region) {
                    Nesting::SameBlock | Nesting::SameRegion => "in the same region",
                    Nesting::ParentRegion => "in a parent region",
                    Nesting::ChildRegion => "in a child region",
                    Nesting::Unrelated => "neither in a parent nor in a child region",
                };
                let block_idx = ir.block_index(block).unwrap_or_default();
                diag.with_note(
                    loc,
                    format!(
                        "operand defined as a block argument (block #{block_idx}, argument #{idx} \
                         {detail})"
                    ),
                )
            }
        }
    }

    /// Classifies the region of a definition against the region of its use.
    fn classify(&self, def_region: Option<RegionId>, use_region: Option<RegionId>) -> Nesting {
        let (Some(def_region), Some(use_region)) = (def_region, use_region) else {
            return Nesting::Unrelated;
        };

        if def_region == use_region {
            Nesting::SameRegion
        } else if self.ir.is_proper_ancestor(def_region, use_region) {
            Nesting::ParentRegion
        } else if self.ir.is_proper_ancestor(use_region, def_region) {
            Nesting::ChildRegion
        } else {
            Nesting::Unrelated
        }
    }
}
