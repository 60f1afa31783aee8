use strata_ir::{ControlFlowGraph, DominanceInfo, Ir, Location, OpId};
use tracing::{debug, warn};

use crate::{diagnostic::Diagnostic, report::VerificationReport, VerifierConfig};

mod dominance;
mod structure;

/// Verifies `root` and everything nested in it.
///
/// Structural checks run first over the whole tree. Dominance is checked only
/// once the structure is known to be valid. The first failure found in
/// traversal order is returned.
pub fn verify(ir: &Ir, root: OpId, cfg: &VerifierConfig) -> Result<(), Diagnostic> {
    let mut verifier = OperationVerifier::new(ir, root);
    let result = verifier.run(cfg);
    if let Err(diagnostic) = &result {
        warn!(code = %diagnostic.code, "{diagnostic}");
    }
    result
}

pub fn verify_report(ir: &Ir, root: OpId, cfg: &VerifierConfig) -> VerificationReport {
    verify(ir, root, cfg).into()
}

pub fn verify_or_panic(ir: &Ir, root: OpId, cfg: &VerifierConfig) {
    let report = verify_report(ir, root, cfg);
    if report.has_errors() {
        eprintln!("STRATA_IR_VERIFY_FAILURE: {root}");
        eprintln!("{report}");
        panic!("STRATA_IR_VERIFY_FAILURE");
    }
}

pub(super) struct OperationVerifier<'a> {
    pub(super) ir: &'a Ir,
    pub(super) root: OpId,
    pub(super) allow_unregistered_dialects: bool,
    /// Derived block edges, used for predecessor queries.
    pub(super) cfg: ControlFlowGraph,
    pub(super) dom_info: Option<DominanceInfo<'a>>,
}

trait Phase {
    fn enabled(_cfg: &VerifierConfig) -> bool {
        true
    }

    fn run(verifier: &mut OperationVerifier<'_>) -> Result<(), Diagnostic>;
}

struct StructurePhase;
struct DominancePhase;

impl Phase for StructurePhase {
    fn run(verifier: &mut OperationVerifier<'_>) -> Result<(), Diagnostic> {
        verifier.verify_operation(verifier.root)
    }
}

impl Phase for DominancePhase {
    fn enabled(cfg: &VerifierConfig) -> bool {
        cfg.should_check_dominance()
    }

    fn run(verifier: &mut OperationVerifier<'_>) -> Result<(), Diagnostic> {
        verifier.dom_info = Some(DominanceInfo::new(verifier.ir, &verifier.cfg, verifier.root));
        let result = verifier.verify_dominance_of_contained_regions(verifier.root);
        verifier.dom_info = None;
        result
    }
}

impl<'a> OperationVerifier<'a> {
    fn new(ir: &'a Ir, root: OpId) -> Self {
        let mut cfg = ControlFlowGraph::new();
        cfg.compute(ir);

        Self {
            ir,
            root,
            allow_unregistered_dialects: ir.ctx().allows_unregistered_dialects(),
            cfg,
            dom_info: None,
        }
    }

    fn run(&mut self, cfg: &VerifierConfig) -> Result<(), Diagnostic> {
        self.run_phase::<StructurePhase>(cfg, "structure")?;
        self.run_phase::<DominancePhase>(cfg, "dominance")
    }

    fn run_phase<P: Phase>(&mut self, cfg: &VerifierConfig, name: &str) -> Result<(), Diagnostic> {
        if !P::enabled(cfg) {
            debug!(root = %self.root, phase = name, "skipping verification phase");
            return Ok(());
        }

        debug!(root = %self.root, phase = name, "running verification phase");
        P::run(self)
    }

    pub(super) fn op_loc(&self, op: OpId) -> Location {
        self.ir.op(op).loc().clone()
    }

    /// Formats `message` the way errors about a specific operation are
    /// prefixed.
    pub(super) fn op_message(&self, op: OpId, message: impl std::fmt::Display) -> String {
        format!("'{}' op {message}", self.ir.op(op).name())
    }
}
