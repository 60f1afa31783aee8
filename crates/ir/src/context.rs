//! Dialect and operation-kind registry.
//!
//! Hooks are resolved once, when a dialect or an operation kind is
//! registered. The verifier only looks them up.
use std::fmt;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::{AttrName, Attribute, InvariantError, Ir, IrError, OpId, OperationName};

/// Capabilities an operation kind can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpTrait {
    /// The operation must be the last operation of its block.
    IsTerminator,
    /// The single block of each region of the operation may omit a terminator.
    NoTerminator,
}

/// How the blocks of a region relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RegionKind {
    /// Control flow between blocks with SSA dominance.
    #[default]
    SsaCfg,
    /// No control flow and no dominance requirement.
    Graph,
}

/// Behaviour of a registered operation kind.
pub trait OpDefinition: Send + Sync {
    fn has_trait(&self, _trait_: OpTrait) -> bool {
        false
    }

    /// Returns the kind of the region at `index`.
    fn region_kind(&self, _index: usize) -> RegionKind {
        RegionKind::SsaCfg
    }

    /// Checks operation-specific invariants.
    fn verify_invariants(&self, _ir: &Ir, _op: OpId) -> Result<(), InvariantError> {
        Ok(())
    }
}

pub type InvariantFn = fn(&Ir, OpId) -> Result<(), InvariantError>;

/// A declarative [`OpDefinition`].
#[derive(Clone, Default)]
pub struct OpSpec {
    traits: SmallVec<[OpTrait; 2]>,
    region_kinds: SmallVec<[RegionKind; 2]>,
    verifier: Option<InvariantFn>,
}

impl OpSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trait(mut self, trait_: OpTrait) -> Self {
        self.traits.push(trait_);
        self
    }

    /// Sets the kinds of the leading regions. Regions past the end are
    /// [`RegionKind::SsaCfg`].
    pub fn with_region_kinds(mut self, kinds: impl IntoIterator<Item = RegionKind>) -> Self {
        self.region_kinds = kinds.into_iter().collect();
        self
    }

    pub fn with_verifier(mut self, verifier: InvariantFn) -> Self {
        self.verifier = Some(verifier);
        self
    }
}

impl OpDefinition for OpSpec {
    fn has_trait(&self, trait_: OpTrait) -> bool {
        self.traits.contains(&trait_)
    }

    fn region_kind(&self, index: usize) -> RegionKind {
        self.region_kinds.get(index).copied().unwrap_or_default()
    }

    fn verify_invariants(&self, ir: &Ir, op: OpId) -> Result<(), InvariantError> {
        match self.verifier {
            Some(verifier) => verifier(ir, op),
            None => Ok(()),
        }
    }
}

/// Verification hook for dialect-scoped attributes.
pub trait AttributeVerifier: Send + Sync {
    fn verify_attribute(
        &self,
        ir: &Ir,
        op: OpId,
        name: &AttrName,
        attr: &Attribute,
    ) -> Result<(), InvariantError>;
}

impl<F> AttributeVerifier for F
where
    F: Fn(&Ir, OpId, &AttrName, &Attribute) -> Result<(), InvariantError> + Send + Sync,
{
    fn verify_attribute(
        &self,
        ir: &Ir,
        op: OpId,
        name: &AttrName,
        attr: &Attribute,
    ) -> Result<(), InvariantError> {
        self(ir, op, name, attr)
    }
}

pub struct Dialect {
    namespace: SmolStr,
    allows_unknown_operations: bool,
    attr_verifier: Option<Box<dyn AttributeVerifier>>,
}

impl Dialect {
    pub fn new(namespace: impl Into<SmolStr>) -> Self {
        Self {
            namespace: namespace.into(),
            allows_unknown_operations: false,
            attr_verifier: None,
        }
    }

    pub fn allow_unknown_operations(mut self, allow: bool) -> Self {
        self.allows_unknown_operations = allow;
        self
    }

    pub fn with_attribute_verifier(mut self, verifier: impl AttributeVerifier + 'static) -> Self {
        self.attr_verifier = Some(Box::new(verifier));
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn allows_unknown_operations(&self) -> bool {
        self.allows_unknown_operations
    }

    /// Runs the attribute hook of the dialect. A dialect without a hook
    /// accepts every attribute.
    pub fn verify_attribute(
        &self,
        ir: &Ir,
        op: OpId,
        name: &AttrName,
        attr: &Attribute,
    ) -> Result<(), InvariantError> {
        match &self.attr_verifier {
            Some(verifier) => verifier.verify_attribute(ir, op, name, attr),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for OpSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpSpec")
            .field("traits", &self.traits)
            .field("region_kinds", &self.region_kinds)
            .field("has_verifier", &self.verifier.is_some())
            .finish()
    }
}

impl fmt::Debug for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialect")
            .field("namespace", &self.namespace)
            .field("allows_unknown_operations", &self.allows_unknown_operations)
            .field("has_attr_verifier", &self.attr_verifier.is_some())
            .finish()
    }
}

/// A registered operation kind.
pub struct OperationInfo {
    name: OperationName,
    def: Box<dyn OpDefinition>,
}

impl OperationInfo {
    pub fn name(&self) -> &OperationName {
        &self.name
    }

    pub fn has_trait(&self, trait_: OpTrait) -> bool {
        self.def.has_trait(trait_)
    }

    pub fn region_kind(&self, index: usize) -> RegionKind {
        self.def.region_kind(index)
    }

    pub fn verify_invariants(&self, ir: &Ir, op: OpId) -> Result<(), InvariantError> {
        self.def.verify_invariants(ir, op)
    }
}

impl fmt::Debug for OperationInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationInfo")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct Context {
    dialects: FxHashMap<SmolStr, Dialect>,
    ops: FxHashMap<OperationName, OperationInfo>,
    allow_unregistered_dialects: bool,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_dialect(&mut self, dialect: Dialect) -> Result<(), IrError> {
        if self.dialects.contains_key(&dialect.namespace) {
            return Err(IrError::DuplicateDialect(dialect.namespace));
        }
        self.dialects.insert(dialect.namespace.clone(), dialect);
        Ok(())
    }

    /// Registers the operation kind `name` (`dialect.mnemonic`). The dialect
    /// must already be registered.
    pub fn register_operation(
        &mut self,
        name: &str,
        def: impl OpDefinition + 'static,
    ) -> Result<(), IrError> {
        let name = OperationName::from(name);
        if name.dialect().is_empty() || name.mnemonic().is_empty() {
            return Err(IrError::InvalidOperationName(name.to_string().into()));
        }
        if !self.dialects.contains_key(name.dialect()) {
            return Err(IrError::UnknownDialect(name.dialect().into()));
        }
        if self.ops.contains_key(&name) {
            return Err(IrError::DuplicateOperation(name));
        }

        let info = OperationInfo {
            name: name.clone(),
            def: Box::new(def),
        };
        self.ops.insert(name, info);
        Ok(())
    }

    pub fn dialect(&self, namespace: &str) -> Option<&Dialect> {
        self.dialects.get(namespace)
    }

    pub fn op_info(&self, name: &OperationName) -> Option<&OperationInfo> {
        self.ops.get(name)
    }

    pub fn set_allow_unregistered_dialects(&mut self, allow: bool) {
        self.allow_unregistered_dialects = allow;
    }

    pub fn allows_unregistered_dialects(&self) -> bool {
        self.allow_unregistered_dialects
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_errors() {
        let mut ctx = Context::new();
        ctx.register_dialect(Dialect::new("test")).unwrap();
        assert_eq!(
            ctx.register_dialect(Dialect::new("test")),
            Err(IrError::DuplicateDialect("test".into()))
        );

        ctx.register_operation("test.op", OpSpec::new()).unwrap();
        assert_eq!(
            ctx.register_operation("test.op", OpSpec::new()),
            Err(IrError::DuplicateOperation("test.op".into()))
        );
        assert_eq!(
            ctx.register_operation("other.op", OpSpec::new()),
            Err(IrError::UnknownDialect("other".into()))
        );
        assert_eq!(
            ctx.register_operation("op", OpSpec::new()),
            Err(IrError::InvalidOperationName("op".into()))
        );
    }

    #[test]
    fn op_spec_queries() {
        let spec = OpSpec::new()
            .with_trait(OpTrait::IsTerminator)
            .with_region_kinds([RegionKind::Graph]);
        assert!(spec.has_trait(OpTrait::IsTerminator));
        assert!(!spec.has_trait(OpTrait::NoTerminator));
        assert_eq!(spec.region_kind(0), RegionKind::Graph);
        assert_eq!(spec.region_kind(1), RegionKind::SsaCfg);
    }
}
