//! This module contains the operation definition of the IR.
use std::fmt;

use cranelift_entity::{entity_impl, packed_option::PackedOption};
use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::{AttrName, Attribute, AttributeMap, BlockId, Location, RegionId, ValueId};

/// An opaque reference to [`OperationData`].
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Copy, Hash)]
pub struct OpId(pub u32);
entity_impl!(OpId, "op");

/// The `dialect.mnemonic` name of an operation.
///
/// A name without a `.` has an empty dialect namespace, which never resolves
/// to a registered dialect.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperationName {
    dialect: SmolStr,
    mnemonic: SmolStr,
}

impl OperationName {
    pub fn new(dialect: impl Into<SmolStr>, mnemonic: impl Into<SmolStr>) -> Self {
        Self {
            dialect: dialect.into(),
            mnemonic: mnemonic.into(),
        }
    }

    pub fn dialect(&self) -> &str {
        &self.dialect
    }

    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }
}

impl From<&str> for OperationName {
    fn from(name: &str) -> Self {
        match name.split_once('.') {
            Some((dialect, mnemonic)) => Self::new(dialect, mnemonic),
            None => Self::new("", name),
        }
    }
}

impl fmt::Display for OperationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dialect.is_empty() {
            self.mnemonic.fmt(f)
        } else {
            write!(f, "{}.{}", self.dialect, self.mnemonic)
        }
    }
}

/// An operation data definition.
///
/// The position of an operation in its block is managed by
/// [`super::layout::Layout`].
#[derive(Debug, Clone)]
pub struct OperationData {
    name: OperationName,
    pub(crate) operands: SmallVec<[PackedOption<ValueId>; 4]>,
    pub(crate) results: SmallVec<[ValueId; 2]>,
    successors: SmallVec<[BlockId; 2]>,
    pub(crate) regions: SmallVec<[RegionId; 2]>,
    attrs: AttributeMap,
    loc: Location,
}

impl OperationData {
    pub fn name(&self) -> &OperationName {
        &self.name
    }

    /// Returns operand slots in positional order. `None` is an empty slot.
    pub fn operands(&self) -> impl ExactSizeIterator<Item = Option<ValueId>> + '_ {
        self.operands.iter().map(|operand| operand.expand())
    }

    pub fn operand(&self, idx: usize) -> Option<ValueId> {
        self.operands.get(idx).and_then(|operand| operand.expand())
    }

    pub fn num_operands(&self) -> usize {
        self.operands.len()
    }

    pub fn results(&self) -> &[ValueId] {
        &self.results
    }

    pub fn result(&self, idx: usize) -> Option<ValueId> {
        self.results.get(idx).copied()
    }

    pub fn successors(&self) -> &[BlockId] {
        &self.successors
    }

    pub fn num_successors(&self) -> usize {
        self.successors.len()
    }

    pub fn regions(&self) -> &[RegionId] {
        &self.regions
    }

    pub fn region(&self, idx: usize) -> Option<RegionId> {
        self.regions.get(idx).copied()
    }

    pub fn num_regions(&self) -> usize {
        self.regions.len()
    }

    pub fn attrs(&self) -> &AttributeMap {
        &self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&Attribute> {
        self.attrs.get(&AttrName::from(name))
    }

    pub fn loc(&self) -> &Location {
        &self.loc
    }
}

/// Everything needed to create an operation.
#[derive(Debug, Clone)]
pub struct OperationState {
    pub name: OperationName,
    pub operands: SmallVec<[ValueId; 4]>,
    pub num_results: usize,
    pub successors: SmallVec<[BlockId; 2]>,
    pub num_regions: usize,
    pub attrs: AttributeMap,
    pub loc: Location,
}

impl OperationState {
    pub fn new(name: impl Into<OperationName>) -> Self {
        Self {
            name: name.into(),
            operands: SmallVec::new(),
            num_results: 0,
            successors: SmallVec::new(),
            num_regions: 0,
            attrs: AttributeMap::default(),
            loc: Location::Unknown,
        }
    }

    pub fn operands(mut self, operands: impl IntoIterator<Item = ValueId>) -> Self {
        self.operands.extend(operands);
        self
    }

    pub fn results(mut self, num_results: usize) -> Self {
        self.num_results = num_results;
        self
    }

    pub fn successors(mut self, successors: impl IntoIterator<Item = BlockId>) -> Self {
        self.successors.extend(successors);
        self
    }

    pub fn regions(mut self, num_regions: usize) -> Self {
        self.num_regions = num_regions;
        self
    }

    pub fn attr(mut self, name: impl Into<AttrName>, attr: Attribute) -> Self {
        self.attrs.insert(name.into(), attr);
        self
    }

    pub fn loc(mut self, loc: Location) -> Self {
        self.loc = loc;
        self
    }

    pub(crate) fn into_data(self) -> (OperationData, usize, usize) {
        let Self {
            name,
            operands,
            num_results,
            successors,
            num_regions,
            attrs,
            loc,
        } = self;

        let data = OperationData {
            name,
            operands: operands.into_iter().map(PackedOption::from).collect(),
            results: SmallVec::new(),
            successors,
            regions: SmallVec::new(),
            attrs,
            loc,
        };
        (data, num_results, num_regions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_name_split() {
        let name = OperationName::from("test.br");
        assert_eq!(name.dialect(), "test");
        assert_eq!(name.mnemonic(), "br");
        assert_eq!(name.to_string(), "test.br");

        let name = OperationName::from("orphan");
        assert_eq!(name.dialect(), "");
        assert_eq!(name.to_string(), "orphan");
    }
}
