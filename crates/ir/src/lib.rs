pub mod attribute;
pub mod builder;
pub mod cfg;
pub mod context;
pub mod dfg;
pub mod dominance;
pub mod error;
pub mod ir;
pub mod layout;
pub mod location;
pub mod operation;
pub mod value;

pub use attribute::{AttrName, Attribute, AttributeMap};
pub use cfg::ControlFlowGraph;
pub use context::{
    AttributeVerifier, Context, Dialect, OpDefinition, OpSpec, OpTrait, OperationInfo,
    RegionKind,
};
pub use dfg::{Block, BlockId, DataFlowGraph, Region, RegionId};
pub use dominance::{DomTree, DominanceInfo};
pub use error::{InvariantError, IrError};
pub use ir::Ir;
pub use layout::Layout;
pub use location::Location;
pub use operation::{OpId, OperationData, OperationName, OperationState};
pub use value::{Value, ValueId};
