use smol_str::SmolStr;
use thiserror::Error;

use crate::OperationName;

/// Errors raised while registering dialects and operation kinds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IrError {
    #[error("dialect `{0}` is already registered")]
    DuplicateDialect(SmolStr),

    #[error("operation `{0}` is already registered")]
    DuplicateOperation(OperationName),

    #[error("dialect `{0}` is not registered")]
    UnknownDialect(SmolStr),

    #[error("invalid operation name `{0}`: expected `dialect.mnemonic`")]
    InvalidOperationName(SmolStr),
}

/// A failure reported by a dialect attribute hook or an operation invariant
/// hook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct InvariantError {
    pub message: String,
    pub notes: Vec<String>,
}

impl InvariantError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}
