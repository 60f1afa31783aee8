use std::fmt;

use strata_ir::{Location, OpId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DiagnosticCode {
    NullOperand,
    DialectAttributeInvalid,
    CustomInvariantViolation,
    UnregisteredOperationDisallowed,
    MalformedGraphRegion,
    EntryBlockHasPredecessors,
    BlockArgumentOwnerMismatch,
    EmptyBlockMissingTerminator,
    MidBlockBranch,
    CrossRegionBranch,
    MissingTerminator,
    OperandNotDominated,
}

impl DiagnosticCode {
    pub const fn as_u16(self) -> u16 {
        match self {
            Self::NullOperand => 100,
            Self::DialectAttributeInvalid => 101,
            Self::CustomInvariantViolation => 102,
            Self::UnregisteredOperationDisallowed => 103,
            Self::MalformedGraphRegion => 200,
            Self::EntryBlockHasPredecessors => 201,
            Self::BlockArgumentOwnerMismatch => 300,
            Self::EmptyBlockMissingTerminator => 301,
            Self::MidBlockBranch => 302,
            Self::CrossRegionBranch => 303,
            Self::MissingTerminator => 304,
            Self::OperandNotDominated => 500,
        }
    }

    pub fn as_str(self) -> String {
        format!("IR{:04}", self.as_u16())
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Severity {
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => "error".fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Note {
    pub location: Location,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    pub location: Location,
    /// The operation the diagnostic is reported on, if any.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub op: Option<OpId>,
    pub notes: Vec<Note>,
}

impl Diagnostic {
    pub fn new(
        code: DiagnosticCode,
        severity: Severity,
        message: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            location,
            op: None,
            notes: Vec::new(),
        }
    }

    pub fn error(code: DiagnosticCode, message: impl Into<String>, location: Location) -> Self {
        Self::new(code, Severity::Error, message, location)
    }

    pub fn with_op(mut self, op: OpId) -> Self {
        self.op = Some(op);
        self
    }

    pub fn with_note(mut self, location: Location, message: impl Into<String>) -> Self {
        self.notes.push(Note {
            location,
            message: message.into(),
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} [{}] {} @ {}",
            self.severity, self.code, self.message, self.location
        )?;

        for note in &self.notes {
            writeln!(f, "  note: {} @ {}", note.message, note.location)?;
        }

        Ok(())
    }
}
