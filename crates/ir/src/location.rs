//! Source locations attached to operations.
use std::fmt;

use smol_str::SmolStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Location {
    #[default]
    Unknown,
    FileLineCol {
        file: SmolStr,
        line: u32,
        col: u32,
    },
    Name(SmolStr),
}

impl Location {
    pub fn file(file: impl Into<SmolStr>, line: u32, col: u32) -> Self {
        Self::FileLineCol {
            file: file.into(),
            line,
            col,
        }
    }

    pub fn name(name: impl Into<SmolStr>) -> Self {
        Self::Name(name.into())
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => "loc(unknown)".fmt(f),
            Self::FileLineCol { file, line, col } => write!(f, "{file}:{line}:{col}"),
            Self::Name(name) => write!(f, "\"{name}\""),
        }
    }
}
