//! Named attributes carried by operations.
use std::fmt;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use smol_str::SmolStr;

/// Attributes of an operation, kept in insertion order.
pub type AttributeMap = IndexMap<AttrName, Attribute, FxBuildHasher>;

/// The name of an attribute.
///
/// A name of the form `dialect.name` is scoped to `dialect`; the verifier
/// hands such attributes to that dialect's attribute hook when the dialect is
/// registered.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttrName(SmolStr);

impl AttrName {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the dialect namespace prefix of the name, if any.
    pub fn dialect_prefix(&self) -> Option<&str> {
        let (prefix, rest) = self.0.split_once('.')?;
        (!prefix.is_empty() && !rest.is_empty()).then_some(prefix)
    }
}

impl From<&str> for AttrName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for AttrName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Attribute {
    Unit,
    Bool(bool),
    Int(i64),
    Str(SmolStr),
    Array(Vec<Attribute>),
}

impl Attribute {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => "unit".fmt(f),
            Self::Bool(value) => value.fmt(f),
            Self::Int(value) => value.fmt(f),
            Self::Str(value) => write!(f, "\"{value}\""),
            Self::Array(elems) => {
                write!(f, "[")?;
                for (idx, elem) in elems.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialect_prefix() {
        assert_eq!(AttrName::from("test.positive").dialect_prefix(), Some("test"));
        assert_eq!(AttrName::from("value").dialect_prefix(), None);
        assert_eq!(AttrName::from(".value").dialect_prefix(), None);
        assert_eq!(AttrName::from("test.").dialect_prefix(), None);
    }

    #[test]
    fn display() {
        let attr = Attribute::Array(vec![
            Attribute::Unit,
            Attribute::Bool(true),
            Attribute::Int(-3),
            Attribute::Str("x".into()),
        ]);
        insta::assert_snapshot!(attr, @r#"[unit, true, -3, "x"]"#);
    }
}
