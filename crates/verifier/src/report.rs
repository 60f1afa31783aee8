use std::fmt;

use crate::diagnostic::Diagnostic;

/// Outcome of a verification run. Verification stops at the first failure,
/// so a report holds at most one diagnostic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    pub diagnostic: Option<Diagnostic>,
}

impl VerificationReport {
    pub fn is_ok(&self) -> bool {
        !self.has_errors()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostic.as_ref().is_some_and(Diagnostic::is_error)
    }

    pub fn into_result(self) -> Result<(), Diagnostic> {
        match self.diagnostic {
            Some(diagnostic) => Err(diagnostic),
            None => Ok(()),
        }
    }
}

impl From<Result<(), Diagnostic>> for VerificationReport {
    fn from(result: Result<(), Diagnostic>) -> Self {
        Self {
            diagnostic: result.err(),
        }
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.diagnostic {
            Some(diagnostic) => write!(f, "{diagnostic}"),
            None => "verification succeeded".fmt(f),
        }
    }
}
