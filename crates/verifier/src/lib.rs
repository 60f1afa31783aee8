mod config;
mod diagnostic;
mod report;
mod verify;

pub use config::{VerificationLevel, VerifierConfig};
pub use diagnostic::{Diagnostic, DiagnosticCode, Note, Severity};
pub use report::VerificationReport;
pub use verify::{verify, verify_or_panic, verify_report};

#[macro_export]
macro_rules! debug_verify {
    ($ir:expr, $root:expr) => {{
        if cfg!(debug_assertions) || cfg!(feature = "verify-ir") {
            let cfg = $crate::VerifierConfig::for_level($crate::VerificationLevel::Full);
            $crate::verify_or_panic($ir, $root, &cfg);
        }
    }};
}
