//! Proof that an error was reported.

use std::fmt;

/// Zero-sized token proving at least one error diagnostic was emitted.
///
/// Constructed only inside this crate, by [`DiagnosticQueue`](crate::DiagnosticQueue)
/// when an error is recorded, or from a non-zero error count.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ErrorGuaranteed(());

impl ErrorGuaranteed {
    pub(crate) fn new() -> Self {
        ErrorGuaranteed(())
    }

    /// Proof from an error count; `None` when nothing was reported.
    pub fn from_error_count(count: usize) -> Option<Self> {
        (count > 0).then(Self::new)
    }
}

impl fmt::Display for ErrorGuaranteed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error(s) emitted")
    }
}

impl std::error::Error for ErrorGuaranteed {}
