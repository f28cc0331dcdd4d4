//! Diagnostic reporting for the lasr front end.
//!
//! Every problem the analyser finds becomes a [`Diagnostic`]:
//! - an [`ErrorCode`] for searchability
//! - a message saying what went wrong
//! - labeled [`Location`](lasr_ir::Location)s saying where
//! - notes and suggestions saying how to fix it
//!
//! # Error Guarantees
//!
//! [`ErrorGuaranteed`] is type-level proof that an error was emitted. The
//! only ways to obtain one go through [`DiagnosticQueue`], so a compilation
//! that returns `Err(ErrorGuaranteed)` has always reported why.
//!
//! ```text
//! let guarantee = queue.emit_error(diagnostic);
//! fn compile(..) -> Result<TranslationUnit, ErrorGuaranteed> { ... }
//! ```

mod diagnostic;
mod error_code;
mod guarantee;
pub mod queue;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use guarantee::ErrorGuaranteed;
pub use queue::{DiagnosticConfig, DiagnosticQueue, DiagnosticSeverity};
