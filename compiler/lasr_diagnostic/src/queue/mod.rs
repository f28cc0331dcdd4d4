//! Diagnostic queue for collecting, deduplicating, and sorting diagnostics.
//!
//! Features:
//! - Error limits to prevent overwhelming output
//! - Deduplication of same-line errors with the same message prefix
//! - Soft diagnostic suppression after hard errors
//! - `ErrorGuaranteed` proof that errors were emitted

use std::hash::{Hash, Hasher};

use lasr_ir::Location;

use crate::{Diagnostic, ErrorCode, ErrorGuaranteed};

/// Number of characters to use for message prefix deduplication.
const MESSAGE_PREFIX_LEN: usize = 30;

/// Hash the first N characters of a message for dedup comparison.
#[inline]
fn message_prefix_hash(msg: &str) -> u64 {
    let byte_end = msg
        .char_indices()
        .nth(MESSAGE_PREFIX_LEN)
        .map_or(msg.len(), |(idx, _)| idx);
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    msg[..byte_end].hash(&mut hasher);
    hasher.finish()
}

/// How the queue treats a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticSeverity {
    /// Always reported. Semantic errors that abort a translation unit.
    Hard,
    /// Suppressed once a hard error exists. Style warnings and hints.
    Soft,
}

/// Configuration for diagnostic processing.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct DiagnosticConfig {
    /// Maximum number of errors before stopping (0 = unlimited).
    pub error_limit: usize,
    /// Deduplicate diagnostics with same line and similar content.
    pub deduplicate: bool,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        DiagnosticConfig {
            error_limit: 10,
            deduplicate: true,
        }
    }
}

impl DiagnosticConfig {
    /// Create a config with no limits (for testing).
    pub fn unlimited() -> Self {
        DiagnosticConfig {
            error_limit: 0,
            deduplicate: false,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
struct QueuedDiagnostic {
    diagnostic: Diagnostic,
    line: u32,
    column: u32,
    soft: bool,
}

/// Queue for collecting, deduplicating, and sorting diagnostics.
///
/// ```text
/// let mut queue = DiagnosticQueue::new();
/// queue.add(diagnostic, DiagnosticSeverity::Hard);
/// let sorted = queue.flush();
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct DiagnosticQueue {
    diagnostics: Vec<QueuedDiagnostic>,
    /// Count of errors (not warnings/notes).
    error_count: usize,
    /// Errors dropped because the limit was reached.
    dropped_errors: usize,
    /// Last (line, `message_prefix_hash`) for dedup.
    last_error: Option<(u32, u64)>,
    has_hard_error: bool,
    config: DiagnosticConfig,
}

impl Default for DiagnosticQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticQueue {
    /// Create a new diagnostic queue with default configuration.
    pub fn new() -> Self {
        Self::with_config(DiagnosticConfig::default())
    }

    pub fn with_config(config: DiagnosticConfig) -> Self {
        DiagnosticQueue {
            diagnostics: Vec::new(),
            error_count: 0,
            dropped_errors: 0,
            last_error: None,
            has_hard_error: false,
            config,
        }
    }

    /// Add a diagnostic, positioned by its primary label.
    ///
    /// Returns `true` if the diagnostic was added, `false` if it was filtered.
    pub fn add(&mut self, diag: Diagnostic, severity: DiagnosticSeverity) -> bool {
        let loc = diag.primary_location().unwrap_or(Location::DUMMY);
        let soft = matches!(severity, DiagnosticSeverity::Soft);
        let is_error = diag.is_error();

        if is_error && self.limit_reached() {
            self.dropped_errors += 1;
            return false;
        }

        if soft && self.has_hard_error {
            return false;
        }

        if self.config.deduplicate && self.is_duplicate(&diag, loc.first_line) {
            return false;
        }

        if is_error {
            if !soft {
                self.has_hard_error = true;
            }
            self.last_error = Some((loc.first_line, message_prefix_hash(&diag.message)));
            self.error_count += 1;
        }

        self.diagnostics.push(QueuedDiagnostic {
            diagnostic: diag,
            line: loc.first_line,
            column: loc.first_column,
            soft,
        });
        true
    }

    /// Check if the error limit has been reached.
    pub fn limit_reached(&self) -> bool {
        self.config.error_limit > 0 && self.error_count >= self.config.error_limit
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn has_hard_error(&self) -> bool {
        self.has_hard_error
    }

    /// Emit a hard error and get proof it was emitted.
    pub fn emit_error(&mut self, diag: Diagnostic) -> ErrorGuaranteed {
        self.add(diag, DiagnosticSeverity::Hard);
        ErrorGuaranteed::new()
    }

    /// Proof that at least one error was emitted, if any was.
    pub fn has_errors(&self) -> Option<ErrorGuaranteed> {
        ErrorGuaranteed::from_error_count(self.error_count)
    }

    /// Sort diagnostics by position and return them, clearing the queue.
    ///
    /// If errors were dropped by the limit, a closing E9002 diagnostic says so.
    pub fn flush(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.sort_by_key(|d| (d.line, d.column));

        let mut result: Vec<Diagnostic> =
            self.diagnostics.drain(..).map(|d| d.diagnostic).collect();

        if self.dropped_errors > 0 {
            result.push(too_many_errors(self.config.error_limit, self.dropped_errors));
        }

        self.error_count = 0;
        self.dropped_errors = 0;
        self.last_error = None;
        self.has_hard_error = false;

        result
    }

    /// Get diagnostics without clearing the queue.
    pub fn peek(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().map(|d| &d.diagnostic)
    }

    /// Number of queued soft diagnostics.
    pub fn soft_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.soft).count()
    }

    fn is_duplicate(&self, diag: &Diagnostic, line: u32) -> bool {
        if !diag.is_error() {
            return false;
        }
        self.last_error.is_some_and(|(last_line, last_hash)| {
            last_line == line && message_prefix_hash(&diag.message) == last_hash
        })
    }
}

#[cold]
fn too_many_errors(limit: usize, dropped: usize) -> Diagnostic {
    Diagnostic::error(ErrorCode::E9002)
        .with_message(format!(
            "aborting after {limit} errors ({dropped} more not shown)"
        ))
        .with_note("raise the error limit to see every error")
}
