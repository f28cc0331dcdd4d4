//! Semantic errors.
//!
//! Every fallible analyser operation returns `Result<T, SemanticError>` and
//! propagates with `?`. The first error aborts the translation unit; at that
//! boundary it becomes a [`Diagnostic`] with an [`ErrorCode`].

use lasr_diagnostic::{Diagnostic, ErrorCode};
use lasr_ir::Location;

pub type SemaResult<T> = Result<T, SemanticError>;

/// What went wrong.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    #[error("undeclared symbol `{name}`")]
    UndeclaredSymbol { name: String },

    #[error("symbol `{name}` is already declared in this scope")]
    DuplicateSymbol { name: String },

    #[error("unsupported type annotation `{annotation}`")]
    UnsupportedTypeAnnotation { annotation: String },

    #[error("undeclared type `{name}`")]
    UndeclaredType { name: String },

    #[error("type mismatch: expected `{expected}`, found `{found}`")]
    TypeMismatch { expected: String, found: String },

    #[error("implicit conversion from `{from}` to `{to}` is not allowed")]
    ImplicitNarrowing { from: String, to: String },

    #[error("incompatible pointer types `{left}` and `{right}`")]
    IncompatiblePointerTypes { left: String, right: String },

    #[error("type variable `{param}` bound to both `{first}` and `{second}`")]
    InconsistentTypeVariable {
        param: String,
        first: String,
        second: String,
    },

    #[error("restriction `{restriction}` not satisfied: {reason}")]
    RestrictionMismatch { restriction: String, reason: String },

    #[error("cannot import {kind} `{name}`")]
    UnsupportedImport { name: String, kind: String },

    #[error("module `{module}` not found")]
    ModuleNotFound { module: String },

    #[error("`{key}` cannot be used as a dictionary key type")]
    InvalidKeyType { key: String },

    #[error("`{callee}` takes {expected} argument(s) but {found} were given")]
    ArityMismatch {
        callee: String,
        expected: usize,
        found: usize,
    },

    #[error("cannot reassign constant `{name}`")]
    ConstReassignment { name: String },

    #[error("cannot assign to `in` parameter `{name}`")]
    InputParameterAssignment { name: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("shift amount must be non-negative, found {amount}")]
    NegativeShift { amount: i64 },

    #[error("initializer of `{name}` is not a compile-time constant")]
    NotCompileTimeConstant { name: String },

    #[error("{message}")]
    InvalidOperation { message: String },

    #[error("invalid return value for `{function}`: {reason}")]
    ReturnValue { function: String, reason: String },

    #[error("{what} is not supported")]
    Unsupported { what: String },
}

impl ErrorKind {
    pub fn code(&self) -> ErrorCode {
        match self {
            ErrorKind::UndeclaredSymbol { .. } => ErrorCode::E1001,
            ErrorKind::DuplicateSymbol { .. } => ErrorCode::E1002,
            ErrorKind::UnsupportedTypeAnnotation { .. } => ErrorCode::E1003,
            ErrorKind::UndeclaredType { .. } => ErrorCode::E1004,
            ErrorKind::InvalidKeyType { .. } => ErrorCode::E1005,
            ErrorKind::ReturnValue { .. } => ErrorCode::E1006,
            ErrorKind::TypeMismatch { .. } => ErrorCode::E2001,
            ErrorKind::ImplicitNarrowing { .. } => ErrorCode::E2002,
            ErrorKind::IncompatiblePointerTypes { .. } => ErrorCode::E2003,
            ErrorKind::ArityMismatch { .. } => ErrorCode::E2004,
            ErrorKind::DivisionByZero => ErrorCode::E2005,
            ErrorKind::NegativeShift { .. } => ErrorCode::E2006,
            ErrorKind::NotCompileTimeConstant { .. } => ErrorCode::E2007,
            ErrorKind::InvalidOperation { .. } => ErrorCode::E2008,
            ErrorKind::InconsistentTypeVariable { .. } => ErrorCode::E3001,
            ErrorKind::RestrictionMismatch { .. } => ErrorCode::E3002,
            ErrorKind::ModuleNotFound { .. } => ErrorCode::E4001,
            ErrorKind::UnsupportedImport { .. } => ErrorCode::E4002,
            ErrorKind::ConstReassignment { .. } => ErrorCode::E5001,
            ErrorKind::InputParameterAssignment { .. } => ErrorCode::E5002,
            ErrorKind::Unsupported { .. } => ErrorCode::E9001,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        ErrorKind::InvalidOperation {
            message: message.into(),
        }
    }

    pub(crate) fn unsupported(what: impl Into<String>) -> Self {
        ErrorKind::Unsupported { what: what.into() }
    }
}

/// A semantic error with its primary location and context.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{loc}: {kind}")]
pub struct SemanticError {
    pub kind: ErrorKind,
    pub loc: Location,
    /// Secondary locations, e.g. the first declaration of a duplicate.
    pub labels: Vec<(Location, String)>,
    pub hint: Option<String>,
}

impl SemanticError {
    #[cold]
    pub fn new(kind: ErrorKind, loc: Location) -> Self {
        SemanticError {
            kind,
            loc,
            labels: Vec::new(),
            hint: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, loc: Location, message: impl Into<String>) -> Self {
        self.labels.push((loc, message.into()));
        self
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.kind.code()
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.code())
            .with_message(self.kind.to_string())
            .with_label(self.loc, primary_label(&self.kind));
        for (loc, message) in &self.labels {
            diag = diag.with_secondary_label(*loc, message.clone());
        }
        if let Some(hint) = &self.hint {
            diag = diag.with_suggestion(hint.clone());
        }
        diag
    }
}

fn primary_label(kind: &ErrorKind) -> &'static str {
    match kind {
        ErrorKind::DuplicateSymbol { .. } => "redeclared here",
        ErrorKind::ModuleNotFound { .. } => "imported here",
        ErrorKind::UndeclaredSymbol { .. } | ErrorKind::UndeclaredType { .. } => {
            "not found in this scope"
        }
        ErrorKind::ArityMismatch { .. } => "in this call",
        ErrorKind::ConstReassignment { .. } | ErrorKind::InputParameterAssignment { .. } => {
            "assignment here"
        }
        _ => "here",
    }
}

#[cfg(test)]
mod tests;
