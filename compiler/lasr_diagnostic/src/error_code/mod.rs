//! Error codes for all analyser diagnostics.
//!
//! Each code is a unique identifier (e.g. `E2001`) whose first digit names the
//! area of the analyser that raised it.

use std::fmt;

/// Error codes for all analyser diagnostics.
///
/// Format: E#### where the first digit indicates the area:
/// - E1xxx: Symbols and type annotations
/// - E2xxx: Types, casting and constant evaluation
/// - E3xxx: Generic instantiation
/// - E4xxx: Modules and imports
/// - E5xxx: Mutation discipline
/// - E9xxx: Internal and unsupported constructs
/// - W2xxx: Style warnings
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Symbols and annotations (E1xxx)
    /// Undeclared symbol
    E1001,
    /// Duplicate declaration in one scope
    E1002,
    /// Unsupported type annotation
    E1003,
    /// Undeclared type
    E1004,
    /// Invalid dictionary key type
    E1005,
    /// Ill-formed function return value
    E1006,

    // Types and casting (E2xxx)
    /// Type mismatch
    E2001,
    /// Implicit conversion not allowed
    E2002,
    /// Incompatible pointer types
    E2003,
    /// Argument count mismatch
    E2004,
    /// Division by a compile-time zero
    E2005,
    /// Negative shift amount
    E2006,
    /// Value is not a compile-time constant
    E2007,
    /// Operation not valid for the operand types
    E2008,

    // Generics (E3xxx)
    /// Type variable bound to two different types
    E3001,
    /// Restriction witness does not match
    E3002,

    // Modules (E4xxx)
    /// Module not found
    E4001,
    /// Symbol kind cannot be imported
    E4002,

    // Mutation discipline (E5xxx)
    /// Assignment to a constant
    E5001,
    /// Assignment to an `in` parameter
    E5002,

    // Internal (E9xxx)
    /// Construct not supported
    E9001,
    /// Too many errors
    E9002,

    // Warnings (W2xxx)
    /// Style: a named intrinsic has an operator spelling
    W2001,
}

impl ErrorCode {
    /// All error codes, for exhaustive iteration.
    pub const ALL: &[ErrorCode] = &[
        ErrorCode::E1001,
        ErrorCode::E1002,
        ErrorCode::E1003,
        ErrorCode::E1004,
        ErrorCode::E1005,
        ErrorCode::E1006,
        ErrorCode::E2001,
        ErrorCode::E2002,
        ErrorCode::E2003,
        ErrorCode::E2004,
        ErrorCode::E2005,
        ErrorCode::E2006,
        ErrorCode::E2007,
        ErrorCode::E2008,
        ErrorCode::E3001,
        ErrorCode::E3002,
        ErrorCode::E4001,
        ErrorCode::E4002,
        ErrorCode::E5001,
        ErrorCode::E5002,
        ErrorCode::E9001,
        ErrorCode::E9002,
        ErrorCode::W2001,
    ];

    /// Get the string representation of this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E1004 => "E1004",
            ErrorCode::E1005 => "E1005",
            ErrorCode::E1006 => "E1006",
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E2005 => "E2005",
            ErrorCode::E2006 => "E2006",
            ErrorCode::E2007 => "E2007",
            ErrorCode::E2008 => "E2008",
            ErrorCode::E3001 => "E3001",
            ErrorCode::E3002 => "E3002",
            ErrorCode::E4001 => "E4001",
            ErrorCode::E4002 => "E4002",
            ErrorCode::E5001 => "E5001",
            ErrorCode::E5002 => "E5002",
            ErrorCode::E9001 => "E9001",
            ErrorCode::E9002 => "E9002",
            ErrorCode::W2001 => "W2001",
        }
    }

    pub fn is_symbol_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::E1001
                | ErrorCode::E1002
                | ErrorCode::E1003
                | ErrorCode::E1004
                | ErrorCode::E1005
                | ErrorCode::E1006
        )
    }

    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::E2001
                | ErrorCode::E2002
                | ErrorCode::E2003
                | ErrorCode::E2004
                | ErrorCode::E2005
                | ErrorCode::E2006
                | ErrorCode::E2007
                | ErrorCode::E2008
        )
    }

    pub fn is_generic_error(&self) -> bool {
        matches!(self, ErrorCode::E3001 | ErrorCode::E3002)
    }

    pub fn is_module_error(&self) -> bool {
        matches!(self, ErrorCode::E4001 | ErrorCode::E4002)
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, ErrorCode::W2001)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse an error code string like `"E2001"` or `"w2001"`.
impl std::str::FromStr for ErrorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        Self::ALL
            .iter()
            .find(|code| code.as_str() == upper)
            .copied()
            .ok_or(())
    }
}

#[cfg(test)]
mod tests;
