//! Implicit and explicit casting between scalar types.
//!
//! # Design
//!
//! Scalars are ordered by a cast priority, category first and byte width
//! second:
//!
//! ```text
//! Logical < Integer < UnsignedInteger < Real < Complex
//! ```
//!
//! Binary operands are always widened toward the higher priority; that
//! direction never loses information. Assignments and call arguments only
//! get a cast when `implicit_casting` is on. When it is off, a mismatch is
//! an error, with one allowance: an integer or real literal adapts to
//! another width of its own category if its value fits.
//!
//! Casting a constant operand also casts its value, so folding sees through
//! the inserted `Cast` node.

use lasr_ir::Location;

use crate::consteval;
use crate::error::{ErrorKind, SemaResult, SemanticError};
use crate::ir::{CastKind, Expr, ExprKind};
use crate::options::CompilerOptions;
use crate::symbols::SymbolArena;
use crate::types::{type_to_string, types_equal, Ty};

/// `(category, width)` of a scalar; `None` for everything else.
pub fn cast_priority(ty: &Ty) -> Option<(u8, u8)> {
    match ty.peel_const() {
        Ty::Logical { kind } => Some((0, *kind)),
        Ty::Integer { kind } => Some((1, *kind)),
        Ty::UnsignedInteger { kind } => Some((2, *kind)),
        Ty::Real { kind } => Some((3, *kind)),
        Ty::Complex { kind } => Some((4, *kind)),
        _ => None,
    }
}

/// The cast that converts `from` into `to`, if one exists.
pub fn cast_kind(from: &Ty, to: &Ty) -> Option<CastKind> {
    let kind = match (from.peel_const(), to.peel_const()) {
        (Ty::Integer { .. }, Ty::Real { .. }) => CastKind::IntegerToReal,
        (Ty::Integer { .. }, Ty::Integer { .. }) => CastKind::IntegerToInteger,
        (Ty::Integer { .. }, Ty::Complex { .. }) => CastKind::IntegerToComplex,
        (Ty::Integer { .. }, Ty::Logical { .. }) => CastKind::IntegerToLogical,
        (Ty::Integer { .. }, Ty::UnsignedInteger { .. }) => CastKind::IntegerToUnsignedInteger,
        (Ty::Integer { .. }, Ty::SymbolicExpression) => CastKind::IntegerToSymbolicExpression,
        (Ty::UnsignedInteger { .. }, Ty::Integer { .. }) => CastKind::UnsignedIntegerToInteger,
        (Ty::UnsignedInteger { .. }, Ty::Real { .. }) => CastKind::UnsignedIntegerToReal,
        (Ty::UnsignedInteger { .. }, Ty::UnsignedInteger { .. }) => {
            CastKind::UnsignedIntegerToUnsignedInteger
        }
        (Ty::Real { .. }, Ty::Integer { .. }) => CastKind::RealToInteger,
        (Ty::Real { .. }, Ty::Real { .. }) => CastKind::RealToReal,
        (Ty::Real { .. }, Ty::Complex { .. }) => CastKind::RealToComplex,
        (Ty::Real { .. }, Ty::Logical { .. }) => CastKind::RealToLogical,
        (Ty::Real { .. }, Ty::UnsignedInteger { .. }) => CastKind::RealToUnsignedInteger,
        (Ty::Complex { .. }, Ty::Real { .. }) => CastKind::ComplexToReal,
        (Ty::Complex { .. }, Ty::Complex { .. }) => CastKind::ComplexToComplex,
        (Ty::Complex { .. }, Ty::Logical { .. }) => CastKind::ComplexToLogical,
        (Ty::Logical { .. }, Ty::Integer { .. }) => CastKind::LogicalToInteger,
        (Ty::Logical { .. }, Ty::Real { .. }) => CastKind::LogicalToReal,
        (Ty::Character, Ty::Integer { .. }) => CastKind::CharacterToInteger,
        _ => return None,
    };
    Some(kind)
}

/// Convert `expr` to `to`.
///
/// Returns `expr` unchanged when the types are already equal, so casting
/// twice is the same as casting once.
pub fn perform_casting(expr: Expr, to: &Ty, arena: &SymbolArena) -> SemaResult<Expr> {
    if types_equal(&expr.ty, to, arena) {
        return Ok(expr);
    }
    let Some(kind) = cast_kind(&expr.ty, to) else {
        return Err(mismatch(&expr.ty, to, expr.loc, arena));
    };
    let target = to.peel_const().clone();
    let value = expr
        .value
        .as_ref()
        .and_then(|v| consteval::fold_cast(kind, v, &target));
    let loc = expr.loc;
    Ok(Expr::new(
        ExprKind::Cast {
            arg: Box::new(expr),
            kind,
        },
        target,
        loc,
    )
    .with_value(value))
}

/// Bring both operands of a binary operator to a common type.
///
/// Returns the converted operands and their shared type.
pub fn unify_binop_operands(
    left: Expr,
    right: Expr,
    arena: &SymbolArena,
) -> SemaResult<(Expr, Expr, Ty)> {
    if left.ty.is_pointer() || right.ty.is_pointer() {
        let (l, r) = (left.ty.peel_pointer(), right.ty.peel_pointer());
        if !types_equal(l, r, arena) {
            return Err(SemanticError::new(
                ErrorKind::IncompatiblePointerTypes {
                    left: type_to_string(&left.ty, arena),
                    right: type_to_string(&right.ty, arena),
                },
                left.loc.merge(right.loc),
            ));
        }
        let ty = l.peel_const().clone();
        return Ok((left, right, ty));
    }
    if types_equal(&left.ty, &right.ty, arena) {
        let ty = left.ty.peel_const().clone();
        return Ok((left, right, ty));
    }
    match (cast_priority(&left.ty), cast_priority(&right.ty)) {
        (Some(lp), Some(rp)) if lp >= rp => {
            let ty = left.ty.peel_const().clone();
            let right = perform_casting(right, &ty, arena)?;
            Ok((left, right, ty))
        }
        (Some(_), Some(_)) => {
            let ty = right.ty.peel_const().clone();
            let left = perform_casting(left, &ty, arena)?;
            Ok((left, right, ty))
        }
        _ => Err(mismatch(&left.ty, &right.ty, right.loc, arena)),
    }
}

/// Convert a value stored into a target of type `target`.
pub fn cast_for_assignment(
    value: Expr,
    target: &Ty,
    arena: &SymbolArena,
    options: &CompilerOptions,
) -> SemaResult<Expr> {
    let target = target.peel_const().peel_allocatable();
    if target.is_pointer() || value.ty.is_pointer() {
        if types_equal(target.peel_pointer(), value.ty.peel_pointer(), arena) {
            return Ok(value);
        }
        return Err(SemanticError::new(
            ErrorKind::IncompatiblePointerTypes {
                left: type_to_string(target, arena),
                right: type_to_string(&value.ty, arena),
            },
            value.loc,
        ));
    }
    if types_equal(&value.ty, target, arena) {
        return Ok(value);
    }
    if matches!(target, Ty::TypeParameter(_)) || matches!(value.ty, Ty::TypeParameter(_)) {
        return Err(mismatch(target, &value.ty, value.loc, arena));
    }
    if options.implicit_casting || is_adaptable_literal(&value, target) {
        return perform_casting(value, target, arena);
    }
    let narrowing = (value.ty.is_integer() || value.ty.is_unsigned_integer()) && target.is_real()
        || (target.is_complex() && !value.ty.is_complex() && value.ty.is_numeric());
    if narrowing {
        return Err(SemanticError::new(
            ErrorKind::ImplicitNarrowing {
                from: type_to_string(&value.ty, arena),
                to: type_to_string(target, arena),
            },
            value.loc,
        )
        .with_hint(format!(
            "convert explicitly: `{}(...)`",
            type_to_string(target, arena)
        )));
    }
    Err(mismatch(target, &value.ty, value.loc, arena))
}

/// Convert an actual argument to its formal parameter type.
pub fn cast_for_argument(
    arg: Expr,
    param: &Ty,
    arena: &SymbolArena,
    options: &CompilerOptions,
) -> SemaResult<Expr> {
    cast_for_assignment(arg, param, arena, options)
}

/// A literal whose value survives a change of width within its category.
fn is_adaptable_literal(value: &Expr, target: &Ty) -> bool {
    let Some(constant) = &value.value else {
        return false;
    };
    let literal = matches!(
        value.kind,
        ExprKind::IntegerConstant(_) | ExprKind::RealConstant(_) | ExprKind::IntegerUnaryMinus(_)
    );
    let same_category = (value.ty.is_integer() && target.is_integer())
        || (value.ty.is_real() && target.is_real());
    literal && same_category && (constant.conforms_to(target) || target.is_real())
}

fn mismatch(expected: &Ty, found: &Ty, loc: Location, arena: &SymbolArena) -> SemanticError {
    SemanticError::new(
        ErrorKind::TypeMismatch {
            expected: type_to_string(expected, arena),
            found: type_to_string(found, arena),
        },
        loc,
    )
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
