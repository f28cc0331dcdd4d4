//! Type-annotation resolution.
//!
//! Annotations are ordinary expressions in the syntax tree. This module maps
//! them to canonical [`Ty`] values:
//!
//! ```text
//! i32                  Integer { kind: 4 }
//! list[f64]            List(Real { kind: 8 })
//! Pointer[Point]       Pointer(Struct(Point))
//! f64[:, 1:n]          Array(Real 8, [deferred, start 1 length n])
//! InOut[i32[:]]        intent InOut on Array(Integer 4, [deferred])
//! ```
//!
//! It also lowers the small constant-expression language used inside
//! annotations and declarations (dimension bounds, `Const` initializers,
//! parameter defaults, enum values). The full expression lowering of pass 2
//! is not available yet when those are needed.

use lasr_ir::ast::{self, ExprKind as AstKind, Operator, UnaryOperator};
use lasr_ir::Location;

use crate::cast::{perform_casting, unify_binop_operands};
use crate::compile::Compilation;
use crate::consteval;
use crate::error::{ErrorKind, SemaResult, SemanticError};
use crate::imports;
use crate::ir::{BinOp, Constant, Expr, ExprKind};
use crate::stack::ensure_sufficient_stack;
use crate::symbols::{Intent, ScopeId, SymbolArena, SymbolKind};
use crate::types::{type_to_string, Dimension, FunctionType, Ty};

/// A resolved annotation before it is attached to a declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub ty: Ty,
    /// Explicit `In`/`Out`/`InOut` wrapper, if any.
    pub intent: Option<Intent>,
    /// `Allocatable[...]` seen; applied by [`Annotation::finish`].
    pub allocatable: bool,
}

impl Annotation {
    fn plain(ty: Ty) -> Self {
        Annotation {
            ty,
            intent: None,
            allocatable: false,
        }
    }

    /// The declared type, with the allocatable wrapper applied.
    pub fn finish(self) -> Ty {
        if self.allocatable {
            Ty::allocatable(self.ty)
        } else {
            self.ty
        }
    }
}

/// The type a scalar keyword names: `i32`, `f64`, `bool`, `str`, ...
pub fn scalar_keyword(name: &str) -> Option<Ty> {
    let ty = match name {
        "i8" => Ty::integer(1),
        "i16" => Ty::integer(2),
        "i32" => Ty::integer(4),
        "i64" => Ty::integer(8),
        "u8" => Ty::unsigned(1),
        "u16" => Ty::unsigned(2),
        "u32" => Ty::unsigned(4),
        "u64" => Ty::unsigned(8),
        "f32" => Ty::real(4),
        "f64" => Ty::real(8),
        "c32" => Ty::complex(4),
        "c64" => Ty::complex(8),
        "bool" => Ty::logical(),
        "str" => Ty::Character,
        "CPtr" => Ty::CPtr,
        "S" => Ty::SymbolicExpression,
        _ => return None,
    };
    Some(ty)
}

/// Resolve an annotation and apply its wrappers.
pub(crate) fn resolve_type(
    cx: &mut Compilation<'_>,
    scope: ScopeId,
    annotation: &ast::Expr,
) -> SemaResult<Ty> {
    resolve(cx, scope, annotation).map(Annotation::finish)
}

#[tracing::instrument(level = "trace", skip_all, fields(annotation = %render(annotation)))]
pub(crate) fn resolve(
    cx: &mut Compilation<'_>,
    scope: ScopeId,
    annotation: &ast::Expr,
) -> SemaResult<Annotation> {
    ensure_sufficient_stack(|| resolve_inner(cx, scope, annotation))
}

fn resolve_inner(
    cx: &mut Compilation<'_>,
    scope: ScopeId,
    annotation: &ast::Expr,
) -> SemaResult<Annotation> {
    match &annotation.kind {
        AstKind::Name(name) => resolve_name(cx, scope, name, annotation.loc).map(Annotation::plain),
        AstKind::Attribute { value, attr } => {
            resolve_attribute(cx, scope, value, attr, annotation.loc).map(Annotation::plain)
        }
        AstKind::Subscript { value, slice } => resolve_subscript(cx, scope, value, slice, annotation),
        _ => Err(unsupported(annotation)),
    }
}

fn resolve_name(
    cx: &mut Compilation<'_>,
    scope: ScopeId,
    name: &str,
    loc: Location,
) -> SemaResult<Ty> {
    if let Some(ty) = scalar_keyword(name) {
        return Ok(ty);
    }
    let Some(id) = cx.arena.resolve(scope, name) else {
        return Err(SemanticError::new(
            ErrorKind::UndeclaredType {
                name: name.to_owned(),
            },
            loc,
        ));
    };
    type_of_symbol(&cx.arena, id).ok_or_else(|| {
        SemanticError::new(
            ErrorKind::UnsupportedTypeAnnotation {
                annotation: name.to_owned(),
            },
            loc,
        )
    })
}

/// The type named by a symbol: an aggregate or a type-parameter variable.
fn type_of_symbol(arena: &SymbolArena, id: crate::symbols::SymbolId) -> Option<Ty> {
    match &arena.symbol(arena.symbol_get_past_external(id)).kind {
        SymbolKind::Struct(_) => Some(Ty::Struct(id)),
        SymbolKind::Enum(_) => Some(Ty::Enum(id)),
        SymbolKind::Union(_) => Some(Ty::Union(id)),
        SymbolKind::Variable(v) => match v.ty.peel_const() {
            Ty::TypeParameter(name) => Some(Ty::TypeParameter(name.clone())),
            _ => None,
        },
        _ => None,
    }
}

fn resolve_attribute(
    cx: &mut Compilation<'_>,
    scope: ScopeId,
    value: &ast::Expr,
    attr: &str,
    loc: Location,
) -> SemaResult<Ty> {
    let Some(base) = value.as_name() else {
        return Err(SemanticError::new(
            ErrorKind::UnsupportedTypeAnnotation {
                annotation: format!("{}.{attr}", render(value)),
            },
            loc,
        ));
    };
    if let Some(id) = imports::module_member(cx, scope, base, attr, loc)? {
        return type_of_symbol(&cx.arena, id).ok_or_else(|| {
            SemanticError::new(
                ErrorKind::UnsupportedTypeAnnotation {
                    annotation: format!("{base}.{attr}"),
                },
                loc,
            )
        });
    }
    if cx.arena.resolve(scope, base).is_none() {
        return Err(SemanticError::new(
            ErrorKind::UndeclaredType {
                name: base.to_owned(),
            },
            loc,
        ));
    }
    // `Struct.member` names the member's declared type.
    let owner = resolve_name(cx, scope, base, value.loc)?;
    if let Ty::Struct(id) = owner {
        let real = cx.arena.symbol_get_past_external(id);
        if let Some(member_scope) = cx.arena.symbol(real).owned_scope() {
            if let Some(ty) = cx
                .arena
                .get_local(member_scope, attr)
                .and_then(|m| cx.arena.variable_type(m))
            {
                return Ok(ty.clone());
            }
        }
    }
    Err(SemanticError::new(
        ErrorKind::UnsupportedTypeAnnotation {
            annotation: format!("{base}.{attr}"),
        },
        loc,
    ))
}

fn resolve_subscript(
    cx: &mut Compilation<'_>,
    scope: ScopeId,
    value: &ast::Expr,
    slice: &ast::Expr,
    whole: &ast::Expr,
) -> SemaResult<Annotation> {
    let items: Vec<&ast::Expr> = match &slice.kind {
        AstKind::Tuple(items) => items.iter().collect(),
        _ => vec![slice],
    };
    let head = value.as_name().unwrap_or("");
    match head {
        "list" | "set" => {
            let [element] = items.as_slice() else {
                return Err(unsupported(whole));
            };
            let element = resolve_type(cx, scope, element)?;
            let ty = if head == "list" {
                Ty::list(element)
            } else {
                Ty::set(element)
            };
            Ok(Annotation::plain(ty))
        }
        "dict" => {
            let [key, value] = items.as_slice() else {
                return Err(unsupported(whole));
            };
            let key_ty = resolve_type(cx, scope, key)?;
            if key_ty.is_real() || key_ty.is_complex() {
                return Err(SemanticError::new(
                    ErrorKind::InvalidKeyType {
                        key: type_to_string(&key_ty, &cx.arena),
                    },
                    key.loc,
                )
                .with_hint("use an integer, string or tuple key"));
            }
            let value_ty = resolve_type(cx, scope, value)?;
            Ok(Annotation::plain(Ty::dict(key_ty, value_ty)))
        }
        "tuple" => {
            let elements = items
                .iter()
                .map(|e| resolve_type(cx, scope, e))
                .collect::<SemaResult<Vec<_>>>()?;
            Ok(Annotation::plain(Ty::Tuple(elements)))
        }
        "Pointer" | "Const" | "Allocatable" | "In" | "Out" | "InOut" => {
            let [inner] = items.as_slice() else {
                return Err(unsupported(whole));
            };
            let mut inner = resolve(cx, scope, inner)?;
            match head {
                "Pointer" => inner.ty = Ty::pointer(inner.ty),
                "Const" => inner.ty = Ty::constant(inner.ty),
                "Allocatable" => inner.allocatable = true,
                "In" => inner.intent = Some(Intent::In),
                "Out" => inner.intent = Some(Intent::Out),
                _ => inner.intent = Some(Intent::InOut),
            }
            Ok(inner)
        }
        "Callable" => {
            let [params, ret] = items.as_slice() else {
                return Err(unsupported(whole));
            };
            let AstKind::List(params) = &params.kind else {
                return Err(unsupported(whole));
            };
            let params = params
                .iter()
                .map(|p| resolve_type(cx, scope, p))
                .collect::<SemaResult<Vec<_>>>()?;
            let ret = match ret.kind {
                AstKind::NoneLit => None,
                _ => Some(Box::new(resolve_type(cx, scope, ret)?)),
            };
            Ok(Annotation::plain(Ty::Function(FunctionType { params, ret })))
        }
        "Array" => {
            let Some((base, dims)) = items.split_first() else {
                return Err(unsupported(whole));
            };
            let base = resolve_type(cx, scope, base)?;
            let dims = dimensions(cx, scope, dims)?;
            Ok(Annotation::plain(Ty::array(base, dims)))
        }
        _ => {
            let base = resolve_type(cx, scope, value)?;
            if base.is_array() {
                return Err(unsupported(whole));
            }
            let dims = dimensions(cx, scope, &items)?;
            Ok(Annotation::plain(Ty::array(base, dims)))
        }
    }
}

fn dimensions(
    cx: &Compilation<'_>,
    scope: ScopeId,
    items: &[&ast::Expr],
) -> SemaResult<Vec<Dimension>> {
    items
        .iter()
        .map(|item| dimension(&cx.arena, scope, item))
        .collect()
}

/// One dimension: `:` deferred, `n` zero-based of length `n`, `a:b`
/// inclusive bounds.
fn dimension(arena: &SymbolArena, scope: ScopeId, item: &ast::Expr) -> SemaResult<Dimension> {
    match &item.kind {
        AstKind::Slice {
            lower: None,
            upper: None,
            ..
        } => Ok(Dimension::deferred()),
        AstKind::Slice { lower, upper, .. } => {
            let start = match lower {
                Some(lower) => dimension_bound(arena, scope, lower)?,
                None => Expr::integer(0, 4, item.loc),
            };
            let Some(upper) = upper else {
                return Err(unsupported(item));
            };
            let end = dimension_bound(arena, scope, upper)?;
            let length = dimension_length(&start, end);
            Ok(Dimension {
                start: Some(start),
                length: Some(length),
            })
        }
        _ => {
            let length = dimension_bound(arena, scope, item)?;
            Ok(Dimension {
                start: Some(Expr::integer(0, length.ty.kind().unwrap_or(4), item.loc)),
                length: Some(length),
            })
        }
    }
}

fn dimension_bound(arena: &SymbolArena, scope: ScopeId, expr: &ast::Expr) -> SemaResult<Expr> {
    let bound = lower_static_expr(arena, scope, expr)?;
    if !bound.ty.is_integer() {
        return Err(SemanticError::new(
            ErrorKind::TypeMismatch {
                expected: "i32".to_owned(),
                found: type_to_string(&bound.ty, arena),
            },
            expr.loc,
        ));
    }
    Ok(bound)
}

/// Length of the inclusive range `start..=end`, simplified.
///
/// ```text
/// 3, 7         -> 5
/// 2, n + 1     -> n
/// 1, n         -> n
/// 0, e         -> e + 1
/// a, b         -> b - a + 1
/// ```
pub fn dimension_length(start: &Expr, end: Expr) -> Expr {
    let loc = end.loc;
    if let (Some(s), Some(e)) = (start.integer_value(), end.integer_value()) {
        if let Some(n) = e.checked_sub(s).and_then(|d| d.checked_add(1)) {
            return Expr::integer(n, end.ty.kind().unwrap_or(4), loc);
        }
    }
    if let Some(s) = start.integer_value() {
        if let ExprKind::IntegerBinOp { left, op, right } = &end.kind {
            if let Some(c) = right.integer_value() {
                let adjust = match op {
                    BinOp::Sub => c
                        .checked_add(s)
                        .and_then(|v| v.checked_sub(1))
                        .and_then(i64::checked_neg),
                    BinOp::Add => c.checked_sub(s).and_then(|v| v.checked_add(1)),
                    _ => None,
                };
                if let Some(k) = adjust {
                    return offset((**left).clone(), k);
                }
            }
        }
        if let Some(k) = 1i64.checked_sub(s) {
            return offset(end, k);
        }
    }
    let diff = integer_binop(end, BinOp::Sub, start.clone());
    offset(diff, 1)
}

/// `e + k`, written as `e - |k|` for negative `k` and as `e` for zero.
fn offset(e: Expr, k: i64) -> Expr {
    let kind = e.ty.kind().unwrap_or(4);
    let loc = e.loc;
    match k {
        0 => e,
        k if k > 0 => integer_binop(e, BinOp::Add, Expr::integer(k, kind, loc)),
        k => integer_binop(e, BinOp::Sub, Expr::integer(-k, kind, loc)),
    }
}

/// An `IntegerBinOp` node, folded when both sides are constant.
pub(crate) fn integer_binop(left: Expr, op: BinOp, right: Expr) -> Expr {
    let value = match (&left.value, &right.value) {
        (Some(l), Some(r)) => consteval::fold_binop(l, op, r),
        _ => None,
    };
    let ty = left.ty.peel_const().clone();
    let loc = left.loc.merge(right.loc);
    Expr::new(
        ExprKind::IntegerBinOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        ty,
        loc,
    )
    .with_value(value)
}

/// Lower an expression of the constant sublanguage.
///
/// Literals, names of variables, unary minus, `+ - * // /` and scalar casts
/// such as `i64(5)`. The result carries a value when every leaf is a
/// literal or a constant; a reference to a runtime variable (for example a
/// parameter used as an array bound) lowers to a plain `Var`.
pub(crate) fn lower_static_expr(
    arena: &SymbolArena,
    scope: ScopeId,
    expr: &ast::Expr,
) -> SemaResult<Expr> {
    ensure_sufficient_stack(|| lower_static_inner(arena, scope, expr))
}

fn lower_static_inner(arena: &SymbolArena, scope: ScopeId, expr: &ast::Expr) -> SemaResult<Expr> {
    let loc = expr.loc;
    match &expr.kind {
        AstKind::Int(v) => Ok(integer_literal(*v, loc)),
        AstKind::Float(v) => Ok(Expr::real(*v, 8, loc)),
        AstKind::Imag(v) => Ok(Expr::new(ExprKind::ComplexConstant(0.0, *v), Ty::complex(8), loc)
            .with_value(Some(Constant::Complex(0.0, *v)))),
        AstKind::Bool(v) => Ok(Expr::logical(*v, loc)),
        AstKind::Str(s) => Ok(Expr::string(s, loc)),
        AstKind::Name(name) => {
            let Some(id) = arena.resolve(scope, name) else {
                return Err(SemanticError::new(
                    ErrorKind::UndeclaredSymbol { name: name.clone() },
                    loc,
                ));
            };
            let real = arena.symbol_get_past_external(id);
            let Some(var) = arena.symbol(real).as_variable() else {
                return Err(SemanticError::new(
                    ErrorKind::invalid(format!(
                        "{} `{name}` cannot be used in a constant expression",
                        arena.symbol(real).kind_name()
                    )),
                    loc,
                ));
            };
            let value = if var.ty.is_const() {
                var.value.clone()
            } else {
                None
            };
            Ok(Expr::var(id, var.ty.peel_const().clone(), loc).with_value(value))
        }
        AstKind::UnaryOp {
            op: UnaryOperator::USub,
            operand,
        } => {
            let operand = lower_static_expr(arena, scope, operand)?;
            let value = operand.value.as_ref().and_then(consteval::fold_unary_minus);
            let ty = operand.ty.clone();
            let kind = if ty.is_integer() {
                ExprKind::IntegerUnaryMinus(Box::new(operand))
            } else if ty.is_real() {
                ExprKind::RealUnaryMinus(Box::new(operand))
            } else if ty.is_complex() {
                ExprKind::ComplexUnaryMinus(Box::new(operand))
            } else {
                return Err(SemanticError::new(
                    ErrorKind::invalid("unary minus needs a numeric operand"),
                    loc,
                ));
            };
            Ok(Expr::new(kind, ty, loc).with_value(value))
        }
        AstKind::UnaryOp {
            op: UnaryOperator::UAdd,
            operand,
        } => lower_static_expr(arena, scope, operand),
        AstKind::BinOp { left, op, right } => {
            let left = lower_static_expr(arena, scope, left)?;
            let right = lower_static_expr(arena, scope, right)?;
            lower_static_binop(arena, left, *op, right, loc)
        }
        AstKind::Call { func, args, keywords } if keywords.is_empty() && args.len() == 1 => {
            let target = func.as_name().and_then(scalar_keyword);
            let Some(target) = target else {
                return Err(not_static(expr));
            };
            let arg = lower_static_expr(arena, scope, &args[0])?;
            perform_casting(arg, &target, arena)
        }
        _ => Err(not_static(expr)),
    }
}

fn lower_static_binop(
    arena: &SymbolArena,
    left: Expr,
    op: Operator,
    right: Expr,
    loc: Location,
) -> SemaResult<Expr> {
    let (left, right, ty) = unify_binop_operands(left, right, arena)?;
    let op = match op {
        Operator::Add => BinOp::Add,
        Operator::Sub => BinOp::Sub,
        Operator::Mult => BinOp::Mul,
        Operator::FloorDiv if ty.is_integer() => BinOp::Div,
        Operator::Div if ty.is_real() => BinOp::Div,
        _ => {
            return Err(SemanticError::new(
                ErrorKind::invalid("operator not allowed in a constant expression"),
                loc,
            ))
        }
    };
    if op == BinOp::Div && right.value.as_ref().is_some_and(is_zero) {
        return Err(SemanticError::new(ErrorKind::DivisionByZero, right.loc));
    }
    if ty.is_integer() {
        return Ok(integer_binop(left, op, right));
    }
    if !ty.is_real() {
        return Err(SemanticError::new(
            ErrorKind::invalid(format!(
                "operator not supported for `{}` in a constant expression",
                type_to_string(&ty, arena)
            )),
            loc,
        ));
    }
    let value = match (&left.value, &right.value) {
        (Some(l), Some(r)) => consteval::fold_binop(l, op, r),
        _ => None,
    };
    Ok(Expr::new(
        ExprKind::RealBinOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        ty,
        loc,
    )
    .with_value(value))
}

pub(crate) fn is_zero(value: &Constant) -> bool {
    match value {
        Constant::Integer(v) => *v == 0,
        Constant::UnsignedInteger(v) => *v == 0,
        Constant::Real(v) => *v == 0.0,
        Constant::Complex(re, im) => *re == 0.0 && *im == 0.0,
        Constant::Logical(_) | Constant::Str(_) => false,
    }
}

/// An integer literal: `i32` when it fits, `i64` otherwise.
pub(crate) fn integer_literal(value: i64, loc: Location) -> Expr {
    let kind = if i32::try_from(value).is_ok() { 4 } else { 8 };
    Expr::integer(value, kind, loc)
}

fn not_static(expr: &ast::Expr) -> SemanticError {
    SemanticError::new(
        ErrorKind::unsupported(format!("`{}` in a constant expression", render(expr))),
        expr.loc,
    )
}

fn unsupported(annotation: &ast::Expr) -> SemanticError {
    SemanticError::new(
        ErrorKind::UnsupportedTypeAnnotation {
            annotation: render(annotation),
        },
        annotation.loc,
    )
}

/// Source-like rendering of an expression, for messages.
pub fn render(expr: &ast::Expr) -> String {
    match &expr.kind {
        AstKind::Name(name) => name.clone(),
        AstKind::Int(v) => v.to_string(),
        AstKind::Float(v) => v.to_string(),
        AstKind::Imag(v) => format!("{v}j"),
        AstKind::Str(s) => format!("{s:?}"),
        AstKind::Bool(true) => "True".to_owned(),
        AstKind::Bool(false) => "False".to_owned(),
        AstKind::NoneLit => "None".to_owned(),
        AstKind::Attribute { value, attr } => format!("{}.{attr}", render(value)),
        AstKind::Subscript { value, slice } => {
            let inner = match &slice.kind {
                AstKind::Tuple(items) => join(items),
                _ => render(slice),
            };
            format!("{}[{inner}]", render(value))
        }
        AstKind::Slice { lower, upper, .. } => format!(
            "{}:{}",
            lower.as_deref().map(render).unwrap_or_default(),
            upper.as_deref().map(render).unwrap_or_default()
        ),
        AstKind::List(items) => format!("[{}]", join(items)),
        AstKind::Tuple(items) => format!("({})", join(items)),
        AstKind::Call { func, args, .. } => format!("{}({})", render(func), join(args)),
        AstKind::BinOp { left, right, .. } => format!("{} op {}", render(left), render(right)),
        _ => "<expression>".to_owned(),
    }
}

fn join(items: &[ast::Expr]) -> String {
    items.iter().map(render).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
