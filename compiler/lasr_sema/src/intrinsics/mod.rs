//! Built-in functions the dialect provides without a definition.
//!
//! A name that resolves to nothing in the scope chain is looked up here
//! before it is reported as undeclared. Typing and folding of each
//! intrinsic happens in [`lower_intrinsic`].

use lasr_ir::Location;

use crate::cast::{cast_priority, perform_casting, unify_binop_operands};
use crate::consteval;
use crate::error::{ErrorKind, SemaResult, SemanticError};
use crate::ir::{BinOp, CmpOp, Constant, Expr, ExprKind};
use crate::symbols::SymbolArena;
use crate::types::{type_to_string, Ty};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Intrinsic {
    Abs,
    Len,
    Min,
    Max,
    Pow,
    /// Floor division of reals; integers use `IntegerBinOp` `Div`.
    FloorDiv,
}

impl Intrinsic {
    /// The intrinsic callable by `name` from source.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "abs" => Some(Intrinsic::Abs),
            "len" => Some(Intrinsic::Len),
            "min" => Some(Intrinsic::Min),
            "max" => Some(Intrinsic::Max),
            "pow" => Some(Intrinsic::Pow),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Intrinsic::Abs => "abs",
            Intrinsic::Len => "len",
            Intrinsic::Min => "min",
            Intrinsic::Max => "max",
            Intrinsic::Pow => "pow",
            Intrinsic::FloorDiv => "floordiv",
        }
    }
}

/// Type-check an intrinsic call and fold it when every argument is constant.
pub fn lower_intrinsic(
    intrinsic: Intrinsic,
    args: Vec<Expr>,
    loc: Location,
    arena: &SymbolArena,
) -> SemaResult<Expr> {
    match intrinsic {
        Intrinsic::Abs => {
            let [arg] = exactly::<1>(intrinsic, args, loc)?;
            let ty = match arg.ty.peel_const() {
                Ty::Complex { kind } => Ty::real(*kind),
                t if t.is_integer() || t.is_real() => t.clone(),
                _ => return Err(bad_argument(intrinsic, &arg, arena)),
            };
            let value = arg.value.as_ref().and_then(|v| match v {
                Constant::Integer(i) => i.checked_abs().map(Constant::Integer),
                Constant::Real(r) => Some(Constant::Real(r.abs())),
                Constant::Complex(re, im) => Some(Constant::Real(re.hypot(*im))),
                _ => None,
            });
            Ok(call(intrinsic, vec![arg], ty, loc).with_value(value))
        }
        Intrinsic::Len => {
            let [arg] = exactly::<1>(intrinsic, args, loc)?;
            let sized = matches!(
                arg.ty.peel_wrappers(),
                Ty::Character | Ty::List(_) | Ty::Set(_) | Ty::Dict(..) | Ty::Tuple(_) | Ty::Array(..)
            );
            if !sized {
                return Err(bad_argument(intrinsic, &arg, arena));
            }
            let length = match (&arg.value, &arg.kind, arg.ty.peel_const()) {
                (Some(Constant::Str(s)), _, _) => i64::try_from(s.chars().count()).ok(),
                (_, _, Ty::Tuple(elements)) => i64::try_from(elements.len()).ok(),
                (_, ExprKind::ListConstant(items), _) => i64::try_from(items.len()).ok(),
                _ => None,
            };
            Ok(call(intrinsic, vec![arg], Ty::integer(4), loc)
                .with_value(length.map(Constant::Integer)))
        }
        Intrinsic::Min | Intrinsic::Max => {
            if args.len() < 2 {
                return Err(arity(intrinsic, 2, args.len(), loc));
            }
            let mut target: Option<Ty> = None;
            for arg in &args {
                if !(arg.ty.is_integer() || arg.ty.is_real()) {
                    return Err(bad_argument(intrinsic, arg, arena));
                }
                let wider = target
                    .as_ref()
                    .map_or(true, |t| cast_priority(&arg.ty) > cast_priority(t));
                if wider {
                    target = Some(arg.ty.peel_const().clone());
                }
            }
            let ty = target.unwrap_or(Ty::integer(4));
            let unified = args
                .into_iter()
                .map(|arg| perform_casting(arg, &ty, arena))
                .collect::<SemaResult<Vec<_>>>()?;
            let value = fold_extremum(intrinsic == Intrinsic::Max, &unified);
            Ok(call(intrinsic, unified, ty, loc).with_value(value))
        }
        Intrinsic::Pow => {
            let [base, exponent] = exactly::<2>(intrinsic, args, loc)?;
            let (base, exponent, ty) = unify_binop_operands(base, exponent, arena)?;
            if !ty.is_numeric() {
                return Err(bad_argument(intrinsic, &base, arena));
            }
            let value = match (&base.value, &exponent.value) {
                (Some(b), Some(e)) => consteval::fold_binop(b, BinOp::Pow, e),
                _ => None,
            };
            Ok(call(intrinsic, vec![base, exponent], ty, loc).with_value(value))
        }
        Intrinsic::FloorDiv => {
            let [left, right] = exactly::<2>(intrinsic, args, loc)?;
            let (left, right, ty) = unify_binop_operands(left, right, arena)?;
            if !ty.is_real() {
                return Err(bad_argument(intrinsic, &left, arena));
            }
            let value = match (&left.value, &right.value) {
                (Some(Constant::Real(l)), Some(Constant::Real(r))) => {
                    consteval::real_floor_div(*l, *r).map(Constant::Real)
                }
                _ => None,
            };
            Ok(call(intrinsic, vec![left, right], ty, loc).with_value(value))
        }
    }
}

fn call(intrinsic: Intrinsic, args: Vec<Expr>, ty: Ty, loc: Location) -> Expr {
    Expr::new(ExprKind::IntrinsicCall { intrinsic, args }, ty, loc)
}

fn exactly<const N: usize>(
    intrinsic: Intrinsic,
    args: Vec<Expr>,
    loc: Location,
) -> SemaResult<[Expr; N]> {
    let found = args.len();
    <[Expr; N]>::try_from(args).map_err(|_| arity(intrinsic, N, found, loc))
}

fn arity(intrinsic: Intrinsic, expected: usize, found: usize, loc: Location) -> SemanticError {
    SemanticError::new(
        ErrorKind::ArityMismatch {
            callee: intrinsic.name().to_owned(),
            expected,
            found,
        },
        loc,
    )
}

fn bad_argument(intrinsic: Intrinsic, arg: &Expr, arena: &SymbolArena) -> SemanticError {
    SemanticError::new(
        ErrorKind::invalid(format!(
            "`{}` does not accept an argument of type `{}`",
            intrinsic.name(),
            type_to_string(&arg.ty, arena)
        )),
        arg.loc,
    )
}

fn fold_extremum(max: bool, args: &[Expr]) -> Option<Constant> {
    let mut best: Option<Constant> = None;
    for arg in args {
        let value = arg.value.clone()?;
        best = Some(match best {
            None => value,
            Some(current) => {
                let op = if max { CmpOp::Gt } else { CmpOp::Lt };
                if consteval::fold_compare(&value, op, &current)? {
                    value
                } else {
                    current
                }
            }
        });
    }
    best
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
