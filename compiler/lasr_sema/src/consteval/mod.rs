//! Compile-time evaluation of operators on [`Constant`] values.
//!
//! Every function here is total: an operation that has no compile-time
//! result (overflow, division by zero, mixed domains) returns `None` and the
//! operator node simply carries no value. Hard errors such as a literal zero
//! divisor are reported by lowering before it asks for a fold.
//!
//! Integer semantics follow the source language: `Div` is floor division,
//! `Mod` takes the sign of the divisor.

use crate::ir::{BinOp, CastKind, CmpOp, Constant, LogicalOp};
use crate::types::Ty;

/// Fold `left op right` when both sides are constants of the same domain.
pub fn fold_binop(left: &Constant, op: BinOp, right: &Constant) -> Option<Constant> {
    match (left, right) {
        (Constant::Integer(l), Constant::Integer(r)) => {
            integer_binop(*l, op, *r).map(Constant::Integer)
        }
        (Constant::UnsignedInteger(l), Constant::UnsignedInteger(r)) => {
            unsigned_binop(*l, op, *r).map(Constant::UnsignedInteger)
        }
        (Constant::Real(l), Constant::Real(r)) => real_binop(*l, op, *r).map(Constant::Real),
        (Constant::Complex(a, b), Constant::Complex(c, d)) => {
            complex_binop((*a, *b), op, (*c, *d)).map(|(re, im)| Constant::Complex(re, im))
        }
        _ => None,
    }
}

pub fn integer_binop(l: i64, op: BinOp, r: i64) -> Option<i64> {
    match op {
        BinOp::Add => l.checked_add(r),
        BinOp::Sub => l.checked_sub(r),
        BinOp::Mul => l.checked_mul(r),
        BinOp::Div => floor_div(l, r),
        BinOp::Mod => floor_mod(l, r),
        BinOp::Pow => u32::try_from(r).ok().and_then(|e| l.checked_pow(e)),
        BinOp::BitAnd => Some(l & r),
        BinOp::BitOr => Some(l | r),
        BinOp::BitXor => Some(l ^ r),
        BinOp::BitLShift => shift_amount(r).and_then(|s| l.checked_shl(s)),
        BinOp::BitRShift => shift_amount(r).and_then(|s| l.checked_shr(s)),
    }
}

fn floor_div(l: i64, r: i64) -> Option<i64> {
    let q = l.checked_div(r)?;
    if (l % r != 0) && ((l < 0) != (r < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

fn floor_mod(l: i64, r: i64) -> Option<i64> {
    let m = l.checked_rem(r)?;
    if m != 0 && ((m < 0) != (r < 0)) {
        Some(m + r)
    } else {
        Some(m)
    }
}

fn shift_amount(r: i64) -> Option<u32> {
    u32::try_from(r).ok().filter(|s| *s < 64)
}

pub fn unsigned_binop(l: u64, op: BinOp, r: u64) -> Option<u64> {
    match op {
        BinOp::Add => l.checked_add(r),
        BinOp::Sub => l.checked_sub(r),
        BinOp::Mul => l.checked_mul(r),
        BinOp::Div => l.checked_div(r),
        BinOp::Mod => l.checked_rem(r),
        BinOp::Pow => u32::try_from(r).ok().and_then(|e| l.checked_pow(e)),
        BinOp::BitAnd => Some(l & r),
        BinOp::BitOr => Some(l | r),
        BinOp::BitXor => Some(l ^ r),
        BinOp::BitLShift => u32::try_from(r).ok().and_then(|s| l.checked_shl(s)),
        BinOp::BitRShift => u32::try_from(r).ok().and_then(|s| l.checked_shr(s)),
    }
}

pub fn real_binop(l: f64, op: BinOp, r: f64) -> Option<f64> {
    let value = match op {
        BinOp::Add => l + r,
        BinOp::Sub => l - r,
        BinOp::Mul => l * r,
        BinOp::Div if r != 0.0 => l / r,
        BinOp::Pow => l.powf(r),
        _ => return None,
    };
    value.is_finite().then_some(value)
}

pub fn complex_binop(l: (f64, f64), op: BinOp, r: (f64, f64)) -> Option<(f64, f64)> {
    let (a, b) = l;
    let (c, d) = r;
    match op {
        BinOp::Add => Some((a + c, b + d)),
        BinOp::Sub => Some((a - c, b - d)),
        BinOp::Mul => Some((a * c - b * d, a * d + b * c)),
        BinOp::Div => {
            let denom = c * c + d * d;
            (denom != 0.0).then(|| ((a * c + b * d) / denom, (b * c - a * d) / denom))
        }
        _ => None,
    }
}

/// Real floor division, `l // r` on floats.
pub fn real_floor_div(l: f64, r: f64) -> Option<f64> {
    (r != 0.0).then(|| (l / r).floor())
}

pub fn fold_compare(left: &Constant, op: CmpOp, right: &Constant) -> Option<bool> {
    match (left, right) {
        (Constant::Integer(l), Constant::Integer(r)) => Some(compare(l, op, r)),
        (Constant::UnsignedInteger(l), Constant::UnsignedInteger(r)) => Some(compare(l, op, r)),
        (Constant::Real(l), Constant::Real(r)) => Some(compare(l, op, r)),
        (Constant::Logical(l), Constant::Logical(r)) => Some(compare(l, op, r)),
        (Constant::Str(l), Constant::Str(r)) => Some(compare(l, op, r)),
        (Constant::Complex(a, b), Constant::Complex(c, d)) => match op {
            CmpOp::Eq => Some(a == c && b == d),
            CmpOp::NotEq => Some(a != c || b != d),
            _ => None,
        },
        _ => None,
    }
}

fn compare<T: PartialOrd + ?Sized>(l: &T, op: CmpOp, r: &T) -> bool {
    match op {
        CmpOp::Eq => l == r,
        CmpOp::NotEq => l != r,
        CmpOp::Lt => l < r,
        CmpOp::LtE => l <= r,
        CmpOp::Gt => l > r,
        CmpOp::GtE => l >= r,
    }
}

pub fn fold_logical(left: &Constant, op: LogicalOp, right: &Constant) -> Option<Constant> {
    let (l, r) = (left.as_logical()?, right.as_logical()?);
    Some(Constant::Logical(match op {
        LogicalOp::And => l && r,
        LogicalOp::Or => l || r,
    }))
}

pub fn fold_unary_minus(value: &Constant) -> Option<Constant> {
    match value {
        Constant::Integer(v) => v.checked_neg().map(Constant::Integer),
        Constant::Real(v) => Some(Constant::Real(-v)),
        Constant::Complex(re, im) => Some(Constant::Complex(-re, -im)),
        _ => None,
    }
}

pub fn fold_bit_not(value: &Constant) -> Option<Constant> {
    match value {
        Constant::Integer(v) => Some(Constant::Integer(!v)),
        _ => None,
    }
}

pub fn fold_not(value: &Constant) -> Option<Constant> {
    value.as_logical().map(|v| Constant::Logical(!v))
}

/// Convert a constant through a cast. The caller drops the result if it
/// does not fit the target kind.
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "casts mirror the numeric conversion the generated code performs"
)]
pub fn fold_cast(kind: CastKind, value: &Constant, target: &Ty) -> Option<Constant> {
    let target = target.peel_const();
    match (kind, value) {
        (CastKind::IntegerToReal, Constant::Integer(v)) => Some(Constant::Real(*v as f64)),
        (CastKind::UnsignedIntegerToReal, Constant::UnsignedInteger(v)) => {
            Some(Constant::Real(*v as f64))
        }
        (CastKind::IntegerToInteger, Constant::Integer(v)) => Some(Constant::Integer(*v)),
        (CastKind::IntegerToComplex, Constant::Integer(v)) => {
            Some(Constant::Complex(*v as f64, 0.0))
        }
        (CastKind::IntegerToLogical, Constant::Integer(v)) => Some(Constant::Logical(*v != 0)),
        (CastKind::IntegerToUnsignedInteger, Constant::Integer(v)) => {
            u64::try_from(*v).ok().map(Constant::UnsignedInteger)
        }
        (CastKind::UnsignedIntegerToInteger, Constant::UnsignedInteger(v)) => {
            i64::try_from(*v).ok().map(Constant::Integer)
        }
        (CastKind::UnsignedIntegerToUnsignedInteger, Constant::UnsignedInteger(v)) => {
            Some(Constant::UnsignedInteger(*v))
        }
        (CastKind::RealToInteger, Constant::Real(v)) => real_to_i64(*v).map(Constant::Integer),
        (CastKind::RealToUnsignedInteger, Constant::Real(v)) => {
            real_to_i64(*v).and_then(|i| u64::try_from(i).ok()).map(Constant::UnsignedInteger)
        }
        (CastKind::RealToReal, Constant::Real(v)) => Some(Constant::Real(match target {
            Ty::Real { kind: 4 } => f64::from(*v as f32),
            _ => *v,
        })),
        (CastKind::RealToComplex, Constant::Real(v)) => Some(Constant::Complex(*v, 0.0)),
        (CastKind::RealToLogical, Constant::Real(v)) => Some(Constant::Logical(*v != 0.0)),
        (CastKind::ComplexToReal, Constant::Complex(re, _)) => Some(Constant::Real(*re)),
        (CastKind::ComplexToComplex, Constant::Complex(re, im)) => {
            Some(Constant::Complex(*re, *im))
        }
        (CastKind::ComplexToLogical, Constant::Complex(re, im)) => {
            Some(Constant::Logical(*re != 0.0 || *im != 0.0))
        }
        (CastKind::LogicalToInteger, Constant::Logical(v)) => {
            Some(Constant::Integer(i64::from(*v)))
        }
        (CastKind::LogicalToReal, Constant::Logical(v)) => {
            Some(Constant::Real(if *v { 1.0 } else { 0.0 }))
        }
        (CastKind::CharacterToInteger, Constant::Str(s)) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(Constant::Integer(i64::from(u32::from(c)))),
                _ => None,
            }
        }
        _ => None,
    }
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    reason = "range checked before the conversion"
)]
fn real_to_i64(v: f64) -> Option<i64> {
    let t = v.trunc();
    (t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64).then_some(t as i64)
}

#[cfg(test)]
mod tests;
