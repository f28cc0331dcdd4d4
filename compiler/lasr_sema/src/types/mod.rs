//! Canonical type representation and structural equality.
//!
//! # Design
//!
//! [`Ty`] is a closed sum type. Scalars carry a byte-width `kind`, aggregates
//! carry the [`SymbolId`] of their defining symbol (possibly an
//! `ExternalSymbol`), and `Pointer`/`Const`/`Allocatable` are wrappers.
//!
//! The wrapper constructors peel a directly nested wrapper of the same kind,
//! so `Pointer(Pointer(_))` and `Const(Const(_))` are never built. Use them
//! instead of the variants.
//!
//! Equality is structural and lives in [`types_equal`] because it needs the
//! symbol arena: two `Struct` types are equal when their symbols resolve to
//! the same definition past any `ExternalSymbol`.

use crate::ir::Expr;
use crate::symbols::{SymbolArena, SymbolId};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Ty {
    Integer { kind: u8 },
    UnsignedInteger { kind: u8 },
    Real { kind: u8 },
    Complex { kind: u8 },
    Logical { kind: u8 },
    Character,
    Struct(SymbolId),
    /// The polymorphic view of a struct, used for `self` in methods.
    Class(SymbolId),
    Enum(SymbolId),
    Union(SymbolId),
    List(Box<Ty>),
    Set(Box<Ty>),
    Dict(Box<Ty>, Box<Ty>),
    Tuple(Vec<Ty>),
    Function(FunctionType),
    TypeParameter(String),
    Pointer(Box<Ty>),
    Allocatable(Box<Ty>),
    Const(Box<Ty>),
    CPtr,
    SymbolicExpression,
    Array(Box<Ty>, Vec<Dimension>),
}

/// Signature of a callable value.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionType {
    pub params: Vec<Ty>,
    pub ret: Option<Box<Ty>>,
}

/// One array dimension: `start` plus `length`, both absent for a
/// runtime-shaped (deferred) dimension.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Dimension {
    pub start: Option<Expr>,
    pub length: Option<Expr>,
}

impl Dimension {
    pub fn deferred() -> Self {
        Dimension {
            start: None,
            length: None,
        }
    }

    pub fn is_deferred(&self) -> bool {
        self.length.is_none()
    }

    /// The length, when it is a compile-time constant.
    pub fn constant_length(&self) -> Option<i64> {
        self.length.as_ref().and_then(Expr::integer_value)
    }
}

impl Ty {
    pub const fn integer(kind: u8) -> Ty {
        Ty::Integer { kind }
    }

    pub const fn unsigned(kind: u8) -> Ty {
        Ty::UnsignedInteger { kind }
    }

    pub const fn real(kind: u8) -> Ty {
        Ty::Real { kind }
    }

    pub const fn complex(kind: u8) -> Ty {
        Ty::Complex { kind }
    }

    /// `bool`, always four bytes wide.
    pub const fn logical() -> Ty {
        Ty::Logical { kind: 4 }
    }

    /// Wrap in `Pointer`, never nesting two pointers.
    pub fn pointer(inner: Ty) -> Ty {
        match inner {
            Ty::Pointer(_) => inner,
            other => Ty::Pointer(Box::new(other)),
        }
    }

    /// Wrap in `Const`, never nesting two consts.
    pub fn constant(inner: Ty) -> Ty {
        match inner {
            Ty::Const(_) => inner,
            other => Ty::Const(Box::new(other)),
        }
    }

    pub fn allocatable(inner: Ty) -> Ty {
        match inner {
            Ty::Allocatable(_) => inner,
            other => Ty::Allocatable(Box::new(other)),
        }
    }

    pub fn list(element: Ty) -> Ty {
        Ty::List(Box::new(element))
    }

    pub fn set(element: Ty) -> Ty {
        Ty::Set(Box::new(element))
    }

    pub fn dict(key: Ty, value: Ty) -> Ty {
        Ty::Dict(Box::new(key), Box::new(value))
    }

    /// An array of `base`; no dimensions means the scalar itself.
    pub fn array(base: Ty, dims: Vec<Dimension>) -> Ty {
        if dims.is_empty() {
            base
        } else {
            Ty::Array(Box::new(base), dims)
        }
    }

    pub fn peel_const(&self) -> &Ty {
        match self {
            Ty::Const(inner) => inner,
            other => other,
        }
    }

    pub fn peel_pointer(&self) -> &Ty {
        match self {
            Ty::Pointer(inner) => inner,
            other => other,
        }
    }

    pub fn peel_allocatable(&self) -> &Ty {
        match self {
            Ty::Allocatable(inner) => inner,
            other => other,
        }
    }

    /// Strip every `Const`, `Allocatable` and `Pointer` layer.
    pub fn peel_wrappers(&self) -> &Ty {
        match self {
            Ty::Const(inner) | Ty::Allocatable(inner) | Ty::Pointer(inner) => inner.peel_wrappers(),
            other => other,
        }
    }

    /// Byte width of a scalar.
    pub fn kind(&self) -> Option<u8> {
        match self.peel_wrappers() {
            Ty::Integer { kind }
            | Ty::UnsignedInteger { kind }
            | Ty::Real { kind }
            | Ty::Complex { kind }
            | Ty::Logical { kind } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.peel_const(), Ty::Integer { .. })
    }

    pub fn is_unsigned_integer(&self) -> bool {
        matches!(self.peel_const(), Ty::UnsignedInteger { .. })
    }

    pub fn is_real(&self) -> bool {
        matches!(self.peel_const(), Ty::Real { .. })
    }

    pub fn is_complex(&self) -> bool {
        matches!(self.peel_const(), Ty::Complex { .. })
    }

    pub fn is_logical(&self) -> bool {
        matches!(self.peel_const(), Ty::Logical { .. })
    }

    pub fn is_character(&self) -> bool {
        matches!(self.peel_const(), Ty::Character)
    }

    /// Integer, unsigned, real or complex.
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_unsigned_integer() || self.is_real() || self.is_complex()
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Ty::Pointer(_))
    }

    pub fn is_const(&self) -> bool {
        matches!(self, Ty::Const(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.peel_wrappers(), Ty::Array(..))
    }

    /// Number of array dimensions, zero for non-arrays.
    pub fn rank(&self) -> usize {
        match self.peel_wrappers() {
            Ty::Array(_, dims) => dims.len(),
            _ => 0,
        }
    }

    /// Element type of an array, the type itself otherwise.
    pub fn array_base(&self) -> &Ty {
        match self.peel_wrappers() {
            Ty::Array(base, _) => base,
            other => other,
        }
    }

    /// Collect type-parameter names in first-occurrence order.
    pub fn collect_type_parameters(&self, out: &mut Vec<String>) {
        match self {
            Ty::TypeParameter(name) => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
            Ty::List(inner)
            | Ty::Set(inner)
            | Ty::Pointer(inner)
            | Ty::Allocatable(inner)
            | Ty::Const(inner)
            | Ty::Array(inner, _) => inner.collect_type_parameters(out),
            Ty::Dict(key, value) => {
                key.collect_type_parameters(out);
                value.collect_type_parameters(out);
            }
            Ty::Tuple(elements) => {
                for element in elements {
                    element.collect_type_parameters(out);
                }
            }
            Ty::Function(sig) => {
                for param in &sig.params {
                    param.collect_type_parameters(out);
                }
                if let Some(ret) = &sig.ret {
                    ret.collect_type_parameters(out);
                }
            }
            _ => {}
        }
    }

    pub fn contains_type_parameter(&self) -> bool {
        let mut found = Vec::new();
        self.collect_type_parameters(&mut found);
        !found.is_empty()
    }
}

/// Structural type equality.
///
/// `Const` and `Allocatable` wrappers are ignored; `Pointer` is not. Arrays
/// compare by element type and rank, not by extent.
pub fn types_equal(a: &Ty, b: &Ty, arena: &SymbolArena) -> bool {
    let (a, b) = (strip_storage(a), strip_storage(b));
    match (a, b) {
        (Ty::Integer { kind: x }, Ty::Integer { kind: y })
        | (Ty::UnsignedInteger { kind: x }, Ty::UnsignedInteger { kind: y })
        | (Ty::Real { kind: x }, Ty::Real { kind: y })
        | (Ty::Complex { kind: x }, Ty::Complex { kind: y })
        | (Ty::Logical { kind: x }, Ty::Logical { kind: y }) => x == y,
        (Ty::Character, Ty::Character)
        | (Ty::CPtr, Ty::CPtr)
        | (Ty::SymbolicExpression, Ty::SymbolicExpression) => true,
        (
            Ty::Struct(x) | Ty::Class(x),
            Ty::Struct(y) | Ty::Class(y),
        )
        | (Ty::Enum(x), Ty::Enum(y))
        | (Ty::Union(x), Ty::Union(y)) => {
            arena.symbol_get_past_external(*x) == arena.symbol_get_past_external(*y)
        }
        (Ty::List(x), Ty::List(y)) | (Ty::Set(x), Ty::Set(y)) | (Ty::Pointer(x), Ty::Pointer(y)) => {
            types_equal(x, y, arena)
        }
        (Ty::Dict(xk, xv), Ty::Dict(yk, yv)) => {
            types_equal(xk, yk, arena) && types_equal(xv, yv, arena)
        }
        (Ty::Tuple(xs), Ty::Tuple(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| types_equal(x, y, arena))
        }
        (Ty::Function(x), Ty::Function(y)) => {
            x.params.len() == y.params.len()
                && x
                    .params
                    .iter()
                    .zip(&y.params)
                    .all(|(p, q)| types_equal(p, q, arena))
                && match (&x.ret, &y.ret) {
                    (Some(p), Some(q)) => types_equal(p, q, arena),
                    (None, None) => true,
                    _ => false,
                }
        }
        (Ty::TypeParameter(x), Ty::TypeParameter(y)) => x == y,
        (Ty::Array(xb, xd), Ty::Array(yb, yd)) => {
            xd.len() == yd.len() && types_equal(xb, yb, arena)
        }
        _ => false,
    }
}

fn strip_storage(ty: &Ty) -> &Ty {
    match ty {
        Ty::Const(inner) | Ty::Allocatable(inner) => strip_storage(inner),
        other => other,
    }
}

/// Canonical surface spelling of a type, e.g. `i32`, `list[f64]`, `f64[:, 3]`.
pub fn type_to_string(ty: &Ty, arena: &SymbolArena) -> String {
    match ty {
        Ty::Integer { kind } => format!("i{}", u32::from(*kind) * 8),
        Ty::UnsignedInteger { kind } => format!("u{}", u32::from(*kind) * 8),
        Ty::Real { kind } => format!("f{}", u32::from(*kind) * 8),
        Ty::Complex { kind } => format!("c{}", u32::from(*kind) * 8),
        Ty::Logical { .. } => "bool".to_owned(),
        Ty::Character => "str".to_owned(),
        Ty::CPtr => "CPtr".to_owned(),
        Ty::SymbolicExpression => "S".to_owned(),
        Ty::Struct(id) | Ty::Class(id) | Ty::Enum(id) | Ty::Union(id) => arena
            .symbol(arena.symbol_get_past_external(*id))
            .name
            .clone(),
        Ty::List(inner) => format!("list[{}]", type_to_string(inner, arena)),
        Ty::Set(inner) => format!("set[{}]", type_to_string(inner, arena)),
        Ty::Dict(key, value) => format!(
            "dict[{}, {}]",
            type_to_string(key, arena),
            type_to_string(value, arena)
        ),
        Ty::Tuple(elements) => format!("tuple[{}]", join(elements, arena)),
        Ty::Function(sig) => format!(
            "Callable[[{}], {}]",
            join(&sig.params, arena),
            sig.ret
                .as_ref()
                .map_or_else(|| "None".to_owned(), |r| type_to_string(r, arena))
        ),
        Ty::TypeParameter(name) => name.clone(),
        Ty::Pointer(inner) => format!("Pointer[{}]", type_to_string(inner, arena)),
        Ty::Const(inner) => format!("Const[{}]", type_to_string(inner, arena)),
        Ty::Allocatable(inner) => format!("Allocatable[{}]", type_to_string(inner, arena)),
        Ty::Array(base, dims) => {
            let dims: Vec<String> = dims
                .iter()
                .map(|d| {
                    d.constant_length()
                        .map_or_else(|| ":".to_owned(), |n| n.to_string())
                })
                .collect();
            format!("{}[{}]", type_to_string(base, arena), dims.join(", "))
        }
    }
}

fn join(types: &[Ty], arena: &SymbolArena) -> String {
    types
        .iter()
        .map(|t| type_to_string(t, arena))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
