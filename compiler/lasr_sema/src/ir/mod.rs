//! Typed intermediate representation.
//!
//! Every [`Expr`] carries its static [`Ty`] and, when known, its compile-time
//! [`Constant`]. Constant folding never replaces an operator node: a folded
//! `6 + 3` is still an `IntegerBinOp` whose `value` is `Some(9)`.
//!
//! Symbol references are [`SymbolId`]s into the compilation's
//! [`SymbolArena`](crate::SymbolArena); a reference to an imported entity
//! names the local `ExternalSymbol`, never the remote definition.

use lasr_ir::Location;

use crate::intrinsics::Intrinsic;
use crate::symbols::SymbolId;
use crate::types::Ty;

/// A compile-time value.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Constant {
    Integer(i64),
    UnsignedInteger(u64),
    Real(f64),
    Complex(f64, f64),
    Logical(bool),
    Str(String),
}

impl Constant {
    /// Check that this value is representable in `ty`.
    pub fn conforms_to(&self, ty: &Ty) -> bool {
        match (self, ty.peel_const()) {
            (Constant::Integer(v), Ty::Integer { kind }) => fits_signed(*v, *kind),
            (Constant::UnsignedInteger(v), Ty::UnsignedInteger { kind }) => {
                fits_unsigned(*v, *kind)
            }
            (Constant::Real(_), Ty::Real { .. })
            | (Constant::Complex(..), Ty::Complex { .. })
            | (Constant::Logical(_), Ty::Logical { .. })
            | (Constant::Str(_), Ty::Character) => true,
            _ => false,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Constant::Integer(v) => Some(*v),
            Constant::UnsignedInteger(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Constant::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_logical(&self) -> Option<bool> {
        match self {
            Constant::Logical(v) => Some(*v),
            _ => None,
        }
    }
}

fn fits_signed(value: i64, kind: u8) -> bool {
    match kind {
        1 => i8::try_from(value).is_ok(),
        2 => i16::try_from(value).is_ok(),
        4 => i32::try_from(value).is_ok(),
        _ => true,
    }
}

fn fits_unsigned(value: u64, kind: u8) -> bool {
    match kind {
        1 => u8::try_from(value).is_ok(),
        2 => u16::try_from(value).is_ok(),
        4 => u32::try_from(value).is_ok(),
        _ => true,
    }
}

/// Arithmetic and bitwise operators shared by the numeric domains.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    /// Floor division for integers, true division otherwise.
    Div,
    Pow,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    BitLShift,
    BitRShift,
}

impl BinOp {
    pub fn is_bitwise(self) -> bool {
        matches!(
            self,
            BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor | BinOp::BitLShift | BinOp::BitRShift
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum LogicalOp {
    And,
    Or,
}

/// The conversion a `Cast` node performs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum CastKind {
    IntegerToReal,
    IntegerToInteger,
    IntegerToComplex,
    IntegerToLogical,
    IntegerToUnsignedInteger,
    UnsignedIntegerToInteger,
    UnsignedIntegerToReal,
    UnsignedIntegerToUnsignedInteger,
    RealToInteger,
    RealToReal,
    RealToComplex,
    RealToLogical,
    RealToUnsignedInteger,
    ComplexToReal,
    ComplexToComplex,
    ComplexToLogical,
    LogicalToInteger,
    LogicalToReal,
    CharacterToInteger,
    IntegerToSymbolicExpression,
}

/// A typed expression.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: Ty,
    /// Compile-time value; always conforms to `ty` when present.
    pub value: Option<Constant>,
    pub loc: Location,
}

impl Expr {
    pub fn new(kind: ExprKind, ty: Ty, loc: Location) -> Self {
        Expr {
            kind,
            ty,
            value: None,
            loc,
        }
    }

    /// Attach a compile-time value, dropping it if it does not fit the type.
    #[must_use]
    pub fn with_value(mut self, value: Option<Constant>) -> Self {
        self.value = value.filter(|v| v.conforms_to(&self.ty));
        self
    }

    pub fn var(id: SymbolId, ty: Ty, loc: Location) -> Self {
        Expr::new(ExprKind::Var(id), ty, loc)
    }

    pub fn integer(value: i64, kind: u8, loc: Location) -> Self {
        Expr::new(ExprKind::IntegerConstant(value), Ty::integer(kind), loc)
            .with_value(Some(Constant::Integer(value)))
    }

    pub fn real(value: f64, kind: u8, loc: Location) -> Self {
        Expr::new(ExprKind::RealConstant(value), Ty::real(kind), loc)
            .with_value(Some(Constant::Real(value)))
    }

    pub fn logical(value: bool, loc: Location) -> Self {
        Expr::new(ExprKind::LogicalConstant(value), Ty::logical(), loc)
            .with_value(Some(Constant::Logical(value)))
    }

    pub fn string(value: &str, loc: Location) -> Self {
        Expr::new(ExprKind::StringConstant(value.to_owned()), Ty::Character, loc)
            .with_value(Some(Constant::Str(value.to_owned())))
    }

    /// The constant as an integer, if known.
    pub fn integer_value(&self) -> Option<i64> {
        self.value.as_ref().and_then(Constant::as_integer)
    }

    /// The referenced variable, if this is a plain variable reference.
    pub fn as_var(&self) -> Option<SymbolId> {
        match self.kind {
            ExprKind::Var(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum ExprKind {
    IntegerConstant(i64),
    RealConstant(f64),
    ComplexConstant(f64, f64),
    LogicalConstant(bool),
    StringConstant(String),
    Var(SymbolId),
    IntegerBinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    UnsignedIntegerBinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    RealBinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    ComplexBinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    LogicalBinOp {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
    },
    IntegerUnaryMinus(Box<Expr>),
    RealUnaryMinus(Box<Expr>),
    ComplexUnaryMinus(Box<Expr>),
    IntegerBitNot(Box<Expr>),
    LogicalNot(Box<Expr>),
    IntegerCompare {
        left: Box<Expr>,
        op: CmpOp,
        right: Box<Expr>,
    },
    UnsignedIntegerCompare {
        left: Box<Expr>,
        op: CmpOp,
        right: Box<Expr>,
    },
    RealCompare {
        left: Box<Expr>,
        op: CmpOp,
        right: Box<Expr>,
    },
    ComplexCompare {
        left: Box<Expr>,
        op: CmpOp,
        right: Box<Expr>,
    },
    LogicalCompare {
        left: Box<Expr>,
        op: CmpOp,
        right: Box<Expr>,
    },
    StringCompare {
        left: Box<Expr>,
        op: CmpOp,
        right: Box<Expr>,
    },
    StringConcat(Box<Expr>, Box<Expr>),
    StringRepeat(Box<Expr>, Box<Expr>),
    Cast {
        arg: Box<Expr>,
        kind: CastKind,
    },
    /// Call of a function with a return value.
    ///
    /// `original` is the generic procedure the callee was selected from.
    FunctionCall {
        callee: SymbolId,
        original: Option<SymbolId>,
        args: Vec<Expr>,
    },
    IntrinsicCall {
        intrinsic: Intrinsic,
        args: Vec<Expr>,
    },
    ArrayItem {
        array: Box<Expr>,
        indices: Vec<Expr>,
    },
    ListItem {
        list: Box<Expr>,
        index: Box<Expr>,
    },
    DictItem {
        dict: Box<Expr>,
        key: Box<Expr>,
    },
    TupleItem {
        tuple: Box<Expr>,
        index: Box<Expr>,
    },
    StringItem {
        string: Box<Expr>,
        index: Box<Expr>,
    },
    ListConstant(Vec<Expr>),
    SetConstant(Vec<Expr>),
    DictConstant {
        keys: Vec<Expr>,
        values: Vec<Expr>,
    },
    TupleConstant(Vec<Expr>),
    StructConstructor {
        ty_sym: SymbolId,
        args: Vec<Expr>,
    },
    StructMember {
        base: Box<Expr>,
        member: SymbolId,
    },
    /// A member of an enumeration, `Color.RED`.
    EnumValue {
        enum_sym: SymbolId,
        member: SymbolId,
    },
    /// The underlying value of an enumeration member, `c.value`.
    EnumValueOf(Box<Expr>),
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
}

/// A typed statement.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Stmt {
    pub kind: StmtKind,
    pub loc: Location,
}

impl Stmt {
    pub fn new(kind: StmtKind, loc: Location) -> Self {
        Stmt { kind, loc }
    }

    pub fn assignment(target: Expr, value: Expr, loc: Location) -> Self {
        Stmt::new(StmtKind::Assignment { target, value }, loc)
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum StmtKind {
    Assignment {
        target: Expr,
        value: Expr,
    },
    /// Binds an associate-block name to an expression.
    Associate {
        target: Expr,
        value: Expr,
    },
    DictInsert {
        dict: Expr,
        key: Expr,
        value: Expr,
    },
    ListSetItem {
        list: Expr,
        index: Expr,
        value: Expr,
    },
    ListAppend {
        list: Expr,
        value: Expr,
    },
    Return,
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    WhileLoop {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    /// Counted loop over `start..=end` by `step`.
    DoLoop {
        var: Expr,
        start: Expr,
        end: Expr,
        step: Expr,
        body: Vec<Stmt>,
    },
    Exit,
    Cycle,
    SubroutineCall {
        callee: SymbolId,
        original: Option<SymbolId>,
        args: Vec<Expr>,
    },
    Print(Vec<Expr>),
    Assert {
        test: Expr,
        msg: Option<Expr>,
    },
    ErrorStop(Option<Expr>),
    ExplicitDeallocate(Vec<Expr>),
    /// Execute a `Block` or `AssociateBlock` symbol.
    BlockCall(SymbolId),
}
