//! Expression lowering.
//!
//! Every node gets its static type here, operands are brought to a common
//! type with explicit casts, and the node's value is folded whenever its
//! operands are known.

use lasr_ir::ast::{self, BoolOperator, CmpOperator, ExprKind as AstKind, Operator, UnaryOperator};
use lasr_ir::Location;

use super::call::CallResult;
use super::{Frame, Lowerer};
use crate::annotation::{integer_literal, is_zero};
use crate::cast::{cast_for_assignment, perform_casting, unify_binop_operands};
use crate::consteval;
use crate::error::{ErrorKind, SemaResult, SemanticError};
use crate::imports;
use crate::intrinsics::{lower_intrinsic, Intrinsic};
use crate::ir::{BinOp, CmpOp, Constant, Expr, ExprKind, LogicalOp};
use crate::stack::ensure_sufficient_stack;
use crate::symbols::{Intent, Storage, SymbolArena, SymbolId, SymbolKind};
use crate::types::{type_to_string, types_equal, Ty};

/// Build an arithmetic node of type `ty` over operands already of that
/// type, folding it when both are known.
pub(crate) fn arithmetic(left: Expr, op: BinOp, right: Expr, ty: Ty, loc: Location) -> Expr {
    let value = match (&left.value, &right.value) {
        (Some(l), Some(r)) => consteval::fold_binop(l, op, r),
        _ => None,
    };
    let (left, right) = (Box::new(left), Box::new(right));
    let kind = if ty.is_integer() {
        ExprKind::IntegerBinOp { left, op, right }
    } else if ty.is_unsigned_integer() {
        ExprKind::UnsignedIntegerBinOp { left, op, right }
    } else if ty.is_real() {
        ExprKind::RealBinOp { left, op, right }
    } else {
        ExprKind::ComplexBinOp { left, op, right }
    };
    Expr::new(kind, ty, loc).with_value(value)
}

fn operator_symbol(op: Operator) -> &'static str {
    match op {
        Operator::Add => "+",
        Operator::Sub => "-",
        Operator::Mult => "*",
        Operator::Div => "/",
        Operator::FloorDiv => "//",
        Operator::Mod => "%",
        Operator::Pow => "**",
        Operator::LShift => "<<",
        Operator::RShift => ">>",
        Operator::BitOr => "|",
        Operator::BitXor => "^",
        Operator::BitAnd => "&",
    }
}

fn compare_op(op: CmpOperator) -> CmpOp {
    match op {
        CmpOperator::Eq => CmpOp::Eq,
        CmpOperator::NotEq => CmpOp::NotEq,
        CmpOperator::Lt => CmpOp::Lt,
        CmpOperator::LtE => CmpOp::LtE,
        CmpOperator::Gt => CmpOp::Gt,
        CmpOperator::GtE => CmpOp::GtE,
    }
}

fn invalid(message: impl Into<String>, loc: Location) -> SemanticError {
    SemanticError::new(ErrorKind::invalid(message), loc)
}

impl Lowerer<'_, '_> {
    pub(super) fn lower_expr(&mut self, frame: Frame, expr: &ast::Expr) -> SemaResult<Expr> {
        ensure_sufficient_stack(|| self.lower_expr_inner(frame, expr))
    }

    /// Lower `expr` where a value of type `expected` is wanted.
    ///
    /// Container literals take their element types from `expected`, so
    /// `x: list[f64] = []` and `x: list[i64] = [1, 2]` type-check.
    pub(super) fn lower_expr_with(
        &mut self,
        frame: Frame,
        expr: &ast::Expr,
        expected: &Ty,
    ) -> SemaResult<Expr> {
        let expected = expected.peel_const().peel_allocatable();
        match (&expr.kind, expected) {
            (AstKind::List(items), Ty::List(element)) => {
                self.lower_sequence(frame, items, Some(&**element), expr.loc, false)
            }
            (AstKind::Set(items), Ty::Set(element)) => {
                self.lower_sequence(frame, items, Some(&**element), expr.loc, true)
            }
            (AstKind::Dict { keys, values }, Ty::Dict(key, value)) => {
                self.lower_dict(frame, keys, values, Some((&**key, &**value)), expr.loc)
            }
            (AstKind::Tuple(items), Ty::Tuple(elements)) if items.len() == elements.len() => {
                let mut lowered = Vec::with_capacity(items.len());
                for (item, element) in items.iter().zip(elements) {
                    let value = self.lower_expr_with(frame, item, element)?;
                    lowered.push(self.convert(value, element)?);
                }
                Ok(tuple(lowered, expr.loc))
            }
            _ => self.lower_expr(frame, expr),
        }
    }

    /// Convert `value` for storage into something of type `target`.
    pub(super) fn convert(&self, value: Expr, target: &Ty) -> SemaResult<Expr> {
        cast_for_assignment(value, target, &self.cx.arena, &self.cx.options)
    }

    fn lower_expr_inner(&mut self, frame: Frame, expr: &ast::Expr) -> SemaResult<Expr> {
        let loc = expr.loc;
        match &expr.kind {
            AstKind::Int(v) => Ok(integer_literal(*v, loc)),
            AstKind::Float(v) => Ok(Expr::real(*v, 8, loc)),
            AstKind::Imag(v) => Ok(Expr::new(ExprKind::ComplexConstant(0.0, *v), Ty::complex(8), loc)
                .with_value(Some(Constant::Complex(0.0, *v)))),
            AstKind::Str(s) => Ok(Expr::string(s, loc)),
            AstKind::Bool(b) => Ok(Expr::logical(*b, loc)),
            AstKind::NoneLit => Err(invalid("`None` cannot be used as a value", loc)),
            AstKind::Name(name) => {
                let Some(id) = self.cx.arena.resolve(frame.scope, name) else {
                    return Err(SemanticError::new(
                        ErrorKind::UndeclaredSymbol { name: name.clone() },
                        loc,
                    ));
                };
                self.symbol_value(id, name, loc)
            }
            AstKind::BinOp { left, op, right } => {
                let left = self.lower_expr(frame, left)?;
                let right = self.lower_expr(frame, right)?;
                self.lower_binop(left, *op, right, loc)
            }
            AstKind::UnaryOp { op, operand } => {
                let operand = self.lower_expr(frame, operand)?;
                self.lower_unary(*op, operand, loc)
            }
            AstKind::BoolOp { op, values } => {
                let op = match op {
                    BoolOperator::And => LogicalOp::And,
                    BoolOperator::Or => LogicalOp::Or,
                };
                let mut result: Option<Expr> = None;
                for value in values {
                    let value = self.lower_expr(frame, value)?;
                    let value = self.condition(value)?;
                    result = Some(match result {
                        None => value,
                        Some(left) => logical_binop(left, op, value, loc),
                    });
                }
                result.ok_or_else(|| invalid("empty boolean operation", loc))
            }
            AstKind::Compare {
                left,
                ops,
                comparators,
            } => {
                let mut left = self.lower_expr(frame, left)?;
                let mut result: Option<Expr> = None;
                for (op, comparator) in ops.iter().zip(comparators) {
                    let right = self.lower_expr(frame, comparator)?;
                    let compared = self.compare(left, compare_op(*op), right.clone(), loc)?;
                    result = Some(match result {
                        None => compared,
                        Some(chain) => logical_binop(chain, LogicalOp::And, compared, loc),
                    });
                    left = right;
                }
                result.ok_or_else(|| invalid("comparison without operands", loc))
            }
            AstKind::Call {
                func,
                args,
                keywords,
            } => match self.lower_call(frame, func, args, keywords, loc)? {
                CallResult::Value(value) => Ok(value),
                CallResult::Subroutine { callee, .. } => Err(invalid(
                    format!(
                        "subroutine `{}` does not return a value",
                        self.cx.arena.symbol_name(callee)
                    ),
                    loc,
                )),
            },
            AstKind::Attribute { value, attr } => self.lower_attribute(frame, value, attr, loc),
            AstKind::Subscript { value, slice } => {
                let base = self.lower_expr(frame, value)?;
                self.index_into(frame, base, slice, loc)
            }
            AstKind::Slice { .. } => Err(SemanticError::new(ErrorKind::unsupported("slicing"), loc)),
            AstKind::List(items) => self.lower_sequence(frame, items, None, loc, false),
            AstKind::Set(items) => self.lower_sequence(frame, items, None, loc, true),
            AstKind::Tuple(items) => {
                let lowered = items
                    .iter()
                    .map(|item| self.lower_expr(frame, item))
                    .collect::<SemaResult<Vec<_>>>()?;
                Ok(tuple(lowered, loc))
            }
            AstKind::Dict { keys, values } => self.lower_dict(frame, keys, values, None, loc),
            AstKind::IfExp { test, body, orelse } => {
                let test = self.lower_expr(frame, test)?;
                let test = self.condition(test)?;
                let body = self.lower_expr(frame, body)?;
                let orelse = self.lower_expr(frame, orelse)?;
                let (body, orelse, ty) = if types_equal(&body.ty, &orelse.ty, &self.cx.arena) {
                    let ty = body.ty.peel_const().clone();
                    (body, orelse, ty)
                } else {
                    unify_binop_operands(body, orelse, &self.cx.arena)?
                };
                let value = match test.value.as_ref().and_then(Constant::as_logical) {
                    Some(true) => body.value.clone(),
                    Some(false) => orelse.value.clone(),
                    None => None,
                };
                Ok(Expr::new(
                    ExprKind::IfExp {
                        test: Box::new(test),
                        body: Box::new(body),
                        orelse: Box::new(orelse),
                    },
                    ty,
                    loc,
                )
                .with_value(value))
            }
        }
    }

    /// A reference to the variable `id`, bound as `name`.
    pub(super) fn symbol_value(&self, id: SymbolId, name: &str, loc: Location) -> SemaResult<Expr> {
        let real = self.cx.arena.symbol_get_past_external(id);
        let symbol = self.cx.arena.symbol(real);
        let SymbolKind::Variable(var) = &symbol.kind else {
            return Err(invalid(
                format!("{} `{name}` cannot be used as a value", symbol.kind_name()),
                loc,
            ));
        };
        let type_variable = matches!(&var.ty, Ty::TypeParameter(t) if *t == symbol.name)
            && var.intent == Intent::Local;
        if type_variable {
            return Err(invalid(
                format!("type variable `{name}` cannot be used as a value"),
                loc,
            ));
        }
        let value = if var.storage == Storage::Parameter {
            var.value.clone()
        } else {
            None
        };
        Ok(Expr::var(id, var.ty.peel_const().clone(), loc).with_value(value))
    }

    pub(super) fn lower_binop(
        &self,
        left: Expr,
        op: Operator,
        right: Expr,
        loc: Location,
    ) -> SemaResult<Expr> {
        let arena = &self.cx.arena;
        for operand in [&left, &right] {
            if let Ty::TypeParameter(name) = operand.ty.peel_wrappers() {
                return Err(invalid(
                    format!(
                        "operator `{}` is not defined for type parameter `{name}`; call a restriction function instead",
                        operator_symbol(op)
                    ),
                    operand.loc,
                ));
            }
        }
        if left.ty.peel_wrappers().is_character() || right.ty.peel_wrappers().is_character() {
            return self.string_binop(left, op, right, loc);
        }
        let (mut left, mut right, mut ty) = unify_binop_operands(left, right, arena)?;
        if ty.is_logical() {
            let int = Ty::integer(4);
            left = perform_casting(left, &int, arena)?;
            right = perform_casting(right, &int, arena)?;
            ty = int;
        }
        if !ty.is_numeric() {
            return Err(invalid(
                format!(
                    "operator `{}` is not defined for `{}`",
                    operator_symbol(op),
                    type_to_string(&ty, arena)
                ),
                loc,
            ));
        }
        let integral = ty.is_integer() || ty.is_unsigned_integer();
        let divisor_is_zero = right.value.as_ref().is_some_and(is_zero);
        let op = match op {
            Operator::Add => BinOp::Add,
            Operator::Sub => BinOp::Sub,
            Operator::Mult => BinOp::Mul,
            Operator::Pow => BinOp::Pow,
            Operator::Div => {
                if divisor_is_zero {
                    return Err(SemanticError::new(ErrorKind::DivisionByZero, right.loc));
                }
                if integral {
                    let real = Ty::real(8);
                    let left = perform_casting(left, &real, arena)?;
                    let right = perform_casting(right, &real, arena)?;
                    return Ok(arithmetic(left, BinOp::Div, right, real, loc));
                }
                BinOp::Div
            }
            Operator::FloorDiv => {
                if divisor_is_zero {
                    return Err(SemanticError::new(ErrorKind::DivisionByZero, right.loc));
                }
                if ty.is_real() {
                    return lower_intrinsic(Intrinsic::FloorDiv, vec![left, right], loc, arena);
                }
                if ty.is_complex() {
                    return Err(invalid("`//` is not defined for complex numbers", loc));
                }
                BinOp::Div
            }
            Operator::Mod => {
                if divisor_is_zero {
                    return Err(SemanticError::new(ErrorKind::DivisionByZero, right.loc));
                }
                if ty.is_complex() {
                    return Err(invalid("`%` is not defined for complex numbers", loc));
                }
                BinOp::Mod
            }
            Operator::LShift | Operator::RShift | Operator::BitAnd | Operator::BitOr | Operator::BitXor => {
                if !integral {
                    return Err(invalid(
                        format!(
                            "operator `{}` needs integer operands, found `{}`",
                            operator_symbol(op),
                            type_to_string(&ty, arena)
                        ),
                        loc,
                    ));
                }
                match op {
                    Operator::LShift | Operator::RShift => {
                        if let Some(amount) = right.integer_value().filter(|a| *a < 0) {
                            return Err(SemanticError::new(
                                ErrorKind::NegativeShift { amount },
                                right.loc,
                            ));
                        }
                        if op == Operator::LShift {
                            BinOp::BitLShift
                        } else {
                            BinOp::BitRShift
                        }
                    }
                    Operator::BitAnd => BinOp::BitAnd,
                    Operator::BitOr => BinOp::BitOr,
                    _ => BinOp::BitXor,
                }
            }
        };
        Ok(arithmetic(left, op, right, ty, loc))
    }

    /// `+` concatenates strings and `*` repeats one; nothing else applies.
    fn string_binop(&self, left: Expr, op: Operator, right: Expr, loc: Location) -> SemaResult<Expr> {
        let arena = &self.cx.arena;
        let (l_str, r_str) = (left.ty.is_character(), right.ty.is_character());
        match op {
            Operator::Add if l_str && r_str => {
                let value = match (&left.value, &right.value) {
                    (Some(Constant::Str(a)), Some(Constant::Str(b))) => {
                        Some(Constant::Str(format!("{a}{b}")))
                    }
                    _ => None,
                };
                Ok(Expr::new(
                    ExprKind::StringConcat(Box::new(left), Box::new(right)),
                    Ty::Character,
                    loc,
                )
                .with_value(value))
            }
            Operator::Mult if l_str != r_str => {
                let (string, count) = if l_str { (left, right) } else { (right, left) };
                if !count.ty.is_integer() {
                    return Err(invalid(
                        format!(
                            "a string can only be repeated an integer number of times, not `{}`",
                            type_to_string(&count.ty, arena)
                        ),
                        count.loc,
                    ));
                }
                let value = match (&string.value, count.integer_value()) {
                    (Some(Constant::Str(s)), Some(n)) => {
                        usize::try_from(n.max(0)).ok().map(|n| Constant::Str(s.repeat(n)))
                    }
                    _ => None,
                };
                Ok(Expr::new(
                    ExprKind::StringRepeat(Box::new(string), Box::new(count)),
                    Ty::Character,
                    loc,
                )
                .with_value(value))
            }
            Operator::Div if l_str && r_str => Err(invalid("division is not defined for `str`", loc)),
            _ => Err(invalid(
                format!(
                    "operator `{}` is not defined for `{}` and `{}`",
                    operator_symbol(op),
                    type_to_string(&left.ty, arena),
                    type_to_string(&right.ty, arena)
                ),
                loc,
            )),
        }
    }

    fn lower_unary(&self, op: UnaryOperator, operand: Expr, loc: Location) -> SemaResult<Expr> {
        let arena = &self.cx.arena;
        if let Ty::TypeParameter(name) = operand.ty.peel_wrappers() {
            return Err(invalid(
                format!("unary operators are not defined for type parameter `{name}`"),
                loc,
            ));
        }
        match op {
            UnaryOperator::Not => {
                let operand = self.condition(operand)?;
                let value = operand.value.as_ref().and_then(consteval::fold_not);
                Ok(Expr::new(ExprKind::LogicalNot(Box::new(operand)), Ty::logical(), loc)
                    .with_value(value))
            }
            UnaryOperator::UAdd => {
                if !operand.ty.is_numeric() {
                    return Err(invalid(
                        format!("unary `+` is not defined for `{}`", type_to_string(&operand.ty, arena)),
                        loc,
                    ));
                }
                Ok(operand)
            }
            UnaryOperator::USub => {
                let operand = if operand.ty.is_logical() {
                    perform_casting(operand, &Ty::integer(4), arena)?
                } else {
                    operand
                };
                let ty = operand.ty.peel_const().clone();
                let value = operand.value.as_ref().and_then(consteval::fold_unary_minus);
                let kind = if ty.is_integer() {
                    ExprKind::IntegerUnaryMinus(Box::new(operand))
                } else if ty.is_real() {
                    ExprKind::RealUnaryMinus(Box::new(operand))
                } else if ty.is_complex() {
                    ExprKind::ComplexUnaryMinus(Box::new(operand))
                } else {
                    return Err(invalid(
                        format!("unary `-` is not defined for `{}`", type_to_string(&ty, arena)),
                        loc,
                    ));
                };
                Ok(Expr::new(kind, ty, loc).with_value(value))
            }
            UnaryOperator::Invert => {
                let operand = if operand.ty.is_logical() {
                    perform_casting(operand, &Ty::integer(4), arena)?
                } else {
                    operand
                };
                if !operand.ty.is_integer() {
                    return Err(invalid(
                        format!("`~` needs an integer operand, found `{}`", type_to_string(&operand.ty, arena)),
                        loc,
                    ));
                }
                let ty = operand.ty.peel_const().clone();
                let value = operand.value.as_ref().and_then(consteval::fold_bit_not);
                Ok(Expr::new(ExprKind::IntegerBitNot(Box::new(operand)), ty, loc).with_value(value))
            }
        }
    }

    /// `expr` as a `bool`, casting numbers.
    pub(super) fn condition(&self, expr: Expr) -> SemaResult<Expr> {
        if expr.ty.is_logical() {
            return Ok(expr);
        }
        if expr.ty.is_numeric() {
            return perform_casting(expr, &Ty::logical(), &self.cx.arena);
        }
        Err(SemanticError::new(
            ErrorKind::TypeMismatch {
                expected: "bool".to_owned(),
                found: type_to_string(&expr.ty, &self.cx.arena),
            },
            expr.loc,
        ))
    }

    fn compare(&self, left: Expr, op: CmpOp, right: Expr, loc: Location) -> SemaResult<Expr> {
        let arena = &self.cx.arena;
        let (left, right) = (self.enum_operand(left), self.enum_operand(right));
        let (left, right, ty) = if left.ty.is_character() || right.ty.is_character() {
            if !(left.ty.is_character() && right.ty.is_character()) {
                return Err(SemanticError::new(
                    ErrorKind::TypeMismatch {
                        expected: type_to_string(&left.ty, arena),
                        found: type_to_string(&right.ty, arena),
                    },
                    right.loc,
                ));
            }
            (left, right, Ty::Character)
        } else {
            unify_binop_operands(left, right, arena)?
        };
        let value = match (&left.value, &right.value) {
            (Some(l), Some(r)) => consteval::fold_compare(l, op, r).map(Constant::Logical),
            _ => None,
        };
        let (left, right) = (Box::new(left), Box::new(right));
        let kind = match &ty {
            Ty::Character => ExprKind::StringCompare { left, op, right },
            Ty::Logical { .. } => ExprKind::LogicalCompare { left, op, right },
            Ty::Integer { .. } => ExprKind::IntegerCompare { left, op, right },
            Ty::UnsignedInteger { .. } => ExprKind::UnsignedIntegerCompare { left, op, right },
            Ty::Real { .. } => ExprKind::RealCompare { left, op, right },
            Ty::Complex { .. } if matches!(op, CmpOp::Eq | CmpOp::NotEq) => {
                ExprKind::ComplexCompare { left, op, right }
            }
            _ => {
                return Err(invalid(
                    format!("values of type `{}` cannot be compared", type_to_string(&ty, arena)),
                    loc,
                ))
            }
        };
        Ok(Expr::new(kind, Ty::logical(), loc).with_value(value))
    }

    /// Enumeration members compare through their underlying values.
    fn enum_operand(&self, expr: Expr) -> Expr {
        if matches!(expr.ty.peel_wrappers(), Ty::Enum(_)) {
            self.enum_value_of(expr)
        } else {
            expr
        }
    }

    fn enum_value_of(&self, expr: Expr) -> Expr {
        let arena = &self.cx.arena;
        let underlying = match expr.ty.peel_wrappers() {
            Ty::Enum(id) => match &arena.symbol(arena.symbol_get_past_external(*id)).kind {
                SymbolKind::Enum(e) => e.underlying.clone(),
                _ => Ty::integer(4),
            },
            _ => Ty::integer(4),
        };
        let value = match &expr.kind {
            ExprKind::EnumValue { member, .. } => arena
                .symbol(arena.symbol_get_past_external(*member))
                .as_variable()
                .and_then(|v| v.value.clone()),
            _ => None,
        };
        let loc = expr.loc;
        Expr::new(ExprKind::EnumValueOf(Box::new(expr)), underlying, loc).with_value(value)
    }

    fn lower_sequence(
        &mut self,
        frame: Frame,
        items: &[ast::Expr],
        expected: Option<&Ty>,
        loc: Location,
        is_set: bool,
    ) -> SemaResult<Expr> {
        let what = if is_set { "set" } else { "list" };
        let mut lowered = Vec::with_capacity(items.len());
        let mut element = expected.cloned();
        for item in items {
            let value = match &element {
                Some(ty) => {
                    let value = self.lower_expr_with(frame, item, ty)?;
                    self.convert(value, ty)?
                }
                None => {
                    let value = self.lower_expr(frame, item)?;
                    element = Some(value.ty.peel_const().clone());
                    value
                }
            };
            lowered.push(value);
        }
        let Some(element) = element else {
            return Err(invalid(
                format!("cannot infer the element type of an empty {what}; annotate the target"),
                loc,
            ));
        };
        if is_set {
            check_key_type(&element, loc, &self.cx.arena)?;
            Ok(Expr::new(ExprKind::SetConstant(lowered), Ty::set(element), loc))
        } else {
            Ok(Expr::new(ExprKind::ListConstant(lowered), Ty::list(element), loc))
        }
    }

    fn lower_dict(
        &mut self,
        frame: Frame,
        keys: &[ast::Expr],
        values: &[ast::Expr],
        expected: Option<(&Ty, &Ty)>,
        loc: Location,
    ) -> SemaResult<Expr> {
        let mut key_ty = expected.map(|(k, _)| k.clone());
        let mut value_ty = expected.map(|(_, v)| v.clone());
        let (mut lowered_keys, mut lowered_values) = (Vec::new(), Vec::new());
        for (key, value) in keys.iter().zip(values) {
            let key = self.lower_expr(frame, key)?;
            let key = match &key_ty {
                Some(ty) => self.convert(key, ty)?,
                None => {
                    key_ty = Some(key.ty.peel_const().clone());
                    key
                }
            };
            let value = match &value_ty {
                Some(ty) => {
                    let lowered = self.lower_expr_with(frame, value, ty)?;
                    self.convert(lowered, ty)?
                }
                None => {
                    let lowered = self.lower_expr(frame, value)?;
                    value_ty = Some(lowered.ty.peel_const().clone());
                    lowered
                }
            };
            lowered_keys.push(key);
            lowered_values.push(value);
        }
        let (Some(key_ty), Some(value_ty)) = (key_ty, value_ty) else {
            return Err(invalid(
                "cannot infer the types of an empty dict; annotate the target",
                loc,
            ));
        };
        check_key_type(&key_ty, loc, &self.cx.arena)?;
        Ok(Expr::new(
            ExprKind::DictConstant {
                keys: lowered_keys,
                values: lowered_values,
            },
            Ty::dict(key_ty, value_ty),
            loc,
        ))
    }

    /// `base[slice]` for an already lowered `base`.
    pub(super) fn index_into(
        &mut self,
        frame: Frame,
        base: Expr,
        slice: &ast::Expr,
        loc: Location,
    ) -> SemaResult<Expr> {
        if matches!(slice.kind, AstKind::Slice { .. }) {
            return Err(SemanticError::new(ErrorKind::unsupported("slicing"), slice.loc));
        }
        match base.ty.peel_wrappers().clone() {
            Ty::Array(element, dims) => {
                let index_asts = match &slice.kind {
                    AstKind::Tuple(items) => items.iter().collect::<Vec<_>>(),
                    _ => vec![slice],
                };
                if index_asts.len() != dims.len() {
                    return Err(invalid(
                        format!(
                            "array of rank {} indexed with {} subscript(s)",
                            dims.len(),
                            index_asts.len()
                        ),
                        slice.loc,
                    ));
                }
                let mut indices = Vec::with_capacity(index_asts.len());
                for index in index_asts {
                    let index = self.lower_expr(frame, index)?;
                    indices.push(self.index(index)?);
                }
                Ok(Expr::new(
                    ExprKind::ArrayItem {
                        array: Box::new(base),
                        indices,
                    },
                    *element,
                    loc,
                ))
            }
            Ty::List(element) => {
                let index = self.lower_expr(frame, slice)?;
                let index = self.index(index)?;
                Ok(Expr::new(
                    ExprKind::ListItem {
                        list: Box::new(base),
                        index: Box::new(index),
                    },
                    *element,
                    loc,
                ))
            }
            Ty::Dict(key, value) => {
                let lowered = self.lower_expr(frame, slice)?;
                let lowered = self.convert(lowered, &key)?;
                Ok(Expr::new(
                    ExprKind::DictItem {
                        dict: Box::new(base),
                        key: Box::new(lowered),
                    },
                    *value,
                    loc,
                ))
            }
            Ty::Tuple(elements) => {
                let index = self.lower_expr(frame, slice)?;
                let index = self.index(index)?;
                let Some(position) = index.integer_value() else {
                    return Err(invalid("a tuple index must be a compile-time constant", index.loc));
                };
                let len = i64::try_from(elements.len()).unwrap_or(i64::MAX);
                let normalized = if position < 0 { position + len } else { position };
                let Some(element) = usize::try_from(normalized).ok().and_then(|i| elements.get(i)) else {
                    return Err(invalid(
                        format!("tuple index {position} out of range for a tuple of {len} element(s)"),
                        index.loc,
                    ));
                };
                let value = match &base.kind {
                    ExprKind::TupleConstant(items) => usize::try_from(normalized)
                        .ok()
                        .and_then(|i| items.get(i))
                        .and_then(|item| item.value.clone()),
                    _ => None,
                };
                let element = element.clone();
                Ok(Expr::new(
                    ExprKind::TupleItem {
                        tuple: Box::new(base),
                        index: Box::new(index),
                    },
                    element,
                    loc,
                )
                .with_value(value))
            }
            Ty::Character => {
                let index = self.lower_expr(frame, slice)?;
                let index = self.index(index)?;
                let value = match (&base.value, index.integer_value()) {
                    (Some(Constant::Str(s)), Some(i)) => {
                        let len = i64::try_from(s.chars().count()).unwrap_or(i64::MAX);
                        let i = if i < 0 { i + len } else { i };
                        usize::try_from(i)
                            .ok()
                            .and_then(|i| s.chars().nth(i))
                            .map(|c| Constant::Str(c.to_string()))
                    }
                    _ => None,
                };
                Ok(Expr::new(
                    ExprKind::StringItem {
                        string: Box::new(base),
                        index: Box::new(index),
                    },
                    Ty::Character,
                    loc,
                )
                .with_value(value))
            }
            other => Err(invalid(
                format!("`{}` is not subscriptable", type_to_string(&other, &self.cx.arena)),
                base.loc,
            )),
        }
    }

    /// An integer subscript.
    fn index(&self, index: Expr) -> SemaResult<Expr> {
        if index.ty.is_integer() {
            return Ok(index);
        }
        Err(SemanticError::new(
            ErrorKind::TypeMismatch {
                expected: "i32".to_owned(),
                found: type_to_string(&index.ty, &self.cx.arena),
            },
            index.loc,
        ))
    }

    fn lower_attribute(
        &mut self,
        frame: Frame,
        value: &ast::Expr,
        attr: &str,
        loc: Location,
    ) -> SemaResult<Expr> {
        if let Some(base) = value.as_name() {
            if let Some(id) = imports::module_member(self.cx, frame.scope, base, attr, loc)? {
                return self.symbol_value(id, &format!("{base}.{attr}"), loc);
            }
            if let Some(id) = self.cx.arena.resolve(frame.scope, base) {
                let real = self.cx.arena.symbol_get_past_external(id);
                if matches!(self.cx.arena.symbol(real).kind, SymbolKind::Enum(_)) {
                    return self.enum_member(frame, id, attr, loc);
                }
            }
        }
        let base = self.lower_expr(frame, value)?;
        self.member_of(frame, base, attr, loc)
    }

    /// `Enum.MEMBER`.
    fn enum_member(
        &mut self,
        frame: Frame,
        enum_local: SymbolId,
        attr: &str,
        loc: Location,
    ) -> SemaResult<Expr> {
        let real = self.cx.arena.symbol_get_past_external(enum_local);
        let member = self
            .cx
            .arena
            .symbol(real)
            .owned_scope()
            .and_then(|scope| self.cx.arena.get_local(scope, attr));
        let Some(member) = member else {
            return Err(invalid(
                format!("enum `{}` has no member `{attr}`", self.cx.arena.symbol_name(real)),
                loc,
            ));
        };
        let member = imports::import_aggregate_member(self.cx, frame.scope, real, member, loc)?;
        Ok(Expr::new(
            ExprKind::EnumValue {
                enum_sym: enum_local,
                member,
            },
            Ty::Enum(enum_local),
            loc,
        ))
    }

    /// `base.attr` for a struct member or `.value` of an enumeration member.
    pub(super) fn member_of(
        &mut self,
        frame: Frame,
        base: Expr,
        attr: &str,
        loc: Location,
    ) -> SemaResult<Expr> {
        match base.ty.peel_wrappers().clone() {
            Ty::Struct(owner) | Ty::Class(owner) | Ty::Union(owner) => {
                let real = self.cx.arena.symbol_get_past_external(owner);
                let member = self
                    .cx
                    .arena
                    .symbol(real)
                    .owned_scope()
                    .and_then(|scope| self.cx.arena.get_local(scope, attr))
                    .filter(|m| self.cx.arena.symbol(*m).as_variable().is_some());
                let Some(member) = member else {
                    return Err(invalid(
                        format!("`{}` has no member `{attr}`", self.cx.arena.symbol_name(real)),
                        loc,
                    ));
                };
                let ty = self
                    .cx
                    .arena
                    .variable_type(member)
                    .map(|t| t.peel_const().clone())
                    .unwrap_or(Ty::integer(4));
                let member = imports::import_aggregate_member(self.cx, frame.scope, real, member, loc)?;
                Ok(Expr::new(
                    ExprKind::StructMember {
                        base: Box::new(base),
                        member,
                    },
                    ty,
                    loc,
                ))
            }
            Ty::Enum(_) if attr == "value" => Ok(self.enum_value_of(base)),
            other => Err(invalid(
                format!(
                    "`{}` has no attribute `{attr}`",
                    type_to_string(&other, &self.cx.arena)
                ),
                loc,
            )),
        }
    }
}

fn logical_binop(left: Expr, op: LogicalOp, right: Expr, loc: Location) -> Expr {
    let value = match (&left.value, &right.value) {
        (Some(l), Some(r)) => consteval::fold_logical(l, op, r),
        _ => None,
    };
    Expr::new(
        ExprKind::LogicalBinOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        Ty::logical(),
        loc,
    )
    .with_value(value)
}

fn tuple(items: Vec<Expr>, loc: Location) -> Expr {
    let ty = Ty::Tuple(items.iter().map(|i| i.ty.peel_const().clone()).collect());
    Expr::new(ExprKind::TupleConstant(items), ty, loc)
}

/// Floating-point values are not hashable keys.
fn check_key_type(key: &Ty, loc: Location, arena: &SymbolArena) -> SemaResult<()> {
    if key.is_real() || key.is_complex() {
        return Err(SemanticError::new(
            ErrorKind::InvalidKeyType {
                key: type_to_string(key, arena),
            },
            loc,
        )
        .with_hint("use an integer, `bool` or `str` key"));
    }
    Ok(())
}
