//! Structural rewriting of typed IR.
//!
//! [`IrFolder`] rebuilds types, expressions, statements and symbols,
//! calling back for every [`SymbolId`] and [`ScopeId`] it passes. The
//! default methods copy the input unchanged; implementors override the
//! hooks they care about and call the matching `walk_*` function to
//! recurse into children.
//!
//! Generic instantiation and module caching are both folds over a captured
//! [`relocate::Subtree`]: the first substitutes type parameters and remaps
//! ids into a fresh region of the same arena, the second remaps ids into a
//! standalone arena.

pub mod relocate;

use crate::ir::{Expr, ExprKind, Stmt, StmtKind};
use crate::stack::ensure_sufficient_stack;
use crate::symbols::{
    Block, ClassProcedure, EnumType, ExternalSymbol, Function, GenericProcedure, Module, Program,
    Scope, ScopeId, StructType, Symbol, SymbolId, SymbolKind, UnionType, Variable,
};
use crate::types::{Dimension, FunctionType, Ty};

pub trait IrFolder {
    fn fold_symbol_id(&mut self, id: SymbolId) -> SymbolId {
        id
    }

    fn fold_scope_id(&mut self, id: ScopeId) -> ScopeId {
        id
    }

    fn fold_ty(&mut self, ty: &Ty) -> Ty {
        walk_ty(self, ty)
    }

    fn fold_expr(&mut self, expr: &Expr) -> Expr {
        walk_expr(self, expr)
    }

    fn fold_stmt(&mut self, stmt: &Stmt) -> Stmt {
        walk_stmt(self, stmt)
    }

    fn fold_symbol(&mut self, symbol: &Symbol) -> Symbol {
        walk_symbol(self, symbol)
    }

    fn fold_scope(&mut self, scope: &Scope) -> Scope {
        walk_scope(self, scope)
    }
}

pub fn walk_ty<F: IrFolder + ?Sized>(f: &mut F, ty: &Ty) -> Ty {
    match ty {
        Ty::Integer { .. }
        | Ty::UnsignedInteger { .. }
        | Ty::Real { .. }
        | Ty::Complex { .. }
        | Ty::Logical { .. }
        | Ty::Character
        | Ty::CPtr
        | Ty::SymbolicExpression
        | Ty::TypeParameter(_) => ty.clone(),
        Ty::Struct(id) => Ty::Struct(f.fold_symbol_id(*id)),
        Ty::Class(id) => Ty::Class(f.fold_symbol_id(*id)),
        Ty::Enum(id) => Ty::Enum(f.fold_symbol_id(*id)),
        Ty::Union(id) => Ty::Union(f.fold_symbol_id(*id)),
        Ty::List(inner) => Ty::list(f.fold_ty(inner)),
        Ty::Set(inner) => Ty::set(f.fold_ty(inner)),
        Ty::Dict(key, value) => Ty::dict(f.fold_ty(key), f.fold_ty(value)),
        Ty::Tuple(elements) => Ty::Tuple(elements.iter().map(|e| f.fold_ty(e)).collect()),
        Ty::Function(sig) => Ty::Function(FunctionType {
            params: sig.params.iter().map(|p| f.fold_ty(p)).collect(),
            ret: sig.ret.as_ref().map(|r| Box::new(f.fold_ty(r))),
        }),
        Ty::Pointer(inner) => Ty::pointer(f.fold_ty(inner)),
        Ty::Allocatable(inner) => Ty::allocatable(f.fold_ty(inner)),
        Ty::Const(inner) => Ty::constant(f.fold_ty(inner)),
        Ty::Array(base, dims) => Ty::array(
            f.fold_ty(base),
            dims.iter()
                .map(|d| Dimension {
                    start: d.start.as_ref().map(|e| f.fold_expr(e)),
                    length: d.length.as_ref().map(|e| f.fold_expr(e)),
                })
                .collect(),
        ),
    }
}

fn boxed<F: IrFolder + ?Sized>(f: &mut F, expr: &Expr) -> Box<Expr> {
    Box::new(f.fold_expr(expr))
}

fn exprs<F: IrFolder + ?Sized>(f: &mut F, list: &[Expr]) -> Vec<Expr> {
    list.iter().map(|e| f.fold_expr(e)).collect()
}

pub fn walk_expr<F: IrFolder + ?Sized>(f: &mut F, expr: &Expr) -> Expr {
    ensure_sufficient_stack(|| {
        let kind = match &expr.kind {
            ExprKind::IntegerConstant(_)
            | ExprKind::RealConstant(_)
            | ExprKind::ComplexConstant(..)
            | ExprKind::LogicalConstant(_)
            | ExprKind::StringConstant(_) => expr.kind.clone(),
            ExprKind::Var(id) => ExprKind::Var(f.fold_symbol_id(*id)),
            ExprKind::IntegerBinOp { left, op, right } => ExprKind::IntegerBinOp {
                left: boxed(f, left),
                op: *op,
                right: boxed(f, right),
            },
            ExprKind::UnsignedIntegerBinOp { left, op, right } => ExprKind::UnsignedIntegerBinOp {
                left: boxed(f, left),
                op: *op,
                right: boxed(f, right),
            },
            ExprKind::RealBinOp { left, op, right } => ExprKind::RealBinOp {
                left: boxed(f, left),
                op: *op,
                right: boxed(f, right),
            },
            ExprKind::ComplexBinOp { left, op, right } => ExprKind::ComplexBinOp {
                left: boxed(f, left),
                op: *op,
                right: boxed(f, right),
            },
            ExprKind::LogicalBinOp { left, op, right } => ExprKind::LogicalBinOp {
                left: boxed(f, left),
                op: *op,
                right: boxed(f, right),
            },
            ExprKind::IntegerUnaryMinus(arg) => ExprKind::IntegerUnaryMinus(boxed(f, arg)),
            ExprKind::RealUnaryMinus(arg) => ExprKind::RealUnaryMinus(boxed(f, arg)),
            ExprKind::ComplexUnaryMinus(arg) => ExprKind::ComplexUnaryMinus(boxed(f, arg)),
            ExprKind::IntegerBitNot(arg) => ExprKind::IntegerBitNot(boxed(f, arg)),
            ExprKind::LogicalNot(arg) => ExprKind::LogicalNot(boxed(f, arg)),
            ExprKind::IntegerCompare { left, op, right } => ExprKind::IntegerCompare {
                left: boxed(f, left),
                op: *op,
                right: boxed(f, right),
            },
            ExprKind::UnsignedIntegerCompare { left, op, right } => {
                ExprKind::UnsignedIntegerCompare {
                    left: boxed(f, left),
                    op: *op,
                    right: boxed(f, right),
                }
            }
            ExprKind::RealCompare { left, op, right } => ExprKind::RealCompare {
                left: boxed(f, left),
                op: *op,
                right: boxed(f, right),
            },
            ExprKind::ComplexCompare { left, op, right } => ExprKind::ComplexCompare {
                left: boxed(f, left),
                op: *op,
                right: boxed(f, right),
            },
            ExprKind::LogicalCompare { left, op, right } => ExprKind::LogicalCompare {
                left: boxed(f, left),
                op: *op,
                right: boxed(f, right),
            },
            ExprKind::StringCompare { left, op, right } => ExprKind::StringCompare {
                left: boxed(f, left),
                op: *op,
                right: boxed(f, right),
            },
            ExprKind::StringConcat(l, r) => ExprKind::StringConcat(boxed(f, l), boxed(f, r)),
            ExprKind::StringRepeat(l, r) => ExprKind::StringRepeat(boxed(f, l), boxed(f, r)),
            ExprKind::Cast { arg, kind } => ExprKind::Cast {
                arg: boxed(f, arg),
                kind: *kind,
            },
            ExprKind::FunctionCall {
                callee,
                original,
                args,
            } => ExprKind::FunctionCall {
                callee: f.fold_symbol_id(*callee),
                original: original.map(|o| f.fold_symbol_id(o)),
                args: exprs(f, args),
            },
            ExprKind::IntrinsicCall { intrinsic, args } => ExprKind::IntrinsicCall {
                intrinsic: *intrinsic,
                args: exprs(f, args),
            },
            ExprKind::ArrayItem { array, indices } => ExprKind::ArrayItem {
                array: boxed(f, array),
                indices: exprs(f, indices),
            },
            ExprKind::ListItem { list, index } => ExprKind::ListItem {
                list: boxed(f, list),
                index: boxed(f, index),
            },
            ExprKind::DictItem { dict, key } => ExprKind::DictItem {
                dict: boxed(f, dict),
                key: boxed(f, key),
            },
            ExprKind::TupleItem { tuple, index } => ExprKind::TupleItem {
                tuple: boxed(f, tuple),
                index: boxed(f, index),
            },
            ExprKind::StringItem { string, index } => ExprKind::StringItem {
                string: boxed(f, string),
                index: boxed(f, index),
            },
            ExprKind::ListConstant(items) => ExprKind::ListConstant(exprs(f, items)),
            ExprKind::SetConstant(items) => ExprKind::SetConstant(exprs(f, items)),
            ExprKind::DictConstant { keys, values } => ExprKind::DictConstant {
                keys: exprs(f, keys),
                values: exprs(f, values),
            },
            ExprKind::TupleConstant(items) => ExprKind::TupleConstant(exprs(f, items)),
            ExprKind::StructConstructor { ty_sym, args } => ExprKind::StructConstructor {
                ty_sym: f.fold_symbol_id(*ty_sym),
                args: exprs(f, args),
            },
            ExprKind::StructMember { base, member } => ExprKind::StructMember {
                base: boxed(f, base),
                member: f.fold_symbol_id(*member),
            },
            ExprKind::EnumValue { enum_sym, member } => ExprKind::EnumValue {
                enum_sym: f.fold_symbol_id(*enum_sym),
                member: f.fold_symbol_id(*member),
            },
            ExprKind::EnumValueOf(arg) => ExprKind::EnumValueOf(boxed(f, arg)),
            ExprKind::IfExp { test, body, orelse } => ExprKind::IfExp {
                test: boxed(f, test),
                body: boxed(f, body),
                orelse: boxed(f, orelse),
            },
        };
        Expr {
            kind,
            ty: f.fold_ty(&expr.ty),
            value: expr.value.clone(),
            loc: expr.loc,
        }
    })
}

fn stmts<F: IrFolder + ?Sized>(f: &mut F, list: &[Stmt]) -> Vec<Stmt> {
    list.iter().map(|s| f.fold_stmt(s)).collect()
}

pub fn walk_stmt<F: IrFolder + ?Sized>(f: &mut F, stmt: &Stmt) -> Stmt {
    ensure_sufficient_stack(|| {
        let kind = match &stmt.kind {
            StmtKind::Assignment { target, value } => StmtKind::Assignment {
                target: f.fold_expr(target),
                value: f.fold_expr(value),
            },
            StmtKind::Associate { target, value } => StmtKind::Associate {
                target: f.fold_expr(target),
                value: f.fold_expr(value),
            },
            StmtKind::DictInsert { dict, key, value } => StmtKind::DictInsert {
                dict: f.fold_expr(dict),
                key: f.fold_expr(key),
                value: f.fold_expr(value),
            },
            StmtKind::ListSetItem { list, index, value } => StmtKind::ListSetItem {
                list: f.fold_expr(list),
                index: f.fold_expr(index),
                value: f.fold_expr(value),
            },
            StmtKind::ListAppend { list, value } => StmtKind::ListAppend {
                list: f.fold_expr(list),
                value: f.fold_expr(value),
            },
            StmtKind::Return => StmtKind::Return,
            StmtKind::Exit => StmtKind::Exit,
            StmtKind::Cycle => StmtKind::Cycle,
            StmtKind::If { test, body, orelse } => StmtKind::If {
                test: f.fold_expr(test),
                body: stmts(f, body),
                orelse: stmts(f, orelse),
            },
            StmtKind::WhileLoop { test, body, orelse } => StmtKind::WhileLoop {
                test: f.fold_expr(test),
                body: stmts(f, body),
                orelse: stmts(f, orelse),
            },
            StmtKind::DoLoop {
                var,
                start,
                end,
                step,
                body,
            } => StmtKind::DoLoop {
                var: f.fold_expr(var),
                start: f.fold_expr(start),
                end: f.fold_expr(end),
                step: f.fold_expr(step),
                body: stmts(f, body),
            },
            StmtKind::SubroutineCall {
                callee,
                original,
                args,
            } => StmtKind::SubroutineCall {
                callee: f.fold_symbol_id(*callee),
                original: original.map(|o| f.fold_symbol_id(o)),
                args: exprs(f, args),
            },
            StmtKind::Print(values) => StmtKind::Print(exprs(f, values)),
            StmtKind::Assert { test, msg } => StmtKind::Assert {
                test: f.fold_expr(test),
                msg: msg.as_ref().map(|m| f.fold_expr(m)),
            },
            StmtKind::ErrorStop(code) => StmtKind::ErrorStop(code.as_ref().map(|c| f.fold_expr(c))),
            StmtKind::ExplicitDeallocate(targets) => {
                StmtKind::ExplicitDeallocate(exprs(f, targets))
            }
            StmtKind::BlockCall(block) => StmtKind::BlockCall(f.fold_symbol_id(*block)),
        };
        Stmt {
            kind,
            loc: stmt.loc,
        }
    })
}

fn ids<F: IrFolder + ?Sized>(f: &mut F, list: &[SymbolId]) -> Vec<SymbolId> {
    list.iter().map(|id| f.fold_symbol_id(*id)).collect()
}

pub fn walk_symbol<F: IrFolder + ?Sized>(f: &mut F, symbol: &Symbol) -> Symbol {
    let kind = match &symbol.kind {
        SymbolKind::Variable(v) => SymbolKind::Variable(Variable {
            ty: f.fold_ty(&v.ty),
            initializer: v.initializer.as_ref().map(|e| f.fold_expr(e)),
            ..v.clone()
        }),
        SymbolKind::Function(func) => SymbolKind::Function(Function {
            scope: f.fold_scope_id(func.scope),
            params: ids(f, &func.params),
            return_var: func.return_var.map(|rv| f.fold_symbol_id(rv)),
            body: stmts(f, &func.body),
            restrictions: ids(f, &func.restrictions),
            ..func.clone()
        }),
        SymbolKind::Module(m) => SymbolKind::Module(Module {
            scope: f.fold_scope_id(m.scope),
            ..m.clone()
        }),
        SymbolKind::Program(p) => SymbolKind::Program(Program {
            scope: f.fold_scope_id(p.scope),
            dependencies: p.dependencies.clone(),
            body: stmts(f, &p.body),
        }),
        SymbolKind::Struct(s) => SymbolKind::Struct(StructType {
            scope: f.fold_scope_id(s.scope),
            ..s.clone()
        }),
        SymbolKind::Enum(e) => SymbolKind::Enum(EnumType {
            scope: f.fold_scope_id(e.scope),
            underlying: f.fold_ty(&e.underlying),
            ..e.clone()
        }),
        SymbolKind::Union(u) => SymbolKind::Union(UnionType {
            scope: f.fold_scope_id(u.scope),
            members: u.members.clone(),
        }),
        SymbolKind::GenericProcedure(g) => SymbolKind::GenericProcedure(GenericProcedure {
            procs: ids(f, &g.procs),
        }),
        SymbolKind::External(ext) => SymbolKind::External(ExternalSymbol {
            target: f.fold_symbol_id(ext.target),
            ..ext.clone()
        }),
        SymbolKind::Block(b) => SymbolKind::Block(Block {
            scope: f.fold_scope_id(b.scope),
            body: stmts(f, &b.body),
        }),
        SymbolKind::AssociateBlock(b) => SymbolKind::AssociateBlock(Block {
            scope: f.fold_scope_id(b.scope),
            body: stmts(f, &b.body),
        }),
        SymbolKind::ClassProcedure(cp) => SymbolKind::ClassProcedure(ClassProcedure {
            owner: f.fold_symbol_id(cp.owner),
            procedure: f.fold_symbol_id(cp.procedure),
        }),
    };
    Symbol {
        name: symbol.name.clone(),
        parent: f.fold_scope_id(symbol.parent),
        loc: symbol.loc,
        kind,
    }
}

pub fn walk_scope<F: IrFolder + ?Sized>(f: &mut F, scope: &Scope) -> Scope {
    Scope {
        parent: scope.parent.map(|p| f.fold_scope_id(p)),
        owner: scope.owner.map(|o| f.fold_symbol_id(o)),
        symbols: scope
            .symbols
            .iter()
            .map(|(name, id)| (name.clone(), f.fold_symbol_id(*id)))
            .collect(),
    }
}
