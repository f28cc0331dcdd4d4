//! Statement lowering.

use lasr_ir::ast::{self, ExprKind as AstKind, StmtKind as AstStmt};
use lasr_ir::Location;

use super::call::CallResult;
use super::{Frame, Lowerer};
use crate::annotation::integer_binop;
use crate::error::{ErrorKind, SemaResult, SemanticError};
use crate::intrinsics::{lower_intrinsic, Intrinsic};
use crate::ir::{BinOp, CmpOp, Expr, ExprKind, Stmt, StmtKind};
use crate::stack::ensure_sufficient_stack;
use crate::symbols::{Block, Intent, Symbol, SymbolId, SymbolKind, Variable};
use crate::symtab::type_var_declaration;
use crate::types::{type_to_string, Ty};

/// Loop cursor synthesized for `for x in sequence`.
const ITERATOR_VAR: &str = "__explicit_iterator";

fn invalid(message: impl Into<String>, loc: Location) -> SemanticError {
    SemanticError::new(ErrorKind::invalid(message), loc)
}

impl Lowerer<'_, '_> {
    pub(super) fn lower_block(&mut self, frame: Frame, body: &[ast::Stmt]) -> SemaResult<Vec<Stmt>> {
        let mut out = Vec::with_capacity(body.len());
        for stmt in body {
            self.lower_stmt(frame, stmt, &mut out)?;
        }
        Ok(out)
    }

    pub(super) fn lower_stmt(
        &mut self,
        frame: Frame,
        stmt: &ast::Stmt,
        out: &mut Vec<Stmt>,
    ) -> SemaResult<()> {
        ensure_sufficient_stack(|| self.lower_stmt_inner(frame, stmt, out))
    }

    fn lower_stmt_inner(
        &mut self,
        frame: Frame,
        stmt: &ast::Stmt,
        out: &mut Vec<Stmt>,
    ) -> SemaResult<()> {
        let loc = stmt.loc;
        match &stmt.kind {
            AstStmt::FunctionDef(_)
            | AstStmt::ClassDef(_)
            | AstStmt::Import(_)
            | AstStmt::ImportFrom { .. }
            | AstStmt::Pass => Ok(()),
            AstStmt::Expr(expr) => self.lower_expr_stmt(frame, expr, out),
            AstStmt::AnnAssign { target, value, .. } => {
                let Some(value) = value else {
                    return Ok(());
                };
                let Some(name) = target.as_name() else {
                    return Err(SemanticError::new(
                        ErrorKind::unsupported("an annotated target that is not a plain name"),
                        target.loc,
                    ));
                };
                let id = self.resolve_name(frame, name, target.loc)?;
                let declared = self
                    .cx
                    .arena
                    .symbol(self.cx.arena.symbol_get_past_external(id))
                    .as_variable()
                    .map(|v| (v.ty.clone(), v.initializer.is_some()));
                match declared {
                    Some((ty, false)) if !ty.is_const() => {
                        self.assign_variable(frame, id, &ty, target.loc, value, loc, out)
                    }
                    _ => Ok(()),
                }
            }
            AstStmt::Assign { targets, value } => {
                if type_var_declaration(targets, value)?.is_some() {
                    return Ok(());
                }
                for target in targets {
                    self.lower_assignment(frame, target, value, loc, out)?;
                }
                Ok(())
            }
            AstStmt::AugAssign { target, op, value } => {
                let combined = ast::Expr::new(
                    AstKind::BinOp {
                        left: Box::new(target.clone()),
                        op: *op,
                        right: Box::new(value.clone()),
                    },
                    loc,
                );
                self.lower_assignment(frame, target, &combined, loc, out)
            }
            AstStmt::Return(value) => self.lower_return(frame, value.as_ref(), loc, out),
            AstStmt::If { test, body, orelse } => {
                let test = self.lower_expr(frame, test)?;
                let test = self.condition(test)?;
                let body = self.lower_block(frame, body)?;
                let orelse = self.lower_block(frame, orelse)?;
                out.push(Stmt::new(StmtKind::If { test, body, orelse }, loc));
                Ok(())
            }
            AstStmt::While { test, body, orelse } => {
                let test = self.lower_expr(frame, test)?;
                let test = self.condition(test)?;
                let body = self.lower_block(frame, body)?;
                let orelse = self.lower_block(frame, orelse)?;
                out.push(Stmt::new(StmtKind::WhileLoop { test, body, orelse }, loc));
                Ok(())
            }
            AstStmt::For { target, iter, body } => self.lower_for(frame, target, iter, body, loc, out),
            AstStmt::Break => {
                out.push(Stmt::new(StmtKind::Exit, loc));
                Ok(())
            }
            AstStmt::Continue => {
                out.push(Stmt::new(StmtKind::Cycle, loc));
                Ok(())
            }
            AstStmt::Assert { test, msg } => {
                let test = self.lower_expr(frame, test)?;
                let test = self.condition(test)?;
                let msg = msg.as_ref().map(|m| self.lower_expr(frame, m)).transpose()?;
                out.push(Stmt::new(StmtKind::Assert { test, msg }, loc));
                Ok(())
            }
            AstStmt::Raise(exception) => {
                let text = match exception.as_ref().map(|e| &e.kind) {
                    Some(AstKind::Str(s)) => Some(s.as_str()),
                    Some(AstKind::Call { args, .. }) => match args.as_slice() {
                        [ast::Expr {
                            kind: AstKind::Str(s),
                            ..
                        }] => Some(s.as_str()),
                        _ => None,
                    },
                    _ => None,
                };
                let message = text.map(|s| Expr::string(s, loc));
                out.push(Stmt::new(StmtKind::ErrorStop(message), loc));
                Ok(())
            }
            AstStmt::Delete(targets) => {
                let mut freed = Vec::with_capacity(targets.len());
                for target in targets {
                    let expr = self.lower_expr(frame, target)?;
                    let allocatable = expr.as_var().is_some() && matches!(expr.ty, Ty::Allocatable(_));
                    if !allocatable {
                        return Err(invalid(
                            "only allocatable variables can be deleted",
                            target.loc,
                        ));
                    }
                    freed.push(expr);
                }
                out.push(Stmt::new(StmtKind::ExplicitDeallocate(freed), loc));
                Ok(())
            }
            AstStmt::With { items, body } => self.lower_with(frame, items, body, loc, out),
        }
    }

    fn resolve_name(&self, frame: Frame, name: &str, loc: Location) -> SemaResult<SymbolId> {
        self.cx.arena.resolve(frame.scope, name).ok_or_else(|| {
            SemanticError::new(
                ErrorKind::UndeclaredSymbol {
                    name: name.to_owned(),
                },
                loc,
            )
        })
    }

    fn lower_expr_stmt(&mut self, frame: Frame, expr: &ast::Expr, out: &mut Vec<Stmt>) -> SemaResult<()> {
        let loc = expr.loc;
        let AstKind::Call {
            func,
            args,
            keywords,
        } = &expr.kind
        else {
            if matches!(expr.kind, AstKind::Str(_)) {
                return Ok(());
            }
            // Evaluated for its diagnostics only.
            self.lower_expr(frame, expr)?;
            return Ok(());
        };
        match &func.kind {
            AstKind::Name(name) if name == "print" && self.cx.arena.resolve(frame.scope, name).is_none() => {
                let values = args
                    .iter()
                    .map(|a| self.lower_expr(frame, a))
                    .collect::<SemaResult<Vec<_>>>()?;
                out.push(Stmt::new(StmtKind::Print(values), loc));
                return Ok(());
            }
            AstKind::Attribute { value, attr } if attr == "append" => {
                let list = self.lower_expr(frame, value)?;
                if let Ty::List(element) = list.ty.peel_wrappers().clone() {
                    let [item] = args.as_slice() else {
                        return Err(SemanticError::new(
                            ErrorKind::ArityMismatch {
                                callee: "append".to_owned(),
                                expected: 1,
                                found: args.len(),
                            },
                            loc,
                        ));
                    };
                    let item = self.lower_expr_with(frame, item, &element)?;
                    let item = self.convert(item, &element)?;
                    out.push(Stmt::new(StmtKind::ListAppend { list, value: item }, loc));
                    return Ok(());
                }
            }
            _ => {}
        }
        match self.lower_call(frame, func, args, keywords, loc)? {
            CallResult::Subroutine {
                callee,
                original,
                args,
            } => out.push(Stmt::new(
                StmtKind::SubroutineCall {
                    callee,
                    original,
                    args,
                },
                loc,
            )),
            CallResult::Value(value) => {
                if matches!(value.kind, ExprKind::FunctionCall { .. }) {
                    // The result of a function called as a statement goes
                    // to a throwaway local.
                    let dummy = self.temporary(frame, "__dummy", value.ty.clone(), loc)?;
                    let target = Expr::var(dummy, value.ty.clone(), loc);
                    out.push(Stmt::assignment(target, value, loc));
                }
            }
        }
        Ok(())
    }

    /// A fresh local of type `ty` in the current scope.
    fn temporary(&mut self, frame: Frame, base: &str, ty: Ty, loc: Location) -> SemaResult<SymbolId> {
        let name = self.cx.arena.unique_name(frame.scope, base);
        self.cx.arena.add(
            frame.scope,
            Symbol::new(name, loc, SymbolKind::Variable(Variable::local(ty))),
        )
    }

    fn lower_assignment(
        &mut self,
        frame: Frame,
        target: &ast::Expr,
        value: &ast::Expr,
        loc: Location,
        out: &mut Vec<Stmt>,
    ) -> SemaResult<()> {
        match &target.kind {
            AstKind::Name(name) => {
                let id = self.resolve_name(frame, name, target.loc)?;
                let ty = self.check_writable(id, target.loc)?;
                self.assign_variable(frame, id, &ty, target.loc, value, loc, out)
            }
            AstKind::Subscript {
                value: container,
                slice,
            } => {
                let base = self.lower_expr(frame, container)?;
                self.check_writable_root(&base)?;
                match base.ty.peel_wrappers().clone() {
                    Ty::Dict(key_ty, value_ty) => {
                        let key = self.lower_expr(frame, slice)?;
                        let key = self.convert(key, &key_ty)?;
                        let value = self.lower_expr_with(frame, value, &value_ty)?;
                        let value = self.convert(value, &value_ty)?;
                        out.push(Stmt::new(
                            StmtKind::DictInsert {
                                dict: base,
                                key,
                                value,
                            },
                            loc,
                        ));
                    }
                    Ty::List(element) => {
                        let index = self.lower_expr(frame, slice)?;
                        if !index.ty.is_integer() {
                            return Err(SemanticError::new(
                                ErrorKind::TypeMismatch {
                                    expected: "i32".to_owned(),
                                    found: type_to_string(&index.ty, &self.cx.arena),
                                },
                                index.loc,
                            ));
                        }
                        let value = self.lower_expr_with(frame, value, &element)?;
                        let value = self.convert(value, &element)?;
                        out.push(Stmt::new(
                            StmtKind::ListSetItem {
                                list: base,
                                index,
                                value,
                            },
                            loc,
                        ));
                    }
                    Ty::Array(..) => {
                        let item = self.index_into(frame, base, slice, target.loc)?;
                        let ty = item.ty.clone();
                        let value = self.lower_expr_with(frame, value, &ty)?;
                        let value = self.convert(value, &ty)?;
                        out.push(Stmt::assignment(item, value, loc));
                    }
                    Ty::Character => return Err(invalid("strings are immutable", target.loc)),
                    other => {
                        return Err(invalid(
                            format!(
                                "`{}` does not support item assignment",
                                type_to_string(&other, &self.cx.arena)
                            ),
                            target.loc,
                        ))
                    }
                }
                Ok(())
            }
            AstKind::Attribute { value: base, attr } => {
                let base = self.lower_expr(frame, base)?;
                self.check_writable_root(&base)?;
                let member = self.member_of(frame, base, attr, target.loc)?;
                if !matches!(member.kind, ExprKind::StructMember { .. }) {
                    return Err(invalid(format!("cannot assign to `.{attr}`"), target.loc));
                }
                let ty = member.ty.clone();
                let value = self.lower_expr_with(frame, value, &ty)?;
                let value = self.convert(value, &ty)?;
                out.push(Stmt::assignment(member, value, loc));
                Ok(())
            }
            AstKind::Tuple(_) => Err(SemanticError::new(
                ErrorKind::unsupported("tuple unpacking"),
                target.loc,
            )),
            _ => Err(invalid("cannot assign to this expression", target.loc)),
        }
    }

    #[expect(clippy::too_many_arguments, reason = "statement context is threaded through")]
    fn assign_variable(
        &mut self,
        frame: Frame,
        id: SymbolId,
        ty: &Ty,
        target_loc: Location,
        value: &ast::Expr,
        loc: Location,
        out: &mut Vec<Stmt>,
    ) -> SemaResult<()> {
        let value = self.lower_expr_with(frame, value, ty)?;
        let value = self.convert(value, ty)?;
        let target = Expr::var(id, ty.peel_const().clone(), target_loc);
        out.push(Stmt::assignment(target, value, loc));
        Ok(())
    }

    /// Reject writes to constants and `In` parameters; yields the
    /// variable's type.
    fn check_writable(&self, id: SymbolId, loc: Location) -> SemaResult<Ty> {
        let arena = &self.cx.arena;
        let real = arena.symbol_get_past_external(id);
        let symbol = arena.symbol(real);
        let name = symbol.name.clone();
        let Some(var) = symbol.as_variable() else {
            return Err(invalid(
                format!("cannot assign to {} `{name}`", symbol.kind_name()),
                loc,
            ));
        };
        if var.ty.is_const() {
            return Err(SemanticError::new(ErrorKind::ConstReassignment { name }, loc)
                .with_label(symbol.loc, "declared constant here"));
        }
        if var.intent == Intent::In {
            return Err(SemanticError::new(
                ErrorKind::InputParameterAssignment { name: name.clone() },
                loc,
            )
            .with_hint(format!(
                "copy `{name}` into a local first, or declare it `InOut[...]`"
            )));
        }
        Ok(var.ty.clone())
    }

    /// The variable an item or member target ultimately writes into.
    fn check_writable_root(&self, expr: &Expr) -> SemaResult<()> {
        let mut current = expr;
        loop {
            current = match &current.kind {
                ExprKind::Var(id) => return self.check_writable(*id, expr.loc).map(drop),
                ExprKind::StructMember { base, .. } => &**base,
                ExprKind::ArrayItem { array, .. } => &**array,
                ExprKind::ListItem { list, .. } => &**list,
                ExprKind::DictItem { dict, .. } => &**dict,
                _ => return Ok(()),
            };
        }
    }

    fn lower_return(
        &mut self,
        frame: Frame,
        value: Option<&ast::Expr>,
        loc: Location,
        out: &mut Vec<Stmt>,
    ) -> SemaResult<()> {
        match (value, frame.return_var) {
            (Some(value), Some(return_var)) => {
                let ty = self
                    .cx
                    .arena
                    .variable_type(return_var)
                    .cloned()
                    .unwrap_or(Ty::integer(4));
                self.assign_variable(frame, return_var, &ty, loc, value, loc, out)?;
            }
            (Some(_), None) => {
                return Err(SemanticError::new(
                    ErrorKind::ReturnValue {
                        function: self.cx.arena.symbol_name(frame.function).to_owned(),
                        reason: "a subroutine cannot return a value".to_owned(),
                    },
                    loc,
                ));
            }
            (None, _) => {}
        }
        out.push(Stmt::new(StmtKind::Return, loc));
        Ok(())
    }

    fn lower_for(
        &mut self,
        frame: Frame,
        target: &ast::Expr,
        iter: &ast::Expr,
        body: &[ast::Stmt],
        loc: Location,
        out: &mut Vec<Stmt>,
    ) -> SemaResult<()> {
        let Some(name) = target.as_name() else {
            return Err(SemanticError::new(
                ErrorKind::unsupported("a loop target that is not a plain name"),
                target.loc,
            ));
        };
        let Some(id) = self.cx.arena.resolve(frame.scope, name) else {
            return Err(SemanticError::new(
                ErrorKind::UndeclaredSymbol {
                    name: name.to_owned(),
                },
                target.loc,
            )
            .with_hint(format!("declare the loop variable first, e.g. `{name}: i32`")));
        };
        let var_ty = self.check_writable(id, target.loc)?;
        let var = Expr::var(id, var_ty.clone(), target.loc);

        if let AstKind::Call { func, args, .. } = &iter.kind {
            let is_range = func.as_name() == Some("range")
                && self.cx.arena.resolve(frame.scope, "range").is_none();
            if is_range {
                return self.lower_range_loop(frame, var, args, body, iter.loc, loc, out);
            }
        }

        let iterable = self.lower_expr(frame, iter)?;
        let is_list = match iterable.ty.peel_wrappers() {
            Ty::List(_) => true,
            Ty::Character => false,
            other => {
                return Err(SemanticError::new(
                    ErrorKind::unsupported(format!(
                        "iterating over `{}`",
                        type_to_string(other, &self.cx.arena)
                    )),
                    iter.loc,
                ))
            }
        };
        let element_ty = match iterable.ty.peel_wrappers() {
            Ty::List(element) => (**element).clone(),
            _ => Ty::Character,
        };
        let iterable = if iterable.as_var().is_some() {
            iterable
        } else {
            let ty = iterable.ty.clone();
            let temp = self.temporary(frame, "__iterable", ty.clone(), iter.loc)?;
            out.push(Stmt::assignment(Expr::var(temp, ty.clone(), iter.loc), iterable, loc));
            Expr::var(temp, ty, iter.loc)
        };
        let int = Ty::integer(4);
        let cursor_id = self.temporary(frame, ITERATOR_VAR, int.clone(), loc)?;
        let cursor = Expr::var(cursor_id, int, loc);
        let len = lower_intrinsic(Intrinsic::Len, vec![iterable.clone()], iter.loc, &self.cx.arena)?;
        let end = integer_binop(len, BinOp::Sub, Expr::integer(1, 4, loc));
        let item = if is_list {
            ExprKind::ListItem {
                list: Box::new(iterable),
                index: Box::new(cursor.clone()),
            }
        } else {
            ExprKind::StringItem {
                string: Box::new(iterable),
                index: Box::new(cursor.clone()),
            }
        };
        let item = Expr::new(item, element_ty, target.loc);
        let item = self.convert(item, &var_ty)?;
        let mut stmts = vec![Stmt::assignment(var, item, loc)];
        stmts.extend(self.lower_block(frame, body)?);
        out.push(Stmt::new(
            StmtKind::DoLoop {
                var: cursor,
                start: Expr::integer(0, 4, loc),
                end,
                step: Expr::integer(1, 4, loc),
                body: stmts,
            },
            loc,
        ));
        Ok(())
    }

    /// `for i in range(...)` as a counted loop over the inclusive bound
    /// `end - 1` (or `end + 1` for a negative step).
    #[expect(clippy::too_many_arguments, reason = "statement context is threaded through")]
    fn lower_range_loop(
        &mut self,
        frame: Frame,
        var: Expr,
        args: &[ast::Expr],
        body: &[ast::Stmt],
        range_loc: Location,
        loc: Location,
        out: &mut Vec<Stmt>,
    ) -> SemaResult<()> {
        let ty = var.ty.clone();
        if !ty.is_integer() {
            return Err(SemanticError::new(
                ErrorKind::TypeMismatch {
                    expected: "i32".to_owned(),
                    found: type_to_string(&ty, &self.cx.arena),
                },
                var.loc,
            )
            .with_hint("a `range` loop needs an integer loop variable"));
        }
        let kind = ty.kind().unwrap_or(4);
        let mut bounds = Vec::with_capacity(args.len());
        for arg in args {
            let bound = self.lower_expr(frame, arg)?;
            bounds.push(self.convert(bound, &ty)?);
        }
        let literal = |v: i64| Expr::integer(v, kind, range_loc);
        let mut bounds = bounds.into_iter();
        let (start, end, step) = match (bounds.next(), bounds.next(), bounds.next(), bounds.next()) {
            (Some(end), None, None, None) => (literal(0), end, literal(1)),
            (Some(start), Some(end), None, None) => (start, end, literal(1)),
            (Some(start), Some(end), Some(step), None) => (start, end, step),
            _ => {
                return Err(SemanticError::new(
                    ErrorKind::ArityMismatch {
                        callee: "range".to_owned(),
                        expected: 3,
                        found: args.len(),
                    },
                    range_loc,
                ))
            }
        };
        let end = match step.integer_value() {
            Some(0) => return Err(invalid("`range` step must not be zero", step.loc)),
            Some(s) if s > 0 => integer_binop(end, BinOp::Sub, literal(1)),
            Some(_) => integer_binop(end, BinOp::Add, literal(1)),
            None => {
                let positive = Expr::new(
                    ExprKind::IntegerCompare {
                        left: Box::new(step.clone()),
                        op: CmpOp::Gt,
                        right: Box::new(literal(0)),
                    },
                    Ty::logical(),
                    range_loc,
                );
                Expr::new(
                    ExprKind::IfExp {
                        test: Box::new(positive),
                        body: Box::new(integer_binop(end.clone(), BinOp::Sub, literal(1))),
                        orelse: Box::new(integer_binop(end, BinOp::Add, literal(1))),
                    },
                    ty,
                    range_loc,
                )
            }
        };
        let body = self.lower_block(frame, body)?;
        out.push(Stmt::new(
            StmtKind::DoLoop {
                var,
                start,
                end,
                step,
                body,
            },
            loc,
        ));
        Ok(())
    }

    fn lower_with(
        &mut self,
        frame: Frame,
        items: &[ast::WithItem],
        body: &[ast::Stmt],
        loc: Location,
        out: &mut Vec<Stmt>,
    ) -> SemaResult<()> {
        let [item] = items else {
            return Err(SemanticError::new(
                ErrorKind::unsupported("`with` over several context managers"),
                loc,
            ));
        };
        let context = self.lower_expr(frame, &item.context)?;
        let target = match &item.target {
            None => None,
            Some(target) => match target.as_name() {
                Some(name) => Some((name, target.loc)),
                None => {
                    return Err(SemanticError::new(
                        ErrorKind::unsupported("a `with` target that is not a plain name"),
                        target.loc,
                    ))
                }
            },
        };
        let scope = self.cx.arena.new_scope(Some(frame.scope));
        let block = Block {
            scope,
            body: Vec::new(),
        };
        let (base, kind) = if target.is_some() {
            ("__associate_block", SymbolKind::AssociateBlock(block))
        } else {
            ("__with_block", SymbolKind::Block(block))
        };
        let name = self.cx.arena.unique_name(frame.scope, base);
        let id = self.cx.arena.add(frame.scope, Symbol::new(name, loc, kind))?;
        self.cx.arena.set_scope_owner(scope, id);

        let mut stmts = Vec::new();
        if let Some((name, target_loc)) = target {
            let ty = context.ty.clone();
            let var = self.cx.arena.add(
                scope,
                Symbol::new(name, target_loc, SymbolKind::Variable(Variable::local(ty.clone()))),
            )?;
            stmts.push(Stmt::new(
                StmtKind::Associate {
                    target: Expr::var(var, ty, target_loc),
                    value: context,
                },
                loc,
            ));
        }
        stmts.extend(self.lower_block(frame.nested(scope), body)?);
        if let SymbolKind::Block(block) | SymbolKind::AssociateBlock(block) =
            &mut self.cx.arena.symbol_mut(id).kind
        {
            block.body = stmts;
        }
        out.push(Stmt::new(StmtKind::BlockCall(id), loc));
        Ok(())
    }
}
