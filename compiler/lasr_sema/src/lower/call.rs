//! Calls: user functions, overload sets, generic functions, struct
//! constructors, methods, scalar conversions and intrinsics.
//!
//! Arguments bind positionally, then by keyword, then from parameter
//! defaults. Each bound argument is converted to its parameter type.

use lasr_diagnostic::{Diagnostic, ErrorCode};
use lasr_ir::ast::{self, ExprKind as AstKind};
use lasr_ir::Location;

use super::{Frame, Lowerer};
use crate::annotation::scalar_keyword;
use crate::cast::{cast_for_argument, perform_casting};
use crate::error::{ErrorKind, SemaResult, SemanticError};
use crate::fold::{walk_expr, IrFolder};
use crate::generics::{self, WitnessArg};
use crate::imports;
use crate::intrinsics::{lower_intrinsic, Intrinsic};
use crate::ir::{Expr, ExprKind};
use crate::symbols::{add_dependency, Presence, SymbolId, SymbolKind};
use crate::types::{type_to_string, Ty};

/// A lowered call: a value, or a statement-only subroutine call.
pub(super) enum CallResult {
    Value(Expr),
    Subroutine {
        callee: SymbolId,
        original: Option<SymbolId>,
        args: Vec<Expr>,
    },
}

/// Replaces references to a callee's parameters, e.g. in the dimensions of
/// its return type, by the actual arguments.
struct ArgumentSubstituter<'a> {
    params: &'a [SymbolId],
    args: &'a [Expr],
}

impl IrFolder for ArgumentSubstituter<'_> {
    fn fold_expr(&mut self, expr: &Expr) -> Expr {
        if let ExprKind::Var(id) = expr.kind {
            if let Some(arg) = self
                .params
                .iter()
                .position(|p| *p == id)
                .and_then(|i| self.args.get(i))
            {
                return arg.clone();
            }
        }
        walk_expr(self, expr)
    }
}

fn invalid(message: impl Into<String>, loc: Location) -> SemanticError {
    SemanticError::new(ErrorKind::invalid(message), loc)
}

impl Lowerer<'_, '_> {
    pub(super) fn lower_call(
        &mut self,
        frame: Frame,
        func: &ast::Expr,
        args: &[ast::Expr],
        keywords: &[ast::Keyword],
        loc: Location,
    ) -> SemaResult<CallResult> {
        match &func.kind {
            AstKind::Name(name) => {
                if let Some(id) = self.cx.arena.resolve(frame.scope, name) {
                    return self.call_symbol(frame, id, name, args, keywords, loc);
                }
                self.call_builtin(frame, name, args, keywords, loc)
                    .map(CallResult::Value)
            }
            AstKind::Attribute { value, attr } => {
                if let Some(base) = value.as_name() {
                    if let Some(id) = imports::module_member(self.cx, frame.scope, base, attr, loc)? {
                        let name = format!("{base}.{attr}");
                        return self.call_symbol(frame, id, &name, args, keywords, loc);
                    }
                }
                let receiver = self.lower_expr(frame, value)?;
                self.call_method(frame, receiver, attr, args, keywords, loc)
            }
            _ => Err(SemanticError::new(
                ErrorKind::unsupported("calling a computed expression"),
                func.loc,
            )),
        }
    }

    fn call_symbol(
        &mut self,
        frame: Frame,
        id: SymbolId,
        name: &str,
        args: &[ast::Expr],
        keywords: &[ast::Keyword],
        loc: Location,
    ) -> SemaResult<CallResult> {
        let real = self.cx.arena.symbol_get_past_external(id);
        let symbol = self.cx.arena.symbol(real);
        match &symbol.kind {
            SymbolKind::Function(f) if f.is_generic() && !f.is_restriction => {
                self.call_generic(frame, id, name, args, keywords, loc)
            }
            SymbolKind::Function(_) => {
                let args = self.lower_args(frame, args)?;
                let keywords = self.lower_keywords(frame, keywords)?;
                let bound = self.bind_arguments(real, name, args, keywords, loc)?;
                Ok(self.finish_call(frame, id, None, bound, loc))
            }
            SymbolKind::GenericProcedure(_) => {
                self.call_overloaded(frame, id, name, args, keywords, loc)
            }
            SymbolKind::Struct(_) => self
                .construct(frame, id, name, args, keywords, loc)
                .map(CallResult::Value),
            _ => Err(invalid(
                format!("{} `{name}` is not callable", symbol.kind_name()),
                loc,
            )),
        }
    }

    fn lower_args(&mut self, frame: Frame, args: &[ast::Expr]) -> SemaResult<Vec<Expr>> {
        args.iter().map(|a| self.lower_expr(frame, a)).collect()
    }

    fn lower_keywords(
        &mut self,
        frame: Frame,
        keywords: &[ast::Keyword],
    ) -> SemaResult<Vec<(String, Expr, Location)>> {
        let mut lowered = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            let value = self.lower_expr(frame, &keyword.value)?;
            lowered.push((keyword.arg.clone(), value, keyword.loc));
        }
        Ok(lowered)
    }

    /// Match `args` and `keywords` to the parameters of `callee` and
    /// convert each to its parameter type.
    fn bind_arguments(
        &self,
        callee: SymbolId,
        name: &str,
        args: Vec<Expr>,
        keywords: Vec<(String, Expr, Location)>,
        loc: Location,
    ) -> SemaResult<Vec<Expr>> {
        let bound = self.bind_uncast(callee, name, args, keywords, loc)?;
        let arena = &self.cx.arena;
        let params = arena.function(callee).map(|f| f.params.clone()).unwrap_or_default();
        bound
            .into_iter()
            .zip(&params)
            .map(|(arg, param)| {
                let ty = arena.variable_type(*param).cloned().unwrap_or(Ty::integer(4));
                cast_for_argument(arg, &ty, arena, &self.cx.options)
            })
            .collect()
    }

    /// Argument binding without conversion, in parameter order.
    fn bind_uncast(
        &self,
        callee: SymbolId,
        name: &str,
        args: Vec<Expr>,
        keywords: Vec<(String, Expr, Location)>,
        loc: Location,
    ) -> SemaResult<Vec<Expr>> {
        let arena = &self.cx.arena;
        let params = arena.function(callee).map(|f| f.params.clone()).unwrap_or_default();
        let supplied = args.len() + keywords.len();
        let arity = |found: usize| {
            SemanticError::new(
                ErrorKind::ArityMismatch {
                    callee: name.to_owned(),
                    expected: params.len(),
                    found,
                },
                loc,
            )
        };
        if args.len() > params.len() {
            return Err(arity(supplied));
        }
        let mut slots: Vec<Option<Expr>> = vec![None; params.len()];
        for (slot, arg) in slots.iter_mut().zip(args) {
            *slot = Some(arg);
        }
        for (keyword, value, keyword_loc) in keywords {
            let Some(position) = params.iter().position(|p| arena.symbol_name(*p) == keyword) else {
                return Err(invalid(
                    format!("`{name}` has no parameter named `{keyword}`"),
                    keyword_loc,
                ));
            };
            if slots[position].is_some() {
                return Err(invalid(
                    format!("argument `{keyword}` of `{name}` given more than once"),
                    keyword_loc,
                ));
            }
            slots[position] = Some(value);
        }
        let mut bound = Vec::with_capacity(params.len());
        for (slot, param) in slots.into_iter().zip(&params) {
            match slot {
                Some(arg) => bound.push(arg),
                None => {
                    let default = arena
                        .symbol(*param)
                        .as_variable()
                        .filter(|v| v.presence == Presence::Optional)
                        .and_then(|v| v.initializer.clone());
                    let Some(default) = default else {
                        return Err(arity(supplied));
                    };
                    bound.push(Expr { loc, ..default });
                }
            }
        }
        Ok(bound)
    }

    /// A call of `callee` with bound arguments; records the dependency.
    fn finish_call(
        &mut self,
        frame: Frame,
        callee: SymbolId,
        original: Option<SymbolId>,
        args: Vec<Expr>,
        loc: Location,
    ) -> CallResult {
        let dependency = self.cx.arena.symbol_name(original.unwrap_or(callee)).to_owned();
        if let Some(function) = self.cx.arena.function_mut(frame.function) {
            add_dependency(&mut function.dependencies, &dependency);
        }
        let arena = &self.cx.arena;
        let real = arena.symbol_get_past_external(callee);
        let Some(ty) = arena.return_type(real).cloned() else {
            return CallResult::Subroutine {
                callee,
                original,
                args,
            };
        };
        let ty = if ty.is_array() {
            let params = arena.function(real).map(|f| f.params.clone()).unwrap_or_default();
            ArgumentSubstituter {
                params: &params,
                args: &args,
            }
            .fold_ty(&ty)
        } else {
            ty
        };
        CallResult::Value(Expr::new(
            ExprKind::FunctionCall {
                callee,
                original,
                args,
            },
            ty.peel_const().clone(),
            loc,
        ))
    }

    /// The first candidate of the overload set `set` that accepts the
    /// arguments without an implicit narrowing.
    fn call_overloaded(
        &mut self,
        frame: Frame,
        set: SymbolId,
        name: &str,
        args: &[ast::Expr],
        keywords: &[ast::Keyword],
        loc: Location,
    ) -> SemaResult<CallResult> {
        let procs = match &self.cx.arena.symbol(self.cx.arena.symbol_get_past_external(set)).kind {
            SymbolKind::GenericProcedure(g) => g.procs.clone(),
            _ => Vec::new(),
        };
        let args = self.lower_args(frame, args)?;
        let keywords = self.lower_keywords(frame, keywords)?;
        for candidate in procs {
            let candidate = self.cx.arena.symbol_get_past_external(candidate);
            let Ok(bound) = self.bind_arguments(candidate, name, args.clone(), keywords.clone(), loc)
            else {
                continue;
            };
            tracing::trace!(name, candidate = %self.cx.arena.symbol_name(candidate), "overload selected");
            let local = imports::import_into_unit(self.cx, frame.scope, candidate, loc)?;
            return Ok(self.finish_call(frame, local, Some(set), bound, loc));
        }
        let types: Vec<String> = args
            .iter()
            .map(|a| type_to_string(&a.ty, &self.cx.arena))
            .collect();
        Err(invalid(
            format!("no overload of `{name}` accepts ({})", types.join(", ")),
            loc,
        ))
    }

    fn call_generic(
        &mut self,
        frame: Frame,
        generic: SymbolId,
        name: &str,
        args: &[ast::Expr],
        keywords: &[ast::Keyword],
        loc: Location,
    ) -> SemaResult<CallResult> {
        if frame.generic {
            return Err(SemanticError::new(
                ErrorKind::unsupported(format!(
                    "calling generic function `{name}` from another generic function"
                )),
                loc,
            ));
        }
        let real = self.cx.arena.symbol_get_past_external(generic);
        let restrictions: Vec<(String, SymbolId)> = self
            .cx
            .arena
            .function(real)
            .map(|f| f.restrictions.clone())
            .unwrap_or_default()
            .into_iter()
            .map(|r| (self.cx.arena.symbol_name(r).to_owned(), r))
            .collect();

        let mut witnesses = Vec::new();
        let mut plain = Vec::new();
        for keyword in keywords {
            let restriction = restrictions
                .iter()
                .find(|(n, _)| *n == keyword.arg)
                .map(|(_, r)| *r);
            let Some(restriction) = restriction else {
                plain.push(keyword.clone());
                continue;
            };
            let witness = keyword
                .value
                .as_name()
                .and_then(|w| self.cx.arena.resolve(frame.scope, w));
            let Some(witness) = witness else {
                return Err(SemanticError::new(
                    ErrorKind::RestrictionMismatch {
                        restriction: keyword.arg.clone(),
                        reason: "the witness must name a function".to_owned(),
                    },
                    keyword.value.loc,
                ));
            };
            witnesses.push(WitnessArg {
                restriction,
                witness,
                loc: keyword.loc,
            });
        }

        let args = self.lower_args(frame, args)?;
        let keywords = self.lower_keywords(frame, &plain)?;
        let bound = self.bind_uncast(real, name, args, keywords, loc)?;
        let instance = generics::instantiate(self.cx, frame.scope, generic, &bound, &witnesses, loc)?;
        let instance_real = self.cx.arena.symbol_get_past_external(instance);
        let params = self
            .cx
            .arena
            .function(instance_real)
            .map(|f| f.params.clone())
            .unwrap_or_default();
        let mut cast = Vec::with_capacity(bound.len());
        for (arg, param) in bound.into_iter().zip(&params) {
            let ty = self.cx.arena.variable_type(*param).cloned().unwrap_or(Ty::integer(4));
            cast.push(cast_for_argument(arg, &ty, &self.cx.arena, &self.cx.options)?);
        }
        Ok(self.finish_call(frame, instance, Some(generic), cast, loc))
    }

    /// `Point(1, y=2)`; omitted members take their declared defaults.
    fn construct(
        &mut self,
        frame: Frame,
        struct_local: SymbolId,
        name: &str,
        args: &[ast::Expr],
        keywords: &[ast::Keyword],
        loc: Location,
    ) -> SemaResult<Expr> {
        let real = self.cx.arena.symbol_get_past_external(struct_local);
        let (scope, members) = match &self.cx.arena.symbol(real).kind {
            SymbolKind::Struct(s) => (s.scope, s.members.clone()),
            _ => return Err(invalid(format!("`{name}` is not a struct"), loc)),
        };
        let member_ids: Vec<SymbolId> = members
            .iter()
            .filter_map(|m| self.cx.arena.get_local(scope, m))
            .collect();
        let arity = |found: usize| {
            SemanticError::new(
                ErrorKind::ArityMismatch {
                    callee: name.to_owned(),
                    expected: member_ids.len(),
                    found,
                },
                loc,
            )
        };
        if args.len() > member_ids.len() {
            return Err(arity(args.len() + keywords.len()));
        }
        let mut slots: Vec<Option<Expr>> = vec![None; member_ids.len()];
        for (index, arg) in args.iter().enumerate() {
            let ty = self.member_type(member_ids[index]);
            let value = self.lower_expr_with(frame, arg, &ty)?;
            slots[index] = Some(self.convert(value, &ty)?);
        }
        for keyword in keywords {
            let Some(index) = members.iter().position(|m| *m == keyword.arg) else {
                return Err(invalid(
                    format!("`{name}` has no member `{}`", keyword.arg),
                    keyword.loc,
                ));
            };
            if slots[index].is_some() {
                return Err(invalid(
                    format!("member `{}` of `{name}` given more than once", keyword.arg),
                    keyword.loc,
                ));
            }
            let ty = self.member_type(member_ids[index]);
            let value = self.lower_expr_with(frame, &keyword.value, &ty)?;
            slots[index] = Some(self.convert(value, &ty)?);
        }
        let supplied = args.len() + keywords.len();
        let mut values = Vec::with_capacity(slots.len());
        for (slot, member) in slots.into_iter().zip(&member_ids) {
            let value = match slot {
                Some(value) => value,
                None => {
                    let default = self
                        .cx
                        .arena
                        .symbol(*member)
                        .as_variable()
                        .and_then(|v| v.initializer.clone());
                    let Some(default) = default else {
                        return Err(arity(supplied));
                    };
                    Expr { loc, ..default }
                }
            };
            values.push(value);
        }
        Ok(Expr::new(
            ExprKind::StructConstructor {
                ty_sym: struct_local,
                args: values,
            },
            Ty::Struct(struct_local),
            loc,
        ))
    }

    fn member_type(&self, member: SymbolId) -> Ty {
        self.cx
            .arena
            .variable_type(member)
            .map(|t| t.peel_const().clone())
            .unwrap_or(Ty::integer(4))
    }

    /// `receiver.method(args)`, dispatched through the struct's method table.
    fn call_method(
        &mut self,
        frame: Frame,
        receiver: Expr,
        method: &str,
        args: &[ast::Expr],
        keywords: &[ast::Keyword],
        loc: Location,
    ) -> SemaResult<CallResult> {
        let owner = match receiver.ty.peel_wrappers() {
            Ty::Struct(owner) | Ty::Class(owner) => *owner,
            Ty::List(_) if method == "append" => {
                return Err(invalid("`append` does not return a value", loc));
            }
            other => {
                return Err(invalid(
                    format!(
                        "`{}` has no method `{method}`",
                        type_to_string(other, &self.cx.arena)
                    ),
                    loc,
                ))
            }
        };
        let real_owner = self.cx.arena.symbol_get_past_external(owner);
        let procedure = self
            .cx
            .arena
            .symbol(real_owner)
            .owned_scope()
            .and_then(|scope| self.cx.arena.get_local(scope, method))
            .and_then(|m| match &self.cx.arena.symbol(m).kind {
                SymbolKind::ClassProcedure(cp) => Some(cp.procedure),
                _ => None,
            });
        let Some(procedure) = procedure else {
            return Err(invalid(
                format!(
                    "`{}` has no method `{method}`",
                    self.cx.arena.symbol_name(real_owner)
                ),
                loc,
            ));
        };
        let mut lowered = vec![receiver];
        lowered.extend(self.lower_args(frame, args)?);
        let keywords = self.lower_keywords(frame, keywords)?;
        let procedure = self.cx.arena.symbol_get_past_external(procedure);
        let bound = self.bind_arguments(procedure, method, lowered, keywords, loc)?;
        let local = imports::import_into_unit(self.cx, frame.scope, procedure, loc)?;
        Ok(self.finish_call(frame, local, None, bound, loc))
    }

    /// Names with no declaration: scalar conversions and intrinsics.
    fn call_builtin(
        &mut self,
        frame: Frame,
        name: &str,
        args: &[ast::Expr],
        keywords: &[ast::Keyword],
        loc: Location,
    ) -> SemaResult<Expr> {
        let undeclared = || {
            SemanticError::new(
                ErrorKind::UndeclaredSymbol {
                    name: name.to_owned(),
                },
                loc,
            )
        };
        let conversion = match name {
            "int" => Some(Ty::integer(4)),
            "float" => Some(Ty::real(8)),
            _ => scalar_keyword(name),
        };
        let intrinsic = Intrinsic::from_name(name);
        if conversion.is_none() && intrinsic.is_none() {
            return Err(match name {
                "print" => invalid("`print` does not return a value", loc),
                "range" => invalid("`range` can only be iterated by a `for` loop", loc),
                _ => undeclared(),
            });
        }
        if let Some(keyword) = keywords.first() {
            return Err(SemanticError::new(
                ErrorKind::unsupported(format!("keyword arguments to `{name}`")),
                keyword.loc,
            ));
        }
        let args = self.lower_args(frame, args)?;
        if let Some(target) = conversion {
            let [arg] = <[Expr; 1]>::try_from(args).map_err(|args| {
                SemanticError::new(
                    ErrorKind::ArityMismatch {
                        callee: name.to_owned(),
                        expected: 1,
                        found: args.len(),
                    },
                    loc,
                )
            })?;
            if target.is_character() && !arg.ty.is_character() {
                return Err(SemanticError::new(
                    ErrorKind::unsupported(format!(
                        "converting `{}` to `str`",
                        type_to_string(&arg.ty, &self.cx.arena)
                    )),
                    loc,
                ));
            }
            let arg_loc = arg.loc;
            let converted = perform_casting(arg, &target, &self.cx.arena)?;
            return Ok(Expr { loc: arg_loc.merge(loc), ..converted });
        }
        let Some(intrinsic) = intrinsic else {
            return Err(undeclared());
        };
        if intrinsic == Intrinsic::Pow {
            self.cx.warn(
                Diagnostic::warning(ErrorCode::W2001)
                    .with_message("`pow(x, y)` can be written as `x ** y`")
                    .with_label(loc, "called here")
                    .with_suggestion("use the `**` operator"),
            );
        }
        lower_intrinsic(intrinsic, args, loc, &self.cx.arena)
    }
}
