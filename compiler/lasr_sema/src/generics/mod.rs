//! Instantiation of generic functions.
//!
//! A call to a generic function binds each type parameter from the actual
//! argument types, checks every restriction against the witness the caller
//! supplied, and then asks for the concrete instance. Instances are
//! deduplicated per generic function, substitution and witness set, so
//! two calls with `i32` arguments share one `__asr_generic_f_0`.
//!
//! # Monomorphization
//!
//! ```text
//! capture generic subtree ─► reserve fresh ids ─► fold
//!                                                  ├─ TypeParameter(T) → bound type
//!                                                  ├─ restriction call → witness call
//!                                                  └─ builtin add/zero/div → arithmetic
//! ```
//!
//! The instance lives in the generic's own module when called from there,
//! otherwise in the calling module, which then imports whatever the body
//! refers to.

use lasr_ir::Location;
use rustc_hash::FxHashMap;

use crate::cast::perform_casting;
use crate::compile::Compilation;
use crate::error::{ErrorKind, SemaResult, SemanticError};
use crate::fold::relocate::{outside_references, Relocation, Remap, Subtree};
use crate::fold::{walk_expr, walk_ty, IrFolder};
use crate::imports;
use crate::ir::{BinOp, Constant, Expr, ExprKind};
use crate::lower::expr::arithmetic;
use crate::symbols::{ScopeId, SymbolArena, SymbolId, SymbolKind};
use crate::types::{type_to_string, types_equal, Ty};

/// A generic function instantiated for one set of type arguments.
#[derive(Clone, Debug)]
pub(crate) struct Instantiation {
    /// The generic definition, never an external.
    generic: SymbolId,
    subs: Vec<(String, Ty)>,
    /// Restriction definition and what satisfies it.
    witnesses: Vec<(SymbolId, Witness)>,
    /// The concrete function.
    function: SymbolId,
}

/// What satisfies a restriction at one instantiation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Witness {
    /// A user function, never an external.
    Function(SymbolId),
    Builtin(Builtin),
}

/// Restrictions numeric type arguments satisfy without a witness.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Builtin {
    Add,
    Zero,
    Div,
}

impl Builtin {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "add" => Some(Builtin::Add),
            "zero" => Some(Builtin::Zero),
            "div" => Some(Builtin::Div),
            _ => None,
        }
    }
}

/// A `restriction=function` keyword at a generic call site.
#[derive(Copy, Clone, Debug)]
pub(crate) struct WitnessArg {
    /// The restriction as the generic function refers to it.
    pub(crate) restriction: SymbolId,
    /// The supplied function as the call site refers to it.
    pub(crate) witness: SymbolId,
    pub(crate) loc: Location,
}

/// The concrete instance of `generic` for a call with `args`, made visible
/// in `scope`'s module.
///
/// `args` are in parameter order, uncast. Returns a symbol callable from
/// `scope`.
#[tracing::instrument(level = "debug", skip_all, fields(generic = %cx.arena.symbol_name(generic)))]
pub(crate) fn instantiate(
    cx: &mut Compilation<'_>,
    scope: ScopeId,
    generic: SymbolId,
    args: &[Expr],
    supplied: &[WitnessArg],
    loc: Location,
) -> SemaResult<SymbolId> {
    let real = cx.arena.symbol_get_past_external(generic);
    let Some(function) = cx.arena.function(real) else {
        return Err(SemanticError::new(
            ErrorKind::invalid(format!("`{}` is not a function", cx.arena.symbol_name(generic))),
            loc,
        ));
    };
    let name = cx.arena.symbol_name(real).to_owned();
    let type_params = function.type_params.clone();
    let restrictions = function.restrictions.clone();
    let param_types: Vec<Ty> = function
        .params
        .iter()
        .filter_map(|p| cx.arena.variable_type(*p).cloned())
        .collect();

    let mut subs = Vec::new();
    for (param, arg) in param_types.iter().zip(args) {
        bind_type_parameters(param, &arg.ty, &mut subs, &cx.arena, arg.loc)?;
    }
    for param in &type_params {
        if !subs.iter().any(|(n, _)| n == param) {
            return Err(SemanticError::new(
                ErrorKind::invalid(format!(
                    "cannot infer type parameter `{param}` of `{name}` from its arguments"
                )),
                loc,
            ));
        }
    }

    let mut witnesses = Vec::with_capacity(restrictions.len());
    let mut local_witnesses = Vec::with_capacity(restrictions.len());
    for restriction in &restrictions {
        let witness = check_restriction(&cx.arena, *restriction, supplied, &subs, loc)?;
        witnesses.push((cx.arena.symbol_get_past_external(*restriction), witness));
        local_witnesses.push((*restriction, witness));
    }

    let cached = cx
        .instantiations
        .iter()
        .find(|i| i.generic == real && i.subs == subs && i.witnesses == witnesses)
        .map(|i| i.function);
    if let Some(function) = cached {
        tracing::trace!(generic = %name, "reusing instantiation");
        return imports::import_into_unit(cx, scope, function, loc);
    }

    let function = monomorphize(cx, scope, real, &subs, &local_witnesses, loc)?;
    cx.instantiations.push(Instantiation {
        generic: real,
        subs,
        witnesses,
        function,
    });
    Ok(function)
}

/// Record what each type parameter in `param` stands for in `arg`.
fn bind_type_parameters(
    param: &Ty,
    arg: &Ty,
    subs: &mut Vec<(String, Ty)>,
    arena: &SymbolArena,
    loc: Location,
) -> SemaResult<()> {
    let (p, a) = (
        param.peel_const().peel_allocatable(),
        arg.peel_const().peel_allocatable(),
    );
    let shape_mismatch = || {
        SemanticError::new(
            ErrorKind::TypeMismatch {
                expected: type_to_string(p, arena),
                found: type_to_string(a, arena),
            },
            loc,
        )
    };
    match (p, a) {
        (Ty::TypeParameter(name), _) => {
            if let Some((_, bound)) = subs.iter().find(|(n, _)| n == name) {
                if !types_equal(bound, a, arena) {
                    return Err(SemanticError::new(
                        ErrorKind::InconsistentTypeVariable {
                            param: name.clone(),
                            first: type_to_string(bound, arena),
                            second: type_to_string(a, arena),
                        },
                        loc,
                    ));
                }
            } else {
                subs.push((name.clone(), a.clone()));
            }
            Ok(())
        }
        (Ty::Array(pb, pd), Ty::Array(ab, ad)) => {
            if pd.len() != ad.len() {
                return Err(shape_mismatch());
            }
            bind_type_parameters(pb, ab, subs, arena, loc)
        }
        (Ty::List(pe), Ty::List(ae))
        | (Ty::Set(pe), Ty::Set(ae))
        | (Ty::Pointer(pe), Ty::Pointer(ae)) => bind_type_parameters(pe, ae, subs, arena, loc),
        (Ty::Dict(pk, pv), Ty::Dict(ak, av)) => {
            bind_type_parameters(pk, ak, subs, arena, loc)?;
            bind_type_parameters(pv, av, subs, arena, loc)
        }
        (Ty::Tuple(ps), Ty::Tuple(as_)) if ps.len() == as_.len() => {
            for (p, a) in ps.iter().zip(as_) {
                bind_type_parameters(p, a, subs, arena, loc)?;
            }
            Ok(())
        }
        _ if p.contains_type_parameter() => Err(shape_mismatch()),
        _ => Ok(()),
    }
}

fn check_restriction(
    arena: &SymbolArena,
    restriction: SymbolId,
    supplied: &[WitnessArg],
    subs: &[(String, Ty)],
    loc: Location,
) -> SemaResult<Witness> {
    let real = arena.symbol_get_past_external(restriction);
    let restriction_name = arena.symbol_name(real).to_owned();
    let mismatch = |reason: String, loc: Location| {
        SemanticError::new(
            ErrorKind::RestrictionMismatch {
                restriction: restriction_name.clone(),
                reason,
            },
            loc,
        )
    };

    let Some(arg) = supplied.iter().find(|w| w.restriction == restriction) else {
        if let Some(builtin) = Builtin::from_name(&restriction_name) {
            if let Some((param, ty)) = subs.iter().find(|(_, ty)| !ty.is_numeric()) {
                return Err(mismatch(
                    format!(
                        "built-in `{restriction_name}` needs a numeric type, but `{param}` is `{}`",
                        type_to_string(ty, arena)
                    ),
                    loc,
                ));
            }
            return Ok(Witness::Builtin(builtin));
        }
        return Err(mismatch(
            format!("no function supplied; pass one as `{restriction_name}=...`"),
            loc,
        ));
    };

    let witness = arena.symbol_get_past_external(arg.witness);
    let (Some(expected), Some(found)) = (arena.function(real), arena.function(witness)) else {
        return Err(mismatch(
            format!("`{}` is not a function", arena.symbol_name(arg.witness)),
            arg.loc,
        ));
    };
    if expected.params.len() != found.params.len() {
        return Err(mismatch(
            format!(
                "expected {} parameter(s), `{}` takes {}",
                expected.params.len(),
                arena.symbol_name(arg.witness),
                found.params.len()
            ),
            arg.loc,
        ));
    }
    let signature_matches = |want: Option<&Ty>, have: Option<&Ty>| match (want, have) {
        (Some(want), Some(have)) => types_equal(&substitute(want, subs), have, arena),
        (None, None) => true,
        _ => false,
    };
    for (index, (want, have)) in expected.params.iter().zip(&found.params).enumerate() {
        let (want, have) = (arena.variable_type(*want), arena.variable_type(*have));
        if !signature_matches(want, have) {
            return Err(mismatch(
                format!(
                    "parameter {} is `{}`, expected `{}`",
                    index + 1,
                    have.map_or_else(|| "?".to_owned(), |t| type_to_string(t, arena)),
                    want.map_or_else(|| "?".to_owned(), |t| type_to_string(&substitute(t, subs), arena)),
                ),
                arg.loc,
            ));
        }
    }
    if !signature_matches(arena.return_type(real), arena.return_type(witness)) {
        return Err(mismatch("return type differs".to_owned(), arg.loc));
    }
    Ok(Witness::Function(witness))
}

/// `ty` with every bound type parameter replaced.
fn substitute(ty: &Ty, subs: &[(String, Ty)]) -> Ty {
    struct Substitute<'a>(&'a [(String, Ty)]);

    impl IrFolder for Substitute<'_> {
        fn fold_ty(&mut self, ty: &Ty) -> Ty {
            if let Ty::TypeParameter(name) = ty {
                if let Some((_, bound)) = self.0.iter().find(|(n, _)| n == name) {
                    return bound.clone();
                }
            }
            walk_ty(self, ty)
        }
    }

    Substitute(subs).fold_ty(ty)
}

fn monomorphize(
    cx: &mut Compilation<'_>,
    scope: ScopeId,
    generic: SymbolId,
    subs: &[(String, Ty)],
    witnesses: &[(SymbolId, Witness)],
    loc: Location,
) -> SemaResult<SymbolId> {
    let defining_scope = cx.arena.scope_of(generic);
    let cross_module = !imports::same_unit(&cx.arena, scope, generic);
    let target = if cross_module {
        imports::unit_scope(&cx.arena, scope).unwrap_or(scope)
    } else {
        defining_scope
    };
    let subtree = Subtree::capture(&cx.arena, generic);

    let mut outside = FxHashMap::default();
    let mut builtins = FxHashMap::default();
    for (restriction, witness) in witnesses {
        match witness {
            Witness::Function(function) => {
                let local = imports::import_into_unit(cx, target, *function, loc)?;
                outside.insert(*restriction, local);
            }
            Witness::Builtin(builtin) => {
                builtins.insert(*restriction, *builtin);
            }
        }
    }
    if cross_module {
        for referenced in outside_references(&subtree) {
            if outside.contains_key(&referenced) || builtins.contains_key(&referenced) {
                continue;
            }
            let local = imports::import_into_unit(cx, target, referenced, loc)?;
            if local != referenced {
                outside.insert(referenced, local);
            }
        }
    }

    let generic_name = cx.arena.symbol_name(generic).to_owned();
    let ordinal = cx
        .instantiations
        .iter()
        .filter(|i| i.generic == generic)
        .count();
    let name = cx
        .arena
        .unique_name(target, &format!("__asr_generic_{generic_name}_{ordinal}"));

    let relocation = Relocation::reserve(&mut cx.arena, &subtree);
    let (mut symbols, scopes) = {
        let mut remap = Remap::new(&relocation);
        remap.outside = outside;
        remap.outside_scopes.insert(defining_scope, target);
        let mut folder = Instantiator {
            remap,
            subs,
            builtins,
            arena: &cx.arena,
        };
        subtree.fold(&mut folder)
    };
    if let Some(root) = symbols.first_mut() {
        root.name.clone_from(&name);
        if let SymbolKind::Function(f) = &mut root.kind {
            f.type_params.clear();
            f.restrictions.clear();
        }
    }
    relocation.write(&mut cx.arena, symbols, scopes);
    let Some(function) = relocation.symbol(generic) else {
        return Err(SemanticError::new(
            ErrorKind::invalid(format!("failed to instantiate `{generic_name}`")),
            loc,
        ));
    };
    cx.arena.bind(target, &name, function)?;
    tracing::debug!(generic = %generic_name, instance = %name, "instantiated generic function");
    Ok(function)
}

/// Rewrites a captured generic function into one concrete instance.
struct Instantiator<'a> {
    remap: Remap<'a>,
    subs: &'a [(String, Ty)],
    /// Restrictions satisfied by built-in arithmetic, by the id the body
    /// calls them through.
    builtins: FxHashMap<SymbolId, Builtin>,
    arena: &'a SymbolArena,
}

impl Instantiator<'_> {
    fn builtin_call(&mut self, builtin: Builtin, args: &[Expr], ty: Ty, expr: &Expr) -> Option<Expr> {
        let loc = expr.loc;
        let folded: Vec<Expr> = args.iter().map(|a| self.fold_expr(a)).collect();
        let mut args = folded.into_iter();
        match builtin {
            Builtin::Zero => Some(zero(&ty, loc)),
            Builtin::Add | Builtin::Div => {
                let (Some(left), Some(right), None) = (args.next(), args.next(), args.next())
                else {
                    return None;
                };
                let left = perform_casting(left, &ty, self.arena).ok()?;
                let right = perform_casting(right, &ty, self.arena).ok()?;
                let op = if builtin == Builtin::Add {
                    BinOp::Add
                } else {
                    BinOp::Div
                };
                Some(arithmetic(left, op, right, ty, loc))
            }
        }
    }
}

fn zero(ty: &Ty, loc: Location) -> Expr {
    match ty {
        Ty::Real { kind } => Expr::real(0.0, *kind, loc),
        Ty::Complex { .. } => Expr::new(ExprKind::ComplexConstant(0.0, 0.0), ty.clone(), loc)
            .with_value(Some(Constant::Complex(0.0, 0.0))),
        Ty::UnsignedInteger { .. } => Expr::new(ExprKind::IntegerConstant(0), ty.clone(), loc)
            .with_value(Some(Constant::UnsignedInteger(0))),
        Ty::Integer { kind } => Expr::integer(0, *kind, loc),
        _ => Expr::integer(0, 4, loc),
    }
}

impl IrFolder for Instantiator<'_> {
    fn fold_symbol_id(&mut self, id: SymbolId) -> SymbolId {
        self.remap.fold_symbol_id(id)
    }

    fn fold_scope_id(&mut self, id: ScopeId) -> ScopeId {
        self.remap.fold_scope_id(id)
    }

    fn fold_ty(&mut self, ty: &Ty) -> Ty {
        if let Ty::TypeParameter(name) = ty {
            if let Some((_, bound)) = self.subs.iter().find(|(n, _)| n == name) {
                return bound.clone();
            }
        }
        walk_ty(self, ty)
    }

    fn fold_expr(&mut self, expr: &Expr) -> Expr {
        if let ExprKind::FunctionCall { callee, args, .. } = &expr.kind {
            if let Some(builtin) = self.builtins.get(callee).copied() {
                let ty = self.fold_ty(&expr.ty);
                if let Some(lowered) = self.builtin_call(builtin, args, ty, expr) {
                    return lowered;
                }
            }
        }
        walk_expr(self, expr)
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
