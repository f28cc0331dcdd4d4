//! Cross-module symbol import.
//!
//! Every use of another module's entity goes through a local
//! [`ExternalSymbol`] that points straight at the real definition:
//!
//! ```text
//! module c:  def f
//! module b:  from c import f      b.f -> External(target = c.f, module = "c")
//! module a:  from b import f      a.f -> External(target = c.f, module = "c")
//! ```
//!
//! Re-exports are followed to the defining symbol, so an external never
//! targets another external and resolving past one takes a single step.

use lasr_ir::ast::Alias;
use lasr_ir::Location;

use crate::compile::Compilation;
use crate::error::{ErrorKind, SemaResult, SemanticError};
use crate::symbols::{ExternalSymbol, ScopeId, Symbol, SymbolArena, SymbolId, SymbolKind};

/// Name of the module defining `id`, for any symbol declared under a module.
pub(crate) fn module_name_of(arena: &SymbolArena, id: SymbolId) -> Option<String> {
    arena
        .enclosing_unit(arena.scope_of(id))
        .map(|unit| arena.symbol_name(unit).to_owned())
}

fn is_importable(kind: &SymbolKind) -> bool {
    matches!(
        kind,
        SymbolKind::Function(_)
            | SymbolKind::Variable(_)
            | SymbolKind::Struct(_)
            | SymbolKind::Enum(_)
            | SymbolKind::Union(_)
            | SymbolKind::GenericProcedure(_)
    )
}

/// Make `target` visible in `scope` as `local_name`.
///
/// Returns `target` itself when it is defined in the same module as
/// `scope`; otherwise an external symbol, reusing an existing one bound
/// under the same name.
pub(crate) fn import_symbol(
    cx: &mut Compilation<'_>,
    scope: ScopeId,
    local_name: &str,
    target: SymbolId,
    loc: Location,
) -> SemaResult<SymbolId> {
    let real = cx.arena.symbol_get_past_external(target);
    let symbol = cx.arena.symbol(real);
    if !is_importable(&symbol.kind) {
        return Err(SemanticError::new(
            ErrorKind::UnsupportedImport {
                name: symbol.name.clone(),
                kind: symbol.kind_name().to_owned(),
            },
            loc,
        ));
    }
    if let Some(owner) = aggregate_owner(&cx.arena, real) {
        return import_aggregate_member(cx, scope, owner, real, loc);
    }
    external(cx, scope, local_name, real, loc)
}

/// The struct, enum or union `id` is a member of.
fn aggregate_owner(arena: &SymbolArena, id: SymbolId) -> Option<SymbolId> {
    let owner = arena.scope(arena.scope_of(id)).owner?;
    matches!(
        arena.symbol(owner).kind,
        SymbolKind::Struct(_) | SymbolKind::Enum(_) | SymbolKind::Union(_)
    )
    .then_some(owner)
}

/// Local handle for `member` of `owner`, importing the owner first as
/// `1_<owner>` and the member as `1_<owner>_<member>`.
///
/// Members of aggregates declared in the current module are returned
/// unchanged.
pub(crate) fn import_aggregate_member(
    cx: &mut Compilation<'_>,
    scope: ScopeId,
    owner: SymbolId,
    member: SymbolId,
    loc: Location,
) -> SemaResult<SymbolId> {
    let owner = cx.arena.symbol_get_past_external(owner);
    if same_unit(&cx.arena, scope, owner) {
        return Ok(member);
    }
    let owner_name = cx.arena.symbol_name(owner).to_owned();
    let member_name = cx.arena.symbol_name(member).to_owned();
    let unit_scope = unit_scope(&cx.arena, scope).unwrap_or(scope);
    external(cx, unit_scope, &format!("1_{owner_name}"), owner, loc)?;
    external(
        cx,
        unit_scope,
        &format!("1_{owner_name}_{member_name}"),
        member,
        loc,
    )
}

pub(crate) fn same_unit(arena: &SymbolArena, scope: ScopeId, real: SymbolId) -> bool {
    arena.enclosing_unit(scope) == arena.enclosing_unit(arena.scope_of(real))
}

pub(crate) fn unit_scope(arena: &SymbolArena, scope: ScopeId) -> Option<ScopeId> {
    arena
        .enclosing_unit(scope)
        .and_then(|unit| arena.symbol(unit).owned_scope())
}

fn external(
    cx: &mut Compilation<'_>,
    scope: ScopeId,
    local_name: &str,
    real: SymbolId,
    loc: Location,
) -> SemaResult<SymbolId> {
    if same_unit(&cx.arena, scope, real) {
        return Ok(real);
    }
    let module_name = module_name_of(&cx.arena, real).unwrap_or_default();
    if let Some(existing) = cx.arena.get_local(scope, local_name) {
        if let SymbolKind::External(ext) = &cx.arena.symbol(existing).kind {
            if ext.target == real && ext.module_name == module_name {
                return Ok(existing);
            }
        }
    }
    let original_name = cx.arena.symbol_name(real).to_owned();
    tracing::trace!(local = local_name, module = %module_name, "external symbol");
    let id = cx.arena.add(
        scope,
        Symbol::new(
            local_name,
            loc,
            SymbolKind::External(ExternalSymbol {
                target: real,
                module_name: module_name.clone(),
                original_name,
            }),
        ),
    )?;
    cx.arena.add_unit_dependency(scope, &module_name);
    Ok(id)
}

/// A handle for `target` usable anywhere in the module enclosing `scope`.
///
/// Reuses any external of that module already pointing at the same
/// definition; a fresh one takes the definition's name, made unique if
/// the module binds that name to something else.
pub(crate) fn import_into_unit(
    cx: &mut Compilation<'_>,
    scope: ScopeId,
    target: SymbolId,
    loc: Location,
) -> SemaResult<SymbolId> {
    let real = cx.arena.symbol_get_past_external(target);
    if same_unit(&cx.arena, scope, real) {
        return Ok(real);
    }
    let unit_scope = unit_scope(&cx.arena, scope).unwrap_or(scope);
    let existing = cx.arena.iter_local(unit_scope).map(|(_, id)| id).find(|id| {
        matches!(&cx.arena.symbol(*id).kind, SymbolKind::External(ext) if ext.target == real)
    });
    if let Some(existing) = existing {
        return Ok(existing);
    }
    let name = cx.arena.unique_name(unit_scope, cx.arena.symbol_name(real));
    import_symbol(cx, unit_scope, &name, real, loc)
}

/// `from module import a, b as c` and `from module import *`.
pub(crate) fn import_from(
    cx: &mut Compilation<'_>,
    scope: ScopeId,
    module: &str,
    names: &[Alias],
    loc: Location,
) -> SemaResult<()> {
    let module_id = cx.load_module(module, loc)?;
    let Some(module_scope) = cx.arena.symbol(module_id).owned_scope() else {
        return Ok(());
    };
    cx.arena.add_unit_dependency(scope, module);
    for alias in names {
        if alias.name == "*" {
            let exported: Vec<(String, SymbolId)> = cx
                .arena
                .iter_local(module_scope)
                .filter(|(name, _)| is_public_name(name))
                .map(|(name, id)| (name.to_owned(), id))
                .collect();
            for (name, id) in exported {
                import_symbol(cx, scope, &name, id, alias.loc)?;
            }
            continue;
        }
        let Some(target) = cx.arena.get_local(module_scope, &alias.name) else {
            return Err(SemanticError::new(
                ErrorKind::UndeclaredSymbol {
                    name: alias.name.clone(),
                },
                alias.loc,
            )
            .with_hint(format!("`{module}` has no symbol named `{}`", alias.name)));
        };
        import_symbol(cx, scope, alias.local_name(), target, alias.loc)?;
    }
    Ok(())
}

/// Names a star import brings in: no dunder names, no synthesized
/// `1_...` or `alias.attr` handles.
fn is_public_name(name: &str) -> bool {
    !name.starts_with("__") && !name.starts_with(|c: char| c.is_ascii_digit()) && !name.contains('.')
}

/// `import module` and `import module as alias`.
pub(crate) fn import_module(
    cx: &mut Compilation<'_>,
    scope: ScopeId,
    names: &[Alias],
    loc: Location,
) -> SemaResult<()> {
    for alias in names {
        cx.load_module(&alias.name, alias.loc.merge(loc))?;
        cx.arena.add_unit_dependency(scope, &alias.name);
        let Some(unit) = cx.arena.enclosing_unit(scope) else {
            continue;
        };
        if let SymbolKind::Module(m) = &mut cx.arena.symbol_mut(unit).kind {
            m.module_aliases
                .insert(alias.local_name().to_owned(), alias.name.clone());
        }
    }
    Ok(())
}

/// `alias.attr` where `alias` names an imported module.
///
/// The member is imported on first use under the local name
/// `alias.attr`. Returns `Ok(None)` when `alias` is not a module alias of
/// the enclosing module.
pub(crate) fn module_member(
    cx: &mut Compilation<'_>,
    scope: ScopeId,
    alias: &str,
    attr: &str,
    loc: Location,
) -> SemaResult<Option<SymbolId>> {
    let Some(unit) = cx.arena.enclosing_unit(scope) else {
        return Ok(None);
    };
    let Some(module_name) = cx
        .arena
        .symbol(unit)
        .as_module()
        .and_then(|m| m.module_aliases.get(alias))
        .cloned()
    else {
        return Ok(None);
    };
    let Some(unit_scope) = cx.arena.symbol(unit).owned_scope() else {
        return Ok(None);
    };
    let local_name = format!("{alias}.{attr}");
    if let Some(existing) = cx.arena.get_local(unit_scope, &local_name) {
        return Ok(Some(existing));
    }
    let module = cx.load_module(&module_name, loc)?;
    let target = cx
        .arena
        .symbol(module)
        .owned_scope()
        .and_then(|s| cx.arena.get_local(s, attr));
    let Some(target) = target else {
        return Err(SemanticError::new(
            ErrorKind::UndeclaredSymbol {
                name: format!("{alias}.{attr}"),
            },
            loc,
        )
        .with_hint(format!("`{module_name}` has no symbol named `{attr}`")));
    };
    import_symbol(cx, unit_scope, &local_name, target, loc).map(Some)
}
