//! Relocatable snapshots of compiled modules.
//!
//! A [`TypedModule`] is a standalone arena: the module symbol is
//! `SymbolId(0)` and owns `ScopeId(0)`. References to symbols of other
//! modules cannot be stored as ids, so each one is replaced by
//! `SymbolId(n + i)`, where `n` is the number of stored symbols and `i`
//! indexes [`TypedModule::foreign`]. On install, every foreign reference is
//! re-resolved by module name and scope path, loading the module if needed.

use crate::error::SemaResult;
use crate::fold::relocate::{outside_references, Relocation, Remap, Subtree};
use crate::symbols::{ScopeId, SymbolArena, SymbolId, SymbolKind};

use super::Compilation;

/// Storage for compiled modules, supplied by the driver.
pub trait ModuleCache {
    /// A previously stored module, or `None` to compile from source.
    fn load_cached(&mut self, name: &str) -> Option<TypedModule>;

    /// Persist a compiled module. Failures are logged and otherwise ignored.
    fn store_cached(&mut self, name: &str, module: &TypedModule) -> Result<(), CacheError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot encode module: {0}")]
    Encode(String),
}

/// A symbol in another module, addressed by name.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct ForeignRef {
    pub module: String,
    /// Names from the module scope down to the symbol; empty for the module
    /// itself.
    pub path: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct TypedModule {
    pub name: String,
    pub arena: SymbolArena,
    pub foreign: Vec<ForeignRef>,
}

impl TypedModule {
    /// Snapshot `module` and everything declared inside it.
    pub fn export(arena: &SymbolArena, module: SymbolId) -> TypedModule {
        let subtree = Subtree::capture(arena, module);
        let relocation = Relocation::dense(&subtree);
        let mut remap = Remap::new(&relocation);
        let base = subtree.symbol_count();
        let mut foreign = Vec::new();
        for (index, id) in outside_references(&subtree).into_iter().enumerate() {
            remap
                .outside
                .insert(id, SymbolId::from_raw(u32::try_from(base + index).unwrap_or(u32::MAX)));
            foreign.push(foreign_ref(arena, id));
        }
        let (mut symbols, mut scopes) = subtree.fold(&mut remap);
        if let Some(root) = symbols.first_mut() {
            root.parent = ScopeId::from_raw(0);
            if let SymbolKind::Module(m) = &mut root.kind {
                m.loaded_from_cache = false;
            }
        }
        if let Some(scope) = scopes.first_mut() {
            scope.parent = None;
        }
        TypedModule {
            name: arena.symbol_name(module).to_owned(),
            arena: SymbolArena::from_parts(scopes, symbols),
            foreign,
        }
    }

    pub fn module(&self) -> SymbolId {
        SymbolId::from_raw(0)
    }
}

fn foreign_ref(arena: &SymbolArena, id: SymbolId) -> ForeignRef {
    let mut path = vec![arena.symbol_name(id).to_owned()];
    let mut scope = arena.scope_of(id);
    loop {
        let Some(owner) = arena.scope(scope).owner else {
            // Declared in the root: `id` is itself a module.
            let module = path.pop().unwrap_or_default();
            return ForeignRef { module, path };
        };
        if let SymbolKind::Module(_) = arena.symbol(owner).kind {
            path.reverse();
            return ForeignRef {
                module: arena.symbol_name(owner).to_owned(),
                path,
            };
        }
        path.push(arena.symbol_name(owner).to_owned());
        scope = arena.scope_of(owner);
    }
}

/// Install a cached module into the compilation.
///
/// Returns `Ok(None)` when a foreign reference no longer resolves, so the
/// caller can recompile from source.
pub(super) fn install(cx: &mut Compilation<'_>, typed: &TypedModule) -> SemaResult<Option<SymbolId>> {
    let mut resolved = Vec::with_capacity(typed.foreign.len());
    for reference in &typed.foreign {
        let module = cx.load_module(&reference.module, lasr_ir::Location::DUMMY)?;
        match resolve_path(&cx.arena, module, &reference.path) {
            Some(id) => resolved.push(id),
            None => return Ok(None),
        }
    }

    let subtree = Subtree::capture(&typed.arena, typed.module());
    let relocation = Relocation::reserve(&mut cx.arena, &subtree);
    let mut remap = Remap::new(&relocation);
    let base = subtree.symbol_count();
    for (index, id) in resolved.into_iter().enumerate() {
        remap
            .outside
            .insert(SymbolId::from_raw(u32::try_from(base + index).unwrap_or(u32::MAX)), id);
    }
    let (mut symbols, mut scopes) = subtree.fold(&mut remap);
    if let Some(root) = symbols.first_mut() {
        root.parent = cx.root;
        if let SymbolKind::Module(m) = &mut root.kind {
            m.loaded_from_cache = true;
        }
    }
    if let Some(scope) = scopes.first_mut() {
        scope.parent = Some(cx.root);
    }
    relocation.write(&mut cx.arena, symbols, scopes);
    Ok(relocation.symbol(typed.module()))
}

fn resolve_path(arena: &SymbolArena, module: SymbolId, path: &[String]) -> Option<SymbolId> {
    let mut current = module;
    for name in path {
        let scope = arena.symbol(current).owned_scope()?;
        current = arena.get_local(scope, name)?;
    }
    Some(current)
}
