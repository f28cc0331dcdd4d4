//! Copying a symbol together with every scope and symbol it owns.
//!
//! A [`Subtree`] is a detached snapshot: the root symbol, the scope it owns,
//! and transitively every symbol declared in those scopes. A [`Relocation`]
//! assigns each captured id a new id, either fresh slots in an existing
//! arena ([`Relocation::reserve`]) or dense indices for a standalone arena
//! ([`Relocation::dense`]). Folding the snapshot with [`Remap`] rewrites
//! every captured id through the relocation.
//!
//! Ids that point outside the subtree are left alone unless the caller maps
//! them explicitly; [`outside_references`] lists them.

use rustc_hash::{FxHashMap, FxHashSet};

use super::IrFolder;
use crate::symbols::{Scope, ScopeId, Symbol, SymbolArena, SymbolId};

/// Detached copy of a symbol and everything it owns.
#[derive(Clone, Debug)]
pub struct Subtree {
    /// Root first, then in discovery order.
    symbols: Vec<(SymbolId, Symbol)>,
    scopes: Vec<(ScopeId, Scope)>,
}

impl Subtree {
    pub fn capture(arena: &SymbolArena, root: SymbolId) -> Subtree {
        let mut symbols = vec![(root, arena.symbol(root).clone())];
        let mut scopes = Vec::new();
        let mut next = 0;
        while next < symbols.len() {
            let owned = symbols[next].1.owned_scope();
            next += 1;
            let Some(scope) = owned else {
                continue;
            };
            for (_, id) in arena.iter_local(scope) {
                if arena.scope_of(id) == scope {
                    symbols.push((id, arena.symbol(id).clone()));
                }
            }
            scopes.push((scope, arena.scope(scope).clone()));
        }
        Subtree { symbols, scopes }
    }

    pub fn root(&self) -> SymbolId {
        self.symbols[0].0
    }

    pub fn root_symbol(&self) -> &Symbol {
        &self.symbols[0].1
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub fn symbols(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols.iter().map(|(id, s)| (*id, s))
    }

    /// Fold every captured symbol and scope, preserving capture order.
    pub fn fold<F: IrFolder>(&self, folder: &mut F) -> (Vec<Symbol>, Vec<Scope>) {
        let symbols = self
            .symbols
            .iter()
            .map(|(_, s)| folder.fold_symbol(s))
            .collect();
        let scopes = self
            .scopes
            .iter()
            .map(|(_, s)| folder.fold_scope(s))
            .collect();
        (symbols, scopes)
    }
}

/// Old-to-new id mapping for a captured subtree.
#[derive(Clone, Debug, Default)]
pub struct Relocation {
    symbols: FxHashMap<SymbolId, SymbolId>,
    scopes: FxHashMap<ScopeId, ScopeId>,
    order: Vec<SymbolId>,
    scope_order: Vec<ScopeId>,
}

impl Relocation {
    /// Allocate a fresh slot in `arena` for every captured scope and symbol.
    ///
    /// Symbol slots hold a copy of the original until [`Relocation::write`]
    /// replaces them; scopes start empty.
    pub fn reserve(arena: &mut SymbolArena, subtree: &Subtree) -> Relocation {
        let mut relocation = Relocation::default();
        for (old, _) in &subtree.scopes {
            let new = arena.new_scope(None);
            relocation.scopes.insert(*old, new);
            relocation.scope_order.push(new);
        }
        for (old, symbol) in &subtree.symbols {
            let new = arena.alloc(symbol.clone());
            relocation.symbols.insert(*old, new);
            relocation.order.push(new);
        }
        relocation
    }

    /// Number captured symbols `0..n` and scopes `0..m` in capture order.
    pub fn dense(subtree: &Subtree) -> Relocation {
        let mut relocation = Relocation::default();
        for (index, (old, _)) in subtree.scopes.iter().enumerate() {
            let new = ScopeId::from_raw(u32::try_from(index).unwrap_or(u32::MAX));
            relocation.scopes.insert(*old, new);
            relocation.scope_order.push(new);
        }
        for (index, (old, _)) in subtree.symbols.iter().enumerate() {
            let new = SymbolId::from_raw(u32::try_from(index).unwrap_or(u32::MAX));
            relocation.symbols.insert(*old, new);
            relocation.order.push(new);
        }
        relocation
    }

    pub fn symbol(&self, old: SymbolId) -> Option<SymbolId> {
        self.symbols.get(&old).copied()
    }

    pub fn scope(&self, old: ScopeId) -> Option<ScopeId> {
        self.scopes.get(&old).copied()
    }

    /// Store folded copies, as returned by [`Subtree::fold`], into the
    /// slots reserved for them.
    pub fn write(&self, arena: &mut SymbolArena, symbols: Vec<Symbol>, scopes: Vec<Scope>) {
        for (id, symbol) in self.order.iter().zip(symbols) {
            *arena.symbol_mut(*id) = symbol;
        }
        for (id, scope) in self.scope_order.iter().zip(scopes) {
            *arena.scope_mut(*id) = scope;
        }
    }
}

/// Rewrites captured ids through a [`Relocation`]; other ids go through
/// `outside`, or stay unchanged when absent from it.
pub struct Remap<'a> {
    pub relocation: &'a Relocation,
    pub outside: FxHashMap<SymbolId, SymbolId>,
    pub outside_scopes: FxHashMap<ScopeId, ScopeId>,
}

impl<'a> Remap<'a> {
    pub fn new(relocation: &'a Relocation) -> Self {
        Remap {
            relocation,
            outside: FxHashMap::default(),
            outside_scopes: FxHashMap::default(),
        }
    }
}

impl IrFolder for Remap<'_> {
    fn fold_symbol_id(&mut self, id: SymbolId) -> SymbolId {
        self.relocation
            .symbol(id)
            .or_else(|| self.outside.get(&id).copied())
            .unwrap_or(id)
    }

    fn fold_scope_id(&mut self, id: ScopeId) -> ScopeId {
        self.relocation
            .scope(id)
            .or_else(|| self.outside_scopes.get(&id).copied())
            .unwrap_or(id)
    }
}

/// Symbol ids referenced from inside `subtree` that it does not contain,
/// in first-reference order.
pub fn outside_references(subtree: &Subtree) -> Vec<SymbolId> {
    let inside: FxHashSet<SymbolId> = subtree.symbols.iter().map(|(id, _)| *id).collect();
    let mut collector = Collector {
        inside,
        found: Vec::new(),
    };
    for (_, symbol) in &subtree.symbols {
        let _ = collector.fold_symbol(symbol);
    }
    for (_, scope) in &subtree.scopes {
        let _ = collector.fold_scope(scope);
    }
    collector.found
}

struct Collector {
    inside: FxHashSet<SymbolId>,
    found: Vec<SymbolId>,
}

impl IrFolder for Collector {
    fn fold_symbol_id(&mut self, id: SymbolId) -> SymbolId {
        if !self.inside.contains(&id) && !self.found.contains(&id) {
            self.found.push(id);
        }
        id
    }
}
