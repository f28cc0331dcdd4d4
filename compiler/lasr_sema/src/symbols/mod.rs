//! Symbol tables as an arena of scopes.
//!
//! # Design
//!
//! All scopes and symbols of a compilation live in one [`SymbolArena`] and are
//! addressed by [`ScopeId`] / [`SymbolId`]. A scope's `parent` and `owner` are
//! indices into the same arena, so a function's scope can point up at its
//! module while the module's table points down at the function without any
//! ownership cycle.
//!
//! ```text
//! root scope
//!  └─ Module `m`            owns scope#1
//!      ├─ Variable `x`
//!      └─ Function `f`      owns scope#2 (parent scope#1, owner `f`)
//!          └─ Variable `a`
//! ```
//!
//! Nothing is ever freed individually; the arena is dropped with the
//! compilation.

use std::collections::BTreeMap;
use std::fmt;

use lasr_ir::Location;

use crate::error::{ErrorKind, SemanticError};
use crate::ir::{Constant, Expr, Stmt};
use crate::types::Ty;

/// Index of a [`Symbol`] in a [`SymbolArena`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct SymbolId(u32);

impl SymbolId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        SymbolId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sym#{}", self.0)
    }
}

/// Index of a [`Scope`] in a [`SymbolArena`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct ScopeId(u32);

impl ScopeId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        ScopeId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

/// One symbol table.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Scope {
    pub parent: Option<ScopeId>,
    /// The declaration that introduced this scope; `None` for the root.
    pub owner: Option<SymbolId>,
    /// Sorted so that iteration order is deterministic.
    pub symbols: BTreeMap<String, SymbolId>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Symbol {
    pub name: String,
    /// The scope this symbol is declared in.
    pub parent: ScopeId,
    pub loc: Location,
    pub kind: SymbolKind,
}

impl Symbol {
    pub fn new(name: impl Into<String>, loc: Location, kind: SymbolKind) -> Self {
        Symbol {
            name: name.into(),
            parent: ScopeId::from_raw(0),
            loc,
            kind,
        }
    }

    /// Human-readable kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            SymbolKind::Variable(_) => "variable",
            SymbolKind::Function(f) if f.return_var.is_none() => "subroutine",
            SymbolKind::Function(_) => "function",
            SymbolKind::Module(_) => "module",
            SymbolKind::Program(_) => "program",
            SymbolKind::Struct(_) => "struct",
            SymbolKind::Enum(_) => "enum",
            SymbolKind::Union(_) => "union",
            SymbolKind::GenericProcedure(_) => "generic procedure",
            SymbolKind::External(_) => "external symbol",
            SymbolKind::Block(_) => "block",
            SymbolKind::AssociateBlock(_) => "associate block",
            SymbolKind::ClassProcedure(_) => "method",
        }
    }

    /// The scope this symbol owns, if it introduces one.
    pub fn owned_scope(&self) -> Option<ScopeId> {
        match &self.kind {
            SymbolKind::Function(f) => Some(f.scope),
            SymbolKind::Module(m) => Some(m.scope),
            SymbolKind::Program(p) => Some(p.scope),
            SymbolKind::Struct(s) => Some(s.scope),
            SymbolKind::Enum(e) => Some(e.scope),
            SymbolKind::Union(u) => Some(u.scope),
            SymbolKind::Block(b) | SymbolKind::AssociateBlock(b) => Some(b.scope),
            SymbolKind::Variable(_)
            | SymbolKind::GenericProcedure(_)
            | SymbolKind::External(_)
            | SymbolKind::ClassProcedure(_) => None,
        }
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match &self.kind {
            SymbolKind::Variable(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match &self.kind {
            SymbolKind::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_module(&self) -> Option<&Module> {
        match &self.kind {
            SymbolKind::Module(m) => Some(m),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum SymbolKind {
    Variable(Variable),
    Function(Function),
    Module(Module),
    Program(Program),
    Struct(StructType),
    Enum(EnumType),
    Union(UnionType),
    GenericProcedure(GenericProcedure),
    External(ExternalSymbol),
    Block(Block),
    AssociateBlock(Block),
    ClassProcedure(ClassProcedure),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Intent {
    Local,
    In,
    Out,
    InOut,
    ReturnVar,
    Unspecified,
}

impl Intent {
    pub fn is_argument(self) -> bool {
        matches!(self, Intent::In | Intent::Out | Intent::InOut | Intent::Unspecified)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Storage {
    Default,
    /// Compile-time constant.
    Parameter,
    Allocatable,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Access {
    Public,
    Private,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Presence {
    Required,
    Optional,
}

/// Calling convention / provenance of a procedure or aggregate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Abi {
    Source,
    BindC,
    BindPython,
    /// Interface-only stub that a later full definition may replace.
    Interactive,
    Intrinsic,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum DefType {
    Implementation,
    Interface,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum EnumClassification {
    /// Values are `0, 1, 2, ...` in declaration order.
    UniqueConsecutiveFromZero,
    Unique,
    NonUnique,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Variable {
    pub ty: Ty,
    pub intent: Intent,
    pub storage: Storage,
    /// Compile-time value, for constants and constant-initialized globals.
    pub value: Option<Constant>,
    pub initializer: Option<Expr>,
    pub access: Access,
    pub presence: Presence,
    /// Names of symbols the type or initializer refers to.
    pub dependencies: Vec<String>,
}

impl Variable {
    pub fn new(ty: Ty, intent: Intent) -> Self {
        let storage = if matches!(ty, Ty::Allocatable(_)) {
            Storage::Allocatable
        } else if ty.is_const() {
            Storage::Parameter
        } else {
            Storage::Default
        };
        Variable {
            ty,
            intent,
            storage,
            value: None,
            initializer: None,
            access: Access::Public,
            presence: Presence::Required,
            dependencies: Vec::new(),
        }
    }

    pub fn local(ty: Ty) -> Self {
        Variable::new(ty, Intent::Local)
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Function {
    pub scope: ScopeId,
    pub params: Vec<SymbolId>,
    /// Absent for subroutines.
    pub return_var: Option<SymbolId>,
    pub body: Vec<Stmt>,
    pub abi: Abi,
    pub deftype: DefType,
    pub access: Access,
    pub deterministic: bool,
    pub side_effect_free: bool,
    /// Type-parameter names, non-empty for generic functions.
    pub type_params: Vec<String>,
    /// Restriction functions this generic function relies on.
    pub restrictions: Vec<SymbolId>,
    pub is_restriction: bool,
    pub dependencies: Vec<String>,
}

impl Function {
    pub fn new(scope: ScopeId) -> Self {
        Function {
            scope,
            params: Vec::new(),
            return_var: None,
            body: Vec::new(),
            abi: Abi::Source,
            deftype: DefType::Implementation,
            access: Access::Public,
            deterministic: false,
            side_effect_free: false,
            type_params: Vec::new(),
            restrictions: Vec::new(),
            is_restriction: false,
            dependencies: Vec::new(),
        }
    }

    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    pub fn is_interface_stub(&self) -> bool {
        self.abi == Abi::Interactive && self.deftype == DefType::Interface
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Module {
    pub scope: ScopeId,
    /// Modules this one imports from, deduplicated, in first-use order.
    pub dependencies: Vec<String>,
    /// `import m as a` bindings: alias to module name.
    pub module_aliases: BTreeMap<String, String>,
    pub loaded_from_cache: bool,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Program {
    pub scope: ScopeId,
    pub dependencies: Vec<String>,
    pub body: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct StructType {
    pub scope: ScopeId,
    /// Member variable names in declaration order.
    pub members: Vec<String>,
    pub abi: Abi,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct EnumType {
    pub scope: ScopeId,
    pub members: Vec<String>,
    pub underlying: Ty,
    pub classification: EnumClassification,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct UnionType {
    pub scope: ScopeId,
    pub members: Vec<String>,
}

/// An overload set. Candidates are tried in declaration order.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct GenericProcedure {
    pub procs: Vec<SymbolId>,
}

/// Local name for a symbol defined in another module.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct ExternalSymbol {
    /// The real definition; never itself an `ExternalSymbol`.
    pub target: SymbolId,
    /// The module that defines `target`.
    pub module_name: String,
    /// Name of `target` in its defining scope.
    pub original_name: String,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Block {
    pub scope: ScopeId,
    pub body: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassProcedure {
    /// The struct this method belongs to.
    pub owner: SymbolId,
    /// The implementing function.
    pub procedure: SymbolId,
}

/// Append `name` unless already present.
pub fn add_dependency(dependencies: &mut Vec<String>, name: &str) {
    if !dependencies.iter().any(|d| d == name) {
        dependencies.push(name.to_owned());
    }
}

/// Every scope and symbol of one compilation.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct SymbolArena {
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
}

impl SymbolArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// An arena whose ids are the positions in `scopes` and `symbols`.
    pub fn from_parts(scopes: Vec<Scope>, symbols: Vec<Symbol>) -> Self {
        SymbolArena { scopes, symbols }
    }

    pub fn new_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(u32::try_from(self.scopes.len()).unwrap_or(u32::MAX));
        self.scopes.push(Scope {
            parent,
            owner: None,
            symbols: BTreeMap::new(),
        });
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    pub fn set_scope_owner(&mut self, scope: ScopeId, owner: SymbolId) {
        self.scopes[scope.index()].owner = Some(owner);
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.index()]
    }

    pub fn symbol_name(&self, id: SymbolId) -> &str {
        &self.symbols[id.index()].name
    }

    /// The scope a symbol is declared in.
    pub fn scope_of(&self, id: SymbolId) -> ScopeId {
        self.symbols[id.index()].parent
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// Store a symbol without binding it to a name.
    pub fn alloc(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(u32::try_from(self.symbols.len()).unwrap_or(u32::MAX));
        self.symbols.push(symbol);
        id
    }

    /// Declare `symbol` in `scope` under its own name.
    ///
    /// A local redeclaration is a `DuplicateSymbol` error carrying both
    /// locations, with one exception: outside global scopes, an interface
    /// stub may be replaced by a full function definition. The stub's id is
    /// then reused for the definition.
    pub fn add(&mut self, scope: ScopeId, mut symbol: Symbol) -> Result<SymbolId, SemanticError> {
        symbol.parent = scope;
        if let Some(existing) = self.get_local(scope, &symbol.name) {
            let replaces_stub = !self.is_global_scope(scope)
                && matches!(&symbol.kind, SymbolKind::Function(_))
                && self
                    .symbol(existing)
                    .as_function()
                    .is_some_and(Function::is_interface_stub);
            if replaces_stub {
                tracing::trace!(name = %symbol.name, "replacing interface stub");
                self.symbols[existing.index()] = symbol;
                return Ok(existing);
            }
            return Err(self.duplicate(existing, &symbol.name, symbol.loc));
        }
        let name = symbol.name.clone();
        let id = self.alloc(symbol);
        self.scopes[scope.index()].symbols.insert(name, id);
        Ok(id)
    }

    /// Bind an existing symbol under `name` in `scope`.
    pub fn bind(&mut self, scope: ScopeId, name: &str, id: SymbolId) -> Result<(), SemanticError> {
        if let Some(existing) = self.get_local(scope, name) {
            return Err(self.duplicate(existing, name, self.symbol(id).loc));
        }
        self.scopes[scope.index()]
            .symbols
            .insert(name.to_owned(), id);
        Ok(())
    }

    fn duplicate(&self, existing: SymbolId, name: &str, loc: Location) -> SemanticError {
        SemanticError::new(
            ErrorKind::DuplicateSymbol {
                name: name.to_owned(),
            },
            loc,
        )
        .with_label(self.symbol(existing).loc, "first declared here")
    }

    /// Look up `name` here, then in enclosing scopes.
    pub fn resolve(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let table = self.scope(id);
            if let Some(found) = table.symbols.get(name) {
                return Some(*found);
            }
            current = table.parent;
        }
        None
    }

    /// Look up `name` in `scope` only.
    pub fn get_local(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scope(scope).symbols.get(name).copied()
    }

    /// A name not bound in `scope`: `base`, else `base1`, `base2`, ...
    pub fn unique_name(&self, scope: ScopeId, base: &str) -> String {
        if self.get_local(scope, base).is_none() {
            return base.to_owned();
        }
        let mut counter = 1usize;
        loop {
            let candidate = format!("{base}{counter}");
            if self.get_local(scope, &candidate).is_none() {
                return candidate;
            }
            counter += 1;
        }
    }

    /// Follow an `ExternalSymbol` to its definition; other symbols map to themselves.
    pub fn symbol_get_past_external(&self, id: SymbolId) -> SymbolId {
        match &self.symbol(id).kind {
            SymbolKind::External(ext) => ext.target,
            _ => id,
        }
    }

    /// True for the root and for scopes owned by a module or program.
    pub fn is_global_scope(&self, scope: ScopeId) -> bool {
        match self.scope(scope).owner {
            None => true,
            Some(owner) => matches!(
                self.symbol(owner).kind,
                SymbolKind::Module(_) | SymbolKind::Program(_)
            ),
        }
    }

    /// The module or program whose scope encloses `scope`.
    pub fn enclosing_unit(&self, scope: ScopeId) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let table = self.scope(id);
            if let Some(owner) = table.owner {
                if matches!(
                    self.symbol(owner).kind,
                    SymbolKind::Module(_) | SymbolKind::Program(_)
                ) {
                    return Some(owner);
                }
            }
            current = table.parent;
        }
        None
    }

    /// The function whose scope encloses `scope`, stopping at module level.
    pub fn enclosing_function(&self, scope: ScopeId) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let table = self.scope(id);
            match table.owner.map(|o| (o, &self.symbol(o).kind)) {
                Some((owner, SymbolKind::Function(_))) => return Some(owner),
                Some((_, SymbolKind::Module(_) | SymbolKind::Program(_))) | None => return None,
                Some(_) => current = table.parent,
            }
        }
        None
    }

    /// Iterate a scope's bindings in name order.
    pub fn iter_local(&self, scope: ScopeId) -> impl Iterator<Item = (&str, SymbolId)> {
        self.scope(scope)
            .symbols
            .iter()
            .map(|(name, id)| (name.as_str(), *id))
    }

    /// Type of a variable symbol, looking past externals.
    pub fn variable_type(&self, id: SymbolId) -> Option<&Ty> {
        self.symbol(self.symbol_get_past_external(id))
            .as_variable()
            .map(|v| &v.ty)
    }

    pub fn function(&self, id: SymbolId) -> Option<&Function> {
        self.symbol(id).as_function()
    }

    pub fn function_mut(&mut self, id: SymbolId) -> Option<&mut Function> {
        match &mut self.symbol_mut(id).kind {
            SymbolKind::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn variable_mut(&mut self, id: SymbolId) -> Option<&mut Variable> {
        match &mut self.symbol_mut(id).kind {
            SymbolKind::Variable(v) => Some(v),
            _ => None,
        }
    }

    /// Record a module dependency on the module or program enclosing `scope`.
    pub fn add_unit_dependency(&mut self, scope: ScopeId, module_name: &str) {
        let Some(unit) = self.enclosing_unit(scope) else {
            return;
        };
        match &mut self.symbol_mut(unit).kind {
            SymbolKind::Module(m) => add_dependency(&mut m.dependencies, module_name),
            SymbolKind::Program(p) => add_dependency(&mut p.dependencies, module_name),
            _ => {}
        }
    }

    /// Return type of a function symbol, looking past externals.
    pub fn return_type(&self, id: SymbolId) -> Option<&Ty> {
        let function = self.function(self.symbol_get_past_external(id))?;
        function.return_var.and_then(|rv| self.variable_type(rv))
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
