//! Compilation driver: module loading, both passes, program synthesis.
//!
//! # Design
//!
//! A [`Compilation`] owns the one [`SymbolArena`] of a translation unit.
//! Modules are loaded on first import, synchronously: an import of a module
//! that is neither loaded nor cached runs both passes on it before the
//! importer's pass 1 resumes. A module is bound in the root scope only once
//! it has been analysed successfully.
//!
//! ```text
//! compile_main(ast)
//!   └─ analyze_module(main)
//!        ├─ symtab::build_module   pass 1, may call load_module(dep)
//!        └─ lower::lower_module    pass 2
//!   └─ synthesize_program          __main_program
//! ```
//!
//! The first [`SemanticError`] aborts the unit. It is converted into a
//! [`Diagnostic`] and returned together with any soft warnings.

mod cache;

use std::collections::HashMap;
use std::hash::BuildHasher;

use lasr_diagnostic::{Diagnostic, DiagnosticQueue, DiagnosticSeverity, ErrorGuaranteed};
use lasr_ir::{ast, Location};
use rustc_hash::FxHashMap;

pub use cache::{CacheError, ForeignRef, ModuleCache, TypedModule};

use crate::error::{ErrorKind, SemaResult, SemanticError};
use crate::generics::Instantiation;
use crate::ir::{Stmt, StmtKind};
use crate::options::CompilerOptions;
use crate::symbols::{
    ExternalSymbol, Module, Program, ScopeId, Symbol, SymbolArena, SymbolId, SymbolKind,
};
use crate::{lower, symtab};

/// Name of the synthesized function holding module-level initializers.
pub const GLOBAL_INIT: &str = "__global_init";
/// Name of the synthesized function holding module-level statements.
pub const GLOBAL_STMTS: &str = "__global_stmts";
/// Name of the synthesized program of the main module.
pub const MAIN_PROGRAM: &str = "__main_program";

/// Parser and file lookup, supplied by the driver.
pub trait ModuleSource {
    /// The parsed module `name`, or `None` if no such module exists.
    fn parse_module(&self, name: &str) -> Option<ast::Module>;
}

impl<S: BuildHasher> ModuleSource for HashMap<String, ast::Module, S> {
    fn parse_module(&self, name: &str) -> Option<ast::Module> {
        self.get(name).cloned()
    }
}

/// A source with no modules besides the main one.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoModules;

impl ModuleSource for NoModules {
    fn parse_module(&self, _name: &str) -> Option<ast::Module> {
        None
    }
}

/// The typed, symbol-resolved result of a successful compilation.
#[derive(Clone, Debug)]
pub struct TranslationUnit {
    pub arena: SymbolArena,
    pub root: ScopeId,
    /// Every analysed module in completion order; the main module is last.
    pub modules: Vec<SymbolId>,
    pub main_module: SymbolId,
    /// Top-level items besides modules, i.e. the synthesized program.
    pub items: Vec<SymbolId>,
}

impl TranslationUnit {
    /// Module symbol by name.
    pub fn module(&self, name: &str) -> Option<SymbolId> {
        self.arena
            .get_local(self.root, name)
            .filter(|id| self.arena.symbol(*id).as_module().is_some())
    }

    /// Scope owned by the main module.
    pub fn main_scope(&self) -> ScopeId {
        self.arena
            .symbol(self.main_module)
            .owned_scope()
            .unwrap_or(self.root)
    }

    /// Look up `name` in the main module.
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.arena.get_local(self.main_scope(), name)
    }
}

/// Outcome of [`Compilation::compile_main`].
#[derive(Debug)]
pub struct CompileResult {
    pub unit: Result<TranslationUnit, ErrorGuaranteed>,
    /// Errors and warnings, sorted by location.
    pub diagnostics: Vec<Diagnostic>,
}

/// State of one translation unit under analysis.
pub struct Compilation<'a> {
    pub(crate) arena: SymbolArena,
    pub(crate) root: ScopeId,
    pub(crate) options: CompilerOptions,
    sources: &'a dyn ModuleSource,
    cache: Option<&'a mut dyn ModuleCache>,
    modules: FxHashMap<String, SymbolId>,
    module_order: Vec<SymbolId>,
    /// Modules whose analysis is in progress, outermost first.
    loading: Vec<String>,
    pub(crate) instantiations: Vec<Instantiation>,
    pub(crate) queue: DiagnosticQueue,
}

impl<'a> Compilation<'a> {
    pub fn new(sources: &'a dyn ModuleSource, options: CompilerOptions) -> Self {
        let mut arena = SymbolArena::new();
        let root = arena.new_scope(None);
        let queue = DiagnosticQueue::with_config(options.diagnostics.clone());
        Compilation {
            arena,
            root,
            options,
            sources,
            cache: None,
            modules: FxHashMap::default(),
            module_order: Vec::new(),
            loading: Vec::new(),
            instantiations: Vec::new(),
            queue,
        }
    }

    #[must_use]
    pub fn with_cache(mut self, cache: &'a mut dyn ModuleCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Analyse `main` and everything it imports.
    #[tracing::instrument(level = "debug", skip_all, fields(module = %self.options.main_module_name))]
    pub fn compile_main(mut self, main: &ast::Module) -> CompileResult {
        let name = self.options.main_module_name.clone();
        let outcome = self.analyze_module(&name, main).and_then(|module| {
            let mut items = Vec::new();
            if !self.options.symtab_only {
                items.push(self.synthesize_program(module)?);
            }
            Ok((module, items))
        });
        let unit = match outcome {
            Ok((main_module, items)) => Ok(TranslationUnit {
                arena: self.arena,
                root: self.root,
                modules: self.module_order,
                main_module,
                items,
            }),
            Err(err) => {
                tracing::debug!(code = %err.code(), "compilation aborted");
                Err(self.queue.emit_error(err.to_diagnostic()))
            }
        };
        CompileResult {
            unit,
            diagnostics: self.queue.flush(),
        }
    }

    /// Report a non-fatal warning.
    pub(crate) fn warn(&mut self, diagnostic: Diagnostic) {
        if self.options.style_suggestions {
            self.queue.add(diagnostic, DiagnosticSeverity::Soft);
        }
    }

    /// The module symbol for `name`, analysing it first if needed.
    pub(crate) fn load_module(&mut self, name: &str, loc: Location) -> SemaResult<SymbolId> {
        if let Some(id) = self.modules.get(name) {
            return Ok(*id);
        }
        if self.loading.iter().any(|m| m == name) {
            return Err(SemanticError::new(
                ErrorKind::invalid(format!(
                    "circular import: {} -> {name}",
                    self.loading.join(" -> ")
                )),
                loc,
            ));
        }
        if let Some(id) = self.load_from_cache(name)? {
            return Ok(id);
        }
        let Some(parsed) = self.sources.parse_module(name) else {
            return Err(SemanticError::new(
                ErrorKind::ModuleNotFound {
                    module: name.to_owned(),
                },
                loc,
            ));
        };
        let id = self.analyze_module(name, &parsed)?;
        self.store_in_cache(name, id);
        Ok(id)
    }

    fn load_from_cache(&mut self, name: &str) -> SemaResult<Option<SymbolId>> {
        let Some(typed) = self.cache.as_mut().and_then(|c| c.load_cached(name)) else {
            return Ok(None);
        };
        tracing::debug!(module = name, "cache hit");
        self.loading.push(name.to_owned());
        let installed = cache::install(self, &typed);
        self.loading.pop();
        let Some(module) = installed? else {
            tracing::debug!(module = name, "stale cache entry, recompiling");
            return Ok(None);
        };
        self.register_module(name, module)?;
        Ok(Some(module))
    }

    fn store_in_cache(&mut self, name: &str, module: SymbolId) {
        if self.cache.is_none() {
            return;
        }
        let typed = TypedModule::export(&self.arena, module);
        if let Some(cache) = self.cache.as_mut() {
            if let Err(err) = cache.store_cached(name, &typed) {
                tracing::warn!(module = name, error = %err, "failed to store compiled module");
            }
        }
    }

    /// Run both passes over one module.
    #[tracing::instrument(level = "debug", skip(self, parsed))]
    fn analyze_module(&mut self, name: &str, parsed: &ast::Module) -> SemaResult<SymbolId> {
        self.loading.push(name.to_owned());
        let scope = self.arena.new_scope(Some(self.root));
        let mut symbol = Symbol::new(
            name,
            parsed.loc,
            SymbolKind::Module(Module {
                scope,
                dependencies: Vec::new(),
                module_aliases: std::collections::BTreeMap::new(),
                loaded_from_cache: false,
            }),
        );
        symbol.parent = self.root;
        let module = self.arena.alloc(symbol);
        self.arena.set_scope_owner(scope, module);

        let skeleton = symtab::build_module(self, module, parsed)?;
        if !self.options.symtab_only {
            lower::lower_module(self, module, parsed, &skeleton)?;
        }
        self.loading.pop();
        self.register_module(name, module)?;
        tracing::debug!(module = name, symbols = self.arena.symbol_count(), "module analysed");
        Ok(module)
    }

    fn register_module(&mut self, name: &str, module: SymbolId) -> SemaResult<()> {
        self.arena.bind(self.root, name, module)?;
        self.modules.insert(name.to_owned(), module);
        self.module_order.push(module);
        Ok(())
    }

    pub(crate) fn module_by_name(&self, name: &str) -> Option<SymbolId> {
        self.modules.get(name).copied()
    }

    /// Build `__main_program`, which runs the module-level code of every
    /// direct dependency and then of the main module.
    fn synthesize_program(&mut self, main: SymbolId) -> SemaResult<SymbolId> {
        let scope = self.arena.new_scope(Some(self.root));
        let program = self.arena.add(
            self.root,
            Symbol::new(
                MAIN_PROGRAM,
                Location::DUMMY,
                SymbolKind::Program(Program {
                    scope,
                    dependencies: Vec::new(),
                    body: Vec::new(),
                }),
            ),
        )?;
        self.arena.set_scope_owner(scope, program);

        let mut order: Vec<SymbolId> = self
            .arena
            .symbol(main)
            .as_module()
            .map(|m| m.dependencies.clone())
            .unwrap_or_default()
            .iter()
            .filter_map(|dep| self.module_by_name(dep))
            .collect();
        order.push(main);

        let mut body = Vec::new();
        for module in order {
            let module_name = self.arena.symbol_name(module).to_owned();
            let Some(module_scope) = self.arena.symbol(module).owned_scope() else {
                continue;
            };
            for entry in [GLOBAL_INIT, GLOBAL_STMTS] {
                let Some(target) = self.arena.get_local(module_scope, entry) else {
                    continue;
                };
                let local = self.arena.add(
                    scope,
                    Symbol::new(
                        format!("{entry}_{module_name}"),
                        Location::DUMMY,
                        SymbolKind::External(ExternalSymbol {
                            target,
                            module_name: module_name.clone(),
                            original_name: entry.to_owned(),
                        }),
                    ),
                )?;
                self.arena.add_unit_dependency(scope, &module_name);
                body.push(Stmt::new(
                    StmtKind::SubroutineCall {
                        callee: local,
                        original: None,
                        args: Vec::new(),
                    },
                    Location::DUMMY,
                ));
            }
        }
        if let SymbolKind::Program(p) = &mut self.arena.symbol_mut(program).kind {
            p.body = body;
        }
        Ok(program)
    }
}

/// Compile `main` with no importable modules and default options.
pub fn compile_standalone(main: &ast::Module) -> CompileResult {
    Compilation::new(&NoModules, CompilerOptions::default()).compile_main(main)
}
