//! Pass 2: bodies and module-level code.
//!
//! Lowers every function body the skeleton lists, generic definitions
//! first so that instantiations triggered by later bodies copy finished
//! code. Module-level statements are gathered into two synthesized
//! subroutines:
//!
//! ```text
//! x: i32 = f()      ──► __global_init   (non-constant initializers)
//! print(x)          ──► __global_stmts  (everything executable)
//! ```
//!
//! Either is omitted when it would be empty.

mod call;
pub(crate) mod expr;
mod stmt;

use lasr_ir::ast::{self, ExprKind as AstKind, StmtKind as AstStmt};
use lasr_ir::Location;

use crate::compile::{Compilation, GLOBAL_INIT, GLOBAL_STMTS};
use crate::error::SemaResult;
use crate::symbols::{Function, ScopeId, Symbol, SymbolId, SymbolKind};
use crate::symtab::{type_var_declaration, Skeleton};

/// Lower the bodies `skeleton` lists and the module-level statements of
/// `parsed`.
#[tracing::instrument(level = "debug", skip_all, fields(module = %cx.arena.symbol_name(module)))]
pub(crate) fn lower_module(
    cx: &mut Compilation<'_>,
    module: SymbolId,
    parsed: &ast::Module,
    skeleton: &Skeleton<'_>,
) -> SemaResult<()> {
    let Some(module_scope) = cx.arena.symbol(module).owned_scope() else {
        return Ok(());
    };
    let mut lowerer = Lowerer { cx };
    let (generic, concrete): (Vec<_>, Vec<_>) = skeleton.functions.iter().partition(|(id, _)| {
        lowerer
            .cx
            .arena
            .function(*id)
            .is_some_and(Function::is_generic)
    });
    for (id, def) in generic.into_iter().chain(concrete) {
        lowerer.lower_function(id, def)?;
    }
    lowerer.lower_module_code(module_scope, parsed)
}

/// Where the statements being lowered live.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Frame {
    /// Innermost scope; names resolve from here.
    pub(crate) scope: ScopeId,
    /// The function (or synthesized subroutine) whose body this is.
    pub(crate) function: SymbolId,
    pub(crate) return_var: Option<SymbolId>,
    /// Lowering the body of a generic function.
    pub(crate) generic: bool,
}

impl Frame {
    fn nested(self, scope: ScopeId) -> Frame {
        Frame { scope, ..self }
    }
}

pub(crate) struct Lowerer<'cx, 'src> {
    pub(crate) cx: &'cx mut Compilation<'src>,
}

impl Lowerer<'_, '_> {
    fn lower_function(&mut self, id: SymbolId, def: &ast::FunctionDef) -> SemaResult<()> {
        let Some(function) = self.cx.arena.function(id) else {
            return Ok(());
        };
        let frame = Frame {
            scope: function.scope,
            function: id,
            return_var: function.return_var,
            generic: function.is_generic(),
        };
        tracing::trace!(name = %def.name, "lowering body");
        let body = self.lower_block(frame, &def.body)?;
        if let Some(function) = self.cx.arena.function_mut(id) {
            function.body = body;
        }
        Ok(())
    }

    fn lower_module_code(&mut self, module_scope: ScopeId, parsed: &ast::Module) -> SemaResult<()> {
        let mut init = Vec::new();
        let mut executable = Vec::new();
        for stmt in &parsed.body {
            match &stmt.kind {
                AstStmt::FunctionDef(_)
                | AstStmt::ClassDef(_)
                | AstStmt::Import(_)
                | AstStmt::ImportFrom { .. }
                | AstStmt::Pass => {}
                AstStmt::AnnAssign { target, value, .. } => {
                    if value.is_some() && self.needs_runtime_init(module_scope, target) {
                        init.push(stmt);
                    }
                }
                AstStmt::Assign { targets, value }
                    if type_var_declaration(targets, value)?.is_some() => {}
                AstStmt::Expr(e) if matches!(e.kind, AstKind::Str(_)) => {}
                _ => executable.push(stmt),
            }
        }
        for (name, stmts) in [(GLOBAL_INIT, init), (GLOBAL_STMTS, executable)] {
            if stmts.is_empty() {
                continue;
            }
            let (id, frame) = self.synthesize_subroutine(module_scope, name)?;
            let mut body = Vec::new();
            for stmt in stmts {
                self.lower_stmt(frame, stmt, &mut body)?;
            }
            if let Some(function) = self.cx.arena.function_mut(id) {
                function.body = body;
            }
        }
        Ok(())
    }

    /// A module-level declaration whose value pass 1 could not store as a
    /// static initializer.
    fn needs_runtime_init(&self, module_scope: ScopeId, target: &ast::Expr) -> bool {
        let Some(id) = target
            .as_name()
            .and_then(|name| self.cx.arena.get_local(module_scope, name))
        else {
            return false;
        };
        self.cx
            .arena
            .symbol(id)
            .as_variable()
            .is_some_and(|v| v.initializer.is_none() && !v.ty.is_const())
    }

    fn synthesize_subroutine(
        &mut self,
        module_scope: ScopeId,
        name: &str,
    ) -> SemaResult<(SymbolId, Frame)> {
        let scope = self.cx.arena.new_scope(Some(module_scope));
        let id = self.cx.arena.add(
            module_scope,
            Symbol::new(name, Location::DUMMY, SymbolKind::Function(Function::new(scope))),
        )?;
        self.cx.arena.set_scope_owner(scope, id);
        let frame = Frame {
            scope,
            function: id,
            return_var: None,
            generic: false,
        };
        Ok((id, frame))
    }
}
