//! Compilation sessions.
//!
//! A [`Session`] owns what outlives one compilation: the options, the
//! module source and the optional on-disk cache. Each call to
//! [`Session::compile`] analyses one main module and everything it imports.

use std::fmt::Write as _;
use std::path::Path;

use lasr_diagnostic::Diagnostic;
use lasr_ir::ast;
use lasr_sema::{
    CacheError, Compilation, CompileResult, CompilerOptions, ModuleSource, TranslationUnit,
};

use crate::cache::FileModuleCache;

/// Failure of [`Session::check`].
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("analysis failed with {} error(s)", count_errors(.diagnostics))]
    Failed { diagnostics: Vec<Diagnostic> },
    #[error(transparent)]
    Cache(#[from] CacheError),
}

fn count_errors(diagnostics: &[Diagnostic]) -> usize {
    diagnostics.iter().filter(|d| d.is_error()).count()
}

pub struct Session<'a> {
    sources: &'a dyn ModuleSource,
    options: CompilerOptions,
    cache: Option<FileModuleCache>,
}

impl<'a> Session<'a> {
    pub fn new(sources: &'a dyn ModuleSource, options: CompilerOptions) -> Self {
        Session {
            sources,
            options,
            cache: None,
        }
    }

    /// Reuse compiled modules stored under `dir`, and store new ones there.
    pub fn with_cache_dir(mut self, dir: &Path) -> Result<Self, SessionError> {
        self.cache = Some(FileModuleCache::new(dir)?);
        Ok(self)
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn cache(&self) -> Option<&FileModuleCache> {
        self.cache.as_ref()
    }

    /// Analyse `main`, returning the unit or the errors alongside every
    /// warning.
    #[tracing::instrument(level = "info", skip_all, fields(module = %self.options.main_module_name))]
    pub fn compile(&mut self, main: &ast::Module) -> CompileResult {
        let compilation = Compilation::new(self.sources, self.options.clone());
        let result = match self.cache.as_mut() {
            Some(cache) => compilation.with_cache(cache).compile_main(main),
            None => compilation.compile_main(main),
        };
        tracing::info!(
            ok = result.unit.is_ok(),
            diagnostics = result.diagnostics.len(),
            "analysis finished"
        );
        result
    }

    /// Like [`Session::compile`], but warnings are dropped on success.
    pub fn check(&mut self, main: &ast::Module) -> Result<TranslationUnit, SessionError> {
        let result = self.compile(main);
        match result.unit {
            Ok(unit) => Ok(unit),
            Err(_) => Err(SessionError::Failed {
                diagnostics: result.diagnostics,
            }),
        }
    }
}

/// Render diagnostics one after another, separated by blank lines.
pub fn render_diagnostics(diagnostics: &[Diagnostic]) -> String {
    let mut out = String::new();
    for (i, diagnostic) in diagnostics.iter().enumerate() {
        if i > 0 {
            out.push_str("\n\n");
        }
        let _ = write!(out, "{diagnostic}");
    }
    out
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
