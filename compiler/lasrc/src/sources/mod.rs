//! In-memory module sources.

use std::collections::BTreeMap;

use lasr_ir::ast;
use lasr_sema::ModuleSource;

/// Parsed modules registered by name, ahead of compilation.
///
/// Dotted names address nested packages as a whole, so `pkg.util` is
/// looked up as exactly that string.
#[derive(Clone, Debug, Default)]
pub struct MemorySources {
    modules: BTreeMap<String, ast::Module>,
}

impl MemorySources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `module` as `name`, returning the module it replaced.
    pub fn insert(&mut self, name: impl Into<String>, module: ast::Module) -> Option<ast::Module> {
        self.modules.insert(name.into(), module)
    }

    #[must_use]
    pub fn with_module(mut self, name: impl Into<String>, module: ast::Module) -> Self {
        self.insert(name, module);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ModuleSource for MemorySources {
    fn parse_module(&self, name: &str) -> Option<ast::Module> {
        let module = self.modules.get(name).cloned();
        if module.is_none() {
            tracing::trace!(module = name, "no registered source");
        }
        module
    }
}

impl<N: Into<String>> FromIterator<(N, ast::Module)> for MemorySources {
    fn from_iter<I: IntoIterator<Item = (N, ast::Module)>>(iter: I) -> Self {
        MemorySources {
            modules: iter.into_iter().map(|(name, module)| (name.into(), module)).collect(),
        }
    }
}

#[cfg(test)]
mod tests;
