//! Compilation options.

use lasr_diagnostic::DiagnosticConfig;

/// Switches that change what the analyser accepts or emits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Insert casts for assignments and arguments in any listed direction.
    ///
    /// When off, only binary operands are widened; assigning an integer to
    /// a real target is an error.
    pub implicit_casting: bool,
    /// Emit soft style warnings such as the `pow` hint.
    pub style_suggestions: bool,
    /// Stop after pass 1: symbol tables only, no bodies.
    pub symtab_only: bool,
    /// Name given to the root module of a compilation.
    pub main_module_name: String,
    pub diagnostics: DiagnosticConfig,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            implicit_casting: false,
            style_suggestions: true,
            symtab_only: false,
            main_module_name: "__main__".to_owned(),
            diagnostics: DiagnosticConfig::default(),
        }
    }
}

impl CompilerOptions {
    #[must_use]
    pub fn with_implicit_casting(mut self, enabled: bool) -> Self {
        self.implicit_casting = enabled;
        self
    }

    #[must_use]
    pub fn with_symtab_only(mut self, enabled: bool) -> Self {
        self.symtab_only = enabled;
        self
    }
}
