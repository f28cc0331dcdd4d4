//! Semantic analysis for the typed Python dialect.
//!
//! Turns an untyped [`lasr_ir::ast::Module`] into a typed, symbol-resolved
//! [`TranslationUnit`]: every name bound to a symbol, every expression
//! carrying its type and, when known, its compile-time value.
//!
//! # Passes
//!
//! - **Pass 1** (`symtab`): creates every scope and declaration, resolves
//!   annotations and imports. Statement bodies are deferred.
//! - **Pass 2** (`lower`): lowers bodies and module-level statements,
//!   inserting casts, folding constants and instantiating generic
//!   functions on demand.
//!
//! Imports of unloaded modules run both passes on the imported module
//! synchronously. The first [`SemanticError`] aborts the translation unit.
//!
//! ```text
//! let result = compile_standalone(&module);
//! let unit = result.unit?;          // Err(ErrorGuaranteed) on failure
//! let f = unit.lookup("f");
//! ```

pub mod annotation;
pub mod cast;
pub mod compile;
pub mod consteval;
mod error;
pub mod fold;
mod generics;
mod imports;
pub mod intrinsics;
pub mod ir;
mod lower;
pub mod options;
mod stack;
pub mod symbols;
mod symtab;
pub mod types;

pub use compile::{
    compile_standalone, CacheError, Compilation, CompileResult, ForeignRef, ModuleCache,
    ModuleSource, NoModules, TranslationUnit, TypedModule,
};
pub use error::{ErrorKind, SemaResult, SemanticError};
pub use options::CompilerOptions;
pub use symbols::{ScopeId, SymbolArena, SymbolId};
pub use types::Ty;
