//! Input representation for the lasr semantic analyser.
//!
//! The parser is an external collaborator: it hands the analyser an immutable
//! [`ast::Module`] in which every node carries a [`Location`]. This crate owns
//! those two vocabularies and nothing else, so the analyser and any front end
//! can agree on them without depending on each other.
//!
//! # Design
//!
//! - The tree is plain owned data (`Box`/`Vec`), produced once and never
//!   mutated by the analyser.
//! - [`ast::build`] offers terse constructors for synthesized trees; the
//!   analyser's tests and embedders without a parser use it.

pub mod ast;
mod location;

pub use location::Location;
