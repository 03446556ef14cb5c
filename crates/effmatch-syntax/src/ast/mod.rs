//! Syntax tree for the effmatch source language.
//!
//! The tree mirrors an ML-family parse tree: expressions, patterns, core
//! types and structure items, each an immutable value carrying its own
//! [`Location`]. Rewrites never mutate a node in place; they consume a tree
//! and build a new one, reusing untouched subtrees by move.
//!
//! ## Node kinds as data
//!
//! Every syntactic form is a variant of an explicit `*Kind` enum so that
//! classifiers (is this case an effect case? can this expression perform an
//! effect?) are total `match`es over the node kinds, and the compiler
//! points out every classifier when a new form is added.
//!
//! ## Provenance
//!
//! Nodes built by a rewrite carry a ghost [`Location`] copied from the
//! user-written node they replace, see [`crate::builder::Builder`].
//!
//! [`Location`]: effmatch_core::Location

mod expr;
mod path;
mod pattern;
mod structure;
mod types;

pub use expr::*;
pub use path::*;
pub use pattern::*;
pub use structure::*;
pub use types::*;
