//! Lowering of effect handlers written as pattern matches.
//!
//! ```text
//! match f x with                              Effect.Deep.match_with f x
//! | v -> v                          ==>         { retc; exnc; effc }
//! | [%effect? Get, k] -> continue k 0
//! ```
//!
//! ## Pipeline Position
//!
//! ```text
//! parse → expand (this crate) → print
//! ```
//!
//! Leaves first: [`classify`] sorts cases, [`partition`] reshapes them per
//! callback, [`purity`] and [`delay`] put the scrutinee under an
//! application, [`handler`] emits the runtime call, [`effect_decl`]
//! rewrites effect declarations and [`expand`] walks the program.

pub mod classify;
pub mod delay;
pub mod effect_decl;
pub mod error;
pub mod expand;
pub mod handler;
pub mod partition;
pub mod purity;
pub mod runtime;

pub use classify::{CaseKind, classify, contains_effect_case};
pub use delay::{Delayed, delay};
pub use error::{ExpandError, ExpandErrorKind, ExpandResult};
pub use expand::EffectExpander;
pub use partition::{Partition, partition};
pub use purity::is_pure;
pub use runtime::{ExpandConfig, RuntimeApi};

use effmatch_syntax::Structure;

/// Expand all effect syntax in a compilation unit.
///
/// This is the main entry point of the crate.
pub fn expand_effects(items: Structure, config: &ExpandConfig) -> ExpandResult<Structure> {
    EffectExpander::new(config).expand_structure(items)
}
