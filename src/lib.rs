//! Lowering of effect-pattern `match`/`try` onto a deep-handler runtime.
//!
//! The transformation itself lives in `effmatch-passes`; this crate wires it
//! into an incremental pipeline and a command-line driver.

pub mod database;
pub mod diagnostics;
pub mod pipeline;
pub mod registry;

pub use database::EffmatchDatabaseImpl;
pub use pipeline::{
    DEFAULT_RUNTIME_MODULE, ExpansionResult, SourceFile, expand_source, expand_with_diagnostics,
    parse_source,
};
pub use registry::{EffectsTransform, RegistryError, Transform, TransformRegistry};
