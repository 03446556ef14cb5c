//! Expansion pipeline.
//!
//! Each stage is a Salsa tracked function, so re-expanding an unchanged
//! file is a cache hit.
//!
//! ## Pipeline Stages
//!
//! ```text
//! SourceFile
//!     │
//!     ▼
//! parse_source ─► Structure (surface syntax, `[%effect]` markers intact)
//!     │
//!     ▼
//! expand_source ─► Structure (handlers lowered onto the runtime API)
//! ```
//!
//! ## Diagnostics
//!
//! Parse and expansion errors are reported as `Diagnostic`s through Salsa
//! accumulators. A failing stage yields `None`; nothing is emitted for a
//! compilation unit that has an error.

use std::path::{Path, PathBuf};

use effmatch_core::{CompilationPhase, Diagnostic, DiagnosticSeverity, Span};
use effmatch_passes::{ExpandConfig, RuntimeApi};
use effmatch_syntax::{Structure, parse_structure};
use salsa::Accumulator;
use tracing::debug;

use crate::registry::TransformRegistry;

/// Module that provides `Deep.match_with` and friends when none is given.
pub const DEFAULT_RUNTIME_MODULE: &str = "Effect";

/// One compilation unit and the runtime module its handlers target.
#[salsa::input(debug)]
pub struct SourceFile {
    #[returns(ref)]
    pub path: PathBuf,
    #[returns(deref)]
    pub text: String,
    #[returns(deref)]
    pub runtime_module: String,
}

impl SourceFile {
    /// Create a source file targeting the default runtime module.
    pub fn from_path(db: &dyn salsa::Database, path: impl AsRef<Path>, text: String) -> Self {
        Self::new(
            db,
            path.as_ref().to_path_buf(),
            text,
            DEFAULT_RUNTIME_MODULE.to_owned(),
        )
    }

    pub fn expand_config(self, db: &dyn salsa::Database) -> ExpandConfig {
        ExpandConfig::with_runtime(RuntimeApi::from_module_name(self.runtime_module(db)))
    }
}

/// Result of running the pipeline on one file.
#[derive(Clone, Debug)]
pub struct ExpansionResult {
    /// The expanded program, absent when any stage failed.
    pub structure: Option<Structure>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ExpansionResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == DiagnosticSeverity::Error)
    }
}

fn report(db: &dyn salsa::Database, message: String, span: Span, phase: CompilationPhase) {
    Diagnostic {
        message,
        span,
        severity: DiagnosticSeverity::Error,
        phase,
    }
    .accumulate(db);
}

/// Stage 1: parse the file into a structure.
#[salsa::tracked(returns(ref))]
pub fn parse_source(db: &dyn salsa::Database, file: SourceFile) -> Option<Structure> {
    match parse_structure(file.text(db)) {
        Ok(items) => {
            debug!(path = %file.path(db).display(), items = items.len(), "parsed");
            Some(items)
        }
        Err(err) => {
            report(db, err.to_string(), err.span, CompilationPhase::Parsing);
            None
        }
    }
}

/// Stage 2: run the registered transforms over the parsed structure.
#[salsa::tracked(returns(ref))]
pub fn expand_source(db: &dyn salsa::Database, file: SourceFile) -> Option<Structure> {
    let items = parse_source(db, file).clone()?;
    let registry = TransformRegistry::with_effects(file.expand_config(db));
    match registry.run_all(items) {
        Ok(items) => Some(items),
        Err(err) => {
            report(
                db,
                err.to_string(),
                err.location.span,
                CompilationPhase::Expansion,
            );
            None
        }
    }
}

/// Run the pipeline and collect everything it reported.
pub fn expand_with_diagnostics(db: &dyn salsa::Database, file: SourceFile) -> ExpansionResult {
    let structure = expand_source(db, file).clone();
    let diagnostics = expand_source::accumulated::<Diagnostic>(db, file)
        .into_iter()
        .cloned()
        .collect();
    ExpansionResult {
        structure,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EffmatchDatabaseImpl;
    use effmatch_syntax::print_structure;
    use salsa::Database as _;

    fn source(db: &dyn salsa::Database, text: &str) -> SourceFile {
        SourceFile::from_path(db, "test.ml", text.to_owned())
    }

    #[test]
    fn test_expand_clean_file() {
        EffmatchDatabaseImpl::default().attach(|db| {
            let file = source(db, "let x = match f y with v -> v | [%effect? Get, k] -> continue k 1");
            let result = expand_with_diagnostics(db, file);
            assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
            let out = print_structure(&result.structure.expect("expanded"));
            assert!(out.contains("Effect.Deep.match_with f y"), "{out}");
        });
    }

    #[test]
    fn test_parse_error_is_reported() {
        EffmatchDatabaseImpl::default().attach(|db| {
            let file = source(db, "let x = (1");
            let result = expand_with_diagnostics(db, file);
            assert!(result.structure.is_none());
            assert!(result.has_errors());
            assert_eq!(result.diagnostics.len(), 1);
            assert_eq!(result.diagnostics[0].phase, CompilationPhase::Parsing);
        });
    }

    #[test]
    fn test_expansion_error_is_reported() {
        EffmatchDatabaseImpl::default().attach(|db| {
            let text = "let x = [%effect 2]";
            let file = source(db, text);
            let result = expand_with_diagnostics(db, file);
            assert!(result.structure.is_none());
            let diag = &result.diagnostics[0];
            assert_eq!(diag.phase, CompilationPhase::Expansion);
            assert_eq!(diag.severity, DiagnosticSeverity::Error);
            assert_eq!(&text[diag.span.start..diag.span.end], "[%effect 2]");
            assert!(diag.message.contains("exception declaration"));
        });
    }

    #[test]
    fn test_runtime_module_is_configurable() {
        EffmatchDatabaseImpl::default().attach(|db| {
            let file = SourceFile::new(
                db,
                PathBuf::from("test.ml"),
                "exception%effect Tick".to_owned(),
                "Fx".to_owned(),
            );
            let items = expand_source(db, file).clone().expect("expanded");
            assert_eq!(print_structure(&items), "type _ Fx.t +=\n  | Tick : unit Fx.t");
        });
    }
}
