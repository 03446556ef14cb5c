//! Shared primitives for the effmatch workspace: interned names, source
//! locations and the diagnostics accumulator.
pub mod diagnostic;
pub mod location;
pub mod symbol;

pub use diagnostic::{CompilationPhase, Diagnostic, DiagnosticSeverity};
pub use location::{Location, Span, Spanned};
pub use symbol::Symbol;
