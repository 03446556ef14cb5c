//! Names of the effect runtime the expansion targets, plus the reserved
//! binder names it introduces.

use effmatch_core::{Symbol, symbols};
use effmatch_syntax::Path;

symbols! {
    /// Extension name marking effect patterns and declarations.
    EFFECT_MARKER => "effect",
    /// Polymorphic tag passed to scrutinee thunks.
    SENTINEL_TAG => "Effmatch_unit",
    EFFECT_BINDER => "__effmatch_effect",
    EXN_BINDER => "__effmatch_exn",
    VALUE_BINDER => "__effmatch_value",
    /// Locally abstract type naming the result of the handled operation.
    RESULT_TYPE => "effmatch_result",
}

/// Paths into the deep-handler runtime module.
///
/// Everything is rooted at one module (`Effect` by default):
/// `Effect.Deep.match_with`, `Effect.Deep.try_with`,
/// `Effect.Deep.continuation` and the operation type `Effect.t`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeApi {
    module: Path,
}

impl Default for RuntimeApi {
    fn default() -> Self {
        Self::new(Path::ident(Symbol::new("Effect")))
    }
}

impl RuntimeApi {
    pub fn new(module: Path) -> Self {
        Self { module }
    }

    /// Parse a dotted module name such as `Stdlib.Effect`.
    pub fn from_module_name(name: &str) -> Self {
        Self::new(Path::dotted(name))
    }

    pub fn module(&self) -> &Path {
        &self.module
    }

    fn deep(&self) -> Path {
        self.module.child(Symbol::new("Deep"))
    }

    pub fn match_with(&self) -> Path {
        self.deep().child(Symbol::new("match_with"))
    }

    pub fn try_with(&self) -> Path {
        self.deep().child(Symbol::new("try_with"))
    }

    pub fn continuation(&self) -> Path {
        self.deep().child(Symbol::new("continuation"))
    }

    /// A field of the `Deep` handler records (`retc`, `exnc`, `effc`).
    pub fn handler_field(&self, name: &'static str) -> Path {
        self.deep().child(Symbol::new(name))
    }

    /// The extensible operation type, `Effect.t`.
    pub fn operation_type(&self) -> Path {
        self.module.child(Symbol::new("t"))
    }
}

/// Options for one expansion run.
#[derive(Clone, Debug, Default)]
pub struct ExpandConfig {
    pub runtime: RuntimeApi,
}

impl ExpandConfig {
    pub fn with_runtime(runtime: RuntimeApi) -> Self {
        Self { runtime }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let api = RuntimeApi::default();
        assert_eq!(api.match_with().to_string(), "Effect.Deep.match_with");
        assert_eq!(api.try_with().to_string(), "Effect.Deep.try_with");
        assert_eq!(api.continuation().to_string(), "Effect.Deep.continuation");
        assert_eq!(api.operation_type().to_string(), "Effect.t");
    }

    #[test]
    fn test_custom_module() {
        let api = RuntimeApi::from_module_name("Stdlib.Effect");
        assert_eq!(api.handler_field("effc").to_string(), "Stdlib.Effect.Deep.effc");
    }
}
