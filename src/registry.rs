//! Whole-program transforms selectable by name.
//!
//! The driver owns a [`TransformRegistry`] and registers every transform it
//! wants to offer once, before any input is processed. Each transform also
//! reserves the extension namespaces it interprets, so two transforms never
//! claim the same `[%name ...]` nodes.

use derive_more::Display;
use effmatch_passes::{ExpandConfig, ExpandResult, expand_effects};
use effmatch_syntax::Structure;
use tracing::{debug, trace};

/// A whole-program rewrite over one compilation unit.
pub trait Transform: Send + Sync {
    /// Name used to select the transform.
    fn name(&self) -> &'static str;

    /// Extension namespaces owned by this transform.
    fn reserved_namespaces(&self) -> &[&'static str];

    fn apply(&self, items: Structure) -> ExpandResult<Structure>;
}

/// Lowers effect handlers and effect declarations.
#[derive(Clone, Debug, Default)]
pub struct EffectsTransform {
    config: ExpandConfig,
}

impl EffectsTransform {
    pub const NAME: &'static str = "effects";

    pub fn new(config: ExpandConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExpandConfig {
        &self.config
    }
}

impl Transform for EffectsTransform {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn reserved_namespaces(&self) -> &[&'static str] {
        &["effect"]
    }

    fn apply(&self, items: Structure) -> ExpandResult<Structure> {
        expand_effects(items, &self.config)
    }
}

/// Configuration mistakes made while registering transforms.
#[derive(Clone, Debug, Display, PartialEq, Eq)]
pub enum RegistryError {
    #[display("a transform named `{name}` is already registered")]
    DuplicateName { name: &'static str },
    #[display("extension namespace `{namespace}` is already reserved by `{owner}`")]
    NamespaceTaken {
        namespace: &'static str,
        owner: &'static str,
    },
}

impl std::error::Error for RegistryError {}

/// Registered transforms, applied in registration order.
#[derive(Default)]
pub struct TransformRegistry {
    transforms: Vec<Box<dyn Transform>>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding only the effects transform.
    pub fn with_effects(config: ExpandConfig) -> Self {
        Self {
            transforms: vec![Box::new(EffectsTransform::new(config))],
        }
    }

    pub fn register(&mut self, transform: Box<dyn Transform>) -> Result<(), RegistryError> {
        let name = transform.name();
        if self.get(name).is_some() {
            return Err(RegistryError::DuplicateName { name });
        }
        for &namespace in transform.reserved_namespaces() {
            if let Some(owner) = self.owner_of(namespace) {
                return Err(RegistryError::NamespaceTaken {
                    namespace,
                    owner: owner.name(),
                });
            }
        }
        debug!(name, namespaces = ?transform.reserved_namespaces(), "registered transform");
        self.transforms.push(transform);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Transform> {
        self.transforms
            .iter()
            .find(|t| t.name() == name)
            .map(|t| &**t)
    }

    /// The transform that reserved `namespace`, if any.
    pub fn owner_of(&self, namespace: &str) -> Option<&dyn Transform> {
        self.transforms
            .iter()
            .find(|t| t.reserved_namespaces().contains(&namespace))
            .map(|t| &**t)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.transforms.iter().map(|t| t.name())
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Apply every transform in order, stopping at the first error.
    pub fn run_all(&self, items: Structure) -> ExpandResult<Structure> {
        self.transforms.iter().try_fold(items, |items, transform| {
            trace!(name = transform.name(), "running transform");
            transform.apply(items)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use effmatch_syntax::parse_structure;

    struct Noop {
        name: &'static str,
        namespaces: &'static [&'static str],
    }

    impl Transform for Noop {
        fn name(&self) -> &'static str {
            self.name
        }

        fn reserved_namespaces(&self) -> &[&'static str] {
            self.namespaces
        }

        fn apply(&self, items: Structure) -> ExpandResult<Structure> {
            Ok(items)
        }
    }

    #[test]
    fn test_effects_transform_is_registered_by_name() {
        let registry = TransformRegistry::with_effects(ExpandConfig::default());
        let transform = registry.get("effects").expect("registered");
        assert_eq!(transform.reserved_namespaces(), &["effect"]);
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.owner_of("effect").map(|t| t.name()), Some("effects"));
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let mut registry = TransformRegistry::with_effects(ExpandConfig::default());
        let err = registry
            .register(Box::new(EffectsTransform::default()))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateName { name: "effects" });
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reserved_namespace_is_rejected() {
        let mut registry = TransformRegistry::with_effects(ExpandConfig::default());
        let err = registry
            .register(Box::new(Noop {
                name: "other",
                namespaces: &["log", "effect"],
            }))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "extension namespace `effect` is already reserved by `effects`"
        );
    }

    #[test]
    fn test_run_all_in_registration_order() {
        let mut registry = TransformRegistry::new();
        registry
            .register(Box::new(Noop {
                name: "first",
                namespaces: &[],
            }))
            .unwrap();
        registry
            .register(Box::new(EffectsTransform::default()))
            .unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), ["first", "effects"]);

        let items = parse_structure("exception%effect Get : int").unwrap();
        let out = registry.run_all(items).unwrap();
        assert_eq!(
            effmatch_syntax::print_structure(&out),
            "type _ Effect.t +=\n  | Get : int Effect.t"
        );
    }

    #[test]
    fn test_empty_registry_is_identity() {
        let registry = TransformRegistry::new();
        assert!(registry.is_empty());
        let items = parse_structure("let x = 1").unwrap();
        assert_eq!(registry.run_all(items.clone()).unwrap(), items);
    }
}
