//! `exception%effect` declarations.
//!
//! ```text
//! exception%effect Get : int           ==>  type _ Effect.t += Get : int Effect.t
//! exception%effect Put : int -> unit   ==>  type _ Effect.t += Put : int -> unit Effect.t
//! exception%effect Log of string       ==>  type _ Effect.t += Log : string -> unit Effect.t
//! ```

use effmatch_core::{Location, Symbol};
use effmatch_syntax::{
    Builder, ExtensionConstructor, ExtensionConstructorKind, Path, StructureItem,
    StructureItemKind, TypeExtension,
};
use tracing::debug;

use crate::error::{ExpandError, ExpandResult};
use crate::runtime::RuntimeApi;

/// Turn the exception constructor of an effect declaration into a
/// constructor of the runtime's operation type. A missing result type
/// means the operation returns `unit`.
pub fn rewrite_effect_declaration(
    item_loc: Location,
    ctor: ExtensionConstructor,
    runtime: &RuntimeApi,
) -> ExpandResult<StructureItem> {
    let ExtensionConstructor { loc, name, kind } = ctor;
    let (args, result) = match kind {
        ExtensionConstructorKind::Decl { args, result } => (args, result),
        ExtensionConstructorKind::Rebind(_) => {
            return Err(ExpandError::unsupported_rebind(name, loc));
        }
    };
    debug!(%name, "declaring effect operation");

    let b = Builder::new(item_loc.to_ghost());
    let result = result.unwrap_or_else(|| b.tconstr(Path::ident(Symbol::new("unit")), Vec::new()));
    let operation = ExtensionConstructor {
        loc,
        name,
        kind: ExtensionConstructorKind::Decl {
            args,
            result: Some(b.tconstr(runtime.operation_type(), vec![result])),
        },
    };
    Ok(b.item(StructureItemKind::TypeExtension(TypeExtension {
        loc: b.loc,
        path: runtime.operation_type(),
        params: vec![b.tany()],
        constructors: vec![operation],
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExpandErrorKind;
    use effmatch_syntax::parse_structure;

    fn rewrite(source: &str) -> ExpandResult<StructureItem> {
        let mut items = parse_structure(source).unwrap();
        let item = items.remove(0);
        let StructureItemKind::Exception(ctor) = item.kind else {
            panic!("expected an exception declaration");
        };
        rewrite_effect_declaration(item.loc, ctor, &RuntimeApi::default())
    }

    #[test]
    fn test_operation_with_result() {
        let item = rewrite("exception Put : int -> unit").unwrap();
        assert_eq!(item.to_string(), "type _ Effect.t +=\n  | Put : int -> unit Effect.t");
        assert!(item.loc.ghost);
    }

    #[test]
    fn test_missing_result_is_unit() {
        let item = rewrite("exception Log of string").unwrap();
        assert_eq!(item.to_string(), "type _ Effect.t +=\n  | Log : string -> unit Effect.t");
        let item = rewrite("exception Tick").unwrap();
        assert_eq!(item.to_string(), "type _ Effect.t +=\n  | Tick : unit Effect.t");
    }

    #[test]
    fn test_constant_operation() {
        let item = rewrite("exception Get : int").unwrap();
        assert_eq!(item.to_string(), "type _ Effect.t +=\n  | Get : int Effect.t");
    }

    #[test]
    fn test_rebind_is_rejected() {
        let err = rewrite("exception Foo = Bar.Foo").unwrap_err();
        assert_eq!(
            err.kind(),
            &ExpandErrorKind::UnsupportedRebind {
                name: Symbol::new("Foo")
            }
        );
        assert!(err.to_string().contains("`Foo`"));
    }
}
