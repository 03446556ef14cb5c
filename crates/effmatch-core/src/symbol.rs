//! Interned identifiers.
//!
//! Every name that appears in a syntax tree (value names, constructor
//! names, module path segments, extension names) is stored as a [`Symbol`],
//! a 4-byte key into a process-wide string interner. Comparing two symbols
//! is a key comparison; the text is only looked up for printing.

use std::borrow::Cow;
use std::sync::LazyLock;

use lasso::{Rodeo, Spur};
use parking_lot::RwLock;

static INTERNER: LazyLock<RwLock<Rodeo>> = LazyLock::new(|| RwLock::new(Rodeo::default()));

/// An interned name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, salsa::Update)]
pub struct Symbol(Spur);

impl Symbol {
    /// Intern a static string. Prefer this over [`Symbol::from_dynamic`]
    /// when the text is known at compile time.
    pub fn new(text: &'static str) -> Self {
        Self::lookup_or(text, |rodeo| rodeo.get_or_intern_static(text))
    }

    /// Intern a borrowed string.
    pub fn from_dynamic(text: &str) -> Self {
        Self::lookup_or(text, |rodeo| rodeo.get_or_intern(text))
    }

    fn lookup_or(text: &str, intern: impl FnOnce(&mut Rodeo) -> Spur) -> Self {
        if let Some(spur) = INTERNER.read().get(text) {
            return Symbol(spur);
        }
        Symbol(intern(&mut INTERNER.write()))
    }

    /// Run `f` on the symbol's text without allocating.
    ///
    /// Uses a recursive read lock so that `f` may itself format or compare
    /// other symbols.
    pub fn with_str<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        let interner = INTERNER.read_recursive();
        f(interner.resolve(&self.0))
    }

    /// Whether the name starts with an uppercase ASCII letter, i.e. names a
    /// constructor or a module rather than a value.
    pub fn is_capitalized(&self) -> bool {
        self.with_str(|s| s.starts_with(|c: char| c.is_ascii_uppercase()))
    }

    /// Whether the name is made of operator characters (`+`, `::`, `>>=`).
    pub fn is_operator(&self) -> bool {
        self.with_str(|s| {
            !s.is_empty()
                && s.chars().all(|c| {
                    matches!(
                        c,
                        '!' | '$'
                            | '%'
                            | '&'
                            | '*'
                            | '+'
                            | '-'
                            | '.'
                            | '/'
                            | ':'
                            | '<'
                            | '='
                            | '>'
                            | '?'
                            | '@'
                            | '^'
                            | '|'
                            | '~'
                    )
                })
        })
    }
}

impl From<&'static str> for Symbol {
    fn from(text: &'static str) -> Self {
        Symbol::new(text)
    }
}

impl From<Cow<'_, str>> for Symbol {
    fn from(text: Cow<'_, str>) -> Self {
        Symbol::from_dynamic(&text)
    }
}

impl From<String> for Symbol {
    fn from(text: String) -> Self {
        Symbol::from_dynamic(&text)
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        self.with_str(|s| s == other)
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        self.with_str(|s| s == *other)
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.with_str(|s| f.write_str(s))
    }
}

/// Declare a batch of functions returning well-known symbols.
///
/// ```
/// effmatch_core::symbols! {
///     KW_EFFECT => "effect",
/// }
/// assert_eq!(KW_EFFECT(), "effect");
/// ```
#[macro_export]
macro_rules! symbols {
    ($($(#[$attr:meta])* $name:ident => $text:literal),* $(,)?) => {
        $(
            $(#[$attr])*
            #[allow(non_snake_case)]
            #[inline]
            pub fn $name() -> $crate::Symbol {
                $crate::Symbol::new($text)
            }
        )*
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_is_stable() {
        let a = Symbol::new("match_with");
        let b = Symbol::from_dynamic(&String::from("match_with"));
        assert_eq!(a, b);
        assert_ne!(a, Symbol::new("try_with"));
    }

    #[test]
    fn test_display_and_str_eq() {
        let sym = Symbol::new("continuation");
        assert_eq!(sym.to_string(), "continuation");
        assert!(sym == "continuation");
    }

    #[test]
    fn test_capitalized() {
        assert!(Symbol::new("Some").is_capitalized());
        assert!(!Symbol::new("some").is_capitalized());
        assert!(!Symbol::new("_Some").is_capitalized());
    }

    #[test]
    fn test_operator() {
        assert!(Symbol::new("+").is_operator());
        assert!(Symbol::new(">>=").is_operator());
        assert!(Symbol::new("::").is_operator());
        assert!(!Symbol::new("mod").is_operator());
        assert!(!Symbol::new("").is_operator());
    }
}
