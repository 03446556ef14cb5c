//! Recursive descent parser for the ML subset understood by the rewriter.
//!
//! Expressions use precedence climbing over the levels in
//! [`crate::precedence`]; everything else is plain recursive descent.
//!
//! # Module Structure
//!
//! - `expr` - expressions, cases and function parameters
//! - `pattern` - patterns, including `[%name? p]` extension patterns
//! - `types` - core type expressions
//! - `structure` - structure items, type and exception declarations

mod expr;
mod pattern;
mod structure;
mod types;

use effmatch_core::{Location, Span, Symbol};

use crate::ast::{CoreType, Expr, Extension, Pattern, Payload, Structure, StructureItem};
use crate::ast::{ExprKind, StructureItemKind};
use crate::error::{ParseError, ParseResult};
use crate::lexer::{SpannedToken, Token, tokenize};

/// Parse a whole compilation unit.
pub fn parse_structure(source: &str) -> ParseResult<Structure> {
    let mut parser = Parser::new(tokenize(source)?);
    let items = parser.parse_structure_items()?;
    parser.expect(Token::Eof)?;
    Ok(items)
}

/// Parse a single expression.
pub fn parse_expression(source: &str) -> ParseResult<Expr> {
    let mut parser = Parser::new(tokenize(source)?);
    let expr = parser.parse_expr()?;
    parser.expect(Token::Eof)?;
    Ok(expr)
}

/// Parse a single pattern.
pub fn parse_pattern(source: &str) -> ParseResult<Pattern> {
    let mut parser = Parser::new(tokenize(source)?);
    let pat = parser.parse_pattern()?;
    parser.expect(Token::Eof)?;
    Ok(pat)
}

/// Parse a single type expression.
pub fn parse_core_type(source: &str) -> ParseResult<CoreType> {
    let mut parser = Parser::new(tokenize(source)?);
    let ty = parser.parse_type()?;
    parser.expect(Token::Eof)?;
    Ok(ty)
}

pub(crate) struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    /// `tokens` must end with [`Token::Eof`], as produced by the lexer.
    pub(crate) fn new(tokens: Vec<SpannedToken>) -> Self {
        Self { tokens, pos: 0 }
    }

    // ========================================================================
    // Lookahead
    // ========================================================================

    fn peek(&self) -> &Token {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> &Token {
        self.tokens
            .get(self.pos + n)
            .map(|t| &t.token)
            .unwrap_or(&Token::Eof)
    }

    fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.span)
            .unwrap_or_default()
    }

    /// Byte offset where the current token starts.
    fn start(&self) -> usize {
        self.current_span().start
    }

    /// Location running from `start` to the end of the last consumed token.
    fn loc_from(&self, start: usize) -> Location {
        let end = match self.pos {
            0 => start,
            pos => self.tokens[pos - 1].span.end,
        };
        Location::new(Span::new(start, end.max(start)))
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == token
    }

    // ========================================================================
    // Consumption
    // ========================================================================

    fn advance(&mut self) -> SpannedToken {
        let token = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if token.token != Token::Eof {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> ParseResult<Span> {
        if self.check(&token) {
            Ok(self.advance().span)
        } else {
            Err(self.unexpected(token.to_string()))
        }
    }

    fn unexpected(&self, expected: impl Into<String>) -> ParseError {
        ParseError::unexpected(expected, self.peek(), self.current_span())
    }

    fn expect_lident(&mut self) -> ParseResult<Symbol> {
        match self.peek() {
            Token::LIdent(name) => {
                let sym = Symbol::from_dynamic(name);
                self.advance();
                Ok(sym)
            }
            _ => Err(self.unexpected("a lowercase identifier")),
        }
    }

    fn expect_uident(&mut self) -> ParseResult<Symbol> {
        match self.peek() {
            Token::UIdent(name) => {
                let sym = Symbol::from_dynamic(name);
                self.advance();
                Ok(sym)
            }
            _ => Err(self.unexpected("a capitalized identifier")),
        }
    }

    // ========================================================================
    // Extension marks
    // ========================================================================

    /// Consume a `%name` glued to the keyword just consumed.
    fn eat_ext_mark(&mut self) -> Option<(Symbol, Span)> {
        match self.peek() {
            Token::ExtMark(name) => {
                let sym = Symbol::from_dynamic(name);
                let span = self.advance().span;
                Some((sym, span))
            }
            _ => None,
        }
    }

    /// `match%ext e with ...` is sugar for `[%ext match e with ...]`.
    fn wrap_expr_ext(&self, mark: Option<(Symbol, Span)>, start: usize, expr: Expr) -> Expr {
        let Some((name, _)) = mark else {
            return expr;
        };
        let loc = self.loc_from(start);
        let item = StructureItem::new(expr.loc, StructureItemKind::Eval(expr));
        Expr::new(
            loc,
            ExprKind::Extension(Extension {
                loc,
                name,
                payload: Payload::Structure(vec![item]),
            }),
        )
    }

    /// `exception%ext E` is sugar for `[%%ext exception E]`.
    fn wrap_item_ext(
        &self,
        mark: Option<(Symbol, Span)>,
        start: usize,
        item: StructureItem,
    ) -> StructureItem {
        let Some((name, _)) = mark else {
            return item;
        };
        let loc = self.loc_from(start);
        StructureItem::new(
            loc,
            StructureItemKind::Extension(Extension {
                loc,
                name,
                payload: Payload::Structure(vec![item]),
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;
    use crate::error::ParseErrorKind;

    #[test]
    fn test_parse_effect_match() {
        let expr = parse_expression(
            "match f x with\n\
             | v -> v\n\
             | exception Not_found -> 0\n\
             | [%effect? Get, k] -> continue k 1",
        )
        .unwrap();
        let ExprKind::Match { scrutinee, cases } = &*expr.kind else {
            panic!("expected a match, got {expr:?}");
        };
        assert!(matches!(&*scrutinee.kind, ExprKind::Apply { args, .. } if args.len() == 1));
        assert_eq!(cases.len(), 3);
        assert!(matches!(&*cases[1].lhs.kind, PatternKind::Exception(_)));
        let PatternKind::Extension(ext) = &*cases[2].lhs.kind else {
            panic!("expected an extension pattern");
        };
        assert_eq!(ext.name, "effect");
        let Payload::Pattern { pat, guard: None } = &ext.payload else {
            panic!("expected a pattern payload");
        };
        assert!(matches!(&*pat.kind, PatternKind::Tuple(ps) if ps.len() == 2));
    }

    #[test]
    fn test_effect_pattern_without_question_mark() {
        let pat = parse_pattern("[%effect Put v, k]").unwrap();
        let PatternKind::Extension(ext) = &*pat.kind else {
            panic!("expected an extension pattern");
        };
        let Payload::Pattern { pat, .. } = &ext.payload else {
            panic!("expected a pattern payload");
        };
        let PatternKind::Tuple(parts) = &*pat.kind else {
            panic!("expected a tuple");
        };
        assert!(matches!(
            &*parts[0].kind,
            PatternKind::Construct { ctor, arg: Some(_) } if ctor.is_ident("Put")
        ));
    }

    #[test]
    fn test_precedence() {
        let expr = parse_expression("a + b * c").unwrap();
        let ExprKind::Apply { func, args } = &*expr.kind else {
            panic!("expected application");
        };
        assert!(matches!(&*func.kind, ExprKind::Ident(p) if p.is_ident("+")));
        assert!(matches!(&*args[1].kind, ExprKind::Apply { .. }));
    }

    #[test]
    fn test_list_sugar_and_cons() {
        let expr = parse_expression("[1; 2]").unwrap();
        let ExprKind::Construct { ctor, arg: Some(arg) } = &*expr.kind else {
            panic!("expected a cons cell");
        };
        assert!(ctor.is_ident("::"));
        assert!(matches!(&*arg.kind, ExprKind::Tuple(parts) if parts.len() == 2));
    }

    #[test]
    fn test_let_function_sugar() {
        let items = parse_structure("let f (type a) x y = x").unwrap();
        let StructureItemKind::Value { bindings, .. } = &items[0].kind else {
            panic!("expected a value item");
        };
        let ExprKind::Newtype { body, .. } = &*bindings[0].expr.kind else {
            panic!("expected a locally abstract type");
        };
        assert!(matches!(&*body.kind, ExprKind::Fun { .. }));
    }

    #[test]
    fn test_local_exception_with_extension_mark() {
        let expr = parse_expression("let exception%effect E : int in 1").unwrap();
        let ExprKind::Extension(ext) = &*expr.kind else {
            panic!("expected an extension, got {expr:?}");
        };
        assert_eq!(ext.name, "effect");
        let Payload::Structure(inner) = &ext.payload else {
            panic!("expected a structure payload");
        };
        let StructureItemKind::Eval(body) = &inner[0].kind else {
            panic!("expected an expression");
        };
        assert!(matches!(&*body.kind, ExprKind::LetException { .. }));
    }

    #[test]
    fn test_exception_effect_declaration() {
        let items = parse_structure("exception%effect E : int -> string").unwrap();
        let StructureItemKind::Extension(ext) = &items[0].kind else {
            panic!("expected an extension item");
        };
        assert_eq!(ext.name, "effect");
        let Payload::Structure(inner) = &ext.payload else {
            panic!("expected a structure payload");
        };
        let StructureItemKind::Exception(ctor) = &inner[0].kind else {
            panic!("expected an exception");
        };
        let ExtensionConstructorKind::Decl { args, result } = &ctor.kind else {
            panic!("expected a declaration");
        };
        assert_eq!(args.len(), 1);
        assert!(result.is_some());
    }

    #[test]
    fn test_type_extension() {
        let items = parse_structure("type _ Effect.t += E : int -> unit Effect.t").unwrap();
        let StructureItemKind::TypeExtension(ext) = &items[0].kind else {
            panic!("expected a type extension");
        };
        assert_eq!(ext.path.to_string(), "Effect.t");
        assert_eq!(ext.params.len(), 1);
        assert_eq!(ext.constructors.len(), 1);
    }

    #[test]
    fn test_sequence_in_case_body() {
        let expr = parse_expression("match x with A -> f (); 1 | B -> 2").unwrap();
        let ExprKind::Match { cases, .. } = &*expr.kind else {
            panic!("expected a match");
        };
        assert_eq!(cases.len(), 2);
        assert!(matches!(&*cases[0].rhs.kind, ExprKind::Sequence { .. }));
    }

    #[test]
    fn test_top_level_let_in_is_an_expression() {
        let items = parse_structure("let x = 1 in x").unwrap();
        assert!(matches!(&items[0].kind, StructureItemKind::Eval(_)));
    }

    #[test]
    fn test_error_reports_found_token() {
        let err = parse_expression("match x with").unwrap_err();
        assert!(matches!(err.kind(), ParseErrorKind::Unexpected { .. }));
        assert_eq!(err.to_string(), "expected a pattern, found end of input");
    }
}
