//! Pattern parsing.
//!
//! Binding strength, loosest first: `as`, `|`, `,`, `::`, constructor
//! application, simple patterns.

use effmatch_core::{Location, Span, Symbol};

use super::Parser;
use crate::ast::*;
use crate::error::ParseResult;
use crate::lexer::Token;

/// Tokens that can begin a simple pattern (a function parameter or a
/// constructor argument).
pub(super) fn starts_simple_pattern(token: &Token) -> bool {
    matches!(
        token,
        Token::Underscore
            | Token::LIdent(_)
            | Token::UIdent(_)
            | Token::Int(_)
            | Token::Float(_)
            | Token::Char(_)
            | Token::Str(_)
            | Token::True
            | Token::False
            | Token::Tag(_)
            | Token::LParen
            | Token::LBracket
            | Token::LArray
            | Token::LBrace
            | Token::ExtOpen(_)
    )
}

fn ctor_pattern(loc: Location, name: &'static str, arg: Option<Pattern>) -> Pattern {
    Pattern::new(
        loc,
        PatternKind::Construct {
            ctor: Path::ident(Symbol::new(name)),
            arg,
        },
    )
}

impl Parser {
    pub(crate) fn parse_pattern(&mut self) -> ParseResult<Pattern> {
        let start = self.start();
        let mut pat = self.parse_or_pattern()?;
        while self.eat(&Token::As) {
            let name = self.expect_lident()?;
            pat = Pattern::new(self.loc_from(start), PatternKind::Alias { pat, name });
        }
        Ok(pat)
    }

    fn parse_or_pattern(&mut self) -> ParseResult<Pattern> {
        let start = self.start();
        let mut pat = self.parse_tuple_pattern()?;
        while self.eat(&Token::Bar) {
            let rhs = self.parse_tuple_pattern()?;
            pat = Pattern::new(self.loc_from(start), PatternKind::Or(pat, rhs));
        }
        Ok(pat)
    }

    fn parse_tuple_pattern(&mut self) -> ParseResult<Pattern> {
        let start = self.start();
        let first = self.parse_cons_pattern()?;
        if !self.check(&Token::Comma) {
            return Ok(first);
        }
        let mut elements = vec![first];
        while self.eat(&Token::Comma) {
            elements.push(self.parse_cons_pattern()?);
        }
        Ok(Pattern::new(
            self.loc_from(start),
            PatternKind::Tuple(elements),
        ))
    }

    fn parse_cons_pattern(&mut self) -> ParseResult<Pattern> {
        let start = self.start();
        let head = self.parse_app_pattern()?;
        if !self.eat(&Token::ColonColon) {
            return Ok(head);
        }
        let tail = self.parse_cons_pattern()?;
        let loc = self.loc_from(start);
        let pair = Pattern::new(loc.to_ghost(), PatternKind::Tuple(vec![head, tail]));
        Ok(ctor_pattern(loc, "::", Some(pair)))
    }

    fn parse_app_pattern(&mut self) -> ParseResult<Pattern> {
        let start = self.start();
        let kind = match self.peek().clone() {
            Token::Exception => {
                self.advance();
                PatternKind::Exception(self.parse_app_pattern()?)
            }
            Token::Lazy => {
                self.advance();
                PatternKind::Lazy(self.parse_simple_pattern()?)
            }
            Token::UIdent(_) => {
                let ctor = self.parse_long_uident()?;
                let arg = if starts_simple_pattern(self.peek()) {
                    Some(self.parse_simple_pattern()?)
                } else {
                    None
                };
                PatternKind::Construct { ctor, arg }
            }
            Token::Tag(tag) => {
                self.advance();
                let arg = if starts_simple_pattern(self.peek()) {
                    Some(self.parse_simple_pattern()?)
                } else {
                    None
                };
                PatternKind::Variant {
                    tag: Symbol::from_dynamic(&tag),
                    arg,
                }
            }
            _ => return self.parse_simple_pattern(),
        };
        Ok(Pattern::new(self.loc_from(start), kind))
    }

    pub(crate) fn parse_simple_pattern(&mut self) -> ParseResult<Pattern> {
        let start = self.start();
        let kind = match self.peek().clone() {
            Token::Underscore => {
                self.advance();
                PatternKind::Any
            }
            Token::LIdent(name) => {
                self.advance();
                PatternKind::Var(Symbol::from_dynamic(&name))
            }
            Token::Int(n) => {
                self.advance();
                PatternKind::Constant(Constant::Int(n))
            }
            Token::Float(f) => {
                self.advance();
                PatternKind::Constant(Constant::Float(f))
            }
            Token::Char(c) => {
                self.advance();
                PatternKind::Constant(Constant::Char(c))
            }
            Token::Str(s) => {
                self.advance();
                PatternKind::Constant(Constant::String(s))
            }
            Token::InfixOp(op) if op == "-" => {
                self.advance();
                match self.peek().clone() {
                    Token::Int(n) => {
                        self.advance();
                        PatternKind::Constant(Constant::Int(-n))
                    }
                    Token::Float(f) => {
                        self.advance();
                        PatternKind::Constant(Constant::Float(format!("-{f}")))
                    }
                    _ => return Err(self.unexpected("a numeric literal")),
                }
            }
            Token::True | Token::False => {
                let name = if self.advance().token == Token::True {
                    "true"
                } else {
                    "false"
                };
                return Ok(ctor_pattern(self.loc_from(start), name, None));
            }
            Token::UIdent(_) => PatternKind::Construct {
                ctor: self.parse_long_uident()?,
                arg: None,
            },
            Token::Tag(tag) => {
                self.advance();
                PatternKind::Variant {
                    tag: Symbol::from_dynamic(&tag),
                    arg: None,
                }
            }
            Token::LParen => return self.parse_paren_pattern(),
            Token::LBracket => return self.parse_list_pattern(),
            Token::LArray => {
                self.advance();
                let mut elements = Vec::new();
                while !self.check(&Token::RArray) {
                    elements.push(self.parse_pattern()?);
                    if !self.eat(&Token::Semi) {
                        break;
                    }
                }
                self.expect(Token::RArray)?;
                PatternKind::Array(elements)
            }
            Token::LBrace => return self.parse_record_pattern(),
            Token::ExtOpen(name) => {
                self.advance();
                // `[%name? p]` and `[%name p]` both carry a pattern here.
                self.eat(&Token::Question);
                let payload = self.parse_pattern_payload()?;
                self.expect(Token::RBracket)?;
                let loc = self.loc_from(start);
                PatternKind::Extension(Extension {
                    loc,
                    name: Symbol::from_dynamic(&name),
                    payload,
                })
            }
            _ => return Err(self.unexpected("a pattern")),
        };
        Ok(Pattern::new(self.loc_from(start), kind))
    }

    fn parse_paren_pattern(&mut self) -> ParseResult<Pattern> {
        let start = self.start();
        self.expect(Token::LParen)?;
        if self.eat(&Token::RParen) {
            return Ok(ctor_pattern(self.loc_from(start), "()", None));
        }
        let pat = self.parse_pattern()?;
        if self.eat(&Token::Colon) {
            let ty = self.parse_type()?;
            self.expect(Token::RParen)?;
            return Ok(Pattern::new(
                self.loc_from(start),
                PatternKind::Constraint { pat, ty },
            ));
        }
        self.expect(Token::RParen)?;
        Ok(pat)
    }

    /// `[p1; p2]` desugars to `p1 :: p2 :: []`.
    fn parse_list_pattern(&mut self) -> ParseResult<Pattern> {
        let start = self.start();
        self.expect(Token::LBracket)?;
        let mut elements = Vec::new();
        while !self.check(&Token::RBracket) {
            elements.push(self.parse_pattern()?);
            if !self.eat(&Token::Semi) {
                break;
            }
        }
        self.expect(Token::RBracket)?;
        let loc = self.loc_from(start);
        let nil = ctor_pattern(
            if elements.is_empty() { loc } else { loc.to_ghost() },
            "[]",
            None,
        );
        Ok(elements.into_iter().rev().fold(nil, |tail, head| {
            let loc = Location::ghost(Span::new(head.loc.span.start, loc.span.end));
            let pair = Pattern::new(loc, PatternKind::Tuple(vec![head, tail]));
            ctor_pattern(loc, "::", Some(pair))
        }))
    }

    /// `{ f = p; g; _ }`
    fn parse_record_pattern(&mut self) -> ParseResult<Pattern> {
        let start = self.start();
        self.expect(Token::LBrace)?;
        let mut fields = Vec::new();
        let mut closed = true;
        while !self.check(&Token::RBrace) {
            if self.eat(&Token::Underscore) {
                closed = false;
            } else {
                let field_start = self.start();
                let label = self.parse_label()?;
                let pat = if self.eat(&Token::Eq) {
                    self.parse_pattern()?
                } else {
                    Pattern::new(self.loc_from(field_start), PatternKind::Var(label.name()))
                };
                fields.push((label, pat));
            }
            if !self.eat(&Token::Semi) {
                break;
            }
        }
        self.expect(Token::RBrace)?;
        Ok(Pattern::new(
            self.loc_from(start),
            PatternKind::Record { fields, closed },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse_pattern;
    use crate::ast::*;

    #[test]
    fn test_or_and_alias() {
        let pat = parse_pattern("A | B as x").unwrap();
        let PatternKind::Alias { pat, name } = &*pat.kind else {
            panic!("expected an alias");
        };
        assert_eq!(*name, "x");
        assert!(matches!(&*pat.kind, PatternKind::Or(_, _)));
    }

    #[test]
    fn test_exception_pattern() {
        let pat = parse_pattern("exception Failure msg").unwrap();
        let PatternKind::Exception(inner) = &*pat.kind else {
            panic!("expected an exception pattern");
        };
        assert!(matches!(
            &*inner.kind,
            PatternKind::Construct { ctor, arg: Some(_) } if ctor.is_ident("Failure")
        ));
    }

    #[test]
    fn test_record_and_list_patterns() {
        let pat = parse_pattern("{ x; y = [a; _]; _ }").unwrap();
        let PatternKind::Record { fields, closed } = &*pat.kind else {
            panic!("expected a record pattern");
        };
        assert!(!closed);
        assert_eq!(fields.len(), 2);
        assert!(matches!(
            &*fields[1].1.kind,
            PatternKind::Construct { ctor, .. } if ctor.is_ident("::")
        ));
    }

    #[test]
    fn test_guarded_extension_payload() {
        let pat = parse_pattern("[%effect? Get, k when ready]").unwrap();
        let PatternKind::Extension(ext) = &*pat.kind else {
            panic!("expected an extension pattern");
        };
        assert!(matches!(&ext.payload, Payload::Pattern { guard: Some(_), .. }));
    }

    #[test]
    fn test_negative_constant() {
        let pat = parse_pattern("-3").unwrap();
        assert_eq!(*pat.kind, PatternKind::Constant(Constant::Int(-3)));
    }
}
