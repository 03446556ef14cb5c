//! Type expression parsing.

use super::Parser;
use crate::ast::*;
use crate::error::ParseResult;
use crate::lexer::Token;

impl Parser {
    /// `t1 -> t2`, right associative.
    pub(crate) fn parse_type(&mut self) -> ParseResult<CoreType> {
        let start = self.start();
        let lhs = self.parse_tuple_type()?;
        if self.eat(&Token::Arrow) {
            let rhs = self.parse_type()?;
            return Ok(CoreType::new(
                self.loc_from(start),
                CoreTypeKind::Arrow(lhs, rhs),
            ));
        }
        Ok(lhs)
    }

    fn parse_tuple_type(&mut self) -> ParseResult<CoreType> {
        let start = self.start();
        let first = self.parse_app_type()?;
        let is_star = |token: &Token| matches!(token, Token::InfixOp(op) if op == "*");
        if !is_star(self.peek()) {
            return Ok(first);
        }
        let mut elements = vec![first];
        while is_star(self.peek()) {
            self.advance();
            elements.push(self.parse_app_type()?);
        }
        Ok(CoreType::new(
            self.loc_from(start),
            CoreTypeKind::Tuple(elements),
        ))
    }

    fn at_type_path(&self) -> bool {
        match self.peek() {
            Token::LIdent(_) => true,
            Token::UIdent(_) => self.peek_nth(1) == &Token::Dot,
            _ => false,
        }
    }

    /// `M.N.t`
    fn parse_type_path(&mut self) -> ParseResult<Path> {
        self.parse_label()
    }

    /// Atoms followed by postfix constructor applications: `int list`,
    /// `(a, b) Effect.Deep.continuation`.
    fn parse_app_type(&mut self) -> ParseResult<CoreType> {
        let start = self.start();
        let mut ty = match self.peek() {
            Token::TyVar(name) => {
                let name = effmatch_core::Symbol::from_dynamic(name);
                self.advance();
                CoreType::new(self.loc_from(start), CoreTypeKind::Var(name))
            }
            Token::Underscore => {
                self.advance();
                CoreType::new(self.loc_from(start), CoreTypeKind::Any)
            }
            Token::LParen => {
                self.advance();
                let first = self.parse_type()?;
                if self.check(&Token::Comma) {
                    let mut args = vec![first];
                    while self.eat(&Token::Comma) {
                        args.push(self.parse_type()?);
                    }
                    self.expect(Token::RParen)?;
                    if !self.at_type_path() {
                        return Err(self.unexpected("a type constructor"));
                    }
                    let path = self.parse_type_path()?;
                    CoreType::new(self.loc_from(start), CoreTypeKind::Constr { path, args })
                } else {
                    self.expect(Token::RParen)?;
                    first
                }
            }
            _ if self.at_type_path() => {
                let path = self.parse_type_path()?;
                CoreType::new(
                    self.loc_from(start),
                    CoreTypeKind::Constr {
                        path,
                        args: Vec::new(),
                    },
                )
            }
            _ => return Err(self.unexpected("a type")),
        };
        while self.at_type_path() {
            let path = self.parse_type_path()?;
            ty = CoreType::new(
                self.loc_from(start),
                CoreTypeKind::Constr {
                    path,
                    args: vec![ty],
                },
            );
        }
        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse_core_type;
    use crate::ast::*;

    #[test]
    fn test_arrow_is_right_associative() {
        let ty = parse_core_type("int -> string -> unit").unwrap();
        let CoreTypeKind::Arrow(_, rhs) = &*ty.kind else {
            panic!("expected an arrow");
        };
        assert!(matches!(&*rhs.kind, CoreTypeKind::Arrow(_, _)));
    }

    #[test]
    fn test_multi_argument_constructor() {
        let ty = parse_core_type("(r, _) Effect.Deep.continuation").unwrap();
        let CoreTypeKind::Constr { path, args } = &*ty.kind else {
            panic!("expected a constructor");
        };
        assert_eq!(path.to_string(), "Effect.Deep.continuation");
        assert_eq!(args.len(), 2);
        assert!(matches!(&*args[1].kind, CoreTypeKind::Any));
    }

    #[test]
    fn test_tuple_and_postfix_application() {
        let ty = parse_core_type("int list * 'a").unwrap();
        let CoreTypeKind::Tuple(elements) = &*ty.kind else {
            panic!("expected a tuple");
        };
        assert!(matches!(
            &*elements[0].kind,
            CoreTypeKind::Constr { args, .. } if args.len() == 1
        ));
        assert!(matches!(&*elements[1].kind, CoreTypeKind::Var(v) if *v == "a"));
    }
}
