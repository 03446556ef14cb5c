//! Structure items and declarations.

use effmatch_core::Symbol;

use super::Parser;
use super::expr::starts_expr;
use crate::ast::*;
use crate::error::ParseResult;
use crate::lexer::Token;

/// `C of a * b` lists its arguments as a tuple type; split them back out.
fn split_tuple(ty: CoreType) -> Vec<CoreType> {
    match *ty.kind {
        CoreTypeKind::Tuple(elements) => elements,
        kind => vec![CoreType::new(ty.loc, kind)],
    }
}

impl Parser {
    /// Items up to the end of input, `end` or `]`.
    pub(crate) fn parse_structure_items(&mut self) -> ParseResult<Structure> {
        let mut items = Vec::new();
        loop {
            while self.eat(&Token::SemiSemi) {}
            if matches!(self.peek(), Token::Eof | Token::End | Token::RBracket) {
                return Ok(items);
            }
            items.push(self.parse_structure_item()?);
        }
    }

    fn parse_structure_item(&mut self) -> ParseResult<StructureItem> {
        let start = self.start();
        match self.peek().clone() {
            Token::Let => self.parse_let_item(),
            Token::Type => self.parse_type_item(),
            Token::Exception => {
                self.advance();
                let mark = self.eat_ext_mark();
                let ctor = self.parse_extension_constructor()?;
                let item = StructureItem::new(self.loc_from(start), StructureItemKind::Exception(ctor));
                Ok(self.wrap_item_ext(mark, start, item))
            }
            Token::Module => {
                self.advance();
                let mark = self.eat_ext_mark();
                let name = self.expect_uident()?;
                self.expect(Token::Eq)?;
                let expr = self.parse_module_expr()?;
                let item = StructureItem::new(
                    self.loc_from(start),
                    StructureItemKind::Module { name, expr },
                );
                Ok(self.wrap_item_ext(mark, start, item))
            }
            Token::Open => {
                self.advance();
                let mark = self.eat_ext_mark();
                let path = self.parse_long_uident()?;
                let item = StructureItem::new(self.loc_from(start), StructureItemKind::Open(path));
                Ok(self.wrap_item_ext(mark, start, item))
            }
            Token::ItemExtOpen(name) => {
                self.advance();
                let items = self.parse_structure_items()?;
                self.expect(Token::RBracket)?;
                let loc = self.loc_from(start);
                Ok(StructureItem::new(
                    loc,
                    StructureItemKind::Extension(Extension {
                        loc,
                        name: Symbol::from_dynamic(&name),
                        payload: Payload::Structure(items),
                    }),
                ))
            }
            token if starts_expr(&token) => {
                let expr = self.parse_expr()?;
                Ok(StructureItem::new(self.loc_from(start), StructureItemKind::Eval(expr)))
            }
            _ => Err(self.unexpected("a structure item")),
        }
    }

    /// A top-level `let` is a value definition unless it continues with
    /// `in`, in which case it is an expression.
    fn parse_let_item(&mut self) -> ParseResult<StructureItem> {
        let start = self.start();
        let saved = self.pos;
        let local_form = |token: &Token| matches!(token, Token::Open | Token::Module | Token::Exception);
        let is_expr = local_form(self.peek_nth(1))
            || (matches!(self.peek_nth(1), Token::ExtMark(_)) && local_form(self.peek_nth(2)));

        if !is_expr {
            self.expect(Token::Let)?;
            let mark = self.eat_ext_mark();
            let (rec_flag, bindings) = self.parse_let_bindings()?;
            if !self.check(&Token::In) {
                let item = StructureItem::new(
                    self.loc_from(start),
                    StructureItemKind::Value { rec_flag, bindings },
                );
                return Ok(self.wrap_item_ext(mark, start, item));
            }
            self.pos = saved;
        }

        let expr = self.parse_expr()?;
        Ok(StructureItem::new(self.loc_from(start), StructureItemKind::Eval(expr)))
    }

    fn parse_type_params(&mut self) -> ParseResult<Vec<CoreType>> {
        let param = |parser: &mut Self| -> ParseResult<CoreType> {
            let start = parser.start();
            match parser.peek().clone() {
                Token::TyVar(name) => {
                    parser.advance();
                    Ok(CoreType::new(
                        parser.loc_from(start),
                        CoreTypeKind::Var(Symbol::from_dynamic(&name)),
                    ))
                }
                Token::Underscore => {
                    parser.advance();
                    Ok(CoreType::new(parser.loc_from(start), CoreTypeKind::Any))
                }
                _ => Err(parser.unexpected("a type parameter")),
            }
        };
        match self.peek() {
            Token::TyVar(_) | Token::Underscore => Ok(vec![param(self)?]),
            Token::LParen => {
                self.advance();
                let mut params = vec![param(self)?];
                while self.eat(&Token::Comma) {
                    params.push(param(self)?);
                }
                self.expect(Token::RParen)?;
                Ok(params)
            }
            _ => Ok(Vec::new()),
        }
    }

    /// `type ... and ...` or `type params path += constructors`.
    fn parse_type_item(&mut self) -> ParseResult<StructureItem> {
        let start = self.start();
        self.expect(Token::Type)?;
        let mark = self.eat_ext_mark();
        if matches!(self.peek(), Token::LIdent(name) if name == "nonrec") {
            self.advance();
        }

        let decl_start = self.start();
        let params = self.parse_type_params()?;
        let path = self.parse_label()?;

        let kind = if self.eat(&Token::PlusEq) {
            self.eat(&Token::Bar);
            let mut constructors = vec![self.parse_extension_constructor()?];
            while self.eat(&Token::Bar) {
                constructors.push(self.parse_extension_constructor()?);
            }
            StructureItemKind::TypeExtension(TypeExtension {
                loc: self.loc_from(decl_start),
                path,
                params,
                constructors,
            })
        } else {
            if !path.qualifier().is_empty() {
                return Err(self.unexpected("`+=` after a qualified type name"));
            }
            let mut decls = vec![self.parse_type_declaration(decl_start, params, path.name())?];
            while self.eat(&Token::And) {
                let decl_start = self.start();
                let params = self.parse_type_params()?;
                let name = self.expect_lident()?;
                decls.push(self.parse_type_declaration(decl_start, params, name)?);
            }
            StructureItemKind::Type(decls)
        };
        let item = StructureItem::new(self.loc_from(start), kind);
        Ok(self.wrap_item_ext(mark, start, item))
    }

    fn at_type_representation(&self) -> bool {
        match self.peek() {
            Token::DotDot | Token::Bar | Token::LBrace => true,
            Token::UIdent(_) => self.peek_nth(1) != &Token::Dot,
            _ => false,
        }
    }

    /// Everything after the declared name: `= manifest = repr`.
    fn parse_type_declaration(
        &mut self,
        start: usize,
        params: Vec<CoreType>,
        name: Symbol,
    ) -> ParseResult<TypeDeclaration> {
        let mut manifest = None;
        let mut kind = TypeDeclarationKind::Abstract;
        if self.eat(&Token::Eq) {
            if self.at_type_representation() {
                kind = self.parse_type_representation()?;
            } else {
                manifest = Some(self.parse_type()?);
                if self.eat(&Token::Eq) {
                    kind = self.parse_type_representation()?;
                }
            }
        }
        Ok(TypeDeclaration {
            loc: self.loc_from(start),
            name,
            params,
            manifest,
            kind,
        })
    }

    fn parse_type_representation(&mut self) -> ParseResult<TypeDeclarationKind> {
        if self.eat(&Token::DotDot) {
            return Ok(TypeDeclarationKind::Open);
        }
        if self.eat(&Token::LBrace) {
            let mut labels = Vec::new();
            while !self.check(&Token::RBrace) {
                let start = self.start();
                let mutable = self.eat(&Token::Mutable);
                let name = self.expect_lident()?;
                self.expect(Token::Colon)?;
                let ty = self.parse_type()?;
                labels.push(LabelDeclaration {
                    loc: self.loc_from(start),
                    name,
                    mutable,
                    ty,
                });
                if !self.eat(&Token::Semi) {
                    break;
                }
            }
            self.expect(Token::RBrace)?;
            return Ok(TypeDeclarationKind::Record(labels));
        }

        self.eat(&Token::Bar);
        let mut constructors = Vec::new();
        loop {
            let start = self.start();
            let name = self.expect_uident()?;
            let (args, result) = self.parse_constructor_arguments()?;
            constructors.push(ConstructorDeclaration {
                loc: self.loc_from(start),
                name,
                args,
                result,
            });
            if !self.eat(&Token::Bar) {
                return Ok(TypeDeclarationKind::Variant(constructors));
            }
        }
    }

    /// `of t1 * t2`, `: t1 -> r`, `: r` or nothing.
    fn parse_constructor_arguments(&mut self) -> ParseResult<(Vec<CoreType>, Option<CoreType>)> {
        if self.eat(&Token::Of) {
            let ty = self.parse_type()?;
            return Ok((split_tuple(ty), None));
        }
        if self.eat(&Token::Colon) {
            let ty = self.parse_type()?;
            return Ok(match *ty.kind {
                CoreTypeKind::Arrow(args, result) => (split_tuple(args), Some(result)),
                kind => (Vec::new(), Some(CoreType::new(ty.loc, kind))),
            });
        }
        Ok((Vec::new(), None))
    }

    /// `E`, `E of t`, `E : t -> r` or the rebind `E = M.E`.
    pub(super) fn parse_extension_constructor(&mut self) -> ParseResult<ExtensionConstructor> {
        let start = self.start();
        let name = self.expect_uident()?;
        let kind = if self.eat(&Token::Eq) {
            ExtensionConstructorKind::Rebind(self.parse_long_uident()?)
        } else {
            let (args, result) = self.parse_constructor_arguments()?;
            ExtensionConstructorKind::Decl { args, result }
        };
        Ok(ExtensionConstructor {
            loc: self.loc_from(start),
            name,
            kind,
        })
    }

    pub(super) fn parse_module_expr(&mut self) -> ParseResult<ModuleExpr> {
        let start = self.start();
        let kind = if self.eat(&Token::Struct) {
            let items = self.parse_structure_items()?;
            self.expect(Token::End)?;
            ModuleExprKind::Structure(items)
        } else {
            ModuleExprKind::Ident(self.parse_long_uident()?)
        };
        Ok(ModuleExpr {
            loc: self.loc_from(start),
            kind,
        })
    }
}
