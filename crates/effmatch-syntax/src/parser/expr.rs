//! Expression parsing.

use effmatch_core::{Location, Span, Symbol};

use super::Parser;
use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::lexer::Token;
use crate::precedence::{self, Assoc};

/// A function parameter: a pattern, or `(type a b)`.
enum Param {
    Pat(Pattern),
    Types(Vec<Symbol>),
}

/// Tokens that can begin an expression.
pub(super) fn starts_expr(token: &Token) -> bool {
    starts_simple_expr(token)
        || matches!(
            token,
            Token::Let
                | Token::Fun
                | Token::Function
                | Token::Match
                | Token::Try
                | Token::If
                | Token::Assert
                | Token::Lazy
        )
        || matches!(token, Token::InfixOp(op) if op == "-" || op == "-.")
}

/// Tokens that can begin an application argument.
fn starts_simple_expr(token: &Token) -> bool {
    matches!(
        token,
        Token::LIdent(_)
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
            | Token::LOverride
            | Token::Begin
            | Token::ExtOpen(_)
            | Token::New
            | Token::Object
            | Token::While
            | Token::For
            | Token::PrefixOp(_)
    )
}

fn ident_expr(loc: Location, name: &str) -> Expr {
    Expr::new(loc, ExprKind::Ident(Path::ident(Symbol::from_dynamic(name))))
}

fn ctor_expr(loc: Location, name: &'static str, arg: Option<Expr>) -> Expr {
    Expr::new(
        loc,
        ExprKind::Construct {
            ctor: Path::ident(Symbol::new(name)),
            arg,
        },
    )
}

impl Parser {
    /// Full expression, including `e1; e2` sequences.
    pub(crate) fn parse_expr(&mut self) -> ParseResult<Expr> {
        let start = self.start();
        let first = self.parse_expr_nosemi()?;
        if self.check(&Token::Semi) {
            if starts_expr(self.peek_nth(1)) {
                self.advance();
                let second = self.parse_expr()?;
                return Ok(Expr::new(
                    self.loc_from(start),
                    ExprKind::Sequence { first, second },
                ));
            }
            if matches!(self.peek_nth(1), Token::End | Token::RParen | Token::Done) {
                // trailing `;`
                self.advance();
            }
        }
        Ok(first)
    }

    /// Expression without a top-level sequence: assignments and below.
    pub(crate) fn parse_expr_nosemi(&mut self) -> ParseResult<Expr> {
        let start = self.start();
        let lhs = self.parse_tuple_expr()?;
        match self.peek() {
            Token::LeftArrow => {
                let arrow = self.advance().span;
                let value = self.parse_expr_nosemi()?;
                let loc = self.loc_from(start);
                let kind = match *lhs.kind {
                    ExprKind::Field { expr, field } => ExprKind::SetField { expr, field, value },
                    ExprKind::Ident(path) if path.qualifier().is_empty() => ExprKind::SetInstVar {
                        name: path.name(),
                        value,
                    },
                    _ => {
                        return Err(ParseError::unexpected(
                            "a field or instance variable before `<-`",
                            "`<-`",
                            arrow,
                        ));
                    }
                };
                Ok(Expr::new(loc, kind))
            }
            Token::ColonEq => {
                let op_span = self.advance().span;
                let value = self.parse_expr_nosemi()?;
                let func = ident_expr(Location::new(op_span), ":=");
                Ok(Expr::new(
                    self.loc_from(start),
                    ExprKind::Apply {
                        func,
                        args: vec![lhs, value],
                    },
                ))
            }
            _ => Ok(lhs),
        }
    }

    fn parse_tuple_expr(&mut self) -> ParseResult<Expr> {
        let start = self.start();
        let first = self.parse_binary(precedence::OR)?;
        if !self.check(&Token::Comma) {
            return Ok(first);
        }
        let mut elements = vec![first];
        while self.eat(&Token::Comma) {
            elements.push(self.parse_binary(precedence::OR)?);
        }
        Ok(Expr::new(self.loc_from(start), ExprKind::Tuple(elements)))
    }

    fn peek_binary_op(&self) -> Option<(String, u8, Assoc)> {
        let op = match self.peek() {
            Token::Eq => "=".to_string(),
            Token::ColonColon => "::".to_string(),
            Token::InfixOp(op) => op.clone(),
            _ => return None,
        };
        let (level, assoc) = precedence::infix(&op)?;
        // `:=` is handled by the assignment level.
        (level > precedence::ASSIGN).then_some((op, level, assoc))
    }

    /// Precedence climbing over the infix operator levels.
    fn parse_binary(&mut self, min_level: u8) -> ParseResult<Expr> {
        let start = self.start();
        let mut lhs = self.parse_unary()?;
        while let Some((op, level, assoc)) = self.peek_binary_op() {
            if level < min_level {
                break;
            }
            let op_span = self.advance().span;
            let next_min = match assoc {
                Assoc::Left => level + 1,
                Assoc::Right => level,
            };
            let rhs = self.parse_binary(next_min)?;
            let loc = self.loc_from(start);
            lhs = if op == "::" {
                let pair = Expr::new(loc.to_ghost(), ExprKind::Tuple(vec![lhs, rhs]));
                ctor_expr(loc, "::", Some(pair))
            } else {
                Expr::new(
                    loc,
                    ExprKind::Apply {
                        func: ident_expr(Location::new(op_span), &op),
                        args: vec![lhs, rhs],
                    },
                )
            };
        }
        Ok(lhs)
    }

    /// Operand position: open constructs, unary minus, then application.
    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let start = self.start();
        match self.peek().clone() {
            Token::Let => self.parse_let(),
            Token::Fun => self.parse_fun(),
            Token::Function => self.parse_function(),
            Token::Match => self.parse_match(),
            Token::Try => self.parse_try(),
            Token::If => self.parse_if(),
            Token::InfixOp(op) if op == "-" || op == "-." => {
                let op_span = self.advance().span;
                let operand = self.parse_unary()?;
                let loc = self.loc_from(start);
                let kind = match *operand.kind {
                    ExprKind::Constant(Constant::Int(n)) => ExprKind::Constant(Constant::Int(-n)),
                    ExprKind::Constant(Constant::Float(f)) => {
                        ExprKind::Constant(Constant::Float(format!("-{f}")))
                    }
                    kind => ExprKind::Apply {
                        func: ident_expr(Location::new(op_span), &format!("~{op}")),
                        args: vec![Expr::new(operand.loc, kind)],
                    },
                };
                Ok(Expr::new(loc, kind))
            }
            _ => self.parse_app(),
        }
    }

    /// Whether the upcoming long identifier names a constructor rather
    /// than a value (`M.x`) or a local open (`M.(e)`).
    fn at_constructor(&self) -> bool {
        let mut i = 0;
        loop {
            if !matches!(self.peek_nth(i), Token::UIdent(_)) {
                return false;
            }
            if self.peek_nth(i + 1) != &Token::Dot {
                return true;
            }
            match self.peek_nth(i + 2) {
                Token::UIdent(_) => i += 2,
                _ => return false,
            }
        }
    }

    fn parse_app(&mut self) -> ParseResult<Expr> {
        let start = self.start();
        match self.peek().clone() {
            Token::Assert => {
                self.advance();
                let e = self.parse_simple_postfix()?;
                return Ok(Expr::new(self.loc_from(start), ExprKind::Assert(e)));
            }
            Token::Lazy => {
                self.advance();
                let e = self.parse_simple_postfix()?;
                return Ok(Expr::new(self.loc_from(start), ExprKind::Lazy(e)));
            }
            Token::Tag(tag) => {
                self.advance();
                let arg = if starts_simple_expr(self.peek()) {
                    Some(self.parse_simple_postfix()?)
                } else {
                    None
                };
                let tag = Symbol::from_dynamic(&tag);
                return Ok(Expr::new(
                    self.loc_from(start),
                    ExprKind::Variant { tag, arg },
                ));
            }
            Token::UIdent(_) if self.at_constructor() => {
                let ctor = self.parse_long_uident()?;
                let arg = if starts_simple_expr(self.peek()) {
                    Some(self.parse_simple_postfix()?)
                } else {
                    None
                };
                return Ok(Expr::new(
                    self.loc_from(start),
                    ExprKind::Construct { ctor, arg },
                ));
            }
            _ => {}
        }

        let func = self.parse_simple_postfix()?;
        if !starts_simple_expr(self.peek()) {
            return Ok(func);
        }
        let mut args = Vec::new();
        while starts_simple_expr(self.peek()) {
            args.push(self.parse_simple_postfix()?);
        }
        Ok(Expr::new(
            self.loc_from(start),
            ExprKind::Apply { func, args },
        ))
    }

    /// `M.N.C`, a path made only of capitalized segments.
    pub(super) fn parse_long_uident(&mut self) -> ParseResult<Path> {
        let mut segments = vec![self.expect_uident()?];
        while self.check(&Token::Dot) && matches!(self.peek_nth(1), Token::UIdent(_)) {
            self.advance();
            segments.push(self.expect_uident()?);
        }
        Ok(Path::from_segments(segments))
    }

    /// Simple expression followed by field projections and method calls.
    fn parse_simple_postfix(&mut self) -> ParseResult<Expr> {
        let start = self.start();
        let mut expr = self.parse_simple()?;
        loop {
            match (self.peek(), self.peek_nth(1)) {
                (Token::Dot, Token::LIdent(_) | Token::UIdent(_)) => {
                    self.advance();
                    let field = self.parse_label()?;
                    expr = Expr::new(self.loc_from(start), ExprKind::Field { expr, field });
                }
                (Token::Hash, Token::LIdent(_)) => {
                    self.advance();
                    let method = self.expect_lident()?;
                    expr = Expr::new(self.loc_from(start), ExprKind::Send { expr, method });
                }
                _ => return Ok(expr),
            }
        }
    }

    /// A record label, possibly qualified: `f`, `M.f`.
    pub(super) fn parse_label(&mut self) -> ParseResult<Path> {
        let mut segments = Vec::new();
        while matches!(self.peek(), Token::UIdent(_)) {
            segments.push(self.expect_uident()?);
            self.expect(Token::Dot)?;
        }
        segments.push(self.expect_lident()?);
        Ok(Path::from_segments(segments))
    }

    fn parse_simple(&mut self) -> ParseResult<Expr> {
        let start = self.start();
        let kind = match self.peek().clone() {
            Token::LIdent(name) => {
                self.advance();
                ExprKind::Ident(Path::ident(Symbol::from_dynamic(&name)))
            }
            Token::UIdent(_) => return self.parse_module_qualified(),
            Token::Int(n) => {
                self.advance();
                ExprKind::Constant(Constant::Int(n))
            }
            Token::Float(f) => {
                self.advance();
                ExprKind::Constant(Constant::Float(f))
            }
            Token::Char(c) => {
                self.advance();
                ExprKind::Constant(Constant::Char(c))
            }
            Token::Str(s) => {
                self.advance();
                ExprKind::Constant(Constant::String(s))
            }
            Token::True | Token::False => {
                let name = if self.advance().token == Token::True {
                    "true"
                } else {
                    "false"
                };
                return Ok(ctor_expr(self.loc_from(start), name, None));
            }
            Token::Tag(tag) => {
                self.advance();
                ExprKind::Variant {
                    tag: Symbol::from_dynamic(&tag),
                    arg: None,
                }
            }
            Token::LParen => return self.parse_paren_expr(),
            Token::LBracket => return self.parse_list_expr(),
            Token::LArray => {
                self.advance();
                let elements = self.parse_semi_list(&Token::RArray)?;
                ExprKind::Array(elements)
            }
            Token::LBrace => return self.parse_record_expr(),
            Token::LOverride => {
                self.advance();
                let mut fields = Vec::new();
                while !self.check(&Token::ROverride) {
                    let name = self.expect_lident()?;
                    self.expect(Token::Eq)?;
                    fields.push((name, self.parse_expr_nosemi()?));
                    if !self.eat(&Token::Semi) {
                        break;
                    }
                }
                self.expect(Token::ROverride)?;
                ExprKind::Override(fields)
            }
            Token::Begin => {
                self.advance();
                let mark = self.eat_ext_mark();
                if self.eat(&Token::End) {
                    let unit = ctor_expr(self.loc_from(start), "()", None);
                    return Ok(self.wrap_expr_ext(mark, start, unit));
                }
                let inner = self.parse_expr()?;
                self.expect(Token::End)?;
                return Ok(self.wrap_expr_ext(mark, start, inner));
            }
            Token::ExtOpen(_) => {
                let ext = self.parse_extension()?;
                ExprKind::Extension(ext)
            }
            Token::New => {
                self.advance();
                let mut segments = Vec::new();
                while matches!(self.peek(), Token::UIdent(_)) {
                    segments.push(self.expect_uident()?);
                    self.expect(Token::Dot)?;
                }
                segments.push(self.expect_lident()?);
                ExprKind::New(Path::from_segments(segments))
            }
            Token::Object => return self.parse_object(),
            Token::While => {
                self.advance();
                let cond = self.parse_expr()?;
                self.expect(Token::Do)?;
                let body = self.parse_expr()?;
                self.expect(Token::Done)?;
                ExprKind::While { cond, body }
            }
            Token::For => {
                self.advance();
                let var_start = self.start();
                let name = self.expect_lident()?;
                let var = Pattern::new(self.loc_from(var_start), PatternKind::Var(name));
                self.expect(Token::Eq)?;
                let from = self.parse_expr_nosemi()?;
                let direction = match self.peek() {
                    Token::To => ForDirection::Upto,
                    Token::Downto => ForDirection::Downto,
                    _ => return Err(self.unexpected("`to` or `downto`")),
                };
                self.advance();
                let end = self.parse_expr_nosemi()?;
                self.expect(Token::Do)?;
                let body = self.parse_expr()?;
                self.expect(Token::Done)?;
                ExprKind::For {
                    var,
                    start: from,
                    end,
                    direction,
                    body,
                }
            }
            Token::PrefixOp(op) => {
                let op_span = self.advance().span;
                let operand = self.parse_simple()?;
                ExprKind::Apply {
                    func: ident_expr(Location::new(op_span), &op),
                    args: vec![operand],
                }
            }
            _ => return Err(self.unexpected("an expression")),
        };
        Ok(Expr::new(self.loc_from(start), kind))
    }

    /// Long identifiers starting with a module name: `M.x`, `M.( + )`,
    /// `M.(e)` and bare constructors `M.C`.
    fn parse_module_qualified(&mut self) -> ParseResult<Expr> {
        let start = self.start();
        let module = self.parse_long_uident()?;
        if !self.check(&Token::Dot) {
            return Ok(Expr::new(
                self.loc_from(start),
                ExprKind::Construct {
                    ctor: module,
                    arg: None,
                },
            ));
        }
        match self.peek_nth(1).clone() {
            Token::LIdent(name) => {
                self.advance();
                self.advance();
                let path = module.child(Symbol::from_dynamic(&name));
                Ok(Expr::new(self.loc_from(start), ExprKind::Ident(path)))
            }
            Token::LParen => {
                self.advance();
                self.advance();
                if let Some(op) = self.peek_operator_name() {
                    if self.peek_nth(1) == &Token::RParen {
                        self.advance();
                        self.advance();
                        let path = module.child(Symbol::from_dynamic(&op));
                        return Ok(Expr::new(self.loc_from(start), ExprKind::Ident(path)));
                    }
                }
                let body = self.parse_expr()?;
                self.expect(Token::RParen)?;
                Ok(Expr::new(
                    self.loc_from(start),
                    ExprKind::Open { module, body },
                ))
            }
            _ => Err(ParseError::unexpected(
                "a value name or `(` after `.`",
                self.peek_nth(1),
                self.current_span(),
            )),
        }
    }

    /// The operator spelled by the current token, if any: `+`, `::`, `mod`.
    pub(super) fn peek_operator_name(&self) -> Option<String> {
        match self.peek() {
            Token::InfixOp(op) | Token::PrefixOp(op) => Some(op.clone()),
            Token::Eq => Some("=".into()),
            Token::ColonEq => Some(":=".into()),
            Token::ColonColon => Some("::".into()),
            _ => None,
        }
    }

    fn parse_paren_expr(&mut self) -> ParseResult<Expr> {
        let start = self.start();
        self.expect(Token::LParen)?;
        if self.eat(&Token::RParen) {
            return Ok(ctor_expr(self.loc_from(start), "()", None));
        }
        if self.peek_nth(1) == &Token::RParen {
            if let Some(op) = self.peek_operator_name() {
                self.advance();
                self.advance();
                return Ok(ident_expr(self.loc_from(start), &op));
            }
        }
        if self.eat(&Token::Module) {
            let path = self.parse_long_uident()?;
            let module = ModuleExpr {
                loc: self.loc_from(start),
                kind: ModuleExprKind::Ident(path),
            };
            self.expect(Token::RParen)?;
            return Ok(Expr::new(self.loc_from(start), ExprKind::Pack(module)));
        }

        let expr = self.parse_expr()?;
        let kind = match self.peek() {
            Token::Colon => {
                self.advance();
                let ty = self.parse_type()?;
                if self.eat(&Token::ColonGreater) {
                    let to = self.parse_type()?;
                    ExprKind::Coerce {
                        expr,
                        from: Some(ty),
                        to,
                    }
                } else {
                    ExprKind::Constraint { expr, ty }
                }
            }
            Token::ColonGreater => {
                self.advance();
                let to = self.parse_type()?;
                ExprKind::Coerce {
                    expr,
                    from: None,
                    to,
                }
            }
            _ => {
                self.expect(Token::RParen)?;
                return Ok(expr);
            }
        };
        self.expect(Token::RParen)?;
        Ok(Expr::new(self.loc_from(start), kind))
    }

    /// Elements separated by `;` up to `close`, which is consumed.
    fn parse_semi_list(&mut self, close: &Token) -> ParseResult<Vec<Expr>> {
        let mut elements = Vec::new();
        while !self.check(close) {
            elements.push(self.parse_expr_nosemi()?);
            if !self.eat(&Token::Semi) {
                break;
            }
        }
        self.expect(close.clone())?;
        Ok(elements)
    }

    /// `[a; b]` desugars to `a :: b :: []`.
    fn parse_list_expr(&mut self) -> ParseResult<Expr> {
        let start = self.start();
        self.expect(Token::LBracket)?;
        let elements = self.parse_semi_list(&Token::RBracket)?;
        let loc = self.loc_from(start);
        let nil = ctor_expr(
            if elements.is_empty() { loc } else { loc.to_ghost() },
            "[]",
            None,
        );
        Ok(elements.into_iter().rev().fold(nil, |tail, head| {
            let loc = Location::ghost(Span::new(head.loc.span.start, loc.span.end));
            let pair = Expr::new(loc, ExprKind::Tuple(vec![head, tail]));
            ctor_expr(loc, "::", Some(pair))
        }))
    }

    /// Whether a record body starts with a field rather than `e with`.
    fn at_record_field(&self) -> bool {
        let mut i = 0;
        while matches!(self.peek_nth(i), Token::UIdent(_)) && self.peek_nth(i + 1) == &Token::Dot {
            i += 2;
        }
        matches!(self.peek_nth(i), Token::LIdent(_))
            && matches!(
                self.peek_nth(i + 1),
                Token::Eq | Token::Semi | Token::RBrace | Token::Colon
            )
    }

    fn parse_record_expr(&mut self) -> ParseResult<Expr> {
        let start = self.start();
        self.expect(Token::LBrace)?;
        let base = if self.at_record_field() {
            None
        } else {
            let base = self.parse_simple_postfix()?;
            self.expect(Token::With)?;
            Some(base)
        };
        let mut fields = Vec::new();
        while !self.check(&Token::RBrace) {
            let field_start = self.start();
            let label = self.parse_label()?;
            let value = if self.eat(&Token::Eq) {
                self.parse_expr_nosemi()?
            } else {
                // punned `{ x }`
                Expr::new(
                    self.loc_from(field_start),
                    ExprKind::Ident(Path::ident(label.name())),
                )
            };
            fields.push((label, value));
            if !self.eat(&Token::Semi) {
                break;
            }
        }
        self.expect(Token::RBrace)?;
        Ok(Expr::new(
            self.loc_from(start),
            ExprKind::Record { fields, base },
        ))
    }

    fn parse_object(&mut self) -> ParseResult<Expr> {
        let start = self.start();
        self.expect(Token::Object)?;
        let mut fields = Vec::new();
        loop {
            match self.peek() {
                Token::Method => {
                    self.advance();
                    let name = self.expect_lident()?;
                    let params = self.parse_params(&Token::Eq)?;
                    self.expect(Token::Eq)?;
                    let body_start = self.start();
                    let body = self.parse_expr()?;
                    let body = self.build_fun(params, body, body_start);
                    fields.push(ObjectField::Method { name, body });
                }
                Token::Val => {
                    self.advance();
                    let mutable = self.eat(&Token::Mutable);
                    let name = self.expect_lident()?;
                    self.expect(Token::Eq)?;
                    let init = self.parse_expr()?;
                    fields.push(ObjectField::Val {
                        name,
                        mutable,
                        init,
                    });
                }
                _ => break,
            }
        }
        self.expect(Token::End)?;
        Ok(Expr::new(self.loc_from(start), ExprKind::Object(fields)))
    }

    /// `[%name payload]` in expression position. A `?` introduces a
    /// pattern payload, anything else is a structure.
    fn parse_extension(&mut self) -> ParseResult<Extension> {
        let start = self.start();
        let name = match self.advance().token {
            Token::ExtOpen(name) => Symbol::from_dynamic(&name),
            _ => return Err(self.unexpected("an extension node")),
        };
        let payload = if self.eat(&Token::Question) {
            self.parse_pattern_payload()?
        } else if self.check(&Token::RBracket) {
            Payload::Structure(Vec::new())
        } else {
            let item_start = self.start();
            let items = self.parse_structure_items()?;
            if items.is_empty() {
                return Err(ParseError::unexpected(
                    "an extension payload",
                    self.peek(),
                    Span::new(item_start, item_start),
                ));
            }
            Payload::Structure(items)
        };
        self.expect(Token::RBracket)?;
        Ok(Extension {
            loc: self.loc_from(start),
            name,
            payload,
        })
    }

    /// `p [when e]` inside `[%name? ...]` or `[%name ...]` patterns.
    pub(super) fn parse_pattern_payload(&mut self) -> ParseResult<Payload> {
        let pat = self.parse_pattern()?;
        let guard = if self.eat(&Token::When) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(Payload::Pattern { pat, guard })
    }

    // ========================================================================
    // Open constructs
    // ========================================================================

    fn parse_let(&mut self) -> ParseResult<Expr> {
        let start = self.start();
        self.expect(Token::Let)?;
        let mut mark = self.eat_ext_mark();
        let kind = match self.peek() {
            Token::Open => {
                self.advance();
                let module = self.parse_long_uident()?;
                self.expect(Token::In)?;
                let body = self.parse_expr()?;
                ExprKind::Open { module, body }
            }
            Token::Module => {
                self.advance();
                let name = self.expect_uident()?;
                self.expect(Token::Eq)?;
                let module = self.parse_module_expr()?;
                self.expect(Token::In)?;
                let body = self.parse_expr()?;
                ExprKind::LetModule { name, module, body }
            }
            Token::Exception => {
                self.advance();
                // `let exception%ext E in e` is `[%ext let exception E in e]`.
                if mark.is_none() {
                    mark = self.eat_ext_mark();
                }
                let ctor = self.parse_extension_constructor()?;
                self.expect(Token::In)?;
                let body = self.parse_expr()?;
                ExprKind::LetException { ctor, body }
            }
            _ => {
                let (rec_flag, bindings) = self.parse_let_bindings()?;
                self.expect(Token::In)?;
                let body = self.parse_expr()?;
                ExprKind::Let {
                    rec_flag,
                    bindings,
                    body,
                }
            }
        };
        let expr = Expr::new(self.loc_from(start), kind);
        Ok(self.wrap_expr_ext(mark, start, expr))
    }

    /// `[rec] binding and binding ...`, after the `let` keyword.
    pub(super) fn parse_let_bindings(&mut self) -> ParseResult<(RecFlag, Vec<ValueBinding>)> {
        let rec_flag = if self.eat(&Token::Rec) {
            RecFlag::Recursive
        } else {
            RecFlag::Nonrecursive
        };
        let mut bindings = vec![self.parse_binding()?];
        while self.eat(&Token::And) {
            bindings.push(self.parse_binding()?);
        }
        Ok((rec_flag, bindings))
    }

    /// Start of a value name: `f` or `( op )`.
    fn at_value_name(&self) -> Option<usize> {
        match self.peek() {
            Token::LIdent(_) => Some(1),
            Token::LParen if self.peek_nth(2) == &Token::RParen => matches!(
                self.peek_nth(1),
                Token::InfixOp(_) | Token::PrefixOp(_) | Token::ColonEq | Token::Eq
            )
            .then_some(3),
            _ => None,
        }
    }

    fn parse_binding(&mut self) -> ParseResult<ValueBinding> {
        let start = self.start();
        let function_sugar = self.at_value_name().is_some_and(|len| {
            let next = self.peek_nth(len);
            matches!(next, Token::Eq | Token::Colon) || super::pattern::starts_simple_pattern(next)
        });

        if !function_sugar {
            let mut pat = self.parse_pattern()?;
            if self.eat(&Token::Colon) {
                let ty = self.parse_type()?;
                pat = Pattern::new(self.loc_from(start), PatternKind::Constraint { pat, ty });
            }
            self.expect(Token::Eq)?;
            let expr = self.parse_expr()?;
            return Ok(ValueBinding {
                loc: self.loc_from(start),
                pat,
                expr,
            });
        }

        let name = match self.peek().clone() {
            Token::LIdent(name) => {
                self.advance();
                Symbol::from_dynamic(&name)
            }
            _ => {
                self.advance();
                let op = self
                    .peek_operator_name()
                    .ok_or_else(|| self.unexpected("an operator"))?;
                self.advance();
                self.expect(Token::RParen)?;
                Symbol::from_dynamic(&op)
            }
        };
        let pat = Pattern::new(self.loc_from(start), PatternKind::Var(name));
        let params = self.parse_params(&Token::Eq)?;
        let result_ty = if self.eat(&Token::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };
        self.expect(Token::Eq)?;
        let body_start = self.start();
        let mut body = self.parse_expr()?;
        if let Some(ty) = result_ty {
            body = Expr::new(body.loc, ExprKind::Constraint { expr: body, ty });
        }
        let expr = self.build_fun(params, body, body_start);
        Ok(ValueBinding {
            loc: self.loc_from(start),
            pat,
            expr,
        })
    }

    /// Function parameters up to (not including) `stop` or `:`.
    fn parse_params(&mut self, stop: &Token) -> ParseResult<Vec<Param>> {
        let mut params = Vec::new();
        while !self.check(stop) && !self.check(&Token::Colon) {
            if self.check(&Token::LParen) && self.peek_nth(1) == &Token::Type {
                self.advance();
                self.advance();
                let mut names = vec![self.expect_lident()?];
                while matches!(self.peek(), Token::LIdent(_)) {
                    names.push(self.expect_lident()?);
                }
                self.expect(Token::RParen)?;
                params.push(Param::Types(names));
            } else if super::pattern::starts_simple_pattern(self.peek()) {
                params.push(Param::Pat(self.parse_simple_pattern()?));
            } else {
                return Err(self.unexpected(stop.to_string()));
            }
        }
        Ok(params)
    }

    /// Curry `params` over `body`, one `fun` node per parameter.
    fn build_fun(&self, params: Vec<Param>, body: Expr, start: usize) -> Expr {
        let loc = self.loc_from(start).to_ghost();
        params.into_iter().rev().fold(body, |body, param| match param {
            Param::Pat(param) => Expr::new(loc, ExprKind::Fun { param, body }),
            Param::Types(names) => names.into_iter().rev().fold(body, |body, name| {
                Expr::new(loc, ExprKind::Newtype { name, body })
            }),
        })
    }

    fn parse_fun(&mut self) -> ParseResult<Expr> {
        let start = self.start();
        self.expect(Token::Fun)?;
        let mark = self.eat_ext_mark();
        let params = self.parse_params(&Token::Arrow)?;
        if params.is_empty() {
            return Err(self.unexpected("a parameter"));
        }
        self.expect(Token::Arrow)?;
        let body = self.parse_expr()?;
        let loc = self.loc_from(start);
        let mut expr = self.build_fun(params, body, start);
        expr.loc = loc;
        Ok(self.wrap_expr_ext(mark, start, expr))
    }

    fn parse_function(&mut self) -> ParseResult<Expr> {
        let start = self.start();
        self.expect(Token::Function)?;
        let mark = self.eat_ext_mark();
        let cases = self.parse_cases()?;
        let expr = Expr::new(self.loc_from(start), ExprKind::Function(cases));
        Ok(self.wrap_expr_ext(mark, start, expr))
    }

    fn parse_match(&mut self) -> ParseResult<Expr> {
        let start = self.start();
        self.expect(Token::Match)?;
        let mark = self.eat_ext_mark();
        let scrutinee = self.parse_expr()?;
        self.expect(Token::With)?;
        let cases = self.parse_cases()?;
        let expr = Expr::new(
            self.loc_from(start),
            ExprKind::Match { scrutinee, cases },
        );
        Ok(self.wrap_expr_ext(mark, start, expr))
    }

    fn parse_try(&mut self) -> ParseResult<Expr> {
        let start = self.start();
        self.expect(Token::Try)?;
        let mark = self.eat_ext_mark();
        let body = self.parse_expr()?;
        self.expect(Token::With)?;
        let cases = self.parse_cases()?;
        let expr = Expr::new(self.loc_from(start), ExprKind::Try { body, cases });
        Ok(self.wrap_expr_ext(mark, start, expr))
    }

    fn parse_if(&mut self) -> ParseResult<Expr> {
        let start = self.start();
        self.expect(Token::If)?;
        let mark = self.eat_ext_mark();
        let cond = self.parse_expr_nosemi()?;
        self.expect(Token::Then)?;
        let then_branch = self.parse_expr_nosemi()?;
        let else_branch = if self.eat(&Token::Else) {
            Some(self.parse_expr_nosemi()?)
        } else {
            None
        };
        let expr = Expr::new(
            self.loc_from(start),
            ExprKind::IfThenElse {
                cond,
                then_branch,
                else_branch,
            },
        );
        Ok(self.wrap_expr_ext(mark, start, expr))
    }

    /// `[|] case | case ...`
    pub(super) fn parse_cases(&mut self) -> ParseResult<Vec<Case>> {
        self.eat(&Token::Bar);
        let mut cases = vec![self.parse_case()?];
        while self.eat(&Token::Bar) {
            cases.push(self.parse_case()?);
        }
        Ok(cases)
    }

    fn parse_case(&mut self) -> ParseResult<Case> {
        let lhs = self.parse_pattern()?;
        let guard = if self.eat(&Token::When) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(Token::Arrow)?;
        let rhs = self.parse_expr()?;
        Ok(Case::new(lhs, guard, rhs))
    }
}
