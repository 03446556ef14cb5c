//! Source printer.
//!
//! Every node kind has a [`Display`](std::fmt::Display) implementation.
//! Parentheses are inserted from the levels in [`crate::precedence`], so
//! the printed text parses back to the same tree (up to locations and
//! list/`fun` sugar).
//!
//! Open constructs (`let`, `match`, `fun`, ...) are only printed bare in
//! tail position, where nothing can follow them and be captured by
//! their last branch.

use std::fmt::{self, Write};

use effmatch_core::Symbol;

use crate::ast::*;
use crate::precedence::{
    self, APP, ASSIGN, Assoc, CONS, OPEN, OR, SEQ, SIMPLE, TUPLE, UNARY,
};

// Pattern levels
const P_ALIAS: u8 = 0;
const P_OR: u8 = 1;
const P_TUPLE: u8 = 2;
const P_CONS: u8 = 3;
const P_APP: u8 = 4;
const P_SIMPLE: u8 = 5;

// Type levels
const T_ARROW: u8 = 0;
const T_TUPLE: u8 = 1;
const T_APP: u8 = 2;
const T_SIMPLE: u8 = 3;

const KEYWORD_OPERATORS: [&str; 8] = ["mod", "land", "lor", "lxor", "lsl", "lsr", "asr", "or"];

/// Render a compilation unit, one item per line.
pub fn print_structure(items: &[StructureItem]) -> String {
    let mut out = String::new();
    // Writing into a `String` cannot fail.
    let _ = Printer::new(&mut out).structure(items);
    out
}

/// How an application node is spelled.
enum ApplyForm {
    Infix(String, u8, Assoc),
    Negate(&'static str),
    Prefix(String),
    Plain,
}

fn operator_name(func: &Expr) -> Option<String> {
    match &*func.kind {
        ExprKind::Ident(path) if path.qualifier().is_empty() => {
            Some(path.name().with_str(str::to_string))
        }
        _ => None,
    }
}

fn apply_form(func: &Expr, args: &[Expr]) -> ApplyForm {
    let Some(name) = operator_name(func) else {
        return ApplyForm::Plain;
    };
    match args.len() {
        2 => match precedence::infix(&name) {
            Some((level, assoc)) => ApplyForm::Infix(name, level, assoc),
            None => ApplyForm::Plain,
        },
        1 if name == "~-" => ApplyForm::Negate("-"),
        1 if name == "~-." => ApplyForm::Negate("-."),
        1 if (name.starts_with('!') && name != "!=") || name.starts_with('~') => {
            ApplyForm::Prefix(name)
        }
        _ => ApplyForm::Plain,
    }
}

/// Elements of a `a :: b :: []` chain, if it is one.
fn list_elements(expr: &Expr) -> Option<Vec<&Expr>> {
    let mut elements = Vec::new();
    let mut cursor = expr;
    loop {
        match &*cursor.kind {
            ExprKind::Construct { ctor, arg: None } if ctor.is_ident("[]") => {
                return Some(elements);
            }
            ExprKind::Construct {
                ctor,
                arg: Some(arg),
            } if ctor.is_ident("::") => match &*arg.kind {
                ExprKind::Tuple(pair) if pair.len() == 2 => {
                    elements.push(&pair[0]);
                    cursor = &pair[1];
                }
                _ => return None,
            },
            _ => return None,
        }
    }
}

fn cons_pair<'a>(ctor: &Path, arg: &'a Expr) -> Option<(&'a Expr, &'a Expr)> {
    match &*arg.kind {
        ExprKind::Tuple(pair) if ctor.is_ident("::") && pair.len() == 2 => {
            Some((&pair[0], &pair[1]))
        }
        _ => None,
    }
}

fn expr_level(expr: &Expr) -> u8 {
    match &*expr.kind {
        ExprKind::Sequence { .. } => SEQ,
        ExprKind::Let { .. }
        | ExprKind::Function(_)
        | ExprKind::Fun { .. }
        | ExprKind::Match { .. }
        | ExprKind::Try { .. }
        | ExprKind::IfThenElse { .. }
        | ExprKind::LetModule { .. }
        | ExprKind::LetException { .. }
        | ExprKind::Newtype { .. } => OPEN,
        ExprKind::SetField { .. } | ExprKind::SetInstVar { .. } => ASSIGN,
        ExprKind::Tuple(_) => TUPLE,
        ExprKind::Apply { func, args } => match apply_form(func, args) {
            ApplyForm::Infix(_, level, _) => level,
            ApplyForm::Negate(_) => UNARY,
            ApplyForm::Prefix(_) => SIMPLE,
            ApplyForm::Plain => APP,
        },
        ExprKind::Construct {
            ctor,
            arg: Some(arg),
        } => {
            if list_elements(expr).is_some() {
                SIMPLE
            } else if cons_pair(ctor, arg).is_some() {
                CONS
            } else {
                APP
            }
        }
        ExprKind::Variant { arg: Some(_), .. }
        | ExprKind::Assert(_)
        | ExprKind::Lazy(_)
        | ExprKind::New(_) => APP,
        ExprKind::Constant(Constant::Int(n)) if *n < 0 => UNARY,
        ExprKind::Constant(Constant::Float(f)) if f.starts_with('-') => UNARY,
        _ => SIMPLE,
    }
}

fn pattern_list_elements(pat: &Pattern) -> Option<Vec<&Pattern>> {
    let mut elements = Vec::new();
    let mut cursor = pat;
    loop {
        match &*cursor.kind {
            PatternKind::Construct { ctor, arg: None } if ctor.is_ident("[]") => {
                return Some(elements);
            }
            PatternKind::Construct {
                ctor,
                arg: Some(arg),
            } if ctor.is_ident("::") => match &*arg.kind {
                PatternKind::Tuple(pair) if pair.len() == 2 => {
                    elements.push(&pair[0]);
                    cursor = &pair[1];
                }
                _ => return None,
            },
            _ => return None,
        }
    }
}

fn pattern_level(pat: &Pattern) -> u8 {
    match &*pat.kind {
        PatternKind::Alias { .. } => P_ALIAS,
        PatternKind::Or(..) => P_OR,
        PatternKind::Tuple(_) => P_TUPLE,
        PatternKind::Construct {
            ctor,
            arg: Some(arg),
        } => {
            if pattern_list_elements(pat).is_some() {
                P_SIMPLE
            } else if ctor.is_ident("::") && matches!(&*arg.kind, PatternKind::Tuple(p) if p.len() == 2)
            {
                P_CONS
            } else {
                P_APP
            }
        }
        PatternKind::Variant { arg: Some(_), .. }
        | PatternKind::Exception(_)
        | PatternKind::Lazy(_) => P_APP,
        PatternKind::Constant(Constant::Int(n)) if *n < 0 => P_APP,
        PatternKind::Constant(Constant::Float(f)) if f.starts_with('-') => P_APP,
        _ => P_SIMPLE,
    }
}

fn type_level(ty: &CoreType) -> u8 {
    match &*ty.kind {
        CoreTypeKind::Arrow(..) => T_ARROW,
        CoreTypeKind::Tuple(_) => T_TUPLE,
        CoreTypeKind::Constr { args, .. } if !args.is_empty() => T_APP,
        _ => T_SIMPLE,
    }
}

struct Printer<'a> {
    out: &'a mut dyn Write,
    indent: usize,
}

impl<'a> Printer<'a> {
    fn new(out: &'a mut dyn Write) -> Self {
        Self { out, indent: 0 }
    }

    fn text(&mut self, s: &str) -> fmt::Result {
        self.out.write_str(s)
    }

    fn newline(&mut self) -> fmt::Result {
        self.out.write_char('\n')?;
        for _ in 0..self.indent {
            self.out.write_char(' ')?;
        }
        Ok(())
    }

    fn indented(&mut self, by: usize, f: impl FnOnce(&mut Self) -> fmt::Result) -> fmt::Result {
        self.indent += by;
        let result = f(self);
        self.indent -= by;
        result
    }

    fn parens_if(&mut self, cond: bool, f: impl FnOnce(&mut Self) -> fmt::Result) -> fmt::Result {
        if cond {
            self.text("(")?;
            f(self)?;
            self.text(")")
        } else {
            f(self)
        }
    }

    fn sep<T>(
        &mut self,
        items: &[T],
        sep: &str,
        mut f: impl FnMut(&mut Self, &T) -> fmt::Result,
    ) -> fmt::Result {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.text(sep)?;
            }
            f(self, item)?;
        }
        Ok(())
    }

    // ========================================================================
    // Names and constants
    // ========================================================================

    fn value_name(&mut self, name: Symbol) -> fmt::Result {
        if name.is_operator() || name.with_str(|s| KEYWORD_OPERATORS.contains(&s)) {
            write!(self.out, "( {name} )")
        } else {
            write!(self.out, "{name}")
        }
    }

    fn value_path(&mut self, path: &Path) -> fmt::Result {
        for qualifier in path.qualifier() {
            write!(self.out, "{qualifier}.")?;
        }
        self.value_name(path.name())
    }

    fn escaped(&mut self, c: char, quote: char) -> fmt::Result {
        match c {
            '\n' => self.text("\\n"),
            '\t' => self.text("\\t"),
            '\r' => self.text("\\r"),
            '\u{8}' => self.text("\\b"),
            '\\' => self.text("\\\\"),
            c if c == quote => write!(self.out, "\\{c}"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => write!(self.out, "\\{:03}", c as u32),
            c => self.out.write_char(c),
        }
    }

    fn constant(&mut self, constant: &Constant) -> fmt::Result {
        match constant {
            Constant::Int(n) => write!(self.out, "{n}"),
            Constant::Float(f) => self.text(f),
            Constant::Char(c) => {
                self.text("'")?;
                self.escaped(*c, '\'')?;
                self.text("'")
            }
            Constant::String(s) => {
                self.text("\"")?;
                for c in s.chars() {
                    self.escaped(c, '"')?;
                }
                self.text("\"")
            }
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn expr(&mut self, expr: &Expr, min: u8) -> fmt::Result {
        self.parens_if(expr_level(expr) < min, |p| p.expr_bare(expr))
    }

    fn expr_bare(&mut self, expr: &Expr) -> fmt::Result {
        match &*expr.kind {
            ExprKind::Ident(path) => self.value_path(path),
            ExprKind::Constant(c) => self.constant(c),
            ExprKind::Let {
                rec_flag,
                bindings,
                body,
            } => {
                self.let_bindings(*rec_flag, bindings)?;
                self.text(" in")?;
                self.newline()?;
                self.expr(body, SEQ)
            }
            ExprKind::Function(cases) => {
                self.text("function")?;
                self.cases(cases)
            }
            ExprKind::Fun { .. } | ExprKind::Newtype { .. } => self.fun(expr),
            ExprKind::Apply { func, args } => self.apply(func, args),
            ExprKind::Match { scrutinee, cases } => {
                self.text("match ")?;
                self.expr(scrutinee, ASSIGN)?;
                self.text(" with")?;
                self.cases(cases)
            }
            ExprKind::Try { body, cases } => {
                self.text("try ")?;
                self.expr(body, ASSIGN)?;
                self.text(" with")?;
                self.cases(cases)
            }
            ExprKind::Tuple(elements) => self.sep(elements, ", ", |p, e| p.expr(e, OR)),
            ExprKind::Construct { ctor, arg } => self.construct(expr, ctor, arg.as_ref()),
            ExprKind::Variant { tag, arg } => {
                write!(self.out, "`{tag}")?;
                if let Some(arg) = arg {
                    self.text(" ")?;
                    self.expr(arg, SIMPLE)?;
                }
                Ok(())
            }
            ExprKind::Record { fields, base } => {
                self.text("{ ")?;
                if let Some(base) = base {
                    self.expr(base, SIMPLE)?;
                    self.text(" with ")?;
                }
                self.sep(fields, "; ", |p, (label, value)| {
                    write!(p.out, "{label} = ")?;
                    p.indented(2, |p| p.expr(value, OR))
                })?;
                self.text(" }")
            }
            ExprKind::Field { expr, field } => {
                self.expr(expr, SIMPLE)?;
                write!(self.out, ".{field}")
            }
            ExprKind::SetField { expr, field, value } => {
                self.expr(expr, SIMPLE)?;
                write!(self.out, ".{field} <- ")?;
                self.expr(value, ASSIGN)
            }
            ExprKind::Array(elements) => {
                if elements.is_empty() {
                    return self.text("[||]");
                }
                self.text("[| ")?;
                self.sep(elements, "; ", |p, e| p.expr(e, OR))?;
                self.text(" |]")
            }
            ExprKind::IfThenElse {
                cond,
                then_branch,
                else_branch,
            } => {
                self.text("if ")?;
                self.expr(cond, ASSIGN)?;
                self.text(" then ")?;
                self.expr(then_branch, ASSIGN)?;
                if let Some(else_branch) = else_branch {
                    self.text(" else ")?;
                    self.expr(else_branch, ASSIGN)?;
                }
                Ok(())
            }
            ExprKind::Sequence { first, second } => {
                self.expr(first, ASSIGN)?;
                self.text(";")?;
                self.newline()?;
                self.expr(second, SEQ)
            }
            ExprKind::While { cond, body } => {
                self.text("while ")?;
                self.expr(cond, SEQ)?;
                self.text(" do")?;
                self.indented(2, |p| {
                    p.newline()?;
                    p.expr(body, SEQ)
                })?;
                self.newline()?;
                self.text("done")
            }
            ExprKind::For {
                var,
                start,
                end,
                direction,
                body,
            } => {
                self.text("for ")?;
                self.pattern(var, P_SIMPLE)?;
                self.text(" = ")?;
                self.expr(start, ASSIGN)?;
                self.text(match direction {
                    ForDirection::Upto => " to ",
                    ForDirection::Downto => " downto ",
                })?;
                self.expr(end, ASSIGN)?;
                self.text(" do")?;
                self.indented(2, |p| {
                    p.newline()?;
                    p.expr(body, SEQ)
                })?;
                self.newline()?;
                self.text("done")
            }
            ExprKind::Constraint { expr, ty } => {
                self.text("(")?;
                self.expr(expr, SEQ)?;
                self.text(" : ")?;
                self.core_type(ty, T_ARROW)?;
                self.text(")")
            }
            ExprKind::Coerce { expr, from, to } => {
                self.text("(")?;
                self.expr(expr, SEQ)?;
                if let Some(from) = from {
                    self.text(" : ")?;
                    self.core_type(from, T_ARROW)?;
                }
                self.text(" :> ")?;
                self.core_type(to, T_ARROW)?;
                self.text(")")
            }
            ExprKind::Send { expr, method } => {
                self.expr(expr, SIMPLE)?;
                write!(self.out, "#{method}")
            }
            ExprKind::New(path) => write!(self.out, "new {path}"),
            ExprKind::SetInstVar { name, value } => {
                write!(self.out, "{name} <- ")?;
                self.expr(value, ASSIGN)
            }
            ExprKind::Override(fields) => {
                self.text("{< ")?;
                self.sep(fields, "; ", |p, (name, value)| {
                    write!(p.out, "{name} = ")?;
                    p.expr(value, OR)
                })?;
                self.text(" >}")
            }
            ExprKind::LetModule { name, module, body } => {
                write!(self.out, "let module {name} = ")?;
                self.module_expr(module)?;
                self.text(" in")?;
                self.newline()?;
                self.expr(body, SEQ)
            }
            ExprKind::LetException { ctor, body } => {
                self.text("let exception ")?;
                self.extension_constructor(ctor)?;
                self.text(" in")?;
                self.newline()?;
                self.expr(body, SEQ)
            }
            ExprKind::Assert(e) => {
                self.text("assert ")?;
                self.expr(e, SIMPLE)
            }
            ExprKind::Lazy(e) => {
                self.text("lazy ")?;
                self.expr(e, SIMPLE)
            }
            ExprKind::Object(fields) => {
                self.text("object")?;
                self.indented(2, |p| {
                    for field in fields {
                        p.newline()?;
                        match field {
                            ObjectField::Method { name, body } => {
                                write!(p.out, "method {name} = ")?;
                                p.expr(body, SEQ)?;
                            }
                            ObjectField::Val {
                                name,
                                mutable,
                                init,
                            } => {
                                p.text("val ")?;
                                if *mutable {
                                    p.text("mutable ")?;
                                }
                                write!(p.out, "{name} = ")?;
                                p.expr(init, SEQ)?;
                            }
                        }
                    }
                    Ok(())
                })?;
                self.newline()?;
                self.text("end")
            }
            ExprKind::Pack(module) => {
                self.text("(module ")?;
                self.module_expr(module)?;
                self.text(")")
            }
            ExprKind::Open { module, body } => {
                write!(self.out, "{module}.(")?;
                self.expr(body, SEQ)?;
                self.text(")")
            }
            ExprKind::Extension(ext) => self.extension(ext, "%"),
        }
    }

    fn construct(&mut self, whole: &Expr, ctor: &Path, arg: Option<&Expr>) -> fmt::Result {
        let Some(arg) = arg else {
            return write!(self.out, "{ctor}");
        };
        if let Some(elements) = list_elements(whole) {
            self.text("[")?;
            self.sep(&elements, "; ", |p, e| p.expr(e, OR))?;
            return self.text("]");
        }
        if let Some((head, tail)) = cons_pair(ctor, arg) {
            self.expr(head, CONS + 1)?;
            self.text(" :: ")?;
            return self.expr(tail, CONS);
        }
        write!(self.out, "{ctor} ")?;
        self.expr(arg, SIMPLE)
    }

    fn apply(&mut self, func: &Expr, args: &[Expr]) -> fmt::Result {
        match apply_form(func, args) {
            ApplyForm::Infix(op, level, assoc) => {
                let (lhs_min, rhs_min) = match assoc {
                    Assoc::Left => (level, level + 1),
                    Assoc::Right => (level + 1, level),
                };
                self.expr(&args[0], lhs_min)?;
                write!(self.out, " {op} ")?;
                self.expr(&args[1], rhs_min)
            }
            ApplyForm::Negate(op) => {
                self.text(op)?;
                self.expr(&args[0], APP)
            }
            ApplyForm::Prefix(op) => {
                self.text(&op)?;
                self.expr(&args[0], SIMPLE)
            }
            ApplyForm::Plain => {
                self.expr(func, SIMPLE)?;
                for arg in args {
                    self.text(" ")?;
                    self.expr(arg, SIMPLE)?;
                }
                Ok(())
            }
        }
    }

    /// `fun p1 (type a) p2 -> body`, merging directly nested parameters.
    fn fun(&mut self, expr: &Expr) -> fmt::Result {
        self.text("fun")?;
        let mut body = expr;
        loop {
            match &*body.kind {
                ExprKind::Fun { param, body: inner } => {
                    self.text(" ")?;
                    self.pattern(param, P_SIMPLE)?;
                    body = inner;
                }
                ExprKind::Newtype { name, body: inner } => {
                    write!(self.out, " (type {name})")?;
                    body = inner;
                }
                _ => break,
            }
        }
        self.text(" ->")?;
        self.indented(2, |p| {
            p.newline()?;
            p.expr(body, SEQ)
        })
    }

    fn cases(&mut self, cases: &[Case]) -> fmt::Result {
        let last = cases.len().saturating_sub(1);
        for (i, case) in cases.iter().enumerate() {
            self.newline()?;
            self.text("| ")?;
            self.pattern(&case.lhs, P_ALIAS)?;
            if let Some(guard) = &case.guard {
                self.text(" when ")?;
                self.expr(guard, ASSIGN)?;
            }
            self.text(" ->")?;
            let min = if i == last { SEQ } else { ASSIGN };
            self.indented(4, |p| {
                p.newline()?;
                p.expr(&case.rhs, min)
            })?;
        }
        Ok(())
    }

    fn let_bindings(&mut self, rec_flag: RecFlag, bindings: &[ValueBinding]) -> fmt::Result {
        self.text("let ")?;
        if rec_flag == RecFlag::Recursive {
            self.text("rec ")?;
        }
        for (i, binding) in bindings.iter().enumerate() {
            if i > 0 {
                self.newline()?;
                self.text("and ")?;
            }
            self.pattern(&binding.pat, P_ALIAS)?;
            if expr_level(&binding.expr) <= OPEN {
                self.text(" =")?;
                self.indented(2, |p| {
                    p.newline()?;
                    p.expr(&binding.expr, SEQ)
                })?;
            } else {
                self.text(" = ")?;
                self.expr(&binding.expr, SEQ)?;
            }
        }
        Ok(())
    }

    fn extension(&mut self, ext: &Extension, marker: &str) -> fmt::Result {
        write!(self.out, "[{marker}{}", ext.name)?;
        match &ext.payload {
            Payload::Structure(items) if items.is_empty() => {}
            Payload::Structure(items) => {
                self.text(" ")?;
                self.structure(items)?;
            }
            Payload::Pattern { pat, guard } => {
                self.text("? ")?;
                self.pattern(pat, P_ALIAS)?;
                if let Some(guard) = guard {
                    self.text(" when ")?;
                    self.expr(guard, ASSIGN)?;
                }
            }
        }
        self.text("]")
    }

    // ========================================================================
    // Patterns
    // ========================================================================

    fn pattern(&mut self, pat: &Pattern, min: u8) -> fmt::Result {
        self.parens_if(pattern_level(pat) < min, |p| p.pattern_bare(pat))
    }

    fn pattern_bare(&mut self, pat: &Pattern) -> fmt::Result {
        match &*pat.kind {
            PatternKind::Any => self.text("_"),
            PatternKind::Var(name) => self.value_name(*name),
            PatternKind::Alias { pat, name } => {
                self.pattern(pat, P_ALIAS)?;
                write!(self.out, " as {name}")
            }
            PatternKind::Constant(c) => self.constant(c),
            PatternKind::Tuple(elements) => self.sep(elements, ", ", |p, e| p.pattern(e, P_CONS)),
            PatternKind::Construct { ctor, arg } => {
                let Some(arg) = arg else {
                    return write!(self.out, "{ctor}");
                };
                if let Some(elements) = pattern_list_elements(pat) {
                    self.text("[")?;
                    self.sep(&elements, "; ", |p, e| p.pattern(e, P_ALIAS))?;
                    return self.text("]");
                }
                match &*arg.kind {
                    PatternKind::Tuple(pair) if ctor.is_ident("::") && pair.len() == 2 => {
                        self.pattern(&pair[0], P_APP)?;
                        self.text(" :: ")?;
                        self.pattern(&pair[1], P_CONS)
                    }
                    _ => {
                        write!(self.out, "{ctor} ")?;
                        self.pattern(arg, P_SIMPLE)
                    }
                }
            }
            PatternKind::Variant { tag, arg } => {
                write!(self.out, "`{tag}")?;
                if let Some(arg) = arg {
                    self.text(" ")?;
                    self.pattern(arg, P_SIMPLE)?;
                }
                Ok(())
            }
            PatternKind::Record { fields, closed } => {
                self.text("{ ")?;
                self.sep(fields, "; ", |p, (label, pat)| {
                    write!(p.out, "{label} = ")?;
                    p.pattern(pat, P_ALIAS)
                })?;
                if !closed {
                    self.text(if fields.is_empty() { "_" } else { "; _" })?;
                }
                self.text(" }")
            }
            PatternKind::Array(elements) => {
                if elements.is_empty() {
                    return self.text("[||]");
                }
                self.text("[| ")?;
                self.sep(elements, "; ", |p, e| p.pattern(e, P_ALIAS))?;
                self.text(" |]")
            }
            PatternKind::Or(lhs, rhs) => {
                self.pattern(lhs, P_OR)?;
                self.text(" | ")?;
                self.pattern(rhs, P_TUPLE)
            }
            PatternKind::Constraint { pat, ty } => {
                self.text("(")?;
                self.pattern(pat, P_ALIAS)?;
                self.text(" : ")?;
                self.core_type(ty, T_ARROW)?;
                self.text(")")
            }
            PatternKind::Lazy(inner) => {
                self.text("lazy ")?;
                self.pattern(inner, P_SIMPLE)
            }
            PatternKind::Exception(inner) => {
                self.text("exception ")?;
                self.pattern(inner, P_APP)
            }
            PatternKind::Extension(ext) => self.extension(ext, "%"),
        }
    }

    // ========================================================================
    // Types
    // ========================================================================

    fn core_type(&mut self, ty: &CoreType, min: u8) -> fmt::Result {
        self.parens_if(type_level(ty) < min, |p| p.core_type_bare(ty))
    }

    fn core_type_bare(&mut self, ty: &CoreType) -> fmt::Result {
        match &*ty.kind {
            CoreTypeKind::Any => self.text("_"),
            CoreTypeKind::Var(name) => write!(self.out, "'{name}"),
            CoreTypeKind::Arrow(param, result) => {
                self.core_type(param, T_TUPLE)?;
                self.text(" -> ")?;
                self.core_type(result, T_ARROW)
            }
            CoreTypeKind::Tuple(elements) => {
                self.sep(elements, " * ", |p, t| p.core_type(t, T_APP))
            }
            CoreTypeKind::Constr { path, args } => {
                self.type_args(args)?;
                write!(self.out, "{path}")
            }
        }
    }

    /// Arguments in front of a type constructor, with a trailing space.
    fn type_args(&mut self, args: &[CoreType]) -> fmt::Result {
        match args {
            [] => Ok(()),
            [arg] => {
                self.core_type(arg, T_APP)?;
                self.text(" ")
            }
            args => {
                self.text("(")?;
                self.sep(args, ", ", |p, t| p.core_type(t, T_ARROW))?;
                self.text(") ")
            }
        }
    }

    /// ` of a * b`, ` : a -> r` or nothing.
    fn constructor_arguments(&mut self, args: &[CoreType], result: Option<&CoreType>) -> fmt::Result {
        match (args, result) {
            ([], None) => Ok(()),
            (args, None) => {
                self.text(" of ")?;
                self.sep(args, " * ", |p, t| p.core_type(t, T_APP))
            }
            ([], Some(result)) => {
                self.text(" : ")?;
                self.core_type(result, T_ARROW)
            }
            (args, Some(result)) => {
                self.text(" : ")?;
                self.sep(args, " * ", |p, t| p.core_type(t, T_APP))?;
                self.text(" -> ")?;
                self.core_type(result, T_ARROW)
            }
        }
    }

    // ========================================================================
    // Structure items
    // ========================================================================

    fn structure(&mut self, items: &[StructureItem]) -> fmt::Result {
        let mut after_eval = false;
        for (i, item) in items.iter().enumerate() {
            let is_eval = matches!(item.kind, StructureItemKind::Eval(_));
            if i > 0 {
                self.newline()?;
                if is_eval || after_eval {
                    self.text(";; ")?;
                }
            }
            self.structure_item(item)?;
            after_eval = is_eval;
        }
        Ok(())
    }

    fn structure_item(&mut self, item: &StructureItem) -> fmt::Result {
        match &item.kind {
            StructureItemKind::Eval(expr) => self.expr(expr, SEQ),
            StructureItemKind::Value { rec_flag, bindings } => {
                self.let_bindings(*rec_flag, bindings)
            }
            StructureItemKind::Type(decls) => {
                for (i, decl) in decls.iter().enumerate() {
                    if i > 0 {
                        self.newline()?;
                    }
                    self.text(if i == 0 { "type " } else { "and " })?;
                    self.type_declaration(decl)?;
                }
                Ok(())
            }
            StructureItemKind::TypeExtension(ext) => {
                self.text("type ")?;
                self.type_args(&ext.params)?;
                write!(self.out, "{} +=", ext.path)?;
                for ctor in &ext.constructors {
                    self.indented(2, |p| {
                        p.newline()?;
                        p.text("| ")?;
                        p.extension_constructor(ctor)
                    })?;
                }
                Ok(())
            }
            StructureItemKind::Exception(ctor) => {
                self.text("exception ")?;
                self.extension_constructor(ctor)
            }
            StructureItemKind::Module { name, expr } => {
                write!(self.out, "module {name} = ")?;
                self.module_expr(expr)
            }
            StructureItemKind::Open(path) => write!(self.out, "open {path}"),
            StructureItemKind::Extension(ext) => self.extension(ext, "%%"),
        }
    }

    fn type_declaration(&mut self, decl: &TypeDeclaration) -> fmt::Result {
        self.type_args(&decl.params)?;
        write!(self.out, "{}", decl.name)?;
        if let Some(manifest) = &decl.manifest {
            self.text(" = ")?;
            self.core_type(manifest, T_ARROW)?;
        }
        match &decl.kind {
            TypeDeclarationKind::Abstract => Ok(()),
            TypeDeclarationKind::Open => self.text(" = .."),
            TypeDeclarationKind::Variant(ctors) => {
                self.text(" =")?;
                self.indented(2, |p| {
                    for ctor in ctors {
                        p.newline()?;
                        write!(p.out, "| {}", ctor.name)?;
                        p.constructor_arguments(&ctor.args, ctor.result.as_ref())?;
                    }
                    Ok(())
                })
            }
            TypeDeclarationKind::Record(labels) => {
                self.text(" = { ")?;
                self.sep(labels, "; ", |p, label| {
                    if label.mutable {
                        p.text("mutable ")?;
                    }
                    write!(p.out, "{} : ", label.name)?;
                    p.core_type(&label.ty, T_ARROW)
                })?;
                self.text(" }")
            }
        }
    }

    fn extension_constructor(&mut self, ctor: &ExtensionConstructor) -> fmt::Result {
        write!(self.out, "{}", ctor.name)?;
        match &ctor.kind {
            ExtensionConstructorKind::Decl { args, result } => {
                self.constructor_arguments(args, result.as_ref())
            }
            ExtensionConstructorKind::Rebind(path) => write!(self.out, " = {path}"),
        }
    }

    fn module_expr(&mut self, module: &ModuleExpr) -> fmt::Result {
        match &module.kind {
            ModuleExprKind::Ident(path) => write!(self.out, "{path}"),
            ModuleExprKind::Structure(items) => {
                self.text("struct")?;
                self.indented(2, |p| {
                    p.newline()?;
                    p.structure(items)
                })?;
                self.newline()?;
                self.text("end")
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Printer::new(f).expr(self, SEQ)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Printer::new(f).pattern(self, P_ALIAS)
    }
}

impl fmt::Display for CoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Printer::new(f).core_type(self, T_ARROW)
    }
}

impl fmt::Display for StructureItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Printer::new(f).structure_item(self)
    }
}

impl fmt::Display for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Printer::new(f).cases(std::slice::from_ref(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_core_type, parse_expression, parse_pattern, parse_structure};

    /// Print, re-parse and print again; the two renderings must agree.
    fn reprint(source: &str) -> String {
        let first = print_structure(&parse_structure(source).unwrap());
        let second = print_structure(&parse_structure(&first).unwrap());
        assert_eq!(first, second, "printing is not stable for {source:?}");
        first
    }

    #[test]
    fn test_infix_parenthesization() {
        let expr = parse_expression("(a + b) * c - (d - e)").unwrap();
        assert_eq!(expr.to_string(), "(a + b) * c - (d - e)");
        let expr = parse_expression("a :: (b :: c)").unwrap();
        assert_eq!(expr.to_string(), "a :: b :: c");
    }

    #[test]
    fn test_list_sugar() {
        let expr = parse_expression("1 :: 2 :: []").unwrap();
        assert_eq!(expr.to_string(), "[1; 2]");
    }

    #[test]
    fn test_open_cons_chain() {
        let out = reprint("let l = x :: y :: rest");
        assert!(out.contains("x :: y :: rest"), "{out}");
    }

    #[test]
    fn test_nested_match_in_non_last_case_is_parenthesized() {
        let out = reprint("let f x y = match x with A -> (match y with B -> 1 | C -> 2) | D -> 3");
        assert!(out.contains("(match y with"), "{out}");
    }

    #[test]
    fn test_sequence_first_open_construct() {
        let out = reprint("let g () = (let x = 1 in h x); k ()");
        assert!(out.contains("(let x ="), "{out}");
    }

    #[test]
    fn test_constants() {
        let expr = parse_expression(r#"f "a\"b\n" 'x' (-1) 2.5"#).unwrap();
        assert_eq!(expr.to_string(), r#"f "a\"b\n" 'x' (-1) 2.5"#);
    }

    #[test]
    fn test_patterns() {
        let pat = parse_pattern("(Some x :: rest) as l").unwrap();
        assert_eq!(pat.to_string(), "Some x :: rest as l");
        let pat = parse_pattern("[%effect? (Put v), k]").unwrap();
        assert_eq!(pat.to_string(), "[%effect? Put v, k]");
    }

    #[test]
    fn test_types() {
        let ty = parse_core_type("(int -> int) -> (a * b) list").unwrap();
        assert_eq!(ty.to_string(), "(int -> int) -> (a * b) list");
        let ty = parse_core_type("(r, _) Effect.Deep.continuation").unwrap();
        assert_eq!(ty.to_string(), "(r, _) Effect.Deep.continuation");
    }

    #[test]
    fn test_fun_parameters_are_merged() {
        let expr =
            parse_expression("fun (type a) (e : a Effect.t) -> fun k -> None").unwrap();
        assert_eq!(
            expr.to_string(),
            "fun (type a) (e : a Effect.t) k ->\n  None"
        );
    }

    #[test]
    fn test_structure_items_round_trip() {
        let out = reprint(
            "type _ Effect.t += Get : int Effect.t\n\
             exception%effect Put : int -> unit\n\
             let r = { retc = (fun x -> x); exnc = raise }\n\
             ;; print_endline \"done\"",
        );
        assert!(out.contains("type _ Effect.t +=\n  | Get : int Effect.t"), "{out}");
        assert!(out.contains("[%%effect exception Put : int -> unit]"), "{out}");
        assert!(out.contains(";; print_endline \"done\""), "{out}");
    }

    #[test]
    fn test_operator_values() {
        let expr = parse_expression("List.fold_left ( + ) 0 xs").unwrap();
        assert_eq!(expr.to_string(), "List.fold_left ( + ) 0 xs");
        let expr = parse_expression("( mod ) a b").unwrap();
        assert_eq!(expr.to_string(), "a mod b");
    }
}
