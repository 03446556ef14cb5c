//! Whole-program expansion of effect syntax.
//!
//! [`EffectExpander`] rebuilds the tree inside-out: the children of a node
//! are expanded before the node itself, so when a `match` with effect
//! cases is lowered, any effect handlers nested in its scrutinee or case
//! bodies are already plain code. An `effect` extension found anywhere
//! except the top of a `match`/`try` case or on an exception declaration
//! is an error.

use effmatch_core::Location;
use effmatch_syntax::{
    Case, Expr, ExprKind, Extension, ModuleExpr, ModuleExprKind, ObjectField, Pattern,
    PatternKind, Payload, Structure, StructureItem, StructureItemKind, ValueBinding,
};
use tracing::debug;

use crate::classify::{contains_effect_case, effect_pattern, is_effect_marker};
use crate::effect_decl::rewrite_effect_declaration;
use crate::error::{ExpandError, ExpandResult};
use crate::handler::{emit_match, emit_try};
use crate::runtime::ExpandConfig;

/// Rewrites `match`/`try` expressions with effect cases and
/// `exception%effect` declarations.
pub struct EffectExpander<'a> {
    config: &'a ExpandConfig,
}

impl<'a> EffectExpander<'a> {
    pub fn new(config: &'a ExpandConfig) -> Self {
        Self { config }
    }

    pub fn expand_structure(&self, items: Structure) -> ExpandResult<Structure> {
        items
            .into_iter()
            .map(|item| self.expand_item(item))
            .collect()
    }

    // =========================================================================
    // Structure items
    // =========================================================================

    fn expand_item(&self, item: StructureItem) -> ExpandResult<StructureItem> {
        let StructureItem { loc, kind } = item;
        let kind = match kind {
            StructureItemKind::Eval(expr) => StructureItemKind::Eval(self.expand_expr(expr)?),
            StructureItemKind::Value { rec_flag, bindings } => StructureItemKind::Value {
                rec_flag,
                bindings: self.expand_bindings(bindings)?,
            },
            StructureItemKind::Module { name, expr } => StructureItemKind::Module {
                name,
                expr: self.expand_module(expr)?,
            },
            StructureItemKind::Extension(ext) if is_effect_marker(ext.name) => {
                return self.expand_effect_item(loc, ext);
            }
            kind @ (StructureItemKind::Type(_)
            | StructureItemKind::TypeExtension(_)
            | StructureItemKind::Exception(_)
            | StructureItemKind::Open(_)
            | StructureItemKind::Extension(_)) => kind,
        };
        Ok(StructureItem::new(loc, kind))
    }

    /// `exception%effect E ...` or `[%%effect exception E ...]`.
    fn expand_effect_item(&self, loc: Location, ext: Extension) -> ExpandResult<StructureItem> {
        let Extension {
            loc: ext_loc,
            payload,
            ..
        } = ext;
        let Payload::Structure(mut items) = payload else {
            return Err(ExpandError::misplaced_marker(ext_loc));
        };
        if items.len() != 1 {
            return Err(ExpandError::misplaced_marker(ext_loc));
        }
        let item = items.remove(0);
        match item.kind {
            StructureItemKind::Exception(ctor) => {
                rewrite_effect_declaration(loc, ctor, &self.config.runtime)
            }
            _ => Err(ExpandError::misplaced_marker(ext_loc)),
        }
    }

    fn expand_module(&self, module: ModuleExpr) -> ExpandResult<ModuleExpr> {
        let ModuleExpr { loc, kind } = module;
        let kind = match kind {
            ModuleExprKind::Ident(path) => ModuleExprKind::Ident(path),
            ModuleExprKind::Structure(items) => {
                ModuleExprKind::Structure(self.expand_structure(items)?)
            }
        };
        Ok(ModuleExpr { loc, kind })
    }

    fn expand_bindings(&self, bindings: Vec<ValueBinding>) -> ExpandResult<Vec<ValueBinding>> {
        bindings
            .into_iter()
            .map(|ValueBinding { loc, pat, expr }| {
                check_pattern(&pat)?;
                Ok(ValueBinding {
                    loc,
                    pat,
                    expr: self.expand_expr(expr)?,
                })
            })
            .collect()
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub fn expand_expr(&self, expr: Expr) -> ExpandResult<Expr> {
        let Expr { loc, kind } = expr;
        let kind = match *kind {
            ExprKind::Match { scrutinee, cases } => {
                return self.expand_match(loc, scrutinee, cases);
            }
            ExprKind::Try { body, cases } => return self.expand_try(loc, body, cases),

            ExprKind::Extension(ext) if is_effect_marker(ext.name) => {
                return Err(ExpandError::misplaced_marker(ext.loc));
            }
            kind @ (ExprKind::Ident(_)
            | ExprKind::Constant(_)
            | ExprKind::New(_)
            | ExprKind::Extension(_)) => kind,

            ExprKind::Let {
                rec_flag,
                bindings,
                body,
            } => ExprKind::Let {
                rec_flag,
                bindings: self.expand_bindings(bindings)?,
                body: self.expand_expr(body)?,
            },
            ExprKind::Function(cases) => ExprKind::Function(self.expand_cases(cases)?),
            ExprKind::Fun { param, body } => {
                check_pattern(&param)?;
                ExprKind::Fun {
                    param,
                    body: self.expand_expr(body)?,
                }
            }
            ExprKind::Apply { func, args } => ExprKind::Apply {
                func: self.expand_expr(func)?,
                args: self.expand_exprs(args)?,
            },
            ExprKind::Tuple(elements) => ExprKind::Tuple(self.expand_exprs(elements)?),
            ExprKind::Construct { ctor, arg } => ExprKind::Construct {
                ctor,
                arg: self.expand_opt(arg)?,
            },
            ExprKind::Variant { tag, arg } => ExprKind::Variant {
                tag,
                arg: self.expand_opt(arg)?,
            },
            ExprKind::Record { fields, base } => ExprKind::Record {
                fields: fields
                    .into_iter()
                    .map(|(label, value)| Ok((label, self.expand_expr(value)?)))
                    .collect::<ExpandResult<_>>()?,
                base: self.expand_opt(base)?,
            },
            ExprKind::Field { expr, field } => ExprKind::Field {
                expr: self.expand_expr(expr)?,
                field,
            },
            ExprKind::SetField { expr, field, value } => ExprKind::SetField {
                expr: self.expand_expr(expr)?,
                field,
                value: self.expand_expr(value)?,
            },
            ExprKind::Array(elements) => ExprKind::Array(self.expand_exprs(elements)?),
            ExprKind::IfThenElse {
                cond,
                then_branch,
                else_branch,
            } => ExprKind::IfThenElse {
                cond: self.expand_expr(cond)?,
                then_branch: self.expand_expr(then_branch)?,
                else_branch: self.expand_opt(else_branch)?,
            },
            ExprKind::Sequence { first, second } => ExprKind::Sequence {
                first: self.expand_expr(first)?,
                second: self.expand_expr(second)?,
            },
            ExprKind::While { cond, body } => ExprKind::While {
                cond: self.expand_expr(cond)?,
                body: self.expand_expr(body)?,
            },
            ExprKind::For {
                var,
                start,
                end,
                direction,
                body,
            } => {
                check_pattern(&var)?;
                ExprKind::For {
                    var,
                    start: self.expand_expr(start)?,
                    end: self.expand_expr(end)?,
                    direction,
                    body: self.expand_expr(body)?,
                }
            }
            ExprKind::Constraint { expr, ty } => ExprKind::Constraint {
                expr: self.expand_expr(expr)?,
                ty,
            },
            ExprKind::Coerce { expr, from, to } => ExprKind::Coerce {
                expr: self.expand_expr(expr)?,
                from,
                to,
            },
            ExprKind::Send { expr, method } => ExprKind::Send {
                expr: self.expand_expr(expr)?,
                method,
            },
            ExprKind::SetInstVar { name, value } => ExprKind::SetInstVar {
                name,
                value: self.expand_expr(value)?,
            },
            ExprKind::Override(fields) => ExprKind::Override(
                fields
                    .into_iter()
                    .map(|(name, value)| Ok((name, self.expand_expr(value)?)))
                    .collect::<ExpandResult<_>>()?,
            ),
            ExprKind::LetModule { name, module, body } => ExprKind::LetModule {
                name,
                module: self.expand_module(module)?,
                body: self.expand_expr(body)?,
            },
            ExprKind::LetException { ctor, body } => ExprKind::LetException {
                ctor,
                body: self.expand_expr(body)?,
            },
            ExprKind::Assert(inner) => ExprKind::Assert(self.expand_expr(inner)?),
            ExprKind::Lazy(inner) => ExprKind::Lazy(self.expand_expr(inner)?),
            ExprKind::Object(fields) => ExprKind::Object(
                fields
                    .into_iter()
                    .map(|field| self.expand_object_field(field))
                    .collect::<ExpandResult<_>>()?,
            ),
            ExprKind::Newtype { name, body } => ExprKind::Newtype {
                name,
                body: self.expand_expr(body)?,
            },
            ExprKind::Pack(module) => ExprKind::Pack(self.expand_module(module)?),
            ExprKind::Open { module, body } => ExprKind::Open {
                module,
                body: self.expand_expr(body)?,
            },
        };
        Ok(Expr { loc, kind: Box::new(kind) })
    }

    fn expand_exprs(&self, exprs: Vec<Expr>) -> ExpandResult<Vec<Expr>> {
        exprs.into_iter().map(|e| self.expand_expr(e)).collect()
    }

    fn expand_opt(&self, expr: Option<Expr>) -> ExpandResult<Option<Expr>> {
        expr.map(|e| self.expand_expr(e)).transpose()
    }

    fn expand_object_field(&self, field: ObjectField) -> ExpandResult<ObjectField> {
        Ok(match field {
            ObjectField::Method { name, body } => ObjectField::Method {
                name,
                body: self.expand_expr(body)?,
            },
            ObjectField::Val {
                name,
                mutable,
                init,
            } => ObjectField::Val {
                name,
                mutable,
                init: self.expand_expr(init)?,
            },
        })
    }

    // =========================================================================
    // Match and try
    // =========================================================================

    fn expand_match(&self, loc: Location, scrutinee: Expr, cases: Vec<Case>) -> ExpandResult<Expr> {
        let scrutinee = self.expand_expr(scrutinee)?;
        if !contains_effect_case(&cases) {
            let cases = self.expand_cases(cases)?;
            return Ok(Expr::new(loc, ExprKind::Match { scrutinee, cases }));
        }
        let cases = self.expand_handler_cases(cases)?;
        debug!(?loc, cases = cases.len(), "lowering match with effect cases");
        emit_match(loc, scrutinee, cases, &self.config.runtime)
    }

    fn expand_try(&self, loc: Location, body: Expr, cases: Vec<Case>) -> ExpandResult<Expr> {
        let body = self.expand_expr(body)?;
        if !contains_effect_case(&cases) {
            let cases = self.expand_cases(cases)?;
            return Ok(Expr::new(loc, ExprKind::Try { body, cases }));
        }
        let cases = self.expand_handler_cases(cases)?;
        debug!(?loc, cases = cases.len(), "lowering try with effect cases");
        emit_try(loc, body, cases, &self.config.runtime)
    }

    /// Cases of a `function`, or of a `match`/`try` without effect cases.
    fn expand_cases(&self, cases: Vec<Case>) -> ExpandResult<Vec<Case>> {
        cases
            .into_iter()
            .map(|case| {
                check_pattern(&case.lhs)?;
                self.expand_case_exprs(case)
            })
            .collect()
    }

    /// Cases of a `match`/`try` being lowered: a top-level effect pattern
    /// is allowed, but not one nested inside it. A guard inside the effect
    /// payload is only checked for markers; the emitter rejects it.
    fn expand_handler_cases(&self, cases: Vec<Case>) -> ExpandResult<Vec<Case>> {
        cases
            .into_iter()
            .map(|case| {
                match effect_pattern(&case.lhs) {
                    Some(parts) => {
                        check_pattern(parts.operation)?;
                        check_pattern(parts.continuation)?;
                        if let Some(guard) = parts.guard {
                            self.expand_expr(guard.clone())?;
                        }
                    }
                    None => check_pattern(&case.lhs)?,
                }
                self.expand_case_exprs(case)
            })
            .collect()
    }

    fn expand_case_exprs(&self, case: Case) -> ExpandResult<Case> {
        let Case { lhs, guard, rhs } = case;
        Ok(Case::new(lhs, self.expand_opt(guard)?, self.expand_expr(rhs)?))
    }
}

/// Reject any `effect` extension inside a pattern.
fn check_pattern(pat: &Pattern) -> ExpandResult<()> {
    match &*pat.kind {
        PatternKind::Any | PatternKind::Var(_) | PatternKind::Constant(_) => Ok(()),
        PatternKind::Alias { pat, .. }
        | PatternKind::Constraint { pat, .. }
        | PatternKind::Lazy(pat)
        | PatternKind::Exception(pat) => check_pattern(pat),
        PatternKind::Construct { arg, .. } | PatternKind::Variant { arg, .. } => {
            arg.as_ref().map_or(Ok(()), check_pattern)
        }
        PatternKind::Tuple(elements) | PatternKind::Array(elements) => {
            elements.iter().try_for_each(check_pattern)
        }
        PatternKind::Record { fields, .. } => fields.iter().try_for_each(|(_, p)| check_pattern(p)),
        PatternKind::Or(lhs, rhs) => {
            check_pattern(lhs)?;
            check_pattern(rhs)
        }
        PatternKind::Extension(ext) if is_effect_marker(ext.name) => {
            Err(ExpandError::misplaced_marker(ext.loc))
        }
        PatternKind::Extension(_) => Ok(()),
    }
}
