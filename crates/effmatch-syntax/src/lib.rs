//! Syntax layer for effmatch.
//!
//! This crate provides the syntax tree, a recursive-descent parser for the
//! ML-family surface language, and a printer whose output parses back to
//! the same tree.

pub mod ast;
pub mod builder;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod precedence;
mod printer;

pub use ast::*;
pub use builder::Builder;
pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use parser::{parse_core_type, parse_expression, parse_pattern, parse_structure};
pub use printer::print_structure;
