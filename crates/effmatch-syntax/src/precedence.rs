//! Operator precedence shared by the parser and the printer.
//!
//! Levels grow with binding strength. Open constructs (`let`, `match`,
//! `fun`, ...) extend as far to the right as possible, so they sit just
//! above sequencing.

pub const SEQ: u8 = 0;
pub const OPEN: u8 = 1;
pub const ASSIGN: u8 = 2;
pub const TUPLE: u8 = 3;
pub const OR: u8 = 4;
pub const AND: u8 = 5;
pub const CMP: u8 = 6;
pub const CONCAT: u8 = 7;
pub const CONS: u8 = 8;
pub const ADD: u8 = 9;
pub const MUL: u8 = 10;
pub const POW: u8 = 11;
pub const UNARY: u8 = 12;
pub const APP: u8 = 13;
pub const SIMPLE: u8 = 14;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
}

/// Level and associativity of an infix operator, classified by its
/// leading characters the way ML grammars do.
pub fn infix(op: &str) -> Option<(u8, Assoc)> {
    use Assoc::*;
    Some(match op {
        ":=" => (ASSIGN, Right),
        "or" | "||" => (OR, Right),
        "&" | "&&" => (AND, Right),
        "::" => (CONS, Right),
        "lsl" | "lsr" | "asr" => (POW, Right),
        "mod" | "land" | "lor" | "lxor" => (MUL, Left),
        "!=" => (CMP, Left),
        _ if op.starts_with("**") => (POW, Right),
        _ if op.starts_with(['*', '/', '%']) => (MUL, Left),
        _ if op.starts_with(['+', '-']) => (ADD, Left),
        _ if op.starts_with(['@', '^']) => (CONCAT, Right),
        _ if op.starts_with(['=', '<', '>', '|', '&', '$']) => (CMP, Left),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_classes() {
        assert_eq!(infix("+"), Some((ADD, Assoc::Left)));
        assert_eq!(infix("+."), Some((ADD, Assoc::Left)));
        assert_eq!(infix("**"), Some((POW, Assoc::Right)));
        assert_eq!(infix("*"), Some((MUL, Assoc::Left)));
        assert_eq!(infix("|>"), Some((CMP, Assoc::Left)));
        assert_eq!(infix("@"), Some((CONCAT, Assoc::Right)));
        assert_eq!(infix("&&"), Some((AND, Assoc::Right)));
        assert_eq!(infix("mod"), Some((MUL, Assoc::Left)));
        assert_eq!(infix("!"), None);
    }
}
