//! Handwritten lexer.

use effmatch_core::Span;

use crate::error::{ParseError, ParseErrorKind, ParseResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Names and literals
    LIdent(String),
    UIdent(String),
    TyVar(String),
    Tag(String),
    Int(i64),
    Float(String),
    Char(char),
    Str(String),

    // Keywords
    And,
    As,
    Assert,
    Begin,
    Do,
    Done,
    Downto,
    Else,
    End,
    Exception,
    False,
    For,
    Fun,
    Function,
    If,
    In,
    Lazy,
    Let,
    Match,
    Method,
    Module,
    Mutable,
    New,
    Object,
    Of,
    Open,
    Rec,
    Struct,
    Then,
    To,
    True,
    Try,
    Type,
    Val,
    When,
    While,
    With,

    // Extension points
    /// `%name` glued to the preceding keyword: `exception%effect`
    ExtMark(String),
    /// `[%name`
    ExtOpen(String),
    /// `[%%name`
    ItemExtOpen(String),

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    /// `[|`
    LArray,
    /// `|]`
    RArray,
    /// `{<`
    LOverride,
    /// `>}`
    ROverride,

    // Punctuation
    Comma,
    Semi,
    SemiSemi,
    Colon,
    ColonColon,
    ColonEq,
    ColonGreater,
    Dot,
    DotDot,
    Arrow,
    LeftArrow,
    Bar,
    Eq,
    PlusEq,
    Underscore,
    Question,
    Hash,

    // Operators
    InfixOp(String),
    PrefixOp(String),

    Eof,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Token::LIdent(s) | Token::UIdent(s) => return write!(f, "`{s}`"),
            Token::TyVar(s) => return write!(f, "`'{s}`"),
            Token::Tag(s) => return write!(f, "`` `{s} ``"),
            Token::Int(n) => return write!(f, "`{n}`"),
            Token::Float(s) => return write!(f, "`{s}`"),
            Token::Char(c) => return write!(f, "`{c:?}`"),
            Token::Str(s) => return write!(f, "{s:?}"),
            Token::ExtMark(s) => return write!(f, "`%{s}`"),
            Token::ExtOpen(s) => return write!(f, "`[%{s}`"),
            Token::ItemExtOpen(s) => return write!(f, "`[%%{s}`"),
            Token::InfixOp(s) | Token::PrefixOp(s) => return write!(f, "`{s}`"),
            Token::Eof => return write!(f, "end of input"),
            Token::And => "and",
            Token::As => "as",
            Token::Assert => "assert",
            Token::Begin => "begin",
            Token::Do => "do",
            Token::Done => "done",
            Token::Downto => "downto",
            Token::Else => "else",
            Token::End => "end",
            Token::Exception => "exception",
            Token::False => "false",
            Token::For => "for",
            Token::Fun => "fun",
            Token::Function => "function",
            Token::If => "if",
            Token::In => "in",
            Token::Lazy => "lazy",
            Token::Let => "let",
            Token::Match => "match",
            Token::Method => "method",
            Token::Module => "module",
            Token::Mutable => "mutable",
            Token::New => "new",
            Token::Object => "object",
            Token::Of => "of",
            Token::Open => "open",
            Token::Rec => "rec",
            Token::Struct => "struct",
            Token::Then => "then",
            Token::To => "to",
            Token::True => "true",
            Token::Try => "try",
            Token::Type => "type",
            Token::Val => "val",
            Token::When => "when",
            Token::While => "while",
            Token::With => "with",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LArray => "[|",
            Token::RArray => "|]",
            Token::LOverride => "{<",
            Token::ROverride => ">}",
            Token::Comma => ",",
            Token::Semi => ";",
            Token::SemiSemi => ";;",
            Token::Colon => ":",
            Token::ColonColon => "::",
            Token::ColonEq => ":=",
            Token::ColonGreater => ":>",
            Token::Dot => ".",
            Token::DotDot => "..",
            Token::Arrow => "->",
            Token::LeftArrow => "<-",
            Token::Bar => "|",
            Token::Eq => "=",
            Token::PlusEq => "+=",
            Token::Underscore => "_",
            Token::Question => "?",
            Token::Hash => "#",
        };
        write!(f, "`{text}`")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

fn keyword(word: &str) -> Option<Token> {
    Some(match word {
        "and" => Token::And,
        "as" => Token::As,
        "assert" => Token::Assert,
        "begin" => Token::Begin,
        "do" => Token::Do,
        "done" => Token::Done,
        "downto" => Token::Downto,
        "else" => Token::Else,
        "end" => Token::End,
        "exception" => Token::Exception,
        "false" => Token::False,
        "for" => Token::For,
        "fun" => Token::Fun,
        "function" => Token::Function,
        "if" => Token::If,
        "in" => Token::In,
        "lazy" => Token::Lazy,
        "let" => Token::Let,
        "match" => Token::Match,
        "method" => Token::Method,
        "module" => Token::Module,
        "mutable" => Token::Mutable,
        "new" => Token::New,
        "object" => Token::Object,
        "of" => Token::Of,
        "open" => Token::Open,
        "rec" => Token::Rec,
        "struct" => Token::Struct,
        "then" => Token::Then,
        "to" => Token::To,
        "true" => Token::True,
        "try" => Token::Try,
        "type" => Token::Type,
        "val" => Token::Val,
        "when" => Token::When,
        "while" => Token::While,
        "with" => Token::With,
        "mod" | "land" | "lor" | "lxor" | "lsl" | "lsr" | "asr" | "or" => {
            Token::InfixOp(word.to_string())
        }
        _ => return None,
    })
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '\''
}

fn is_op_char(c: char) -> bool {
    matches!(
        c,
        '!' | '$' | '%' | '&' | '*' | '+' | '-' | '.' | '/' | ':' | '<' | '=' | '>' | '?' | '@'
            | '^' | '|' | '~'
    )
}

pub struct Lexer<'src> {
    src: &'src str,
    pos: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Self {
        Self { src, pos: 0 }
    }

    /// Lex the whole input. The returned vector always ends with
    /// [`Token::Eof`].
    pub fn tokenize(mut self) -> ParseResult<Vec<SpannedToken>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia()?;
            let start = self.pos;
            let Some(c) = self.peek() else {
                tokens.push(SpannedToken {
                    token: Token::Eof,
                    span: Span::new(start, start),
                });
                return Ok(tokens);
            };
            let token = self.lex_token(c)?;
            let is_keyword = keyword_allows_ext(&token);
            tokens.push(SpannedToken {
                token,
                span: Span::new(start, self.pos),
            });
            if is_keyword
                && self.peek() == Some('%')
                && self.peek_at(1).is_some_and(|c| c.is_ascii_alphabetic())
            {
                let mark_start = self.pos;
                self.bump();
                let name = self.take_ext_name();
                tokens.push(SpannedToken {
                    token: Token::ExtMark(name),
                    span: Span::new(mark_start, self.pos),
                });
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'src str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn error(&self, kind: ParseErrorKind, start: usize) -> ParseError {
        ParseError::new(kind, Span::new(start, self.pos.max(start + 1)))
    }

    fn skip_trivia(&mut self) -> ParseResult<()> {
        loop {
            self.take_while(char::is_whitespace);
            if self.src[self.pos..].starts_with("(*") && !self.src[self.pos..].starts_with("(*)") {
                self.skip_comment()?;
            } else {
                return Ok(());
            }
        }
    }

    /// Skip a (possibly nested) `(* ... *)` comment.
    fn skip_comment(&mut self) -> ParseResult<()> {
        let start = self.pos;
        let mut depth = 0usize;
        loop {
            let rest = &self.src[self.pos..];
            if rest.starts_with("(*") {
                depth += 1;
                self.pos += 2;
            } else if rest.starts_with("*)") {
                depth -= 1;
                self.pos += 2;
                if depth == 0 {
                    return Ok(());
                }
            } else if self.bump().is_none() {
                return Err(self.error(ParseErrorKind::UnterminatedComment, start));
            }
        }
    }

    fn take_ext_name(&mut self) -> String {
        self.take_while(|c| is_ident_char(c) || c == '.').to_string()
    }

    fn lex_token(&mut self, c: char) -> ParseResult<Token> {
        let start = self.pos;
        let rest = &self.src[self.pos..];

        if c.is_ascii_digit() {
            return self.lex_number();
        }
        if c.is_ascii_lowercase() || c == '_' {
            let word = self.take_while(is_ident_char);
            if word == "_" {
                return Ok(Token::Underscore);
            }
            return Ok(keyword(word).unwrap_or_else(|| Token::LIdent(word.to_string())));
        }
        if c.is_ascii_uppercase() {
            return Ok(Token::UIdent(self.take_while(is_ident_char).to_string()));
        }

        // Multi-character delimiters first.
        for (text, token) in [
            ("[%%", None),
            ("[%", None),
            ("[|", Some(Token::LArray)),
            ("|]", Some(Token::RArray)),
            ("{<", Some(Token::LOverride)),
            (">}", Some(Token::ROverride)),
            (";;", Some(Token::SemiSemi)),
        ] {
            if rest.starts_with(text) {
                self.pos += text.len();
                return Ok(match token {
                    Some(token) => token,
                    None if text == "[%%" => Token::ItemExtOpen(self.take_ext_name()),
                    None => Token::ExtOpen(self.take_ext_name()),
                });
            }
        }
        if rest.starts_with("{|") {
            return self.lex_quoted_string();
        }

        match c {
            '"' => return self.lex_string(),
            '\'' => return self.lex_quote(),
            '`' => {
                self.bump();
                let name = self.take_while(is_ident_char);
                if name.is_empty() {
                    return Err(self.error(ParseErrorKind::UnexpectedChar('`'), start));
                }
                return Ok(Token::Tag(name.to_string()));
            }
            _ => {}
        }

        let single = match c {
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            '[' => Some(Token::LBracket),
            ']' => Some(Token::RBracket),
            '{' => Some(Token::LBrace),
            '}' => Some(Token::RBrace),
            ',' => Some(Token::Comma),
            ';' => Some(Token::Semi),
            '#' => Some(Token::Hash),
            _ => None,
        };
        if let Some(token) = single {
            self.bump();
            return Ok(token);
        }

        if is_op_char(c) {
            let op = self.take_while(is_op_char);
            return Ok(match op {
                "->" => Token::Arrow,
                "<-" => Token::LeftArrow,
                "|" => Token::Bar,
                "=" => Token::Eq,
                ":" => Token::Colon,
                "::" => Token::ColonColon,
                ":=" => Token::ColonEq,
                ":>" => Token::ColonGreater,
                "." => Token::Dot,
                ".." => Token::DotDot,
                "?" => Token::Question,
                "+=" => Token::PlusEq,
                _ if op.starts_with('~') || (op.starts_with('!') && op != "!=") => {
                    Token::PrefixOp(op.to_string())
                }
                _ => Token::InfixOp(op.to_string()),
            });
        }

        self.bump();
        Err(self.error(ParseErrorKind::UnexpectedChar(c), start))
    }

    fn lex_number(&mut self) -> ParseResult<Token> {
        let start = self.pos;
        if self.src[self.pos..].starts_with("0x") || self.src[self.pos..].starts_with("0X") {
            self.pos += 2;
            let digits = self.take_while(|c| c.is_ascii_hexdigit() || c == '_');
            let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
            return i64::from_str_radix(&cleaned, 16).map(Token::Int).map_err(|_| {
                self.error(
                    ParseErrorKind::IntOutOfRange(self.src[start..self.pos].to_string()),
                    start,
                )
            });
        }

        self.take_while(|c| c.is_ascii_digit() || c == '_');
        let mut is_float = false;
        if self.peek() == Some('.') && self.peek_at(1) != Some('.') {
            is_float = true;
            self.bump();
            self.take_while(|c| c.is_ascii_digit() || c == '_');
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let sign = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                self.bump();
                if sign {
                    self.bump();
                }
                self.take_while(|c| c.is_ascii_digit() || c == '_');
            }
        }

        let text = &self.src[start..self.pos];
        if is_float {
            return Ok(Token::Float(text.to_string()));
        }
        let cleaned: String = text.chars().filter(|c| *c != '_').collect();
        cleaned
            .parse::<i64>()
            .map(Token::Int)
            .map_err(|_| self.error(ParseErrorKind::IntOutOfRange(text.to_string()), start))
    }

    fn lex_escape(&mut self, start: usize) -> ParseResult<char> {
        let Some(c) = self.bump() else {
            return Err(self.error(ParseErrorKind::UnterminatedString, start));
        };
        Ok(match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{8}',
            ' ' => ' ',
            '\\' | '"' | '\'' => c,
            d if d.is_ascii_digit() => {
                let mut value = d.to_digit(10).unwrap_or(0);
                for _ in 0..2 {
                    match self.bump().and_then(|c| c.to_digit(10)) {
                        Some(digit) => value = value * 10 + digit,
                        None => return Err(self.error(ParseErrorKind::InvalidEscape(d), start)),
                    }
                }
                char::from_u32(value)
                    .filter(|_| value < 256)
                    .ok_or_else(|| self.error(ParseErrorKind::InvalidEscape(d), start))?
            }
            other => return Err(self.error(ParseErrorKind::InvalidEscape(other), start)),
        })
    }

    fn lex_string(&mut self) -> ParseResult<Token> {
        let start = self.pos;
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error(ParseErrorKind::UnterminatedString, start)),
                Some('"') => return Ok(Token::Str(value)),
                Some('\\') => {
                    if self.peek() == Some('\n') {
                        // Line continuation: skip the newline and leading blanks.
                        self.take_while(char::is_whitespace);
                        continue;
                    }
                    value.push(self.lex_escape(start)?);
                }
                Some(c) => value.push(c),
            }
        }
    }

    /// `{|text|}`
    fn lex_quoted_string(&mut self) -> ParseResult<Token> {
        let start = self.pos;
        self.pos += 2;
        match self.src[self.pos..].find("|}") {
            Some(len) => {
                let value = self.src[self.pos..self.pos + len].to_string();
                self.pos += len + 2;
                Ok(Token::Str(value))
            }
            None => {
                self.pos = self.src.len();
                Err(self.error(ParseErrorKind::UnterminatedString, start))
            }
        }
    }

    /// A `'` starts either a character literal or a type variable.
    fn lex_quote(&mut self) -> ParseResult<Token> {
        let start = self.pos;
        self.bump();
        match (self.peek(), self.peek_at(1)) {
            (Some('\\'), _) => {
                self.bump();
                let c = self.lex_escape(start)?;
                if self.bump() != Some('\'') {
                    return Err(self.error(ParseErrorKind::InvalidChar, start));
                }
                Ok(Token::Char(c))
            }
            (Some(c), Some('\'')) => {
                self.bump();
                self.bump();
                Ok(Token::Char(c))
            }
            (Some(c), _) if c.is_ascii_alphabetic() || c == '_' => {
                Ok(Token::TyVar(self.take_while(is_ident_char).to_string()))
            }
            _ => Err(self.error(ParseErrorKind::InvalidChar, start)),
        }
    }
}

/// Keywords that may carry a glued extension mark, as in `exception%effect`.
fn keyword_allows_ext(token: &Token) -> bool {
    matches!(
        token,
        Token::Exception
            | Token::Let
            | Token::Match
            | Token::Try
            | Token::Fun
            | Token::Function
            | Token::Type
            | Token::Module
            | Token::Open
            | Token::If
            | Token::While
            | Token::For
            | Token::Begin
            | Token::Lazy
            | Token::Assert
    )
}

/// Convenience wrapper around [`Lexer::tokenize`].
pub fn tokenize(src: &str) -> ParseResult<Vec<SpannedToken>> {
    Lexer::new(src).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Token> {
        tokenize(src)
            .expect("lexes")
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_effect_case_tokens() {
        assert_eq!(
            kinds("| [%effect? Get, k] -> x"),
            vec![
                Token::Bar,
                Token::ExtOpen("effect".into()),
                Token::Question,
                Token::UIdent("Get".into()),
                Token::Comma,
                Token::LIdent("k".into()),
                Token::RBracket,
                Token::Arrow,
                Token::LIdent("x".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_keyword_extension_mark() {
        assert_eq!(
            kinds("exception%effect E : int"),
            vec![
                Token::Exception,
                Token::ExtMark("effect".into()),
                Token::UIdent("E".into()),
                Token::Colon,
                Token::LIdent("int".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_operator_classes() {
        assert_eq!(
            kinds("a |> !r <> b := c :: d"),
            vec![
                Token::LIdent("a".into()),
                Token::InfixOp("|>".into()),
                Token::PrefixOp("!".into()),
                Token::LIdent("r".into()),
                Token::InfixOp("<>".into()),
                Token::LIdent("b".into()),
                Token::ColonEq,
                Token::LIdent("c".into()),
                Token::ColonColon,
                Token::LIdent("d".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            kinds(r#"42 1_000 0x1F 3.25 1e3 'a' '\n' "s\"q" {|raw|} `Tag 'v"#),
            vec![
                Token::Int(42),
                Token::Int(1000),
                Token::Int(31),
                Token::Float("3.25".into()),
                Token::Float("1e3".into()),
                Token::Char('a'),
                Token::Char('\n'),
                Token::Str("s\"q".into()),
                Token::Str("raw".into()),
                Token::Tag("Tag".into()),
                Token::TyVar("v".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_nested_comments_are_skipped() {
        assert_eq!(
            kinds("a (* outer (* inner *) still *) b"),
            vec![
                Token::LIdent("a".into()),
                Token::LIdent("b".into()),
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_unterminated_comment() {
        let err = tokenize("(* never closed").unwrap_err();
        assert_eq!(err.kind(), &ParseErrorKind::UnterminatedComment);
    }

    #[test]
    fn test_spans_are_byte_offsets() {
        let tokens = tokenize("let x = 1").unwrap();
        assert_eq!(tokens[0].span, Span::new(0, 3));
        assert_eq!(tokens[1].span, Span::new(4, 5));
        assert_eq!(tokens[3].span, Span::new(8, 9));
    }
}
