//! Text syntax for expressions and relations.
//!
//! Grammar (lowest to highest binding):
//!
//! ```text
//! relation := expr ( "<" | "<=" | ">" | ">=" | "==" | "=" | "!=" ) expr
//! expr     := term (( "+" | "-" ) term)*
//! term     := unary (( "*" | "/" ) unary)*
//! unary    := ( "-" | "+" ) unary | power
//! power    := primary (( "^" | "**" ) unary)?
//! primary  := number | ident | ident "(" expr ")" | "(" expr ")"
//! ```
//!
//! `^` is right-associative and binds tighter than unary minus, so
//! `-a ^ 2` is `-(a ^ 2)`. The identifiers `pi` and `E` are the
//! mathematical constants; every other identifier is a variable.

use crate::ast::{BinOp, Expr, Func, RelOp, Relation};

/// A syntax error with the byte offset where it was detected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message} at position {position}")]
pub struct ParseError {
    /// Byte offset into the source text.
    pub position: usize,
    /// Human-readable description.
    pub message: String,
}

impl ParseError {
    fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

/// Parse an arithmetic expression.
///
/// ```
/// use symbind_expr::parse_expr;
///
/// let e = parse_expr("sqrt(a^2 + b^2)").unwrap();
/// assert_eq!(e.variables(), vec!["a", "b"]);
/// ```
pub fn parse_expr(src: &str) -> Result<Expr, ParseError> {
    let mut parser = Parser::new(src)?;
    let expr = parser.expr()?;
    parser.expect_end()?;
    Ok(expr)
}

/// Parse a relation such as `a > 0` or `x + y <= limit`.
pub fn parse_relation(src: &str) -> Result<Relation, ParseError> {
    let mut parser = Parser::new(src)?;
    let lhs = parser.expr()?;
    let (pos, tok) = parser.peek_with_pos();
    let op = match tok {
        Token::Lt => RelOp::Lt,
        Token::Le => RelOp::Le,
        Token::Gt => RelOp::Gt,
        Token::Ge => RelOp::Ge,
        Token::EqEq => RelOp::Eq,
        Token::Ne => RelOp::Ne,
        other => {
            return Err(ParseError::new(
                pos,
                format!("expected comparison operator, found {}", other.describe()),
            ))
        }
    };
    parser.advance();
    let rhs = parser.expr()?;
    parser.expect_end()?;
    Ok(Relation::new(lhs, op, rhs))
}

impl std::str::FromStr for Expr {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_expr(s)
    }
}

impl std::str::FromStr for Relation {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_relation(s)
    }
}

// ── Lexer ──────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    Ne,
    End,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Self::Number(v) => format!("number {v}"),
            Self::Ident(name) => format!("identifier '{name}'"),
            Self::End => "end of input".to_string(),
            Self::Plus => "'+'".to_string(),
            Self::Minus => "'-'".to_string(),
            Self::Star => "'*'".to_string(),
            Self::Slash => "'/'".to_string(),
            Self::Caret => "'^'".to_string(),
            Self::LParen => "'('".to_string(),
            Self::RParen => "')'".to_string(),
            Self::Lt => "'<'".to_string(),
            Self::Le => "'<='".to_string(),
            Self::Gt => "'>'".to_string(),
            Self::Ge => "'>='".to_string(),
            Self::EqEq => "'=='".to_string(),
            Self::Ne => "'!='".to_string(),
        }
    }
}

fn tokenize(src: &str) -> Result<Vec<(usize, Token)>, ParseError> {
    let bytes = src.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        let start = i;
        match c {
            b' ' | b'\t' | b'\n' | b'\r' => {
                i += 1;
                continue;
            }
            b'0'..=b'9' | b'.' => {
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                    i += 1;
                }
                // Optional exponent: 1e-3, 2.5E+10
                if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
                    let mut j = i + 1;
                    if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                        j += 1;
                    }
                    if j < bytes.len() && bytes[j].is_ascii_digit() {
                        while j < bytes.len() && bytes[j].is_ascii_digit() {
                            j += 1;
                        }
                        i = j;
                    }
                }
                let text = &src[start..i];
                let value = text
                    .parse::<f64>()
                    .map_err(|_| ParseError::new(start, format!("invalid number '{text}'")))?;
                out.push((start, Token::Number(value)));
                continue;
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                out.push((start, Token::Ident(src[start..i].to_string())));
                continue;
            }
            _ => {}
        }
        let next = bytes.get(i + 1).copied();
        let (tok, width) = match (c, next) {
            (b'*', Some(b'*')) => (Token::Caret, 2),
            (b'<', Some(b'=')) => (Token::Le, 2),
            (b'>', Some(b'=')) => (Token::Ge, 2),
            (b'=', Some(b'=')) => (Token::EqEq, 2),
            (b'!', Some(b'=')) => (Token::Ne, 2),
            (b'+', _) => (Token::Plus, 1),
            (b'-', _) => (Token::Minus, 1),
            (b'*', _) => (Token::Star, 1),
            (b'/', _) => (Token::Slash, 1),
            (b'^', _) => (Token::Caret, 1),
            (b'(', _) => (Token::LParen, 1),
            (b')', _) => (Token::RParen, 1),
            (b'<', _) => (Token::Lt, 1),
            (b'>', _) => (Token::Gt, 1),
            (b'=', _) => (Token::EqEq, 1),
            _ => {
                let ch = src[i..].chars().next().unwrap_or('?');
                return Err(ParseError::new(i, format!("unexpected character '{ch}'")));
            }
        };
        out.push((start, tok));
        i += width;
    }
    out.push((src.len(), Token::End));
    Ok(out)
}

// ── Parser ─────────────────────────────────────────────────────────

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
}

impl Parser {
    fn new(src: &str) -> Result<Self, ParseError> {
        Ok(Self {
            tokens: tokenize(src)?,
            pos: 0,
        })
    }

    fn peek(&self) -> &Token {
        self.peek_with_pos().1
    }

    fn peek_with_pos(&self) -> (usize, &Token) {
        // `tokenize` always terminates the stream with `End`, and `advance`
        // never moves past it.
        let (p, t) = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        (*p, t)
    }

    fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn expect_end(&self) -> Result<(), ParseError> {
        match self.peek_with_pos() {
            (_, Token::End) => Ok(()),
            (p, tok) => Err(ParseError::new(
                p,
                format!("unexpected {} after expression", tok.describe()),
            )),
        }
    }

    fn expr(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.term()?;
            lhs = Expr::binary(op, lhs, rhs);
        }
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.unary()?;
            lhs = Expr::binary(op, lhs, rhs);
        }
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        match self.peek() {
            Token::Minus => {
                self.advance();
                let inner = self.unary()?;
                Ok(match inner {
                    Expr::Const(v) => Expr::Const(-v),
                    other => Expr::Neg(Box::new(other)),
                })
            }
            Token::Plus => {
                self.advance();
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, ParseError> {
        let base = self.primary()?;
        if *self.peek() == Token::Caret {
            self.advance();
            let exponent = self.unary()?;
            return Ok(Expr::binary(BinOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let (pos, tok) = self.peek_with_pos();
        let tok = tok.clone();
        match tok {
            Token::Number(v) => {
                self.advance();
                Ok(Expr::Const(v))
            }
            Token::Ident(name) => {
                self.advance();
                if *self.peek() == Token::LParen {
                    let func = Func::from_name(&name).ok_or_else(|| {
                        ParseError::new(pos, format!("unknown function '{name}'"))
                    })?;
                    self.advance();
                    let arg = self.expr()?;
                    self.expect_rparen()?;
                    return Ok(Expr::call(func, arg));
                }
                Ok(match name.as_str() {
                    "pi" => Expr::Const(std::f64::consts::PI),
                    "E" => Expr::Const(std::f64::consts::E),
                    _ => Expr::Var(name),
                })
            }
            Token::LParen => {
                self.advance();
                let inner = self.expr()?;
                self.expect_rparen()?;
                Ok(inner)
            }
            other => Err(ParseError::new(
                pos,
                format!("expected operand, found {}", other.describe()),
            )),
        }
    }

    fn expect_rparen(&mut self) -> Result<(), ParseError> {
        match self.peek_with_pos() {
            (_, Token::RParen) => {
                self.advance();
                Ok(())
            }
            (p, tok) => Err(ParseError::new(
                p,
                format!("expected ')', found {}", tok.describe()),
            )),
        }
    }
}
