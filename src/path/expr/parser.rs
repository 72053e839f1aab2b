//! A lexer and recursive-descent parser for filter expressions.
//!
//! Grammar, precedence low to high:
//!
//! ```text
//! expression := or_expr
//! or_expr    := and_expr ("||" and_expr)*
//! and_expr   := rel_expr ("&&" rel_expr)*
//! rel_expr   := add_expr (("==" | "!=" | "<" | "<=" | ">" | ">=") add_expr)?
//! add_expr   := mul_expr (("+" | "-") mul_expr)*
//! mul_expr   := unary (("*" | "/") unary)*
//! unary      := ("-" | "+" | "!")? primary
//! primary    := int_literal | string_literal | "true" | "false"
//!             | "@" path_ref | "(" expression ")"
//! ```

use super::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Int(i64),
    Str(String),
    True,
    False,
    Var(String),
    Plus,
    Minus,
    Star,
    Slash,
    Bang,
    EqEq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    AndAnd,
    OrOr,
    LParen,
    RParen,
}

/// Parses an expression into its syntax tree.
pub(crate) fn parse(input: &str) -> Result<Expr> {
    let tokens = lex(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expression()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(Error::expression(format!(
            "unexpected trailing token {token:?}"
        ))),
    }
}

fn lex(input: &str) -> Result<Vec<Token>> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let byte = bytes[pos];
        match byte {
            b' ' | b'\t' | b'\n' | b'\r' => pos += 1,
            b'+' => {
                tokens.push(Token::Plus);
                pos += 1;
            }
            b'-' => {
                tokens.push(Token::Minus);
                pos += 1;
            }
            b'*' => {
                tokens.push(Token::Star);
                pos += 1;
            }
            b'/' => {
                tokens.push(Token::Slash);
                pos += 1;
            }
            b'(' => {
                tokens.push(Token::LParen);
                pos += 1;
            }
            b')' => {
                tokens.push(Token::RParen);
                pos += 1;
            }
            b'=' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    tokens.push(Token::EqEq);
                    pos += 2;
                } else {
                    return Err(Error::expression("expected '==' "));
                }
            }
            b'!' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    tokens.push(Token::NotEq);
                    pos += 2;
                } else {
                    tokens.push(Token::Bang);
                    pos += 1;
                }
            }
            b'<' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    tokens.push(Token::Lte);
                    pos += 2;
                } else {
                    tokens.push(Token::Lt);
                    pos += 1;
                }
            }
            b'>' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    tokens.push(Token::Gte);
                    pos += 2;
                } else {
                    tokens.push(Token::Gt);
                    pos += 1;
                }
            }
            b'&' => {
                if bytes.get(pos + 1) == Some(&b'&') {
                    tokens.push(Token::AndAnd);
                    pos += 2;
                } else {
                    return Err(Error::expression("expected '&&'"));
                }
            }
            b'|' => {
                if bytes.get(pos + 1) == Some(&b'|') {
                    tokens.push(Token::OrOr);
                    pos += 2;
                } else {
                    return Err(Error::expression("expected '||'"));
                }
            }
            b'"' | b'\'' => {
                let (literal, consumed) = lex_string(&input[pos..], byte)?;
                tokens.push(Token::Str(literal));
                pos += consumed;
            }
            b'0'..=b'9' => {
                let start = pos;
                while matches!(bytes.get(pos), Some(b'0'..=b'9')) {
                    pos += 1;
                }
                let literal = &input[start..pos];
                let value = literal
                    .parse::<i64>()
                    .map_err(|_| Error::expression(format!("integer literal out of range: {literal}")))?;
                tokens.push(Token::Int(value));
            }
            b'@' => {
                let (path, consumed) = lex_path_ref(&input[pos + 1..]);
                tokens.push(Token::Var(path));
                pos += 1 + consumed;
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                let start = pos;
                while matches!(bytes.get(pos), Some(b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_'))
                {
                    pos += 1;
                }
                match &input[start..pos] {
                    "true" => tokens.push(Token::True),
                    "false" => tokens.push(Token::False),
                    other => {
                        return Err(Error::expression(format!("unknown identifier: {other}")))
                    }
                }
            }
            other => {
                return Err(Error::expression(format!(
                    "unexpected character {:?}",
                    other as char
                )))
            }
        }
    }

    Ok(tokens)
}

/// Lexes a quoted string literal starting at `input[0]` (the opening quote),
/// returning the unescaped text and the bytes consumed.
fn lex_string(input: &str, quote: u8) -> Result<(String, usize)> {
    let bytes = input.as_bytes();
    let mut out = String::new();
    let mut pos = 1;

    loop {
        match bytes.get(pos) {
            None => return Err(Error::expression("unterminated string literal")),
            Some(&b) if b == quote => return Ok((out, pos + 1)),
            Some(b'\\') => {
                pos += 1;
                let escaped = bytes
                    .get(pos)
                    .ok_or_else(|| Error::expression("unterminated string literal"))?;
                match escaped {
                    b'"' => out.push('"'),
                    b'\'' => out.push('\''),
                    b'\\' => out.push('\\'),
                    b'/' => out.push('/'),
                    b'b' => out.push('\u{8}'),
                    b'f' => out.push('\u{c}'),
                    b'n' => out.push('\n'),
                    b'r' => out.push('\r'),
                    b't' => out.push('\t'),
                    b'u' => {
                        let hex = input
                            .get(pos + 1..pos + 5)
                            .ok_or_else(|| Error::expression("truncated \\u escape"))?;
                        let value = u32::from_str_radix(hex, 16)
                            .map_err(|_| Error::expression(format!("invalid \\u escape: {hex}")))?;
                        let ch = char::from_u32(value).ok_or_else(|| {
                            Error::expression(format!("invalid code point U+{value:04X}"))
                        })?;
                        out.push(ch);
                        pos += 4;
                    }
                    other => {
                        return Err(Error::expression(format!(
                            "invalid escape \\{}",
                            *other as char
                        )))
                    }
                }
                pos += 1;
            }
            Some(_) => {
                // consume one full character
                let ch = input[pos..].chars().next().expect("in-bounds char");
                out.push(ch);
                pos += ch.len_utf8();
            }
        }
    }
}

/// Lexes the path reference following `@`: a dotted identifier chain with
/// bracketed subscript segments, e.g. `.store.price` or `[0].name`.
/// Returns the path text and the bytes consumed.
fn lex_path_ref(input: &str) -> (String, usize) {
    let bytes = input.as_bytes();
    let mut pos = 0;
    let mut in_quote: Option<u8> = None;
    let mut depth = 0usize;

    while pos < bytes.len() {
        let byte = bytes[pos];
        if let Some(quote) = in_quote {
            if byte == quote {
                in_quote = None;
            }
            pos += 1;
            continue;
        }
        match byte {
            b'"' | b'\'' => {
                in_quote = Some(byte);
                pos += 1;
            }
            b'[' => {
                depth += 1;
                pos += 1;
            }
            b']' if depth > 0 => {
                depth -= 1;
                pos += 1;
            }
            b'.' | b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' => pos += 1,
            _ if depth > 0 => pos += 1,
            _ => break,
        }
    }

    (input[..pos].to_string(), pos)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned()?;
        self.pos += 1;
        Some(token)
    }

    fn binary(lhs: Expr, op: BinaryOp, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    fn expression(&mut self) -> Result<Expr> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.and_expr()?;
        while self.peek() == Some(&Token::OrOr) {
            self.pos += 1;
            let rhs = self.and_expr()?;
            lhs = Self::binary(lhs, BinaryOp::Or, rhs);
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.rel_expr()?;
        while self.peek() == Some(&Token::AndAnd) {
            self.pos += 1;
            let rhs = self.rel_expr()?;
            lhs = Self::binary(lhs, BinaryOp::And, rhs);
        }
        Ok(lhs)
    }

    fn rel_expr(&mut self) -> Result<Expr> {
        let lhs = self.add_expr()?;
        let op = match self.peek() {
            Some(Token::EqEq) => BinaryOp::Eq,
            Some(Token::NotEq) => BinaryOp::Neq,
            Some(Token::Lt) => BinaryOp::Lt,
            Some(Token::Lte) => BinaryOp::Lte,
            Some(Token::Gt) => BinaryOp::Gt,
            Some(Token::Gte) => BinaryOp::Gte,
            _ => return Ok(lhs),
        };
        self.pos += 1;
        let rhs = self.add_expr()?;
        Ok(Self::binary(lhs, op, rhs))
    }

    fn add_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.mul_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.mul_expr()?;
            lhs = Self::binary(lhs, op, rhs);
        }
    }

    fn mul_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Self::binary(lhs, op, rhs);
        }
    }

    fn unary(&mut self) -> Result<Expr> {
        let op = match self.peek() {
            Some(Token::Minus) => Some(UnaryOp::Neg),
            Some(Token::Plus) => Some(UnaryOp::Pos),
            Some(Token::Bang) => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            let operand = self.primary()?;
            Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            })
        } else {
            self.primary()
        }
    }

    fn primary(&mut self) -> Result<Expr> {
        match self.bump() {
            Some(Token::Int(value)) => Ok(Expr::Int(value)),
            Some(Token::Str(value)) => Ok(Expr::Str(value)),
            Some(Token::True) => Ok(Expr::Bool(true)),
            Some(Token::False) => Ok(Expr::Bool(false)),
            Some(Token::Var(path)) => Ok(Expr::Var(path)),
            Some(Token::LParen) => {
                let expr = self.expression()?;
                match self.bump() {
                    Some(Token::RParen) => Ok(expr),
                    _ => Err(Error::expression("expected ')'")),
                }
            }
            Some(token) => Err(Error::expression(format!(
                "unexpected token {token:?} in expression"
            ))),
            None => Err(Error::expression("unexpected end of expression")),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        let expr = parse("1 + 2 * 3").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Add,
                lhs: Box::new(Expr::Int(1)),
                rhs: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    lhs: Box::new(Expr::Int(2)),
                    rhs: Box::new(Expr::Int(3)),
                }),
            }
        );
    }

    #[test]
    fn parenthesized() {
        let expr = parse("(1 + 2) * 3").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Mul,
                lhs: Box::new(Expr::Binary {
                    op: BinaryOp::Add,
                    lhs: Box::new(Expr::Int(1)),
                    rhs: Box::new(Expr::Int(2)),
                }),
                rhs: Box::new(Expr::Int(3)),
            }
        );
    }

    #[test]
    fn variables_and_comparison() {
        let expr = parse("@.n > 1").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Gt,
                lhs: Box::new(Expr::Var(".n".to_string())),
                rhs: Box::new(Expr::Int(1)),
            }
        );

        let expr = parse("@[\"deep\"].x == 'str'").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Eq,
                lhs: Box::new(Expr::Var("[\"deep\"].x".to_string())),
                rhs: Box::new(Expr::Str("str".to_string())),
            }
        );
    }

    #[test]
    fn logical_chain() {
        let expr = parse("true && false || !true").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Or,
                lhs: Box::new(Expr::Binary {
                    op: BinaryOp::And,
                    lhs: Box::new(Expr::Bool(true)),
                    rhs: Box::new(Expr::Bool(false)),
                }),
                rhs: Box::new(Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(Expr::Bool(true)),
                }),
            }
        );
    }

    #[test]
    fn string_escapes() {
        let expr = parse(r#" "a\"b\n" "#).unwrap();
        assert_eq!(expr, Expr::Str("a\"b\n".to_string()));
        let expr = parse(r#"'it\'s'"#).unwrap();
        assert_eq!(expr, Expr::Str("it's".to_string()));
    }

    #[test]
    fn parse_failures() {
        assert!(parse("1 +").is_err());
        assert!(parse("= 2").is_err());
        assert!(parse("(1").is_err());
        assert!(parse("'unterminated").is_err());
        assert!(parse("frobnicate").is_err());
        assert!(parse("1 2").is_err());
        assert!(parse("& &").is_err());
    }
}
