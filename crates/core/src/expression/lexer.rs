//! Tokenizer for alarm expressions.

use super::ExpressionError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    Name(String),
    True,
    False,
    And,
    Or,
    Not,
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    DoubleStar,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
    LParen,
    RParen,
    /// Tokens that only exist to be rejected by the parser with a precise error.
    Dot,
    LBracket,
    Comma,
}

/// A token plus the byte offset it started at.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub offset: usize,
}

/// Keywords that would give an expression reach outside the record.
const FORBIDDEN_KEYWORDS: &[&str] = &["import", "lambda", "exec", "eval", "is", "in"];

pub(crate) fn tokenize(source: &str) -> Result<Vec<Spanned>, ExpressionError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        let start = pos;

        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        if c.is_ascii_digit() || (c == b'.' && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit))
        {
            pos = scan_number(bytes, pos);
            let text = &source[start..pos];
            let value = text
                .parse::<f64>()
                .map_err(|_| ExpressionError::InvalidNumber {
                    text: text.to_string(),
                    offset: start,
                })?;
            tokens.push(Spanned {
                token: Token::Number(value),
                offset: start,
            });
            continue;
        }

        if c.is_ascii_alphabetic() || c == b'_' {
            while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_') {
                pos += 1;
            }
            let word = &source[start..pos];
            let token = match word {
                "True" => Token::True,
                "False" => Token::False,
                "and" => Token::And,
                "or" => Token::Or,
                "not" => Token::Not,
                w if FORBIDDEN_KEYWORDS.contains(&w) => {
                    return Err(ExpressionError::Forbidden {
                        what: format!("keyword '{w}'"),
                        offset: start,
                    });
                }
                w if w.starts_with("__") => {
                    return Err(ExpressionError::Forbidden {
                        what: format!("dunder name '{w}'"),
                        offset: start,
                    });
                }
                w => Token::Name(w.to_string()),
            };
            tokens.push(Spanned {
                token,
                offset: start,
            });
            continue;
        }

        let next = bytes.get(pos + 1).copied();
        let (token, width) = match (c, next) {
            (b'*', Some(b'*')) => (Token::DoubleStar, 2),
            (b'/', Some(b'/')) => (Token::DoubleSlash, 2),
            (b'<', Some(b'=')) => (Token::Le, 2),
            (b'>', Some(b'=')) => (Token::Ge, 2),
            (b'=', Some(b'=')) => (Token::EqEq, 2),
            (b'!', Some(b'=')) => (Token::NotEq, 2),
            (b'&', Some(b'&')) => (Token::And, 2),
            (b'|', Some(b'|')) => (Token::Or, 2),
            (b'+', _) => (Token::Plus, 1),
            (b'-', _) => (Token::Minus, 1),
            (b'*', _) => (Token::Star, 1),
            (b'/', _) => (Token::Slash, 1),
            (b'%', _) => (Token::Percent, 1),
            (b'<', _) => (Token::Lt, 1),
            (b'>', _) => (Token::Gt, 1),
            (b'!', _) => (Token::Not, 1),
            (b'(', _) => (Token::LParen, 1),
            (b')', _) => (Token::RParen, 1),
            (b'.', _) => (Token::Dot, 1),
            (b'[', _) => (Token::LBracket, 1),
            (b',', _) => (Token::Comma, 1),
            (b'\'' | b'"', _) => {
                return Err(ExpressionError::Forbidden {
                    what: "string literal".to_string(),
                    offset: start,
                });
            }
            (b'=', _) => {
                return Err(ExpressionError::Forbidden {
                    what: "assignment".to_string(),
                    offset: start,
                });
            }
            _ => {
                let ch = source[start..].chars().next().unwrap_or('?');
                return Err(ExpressionError::UnexpectedChar { ch, offset: start });
            }
        };
        tokens.push(Spanned {
            token,
            offset: start,
        });
        pos += width;
    }

    Ok(tokens)
}

/// Advance over `digits [. digits] [e|E [+|-] digits]`.
fn scan_number(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos < bytes.len() && bytes[pos] == b'.' {
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
    }
    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        let mut exp = pos + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        if exp < bytes.len() && bytes[exp].is_ascii_digit() {
            pos = exp;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
        }
    }
    pos
}
