//! Recursive-descent parser producing the expression AST.
//!
//! Precedence, loosest first: `or`, `and`, `not`, comparisons (chainable),
//! `+ -`, `* / // %`, unary `+ -`, `**` (right associative), atoms.

use super::lexer::{Spanned, Token};
use super::ExpressionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CompareOp {
    pub fn apply(self, left: f64, right: f64) -> bool {
        match self {
            Self::Lt => left < right,
            Self::Le => left <= right,
            Self::Gt => left > right,
            Self::Ge => left >= right,
            Self::Eq => left == right,
            Self::Ne => left != right,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Number(f64),
    Bool(bool),
    Field(String),
    Neg(Box<Node>),
    Not(Box<Node>),
    Binary(BinaryOp, Box<Node>, Box<Node>),
    /// `first op1 second op2 third ...`, true only if every link holds.
    Compare(Box<Node>, Vec<(CompareOp, Node)>),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
}

pub(crate) struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    source_len: usize,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Spanned>, source_len: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            source_len,
        }
    }

    pub(crate) fn parse(mut self) -> Result<Node, ExpressionError> {
        if self.tokens.is_empty() {
            return Err(ExpressionError::Empty);
        }
        let node = self.or_expr()?;
        match self.tokens.get(self.pos) {
            None => Ok(node),
            Some(extra) => Err(self.unexpected(extra)),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or_expr(&mut self) -> Result<Node, ExpressionError> {
        let mut left = self.and_expr()?;
        while self.eat(&Token::Or) {
            let right = self.and_expr()?;
            left = Node::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Node, ExpressionError> {
        let mut left = self.not_expr()?;
        while self.eat(&Token::And) {
            let right = self.not_expr()?;
            left = Node::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn not_expr(&mut self) -> Result<Node, ExpressionError> {
        if self.eat(&Token::Not) {
            let inner = self.not_expr()?;
            return Ok(Node::Not(Box::new(inner)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Node, ExpressionError> {
        let first = self.arith()?;
        let mut links = Vec::new();
        while let Some(op) = self.peek().and_then(compare_op) {
            self.pos += 1;
            links.push((op, self.arith()?));
        }
        if links.is_empty() {
            Ok(first)
        } else {
            Ok(Node::Compare(Box::new(first), links))
        }
    }

    fn arith(&mut self) -> Result<Node, ExpressionError> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.term()?;
            left = Node::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn term(&mut self) -> Result<Node, ExpressionError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::DoubleSlash) => BinaryOp::FloorDiv,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.unary()?;
            left = Node::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn unary(&mut self) -> Result<Node, ExpressionError> {
        if self.eat(&Token::Minus) {
            return Ok(Node::Neg(Box::new(self.unary()?)));
        }
        if self.eat(&Token::Plus) {
            return self.unary();
        }
        self.power()
    }

    fn power(&mut self) -> Result<Node, ExpressionError> {
        let base = self.atom()?;
        if self.eat(&Token::DoubleStar) {
            // -x binds looser than **, so the exponent goes back through unary.
            let exponent = self.unary()?;
            return Ok(Node::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Node, ExpressionError> {
        let Some(spanned) = self.tokens.get(self.pos).cloned() else {
            return Err(ExpressionError::UnexpectedEnd);
        };
        self.pos += 1;
        let node = match spanned.token {
            Token::Number(n) => Node::Number(n),
            Token::True => Node::Bool(true),
            Token::False => Node::Bool(false),
            Token::Name(name) => {
                self.reject_postfix(&name)?;
                Node::Field(name)
            }
            Token::LParen => {
                let inner = self.or_expr()?;
                if !self.eat(&Token::RParen) {
                    return match self.tokens.get(self.pos) {
                        Some(tok) => Err(self.unexpected(tok)),
                        None => Err(ExpressionError::UnexpectedEnd),
                    };
                }
                inner
            }
            _ => return Err(self.unexpected(&spanned)),
        };
        Ok(node)
    }

    /// Attribute access, calls and subscripts are never part of the language.
    fn reject_postfix(&self, name: &str) -> Result<(), ExpressionError> {
        let Some(next) = self.tokens.get(self.pos) else {
            return Ok(());
        };
        let what = match next.token {
            Token::Dot => format!("attribute access on '{name}'"),
            Token::LParen => format!("call of '{name}'"),
            Token::LBracket => format!("subscript of '{name}'"),
            _ => return Ok(()),
        };
        Err(ExpressionError::Forbidden {
            what,
            offset: next.offset,
        })
    }

    fn unexpected(&self, spanned: &Spanned) -> ExpressionError {
        let what = match spanned.token {
            Token::Dot => Some("attribute access"),
            Token::LBracket => Some("subscript"),
            Token::Comma => Some("tuple or argument list"),
            _ => None,
        };
        match what {
            Some(what) => ExpressionError::Forbidden {
                what: what.to_string(),
                offset: spanned.offset,
            },
            None => ExpressionError::UnexpectedToken {
                offset: spanned.offset.min(self.source_len),
            },
        }
    }
}

fn compare_op(token: &Token) -> Option<CompareOp> {
    match token {
        Token::Lt => Some(CompareOp::Lt),
        Token::Le => Some(CompareOp::Le),
        Token::Gt => Some(CompareOp::Gt),
        Token::Ge => Some(CompareOp::Ge),
        Token::EqEq => Some(CompareOp::Eq),
        Token::NotEq => Some(CompareOp::Ne),
        _ => None,
    }
}
