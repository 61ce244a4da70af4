//! AST evaluation against a single [`Record`].

use super::parser::{BinaryOp, Node};
use super::EvalError;
use crate::record::Record;

/// Intermediate value: comparisons and logic produce booleans, everything
/// else produces numbers. Booleans take part in arithmetic as 0/1.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Value {
    Number(f64),
    Bool(bool),
}

impl Value {
    fn as_f64(self) -> f64 {
        match self {
            Self::Number(n) => n,
            Self::Bool(b) => f64::from(u8::from(b)),
        }
    }

    fn truthy(self) -> bool {
        match self {
            Self::Number(n) => n != 0.0,
            Self::Bool(b) => b,
        }
    }
}

pub(crate) fn evaluate(node: &Node, record: &Record) -> Result<bool, EvalError> {
    eval(node, record).map(Value::truthy)
}

fn eval(node: &Node, record: &Record) -> Result<Value, EvalError> {
    match node {
        Node::Number(n) => Ok(Value::Number(*n)),
        Node::Bool(b) => Ok(Value::Bool(*b)),
        Node::Field(name) => match record.get(name) {
            Some(Some(v)) => Ok(Value::Number(v)),
            Some(None) => Err(EvalError::NoValue(name.clone())),
            None => Err(EvalError::FieldNotFound(name.clone())),
        },
        Node::Neg(inner) => Ok(Value::Number(-eval(inner, record)?.as_f64())),
        Node::Not(inner) => Ok(Value::Bool(!eval(inner, record)?.truthy())),
        Node::And(left, right) => {
            if !eval(left, record)?.truthy() {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(eval(right, record)?.truthy()))
        }
        Node::Or(left, right) => {
            if eval(left, record)?.truthy() {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(eval(right, record)?.truthy()))
        }
        Node::Compare(first, links) => {
            let mut left = eval(first, record)?.as_f64();
            for (op, operand) in links {
                let right = eval(operand, record)?.as_f64();
                if !op.apply(left, right) {
                    return Ok(Value::Bool(false));
                }
                left = right;
            }
            Ok(Value::Bool(true))
        }
        Node::Binary(op, left, right) => {
            let l = eval(left, record)?.as_f64();
            let r = eval(right, record)?.as_f64();
            arithmetic(*op, l, r).map(Value::Number)
        }
    }
}

fn arithmetic(op: BinaryOp, l: f64, r: f64) -> Result<f64, EvalError> {
    let needs_divisor = matches!(op, BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod);
    if needs_divisor && r == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    Ok(match op {
        BinaryOp::Add => l + r,
        BinaryOp::Sub => l - r,
        BinaryOp::Mul => l * r,
        BinaryOp::Div => l / r,
        BinaryOp::FloorDiv => (l / r).floor(),
        // Result takes the divisor's sign (floored modulo).
        BinaryOp::Mod => l - r * (l / r).floor(),
        BinaryOp::Pow => l.powf(r),
    })
}
