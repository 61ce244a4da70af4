//! Restricted boolean expression language for alarm conditions.
//!
//! Expressions such as `windSpeed > 3.33 and outTemp < 40` are compiled
//! once when the alarm is configured and then evaluated against each
//! archive record. The only names an expression can see are the record's
//! fields: there is no attribute access, no function calls, no subscripts
//! and no string literals, so a configuration file cannot reach anything
//! outside the record.
//!
//! A field the record does not carry is reported as
//! [`EvalError::FieldNotFound`], which callers treat as "no match for this
//! record" rather than a failure.

mod eval;
mod lexer;
mod parser;

use std::fmt;

pub use parser::{BinaryOp, CompareOp, Node};

use crate::record::Record;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// The expression text is not part of the language.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExpressionError {
    #[error("expression is empty")]
    Empty,

    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("invalid number '{text}' at offset {offset}")]
    InvalidNumber { text: String, offset: usize },

    #[error("unexpected token at offset {offset}")]
    UnexpectedToken { offset: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("{what} is not allowed (offset {offset})")]
    Forbidden { what: String, offset: usize },
}

/// Evaluating a valid expression against a particular record failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("name '{0}' is not defined")]
    FieldNotFound(String),

    #[error("field '{0}' has no value")]
    NoValue(String),

    #[error("division by zero")]
    DivisionByZero,
}

// ---------------------------------------------------------------------------
// Expression
// ---------------------------------------------------------------------------

/// A compiled alarm condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    root: Node,
}

impl Expression {
    /// Compile expression text.
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        let tokens = lexer::tokenize(source)?;
        let root = parser::Parser::new(tokens, source.len()).parse()?;
        Ok(Self {
            source: source.trim().to_string(),
            root,
        })
    }

    /// Evaluate against a record's fields.
    pub fn evaluate(&self, record: &Record) -> Result<bool, EvalError> {
        eval::evaluate(&self.root, record)
    }

    /// The expression as written in the configuration.
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn eval(source: &str, record: &Record) -> Result<bool, EvalError> {
        Expression::parse(source)
            .expect("expression should compile")
            .evaluate(record)
    }

    #[test]
    fn threshold_on_single_field() {
        let record = Record::new().with("outTemp", 38.2);
        assert_eq!(eval("outTemp < 40.0", &record), Ok(true));
        assert_eq!(eval("outTemp > 40.0", &record), Ok(false));
    }

    #[test]
    fn combines_fields_with_arithmetic_and_logic() {
        let record = Record::new()
            .with("windSpeed", 4.0)
            .with("windGust", 9.0)
            .with("outTemp", 12.0);
        assert_eq!(
            eval("windSpeed > 3.33 and (windGust - windSpeed) * 2 >= 10", &record),
            Ok(true)
        );
        assert_eq!(eval("not windSpeed > 3.33 || outTemp > 30", &record), Ok(false));
        assert_eq!(eval("0 < outTemp < 20 < windGust", &record), Ok(false));
        assert_eq!(eval("0 < outTemp < 20", &record), Ok(true));
    }

    #[test]
    fn missing_field_is_a_typed_error() {
        let record = Record::new().with("outTemp", 38.2);
        assert_eq!(
            eval("extraTemp9 > 1", &record),
            Err(EvalError::FieldNotFound("extraTemp9".into()))
        );
    }

    #[test]
    fn null_reading_is_reported_separately() {
        let record = Record::new().with_null("windGust");
        assert_eq!(
            eval("windGust > 10", &record),
            Err(EvalError::NoValue("windGust".into()))
        );
    }

    #[test]
    fn logic_short_circuits_past_missing_fields() {
        let record = Record::new().with("outTemp", 50.0);
        assert_eq!(eval("outTemp < 40 and missing > 1", &record), Ok(false));
        assert_eq!(eval("outTemp > 40 or missing > 1", &record), Ok(true));
        assert_matches!(
            eval("outTemp > 40 and missing > 1", &record),
            Err(EvalError::FieldNotFound(_))
        );
    }

    #[test]
    fn bare_number_uses_truthiness() {
        let record = Record::new().with("rain", 0.0);
        assert_eq!(eval("rain", &record), Ok(false));
        assert_eq!(eval("rain + 0.2", &record), Ok(true));
        assert_eq!(eval("True", &record), Ok(true));
    }

    #[test]
    fn rejects_escape_hatches() {
        for source in [
            "__import__('os')",
            "record.get('outTemp')",
            "max(outTemp, 1)",
            "lambda: 1",
            "outTemp = 3",
        ] {
            assert_matches!(
                Expression::parse(source),
                Err(ExpressionError::Forbidden { .. }),
                "{source} should be rejected"
            );
        }
    }

    #[test]
    fn keeps_trimmed_source_for_messages() {
        let expr = Expression::parse("  outTemp < 40.0 ").expect("should compile");
        assert_eq!(expr.source(), "outTemp < 40.0");
        assert_eq!(expr.to_string(), "outTemp < 40.0");
    }
}
