use crate::expression::ExpressionError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Missing section: [{0}]")]
    MissingSection(String),

    #[error("Missing required option '{key}' in [{section}]")]
    MissingKey { section: String, key: &'static str },

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("Invalid alarm expression: {0}")]
    Expression(#[from] ExpressionError),

    #[error("Config parse error: {0}")]
    Parse(String),
}
