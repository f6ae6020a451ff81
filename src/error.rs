use crate::ast::Token;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unexpected character '{1}' at position {0}")]
    UnexpectedCharacter(usize, char),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unexpected {found} at position {position}, expected {expected}")]
    UnexpectedToken {
        position: usize,
        found: Token,
        expected: &'static str,
    },
    #[error("unbalanced parentheses")]
    UnbalancedParens,
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("empty expression")]
    EmptyExpression,
    #[error("function '{function}' takes {expected} argument(s), got {found}")]
    ArityMismatch {
        function: String,
        expected: usize,
        found: usize,
    },
    #[error("expression is nested more than {limit} levels deep")]
    TooDeep { limit: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("unbound variable '{0}'")]
    UnboundVariable(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    #[error("invalid range [{min}, {max}]: min must be finite and strictly less than max")]
    InvalidRange { min: f64, max: f64 },
    #[error("invalid resolution: at least one sample interval is required")]
    InvalidResolution,
}

/// Any failure along the text -> tokens -> AST -> value pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
    #[error(transparent)]
    Sample(#[from] SampleError),
    #[error("resolution {requested} exceeds the configured limit of {limit}")]
    ResolutionLimit { requested: usize, limit: usize },
}
