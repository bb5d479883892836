use thiserror::Error;

/// A query text that could not be parsed. `position` is a byte offset into the text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected character '{found}' at offset {position}")]
    UnexpectedCharacter { position: usize, found: char },

    #[error("unexpected end of query at offset {position}")]
    UnexpectedEndOfInput { position: usize },

    #[error("malformed integer '{literal}' at offset {position}")]
    MalformedInteger { position: usize, literal: String },

    #[error("malformed number '{literal}' at offset {position}")]
    MalformedFloat { position: usize, literal: String },

    #[error("unterminated string literal starting at offset {position}")]
    UnterminatedString { position: usize },

    #[error("invalid escape sequence '{sequence}' at offset {position}")]
    InvalidEscape { position: usize, sequence: String },

    #[error("query '{query}' at offset {position} is not singular and cannot be compared")]
    NonSingularQuery { position: usize, query: String },

    #[error("empty bracketed selection at offset {position}")]
    EmptyBracket { position: usize },

    #[error("'{found}' at offset {position} does not start a selector")]
    InvalidSelector { position: usize, found: char },

    #[error("a query must start with '$' (offset {position})")]
    InvalidQueryPrefix { position: usize },

    #[error("unexpected trailing input '{remainder}' at offset {position}")]
    SuperfluousInput { position: usize, remainder: String },

    #[error("expression nesting exceeds {limit} levels at offset {position}")]
    NestingTooDeep { position: usize, limit: usize },
}

impl ParseError {
    pub fn position(&self) -> usize {
        match self {
            ParseError::UnexpectedCharacter { position, .. }
            | ParseError::UnexpectedEndOfInput { position }
            | ParseError::MalformedInteger { position, .. }
            | ParseError::MalformedFloat { position, .. }
            | ParseError::UnterminatedString { position }
            | ParseError::InvalidEscape { position, .. }
            | ParseError::NonSingularQuery { position, .. }
            | ParseError::EmptyBracket { position }
            | ParseError::InvalidSelector { position, .. }
            | ParseError::InvalidQueryPrefix { position }
            | ParseError::SuperfluousInput { position, .. }
            | ParseError::NestingTooDeep { position, .. } => *position,
        }
    }
}

/// A failure while evaluating a parsed query against a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("unknown variable '{name}'")]
    UnknownVariable { name: String },

    #[error("unknown function '{name}'")]
    UnknownFunction { name: String },

    #[error("function '{function}' takes {expected} argument(s) but was given {found}")]
    ArityMismatch {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: String,
        found: String,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("filter '{expression}' does not produce a logical result")]
    NonLogicalFilterResult { expression: String },

    #[error("cannot negate {operand}")]
    CannotNegate { operand: String },

    #[error("function '{function}' failed: {message}")]
    Function { function: String, message: String },
}

impl EvalError {
    pub fn type_mismatch(
        context: impl Into<String>,
        expected: impl ToString,
        found: impl ToString,
    ) -> Self {
        EvalError::TypeMismatch {
            context: context.into(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// An error raised from inside a function implementation.
    pub fn function(function: impl Into<String>, message: impl Into<String>) -> Self {
        EvalError::Function {
            function: function.into(),
            message: message.into(),
        }
    }
}
