// src/error.rs
use jsonsift_jpath::{EvalError, ParseError};
use thiserror::Error;

/// Any failure from parsing or running a query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid query: {0}")]
    Parse(#[from] ParseError),

    #[error("Query evaluation failed: {0}")]
    Eval(#[from] EvalError),
}
