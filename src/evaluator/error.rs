//! Error types for the script micro-interpreter.

use thiserror::Error;

/// Failures raised while lexing, parsing or evaluating a script snippet.
///
/// Most variants are recoverable: the driver swallows them during variable
/// pre-population and falls back to literal/placeholder output for prints.
/// Fatal variants abort the whole submission.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScriptError {
  #[error("syntax error: {0}")]
  Syntax(String),

  #[error("name '{0}' is not defined")]
  UndefinedName(String),

  #[error("type error: {0}")]
  Type(String),

  #[error("value error: {0}")]
  Value(String),

  #[error("index out of range")]
  IndexOutOfRange,

  #[error("division by zero")]
  ZeroDivision,

  #[error("integer overflow")]
  Overflow,

  #[error("unknown function: {0}")]
  UnknownFunction(String),

  #[error("limit exceeded: {0}")]
  LimitExceeded(String),

  #[error("submission too large ({0} bytes)")]
  SourceTooLarge(usize),
}

impl ScriptError {
  /// Fatal errors are never swallowed by the best-effort passes.
  pub fn is_fatal(&self) -> bool {
    matches!(self, ScriptError::LimitExceeded(_) | ScriptError::SourceTooLarge(_))
  }
}

pub type ScriptResult<T> = Result<T, ScriptError>;
