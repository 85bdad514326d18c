//! Engine error types.

use thiserror::Error;

/// Rejections from the action grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty action")]
    Empty,

    #[error("legacy 'type: value' syntax is not supported, use 'type {{ ... }}': {0}")]
    LegacySyntax(String),

    #[error("action '{0}' has no operands")]
    NoOperands(String),

    #[error("unterminated action list: {0}")]
    UnterminatedList(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("handler type must not be empty")]
    EmptyType,
}

/// Faults raised while evaluating a condition. Callers see `false`.
#[derive(Debug, Error)]
pub enum ConditionError {
    #[error("unknown condition type: {0}")]
    UnknownType(String),

    #[error("condition '{0}' is missing operands")]
    MissingOperand(String),

    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    #[error("not a number: {0}")]
    NotANumber(String),

    #[error("invalid regex: {0}")]
    Regex(#[from] regex::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    #[error("executor is shut down")]
    Shutdown,

    #[error("worker dropped the task before completing it")]
    Dropped,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reasons a configured menu is left out of the table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MenuError {
    #[error("unknown menu type '{0}'")]
    UnknownType(String),

    #[error("modal menus need exactly 2 buttons, found {0}")]
    ModalButtons(usize),
}
