use crate::types::error::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error("SQL parsing error: {0}")]
    SqlParser(#[from] sqlparser::parser::ParserError),
    #[error("Unsupported statement: {0}")]
    UnsupportedStatement(String),
    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),
    #[error("Invalid query structure: {0}")]
    InvalidQuery(String),
    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),
    #[error("Statement expects {expected} argument(s) but {actual} were supplied")]
    ParameterCountMismatch { expected: usize, actual: usize },
    #[error("Invalid placeholder: {0}")]
    InvalidPlaceholder(String),
    #[error("No such column: {qualifier}.{column}")]
    UnknownQualifiedColumn { qualifier: String, column: String },
}

impl PlannerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlannerError::ParameterCountMismatch { .. } | PlannerError::InvalidPlaceholder(_) => {
                ErrorKind::Binding
            }
            PlannerError::UnknownQualifiedColumn { .. } => ErrorKind::UnknownColumn,
            _ => ErrorKind::Syntax,
        }
    }
}
