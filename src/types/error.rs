use std::fmt;

use thiserror::Error;

use crate::{planner::error::PlannerError, types::PageId};

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Incomplete write of page {page_id}: {details}")]
    IncompleteWrite { page_id: PageId, details: String },

    #[error("Serialization/deserialization error: {details}")]
    SerializationError { details: String },

    #[error("Invalid database header: {reason}")]
    InvalidHeader { reason: String },

    #[error("Corrupted page: page_id={page_id}, reason={reason}")]
    CorruptedPage { page_id: PageId, reason: String },

    #[error("Corrupted database: {reason}")]
    CorruptedDatabase { reason: String },

    #[error("Invalid page type: {0}")]
    InvalidPageType(u8),

    #[error("Table '{name}' already exists")]
    DuplicateTable { name: String },

    #[error("Table '{name}' not found")]
    TableNotFound { name: String },

    #[error("Column '{name}' not found in table '{table}'")]
    ColumnNotFound { name: String, table: String },

    #[error("Invalid schema for table '{table}': {details}")]
    InvalidSchema { table: String, details: String },

    #[error("Table '{table}' has {expected} columns but {actual} values were supplied")]
    ColumnCountMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },

    #[error("Type mismatch for '{column}': expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },

    #[error("Column '{column}' cannot be NULL")]
    NotNullViolation { column: String },

    #[error("Row transform failed: {details}")]
    Transform { details: String },

    #[error(transparent)]
    Planner(#[from] PlannerError),
}

impl From<sqlparser::parser::ParserError> for DatabaseError {
    fn from(error: sqlparser::parser::ParserError) -> Self {
        DatabaseError::Planner(PlannerError::SqlParser(error))
    }
}

impl DatabaseError {
    /// The stable error category reported to callers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DatabaseError::Io(_) | DatabaseError::IncompleteWrite { .. } => ErrorKind::Io,
            DatabaseError::SerializationError { .. }
            | DatabaseError::InvalidHeader { .. }
            | DatabaseError::CorruptedPage { .. }
            | DatabaseError::CorruptedDatabase { .. }
            | DatabaseError::InvalidPageType(_) => ErrorKind::CorruptData,
            DatabaseError::DuplicateTable { .. } => ErrorKind::DuplicateTable,
            DatabaseError::TableNotFound { .. } => ErrorKind::UnknownTable,
            DatabaseError::ColumnNotFound { .. } => ErrorKind::UnknownColumn,
            DatabaseError::InvalidSchema { .. } | DatabaseError::ColumnCountMismatch { .. } => {
                ErrorKind::Syntax
            }
            DatabaseError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            DatabaseError::NotNullViolation { .. } => ErrorKind::Constraint,
            DatabaseError::Transform { .. } => ErrorKind::Transform,
            DatabaseError::Planner(planner_error) => planner_error.kind(),
        }
    }
}

/// Closed set of error categories a failed statement can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Io,
    CorruptData,
    DuplicateTable,
    UnknownTable,
    UnknownColumn,
    Binding,
    Syntax,
    TypeMismatch,
    Constraint,
    Transform,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Io => "IOError",
            ErrorKind::CorruptData => "CorruptDataError",
            ErrorKind::DuplicateTable => "DuplicateTableError",
            ErrorKind::UnknownTable => "UnknownTableError",
            ErrorKind::UnknownColumn => "UnknownColumnError",
            ErrorKind::Binding => "BindingError",
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::TypeMismatch => "TypeMismatchError",
            ErrorKind::Constraint => "ConstraintError",
            ErrorKind::Transform => "TransformError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
