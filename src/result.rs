use crate::types::{
    error::{DatabaseError, ErrorKind},
    row::Row,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Succeeded,
    Failed,
}

#[derive(Debug)]
enum Outcome {
    Succeeded { columns: Vec<String>, rows: Vec<Row> },
    Failed(DatabaseError),
}

/// Outcome of one statement: the result rows or the error, never both.
#[derive(Debug)]
pub struct StatementResult {
    outcome: Outcome,
}

impl StatementResult {
    pub fn succeeded(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            outcome: Outcome::Succeeded { columns, rows },
        }
    }

    pub fn failed(error: DatabaseError) -> Self {
        Self {
            outcome: Outcome::Failed(error),
        }
    }

    pub fn status(&self) -> Status {
        match self.outcome {
            Outcome::Succeeded { .. } => Status::Succeeded,
            Outcome::Failed(_) => Status::Failed,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == Status::Succeeded
    }

    /// Result rows of a successful statement.
    ///
    /// # Panics
    ///
    /// Panics when the statement failed. Use [`StatementResult::try_rows`]
    /// when the status is not known.
    pub fn rows(&self) -> &[Row] {
        match &self.outcome {
            Outcome::Succeeded { rows, .. } => rows,
            Outcome::Failed(error) => panic!("rows() called on a failed statement: {}", error),
        }
    }

    pub fn try_rows(&self) -> Option<&[Row]> {
        match &self.outcome {
            Outcome::Succeeded { rows, .. } => Some(rows),
            Outcome::Failed(_) => None,
        }
    }

    /// Column names of the result rows; empty for failed statements and
    /// for statements that return no rows.
    pub fn columns(&self) -> &[String] {
        match &self.outcome {
            Outcome::Succeeded { columns, .. } => columns,
            Outcome::Failed(_) => &[],
        }
    }

    pub fn error(&self) -> Option<&DatabaseError> {
        match &self.outcome {
            Outcome::Succeeded { .. } => None,
            Outcome::Failed(error) => Some(error),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error().map(DatabaseError::kind)
    }

    pub fn into_result(self) -> Result<Vec<Row>, DatabaseError> {
        match self.outcome {
            Outcome::Succeeded { rows, .. } => Ok(rows),
            Outcome::Failed(error) => Err(error),
        }
    }
}
