use std::cmp::Ordering;

use crate::{
    storage::schema::TableSchema,
    types::{error::DatabaseError, row::Row, value::Value},
};

/// Comparison operators for predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl ComparisonOp {
    /// The operator that gives the same answer with operands swapped
    /// (`5 < id` is `id > 5`).
    pub fn flip(self) -> Self {
        match self {
            ComparisonOp::Equal => ComparisonOp::Equal,
            ComparisonOp::NotEqual => ComparisonOp::NotEqual,
            ComparisonOp::LessThan => ComparisonOp::GreaterThan,
            ComparisonOp::LessThanOrEqual => ComparisonOp::GreaterThanOrEqual,
            ComparisonOp::GreaterThan => ComparisonOp::LessThan,
            ComparisonOp::GreaterThanOrEqual => ComparisonOp::LessThanOrEqual,
        }
    }

    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            ComparisonOp::Equal => ordering == Ordering::Equal,
            ComparisonOp::NotEqual => ordering != Ordering::Equal,
            ComparisonOp::LessThan => ordering == Ordering::Less,
            ComparisonOp::LessThanOrEqual => ordering != Ordering::Greater,
            ComparisonOp::GreaterThan => ordering == Ordering::Greater,
            ComparisonOp::GreaterThanOrEqual => ordering != Ordering::Less,
        }
    }
}

/// A predicate expression for filtering rows
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Column comparison: column_name op value
    Comparison {
        column_name: String,
        op: ComparisonOp,
        value: Value,
    },
    /// Both sides must hold
    And(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    pub fn comparison(column_name: &str, op: ComparisonOp, value: impl Into<Value>) -> Self {
        Self::Comparison {
            column_name: column_name.to_string(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column_name: &str, value: impl Into<Value>) -> Self {
        Self::comparison(column_name, ComparisonOp::Equal, value)
    }

    pub fn lt(column_name: &str, value: impl Into<Value>) -> Self {
        Self::comparison(column_name, ComparisonOp::LessThan, value)
    }

    pub fn gt(column_name: &str, value: impl Into<Value>) -> Self {
        Self::comparison(column_name, ComparisonOp::GreaterThan, value)
    }

    /// Create an AND predicate
    pub fn and(left: Predicate, right: Predicate) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    /// Evaluate the predicate against a row using the table schema.
    /// Any comparison involving NULL, or values of unrelated types, is false.
    pub fn evaluate(&self, row: &Row, schema: &TableSchema) -> Result<bool, DatabaseError> {
        match self {
            Predicate::Comparison {
                column_name,
                op,
                value,
            } => {
                let column_index = schema.column_index(column_name)?;
                let row_value = row.get_value(column_index).ok_or_else(|| {
                    DatabaseError::SerializationError {
                        details: format!(
                            "Row has no value for column '{}' of '{}'",
                            column_name, schema.table_name
                        ),
                    }
                })?;
                Ok(row_value
                    .sql_cmp(value)
                    .is_some_and(|ordering| op.accepts(ordering)))
            }
            Predicate::And(left, right) => {
                // Short-circuit evaluation
                Ok(left.evaluate(row, schema)? && right.evaluate(row, schema)?)
            }
        }
    }

    /// Get all column names referenced in this predicate
    pub fn get_referenced_columns(&self) -> Vec<String> {
        let mut columns = Vec::new();
        self.collect_columns(&mut columns);
        columns.dedup();
        columns
    }

    fn collect_columns(&self, columns: &mut Vec<String>) {
        match self {
            Predicate::Comparison { column_name, .. } => columns.push(column_name.clone()),
            Predicate::And(left, right) => {
                left.collect_columns(columns);
                right.collect_columns(columns);
            }
        }
    }

    /// Validate that all referenced columns exist in the schema, so that an
    /// unknown column fails even on an empty table.
    pub fn validate_against_schema(&self, schema: &TableSchema) -> Result<(), DatabaseError> {
        for column_name in self.get_referenced_columns() {
            schema.column_index(&column_name)?;
        }
        Ok(())
    }
}
