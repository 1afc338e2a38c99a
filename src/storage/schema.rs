use serde::{Deserialize, Serialize};

use crate::types::{
    PageId,
    error::DatabaseError,
    row::Row,
    value::{DataType, Value},
};

/// Represents a column definition in a table schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: DataType,
    pub position: usize,
    pub nullable: bool,
    pub default_value: Option<Value>,
}

impl ColumnSchema {
    pub fn new(name: String, data_type: DataType, position: usize) -> Self {
        Self {
            name,
            data_type,
            position,
            nullable: true,
            default_value: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_default(mut self, default_value: Value) -> Self {
        self.default_value = Some(default_value);
        self
    }

    /// Value an INSERT stores when the column is not listed
    pub fn default_or_null(&self) -> Value {
        self.default_value.clone().unwrap_or(Value::Null)
    }

    /// Convert `value` for storage in this column, enforcing NOT NULL.
    pub fn coerce(&self, value: Value) -> Result<Value, DatabaseError> {
        if value.is_null() {
            if !self.nullable {
                return Err(DatabaseError::NotNullViolation {
                    column: self.name.clone(),
                });
            }
            return Ok(Value::Null);
        }
        value
            .coerce_to(self.data_type)
            .ok_or_else(|| DatabaseError::TypeMismatch {
                column: self.name.clone(),
                expected: self.data_type.to_string(),
                actual: value.type_name().to_string(),
            })
    }
}

/// Represents a complete table schema with all column definitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<ColumnSchema>,
    pub root_page_id: PageId,
    pub sql: String,
}

impl TableSchema {
    pub fn new(
        table_name: String,
        columns: Vec<ColumnSchema>,
        root_page_id: PageId,
        sql: String,
    ) -> Self {
        Self {
            table_name,
            columns,
            root_page_id,
            sql,
        }
    }

    /// Get column by name (case-insensitive)
    pub fn get_column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns
            .iter()
            .find(|col| col.name.eq_ignore_ascii_case(name))
    }

    /// Get column index by name (case-insensitive)
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|col| col.name.eq_ignore_ascii_case(name))
    }

    /// Like [`TableSchema::get_column_index`], failing with `ColumnNotFound`.
    pub fn column_index(&self, name: &str) -> Result<usize, DatabaseError> {
        self.get_column_index(name)
            .ok_or_else(|| DatabaseError::ColumnNotFound {
                name: name.to_string(),
                table: self.table_name.clone(),
            })
    }

    /// Get all column names in order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|col| col.name.clone()).collect()
    }

    /// Check the definition itself: at least one column, unique names,
    /// positions matching order and defaults storable in their column.
    pub fn validate(&self) -> Result<(), DatabaseError> {
        if self.columns.is_empty() {
            return Err(DatabaseError::InvalidSchema {
                table: self.table_name.clone(),
                details: "a table needs at least one column".to_string(),
            });
        }

        for (index, column) in self.columns.iter().enumerate() {
            if column.position != index {
                return Err(DatabaseError::InvalidSchema {
                    table: self.table_name.clone(),
                    details: format!(
                        "column '{}' at index {} claims position {}",
                        column.name, index, column.position
                    ),
                });
            }
            if self.columns[..index]
                .iter()
                .any(|earlier| earlier.name.eq_ignore_ascii_case(&column.name))
            {
                return Err(DatabaseError::InvalidSchema {
                    table: self.table_name.clone(),
                    details: format!("duplicate column name '{}'", column.name),
                });
            }
            if let Some(default_value) = &column.default_value {
                column.coerce(default_value.clone())?;
            }
        }
        Ok(())
    }

    /// Coerce every value of `row` into its column, enforcing arity, types
    /// and NOT NULL.
    pub fn coerce_row(&self, row: Row) -> Result<Row, DatabaseError> {
        if row.len() != self.columns.len() {
            return Err(DatabaseError::ColumnCountMismatch {
                table: self.table_name.clone(),
                expected: self.columns.len(),
                actual: row.len(),
            });
        }

        let values = row
            .into_values()
            .into_iter()
            .zip(&self.columns)
            .map(|(value, column)| column.coerce(value))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Row::new(values))
    }
}
