use serde::{Deserialize, Serialize};

use crate::{
    storage::schema::TableSchema,
    types::{error::DatabaseError, value::Value},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get_value(&self, column_index: usize) -> Option<&Value> {
        self.values.get(column_index)
    }

    pub fn set_value(&mut self, column_index: usize, value: Value) -> Result<(), DatabaseError> {
        let slot = self.values.get_mut(column_index).ok_or_else(|| {
            DatabaseError::SerializationError {
                details: format!("Column index {} out of bounds", column_index),
            }
        })?;
        *slot = value;
        Ok(())
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Size of the schema-free encoding produced by [`Row::to_bytes`].
    pub fn size(&self) -> usize {
        4 + self.values.iter().map(Value::serialized_size).sum::<usize>()
    }

    /// Schema-free encoding: value count (4 bytes) followed by each value.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.size());
        buffer.extend_from_slice(&(self.values.len() as u32).to_le_bytes());
        for value in &self.values {
            value.write_to(&mut buffer);
        }
        buffer
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DatabaseError> {
        let count: [u8; 4] = bytes
            .get(0..4)
            .and_then(|slice| slice.try_into().ok())
            .ok_or_else(|| DatabaseError::SerializationError {
                details: "Incomplete value count".to_string(),
            })?;
        let value_count = u32::from_le_bytes(count) as usize;

        let mut cursor = 4;
        let mut values = Vec::with_capacity(value_count.min(bytes.len()));
        for _ in 0..value_count {
            let (value, consumed) = Value::from_bytes(&bytes[cursor..])?;
            values.push(value);
            cursor += consumed;
        }
        ensure_consumed(bytes, cursor)?;

        Ok(Row { values })
    }

    /// Encode the row in the column order of `schema`. The record carries no
    /// column count; the schema supplies it on decode.
    pub fn encode(&self, schema: &TableSchema) -> Result<Vec<u8>, DatabaseError> {
        if self.values.len() != schema.columns.len() {
            return Err(DatabaseError::ColumnCountMismatch {
                table: schema.table_name.clone(),
                expected: schema.columns.len(),
                actual: self.values.len(),
            });
        }

        let mut buffer = Vec::with_capacity(
            self.values.iter().map(Value::serialized_size).sum::<usize>(),
        );
        for (value, column) in self.values.iter().zip(&schema.columns) {
            if !value.is_null() && value.data_type() != Some(column.data_type) {
                return Err(DatabaseError::TypeMismatch {
                    column: column.name.clone(),
                    expected: column.data_type.to_string(),
                    actual: value.type_name().to_string(),
                });
            }
            value.write_to(&mut buffer);
        }
        Ok(buffer)
    }

    pub fn decode(bytes: &[u8], schema: &TableSchema) -> Result<Self, DatabaseError> {
        let mut cursor = 0;
        let mut values = Vec::with_capacity(schema.columns.len());
        for column in &schema.columns {
            if cursor >= bytes.len() {
                return Err(DatabaseError::SerializationError {
                    details: format!(
                        "Record for table '{}' ends before column '{}'",
                        schema.table_name, column.name
                    ),
                });
            }
            let (value, consumed) = Value::from_bytes(&bytes[cursor..])?;
            if !value.is_null() && value.data_type() != Some(column.data_type) {
                return Err(DatabaseError::SerializationError {
                    details: format!(
                        "Column '{}' holds {} but is declared {}",
                        column.name,
                        value.type_name(),
                        column.data_type
                    ),
                });
            }
            values.push(value);
            cursor += consumed;
        }
        ensure_consumed(bytes, cursor)?;

        Ok(Row { values })
    }
}

fn ensure_consumed(bytes: &[u8], cursor: usize) -> Result<(), DatabaseError> {
    if cursor != bytes.len() {
        return Err(DatabaseError::SerializationError {
            details: format!("{} trailing bytes after record", bytes.len() - cursor),
        });
    }
    Ok(())
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row::new(values)
    }
}
