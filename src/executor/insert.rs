use crate::{
    storage::{heap::TableHeap, page_store::PageStore, schema::TableSchema},
    types::{error::DatabaseError, row::Row, value::Value},
};

/// Trait for inserting data into database tables
pub trait Inserter {
    /// Insert rows in order; nothing is written unless every row is valid
    fn insert_batch(&mut self, rows: Vec<Row>) -> Result<(), DatabaseError>;

    /// Get the table name this inserter operates on
    fn table_name(&self) -> &str;
}

/// Appends rows to the end of a table's heap.
pub struct TableInserter<'a> {
    pager: &'a mut PageStore,
    schema: &'a TableSchema,
    heap: TableHeap,
}

impl<'a> TableInserter<'a> {
    pub fn new(pager: &'a mut PageStore, schema: &'a TableSchema) -> Self {
        Self {
            pager,
            heap: TableHeap::new(schema.root_page_id),
            schema,
        }
    }

    /// Arrange `values` into schema order. With a column list, unlisted
    /// columns take their default (or NULL).
    pub fn build_row(
        schema: &TableSchema,
        columns: Option<&[String]>,
        values: Vec<Value>,
    ) -> Result<Row, DatabaseError> {
        let Some(columns) = columns else {
            return Ok(Row::new(values));
        };
        if columns.len() != values.len() {
            return Err(DatabaseError::ColumnCountMismatch {
                table: schema.table_name.clone(),
                expected: columns.len(),
                actual: values.len(),
            });
        }

        let mut row: Vec<Value> = schema
            .columns
            .iter()
            .map(|column| column.default_or_null())
            .collect();
        for (name, value) in columns.iter().zip(values) {
            let index = schema.column_index(name)?;
            row[index] = value;
        }
        Ok(Row::new(row))
    }

    /// Coerce and encode a row into the record stored in the heap.
    fn prepare(&self, row: Row) -> Result<Vec<u8>, DatabaseError> {
        let row = self.schema.coerce_row(row)?;
        row.encode(self.schema)
    }
}

impl Inserter for TableInserter<'_> {
    fn insert_batch(&mut self, rows: Vec<Row>) -> Result<(), DatabaseError> {
        if rows.is_empty() {
            return Ok(());
        }

        // Validate all rows before starting batch insertion
        let records = rows
            .into_iter()
            .map(|row| self.prepare(row))
            .collect::<Result<Vec<_>, _>>()?;

        self.heap.append_all(self.pager, &records)
    }

    fn table_name(&self) -> &str {
        &self.schema.table_name
    }
}
