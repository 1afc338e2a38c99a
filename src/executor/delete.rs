use crate::{
    executor::{predicate::Predicate, scan::ScanIterator, sequential_scan::SequentialScanner},
    storage::{heap::TableHeap, page_store::PageStore, schema::TableSchema},
    types::{error::DatabaseError, row::Row},
};

/// Removes every matching row; the survivors keep their order.
pub struct TableDeleter<'a> {
    pager: &'a mut PageStore,
    schema: &'a TableSchema,
}

impl<'a> TableDeleter<'a> {
    pub fn new(pager: &'a mut PageStore, schema: &'a TableSchema) -> Self {
        Self { pager, schema }
    }

    /// Returns the number of rows removed.
    pub fn delete(&mut self, predicate: Option<&Predicate>) -> Result<usize, DatabaseError> {
        let schema = self.schema;
        if let Some(predicate) = predicate {
            predicate.validate_against_schema(schema)?;
        }

        let rows = ScanIterator::new(SequentialScanner::new(self.pager, schema))
            .collect::<Result<Vec<Row>, _>>()?;
        let total = rows.len();

        let mut records = Vec::with_capacity(total);
        for row in rows {
            let matches = match predicate {
                Some(predicate) => predicate.evaluate(&row, schema)?,
                None => true,
            };
            if !matches {
                records.push(row.encode(schema)?);
            }
        }

        let deleted = total - records.len();
        if deleted > 0 {
            TableHeap::new(schema.root_page_id).rewrite(self.pager, records)?;
        }
        Ok(deleted)
    }
}
