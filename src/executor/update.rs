use crate::{
    executor::{
        predicate::Predicate,
        scan::ScanIterator,
        sequential_scan::SequentialScanner,
    },
    planner::{expression::Expression, logical_plan::Assignment},
    storage::{heap::TableHeap, page_store::PageStore, schema::TableSchema},
    types::{error::DatabaseError, row::Row, value::Value},
};

/// Applies SET assignments to every matching row. Rows keep their storage
/// order; the heap is rewritten only when something matched.
pub struct TableUpdater<'a> {
    pager: &'a mut PageStore,
    schema: &'a TableSchema,
}

impl<'a> TableUpdater<'a> {
    pub fn new(pager: &'a mut PageStore, schema: &'a TableSchema) -> Self {
        Self { pager, schema }
    }

    /// Returns the number of rows changed.
    pub fn update(
        &mut self,
        assignments: &[Assignment],
        predicate: Option<&Predicate>,
    ) -> Result<usize, DatabaseError> {
        let schema = self.schema;
        if let Some(predicate) = predicate {
            predicate.validate_against_schema(schema)?;
        }
        let targets = assignments
            .iter()
            .map(|assignment| -> Result<(usize, &Expression), DatabaseError> {
                for column in assignment.value.referenced_columns() {
                    schema.column_index(column)?;
                }
                Ok((schema.column_index(&assignment.column)?, &assignment.value))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let rows = ScanIterator::new(SequentialScanner::new(self.pager, schema))
            .collect::<Result<Vec<Row>, _>>()?;

        let mut updated = 0;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let matches = match predicate {
                Some(predicate) => predicate.evaluate(&row, schema)?,
                None => true,
            };
            let row = if matches {
                updated += 1;
                apply_assignments(schema, &targets, row)?
            } else {
                row
            };
            records.push(row.encode(schema)?);
        }

        if updated > 0 {
            TableHeap::new(schema.root_page_id).rewrite(self.pager, records)?;
        }
        Ok(updated)
    }
}

// Every expression sees the row as it was before the statement
fn apply_assignments(
    schema: &TableSchema,
    targets: &[(usize, &Expression)],
    row: Row,
) -> Result<Row, DatabaseError> {
    let resolve = |name: &str| -> Result<Value, DatabaseError> {
        let index = schema.column_index(name)?;
        Ok(row.get_value(index).cloned().unwrap_or(Value::Null))
    };

    let mut values = row.values.clone();
    for (index, expression) in targets {
        values[*index] = expression.evaluate(&resolve)?;
    }
    schema.coerce_row(Row::new(values))
}
