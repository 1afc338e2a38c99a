pub mod create_table;
pub mod delete;
pub mod insert;
pub mod predicate;
pub mod scan;
pub mod sequential_scan;
pub mod update;

use tracing::debug;

use crate::{
    executor::{
        create_table::CreateTableExecutor,
        delete::TableDeleter,
        insert::{Inserter, TableInserter},
        scan::Scanner,
        sequential_scan::SequentialScanner,
        update::TableUpdater,
    },
    planner::logical_plan::{InsertPlan, LogicalPlan, Projection, SelectPlan},
    storage::{catalog::Catalog, page_store::PageStore},
    types::{error::DatabaseError, row::Row},
};

const SCAN_BATCH_SIZE: usize = 64;

/// Rows produced by a statement together with their column names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Runs a compiled plan against the catalog and page store. Writes stay
/// buffered in the page store; flushing is the caller's job.
pub struct Executor;

impl Executor {
    pub fn execute(
        plan: &LogicalPlan,
        catalog: &mut Catalog,
        pager: &mut PageStore,
    ) -> Result<QueryOutput, DatabaseError> {
        match plan {
            LogicalPlan::CreateTable(create) => {
                CreateTableExecutor::new(catalog, pager).execute_create(create)?;
                Ok(QueryOutput::default())
            }
            LogicalPlan::DropTable(drop) => {
                CreateTableExecutor::new(catalog, pager).execute_drop(drop)?;
                Ok(QueryOutput::default())
            }
            LogicalPlan::Insert(insert) => {
                Self::execute_insert(insert, catalog, pager)?;
                Ok(QueryOutput::default())
            }
            LogicalPlan::Select(select) => Self::execute_select(select, catalog, pager),
            LogicalPlan::Update(update) => {
                let schema = catalog.get_table(&update.table_name)?;
                let updated = TableUpdater::new(pager, schema)
                    .update(&update.assignments, update.predicate.as_ref())?;
                debug!("Updated {} row(s) of '{}'", updated, schema.table_name);
                Ok(QueryOutput::default())
            }
            LogicalPlan::Delete(delete) => {
                let schema = catalog.get_table(&delete.table_name)?;
                let deleted = TableDeleter::new(pager, schema).delete(delete.predicate.as_ref())?;
                debug!("Deleted {} row(s) from '{}'", deleted, schema.table_name);
                Ok(QueryOutput::default())
            }
        }
    }

    fn execute_insert(
        plan: &InsertPlan,
        catalog: &Catalog,
        pager: &mut PageStore,
    ) -> Result<(), DatabaseError> {
        let schema = catalog.get_table(&plan.table_name)?;
        let rows = plan
            .values
            .iter()
            .map(|values| TableInserter::build_row(schema, plan.columns.as_deref(), values.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        let count = rows.len();
        let mut inserter = TableInserter::new(pager, schema);
        inserter.insert_batch(rows)?;
        debug!("Inserted {} row(s) into '{}'", count, inserter.table_name());
        Ok(())
    }

    fn execute_select(
        plan: &SelectPlan,
        catalog: &Catalog,
        pager: &mut PageStore,
    ) -> Result<QueryOutput, DatabaseError> {
        let schema = catalog.get_table(&plan.table_name)?;
        if let Some(predicate) = &plan.predicate {
            predicate.validate_against_schema(schema)?;
        }

        let (columns, indices) = match &plan.projection {
            Projection::All => (schema.column_names(), (0..schema.columns.len()).collect()),
            Projection::Columns(names) => {
                let indices = names
                    .iter()
                    .map(|name| schema.column_index(name))
                    .collect::<Result<Vec<_>, _>>()?;
                let columns = indices
                    .iter()
                    .map(|&index| schema.columns[index].name.clone())
                    .collect();
                (columns, indices)
            }
        };

        let mut scanner = SequentialScanner::new(pager, schema);
        scanner.reset()?;
        let mut rows = Vec::new();
        loop {
            let batch = scanner.scan_batch(SCAN_BATCH_SIZE)?;
            if batch.is_empty() {
                break;
            }
            for row in batch {
                let keep = match &plan.predicate {
                    Some(predicate) => predicate.evaluate(&row, schema)?,
                    None => true,
                };
                if keep {
                    rows.push(project(row, &indices));
                }
            }
        }

        Ok(QueryOutput { columns, rows })
    }
}

fn project(row: Row, indices: &[usize]) -> Row {
    if indices.len() == row.len() && indices.iter().enumerate().all(|(i, &index)| i == index) {
        return row;
    }
    Row::new(
        indices
            .iter()
            .filter_map(|&index| row.get_value(index).cloned())
            .collect(),
    )
}
