use crate::{
    planner::logical_plan::{ColumnDefinition, CreateTablePlan, DropTablePlan},
    storage::{
        catalog::Catalog,
        page_store::PageStore,
        schema::{ColumnSchema, TableSchema},
    },
    types::{error::DatabaseError, value::DataType},
};

/// Trait for creating and dropping tables in the database
pub trait TableCreator {
    /// Create a new table with the specified schema
    fn create_table(
        &mut self,
        table_name: &str,
        columns: Vec<ColumnSchema>,
        sql: &str,
    ) -> Result<TableSchema, DatabaseError>;

    /// Drop a table and release its pages
    fn drop_table(&mut self, table_name: &str) -> Result<TableSchema, DatabaseError>;

    /// Check if a table exists
    fn table_exists(&self, table_name: &str) -> bool;
}

/// Runs CREATE TABLE and DROP TABLE against the catalog.
pub struct CreateTableExecutor<'a> {
    catalog: &'a mut Catalog,
    pager: &'a mut PageStore,
}

impl<'a> CreateTableExecutor<'a> {
    pub fn new(catalog: &'a mut Catalog, pager: &'a mut PageStore) -> Self {
        Self { catalog, pager }
    }

    /// Returns whether a table was created (`false` when IF NOT EXISTS
    /// found one already).
    pub fn execute_create(&mut self, plan: &CreateTablePlan) -> Result<bool, DatabaseError> {
        if plan.if_not_exists && self.table_exists(&plan.table_name) {
            return Ok(false);
        }
        let columns = TableSchemaBuilder::columns_from_definitions(&plan.columns);
        self.create_table(&plan.table_name, columns, &plan.sql)?;
        Ok(true)
    }

    /// Returns whether a table was dropped.
    pub fn execute_drop(&mut self, plan: &DropTablePlan) -> Result<bool, DatabaseError> {
        if plan.if_exists && !self.table_exists(&plan.table_name) {
            return Ok(false);
        }
        self.drop_table(&plan.table_name)?;
        Ok(true)
    }
}

impl TableCreator for CreateTableExecutor<'_> {
    fn create_table(
        &mut self,
        table_name: &str,
        columns: Vec<ColumnSchema>,
        sql: &str,
    ) -> Result<TableSchema, DatabaseError> {
        self.catalog
            .create_table(self.pager, table_name, columns, sql)
    }

    fn drop_table(&mut self, table_name: &str) -> Result<TableSchema, DatabaseError> {
        self.catalog.drop_table(self.pager, table_name)
    }

    fn table_exists(&self, table_name: &str) -> bool {
        self.catalog.lookup(table_name).is_some()
    }
}

/// Builder for column lists, used by tests and by CREATE TABLE plans.
#[derive(Debug, Default)]
pub struct TableSchemaBuilder {
    columns: Vec<ColumnSchema>,
}

impl TableSchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, column: ColumnSchema) -> Self {
        self.columns.push(column);
        self
    }

    /// Add a nullable column without default
    pub fn add_column(self, name: &str, data_type: DataType) -> Self {
        let position = self.columns.len();
        self.column(ColumnSchema::new(name.to_string(), data_type, position))
    }

    pub fn build(self) -> Vec<ColumnSchema> {
        self.columns
    }

    pub fn columns_from_definitions(definitions: &[ColumnDefinition]) -> Vec<ColumnSchema> {
        definitions
            .iter()
            .enumerate()
            .map(|(position, definition)| {
                let mut column =
                    ColumnSchema::new(definition.name.clone(), definition.data_type, position);
                if !definition.nullable {
                    column = column.not_null();
                }
                if let Some(default_value) = &definition.default_value {
                    column = column.with_default(default_value.clone());
                }
                column
            })
            .collect()
    }
}
