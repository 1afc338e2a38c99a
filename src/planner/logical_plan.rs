use crate::{
    executor::predicate::Predicate,
    planner::expression::Expression,
    types::value::{DataType, Value},
};

/// A compiled statement. Placeholders are already replaced by values.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalPlan {
    CreateTable(CreateTablePlan),
    DropTable(DropTablePlan),
    Insert(InsertPlan),
    Select(SelectPlan),
    Update(UpdatePlan),
    Delete(DeletePlan),
}

impl LogicalPlan {
    pub fn kind(&self) -> &'static str {
        match self {
            LogicalPlan::CreateTable(_) => "CREATE TABLE",
            LogicalPlan::DropTable(_) => "DROP TABLE",
            LogicalPlan::Insert(_) => "INSERT",
            LogicalPlan::Select(_) => "SELECT",
            LogicalPlan::Update(_) => "UPDATE",
            LogicalPlan::Delete(_) => "DELETE",
        }
    }

    pub fn table_name(&self) -> &str {
        match self {
            LogicalPlan::CreateTable(plan) => &plan.table_name,
            LogicalPlan::DropTable(plan) => &plan.table_name,
            LogicalPlan::Insert(plan) => &plan.table_name,
            LogicalPlan::Select(plan) => &plan.table_name,
            LogicalPlan::Update(plan) => &plan.table_name,
            LogicalPlan::Delete(plan) => &plan.table_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTablePlan {
    pub table_name: String,
    pub columns: Vec<ColumnDefinition>,
    pub if_not_exists: bool,
    /// Statement text kept in the catalog
    pub sql: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub default_value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropTablePlan {
    pub table_name: String,
    pub if_exists: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertPlan {
    pub table_name: String,
    /// Explicit column list; `None` means every column in schema order
    pub columns: Option<Vec<String>>,
    pub values: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    All,
    Columns(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectPlan {
    pub table_name: String,
    pub projection: Projection,
    pub predicate: Option<Predicate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePlan {
    pub table_name: String,
    pub assignments: Vec<Assignment>,
    pub predicate: Option<Predicate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeletePlan {
    pub table_name: String,
    pub predicate: Option<Predicate>,
}
