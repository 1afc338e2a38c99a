use sqlparser::{
    ast::{
        AssignmentTarget, BinaryOperator as SqlBinaryOperator, ColumnDef, ColumnOption, CreateTable,
        Delete, Expr, FromTable, GroupByExpr, Insert, ObjectName, ObjectType, Query, SelectItem, SetExpr,
        Statement, TableFactor, TableObject, TableWithJoins, UnaryOperator,
        Value as SqlValue,
    },
    dialect::SQLiteDialect,
    parser::Parser,
};

use crate::{
    executor::predicate::{ComparisonOp, Predicate},
    planner::{
        binder::Binder,
        error::PlannerError,
        expression::{BinaryOperator, Expression},
        logical_plan::{
            Assignment, ColumnDefinition, CreateTablePlan, DeletePlan, DropTablePlan, InsertPlan,
            LogicalPlan, Projection, SelectPlan, UpdatePlan,
        },
    },
    types::value::{DataType, Value},
};

/// Turns statement text plus positional arguments into a [`LogicalPlan`].
/// Compilation never touches storage.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlParser;

impl SqlParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse exactly one statement, bind `args` to its placeholders and plan
    /// it. Argument count mismatches are reported here.
    pub fn compile(&self, sql: &str, args: &[Value]) -> Result<LogicalPlan, PlannerError> {
        let statement = self.parse_statement(sql)?;
        let mut binder = Binder::new(args);
        let plan = self.to_plan(&statement, sql, &mut binder)?;
        binder.finish()?;
        Ok(plan)
    }

    pub fn parse_statement(&self, sql: &str) -> Result<Statement, PlannerError> {
        let dialect = SQLiteDialect {};
        let mut statements = Parser::parse_sql(&dialect, sql)?;

        if statements.len() != 1 {
            return Err(PlannerError::InvalidQuery(format!(
                "Expected exactly one statement, found {}",
                statements.len()
            )));
        }
        Ok(statements.remove(0))
    }

    fn to_plan(
        &self,
        statement: &Statement,
        sql: &str,
        binder: &mut Binder,
    ) -> Result<LogicalPlan, PlannerError> {
        match statement {
            Statement::CreateTable(create) => self.plan_create_table(create, sql),
            Statement::Drop {
                object_type,
                if_exists,
                names,
                ..
            } => {
                if !matches!(object_type, ObjectType::Table) {
                    return Err(PlannerError::UnsupportedStatement(format!(
                        "DROP {}",
                        object_type
                    )));
                }
                let [name] = names.as_slice() else {
                    return Err(PlannerError::UnsupportedStatement(
                        "DROP TABLE of several tables".to_string(),
                    ));
                };
                Ok(LogicalPlan::DropTable(DropTablePlan {
                    table_name: object_name(name)?,
                    if_exists: *if_exists,
                }))
            }
            Statement::Insert(insert) => self.plan_insert(insert, binder),
            Statement::Query(query) => self.plan_select(query, binder),
            Statement::Update {
                table,
                assignments,
                from,
                selection,
                returning,
                or,
            } => {
                if from.is_some() {
                    return Err(PlannerError::UnsupportedStatement(
                        "UPDATE ... FROM".to_string(),
                    ));
                }
                if or.is_some() || returning.is_some() {
                    return Err(PlannerError::UnsupportedStatement(
                        "UPDATE with conflict handling or RETURNING".to_string(),
                    ));
                }
                let scope = table_scope(table)?;
                let assignments = assignments
                    .iter()
                    .map(|assignment| {
                        let column = match &assignment.target {
                            AssignmentTarget::ColumnName(name) => object_name(name)?,
                            AssignmentTarget::Tuple(_) => {
                                return Err(PlannerError::UnsupportedExpression(
                                    "tuple assignment".to_string(),
                                ));
                            }
                        };
                        Ok(Assignment {
                            column,
                            value: self.to_expression(&assignment.value, Some(&scope), binder)?,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let predicate =
                    self.to_optional_predicate(selection.as_ref(), Some(&scope), binder)?;
                Ok(LogicalPlan::Update(UpdatePlan {
                    table_name: scope.name,
                    assignments,
                    predicate,
                }))
            }
            Statement::Delete(delete) => self.plan_delete(delete, binder),
            _ => Err(PlannerError::UnsupportedStatement(statement.to_string())),
        }
    }

    fn plan_create_table(&self, create: &CreateTable, sql: &str) -> Result<LogicalPlan, PlannerError> {
        if create.query.is_some() {
            return Err(PlannerError::UnsupportedStatement(
                "CREATE TABLE ... AS SELECT".to_string(),
            ));
        }
        if !create.constraints.is_empty() {
            return Err(PlannerError::UnsupportedStatement(
                "table constraints".to_string(),
            ));
        }

        let columns = create
            .columns
            .iter()
            .map(|column| self.convert_column(column))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(LogicalPlan::CreateTable(CreateTablePlan {
            table_name: object_name(&create.name)?,
            columns,
            if_not_exists: create.if_not_exists,
            sql: sql.trim().to_string(),
        }))
    }

    fn convert_column(&self, column: &ColumnDef) -> Result<ColumnDefinition, PlannerError> {
        let type_name = column.data_type.to_string();
        let data_type = self.convert_data_type(&type_name)?;

        let mut nullable = true;
        let mut default_value = None;
        for option in &column.options {
            match &option.option {
                ColumnOption::Null => nullable = true,
                ColumnOption::NotNull => nullable = false,
                ColumnOption::Default(expr) => {
                    // DEFAULT cannot take arguments
                    let mut no_arguments = Binder::new(&[]);
                    let expression = self.to_expression(expr, None, &mut no_arguments)?;
                    if no_arguments.required_arguments() > 0 {
                        return Err(PlannerError::UnsupportedExpression(format!(
                            "placeholder in DEFAULT of column '{}'",
                            column.name.value
                        )));
                    }
                    default_value = Some(expression.fold_constant().ok_or_else(|| {
                        PlannerError::UnsupportedExpression(format!("DEFAULT {}", expr))
                    })?);
                }
                other => {
                    return Err(PlannerError::UnsupportedStatement(format!(
                        "column constraint {}",
                        other
                    )));
                }
            }
        }

        Ok(ColumnDefinition {
            name: column.name.value.clone(),
            data_type,
            nullable,
            default_value,
        })
    }

    fn convert_data_type(&self, type_name: &str) -> Result<DataType, PlannerError> {
        DataType::from_declared(type_name).ok_or_else(|| {
            PlannerError::UnsupportedDataType(if type_name.trim().is_empty() {
                "missing column type".to_string()
            } else {
                type_name.to_string()
            })
        })
    }

    fn plan_insert(&self, insert: &Insert, binder: &mut Binder) -> Result<LogicalPlan, PlannerError> {
        if insert.or.is_some() || insert.on.is_some() || insert.returning.is_some() {
            return Err(PlannerError::UnsupportedStatement(
                "INSERT with conflict handling or RETURNING".to_string(),
            ));
        }
        let table_name = match &insert.table {
            TableObject::TableName(name) => object_name(name)?,
            _ => {
                return Err(PlannerError::UnsupportedStatement(
                    "INSERT into a table function".to_string(),
                ));
            }
        };

        let columns = if insert.columns.is_empty() {
            None
        } else {
            Some(
                insert
                    .columns
                    .iter()
                    .map(|ident| ident.value.clone())
                    .collect(),
            )
        };

        let source = insert
            .source
            .as_ref()
            .ok_or_else(|| PlannerError::InvalidQuery("INSERT without VALUES".to_string()))?;
        let SetExpr::Values(values) = source.body.as_ref() else {
            return Err(PlannerError::UnsupportedStatement(
                "INSERT ... SELECT".to_string(),
            ));
        };

        let mut rows = Vec::with_capacity(values.rows.len());
        for row in &values.rows {
            let mut row_values = Vec::with_capacity(row.len());
            for expr in row {
                let expression = self.to_expression(expr, None, binder)?;
                row_values.push(expression.fold_constant().ok_or_else(|| {
                    PlannerError::UnsupportedExpression(format!(
                        "column reference in VALUES: {}",
                        expr
                    ))
                })?);
            }
            rows.push(row_values);
        }

        Ok(LogicalPlan::Insert(InsertPlan {
            table_name,
            columns,
            values: rows,
        }))
    }

    fn plan_select(&self, query: &Query, binder: &mut Binder) -> Result<LogicalPlan, PlannerError> {
        let unsupported = || PlannerError::UnsupportedStatement(query.to_string());
        if query.with.is_some()
            || query.order_by.is_some()
            || query.limit.is_some()
            || !query.limit_by.is_empty()
            || query.offset.is_some()
            || query.fetch.is_some()
            || !query.locks.is_empty()
            || query.for_clause.is_some()
            || query.settings.is_some()
            || query.format_clause.is_some()
        {
            return Err(unsupported());
        }
        let SetExpr::Select(select) = query.body.as_ref() else {
            return Err(unsupported());
        };
        let grouped = match &select.group_by {
            GroupByExpr::All(_) => true,
            GroupByExpr::Expressions(exprs, modifiers) => !exprs.is_empty() || !modifiers.is_empty(),
        };
        if grouped
            || select.distinct.is_some()
            || select.top.is_some()
            || select.into.is_some()
            || !select.lateral_views.is_empty()
            || select.prewhere.is_some()
            || !select.cluster_by.is_empty()
            || !select.distribute_by.is_empty()
            || !select.sort_by.is_empty()
            || select.having.is_some()
            || !select.named_window.is_empty()
            || select.qualify.is_some()
            || select.value_table_mode.is_some()
            || select.connect_by.is_some()
        {
            return Err(unsupported());
        }

        let [from] = select.from.as_slice() else {
            return Err(PlannerError::InvalidQuery(
                "SELECT must read exactly one table".to_string(),
            ));
        };
        let scope = table_scope(from)?;

        let projection = match select.projection.as_slice() {
            [SelectItem::Wildcard(_)] => Projection::All,
            items => Projection::Columns(
                items
                    .iter()
                    .map(|item| match item {
                        SelectItem::UnnamedExpr(expr) => column_name(expr, Some(&scope))?
                            .ok_or_else(|| {
                                PlannerError::UnsupportedExpression(format!("projection {}", expr))
                            }),
                        other => Err(PlannerError::UnsupportedExpression(format!(
                            "projection {}",
                            other
                        ))),
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };

        let predicate = self.to_optional_predicate(select.selection.as_ref(), Some(&scope), binder)?;
        Ok(LogicalPlan::Select(SelectPlan {
            table_name: scope.name,
            projection,
            predicate,
        }))
    }

    fn plan_delete(&self, delete: &Delete, binder: &mut Binder) -> Result<LogicalPlan, PlannerError> {
        let tables = match &delete.from {
            FromTable::WithFromKeyword(tables) | FromTable::WithoutKeyword(tables) => tables,
        };
        let [table] = tables.as_slice() else {
            return Err(PlannerError::UnsupportedStatement(
                "DELETE from several tables".to_string(),
            ));
        };
        if delete.using.is_some() || !delete.tables.is_empty() {
            return Err(PlannerError::UnsupportedStatement(
                "multi-table DELETE".to_string(),
            ));
        }
        if delete.returning.is_some() || !delete.order_by.is_empty() || delete.limit.is_some() {
            return Err(PlannerError::UnsupportedStatement(
                "DELETE with ORDER BY, LIMIT or RETURNING".to_string(),
            ));
        }

        let scope = table_scope(table)?;
        let predicate = self.to_optional_predicate(delete.selection.as_ref(), Some(&scope), binder)?;
        Ok(LogicalPlan::Delete(DeletePlan {
            table_name: scope.name,
            predicate,
        }))
    }

    fn to_optional_predicate(
        &self,
        selection: Option<&Expr>,
        scope: Option<&TableScope>,
        binder: &mut Binder,
    ) -> Result<Option<Predicate>, PlannerError> {
        selection
            .map(|expr| self.to_predicate(expr, scope, binder))
            .transpose()
    }

    /// WHERE clauses: column-vs-value comparisons joined by AND.
    fn to_predicate(
        &self,
        expr: &Expr,
        scope: Option<&TableScope>,
        binder: &mut Binder,
    ) -> Result<Predicate, PlannerError> {
        match expr {
            Expr::Nested(inner) => self.to_predicate(inner, scope, binder),
            Expr::BinaryOp {
                left,
                op: SqlBinaryOperator::And,
                right,
            } => {
                let left = self.to_predicate(left, scope, binder)?;
                let right = self.to_predicate(right, scope, binder)?;
                Ok(Predicate::and(left, right))
            }
            Expr::BinaryOp { left, op, right } => {
                let op = comparison_op(op)
                    .ok_or_else(|| PlannerError::UnsupportedExpression(expr.to_string()))?;
                let left = self.to_expression(left, scope, binder)?;
                let right = self.to_expression(right, scope, binder)?;

                let (column_name, op, operand) = match (left, right) {
                    (Expression::Column(column_name), operand) => (column_name, op, operand),
                    (operand, Expression::Column(column_name)) => (column_name, op.flip(), operand),
                    _ => {
                        return Err(PlannerError::UnsupportedExpression(format!(
                            "comparison without a column: {}",
                            expr
                        )));
                    }
                };
                let value = operand.fold_constant().ok_or_else(|| {
                    PlannerError::UnsupportedExpression(format!(
                        "comparison must be between a column and a value: {}",
                        expr
                    ))
                })?;
                Ok(Predicate::Comparison {
                    column_name,
                    op,
                    value,
                })
            }
            _ => Err(PlannerError::UnsupportedExpression(expr.to_string())),
        }
    }

    /// Scalar expressions; placeholders are bound as they are met.
    fn to_expression(
        &self,
        expr: &Expr,
        scope: Option<&TableScope>,
        binder: &mut Binder,
    ) -> Result<Expression, PlannerError> {
        match expr {
            Expr::Value(value) => Ok(Expression::Literal(self.convert_value(value, binder)?)),
            Expr::Identifier(_) | Expr::CompoundIdentifier(_) => column_name(expr, scope)?
                .map(Expression::Column)
                .ok_or_else(|| PlannerError::UnsupportedExpression(expr.to_string())),
            Expr::Nested(inner) => self.to_expression(inner, scope, binder),
            Expr::UnaryOp {
                op: UnaryOperator::Minus,
                expr: inner,
            } => Ok(Expression::Negate(Box::new(
                self.to_expression(inner, scope, binder)?,
            ))),
            Expr::UnaryOp {
                op: UnaryOperator::Plus,
                expr: inner,
            } => self.to_expression(inner, scope, binder),
            Expr::BinaryOp { left, op, right } => {
                let operator = match op {
                    SqlBinaryOperator::Plus => BinaryOperator::Add,
                    SqlBinaryOperator::Minus => BinaryOperator::Subtract,
                    SqlBinaryOperator::Multiply => BinaryOperator::Multiply,
                    SqlBinaryOperator::Divide => BinaryOperator::Divide,
                    SqlBinaryOperator::Modulo => BinaryOperator::Modulo,
                    SqlBinaryOperator::StringConcat => BinaryOperator::Concat,
                    _ => return Err(PlannerError::UnsupportedExpression(expr.to_string())),
                };
                let left = self.to_expression(left, scope, binder)?;
                let right = self.to_expression(right, scope, binder)?;
                Ok(Expression::binary(left, operator, right))
            }
            _ => Err(PlannerError::UnsupportedExpression(expr.to_string())),
        }
    }

    fn convert_value(&self, value: &SqlValue, binder: &mut Binder) -> Result<Value, PlannerError> {
        match value {
            SqlValue::Number(text, _) => parse_number(text),
            SqlValue::SingleQuotedString(text) | SqlValue::DoubleQuotedString(text) => {
                Ok(Value::Text(text.clone()))
            }
            SqlValue::HexStringLiteral(hex) => decode_hex(hex).map(Value::Blob),
            SqlValue::Boolean(flag) => Ok(Value::Integer(i64::from(*flag))),
            SqlValue::Null => Ok(Value::Null),
            SqlValue::Placeholder(placeholder) => binder.bind(placeholder),
            other => Err(PlannerError::UnsupportedExpression(other.to_string())),
        }
    }
}

fn comparison_op(op: &SqlBinaryOperator) -> Option<ComparisonOp> {
    match op {
        SqlBinaryOperator::Eq => Some(ComparisonOp::Equal),
        SqlBinaryOperator::NotEq => Some(ComparisonOp::NotEqual),
        SqlBinaryOperator::Lt => Some(ComparisonOp::LessThan),
        SqlBinaryOperator::LtEq => Some(ComparisonOp::LessThanOrEqual),
        SqlBinaryOperator::Gt => Some(ComparisonOp::GreaterThan),
        SqlBinaryOperator::GtEq => Some(ComparisonOp::GreaterThanOrEqual),
        _ => None,
    }
}

/// Unqualified name of a (possibly schema-qualified) object.
fn object_name(name: &ObjectName) -> Result<String, PlannerError> {
    name.0
        .last()
        .map(|ident| ident.value.clone())
        .ok_or_else(|| PlannerError::InvalidQuery("empty object name".to_string()))
}

/// The single table a statement reads or writes, with the names a column
/// reference may be qualified by.
struct TableScope {
    name: String,
    alias: Option<String>,
}

impl TableScope {
    fn accepts(&self, qualifier: &str) -> bool {
        match &self.alias {
            Some(alias) => alias.eq_ignore_ascii_case(qualifier),
            None => self.name.eq_ignore_ascii_case(qualifier),
        }
    }
}

/// `Ok(None)` when `expr` is not a column reference at all.
fn column_name(expr: &Expr, scope: Option<&TableScope>) -> Result<Option<String>, PlannerError> {
    match expr {
        Expr::Identifier(ident) => Ok(Some(ident.value.clone())),
        Expr::CompoundIdentifier(idents) => match (idents.as_slice(), scope) {
            ([qualifier, column], Some(scope)) if scope.accepts(&qualifier.value) => {
                Ok(Some(column.value.clone()))
            }
            ([qualifier, column], _) => Err(PlannerError::UnknownQualifiedColumn {
                qualifier: qualifier.value.clone(),
                column: column.value.clone(),
            }),
            _ => Err(PlannerError::UnsupportedExpression(expr.to_string())),
        },
        _ => Ok(None),
    }
}

fn table_scope(table: &TableWithJoins) -> Result<TableScope, PlannerError> {
    if !table.joins.is_empty() {
        return Err(PlannerError::UnsupportedStatement("joins".to_string()));
    }
    match &table.relation {
        TableFactor::Table {
            name,
            alias,
            args: None,
            with_hints,
            version: None,
            with_ordinality: false,
            partitions,
            json_path: None,
            sample: None,
        } if with_hints.is_empty() && partitions.is_empty() => {
            let alias = match alias {
                Some(alias) if !alias.columns.is_empty() => {
                    return Err(PlannerError::UnsupportedStatement(format!(
                        "column aliases in {}",
                        table.relation
                    )));
                }
                Some(alias) => Some(alias.name.value.clone()),
                None => None,
            };
            Ok(TableScope {
                name: object_name(name)?,
                alias,
            })
        }
        other => Err(PlannerError::UnsupportedStatement(format!(
            "FROM {}",
            other
        ))),
    }
}

fn parse_number(text: &str) -> Result<Value, PlannerError> {
    if let Ok(integer) = text.parse::<i64>() {
        return Ok(Value::Integer(integer));
    }
    text.parse::<f64>()
        .map(Value::Real)
        .map_err(|_| PlannerError::InvalidQuery(format!("invalid number literal {}", text)))
}

fn decode_hex(hex: &str) -> Result<Vec<u8>, PlannerError> {
    if hex.len() % 2 != 0 {
        return Err(PlannerError::InvalidQuery(format!(
            "blob literal X'{}' has an odd number of digits",
            hex
        )));
    }
    (0..hex.len())
        .step_by(2)
        .map(|index| {
            hex.get(index..index + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| PlannerError::InvalidQuery(format!("invalid blob literal X'{}'", hex)))
        })
        .collect()
}
