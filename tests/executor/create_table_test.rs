use kotak::{
    executor::create_table::{CreateTableExecutor, TableCreator, TableSchemaBuilder},
    planner::{
        logical_plan::{ColumnDefinition, CreateTablePlan, DropTablePlan, LogicalPlan},
        parser::SqlParser,
    },
    storage::{catalog::Catalog, page_store::PageStore},
    types::{
        error::DatabaseError,
        value::{DataType, Value},
    },
    utils::mock::TempDatabase,
};

fn setup(temp_db: &TempDatabase) -> Result<(PageStore, Catalog), DatabaseError> {
    let mut store = temp_db.open_page_store()?;
    let catalog = Catalog::initialize(&mut store)?;
    store.flush()?;
    Ok((store, catalog))
}

fn create_plan(sql: &str) -> Result<CreateTablePlan, DatabaseError> {
    match SqlParser::new().compile(sql, &[])? {
        LogicalPlan::CreateTable(plan) => Ok(plan),
        other => panic!("Expected CREATE TABLE, got {:?}", other),
    }
}

#[test]
fn test_create_table_from_plan() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("create_from_plan")?;
    let (mut store, mut catalog) = setup(&temp_db)?;

    let plan = create_plan("CREATE TABLE users (id INTEGER NOT NULL, name TEXT DEFAULT 'anon')")?;
    let created = CreateTableExecutor::new(&mut catalog, &mut store).execute_create(&plan)?;
    assert!(created);

    let schema = catalog.get_table("users")?;
    assert_eq!(schema.column_names(), vec!["id".to_string(), "name".to_string()]);
    assert!(!schema.columns[0].nullable);
    assert_eq!(schema.columns[1].default_value, Some(Value::Text("anon".to_string())));
    assert_eq!(schema.columns[1].position, 1);
    assert_eq!(
        schema.sql,
        "CREATE TABLE users (id INTEGER NOT NULL, name TEXT DEFAULT 'anon')"
    );
    Ok(())
}

#[test]
fn test_create_existing_table() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("create_existing")?;
    let (mut store, mut catalog) = setup(&temp_db)?;

    let plan = create_plan("CREATE TABLE t (id INTEGER)")?;
    let mut executor = CreateTableExecutor::new(&mut catalog, &mut store);
    executor.execute_create(&plan)?;

    assert!(matches!(
        executor.execute_create(&plan),
        Err(DatabaseError::DuplicateTable { .. })
    ));

    let if_not_exists = create_plan("CREATE TABLE IF NOT EXISTS t (other TEXT)")?;
    assert!(!executor.execute_create(&if_not_exists)?);

    // The original definition stays
    assert_eq!(catalog.get_table("t")?.column_names(), vec!["id".to_string()]);
    Ok(())
}

#[test]
fn test_default_must_fit_column() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("create_bad_default")?;
    let (mut store, mut catalog) = setup(&temp_db)?;

    let plan = create_plan("CREATE TABLE t (id INTEGER DEFAULT 'x')")?;
    let result = CreateTableExecutor::new(&mut catalog, &mut store).execute_create(&plan);
    assert!(matches!(result, Err(DatabaseError::TypeMismatch { .. })));
    assert!(catalog.is_empty());
    Ok(())
}

#[test]
fn test_drop_table_plans() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("create_drop")?;
    let (mut store, mut catalog) = setup(&temp_db)?;
    let mut executor = CreateTableExecutor::new(&mut catalog, &mut store);
    executor.execute_create(&create_plan("CREATE TABLE t (id INTEGER)")?)?;

    let drop = DropTablePlan {
        table_name: "T".to_string(),
        if_exists: false,
    };
    assert!(executor.execute_drop(&drop)?);
    assert!(!executor.table_exists("t"));

    assert!(matches!(
        executor.execute_drop(&drop),
        Err(DatabaseError::TableNotFound { .. })
    ));
    let if_exists = DropTablePlan {
        table_name: "t".to_string(),
        if_exists: true,
    };
    assert!(!executor.execute_drop(&if_exists)?);
    Ok(())
}

#[test]
fn test_table_creator_trait() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("create_trait")?;
    let (mut store, mut catalog) = setup(&temp_db)?;
    let mut executor = CreateTableExecutor::new(&mut catalog, &mut store);

    let columns = TableSchemaBuilder::new()
        .add_column("id", DataType::Integer)
        .add_column("payload", DataType::Blob)
        .build();
    let schema = executor.create_table("blobs", columns, "CREATE TABLE blobs (id INTEGER, payload BLOB)")?;
    assert!(executor.table_exists("BLOBS"));
    assert_eq!(schema.columns[1].data_type, DataType::Blob);

    let dropped = executor.drop_table("blobs")?;
    assert_eq!(dropped, schema);
    assert!(!executor.table_exists("blobs"));
    Ok(())
}

#[test]
fn test_columns_from_definitions() {
    let definitions = vec![
        ColumnDefinition {
            name: "a".to_string(),
            data_type: DataType::Real,
            nullable: false,
            default_value: Some(Value::Real(0.0)),
        },
        ColumnDefinition {
            name: "b".to_string(),
            data_type: DataType::Text,
            nullable: true,
            default_value: None,
        },
    ];
    let columns = TableSchemaBuilder::columns_from_definitions(&definitions);

    assert_eq!(columns.len(), 2);
    assert_eq!(columns[0].position, 0);
    assert!(!columns[0].nullable);
    assert_eq!(columns[0].default_value, Some(Value::Real(0.0)));
    assert_eq!(columns[1].position, 1);
    assert!(columns[1].nullable);
}

#[test]
fn test_schema_survives_reopen() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("create_reopen")?;
    {
        let (mut store, mut catalog) = setup(&temp_db)?;
        let plan = create_plan("CREATE TABLE notes (id INTEGER, body TEXT NOT NULL DEFAULT '')")?;
        CreateTableExecutor::new(&mut catalog, &mut store).execute_create(&plan)?;
        store.flush()?;
    }

    let mut store = temp_db.open_page_store()?;
    let catalog = Catalog::load(&mut store)?;
    let notes = catalog.get_table("notes")?;
    assert!(!notes.columns[1].nullable);
    assert_eq!(notes.columns[1].default_value, Some(Value::Text(String::new())));
    Ok(())
}
