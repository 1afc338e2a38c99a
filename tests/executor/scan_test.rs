use kotak::{
    executor::{
        create_table::TableSchemaBuilder,
        insert::{Inserter, TableInserter},
        predicate::{ComparisonOp, Predicate},
        scan::{ScanIterator, Scanner},
        sequential_scan::SequentialScanner,
    },
    storage::{catalog::Catalog, page_store::PageStore, schema::TableSchema},
    types::{
        error::DatabaseError,
        row::Row,
        value::{DataType, Value},
    },
    utils::mock::TempDatabase,
};

fn setup_with_rows(
    temp_db: &TempDatabase,
    rows: Vec<Row>,
) -> Result<(PageStore, TableSchema), DatabaseError> {
    let mut store = temp_db.open_page_store()?;
    let mut catalog = Catalog::initialize(&mut store)?;
    let columns = TableSchemaBuilder::new()
        .add_column("id", DataType::Integer)
        .add_column("name", DataType::Text)
        .build();
    let schema = catalog.create_table(&mut store, "test_table", columns, "")?;
    TableInserter::new(&mut store, &schema).insert_batch(rows)?;
    store.flush()?;
    Ok((store, schema))
}

fn person(id: i64, name: &str) -> Row {
    Row::new(vec![Value::Integer(id), Value::Text(name.to_string())])
}

fn people() -> Vec<Row> {
    vec![
        person(1, "Alice"),
        person(2, "Bob"),
        person(3, "Charlie"),
        person(4, "Diana"),
        person(5, "Eve"),
    ]
}

#[test]
fn test_sequential_scanner_basic_functionality() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("scan_basic")?;
    let (mut store, schema) = setup_with_rows(&temp_db, people())?;

    let mut scanner = SequentialScanner::new(&mut store, &schema);
    let mut scanned_rows = Vec::new();
    while let Some(row) = scanner.scan()? {
        scanned_rows.push(row);
    }

    // Storage order is insertion order
    assert_eq!(scanned_rows, people());
    assert!(scanner.scan()?.is_none());
    Ok(())
}

#[test]
fn test_scanner_reset_functionality() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("scan_reset")?;
    let (mut store, schema) = setup_with_rows(&temp_db, people())?;

    let mut scanner = SequentialScanner::new(&mut store, &schema);
    assert_eq!(scanner.scan()?, Some(person(1, "Alice")));
    assert_eq!(scanner.scan()?, Some(person(2, "Bob")));

    scanner.reset()?;
    assert_eq!(scanner.scan()?, Some(person(1, "Alice")));
    Ok(())
}

#[test]
fn test_scan_batch() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("scan_batch")?;
    let (mut store, schema) = setup_with_rows(&temp_db, people())?;

    let mut scanner = SequentialScanner::new(&mut store, &schema);
    assert_eq!(scanner.scan_batch(2)?.len(), 2);
    assert_eq!(scanner.scan_batch(2)?.len(), 2);
    assert_eq!(scanner.scan_batch(2)?, vec![person(5, "Eve")]);
    assert!(scanner.scan_batch(2)?.is_empty());
    Ok(())
}

#[test]
fn test_empty_table_scan() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("scan_empty")?;
    let (mut store, schema) = setup_with_rows(&temp_db, Vec::new())?;

    let rows: Vec<Row> = ScanIterator::new(SequentialScanner::new(&mut store, &schema))
        .collect::<Result<_, _>>()?;
    assert!(rows.is_empty());
    Ok(())
}

#[test]
fn test_scan_iterator_across_many_pages() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("scan_many")?;
    let rows: Vec<Row> = (0..2_000).map(|i| person(i, &format!("name_{}", i))).collect();
    let (mut store, schema) = setup_with_rows(&temp_db, rows.clone())?;

    let scanned: Vec<Row> = ScanIterator::new(SequentialScanner::new(&mut store, &schema))
        .collect::<Result<_, _>>()?;
    assert_eq!(scanned.len(), 2_000);
    assert_eq!(scanned, rows);
    Ok(())
}

#[test]
fn test_predicate_evaluation() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("scan_predicate")?;
    let (mut store, schema) = setup_with_rows(&temp_db, people())?;
    let rows: Vec<Row> = ScanIterator::new(SequentialScanner::new(&mut store, &schema))
        .collect::<Result<_, _>>()?;

    let filter = |predicate: &Predicate| -> Result<Vec<i64>, DatabaseError> {
        let mut ids = Vec::new();
        for row in &rows {
            if predicate.evaluate(row, &schema)? {
                if let Some(Value::Integer(id)) = row.get_value(0) {
                    ids.push(*id);
                }
            }
        }
        Ok(ids)
    };

    assert_eq!(filter(&Predicate::eq("id", 3))?, vec![3]);
    assert_eq!(filter(&Predicate::lt("id", 3))?, vec![1, 2]);
    assert_eq!(filter(&Predicate::gt("ID", 3))?, vec![4, 5]);
    assert_eq!(
        filter(&Predicate::comparison("id", ComparisonOp::NotEqual, 3))?,
        vec![1, 2, 4, 5]
    );
    assert_eq!(
        filter(&Predicate::comparison("id", ComparisonOp::LessThanOrEqual, 2.5))?,
        vec![1, 2]
    );
    assert_eq!(
        filter(&Predicate::and(
            Predicate::comparison("id", ComparisonOp::GreaterThanOrEqual, 2),
            Predicate::comparison("name", ComparisonOp::LessThan, "D"),
        ))?,
        vec![2, 3]
    );
    Ok(())
}

#[test]
fn test_null_and_mixed_comparisons_are_false() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("scan_null")?;
    let rows = vec![
        Row::new(vec![Value::Null, Value::Text("nobody".to_string())]),
        person(1, "one"),
    ];
    let (_store, schema) = setup_with_rows(&temp_db, rows.clone())?;

    for predicate in [
        Predicate::eq("id", Value::Null),
        Predicate::comparison("id", ComparisonOp::NotEqual, Value::Null),
        Predicate::eq("id", "1"),
        Predicate::comparison("name", ComparisonOp::GreaterThan, 0),
    ] {
        for row in &rows {
            assert!(!predicate.evaluate(row, &schema)?, "{:?} on {:?}", predicate, row);
        }
    }
    assert!(!Predicate::lt("id", 5).evaluate(&rows[0], &schema)?);
    assert!(Predicate::lt("id", 5).evaluate(&rows[1], &schema)?);
    Ok(())
}

#[test]
fn test_unknown_column_in_predicate() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("scan_unknown")?;
    let (_store, schema) = setup_with_rows(&temp_db, Vec::new())?;

    let predicate = Predicate::and(Predicate::eq("id", 1), Predicate::eq("age", 30));
    assert_eq!(
        predicate.get_referenced_columns(),
        vec!["id".to_string(), "age".to_string()]
    );
    assert!(matches!(
        predicate.validate_against_schema(&schema),
        Err(DatabaseError::ColumnNotFound { name, .. }) if name == "age"
    ));
    Ok(())
}

#[test]
fn test_comparison_flip() {
    assert_eq!(ComparisonOp::LessThan.flip(), ComparisonOp::GreaterThan);
    assert_eq!(ComparisonOp::GreaterThanOrEqual.flip(), ComparisonOp::LessThanOrEqual);
    assert_eq!(ComparisonOp::Equal.flip(), ComparisonOp::Equal);
    assert_eq!(ComparisonOp::NotEqual.flip(), ComparisonOp::NotEqual);
}
