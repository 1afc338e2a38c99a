use std::fs;

use kotak::{
    Database, DatabaseConfig, DatabaseError, ErrorKind, Row, StatementResult, Status, Value,
    params, utils::mock::TempDatabase,
};

fn assert_ok(result: &StatementResult) {
    assert!(result.is_success(), "statement failed: {:?}", result.error());
}

fn integer_rows(result: &StatementResult) -> Vec<i64> {
    result
        .rows()
        .iter()
        .map(|row| match row.get_value(0) {
            Some(Value::Integer(value)) => *value,
            other => panic!("Expected an integer, got {:?}", other),
        })
        .collect()
}

#[test]
fn test_scenario_insert_and_select_with_placeholders() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("db_scenario_a")?;
    let db = temp_db.open()?;

    assert_ok(&db.execute("CREATE TABLE t (id INTEGER, name TEXT)", params![]));
    assert_ok(&db.execute("INSERT INTO t VALUES (?, ?)", params![1, "Ann"]));
    assert_ok(&db.execute("INSERT INTO t VALUES (?, ?)", params![2, "Budi"]));

    let result = db.execute("SELECT * FROM t WHERE id = ?", params![1]);
    assert_eq!(result.status(), Status::Succeeded);
    assert_eq!(result.columns(), &["id".to_string(), "name".to_string()]);
    assert_eq!(
        result.rows(),
        &[Row::new(vec![Value::Integer(1), Value::Text("Ann".to_string())])]
    );
    assert!(result.error().is_none());
    Ok(())
}

#[test]
fn test_scenario_unknown_table() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("db_scenario_b")?;
    let db = temp_db.open()?;

    let result = db.execute("SELECT * FROM missing", params![]);
    assert_eq!(result.status(), Status::Failed);
    assert_eq!(result.error_kind(), Some(ErrorKind::UnknownTable));
    assert!(result.try_rows().is_none());
    assert!(result.columns().is_empty());
    assert!(matches!(
        result.into_result(),
        Err(DatabaseError::TableNotFound { name }) if name == "missing"
    ));
    Ok(())
}

#[test]
fn test_scenario_too_few_arguments() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("db_scenario_c")?;
    let db = temp_db.open()?;
    assert_ok(&db.execute("CREATE TABLE t (id INTEGER, name TEXT)", params![]));
    let before = fs::read(temp_db.path())?;

    let result = db.execute("INSERT INTO t VALUES (?, ?)", params![1]);
    assert_eq!(result.error_kind(), Some(ErrorKind::Binding));

    assert_eq!(fs::read(temp_db.path())?, before);
    assert!(db.execute("SELECT * FROM t", params![]).rows().is_empty());
    Ok(())
}

#[test]
fn test_scenario_transform_doubles_values() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("db_scenario_d")?;
    let db = temp_db.open()?;
    assert_ok(&db.execute("CREATE TABLE t (n INTEGER)", params![]));
    assert_ok(&db.execute("INSERT INTO t VALUES (1), (2), (3)", params![]));

    let doubled = db.execute_with_transform("SELECT * FROM t", params![], |mut row: Row| {
        match row.get_value(0) {
            Some(Value::Integer(n)) => {
                let doubled = Value::Integer(n * 2);
                row.set_value(0, doubled).map_err(|e| e.to_string())?;
                Ok(row)
            }
            other => Err(format!("unexpected value {:?}", other)),
        }
    });
    assert_eq!(integer_rows(&doubled), vec![2, 4, 6]);

    // Storage is untouched by the transform
    let stored = db.execute("SELECT * FROM t", params![]);
    assert_eq!(integer_rows(&stored), vec![1, 2, 3]);
    Ok(())
}

#[test]
fn test_transform_failure() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("db_transform_error")?;
    let db = temp_db.open()?;
    assert_ok(&db.execute("CREATE TABLE t (n INTEGER)", params![]));
    assert_ok(&db.execute("INSERT INTO t VALUES (1), (2)", params![]));

    let result = db.execute_with_transform("SELECT * FROM t", params![], |row: Row| {
        if row.get_value(0) == Some(&Value::Integer(2)) {
            Err("two is not allowed")
        } else {
            Ok(row)
        }
    });
    assert_eq!(result.error_kind(), Some(ErrorKind::Transform));
    assert!(
        result
            .error()
            .map(|e| e.to_string().contains("two is not allowed"))
            .unwrap_or(false)
    );
    Ok(())
}

#[test]
#[should_panic]
fn test_rows_of_failed_statement_panics() {
    let temp_db = TempDatabase::with_prefix("db_rows_panic").unwrap();
    let db = temp_db.open().unwrap();
    let result = db.execute("SELECT * FROM missing", params![]);
    let _ = result.rows();
}

#[test]
fn test_reopen_reproduces_catalog_and_rows() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("db_reopen")?;
    let expected: Vec<i64> = (0..300).collect();
    {
        let db = temp_db.open()?;
        assert_ok(&db.execute(
            "CREATE TABLE numbers (n INTEGER NOT NULL, label TEXT DEFAULT 'n')",
            params![],
        ));
        assert_ok(&db.execute("CREATE TABLE empty (x BLOB)", params![]));
        for n in &expected {
            assert_ok(&db.execute("INSERT INTO numbers (n) VALUES (?)", params![*n]));
        }
        db.close()?;
    }

    for _ in 0..2 {
        let db = temp_db.open()?;
        assert_eq!(db.table_names(), vec!["numbers".to_string(), "empty".to_string()]);
        let result = db.execute("SELECT * FROM numbers", params![]);
        assert_eq!(integer_rows(&result), expected);
        assert_eq!(result.rows()[0].values[1], Value::Text("n".to_string()));
        db.close()?;
    }
    Ok(())
}

#[test]
fn test_update_and_delete_statements() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("db_update_delete")?;
    let db = temp_db.open()?;
    assert_ok(&db.execute("CREATE TABLE t (id INTEGER, score REAL)", params![]));
    assert_ok(&db.execute(
        "INSERT INTO t VALUES (1, 1.0), (2, 2.0), (3, 3.0), (4, 4.0)",
        params![],
    ));

    let update = db.execute("UPDATE t SET score = score * 10 WHERE id <= ?", params![2]);
    assert_ok(&update);
    assert!(update.rows().is_empty());

    let delete = db.execute("DELETE FROM t WHERE score > ?", params![15]);
    assert_ok(&delete);
    assert!(delete.rows().is_empty());

    let result = db.execute("SELECT id, score FROM t", params![]);
    assert_eq!(
        result.rows(),
        &[
            Row::new(vec![Value::Integer(1), Value::Real(10.0)]),
            Row::new(vec![Value::Integer(3), Value::Real(3.0)]),
            Row::new(vec![Value::Integer(4), Value::Real(4.0)]),
        ]
    );
    Ok(())
}

#[test]
fn test_error_kinds() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("db_error_kinds")?;
    let db = temp_db.open()?;
    assert_ok(&db.execute("CREATE TABLE t (id INTEGER NOT NULL, name TEXT)", params![]));

    let cases = [
        ("CREATE TABLE t (x INTEGER)", ErrorKind::DuplicateTable),
        ("SELECT nope FROM t", ErrorKind::UnknownColumn),
        ("SELECT * FROM t WHERE nope = 1", ErrorKind::UnknownColumn),
        ("INSERT INTO t VALUES ('one', 'x')", ErrorKind::TypeMismatch),
        ("INSERT INTO t (name) VALUES ('x')", ErrorKind::Constraint),
        ("INSERT INTO t VALUES (1)", ErrorKind::Syntax),
        ("SELEC * FROM t", ErrorKind::Syntax),
        ("DROP TABLE nope", ErrorKind::UnknownTable),
    ];
    for (sql, kind) in cases {
        let result = db.execute(sql, params![]);
        assert_eq!(result.error_kind(), Some(kind), "{}", sql);
    }
    Ok(())
}

#[test]
fn test_failed_statement_leaves_no_trace() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("db_no_trace")?;
    let db = temp_db.open()?;
    assert_ok(&db.execute("CREATE TABLE t (id INTEGER NOT NULL)", params![]));
    assert_ok(&db.execute("INSERT INTO t VALUES (1)", params![]));
    let before = fs::read(temp_db.path())?;

    let failed = db.execute("INSERT INTO t VALUES (2), (NULL), (3)", params![]);
    assert_eq!(failed.error_kind(), Some(ErrorKind::Constraint));
    let failed = db.execute("CREATE TABLE u (id INTEGER DEFAULT 'x')", params![]);
    assert!(!failed.is_success());
    let failed = db.execute("UPDATE t SET id = NULL", params![]);
    assert_eq!(failed.error_kind(), Some(ErrorKind::Constraint));

    assert_eq!(db.table_names(), vec!["t".to_string()]);
    assert_eq!(integer_rows(&db.execute("SELECT * FROM t", params![])), vec![1]);
    assert_eq!(fs::read(temp_db.path())?, before);
    assert!(!temp_db.journal_path().exists());
    Ok(())
}

#[test]
fn test_drop_table_and_recreate() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("db_drop")?;
    let db = temp_db.open()?;
    assert_ok(&db.execute("CREATE TABLE t (id INTEGER)", params![]));
    assert_ok(&db.execute("INSERT INTO t VALUES (1), (2)", params![]));

    assert_ok(&db.execute("DROP TABLE t", params![]));
    assert!(db.table_names().is_empty());
    assert_eq!(
        db.execute("SELECT * FROM t", params![]).error_kind(),
        Some(ErrorKind::UnknownTable)
    );
    assert_ok(&db.execute("DROP TABLE IF EXISTS t", params![]));

    assert_ok(&db.execute("CREATE TABLE t (name TEXT)", params![]));
    assert!(db.execute("SELECT * FROM t", params![]).rows().is_empty());
    assert_ok(&db.execute("CREATE TABLE IF NOT EXISTS t (other BLOB)", params![]));
    assert_eq!(db.execute("SELECT * FROM t", params![]).columns(), &["name".to_string()]);
    Ok(())
}

#[test]
fn test_open_missing_file_without_create() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("db_no_create")?;
    let config = DatabaseConfig::builder().create_if_missing(false).build();

    match Database::open_with_config(temp_db.path(), config) {
        Err(DatabaseError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
        Err(other) => panic!("Expected a NotFound error, got {:?}", other),
        Ok(_) => panic!("Expected a NotFound error"),
    }
    assert!(!temp_db.path().exists());
    Ok(())
}

#[test]
fn test_open_rejects_foreign_file() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("db_foreign")?;
    fs::write(temp_db.path(), vec![0u8; 4096])?;

    match Database::open_with_config(temp_db.path(), TempDatabase::config()) {
        Err(e) => assert_eq!(e.kind(), ErrorKind::CorruptData),
        Ok(_) => panic!("Expected a corrupt data error"),
    }
    Ok(())
}

#[test]
fn test_open_with_default_config() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("db_default")?;
    let db = Database::open(temp_db.path())?;
    assert_eq!(db.path(), temp_db.path());
    assert_ok(&db.execute("CREATE TABLE t (id INTEGER)", params![]));
    db.close()?;
    assert!(temp_db.path().exists());
    Ok(())
}

#[test]
fn test_blob_and_large_values_round_trip() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("db_blobs")?;
    let payload: Vec<u8> = (0..20_000u32).map(|i| (i % 256) as u8).collect();
    {
        let db = temp_db.open()?;
        assert_ok(&db.execute("CREATE TABLE files (name TEXT, data BLOB)", params![]));
        assert_ok(&db.execute(
            "INSERT INTO files VALUES (?, ?), ('tiny', X'00FF')",
            params!["big", payload.clone()],
        ));
        db.close()?;
    }

    let db = temp_db.open()?;
    let result = db.execute("SELECT data FROM files WHERE name = 'big'", params![]);
    assert_eq!(result.rows(), &[Row::new(vec![Value::Blob(payload)])]);
    let result = db.execute("SELECT data FROM files WHERE name = ?", params!["tiny"]);
    assert_eq!(result.rows(), &[Row::new(vec![Value::Blob(vec![0x00, 0xff])])]);
    Ok(())
}

#[test]
fn test_unsupported_clauses_leave_rows_in_place() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("db_unsupported_clauses")?;
    let db = temp_db.open()?;
    assert_ok(&db.execute("CREATE TABLE t (id INTEGER, name TEXT)", params![]));
    assert_ok(&db.execute("INSERT INTO t VALUES (1, 'a'), (2, 'b'), (3, 'c')", params![]));
    let before = fs::read(temp_db.path())?;

    for sql in [
        "DELETE FROM t WHERE id > 0 LIMIT 1",
        "DELETE FROM t WHERE id > 0 RETURNING id",
        "UPDATE t SET id = 9 WHERE id = 1 RETURNING id",
        "SELECT * FROM t ORDER BY id DESC",
        "SELECT * FROM t GROUP BY name",
    ] {
        let result = db.execute(sql, params![]);
        assert_eq!(result.error_kind(), Some(ErrorKind::Syntax), "{}", sql);
    }

    assert_eq!(integer_rows(&db.execute("SELECT id FROM t", params![])), vec![1, 2, 3]);
    assert_eq!(fs::read(temp_db.path())?, before);
    Ok(())
}

#[test]
fn test_qualifier_must_name_the_table() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("db_qualifier")?;
    let db = temp_db.open()?;
    assert_ok(&db.execute("CREATE TABLE t (id INTEGER)", params![]));
    assert_ok(&db.execute("INSERT INTO t VALUES (1), (2)", params![]));

    let result = db.execute("SELECT t.id FROM t WHERE t.id = 2", params![]);
    assert_eq!(integer_rows(&result), vec![2]);

    let result = db.execute("SELECT * FROM t WHERE other.id = 1", params![]);
    assert_eq!(result.error_kind(), Some(ErrorKind::UnknownColumn));
    let result = db.execute("DELETE FROM t WHERE other.id = 1", params![]);
    assert_eq!(result.error_kind(), Some(ErrorKind::UnknownColumn));
    assert_eq!(integer_rows(&db.execute("SELECT * FROM t", params![])), vec![1, 2]);
    Ok(())
}
