use std::{sync::Arc, thread};

use kotak::{DatabaseError, Value, params, utils::mock::TempDatabase};

const THREADS: i64 = 4;
const ROWS_PER_THREAD: i64 = 50;

#[test]
fn test_concurrent_inserts_are_all_visible() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("db_concurrent_insert")?;
    let db = Arc::new(temp_db.open()?);
    assert!(
        db.execute("CREATE TABLE events (worker INTEGER, seq INTEGER)", params![])
            .is_success()
    );

    let handles: Vec<_> = (0..THREADS)
        .map(|worker| {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                for seq in 0..ROWS_PER_THREAD {
                    let result =
                        db.execute("INSERT INTO events VALUES (?, ?)", params![worker, seq]);
                    assert!(result.is_success(), "{:?}", result.error());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("writer thread panicked");
    }

    let result = db.execute("SELECT * FROM events", params![]);
    assert_eq!(result.rows().len(), (THREADS * ROWS_PER_THREAD) as usize);

    for worker in 0..THREADS {
        let result = db.execute("SELECT seq FROM events WHERE worker = ?", params![worker]);
        // Each writer's own inserts keep their order
        let seqs: Vec<Value> = result.rows().iter().map(|row| row.values[0].clone()).collect();
        let expected: Vec<Value> = (0..ROWS_PER_THREAD).map(Value::Integer).collect();
        assert_eq!(seqs, expected);
    }
    Ok(())
}

#[test]
fn test_readers_and_writers_interleave() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("db_concurrent_mixed")?;
    let db = Arc::new(temp_db.open()?);
    assert!(db.execute("CREATE TABLE t (n INTEGER)", params![]).is_success());

    let writer = {
        let db = Arc::clone(&db);
        thread::spawn(move || {
            for n in 0..100i64 {
                assert!(db.execute("INSERT INTO t VALUES (?)", params![n]).is_success());
            }
        })
    };
    let reader = {
        let db = Arc::clone(&db);
        thread::spawn(move || {
            let mut last = 0;
            for _ in 0..50 {
                let count = db.execute("SELECT * FROM t", params![]).rows().len();
                // A reader never sees a partial statement or fewer rows than before
                assert!(count >= last);
                last = count;
            }
        })
    };
    writer.join().expect("writer thread panicked");
    reader.join().expect("reader thread panicked");

    assert_eq!(db.execute("SELECT * FROM t", params![]).rows().len(), 100);
    Ok(())
}
