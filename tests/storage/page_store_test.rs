use std::fs;

use kotak::{
    config::DatabaseConfig,
    storage::{header::FileHeader, page_store::PageStore},
    types::{FILE_HEADER_SIZE, PAGE_SIZE, error::DatabaseError},
    utils::mock::TempDatabase,
};

fn filled_page(byte: u8) -> Vec<u8> {
    vec![byte; PAGE_SIZE]
}

#[test]
fn test_create_writes_header_page() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("store_create")?;
    let store = temp_db.open_page_store()?;

    assert_eq!(store.page_count(), 1);
    assert_eq!(store.free_page_count(), 0);
    assert!(!store.has_pending_writes());
    assert_eq!(fs::metadata(temp_db.path())?.len(), PAGE_SIZE as u64);

    let header = FileHeader::from_bytes(&fs::read(temp_db.path())?)?;
    assert_eq!(&header, store.header());
    Ok(())
}

#[test]
fn test_create_refuses_existing_file() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("store_exists")?;
    drop(temp_db.open_page_store()?);

    assert!(matches!(
        PageStore::create(temp_db.path(), TempDatabase::config()),
        Err(DatabaseError::Io(_))
    ));
    Ok(())
}

#[test]
fn test_writes_are_visible_before_flush() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("store_visible")?;
    let mut store = temp_db.open_page_store()?;

    let page_id = store.allocate()?;
    assert_eq!(page_id, 1);
    assert_eq!(store.read(page_id)?, vec![0u8; PAGE_SIZE]);

    store.write(page_id, filled_page(0xab))?;
    assert_eq!(store.read(page_id)?, filled_page(0xab));
    assert!(store.has_pending_writes());

    // Nothing reached the file yet
    assert_eq!(fs::metadata(temp_db.path())?.len(), PAGE_SIZE as u64);
    Ok(())
}

#[test]
fn test_flush_persists_pages() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("store_flush")?;
    {
        let mut store = temp_db.open_page_store()?;
        let first = store.allocate()?;
        let second = store.allocate()?;
        store.write(first, filled_page(1))?;
        store.write(second, filled_page(2))?;
        store.flush()?;
        assert!(!store.has_pending_writes());
        assert!(!temp_db.journal_path().exists());
    }

    let mut store = temp_db.open_page_store()?;
    assert_eq!(store.page_count(), 3);
    assert_eq!(store.header().file_change_counter, 1);
    assert_eq!(store.read(1)?, filled_page(1));
    assert_eq!(store.read(2)?, filled_page(2));
    Ok(())
}

#[test]
fn test_withheld_flush_leaves_file_untouched() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("store_withheld")?;
    {
        let mut store = temp_db.open_page_store()?;
        let page_id = store.allocate()?;
        store.write(page_id, filled_page(9))?;
        store.flush()?;

        // Buffered but never flushed
        store.write(page_id, filled_page(7))?;
        let extra = store.allocate()?;
        store.write(extra, filled_page(8))?;
    }

    let mut store = temp_db.open_page_store()?;
    assert_eq!(store.page_count(), 2);
    assert_eq!(store.read(1)?, filled_page(9));
    Ok(())
}

#[test]
fn test_rollback_discards_buffered_writes() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("store_rollback")?;
    let mut store = temp_db.open_page_store()?;
    let page_id = store.allocate()?;
    store.write(page_id, filled_page(3))?;
    store.flush()?;

    store.write(page_id, filled_page(4))?;
    store.allocate()?;
    store.bump_schema_cookie();
    store.rollback()?;

    assert!(!store.has_pending_writes());
    assert_eq!(store.page_count(), 2);
    assert_eq!(store.read(page_id)?, filled_page(3));
    Ok(())
}

#[test]
fn test_page_zero_header_is_owned_by_store() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("store_page_zero")?;
    let mut store = temp_db.open_page_store()?;

    // A caller overwriting page 0 cannot clobber the header
    store.write(0, filled_page(0xff))?;
    let page_zero = store.read(0)?;
    assert_eq!(&page_zero[..FILE_HEADER_SIZE], &store.header().to_bytes()[..]);
    assert_eq!(page_zero[FILE_HEADER_SIZE], 0xff);
    store.flush()?;
    drop(store);

    let store = temp_db.open_page_store()?;
    assert_eq!(store.header().file_change_counter, 1);
    Ok(())
}

#[test]
fn test_free_list_reuse() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("store_free_list")?;
    let mut store = temp_db.open_page_store()?;
    let a = store.allocate()?;
    let b = store.allocate()?;
    store.write(a, filled_page(1))?;
    store.write(b, filled_page(2))?;
    store.flush()?;

    store.free(a)?;
    store.free(b)?;
    assert_eq!(store.free_page_count(), 2);
    store.flush()?;
    drop(store);

    let mut store = temp_db.open_page_store()?;
    assert_eq!(store.free_page_count(), 2);
    // Last freed comes back first, zeroed
    assert_eq!(store.allocate()?, b);
    assert_eq!(store.read(b)?, vec![0u8; PAGE_SIZE]);
    assert_eq!(store.allocate()?, a);
    assert_eq!(store.allocate()?, 3);
    assert_eq!(store.free_page_count(), 0);
    Ok(())
}

#[test]
fn test_out_of_range_access_is_rejected() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("store_range")?;
    let mut store = temp_db.open_page_store()?;

    assert!(matches!(store.read(5), Err(DatabaseError::CorruptedPage { page_id: 5, .. })));
    assert!(store.write(5, filled_page(0)).is_err());
    assert!(store.write(0, vec![0u8; 10]).is_err());
    assert!(store.free(0).is_err());
    assert!(store.free(1).is_err());
    Ok(())
}

#[test]
fn test_open_rejects_size_mismatch() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("store_size")?;
    drop(temp_db.open_page_store()?);

    let mut bytes = fs::read(temp_db.path())?;
    bytes.extend_from_slice(&[0u8; 100]);
    fs::write(temp_db.path(), &bytes)?;

    assert!(matches!(
        PageStore::open(temp_db.path(), TempDatabase::config()),
        Err(DatabaseError::CorruptedDatabase { .. })
    ));
    Ok(())
}

#[test]
fn test_open_rejects_damaged_header() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("store_header")?;
    drop(temp_db.open_page_store()?);

    let mut bytes = fs::read(temp_db.path())?;
    bytes[30] ^= 0x01;
    fs::write(temp_db.path(), &bytes)?;

    assert!(matches!(
        PageStore::open(temp_db.path(), TempDatabase::config()),
        Err(DatabaseError::InvalidHeader { .. })
    ));
    Ok(())
}

#[test]
fn test_small_cache_still_reads_everything() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("store_cache")?;
    let config = DatabaseConfig::builder()
        .sync_on_flush(false)
        .page_cache_capacity(2)
        .build();
    let mut store = PageStore::create(temp_db.path(), config)?;

    for byte in 1..=6u8 {
        let page_id = store.allocate()?;
        store.write(page_id, filled_page(byte))?;
    }
    store.flush()?;

    for byte in (1..=6u8).rev() {
        assert_eq!(store.read(byte as u64)?, filled_page(byte));
    }
    Ok(())
}
