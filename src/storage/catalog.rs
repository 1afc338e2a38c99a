use tracing::{debug, info};

use crate::{
    storage::{
        heap::TableHeap,
        overflow::{free_chain, read_chain, write_chain},
        page_store::PageStore,
        schema::{ColumnSchema, TableSchema},
    },
    types::{FILE_HEADER_SIZE, PAGE_SIZE, PageId, error::DatabaseError},
};

// Directory header right after the file header in page 0:
// entry_count(4) | total_len(4) | overflow_head(8)
const DIRECTORY_OFFSET: usize = FILE_HEADER_SIZE;
const DIRECTORY_HEADER_SIZE: usize = 16;
const INLINE_START: usize = DIRECTORY_OFFSET + DIRECTORY_HEADER_SIZE;
/// Directory bytes kept in page 0 before spilling to overflow pages
pub const INLINE_DIRECTORY_CAPACITY: usize = PAGE_SIZE - INLINE_START;

/// Table name -> schema and root page, persisted in page 0.
///
/// The directory is the concatenation of every entry (a 4-byte length and the
/// bincode encoding of the `TableSchema`) in creation order. The part that
/// does not fit in page 0 continues in an overflow chain. Every mutation
/// rewrites the directory into the page store; it reaches disk with the next
/// flush.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    tables: Vec<TableSchema>,
    overflow_head: Option<PageId>,
}

impl Catalog {
    /// Write an empty directory into a fresh file.
    pub fn initialize(pager: &mut PageStore) -> Result<Self, DatabaseError> {
        let mut catalog = Self::default();
        catalog.persist(pager)?;
        Ok(catalog)
    }

    /// Read the directory back from page 0 and its overflow chain.
    pub fn load(pager: &mut PageStore) -> Result<Self, DatabaseError> {
        let page_zero = pager.read(0)?;
        let entry_count = read_u32(&page_zero, DIRECTORY_OFFSET) as usize;
        let total_len = read_u32(&page_zero, DIRECTORY_OFFSET + 4) as usize;
        let overflow_head = match read_u64(&page_zero, DIRECTORY_OFFSET + 8) {
            0 => None,
            head => Some(head),
        };

        let inline_len = total_len.min(INLINE_DIRECTORY_CAPACITY);
        let mut directory = page_zero[INLINE_START..INLINE_START + inline_len].to_vec();
        match overflow_head {
            Some(head) if total_len > inline_len => {
                directory.extend(read_chain(pager, head, total_len - inline_len)?);
            }
            None if total_len == inline_len => {}
            _ => {
                return Err(DatabaseError::CorruptedDatabase {
                    reason: format!(
                        "catalog of {} bytes with overflow head {:?}",
                        total_len, overflow_head
                    ),
                });
            }
        }

        let tables = decode_directory(&directory, entry_count)?;
        debug!("Loaded catalog with {} table(s)", tables.len());
        Ok(Self {
            tables,
            overflow_head,
        })
    }

    /// Register a table and allocate its root page.
    pub fn create_table(
        &mut self,
        pager: &mut PageStore,
        name: &str,
        columns: Vec<ColumnSchema>,
        sql: &str,
    ) -> Result<TableSchema, DatabaseError> {
        if self.lookup(name).is_some() {
            return Err(DatabaseError::DuplicateTable {
                name: name.to_string(),
            });
        }

        let mut schema = TableSchema::new(name.to_string(), columns, 0, sql.to_string());
        schema.validate()?;

        let heap = TableHeap::create(pager)?;
        schema.root_page_id = heap.root_page_id();
        self.tables.push(schema.clone());
        self.persist(pager)?;

        info!(
            "Created table '{}' with root page {}",
            schema.table_name, schema.root_page_id
        );
        Ok(schema)
    }

    /// Table names match case-insensitively.
    pub fn lookup(&self, name: &str) -> Option<&TableSchema> {
        self.tables
            .iter()
            .find(|table| table.table_name.eq_ignore_ascii_case(name))
    }

    pub fn get_table(&self, name: &str) -> Result<&TableSchema, DatabaseError> {
        self.lookup(name).ok_or_else(|| DatabaseError::TableNotFound {
            name: name.to_string(),
        })
    }

    /// Remove a table and free every page it owns.
    pub fn drop_table(
        &mut self,
        pager: &mut PageStore,
        name: &str,
    ) -> Result<TableSchema, DatabaseError> {
        let index = self
            .tables
            .iter()
            .position(|table| table.table_name.eq_ignore_ascii_case(name))
            .ok_or_else(|| DatabaseError::TableNotFound {
                name: name.to_string(),
            })?;

        let schema = self.tables.remove(index);
        TableHeap::new(schema.root_page_id).destroy(pager)?;
        self.persist(pager)?;

        info!("Dropped table '{}'", schema.table_name);
        Ok(schema)
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables
            .iter()
            .map(|table| table.table_name.clone())
            .collect()
    }

    pub fn tables(&self) -> &[TableSchema] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn persist(&mut self, pager: &mut PageStore) -> Result<(), DatabaseError> {
        let directory = encode_directory(&self.tables)?;

        free_chain(pager, self.overflow_head.take())?;
        let inline_len = directory.len().min(INLINE_DIRECTORY_CAPACITY);
        self.overflow_head = write_chain(pager, &directory[inline_len..])?;

        let mut page_zero = pager.read(0)?;
        page_zero[DIRECTORY_OFFSET..DIRECTORY_OFFSET + 4]
            .copy_from_slice(&(self.tables.len() as u32).to_le_bytes());
        page_zero[DIRECTORY_OFFSET + 4..DIRECTORY_OFFSET + 8]
            .copy_from_slice(&(directory.len() as u32).to_le_bytes());
        page_zero[DIRECTORY_OFFSET + 8..INLINE_START]
            .copy_from_slice(&self.overflow_head.unwrap_or(0).to_le_bytes());
        page_zero[INLINE_START..].fill(0);
        page_zero[INLINE_START..INLINE_START + inline_len].copy_from_slice(&directory[..inline_len]);

        pager.write(0, page_zero)?;
        pager.bump_schema_cookie();
        Ok(())
    }
}

fn encode_directory(tables: &[TableSchema]) -> Result<Vec<u8>, DatabaseError> {
    let mut directory = Vec::new();
    for table in tables {
        let entry = bincode::serde::encode_to_vec(table, bincode::config::standard()).map_err(
            |e| DatabaseError::SerializationError {
                details: format!("Failed to encode schema of '{}': {}", table.table_name, e),
            },
        )?;
        directory.extend_from_slice(&(entry.len() as u32).to_le_bytes());
        directory.extend_from_slice(&entry);
    }
    Ok(directory)
}

fn decode_directory(directory: &[u8], entry_count: usize) -> Result<Vec<TableSchema>, DatabaseError> {
    let mut tables = Vec::with_capacity(entry_count.min(directory.len()));
    let mut cursor = 0;
    for _ in 0..entry_count {
        let length = directory
            .get(cursor..cursor + 4)
            .map(|raw| read_u32(raw, 0) as usize)
            .ok_or_else(|| DatabaseError::CorruptedDatabase {
                reason: "catalog entry length truncated".to_string(),
            })?;
        cursor += 4;
        let entry = directory.get(cursor..cursor + length).ok_or_else(|| {
            DatabaseError::CorruptedDatabase {
                reason: format!("catalog entry of {} bytes truncated", length),
            }
        })?;
        let (table, _): (TableSchema, usize) =
            bincode::serde::decode_from_slice(entry, bincode::config::standard()).map_err(|e| {
                DatabaseError::SerializationError {
                    details: format!("Failed to decode catalog entry: {}", e),
                }
            })?;
        tables.push(table);
        cursor += length;
    }

    if cursor != directory.len() {
        return Err(DatabaseError::CorruptedDatabase {
            reason: format!("{} trailing bytes in catalog", directory.len() - cursor),
        });
    }
    Ok(tables)
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_le_bytes(raw)
}
