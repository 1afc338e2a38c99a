use std::{
    fs::{self, File, OpenOptions},
    io::{ErrorKind, Read, Write},
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    types::{PAGE_SIZE, PageId, error::DatabaseError},
    utils::hash::checksum,
};

const JOURNAL_MAGIC: &[u8; 8] = b"KOTAKJNL";
const JOURNAL_HEADER_SIZE: usize = 8 + 8 + 4 + 4;
const RECORD_SIZE: usize = 8 + PAGE_SIZE + 4;

/*
 * Rollback Journal Layout (big-endian)
 * magic(8) | original_page_count(8) | record_count(4) | header_checksum(4)
 * then record_count records of: page_id(8) | page image(4096) | checksum(4)
 *
 * The journal holds the pre-image of every page a flush is about to
 * overwrite. It is complete only when every record is present and valid;
 * anything less means the database file was never touched.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct Journal {
    pub original_page_count: u64,
    pub records: Vec<(PageId, Vec<u8>)>,
}

/// `<database>-journal`, next to the database file.
pub fn journal_path(database_path: &Path) -> PathBuf {
    let mut name = database_path.as_os_str().to_owned();
    name.push("-journal");
    PathBuf::from(name)
}

impl Journal {
    pub fn new(original_page_count: u64) -> Self {
        Self {
            original_page_count,
            records: Vec::new(),
        }
    }

    pub fn add_record(&mut self, page_id: PageId, pre_image: Vec<u8>) {
        self.records.push((page_id, pre_image));
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(JOURNAL_HEADER_SIZE + self.records.len() * RECORD_SIZE);
        buffer.extend_from_slice(JOURNAL_MAGIC);
        buffer.extend_from_slice(&self.original_page_count.to_be_bytes());
        buffer.extend_from_slice(&(self.records.len() as u32).to_be_bytes());
        let header_crc = checksum(&buffer);
        buffer.extend_from_slice(&header_crc.to_be_bytes());

        for (page_id, image) in &self.records {
            let start = buffer.len();
            buffer.extend_from_slice(&page_id.to_be_bytes());
            buffer.extend_from_slice(image);
            let record_crc = checksum(&buffer[start..]);
            buffer.extend_from_slice(&record_crc.to_be_bytes());
        }
        buffer
    }

    /// Parse a journal image. `None` when the journal is torn or damaged.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < JOURNAL_HEADER_SIZE || &bytes[0..8] != JOURNAL_MAGIC {
            return None;
        }
        let header_crc = u32::from_be_bytes(bytes[20..24].try_into().ok()?);
        if checksum(&bytes[..20]) != header_crc {
            return None;
        }
        let original_page_count = u64::from_be_bytes(bytes[8..16].try_into().ok()?);
        let record_count = u32::from_be_bytes(bytes[16..20].try_into().ok()?) as usize;
        if bytes.len() != JOURNAL_HEADER_SIZE + record_count * RECORD_SIZE {
            return None;
        }

        let mut records = Vec::with_capacity(record_count);
        let mut offset = JOURNAL_HEADER_SIZE;
        for _ in 0..record_count {
            let record = &bytes[offset..offset + RECORD_SIZE];
            let stored = u32::from_be_bytes(record[RECORD_SIZE - 4..].try_into().ok()?);
            if checksum(&record[..RECORD_SIZE - 4]) != stored {
                return None;
            }
            let page_id = u64::from_be_bytes(record[0..8].try_into().ok()?);
            records.push((page_id, record[8..8 + PAGE_SIZE].to_vec()));
            offset += RECORD_SIZE;
        }

        Some(Self {
            original_page_count,
            records,
        })
    }

    pub fn write(&self, path: &Path, sync: bool) -> Result<(), DatabaseError> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        file.write_all(&self.to_bytes())?;
        if sync {
            file.sync_all()?;
        }
        debug!(
            "Journaled {} page(s) to {}",
            self.records.len(),
            path.display()
        );
        Ok(())
    }

    /// Read the journal at `path`. `Ok(None)` when there is no journal or it
    /// is incomplete.
    pub fn read(path: &Path) -> Result<Option<Self>, DatabaseError> {
        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(Self::from_bytes(&bytes))
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn delete(path: &Path) -> Result<(), DatabaseError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
