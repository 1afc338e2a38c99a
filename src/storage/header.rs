use crate::{
    storage::{FORMAT_VERSION, KOTAK_MAGIC},
    types::{FILE_HEADER_SIZE, PAGE_SIZE, PageId, error::DatabaseError},
    utils::hash::checksum,
};

// The checksum covers every byte before it
const HEADER_CHECKSUM_OFFSET: usize = FILE_HEADER_SIZE - 4;

/*
 * File Header (first 64 bytes of page 0, big-endian)
 * magic(16) | page_size(2) | write_version(1) | read_version(1) |
 * change_counter(4) | page_count(8) | freelist_head(8) | freelist_count(8) |
 * schema_cookie(4) | reserved(8) | checksum(4)
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub magic: [u8; 16],
    pub page_size: u16,
    pub file_format_write_version: u8,
    pub file_format_read_version: u8,
    pub file_change_counter: u32,
    pub page_count: u64,
    /// First page of the free-list, 0 when the list is empty
    pub freelist_head: PageId,
    pub freelist_count: u64,
    /// Bumped whenever the catalog changes
    pub schema_cookie: u32,
}

impl Default for FileHeader {
    fn default() -> Self {
        Self {
            magic: *KOTAK_MAGIC,
            page_size: PAGE_SIZE as u16,
            file_format_write_version: FORMAT_VERSION,
            file_format_read_version: FORMAT_VERSION,
            file_change_counter: 0,
            page_count: 1,
            freelist_head: 0,
            freelist_count: 0,
            schema_cookie: 0,
        }
    }
}

impl FileHeader {
    pub fn freelist_head(&self) -> Option<PageId> {
        match self.freelist_head {
            0 => None,
            head => Some(head),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(FILE_HEADER_SIZE);

        buffer.extend_from_slice(&self.magic);
        buffer.extend_from_slice(&self.page_size.to_be_bytes());
        buffer.push(self.file_format_write_version);
        buffer.push(self.file_format_read_version);
        buffer.extend_from_slice(&self.file_change_counter.to_be_bytes());
        buffer.extend_from_slice(&self.page_count.to_be_bytes());
        buffer.extend_from_slice(&self.freelist_head.to_be_bytes());
        buffer.extend_from_slice(&self.freelist_count.to_be_bytes());
        buffer.extend_from_slice(&self.schema_cookie.to_be_bytes());

        buffer.resize(HEADER_CHECKSUM_OFFSET, 0);
        let crc = checksum(&buffer);
        buffer.extend_from_slice(&crc.to_be_bytes());
        buffer
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DatabaseError> {
        if bytes.len() < FILE_HEADER_SIZE {
            return Err(DatabaseError::InvalidHeader {
                reason: "Header too short".to_string(),
            });
        }

        let mut magic = [0u8; 16];
        magic.copy_from_slice(&bytes[0..16]);
        if &magic != KOTAK_MAGIC {
            return Err(DatabaseError::InvalidHeader {
                reason: "Invalid kotak magic number".to_string(),
            });
        }

        let stored = u32::from_be_bytes([
            bytes[HEADER_CHECKSUM_OFFSET],
            bytes[HEADER_CHECKSUM_OFFSET + 1],
            bytes[HEADER_CHECKSUM_OFFSET + 2],
            bytes[HEADER_CHECKSUM_OFFSET + 3],
        ]);
        if checksum(&bytes[..HEADER_CHECKSUM_OFFSET]) != stored {
            return Err(DatabaseError::InvalidHeader {
                reason: "Header checksum mismatch".to_string(),
            });
        }

        let page_size = u16::from_be_bytes([bytes[16], bytes[17]]);
        if page_size != PAGE_SIZE as u16 {
            return Err(DatabaseError::InvalidHeader {
                reason: format!("Unsupported page size: {}", page_size),
            });
        }

        let file_format_write_version = bytes[18];
        let file_format_read_version = bytes[19];
        if file_format_read_version > FORMAT_VERSION {
            return Err(DatabaseError::InvalidHeader {
                reason: format!(
                    "Unsupported file format version: {}",
                    file_format_read_version
                ),
            });
        }

        let file_change_counter = u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]);
        let page_count = read_be_u64(bytes, 24);
        let freelist_head = read_be_u64(bytes, 32);
        let freelist_count = read_be_u64(bytes, 40);
        let schema_cookie = u32::from_be_bytes([bytes[48], bytes[49], bytes[50], bytes[51]]);

        if page_count == 0 || freelist_head >= page_count || freelist_count >= page_count {
            return Err(DatabaseError::InvalidHeader {
                reason: format!(
                    "Inconsistent page accounting: {} pages, free-list head {}, {} free",
                    page_count, freelist_head, freelist_count
                ),
            });
        }

        Ok(Self {
            magic,
            page_size,
            file_format_write_version,
            file_format_read_version,
            file_change_counter,
            page_count,
            freelist_head,
            freelist_count,
            schema_cookie,
        })
    }
}

fn read_be_u64(bytes: &[u8], offset: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_be_bytes(raw)
}
