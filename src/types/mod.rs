pub mod error;
pub mod page;
pub mod row;
pub mod value;

// Common type aliases
pub type PageId = u64;

pub const PAGE_SIZE: usize = 4096;
pub const FILE_HEADER_SIZE: usize = 64; // Header at the start of page 0
pub const PAGE_HEADER_SIZE: usize = 32; // Per data page header
pub const OVERFLOW_HEADER_SIZE: usize = 32; // Per overflow page header

pub const SLOT_DIRECTORY_ENTRY_SIZE: usize = 4; // offset (2 bytes) + length (2 bytes)
pub const CHECKSUM_SIZE: usize = 4; // CRC32 checksum size

/// Payload bytes an overflow page can hold.
pub const OVERFLOW_PAYLOAD_SIZE: usize = PAGE_SIZE - OVERFLOW_HEADER_SIZE;

/// Rows whose encoded form exceeds this are moved to an overflow chain, so that
/// at least four cells always fit in one data page.
pub const MAX_INLINE_CELL_SIZE: usize =
    (PAGE_SIZE - PAGE_HEADER_SIZE) / 4 - SLOT_DIRECTORY_ENTRY_SIZE;
