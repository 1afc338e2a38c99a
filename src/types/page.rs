use crate::{
    types::{
        OVERFLOW_HEADER_SIZE, OVERFLOW_PAYLOAD_SIZE, PAGE_HEADER_SIZE, PAGE_SIZE, PageId,
        SLOT_DIRECTORY_ENTRY_SIZE, error::DatabaseError,
    },
    utils::hash::{calculate_page_checksum, verify_page_checksum},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    Free = 1,
    Overflow = 7,
    TableData = 13,
}

impl PageType {
    pub fn from_u8(value: u8) -> Result<Self, DatabaseError> {
        match value {
            1 => Ok(PageType::Free),
            7 => Ok(PageType::Overflow),
            13 => Ok(PageType::TableData),
            _ => Err(DatabaseError::InvalidPageType(value)),
        }
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

// Offsets shared by every typed page
const PAGE_ID_OFFSET: usize = 0;
const PAGE_TYPE_OFFSET: usize = 8;
const NEXT_PAGE_OFFSET: usize = 9;

// Data page header
const CELL_COUNT_OFFSET: usize = 17;
const FREE_SPACE_OFFSET: usize = 19;
const DATA_CHECKSUM_OFFSET: usize = 21;

// Overflow page header
const PAYLOAD_LENGTH_OFFSET: usize = 17;
const OVERFLOW_CHECKSUM_OFFSET: usize = 19;

#[derive(Debug, Clone, PartialEq)]
pub struct SlotEntry {
    pub offset: u16, // Offset from beginning of page
    pub length: u16, // Length of the cell
}

/*
 * Data Page Layout on Disk (Slotted Page Structure)
 * ┌─────────────────────────────────────────────────────────────────┐
 * │                    PAGE HEADER (32 bytes)                       │
 * │  page_id(8) | page_type(1) | next_page(8) | cell_count(2) |     │
 * │  free_space_offset(2) | checksum(4) | reserved(7)               │
 * ├─────────────────────────────────────────────────────────────────┤
 * │                  SLOT DIRECTORY                                 │
 * │  [slot0: offset(2)|len(2)] [slot1: offset(2)|len(2)] ...        │
 * ├─────────────────────────────────────────────────────────────────┤
 * │                    FREE SPACE                                   │
 * ├─────────────────────────────────────────────────────────────────┤
 * │                   CELL DATA                                     │
 * │  [...cell N...] [...cell 2...] [...cell 1...] [...cell 0...]    │
 * └─────────────────────────────────────────────────────────────────┘
 *
 * Slot order is storage order. next_page == 0 terminates the chain.
 */

#[derive(Debug, Clone)]
pub struct Page {
    pub page_id: PageId,
    pub page_type: PageType,
    pub next_page_id: Option<PageId>,
    pub slots: Vec<SlotEntry>,
    pub free_space_offset: u16,
    pub data: Vec<u8>,
}

impl Page {
    pub fn new(page_id: PageId, page_type: PageType) -> Self {
        Self {
            page_id,
            page_type,
            next_page_id: None,
            slots: Vec::new(),
            free_space_offset: PAGE_SIZE as u16,
            data: vec![0; PAGE_SIZE],
        }
    }

    pub fn cell_count(&self) -> usize {
        self.slots.len()
    }

    /// Serialize the page to bytes following the documented layout
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = vec![0u8; PAGE_SIZE];

        buffer[PAGE_ID_OFFSET..PAGE_ID_OFFSET + 8].copy_from_slice(&self.page_id.to_le_bytes());
        buffer[PAGE_TYPE_OFFSET] = self.page_type.as_u8();
        buffer[NEXT_PAGE_OFFSET..NEXT_PAGE_OFFSET + 8]
            .copy_from_slice(&self.next_page_id.unwrap_or(0).to_le_bytes());
        buffer[CELL_COUNT_OFFSET..CELL_COUNT_OFFSET + 2]
            .copy_from_slice(&(self.slots.len() as u16).to_le_bytes());
        buffer[FREE_SPACE_OFFSET..FREE_SPACE_OFFSET + 2]
            .copy_from_slice(&self.free_space_offset.to_le_bytes());

        let mut offset = PAGE_HEADER_SIZE;
        for slot in &self.slots {
            buffer[offset..offset + 2].copy_from_slice(&slot.offset.to_le_bytes());
            buffer[offset + 2..offset + 4].copy_from_slice(&slot.length.to_le_bytes());
            offset += SLOT_DIRECTORY_ENTRY_SIZE;
        }

        let cells_start = self.free_space_offset as usize;
        buffer[cells_start..].copy_from_slice(&self.data[cells_start..]);

        let checksum = calculate_page_checksum(&buffer, DATA_CHECKSUM_OFFSET);
        buffer[DATA_CHECKSUM_OFFSET..DATA_CHECKSUM_OFFSET + 4]
            .copy_from_slice(&checksum.to_le_bytes());
        buffer
    }

    /// Deserialize a data page, checking it is the page we asked for and that
    /// its checksum and slot directory are consistent.
    pub fn from_bytes(expected_page_id: PageId, bytes: &[u8]) -> Result<Self, DatabaseError> {
        if bytes.len() != PAGE_SIZE {
            return Err(DatabaseError::CorruptedPage {
                page_id: expected_page_id,
                reason: format!("expected {} bytes, got {}", PAGE_SIZE, bytes.len()),
            });
        }

        let page_id = read_u64(bytes, PAGE_ID_OFFSET);
        if page_id != expected_page_id {
            return Err(DatabaseError::CorruptedPage {
                page_id: expected_page_id,
                reason: format!("page header claims id {}", page_id),
            });
        }
        let page_type = PageType::from_u8(bytes[PAGE_TYPE_OFFSET])?;
        if page_type != PageType::TableData {
            return Err(DatabaseError::CorruptedPage {
                page_id,
                reason: format!("expected a data page, found {:?}", page_type),
            });
        }

        let stored_checksum = read_u32(bytes, DATA_CHECKSUM_OFFSET);
        if !verify_page_checksum(bytes, DATA_CHECKSUM_OFFSET, stored_checksum) {
            return Err(DatabaseError::CorruptedPage {
                page_id,
                reason: "checksum mismatch".to_string(),
            });
        }

        let next_page_id = match read_u64(bytes, NEXT_PAGE_OFFSET) {
            0 => None,
            next => Some(next),
        };
        let cell_count = read_u16(bytes, CELL_COUNT_OFFSET) as usize;
        let free_space_offset = read_u16(bytes, FREE_SPACE_OFFSET);

        let directory_end = PAGE_HEADER_SIZE + cell_count * SLOT_DIRECTORY_ENTRY_SIZE;
        if directory_end > free_space_offset as usize || free_space_offset as usize > PAGE_SIZE {
            return Err(DatabaseError::CorruptedPage {
                page_id,
                reason: format!(
                    "slot directory ({} cells) overlaps cell area at {}",
                    cell_count, free_space_offset
                ),
            });
        }

        let mut slots = Vec::with_capacity(cell_count);
        let mut offset = PAGE_HEADER_SIZE;
        for _ in 0..cell_count {
            let slot_offset = read_u16(bytes, offset);
            let length = read_u16(bytes, offset + 2);
            if (slot_offset as usize) < free_space_offset as usize
                || slot_offset as usize + length as usize > PAGE_SIZE
            {
                return Err(DatabaseError::CorruptedPage {
                    page_id,
                    reason: format!(
                        "slot at offset {} with length {} exceeds cell area",
                        slot_offset, length
                    ),
                });
            }
            slots.push(SlotEntry {
                offset: slot_offset,
                length,
            });
            offset += SLOT_DIRECTORY_ENTRY_SIZE;
        }

        Ok(Page {
            page_id,
            page_type,
            next_page_id,
            slots,
            free_space_offset,
            data: bytes.to_vec(),
        })
    }

    pub fn available_space(&self) -> usize {
        let slot_directory_size = self.slots.len() * SLOT_DIRECTORY_ENTRY_SIZE;
        self.free_space_offset as usize - PAGE_HEADER_SIZE - slot_directory_size
    }

    pub fn can_fit(&self, data_size: usize) -> bool {
        self.available_space() >= data_size + SLOT_DIRECTORY_ENTRY_SIZE
    }

    pub fn insert_cell(&mut self, data: &[u8]) -> Result<usize, DatabaseError> {
        if !self.can_fit(data.len()) {
            return Err(DatabaseError::CorruptedPage {
                page_id: self.page_id,
                reason: format!("no room for a {} byte cell", data.len()),
            });
        }

        // Cells grow downward
        let new_offset = self.free_space_offset - data.len() as u16;
        let start = new_offset as usize;
        self.data[start..start + data.len()].copy_from_slice(data);

        self.slots.push(SlotEntry {
            offset: new_offset,
            length: data.len() as u16,
        });
        self.free_space_offset = new_offset;

        Ok(self.slots.len() - 1)
    }

    pub fn get_cell(&self, slot_index: usize) -> Option<&[u8]> {
        self.slots.get(slot_index).map(|slot| {
            let start = slot.offset as usize;
            &self.data[start..start + slot.length as usize]
        })
    }

    pub fn cells(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.slots.iter().map(|slot| {
            let start = slot.offset as usize;
            &self.data[start..start + slot.length as usize]
        })
    }
}

/*
 * Overflow Page Layout
 * page_id(8) | page_type(1) | next_page(8) | payload_len(2) | checksum(4) |
 * reserved(9) | payload (up to OVERFLOW_PAYLOAD_SIZE bytes)
 */

#[derive(Debug, Clone, PartialEq)]
pub struct OverflowPage {
    pub page_id: PageId,
    pub next_page_id: Option<PageId>,
    pub payload: Vec<u8>,
}

impl OverflowPage {
    pub fn to_bytes(&self) -> Vec<u8> {
        debug_assert!(self.payload.len() <= OVERFLOW_PAYLOAD_SIZE);
        let mut buffer = vec![0u8; PAGE_SIZE];
        buffer[PAGE_ID_OFFSET..PAGE_ID_OFFSET + 8].copy_from_slice(&self.page_id.to_le_bytes());
        buffer[PAGE_TYPE_OFFSET] = PageType::Overflow.as_u8();
        buffer[NEXT_PAGE_OFFSET..NEXT_PAGE_OFFSET + 8]
            .copy_from_slice(&self.next_page_id.unwrap_or(0).to_le_bytes());
        buffer[PAYLOAD_LENGTH_OFFSET..PAYLOAD_LENGTH_OFFSET + 2]
            .copy_from_slice(&(self.payload.len() as u16).to_le_bytes());
        buffer[OVERFLOW_HEADER_SIZE..OVERFLOW_HEADER_SIZE + self.payload.len()]
            .copy_from_slice(&self.payload);

        let checksum = calculate_page_checksum(&buffer, OVERFLOW_CHECKSUM_OFFSET);
        buffer[OVERFLOW_CHECKSUM_OFFSET..OVERFLOW_CHECKSUM_OFFSET + 4]
            .copy_from_slice(&checksum.to_le_bytes());
        buffer
    }

    pub fn from_bytes(expected_page_id: PageId, bytes: &[u8]) -> Result<Self, DatabaseError> {
        if bytes.len() != PAGE_SIZE {
            return Err(DatabaseError::CorruptedPage {
                page_id: expected_page_id,
                reason: format!("expected {} bytes, got {}", PAGE_SIZE, bytes.len()),
            });
        }
        let page_id = read_u64(bytes, PAGE_ID_OFFSET);
        if page_id != expected_page_id || bytes[PAGE_TYPE_OFFSET] != PageType::Overflow.as_u8() {
            return Err(DatabaseError::CorruptedPage {
                page_id: expected_page_id,
                reason: "not an overflow page".to_string(),
            });
        }
        let stored_checksum = read_u32(bytes, OVERFLOW_CHECKSUM_OFFSET);
        if !verify_page_checksum(bytes, OVERFLOW_CHECKSUM_OFFSET, stored_checksum) {
            return Err(DatabaseError::CorruptedPage {
                page_id,
                reason: "checksum mismatch".to_string(),
            });
        }
        let length = read_u16(bytes, PAYLOAD_LENGTH_OFFSET) as usize;
        if length > OVERFLOW_PAYLOAD_SIZE {
            return Err(DatabaseError::CorruptedPage {
                page_id,
                reason: format!("payload length {} exceeds page", length),
            });
        }
        let next_page_id = match read_u64(bytes, NEXT_PAGE_OFFSET) {
            0 => None,
            next => Some(next),
        };
        Ok(OverflowPage {
            page_id,
            next_page_id,
            payload: bytes[OVERFLOW_HEADER_SIZE..OVERFLOW_HEADER_SIZE + length].to_vec(),
        })
    }
}

/// A page on the free-list: only its type and the next free page matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreePage {
    pub page_id: PageId,
    pub next_free: Option<PageId>,
}

impl FreePage {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = vec![0u8; PAGE_SIZE];
        buffer[PAGE_ID_OFFSET..PAGE_ID_OFFSET + 8].copy_from_slice(&self.page_id.to_le_bytes());
        buffer[PAGE_TYPE_OFFSET] = PageType::Free.as_u8();
        buffer[NEXT_PAGE_OFFSET..NEXT_PAGE_OFFSET + 8]
            .copy_from_slice(&self.next_free.unwrap_or(0).to_le_bytes());
        buffer
    }

    pub fn from_bytes(expected_page_id: PageId, bytes: &[u8]) -> Result<Self, DatabaseError> {
        if bytes.len() != PAGE_SIZE
            || read_u64(bytes, PAGE_ID_OFFSET) != expected_page_id
            || bytes[PAGE_TYPE_OFFSET] != PageType::Free.as_u8()
        {
            return Err(DatabaseError::CorruptedPage {
                page_id: expected_page_id,
                reason: "free-list points at a page that is not free".to_string(),
            });
        }
        let next_free = match read_u64(bytes, NEXT_PAGE_OFFSET) {
            0 => None,
            next => Some(next),
        };
        Ok(FreePage {
            page_id: expected_page_id,
            next_free,
        })
    }
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
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
