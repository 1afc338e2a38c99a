use crate::{
    storage::{
        overflow::{free_chain, read_chain, write_chain},
        page_store::PageStore,
    },
    types::{
        MAX_INLINE_CELL_SIZE, PageId,
        error::DatabaseError,
        page::{Page, PageType},
    },
};

const CELL_INLINE: u8 = 0;
const CELL_OVERFLOW: u8 = 1;
// flag(1) + total_len(4) + head(8)
const OVERFLOW_CELL_SIZE: usize = 13;

/// Rows of one table: a singly linked chain of slotted data pages starting at
/// a root page that never moves. Storage order is chain order, then slot order.
///
/// Each cell starts with a flag byte. An inline cell carries the record
/// after the flag; an overflow cell carries the record length and the head of
/// an overflow chain holding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableHeap {
    root_page_id: PageId,
}

impl TableHeap {
    pub fn new(root_page_id: PageId) -> Self {
        Self { root_page_id }
    }

    /// Allocate an empty root page for a new table.
    pub fn create(pager: &mut PageStore) -> Result<Self, DatabaseError> {
        let root_page_id = pager.allocate()?;
        let root = Page::new(root_page_id, PageType::TableData);
        pager.write(root_page_id, root.to_bytes())?;
        Ok(Self::new(root_page_id))
    }

    pub fn root_page_id(&self) -> PageId {
        self.root_page_id
    }

    pub fn load_page(pager: &mut PageStore, page_id: PageId) -> Result<Page, DatabaseError> {
        let bytes = pager.read(page_id)?;
        Page::from_bytes(page_id, &bytes)
    }

    /// Every page of the chain, root first.
    pub fn page_ids(&self, pager: &mut PageStore) -> Result<Vec<PageId>, DatabaseError> {
        let mut page_ids = Vec::new();
        let mut next = Some(self.root_page_id);
        while let Some(page_id) = next {
            if page_ids.len() as u64 >= pager.page_count() {
                return Err(DatabaseError::CorruptedPage {
                    page_id: self.root_page_id,
                    reason: "table page chain loops".to_string(),
                });
            }
            page_ids.push(page_id);
            next = Self::load_page(pager, page_id)?.next_page_id;
        }
        Ok(page_ids)
    }

    /// Record bytes held by a cell, following its overflow chain if needed.
    pub fn read_record(
        pager: &mut PageStore,
        page_id: PageId,
        cell: &[u8],
    ) -> Result<Vec<u8>, DatabaseError> {
        match cell.first() {
            Some(&CELL_INLINE) => Ok(cell[1..].to_vec()),
            Some(&CELL_OVERFLOW) => {
                let (total_len, head) = parse_overflow_cell(page_id, cell)?;
                read_chain(pager, head, total_len)
            }
            _ => Err(DatabaseError::CorruptedPage {
                page_id,
                reason: "cell without a valid flag byte".to_string(),
            }),
        }
    }

    /// All records in storage order.
    pub fn records(&self, pager: &mut PageStore) -> Result<Vec<Vec<u8>>, DatabaseError> {
        let mut records = Vec::new();
        for page_id in self.page_ids(pager)? {
            let page = Self::load_page(pager, page_id)?;
            for cell in page.cells() {
                records.push(Self::read_record(pager, page_id, cell)?);
            }
        }
        Ok(records)
    }

    /// Add records after the last one, in order. The chain is walked once.
    pub fn append_all<R: AsRef<[u8]>>(
        &self,
        pager: &mut PageStore,
        records: &[R],
    ) -> Result<(), DatabaseError> {
        let mut tail_id = self
            .page_ids(pager)?
            .last()
            .copied()
            .unwrap_or(self.root_page_id);

        for record in records {
            let cell = make_cell(pager, record.as_ref())?;
            let mut tail = Self::load_page(pager, tail_id)?;

            if tail.can_fit(cell.len()) {
                tail.insert_cell(&cell)?;
                pager.write(tail_id, tail.to_bytes())?;
                continue;
            }

            let new_page_id = pager.allocate()?;
            let mut new_page = Page::new(new_page_id, PageType::TableData);
            new_page.insert_cell(&cell)?;
            tail.next_page_id = Some(new_page_id);
            pager.write(new_page_id, new_page.to_bytes())?;
            pager.write(tail_id, tail.to_bytes())?;
            tail_id = new_page_id;
        }
        Ok(())
    }

    /// Replace the table's contents with `records`, in order. Existing chain
    /// pages are refilled from the root onward; surplus pages are freed.
    pub fn rewrite(&self, pager: &mut PageStore, records: Vec<Vec<u8>>) -> Result<(), DatabaseError> {
        let old_pages = self.page_ids(pager)?;
        for &page_id in &old_pages {
            release_overflow_cells(pager, page_id)?;
        }

        let mut reusable = old_pages.into_iter();
        reusable.next(); // the root is always reused
        let mut current = Page::new(self.root_page_id, PageType::TableData);

        for record in records {
            let cell = make_cell(pager, &record)?;
            if !current.can_fit(cell.len()) {
                let next_id = match reusable.next() {
                    Some(page_id) => page_id,
                    None => pager.allocate()?,
                };
                current.next_page_id = Some(next_id);
                pager.write(current.page_id, current.to_bytes())?;
                current = Page::new(next_id, PageType::TableData);
            }
            current.insert_cell(&cell)?;
        }
        pager.write(current.page_id, current.to_bytes())?;

        for surplus in reusable {
            pager.free(surplus)?;
        }
        Ok(())
    }

    /// Free every page the table owns, overflow chains included.
    pub fn destroy(self, pager: &mut PageStore) -> Result<(), DatabaseError> {
        for page_id in self.page_ids(pager)? {
            release_overflow_cells(pager, page_id)?;
            pager.free(page_id)?;
        }
        Ok(())
    }
}

fn make_cell(pager: &mut PageStore, record: &[u8]) -> Result<Vec<u8>, DatabaseError> {
    if 1 + record.len() <= MAX_INLINE_CELL_SIZE {
        let mut cell = Vec::with_capacity(1 + record.len());
        cell.push(CELL_INLINE);
        cell.extend_from_slice(record);
        return Ok(cell);
    }

    let Some(head) = write_chain(pager, record)? else {
        return Err(DatabaseError::SerializationError {
            details: "empty record cannot overflow".to_string(),
        });
    };
    let mut cell = Vec::with_capacity(OVERFLOW_CELL_SIZE);
    cell.push(CELL_OVERFLOW);
    cell.extend_from_slice(&(record.len() as u32).to_le_bytes());
    cell.extend_from_slice(&head.to_le_bytes());
    Ok(cell)
}

fn parse_overflow_cell(page_id: PageId, cell: &[u8]) -> Result<(usize, PageId), DatabaseError> {
    if cell.len() != OVERFLOW_CELL_SIZE {
        return Err(DatabaseError::CorruptedPage {
            page_id,
            reason: format!("overflow cell of {} bytes", cell.len()),
        });
    }
    let mut length = [0u8; 4];
    length.copy_from_slice(&cell[1..5]);
    let mut head = [0u8; 8];
    head.copy_from_slice(&cell[5..13]);
    Ok((u32::from_le_bytes(length) as usize, u64::from_le_bytes(head)))
}

fn release_overflow_cells(pager: &mut PageStore, page_id: PageId) -> Result<(), DatabaseError> {
    let page = TableHeap::load_page(pager, page_id)?;
    for cell in page.cells() {
        if cell.first() == Some(&CELL_OVERFLOW) {
            let (_, head) = parse_overflow_cell(page_id, cell)?;
            free_chain(pager, Some(head))?;
        }
    }
    Ok(())
}
