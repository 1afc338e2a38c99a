//! Chains of overflow pages holding payloads too long for the page that
//! references them (large rows, the catalog directory tail).

use crate::{
    storage::page_store::PageStore,
    types::{OVERFLOW_PAYLOAD_SIZE, PageId, error::DatabaseError, page::OverflowPage},
};

/// Write `payload` across freshly allocated overflow pages. Returns the head
/// of the chain, or `None` for an empty payload.
pub fn write_chain(pager: &mut PageStore, payload: &[u8]) -> Result<Option<PageId>, DatabaseError> {
    if payload.is_empty() {
        return Ok(None);
    }

    let chunks: Vec<&[u8]> = payload.chunks(OVERFLOW_PAYLOAD_SIZE).collect();
    let mut page_ids = Vec::with_capacity(chunks.len());
    for _ in 0..chunks.len() {
        page_ids.push(pager.allocate()?);
    }

    for (index, chunk) in chunks.iter().enumerate() {
        let page = OverflowPage {
            page_id: page_ids[index],
            next_page_id: page_ids.get(index + 1).copied(),
            payload: chunk.to_vec(),
        };
        pager.write(page.page_id, page.to_bytes())?;
    }
    Ok(page_ids.first().copied())
}

/// Reassemble a payload of `total_len` bytes starting at `head`.
pub fn read_chain(
    pager: &mut PageStore,
    head: PageId,
    total_len: usize,
) -> Result<Vec<u8>, DatabaseError> {
    let mut payload = Vec::with_capacity(total_len);
    let mut next = Some(head);
    let mut visited = 0u64;

    while let Some(page_id) = next {
        visited += 1;
        if visited > pager.page_count() {
            return Err(DatabaseError::CorruptedPage {
                page_id: head,
                reason: "overflow chain loops".to_string(),
            });
        }
        let page = OverflowPage::from_bytes(page_id, &pager.read(page_id)?)?;
        payload.extend_from_slice(&page.payload);
        next = page.next_page_id;
    }

    if payload.len() != total_len {
        return Err(DatabaseError::CorruptedPage {
            page_id: head,
            reason: format!(
                "overflow chain holds {} bytes, expected {}",
                payload.len(),
                total_len
            ),
        });
    }
    Ok(payload)
}

/// Return every page of the chain to the free-list.
pub fn free_chain(pager: &mut PageStore, head: Option<PageId>) -> Result<(), DatabaseError> {
    let mut next = head;
    let mut visited = 0u64;

    while let Some(page_id) = next {
        visited += 1;
        if visited > pager.page_count() {
            return Err(DatabaseError::CorruptedPage {
                page_id,
                reason: "overflow chain loops".to_string(),
            });
        }
        let page = OverflowPage::from_bytes(page_id, &pager.read(page_id)?)?;
        next = page.next_page_id;
        pager.free(page_id)?;
    }
    Ok(())
}
