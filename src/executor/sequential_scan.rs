use crate::{
    executor::scan::Scanner,
    storage::{heap::TableHeap, page_store::PageStore, schema::TableSchema},
    types::{PageId, error::DatabaseError, page::Page, row::Row},
};

/// Full scan of a table in storage order, one page at a time.
pub struct SequentialScanner<'a> {
    pager: &'a mut PageStore,
    schema: &'a TableSchema,
    current_page: Option<Page>,
    current_slot_index: usize,
    pages_visited: u64,
    is_exhausted: bool,
}

impl<'a> SequentialScanner<'a> {
    pub fn new(pager: &'a mut PageStore, schema: &'a TableSchema) -> Self {
        Self {
            pager,
            schema,
            current_page: None,
            current_slot_index: 0,
            pages_visited: 0,
            is_exhausted: false,
        }
    }

    fn load_page(&mut self, page_id: PageId) -> Result<(), DatabaseError> {
        self.pages_visited += 1;
        if self.pages_visited > self.pager.page_count() {
            return Err(DatabaseError::CorruptedPage {
                page_id: self.schema.root_page_id,
                reason: format!("page chain of '{}' loops", self.schema.table_name),
            });
        }
        self.current_page = Some(TableHeap::load_page(self.pager, page_id)?);
        self.current_slot_index = 0;
        Ok(())
    }
}

impl Scanner for SequentialScanner<'_> {
    fn scan(&mut self) -> Result<Option<Row>, DatabaseError> {
        if self.is_exhausted {
            return Ok(None);
        }
        if self.current_page.is_none() {
            self.load_page(self.schema.root_page_id)?;
        }

        loop {
            let Some(page) = self.current_page.as_ref() else {
                self.is_exhausted = true;
                return Ok(None);
            };

            if let Some(cell) = page.get_cell(self.current_slot_index) {
                let record = TableHeap::read_record(self.pager, page.page_id, cell)?;
                self.current_slot_index += 1;
                return Row::decode(&record, self.schema).map(Some);
            }

            let next_page_id = page.next_page_id;
            match next_page_id {
                Some(next_page_id) => self.load_page(next_page_id)?,
                None => {
                    self.is_exhausted = true;
                    return Ok(None);
                }
            }
        }
    }

    fn scan_batch(&mut self, batch_size: usize) -> Result<Vec<Row>, DatabaseError> {
        let mut rows = Vec::with_capacity(batch_size);
        for _ in 0..batch_size {
            match self.scan()? {
                Some(row) => rows.push(row),
                None => break,
            }
        }
        Ok(rows)
    }

    fn reset(&mut self) -> Result<(), DatabaseError> {
        self.current_page = None;
        self.current_slot_index = 0;
        self.pages_visited = 0;
        self.is_exhausted = false;
        Ok(())
    }
}
