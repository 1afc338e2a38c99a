use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    fs::{File, OpenOptions},
    io::{self, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, info, trace, warn};

use crate::{
    config::DatabaseConfig,
    storage::{
        header::FileHeader,
        journal::{Journal, journal_path},
    },
    types::{FILE_HEADER_SIZE, PAGE_SIZE, PageId, error::DatabaseError, page::FreePage},
};

/// Bounded cache of clean page images, evicted in insertion order.
struct PageCache {
    capacity: usize,
    pages: HashMap<PageId, Vec<u8>>,
    order: VecDeque<PageId>,
}

impl PageCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            pages: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn get(&self, page_id: PageId) -> Option<&Vec<u8>> {
        self.pages.get(&page_id)
    }

    fn insert(&mut self, page_id: PageId, bytes: Vec<u8>) {
        if self.capacity == 0 {
            return;
        }
        if self.pages.insert(page_id, bytes).is_none() {
            self.order.push_back(page_id);
        }
        while self.pages.len() > self.capacity {
            match self.order.pop_front() {
                Some(evicted) => {
                    self.pages.remove(&evicted);
                }
                None => break,
            }
        }
    }

    fn remove(&mut self, page_id: PageId) {
        if self.pages.remove(&page_id).is_some() {
            self.order.retain(|cached| *cached != page_id);
        }
    }

    fn clear(&mut self) {
        self.pages.clear();
        self.order.clear();
    }
}

/// Fixed-size pages of one database file.
///
/// Writes are buffered until [`PageStore::flush`], which makes them durable
/// as one unit behind a rollback journal. Page 0 starts with the file header;
/// the store owns those bytes and patches them into every read and flush of
/// page 0, so callers only ever touch the rest of that page.
pub struct PageStore {
    path: PathBuf,
    journal_path: PathBuf,
    file: File,
    config: DatabaseConfig,
    header: FileHeader,
    committed_header: FileHeader,
    dirty: BTreeMap<PageId, Vec<u8>>,
    cache: PageCache,
}

impl PageStore {
    /// Create a new database file holding only the header page.
    pub fn create<P: AsRef<Path>>(path: P, config: DatabaseConfig) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        let mut file = OpenOptions::new()
            .create_new(true)
            .read(true)
            .write(true)
            .open(path)?;

        let header = FileHeader::default();
        let mut page_zero = vec![0u8; PAGE_SIZE];
        page_zero[..FILE_HEADER_SIZE].copy_from_slice(&header.to_bytes());
        file.write_all(&page_zero)?;
        if config.sync_on_flush {
            file.sync_all()?;
        }

        // A journal left behind by an unrelated file of the same name must never be replayed here
        let journal_path = journal_path(path);
        Journal::delete(&journal_path)?;

        info!("Created database file at {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            journal_path,
            file,
            cache: PageCache::new(config.page_cache_capacity),
            config,
            committed_header: header.clone(),
            header,
            dirty: BTreeMap::new(),
        })
    }

    /// Open an existing database file, replaying a hot journal first.
    pub fn open<P: AsRef<Path>>(path: P, config: DatabaseConfig) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        let mut file = OpenOptions::new().read(true).write(true).open(path)?;
        let journal_path = journal_path(path);

        if Self::recover_journal(&mut file, &journal_path)? {
            warn!("Recovered {} from a hot journal", path.display());
        }

        let header = Self::read_header(&mut file)?;
        let file_size = file.metadata()?.len();
        let expected_size = header.page_count * PAGE_SIZE as u64;
        if file_size != expected_size {
            return Err(DatabaseError::CorruptedDatabase {
                reason: format!(
                    "File size {} doesn't match header ({} pages)",
                    file_size, header.page_count
                ),
            });
        }

        debug!(
            "Opened {} ({} pages, {} free)",
            path.display(),
            header.page_count,
            header.freelist_count
        );
        Ok(Self {
            path: path.to_path_buf(),
            journal_path,
            file,
            cache: PageCache::new(config.page_cache_capacity),
            config,
            committed_header: header.clone(),
            header,
            dirty: BTreeMap::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn journal_path(&self) -> &Path {
        &self.journal_path
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn page_count(&self) -> u64 {
        self.header.page_count
    }

    pub fn free_page_count(&self) -> u64 {
        self.header.freelist_count
    }

    pub fn has_pending_writes(&self) -> bool {
        !self.dirty.is_empty() || self.header != self.committed_header
    }

    pub fn bump_schema_cookie(&mut self) {
        self.header.schema_cookie = self.header.schema_cookie.wrapping_add(1);
    }

    /// Hand out a zeroed page, reusing the free-list head when there is one.
    pub fn allocate(&mut self) -> Result<PageId, DatabaseError> {
        if let Some(head) = self.header.freelist_head() {
            let bytes = self.read(head)?;
            let free_page = FreePage::from_bytes(head, &bytes)?;
            self.header.freelist_head = free_page.next_free.unwrap_or(0);
            self.header.freelist_count = self.header.freelist_count.saturating_sub(1);
            self.cache.remove(head);
            self.dirty.insert(head, vec![0u8; PAGE_SIZE]);
            trace!("Reused free page {}", head);
            return Ok(head);
        }

        let page_id = self.header.page_count;
        self.header.page_count += 1;
        self.dirty.insert(page_id, vec![0u8; PAGE_SIZE]);
        trace!("Allocated new page {}", page_id);
        Ok(page_id)
    }

    /// Push a page onto the free-list.
    pub fn free(&mut self, page_id: PageId) -> Result<(), DatabaseError> {
        if page_id == 0 || page_id >= self.header.page_count {
            return Err(DatabaseError::CorruptedPage {
                page_id,
                reason: format!(
                    "cannot free page {} of a {} page file",
                    page_id, self.header.page_count
                ),
            });
        }

        let free_page = FreePage {
            page_id,
            next_free: self.header.freelist_head(),
        };
        self.cache.remove(page_id);
        self.dirty.insert(page_id, free_page.to_bytes());
        self.header.freelist_head = page_id;
        self.header.freelist_count += 1;
        trace!("Freed page {}", page_id);
        Ok(())
    }

    /// Current image of a page, including writes not yet flushed.
    pub fn read(&mut self, page_id: PageId) -> Result<Vec<u8>, DatabaseError> {
        self.check_in_range(page_id)?;

        let mut bytes = if let Some(bytes) = self.dirty.get(&page_id) {
            bytes.clone()
        } else if let Some(bytes) = self.cache.get(page_id) {
            bytes.clone()
        } else {
            let bytes = read_page_at(&mut self.file, page_id)?;
            self.cache.insert(page_id, bytes.clone());
            bytes
        };

        if page_id == 0 {
            bytes[..FILE_HEADER_SIZE].copy_from_slice(&self.header.to_bytes());
        }
        Ok(bytes)
    }

    /// Buffer a full page image until the next flush.
    pub fn write(&mut self, page_id: PageId, bytes: Vec<u8>) -> Result<(), DatabaseError> {
        self.check_in_range(page_id)?;
        if bytes.len() != PAGE_SIZE {
            return Err(DatabaseError::CorruptedPage {
                page_id,
                reason: format!("page image of {} bytes", bytes.len()),
            });
        }
        self.cache.remove(page_id);
        self.dirty.insert(page_id, bytes);
        Ok(())
    }

    /// Make every buffered write durable. On failure everything buffered is
    /// discarded and the file is restored to the last successful flush.
    pub fn flush(&mut self) -> Result<(), DatabaseError> {
        if !self.has_pending_writes() {
            return Ok(());
        }

        self.header.file_change_counter = self.header.file_change_counter.wrapping_add(1);
        let page_zero = self.read(0)?;
        self.dirty.insert(0, page_zero);

        match self.write_dirty_pages() {
            Ok(()) => {
                let written = self.dirty.len();
                for (page_id, bytes) in std::mem::take(&mut self.dirty) {
                    self.cache.insert(page_id, bytes);
                }
                self.committed_header = self.header.clone();
                debug!(
                    "Flushed {} page(s), change counter {}",
                    written, self.header.file_change_counter
                );
                Ok(())
            }
            Err(e) => {
                warn!("Flush of {} failed: {}", self.path.display(), e);
                if let Err(rollback_error) = self.rollback() {
                    warn!("Rollback after failed flush also failed: {}", rollback_error);
                }
                Err(e)
            }
        }
    }

    /// Discard every buffered write and return to the last flushed state.
    pub fn rollback(&mut self) -> Result<(), DatabaseError> {
        let discarded = self.dirty.len();
        self.dirty.clear();
        self.cache.clear();
        self.header = self.committed_header.clone();

        if Self::recover_journal(&mut self.file, &self.journal_path)? {
            self.header = Self::read_header(&mut self.file)?;
            self.committed_header = self.header.clone();
        }

        // Pages appended by an unjournaled, failed flush
        let committed_size = self.committed_header.page_count * PAGE_SIZE as u64;
        if self.file.metadata()?.len() > committed_size {
            self.file.set_len(committed_size)?;
        }

        if discarded > 0 {
            debug!("Rolled back {} buffered page(s)", discarded);
        }
        Ok(())
    }

    pub fn sync(&mut self) -> Result<(), DatabaseError> {
        self.file.sync_all()?;
        Ok(())
    }

    fn write_dirty_pages(&mut self) -> Result<(), DatabaseError> {
        if self.config.journal {
            let original_page_count = self.committed_header.page_count;
            let mut journal = Journal::new(original_page_count);
            for &page_id in self.dirty.keys() {
                if page_id < original_page_count {
                    journal.add_record(page_id, read_page_at(&mut self.file, page_id)?);
                }
            }
            journal.write(&self.journal_path, self.config.sync_on_flush)?;
        }

        for (&page_id, bytes) in &self.dirty {
            write_page_with_retry(&mut self.file, page_id, bytes)?;
        }
        if self.config.sync_on_flush {
            self.file.sync_data()?;
        }

        // Commit point
        if self.config.journal {
            Journal::delete(&self.journal_path)?;
        }
        Ok(())
    }

    fn check_in_range(&self, page_id: PageId) -> Result<(), DatabaseError> {
        if page_id >= self.header.page_count {
            return Err(DatabaseError::CorruptedPage {
                page_id,
                reason: format!("beyond end of file ({} pages)", self.header.page_count),
            });
        }
        Ok(())
    }

    fn read_header(file: &mut File) -> Result<FileHeader, DatabaseError> {
        let mut buffer = vec![0u8; FILE_HEADER_SIZE];
        file.seek(SeekFrom::Start(0))?;
        file.read_exact(&mut buffer).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => DatabaseError::InvalidHeader {
                reason: "File too short for a header".to_string(),
            },
            _ => DatabaseError::Io(e),
        })?;
        FileHeader::from_bytes(&buffer)
    }

    /// Replay a complete journal or discard a torn one. Returns whether pages
    /// were restored.
    fn recover_journal(file: &mut File, journal_path: &Path) -> Result<bool, DatabaseError> {
        match Journal::read(journal_path)? {
            Some(journal) => {
                warn!(
                    "Replaying {} page(s) from hot journal {}",
                    journal.records.len(),
                    journal_path.display()
                );
                for (page_id, image) in &journal.records {
                    write_page_with_retry(file, *page_id, image)?;
                }
                file.set_len(journal.original_page_count * PAGE_SIZE as u64)?;
                file.sync_all()?;
                Journal::delete(journal_path)?;
                Ok(true)
            }
            None => {
                if Journal::exists(journal_path) {
                    warn!("Discarding incomplete journal {}", journal_path.display());
                    Journal::delete(journal_path)?;
                }
                Ok(false)
            }
        }
    }
}

fn read_page_at(file: &mut File, page_id: PageId) -> Result<Vec<u8>, DatabaseError> {
    let mut buffer = vec![0u8; PAGE_SIZE];
    file.seek(SeekFrom::Start(page_id * PAGE_SIZE as u64))?;
    file.read_exact(&mut buffer).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => DatabaseError::CorruptedPage {
            page_id,
            reason: "page lies past the end of the file".to_string(),
        },
        _ => DatabaseError::Io(e),
    })?;
    Ok(buffer)
}

fn write_page_at(file: &mut File, page_id: PageId, bytes: &[u8]) -> io::Result<()> {
    file.seek(SeekFrom::Start(page_id * PAGE_SIZE as u64))?;
    file.write_all(bytes)
}

// A failed page write is retried once before the flush gives up
fn write_page_with_retry(file: &mut File, page_id: PageId, bytes: &[u8]) -> Result<(), DatabaseError> {
    if let Err(first) = write_page_at(file, page_id, bytes) {
        warn!("Write of page {} failed ({}), retrying", page_id, first);
        write_page_at(file, page_id, bytes).map_err(|e| DatabaseError::IncompleteWrite {
            page_id,
            details: e.to_string(),
        })?;
    }
    Ok(())
}
