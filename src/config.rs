//! Configuration for a kotak database handle.

/// Options applied when a database file is opened.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    // -------------------------------------------------------------------------
    // File Configuration
    // -------------------------------------------------------------------------
    /// Create the file (with an empty catalog) when it does not exist
    pub create_if_missing: bool,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// fsync the journal and the database file during every flush
    pub sync_on_flush: bool,

    /// Write a rollback journal before touching the database file.
    /// Without it a crash in the middle of a flush can tear the file.
    pub journal: bool,

    // -------------------------------------------------------------------------
    // Cache Configuration
    // -------------------------------------------------------------------------
    /// Max number of clean pages kept in memory
    pub page_cache_capacity: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            sync_on_flush: true,
            journal: true,
            page_cache_capacity: 256,
        }
    }
}

impl DatabaseConfig {
    /// Create a new config builder
    pub fn builder() -> DatabaseConfigBuilder {
        DatabaseConfigBuilder::default()
    }
}

/// Builder for DatabaseConfig
#[derive(Default)]
pub struct DatabaseConfigBuilder {
    config: DatabaseConfig,
}

impl DatabaseConfigBuilder {
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.config.create_if_missing = create;
        self
    }

    /// Set whether flushes fsync (tests turn this off for speed)
    pub fn sync_on_flush(mut self, sync: bool) -> Self {
        self.config.sync_on_flush = sync;
        self
    }

    pub fn journal(mut self, enabled: bool) -> Self {
        self.config.journal = enabled;
        self
    }

    /// Set the page cache capacity (in pages)
    pub fn page_cache_capacity(mut self, pages: usize) -> Self {
        self.config.page_cache_capacity = pages;
        self
    }

    pub fn build(self) -> DatabaseConfig {
        self.config
    }
}
