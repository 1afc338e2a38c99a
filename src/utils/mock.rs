use std::{
    io,
    path::{Path, PathBuf},
};

use tempfile::TempDir;

use crate::{
    config::DatabaseConfig,
    database::Database,
    storage::{journal::journal_path, page_store::PageStore},
    types::error::DatabaseError,
};

/// A database path inside a private temporary directory. The directory and
/// everything in it (journal included) is removed on drop.
pub struct TempDatabase {
    dir: TempDir,
    path: PathBuf,
}

impl TempDatabase {
    pub fn new() -> io::Result<Self> {
        Self::with_prefix("kotak_test")
    }

    pub fn with_prefix(prefix: &str) -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        let path = dir.path().join("test.db");
        Ok(Self { dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn journal_path(&self) -> PathBuf {
        journal_path(&self.path)
    }

    /// Tests skip fsync; durability ordering is unaffected.
    pub fn config() -> DatabaseConfig {
        DatabaseConfig::builder().sync_on_flush(false).build()
    }

    pub fn open(&self) -> Result<Database, DatabaseError> {
        Database::open_with_config(&self.path, Self::config())
    }

    /// Create the file on first use, open it afterwards.
    pub fn open_page_store(&self) -> Result<PageStore, DatabaseError> {
        if self.path.exists() {
            PageStore::open(&self.path, Self::config())
        } else {
            PageStore::create(&self.path, Self::config())
        }
    }
}
