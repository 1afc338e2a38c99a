use std::{
    convert::Infallible,
    fmt::Display,
    io,
    path::{Path, PathBuf},
};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::{
    config::DatabaseConfig,
    executor::{Executor, QueryOutput},
    planner::parser::SqlParser,
    result::StatementResult,
    storage::{catalog::Catalog, page_store::PageStore},
    types::{error::DatabaseError, row::Row, value::Value},
};

struct Engine {
    pager: PageStore,
    catalog: Catalog,
    parser: SqlParser,
}

impl Engine {
    fn run<F, E>(&mut self, sql: &str, args: &[Value], transform: &mut F) -> Result<QueryOutput, DatabaseError>
    where
        F: FnMut(Row) -> Result<Row, E>,
        E: Display,
    {
        let plan = self.parser.compile(sql, args)?;
        debug!("Executing {} on '{}'", plan.kind(), plan.table_name());

        let output = Executor::execute(&plan, &mut self.catalog, &mut self.pager)?;
        let rows = output
            .rows
            .into_iter()
            .map(|row| {
                transform(row).map_err(|e| DatabaseError::Transform {
                    details: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.pager.flush()?;
        Ok(QueryOutput {
            columns: output.columns,
            rows,
        })
    }
}

/// A handle on one database file.
///
/// Every statement runs under a single lock: compile, execute and flush
/// happen as one unit, so statements from different threads never
/// interleave. Share the handle with `Arc<Database>`.
///
/// Opening the same file through more than one handle, in this process or
/// any other, is undefined behavior. Nothing detects it.
pub struct Database {
    path: PathBuf,
    engine: Mutex<Engine>,
}

impl Database {
    /// Open `path` with the default configuration, creating it if absent.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        Self::open_with_config(path, DatabaseConfig::default())
    }

    pub fn open_with_config<P: AsRef<Path>>(
        path: P,
        config: DatabaseConfig,
    ) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        let (pager, catalog) = if path.exists() {
            let mut pager = PageStore::open(path, config)?;
            let catalog = Catalog::load(&mut pager)?;
            (pager, catalog)
        } else if config.create_if_missing {
            let mut pager = PageStore::create(path, config)?;
            let catalog = Catalog::initialize(&mut pager)?;
            pager.flush()?;
            info!("Initialized empty catalog in {}", path.display());
            (pager, catalog)
        } else {
            return Err(DatabaseError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("database file {} does not exist", path.display()),
            )));
        };

        debug!(
            "Opened database {} with {} table(s)",
            path.display(),
            catalog.len()
        );
        Ok(Self {
            path: path.to_path_buf(),
            engine: Mutex::new(Engine {
                pager,
                catalog,
                parser: SqlParser::new(),
            }),
        })
    }

    /// Run one statement with `args` bound to its placeholders.
    pub fn execute(&self, sql: &str, args: &[Value]) -> StatementResult {
        self.execute_with_transform(sql, args, Ok::<Row, Infallible>)
    }

    /// Like [`Database::execute`], passing every result row through
    /// `transform` before it is returned. A transform error fails the
    /// statement; stored data is never affected by the transform.
    pub fn execute_with_transform<F, E>(
        &self,
        sql: &str,
        args: &[Value],
        mut transform: F,
    ) -> StatementResult
    where
        F: FnMut(Row) -> Result<Row, E>,
        E: Display,
    {
        let mut engine = self.engine.lock();
        let snapshot = engine.catalog.clone();

        match engine.run(sql, args, &mut transform) {
            Ok(output) => StatementResult::succeeded(output.columns, output.rows),
            Err(error) => {
                warn!("Statement failed ({}): {}", error.kind(), error);
                if let Err(rollback_error) = engine.pager.rollback() {
                    warn!("Rollback failed: {}", rollback_error);
                }
                engine.catalog = snapshot;
                StatementResult::failed(error)
            }
        }
    }

    /// Names of every table, in creation order.
    pub fn table_names(&self) -> Vec<String> {
        self.engine.lock().catalog.table_names()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and sync the file, then release the handle.
    pub fn close(self) -> Result<(), DatabaseError> {
        let mut engine = self.engine.into_inner();
        engine.pager.flush()?;
        engine.pager.sync()?;
        debug!("Closed database {}", self.path.display());
        Ok(())
    }
}
