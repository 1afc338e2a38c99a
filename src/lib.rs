//! kotak: an embedded relational statement engine backed by a single file.

pub mod config;
pub mod database;
pub mod executor;
pub mod planner;
pub mod result;
pub mod storage;
pub mod types;
pub mod utils;

pub use config::DatabaseConfig;
pub use database::Database;
pub use result::{StatementResult, Status};
pub use types::{
    error::{DatabaseError, ErrorKind},
    row::Row,
    value::{DataType, Value},
};
