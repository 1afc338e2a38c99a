pub mod catalog;
pub mod header;
pub mod heap;
pub mod journal;
pub mod overflow;
pub mod page_store;
pub mod schema;

const KOTAK_MAGIC: &[u8; 16] = b"KOTAK DB v0.1\0\0\0";
const FORMAT_VERSION: u8 = 1;
