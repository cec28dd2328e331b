pub mod clickhouse_repo;
pub mod clickhouse_rows;
pub mod item_catalog_file;
pub mod memory_store;
pub mod snapshot_cache;

pub use clickhouse_repo::*;
pub use item_catalog_file::*;
pub use memory_store::*;
pub use snapshot_cache::*;
