pub mod ingest_handlers;
pub mod ops_handlers;
pub mod record_handlers;
pub mod tracking_handlers;

pub use ingest_handlers::*;
pub use ops_handlers::*;
pub use record_handlers::*;
pub use tracking_handlers::*;
