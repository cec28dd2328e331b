pub mod clock;
pub mod health_service;
pub mod retention_service;

pub use clock::*;
pub use health_service::*;
pub use retention_service::*;
