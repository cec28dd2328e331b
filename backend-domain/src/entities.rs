// Domain entities
pub mod association;
pub mod config;
pub mod inventory;
pub mod item_catalog;
pub mod location;
pub mod observation;

pub use association::*;
pub use config::*;
pub use inventory::*;
pub use item_catalog::*;
pub use location::*;
pub use observation::*;
