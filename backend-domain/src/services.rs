// Domain services
pub mod inventory_diff;
pub mod inventory_history;
pub mod spatial;

pub use inventory_diff::*;
pub use inventory_history::*;
pub use spatial::*;
