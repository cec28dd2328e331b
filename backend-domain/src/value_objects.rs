// Domain value objects
pub mod change_type;
pub mod identifiers;
pub mod series_kind;

pub use change_type::*;
pub use identifiers::*;
pub use series_kind::*;
