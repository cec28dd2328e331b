pub mod auth;
pub mod domain;

pub use auth::*;
pub use domain::*;
