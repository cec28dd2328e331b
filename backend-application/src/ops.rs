pub mod player_locks;

pub use player_locks::PlayerLocks;
