pub mod association_commands;
pub mod ingest_commands;
pub mod inventory_commands;
pub mod location_commands;
pub mod record_commands;
pub mod retention_commands;
