pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_in_memory, DbPool};
pub use fixtures::{SeedDataset, SeedResult, VerificationResult};
