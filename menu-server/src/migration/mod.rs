//! Menu item layout migration

pub mod engine;

pub use engine::{
    MigrationConfig, MigrationEngine, MigrationError, MigrationMode, MigrationReport,
    MigrationState, MigrationStatus, RETRY_WARNING, RunOutcome, VerifyReport,
};
