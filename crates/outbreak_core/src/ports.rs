//! crates/outbreak_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, keeping the core
//! independent of the database, the language-model API and the ZIP metadata file.

use crate::domain::{DayEntry, User, UserCredentials, ZipRecord};
use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- ZIP Records ---
    async fn get_zip_record(&self, zip: &str) -> PortResult<ZipRecord>;

    /// Replaces the stored entry list of an existing ZIP. Never creates the record.
    async fn save_zip_entries(&self, zip: &str, entries: &[DayEntry]) -> PortResult<()>;

    /// Creates the ZIP with no entries if it is missing, and sets its population.
    async fn upsert_zip_population(&self, zip: &str, population: Option<i64>) -> PortResult<()>;

    // --- Users ---
    /// Fails with `Conflict` when the email is already registered.
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn ping(&self) -> PortResult<()>;
}

#[async_trait]
pub trait TextGenerationService: Send + Sync {
    /// Sends one system + user message pair and returns the model's reply as-is.
    async fn generate(&self, system: &str, prompt: &str) -> PortResult<String>;
}

#[async_trait]
pub trait ZipMetadataService: Send + Sync {
    /// Describes a ZIP as `HEADER = value, HEADER = value, ...`.
    async fn describe_zip(&self, zip: &str) -> PortResult<String>;

    /// Every ZIP in the metadata source with its population, if one is listed.
    async fn population_rows(&self) -> PortResult<Vec<(String, Option<i64>)>>;
}
