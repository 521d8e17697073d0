//! Storage Layer
//!
//! Persists finished trip summaries behind the [`TripStore`] seam.

mod repository;

pub use repository::Repository;

use async_trait::async_trait;
use thiserror::Error;
use trip::TripSummary;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Record not found")]
    NotFound,
}

/// Persistence collaborator for finished trips
#[async_trait]
pub trait TripStore: Send + Sync {
    async fn persist(&self, summary: &TripSummary) -> Result<(), StorageError>;
}
