//! Boundary traits for the authoritative lead store and the project directory.

use crate::filter::FilterState;
use crate::models::{LeadRecord, Project};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Failure reported by a remote collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("lead service unavailable: {0}")]
    Unavailable(String),
    #[error("update rejected: {0}")]
    Rejected(String),
    #[error("lead {0} not found")]
    NotFound(String),
    #[error("storage failure: {0}")]
    Storage(String),
}

pub type ServiceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ServiceError>> + Send + 'a>>;

/// Authoritative store of lead records
pub trait LeadService: Send + Sync {
    /// Fetch the lead set for the given filters
    fn list(&self, filters: FilterState) -> ServiceFuture<'_, Vec<LeadRecord>>;

    /// Persist a stage change for one lead
    fn update_stage(&self, id: String, stage: String) -> ServiceFuture<'_, ()>;
}

/// Read-only directory used to populate project filter options
pub trait ProjectDirectory: Send + Sync {
    fn list_projects(&self) -> ServiceFuture<'_, Vec<Project>>;
}
