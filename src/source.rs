//! Task source: the project-listing and task-listing backend.
//!
//! The wizard and the dashboard only ever see this trait. [`crate::api`]
//! provides the HTTP implementation; tests substitute in-memory fakes.

use crate::task::{Project, Task};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced while fetching projects or tasks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// The HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The configured base URL cannot address an endpoint.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request never produced a response (connect, timeout, TLS).
    #[error("request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status.
    #[error("backend returned status {status}: {body}")]
    Response { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("response parse failed: {0}")]
    Parse(String),
}

impl SourceError {
    /// Whether re-issuing the same request may succeed.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Response { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// TRAIT
// =============================================================================

#[async_trait::async_trait]
pub trait TaskSource: Send + Sync {
    /// List every project visible to the caller.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the request fails or the body is malformed.
    async fn get_projects(&self) -> Result<Vec<Project>, SourceError>;

    /// List the tasks of one project.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the request fails or the body is malformed.
    async fn get_tasks_for_project(&self, project_id: &str) -> Result<Vec<Task>, SourceError>;
}
