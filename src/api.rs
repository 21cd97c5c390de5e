//! HTTP task source.
//!
//! Thin reqwest wrapper over the two listing endpoints. URL construction and
//! body parsing are plain functions so they can be tested without a server.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::time::Duration;

use reqwest::Url;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::source::{SourceError, TaskSource};
use crate::task::{Project, Task};

/// Related records requested alongside each task.
const TASK_INCLUDE: &str = "Assigns,Progress";

// =============================================================================
// CLIENT
// =============================================================================

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    auth: Option<String>,
}

impl ApiClient {
    /// Build a client from typed API config.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn new(config: ApiConfig) -> Result<Self, SourceError> {
        let mut builder =
            reqwest::Client::builder().connect_timeout(Duration::from_secs(config.timeouts.connect_secs));
        if let Some(secs) = config.timeouts.request_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(|e| SourceError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url, auth: config.auth })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_text(&self, url: Url) -> Result<String, SourceError> {
        debug!(%url, "GET");
        let mut request = self.http.get(url);
        if let Some(auth) = &self.auth {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }
        let response = request.send().await.map_err(|e| SourceError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| SourceError::Request(e.to_string()))?;

        if !(200..300).contains(&status) {
            warn!(status, "backend rejected request");
            return Err(SourceError::Response { status, body: text });
        }
        Ok(text)
    }
}

#[async_trait::async_trait]
impl TaskSource for ApiClient {
    async fn get_projects(&self) -> Result<Vec<Project>, SourceError> {
        let text = self.get_text(projects_url(&self.base_url)?).await?;
        parse_projects(&text)
    }

    async fn get_tasks_for_project(&self, project_id: &str) -> Result<Vec<Task>, SourceError> {
        let text = self.get_text(tasks_url(&self.base_url, project_id)?).await?;
        parse_tasks(&text)
    }
}

// =============================================================================
// URLS
// =============================================================================

/// `{base}/v1/projects?count=0` (count 0 lists every project).
///
/// # Errors
///
/// Returns [`SourceError::InvalidUrl`] when `base_url` is not an absolute URL.
pub fn projects_url(base_url: &str) -> Result<Url, SourceError> {
    let mut url = endpoint(base_url, &["v1", "projects"])?;
    url.query_pairs_mut().append_pair("count", "0");
    Ok(url)
}

/// `{base}/v1/projects/{id}/tasks?include=Assigns,Progress`, with the project
/// id percent-encoded as one path segment.
///
/// # Errors
///
/// Returns [`SourceError::InvalidUrl`] when `base_url` is not an absolute URL
/// or `project_id` is empty.
pub fn tasks_url(base_url: &str, project_id: &str) -> Result<Url, SourceError> {
    if project_id.is_empty() {
        return Err(SourceError::InvalidUrl("empty project id".into()));
    }
    let mut url = endpoint(base_url, &["v1", "projects", project_id, "tasks"])?;
    url.query_pairs_mut().append_pair("include", TASK_INCLUDE);
    Ok(url)
}

fn endpoint(base_url: &str, segments: &[&str]) -> Result<Url, SourceError> {
    let mut url = Url::parse(base_url).map_err(|e| SourceError::InvalidUrl(format!("{base_url}: {e}")))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| SourceError::InvalidUrl(format!("{base_url}: cannot be a base")))?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}

// =============================================================================
// PARSING
// =============================================================================

/// Parse a project listing (a JSON array of projects).
///
/// # Errors
///
/// Returns [`SourceError::Parse`] when the body is not an array of projects.
pub fn parse_projects(json: &str) -> Result<Vec<Project>, SourceError> {
    serde_json::from_str(json).map_err(|e| SourceError::Parse(e.to_string()))
}

/// Parse a task listing (a JSON array of task records).
///
/// Entries that are not objects cannot carry fields and are dropped.
///
/// # Errors
///
/// Returns [`SourceError::Parse`] when the body is not a JSON array.
pub fn parse_tasks(json: &str) -> Result<Vec<Task>, SourceError> {
    let records: Vec<Value> = serde_json::from_str(json).map_err(|e| SourceError::Parse(e.to_string()))?;
    let total = records.len();
    let tasks: Vec<Task> = records.into_iter().filter(Value::is_object).map(Task::new).collect();
    if tasks.len() != total {
        warn!(dropped = total - tasks.len(), "task listing contained non-object entries");
    }
    Ok(tasks)
}
