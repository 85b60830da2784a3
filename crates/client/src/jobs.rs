// crates/client/src/jobs.rs
//! Typed wrappers over the job-board REST surface.
//!
//! Thin by design: each method builds one request, sends it through the
//! authorized client, and maps the response through the error taxonomy.
//! The status PATCH additionally validates the lifecycle transition before
//! any network traffic.

use std::sync::Arc;

use reqwest::Method;
use tracing::debug;

use jobboard_types::{FilterQuery, Job, JobCreate, JobStatus, JobUpdate};

use crate::error::ApiError;
use crate::http::AuthorizedClient;

pub struct JobsApi {
    client: Arc<AuthorizedClient>,
}

impl JobsApi {
    pub fn new(client: Arc<AuthorizedClient>) -> Self {
        Self { client }
    }

    /// `GET /jobs/` with the given pagination and filters.
    pub async fn list(&self, query: &FilterQuery) -> Result<Vec<Job>, ApiError> {
        self.client
            .json(self.client.request(Method::GET, "/jobs/").query(query))
            .await
    }

    /// `GET /jobs/{id}`. A missing posting surfaces as
    /// [`ApiError::NotFound`].
    pub async fn get(&self, id: i64) -> Result<Job, ApiError> {
        self.client
            .json(self.client.request(Method::GET, &format!("/jobs/{id}")))
            .await
    }

    /// `POST /jobs`. Admin only; the server rejects everyone else.
    pub async fn create(&self, payload: &JobCreate) -> Result<Job, ApiError> {
        debug!(title = %payload.title, "creating posting");
        self.client
            .json(self.client.request(Method::POST, "/jobs").json(payload))
            .await
    }

    /// `PUT /jobs/{id}`. Fields left `None` keep their current values.
    pub async fn update(&self, id: i64, payload: &JobUpdate) -> Result<Job, ApiError> {
        self.client
            .json(self.client.request(Method::PUT, &format!("/jobs/{id}")).json(payload))
            .await
    }

    /// `PATCH /jobs/{id}/status?status=X`.
    ///
    /// Transitions the lifecycle does not allow (anything outside publish,
    /// close, unarchive) are rejected locally, before any request is sent.
    pub async fn set_status(&self, job: &Job, next: JobStatus) -> Result<Job, ApiError> {
        let next = job.status.transition_to(next)?;
        debug!(id = job.id, from = %job.status, to = %next, "changing posting status");
        self.client
            .json(
                self.client
                    .request(Method::PATCH, &format!("/jobs/{}/status", job.id))
                    .query(&[("status", next.as_str())]),
            )
            .await
    }

    /// `DELETE /jobs/{id}`. The server only accepts this for closed
    /// postings; a stale local status simply surfaces its validation
    /// error, so there is no local pre-check.
    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.client
            .expect_success(self.client.request(Method::DELETE, &format!("/jobs/{id}")))
            .await?;
        Ok(())
    }
}
