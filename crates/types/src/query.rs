// crates/types/src/query.rs
//! The query-string shape for `GET /jobs/`.

use serde::Serialize;

use crate::job::JobStatus;

/// Pagination and filter parameters for the job list endpoint.
///
/// Derived deterministically from the filter state plus the pagination
/// cursor. `None` fields are left out of the query string entirely; the
/// server treats absent and empty the same, but omitting keeps URLs clean.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    pub skip: u32,
    pub limit: u32,
}
