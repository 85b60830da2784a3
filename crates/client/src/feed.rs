// crates/client/src/feed.rs
//! The incremental job feed.
//!
//! One controller owns the ordered, id-unique cache of fetched postings
//! and the pagination cursor over it. Filter resets replace the cache
//! from page zero; scroll continuation appends pages; admin mutations
//! (create/update/delete) patch the cache in place without a refetch.
//!
//! Every dispatch is tagged with the filter generation current at that
//! moment. A response whose tag no longer matches is discarded wholesale,
//! so a slow page can never overwrite the results of a newer reset.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use jobboard_types::{FilterQuery, Job, JobStatus};

use crate::error::ApiError;
use crate::filters::{FilterEvent, FilterState};
use crate::http::AuthorizedClient;
use crate::session::SessionStore;

/// Fetch phase. At most one load is in flight at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedPhase {
    #[default]
    Idle,
    /// A from-scratch reload after a filter change or initial mount.
    Loading,
    /// A scroll-triggered continuation of the current result set.
    LoadingMore,
}

#[derive(Debug, Default)]
struct FeedInner {
    jobs: Vec<Job>,
    /// Next page index; `skip = page * limit` for continuations.
    page: u32,
    has_more: bool,
    phase: FeedPhase,
    /// Display-ready message from the most recent failed load. Cleared by
    /// the next successful one.
    last_error: Option<String>,
}

/// What the display layer renders: the projected rows plus load state.
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub jobs: Vec<Job>,
    pub phase: FeedPhase,
    pub has_more: bool,
    pub error: Option<String>,
}

/// Outcome of a dispatch attempt, before any network traffic.
enum Dispatch {
    Go { skip: u32, generation: u64, query: FilterQuery },
    /// A continuation was requested while a load was already in flight
    /// (or there is nothing more to load). Dropped, never queued.
    Dropped,
}

pub struct JobFeedController {
    client: Arc<AuthorizedClient>,
    session: Arc<SessionStore>,
    filters: Arc<FilterState>,
    page_limit: u32,
    inner: Mutex<FeedInner>,
}

impl JobFeedController {
    pub fn new(
        client: Arc<AuthorizedClient>,
        session: Arc<SessionStore>,
        filters: Arc<FilterState>,
        page_limit: u32,
    ) -> Self {
        Self {
            client,
            session,
            filters,
            page_limit,
            inner: Mutex::new(FeedInner::default()),
        }
    }

    /// Reload from page zero with the current filter values. Used for the
    /// initial mount and for every filter reset.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        self.load_page(true).await.map(|_| ())
    }

    /// Fetch the next page when idle and more rows exist. Returns `false`
    /// when the request was dropped (busy, exhausted, or superseded).
    pub async fn load_more(&self) -> Result<bool, ApiError> {
        self.load_page(false).await
    }

    /// Drain filter reset events until the sender side goes away.
    pub fn spawn_listener(self: Arc<Self>, mut rx: mpsc::Receiver<FilterEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(FilterEvent::Reset) = rx.recv().await {
                if let Err(err) = self.refresh().await {
                    // Already recorded on the snapshot for the consumer.
                    debug!(error = %err, "filter reset load failed");
                }
            }
            debug!("filter channel closed; feed listener exiting");
        })
    }

    async fn load_page(&self, reset: bool) -> Result<bool, ApiError> {
        let (skip, generation, query) = match self.begin(reset).await {
            Dispatch::Go { skip, generation, query } => (skip, generation, query),
            Dispatch::Dropped => return Ok(false),
        };

        debug!(skip, generation, reset, "dispatching feed page");
        let result: Result<Vec<Job>, ApiError> = self
            .client
            .json(self.client.request(reqwest::Method::GET, "/jobs/").query(&query))
            .await;

        self.finish(reset, generation, result).await
    }

    /// Phase gate and query construction, done under the lock.
    async fn begin(&self, reset: bool) -> Dispatch {
        let mut inner = self.inner.lock().await;
        let skip = if reset {
            // Resets are never dropped: a newer reset supersedes whatever
            // is in flight, and the generation tag retires the loser.
            inner.phase = FeedPhase::Loading;
            0
        } else {
            if inner.phase != FeedPhase::Idle {
                debug!("load-more dropped: a load is already in flight");
                return Dispatch::Dropped;
            }
            if !inner.has_more {
                return Dispatch::Dropped;
            }
            inner.phase = FeedPhase::LoadingMore;
            inner.page * self.page_limit
        };

        Dispatch::Go {
            skip,
            generation: self.filters.generation(),
            query: self.query(skip),
        }
    }

    /// Apply a completed dispatch. Stale generations are discarded without
    /// touching cache, cursor, phase, or error state; the reset that
    /// superseded them owns all of those now.
    async fn finish(
        &self,
        reset: bool,
        generation: u64,
        result: Result<Vec<Job>, ApiError>,
    ) -> Result<bool, ApiError> {
        let mut inner = self.inner.lock().await;
        if self.filters.generation() != generation {
            debug!(generation, "discarding superseded feed response");
            return Ok(false);
        }

        match result {
            Ok(jobs) => {
                inner.has_more = jobs.len() as u32 == self.page_limit;
                inner.last_error = None;
                if reset {
                    inner.jobs = jobs;
                    inner.page = 1;
                } else {
                    // The server pages without overlap, but the cache
                    // invariant (unique ids) does not rely on that.
                    for job in jobs {
                        if inner.jobs.iter().all(|j| j.id != job.id) {
                            inner.jobs.push(job);
                        }
                    }
                    inner.page += 1;
                }
                inner.phase = FeedPhase::Idle;
                Ok(true)
            }
            Err(err) => {
                warn!(error = %err, "feed load failed");
                inner.phase = FeedPhase::Idle;
                inner.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// The query for a dispatch at `skip`. Admins page the tab they are
    /// looking at; everyone else only ever sees active postings.
    fn query(&self, skip: u32) -> FilterQuery {
        let values = self.filters.values();
        FilterQuery {
            search: none_if_empty(values.search),
            location: none_if_empty(values.location),
            company_size: none_if_empty(values.company_size),
            experience_level: none_if_empty(values.experience_level),
            status: Some(self.visible_status()),
            skip,
            limit: self.page_limit,
        }
    }

    fn visible_status(&self) -> JobStatus {
        if self.session.is_admin() {
            self.filters.values().admin_tab
        } else {
            JobStatus::Active
        }
    }

    /// The rows the consumer should render right now: the cache projected
    /// through the status view and the client-side salary bucket. Pure;
    /// cached entries are never mutated or discarded by a read.
    pub async fn visible_jobs(&self) -> Vec<Job> {
        let inner = self.inner.lock().await;
        project(&inner.jobs, self.visible_status(), &self.filters.values().salary_range)
    }

    pub async fn snapshot(&self) -> FeedSnapshot {
        let inner = self.inner.lock().await;
        FeedSnapshot {
            jobs: project(&inner.jobs, self.visible_status(), &self.filters.values().salary_range),
            phase: inner.phase,
            has_more: inner.has_more,
            error: inner.last_error.clone(),
        }
    }

    /// Place a newly created posting at the top of the cache, when it
    /// belongs to the view the user is looking at.
    pub async fn apply_created(&self, job: Job) {
        if job.status != self.visible_status() {
            return;
        }
        let mut inner = self.inner.lock().await;
        if inner.jobs.iter().any(|j| j.id == job.id) {
            return;
        }
        inner.jobs.insert(0, job);
    }

    /// Replace the cached posting with the same id, in place. A posting
    /// that moved to another status stays cached and simply drops out of
    /// the current projection.
    pub async fn apply_updated(&self, job: Job) {
        let mut inner = self.inner.lock().await;
        if let Some(slot) = inner.jobs.iter_mut().find(|j| j.id == job.id) {
            *slot = job;
        }
    }

    pub async fn apply_deleted(&self, id: i64) {
        let mut inner = self.inner.lock().await;
        inner.jobs.retain(|j| j.id != id);
    }
}

fn project(jobs: &[Job], status: JobStatus, salary_range: &str) -> Vec<Job> {
    jobs.iter()
        .filter(|job| job.status == status)
        .filter(|job| salary_range.is_empty() || job.salary_range.as_deref() == Some(salary_range))
        .cloned()
        .collect()
}

fn none_if_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
