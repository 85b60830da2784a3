// crates/client/src/filters.rs
//! Observable search filters with debounced change notification.
//!
//! Text and select edits are rapid-fire while the user types, so they
//! schedule a trailing debounce: only the last edit inside the window
//! produces a [`FilterEvent::Reset`]. Switching the admin tab is discrete
//! navigation and notifies immediately. Every notification increments the
//! generation counter first, which is what lets the feed controller
//! discard responses that a newer reset has superseded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use jobboard_types::JobStatus;

/// Notification sent to the feed controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterEvent {
    /// Filter values have settled; reload the feed from page zero.
    Reset,
}

/// Current filter selections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterValues {
    pub search: String,
    pub location: String,
    pub company_size: String,
    pub experience_level: String,
    /// Client-side salary bucket; the backend cannot filter on it.
    pub salary_range: String,
    /// Active admin tab. Ignored for non-admin viewers.
    pub admin_tab: JobStatus,
}

pub struct FilterState {
    values: RwLock<FilterValues>,
    /// Bumped immediately before every reset notification.
    generation: Arc<AtomicU64>,
    debounce: Duration,
    tx: mpsc::Sender<FilterEvent>,
    /// The pending trailing-edge task, if an edit is waiting out the
    /// debounce window. Replaced (and the old task aborted) on each edit.
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl FilterState {
    /// Returns the state handle and the receiver the feed controller
    /// drains. Setters arm timers on the Tokio runtime and must be called
    /// from within one.
    pub fn new(debounce: Duration) -> (Arc<Self>, mpsc::Receiver<FilterEvent>) {
        let (tx, rx) = mpsc::channel(16);
        let state = Arc::new(Self {
            values: RwLock::new(FilterValues::default()),
            generation: Arc::new(AtomicU64::new(0)),
            debounce,
            tx,
            pending: Mutex::new(None),
        });
        (state, rx)
    }

    pub fn values(&self) -> FilterValues {
        match self.values.read() {
            Ok(guard) => guard.clone(),
            Err(e) => {
                tracing::error!("RwLock poisoned reading filters: {e}");
                FilterValues::default()
            }
        }
    }

    /// The current filter generation. Reads taken before a dispatch and
    /// compared again afterwards detect superseded responses.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn set_search(&self, value: impl Into<String>) {
        let value = value.into();
        self.edit(move |v| v.search = value);
    }

    pub fn set_location(&self, value: impl Into<String>) {
        let value = value.into();
        self.edit(move |v| v.location = value);
    }

    pub fn set_company_size(&self, value: impl Into<String>) {
        let value = value.into();
        self.edit(move |v| v.company_size = value);
    }

    pub fn set_experience_level(&self, value: impl Into<String>) {
        let value = value.into();
        self.edit(move |v| v.experience_level = value);
    }

    pub fn set_salary_range(&self, value: impl Into<String>) {
        let value = value.into();
        self.edit(move |v| v.salary_range = value);
    }

    /// Switch the admin tab. Fires the reset immediately (a tab click is
    /// one action, not a keystroke burst) and cancels any pending
    /// debounced edit, whose values are picked up by this reset anyway.
    pub fn set_admin_tab(&self, tab: JobStatus) {
        {
            let mut guard = match self.values.write() {
                Ok(guard) => guard,
                Err(e) => {
                    tracing::error!("RwLock poisoned writing filters: {e}");
                    return;
                }
            };
            if guard.admin_tab == tab {
                return;
            }
            guard.admin_tab = tab;
        }
        self.cancel_pending();
        self.notify_now();
    }

    fn edit(&self, apply: impl FnOnce(&mut FilterValues)) {
        match self.values.write() {
            Ok(mut guard) => apply(&mut guard),
            Err(e) => {
                tracing::error!("RwLock poisoned writing filters: {e}");
                return;
            }
        }
        self.schedule();
    }

    /// Arm (or re-arm) the trailing debounce.
    fn schedule(&self) {
        let tx = self.tx.clone();
        let generation = Arc::clone(&self.generation);
        let delay = self.debounce;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            generation.fetch_add(1, Ordering::AcqRel);
            if tx.send(FilterEvent::Reset).await.is_err() {
                debug!("filter listener gone; reset not delivered");
            }
        });
        self.replace_pending(Some(handle));
    }

    fn notify_now(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        if self.tx.try_send(FilterEvent::Reset).is_err() {
            // Channel full or listener gone. The generation bump alone
            // already invalidates in-flight loads.
            warn!("reset notification dropped");
        }
    }

    fn cancel_pending(&self) {
        self.replace_pending(None);
    }

    fn replace_pending(&self, next: Option<JoinHandle<()>>) {
        match self.pending.lock() {
            Ok(mut guard) => {
                if let Some(prev) = std::mem::replace(&mut *guard, next) {
                    prev.abort();
                }
            }
            Err(e) => tracing::error!("Mutex poisoned tracking debounce: {e}"),
        }
    }
}
