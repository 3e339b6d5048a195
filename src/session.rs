use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::config::AnalyticsConfig;
use crate::error::{AnalyticsError, Result};
use crate::models::{DashboardResult, FilterSpec};
use crate::pipeline::Pipeline;
use crate::store::RecordStore;

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Published(Arc<DashboardResult>),
    /// A later refresh started before this one finished; its result was dropped.
    Superseded,
}

/// Holds the current snapshot and the latest published result.
///
/// Every refresh takes a ticket up front; only the holder of the newest
/// ticket may publish, so overlapping refreshes resolve to the last one
/// started.
pub struct Dashboard {
    pipeline: Pipeline,
    generation: AtomicU64,
    store: RwLock<Option<Arc<RecordStore>>>,
    latest: watch::Sender<Option<Arc<DashboardResult>>>,
}

impl Dashboard {
    pub fn new(config: AnalyticsConfig) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            pipeline: Pipeline::new(config),
            generation: AtomicU64::new(0),
            store: RwLock::new(None),
            latest,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<DashboardResult>>> {
        self.latest.subscribe()
    }

    pub fn latest(&self) -> Option<Arc<DashboardResult>> {
        self.latest.borrow().clone()
    }

    fn next_ticket(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }

    /// Commits a finished run if `ticket` is still the newest one.
    ///
    /// The ticket check, the snapshot swap and the publish all happen under
    /// the store write lock, so a superseded run never leaves its snapshot
    /// behind.
    fn commit(
        &self,
        ticket: u64,
        store: Option<Arc<RecordStore>>,
        result: DashboardResult,
    ) -> RefreshOutcome {
        let mut guard = match self.store.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !self.is_current(ticket) {
            warn!(ticket, "discarding superseded dashboard run");
            return RefreshOutcome::Superseded;
        }
        if let Some(store) = store {
            *guard = Some(store);
        }
        let result = Arc::new(result);
        self.latest.send_replace(Some(Arc::clone(&result)));
        debug!(ticket, "published dashboard result");
        RefreshOutcome::Published(result)
    }

    fn current_store(&self) -> Option<Arc<RecordStore>> {
        match self.store.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Awaits `fetch` for a new snapshot, then runs the pipeline on it.
    pub async fn refresh<F>(&self, spec: &FilterSpec, fetch: F) -> Result<RefreshOutcome>
    where
        F: Future<Output = Result<RecordStore>>,
    {
        let ticket = self.next_ticket();
        let store = fetch.await?;

        if !self.is_current(ticket) {
            warn!(ticket, "snapshot arrived after a newer refresh started");
            return Ok(RefreshOutcome::Superseded);
        }

        let store = Arc::new(store);
        let result = self.pipeline.run(&store, spec)?;
        Ok(self.commit(ticket, Some(store), result))
    }

    /// Re-runs the pipeline on the current snapshot with a new filter.
    pub fn apply_filter(&self, spec: &FilterSpec) -> Result<RefreshOutcome> {
        let ticket = self.next_ticket();
        let store = self
            .current_store()
            .ok_or(AnalyticsError::InsufficientData {
                employees: 0,
                absences: 0,
            })?;
        let result = self.pipeline.run(&store, spec)?;
        Ok(self.commit(ticket, None, result))
    }
}
