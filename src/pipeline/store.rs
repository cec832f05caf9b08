//! In-memory pipeline state.
//!
//! `PipelineStore` owns the fetched lead collection, the active filters and
//! the loading/error flags. Every mutation recomputes the visible subset and
//! publishes a fresh [`PipelineSnapshot`] to subscribers before returning.
//!
//! The store is shared as [`SharedStore`]; the lock is never held across an
//! await point, so callers on a single cooperative runtime never contend.

use crate::filter::{filter_leads, FilterState};
use crate::models::{LeadRecord, StageRegistry};
use crate::pipeline::aggregate::{aggregate, PipelineSnapshot};
use crate::pipeline::service::{LeadService, ServiceError};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

pub type SharedStore = Arc<Mutex<PipelineStore>>;

/// What happens to the visible set when a bulk fetch fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchFailurePolicy {
    /// Drop all records
    #[default]
    ClearRecords,
    /// Keep the last successfully fetched records alongside the error flag
    RetainLastKnown,
}

impl FetchFailurePolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "clear" => Some(FetchFailurePolicy::ClearRecords),
            "retain" => Some(FetchFailurePolicy::RetainLastKnown),
            _ => None,
        }
    }
}

/// Identifies one bulk fetch. Only the most recent ticket may apply its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

pub struct PipelineStore {
    registry: StageRegistry,
    records: Vec<LeadRecord>,
    filters: FilterState,
    loading: bool,
    error: Option<ServiceError>,
    load_generation: u64,
    fetch_failure_policy: FetchFailurePolicy,
    snapshot_tx: watch::Sender<PipelineSnapshot>,
}

impl PipelineStore {
    pub fn new(registry: StageRegistry, fetch_failure_policy: FetchFailurePolicy) -> Self {
        let (snapshot_tx, _) = watch::channel(aggregate(&[], &registry));
        Self {
            registry,
            records: Vec::new(),
            filters: FilterState::default(),
            loading: false,
            error: None,
            load_generation: 0,
            fetch_failure_policy,
            snapshot_tx,
        }
    }

    /// Wrap the store for sharing with the coordinator
    pub fn shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&ServiceError> {
        self.error.as_ref()
    }

    /// All fetched records, including ones hidden by the current filters
    pub fn records(&self) -> &[LeadRecord] {
        &self.records
    }

    pub fn record(&self, id: &str) -> Option<&LeadRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Records whose id starts with `prefix`
    pub fn find_by_prefix(&self, prefix: &str) -> Vec<&LeadRecord> {
        self.records.iter().filter(|r| r.id.starts_with(prefix)).collect()
    }

    pub fn visible_records(&self) -> Vec<&LeadRecord> {
        filter_leads(&self.records, &self.filters)
    }

    /// Visible records in one stage column
    pub fn column(&self, stage_id: &str) -> Vec<&LeadRecord> {
        self.visible_records()
            .into_iter()
            .filter(|r| r.stage == stage_id)
            .collect()
    }

    /// Visible records whose stage is not in the registry
    pub fn uncategorized(&self) -> Vec<&LeadRecord> {
        self.visible_records()
            .into_iter()
            .filter(|r| !self.registry.contains(&r.stage))
            .collect()
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Receive every snapshot published after a change
    pub fn subscribe(&self) -> watch::Receiver<PipelineSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Replace the filters and start a fetch for them.
    ///
    /// Local filtering applies immediately; the returned ticket must be
    /// passed to [`finish_load`](Self::finish_load) with the fetched records.
    pub fn set_filters(&mut self, filters: FilterState) -> LoadTicket {
        self.filters = filters;
        self.publish();
        self.begin_load()
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.load_generation += 1;
        self.loading = true;
        LoadTicket(self.load_generation)
    }

    /// Apply a bulk fetch result. Returns false if a newer fetch superseded it.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<Vec<LeadRecord>, ServiceError>) -> bool {
        if ticket.0 != self.load_generation {
            log::debug!(
                "Discarding stale fetch {} (current {})",
                ticket.0,
                self.load_generation
            );
            return false;
        }
        self.loading = false;
        match result {
            Ok(records) => {
                log::debug!("Loaded {} leads", records.len());
                self.records = records;
                self.error = None;
            }
            Err(err) => {
                log::warn!("Lead fetch failed: {}", err);
                if self.fetch_failure_policy == FetchFailurePolicy::ClearRecords {
                    self.records.clear();
                }
                self.error = Some(err);
            }
        }
        self.publish();
        true
    }

    /// Set a record's stage locally. Returns the previous stage, or `None`
    /// when the record is not in the store.
    pub(crate) fn apply_stage(&mut self, id: &str, stage: &str) -> Option<String> {
        let record = self.records.iter_mut().find(|r| r.id == id)?;
        let previous = std::mem::replace(&mut record.stage, stage.to_string());
        self.publish();
        Some(previous)
    }

    fn publish(&self) {
        let visible = filter_leads(&self.records, &self.filters);
        let snapshot = aggregate(&visible, &self.registry);
        log::debug!(
            "Pipeline snapshot: {} visible of {} leads",
            snapshot.totals.visible_count,
            self.records.len()
        );
        self.snapshot_tx.send_replace(snapshot);
    }
}

/// Lock the shared store, recovering the guard if a holder panicked
pub fn lock_store(store: &SharedStore) -> MutexGuard<'_, PipelineStore> {
    store.lock().unwrap_or_else(|err| err.into_inner())
}

/// Hand a fetch result to the store. A superseded fetch reports `Ok(())`
/// because the store state no longer depends on it.
fn apply_fetch(
    store: &SharedStore,
    ticket: LoadTicket,
    result: Result<Vec<LeadRecord>, ServiceError>,
) -> Result<(), ServiceError> {
    let error = result.as_ref().err().cloned();
    if !lock_store(store).finish_load(ticket, result) {
        return Ok(());
    }
    match error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Fetch the lead set under the current filters and replace the collection.
/// Returns `Ok(())` without touching the store if a newer fetch started meanwhile.
pub async fn refresh(store: &SharedStore, service: &dyn LeadService) -> Result<(), ServiceError> {
    let (ticket, filters) = {
        let mut guard = lock_store(store);
        (guard.begin_load(), guard.filters().clone())
    };
    let result = service.list(filters).await;
    apply_fetch(store, ticket, result)
}

/// Change the filters and refetch under them
pub async fn change_filters(
    store: &SharedStore,
    service: &dyn LeadService,
    filters: FilterState,
) -> Result<(), ServiceError> {
    let ticket = lock_store(store).set_filters(filters.clone());
    let result = service.list(filters).await;
    apply_fetch(store, ticket, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContactInfo, Priority};
    use crate::pipeline::service::ServiceFuture;

    /// Starts a newer load while its own fetch is in flight, then fails
    struct SupersededFetch {
        store: SharedStore,
    }

    impl LeadService for SupersededFetch {
        fn list(&self, _filters: FilterState) -> ServiceFuture<'_, Vec<LeadRecord>> {
            Box::pin(async move {
                lock_store(&self.store).begin_load();
                Err(ServiceError::Unavailable("timed out".to_string()))
            })
        }

        fn update_stage(&self, _id: String, _stage: String) -> ServiceFuture<'_, ()> {
            Box::pin(async { Ok(()) })
        }
    }

    fn lead(id: &str, stage: &str) -> LeadRecord {
        let mut lead = LeadRecord::new(
            ContactInfo {
                first_name: id.to_string(),
                ..Default::default()
            },
            stage,
        );
        lead.id = id.to_string();
        lead
    }

    fn loaded(records: Vec<LeadRecord>, policy: FetchFailurePolicy) -> PipelineStore {
        let mut store = PipelineStore::new(StageRegistry::default(), policy);
        let ticket = store.begin_load();
        assert!(store.finish_load(ticket, Ok(records)));
        store
    }

    #[test]
    fn test_load_publishes_snapshot() {
        let store = loaded(vec![lead("a", "new"), lead("b", "new"), lead("c", "lost")], FetchFailurePolicy::ClearRecords);
        assert!(!store.is_loading());
        let snapshot = store.snapshot();
        assert_eq!(snapshot.count("new"), 2);
        assert_eq!(snapshot.count("lost"), 1);
        assert_eq!(snapshot.totals.visible_count, 3);
    }

    #[test]
    fn test_apply_stage_updates_every_read_path() {
        let mut store = loaded(vec![lead("a", "new"), lead("b", "new")], FetchFailurePolicy::ClearRecords);
        let rx = store.subscribe();

        let previous = store.apply_stage("a", "qualified");
        assert_eq!(previous.as_deref(), Some("new"));
        assert_eq!(store.record("a").unwrap().stage, "qualified");
        assert_eq!(store.column("qualified").len(), 1);
        assert_eq!(store.snapshot().count("new"), 1);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow().count("qualified"), 1);
    }

    #[test]
    fn test_apply_stage_missing_record() {
        let mut store = loaded(vec![lead("a", "new")], FetchFailurePolicy::ClearRecords);
        assert!(store.apply_stage("zzz", "booked").is_none());
        assert_eq!(store.snapshot().count("new"), 1);
    }

    #[test]
    fn test_fetch_failure_clears_by_default() {
        let mut store = loaded(vec![lead("a", "new")], FetchFailurePolicy::ClearRecords);
        let ticket = store.begin_load();
        store.finish_load(ticket, Err(ServiceError::Unavailable("offline".to_string())));
        assert!(store.records().is_empty());
        assert_eq!(store.snapshot().totals.visible_count, 0);
        assert!(matches!(store.error(), Some(ServiceError::Unavailable(_))));
    }

    #[test]
    fn test_fetch_failure_can_retain_last_known() {
        let mut store = loaded(vec![lead("a", "new")], FetchFailurePolicy::RetainLastKnown);
        let ticket = store.begin_load();
        store.finish_load(ticket, Err(ServiceError::Unavailable("offline".to_string())));
        assert_eq!(store.records().len(), 1);
        assert!(store.error().is_some());

        let ticket = store.begin_load();
        store.finish_load(ticket, Ok(vec![lead("a", "new")]));
        assert!(store.error().is_none());
    }

    #[test]
    fn test_stale_fetch_is_discarded() {
        let mut store = PipelineStore::new(StageRegistry::default(), FetchFailurePolicy::ClearRecords);
        let first = store.begin_load();
        let second = store.begin_load();
        assert!(store.finish_load(second, Ok(vec![lead("new-result", "new")])));
        assert!(!store.finish_load(first, Ok(vec![lead("old-result", "lost")])));
        assert!(store.record("new-result").is_some());
        assert!(store.record("old-result").is_none());
    }

    #[test]
    fn test_set_filters_narrows_immediately() {
        let mut records = vec![lead("a", "new"), lead("b", "contacted")];
        records[0].priority = Priority::Critical;
        let mut store = loaded(records, FetchFailurePolicy::ClearRecords);

        store.set_filters(FilterState {
            priority: Some(Priority::Critical),
            ..Default::default()
        });
        assert!(store.is_loading());
        assert_eq!(store.visible_records().len(), 1);
        assert_eq!(store.snapshot().totals.visible_count, 1);
        assert_eq!(store.records().len(), 2);
    }

    #[test]
    fn test_uncategorized_records_are_reported() {
        let store = loaded(vec![lead("a", "new"), lead("b", "archived")], FetchFailurePolicy::ClearRecords);
        let unknown = store.uncategorized();
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].id, "b");
        assert_eq!(store.snapshot().uncategorized.count, 1);
    }

    #[test]
    fn test_find_by_prefix() {
        let store = loaded(vec![lead("abc1", "new"), lead("abd2", "new")], FetchFailurePolicy::ClearRecords);
        assert_eq!(store.find_by_prefix("ab").len(), 2);
        assert_eq!(store.find_by_prefix("abc").len(), 1);
        assert!(store.find_by_prefix("x").is_empty());
    }

    #[tokio::test]
    async fn test_superseded_failed_fetch_is_not_reported() {
        let store = loaded(vec![lead("a", "new")], FetchFailurePolicy::ClearRecords).shared();
        let service = SupersededFetch { store: Arc::clone(&store) };

        assert_eq!(refresh(&store, &service).await, Ok(()));
        assert_eq!(change_filters(&store, &service, FilterState::default()).await, Ok(()));

        let guard = lock_store(&store);
        assert!(guard.error().is_none());
        assert_eq!(guard.records().len(), 1);
        assert!(guard.is_loading());
    }
}
