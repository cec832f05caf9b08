//! Optimistic stage transitions.
//!
//! A transition runs as a two-phase protocol:
//!
//! 1. **Local apply**: the store's copy of the lead moves to the target stage
//!    and a new snapshot is published before any network call is made.
//! 2. **Remote confirm** or **resync**: the Lead Service is asked to persist
//!    the move. On success nothing else changes locally. On failure the whole
//!    visible set is refetched under the current filters and replaces the
//!    store's collection; no single-field rollback is attempted.
//!
//! Requests for the same lead are not serialized. Remote confirmations may
//! arrive in any order and only the resync path guards against divergence.

use crate::pipeline::drag::TransitionRequest;
use crate::pipeline::service::{LeadService, ServiceError};
use crate::pipeline::store::{lock_store, refresh, SharedStore};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// User-facing outcome of a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    TransitionConfirmed {
        record_id: String,
        from_stage: String,
        to_stage: String,
    },
    TransitionFailed {
        record_id: String,
        from_stage: String,
        to_stage: String,
        error: ServiceError,
        /// Whether the follow-up refetch succeeded
        resynced: bool,
    },
}

impl Notification {
    pub fn is_failure(&self) -> bool {
        matches!(self, Notification::TransitionFailed { .. })
    }

    pub fn message(&self) -> String {
        match self {
            Notification::TransitionConfirmed { to_stage, .. } => {
                format!("Lead moved to {}", to_stage)
            }
            Notification::TransitionFailed { to_stage, error, resynced, .. } => {
                let tail = if *resynced {
                    "pipeline reloaded from server"
                } else {
                    "pipeline reload also failed"
                };
                format!("Could not move lead to {}: {} ({})", to_stage, error, tail)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    Pending,
    Confirmed,
    Failed(String),
}

/// Audit entry for one applied transition
#[derive(Debug, Clone)]
pub struct TransitionAudit {
    pub record_id: String,
    pub previous_stage: String,
    pub requested_stage: String,
    pub requested_at: DateTime<Utc>,
    pub outcome: TransitionOutcome,
}

pub struct OptimisticMutationCoordinator {
    store: SharedStore,
    service: Arc<dyn LeadService>,
    notifier: mpsc::UnboundedSender<Notification>,
    audit: Arc<Mutex<Vec<TransitionAudit>>>,
}

impl OptimisticMutationCoordinator {
    /// Create a coordinator and the receiving end of its notifications
    pub fn new(
        store: SharedStore,
        service: Arc<dyn LeadService>,
    ) -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (notifier, notifications) = mpsc::unbounded_channel();
        let coordinator = Self {
            store,
            service,
            notifier,
            audit: Arc::new(Mutex::new(Vec::new())),
        };
        (coordinator, notifications)
    }

    pub fn audit_trail(&self) -> Vec<TransitionAudit> {
        self.audit.lock().unwrap_or_else(|err| err.into_inner()).clone()
    }

    /// Apply a transition locally and confirm it in the background.
    ///
    /// Must be called from within a tokio runtime. Returns `None` when the
    /// lead is no longer in the store (removed by a concurrent refetch);
    /// otherwise the handle resolves once the remote call and any resync have
    /// finished. Dropping the handle does not cancel the work.
    pub fn request_transition(&self, request: TransitionRequest) -> Option<JoinHandle<TransitionOutcome>> {
        let previous_stage = {
            let mut store = lock_store(&self.store);
            match store.apply_stage(&request.record_id, &request.to_stage) {
                Some(previous) => previous,
                None => {
                    log::debug!("Transition for missing lead {} dropped", request.record_id);
                    return None;
                }
            }
        };
        log::info!(
            "Lead {} moved {} -> {} (pending confirmation)",
            request.record_id,
            previous_stage,
            request.to_stage
        );
        let audit_index = self.push_audit(&request, &previous_stage);

        let store = Arc::clone(&self.store);
        let service = Arc::clone(&self.service);
        let notifier = self.notifier.clone();
        let audit = Arc::clone(&self.audit);

        Some(tokio::spawn(async move {
            let result = service
                .update_stage(request.record_id.clone(), request.to_stage.clone())
                .await;
            let (outcome, notification) = match result {
                Ok(()) => {
                    log::info!("Lead {} confirmed in {}", request.record_id, request.to_stage);
                    (
                        TransitionOutcome::Confirmed,
                        Notification::TransitionConfirmed {
                            record_id: request.record_id,
                            from_stage: previous_stage,
                            to_stage: request.to_stage,
                        },
                    )
                }
                Err(error) => {
                    log::warn!(
                        "Stage update for lead {} failed: {}; resyncing",
                        request.record_id,
                        error
                    );
                    let resynced = resync(&store, service.as_ref()).await;
                    (
                        TransitionOutcome::Failed(error.to_string()),
                        Notification::TransitionFailed {
                            record_id: request.record_id,
                            from_stage: previous_stage,
                            to_stage: request.to_stage,
                            error,
                            resynced,
                        },
                    )
                }
            };
            if let Some(entry) = audit
                .lock()
                .unwrap_or_else(|err| err.into_inner())
                .get_mut(audit_index)
            {
                entry.outcome = outcome.clone();
            }
            // Receiver may be gone; the store already reflects the outcome
            let _ = notifier.send(notification);
            outcome
        }))
    }

    fn push_audit(&self, request: &TransitionRequest, previous_stage: &str) -> usize {
        let mut audit = self.audit.lock().unwrap_or_else(|err| err.into_inner());
        audit.push(TransitionAudit {
            record_id: request.record_id.clone(),
            previous_stage: previous_stage.to_string(),
            requested_stage: request.to_stage.clone(),
            requested_at: Utc::now(),
            outcome: TransitionOutcome::Pending,
        });
        audit.len() - 1
    }
}

/// Compensating step after a failed update: replace local state with the
/// authoritative lead set. Returns whether the refetch succeeded.
async fn resync(store: &SharedStore, service: &dyn LeadService) -> bool {
    match refresh(store, service).await {
        Ok(()) => true,
        Err(err) => {
            log::warn!("Resync after failed transition also failed: {}", err);
            false
        }
    }
}
