//! Pipeline transition engine
//!
//! - `aggregate` - per-stage statistics and totals
//! - `store` - in-memory lead collection, filters, loading/error flags
//! - `drag` - gesture state machine producing transition requests
//! - `coordinator` - optimistic apply, remote confirm, resync on failure
//! - `actions` - view/edit/contact side effects
//! - `service` - boundary traits for the authoritative store

pub mod actions;
pub mod aggregate;
pub mod coordinator;
pub mod drag;
pub mod service;
pub mod store;

pub use actions::{Navigator, ProtocolLauncher, QuickAction, QuickActionDispatcher};
pub use aggregate::{aggregate, PipelineSnapshot, PipelineTotals, StageColumn, StageStats};
pub use coordinator::{Notification, OptimisticMutationCoordinator, TransitionAudit, TransitionOutcome};
pub use drag::{DragEvent, DragPayload, DragState, DragTransitionController, TransitionRequest};
pub use service::{LeadService, ProjectDirectory, ServiceError, ServiceFuture};
pub use store::{change_filters, lock_store, refresh, FetchFailurePolicy, LoadTicket, PipelineStore, SharedStore};
