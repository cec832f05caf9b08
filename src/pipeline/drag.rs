//! Drag gesture state machine.
//!
//! ```text
//! Idle -> Dragging -> HoveringTarget -> (drop) -> Idle
//!            ^             |
//!            +---(leave)---+
//! ```
//!
//! A drop emits a [`TransitionRequest`] only when the target differs from the
//! origin. The controller forgets everything once a gesture ends.

use serde::{Deserialize, Serialize};

/// A request to move one lead between stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub record_id: String,
    pub from_stage: String,
    pub to_stage: String,
}

/// What the input source attaches to a drag start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragPayload {
    pub record_id: String,
    pub source_stage: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragEvent {
    Start(DragPayload),
    Over(String),
    Leave,
    Drop(String),
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        record_id: String,
        source_stage: String,
    },
    HoveringTarget {
        record_id: String,
        source_stage: String,
        candidate_stage: String,
    },
}

#[derive(Debug, Default)]
pub struct DragTransitionController {
    state: DragState,
}

impl DragTransitionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// Feed one input event. Returns a request when a drop lands on a different stage.
    pub fn handle(&mut self, event: DragEvent) -> Option<TransitionRequest> {
        let state = std::mem::take(&mut self.state);
        let (next, request) = match (state, event) {
            (_, DragEvent::Start(payload)) => (
                DragState::Dragging {
                    record_id: payload.record_id,
                    source_stage: payload.source_stage,
                },
                None,
            ),
            (DragState::Dragging { record_id, source_stage }, DragEvent::Over(candidate_stage))
            | (DragState::HoveringTarget { record_id, source_stage, .. }, DragEvent::Over(candidate_stage)) => (
                DragState::HoveringTarget {
                    record_id,
                    source_stage,
                    candidate_stage,
                },
                None,
            ),
            (DragState::HoveringTarget { record_id, source_stage, .. }, DragEvent::Leave) => {
                (DragState::Dragging { record_id, source_stage }, None)
            }
            (DragState::Dragging { record_id, source_stage }, DragEvent::Drop(target))
            | (DragState::HoveringTarget { record_id, source_stage, .. }, DragEvent::Drop(target)) => {
                if target == source_stage {
                    log::debug!("Drop of {} onto its own stage {} ignored", record_id, target);
                    (DragState::Idle, None)
                } else {
                    let request = TransitionRequest {
                        record_id,
                        from_stage: source_stage,
                        to_stage: target,
                    };
                    (DragState::Idle, Some(request))
                }
            }
            (_, DragEvent::Cancel) => (DragState::Idle, None),
            (state, event) => {
                log::debug!("Ignoring {:?} in state {:?}", event, state);
                (state, None)
            }
        };
        self.state = next;
        request
    }

    pub fn start(&mut self, record_id: &str, source_stage: &str) {
        self.handle(DragEvent::Start(DragPayload {
            record_id: record_id.to_string(),
            source_stage: source_stage.to_string(),
        }));
    }

    pub fn hover(&mut self, stage: &str) {
        self.handle(DragEvent::Over(stage.to_string()));
    }

    pub fn drop_on(&mut self, stage: &str) -> Option<TransitionRequest> {
        self.handle(DragEvent::Drop(stage.to_string()))
    }
}
