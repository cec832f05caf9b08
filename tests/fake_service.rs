// In-memory Lead Service with failure injection and gated updates

use leadboard::filter::{filter_leads, FilterState};
use leadboard::models::{ContactInfo, LeadRecord, Priority};
use leadboard::pipeline::{LeadService, ServiceError, ServiceFuture};
use std::sync::Mutex;
use tokio::sync::Semaphore;

#[derive(Default)]
struct FakeState {
    records: Vec<LeadRecord>,
    fail_updates: bool,
    fail_lists: bool,
    update_calls: Vec<(String, String)>,
    list_calls: usize,
}

pub struct FakeLeadService {
    state: Mutex<FakeState>,
    /// When set, each update waits for a permit before resolving
    gate: Option<Semaphore>,
}

impl FakeLeadService {
    pub fn new(records: Vec<LeadRecord>) -> Self {
        Self {
            state: Mutex::new(FakeState {
                records,
                ..Default::default()
            }),
            gate: None,
        }
    }

    /// Updates block until `release_update` is called
    pub fn gated(records: Vec<LeadRecord>) -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new(records)
        }
    }

    pub fn release_update(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn fail_updates(&self, fail: bool) {
        self.state.lock().unwrap().fail_updates = fail;
    }

    pub fn fail_lists(&self, fail: bool) {
        self.state.lock().unwrap().fail_lists = fail;
    }

    /// Change a stage on the server side only
    pub fn set_remote_stage(&self, id: &str, stage: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(record) = state.records.iter_mut().find(|r| r.id == id) {
            record.stage = stage.to_string();
        }
    }

    pub fn remote_stage(&self, id: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.records.iter().find(|r| r.id == id).map(|r| r.stage.clone())
    }

    pub fn update_calls(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().update_calls.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }
}

impl LeadService for FakeLeadService {
    fn list(&self, filters: FilterState) -> ServiceFuture<'_, Vec<LeadRecord>> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state.list_calls += 1;
            if state.fail_lists {
                return Err(ServiceError::Unavailable("list failed".to_string()));
            }
            Ok(filter_leads(&state.records, &filters).into_iter().cloned().collect())
        })
    }

    fn update_stage(&self, id: String, stage: String) -> ServiceFuture<'_, ()> {
        Box::pin(async move {
            self.state.lock().unwrap().update_calls.push((id.clone(), stage.clone()));
            if let Some(gate) = &self.gate {
                gate.acquire().await.expect("gate closed").forget();
            }
            let mut state = self.state.lock().unwrap();
            if state.fail_updates {
                return Err(ServiceError::Rejected("stage locked".to_string()));
            }
            match state.records.iter_mut().find(|r| r.id == id) {
                Some(record) => {
                    record.stage = stage;
                    Ok(())
                }
                None => Err(ServiceError::NotFound(id)),
            }
        })
    }
}

/// Build a lead with a fixed id
pub fn lead(id: &str, stage: &str, priority: Priority) -> LeadRecord {
    let mut lead = LeadRecord::new(
        ContactInfo {
            first_name: format!("Lead {}", id),
            ..Default::default()
        },
        stage,
    );
    lead.id = id.to_string();
    lead.priority = priority;
    lead.budget_value = Some(1000);
    lead
}

/// Ten leads: New 4, Contacted 3, Qualified 2, Booked 1.
/// Exactly two (n2 and c1) are Critical.
pub fn ten_leads() -> Vec<LeadRecord> {
    let layout = [
        ("n1", "new", Priority::Medium),
        ("n2", "new", Priority::Critical),
        ("n3", "new", Priority::Low),
        ("n4", "new", Priority::High),
        ("c1", "contacted", Priority::Critical),
        ("c2", "contacted", Priority::Medium),
        ("c3", "contacted", Priority::Low),
        ("q1", "qualified", Priority::High),
        ("q2", "qualified", Priority::Medium),
        ("b1", "booked", Priority::Low),
    ];
    layout
        .iter()
        .map(|(id, stage, priority)| lead(id, stage, *priority))
        .collect()
}
