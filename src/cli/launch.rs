// Terminal stand-ins for the navigation target and protocol handlers

use crate::cli::output::{format_lead_detail, format_lead_editor};
use crate::models::{LeadRecord, StageRegistry};
use crate::pipeline::{Navigator, ProtocolLauncher};
use crate::repo::StageEvent;
use std::collections::HashMap;
use std::process::Command;

/// Opens URIs with the configured opener command, or prints them
pub struct CliLauncher {
    opener: Option<String>,
}

impl CliLauncher {
    pub fn new(opener: Option<String>) -> Self {
        Self { opener }
    }
}

impl ProtocolLauncher for CliLauncher {
    fn launch(&self, uri: &str) {
        match &self.opener {
            Some(opener) => match Command::new(opener).arg(uri).spawn() {
                Ok(_) => println!("Opened {}", uri),
                Err(err) => log::warn!("Failed to run '{}' for {}: {}", opener, uri, err),
            },
            None => println!("Open {}", uri),
        }
    }
}

/// Renders the detail and edit views to stdout
pub struct CliNavigator<'a> {
    leads: &'a [LeadRecord],
    registry: &'a StageRegistry,
    history: HashMap<String, Vec<StageEvent>>,
}

impl<'a> CliNavigator<'a> {
    pub fn new(leads: &'a [LeadRecord], registry: &'a StageRegistry) -> Self {
        Self {
            leads,
            registry,
            history: HashMap::new(),
        }
    }

    /// Attach stage history shown in the detail view
    pub fn with_history(mut self, record_id: &str, events: Vec<StageEvent>) -> Self {
        self.history.insert(record_id.to_string(), events);
        self
    }

    fn find(&self, record_id: &str) -> Option<&LeadRecord> {
        self.leads.iter().find(|l| l.id == record_id)
    }
}

impl Navigator for CliNavigator<'_> {
    fn open_detail(&self, record_id: &str) {
        match self.find(record_id) {
            Some(lead) => {
                let history = self.history.get(record_id).map(Vec::as_slice).unwrap_or(&[]);
                print!("{}", format_lead_detail(lead, self.registry, history));
            }
            None => log::warn!("No detail view for lead {}", record_id),
        }
    }

    fn open_editor(&self, record_id: &str) {
        match self.find(record_id) {
            Some(lead) => print!("{}", format_lead_editor(lead)),
            None => log::warn!("No edit view for lead {}", record_id),
        }
    }
}
