//! Quick actions on a lead card that never touch its stage.

use crate::models::LeadRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    View,
    Edit,
    Call,
    Email,
    Message,
}

impl QuickAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuickAction::View => "view",
            QuickAction::Edit => "edit",
            QuickAction::Call => "call",
            QuickAction::Email => "email",
            QuickAction::Message => "message",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "view" => Some(QuickAction::View),
            "edit" => Some(QuickAction::Edit),
            "call" => Some(QuickAction::Call),
            "email" => Some(QuickAction::Email),
            "message" => Some(QuickAction::Message),
            _ => None,
        }
    }
}

/// Opens `tel:`, `mailto:` and `sms:` URIs. Fire-and-forget.
pub trait ProtocolLauncher {
    fn launch(&self, uri: &str);
}

/// Detail and edit views keyed by lead id
pub trait Navigator {
    fn open_detail(&self, record_id: &str);
    fn open_editor(&self, record_id: &str);
}

pub struct QuickActionDispatcher<'a> {
    navigator: &'a dyn Navigator,
    launcher: &'a dyn ProtocolLauncher,
}

impl<'a> QuickActionDispatcher<'a> {
    pub fn new(navigator: &'a dyn Navigator, launcher: &'a dyn ProtocolLauncher) -> Self {
        Self { navigator, launcher }
    }

    /// Perform exactly one side effect for `action`
    pub fn dispatch(&self, action: QuickAction, record: &LeadRecord) {
        log::debug!("Dispatching {} for lead {}", action.as_str(), record.id);
        match action {
            QuickAction::View => self.navigator.open_detail(&record.id),
            QuickAction::Edit => self.navigator.open_editor(&record.id),
            QuickAction::Call => self.launcher.launch(&format!("tel:{}", dial_string(record))),
            QuickAction::Email => self.launcher.launch(&format!(
                "mailto:{}",
                record.contact.email.as_deref().unwrap_or("")
            )),
            QuickAction::Message => self.launcher.launch(&format!("sms:{}", dial_string(record))),
        }
    }
}

fn dial_string(record: &LeadRecord) -> String {
    record
        .contact
        .phone
        .as_deref()
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}
