//! Filter evaluator
//!
//! Narrows the full lead set to the visible subset. Every constrained field of
//! a [`FilterState`] must match (logical AND); an empty field places no
//! constraint.
//!
//! # Fields
//!
//! - `search` - case-insensitive substring of first name, last name, full name, phone or email
//! - `project_ref` - exact project reference
//! - `assigned_to_ref` - exact assignee reference
//! - `priority` - exact priority
//! - `source` - acquisition channel, case-insensitive

use crate::models::{LeadRecord, Priority};
use serde::{Deserialize, Serialize};

/// Active filter constraints. `None` (or an empty string) means unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub search: Option<String>,
    pub project_ref: Option<String>,
    pub assigned_to_ref: Option<String>,
    pub priority: Option<Priority>,
    pub source: Option<String>,
}

/// Trimmed value of a field, or `None` when it places no constraint
pub(crate) fn constrained(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl FilterState {
    /// True when no field constrains the result
    pub fn is_empty(&self) -> bool {
        constrained(&self.search).is_none()
            && constrained(&self.project_ref).is_none()
            && constrained(&self.assigned_to_ref).is_none()
            && self.priority.is_none()
            && constrained(&self.source).is_none()
    }

    /// Evaluate filter against a lead
    pub fn matches(&self, lead: &LeadRecord) -> bool {
        if let Some(needle) = constrained(&self.search) {
            if !search_matches(lead, &needle.to_lowercase()) {
                return false;
            }
        }
        if let Some(project) = constrained(&self.project_ref) {
            if lead.project_ref.as_deref() != Some(project) {
                return false;
            }
        }
        if let Some(assignee) = constrained(&self.assigned_to_ref) {
            if lead.assigned_to_ref.as_deref() != Some(assignee) {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if lead.priority != priority {
                return false;
            }
        }
        if let Some(source) = constrained(&self.source) {
            if !lead.source.eq_ignore_ascii_case(source) {
                return false;
            }
        }
        true
    }
}

fn search_matches(lead: &LeadRecord, needle: &str) -> bool {
    let contact = &lead.contact;
    let candidates = [
        Some(contact.first_name.as_str()),
        Some(contact.last_name.as_str()),
        contact.phone.as_deref(),
        contact.email.as_deref(),
    ];
    candidates
        .iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
        || contact.full_name().to_lowercase().contains(needle)
}

/// Apply filters to leads, returning the matching subsequence in input order
pub fn filter_leads<'a>(records: &'a [LeadRecord], filters: &FilterState) -> Vec<&'a LeadRecord> {
    if filters.is_empty() {
        return records.iter().collect();
    }
    records.iter().filter(|lead| filters.matches(lead)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContactInfo;

    fn lead(first: &str, last: &str, priority: Priority, source: &str) -> LeadRecord {
        let mut lead = LeadRecord::new(
            ContactInfo {
                first_name: first.to_string(),
                last_name: last.to_string(),
                phone: Some("+91 98450 12345".to_string()),
                email: Some(format!("{}@example.com", first.to_lowercase())),
            },
            "new",
        );
        lead.priority = priority;
        lead.source = source.to_string();
        lead
    }

    fn sample() -> Vec<LeadRecord> {
        let mut leads = vec![
            lead("Asha", "Rao", Priority::Critical, "website"),
            lead("Vikram", "Shah", Priority::Low, "referral"),
            lead("Meera", "Iyer", Priority::High, "Website"),
            lead("John", "Doe", Priority::Critical, "walk-in"),
        ];
        leads[0].project_ref = Some("skyline".to_string());
        leads[1].project_ref = Some("skyline".to_string());
        leads[2].project_ref = Some("harbor".to_string());
        leads[0].assigned_to_ref = Some("priya".to_string());
        leads[3].assigned_to_ref = Some("priya".to_string());
        leads
    }

    fn names(leads: &[&LeadRecord]) -> Vec<String> {
        leads.iter().map(|l| l.contact.first_name.clone()).collect()
    }

    #[test]
    fn test_empty_filter_returns_input() {
        let leads = sample();
        let result = filter_leads(&leads, &FilterState::default());
        assert_eq!(result.len(), leads.len());

        let blank = FilterState {
            search: Some("   ".to_string()),
            source: Some(String::new()),
            ..Default::default()
        };
        assert!(blank.is_empty());
        assert_eq!(filter_leads(&leads, &blank).len(), leads.len());
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let leads = sample();
        let filters = FilterState {
            search: Some("MEERA".to_string()),
            ..Default::default()
        };
        assert_eq!(names(&filter_leads(&leads, &filters)), vec!["Meera"]);

        let by_full_name = FilterState {
            search: Some("john doe".to_string()),
            ..Default::default()
        };
        assert_eq!(names(&filter_leads(&leads, &by_full_name)), vec!["John"]);
    }

    #[test]
    fn test_search_matches_phone_and_email() {
        let leads = sample();
        let by_email = FilterState {
            search: Some("vikram@".to_string()),
            ..Default::default()
        };
        assert_eq!(names(&filter_leads(&leads, &by_email)), vec!["Vikram"]);

        let by_phone = FilterState {
            search: Some("98450".to_string()),
            ..Default::default()
        };
        assert_eq!(filter_leads(&leads, &by_phone).len(), 4);
    }

    #[test]
    fn test_fields_combine_with_and() {
        let leads = sample();
        let filters = FilterState {
            priority: Some(Priority::Critical),
            assigned_to_ref: Some("priya".to_string()),
            project_ref: Some("skyline".to_string()),
            ..Default::default()
        };
        assert_eq!(names(&filter_leads(&leads, &filters)), vec!["Asha"]);
    }

    #[test]
    fn test_source_ignores_case() {
        let leads = sample();
        let filters = FilterState {
            source: Some("WEBSITE".to_string()),
            ..Default::default()
        };
        assert_eq!(names(&filter_leads(&leads, &filters)), vec!["Asha", "Meera"]);
    }

    #[test]
    fn test_output_preserves_order() {
        let leads = sample();
        let filters = FilterState {
            priority: Some(Priority::Critical),
            ..Default::default()
        };
        assert_eq!(names(&filter_leads(&leads, &filters)), vec!["Asha", "John"]);
    }
}
