use serde::{Deserialize, Serialize};
use std::fmt;

/// Lead priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Parse a priority name (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "critical" => Some(Priority::Critical),
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display tier derived from a lead score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreTier {
    Hot,
    Warm,
    Cold,
}

impl ScoreTier {
    pub fn from_score(score: u8) -> Self {
        if score >= 80 {
            ScoreTier::Hot
        } else if score >= 50 {
            ScoreTier::Warm
        } else {
            ScoreTier::Cold
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreTier::Hot => "hot",
            ScoreTier::Warm => "warm",
            ScoreTier::Cold => "cold",
        }
    }
}

/// Follow-up state of a lead (informational only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FollowUp {
    pub is_overdue: bool,
    pub overdue_by_days: i64,
}

impl FollowUp {
    /// Derive follow-up state from a due timestamp relative to `now_ts`.
    pub fn from_due(due_ts: Option<i64>, now_ts: i64) -> Self {
        match due_ts {
            Some(due) if due < now_ts => FollowUp {
                is_overdue: true,
                overdue_by_days: (now_ts - due) / 86_400,
            },
            _ => FollowUp::default(),
        }
    }
}

/// Contact attributes shown on a card and matched by search
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl ContactInfo {
    pub fn full_name(&self) -> String {
        if self.last_name.is_empty() {
            self.first_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }
}

/// A sales prospect under management
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: String,
    pub stage: String,
    pub priority: Priority,
    pub source: String,
    pub score: u8,
    pub project_ref: Option<String>,
    pub assigned_to_ref: Option<String>,
    pub budget_value: Option<i64>,
    pub follow_up: FollowUp,
    pub created_at: i64,
    pub contact: ContactInfo,
}

impl LeadRecord {
    /// Create a new lead in the given stage
    pub fn new(contact: ContactInfo, stage: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            stage: stage.to_string(),
            priority: Priority::Medium,
            source: String::new(),
            score: 0,
            project_ref: None,
            assigned_to_ref: None,
            budget_value: None,
            follow_up: FollowUp::default(),
            created_at: chrono::Utc::now().timestamp(),
            contact,
        }
    }

    pub fn score_tier(&self) -> ScoreTier {
        ScoreTier::from_score(self.score)
    }

    /// Budget value with absent treated as zero
    pub fn value(&self) -> i64 {
        self.budget_value.unwrap_or(0)
    }

    /// Short id prefix used in listings
    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }
}
