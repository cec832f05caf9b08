use serde::Serialize;

/// One pipeline column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageDefinition {
    pub id: String,
    pub label: String,
    pub color_token: String,
    pub description: String,
    /// No further transition is expected by convention. Not enforced.
    pub terminal: bool,
}

impl StageDefinition {
    pub fn new(id: &str, label: &str, color_token: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            color_token: color_token.to_string(),
            description: description.to_string(),
            terminal: false,
        }
    }

    fn terminal(mut self) -> Self {
        self.terminal = true;
        self
    }
}

/// Fixed ordered catalog of pipeline stages.
///
/// Ids not present in the registry are valid input everywhere: lookups
/// return `None` and such leads are reported as uncategorized.
#[derive(Debug, Clone)]
pub struct StageRegistry {
    stages: Vec<StageDefinition>,
    success_stage: String,
}

pub const DEFAULT_SUCCESS_STAGE: &str = "booked";

impl Default for StageRegistry {
    fn default() -> Self {
        let stages = vec![
            StageDefinition::new("new", "New", "blue", "Fresh lead, not yet contacted"),
            StageDefinition::new("contacted", "Contacted", "cyan", "First conversation held"),
            StageDefinition::new("qualified", "Qualified", "magenta", "Budget and intent confirmed"),
            StageDefinition::new("site_visit_scheduled", "Site Visit Scheduled", "yellow", "Visit booked on the calendar"),
            StageDefinition::new("site_visit_completed", "Site Visit Completed", "bright_yellow", "Prospect has seen the site"),
            StageDefinition::new("negotiating", "Negotiating", "bright_magenta", "Terms under discussion"),
            StageDefinition::new("booked", "Booked", "green", "Deal closed").terminal(),
            StageDefinition::new("lost", "Lost", "red", "Prospect dropped out").terminal(),
        ];
        Self {
            stages,
            success_stage: DEFAULT_SUCCESS_STAGE.to_string(),
        }
    }
}

impl StageRegistry {
    /// Build a registry from an ordered stage list.
    ///
    /// Fails if ids repeat or the success stage is not one of the stages.
    pub fn new(stages: Vec<StageDefinition>, success_stage: &str) -> Result<Self, String> {
        for (i, stage) in stages.iter().enumerate() {
            if stages[..i].iter().any(|s| s.id == stage.id) {
                return Err(format!("Duplicate stage id '{}'", stage.id));
            }
        }
        if !stages.iter().any(|s| s.id == success_stage) {
            return Err(format!("Success stage '{}' is not a known stage", success_stage));
        }
        Ok(Self {
            stages,
            success_stage: success_stage.to_string(),
        })
    }

    /// Same catalog with a different stage counted as a conversion
    pub fn with_success_stage(self, success_stage: &str) -> Result<Self, String> {
        Self::new(self.stages, success_stage)
    }

    pub fn stages(&self) -> &[StageDefinition] {
        &self.stages
    }

    pub fn by_id(&self, id: &str) -> Option<&StageDefinition> {
        self.stages.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id(id).is_some()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.stages.iter().position(|s| s.id == id)
    }

    /// Stage whose leads count as conversions
    pub fn success_stage(&self) -> &str {
        &self.success_stage
    }

    /// Resolve user input against stage ids and labels (case-insensitive).
    /// Spaces and hyphens are treated like underscores.
    pub fn resolve(&self, input: &str) -> Option<&StageDefinition> {
        let wanted = normalize(input);
        self.stages
            .iter()
            .find(|s| normalize(&s.id) == wanted || normalize(&s.label) == wanted)
    }
}

fn normalize(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}
