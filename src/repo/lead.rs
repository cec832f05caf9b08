use rusqlite::{Connection, OptionalExtension, Row};
use crate::filter::evaluator::constrained;
use crate::filter::FilterState;
use crate::models::{ContactInfo, FollowUp, LeadRecord, Priority};
use crate::repo::ProjectRepo;
use anyhow::{Context, Result};
use serde::Deserialize;

/// Lead as supplied by an import file
#[derive(Debug, Clone, Deserialize)]
pub struct NewLead {
    #[serde(default)]
    pub id: Option<String>,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_stage")]
    pub stage: String,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub score: u8,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub budget_value: Option<i64>,
    /// Follow-up date as YYYY-MM-DD
    #[serde(default)]
    pub follow_up: Option<String>,
}

fn default_stage() -> String {
    "new".to_string()
}

fn default_priority() -> Priority {
    Priority::Medium
}

/// One row of a lead's stage history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageEvent {
    pub from_stage: String,
    pub to_stage: String,
    pub ts: i64,
}

const LEAD_COLUMNS: &str =
    "l.id, l.first_name, l.last_name, l.phone, l.email, l.stage, l.priority, l.source,
     l.score, p.name, l.assigned_to, l.budget_value, l.follow_up_ts, l.created_ts";

/// Lead repository for database operations
pub struct LeadRepo;

impl LeadRepo {
    /// Insert a lead. Unknown project names are created.
    pub fn create(conn: &Connection, lead: &NewLead) -> Result<String> {
        let id = lead
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let project_id = match &lead.project {
            Some(name) => Some(ProjectRepo::get_or_create(conn, name)?.id),
            None => None,
        };
        let follow_up_ts = match &lead.follow_up {
            Some(date) => Some(parse_follow_up(date)?),
            None => None,
        };
        let now = chrono::Utc::now().timestamp();

        conn.execute(
            "INSERT INTO leads (id, first_name, last_name, phone, email, stage, priority, source,
                    score, project_id, assigned_to, budget_value, follow_up_ts, created_ts, modified_ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            rusqlite::params![
                id,
                lead.first_name,
                lead.last_name,
                lead.phone,
                lead.email,
                lead.stage,
                lead.priority.as_str(),
                lead.source,
                lead.score,
                project_id,
                lead.assigned_to,
                lead.budget_value,
                follow_up_ts,
                now,
                now
            ],
        )
        .with_context(|| format!("Failed to create lead: {}", lead.first_name))?;

        Ok(id)
    }

    /// Get lead by ID
    pub fn get_by_id(conn: &Connection, id: &str, now_ts: i64) -> Result<Option<LeadRecord>> {
        let sql = format!(
            "SELECT {} FROM leads l LEFT JOIN projects p ON p.id = l.project_id WHERE l.id = ?1",
            LEAD_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let lead = stmt.query_row([id], |row| row_to_lead(row, now_ts)).optional()?;
        Ok(lead)
    }

    /// List leads matching `filters`, oldest first.
    ///
    /// Project, assignee, priority and source are applied in SQL; search text
    /// is matched in memory with the same rules the store uses.
    pub fn list(conn: &Connection, filters: &FilterState, now_ts: i64) -> Result<Vec<LeadRecord>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(project) = constrained(&filters.project_ref) {
            clauses.push("p.name = ?");
            params.push(Box::new(project.to_string()));
        }
        if let Some(assignee) = constrained(&filters.assigned_to_ref) {
            clauses.push("l.assigned_to = ?");
            params.push(Box::new(assignee.to_string()));
        }
        if let Some(priority) = filters.priority {
            clauses.push("l.priority = ?");
            params.push(Box::new(priority.as_str()));
        }
        if let Some(source) = constrained(&filters.source) {
            clauses.push("l.source = ? COLLATE NOCASE");
            params.push(Box::new(source.to_string()));
        }

        // Number the parameters
        let numbered: Vec<String> = clauses
            .iter()
            .enumerate()
            .map(|(i, clause)| clause.replace('?', &format!("?{}", i + 1)))
            .collect();
        let where_sql = if numbered.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", numbered.join(" AND "))
        };
        let sql = format!(
            "SELECT {} FROM leads l LEFT JOIN projects p ON p.id = l.project_id {} ORDER BY l.created_ts, l.rowid",
            LEAD_COLUMNS, where_sql
        );

        let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), |row| row_to_lead(row, now_ts))?;

        let mut leads = Vec::new();
        for row in rows {
            let lead = row?;
            if filters.matches(&lead) {
                leads.push(lead);
            }
        }
        Ok(leads)
    }

    /// Set a lead's stage and append a history row. Returns false if the lead does not exist.
    pub fn update_stage(conn: &Connection, id: &str, stage: &str) -> Result<bool> {
        let tx = conn.unchecked_transaction()?;
        let previous: Option<String> = tx
            .query_row("SELECT stage FROM leads WHERE id = ?1", [id], |row| row.get(0))
            .optional()?;
        let Some(previous) = previous else {
            return Ok(false);
        };

        let now = chrono::Utc::now().timestamp();
        tx.execute(
            "UPDATE leads SET stage = ?1, modified_ts = ?2 WHERE id = ?3",
            rusqlite::params![stage, now, id],
        )
        .with_context(|| format!("Failed to update stage for lead {}", id))?;
        tx.execute(
            "INSERT INTO stage_events (lead_id, from_stage, to_stage, ts) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![id, previous, stage, now],
        )?;
        tx.commit()?;
        Ok(true)
    }

    /// Stage history for a lead, oldest first
    pub fn stage_history(conn: &Connection, id: &str) -> Result<Vec<StageEvent>> {
        let mut stmt = conn.prepare(
            "SELECT from_stage, to_stage, ts FROM stage_events WHERE lead_id = ?1 ORDER BY id"
        )?;
        let rows = stmt.query_map([id], |row| {
            Ok(StageEvent {
                from_stage: row.get(0)?,
                to_stage: row.get(1)?,
                ts: row.get(2)?,
            })
        })?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }
}

fn row_to_lead(row: &Row<'_>, now_ts: i64) -> rusqlite::Result<LeadRecord> {
    let priority: String = row.get(6)?;
    let priority = Priority::from_str(&priority).ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(6, "priority".to_string(), rusqlite::types::Type::Text)
    })?;
    let follow_up_ts: Option<i64> = row.get(12)?;
    Ok(LeadRecord {
        id: row.get(0)?,
        contact: ContactInfo {
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            phone: row.get(3)?,
            email: row.get(4)?,
        },
        stage: row.get(5)?,
        priority,
        source: row.get(7)?,
        score: row.get(8)?,
        project_ref: row.get(9)?,
        assigned_to_ref: row.get(10)?,
        budget_value: row.get(11)?,
        follow_up: FollowUp::from_due(follow_up_ts, now_ts),
        created_at: row.get(13)?,
    })
}

/// Parse a YYYY-MM-DD follow-up date to a UTC midnight timestamp
fn parse_follow_up(date: &str) -> Result<i64> {
    let day = chrono::NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid follow-up date '{}'. Expected YYYY-MM-DD", date))?;
    let midnight = day
        .and_hms_opt(0, 0, 0)
        .with_context(|| format!("Invalid follow-up date '{}'", date))?;
    Ok(midnight.and_utc().timestamp())
}
