// Output formatting utilities

use crate::models::{LeadRecord, StageRegistry};
use crate::pipeline::{PipelineSnapshot, PipelineStore, StageStats};
use crate::repo::StageEvent;
use chrono::{Local, TimeZone};
use std::io::IsTerminal;

// ANSI escape codes for terminal formatting
const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_RESET: &str = "\x1b[0m";

/// Map a color token to its ANSI foreground code
fn color_token_to_fg(token: &str) -> Option<&'static str> {
    match token {
        "black" => Some("\x1b[30m"),
        "red" => Some("\x1b[31m"),
        "green" => Some("\x1b[32m"),
        "yellow" => Some("\x1b[33m"),
        "blue" => Some("\x1b[34m"),
        "magenta" => Some("\x1b[35m"),
        "cyan" => Some("\x1b[36m"),
        "white" => Some("\x1b[37m"),
        "bright_black" => Some("\x1b[90m"),
        "bright_red" => Some("\x1b[91m"),
        "bright_green" => Some("\x1b[92m"),
        "bright_yellow" => Some("\x1b[93m"),
        "bright_blue" => Some("\x1b[94m"),
        "bright_magenta" => Some("\x1b[95m"),
        "bright_cyan" => Some("\x1b[96m"),
        _ => None,
    }
}

/// Check if stdout is a terminal (TTY)
pub fn is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width dynamically
///
/// Uses the `terminal_size` crate, with fallback to the COLUMNS environment
/// variable and a sensible default.
pub fn get_terminal_width() -> usize {
    if let Some((terminal_size::Width(w), _)) = terminal_size::terminal_size() {
        if w > 0 {
            return w as usize;
        }
    }

    if let Ok(cols) = std::env::var("COLUMNS") {
        if let Ok(width) = cols.parse::<usize>() {
            if width > 0 && width < 10000 {
                return width;
            }
        }
    }

    100
}

fn paint(text: &str, color_token: &str, is_tty: bool) -> String {
    match color_token_to_fg(color_token) {
        Some(fg) if is_tty => format!("{}{}{}{}", ANSI_BOLD, fg, text, ANSI_RESET),
        _ => text.to_string(),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Render a fraction as a percentage with one decimal.
/// This is the only place percentages are rounded.
pub fn format_percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

/// Format a money amount with thousands separators
pub fn format_money(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if amount < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

pub fn format_date(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => ts.to_string(),
    }
}

fn stage_label(stage: &str, registry: &StageRegistry) -> String {
    match registry.by_id(stage) {
        Some(def) => def.label.clone(),
        None => format!("? {}", stage),
    }
}

fn follow_up_cell(lead: &LeadRecord) -> String {
    if lead.follow_up.is_overdue {
        format!("overdue {}d", lead.follow_up.overdue_by_days)
    } else {
        String::new()
    }
}

/// Format the stage catalog
pub fn format_stage_list(registry: &StageRegistry) -> String {
    let mut output = String::new();
    output.push_str(&format!("{:<22} {:<22} {}\n", "Id", "Label", "Description"));
    output.push_str(&format!("{}\n", "-".repeat(70)));
    for stage in registry.stages() {
        let mut description = stage.description.clone();
        if stage.id == registry.success_stage() {
            description.push_str(" [conversion]");
        } else if stage.terminal {
            description.push_str(" [terminal]");
        }
        output.push_str(&format!("{:<22} {:<22} {}\n", stage.id, stage.label, description));
    }
    output
}

/// Format leads as a table
pub fn format_lead_table(leads: &[&LeadRecord], registry: &StageRegistry) -> String {
    if leads.is_empty() {
        return "No leads found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<9} {:<22} {:<22} {:<9} {:<5} {:<12} {:<12} {:>12} {}\n",
        "ID", "Name", "Stage", "Priority", "Tier", "Source", "Project", "Value", "Follow-up"
    ));
    output.push_str(&format!("{}\n", "-".repeat(120)));

    for lead in leads {
        output.push_str(&format!(
            "{:<9} {:<22} {:<22} {:<9} {:<5} {:<12} {:<12} {:>12} {}\n",
            lead.short_id(),
            truncate(&lead.contact.full_name(), 22),
            truncate(&stage_label(&lead.stage, registry), 22),
            lead.priority.as_str(),
            lead.score_tier().as_str(),
            truncate(&lead.source, 12),
            truncate(lead.project_ref.as_deref().unwrap_or(""), 12),
            lead.budget_value.map(format_money).unwrap_or_default(),
            follow_up_cell(lead),
        ));
    }
    output.push_str(&format!("\n{} lead(s)\n", leads.len()));
    output
}

fn stats_line(stats: &StageStats) -> String {
    format!(
        "{} lead(s), {}, {}",
        stats.count,
        format_money(stats.total_value),
        format_percent(stats.percent_of_visible)
    )
}

/// Format the pipeline board: one section per stage in registry order,
/// then uncategorized leads and totals.
pub fn format_board(store: &PipelineStore, width: usize, is_tty: bool) -> String {
    let registry = store.registry();
    let snapshot: PipelineSnapshot = store.snapshot();
    let mut output = String::new();

    if let Some(err) = store.error() {
        output.push_str(&format!("! Could not load leads: {}\n\n", err));
    }

    for column in &snapshot.per_stage {
        let Some(stage) = registry.by_id(&column.stage_id) else {
            continue;
        };
        let header = format!("== {} ==", stage.label);
        output.push_str(&format!(
            "{} {}\n",
            paint(&header, &stage.color_token, is_tty),
            stats_line(&column.stats)
        ));
        for lead in store.column(&stage.id) {
            output.push_str(&format!("{}\n", truncate(&card_line(lead), width)));
        }
    }

    let unknown = store.uncategorized();
    if !unknown.is_empty() {
        output.push_str(&format!("== Uncategorized == {}\n", stats_line(&snapshot.uncategorized)));
        for lead in unknown {
            let line = format!("{} (stage '{}')", card_line(lead), lead.stage);
            output.push_str(&format!("{}\n", truncate(&line, width)));
        }
    }

    let totals = &snapshot.totals;
    output.push_str(&format!(
        "\nVisible: {}  Conversions: {}  Overdue follow-ups: {}  Pipeline value: {}\n",
        totals.visible_count,
        totals.conversions,
        totals.overdue_follow_ups,
        format_money(totals.total_value)
    ));
    output
}

fn card_line(lead: &LeadRecord) -> String {
    let mut line = format!(
        "  [{}] {} ({}, {})",
        lead.short_id(),
        lead.contact.full_name(),
        lead.priority.as_str(),
        lead.score_tier().as_str()
    );
    if let Some(value) = lead.budget_value {
        line.push_str(&format!(" {}", format_money(value)));
    }
    if lead.follow_up.is_overdue {
        line.push_str(&format!(" !{}d", lead.follow_up.overdue_by_days));
    }
    line
}

/// Detail view of a single lead
pub fn format_lead_detail(lead: &LeadRecord, registry: &StageRegistry, history: &[StageEvent]) -> String {
    let mut output = String::new();
    output.push_str(&format!("Lead {}\n", lead.id));
    output.push_str(&format!("  Name:      {}\n", lead.contact.full_name()));
    output.push_str(&format!("  Stage:     {}\n", stage_label(&lead.stage, registry)));
    output.push_str(&format!("  Priority:  {}\n", lead.priority));
    output.push_str(&format!("  Score:     {} ({})\n", lead.score, lead.score_tier().as_str()));
    if !lead.source.is_empty() {
        output.push_str(&format!("  Source:    {}\n", lead.source));
    }
    if let Some(phone) = &lead.contact.phone {
        output.push_str(&format!("  Phone:     {}\n", phone));
    }
    if let Some(email) = &lead.contact.email {
        output.push_str(&format!("  Email:     {}\n", email));
    }
    if let Some(project) = &lead.project_ref {
        output.push_str(&format!("  Project:   {}\n", project));
    }
    if let Some(assignee) = &lead.assigned_to_ref {
        output.push_str(&format!("  Assigned:  {}\n", assignee));
    }
    if let Some(value) = lead.budget_value {
        output.push_str(&format!("  Budget:    {}\n", format_money(value)));
    }
    if lead.follow_up.is_overdue {
        output.push_str(&format!("  Follow-up: overdue by {} day(s)\n", lead.follow_up.overdue_by_days));
    }
    output.push_str(&format!("  Created:   {}\n", format_date(lead.created_at)));

    if !history.is_empty() {
        output.push_str("  History:\n");
        for event in history {
            output.push_str(&format!(
                "    {} {} -> {}\n",
                format_date(event.ts),
                stage_label(&event.from_stage, registry),
                stage_label(&event.to_stage, registry)
            ));
        }
    }
    output
}

/// Edit view: the lead's editable fields as JSON
pub fn format_lead_editor(lead: &LeadRecord) -> String {
    let fields = serde_json::json!({
        "first_name": lead.contact.first_name,
        "last_name": lead.contact.last_name,
        "phone": lead.contact.phone,
        "email": lead.contact.email,
        "priority": lead.priority,
        "source": lead.source,
        "score": lead.score,
        "project": lead.project_ref,
        "assigned_to": lead.assigned_to_ref,
        "budget_value": lead.budget_value,
    });
    let body = serde_json::to_string_pretty(&fields).unwrap_or_default();
    format!("Editing lead {}\n{}\n", lead.id, body)
}
