//! Per-stage statistics and pipeline-wide totals.
//!
//! Everything here is a pure function of its inputs. Percentages are kept as
//! unrounded fractions; callers round only when rendering.

use crate::models::{LeadRecord, StageRegistry};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StageStats {
    pub count: usize,
    pub total_value: i64,
    /// Fraction of visible leads in this bucket, 0.0 when nothing is visible
    pub percent_of_visible: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageColumn {
    pub stage_id: String,
    pub stats: StageStats,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PipelineTotals {
    pub visible_count: usize,
    pub conversions: usize,
    pub overdue_follow_ups: usize,
    pub total_value: i64,
}

/// Derived view of the visible leads. Recomputed on every change, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineSnapshot {
    /// One entry per registry stage, in registry order
    pub per_stage: Vec<StageColumn>,
    /// Leads whose stage id is not in the registry
    pub uncategorized: StageStats,
    pub totals: PipelineTotals,
}

impl PipelineSnapshot {
    pub fn stage(&self, stage_id: &str) -> Option<&StageStats> {
        self.per_stage
            .iter()
            .find(|c| c.stage_id == stage_id)
            .map(|c| &c.stats)
    }

    /// Count for a stage; unknown ids count as zero
    pub fn count(&self, stage_id: &str) -> usize {
        self.stage(stage_id).map(|s| s.count).unwrap_or(0)
    }

    /// Sum of all stage columns plus the uncategorized bucket.
    /// Always equals `totals.visible_count`.
    pub fn bucket_count_sum(&self) -> usize {
        self.per_stage.iter().map(|c| c.stats.count).sum::<usize>() + self.uncategorized.count
    }
}

fn fraction(count: usize, visible: usize) -> f64 {
    if visible == 0 {
        0.0
    } else {
        count as f64 / visible as f64
    }
}

/// Aggregate visible leads into a snapshot
pub fn aggregate(records: &[&LeadRecord], registry: &StageRegistry) -> PipelineSnapshot {
    let visible = records.len();
    let mut per_stage: Vec<StageColumn> = registry
        .stages()
        .iter()
        .map(|s| StageColumn {
            stage_id: s.id.clone(),
            stats: StageStats::default(),
        })
        .collect();
    let mut uncategorized = StageStats::default();
    let mut totals = PipelineTotals {
        visible_count: visible,
        ..Default::default()
    };

    for lead in records {
        let bucket = match registry.position(&lead.stage) {
            Some(idx) => &mut per_stage[idx].stats,
            None => &mut uncategorized,
        };
        bucket.count += 1;
        bucket.total_value = bucket.total_value.saturating_add(lead.value());

        // Sums clamp at the i64 bounds instead of wrapping
        totals.total_value = totals.total_value.saturating_add(lead.value());
        if lead.stage == registry.success_stage() {
            totals.conversions += 1;
        }
        if lead.follow_up.is_overdue {
            totals.overdue_follow_ups += 1;
        }
    }

    for column in &mut per_stage {
        column.stats.percent_of_visible = fraction(column.stats.count, visible);
    }
    uncategorized.percent_of_visible = fraction(uncategorized.count, visible);

    PipelineSnapshot {
        per_stage,
        uncategorized,
        totals,
    }
}
