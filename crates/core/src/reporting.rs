//! Aggregation over a template's submissions.
//!
//! Pure computations: the caller loads the submissions, these functions only
//! count. `submitted` is its own bucket since a chainless submission is
//! terminal without anyone having approved it; for templates with a chain it
//! is always zero, so `approved + rejected + pending == total` there.

use serde::Serialize;

use crate::domain::submission::{Decision, Submission, SubmissionStatus};
use crate::domain::template::FormTemplate;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TemplateStats {
    pub total: u64,
    pub approved: u64,
    pub rejected: u64,
    pub submitted: u64,
    pub pending: u64,
    /// Fraction of all submissions that ended approved; 0.0 for an empty set.
    pub approval_rate: f64,
}

pub fn compute_stats(submissions: &[Submission]) -> TemplateStats {
    let mut stats = TemplateStats::default();
    for submission in submissions {
        stats.total += 1;
        match submission.status {
            SubmissionStatus::Approved => stats.approved += 1,
            SubmissionStatus::Rejected => stats.rejected += 1,
            SubmissionStatus::Submitted => stats.submitted += 1,
            SubmissionStatus::Draft | SubmissionStatus::InApproval => stats.pending += 1,
        }
    }
    if stats.total > 0 {
        stats.approval_rate = stats.approved as f64 / stats.total as f64;
    }
    stats
}

/// Decision activity at one chain level.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ApproverLevelStats {
    pub level: u32,
    pub approver_id: String,
    pub approver_name: String,
    pub approved: u64,
    pub rejected: u64,
    /// Submissions currently waiting at this level.
    pub pending: u64,
}

/// Per-level breakdown for a template's chain. Levels with no activity are
/// still reported so the whole chain is visible.
pub fn approver_breakdown(
    template: &FormTemplate,
    submissions: &[Submission],
) -> Vec<ApproverLevelStats> {
    template
        .chain
        .levels()
        .map(|entry| {
            let mut approved = 0;
            let mut rejected = 0;
            let mut pending = 0;
            for submission in submissions {
                for event in &submission.approval_history {
                    if event.level != entry.level {
                        continue;
                    }
                    match event.decision {
                        Decision::Approved => approved += 1,
                        Decision::Rejected => rejected += 1,
                    }
                }
                if submission.status == SubmissionStatus::InApproval
                    && submission.current_level == entry.level
                {
                    pending += 1;
                }
            }
            ApproverLevelStats {
                level: entry.level,
                approver_id: entry.approver_id.clone(),
                approver_name: entry.approver_name.clone(),
                approved,
                rejected,
                pending,
            }
        })
        .collect()
}
