use tracing::debug;

use crate::models::assignment::{AssignmentCandidate, RankedCandidate, ReasonCode};
use crate::utils::rounding::round_half_up;

const PERFORMANCE_WEIGHT: f64 = 0.5;
const MAX_AVAILABILITY: f64 = 40.0;
const AVAILABILITY_COST_PER_TASK: f64 = 8.0;
const COMPLEX_TASK_THRESHOLD: i64 = 4;
const STRONG_PERFORMER_SCORE: i64 = 70;
const LOAD_SPREAD_SCORE: i64 = 60;
const COMPLEXITY_FIT_BONUS: f64 = 10.0;
const PARTIAL_FIT_BONUS: f64 = 5.0;

/// Result size when ranking for an existing task.
pub const TASK_RECOMMENDATION_LIMIT: usize = 5;

/// Rank every candidate for a task of the given complexity, best match first.
///
/// Candidates with equal match scores keep their input order.
pub fn rank_employees(
    candidates: &[AssignmentCandidate],
    task_complexity: i64,
) -> Vec<RankedCandidate> {
    let mut ranked: Vec<RankedCandidate> = candidates
        .iter()
        .map(|candidate| score_candidate(candidate, task_complexity))
        .collect();

    // `sort_by` is stable, so ties stay in input order.
    ranked.sort_by(|a, b| b.match_score.cmp(&a.match_score));

    debug!(
        target: "app::assignment",
        candidates = ranked.len(),
        task_complexity,
        "ranked assignment candidates"
    );

    ranked
}

/// Rank candidates for an existing task, flagging its current assignee and
/// keeping only the top matches.
pub fn rank_for_task(
    candidates: &[AssignmentCandidate],
    task_complexity: i64,
    current_assignee: Option<&str>,
) -> Vec<RankedCandidate> {
    let mut ranked = rank_employees(candidates, task_complexity);
    ranked.truncate(TASK_RECOMMENDATION_LIMIT);
    for candidate in &mut ranked {
        candidate.is_currently_assigned = Some(current_assignee == Some(candidate.employee_id.as_str()));
    }
    ranked
}

pub fn score_candidate(candidate: &AssignmentCandidate, task_complexity: i64) -> RankedCandidate {
    let score = candidate.score;
    let active = candidate.active_task_count;

    let performance = score as f64 * PERFORMANCE_WEIGHT;
    let availability =
        (MAX_AVAILABILITY - active as f64 * AVAILABILITY_COST_PER_TASK).max(0.0);
    let complexity_fit = if task_complexity >= COMPLEX_TASK_THRESHOLD {
        if score >= STRONG_PERFORMER_SCORE {
            COMPLEXITY_FIT_BONUS
        } else {
            0.0
        }
    } else if score <= LOAD_SPREAD_SCORE {
        COMPLEXITY_FIT_BONUS
    } else {
        PARTIAL_FIT_BONUS
    };

    let match_score = round_half_up((performance + availability + complexity_fit).min(100.0)) as i64;

    RankedCandidate {
        employee_id: candidate.employee_id.clone(),
        name: candidate.name.clone(),
        role: candidate.role.clone(),
        department: candidate.department.clone(),
        current_score: score,
        active_task_count: active,
        match_score,
        reason_codes: reason_codes(score, active, task_complexity),
        is_currently_assigned: None,
    }
}

fn reason_codes(score: i64, active: usize, task_complexity: i64) -> Vec<ReasonCode> {
    let mut reasons = Vec::new();
    if score >= STRONG_PERFORMER_SCORE {
        reasons.push(ReasonCode::StrongPerformer { score });
    }
    reasons.push(match active {
        0 => ReasonCode::NoActiveTasks,
        1 => ReasonCode::LightWorkload,
        count => ReasonCode::ActiveTasks { count },
    });
    if task_complexity >= COMPLEX_TASK_THRESHOLD && score >= STRONG_PERFORMER_SCORE {
        reasons.push(ReasonCode::SuitedForComplexWork);
    }
    reasons
}
