use chrono::{DateTime, TimeZone, Utc};
use tracing::debug;

use crate::models::productivity::{ScoreBreakdown, ScoreResult};
use crate::models::task::TaskRecord;
use crate::utils::rounding::{clamp_score, round_half_up, round_to};

const COMPLETION_WEIGHT: f64 = 0.5;
const SPEED_WEIGHT: f64 = 0.3;
const COMPLEXITY_WEIGHT: f64 = 0.2;

/// Speed score used when nothing has been completed yet.
const NEUTRAL_SPEED_SCORE: f64 = 50.0;
const ON_TIME_SCORE: f64 = 100.0;
const EARLY_FINISH_SCORE: f64 = 110.0;
const MAX_COMPLEXITY: f64 = 5.0;

/// Productivity score for one employee's full task list.
///
/// Score = completion rate × 0.5 + speed vs deadline × 0.3 + average complexity × 0.2,
/// rounded and clamped to 0-100. An empty list scores zero across the board.
pub fn calculate_score(tasks: &[TaskRecord]) -> ScoreResult {
    if tasks.is_empty() {
        return ScoreResult::default();
    }

    let total = tasks.len();
    let completed: Vec<&TaskRecord> = tasks.iter().filter(|task| task.is_completed()).collect();

    let completion_rate = completed.len() as f64 / total as f64 * 100.0;

    let speed_score = if completed.is_empty() {
        NEUTRAL_SPEED_SCORE
    } else {
        completed.iter().map(|task| task_speed_score(task)).sum::<f64>() / completed.len() as f64
    };

    let avg_complexity = tasks.iter().map(|task| task.complexity as f64).sum::<f64>() / total as f64;
    let complexity_score = avg_complexity / MAX_COMPLEXITY * 100.0;

    let composite = round_half_up(
        completion_rate * COMPLETION_WEIGHT
            + speed_score * SPEED_WEIGHT
            + complexity_score * COMPLEXITY_WEIGHT,
    );
    let score = clamp_score(composite) as i64;

    debug!(
        target: "app::scoring",
        total,
        completed = completed.len(),
        completion_rate,
        speed_score,
        complexity_score,
        score,
        "calculated productivity score"
    );

    ScoreResult {
        score,
        breakdown: ScoreBreakdown {
            completion_rate: round_to(completion_rate, 1),
            speed_score: round_to(speed_score, 1),
            complexity_score: round_to(complexity_score, 1),
        },
        total_tasks: total,
        completed_tasks: completed.len(),
    }
}

/// Score a single completed task against its deadline.
///
/// On time is 100, or 110 when finished in under half the allotted window. Late
/// work loses points in proportion to the overrun relative to the window, and a
/// window that is empty or negative scores 0.
pub fn task_speed_score(task: &TaskRecord) -> f64 {
    let deadline = end_of_day(task.deadline);
    let finished_at = task.finished_at();
    let total_ms = (deadline - task.created_at).num_milliseconds();

    if finished_at <= deadline {
        let taken_ms = (finished_at - task.created_at).num_milliseconds();
        if total_ms > 0 && (taken_ms as f64) < total_ms as f64 / 2.0 {
            return EARLY_FINISH_SCORE;
        }
        return ON_TIME_SCORE;
    }

    if total_ms <= 0 {
        return 0.0;
    }

    let overdue_ms = (finished_at - deadline).num_milliseconds();
    let late_penalty = (overdue_ms as f64 / total_ms as f64).min(1.0);
    round_half_up((1.0 - late_penalty) * 100.0).max(0.0)
}

/// Last millisecond of the deadline's calendar day (UTC).
pub fn end_of_day(deadline: DateTime<Utc>) -> DateTime<Utc> {
    deadline
        .date_naive()
        .and_hms_milli_opt(23, 59, 59, 999)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or(deadline)
}
