use serde::{Deserialize, Serialize};

/// Per-dimension view of a composite score, each value rounded to one decimal.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub completion_rate: f64,
    /// Can exceed 100 when early finishes earn the bonus.
    pub speed_score: f64,
    pub complexity_score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub score: i64,
    pub breakdown: ScoreBreakdown,
    pub total_tasks: usize,
    pub completed_tasks: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeScoreResponse {
    pub employee_id: String,
    #[serde(flatten)]
    pub result: ScoreResult,
}
