use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// One employee considered for a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentCandidate {
    pub employee_id: String,
    pub name: String,
    pub role: String,
    pub department: String,
    pub score: i64,
    /// ASSIGNED + IN_PROGRESS tasks currently held.
    pub active_task_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonCode {
    StrongPerformer { score: i64 },
    NoActiveTasks,
    LightWorkload,
    ActiveTasks { count: usize },
    SuitedForComplexWork,
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReasonCode::StrongPerformer { score } => write!(f, "Strong performer ({score}%)"),
            ReasonCode::NoActiveTasks => f.write_str("No active tasks"),
            ReasonCode::LightWorkload => f.write_str("Light workload"),
            ReasonCode::ActiveTasks { count } => write!(f, "{count} active tasks"),
            ReasonCode::SuitedForComplexWork => f.write_str("Suited for complex work"),
        }
    }
}

impl Serialize for ReasonCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RankedCandidate {
    pub employee_id: String,
    pub name: String,
    pub role: String,
    pub department: String,
    pub current_score: i64,
    pub active_task_count: usize,
    pub match_score: i64,
    pub reason_codes: Vec<ReasonCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_currently_assigned: Option<bool>,
}

impl RankedCandidate {
    /// Reasons joined for single-line display.
    pub fn reason(&self) -> String {
        self.reason_codes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" · ")
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRecommendations {
    pub recommendations: Vec<RankedCandidate>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskAssignmentRecommendation {
    pub task_id: String,
    pub task_title: String,
    pub recommendations: Vec<RankedCandidate>,
}
