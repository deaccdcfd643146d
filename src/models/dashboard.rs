use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentStats {
    pub department: String,
    pub employee_count: usize,
    pub avg_score: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopPerformer {
    pub id: String,
    pub name: String,
    pub ai_score: i64,
    pub department: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationDashboard {
    pub total_employees: usize,
    /// Employees holding at least one ASSIGNED or IN_PROGRESS task.
    pub active_employees: usize,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub in_progress_tasks: usize,
    pub assigned_tasks: usize,
    pub avg_productivity_score: i64,
    pub department_stats: Vec<DepartmentStats>,
    pub top_performers: Vec<TopPerformer>,
}
