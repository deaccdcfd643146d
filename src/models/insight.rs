use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::employee::EmployeeRecord;
use crate::models::productivity::ScoreResult;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PerformanceTier {
    Exceptional,
    Strong,
    Developing,
    NeedsAttention,
}

impl PerformanceTier {
    pub fn from_score(score: i64) -> Self {
        if score >= 80 {
            PerformanceTier::Exceptional
        } else if score >= 60 {
            PerformanceTier::Strong
        } else if score >= 40 {
            PerformanceTier::Developing
        } else {
            PerformanceTier::NeedsAttention
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceTier::Exceptional => "exceptional",
            PerformanceTier::Strong => "strong",
            PerformanceTier::Developing => "developing",
            PerformanceTier::NeedsAttention => "needs-attention",
        }
    }
}

impl fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InsightSource {
    Template,
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeInsights {
    pub suggested_skills: Vec<String>,
    pub performance_summary: String,
    pub performance_tier: PerformanceTier,
    pub source: InsightSource,
}

/// Profile fields the insight providers read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InsightSubject {
    pub name: String,
    pub role: String,
    pub department: String,
    pub skills: Vec<String>,
}

impl From<&EmployeeRecord> for InsightSubject {
    fn from(employee: &EmployeeRecord) -> Self {
        Self {
            name: employee.name.clone(),
            role: employee.role.clone(),
            department: employee.department.clone(),
            skills: employee.skills.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeInsightsResponse {
    pub employee_id: String,
    pub score: ScoreResult,
    pub insights: EmployeeInsights,
}
