use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Stable,
    Declining,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Improving => "improving",
            TrendDirection::Stable => "stable",
            TrendDirection::Declining => "declining",
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrendConfidence {
    InsufficientData,
    Medium,
    High,
}

impl TrendConfidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendConfidence::InsufficientData => "insufficient_data",
            TrendConfidence::Medium => "medium",
            TrendConfidence::High => "high",
        }
    }
}

impl fmt::Display for TrendConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate of every task created in one calendar month.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyDatum {
    /// `YYYY-MM`.
    pub month: String,
    pub score: i64,
    pub task_count: usize,
    pub completed_count: usize,
    /// Dense index over populated months; empty months do not consume one.
    pub idx: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrendResult {
    pub trend: TrendDirection,
    pub confidence: TrendConfidence,
    pub slope: f64,
    pub monthly_data: Vec<MonthlyDatum>,
    pub predicted_next_month: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
