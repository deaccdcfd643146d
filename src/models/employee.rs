use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewOrganization {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRecord {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub department: String,
    pub skills: Vec<String>,
    pub wallet_address: Option<String>,
    /// Last persisted composite productivity score.
    pub ai_score: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewEmployee {
    pub organization_id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub department: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub ai_score: Option<i64>,
}
