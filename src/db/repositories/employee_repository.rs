use std::convert::TryFrom;

use chrono::Utc;
use rusqlite::{named_params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::{format_timestamp, parse_timestamp};
use crate::error::{AppError, AppResult};
use crate::models::assignment::AssignmentCandidate;
use crate::models::employee::{EmployeeRecord, NewEmployee};

const BASE_SELECT: &str = r#"
    SELECT
        id,
        organization_id,
        name,
        email,
        role,
        department,
        skills,
        wallet_address,
        ai_score,
        created_at
    FROM employees
"#;

#[derive(Debug, Clone)]
pub struct EmployeeRow {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub department: String,
    pub skills: String,
    pub wallet_address: Option<String>,
    pub ai_score: i64,
    pub created_at: String,
}

impl EmployeeRow {
    pub fn into_record(self) -> AppResult<EmployeeRecord> {
        Ok(EmployeeRecord {
            id: self.id,
            organization_id: self.organization_id,
            name: self.name,
            email: self.email,
            role: self.role,
            department: self.department,
            skills: serde_json::from_str(&self.skills)?,
            wallet_address: self.wallet_address,
            ai_score: self.ai_score,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

impl TryFrom<&Row<'_>> for EmployeeRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            organization_id: row.get("organization_id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            role: row.get("role")?,
            department: row.get("department")?,
            skills: row.get("skills")?,
            wallet_address: row.get("wallet_address")?,
            ai_score: row.get("ai_score")?,
            created_at: row.get("created_at")?,
        })
    }
}

pub struct EmployeeRepository;

impl EmployeeRepository {
    pub fn insert(conn: &Connection, input: &NewEmployee) -> AppResult<EmployeeRecord> {
        let required = [
            ("name", &input.name),
            ("email", &input.email),
            ("role", &input.role),
            ("department", &input.department),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(AppError::validation(format!("employee {field} is required")));
        }

        let row = EmployeeRow {
            id: Uuid::new_v4().to_string(),
            organization_id: input.organization_id.clone(),
            name: input.name.trim().to_string(),
            email: input.email.trim().to_lowercase(),
            role: input.role.trim().to_string(),
            department: input.department.trim().to_string(),
            skills: serde_json::to_string(&input.skills)?,
            wallet_address: input
                .wallet_address
                .as_ref()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            ai_score: input.ai_score.unwrap_or(0).clamp(0, 100),
            created_at: format_timestamp(&Utc::now()),
        };

        conn.execute(
            r#"
                INSERT INTO employees (
                    id, organization_id, name, email, role, department,
                    skills, wallet_address, ai_score, created_at
                ) VALUES (
                    :id, :organization_id, :name, :email, :role, :department,
                    :skills, :wallet_address, :ai_score, :created_at
                )
            "#,
            named_params! {
                ":id": &row.id,
                ":organization_id": &row.organization_id,
                ":name": &row.name,
                ":email": &row.email,
                ":role": &row.role,
                ":department": &row.department,
                ":skills": &row.skills,
                ":wallet_address": &row.wallet_address,
                ":ai_score": &row.ai_score,
                ":created_at": &row.created_at,
            },
        )?;

        row.into_record()
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<EmployeeRecord>> {
        let sql = format!("{BASE_SELECT} WHERE id = :id");
        let mut stmt = conn.prepare(&sql)?;

        let row = stmt
            .query_row(named_params! {":id": id}, |row| EmployeeRow::try_from(row))
            .optional()?;

        row.map(|row| row.into_record()).transpose()
    }

    /// Employees of an organization in creation order.
    pub fn list_for_organization(
        conn: &Connection,
        organization_id: &str,
    ) -> AppResult<Vec<EmployeeRecord>> {
        let sql = format!(
            "{BASE_SELECT} WHERE organization_id = :organization_id ORDER BY created_at ASC, rowid ASC"
        );
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt
            .query_map(named_params! {":organization_id": organization_id}, |row| {
                EmployeeRow::try_from(row)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(|row| row.into_record()).collect()
    }

    pub fn update_ai_score(conn: &Connection, id: &str, score: i64) -> AppResult<()> {
        let updated = conn.execute(
            "UPDATE employees SET ai_score = :ai_score WHERE id = :id",
            named_params! {":ai_score": score.clamp(0, 100), ":id": id},
        )?;

        if updated == 0 {
            return Err(AppError::not_found());
        }
        Ok(())
    }

    /// Organization employees with their persisted score and ASSIGNED +
    /// IN_PROGRESS task count, in creation order.
    pub fn list_assignment_candidates(
        conn: &Connection,
        organization_id: &str,
    ) -> AppResult<Vec<AssignmentCandidate>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT
                    e.id,
                    e.name,
                    e.role,
                    e.department,
                    e.ai_score,
                    COUNT(t.id) AS active_task_count
                FROM employees e
                LEFT JOIN tasks t
                    ON t.employee_id = e.id
                    AND t.status IN ('ASSIGNED', 'IN_PROGRESS')
                WHERE e.organization_id = :organization_id
                GROUP BY e.id
                ORDER BY e.created_at ASC, e.rowid ASC
            "#,
        )?;

        let candidates = stmt
            .query_map(named_params! {":organization_id": organization_id}, |row| {
                let active: i64 = row.get("active_task_count")?;
                Ok(AssignmentCandidate {
                    employee_id: row.get("id")?,
                    name: row.get("name")?,
                    role: row.get("role")?,
                    department: row.get("department")?,
                    score: row.get("ai_score")?,
                    active_task_count: usize::try_from(active).unwrap_or(0),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(candidates)
    }
}
